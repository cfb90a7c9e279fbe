//! Minimal blocking HTTP front-end for the diagnostic routes. One request
//! per connection, parsed from the request line only; good enough for a
//! browser polling `/data`.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;

use log::{debug, warn};

use warehouse_node::httpd::DiagnosticService;

/// Binds `addr` and serves the diagnostic routes from a background thread.
/// Returns the bound address (useful with an ephemeral port).
pub fn serve(addr: &str, service: DiagnosticService) -> std::io::Result<SocketAddr> {
    let listener = TcpListener::bind(addr)?;
    let local = listener.local_addr()?;
    thread::spawn(move || {
        for stream in listener.incoming() {
            match stream {
                Ok(mut stream) => handle(&mut stream, &service),
                Err(err) => warn!("diagnostic accept failed: {}", err),
            }
        }
    });
    Ok(local)
}

fn handle(stream: &mut TcpStream, service: &DiagnosticService) {
    let mut line = String::new();
    if BufReader::new(&mut *stream).read_line(&mut line).is_err() {
        return;
    }
    let mut parts = line.split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("/");
    debug!("diagnostic request: {} {}", method, path);

    let response = service.handle(method, path);
    let _ = write!(
        stream,
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        status_text(response.status),
        response.content_type,
        response.body.len(),
        response.body
    );
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        _ => "Error",
    }
}
