use core::fmt::Write as _;

use log::{info, warn};

use crate::errors::{RejectReason, UplinkError};
use crate::platform::{Clock, Entropy, HttpTransport, Indicator};
use crate::state::Reading;

const MULTIPART_FIELD: &str = "image";
const MULTIPART_FILENAME: &str = "image.jpg";

/// Builds the wire payload for one reading and performs exactly one
/// request/response exchange. Never retries; the caller's next scheduled
/// cycle is the retry mechanism.
pub struct UplinkSender<T: HttpTransport, I: Indicator, E: Entropy> {
    transport: T,
    indicator: I,
    entropy: E,
    url: String,
    min_image_size: usize,
    timeout_ms: u32,
    pulse_ms: u32,
}

/// Result of a successful exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UplinkReport {
    pub status: u16,
    /// An image response carried a detection, and the indicator was pulsed.
    pub detection: bool,
}

impl<T: HttpTransport, I: Indicator, E: Entropy> UplinkSender<T, I, E> {
    pub fn new(
        transport: T,
        indicator: I,
        entropy: E,
        url: String,
        min_image_size: usize,
        timeout_ms: u32,
        pulse_ms: u32,
    ) -> Self {
        Self {
            transport,
            indicator,
            entropy,
            url,
            min_image_size,
            timeout_ms,
            pulse_ms,
        }
    }

    /// Validation order is deliberate: a corrupt reading is rejected before
    /// the link is even consulted, and a down link short-circuits before any
    /// body is constructed.
    pub fn send(
        &mut self,
        clock: &dyn Clock,
        reading: Reading,
        link_up: bool,
    ) -> Result<UplinkReport, UplinkError> {
        match &reading {
            Reading::Image(image) if image.len() < self.min_image_size => {
                return Err(UplinkError::Rejected(RejectReason::ImageTooSmall(
                    image.len(),
                )));
            }
            Reading::Telemetry(telemetry) if !telemetry.is_finite() => {
                return Err(UplinkError::Rejected(RejectReason::NonFiniteTelemetry));
            }
            _ => {}
        }

        if !link_up {
            return Err(UplinkError::LinkDown);
        }

        let is_image = matches!(reading, Reading::Image(_));
        let (content_type, body) = match reading {
            Reading::Image(image) => {
                let boundary = self.boundary_token(clock);
                let body = multipart_body(&boundary, &image.bytes)?;
                info!("uploading image, {} bytes", image.bytes.len());
                (
                    format!("multipart/form-data; boundary={}", boundary),
                    body,
                )
            }
            Reading::Telemetry(telemetry) => {
                let body = serde_json::to_vec(&telemetry).map_err(|_| UplinkError::Encode)?;
                ("application/json".to_string(), body)
            }
        };

        let response = self
            .transport
            .post(&self.url, &content_type, &body, self.timeout_ms)?;
        drop(body);

        if response.status != 200 {
            return Err(UplinkError::Status(response.status));
        }

        let mut detection = false;
        if is_image {
            if let Some(code) = detected_code(&response.body) {
                info!("qr code detected: {}", code);
                self.pulse(clock);
                detection = true;
            }
        }

        Ok(UplinkReport {
            status: response.status,
            detection,
        })
    }

    fn boundary_token(&mut self, clock: &dyn Clock) -> heapless::String<64> {
        let mut token = heapless::String::new();
        let nonce = 1_000_000 + self.entropy.random_u32() % 9_000_000;
        // 22 prefix + 7 digit nonce + up to 10 digit timestamp always fits.
        let _ = write!(token, "----WebKitFormBoundary{}{}", nonce, clock.now_ms());
        token
    }

    fn pulse(&mut self, clock: &dyn Clock) {
        self.indicator.set(true);
        clock.delay_ms(self.pulse_ms);
        self.indicator.set(false);
    }
}

/// Single contiguous multipart/form-data body, sized up front. An allocation
/// failure is terminal for the cycle, not retried.
fn multipart_body(boundary: &str, image: &[u8]) -> Result<Vec<u8>, UplinkError> {
    let head = format!(
        "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: image/jpeg\r\n\r\n",
        boundary, MULTIPART_FIELD, MULTIPART_FILENAME
    );
    let tail = format!("\r\n--{}--\r\n", boundary);
    let total = head.len() + image.len() + tail.len();

    let mut body = Vec::new();
    if body.try_reserve_exact(total).is_err() {
        warn!("failed to allocate {} byte multipart body", total);
        return Err(UplinkError::BodyAlloc);
    }
    body.extend_from_slice(head.as_bytes());
    body.extend_from_slice(image);
    body.extend_from_slice(tail.as_bytes());
    debug_assert_eq!(body.len(), total);
    Ok(body)
}

/// A detection is a `qr_code` field holding any string other than `"null"`.
/// An explicit JSON null, a missing field or a non-JSON body all mean no
/// detection.
fn detected_code(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    match value.get("qr_code") {
        Some(serde_json::Value::String(code)) if code != "null" => Some(code.clone()),
        _ => None,
    }
}
