//! Scripted stand-ins for the device peripherals, plus a real HTTP transport
//! for running against an actual collection server.

use std::cell::Cell;
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use log::{debug, info};
use rand::Rng;

use warehouse_node::camera::TuningParameter;
use warehouse_node::configuration::WifiSettings;
use warehouse_node::errors::{DeviceError, TransportError};
use warehouse_node::platform::{
    CameraDriver, Clock, Entropy, HttpResponse, HttpTransport, Indicator, SensorDriver, WifiDriver,
};
use warehouse_node::state::TelemetryReading;

/// Real wall-clock time mapped onto the wrapping millisecond counter the
/// node logic expects.
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }

    fn delay_ms(&self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

/// Simulated radio: associates a fixed number of status polls after each
/// connect request, or never when marked unavailable.
pub struct SimWifi {
    associated: Cell<bool>,
    pending_polls: Cell<u32>,
    polls_to_associate: u32,
    unavailable: bool,
}

impl SimWifi {
    pub fn new(polls_to_associate: u32, unavailable: bool) -> Self {
        Self {
            associated: Cell::new(false),
            pending_polls: Cell::new(0),
            polls_to_associate,
            unavailable,
        }
    }
}

impl WifiDriver for SimWifi {
    fn configure(&mut self, settings: &WifiSettings) -> Result<(), DeviceError> {
        debug!("configuring interface for ssid {:?}", settings.ssid);
        Ok(())
    }

    fn connect(&mut self) -> Result<(), DeviceError> {
        self.pending_polls.set(0);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.associated.set(false);
    }

    fn is_associated(&self) -> bool {
        if self.unavailable {
            return false;
        }
        if !self.associated.get() {
            self.pending_polls.set(self.pending_polls.get() + 1);
            if self.pending_polls.get() > self.polls_to_associate {
                self.associated.set(true);
            }
        }
        self.associated.get()
    }

    fn ip_address(&self) -> Option<Ipv4Addr> {
        Some(Ipv4Addr::new(192, 168, 252, 100))
    }
}

/// Simulated camera emitting a minimal JPEG-shaped frame. Init failures can
/// be injected to exercise the bounded boot retry.
pub struct SimCamera {
    init_failures_left: u32,
    frame_size: usize,
}

impl SimCamera {
    pub fn new(init_failures: u32, frame_size: usize) -> Self {
        Self {
            init_failures_left: init_failures,
            frame_size,
        }
    }
}

impl CameraDriver for SimCamera {
    fn power_up(&mut self) -> Result<(), DeviceError> {
        if self.init_failures_left > 0 {
            self.init_failures_left -= 1;
            return Err(DeviceError(0x105));
        }
        Ok(())
    }

    fn power_down(&mut self) {}

    fn capture(&mut self) -> Result<Vec<u8>, DeviceError> {
        let mut frame = vec![0xff, 0xd8];
        frame.resize(self.frame_size.saturating_sub(2), 0xaa);
        frame.extend_from_slice(&[0xff, 0xd9]);
        Ok(frame)
    }

    fn set_parameter(&mut self, parameter: TuningParameter, value: i32) -> Result<(), DeviceError> {
        debug!("tuning {:?} = {}", parameter, value);
        Ok(())
    }
}

/// Simulated sensor bank producing plausible jittered readings.
pub struct SimSensor {
    base: TelemetryReading,
}

impl SimSensor {
    pub fn new() -> Self {
        Self {
            base: TelemetryReading {
                temperature: 23.0,
                humidity: 55.0,
                weight: 1200.0,
            },
        }
    }
}

impl SensorDriver for SimSensor {
    fn read(&mut self) -> Result<TelemetryReading, DeviceError> {
        let mut rng = rand::thread_rng();
        Ok(TelemetryReading {
            temperature: self.base.temperature + rng.gen_range(-0.5..0.5),
            humidity: self.base.humidity + rng.gen_range(-2.0..2.0),
            weight: self.base.weight + rng.gen_range(-10.0..10.0),
        })
    }
}

/// Indicator that just logs its transitions.
pub struct SimIndicator;

impl Indicator for SimIndicator {
    fn set(&mut self, on: bool) {
        info!("indicator {}", if on { "on" } else { "off" });
    }
}

pub struct SimEntropy;

impl Entropy for SimEntropy {
    fn random_u32(&mut self) -> u32 {
        rand::thread_rng().gen()
    }
}

/// Either a real HTTP client or a canned loopback reply, so the simulator
/// can run with no server at all.
pub enum Transport {
    Real(reqwest::blocking::Client),
    Loopback,
}

impl HttpTransport for Transport {
    fn post(
        &mut self,
        url: &str,
        content_type: &str,
        body: &[u8],
        timeout_ms: u32,
    ) -> Result<HttpResponse, TransportError> {
        match self {
            Self::Real(client) => {
                let response = client
                    .post(url)
                    .header("Content-Type", content_type)
                    .timeout(Duration::from_millis(u64::from(timeout_ms)))
                    .body(body.to_vec())
                    .send()
                    .map_err(|err| {
                        if err.is_timeout() {
                            TransportError::Timeout
                        } else if err.is_connect() {
                            TransportError::Connect
                        } else {
                            TransportError::Io(err.to_string())
                        }
                    })?;
                let status = response.status().as_u16();
                let body = response
                    .bytes()
                    .map_err(|err| TransportError::Io(err.to_string()))?
                    .to_vec();
                Ok(HttpResponse { status, body })
            }
            Self::Loopback => Ok(HttpResponse {
                status: 200,
                body: b"{\"qr_code\":\"null\"}".to_vec(),
            }),
        }
    }
}
