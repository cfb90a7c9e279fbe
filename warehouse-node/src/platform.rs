//! Seams towards the hardware and transport collaborators.
//!
//! The core state machines never talk to a radio, camera bus or TCP stack
//! directly; they go through these traits so the whole node can be driven by
//! a virtual clock and scripted drivers in tests, and by the real peripherals
//! on the device.

use std::net::Ipv4Addr;

use crate::camera::TuningParameter;
use crate::configuration::WifiSettings;
use crate::errors::{DeviceError, TransportError};
use crate::state::TelemetryReading;

/// Monotonic millisecond counter since boot. Wraps at `u32::MAX`; all
/// elapsed-time math in the crate uses `wrapping_sub` and stays correct
/// across the wrap.
pub trait Clock {
    fn now_ms(&self) -> u32;

    /// Blocking delay. Only used for the short bounded spans the design
    /// allows: association polling, the init settle delay and the indicator
    /// pulse.
    fn delay_ms(&self, ms: u32);
}

/// Raw wifi association primitive. No retry logic lives behind this trait;
/// the link manager owns cadence and bounds.
pub trait WifiDriver {
    /// Apply interface configuration (static address etc.) before the first
    /// association attempt.
    fn configure(&mut self, settings: &WifiSettings) -> Result<(), DeviceError>;

    /// Issue the association request. Completion is observed by polling
    /// [`WifiDriver::is_associated`].
    fn connect(&mut self) -> Result<(), DeviceError>;

    fn disconnect(&mut self);

    fn is_associated(&self) -> bool;

    fn ip_address(&self) -> Option<Ipv4Addr>;
}

/// Camera peripheral. Each method is a single attempt; bounded retries and
/// teardown ordering are the lifecycle manager's job.
pub trait CameraDriver {
    fn power_up(&mut self) -> Result<(), DeviceError>;

    fn power_down(&mut self);

    /// One capture attempt returning an owned JPEG frame.
    fn capture(&mut self) -> Result<Vec<u8>, DeviceError>;

    /// One idempotent tuning register write.
    fn set_parameter(&mut self, parameter: TuningParameter, value: i32)
        -> Result<(), DeviceError>;
}

/// Environment sensor bank (temperature/humidity/weight). Single attempt,
/// may legitimately return NaN fields which the uplink rejects.
pub trait SensorDriver {
    fn read(&mut self) -> Result<TelemetryReading, DeviceError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// One request/response exchange. No retries inside; the caller's next
/// scheduled cycle is the retry mechanism.
pub trait HttpTransport {
    fn post(
        &mut self,
        url: &str,
        content_type: &str,
        body: &[u8],
        timeout_ms: u32,
    ) -> Result<HttpResponse, TransportError>;
}

/// Digital indicator output (the flash LED on the original board). Pulse
/// timing lives in the uplink sender.
pub trait Indicator {
    fn set(&mut self, on: bool);
}

/// Platform random source, used for multipart boundary tokens.
pub trait Entropy {
    fn random_u32(&mut self) -> u32;
}
