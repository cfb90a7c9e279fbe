use core::fmt;

/// Raw status code reported by an underlying peripheral or radio driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceError(pub i32);

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device error {:#x}", self.0)
    }
}

/// Unrecoverable boot-time conditions. The device halts instead of limping
/// along with a peripheral that never worked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootError {
    CameraInitExhausted { attempts: u32 },
    NetworkAssociation,
}

impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CameraInitExhausted { attempts } => {
                write!(f, "camera init failed after {} attempts", attempts)
            }
            Self::NetworkAssociation => write!(f, "wifi never associated during boot"),
        }
    }
}

/// A single failed acquisition attempt. Never retried within the cycle; the
/// next scheduled cycle is the retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireError {
    Capture(DeviceError),
    SensorRead(DeviceError),
}

impl fmt::Display for AcquireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Capture(err) => write!(f, "camera capture failed: {}", err),
            Self::SensorRead(err) => write!(f, "sensor read failed: {}", err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    Timeout,
    Connect,
    Io(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "request timed out"),
            Self::Connect => write!(f, "connection failed"),
            Self::Io(detail) => write!(f, "transport error: {}", detail),
        }
    }
}

/// Why a reading was dropped before any network I/O was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    ImageTooSmall(usize),
    NonFiniteTelemetry,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImageTooSmall(len) => write!(f, "image too small ({} bytes)", len),
            Self::NonFiniteTelemetry => write!(f, "telemetry contains non-finite values"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UplinkError {
    Rejected(RejectReason),
    LinkDown,
    BodyAlloc,
    Encode,
    Transport(TransportError),
    Status(u16),
}

impl fmt::Display for UplinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(reason) => write!(f, "payload rejected: {}", reason),
            Self::LinkDown => write!(f, "wifi link down"),
            Self::BodyAlloc => write!(f, "request body allocation failed"),
            Self::Encode => write!(f, "payload encoding failed"),
            Self::Transport(err) => write!(f, "{}", err),
            Self::Status(code) => write!(f, "server returned status {}", code),
        }
    }
}

impl From<TransportError> for UplinkError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err)
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid { key, value } => {
                write!(f, "invalid value {:?} for {}", value, key)
            }
        }
    }
}
