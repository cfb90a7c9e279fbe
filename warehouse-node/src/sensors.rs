use log::warn;

use crate::errors::AcquireError;
use crate::platform::{Clock, SensorDriver};
use crate::scheduler::AcquisitionSource;
use crate::state::Reading;

/// Acquisition source for the sensor variant (temperature/humidity/weight).
/// The sensor bank has no bring-up lifecycle; the periodic check is just a
/// trial read so a flaky sensor shows up in the log before the next upload.
pub struct TelemetrySource<S: SensorDriver> {
    driver: S,
}

impl<S: SensorDriver> TelemetrySource<S> {
    pub fn new(driver: S) -> Self {
        Self { driver }
    }
}

impl<S: SensorDriver> AcquisitionSource for TelemetrySource<S> {
    fn probe(&mut self, _clock: &dyn Clock) {
        match self.driver.read() {
            Ok(reading) if !reading.is_finite() => {
                warn!("sensor probe returned non-finite values");
            }
            Ok(_) => {}
            Err(err) => warn!("sensor probe failed: {}", err),
        }
    }

    fn try_acquire(&mut self) -> Result<Reading, AcquireError> {
        let reading = self.driver.read().map_err(AcquireError::SensorRead)?;
        Ok(Reading::Telemetry(reading))
    }
}
