use log::{error, info, warn};

use crate::errors::{AcquireError, BootError, DeviceError};
use crate::platform::{CameraDriver, Clock};
use crate::scheduler::AcquisitionSource;
use crate::state::{CameraState, ImageReading, Reading};

/// Sensor registers written once after every successful init. The writes are
/// idempotent; a failure is logged and never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuningParameter {
    Brightness,
    Contrast,
    Saturation,
    Sharpness,
    WhiteBalance,
    GainControl,
    ExposureControl,
    AwbGain,
    Aec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraTuning {
    /// -2..=2
    pub brightness: i32,
    /// -2..=2
    pub contrast: i32,
    /// -2..=2
    pub saturation: i32,
    pub sharpness: i32,
    pub white_balance: bool,
    pub gain_control: bool,
    pub exposure_control: bool,
    pub awb_gain: bool,
    pub aec2: bool,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            brightness: 2,
            contrast: 2,
            saturation: 2,
            sharpness: 2,
            white_balance: true,
            gain_control: true,
            exposure_control: true,
            awb_gain: true,
            aec2: true,
        }
    }
}

impl CameraTuning {
    fn entries(&self) -> [(TuningParameter, i32); 9] {
        [
            (TuningParameter::Brightness, self.brightness),
            (TuningParameter::Contrast, self.contrast),
            (TuningParameter::Saturation, self.saturation),
            (TuningParameter::Sharpness, self.sharpness),
            (TuningParameter::WhiteBalance, self.white_balance as i32),
            (TuningParameter::GainControl, self.gain_control as i32),
            (TuningParameter::ExposureControl, self.exposure_control as i32),
            (TuningParameter::AwbGain, self.awb_gain as i32),
            (TuningParameter::Aec2, self.aec2 as i32),
        ]
    }
}

/// Owns camera bring-up and recovery.
///
/// Init retries are strictly bounded; exhausting them at boot is fatal for
/// the node (the caller halts), while the same exhaustion from a liveness
/// probe only leaves the camera `Degraded` and the next probe tries again.
/// A camera that never worked is assumed misconfigured; one that degrades in
/// the field keeps getting retried indefinitely.
pub struct CameraManager<D: CameraDriver> {
    driver: D,
    tuning: CameraTuning,
    init_retries: u32,
    settle_ms: u32,
    state: CameraState,
}

impl<D: CameraDriver> CameraManager<D> {
    pub fn new(driver: D, tuning: CameraTuning, init_retries: u32, settle_ms: u32) -> Self {
        Self {
            driver,
            tuning,
            init_retries,
            settle_ms,
            state: CameraState::Uninitialized,
        }
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    /// Boot-time bring-up. Exhausting the retry bound here is unrecoverable
    /// for the camera variant; the caller decides how the device halts.
    pub fn establish(&mut self, clock: &dyn Clock) -> Result<(), BootError> {
        self.initialize(clock)
            .map_err(|_| BootError::CameraInitExhausted {
                attempts: self.init_retries,
            })
    }

    /// Up to `init_retries` attempts; every failed attempt is torn down
    /// before the next one, with a settle delay in between. Returns the last
    /// driver error when the bound is exhausted.
    pub fn initialize(&mut self, clock: &dyn Clock) -> Result<(), DeviceError> {
        let mut last = DeviceError(-1);
        for attempt in 1..=self.init_retries {
            match self.driver.power_up() {
                Ok(()) => {
                    self.apply_tuning();
                    self.state = CameraState::Ready;
                    info!("camera initialized (attempt {}/{})", attempt, self.init_retries);
                    return Ok(());
                }
                Err(err) => {
                    warn!(
                        "camera init failed with {}, attempt {}/{}",
                        err, attempt, self.init_retries
                    );
                    last = err;
                    self.driver.power_down();
                    clock.delay_ms(self.settle_ms);
                }
            }
        }

        if self.state != CameraState::Uninitialized {
            self.state = CameraState::Degraded;
        }
        Err(last)
    }

    /// Trial capture used purely to detect degradation. On failure the
    /// camera is torn down and reinitialized; if that fails too,
    /// `initialize` leaves it `Degraded` until the next probe.
    pub fn probe(&mut self, clock: &dyn Clock) {
        match self.driver.capture() {
            Ok(_) => {
                if self.state == CameraState::Degraded {
                    info!("camera recovered");
                }
                self.state = CameraState::Ready;
            }
            Err(err) => {
                warn!("camera liveness probe failed with {}, reinitializing", err);
                self.driver.power_down();
                if self.initialize(clock).is_err() {
                    error!("camera reinitialization failed, will retry next check");
                }
            }
        }
    }

    /// Single capture attempt. Not retried here; the next acquire cycle is
    /// the retry.
    pub fn try_acquire(&mut self) -> Result<Reading, AcquireError> {
        let bytes = self.driver.capture().map_err(AcquireError::Capture)?;
        Ok(Reading::Image(ImageReading { bytes }))
    }

    fn apply_tuning(&mut self) {
        for (parameter, value) in self.tuning.entries() {
            if let Err(err) = self.driver.set_parameter(parameter, value) {
                warn!("tuning write {:?}={} failed: {}", parameter, value, err);
            }
        }
    }
}

impl<D: CameraDriver> AcquisitionSource for CameraManager<D> {
    fn probe(&mut self, clock: &dyn Clock) {
        CameraManager::probe(self, clock);
    }

    fn try_acquire(&mut self) -> Result<Reading, AcquireError> {
        CameraManager::try_acquire(self)
    }
}
