//! End-to-end scenarios driving the full scheduler with scripted drivers and
//! a virtual clock.

use std::cell::{Cell, RefCell};
use std::net::Ipv4Addr;
use std::rc::Rc;

use warehouse_node::camera::{CameraManager, CameraTuning, TuningParameter};
use warehouse_node::configuration::WifiSettings;
use warehouse_node::errors::{DeviceError, TransportError};
use warehouse_node::platform::{
    CameraDriver, Clock, Entropy, HttpResponse, HttpTransport, Indicator, WifiDriver,
};
use warehouse_node::scheduler::Scheduler;
use warehouse_node::state::CameraState;
use warehouse_node::uplink::UplinkSender;
use warehouse_node::wifi::LinkManager;

struct TestClock(Cell<u32>);

impl TestClock {
    fn new() -> Self {
        Self(Cell::new(0))
    }

    fn set(&self, now: u32) {
        self.0.set(now);
    }
}

impl Clock for TestClock {
    fn now_ms(&self) -> u32 {
        self.0.get()
    }

    fn delay_ms(&self, ms: u32) {
        self.0.set(self.0.get().wrapping_add(ms));
    }
}

#[derive(Clone)]
struct FakeWifi {
    associated: Rc<Cell<bool>>,
}

impl FakeWifi {
    fn up() -> Self {
        Self {
            associated: Rc::new(Cell::new(true)),
        }
    }
}

impl WifiDriver for FakeWifi {
    fn configure(&mut self, _settings: &WifiSettings) -> Result<(), DeviceError> {
        Ok(())
    }

    fn connect(&mut self) -> Result<(), DeviceError> {
        self.associated.set(true);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.associated.set(false);
    }

    fn is_associated(&self) -> bool {
        self.associated.get()
    }

    fn ip_address(&self) -> Option<Ipv4Addr> {
        Some(Ipv4Addr::new(192, 168, 252, 100))
    }
}

/// Wifi that never associates, for link-down scenarios.
#[derive(Clone)]
struct DeadWifi;

impl WifiDriver for DeadWifi {
    fn configure(&mut self, _settings: &WifiSettings) -> Result<(), DeviceError> {
        Ok(())
    }

    fn connect(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn disconnect(&mut self) {}

    fn is_associated(&self) -> bool {
        false
    }

    fn ip_address(&self) -> Option<Ipv4Addr> {
        None
    }
}

#[derive(Clone)]
struct FakeCamera {
    capture_fails: Rc<Cell<bool>>,
    init_fails: Rc<Cell<bool>>,
    init_attempts: Rc<Cell<u32>>,
}

impl FakeCamera {
    fn working() -> Self {
        Self {
            capture_fails: Rc::new(Cell::new(false)),
            init_fails: Rc::new(Cell::new(false)),
            init_attempts: Rc::new(Cell::new(0)),
        }
    }
}

impl CameraDriver for FakeCamera {
    fn power_up(&mut self) -> Result<(), DeviceError> {
        self.init_attempts.set(self.init_attempts.get() + 1);
        if self.init_fails.get() {
            Err(DeviceError(0x105))
        } else {
            Ok(())
        }
    }

    fn power_down(&mut self) {}

    fn capture(&mut self) -> Result<Vec<u8>, DeviceError> {
        if self.capture_fails.get() {
            Err(DeviceError(0x20001))
        } else {
            let mut frame = vec![0xff, 0xd8];
            frame.resize(4_000, 0xaa);
            frame.extend_from_slice(&[0xff, 0xd9]);
            Ok(frame)
        }
    }

    fn set_parameter(&mut self, _parameter: TuningParameter, _value: i32) -> Result<(), DeviceError> {
        Ok(())
    }
}

#[derive(Clone)]
struct FakeTransport {
    calls: Rc<RefCell<Vec<Vec<u8>>>>,
    reply_body: Rc<RefCell<Vec<u8>>>,
}

impl FakeTransport {
    fn replying(body: &str) -> Self {
        Self {
            calls: Rc::new(RefCell::new(Vec::new())),
            reply_body: Rc::new(RefCell::new(body.as_bytes().to_vec())),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl HttpTransport for FakeTransport {
    fn post(
        &mut self,
        _url: &str,
        _content_type: &str,
        body: &[u8],
        _timeout_ms: u32,
    ) -> Result<HttpResponse, TransportError> {
        self.calls.borrow_mut().push(body.to_vec());
        Ok(HttpResponse {
            status: 200,
            body: self.reply_body.borrow().clone(),
        })
    }
}

#[derive(Clone, Default)]
struct FakeIndicator {
    transitions: Rc<RefCell<Vec<bool>>>,
}

impl Indicator for FakeIndicator {
    fn set(&mut self, on: bool) {
        self.transitions.borrow_mut().push(on);
    }
}

struct FakeEntropy;

impl Entropy for FakeEntropy {
    fn random_u32(&mut self) -> u32 {
        0xdead_beef
    }
}

fn settings() -> WifiSettings {
    WifiSettings {
        ssid: "warehouse".to_string(),
        password: "secret".to_string(),
        static_ip: None,
    }
}

fn uplink(transport: FakeTransport, indicator: FakeIndicator) -> UplinkSender<FakeTransport, FakeIndicator, FakeEntropy> {
    UplinkSender::new(
        transport,
        indicator,
        FakeEntropy,
        "http://192.168.0.106:5000/upload_image".to_string(),
        1_000,
        5_000,
        1_000,
    )
}

#[test]
fn image_cycle_uploads_and_pulses_on_detection() {
    let clock = TestClock::new();
    let camera = FakeCamera::working();
    let mut manager = CameraManager::new(camera, CameraTuning::default(), 3, 500);
    manager.initialize(&clock).unwrap();

    let transport = FakeTransport::replying("{\"qr_code\":\"ABC123\"}");
    let indicator = FakeIndicator::default();
    let link = LinkManager::new(FakeWifi::up(), settings(), 500, 5_000);
    let mut sched = Scheduler::new(
        &clock,
        link,
        manager,
        uplink(transport.clone(), indicator.clone()),
        None,
        5_000,
        10_000,
        5_000,
    );

    clock.set(5_000);
    sched.tick(&clock);

    assert_eq!(transport.call_count(), 1);
    assert_eq!(*indicator.transitions.borrow(), vec![true, false]);
}

#[test]
fn link_down_at_acquire_time_skips_the_upload() {
    let clock = TestClock::new();
    let camera = FakeCamera::working();
    let mut manager = CameraManager::new(camera, CameraTuning::default(), 3, 500);
    manager.initialize(&clock).unwrap();

    let transport = FakeTransport::replying("{}");
    let link = LinkManager::new(DeadWifi, settings(), 500, 5_000);
    let mut sched = Scheduler::new(
        &clock,
        link,
        manager,
        uplink(transport.clone(), FakeIndicator::default()),
        None,
        // Network check disabled for this scenario so the tick exercises only
        // the acquire path.
        1_000_000,
        1_000_000,
        5_000,
    );

    clock.set(5_000);
    sched.tick(&clock);

    assert_eq!(transport.call_count(), 0);
}

#[test]
fn degraded_camera_recovers_through_the_peripheral_check() {
    let clock = TestClock::new();
    let camera = FakeCamera::working();
    let mut manager = CameraManager::new(camera.clone(), CameraTuning::default(), 3, 500);
    manager.initialize(&clock).unwrap();
    assert_eq!(manager.state(), CameraState::Ready);

    // Camera dies in the field: probe fails, reinit fails too.
    camera.capture_fails.set(true);
    camera.init_fails.set(true);
    manager.probe(&clock);
    assert_eq!(manager.state(), CameraState::Degraded);

    // Recovery attempts keep coming with no bound. Third check succeeds.
    manager.probe(&clock);
    assert_eq!(manager.state(), CameraState::Degraded);

    camera.capture_fails.set(false);
    camera.init_fails.set(false);
    manager.probe(&clock);
    assert_eq!(manager.state(), CameraState::Ready);
}

#[test]
fn boot_init_exhaustion_is_bounded() {
    let clock = TestClock::new();
    let camera = FakeCamera::working();
    camera.init_fails.set(true);
    let mut manager = CameraManager::new(camera.clone(), CameraTuning::default(), 3, 500);

    assert!(manager.initialize(&clock).is_err());
    assert_eq!(camera.init_attempts.get(), 3);
    assert_eq!(manager.state(), CameraState::Uninitialized);
    // Each failed attempt waited out the settle delay.
    assert_eq!(clock.now_ms(), 1_500);
}
