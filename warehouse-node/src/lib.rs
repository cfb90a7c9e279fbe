//! Core logic for a battery/mains powered warehouse monitoring node that
//! periodically acquires a camera frame or an environment reading and uploads
//! it to a collection server over wifi.
//!
//! Everything platform-specific sits behind the traits in [`platform`]; the
//! state machines and the tick loop are plain single-threaded Rust driven by
//! an injected clock, so the whole node can run against scripted drivers on a
//! host as well as on the device.

pub mod camera;
pub mod configuration;
pub mod errors;
pub mod httpd;
pub mod platform;
pub mod scheduler;
pub mod sensors;
pub mod state;
pub mod uplink;
pub mod wifi;
