//! SDR device layer: a driver-agnostic interface plus the hardware and
//! synthetic implementations behind it.

pub mod device;
pub mod rtlsdr_source;
pub mod synthetic;

pub use device::{DeviceConfig, GainMode, SdrDevice};
pub use rtlsdr_source::RtlSdrDevice;
pub use synthetic::SyntheticDevice;
