//! Hardware abstraction traits for IoT firmware
//!
//! This crate defines traits that abstract over hardware differences
//! between boards. BSPs implement these traits; `iot-core` consumes them.
//!
//! - **`sensor`**: environmental sensor provider and the tagged `Measurement`
//! - **`display`**: character display sink
//! - **`network`**: connectivity provider (link association and addressing)
//! - **`mqtt`**: broker transport used by the session manager
//! - **`clock`**: monotonic millisecond clock

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod clock;
pub mod display;
pub mod mqtt;
pub mod network;
pub mod sensor;

pub use clock::Clock;
pub use display::DisplaySink;
pub use mqtt::{ConnectOptions, MqttTransport};
pub use network::{Connectivity, LinkCredentials};
pub use sensor::{ClimateReading, Measurement, SensorProvider};
