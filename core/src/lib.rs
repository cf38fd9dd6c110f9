//! Platform-agnostic core logic for IoT firmware
//!
//! This crate contains business logic that can be shared across all
//! supported boards and tiers. It has NO hardware dependencies: sensors,
//! display, network link and broker transport come in through the traits
//! in `hal-abstractions`.
//!
//! ## Modules
//!
//! - **`estimator`**: raw gas ADC code to ppm-equivalent
//! - **`scheduler`**: fixed-interval sampling gate on a wrapping ms clock
//! - **`session`**: broker session ownership and bounded reconnect
//! - **`telemetry`**: the sample/render/publish cycle
//! - **`payload`**: wire encoding
//! - **`config`**: start-up configuration and validation
//! - **`identity`**: client ID derivation from hardware identifiers
//! - **`node`**: start-up helpers and the main polling loop
//!
//! ## Logging
//!
//! Enable `defmt` on firmware or `log` (default) on host builds.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod config;
pub mod error;
pub mod estimator;
pub mod identity;
pub mod node;
pub mod payload;
pub mod scheduler;
pub mod session;
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use config::{MqttConfig, NodeConfig, SamplingConfig, SessionConfig};
pub use error::{ConfigError, ConnectionError, PayloadError, PublishError};
pub use estimator::{Calibration, GasEstimator};
pub use identity::{client_id, ClientId};
pub use payload::TelemetryPayload;
pub use scheduler::SampleScheduler;
pub use session::{ConnectionState, SessionManager};
pub use telemetry::{CycleOutcome, DerivedMetrics, Reading, TelemetryLoop};
