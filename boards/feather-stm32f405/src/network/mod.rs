//! Network module
//!
//! Binds the link and broker seams from `hal-abstractions` to the W5500 and
//! embassy-net:
//! - **`error`**: Simple error enum for network operations
//! - **`link`**: Ethernet/DHCP link implementing `Connectivity`
//! - **`mqtt`**: `rust-mqtt` session implementing `MqttTransport`
//! - **`socket`**: Async TCP socket wrapper for embedded-io-async
//!
//! The `embassy-net` stack handles all TCP/IP protocol processing; the W5500
//! driver (`embassy-net-wiznet`) implements the driver trait internally.

pub mod error;
pub mod link;
pub mod mqtt;
pub mod socket;

pub use link::EthLink;
pub use mqtt::BrokerTransport;
