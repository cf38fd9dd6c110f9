#![deny(unsafe_code)]
//! Wired network link
//!
//! The W5500 carries Ethernet, so association is a no-op: the link is usable
//! once the PHY reports carrier and DHCP has assigned an address.

use core::convert::Infallible;
use core::net::{IpAddr, Ipv4Addr};

use defmt::{debug, info};
use embassy_net::Stack;
use hal_abstractions::{Connectivity, LinkCredentials};

/// [`Connectivity`] over the embassy-net stack
pub struct EthLink {
    stack: Stack<'static>,
}

impl EthLink {
    pub fn new(stack: Stack<'static>) -> Self {
        Self { stack }
    }
}

impl Connectivity for EthLink {
    type Error = Infallible;

    async fn connect(&mut self, credentials: &LinkCredentials<'_>) -> Result<(), Self::Error> {
        debug!(
            "Wired link, ignoring credentials for '{}'",
            credentials.ssid
        );
        info!("Waiting for DHCP...");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stack.is_link_up() && self.stack.config_v4().is_some()
    }

    fn local_address(&self) -> Option<IpAddr> {
        let config = self.stack.config_v4()?;
        if let Some(gateway) = config.gateway {
            let gw_octets = gateway.octets();
            info!(
                "Gateway: {}.{}.{}.{}",
                gw_octets[0], gw_octets[1], gw_octets[2], gw_octets[3]
            );
        }
        Some(IpAddr::V4(Ipv4Addr::from(config.address.address().octets())))
    }
}
