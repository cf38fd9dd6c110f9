//! Connectivity provider

use core::net::IpAddr;

/// Credentials for associating with the local network
///
/// Wired links ignore them.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkCredentials<'a> {
    /// Network name
    pub ssid: &'a str,
    /// Pre-shared key
    pub password: &'a str,
}

/// Network link that carries broker traffic
///
/// Implementations own association and address assignment (Wi-Fi join,
/// Ethernet link + DHCP). `connect` starts association and may return before
/// an address is assigned; `is_connected` reports whether the link is usable.
#[allow(async_fn_in_trait)]
pub trait Connectivity {
    /// Association failure reported by the link
    type Error: core::fmt::Debug;

    /// Begin (or retry) association with the network
    async fn connect(&mut self, credentials: &LinkCredentials<'_>) -> Result<(), Self::Error>;

    /// True once the link is up and has an address
    fn is_connected(&self) -> bool;

    /// Address assigned to this node, if any
    fn local_address(&self) -> Option<IpAddr>;
}

impl<T: Connectivity + ?Sized> Connectivity for &mut T {
    type Error = T::Error;

    async fn connect(&mut self, credentials: &LinkCredentials<'_>) -> Result<(), Self::Error> {
        T::connect(self, credentials).await
    }

    fn is_connected(&self) -> bool {
        T::is_connected(self)
    }

    fn local_address(&self) -> Option<IpAddr> {
        T::local_address(self)
    }
}
