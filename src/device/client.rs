//! Device client capability traits.
//!
//! The raw management-protocol client is an external capability: the engine
//! only needs to open a session, run typed read queries, push configuration
//! and close. Implementations live outside this crate (a NETCONF client in
//! production, scripted fakes in tests); everything behind these traits
//! surfaces failures as [`DeviceError`](crate::error::DeviceError) values.

use async_trait::async_trait;

use crate::error::Result;

use super::types::{
    DeviceFacts, InterfaceInfo, LegacySwitchingPort, MacEntry, SwitchingPort, VlanInfo,
};

/// Credentials used to open management sessions.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Login user.
    pub username: String,
    /// Login password.
    pub password: String,
}

impl Credentials {
    /// Creates a new credential pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Entry point of the device adapter: reachability probe and session setup.
#[async_trait]
pub trait DeviceClient: Send + Sync {
    /// Probes reachability of the target (ICMP-equivalent).
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Unreachable`](crate::error::DeviceError::Unreachable)
    /// when the probe fails.
    async fn ping(&self, host: &str) -> Result<()>;

    /// Opens a management session to the target.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::AuthFailed`](crate::error::DeviceError::AuthFailed)
    /// when the session cannot be established.
    async fn open(&self, host: &str, credentials: &Credentials) -> Result<Box<dyn DeviceSession>>;
}

/// An open management session to one device.
///
/// Connect and RPC timeouts are the implementation's responsibility; the
/// orchestrator applies none of its own.
#[async_trait]
pub trait DeviceSession: Send {
    /// Retrieves identity facts.
    async fn facts(&mut self) -> Result<DeviceFacts>;

    /// Enumerates Ethernet switching interfaces.
    async fn interfaces(&mut self) -> Result<Vec<InterfaceInfo>>;

    /// Enumerates configured VLANs.
    async fn vlans(&mut self) -> Result<Vec<VlanInfo>>;

    /// Retrieves the MAC (ethernet-switching) table.
    async fn mac_table(&mut self) -> Result<Vec<MacEntry>>;

    /// Retrieves switching-interface details in the modern response shape.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::UnsupportedQuery`](crate::error::DeviceError::UnsupportedQuery)
    /// on device software that only speaks the legacy shape.
    async fn switching_ports(&mut self) -> Result<Vec<SwitchingPort>>;

    /// Retrieves switching-interface details in the legacy response shape.
    async fn switching_ports_legacy(&mut self) -> Result<Vec<LegacySwitchingPort>>;

    /// Loads the given configuration stanzas and commits them with a comment.
    async fn push_config(&mut self, stanzas: &str, comment: &str) -> Result<()>;

    /// Closes the session. Errors during close are ignored by callers.
    async fn close(&mut self);
}
