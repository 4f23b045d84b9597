//! Device client adapter boundary.
//!
//! This module defines the capability traits the orchestrator drives devices
//! through, and the typed record shapes their queries return. No protocol
//! implementation lives here.

mod client;
mod types;

pub use client::{Credentials, DeviceClient, DeviceSession};
pub use types::{
    DeviceFacts, InterfaceInfo, LegacySwitchingPort, MacEntry, PortMode, PortTagness,
    SwitchingPort, Tagness, VlanInfo,
};
