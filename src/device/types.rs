//! Typed results for device adapter queries.
//!
//! Every read RPC the adapter exposes is normalized into one of these record
//! shapes before the orchestrator looks at it. VLAN ids arrive from devices
//! as text and are kept as text here; normalization to integers happens in
//! the reconciliation step.

use serde::{Deserialize, Serialize};

/// Identity facts retrieved from a device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceFacts {
    /// Device hostname.
    pub hostname: String,
    /// Operating system version string.
    pub os_version: String,
    /// Hardware model.
    pub model: String,
    /// Chassis serial number.
    pub serial: String,
}

/// One Ethernet interface as reported by the interface-table query.
///
/// Layer-3-only interfaces are excluded by the adapter; only switching
/// interfaces appear here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InterfaceInfo {
    /// Interface name, e.g. `ge-0/0/1`.
    pub name: String,
    /// Operational status (`up`/`down`).
    pub oper_status: String,
    /// Administrative status (`up`/`down`).
    pub admin_status: String,
    /// Configured description, if any.
    pub description: Option<String>,
    /// Hardware (MAC) address.
    pub mac_address: String,
}

/// One VLAN as reported by the VLAN-table query.
///
/// The id is the raw text the device sent; it is parsed to an integer during
/// reconciliation so unparseable ids surface as query errors there.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VlanInfo {
    /// VLAN id as text, e.g. `"100"`.
    pub vlan_id: String,
    /// VLAN name, if the device reported one.
    pub name: Option<String>,
}

/// One entry of the device MAC (ethernet-switching) table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MacEntry {
    /// Learned MAC address.
    pub address: String,
    /// VLAN the address was learned on.
    pub vlan_id: u16,
    /// Interface the address was learned on.
    pub interface: String,
}

/// Tagness classification of a switching interface.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Tagness {
    /// The interface carries VLAN traffic tagged.
    Tagged,
    /// The interface carries VLAN traffic untagged.
    Untagged,
}

impl std::fmt::Display for Tagness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tagged => write!(f, "tagged"),
            Self::Untagged => write!(f, "untagged"),
        }
    }
}

/// One switching interface in the modern query response shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SwitchingPort {
    /// Interface name, possibly with a logical unit suffix (`ge-0/0/1.0`).
    pub interface: String,
    /// Tagging attribute as text (`tagged`/`untagged`).
    pub tagging: String,
}

/// One switching interface in the legacy query response shape.
///
/// Older device software reports a port mode instead of a per-interface
/// tagging attribute; `trunk` maps to tagged, `access` to untagged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LegacySwitchingPort {
    /// Interface name, possibly with a logical unit suffix.
    pub interface: String,
    /// Port mode as text (`trunk`/`access`).
    pub port_mode: String,
}

/// Normalized tagness for one physical interface.
///
/// Both switching-query response shapes are converted into this record
/// before the inventory update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortTagness {
    /// Physical interface name with any unit suffix stripped.
    pub interface: String,
    /// Normalized tagness.
    pub tagness: Tagness,
}

/// Port membership mode for VLAN-assignment config pushes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PortMode {
    /// Untagged single-VLAN membership.
    Access,
    /// Tagged multi-VLAN membership.
    Trunk,
}

impl std::fmt::Display for PortMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Access => write!(f, "access"),
            Self::Trunk => write!(f, "trunk"),
        }
    }
}
