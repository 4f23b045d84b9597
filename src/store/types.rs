//! Inventory record types.
//!
//! These types represent the persisted source-of-truth records the
//! orchestrator keeps in sync with live device state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::device::Tagness;

/// Lowest valid VLAN id.
pub const VLAN_ID_MIN: u16 = 1;

/// Highest valid VLAN id.
pub const VLAN_ID_MAX: u16 = 4094;

/// Platform recorded for devices registered by the engine.
pub const DEFAULT_PLATFORM: &str = "juniper";

/// Vendor recorded when a device does not report one.
pub const DEFAULT_VENDOR: &str = "Generic";

/// Synchronization state of a registered device.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Registered but not yet fully inventoried.
    Pending,
    /// The provisioning chain reached its terminal step.
    Synced,
    /// A chain step failed after registration.
    Failed,
}

/// A registered network device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Store-assigned device id.
    pub id: i64,
    /// Device hostname.
    pub hostname: String,
    /// Management address; unique across the store.
    pub address: String,
    /// Platform string.
    pub platform: String,
    /// Vendor string.
    pub vendor: String,
    /// Hardware model.
    pub model: String,
    /// Operating system version.
    pub os_version: String,
    /// Chassis serial number.
    pub serial: String,
    /// Synchronization state.
    pub sync_status: SyncStatus,
    /// When the device last reached the synced state.
    pub last_synced: Option<DateTime<Utc>>,
}

/// Fields for registering a new device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDevice {
    /// Device hostname.
    pub hostname: String,
    /// Management address.
    pub address: String,
    /// Platform string.
    pub platform: String,
    /// Vendor string.
    pub vendor: String,
    /// Hardware model.
    pub model: String,
    /// Operating system version.
    pub os_version: String,
    /// Chassis serial number.
    pub serial: String,
}

/// One interface row; unique per (device, name).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InterfaceRow {
    /// Interface name.
    pub name: String,
    /// Operational status.
    pub oper_status: String,
    /// Administrative status.
    pub admin_status: String,
    /// Configured description, if any.
    pub description: Option<String>,
    /// Hardware (MAC) address.
    pub mac_address: String,
    /// Tagness classification; set only by the switching-table cross-check.
    pub tagness: Option<Tagness>,
}

/// One VLAN assignment row; unique per (device, VLAN id).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VlanRow {
    /// VLAN id.
    pub vlan_id: u16,
    /// VLAN name.
    pub name: String,
}

/// One MAC-table row for a device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MacRow {
    /// Learned MAC address.
    pub address: String,
    /// VLAN the address was learned on.
    pub vlan_id: u16,
    /// Interface the address was learned on.
    pub interface: String,
}

/// One entry of the organization-wide VLAN pool.
///
/// The catalog has an independent lifecycle; the orchestrator never touches
/// it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogVlan {
    /// VLAN id; unique across the pool, 1-4094.
    pub vlan_id: u16,
    /// VLAN name.
    pub name: String,
    /// Optional category, e.g. `user`, `voice`, `management`.
    pub category: Option<String>,
    /// Optional free-form description.
    pub description: Option<String>,
}

impl NewDevice {
    /// Builds a registration record from collected facts and an address,
    /// using the default platform and vendor strings.
    #[must_use]
    pub fn from_facts(address: &str, facts: &crate::device::DeviceFacts) -> Self {
        Self {
            hostname: facts.hostname.clone(),
            address: address.to_string(),
            platform: DEFAULT_PLATFORM.to_string(),
            vendor: DEFAULT_VENDOR.to_string(),
            model: facts.model.clone(),
            os_version: facts.os_version.clone(),
            serial: facts.serial.clone(),
        }
    }
}

impl DeviceRecord {
    /// Returns true if the device has completed at least one full sync.
    #[must_use]
    pub const fn is_synced(&self) -> bool {
        matches!(self.sync_status, SyncStatus::Synced)
    }
}
