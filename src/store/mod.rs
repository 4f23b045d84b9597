//! Inventory store module.
//!
//! Owns the persisted Device, Interface, VLAN-assignment, MAC-table and
//! VLAN-catalog records and exposes the [`InventoryStore`] contract with two
//! backends: in-memory and JSON file.

mod contract;
mod data;
mod file;
mod memory;
mod types;

pub use contract::InventoryStore;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use types::{
    CatalogVlan, DeviceRecord, InterfaceRow, MacRow, NewDevice, SyncStatus, VlanRow,
    DEFAULT_PLATFORM, DEFAULT_VENDOR, VLAN_ID_MAX, VLAN_ID_MIN,
};
