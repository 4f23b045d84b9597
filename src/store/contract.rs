//! Inventory store trait definition.
//!
//! This module defines the common interface for inventory backends. Bulk
//! writes are atomic per call: all rows of one batch commit or none do.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::device::PortTagness;
use crate::error::Result;

use super::types::{
    CatalogVlan, DeviceRecord, InterfaceRow, MacRow, NewDevice, SyncStatus, VlanRow,
};

/// Trait for inventory storage backends.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Checks whether a device with the given management address exists.
    async fn exists_by_address(&self, address: &str) -> Result<bool>;

    /// Registers a new device and returns its id.
    ///
    /// Fails with a typed duplicate error when the address is already
    /// registered; this is the backstop behind the chain-start guard.
    async fn insert_device(&self, new: NewDevice) -> Result<i64>;

    /// Fetches a device record by id.
    async fn get_device(&self, device_id: i64) -> Result<DeviceRecord>;

    /// Resolves a device id to its management address.
    async fn address_of(&self, device_id: i64) -> Result<String>;

    /// Lists all registered devices.
    async fn list_devices(&self) -> Result<Vec<DeviceRecord>>;

    /// Updates a device's sync status, optionally stamping last-synced.
    async fn set_sync_status(
        &self,
        device_id: i64,
        status: SyncStatus,
        last_synced: Option<DateTime<Utc>>,
    ) -> Result<()>;

    /// Deletes a device, cascading to its owned rows.
    async fn delete_device(&self, device_id: i64) -> Result<()>;

    /// Lists the device's interface rows.
    async fn list_interfaces(&self, device_id: i64) -> Result<Vec<InterfaceRow>>;

    /// Bulk-upserts interface rows keyed by (device, name).
    async fn upsert_interfaces(&self, device_id: i64, rows: &[InterfaceRow]) -> Result<usize>;

    /// Bulk-updates tagness on existing interface rows matched by name.
    /// Never creates rows; returns the number updated.
    async fn update_interface_tagness(
        &self,
        device_id: i64,
        rows: &[PortTagness],
    ) -> Result<usize>;

    /// Lists the device's recorded VLAN rows.
    async fn get_vlans(&self, device_id: i64) -> Result<Vec<VlanRow>>;

    /// Bulk-inserts VLAN rows under the (device, VLAN id) uniqueness
    /// constraint.
    async fn insert_vlans(&self, device_id: i64, rows: &[VlanRow]) -> Result<usize>;

    /// Lists the device's MAC-table rows.
    async fn list_macs(&self, device_id: i64) -> Result<Vec<MacRow>>;

    /// Replaces the device's MAC table wholesale.
    async fn replace_mac_table(&self, device_id: i64, rows: &[MacRow]) -> Result<usize>;

    /// Lists the global VLAN pool ordered by VLAN id.
    async fn list_catalog(&self) -> Result<Vec<CatalogVlan>>;

    /// Adds a VLAN to the global pool (id unique, 1-4094).
    async fn insert_catalog_vlan(&self, vlan: CatalogVlan) -> Result<()>;

    /// Gets the backend type name.
    fn backend_type(&self) -> &'static str;
}

#[async_trait]
impl InventoryStore for Box<dyn InventoryStore> {
    async fn exists_by_address(&self, address: &str) -> Result<bool> {
        (**self).exists_by_address(address).await
    }

    async fn insert_device(&self, new: NewDevice) -> Result<i64> {
        (**self).insert_device(new).await
    }

    async fn get_device(&self, device_id: i64) -> Result<DeviceRecord> {
        (**self).get_device(device_id).await
    }

    async fn address_of(&self, device_id: i64) -> Result<String> {
        (**self).address_of(device_id).await
    }

    async fn list_devices(&self) -> Result<Vec<DeviceRecord>> {
        (**self).list_devices().await
    }

    async fn set_sync_status(
        &self,
        device_id: i64,
        status: SyncStatus,
        last_synced: Option<DateTime<Utc>>,
    ) -> Result<()> {
        (**self).set_sync_status(device_id, status, last_synced).await
    }

    async fn delete_device(&self, device_id: i64) -> Result<()> {
        (**self).delete_device(device_id).await
    }

    async fn list_interfaces(&self, device_id: i64) -> Result<Vec<InterfaceRow>> {
        (**self).list_interfaces(device_id).await
    }

    async fn upsert_interfaces(&self, device_id: i64, rows: &[InterfaceRow]) -> Result<usize> {
        (**self).upsert_interfaces(device_id, rows).await
    }

    async fn update_interface_tagness(
        &self,
        device_id: i64,
        rows: &[PortTagness],
    ) -> Result<usize> {
        (**self).update_interface_tagness(device_id, rows).await
    }

    async fn get_vlans(&self, device_id: i64) -> Result<Vec<VlanRow>> {
        (**self).get_vlans(device_id).await
    }

    async fn insert_vlans(&self, device_id: i64, rows: &[VlanRow]) -> Result<usize> {
        (**self).insert_vlans(device_id, rows).await
    }

    async fn list_macs(&self, device_id: i64) -> Result<Vec<MacRow>> {
        (**self).list_macs(device_id).await
    }

    async fn replace_mac_table(&self, device_id: i64, rows: &[MacRow]) -> Result<usize> {
        (**self).replace_mac_table(device_id, rows).await
    }

    async fn list_catalog(&self) -> Result<Vec<CatalogVlan>> {
        (**self).list_catalog().await
    }

    async fn insert_catalog_vlan(&self, vlan: CatalogVlan) -> Result<()> {
        (**self).insert_catalog_vlan(vlan).await
    }

    fn backend_type(&self) -> &'static str {
        (**self).backend_type()
    }
}
