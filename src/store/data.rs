//! In-memory inventory tables shared by the store backends.
//!
//! All record-level semantics live here: address uniqueness, the
//! (device, interface name) upsert key, the (device, VLAN id) uniqueness
//! constraint, cascade deletes and catalog validation. Every mutating
//! operation validates its whole batch before applying anything, so a call
//! either commits all of its rows or none of them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::device::PortTagness;
use crate::error::StoreError;

use super::types::{
    CatalogVlan, DeviceRecord, InterfaceRow, MacRow, NewDevice, SyncStatus, VlanRow, VLAN_ID_MAX,
    VLAN_ID_MIN,
};

/// The complete inventory data set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct InventoryData {
    /// Next id handed to a newly registered device.
    next_device_id: i64,
    /// Device records by id.
    devices: BTreeMap<i64, DeviceRecord>,
    /// Interface rows by owning device id.
    interfaces: BTreeMap<i64, Vec<InterfaceRow>>,
    /// VLAN assignment rows by owning device id.
    vlans: BTreeMap<i64, Vec<VlanRow>>,
    /// MAC-table rows by owning device id.
    macs: BTreeMap<i64, Vec<MacRow>>,
    /// The global VLAN pool.
    catalog: Vec<CatalogVlan>,
}

impl InventoryData {
    fn device_exists(&self, device_id: i64) -> Result<(), StoreError> {
        if self.devices.contains_key(&device_id) {
            Ok(())
        } else {
            Err(StoreError::not_found("Device", device_id.to_string()))
        }
    }

    pub(crate) fn exists_by_address(&self, address: &str) -> bool {
        self.devices.values().any(|d| d.address == address)
    }

    pub(crate) fn insert_device(&mut self, new: NewDevice) -> Result<i64, StoreError> {
        if self.exists_by_address(&new.address) {
            return Err(StoreError::DuplicateDevice {
                address: new.address,
            });
        }

        self.next_device_id += 1;
        let id = self.next_device_id;

        self.devices.insert(
            id,
            DeviceRecord {
                id,
                hostname: new.hostname,
                address: new.address,
                platform: new.platform,
                vendor: new.vendor,
                model: new.model,
                os_version: new.os_version,
                serial: new.serial,
                sync_status: SyncStatus::Pending,
                last_synced: None,
            },
        );

        Ok(id)
    }

    pub(crate) fn get_device(&self, device_id: i64) -> Result<DeviceRecord, StoreError> {
        self.devices
            .get(&device_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Device", device_id.to_string()))
    }

    pub(crate) fn address_of(&self, device_id: i64) -> Result<String, StoreError> {
        Ok(self.get_device(device_id)?.address)
    }

    pub(crate) fn list_devices(&self) -> Vec<DeviceRecord> {
        self.devices.values().cloned().collect()
    }

    pub(crate) fn set_sync_status(
        &mut self,
        device_id: i64,
        status: SyncStatus,
        last_synced: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let device = self
            .devices
            .get_mut(&device_id)
            .ok_or_else(|| StoreError::not_found("Device", device_id.to_string()))?;

        device.sync_status = status;
        if last_synced.is_some() {
            device.last_synced = last_synced;
        }
        Ok(())
    }

    /// Deletes a device and cascades to its interfaces, VLANs and MAC rows.
    pub(crate) fn delete_device(&mut self, device_id: i64) -> Result<(), StoreError> {
        self.device_exists(device_id)?;
        self.devices.remove(&device_id);
        self.interfaces.remove(&device_id);
        self.vlans.remove(&device_id);
        self.macs.remove(&device_id);
        Ok(())
    }

    pub(crate) fn list_interfaces(&self, device_id: i64) -> Result<Vec<InterfaceRow>, StoreError> {
        self.device_exists(device_id)?;
        Ok(self.interfaces.get(&device_id).cloned().unwrap_or_default())
    }

    /// Upserts interface rows keyed by (device, name).
    ///
    /// On conflict the status, description and hardware-address fields are
    /// updated; an existing tagness classification is preserved since only
    /// the switching-table cross-check writes it.
    pub(crate) fn upsert_interfaces(
        &mut self,
        device_id: i64,
        rows: &[InterfaceRow],
    ) -> Result<usize, StoreError> {
        self.device_exists(device_id)?;

        let table = self.interfaces.entry(device_id).or_default();
        for row in rows {
            match table.iter_mut().find(|r| r.name == row.name) {
                Some(existing) => {
                    existing.oper_status = row.oper_status.clone();
                    existing.admin_status = row.admin_status.clone();
                    existing.description = row.description.clone();
                    existing.mac_address = row.mac_address.clone();
                }
                None => table.push(row.clone()),
            }
        }
        Ok(rows.len())
    }

    /// Updates tagness on existing interface rows matched by name.
    ///
    /// Rows with no matching interface are skipped; this operation never
    /// creates rows. Returns the number of rows actually updated.
    pub(crate) fn update_interface_tagness(
        &mut self,
        device_id: i64,
        rows: &[PortTagness],
    ) -> Result<usize, StoreError> {
        self.device_exists(device_id)?;

        let Some(table) = self.interfaces.get_mut(&device_id) else {
            return Ok(0);
        };

        let mut updated = 0;
        for row in rows {
            if let Some(existing) = table.iter_mut().find(|r| r.name == row.interface) {
                existing.tagness = Some(row.tagness);
                updated += 1;
            }
        }
        Ok(updated)
    }

    pub(crate) fn get_vlans(&self, device_id: i64) -> Result<Vec<VlanRow>, StoreError> {
        self.device_exists(device_id)?;
        Ok(self.vlans.get(&device_id).cloned().unwrap_or_default())
    }

    /// Inserts VLAN rows, enforcing (device, VLAN id) uniqueness over both
    /// the stored rows and the batch itself. The whole batch is rejected on
    /// the first duplicate.
    pub(crate) fn insert_vlans(
        &mut self,
        device_id: i64,
        rows: &[VlanRow],
    ) -> Result<usize, StoreError> {
        self.device_exists(device_id)?;

        let table = self.vlans.entry(device_id).or_default();

        let mut seen: Vec<u16> = table.iter().map(|v| v.vlan_id).collect();
        for row in rows {
            if seen.contains(&row.vlan_id) {
                return Err(StoreError::DuplicateVlan {
                    device_id,
                    vlan_id: row.vlan_id,
                });
            }
            seen.push(row.vlan_id);
        }

        table.extend(rows.iter().cloned());
        Ok(rows.len())
    }

    pub(crate) fn list_macs(&self, device_id: i64) -> Result<Vec<MacRow>, StoreError> {
        self.device_exists(device_id)?;
        Ok(self.macs.get(&device_id).cloned().unwrap_or_default())
    }

    /// Replaces the device's MAC table wholesale.
    pub(crate) fn replace_mac_table(
        &mut self,
        device_id: i64,
        rows: &[MacRow],
    ) -> Result<usize, StoreError> {
        self.device_exists(device_id)?;
        self.macs.insert(device_id, rows.to_vec());
        Ok(rows.len())
    }

    /// Lists the global VLAN pool ordered by VLAN id.
    pub(crate) fn list_catalog(&self) -> Vec<CatalogVlan> {
        let mut pool = self.catalog.clone();
        pool.sort_by_key(|v| v.vlan_id);
        pool
    }

    pub(crate) fn insert_catalog_vlan(&mut self, vlan: CatalogVlan) -> Result<(), StoreError> {
        if !(VLAN_ID_MIN..=VLAN_ID_MAX).contains(&vlan.vlan_id) {
            return Err(StoreError::VlanIdOutOfRange {
                vlan_id: vlan.vlan_id,
            });
        }
        if self.catalog.iter().any(|v| v.vlan_id == vlan.vlan_id) {
            return Err(StoreError::DuplicateCatalogVlan {
                vlan_id: vlan.vlan_id,
            });
        }
        self.catalog.push(vlan);
        Ok(())
    }
}
