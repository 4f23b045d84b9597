//! In-process inventory backend.
//!
//! Holds the full inventory behind one `RwLock`; each call runs under a
//! single lock acquisition, which makes bulk writes trivially atomic.
//! Suited for tests and single-process deployments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::device::PortTagness;
use crate::error::Result;

use super::contract::InventoryStore;
use super::data::InventoryData;
use super::types::{
    CatalogVlan, DeviceRecord, InterfaceRow, MacRow, NewDevice, SyncStatus, VlanRow,
};

/// In-memory inventory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// The inventory tables.
    data: RwLock<InventoryData>,
}

impl MemoryStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn exists_by_address(&self, address: &str) -> Result<bool> {
        Ok(self.data.read().await.exists_by_address(address))
    }

    async fn insert_device(&self, new: NewDevice) -> Result<i64> {
        Ok(self.data.write().await.insert_device(new)?)
    }

    async fn get_device(&self, device_id: i64) -> Result<DeviceRecord> {
        Ok(self.data.read().await.get_device(device_id)?)
    }

    async fn address_of(&self, device_id: i64) -> Result<String> {
        Ok(self.data.read().await.address_of(device_id)?)
    }

    async fn list_devices(&self) -> Result<Vec<DeviceRecord>> {
        Ok(self.data.read().await.list_devices())
    }

    async fn set_sync_status(
        &self,
        device_id: i64,
        status: SyncStatus,
        last_synced: Option<DateTime<Utc>>,
    ) -> Result<()> {
        Ok(self
            .data
            .write()
            .await
            .set_sync_status(device_id, status, last_synced)?)
    }

    async fn delete_device(&self, device_id: i64) -> Result<()> {
        Ok(self.data.write().await.delete_device(device_id)?)
    }

    async fn list_interfaces(&self, device_id: i64) -> Result<Vec<InterfaceRow>> {
        Ok(self.data.read().await.list_interfaces(device_id)?)
    }

    async fn upsert_interfaces(&self, device_id: i64, rows: &[InterfaceRow]) -> Result<usize> {
        Ok(self.data.write().await.upsert_interfaces(device_id, rows)?)
    }

    async fn update_interface_tagness(
        &self,
        device_id: i64,
        rows: &[PortTagness],
    ) -> Result<usize> {
        Ok(self
            .data
            .write()
            .await
            .update_interface_tagness(device_id, rows)?)
    }

    async fn get_vlans(&self, device_id: i64) -> Result<Vec<VlanRow>> {
        Ok(self.data.read().await.get_vlans(device_id)?)
    }

    async fn insert_vlans(&self, device_id: i64, rows: &[VlanRow]) -> Result<usize> {
        Ok(self.data.write().await.insert_vlans(device_id, rows)?)
    }

    async fn list_macs(&self, device_id: i64) -> Result<Vec<MacRow>> {
        Ok(self.data.read().await.list_macs(device_id)?)
    }

    async fn replace_mac_table(&self, device_id: i64, rows: &[MacRow]) -> Result<usize> {
        Ok(self.data.write().await.replace_mac_table(device_id, rows)?)
    }

    async fn list_catalog(&self) -> Result<Vec<CatalogVlan>> {
        Ok(self.data.read().await.list_catalog())
    }

    async fn insert_catalog_vlan(&self, vlan: CatalogVlan) -> Result<()> {
        Ok(self.data.write().await.insert_catalog_vlan(vlan)?)
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Tagness;

    fn sample_device(address: &str) -> NewDevice {
        NewDevice {
            hostname: "access-sw-01".into(),
            address: address.to_string(),
            platform: "juniper".into(),
            vendor: "Generic".into(),
            model: "EX2300-24T".into(),
            os_version: "21.4R3.15".into(),
            serial: "JW0217390123".into(),
        }
    }

    fn ge(name: &str, oper: &str) -> InterfaceRow {
        InterfaceRow {
            name: name.to_string(),
            oper_status: oper.to_string(),
            admin_status: "up".into(),
            description: None,
            mac_address: "aa:bb:cc:dd:ee:ff".into(),
            tagness: None,
        }
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let store = MemoryStore::new();
        let id = store
            .insert_device(sample_device("10.0.0.1"))
            .await
            .expect("insert");

        assert!(store.exists_by_address("10.0.0.1").await.expect("exists"));
        assert_eq!(store.address_of(id).await.expect("address"), "10.0.0.1");

        let device = store.get_device(id).await.expect("get");
        assert_eq!(device.sync_status, SyncStatus::Pending);
        assert!(device.last_synced.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_registration_yields_one_row() {
        let store = MemoryStore::new();
        store
            .insert_device(sample_device("10.0.0.1"))
            .await
            .expect("insert");

        let err = store
            .insert_device(sample_device("10.0.0.1"))
            .await
            .expect_err("second insert must fail");
        assert!(err.is_duplicate_device());
        assert_eq!(store.list_devices().await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn test_interface_upsert_is_idempotent() {
        let store = MemoryStore::new();
        let id = store
            .insert_device(sample_device("10.0.0.1"))
            .await
            .expect("insert");

        let rows = vec![ge("ge-0/0/1", "up")];
        store.upsert_interfaces(id, &rows).await.expect("upsert");
        store.upsert_interfaces(id, &rows).await.expect("upsert");

        let stored = store.list_interfaces(id).await.expect("list");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].oper_status, "up");
        assert!(stored[0].tagness.is_none());
    }

    #[tokio::test]
    async fn test_interface_upsert_updates_fields_preserving_tagness() {
        let store = MemoryStore::new();
        let id = store
            .insert_device(sample_device("10.0.0.1"))
            .await
            .expect("insert");

        store
            .upsert_interfaces(id, &[ge("ge-0/0/1", "up")])
            .await
            .expect("upsert");
        store
            .update_interface_tagness(
                id,
                &[PortTagness {
                    interface: "ge-0/0/1".into(),
                    tagness: Tagness::Tagged,
                }],
            )
            .await
            .expect("tagness");

        // A later discovery pass must refresh status but keep tagness.
        store
            .upsert_interfaces(id, &[ge("ge-0/0/1", "down")])
            .await
            .expect("upsert");

        let stored = store.list_interfaces(id).await.expect("list");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].oper_status, "down");
        assert_eq!(stored[0].tagness, Some(Tagness::Tagged));
    }

    #[tokio::test]
    async fn test_tagness_update_never_creates_rows() {
        let store = MemoryStore::new();
        let id = store
            .insert_device(sample_device("10.0.0.1"))
            .await
            .expect("insert");

        let updated = store
            .update_interface_tagness(
                id,
                &[PortTagness {
                    interface: "ge-0/0/7".into(),
                    tagness: Tagness::Untagged,
                }],
            )
            .await
            .expect("tagness");

        assert_eq!(updated, 0);
        assert!(store.list_interfaces(id).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn test_vlan_uniqueness_per_device() {
        let store = MemoryStore::new();
        let a = store
            .insert_device(sample_device("10.0.0.1"))
            .await
            .expect("insert");
        let b = store
            .insert_device(sample_device("10.0.0.2"))
            .await
            .expect("insert");

        let row = VlanRow {
            vlan_id: 100,
            name: "users".into(),
        };

        // Same VLAN id on two devices never conflicts.
        store.insert_vlans(a, &[row.clone()]).await.expect("vlans a");
        store.insert_vlans(b, &[row.clone()]).await.expect("vlans b");

        let err = store
            .insert_vlans(a, &[row])
            .await
            .expect_err("duplicate per device");
        assert!(matches!(
            err,
            crate::error::SyncError::Store(crate::error::StoreError::DuplicateVlan { .. })
        ));
    }

    #[tokio::test]
    async fn test_mac_table_replace() {
        let store = MemoryStore::new();
        let id = store
            .insert_device(sample_device("10.0.0.1"))
            .await
            .expect("insert");

        let first = vec![MacRow {
            address: "aa:aa:aa:aa:aa:01".into(),
            vlan_id: 100,
            interface: "ge-0/0/1".into(),
        }];
        store.replace_mac_table(id, &first).await.expect("replace");

        let second = vec![
            MacRow {
                address: "aa:aa:aa:aa:aa:02".into(),
                vlan_id: 100,
                interface: "ge-0/0/2".into(),
            },
            MacRow {
                address: "aa:aa:aa:aa:aa:03".into(),
                vlan_id: 200,
                interface: "ge-0/0/3".into(),
            },
        ];
        store.replace_mac_table(id, &second).await.expect("replace");

        let stored = store.list_macs(id).await.expect("list");
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].address, "aa:aa:aa:aa:aa:02");
    }

    #[tokio::test]
    async fn test_catalog_ordered_by_vlan_id() {
        let store = MemoryStore::new();
        for (id, name) in [(300u16, "voice"), (100, "users"), (200, "printers")] {
            store
                .insert_catalog_vlan(CatalogVlan {
                    vlan_id: id,
                    name: name.into(),
                    category: None,
                    description: None,
                })
                .await
                .expect("catalog insert");
        }

        let pool = store.list_catalog().await.expect("list");
        let ids: Vec<u16> = pool.iter().map(|v| v.vlan_id).collect();
        assert_eq!(ids, vec![100, 200, 300]);
    }
}
