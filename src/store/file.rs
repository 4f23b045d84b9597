//! JSON-file inventory backend.
//!
//! Persists the whole inventory to a single JSON file. Every mutation runs
//! against a working copy first and is written to a temporary file that is
//! renamed over the live one, so a failed write leaves both the file and the
//! in-memory view untouched (rollback per batch).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::device::PortTagness;
use crate::error::{Result, StoreError, SyncError};

use super::contract::InventoryStore;
use super::data::InventoryData;
use super::types::{
    CatalogVlan, DeviceRecord, InterfaceRow, MacRow, NewDevice, SyncStatus, VlanRow,
};

/// File-based inventory store.
#[derive(Debug)]
pub struct FileStore {
    /// Path of the inventory file.
    path: PathBuf,
    /// Cached inventory; the file is only read at open time.
    data: Mutex<InventoryData>,
}

impl FileStore {
    /// Opens a file store, loading the inventory if the file exists.
    ///
    /// # Errors
    ///
    /// Returns a corruption error when the file exists but cannot be parsed.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let data = if fs::try_exists(&path).await? {
            let content = fs::read_to_string(&path).await?;
            serde_json::from_str(&content).map_err(|e| {
                SyncError::Store(StoreError::Corrupted {
                    path: path.clone(),
                    message: e.to_string(),
                })
            })?
        } else {
            debug!("No inventory file at {}, starting empty", path.display());
            InventoryData::default()
        };

        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    /// Returns the path of the inventory file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, data: &InventoryData) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let content = serde_json::to_string_pretty(data)
            .map_err(|e| SyncError::Store(StoreError::persistence(e.to_string())))?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content).await?;
        fs::rename(&tmp_path, &self.path).await?;

        debug!("Persisted inventory to {}", self.path.display());
        Ok(())
    }

    /// Runs a mutation against a working copy, persists it, then commits it
    /// to the cache. The cache is only replaced after the write succeeded.
    async fn mutate<T>(
        &self,
        op: impl FnOnce(&mut InventoryData) -> std::result::Result<T, StoreError>,
    ) -> Result<T> {
        let mut guard = self.data.lock().await;
        let mut working = guard.clone();
        let out = op(&mut working)?;
        self.persist(&working).await?;
        *guard = working;
        Ok(out)
    }
}

#[async_trait]
impl InventoryStore for FileStore {
    async fn exists_by_address(&self, address: &str) -> Result<bool> {
        Ok(self.data.lock().await.exists_by_address(address))
    }

    async fn insert_device(&self, new: NewDevice) -> Result<i64> {
        self.mutate(|data| data.insert_device(new)).await
    }

    async fn get_device(&self, device_id: i64) -> Result<DeviceRecord> {
        Ok(self.data.lock().await.get_device(device_id)?)
    }

    async fn address_of(&self, device_id: i64) -> Result<String> {
        Ok(self.data.lock().await.address_of(device_id)?)
    }

    async fn list_devices(&self) -> Result<Vec<DeviceRecord>> {
        Ok(self.data.lock().await.list_devices())
    }

    async fn set_sync_status(
        &self,
        device_id: i64,
        status: SyncStatus,
        last_synced: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.mutate(|data| data.set_sync_status(device_id, status, last_synced))
            .await
    }

    async fn delete_device(&self, device_id: i64) -> Result<()> {
        self.mutate(|data| data.delete_device(device_id)).await
    }

    async fn list_interfaces(&self, device_id: i64) -> Result<Vec<InterfaceRow>> {
        Ok(self.data.lock().await.list_interfaces(device_id)?)
    }

    async fn upsert_interfaces(&self, device_id: i64, rows: &[InterfaceRow]) -> Result<usize> {
        self.mutate(|data| data.upsert_interfaces(device_id, rows))
            .await
    }

    async fn update_interface_tagness(
        &self,
        device_id: i64,
        rows: &[PortTagness],
    ) -> Result<usize> {
        self.mutate(|data| data.update_interface_tagness(device_id, rows))
            .await
    }

    async fn get_vlans(&self, device_id: i64) -> Result<Vec<VlanRow>> {
        Ok(self.data.lock().await.get_vlans(device_id)?)
    }

    async fn insert_vlans(&self, device_id: i64, rows: &[VlanRow]) -> Result<usize> {
        self.mutate(|data| data.insert_vlans(device_id, rows)).await
    }

    async fn list_macs(&self, device_id: i64) -> Result<Vec<MacRow>> {
        Ok(self.data.lock().await.list_macs(device_id)?)
    }

    async fn replace_mac_table(&self, device_id: i64, rows: &[MacRow]) -> Result<usize> {
        self.mutate(|data| data.replace_mac_table(device_id, rows))
            .await
    }

    async fn list_catalog(&self) -> Result<Vec<CatalogVlan>> {
        Ok(self.data.lock().await.list_catalog())
    }

    async fn insert_catalog_vlan(&self, vlan: CatalogVlan) -> Result<()> {
        self.mutate(|data| data.insert_catalog_vlan(vlan)).await
    }

    fn backend_type(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_device(address: &str) -> NewDevice {
        NewDevice {
            hostname: "core-sw-01".into(),
            address: address.to_string(),
            platform: "juniper".into(),
            vendor: "Generic".into(),
            model: "EX3400".into(),
            os_version: "20.4R3".into(),
            serial: "JW9900112233".into(),
        }
    }

    #[tokio::test]
    async fn test_persist_and_reopen() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("inventory.json");

        let store = FileStore::open(&path).await.expect("open");
        let id = store
            .insert_device(sample_device("10.1.0.1"))
            .await
            .expect("insert");
        store
            .insert_vlans(
                id,
                &[VlanRow {
                    vlan_id: 100,
                    name: "users".into(),
                }],
            )
            .await
            .expect("vlans");
        drop(store);

        let reopened = FileStore::open(&path).await.expect("reopen");
        assert!(reopened
            .exists_by_address("10.1.0.1")
            .await
            .expect("exists"));
        assert_eq!(
            reopened.get_vlans(id).await.expect("vlans"),
            vec![VlanRow {
                vlan_id: 100,
                name: "users".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_duplicate_survives_reopen() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("inventory.json");

        let store = FileStore::open(&path).await.expect("open");
        store
            .insert_device(sample_device("10.1.0.1"))
            .await
            .expect("insert");
        drop(store);

        let reopened = FileStore::open(&path).await.expect("reopen");
        let err = reopened
            .insert_device(sample_device("10.1.0.1"))
            .await
            .expect_err("duplicate after reopen");
        assert!(err.is_duplicate_device());
    }

    #[tokio::test]
    async fn test_failed_batch_not_persisted() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("inventory.json");

        let store = FileStore::open(&path).await.expect("open");
        let id = store
            .insert_device(sample_device("10.1.0.1"))
            .await
            .expect("insert");
        store
            .insert_vlans(
                id,
                &[VlanRow {
                    vlan_id: 100,
                    name: "users".into(),
                }],
            )
            .await
            .expect("vlans");

        store
            .insert_vlans(
                id,
                &[
                    VlanRow {
                        vlan_id: 200,
                        name: "voice".into(),
                    },
                    VlanRow {
                        vlan_id: 100,
                        name: "users".into(),
                    },
                ],
            )
            .await
            .expect_err("batch with duplicate");
        drop(store);

        let reopened = FileStore::open(&path).await.expect("reopen");
        assert_eq!(reopened.get_vlans(id).await.expect("vlans").len(), 1);
    }

    #[tokio::test]
    async fn test_corrupted_file_is_typed_error() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("inventory.json");
        tokio::fs::write(&path, "not json").await.expect("write");

        let err = FileStore::open(&path).await.expect_err("corrupted");
        assert!(matches!(
            err,
            SyncError::Store(StoreError::Corrupted { .. })
        ));
    }
}
