//! Provisioning orchestrator: the workflow engine.
//!
//! Implements the fixed step chain that turns a bare IP/hostname into a
//! fully inventoried device, plus the independently triggerable maintenance
//! jobs (tagness cross-check, VLAN config pushes, MAC-table refresh). Each
//! step is one queued job; on success it enqueues the next step with the
//! same correlation id, so a chain never holds a worker idle between steps.
//!
//! Failure semantics: any error inside a step is caught at the step
//! boundary, recorded as the job's failure detail, and published to the
//! progress channel when a correlation id exists. No step is retried
//! automatically; retrying means re-submitting the chain.

pub mod reconcile;
pub mod tagness;

mod tasks;

pub use tasks::ProvisionTask;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::device::{
    Credentials, DeviceClient, DeviceFacts, DeviceSession, InterfaceInfo, MacEntry, PortMode,
};
use crate::error::{DeviceError, Result, StoreError, SyncError};
use crate::progress::ProgressChannel;
use crate::queue::{JobHandler, JobMeta, JobQueue};
use crate::store::{InterfaceRow, InventoryStore, MacRow, NewDevice, SyncStatus};

/// The provisioning workflow engine.
///
/// Carries the explicit context every step needs — store handle, device
/// client adapter, progress publisher, session credentials — so steps never
/// reach for process-wide singletons.
pub struct Orchestrator {
    /// Inventory store.
    store: Arc<dyn InventoryStore>,
    /// Device client adapter.
    client: Arc<dyn DeviceClient>,
    /// Progress channel for live observers.
    progress: ProgressChannel,
    /// Credentials used for every management session.
    credentials: Credentials,
}

impl Orchestrator {
    /// Creates a new orchestrator.
    #[must_use]
    pub fn new(
        store: Arc<dyn InventoryStore>,
        client: Arc<dyn DeviceClient>,
        progress: ProgressChannel,
        credentials: Credentials,
    ) -> Self {
        Self {
            store,
            client,
            progress,
            credentials,
        }
    }

    /// Starts a provisioning chain for the given target address.
    ///
    /// Verifies the address is not already registered before enqueueing the
    /// first step. The check and the chain are not one transaction; two
    /// concurrent starts for one address are resolved by the store's
    /// uniqueness backstop at the registration step.
    ///
    /// # Errors
    ///
    /// Returns a duplicate-device error when the address is registered.
    pub async fn start(
        &self,
        queue: &JobQueue<ProvisionTask>,
        target: &str,
        meta: JobMeta,
    ) -> Result<Uuid> {
        if self.store.exists_by_address(target).await? {
            return Err(StoreError::DuplicateDevice {
                address: target.to_string(),
            }
            .into());
        }

        info!("Starting provisioning chain for {target}");
        queue
            .enqueue(
                ProvisionTask::PingCheck {
                    host: target.to_string(),
                },
                meta,
            )
            .await
    }

    async fn open_session(&self, host: &str) -> Result<Box<dyn DeviceSession>> {
        self.client.open(host, &self.credentials).await
    }

    async fn dispatch(
        &self,
        task: &ProvisionTask,
        meta: &JobMeta,
        queue: &JobQueue<ProvisionTask>,
    ) -> Result<Value> {
        match task {
            ProvisionTask::PingCheck { host } => self.ping_check(host, meta, queue).await,
            ProvisionTask::ProtocolCheck { host } => self.protocol_check(host, meta, queue).await,
            ProvisionTask::CollectFacts { host } => self.collect_facts(host, meta, queue).await,
            ProvisionTask::RegisterDevice { host, facts } => {
                self.register_device(host, facts, meta, queue).await
            }
            ProvisionTask::DiscoverInterfaces { device_id } => {
                self.discover_interfaces(*device_id, meta, queue).await
            }
            ProvisionTask::SyncInterfaces { device_id, rows } => {
                self.sync_interfaces(*device_id, rows, meta, queue).await
            }
            ProvisionTask::DiscoverVlans { device_id } => {
                self.discover_vlans(*device_id, meta, queue).await
            }
            ProvisionTask::ReconcileVlans { device_id, live } => {
                self.reconcile_vlans(*device_id, live, meta).await
            }
            ProvisionTask::SyncTagness { device_id } => {
                self.sync_tagness(*device_id, meta).await
            }
            ProvisionTask::CreateVlan {
                device_id,
                vlan_id,
                vlan_name,
            } => self.create_vlan(*device_id, *vlan_id, vlan_name, meta).await,
            ProvisionTask::SetInterfaceVlan {
                device_id,
                interface,
                vlan_id,
                mode,
            } => {
                self.set_interface_vlan(*device_id, interface, *vlan_id, *mode, meta)
                    .await
            }
            ProvisionTask::FetchMacTable { device_id } => {
                self.fetch_mac_table(*device_id, meta).await
            }
        }
    }

    /// Step 1: reachability probe. Terminal on failure; no write has
    /// happened yet, so a failed probe leaves no trace beyond its message.
    async fn ping_check(
        &self,
        host: &str,
        meta: &JobMeta,
        queue: &JobQueue<ProvisionTask>,
    ) -> Result<Value> {
        let cid = meta.correlation_id.as_deref();
        info!("Pinging {host}");

        self.client.ping(host).await?;
        self.progress
            .publish_ok(cid, &format!("Device {host} is reachable"))
            .await;

        queue
            .enqueue(
                ProvisionTask::ProtocolCheck {
                    host: host.to_string(),
                },
                meta.clone(),
            )
            .await?;
        Ok(json!({ "status": "success", "step": "ping_check" }))
    }

    /// Step 2: open and immediately close a management session.
    async fn protocol_check(
        &self,
        host: &str,
        meta: &JobMeta,
        queue: &JobQueue<ProvisionTask>,
    ) -> Result<Value> {
        let cid = meta.correlation_id.as_deref();
        info!("Checking management session to {host}");

        let mut session = self.open_session(host).await?;
        session.close().await;
        self.progress
            .publish_ok(cid, &format!("Management session to {host} established"))
            .await;

        queue
            .enqueue(
                ProvisionTask::CollectFacts {
                    host: host.to_string(),
                },
                meta.clone(),
            )
            .await?;
        Ok(json!({ "status": "success", "step": "protocol_check" }))
    }

    /// Step 3: retrieve identity facts and pass them on as the payload of
    /// the registration step.
    async fn collect_facts(
        &self,
        host: &str,
        meta: &JobMeta,
        queue: &JobQueue<ProvisionTask>,
    ) -> Result<Value> {
        let cid = meta.correlation_id.as_deref();

        let mut session = self.open_session(host).await?;
        let outcome = session.facts().await;
        session.close().await;
        let facts = outcome?;

        info!("Collected facts from {host}: {}", facts.hostname);
        self.progress
            .publish_ok(
                cid,
                &format!(
                    "Collected facts from {} ({} {})",
                    facts.hostname, facts.model, facts.os_version
                ),
            )
            .await;

        let result = serde_json::to_value(&facts)
            .map_err(|e| SyncError::internal(format!("Failed to encode facts: {e}")))?;

        queue
            .enqueue(
                ProvisionTask::RegisterDevice {
                    host: host.to_string(),
                    facts,
                },
                meta.clone(),
            )
            .await?;
        Ok(result)
    }

    /// Step 4: persist the device record. The chain continues past here
    /// only in automated mode; a manual call stops with the new id as its
    /// final result.
    async fn register_device(
        &self,
        host: &str,
        facts: &DeviceFacts,
        meta: &JobMeta,
        queue: &JobQueue<ProvisionTask>,
    ) -> Result<Value> {
        let cid = meta.correlation_id.as_deref();

        let device_id = self
            .store
            .insert_device(NewDevice::from_facts(host, facts))
            .await?;

        info!("Registered {} as device {device_id}", facts.hostname);
        self.progress
            .publish_ok(
                cid,
                &format!("Registered {} as device {device_id}", facts.hostname),
            )
            .await;

        if meta.run_chain {
            queue
                .enqueue(ProvisionTask::DiscoverInterfaces { device_id }, meta.clone())
                .await?;
        }
        Ok(json!({ "status": "success", "device_id": device_id }))
    }

    /// Step 5: enumerate Ethernet interfaces. An empty result ends the
    /// chain without error: nothing to sync, nothing to chain.
    async fn discover_interfaces(
        &self,
        device_id: i64,
        meta: &JobMeta,
        queue: &JobQueue<ProvisionTask>,
    ) -> Result<Value> {
        let cid = meta.correlation_id.as_deref();
        let host = self.store.address_of(device_id).await?;

        let mut session = self.open_session(&host).await?;
        let outcome = session.interfaces().await;
        session.close().await;
        let rows = outcome?;

        self.progress
            .publish_ok(
                cid,
                &format!("Discovered {} interfaces on device {device_id}", rows.len()),
            )
            .await;

        if rows.is_empty() {
            return Ok(json!({ "status": "success", "interfaces": 0 }));
        }

        if meta.run_chain {
            queue
                .enqueue(
                    ProvisionTask::SyncInterfaces {
                        device_id,
                        rows: rows.clone(),
                    },
                    meta.clone(),
                )
                .await?;
        }
        Ok(json!({ "status": "success", "interfaces": rows.len() }))
    }

    /// Step 6: bulk-upsert the discovered interfaces.
    async fn sync_interfaces(
        &self,
        device_id: i64,
        rows: &[InterfaceInfo],
        meta: &JobMeta,
        queue: &JobQueue<ProvisionTask>,
    ) -> Result<Value> {
        let cid = meta.correlation_id.as_deref();

        let rows: Vec<InterfaceRow> = rows.iter().map(interface_row).collect();
        let count = self.store.upsert_interfaces(device_id, &rows).await?;

        self.progress
            .publish_ok(cid, &format!("Synced {count} interfaces to inventory"))
            .await;

        if meta.run_chain {
            queue
                .enqueue(ProvisionTask::DiscoverVlans { device_id }, meta.clone())
                .await?;
        }
        Ok(json!({ "status": "success", "synced": count }))
    }

    /// Step 7: enumerate configured VLANs. An empty or failed discovery is
    /// terminal-with-error. Always chains into reconciliation: a manual
    /// VLAN fetch reconciles too.
    async fn discover_vlans(
        &self,
        device_id: i64,
        meta: &JobMeta,
        queue: &JobQueue<ProvisionTask>,
    ) -> Result<Value> {
        let cid = meta.correlation_id.as_deref();
        let host = self.store.address_of(device_id).await?;

        let mut session = self.open_session(&host).await?;
        let outcome = session.vlans().await;
        session.close().await;
        let raw = outcome?;

        if raw.is_empty() {
            return Err(DeviceError::query("vlans", "device returned no VLANs").into());
        }

        let live = reconcile::normalize_vlans(&raw)?;
        self.progress
            .publish_ok(
                cid,
                &format!("Discovered {} VLANs on device {device_id}", live.len()),
            )
            .await;

        let count = live.len();
        queue
            .enqueue(
                ProvisionTask::ReconcileVlans {
                    device_id,
                    live,
                },
                meta.clone(),
            )
            .await?;
        Ok(json!({ "status": "success", "vlans": count }))
    }

    /// Step 8 (terminal): additive reconciliation of live VLANs against
    /// the inventory, then the final completed message.
    async fn reconcile_vlans(
        &self,
        device_id: i64,
        live: &std::collections::BTreeMap<u16, String>,
        meta: &JobMeta,
    ) -> Result<Value> {
        let cid = meta.correlation_id.as_deref();

        let stored = self.store.get_vlans(device_id).await?;
        let missing = reconcile::missing_vlans(live, &stored);

        let inserted = if missing.is_empty() {
            // Zero diff is success, not an error.
            0
        } else {
            self.store.insert_vlans(device_id, &missing).await?
        };

        self.store
            .set_sync_status(device_id, SyncStatus::Synced, Some(Utc::now()))
            .await?;

        info!("Device {device_id} reconciled: {inserted} new VLANs");
        self.progress
            .publish_ok(
                cid,
                &format!("Provisioning completed: {inserted} new VLANs recorded"),
            )
            .await;
        Ok(json!({ "status": "success", "inserted": inserted }))
    }

    /// Switching-table cross-check: annotate tagness on known interfaces.
    ///
    /// Tries the modern query shape first and falls back to the legacy one
    /// only on the protocol's unsupported-operation error; version strings
    /// are never consulted.
    async fn sync_tagness(&self, device_id: i64, meta: &JobMeta) -> Result<Value> {
        let cid = meta.correlation_id.as_deref();
        let host = self.store.address_of(device_id).await?;

        let mut session = self.open_session(&host).await?;
        let normalized = match session.switching_ports().await {
            Ok(ports) => Ok(tagness::normalize_modern(&ports)),
            Err(SyncError::Device(DeviceError::UnsupportedQuery { .. })) => {
                info!("Device {device_id} lacks the modern switching query, using legacy shape");
                session
                    .switching_ports_legacy()
                    .await
                    .map(|ports| tagness::normalize_legacy(&ports))
            }
            Err(other) => Err(other),
        };
        session.close().await;
        let rows = normalized?;

        let updated = self
            .store
            .update_interface_tagness(device_id, &rows)
            .await?;

        self.progress
            .publish_ok(cid, &format!("Updated tagness on {updated} interfaces"))
            .await;
        Ok(json!({ "status": "success", "updated": updated }))
    }

    /// Pushes a VLAN definition to the device.
    async fn create_vlan(
        &self,
        device_id: i64,
        vlan_id: u16,
        vlan_name: &str,
        meta: &JobMeta,
    ) -> Result<Value> {
        let cid = meta.correlation_id.as_deref();
        let host = self.store.address_of(device_id).await?;

        let stanzas = format!("set vlans {vlan_name} vlan-id {vlan_id}");
        let comment = format!("Automation: created VLAN {vlan_id}");

        let mut session = self.open_session(&host).await?;
        let outcome = session.push_config(&stanzas, &comment).await;
        session.close().await;
        outcome?;

        self.progress
            .publish_ok(cid, &format!("VLAN {vlan_id} has been deployed successfully"))
            .await;
        Ok(json!({ "status": "success", "vlan_id": vlan_id }))
    }

    /// Assigns an interface to a VLAN in access or trunk mode.
    async fn set_interface_vlan(
        &self,
        device_id: i64,
        interface: &str,
        vlan_id: u16,
        mode: PortMode,
        meta: &JobMeta,
    ) -> Result<Value> {
        let cid = meta.correlation_id.as_deref();
        let host = self.store.address_of(device_id).await?;

        let stanzas = format!(
            "set interfaces {interface} unit 0 family ethernet-switching interface-mode {mode}\n\
             set interfaces {interface} unit 0 family ethernet-switching vlan members {vlan_id}"
        );
        let comment = format!("Automation: assigned VLAN {vlan_id} to {interface} ({mode})");

        let mut session = self.open_session(&host).await?;
        let outcome = session.push_config(&stanzas, &comment).await;
        session.close().await;
        outcome?;

        self.progress
            .publish_ok(
                cid,
                &format!("Interface {interface} assigned to VLAN {vlan_id} ({mode})"),
            )
            .await;
        Ok(json!({ "status": "success", "interface": interface, "vlan_id": vlan_id }))
    }

    /// Refreshes the device's stored MAC table wholesale.
    async fn fetch_mac_table(&self, device_id: i64, meta: &JobMeta) -> Result<Value> {
        let cid = meta.correlation_id.as_deref();
        let host = self.store.address_of(device_id).await?;

        let mut session = self.open_session(&host).await?;
        let outcome = session.mac_table().await;
        session.close().await;
        let entries = outcome?;

        let rows: Vec<MacRow> = entries.iter().map(mac_row).collect();
        let count = self.store.replace_mac_table(device_id, &rows).await?;

        self.progress
            .publish_ok(cid, &format!("Fetched {count} MAC entries"))
            .await;
        Ok(json!({ "status": "success", "entries": count }))
    }

    /// Marks the device failed after a post-registration chain-step error
    /// so the record converges instead of staying pending forever.
    async fn mark_failed(&self, task: &ProvisionTask) {
        if !task.is_chain_step() {
            return;
        }
        let Some(device_id) = task.device_id() else {
            return;
        };
        if let Err(e) = self
            .store
            .set_sync_status(device_id, SyncStatus::Failed, None)
            .await
        {
            warn!("Could not mark device {device_id} failed: {e}");
        }
    }
}

#[async_trait]
impl JobHandler<ProvisionTask> for Orchestrator {
    async fn run(
        &self,
        task: &ProvisionTask,
        meta: &JobMeta,
        queue: &JobQueue<ProvisionTask>,
    ) -> Result<Value> {
        match self.dispatch(task, meta, queue).await {
            Ok(value) => Ok(value),
            Err(err) => {
                // Step-boundary conversion: the error becomes the job's
                // failure detail and, when observed, a failure line.
                let detail = match &err {
                    SyncError::Device(e) => e.to_string(),
                    SyncError::Store(e) => e.to_string(),
                    other => other.to_string(),
                };
                self.progress
                    .publish_err(meta.correlation_id.as_deref(), &detail)
                    .await;
                self.mark_failed(task).await;
                Err(err)
            }
        }
    }
}

fn interface_row(info: &InterfaceInfo) -> InterfaceRow {
    InterfaceRow {
        name: info.name.clone(),
        oper_status: info.oper_status.clone(),
        admin_status: info.admin_status.clone(),
        description: info.description.clone(),
        mac_address: info.mac_address.clone(),
        tagness: None,
    }
}

fn mac_row(entry: &MacEntry) -> MacRow {
    MacRow {
        address: entry.address.clone(),
        vlan_id: entry.vlan_id,
        interface: entry.interface.clone(),
    }
}
