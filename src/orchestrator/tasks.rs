//! Task definitions for the provisioning workflow.
//!
//! Each variant is one queued unit of work. State needed by later steps
//! travels as explicit payload fields on the successor task, never as
//! in-memory closures, so steps of one chain may run on different workers.

use std::collections::BTreeMap;

use crate::device::{DeviceFacts, InterfaceInfo, PortMode};
use crate::queue::TaskSpec;

/// One step of the provisioning workflow, or an independently triggerable
/// maintenance job.
#[derive(Debug, Clone)]
pub enum ProvisionTask {
    /// Step 1: reachability probe.
    PingCheck {
        /// Target management address.
        host: String,
    },
    /// Step 2: open and immediately close a management session.
    ProtocolCheck {
        /// Target management address.
        host: String,
    },
    /// Step 3: retrieve identity facts.
    CollectFacts {
        /// Target management address.
        host: String,
    },
    /// Step 4: persist the device record built from collected facts.
    RegisterDevice {
        /// Target management address.
        host: String,
        /// Facts collected by the previous step.
        facts: DeviceFacts,
    },
    /// Step 5: enumerate Ethernet interfaces.
    DiscoverInterfaces {
        /// Registered device id.
        device_id: i64,
    },
    /// Step 6: bulk-upsert discovered interfaces into the inventory.
    SyncInterfaces {
        /// Registered device id.
        device_id: i64,
        /// Interfaces discovered by the previous step.
        rows: Vec<InterfaceInfo>,
    },
    /// Step 7: enumerate configured VLANs.
    DiscoverVlans {
        /// Registered device id.
        device_id: i64,
    },
    /// Step 8: reconcile live VLANs against the inventory (terminal step).
    ReconcileVlans {
        /// Registered device id.
        device_id: i64,
        /// Normalized live VLAN id to name mapping.
        live: BTreeMap<u16, String>,
    },
    /// Cross-check: annotate interface tagness from the switching table.
    SyncTagness {
        /// Registered device id.
        device_id: i64,
    },
    /// Push a VLAN definition to the device.
    CreateVlan {
        /// Registered device id.
        device_id: i64,
        /// VLAN id to create.
        vlan_id: u16,
        /// VLAN name to configure.
        vlan_name: String,
    },
    /// Assign an interface to a VLAN in access or trunk mode.
    SetInterfaceVlan {
        /// Registered device id.
        device_id: i64,
        /// Interface to configure.
        interface: String,
        /// VLAN id to assign.
        vlan_id: u16,
        /// Membership mode.
        mode: PortMode,
    },
    /// Refresh the device's stored MAC table.
    FetchMacTable {
        /// Registered device id.
        device_id: i64,
    },
}

impl TaskSpec for ProvisionTask {
    fn name(&self) -> &'static str {
        match self {
            Self::PingCheck { .. } => "ping_check",
            Self::ProtocolCheck { .. } => "protocol_check",
            Self::CollectFacts { .. } => "collect_facts",
            Self::RegisterDevice { .. } => "register_device",
            Self::DiscoverInterfaces { .. } => "discover_interfaces",
            Self::SyncInterfaces { .. } => "sync_interfaces",
            Self::DiscoverVlans { .. } => "discover_vlans",
            Self::ReconcileVlans { .. } => "reconcile_vlans",
            Self::SyncTagness { .. } => "sync_tagness",
            Self::CreateVlan { .. } => "create_vlan",
            Self::SetInterfaceVlan { .. } => "set_interface_vlan",
            Self::FetchMacTable { .. } => "fetch_mac_table",
        }
    }

    fn target(&self) -> String {
        match self {
            Self::PingCheck { host }
            | Self::ProtocolCheck { host }
            | Self::CollectFacts { host }
            | Self::RegisterDevice { host, .. } => host.clone(),
            Self::DiscoverInterfaces { device_id }
            | Self::SyncInterfaces { device_id, .. }
            | Self::DiscoverVlans { device_id }
            | Self::ReconcileVlans { device_id, .. }
            | Self::SyncTagness { device_id }
            | Self::CreateVlan { device_id, .. }
            | Self::SetInterfaceVlan { device_id, .. }
            | Self::FetchMacTable { device_id } => format!("device {device_id}"),
        }
    }
}

impl ProvisionTask {
    /// Device id of the step's target, when it is already registered.
    #[must_use]
    pub const fn device_id(&self) -> Option<i64> {
        match self {
            Self::PingCheck { .. }
            | Self::ProtocolCheck { .. }
            | Self::CollectFacts { .. }
            | Self::RegisterDevice { .. } => None,
            Self::DiscoverInterfaces { device_id }
            | Self::SyncInterfaces { device_id, .. }
            | Self::DiscoverVlans { device_id }
            | Self::ReconcileVlans { device_id, .. }
            | Self::SyncTagness { device_id }
            | Self::CreateVlan { device_id, .. }
            | Self::SetInterfaceVlan { device_id, .. }
            | Self::FetchMacTable { device_id } => Some(*device_id),
        }
    }

    /// True for the inventory-bearing chain steps whose failure marks the
    /// device record as failed.
    #[must_use]
    pub const fn is_chain_step(&self) -> bool {
        matches!(
            self,
            Self::DiscoverInterfaces { .. }
                | Self::SyncInterfaces { .. }
                | Self::DiscoverVlans { .. }
                | Self::ReconcileVlans { .. }
        )
    }
}
