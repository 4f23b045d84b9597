//! Error types for the switchsync provisioning engine.
//!
//! This module provides the error hierarchy for every layer of the system:
//! device adapter failures, inventory store failures, job queue failures and
//! configuration problems. Adapter- and store-level errors are converted to
//! structured job failures at the step boundary and never crash a worker.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the switchsync engine.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Device adapter and protocol errors.
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// Inventory store errors.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Job queue errors.
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    /// Configuration errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised by the device client adapter.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The reachability probe failed before any session was attempted.
    #[error("Device {host} is not reachable")]
    Unreachable {
        /// Address of the unreachable device.
        host: String,
    },

    /// Opening a management session failed (credentials or protocol).
    #[error("Management session to {host} failed: {message}")]
    AuthFailed {
        /// Address of the device.
        host: String,
        /// Description of the protocol/authentication failure.
        message: String,
    },

    /// A read RPC failed or returned unparseable data.
    #[error("Device query '{query}' failed: {message}")]
    QueryFailed {
        /// Name of the failing query.
        query: String,
        /// Description of the failure.
        message: String,
    },

    /// The device software does not support the requested query shape.
    ///
    /// This is the specific signal that drives the legacy-query fallback for
    /// the switching-interface cross-check.
    #[error("Device does not support query '{query}'")]
    UnsupportedQuery {
        /// Name of the unsupported query.
        query: String,
    },

    /// A configuration push or commit failed.
    #[error("Configuration push failed: {message}")]
    ConfigPush {
        /// Description of the commit failure.
        message: String,
    },
}

/// Errors raised by the inventory store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A device with this management address is already registered.
    #[error("Device with address {address} already exists")]
    DuplicateDevice {
        /// The already-registered address.
        address: String,
    },

    /// A VLAN row with this (device, VLAN id) pair already exists.
    #[error("VLAN {vlan_id} already recorded for device {device_id}")]
    DuplicateVlan {
        /// Owning device id.
        device_id: i64,
        /// The duplicated VLAN id.
        vlan_id: u16,
    },

    /// A catalog VLAN with this id already exists in the global pool.
    #[error("Catalog VLAN {vlan_id} already exists")]
    DuplicateCatalogVlan {
        /// The duplicated VLAN id.
        vlan_id: u16,
    },

    /// A VLAN id outside the valid 1-4094 range.
    #[error("VLAN id {vlan_id} is outside the valid range 1-4094")]
    VlanIdOutOfRange {
        /// The out-of-range id.
        vlan_id: u16,
    },

    /// A lookup missed.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Kind of record that was looked up.
        entity: &'static str,
        /// The lookup key.
        key: String,
    },

    /// A write failed; the whole batch was rolled back.
    #[error("Persistence error: {message}")]
    Persistence {
        /// Description of the write failure.
        message: String,
    },

    /// The persisted inventory file could not be read or parsed.
    #[error("Inventory file is corrupted: {path}: {message}")]
    Corrupted {
        /// Path of the corrupted file.
        path: PathBuf,
        /// Description of the corruption.
        message: String,
    },
}

/// Errors raised by the job queue.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The requested job id is unknown.
    #[error("Job not found: {job_id}")]
    JobNotFound {
        /// The unknown job id.
        job_id: String,
    },

    /// The queue has been shut down and accepts no new work.
    #[error("Queue is shut down")]
    ShutDown,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
    },

    /// A required environment variable is missing.
    #[error("Missing environment variable: {name}")]
    MissingEnvVar {
        /// Name of the missing variable.
        name: String,
    },
}

/// Result type alias for switchsync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error means a target is already registered.
    #[must_use]
    pub const fn is_duplicate_device(&self) -> bool {
        matches!(self, Self::Store(StoreError::DuplicateDevice { .. }))
    }

    /// Returns true if this error came from the pre-flight checks, i.e. no
    /// device state was touched before it occurred.
    #[must_use]
    pub const fn is_preflight(&self) -> bool {
        matches!(
            self,
            Self::Device(DeviceError::Unreachable { .. } | DeviceError::AuthFailed { .. })
        )
    }
}

impl DeviceError {
    /// Creates an unreachable error for the given host.
    #[must_use]
    pub fn unreachable(host: impl Into<String>) -> Self {
        Self::Unreachable { host: host.into() }
    }

    /// Creates a query failure for the given query name.
    #[must_use]
    pub fn query(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self::QueryFailed {
            query: query.into(),
            message: message.into(),
        }
    }
}

impl StoreError {
    /// Creates a persistence error with the given message.
    #[must_use]
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Creates a not-found error for the given entity and key.
    #[must_use]
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preflight_classification() {
        let err = SyncError::Device(DeviceError::unreachable("10.0.0.1"));
        assert!(err.is_preflight());

        let err = SyncError::Device(DeviceError::AuthFailed {
            host: "10.0.0.1".into(),
            message: "bad credentials".into(),
        });
        assert!(err.is_preflight());

        let err = SyncError::Device(DeviceError::query("vlans", "timeout"));
        assert!(!err.is_preflight());
    }

    #[test]
    fn test_duplicate_device_classification() {
        let err = SyncError::Store(StoreError::DuplicateDevice {
            address: "10.0.0.1".into(),
        });
        assert!(err.is_duplicate_device());
        assert!(!err.is_preflight());
    }

    #[test]
    fn test_display_messages() {
        let err = DeviceError::unreachable("192.0.2.7");
        assert_eq!(err.to_string(), "Device 192.0.2.7 is not reachable");

        let err = StoreError::DuplicateVlan {
            device_id: 3,
            vlan_id: 100,
        };
        assert_eq!(err.to_string(), "VLAN 100 already recorded for device 3");
    }
}
