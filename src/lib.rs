// ============================================================================
// Linting - Dangerous or non-idiomatic practices are flagged
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden
#![warn(missing_docs)]                // All public items should be documented
#![warn(unused_must_use)]             // Handle Result and Option explicitly

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::redundant_clone)]     // Useless clones warning

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Switchsync
//!
//! An asynchronous provisioning and inventory engine for network switches.
//!
//! ## Overview
//!
//! Switchsync turns a bare IP address or hostname into a fully inventoried
//! device through a chain of queued background steps:
//!
//! 1. **Reachability probe**: ping the target
//! 2. **Management check**: open and close a management session
//! 3. **Facts collection**: hostname, OS version, model, serial number
//! 4. **Registration**: persist the device record
//! 5. **Interface discovery and sync**: enumerate and upsert Ethernet
//!    interfaces
//! 6. **VLAN discovery and reconciliation**: additive sync of the device's
//!    live VLANs into the inventory
//!
//! Each step is one job on the queue; on success it enqueues its successor
//! with the same correlation id, and live observers follow the run over a
//! per-session broadcast channel.
//!
//! ## Modules
//!
//! - [`addr`]: Target classification and hostname resolution
//! - [`config`]: Engine configuration from YAML and environment
//! - [`device`]: Device client adapter boundary
//! - [`error`]: Error taxonomy
//! - [`logging`]: Tracing subscriber setup for embedding applications
//! - [`orchestrator`]: The provisioning workflow engine
//! - [`progress`]: Per-session progress broadcast
//! - [`queue`]: Job queue with a pool of worker tasks
//! - [`store`]: Inventory storage backends (memory, JSON file)

// ============================================================================
// Modules
// ============================================================================

pub mod addr;
pub mod config;
pub mod device;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod progress;
pub mod queue;
pub mod store;

// ============================================================================
// Re-exports
// ============================================================================

pub use addr::{classify, resolve, TargetKind};
pub use config::EngineConfig;
pub use device::{Credentials, DeviceClient, DeviceSession};
pub use error::{Result, SyncError};
pub use orchestrator::{Orchestrator, ProvisionTask};
pub use progress::ProgressChannel;
pub use queue::{JobHandler, JobMeta, JobQueue, JobRecord, JobStatus};
pub use store::{FileStore, InventoryStore, MemoryStore};
