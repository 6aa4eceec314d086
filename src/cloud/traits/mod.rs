// ABOUTME: Composable capability traits for the cloud collaborators.
// ABOUTME: Defines StorageOps, BuildOps, ServiceOps, NetworkOps and OperationOps.

mod build;
mod network;
mod operation;
mod service;
mod shared_types;
mod storage;

pub use build::{BuildError, BuildOps};
pub use network::{ComputeError, NetworkOps};
pub use operation::{OperationError, OperationOps};
pub use service::{ServiceError, ServiceOps};
pub use shared_types::*;
pub use storage::{StorageError, StorageOps};

/// Every capability a deployment pipeline needs.
///
/// Blanket-implemented for any type providing all the individual traits, so a
/// single client (or a single test fake) can drive every workflow.
pub trait CloudProvider: StorageOps + BuildOps + ServiceOps + NetworkOps + OperationOps {}

impl<T> CloudProvider for T where T: StorageOps + BuildOps + ServiceOps + NetworkOps + OperationOps {}
