// ABOUTME: Google Cloud implementation of the cloud traits over the REST APIs.
// ABOUTME: Storage, Cloud Build, Cloud Run v2 and Compute Engine load balancing.

mod build;
mod client;
mod compute;
mod error;
mod iam;
mod operations;
mod run;
mod storage;

pub use client::GcpClient;
pub use error::ApiError;
