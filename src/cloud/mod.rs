// ABOUTME: Cloud provider abstraction and its Google Cloud implementation.
// ABOUTME: Pipelines depend only on the traits; GcpClient talks to the REST APIs.

pub mod gcp;
mod route_table;
pub mod traits;

pub use gcp::GcpClient;
pub use route_table::{HostRule, PathMatcher, RouteEntry, RouteTable};
pub use traits::*;
