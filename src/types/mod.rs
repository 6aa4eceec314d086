// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Uses phantom types to prevent mixing object names, operation ids and resource links.

mod bucket_name;
mod env_var;
mod id;
mod image_ref;
mod service_name;

pub use bucket_name::{BucketName, BucketNameError};
pub use env_var::EnvVar;
pub use id::{Id, ObjectName, OperationId, ResourceLink};
pub use image_ref::{ImageRef, ParseImageRefError};
pub use service_name::{ServiceName, ServiceNameError};
