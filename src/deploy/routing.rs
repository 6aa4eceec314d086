// ABOUTME: Adds a host and path matcher to the load balancer's shared route table.
// ABOUTME: Read-modify-write guarded by the table fingerprint, retried on conflict.

use tracing::debug;

use crate::cloud::{ComputeError, NetworkOps, ProviderOperation, RouteEntry};

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("route {0} already exists")]
    AlreadyMapped(String),

    #[error("route table changed concurrently on all {0} attempts")]
    Contended(u32),

    #[error(transparent)]
    Compute(#[from] ComputeError),
}

/// An accepted route table patch.
#[derive(Debug, Clone)]
pub struct Mapping {
    pub operation: ProviderOperation,
    /// Read-modify-write cycles used, including the successful one.
    pub attempts: u32,
}

/// Append `route` to the route table of `load_balancer`.
///
/// Existing matchers and host rules are kept in order. A patch rejected
/// because the table changed since it was read restarts the whole cycle, up to
/// `max_attempts` cycles.
pub async fn create_mapping<N>(
    network: &N,
    load_balancer: &str,
    route: &RouteEntry,
    max_attempts: u32,
) -> Result<Mapping, RouteError>
where
    N: NetworkOps + ?Sized,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        let current = network.get_route_table(load_balancer).await?;
        if current.has_matcher(&route.matcher) {
            return Err(RouteError::AlreadyMapped(route.matcher.clone()));
        }

        let updated = current.with_route(route);
        debug!(
            load_balancer,
            matcher = %route.matcher,
            host = %route.host,
            attempt,
            "patching route table"
        );

        match network.patch_route_table(load_balancer, &updated).await {
            Ok(operation) => return Ok(Mapping { operation, attempts: attempt }),
            Err(ComputeError::Conflict(reason)) if attempt < max_attempts => {
                debug!(load_balancer, attempt, %reason, "route table changed, retrying");
            }
            Err(ComputeError::Conflict(_)) => return Err(RouteError::Contended(attempt)),
            Err(e) => return Err(e.into()),
        }
    }
}
