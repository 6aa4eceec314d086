// ABOUTME: The load balancer's shared URL map: path matchers and host rules.
// ABOUTME: Unknown provider fields are carried through so a rewrite never loses configuration.

use crate::types::{ResourceLink, ServiceName};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Path matchers and host rules of a URL map, plus its version fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub path_matchers: Vec<PathMatcher>,
    #[serde(default)]
    pub host_rules: Vec<HostRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathMatcher {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_service: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostRule {
    #[serde(default)]
    pub hosts: Vec<String>,
    pub path_matcher: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One hostname routed to one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub matcher: String,
    pub host: String,
    pub backend: ResourceLink,
}

impl RouteEntry {
    /// Route `<service>.<domain>` to `backend` through matcher `<service>-path`.
    pub fn for_service(service: &ServiceName, domain: &str, backend: ResourceLink) -> Self {
        Self {
            matcher: format!("{service}-path"),
            host: format!("{service}.{domain}"),
            backend,
        }
    }
}

impl RouteTable {
    /// Whether a path matcher named `name` already exists.
    pub fn has_matcher(&self, name: &str) -> bool {
        self.path_matchers.iter().any(|m| m.name == name)
    }

    /// This table with `route` appended after every existing entry.
    ///
    /// The fingerprint is kept so the write is rejected if the table changed
    /// since it was read.
    pub fn with_route(&self, route: &RouteEntry) -> RouteTable {
        let mut table = self.clone();
        table.path_matchers.push(PathMatcher {
            name: route.matcher.clone(),
            default_service: Some(route.backend.to_string()),
            extra: Map::new(),
        });
        table.host_rules.push(HostRule {
            hosts: vec![route.host.clone()],
            path_matcher: route.matcher.clone(),
            extra: Map::new(),
        });
        table
    }
}
