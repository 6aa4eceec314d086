// ABOUTME: IAM policy documents shared by Storage and Cloud Run.
// ABOUTME: Grants are applied read-modify-write so existing bindings survive.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub(super) const ALL_USERS: &str = "allUsers";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(super) struct IamPolicy {
    #[serde(default)]
    pub bindings: Vec<IamBinding>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(super) struct IamBinding {
    pub role: String,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IamPolicy {
    /// Add `member` to `role`, creating the binding if needed.
    ///
    /// Returns false when the member already held the role.
    pub fn grant(&mut self, role: &str, member: &str) -> bool {
        match self.bindings.iter_mut().find(|b| b.role == role) {
            Some(binding) if binding.members.iter().any(|m| m == member) => false,
            Some(binding) => {
                binding.members.push(member.to_string());
                true
            }
            None => {
                self.bindings.push(IamBinding {
                    role: role.to_string(),
                    members: vec![member.to_string()],
                    extra: Map::new(),
                });
                true
            }
        }
    }
}
