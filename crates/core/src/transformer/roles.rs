//! Editorial roles.
//!
//! A role is a named system prompt that sets the editor persona used for a
//! whole job. The registry treats the role name as opaque; resolution to a
//! prompt happens here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A resolved role: its name and the system prompt sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConfig {
    pub name: String,
    pub system_prompt: String,
}

/// Available roles and the one used when a submission names none.
///
/// Providing `[roles.profiles]` in the config replaces the built-in set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolesConfig {
    #[serde(default = "default_role")]
    pub default: String,
    #[serde(default = "default_profiles")]
    pub profiles: BTreeMap<String, String>,
}

impl Default for RolesConfig {
    fn default() -> Self {
        Self {
            default: default_role(),
            profiles: default_profiles(),
        }
    }
}

impl RolesConfig {
    /// Resolves a role by name, or the default role when `name` is `None`
    /// or blank.
    pub fn resolve(&self, name: Option<&str>) -> Option<RoleConfig> {
        let name = match name.map(str::trim) {
            Some(n) if !n.is_empty() => n,
            _ => self.default.as_str(),
        };

        self.profiles.get(name).map(|prompt| RoleConfig {
            name: name.to_string(),
            system_prompt: prompt.clone(),
        })
    }

    /// Role names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }
}

fn default_role() -> String {
    "academic".to_string()
}

fn default_profiles() -> BTreeMap<String, String> {
    [
        (
            "legal",
            "You are a senior paralegal editor. Ensure legal accuracy, eliminate ambiguity, \
             flag risky language, and maintain formal contract structure. Use precise terminology.",
        ),
        (
            "academic",
            "You are a peer-review editor for top-tier academic journals. Fix grammar, clarity, \
             logic, and citation style (APA/MLA). Use formal, precise language.",
        ),
        (
            "business",
            "You are a corporate communications director. Ensure clarity, brevity, \
             professionalism, and brand voice. Eliminate jargon unless essential.",
        ),
        (
            "creative",
            "You are a bestselling novelist's editor. Improve flow, rhythm, imagery, dialogue, \
             and emotional impact. Suggest vivid alternatives.",
        ),
        (
            "mentor",
            "You are a kind, patient writing coach. Correct gently, praise strengths, and \
             explain every change in simple terms.",
        ),
    ]
    .into_iter()
    .map(|(name, prompt)| (name.to_string(), prompt.to_string()))
    .collect()
}
