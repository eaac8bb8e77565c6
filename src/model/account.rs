//! Account and library section identities.
//!
//! The orchestrator only needs account ids; names and sections come from
//! configuration and are used for display.

use serde::{Deserialize, Serialize};

/// An account that runs can be queued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
}

impl Account {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Placeholder identity for ids missing from configuration.
    #[must_use]
    pub fn unnamed(id: i64) -> Self {
        Self::new(id, format!("Account {id}"))
    }
}

/// A local library section that can be pushed on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Section key, used as the run target.
    pub key: String,
    pub title: String,
    /// `movie` or `show`.
    #[serde(rename = "type", default = "default_section_kind")]
    pub kind: String,
}

fn default_section_kind() -> String {
    "movie".to_string()
}

/// Lookup of account display names by id.
pub trait AccountDirectory: Send + Sync {
    fn get(&self, id: i64) -> Option<Account>;

    /// Configured name, or the placeholder for unknown ids.
    fn name(&self, id: i64) -> String {
        self.get(id).unwrap_or_else(|| Account::unnamed(id)).name
    }
}

impl AccountDirectory for Vec<Account> {
    fn get(&self, id: i64) -> Option<Account> {
        self.iter().find(|a| a.id == id).cloned()
    }
}
