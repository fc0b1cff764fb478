//! Site directory: which hives belong to which apiary.
//!
//! Only consulted when a session is created.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::error::{Result, WorkflowError};

pub trait SiteDirectory {
    fn has_group(&self, site_group_id: &str) -> bool;

    fn contains(&self, site_group_id: &str, site_id: &str) -> bool;

    /// Check that every site belongs to the group. Unknown groups are
    /// `NotFound`; foreign sites are an `InvalidArgument` naming all of them.
    fn validate_sites(&self, site_group_id: &str, site_ids: &[String]) -> Result<()> {
        if !self.has_group(site_group_id) {
            return Err(WorkflowError::NotFound(format!("apiary {site_group_id}")));
        }
        let foreign: Vec<&str> = site_ids
            .iter()
            .filter(|s| !self.contains(site_group_id, s.as_str()))
            .map(String::as_str)
            .collect();
        if !foreign.is_empty() {
            return Err(WorkflowError::InvalidArgument(format!(
                "hives not in apiary {site_group_id}: {}",
                foreign.join(", ")
            )));
        }
        Ok(())
    }
}

/// An apiary and its hives, as declared in `hive-rounds.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Apiary {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub hives: Vec<String>,
}

/// Directory backed by the configured `[[apiary]]` tables.
#[derive(Debug, Clone, Default)]
pub struct ConfigSiteDirectory {
    groups: HashMap<String, HashSet<String>>,
}

impl ConfigSiteDirectory {
    pub fn new(apiaries: &[Apiary]) -> Self {
        let groups = apiaries
            .iter()
            .map(|a| (a.id.clone(), a.hives.iter().cloned().collect()))
            .collect();
        Self { groups }
    }
}

impl SiteDirectory for ConfigSiteDirectory {
    fn has_group(&self, site_group_id: &str) -> bool {
        self.groups.contains_key(site_group_id)
    }

    fn contains(&self, site_group_id: &str, site_id: &str) -> bool {
        self.groups
            .get(site_group_id)
            .is_some_and(|hives| hives.contains(site_id))
    }
}
