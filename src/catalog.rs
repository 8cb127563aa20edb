//! Forest Catalog
//!
//! One forest per connected cluster. A new discovery snapshot replaces the
//! cluster's forest wholesale; readers keep whatever `Arc<Forest>` they
//! already hold.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::checksum::Checksum;
use crate::config::BuildConfig;
use crate::error::Result;
use crate::forest::Forest;

/// Outcome of [`ForestCatalog::install`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Installed {
    /// First forest for this cluster
    Added,
    /// Previous forest replaced by a rebuilt one
    Replaced,
    /// Snapshot identical to the installed one; nothing rebuilt
    Unchanged,
}

#[derive(Default)]
pub struct ForestCatalog {
    forests: RwLock<HashMap<String, Arc<Forest>>>,
}

impl ForestCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a forest from a raw discovery document and make it current for `cluster`
    ///
    /// A decode failure leaves the previously installed forest in place.
    pub fn install(&self, cluster: &str, raw: &[u8], config: &BuildConfig) -> Result<Installed> {
        let snapshot = Checksum::from_bytes(raw);
        if let Some(current) = self.get(cluster) {
            if current.snapshot() == Some(&snapshot) {
                debug!(cluster, snapshot = snapshot.short(), "discovery snapshot unchanged");
                return Ok(Installed::Unchanged);
            }
        }

        // Built outside the lock; concurrent installs for one cluster keep the last writer.
        let forest = Arc::new(Forest::build(raw, config)?);
        let previous = self.forests.write().insert(cluster.to_string(), forest);

        let outcome = if previous.is_some() {
            Installed::Replaced
        } else {
            Installed::Added
        };
        info!(cluster, snapshot = snapshot.short(), ?outcome, "forest installed");
        Ok(outcome)
    }

    pub fn get(&self, cluster: &str) -> Option<Arc<Forest>> {
        self.forests.read().get(cluster).cloned()
    }

    pub fn remove(&self, cluster: &str) -> Option<Arc<Forest>> {
        self.forests.write().remove(cluster)
    }

    /// Cluster names, sorted
    pub fn clusters(&self) -> Vec<String> {
        let mut names: Vec<String> = self.forests.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.forests.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.forests.read().is_empty()
    }
}
