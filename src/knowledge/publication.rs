//! Publication ledger: what the local node last told the property layer

use crate::entry::ComponentEntry;
use crate::properties::PropertyDelta;
use crate::types::PropertyKey;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Memory of published properties, used to compute minimal deltas
#[derive(Debug, Default)]
pub struct PublicationLedger {
    prefix: String,
    published: HashMap<PropertyKey, String>,
}

impl PublicationLedger {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            published: HashMap::new(),
        }
    }

    pub fn property_key(&self, component_id: &str) -> PropertyKey {
        format!("{}{}", self.prefix, component_id)
    }

    /// Diff the shared entries against the ledger and record the result
    ///
    /// Entries whose serialized form is unchanged produce nothing; keys that
    /// were published before but are no longer shared become removals.
    pub fn update(&mut self, shared: &[ComponentEntry]) -> PropertyDelta {
        let mut delta = PropertyDelta::new();
        let mut current_keys = BTreeSet::new();

        for entry in shared {
            let Some(serialized) = entry.serialized_form() else {
                continue;
            };
            let key = self.property_key(entry.component_id());
            if self.published.get(&key).map(String::as_str) != Some(serialized) {
                debug!(component = entry.component_id(), "Publishing component descriptor");
                delta.insert(key.clone(), Some(serialized.to_string()));
            }
            current_keys.insert(key);
        }

        for key in self.published.keys() {
            if !current_keys.contains(key) {
                debug!(key = %key, "Unpublishing component");
                delta.insert(key.clone(), None);
            }
        }

        for (key, value) in &delta {
            match value {
                Some(v) => {
                    self.published.insert(key.clone(), v.clone());
                }
                None => {
                    self.published.remove(key);
                }
            }
        }
        delta
    }

    pub fn published(&self) -> &HashMap<PropertyKey, String> {
        &self.published
    }
}
