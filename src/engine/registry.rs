//! Registry of platform adapters known to the orchestrator

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::domain::model::PlatformId;
use crate::ports::PlatformAdapter;

/// Platform adapters keyed by the platform they publish to
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: BTreeMap<PlatformId, Arc<dyn PlatformAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own platform id, returning any adapter it replaced
    pub fn register(&mut self, adapter: Arc<dyn PlatformAdapter>) -> Option<Arc<dyn PlatformAdapter>> {
        self.adapters.insert(adapter.platform(), adapter)
    }

    /// Builder-style registration
    pub fn with(mut self, adapter: Arc<dyn PlatformAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn get(&self, platform: &PlatformId) -> Option<Arc<dyn PlatformAdapter>> {
        self.adapters.get(platform).cloned()
    }

    pub fn contains(&self, platform: &PlatformId) -> bool {
        self.adapters.contains_key(platform)
    }

    pub fn platforms(&self) -> impl Iterator<Item = &PlatformId> {
        self.adapters.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlatformId, &Arc<dyn PlatformAdapter>)> {
        self.adapters.iter()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.adapters.keys()).finish()
    }
}
