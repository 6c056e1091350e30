use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use construye_catalog::Catalog;
use log::debug;
use lru::LruCache;

use crate::error::Result;
use crate::normalizer::ProjectBrief;
use crate::pipeline::{generate_plan, GeneratedPlan};

const DEFAULT_CAPACITY: usize = 64;

/// Memoizes generated plans by brief and catalog fingerprint.
///
/// Plans are immutable, so hits hand out the same `Arc`. Failed generations
/// are not stored.
pub struct PlanCache {
    entries: Mutex<LruCache<String, Arc<GeneratedPlan>>>,
}

impl Default for PlanCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl PlanCache {
    /// A zero capacity is bumped to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    #[must_use]
    pub fn key(brief: &ProjectBrief, catalog: &Catalog) -> String {
        format!("{}:{}", catalog.fingerprint(), brief.fingerprint())
    }

    pub fn get_or_generate(
        &self,
        brief: &ProjectBrief,
        catalog: &Catalog,
    ) -> Result<Arc<GeneratedPlan>> {
        let key = Self::key(brief, catalog);
        if let Some(plan) = self.entries.lock().expect("cache mutex poisoned").get(&key) {
            debug!("plan cache hit {}", &key[key.len().saturating_sub(12)..]);
            return Ok(Arc::clone(plan));
        }

        // Generation runs unlocked; two racing misses both compute the same value.
        let plan = Arc::new(generate_plan(brief, catalog)?);
        self.entries
            .lock()
            .expect("cache mutex poisoned")
            .put(key, Arc::clone(&plan));
        Ok(plan)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache mutex poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().expect("cache mutex poisoned").clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use construye_protocol::IntakePayload;
    use serde_json::json;

    fn brief(budget: u32) -> ProjectBrief {
        let payload: IntakePayload = serde_json::from_value(json!({
            "plotWidth": 10, "plotLength": 15, "budget": budget,
            "occupants": 3, "floors": 1, "city": "Puebla"
        }))
        .unwrap();
        normalize(&payload, Catalog::bundled()).unwrap()
    }

    #[test]
    fn hit_returns_the_same_plan() {
        let cache = PlanCache::new(4);
        let catalog = Catalog::bundled();
        let first = cache.get_or_generate(&brief(450_000), catalog).unwrap();
        let second = cache.get_or_generate(&brief(450_000), catalog).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = PlanCache::new(2);
        let catalog = Catalog::bundled();
        let first = cache.get_or_generate(&brief(400_000), catalog).unwrap();
        cache.get_or_generate(&brief(500_000), catalog).unwrap();
        cache.get_or_generate(&brief(600_000), catalog).unwrap();
        assert_eq!(cache.len(), 2);

        let again = cache.get_or_generate(&brief(400_000), catalog).unwrap();
        assert!(!Arc::ptr_eq(&first, &again));
        assert_eq!(*first, *again);
    }

    #[test]
    fn catalog_changes_the_key() {
        let base = Catalog::bundled();
        let tuned = base.overlay(b"[costs]\ncontingency_rate = 0.1\n").unwrap();
        assert_ne!(PlanCache::key(&brief(1), base), PlanCache::key(&brief(1), &tuned));
    }

    #[test]
    fn errors_are_not_cached() {
        let cache = PlanCache::default();
        let payload: IntakePayload = serde_json::from_value(json!({
            "plotWidth": 2, "plotLength": 2, "budget": 100000,
            "occupants": 1, "floors": 1, "city": "Puebla"
        }))
        .unwrap();
        let tiny = normalize(&payload, Catalog::bundled()).unwrap();
        assert!(cache.get_or_generate(&tiny, Catalog::bundled()).is_err());
        assert!(cache.is_empty());
    }
}
