use crate::core::models::knot::KnotType;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Whole-frame knot types already obtained from the oracle, keyed by frame index.
///
/// Scanning, validation and event typing revisit the same frames many times; each frame
/// should reach the oracle once per analysis. The map is shared between worker threads.
#[derive(Debug, Default)]
pub struct FrameLabelCache {
    data: Mutex<HashMap<usize, KnotType>>,
}

impl FrameLabelCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<usize, KnotType>> {
        // A poisoned map still holds only complete entries.
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, frame: usize) -> Option<KnotType> {
        self.lock().get(&frame).cloned()
    }

    pub fn insert(&self, frame: usize, knot: KnotType) {
        self.lock().insert(frame, knot);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_returns_labels() {
        let cache = FrameLabelCache::new();
        assert!(cache.get(4).is_none());
        cache.insert(4, KnotType::Trefoil);
        cache.insert(5, KnotType::Unknot);
        assert_eq!(cache.get(4), Some(KnotType::Trefoil));
        assert_eq!(cache.len(), 2);
    }
}
