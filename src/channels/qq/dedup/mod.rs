use indexmap::IndexSet;

/// Default number of event ids remembered per channel.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Bounded FIFO set of recently seen event ids.
///
/// Once full, recording a new id evicts the oldest one. Owned by a single
/// channel instance.
#[derive(Debug, Clone)]
pub struct DedupWindow {
    ids: IndexSet<String>,
    capacity: usize,
}

impl DedupWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ids: IndexSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns `true` and records `id` if it is not among the last
    /// `capacity` recorded ids. Returns `false` for a replay.
    pub fn seen(&mut self, id: &str) -> bool {
        if self.ids.contains(id) {
            return false;
        }
        if self.ids.len() >= self.capacity {
            // IndexSet preserves insertion order, so the oldest id is at the front
            self.ids.shift_remove_index(0);
        }
        self.ids.insert(id.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

impl Default for DedupWindow {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests;
