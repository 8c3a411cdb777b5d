//! The aggregated view shared by pollers, the renderer and the watcher.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::display::DisplayRecord;

#[derive(Debug)]
struct Inner {
    generation: u64,
    records: BTreeMap<usize, DisplayRecord>,
    dirty: bool,
}

/// Slot-ordered display records plus a dirty flag, behind one lock.
///
/// Every reload starts a new generation. Pollers publish with the generation
/// they were started in, and publishes from an older generation are ignored.
#[derive(Debug)]
pub struct AggregatedState {
    inner: Mutex<Inner>,
}

impl Default for AggregatedState {
    fn default() -> Self {
        Self::new()
    }
}

impl AggregatedState {
    pub fn new() -> Self {
        AggregatedState {
            inner: Mutex::new(Inner {
                generation: 0,
                records: BTreeMap::new(),
                dirty: true,
            }),
        }
    }

    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    /// Drops every record and returns the new generation.
    pub fn reset(&self) -> u64 {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.records.clear();
        inner.dirty = true;
        inner.generation
    }

    /// Sets or removes (`None`) a slot. Returns whether anything changed.
    pub fn publish(&self, generation: u64, slot: usize, record: Option<DisplayRecord>) -> bool {
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            return false;
        }
        let changed = match record {
            None => inner.records.remove(&slot).is_some(),
            Some(record) => match inner.records.get(&slot) {
                Some(existing) if *existing == record => false,
                _ => {
                    inner.records.insert(slot, record);
                    true
                }
            },
        };
        if changed {
            inner.dirty = true;
        }
        changed
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.lock().dirty
    }

    /// Calls `draw` with the records in slot order if anything changed since the last draw.
    ///
    /// The lock is held while drawing so a frame never mixes two states. The
    /// dirty flag is only cleared when `draw` succeeds.
    pub fn render_if_dirty<E>(
        &self,
        draw: impl FnOnce(&mut dyn Iterator<Item = &DisplayRecord>) -> Result<(), E>,
    ) -> Result<bool, E> {
        let mut inner = self.inner.lock();
        if !inner.dirty {
            return Ok(false);
        }
        draw(&mut inner.records.values())?;
        inner.dirty = false;
        Ok(true)
    }

    pub fn snapshot(&self) -> Vec<(usize, DisplayRecord)> {
        self.inner.lock().records.iter().map(|(slot, r)| (*slot, r.clone())).collect()
    }
}
