/* Traps whose live slot was reset to the default disposition while their
 * bindings were kept for a later restore.
*/

use fnv::FnvHashSet;

use crate::signal::Trap;

/// Set of paused traps.
#[derive(Debug, Clone, Default)]
pub struct PausedSet {
    paused: FnvHashSet<Trap>,
}

impl PausedSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the trap paused. Returns false if it already was.
    pub fn mark(&mut self, trap: Trap) -> bool {
        self.paused.insert(trap)
    }

    /// Removes the marker. Returns false if the trap was not paused.
    pub fn unmark(&mut self, trap: Trap) -> bool {
        self.paused.remove(&trap)
    }

    /// Whether the trap is paused.
    pub fn contains(&self, trap: Trap) -> bool {
        self.paused.contains(&trap)
    }

    /// Every paused trap, in listing order.
    pub fn traps(&self) -> Vec<Trap> {
        let mut traps: Vec<Trap> = self.paused.iter().copied().collect();
        traps.sort();
        traps
    }
}
