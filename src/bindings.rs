/************
 * BINDINGS *
 ************/
/* Signal -> ordered handles. Absence of an entry means "nothing bound"; an
 * entry is never left holding an empty sequence.
*/

use fnv::FnvHashMap;

use crate::registry::Handle;
use crate::signal::Trap;

/// The authoritative model of which commands fire, in which order, for each
/// trap.
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    bindings: FnvHashMap<Trap, Vec<Handle>>,
}

impl BindingTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `handle` to the tail of the trap's sequence.
    pub fn append(&mut self, trap: Trap, handle: Handle) {
        self.bindings.entry(trap).or_default().push(handle);
    }

    /// Drops the trap's whole sequence.
    pub fn clear(&mut self, trap: Trap) {
        self.bindings.remove(&trap);
    }

    /// Deletes the first occurrence of `handle` from the trap's sequence,
    /// dropping the sequence once it is empty. Returns whether the handle
    /// was found.
    pub fn remove(&mut self, trap: Trap, handle: Handle) -> bool {
        let sequence = match self.bindings.get_mut(&trap) {
            Some(sequence) => sequence,
            None => return false,
        };
        let position = match sequence.iter().position(|&bound| bound == handle) {
            Some(position) => position,
            None => return false,
        };
        sequence.remove(position);
        if sequence.is_empty() {
            self.bindings.remove(&trap);
        }
        true
    }

    /// The trap's handles in execution order; empty when nothing is bound.
    pub fn sequence(&self, trap: Trap) -> &[Handle] {
        self.bindings.get(&trap).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether anything is bound to the trap.
    pub fn is_bound(&self, trap: Trap) -> bool {
        self.bindings.contains_key(&trap)
    }

    /// Every trap with a sequence, in listing order.
    pub fn bound(&self) -> Vec<Trap> {
        let mut traps: Vec<Trap> = self.bindings.keys().copied().collect();
        traps.sort();
        traps
    }

    /// Traps whose sequence contains `handle`, in listing order.
    pub fn bound_to(&self, handle: Handle) -> Vec<Trap> {
        let mut traps: Vec<Trap> = self
            .bindings
            .iter()
            .filter(|(_, sequence)| sequence.contains(&handle))
            .map(|(&trap, _)| trap)
            .collect();
        traps.sort();
        traps
    }
}
