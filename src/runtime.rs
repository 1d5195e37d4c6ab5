/***********
 * RUNTIME *
 ***********/
/* The handler slots trapstack sits on top of.
 *
 * A runtime offers exactly one handler body per trap, last write wins. The
 * TrapContext is the only thing that should write to it; reads may come
 * from anywhere.
*/

use fnv::FnvHashMap;

use crate::error::Error;
use crate::listing;
use crate::signal::{Signal, Trap};

/// One-body-per-trap handler table.
pub trait Runtime {
    /// Exhaustive enumeration of the signals this runtime can trap.
    fn signals(&self) -> Result<Vec<Signal>, Error>;

    /// The body currently installed for `trap`, if any.
    fn raw(&self, trap: Trap) -> Option<String>;

    /// Installs `body` as the trap's handler, replacing whatever was there.
    fn install(&mut self, trap: Trap, body: &str) -> Result<(), Error>;

    /// Drops the trap's handler, restoring the default disposition.
    fn reset(&mut self, trap: Trap) -> Result<(), Error>;

    /// Prints the installed handlers of `traps` in listing format, one entry
    /// per trap that has a body.
    fn listing(&self, traps: &[Trap]) -> String {
        let mut text = String::new();
        for &trap in traps {
            if let Some(body) = self.raw(trap) {
                text.push_str(&listing::format_entry(&body, trap.name()));
                text.push('\n');
            }
        }
        text
    }
}

/// In-memory handler table. Nothing is delivered; the slots are just kept.
#[derive(Debug, Clone, Default)]
pub struct MemoryRuntime {
    slots: FnvHashMap<Trap, String>,
}

impl MemoryRuntime {
    /// Creates a runtime with every trap at its default disposition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a runtime whose slots are already occupied, as if something
    /// had set traps before trapstack was loaded.
    pub fn with_slots<I, B>(slots: I) -> Self
    where
        I: IntoIterator<Item = (Trap, B)>,
        B: Into<String>,
    {
        MemoryRuntime {
            slots: slots
                .into_iter()
                .map(|(trap, body)| (trap, body.into()))
                .collect(),
        }
    }
}

impl Runtime for MemoryRuntime {
    fn signals(&self) -> Result<Vec<Signal>, Error> {
        Ok(Signal::iterator().collect())
    }

    fn raw(&self, trap: Trap) -> Option<String> {
        self.slots.get(&trap).cloned()
    }

    fn install(&mut self, trap: Trap, body: &str) -> Result<(), Error> {
        self.slots.insert(trap, body.to_owned());
        Ok(())
    }

    fn reset(&mut self, trap: Trap) -> Result<(), Error> {
        self.slots.remove(&trap);
        Ok(())
    }
}
