/************
 * REGISTRY *
 ************/
/* Append-only store of command bodies. A handle is the index of the command
 * in the store, so handles increase monotonically and are never reused. The
 * store never compacts; an unbound command just becomes unreachable.
*/

use std::fmt;

use crate::error::Error;

/// Stable identifier of a command added to a trap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(u64);

impl Handle {
    /// The raw integer value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for Handle {
    fn from(raw: u64) -> Self {
        Handle(raw)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One caller-supplied fragment of handler code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    body: String,
    isolated: bool,
}

impl Command {
    /// The text exactly as the caller supplied it.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Whether the fragment runs in its own fault domain. Raw fragments are
    /// left to propagate their failure to the handler.
    pub fn is_isolated(&self) -> bool {
        self.isolated
    }
}

/// Store of every command ever added, keyed by [`Handle`].
#[derive(Debug, Clone, Default)]
pub struct Registry {
    commands: Vec<Command>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `body` under a fresh handle. Identical bodies are never
    /// deduplicated.
    pub fn store(&mut self, body: &str, isolated: bool) -> Handle {
        let handle = Handle(self.commands.len() as u64);
        self.commands.push(Command {
            body: body.to_owned(),
            isolated,
        });
        handle
    }

    /// Looks a command up by handle.
    pub fn fetch(&self, handle: Handle) -> Result<&Command, Error> {
        usize::try_from(handle.0)
            .ok()
            .and_then(|index| self.commands.get(index))
            .ok_or(Error::UnknownHandle(handle))
    }

    /// The most recently issued handle, if any command was stored yet.
    pub fn last_handle(&self) -> Option<Handle> {
        self.commands.len().checked_sub(1).map(|last| Handle(last as u64))
    }
}
