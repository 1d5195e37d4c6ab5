//! # Trapstack
//! Composable, pausable and reversible signal traps.
//!
//! A process gets one handler per signal and the last one set wins.
//! Trapstack keeps an ordered list of commands per signal instead, renders
//! them into that one handler, and lets you take single commands back out,
//! pause a signal's whole chain, and restore it later exactly as it was.
//!
//! ## Quick Start
//! ```
//! use trapstack::{MemoryRuntime, TrapContext};
//!
//! fn main() -> Result<(), trapstack::Error> {
//!     let mut traps = TrapContext::new(MemoryRuntime::new())?;
//!
//!     /* Both run on SIGINT, in this order */
//!     let hello = traps.add("echo 'Hello, World!'", &["INT"])?;
//!     traps.add("echo 'Hello, Girls!'", &["SIGINT"])?;
//!
//!     /* Stop saying "Hello, World!" */
//!     traps.remove(hello, &["2"])?;
//!
//!     /* Let SIGINT do its default thing for a while ... */
//!     traps.pause(&["int"])?;
//!     /* ... and take the handler back */
//!     traps.restore(&["int"])?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Things To Know
//!
//! ## Commands are shell text
//! Every command is a fragment of `sh` code. The commands of one signal are
//! rendered into a single handler body where each command runs in its own
//! fault domain: one failing does not stop the next, and the handler
//! reports the status of the last command that failed (or the status that
//! was pending when the trap fired). Each command reads `$?` the way it
//! would in a hand-written handler. [`TrapContext::add_raw`] leaves a
//! command unguarded so `set -e` can stop the handler on it.
//!
//! ## Handlers that were already there are kept
//! The first time a context looks at its runtime it absorbs every handler
//! already installed, each as one opaque command, so adding to a signal
//! composes with what was there instead of clobbering it.
//!
//! ## Runtimes
//! [`MemoryRuntime`] just keeps the handler bodies. [`OsRuntime`] installs
//! them for real signals and runs them under `sh` when the signal arrives.
//! [`context()`] hands out a process-wide context over `OsRuntime`.
//!
//! ## Errors
//! Calls naming several signals apply to every signal they can and report
//! the ones they couldn't as one [`Error`]. [`Error::code`] gives the exit
//! status a `trap` builtin would use for it.

#![deny(
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces,
    unused_qualifications
)]

mod bindings;
mod context;
mod error;
/// Running a handler body under `sh`.
pub mod exec;
/// The `trap -- '<body>' NAME` listing format.
pub mod listing;
#[cfg(unix)]
mod os;
mod paused;
mod registry;
mod render;
mod runtime;
mod signal;

pub use crate::bindings::BindingTable;
pub use crate::context::{Options, TrapContext, APPEND_ENV, EDIT_PAUSED_ENV};
pub use crate::error::Error;
#[cfg(unix)]
pub use crate::os::OsRuntime;
pub use crate::paused::PausedSet;
pub use crate::registry::{Command, Handle, Registry};
pub use crate::render::{compile, status_var, BEGIN_MARKER, END_MARKER, STATUS_VAR};
pub use crate::runtime::{MemoryRuntime, Runtime};
pub use crate::signal::*;

#[cfg(unix)]
use std::sync::{Mutex, MutexGuard, PoisonError};

#[cfg(unix)]
use lazy_static::lazy_static;

/***********
 * CONTEXT *
 ***********/

#[cfg(unix)]
lazy_static! {
    /* Built on the first context() call. Flags come from the environment,
     * the directory from this platform's signal list.
    */
    static ref CONTEXT: Mutex<TrapContext<OsRuntime>> = Mutex::new(TrapContext::with_directory(
        OsRuntime::new(),
        Directory::new(Signal::iterator()),
        Options::from_env(),
    ));
}

/// The process-wide context over the real signal dispositions.
///
/// # Example
/// ```no_run
/// fn main() -> Result<(), trapstack::Error> {
///     let mut traps = trapstack::context();
///     traps.add("echo 'Screen Resized!'", &["SIGWINCH"])?;
///     Ok(())
/// }
/// ```
#[cfg(unix)]
pub fn context() -> MutexGuard<'static, TrapContext<OsRuntime>> {
    CONTEXT.lock().unwrap_or_else(PoisonError::into_inner)
}
