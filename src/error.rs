/**********
 * ERRORS *
 **********/
/* Every public operation returns this error. Per-signal failures inside a
 * batch call are collected into Error::Batch so the caller still sees which
 * signals were refused while the rest of the batch went through.
*/

use std::fmt;
use std::io;

use thiserror::Error;

use crate::registry::Handle;

/// Trapstack Error type.
///
/// Each variant maps onto one of the exit codes a `trap`-like builtin would
/// report, see [`Error::code`].
#[derive(Debug, Error)]
pub enum Error {
    /// The text does not name a known signal, `EXIT` or `ERR`.
    #[error("{0}: invalid signal specification")]
    InvalidSignal(String),

    /// The signal is paused and the call did not opt in to editing it.
    #[error("{0}: signal is paused, restore it or allow editing paused signals")]
    SignalPaused(String),

    /// `restore` was called on a signal that carries no pause marker.
    #[error("{0}: signal is not paused")]
    NotPaused(String),

    /// The handle is not bound to the named signal.
    #[error("{signal}: command {handle} is not bound to this signal")]
    HandleNotBound {
        /// Canonical name of the signal that was searched
        signal: String,
        /// The handle that was not found
        handle: Handle,
    },

    /// A required argument was not supplied.
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    /// A command body was required but the caller passed an empty one.
    #[error("command body is empty")]
    EmptyBody,

    /// No command with this handle was ever stored.
    #[error("{0}: no such command")]
    UnknownHandle(Handle),

    /// Malformed option passed to the argument-vector entry point.
    #[error("{0}: invalid option")]
    Usage(String),

    /// A trap listing could not be reverse-parsed.
    #[error("malformed trap listing: {0}")]
    Malformed(String),

    /// The underlying runtime refused to change a handler slot.
    #[error("runtime error: {0}")]
    Runtime(#[from] io::Error),

    /// One or more signals of a batch call failed; the others were applied.
    #[error("{}", Failures(.0))]
    Batch(Vec<Error>),
}

impl Error {
    /// Exit status a `trap`-style builtin reports for this error.
    ///
    /// * `1` for validation failures (bad signal, paused conflict, ...)
    /// * `2` for malformed low-level arguments
    ///
    /// A batch reports the highest code of its members.
    pub fn code(&self) -> i32 {
        match self {
            Error::Usage(_) | Error::Malformed(_) => 2,
            Error::Batch(errors) => errors.iter().map(Error::code).max().unwrap_or(1),
            _ => 1,
        }
    }

    /// Per-signal failures carried by this error. A non-batch error is its
    /// own single failure.
    pub fn failures(&self) -> &[Error] {
        match self {
            Error::Batch(errors) => errors,
            other => std::slice::from_ref(other),
        }
    }
}

/* Joins the messages of a batch, one per line */
struct Failures<'a>(&'a [Error]);

impl fmt::Display for Failures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

/// Folds the per-signal failures of a batch call into a result.
pub(crate) fn aggregate(mut failures: Vec<Error>) -> Result<(), Error> {
    match failures.len() {
        0 => Ok(()),
        1 => Err(failures.remove(0)),
        _ => Err(Error::Batch(failures)),
    }
}
