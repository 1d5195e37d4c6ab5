/***********
 * SIGNALS *
 ***********/

/* The Signal enum is derived from the nix* crate so the architecture
 * differences of the libc constants don't have to be retyped.
 *
 * Crate: https://crates.io/crates/nix
 * License: (MIT) - https://github.com/nix-rust/nix/blob/master/LICENSE
 *
 * Representing the Signals as i32 (libc::c_int) so the discriminant is the
 * signal number and `signal as libc::c_int` is free.
*/

use std::fmt;

use fnv::FnvHashMap;

use crate::error::Error;

/// Enum representing the different OS signals.
///
/// Not all signals are supported on all platforms/architectures. Which
/// signals does your platform support? Run: `kill -l` to find out!
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i32)]
pub enum Signal {
    /// Hangup detected on controlling terminal or death of controlling process
    SIGHUP = libc::SIGHUP,
    /// Interrupt from keyboard
    SIGINT = libc::SIGINT,
    /// Quit from keyboard
    SIGQUIT = libc::SIGQUIT,
    /// Illegal Instruction
    SIGILL = libc::SIGILL,
    /// Trace/breakpoint trap
    SIGTRAP = libc::SIGTRAP,
    /// Abort signal from abort(3)
    SIGABRT = libc::SIGABRT,
    /// Bus error (bad memory access)
    SIGBUS = libc::SIGBUS,
    /// Floating-point exception
    SIGFPE = libc::SIGFPE,
    /// Kill signal
    SIGKILL = libc::SIGKILL,
    /// User-defined signal 1
    SIGUSR1 = libc::SIGUSR1,
    /// Invalid memory reference
    SIGSEGV = libc::SIGSEGV,
    /// User-defined signal 2
    SIGUSR2 = libc::SIGUSR2,
    /// Broken pipe: write to pipe with no readers
    SIGPIPE = libc::SIGPIPE,
    /// Timer signal from alarm(2)
    SIGALRM = libc::SIGALRM,
    /// Termination signal
    SIGTERM = libc::SIGTERM,
    /// Stack fault on coprocessor.
    #[cfg(all(
        any(target_os = "android", target_os = "emscripten", target_os = "linux"),
        not(any(target_arch = "mips", target_arch = "mips64", target_arch = "sparc64"))
    ))]
    SIGSTKFLT = libc::SIGSTKFLT,
    /// Child stopped or terminated
    SIGCHLD = libc::SIGCHLD,
    /// Continue if stopped
    SIGCONT = libc::SIGCONT,
    /// Stop process
    SIGSTOP = libc::SIGSTOP,
    /// Stop typed at terminal
    SIGTSTP = libc::SIGTSTP,
    /// Terminal input for background process
    SIGTTIN = libc::SIGTTIN,
    /// Terminal output for background process
    SIGTTOU = libc::SIGTTOU,
    /// Urgent condition on socket (4.2BSD)
    SIGURG = libc::SIGURG,
    /// CPU time limit exceeded (4.2BSD)
    SIGXCPU = libc::SIGXCPU,
    /// File size limit exceeded (4.2BSD)
    SIGXFSZ = libc::SIGXFSZ,
    /// Virtual alarm clock (4.2BSD)
    SIGVTALRM = libc::SIGVTALRM,
    /// Profiling timer expired
    SIGPROF = libc::SIGPROF,
    /// Window resize signal (4.3BSD, Sun)
    SIGWINCH = libc::SIGWINCH,
    /// I/O now possible (4.2BSD)
    SIGIO = libc::SIGIO,
    /// Power failure (System V)
    #[cfg(any(target_os = "android", target_os = "emscripten", target_os = "linux"))]
    SIGPWR = libc::SIGPWR,
    /// Bad system call (SVr4)
    SIGSYS = libc::SIGSYS,
    /// Emulator trap
    #[cfg(not(any(target_os = "android", target_os = "emscripten", target_os = "linux")))]
    SIGEMT = libc::SIGEMT,
    /// A synonym for SIGPWR
    #[cfg(not(any(target_os = "android", target_os = "emscripten", target_os = "linux")))]
    SIGINFO = libc::SIGINFO,
}

pub use self::Signal::*;

impl Signal {
    /// Returns the canonical name of the signal, e.g. `"SIGINT"`.
    pub fn as_str(self) -> &'static str {
        match self {
            SIGHUP => "SIGHUP",
            SIGINT => "SIGINT",
            SIGQUIT => "SIGQUIT",
            SIGILL => "SIGILL",
            SIGTRAP => "SIGTRAP",
            SIGABRT => "SIGABRT",
            SIGBUS => "SIGBUS",
            SIGFPE => "SIGFPE",
            SIGKILL => "SIGKILL",
            SIGUSR1 => "SIGUSR1",
            SIGSEGV => "SIGSEGV",
            SIGUSR2 => "SIGUSR2",
            SIGPIPE => "SIGPIPE",
            SIGALRM => "SIGALRM",
            SIGTERM => "SIGTERM",
            #[cfg(all(
                any(target_os = "android", target_os = "emscripten", target_os = "linux"),
                not(any(target_arch = "mips", target_arch = "mips64", target_arch = "sparc64"))
            ))]
            SIGSTKFLT => "SIGSTKFLT",
            SIGCHLD => "SIGCHLD",
            SIGCONT => "SIGCONT",
            SIGSTOP => "SIGSTOP",
            SIGTSTP => "SIGTSTP",
            SIGTTIN => "SIGTTIN",
            SIGTTOU => "SIGTTOU",
            SIGURG => "SIGURG",
            SIGXCPU => "SIGXCPU",
            SIGXFSZ => "SIGXFSZ",
            SIGVTALRM => "SIGVTALRM",
            SIGPROF => "SIGPROF",
            SIGWINCH => "SIGWINCH",
            SIGIO => "SIGIO",
            #[cfg(any(target_os = "android", target_os = "emscripten", target_os = "linux"))]
            SIGPWR => "SIGPWR",
            SIGSYS => "SIGSYS",
            #[cfg(not(any(target_os = "android", target_os = "emscripten", target_os = "linux")))]
            SIGEMT => "SIGEMT",
            #[cfg(not(any(target_os = "android", target_os = "emscripten", target_os = "linux")))]
            SIGINFO => "SIGINFO",
        }
    }

    /// Returns the signal number.
    pub fn number(self) -> libc::c_int {
        self as libc::c_int
    }

    /// Returns an iterator over every signal of this platform.
    pub fn iterator() -> impl Iterator<Item = Signal> {
        SIGNALS.iter().copied()
    }
}

impl AsRef<str> for Signal {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl TryFrom<libc::c_int> for Signal {
    type Error = libc::c_int;

    fn try_from(number: libc::c_int) -> Result<Self, Self::Error> {
        Signal::iterator()
            .find(|signal| signal.number() == number)
            .ok_or(number)
    }
}

/* Array of Signal, platform dependent */
#[cfg(all(
    any(target_os = "linux", target_os = "android", target_os = "emscripten"),
    not(any(target_arch = "mips", target_arch = "mips64", target_arch = "sparc64"))
))]
const SIGNALS: [Signal; 31] = [
    SIGHUP, SIGINT, SIGQUIT, SIGILL, SIGTRAP, SIGABRT, SIGBUS, SIGFPE, SIGKILL, SIGUSR1, SIGSEGV,
    SIGUSR2, SIGPIPE, SIGALRM, SIGTERM, SIGSTKFLT, SIGCHLD, SIGCONT, SIGSTOP, SIGTSTP, SIGTTIN,
    SIGTTOU, SIGURG, SIGXCPU, SIGXFSZ, SIGVTALRM, SIGPROF, SIGWINCH, SIGIO, SIGPWR, SIGSYS,
];

#[cfg(all(
    any(target_os = "linux", target_os = "android", target_os = "emscripten"),
    any(target_arch = "mips", target_arch = "mips64", target_arch = "sparc64")
))]
const SIGNALS: [Signal; 30] = [
    SIGHUP, SIGINT, SIGQUIT, SIGILL, SIGTRAP, SIGABRT, SIGBUS, SIGFPE, SIGKILL, SIGUSR1, SIGSEGV,
    SIGUSR2, SIGPIPE, SIGALRM, SIGTERM, SIGCHLD, SIGCONT, SIGSTOP, SIGTSTP, SIGTTIN, SIGTTOU,
    SIGURG, SIGXCPU, SIGXFSZ, SIGVTALRM, SIGPROF, SIGWINCH, SIGIO, SIGPWR, SIGSYS,
];

#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "emscripten")))]
const SIGNALS: [Signal; 31] = [
    SIGHUP, SIGINT, SIGQUIT, SIGILL, SIGTRAP, SIGABRT, SIGBUS, SIGFPE, SIGKILL, SIGUSR1, SIGSEGV,
    SIGUSR2, SIGPIPE, SIGALRM, SIGTERM, SIGCHLD, SIGCONT, SIGSTOP, SIGTSTP, SIGTTIN, SIGTTOU,
    SIGURG, SIGXCPU, SIGXFSZ, SIGVTALRM, SIGPROF, SIGWINCH, SIGIO, SIGSYS, SIGEMT, SIGINFO,
];

/*********
 * TRAPS *
 *********/

/// Anything a trap can be set on: a real signal, or one of the two
/// pseudo-signals fired by the embedder.
///
/// Ordering follows listing order: `EXIT` first, then real signals by
/// number, then `ERR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Trap {
    /// Runs when the process exits normally
    Exit,
    /// A real OS signal
    Signal(Signal),
    /// Runs when a command fails
    Err,
}

impl Trap {
    /// Canonical name: `EXIT`, `ERR`, or the signal name with its `SIG`
    /// prefix.
    pub fn name(self) -> &'static str {
        match self {
            Trap::Exit => "EXIT",
            Trap::Signal(signal) => signal.as_str(),
            Trap::Err => "ERR",
        }
    }

    /// Numeric code, if the trap has a stable one. `EXIT` is 0 the way
    /// `trap 0` spells it; `ERR` has none.
    pub fn number(self) -> Option<libc::c_int> {
        match self {
            Trap::Exit => Some(0),
            Trap::Signal(signal) => Some(signal.number()),
            Trap::Err => None,
        }
    }
}

impl From<Signal> for Trap {
    fn from(signal: Signal) -> Self {
        Trap::Signal(signal)
    }
}

impl fmt::Display for Trap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/*************
 * DIRECTORY *
 *************/

/// Bidirectional lookup between trap names, numbers and their alternate
/// spellings. Built once from the runtime's signal enumeration and never
/// changed afterwards.
#[derive(Debug, Clone)]
pub struct Directory {
    traps: Vec<Trap>,
    aliases: FnvHashMap<String, Trap>,
}

impl Directory {
    /// Builds the directory over `signals` plus the `EXIT` and `ERR`
    /// pseudo-signals.
    pub fn new<I: IntoIterator<Item = Signal>>(signals: I) -> Self {
        let mut traps: Vec<Trap> = signals.into_iter().map(Trap::Signal).collect();
        traps.push(Trap::Exit);
        traps.push(Trap::Err);
        traps.sort();
        traps.dedup();

        let mut aliases = FnvHashMap::default();
        for &trap in &traps {
            aliases.insert(trap.name().to_owned(), trap);
            if let Some(number) = trap.number() {
                aliases.insert(number.to_string(), trap);
            }
            if let Some(bare) = trap.name().strip_prefix("SIG") {
                aliases.insert(bare.to_owned(), trap);
            }
        }

        Directory { traps, aliases }
    }

    /// Resolves a signal number, a name in any letter case, or a name
    /// missing its `SIG` prefix to the canonical trap.
    ///
    /// ```
    /// use trapstack::{Directory, Signal, Trap};
    ///
    /// let directory = Directory::new(Signal::iterator());
    /// for spec in &["2", "int", "INT", "SIGINT", "sigint"] {
    ///     assert_eq!(directory.resolve(spec).unwrap(), Trap::Signal(Signal::SIGINT));
    /// }
    /// assert!(directory.resolve("SIGNOPE").is_err());
    /// ```
    pub fn resolve(&self, spec: &str) -> Result<Trap, Error> {
        let key = spec.trim().to_ascii_uppercase();
        self.aliases
            .get(&key)
            .copied()
            .ok_or_else(|| Error::InvalidSignal(spec.to_owned()))
    }

    /// Every trap known to this directory, in listing order.
    pub fn traps(&self) -> &[Trap] {
        &self.traps
    }
}
