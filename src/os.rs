/**************
 * OS RUNTIME *
 **************/
/* Handler slots backed by real signal dispositions.
 *
 * Installing a slot for a real signal points its sigaction at c_handler().
 * The handler only writes the signal number to a pipe, which is one of the
 * few things a signal handler may safely do. A single event loop thread
 * reads the pipe and runs the body of the slot through `sh`.
 *
 * EXIT and ERR are never raised by the OS; the embedder fires them with
 * OsRuntime::fire().
*/

use std::io;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Mutex, MutexGuard, Once, PoisonError};
use std::thread;

use fnv::FnvHashMap;
use lazy_static::lazy_static;

use crate::error::Error;
use crate::exec;
use crate::runtime::Runtime;
use crate::signal::{Signal, Trap};

/* Set up at most ONCE, on the first install of a real signal. If the pipe
 * or the thread cannot be created, WAKE_FD stays negative and every later
 * install fails.
*/
static SETUP: Once = Once::new();

/* Write end of the wake-up pipe, read by c_handler() */
static WAKE_FD: AtomicI32 = AtomicI32::new(-1);

lazy_static! {
    /* The handler slots. Shared by every OsRuntime since there is only one
     * set of signal dispositions per process.
    */
    static ref SLOTS: Mutex<FnvHashMap<Trap, String>> = Mutex::new(FnvHashMap::default());
}

fn slots() -> MutexGuard<'static, FnvHashMap<Trap, String>> {
    SLOTS.lock().unwrap_or_else(PoisonError::into_inner)
}

/******************
 * C FFI CALLBACK *
 ******************/

extern "C" fn c_handler(signum: libc::c_int, _info: *mut libc::siginfo_t, _ctx: *mut libc::c_void) {
    let fd = WAKE_FD.load(Ordering::Relaxed);
    if fd < 0 {
        return;
    }
    let byte = signum as u8;
    /* Nothing to do about a full pipe from inside a handler */
    unsafe {
        libc::write(fd, std::ptr::addr_of!(byte).cast(), 1);
    }
}

/**************
 * EVENT LOOP *
 **************/

fn setup() -> Result<(), Error> {
    SETUP.call_once(|| {
        if let Err(error) = spawn_event_loop() {
            tracing::error!(%error, "could not start the signal event loop");
        }
    });
    if WAKE_FD.load(Ordering::SeqCst) < 0 {
        return Err(Error::Runtime(io::Error::new(
            io::ErrorKind::Other,
            "signal event loop is not running",
        )));
    }
    Ok(())
}

fn spawn_event_loop() -> io::Result<()> {
    let mut fds: [libc::c_int; 2] = [-1; 2];
    if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
        return Err(io::Error::last_os_error());
    }
    let [read_fd, write_fd] = fds;

    /* The handler must never block on a full pipe */
    unsafe {
        let flags = libc::fcntl(write_fd, libc::F_GETFL);
        libc::fcntl(write_fd, libc::F_SETFL, flags | libc::O_NONBLOCK);
        libc::fcntl(read_fd, libc::F_SETFD, libc::FD_CLOEXEC);
        libc::fcntl(write_fd, libc::F_SETFD, libc::FD_CLOEXEC);
    }

    thread::Builder::new()
        .name("trapstack-signals".to_owned())
        .spawn(move || event_loop(read_fd))?;
    WAKE_FD.store(write_fd, Ordering::SeqCst);
    Ok(())
}

fn event_loop(read_fd: libc::c_int) {
    let mut buffer = [0u8; 64];
    loop {
        let read = unsafe { libc::read(read_fd, buffer.as_mut_ptr().cast(), buffer.len()) };
        if read < 0 {
            let error = io::Error::last_os_error();
            if error.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            tracing::error!(%error, "signal event loop stopped");
            return;
        }
        if read == 0 {
            return;
        }
        for &byte in &buffer[..read as usize] {
            match Signal::try_from(libc::c_int::from(byte)) {
                Ok(signal) => deliver(signal),
                Err(number) => tracing::warn!(number, "ignoring unknown signal number"),
            }
        }
    }
}

/* Runs the slot's current body. A slot reset between delivery and now runs
 * nothing.
*/
fn deliver(signal: Signal) {
    let body = match slots().get(&Trap::Signal(signal)) {
        Some(body) => body.clone(),
        None => return,
    };
    tracing::debug!(%signal, "running handler");
    match exec::run(&body, 0) {
        Ok(status) => tracing::debug!(%signal, status, "handler finished"),
        Err(error) => tracing::warn!(%signal, %error, "handler could not run"),
    }
}

/* SA_SIGINFO handler or SIG_DFL */
fn set_disposition(signal: Signal, handler: libc::sighandler_t) -> Result<(), Error> {
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = handler;
        action.sa_flags = libc::SA_SIGINFO | libc::SA_RESTART;
        libc::sigemptyset(&mut action.sa_mask);
        if libc::sigaction(signal.number(), &action, std::ptr::null_mut()) != 0 {
            return Err(io::Error::last_os_error().into());
        }
    }
    Ok(())
}

/// Handler slots backed by the process's real signal dispositions.
///
/// All `OsRuntime` values share the same slots. Bodies of real signals run
/// on a background thread under `sh` when the signal arrives; `EXIT` and
/// `ERR` run when [`fire`](OsRuntime::fire) is called.
///
/// # Example
/// ```no_run
/// use trapstack::{OsRuntime, Trap, TrapContext};
///
/// fn main() -> Result<(), trapstack::Error> {
///     let mut traps = TrapContext::new(OsRuntime::new())?;
///     traps.add("echo 'Screen Resized!'", &["WINCH"])?;
///     traps.add("echo cleaning up", &["EXIT"])?;
///
///     // ... later, on the way out
///     let status = traps.runtime().fire(Trap::Exit, 0)?;
///     std::process::exit(status);
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRuntime {
    _private: (),
}

impl OsRuntime {
    /// Creates a handle on the process's handler slots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the trap's body with `$?` seeded to `status` and returns the
    /// handler's exit status, or `status` when no handler is set.
    pub fn fire(&self, trap: Trap, status: i32) -> Result<i32, Error> {
        let body = slots().get(&trap).cloned();
        match body {
            Some(body) => exec::run(&body, status),
            None => Ok(status),
        }
    }
}

impl Runtime for OsRuntime {
    fn signals(&self) -> Result<Vec<Signal>, Error> {
        Ok(Signal::iterator().collect())
    }

    fn raw(&self, trap: Trap) -> Option<String> {
        slots().get(&trap).cloned()
    }

    fn install(&mut self, trap: Trap, body: &str) -> Result<(), Error> {
        if let Trap::Signal(signal) = trap {
            setup()?;
            set_disposition(signal, c_handler as libc::sighandler_t)?;
        }
        slots().insert(trap, body.to_owned());
        Ok(())
    }

    fn reset(&mut self, trap: Trap) -> Result<(), Error> {
        if let Trap::Signal(signal) = trap {
            set_disposition(signal, libc::SIG_DFL)?;
        }
        slots().remove(&trap);
        Ok(())
    }
}
