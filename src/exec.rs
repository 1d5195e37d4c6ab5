/********
 * EXEC *
 ********/
/* Running a handler body.
 *
 * Bodies are shell text; they run under `sh -c` with `$?` seeded to the
 * status that was pending when the trap fired.
*/

use std::process::{Command, ExitStatus};

use crate::error::Error;

/// Shell used to run handler bodies.
pub const SHELL: &str = "sh";

/// Runs `body` with `$?` set to `status` and returns its exit status. A
/// shell killed by signal `N` reports `128 + N`.
pub fn run(body: &str, status: i32) -> Result<i32, Error> {
    let script = format!("(exit {})\n{}", status & 0xff, body);
    let exit = Command::new(SHELL).arg("-c").arg(script).status()?;
    tracing::debug!(status = ?exit, "handler body finished");
    Ok(exit_code(exit))
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn status_is_seeded() {
        assert_eq!(run("exit $?", 7).unwrap(), 7);
        assert_eq!(run("true", 3).unwrap(), 0);
    }

    #[test]
    fn killed_shell_reports_128_plus_signal() {
        assert_eq!(run("kill -TERM $$", 0).unwrap(), 128 + libc::SIGTERM);
    }
}
