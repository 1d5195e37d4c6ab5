/************
 * TEMPLATE *
 ************/
/* Renders the ordered commands of one trap into the single body the handler
 * slot accepts. The shape is fixed whatever the number of commands:
 *
 *     __trapstack_status_SIGINT=$?
 *     # trapstack begin
 *     { (exit "$__trapstack_status_SIGINT")
 *     <isolated command>
 *     } || __trapstack_status_SIGINT=$?
 *     if [ "$__trapstack_status_SIGINT" -eq 0 ]; then
 *     <raw command>
 *     else (exit "$__trapstack_status_SIGINT") || {
 *     <raw command>
 *     }; fi
 *     # trapstack end
 *     (exit "$__trapstack_status_SIGINT")
 *
 * Every command starts with `$?` holding the status saved so far, the same
 * value it would see in a hand-written handler. Brace groups keep the
 * commands in the handler's own shell so later commands see state set by
 * earlier ones. The `||` records a failing status and keeps `set -e` from
 * aborting the chain; a raw command sits where `set -e` still applies.
 *
 * The status variable is named after the trap, so an ERR handler running
 * inside another trap's handler does not clobber its value.
*/

use crate::registry::Command;
use crate::signal::Trap;

/// Prefix of the variable holding the status a handler will report. The
/// trap's name completes it, e.g. `__trapstack_status_SIGINT`.
pub const STATUS_VAR: &str = "__trapstack_status";

/// Marker line before the first user command.
pub const BEGIN_MARKER: &str = "# trapstack begin";

/// Marker line after the last user command.
pub const END_MARKER: &str = "# trapstack end";

/// Name of the status variable in `trap`'s handler body.
pub fn status_var(trap: Trap) -> String {
    format!("{}_{}", STATUS_VAR, trap.name())
}

/// Renders `commands` in order into the handler body of `trap`.
pub fn compile<'a, I>(trap: Trap, commands: I) -> String
where
    I: IntoIterator<Item = &'a Command>,
{
    let var = status_var(trap);
    let seed = format!("(exit \"${}\")", var);

    let mut body = format!("{}=$?\n{}\n", var, BEGIN_MARKER);
    for command in commands {
        if command.is_isolated() {
            body.push_str(&format!(
                "{{ {}\n{}\n}} || {}=$?\n",
                seed,
                command.body(),
                var
            ));
        } else {
            /* A bare seed would trip `set -e` on a non-zero status */
            body.push_str(&format!(
                "if [ \"${var}\" -eq 0 ]; then\n{raw}\nelse {seed} || {{\n{raw}\n}}; fi\n",
                var = var,
                seed = seed,
                raw = command.body()
            ));
        }
    }
    body.push_str(END_MARKER);
    body.push('\n');
    body.push_str(&seed);
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::signal::{SIGINT, SIGTERM};

    #[test]
    fn renders_fixed_shape_in_order() {
        let mut registry = Registry::new();
        let a = registry.store("echo a", true);
        let b = registry.store("echo b", false);
        let commands = [registry.fetch(a).unwrap(), registry.fetch(b).unwrap()];

        assert_eq!(
            compile(Trap::Signal(SIGINT), commands.iter().copied()),
            "__trapstack_status_SIGINT=$?\n\
             # trapstack begin\n\
             { (exit \"$__trapstack_status_SIGINT\")\n\
             echo a\n\
             } || __trapstack_status_SIGINT=$?\n\
             if [ \"$__trapstack_status_SIGINT\" -eq 0 ]; then\n\
             echo b\n\
             else (exit \"$__trapstack_status_SIGINT\") || {\n\
             echo b\n\
             }; fi\n\
             # trapstack end\n\
             (exit \"$__trapstack_status_SIGINT\")"
        );
    }

    #[test]
    fn rendering_is_deterministic() {
        let mut registry = Registry::new();
        let a = registry.store("trap_me", true);
        let once = compile(Trap::Exit, vec![registry.fetch(a).unwrap()]);
        let twice = compile(Trap::Exit, vec![registry.fetch(a).unwrap()]);
        assert_eq!(once, twice);
        assert!(once.contains(BEGIN_MARKER) && once.contains(END_MARKER));
    }

    #[test]
    fn each_trap_keeps_its_own_status() {
        let mut registry = Registry::new();
        let a = registry.store("true", true);
        let int = compile(Trap::Signal(SIGINT), vec![registry.fetch(a).unwrap()]);
        let term = compile(Trap::Signal(SIGTERM), vec![registry.fetch(a).unwrap()]);
        let err = compile(Trap::Err, vec![registry.fetch(a).unwrap()]);

        assert!(int.starts_with("__trapstack_status_SIGINT=$?\n"));
        assert!(term.starts_with("__trapstack_status_SIGTERM=$?\n"));
        assert!(err.starts_with("__trapstack_status_ERR=$?\n"));
        assert!(!int.contains("SIGTERM") && !term.contains("SIGINT"));
    }
}
