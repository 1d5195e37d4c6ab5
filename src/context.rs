/***********
 * CONTEXT *
 ***********/
/* The TrapContext owns the whole model (directory, registry, bindings,
 * paused set) plus the runtime whose handler slots it drives. Every public
 * operation goes through here, and flush() is the only place that writes a
 * handler slot.
 *
 * Batch operations follow one rule: a per-signal failure is logged and
 * collected, the remaining signals are still processed, and the collected
 * failures come back as one error at the end. Caller misuse (no signal, an
 * empty body, an unknown handle) fails before anything is touched.
*/

use std::env;
use std::io::Write;

use crate::bindings::BindingTable;
use crate::error::{aggregate, Error};
use crate::listing;
use crate::paused::PausedSet;
use crate::registry::{Command, Handle, Registry};
use crate::render;
use crate::runtime::Runtime;
use crate::signal::{Directory, Trap};

/// Environment variable that turns on append policy by default.
pub const APPEND_ENV: &str = "TRAPSTACK_APPEND";

/// Environment variable that allows editing paused signals by default.
pub const EDIT_PAUSED_ENV: &str = "TRAPSTACK_EDIT_PAUSED";

/// Behaviour flags of the registration calls. Held globally by each context
/// and overridable per call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Append to the existing commands instead of replacing them.
    pub append: bool,
    /// Allow editing a paused signal. The edit ends the pause.
    pub edit_paused: bool,
}

impl Options {
    /// Reads [`APPEND_ENV`] and [`EDIT_PAUSED_ENV`]. `1`, `true`, `yes` and
    /// `on` (any case) switch a flag on; anything else leaves it off.
    pub fn from_env() -> Self {
        Options {
            append: env_flag(APPEND_ENV),
            edit_paused: env_flag(EDIT_PAUSED_ENV),
        }
    }

    /// Returns a copy with the append flag set to `append`.
    pub fn append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    /// Returns a copy with the edit-paused flag set to `edit_paused`.
    pub fn edit_paused(mut self, edit_paused: bool) -> Self {
        self.edit_paused = edit_paused;
        self
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|value| parse_flag(&value))
        .unwrap_or(false)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Composable trap handlers over a [`Runtime`].
///
/// # Example
/// ```
/// use trapstack::{MemoryRuntime, Options, TrapContext};
///
/// fn main() -> Result<(), trapstack::Error> {
///     let mut traps = TrapContext::new(MemoryRuntime::new())?;
///
///     traps.add("rm -f \"$lock\"", &["EXIT"])?;
///     let log = traps.add("echo bye >&2", &["exit", "term"])?;
///
///     // Stop logging on SIGTERM, keep it on EXIT
///     traps.remove(log, &["TERM"])?;
///
///     let mut out = Vec::new();
///     traps.debug(&["EXIT"], &mut out)?;
///     assert_eq!(
///         String::from_utf8(out).unwrap(),
///         "trap -- 'rm -f \"$lock\"' EXIT\ntrap -- 'echo bye >&2' EXIT\n"
///     );
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct TrapContext<R> {
    runtime: R,
    options: Options,
    directory: Directory,
    registry: Registry,
    bindings: BindingTable,
    paused: PausedSet,
    synced: bool,
}

impl<R: Runtime> TrapContext<R> {
    /// Builds a context over `runtime`, querying its signal enumeration once.
    /// Flags default to [`Options::default`].
    pub fn new(runtime: R) -> Result<Self, Error> {
        let directory = Directory::new(runtime.signals()?);
        Ok(Self::with_directory(runtime, directory, Options::default()))
    }

    /// Builds a context from an already-built directory.
    pub fn with_directory(runtime: R, directory: Directory, options: Options) -> Self {
        TrapContext {
            runtime,
            options,
            directory,
            registry: Registry::new(),
            bindings: BindingTable::new(),
            paused: PausedSet::new(),
            synced: false,
        }
    }

    /// Global behaviour flags.
    pub fn options(&self) -> Options {
        self.options
    }

    /// Mutable access to the global behaviour flags.
    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    /// Read-only access to the underlying runtime.
    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// The signal directory.
    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Resolves a signal specification to its trap.
    pub fn resolve(&self, spec: &str) -> Result<Trap, Error> {
        self.directory.resolve(spec)
    }

    /*******************
     * SYNCHRONIZATION *
     *******************/

    /* Absorbs whatever the runtime already has installed into the model.
     * Each raw body becomes one opaque command: a body rendered by an
     * earlier trapstack looks the same as a hand-written one, so it is never
     * split back into fragments.
    	*/
    fn sync(&mut self) -> Result<(), Error> {
        if self.synced {
            return Ok(());
        }
        let text = self.runtime.listing(self.directory.traps());
        for (body, name) in listing::parse(&text)? {
            let trap = self.directory.resolve(&name)?;
            if body.is_empty() || self.bindings.is_bound(trap) {
                continue;
            }
            let handle = self.registry.store(&body, true);
            self.bindings.append(trap, handle);
            tracing::info!(signal = %trap, handle = %handle, "absorbed existing handler");
        }
        self.synced = true;
        Ok(())
    }

    /*********
     * FLUSH *
     *********/

    /* Re-materializes the trap's bindings into its handler slot. A paused
     * trap's slot is left alone.
    	*/
    fn flush(&mut self, trap: Trap) -> Result<(), Error> {
        if self.paused.contains(trap) {
            return Ok(());
        }
        let sequence = self.bindings.sequence(trap);
        if sequence.is_empty() {
            tracing::debug!(signal = %trap, "resetting handler");
            return self.runtime.reset(trap);
        }
        let commands = sequence
            .iter()
            .map(|&handle| self.registry.fetch(handle))
            .collect::<Result<Vec<&Command>, Error>>()?;
        let body = render::compile(trap, commands);
        tracing::debug!(signal = %trap, commands = sequence.len(), "installing handler");
        self.runtime.install(trap, &body)
    }

    /* Resolves every spec, collecting the ones that fail. Two spellings of
     * the same signal yield it once.
    	*/
    fn resolve_all(&self, specs: &[&str], failures: &mut Vec<Error>) -> Vec<Trap> {
        let mut traps = Vec::with_capacity(specs.len());
        for spec in specs {
            match self.directory.resolve(spec) {
                Ok(trap) if traps.contains(&trap) => {}
                Ok(trap) => traps.push(trap),
                Err(error) => fail(failures, error),
            }
        }
        traps
    }

    /****************
     * REGISTRATION *
     ****************/

    /// Sets `body` on every signal in `specs`.
    ///
    /// With `options.append` off the signal's commands are replaced,
    /// otherwise `body` is appended. A paused signal is refused with
    /// [`Error::SignalPaused`] unless `options.edit_paused` is on. An
    /// absent or empty body clears the signals, paused or not.
    pub fn register(
        &mut self,
        body: Option<&str>,
        specs: &[&str],
        options: Options,
    ) -> Result<(), Error> {
        match body.filter(|body| !body.is_empty()) {
            Some(body) => self.bind(body, specs, options, true).map(|_| ()),
            None => self.clear(specs),
        }
    }

    /// Appends `body` to every signal in `specs` and returns its handle.
    ///
    /// If some signals fail, the others are still bound and the handle is
    /// available from [`last_handle`](Self::last_handle).
    pub fn add(&mut self, body: &str, specs: &[&str]) -> Result<Handle, Error> {
        let options = self.options.append(true);
        self.add_with(body, specs, options, true)
    }

    /// Like [`add`](Self::add) but the command is not isolated: when the
    /// handler runs under `set -e`, its failure stops the handler.
    pub fn add_raw(&mut self, body: &str, specs: &[&str]) -> Result<Handle, Error> {
        let options = self.options.append(true);
        self.add_with(body, specs, options, false)
    }

    fn add_with(
        &mut self,
        body: &str,
        specs: &[&str],
        options: Options,
        isolated: bool,
    ) -> Result<Handle, Error> {
        if body.is_empty() {
            return Err(Error::EmptyBody);
        }
        self.bind(body, specs, options, isolated)?
            .ok_or(Error::MissingArgument("signal"))
    }

    /* Stores `body` at most once per call and binds that one handle to every
     * signal that accepts it.
    	*/
    fn bind(
        &mut self,
        body: &str,
        specs: &[&str],
        options: Options,
        isolated: bool,
    ) -> Result<Option<Handle>, Error> {
        if specs.is_empty() {
            return Err(Error::MissingArgument("signal"));
        }
        self.sync()?;

        let mut failures = Vec::new();
        let mut handle = None;
        for trap in self.resolve_all(specs, &mut failures) {
            if self.paused.contains(trap) && !options.edit_paused {
                fail(&mut failures, Error::SignalPaused(trap.name().to_owned()));
                continue;
            }
            let previous = self.bindings.sequence(trap).to_vec();
            let was_paused = self.paused.contains(trap);
            if !options.append {
                self.bindings.clear(trap);
            }
            let registry = &mut self.registry;
            let bound = *handle.get_or_insert_with(|| registry.store(body, isolated));
            self.bindings.append(trap, bound);
            self.paused.unmark(trap);
            tracing::debug!(signal = %trap, handle = %bound, append = options.append, "bound command");
            if let Err(error) = self.flush(trap) {
                /* The slot was not written, so neither is the model */
                self.bindings.clear(trap);
                for kept in previous {
                    self.bindings.append(trap, kept);
                }
                if was_paused {
                    self.paused.mark(trap);
                }
                fail(&mut failures, error);
            }
        }

        aggregate(failures).map(|_| handle)
    }

    /// Drops every command of the signals in `specs` and restores their
    /// default disposition. Always allowed on paused signals; the pause
    /// ends with it.
    pub fn clear(&mut self, specs: &[&str]) -> Result<(), Error> {
        if specs.is_empty() {
            return Err(Error::MissingArgument("signal"));
        }
        self.sync()?;

        let mut failures = Vec::new();
        for trap in self.resolve_all(specs, &mut failures) {
            self.bindings.clear(trap);
            self.paused.unmark(trap);
            if let Err(error) = self.flush(trap) {
                fail(&mut failures, error);
            }
        }
        aggregate(failures)
    }

    /// The most recently issued handle. Handlers absorbed from the runtime
    /// count as issued.
    pub fn last_handle(&mut self) -> Result<Option<Handle>, Error> {
        self.sync()?;
        Ok(self.registry.last_handle())
    }

    /// Looks a stored command up by handle.
    pub fn command(&mut self, handle: Handle) -> Result<&Command, Error> {
        self.sync()?;
        self.registry.fetch(handle)
    }

    /// Removes `handle` from the signals in `specs`, or from every signal it
    /// is bound to when `specs` is empty. A signal left without commands
    /// returns to its default disposition. Removing from a paused signal is
    /// an edit and ends the pause.
    pub fn remove(&mut self, handle: Handle, specs: &[&str]) -> Result<(), Error> {
        self.sync()?;
        self.registry.fetch(handle)?;

        let mut failures = Vec::new();
        let traps = if specs.is_empty() {
            self.bindings.bound_to(handle)
        } else {
            self.resolve_all(specs, &mut failures)
        };
        for trap in traps {
            if !self.bindings.remove(trap, handle) {
                let signal = trap.name().to_owned();
                fail(&mut failures, Error::HandleNotBound { signal, handle });
                continue;
            }
            self.paused.unmark(trap);
            tracing::debug!(signal = %trap, handle = %handle, "removed command");
            if let Err(error) = self.flush(trap) {
                fail(&mut failures, error);
            }
        }
        aggregate(failures)
    }

    /// Handles bound to `trap`, in execution order.
    pub fn sequence(&mut self, trap: Trap) -> Result<Vec<Handle>, Error> {
        self.sync()?;
        Ok(self.bindings.sequence(trap).to_vec())
    }

    /*********
     * PAUSE *
     *********/

    /// Whether `trap` is paused.
    pub fn is_paused(&self, trap: Trap) -> bool {
        self.paused.contains(trap)
    }

    /// Resets the handler slot of the signals in `specs`, or of every bound
    /// signal when `specs` is empty, keeping their commands for
    /// [`restore`](Self::restore). Pausing a paused signal does nothing.
    pub fn pause(&mut self, specs: &[&str]) -> Result<(), Error> {
        self.sync()?;

        let mut failures = Vec::new();
        let traps = if specs.is_empty() {
            self.bindings.bound()
        } else {
            self.resolve_all(specs, &mut failures)
        };
        for trap in traps {
            if !self.paused.mark(trap) {
                continue;
            }
            tracing::debug!(signal = %trap, "pausing");
            if let Err(error) = self.runtime.reset(trap) {
                self.paused.unmark(trap);
                fail(&mut failures, error);
            }
        }
        aggregate(failures)
    }

    /// Reinstates the handler slot of the paused signals in `specs`, or of
    /// every paused signal when `specs` is empty.
    pub fn restore(&mut self, specs: &[&str]) -> Result<(), Error> {
        self.sync()?;

        let mut failures = Vec::new();
        let traps = if specs.is_empty() {
            self.paused.traps()
        } else {
            self.resolve_all(specs, &mut failures)
        };
        for trap in traps {
            if !self.paused.unmark(trap) {
                fail(&mut failures, Error::NotPaused(trap.name().to_owned()));
                continue;
            }
            tracing::debug!(signal = %trap, "restoring");
            if let Err(error) = self.flush(trap) {
                self.paused.mark(trap);
                fail(&mut failures, error);
            }
        }
        aggregate(failures)
    }

    /*****************
     * INTROSPECTION *
     *****************/

    /// Prints each command bound to the signals in `specs` (every bound
    /// signal when empty) as a `trap -- '<body>' NAME` line, without the
    /// composition scaffolding.
    pub fn debug<W: Write>(&mut self, specs: &[&str], out: &mut W) -> Result<(), Error> {
        self.sync()?;

        let mut failures = Vec::new();
        let traps = if specs.is_empty() {
            self.bindings.bound()
        } else {
            self.resolve_all(specs, &mut failures)
        };
        for trap in traps {
            for &handle in self.bindings.sequence(trap) {
                let command = self.registry.fetch(handle)?;
                writeln!(out, "{}", listing::format_entry(command.body(), trap.name()))?;
            }
        }
        aggregate(failures)
    }

    /// Prints the handler slots of the signals in `specs` (every signal when
    /// empty) exactly as the runtime holds them, scaffolding included.
    pub fn debug_raw<W: Write>(&self, specs: &[&str], out: &mut W) -> Result<(), Error> {
        let mut failures = Vec::new();
        let traps = if specs.is_empty() {
            self.directory.traps().to_vec()
        } else {
            self.resolve_all(specs, &mut failures)
        };
        out.write_all(self.runtime.listing(&traps).as_bytes())?;
        aggregate(failures)
    }

    /// Prints every signal as `N) NAME`, one per line.
    pub fn list_signals<W: Write>(&self, out: &mut W) -> Result<(), Error> {
        for &trap in self.directory.traps() {
            if let Trap::Signal(signal) = trap {
                writeln!(out, "{}) {}", signal.number(), signal)?;
            }
        }
        Ok(())
    }

    /****************
     * ARGUMENT VEC *
     ****************/

    /// Builtin-style entry point.
    ///
    /// ```text
    /// trap [-ae] [--] [BODY|-] SIGNAL...
    /// trap -l
    /// trap -p [SIGNAL...]
    /// ```
    ///
    /// `-a` appends instead of replacing, `-e` allows editing paused
    /// signals, `-l` and `-p` go straight to the runtime. A body of `-` or
    /// `''`, or a lone signal operand, clears. No operand at all prints every
    /// handler slot.
    pub fn trap<W: Write>(&mut self, args: &[&str], out: &mut W) -> Result<(), Error> {
        let mut options = self.options;
        let mut list = false;
        let mut print = false;

        let mut index = 0;
        while let Some(&arg) = args.get(index) {
            if arg == "--" {
                index += 1;
                break;
            }
            if arg == "-" || !arg.starts_with('-') {
                break;
            }
            for flag in arg[1..].chars() {
                match flag {
                    'a' => options.append = true,
                    'e' => options.edit_paused = true,
                    'l' => list = true,
                    'p' => print = true,
                    _ => return Err(Error::Usage(arg.to_owned())),
                }
            }
            index += 1;
        }
        let operands = &args[index..];

        if list {
            return self.list_signals(out);
        }
        if print || operands.is_empty() {
            return self.debug_raw(operands, out);
        }
        match operands {
            [only] if *only == "-" => Err(Error::MissingArgument("signal")),
            [only] => match self.directory.resolve(only) {
                Ok(_) => self.clear(operands),
                Err(_) => Err(Error::MissingArgument("signal")),
            },
            [body, specs @ ..] => {
                let body = if *body == "-" { None } else { Some(*body) };
                self.register(body, specs, options)
            }
            [] => Ok(()),
        }
    }
}

fn fail(failures: &mut Vec<Error>, error: Error) {
    tracing::warn!(%error, "trap operation failed");
    failures.push(error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MemoryRuntime;
    use crate::signal::{Signal, SIGINT, SIGTERM, SIGUSR1};

    const INT: Trap = Trap::Signal(SIGINT);
    const TERM: Trap = Trap::Signal(SIGTERM);

    fn context() -> TrapContext<MemoryRuntime> {
        TrapContext::new(MemoryRuntime::new()).unwrap()
    }

    fn debug(traps: &mut TrapContext<MemoryRuntime>, specs: &[&str]) -> String {
        let mut out = Vec::new();
        traps.debug(specs, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn raw(traps: &TrapContext<MemoryRuntime>, trap: Trap) -> Option<String> {
        traps.runtime().raw(trap)
    }

    #[test]
    fn replace_mode_keeps_only_the_new_body() {
        let mut traps = context();
        traps.add("echo one", &["INT"]).unwrap();
        traps.add("echo two", &["INT"]).unwrap();
        traps.register(Some("echo B"), &["INT"], Options::default()).unwrap();
        assert_eq!(debug(&mut traps, &["INT"]), "trap -- 'echo B' SIGINT\n");
    }

    #[test]
    fn append_mode_keeps_order() {
        let mut traps = context();
        let append = Options::default().append(true);
        traps.register(Some("echo A"), &["INT"], append).unwrap();
        traps.register(Some("echo B"), &["INT"], append).unwrap();
        assert_eq!(
            debug(&mut traps, &["INT"]),
            "trap -- 'echo A' SIGINT\ntrap -- 'echo B' SIGINT\n"
        );
    }

    #[test]
    fn one_batch_shares_one_handle() {
        let mut traps = context();
        let handle = traps.add("cleanup", &["INT", "TERM"]).unwrap();
        assert_eq!(traps.sequence(INT).unwrap(), vec![handle]);
        assert_eq!(traps.sequence(TERM).unwrap(), vec![handle]);

        let again = traps.add("cleanup", &["INT"]).unwrap();
        assert_ne!(handle, again);
        assert_eq!(traps.last_handle().unwrap(), Some(again));
    }

    #[test]
    fn aliases_in_one_batch_bind_once() {
        let mut traps = context();
        let handle = traps.add("echo once", &["INT", "2", "sigint"]).unwrap();
        assert_eq!(traps.sequence(INT).unwrap(), vec![handle]);
    }

    #[test]
    fn empty_body_clears_even_when_paused() {
        let mut traps = context();
        traps.add("echo hi", &["INT"]).unwrap();
        traps.pause(&["INT"]).unwrap();

        traps.register(Some(""), &["INT"], Options::default()).unwrap();
        assert!(!traps.is_paused(INT));
        assert_eq!(raw(&traps, INT), None);
        assert!(traps.sequence(INT).unwrap().is_empty());
        match traps.restore(&["INT"]) {
            Err(Error::NotPaused(name)) => assert_eq!(name, "SIGINT"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn paused_signal_refuses_edits() {
        let mut traps = context();
        traps.add("echo hi", &["INT"]).unwrap();
        traps.pause(&["INT"]).unwrap();
        assert_eq!(raw(&traps, INT), None);

        match traps.add("echo more", &["INT"]) {
            Err(Error::SignalPaused(name)) => assert_eq!(name, "SIGINT"),
            other => panic!("unexpected: {:?}", other),
        }
        let err = traps
            .register(Some("echo new"), &["INT"], Options::default())
            .unwrap_err();
        assert_eq!(err.code(), 1);
        assert_eq!(raw(&traps, INT), None);
        assert!(traps.is_paused(INT));
    }

    #[test]
    fn edit_paused_opt_in_ends_the_pause() {
        let mut traps = context();
        traps.add("echo hi", &["INT"]).unwrap();
        traps.pause(&[]).unwrap();

        traps.options_mut().edit_paused = true;
        traps.add("echo more", &["INT"]).unwrap();
        assert!(!traps.is_paused(INT));
        assert!(raw(&traps, INT).unwrap().contains("echo more"));
    }

    #[test]
    fn edit_paused_per_call_ends_the_pause() {
        let mut traps = context();
        traps.add("echo hi", &["INT"]).unwrap();
        traps.pause(&["INT"]).unwrap();

        let options = Options::default().edit_paused(true);
        traps.register(Some("echo new"), &["INT"], options).unwrap();
        assert!(!traps.is_paused(INT));
        assert_eq!(debug(&mut traps, &["INT"]), "trap -- 'echo new' SIGINT\n");
        assert!(raw(&traps, INT).unwrap().contains("echo new"));
        assert!(!traps.options().edit_paused);
    }

    #[test]
    fn restore_reproduces_the_paused_text() {
        let mut traps = context();
        traps.add("echo a", &["INT", "TERM"]).unwrap();
        traps.add_raw("echo b", &["INT"]).unwrap();
        let before = raw(&traps, INT).unwrap();

        traps.pause(&[]).unwrap();
        assert_eq!(raw(&traps, INT), None);
        assert_eq!(raw(&traps, TERM), None);

        traps.restore(&[]).unwrap();
        assert_eq!(raw(&traps, INT).unwrap(), before);
        assert!(raw(&traps, TERM).is_some());
    }

    #[test]
    fn restore_without_pause_fails_per_signal() {
        let mut traps = context();
        traps.add("echo a", &["INT", "TERM"]).unwrap();
        traps.pause(&["TERM"]).unwrap();

        let err = traps.restore(&["INT", "TERM", "NOPE"]).unwrap_err();
        assert_eq!(err.failures().len(), 2);
        assert!(!traps.is_paused(TERM));
        assert!(raw(&traps, TERM).is_some());
    }

    #[test]
    fn remove_everywhere_resets_emptied_signals() {
        let mut traps = context();
        let shared = traps.add("echo shared", &["INT", "TERM"]).unwrap();
        traps.add("echo mine", &["TERM"]).unwrap();

        traps.remove(shared, &[]).unwrap();
        assert_eq!(raw(&traps, INT), None);
        assert_eq!(debug(&mut traps, &[]), "trap -- 'echo mine' SIGTERM\n");
    }

    #[test]
    fn batch_remove_reports_unbound_signal_only() {
        let mut traps = context();
        let handle = traps.add("echo x", &["INT"]).unwrap();
        traps.add("echo y", &["TERM"]).unwrap();

        match traps.remove(handle, &["INT", "TERM"]) {
            Err(Error::HandleNotBound { signal, handle: missing }) => {
                assert_eq!(signal, "SIGTERM");
                assert_eq!(missing, handle);
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(traps.sequence(INT).unwrap().is_empty());
        assert_eq!(raw(&traps, INT), None);
        assert_eq!(debug(&mut traps, &["TERM"]), "trap -- 'echo y' SIGTERM\n");
    }

    #[test]
    fn remove_from_paused_signal_reinstalls_the_rest() {
        let mut traps = context();
        let gone = traps.add("echo gone", &["INT"]).unwrap();
        traps.add("echo kept", &["INT"]).unwrap();
        traps.pause(&["INT"]).unwrap();
        assert_eq!(raw(&traps, INT), None);

        traps.remove(gone, &["INT"]).unwrap();
        assert!(!traps.is_paused(INT));
        let installed = raw(&traps, INT).unwrap();
        assert!(installed.contains("echo kept"));
        assert!(!installed.contains("echo gone"));
    }

    #[test]
    fn remove_emptying_paused_signal_resets_it() {
        let mut traps = context();
        let only = traps.add("echo only", &["INT"]).unwrap();
        traps.pause(&["INT"]).unwrap();

        traps.remove(only, &[]).unwrap();
        assert!(!traps.is_paused(INT));
        assert_eq!(raw(&traps, INT), None);
        assert!(traps.sequence(INT).unwrap().is_empty());
        match traps.restore(&["INT"]) {
            Err(Error::NotPaused(name)) => assert_eq!(name, "SIGINT"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn absorbed_handlers_are_known_before_any_edit() {
        let runtime = MemoryRuntime::with_slots(vec![(TERM, "echo organic")]);
        let mut traps = TrapContext::new(runtime).unwrap();

        let handle = traps.last_handle().unwrap().unwrap();
        assert_eq!(handle, Handle::from(0));
        assert_eq!(traps.command(handle).unwrap().body(), "echo organic");

        traps.remove(handle, &["TERM"]).unwrap();
        assert_eq!(raw(&traps, TERM), None);
        assert!(traps.sequence(TERM).unwrap().is_empty());
    }

    #[test]
    fn remove_unknown_handle_fails_fast() {
        let mut traps = context();
        match traps.remove(Handle::from(42), &[]) {
            Err(Error::UnknownHandle(handle)) => assert_eq!(handle.get(), 42),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn invalid_signals_do_not_block_the_rest() {
        let mut traps = context();
        let err = traps.add("echo x", &["BOGUS", "usr1"]).unwrap_err();
        assert_eq!(err.code(), 1);
        let handle = traps.last_handle().unwrap().unwrap();
        assert_eq!(traps.sequence(Trap::Signal(SIGUSR1)).unwrap(), vec![handle]);
    }

    #[test]
    fn misuse_fails_before_mutation() {
        let mut traps = context();
        match traps.add("", &["INT"]) {
            Err(Error::EmptyBody) => {}
            other => panic!("unexpected: {:?}", other),
        }
        match traps.add("echo", &[]) {
            Err(Error::MissingArgument(_)) => {}
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(traps.last_handle().unwrap(), None);
    }

    #[test]
    fn existing_handlers_are_absorbed_whole() {
        let runtime = MemoryRuntime::with_slots(vec![(TERM, "echo 'organic'; exit 3")]);
        let mut traps = TrapContext::new(runtime).unwrap();

        traps.add("echo added", &["TERM"]).unwrap();
        assert_eq!(
            debug(&mut traps, &["TERM"]),
            "trap -- 'echo '\\''organic'\\''; exit 3' SIGTERM\ntrap -- 'echo added' SIGTERM\n"
        );
    }

    #[test]
    fn previously_rendered_bodies_are_not_split() {
        let mut first = context();
        first.add("echo a", &["INT"]).unwrap();
        first.add("echo b", &["INT"]).unwrap();
        let rendered = raw(&first, INT).unwrap();

        let mut second =
            TrapContext::new(MemoryRuntime::with_slots(vec![(INT, rendered.clone())])).unwrap();
        assert_eq!(second.sequence(INT).unwrap().len(), 1);
        let handle = second.sequence(INT).unwrap()[0];
        assert_eq!(second.command(handle).unwrap().body(), rendered);
    }

    #[test]
    fn trap_argument_vector() {
        let mut traps = context();
        let mut out = Vec::new();

        traps.trap(&["echo A", "INT"], &mut out).unwrap();
        traps.trap(&["-a", "--", "echo B", "2"], &mut out).unwrap();
        assert_eq!(
            debug(&mut traps, &["INT"]),
            "trap -- 'echo A' SIGINT\ntrap -- 'echo B' SIGINT\n"
        );

        traps.trap(&["-p", "INT"], &mut out).unwrap();
        let printed = String::from_utf8(std::mem::take(&mut out)).unwrap();
        assert!(printed.starts_with("trap -- '__trapstack_status_SIGINT=$?"));
        assert!(printed.ends_with("' SIGINT\n"));

        traps.trap(&["-", "sigint"], &mut out).unwrap();
        assert_eq!(raw(&traps, INT), None);

        traps.trap(&["echo C", "TERM"], &mut out).unwrap();
        traps.trap(&["TERM"], &mut out).unwrap();
        assert_eq!(raw(&traps, TERM), None);

        assert_eq!(traps.trap(&["-x", "INT"], &mut out).unwrap_err().code(), 2);
        match traps.trap(&["echo lonely"], &mut out) {
            Err(Error::MissingArgument(_)) => {}
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn trap_dash_l_lists_signals() {
        let traps = &mut context();
        let mut out = Vec::new();
        traps.trap(&["-l"], &mut out).unwrap();
        let listed = String::from_utf8(out).unwrap();
        assert_eq!(listed.lines().count(), Signal::iterator().count());
        assert!(listed.lines().any(|line| line == "2) SIGINT"));
    }

    #[test]
    fn parse_flag_values() {
        for on in &["1", "true", "YES", " on "] {
            assert!(parse_flag(on));
        }
        for off in &["", "0", "no", "enabled"] {
            assert!(!parse_flag(off));
        }
    }
}
