use proptest::prelude::*;

use trapstack::{MemoryRuntime, Options, Runtime, Trap, TrapContext, SIGHUP};

const HUP: Trap = Trap::Signal(SIGHUP);

fn debug(traps: &mut TrapContext<MemoryRuntime>) -> Vec<String> {
    let mut out = Vec::new();
    traps.debug(&["HUP"], &mut out).unwrap();
    trapstack::listing::parse(&String::from_utf8(out).unwrap())
        .unwrap()
        .into_iter()
        .map(|(body, _)| body)
        .collect()
}

proptest! {
    #[test]
    fn debug_lists_adds_in_insertion_order(bodies in prop::collection::vec("[a-z '\"]{1,12}", 1..8)) {
        let mut traps = TrapContext::new(MemoryRuntime::new()).unwrap();
        for body in &bodies {
            traps.add(body, &["HUP"]).unwrap();
        }
        prop_assert_eq!(debug(&mut traps), bodies);
    }

    #[test]
    fn replace_after_appends_leaves_one_command(
        bodies in prop::collection::vec("[a-z]{1,8}", 0..6),
        last in "[a-z]{1,8}",
    ) {
        let mut traps = TrapContext::new(MemoryRuntime::new()).unwrap();
        for body in &bodies {
            traps.add(body, &["HUP"]).unwrap();
        }
        traps.register(Some(last.as_str()), &["HUP"], Options::default()).unwrap();
        prop_assert_eq!(debug(&mut traps), vec![last]);
    }

    #[test]
    fn pause_restore_is_byte_exact(bodies in prop::collection::vec("[ -~]{1,16}", 1..6)) {
        let mut traps = TrapContext::new(MemoryRuntime::new()).unwrap();
        for body in &bodies {
            traps.add(body, &["HUP"]).unwrap();
        }
        let before = traps.runtime().raw(HUP);
        traps.pause(&["HUP"]).unwrap();
        prop_assert_eq!(traps.runtime().raw(HUP), None);
        traps.restore(&["HUP"]).unwrap();
        prop_assert_eq!(traps.runtime().raw(HUP), before);
    }
}
