//! End-to-end runs through parse → evaluate → explain.

use std::rc::Rc;

use symbolic_ctl::{parse_system, Bdd, CtlFormula, Error, SystemSpec};

fn parse(text: &str) -> SystemSpec {
    let bdd = Rc::new(Bdd::new());
    parse_system(&bdd, text).unwrap()
}

/// Evaluate one property and report whether it holds on all initial states.
fn check(system: &SystemSpec, property: &CtlFormula) -> bool {
    let sat = property.eval(&system.transition).unwrap();
    system.init.implies(&sat).unwrap()
}

#[test]
fn mod2_counter() {
    // T(u, v) = u₀ ⊕ v₀, p = ¬u₀: two EX steps come back to p.
    let system = parse(
        "(system 1 true
            (xor (var from 0) (var to 0))
            (properties
                (AG (or (not (var 0)) (EX (not (var 0)))))
                (AG (AF (var 0)))))",
    );
    for property in &system.properties {
        assert!(check(&system, property), "{} should hold", property);
    }
}

#[test]
fn self_loop_and_sink() {
    // Every state loops to itself; 0 never reaches 1, but can stay at 0.
    let text = "\
; stay forever where you started
(system 1
  (not (var 0))
  (not (xor (var from 0) (var to 0)))
  (properties (EF (var 0)) (EG (not (var 0)))))
";
    let system = parse(text);

    assert!(!check(&system, &system.properties[0]));

    let eg = &system.properties[1];
    assert!(check(&system, eg));
    let path = eg
        .explain(&system.transition, &system.init, true)
        .unwrap()
        .expect("EG should produce a witness");
    assert!(path.is_lasso());
    assert_eq!(path.lasso_point(), Some(0));
    assert_eq!(path.len(), 1);
    assert_eq!(path.states()[0].assign(), &[false]);
    assert_eq!(path.to_string(), "v0\nBegin Loop\n 0\n");
}

#[test]
fn alternator_liveness() {
    let system = parse(
        "(system 1
            (not (var 0))
            (xor (var from 0) (var to 0))
            (properties (AG (AF (var 0)))))",
    );
    assert!(check(&system, &system.properties[0]));
    // A holding universal property has no counterexample to offer.
    let path = system.properties[0]
        .explain(&system.transition, &system.init, true)
        .unwrap();
    assert!(path.is_none());
}

#[test]
fn fairness_restores_liveness() {
    // Stay-put relation; fair paths must visit u₀ infinitely often, so only
    // the state already at 1 starts one.
    let from_one = parse(
        "(system 1 (var 0)
            (not (xor (var from 0) (var to 0)))
            (properties (EG true))
            ((var 0)))",
    );
    assert!(from_one.transition.has_fairness());
    assert!(check(&from_one, &from_one.properties[0]));

    let from_zero = parse(
        "(system 1 (not (var 0))
            (not (xor (var from 0) (var to 0)))
            (properties (EG true))
            ((var 0)))",
    );
    assert!(!check(&from_zero, &from_zero.properties[0]));

    // Fair runs report the verdict but never print a path.
    let path = from_one.properties[0]
        .explain(&from_one.transition, &from_one.init, true)
        .unwrap();
    assert!(path.is_none());
}

#[test]
fn release_on_the_counter_cycle() {
    // 2-bit counter 00 → 01 → 10 → 11 → 00 (bit 0 is the LSB); from 11 the
    // release E[u₀ R u₁] is discharged immediately.
    let text = "\
(system 2
  (and (var 0) (var 1))
  (and (not (xor (var to 0) (not (var from 0))))
       (not (xor (var to 1) (xor (var from 1) (var from 0)))))
  (properties (ER (var 0) (var 1))))
";
    let system = parse(text);
    let property = &system.properties[0];
    assert!(check(&system, property));

    let path = system.properties[0]
        .explain(&system.transition, &system.init, true)
        .unwrap()
        .expect("ER should produce a witness");
    assert!(!path.is_lasso());
    assert_eq!(path.len(), 1);
    assert_eq!(path.states()[0].assign(), &[true, true]);
}

#[test]
fn until_witness_is_sound() {
    let text = "\
(system 2
  (and (not (var 0)) (not (var 1)))
  (and (not (xor (var to 0) (not (var from 0))))
       (not (xor (var to 1) (xor (var from 1) (var from 0)))))
  (properties (EU true (and (var 0) (var 1)))))
";
    let system = parse(text);
    assert!(check(&system, &system.properties[0]));

    let path = system.properties[0]
        .explain(&system.transition, &system.init, true)
        .unwrap()
        .expect("EU should produce a witness");
    let states = path.states();
    assert_eq!(states.len(), 4);

    // Starts in the initial region, steps follow the relation, ends in g.
    assert!(system.init.contains(&states[0]).unwrap());
    for pair in states.windows(2) {
        assert!(system.transition.relates(&pair[0], &pair[1]).unwrap());
    }
    assert_eq!(states[3].assign(), &[true, true]);
}

#[test]
fn branching_until_witness_avoids_the_trap() {
    // Non-deterministic diamond: A=(0,0) steps to X=(1,0) or Y=(0,1); X
    // only loops back to A, and only Y reaches D=(1,1). The witness has to
    // come out A → Y → D even though the cube extractor would offer X
    // first from the set {X, Y}.
    let text = "\
(system 2
  (and (not (var 0)) (not (var 1)))
  (or
    (and (not (var from 0)) (not (var from 1)) (var to 0) (not (var to 1)))
    (and (not (var from 0)) (not (var from 1)) (not (var to 0)) (var to 1))
    (and (var from 0) (not (var from 1)) (not (var to 0)) (not (var to 1)))
    (and (not (var from 0)) (var from 1) (var to 0) (var to 1)))
  (properties (EU true (and (var 0) (var 1)))))
";
    let system = parse(text);
    assert!(check(&system, &system.properties[0]));

    let path = system.properties[0]
        .explain(&system.transition, &system.init, true)
        .unwrap()
        .expect("EU should produce a witness");
    let states = path.states();
    assert_eq!(states.len(), 3);
    assert_eq!(states[0].assign(), &[false, false]);
    assert_eq!(states[1].assign(), &[false, true]);
    assert_eq!(states[2].assign(), &[true, true]);
    for pair in states.windows(2) {
        assert!(system.transition.relates(&pair[0], &pair[1]).unwrap());
    }
}

#[test]
fn counterexample_for_failed_invariant() {
    // AG ¬(u₀ ∧ u₁) fails on the counter: the trace walks to 11.
    let text = "\
(system 2
  (and (not (var 0)) (not (var 1)))
  (and (not (xor (var to 0) (not (var from 0))))
       (not (xor (var to 1) (xor (var from 1) (var from 0)))))
  (properties (AG (not (and (var 0) (var 1))))))
";
    let system = parse(text);
    assert!(!check(&system, &system.properties[0]));

    let path = system.properties[0]
        .explain(&system.transition, &system.init, false)
        .unwrap()
        .expect("a failed AG should produce a counterexample");
    assert!(!path.is_lasso());
    assert_eq!(path.states().last().unwrap().assign(), &[true, true]);
    assert_eq!(
        path.to_string(),
        "v0 v1\n 0  0\n 1  0\n 0  1\n 1  1\n"
    );
}

#[test]
fn parse_rejection_is_an_error() {
    let bdd = Rc::new(Bdd::new());
    let err = parse_system(
        &bdd,
        "(system 2 (var 5) true (properties (AG true)))",
    )
    .unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
    assert!(err.to_string().contains("(var 5)"));
}

#[test]
fn empty_fairness_stays_plain() {
    // Without a fairness list, fair operators are simply never invoked; the
    // plain EG over the sink system is satisfiable from 0.
    let system = parse(
        "(system 1 (not (var 0))
            (not (xor (var from 0) (var to 0)))
            (properties (EG (not (var 0)))))",
    );
    assert!(check(&system, &system.properties[0]));
    assert!(matches!(
        system.transition.fair_states(),
        Err(Error::EmptyFairness)
    ));
}
