use crate::engine::components::factory::Args;
use crate::engine::components::fields::Field;
use crate::engine::components::module::Module;
use crate::engine::components::registry::Registry;
use crate::engine::error::PatchError;
use crate::engine::execution::binder::{bind_all, tick_cycle};
use crate::engine::types::FieldRef;
use crate::engine::values::reference::Reference;

fn registry() -> Registry {
    Registry::with_core().expect("core kinds register")
}

fn constant(registry: &Registry, name: &str, value: f64) -> Module {
    registry
        .construct_named(name, "const", Args::new().with("value", value))
        .unwrap()
}

fn panner(registry: &Registry, name: &str, wave: impl Into<Field>, pos: impl Into<Field>) -> Module {
    registry
        .construct_named(name, "pan", Args::new().with("in_wave", wave).with("in_pos", pos))
        .unwrap()
}

/// `in_a` reads `source`, everything else is a literal
fn mixer(registry: &Registry, name: &str, source: Reference) -> Module {
    registry
        .construct_named(
            name,
            "mix",
            Args::new()
                .with("in_a", source)
                .with("in_b", 0.0)
                .with("gain_a", 1.0)
                .with("gain_b", 0.0),
        )
        .unwrap()
}

fn names(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

#[test]
fn test_reference_to_missing_instance() {
    let registry = registry();
    let mut modules = vec![
        constant(&registry, "pos", 0.0),
        panner(&registry, "p", Reference::to_field("osc", "out_0"), Reference::to_field("pos", "out_0")),
    ];

    let err = bind_all(&mut modules).unwrap_err();
    match err {
        PatchError::UnresolvedReference { module, target, reason } => {
            assert_eq!(module, "p");
            assert_eq!(target, FieldRef::new("osc", "out_0"));
            assert!(reason.contains("no module named 'osc'"), "{}", reason);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(modules.iter().all(|module| !module.is_bound()));
}

#[test]
fn test_reference_to_missing_field() {
    let registry = registry();
    let mut modules = vec![
        constant(&registry, "dc", 1.0),
        panner(&registry, "p", Reference::to_field("dc", "out_7"), 0.0),
    ];

    let err = bind_all(&mut modules).unwrap_err();
    assert!(
        matches!(err, PatchError::UnresolvedReference { ref target, ref reason, .. }
            if target.field() == "out_7" && reason.contains("does not export")),
        "{:?}",
        err
    );
}

#[test]
fn test_three_module_cycle() {
    let registry = registry();
    let mut modules = vec![
        constant(&registry, "dc", 1.0),
        mixer(&registry, "a", Reference::to_field("c", "out_0")),
        mixer(&registry, "b", Reference::to_field("a", "out_0")),
        mixer(&registry, "c", Reference::to_field("b", "out_0")),
    ];

    let err = bind_all(&mut modules).unwrap_err();
    assert_eq!(err, PatchError::CyclicGraph(names(&["a", "b", "c"])));
    assert!(modules.iter().all(|module| !module.is_bound()));
}

#[test]
fn test_self_loop() {
    let registry = registry();
    let mut modules = vec![mixer(&registry, "m", Reference::to_field("m", "out_0"))];
    assert_eq!(
        bind_all(&mut modules).unwrap_err(),
        PatchError::CyclicGraph(names(&["m"]))
    );
}

#[test]
fn test_stages_follow_dependencies() {
    let registry = registry();
    let mut modules = vec![
        panner(&registry, "p", Reference::to_field("dc", "out_0"), Reference::to_field("pos", "out_0")),
        constant(&registry, "pos", 0.5),
        constant(&registry, "dc", 4.0),
    ];

    let schedule = bind_all(&mut modules).unwrap();
    assert_eq!(schedule.stages(), &[names(&["dc", "pos"]), names(&["p"])]);
    assert_eq!(schedule.order().collect::<Vec<_>>(), vec!["dc", "pos", "p"]);

    tick_cycle(&mut modules, &schedule).unwrap();
    assert_eq!(modules[0].read::<f64>("out_0").unwrap(), 1.0);
    assert_eq!(modules[0].read::<f64>("out_1").unwrap(), 3.0);
}

#[test]
fn test_bind_twice_matches_bind_once() {
    let registry = registry();
    let mut modules = vec![
        constant(&registry, "dc", 10.0),
        panner(&registry, "p", Reference::to_field("dc", "out_0"), 0.0),
    ];

    let first = bind_all(&mut modules).unwrap();
    let port = modules[1].resolved("in_wave").unwrap().clone();
    let second = bind_all(&mut modules).unwrap();

    assert_eq!(first, second);
    assert!(modules[1].resolved("in_wave").unwrap().same_port(&port));
    assert!(modules.iter().all(Module::is_bound));
}

#[test]
fn test_reset_then_bind_restores_output() {
    let registry = registry();
    let mut modules = vec![
        constant(&registry, "dc", 10.0),
        panner(&registry, "p", Reference::to_field("dc", "out_0"), -0.5),
    ];

    let schedule = bind_all(&mut modules).unwrap();
    tick_cycle(&mut modules, &schedule).unwrap();
    let before = (
        modules[1].read::<f64>("out_0").unwrap(),
        modules[1].read::<f64>("out_1").unwrap(),
    );

    for module in modules.iter_mut() {
        module.reset();
    }
    assert!(tick_cycle(&mut modules, &schedule).is_err());

    let schedule = bind_all(&mut modules).unwrap();
    tick_cycle(&mut modules, &schedule).unwrap();
    let after = (
        modules[1].read::<f64>("out_0").unwrap(),
        modules[1].read::<f64>("out_1").unwrap(),
    );
    assert_eq!(before, (7.5, 2.5));
    assert_eq!(before, after);
}

#[test]
fn test_direct_reference_orders_owner_first() {
    let registry = registry();
    let dc = constant(&registry, "dc", 6.0);
    let out = dc.field("out_0").unwrap().as_port().unwrap().clone();

    // consumer listed first; the port handle becomes a direct reference
    let mut modules = vec![panner(&registry, "p", out, 1.0), dc];
    let schedule = bind_all(&mut modules).unwrap();
    assert_eq!(schedule.stages(), &[names(&["dc"]), names(&["p"])]);

    tick_cycle(&mut modules, &schedule).unwrap();
    assert_eq!(modules[0].read::<f64>("out_1").unwrap(), 6.0);
}

#[test]
fn test_gate_output_into_numeric_input() {
    let registry = registry();
    let cmp = registry
        .construct_named("cmp", "compare", Args::new().with("in_wave", 1.0).with("level", 0.0))
        .unwrap();
    let mut modules = vec![cmp, panner(&registry, "p", Reference::to_field("cmp", "out_0"), 0.0)];

    let err = bind_all(&mut modules).unwrap_err();
    assert!(matches!(err, PatchError::TypeMismatch { ref field, .. } if field == "in_wave"));
}

#[test]
fn test_duplicate_instance_names() {
    let registry = registry();
    let mut modules = vec![constant(&registry, "dc", 1.0), constant(&registry, "dc", 2.0)];
    assert_eq!(
        bind_all(&mut modules).unwrap_err(),
        PatchError::DuplicateModule("dc".to_string())
    );
}

#[test]
fn test_tick_before_bind() {
    let registry = registry();
    let mut modules = vec![constant(&registry, "dc", 1.0)];
    let schedule = bind_all(&mut modules).unwrap();

    modules[0].reset();
    assert_eq!(
        tick_cycle(&mut modules, &schedule).unwrap_err(),
        PatchError::NotBound("dc".to_string())
    );
}

#[test]
fn test_schedule_rejects_other_slice() {
    let registry = registry();
    let mut modules = vec![constant(&registry, "dc", 1.0)];
    let schedule = bind_all(&mut modules).unwrap();

    let mut others = vec![constant(&registry, "pos", 1.0)];
    assert_eq!(
        tick_cycle(&mut others, &schedule).unwrap_err(),
        PatchError::NotBound("dc".to_string())
    );
}
