use rpatch::{
    cached, fields, outputs, Args, BoundInputs, DoublePort, Factory, FieldTable, FieldType, GatePort, ModuleKind,
    Patch, PatchDescription, PatchError, PortKind, Reference, Registry, Template,
};
use std::sync::Arc;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Host-defined kind: sample and hold
///
/// `held` is a full-only reference field, so construction gives it an owned
/// port that other modules can read as `sh.held`.
struct SampleHold {
    out: Arc<DoublePort>,
    held: Arc<DoublePort>,
    input: Option<Arc<DoublePort>>,
    trigger: Option<Arc<GatePort>>,
}

impl ModuleKind for SampleHold {
    fn bind1(&mut self, _fields: &FieldTable, inputs: &BoundInputs) -> Result<(), PatchError> {
        self.input = Some(inputs.get("input")?);
        self.trigger = Some(inputs.get("trigger")?);
        Ok(())
    }

    fn reset1(&mut self) {
        self.input = None;
        self.trigger = None;
    }

    fn tick(&mut self) -> Result<(), PatchError> {
        if cached(&self.trigger, "trigger")?.get() {
            self.out.set(cached(&self.input, "input")?.get());
            self.held.set(self.held.get() + 1.0);
        }
        Ok(())
    }
}

fn sample_hold(_factory: &Factory, fields: &mut FieldTable) -> Result<Box<dyn ModuleKind>, PatchError> {
    fields.narrow("input", PortKind::Double)?;
    fields.narrow("trigger", PortKind::Gate)?;
    Ok(Box::new(SampleHold {
        out: fields.output("out_0")?,
        held: fields.output("held")?,
        input: None,
        trigger: None,
    }))
}

fn sample_hold_factory() -> Factory {
    let base = Template::build(fields![
        input => FieldType::any_reference(),
        trigger => FieldType::any_reference(),
    ])
    .unwrap();
    let mut own = outputs![PortKind::Double; out_0];
    own.push(("held", FieldType::reference(PortKind::Double)));
    Factory::new("sample_hold", base, own, sample_hold).unwrap()
}

#[test]
fn test_core_registry() {
    let registry = Registry::with_core().unwrap();
    for kind in ["const", "sine", "noise", "mix", "compare", "select", "pan"] {
        assert!(registry.has_kind(kind), "missing {}", kind);
    }
    assert!(matches!(registry.get("reverb"), Err(PatchError::UnknownKind(_))));
}

#[test]
fn test_construct_lays_out_full_template() {
    let registry = Registry::with_core().unwrap();
    let module = registry
        .construct("sine", Args::new().with("freq", 1.0).with("amp", 1.0).with("rate", 8.0))
        .unwrap();

    let fields: Vec<&str> = module.fields().iter().map(|(name, _)| name).collect();
    let binding = registry.get("sine").unwrap();
    let full: Vec<&str> = binding.full_template().names().collect();
    assert_eq!(fields, full);
    assert_eq!(fields, vec!["freq", "amp", "rate", "out_0"]);
}

#[test]
fn test_missing_and_unknown_fields() {
    let registry = Registry::with_core().unwrap();

    let err = registry
        .construct("pan", Args::new().with("in_wave", 1.0))
        .unwrap_err();
    assert_eq!(
        err,
        PatchError::MissingField {
            owner: "pan".to_string(),
            field: "in_pos".to_string()
        }
    );

    let err = registry
        .construct("pan", Args::new().with("in_wave", 1.0).with("in_pos", 0.0).with("width", 1.0))
        .unwrap_err();
    assert!(matches!(err, PatchError::UnknownField { ref field, .. } if field == "width"));
}

#[test]
fn test_extend_keeps_base() {
    let base = Template::build(fields![in_wave => FieldType::any_reference()]).unwrap();
    let full = base.extend(outputs![PortKind::Double; out_0]).unwrap();

    assert_eq!(base.len(), 1);
    assert_eq!(full.len(), 2);
    assert!(full.is_extension_of(&base));
    assert_eq!(
        base.extend(fields![in_wave => FieldType::Number]).unwrap_err(),
        PatchError::DuplicateField("in_wave".to_string())
    );
    assert_eq!(base.lookup("out_0"), None);
}

#[test]
fn test_panner_through_patch() {
    init();
    let registry = Registry::with_core().unwrap();
    let cases = [
        ((10.0, 0.0), (5.0, 5.0)),
        ((10.0, 1.0), (0.0, 10.0)),
        ((10.0, -1.0), (10.0, 0.0)),
        ((10.0, 2.0), (0.0, 10.0)),
        ((4.0, 0.5), (1.0, 3.0)),
    ];

    for ((value, pos), expected) in cases {
        let mut patch = PatchDescription::new()
            .module("wave", "const", [("value", value)])
            .module("pos", "const", [("value", pos)])
            .build(&registry)
            .unwrap();
        let pan = registry
            .construct(
                "pan",
                Args::new()
                    .with("in_wave", Reference::to_field("wave", "out_0"))
                    .with("in_pos", Reference::to_field("pos", "out_0")),
            )
            .unwrap();
        patch.add_module("pan", pan).unwrap();

        patch.bind_all().unwrap();
        patch.tick_cycle().unwrap();
        let actual = (patch.read("pan", "out_0").unwrap(), patch.read("pan", "out_1").unwrap());
        assert_eq!(actual, expected, "value {} pos {}", value, pos);
    }
}

#[test]
fn test_json_description() {
    init();
    let json = r#"{
        "config": {"concurrency_mode": "Rayon"},
        "modules": [
            {"name": "osc", "kind": "sine", "fields": {"freq": 1.0, "amp": 2.0, "rate": 4.0}},
            {"name": "pos", "kind": "const", "fields": {"value": 1.0}},
            {"name": "out", "kind": "pan", "fields": {
                "in_wave": {"module": "osc", "field": "out_0"},
                "in_pos": {"module": "pos", "field": "out_0"}
            }}
        ]
    }"#;

    let description: PatchDescription = serde_json::from_str(json).unwrap();
    let registry = Registry::with_core().unwrap();
    let mut patch = description.build(&registry).unwrap();
    patch.bind_all().unwrap();

    let mut right = Vec::new();
    for _ in 0..4 {
        patch.tick_cycle().unwrap();
        right.push(patch.read("out", "out_1").unwrap());
        assert_eq!(patch.read("out", "out_0").unwrap(), 0.0);
    }

    let expected = [0.0, 2.0, 0.0, -2.0];
    for (value, want) in right.iter().zip(expected) {
        assert!((value - want).abs() < 1e-9, "{:?}", right);
    }
    assert_eq!(patch.current_cycle(), 4);
}

#[test]
fn test_host_defined_kind() {
    init();
    let mut registry = Registry::with_core().unwrap();
    registry.register(sample_hold_factory()).unwrap();

    let factory = registry.get("sample_hold").unwrap();
    assert_eq!(
        factory.full_template().lookup("held"),
        Some(FieldType::reference(PortKind::Double))
    );

    let mut patch = Patch::new();
    patch
        .add_module("dc", registry.construct("const", Args::new().with("value", 3.0)).unwrap())
        .unwrap();
    patch
        .add_module(
            "sh",
            registry
                .construct(
                    "sample_hold",
                    Args::new()
                        .with("input", Reference::to_field("dc", "out_0"))
                        .with("trigger", true),
                )
                .unwrap(),
        )
        .unwrap();
    // reads the owned port allocated for the full-only reference field
    patch
        .add_module(
            "count",
            registry
                .construct(
                    "pan",
                    Args::new()
                        .with("in_wave", Reference::to_field("sh", "held"))
                        .with("in_pos", 1.0),
                )
                .unwrap(),
        )
        .unwrap();

    patch.bind_all().unwrap();
    assert_eq!(patch.stages().len(), 3);
    patch.run(3).unwrap();

    assert_eq!(patch.read("sh", "out_0").unwrap(), 3.0);
    assert_eq!(patch.read("sh", "held").unwrap(), 3.0);
    assert_eq!(patch.read("count", "out_1").unwrap(), 3.0);
}

#[test]
fn test_narrowed_field_rejects_wrong_literal() {
    let mut registry = Registry::new();
    registry.register(sample_hold_factory()).unwrap();
    let mut patch = Patch::new();
    patch
        .add_module(
            "sh",
            registry
                .construct("sample_hold", Args::new().with("input", 1.0).with("trigger", false))
                .unwrap(),
        )
        .unwrap();

    // trigger was narrowed to a gate at construction
    let err = patch.set_field("sh", "trigger", 1.0).unwrap_err();
    assert!(matches!(err, PatchError::TypeMismatch { ref field, .. } if field == "trigger"));
    assert!(patch.set_field("sh", "trigger", true).is_ok());
    assert!(patch.set_field("sh", "input", true).is_err());
}

#[test]
fn test_live_edit_between_cycles() {
    init();
    let registry = Registry::with_core().unwrap();
    let mut patch = PatchDescription::new()
        .module("dc", "const", [("value", 8.0)])
        .module("pos", "const", [("value", -1.0)])
        .build(&registry)
        .unwrap();
    let pan = registry
        .construct(
            "pan",
            Args::new()
                .with("in_wave", Reference::to_field("dc", "out_0"))
                .with("in_pos", Reference::to_field("pos", "out_0")),
        )
        .unwrap();
    patch.add_module("pan", pan).unwrap();

    patch.bind_all().unwrap();
    patch.run(2).unwrap();
    assert_eq!(patch.read("pan", "out_0").unwrap(), 8.0);

    patch.set_field("pan", "in_pos", 0.5).unwrap();
    assert_eq!(patch.tick_cycle().unwrap_err(), PatchError::PatchNotBound);

    patch.bind_all().unwrap();
    patch.tick_cycle().unwrap();
    assert_eq!(patch.read("pan", "out_0").unwrap(), 2.0);
    assert_eq!(patch.read("pan", "out_1").unwrap(), 6.0);
    assert_eq!(patch.current_cycle(), 3);
}
