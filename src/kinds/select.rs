use crate::engine::components::factory::Factory;
use crate::engine::components::fields::FieldTable;
use crate::engine::components::module::{cached, BoundInputs, ModuleKind};
use crate::engine::components::template::Template;
use crate::engine::error::PatchError;
use crate::engine::types::{FieldType, PortKind};
use crate::engine::values::port::{DoublePort, GatePort};
use std::sync::Arc;

pub const KIND: &str = "select";

/// Passes `in_a` while the gate is open and `in_b` otherwise
struct Select {
    out: Arc<DoublePort>,
    gate: Option<Arc<GatePort>>,
    in_a: Option<Arc<DoublePort>>,
    in_b: Option<Arc<DoublePort>>,
}

impl ModuleKind for Select {
    fn bind1(&mut self, _fields: &FieldTable, inputs: &BoundInputs) -> Result<(), PatchError> {
        self.gate = Some(inputs.get("gate")?);
        self.in_a = Some(inputs.get("in_a")?);
        self.in_b = Some(inputs.get("in_b")?);
        Ok(())
    }

    fn reset1(&mut self) {
        self.gate = None;
        self.in_a = None;
        self.in_b = None;
    }

    fn tick(&mut self) -> Result<(), PatchError> {
        let value = if cached(&self.gate, "gate")?.get() {
            cached(&self.in_a, "in_a")?.get()
        } else {
            cached(&self.in_b, "in_b")?.get()
        };
        self.out.set(value);
        Ok(())
    }
}

fn construct(_factory: &Factory, fields: &mut FieldTable) -> Result<Box<dyn ModuleKind>, PatchError> {
    fields.narrow("gate", PortKind::Gate)?;
    fields.narrow("in_a", PortKind::Double)?;
    fields.narrow("in_b", PortKind::Double)?;
    Ok(Box::new(Select {
        out: fields.output("out_0")?,
        gate: None,
        in_a: None,
        in_b: None,
    }))
}

pub fn factory() -> Result<Factory, PatchError> {
    let base = Template::build(crate::fields![
        gate => FieldType::reference(PortKind::Gate),
        in_a => FieldType::reference(PortKind::Double),
        in_b => FieldType::reference(PortKind::Double)
    ])?;
    Factory::new(KIND, base, crate::outputs![PortKind::Double; out_0], construct)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::components::factory::Args;
    use crate::engine::types::FieldRef;
    use crate::engine::values::port::PortHandle;
    use crate::engine::values::reference::Reference;
    use std::collections::HashMap;

    #[test]
    fn test_gate_switches_source() {
        let gate = PortHandle::from(false);
        let mut resolver = HashMap::new();
        resolver.insert(FieldRef::new("cmp", "out_0"), gate.clone());

        let mut module = factory()
            .unwrap()
            .construct(
                Args::new()
                    .with("gate", Reference::to_field("cmp", "out_0"))
                    .with("in_a", 1.0)
                    .with("in_b", -1.0),
            )
            .unwrap();
        module.bind(&resolver).unwrap();

        module.tick().unwrap();
        assert_eq!(module.read::<f64>("out_0").unwrap(), -1.0);

        gate.typed::<bool>().unwrap().set(true);
        module.tick().unwrap();
        assert_eq!(module.read::<f64>("out_0").unwrap(), 1.0);
    }

    #[test]
    fn test_flag_literal_drives_gate() {
        let mut module = factory()
            .unwrap()
            .construct(Args::new().with("gate", true).with("in_a", 4.0).with("in_b", 0.0))
            .unwrap();
        module.bind(&HashMap::<FieldRef, PortHandle>::new()).unwrap();
        module.tick().unwrap();
        assert_eq!(module.read::<f64>("out_0").unwrap(), 4.0);
    }

    #[test]
    fn test_number_rejected_for_gate() {
        let err = factory()
            .unwrap()
            .construct(Args::new().with("gate", 1.0).with("in_a", 4.0).with("in_b", 0.0))
            .unwrap_err();
        assert_eq!(err, PatchError::mismatch("gate", "ref<gate>", "number"));
    }
}
