use crate::engine::components::factory::Factory;
use crate::engine::components::fields::FieldTable;
use crate::engine::components::module::{cached, BoundInputs, ModuleKind};
use crate::engine::components::template::Template;
use crate::engine::error::PatchError;
use crate::engine::types::{FieldType, PortKind};
use crate::engine::values::port::DoublePort;
use std::sync::Arc;

pub const KIND: &str = "mix";

const INPUTS: [&str; 4] = ["in_a", "in_b", "gain_a", "gain_b"];

/// Weighted sum of two signals: `in_a * gain_a + in_b * gain_b`
struct Mixer {
    out: Arc<DoublePort>,
    inputs: [Option<Arc<DoublePort>>; 4],
}

impl ModuleKind for Mixer {
    fn bind1(&mut self, _fields: &FieldTable, inputs: &BoundInputs) -> Result<(), PatchError> {
        for (slot, name) in self.inputs.iter_mut().zip(INPUTS) {
            *slot = Some(inputs.get(name)?);
        }
        Ok(())
    }

    fn reset1(&mut self) {
        self.inputs = Default::default();
    }

    fn tick(&mut self) -> Result<(), PatchError> {
        let [in_a, in_b, gain_a, gain_b] = &self.inputs;
        let value = cached(in_a, "in_a")?.get() * cached(gain_a, "gain_a")?.get()
            + cached(in_b, "in_b")?.get() * cached(gain_b, "gain_b")?.get();
        self.out.set(value);
        Ok(())
    }
}

fn construct(_factory: &Factory, fields: &mut FieldTable) -> Result<Box<dyn ModuleKind>, PatchError> {
    for name in INPUTS {
        fields.narrow(name, PortKind::Double)?;
    }
    Ok(Box::new(Mixer {
        out: fields.output("out_0")?,
        inputs: Default::default(),
    }))
}

pub fn factory() -> Result<Factory, PatchError> {
    let base = Template::build(crate::fields![
        in_a => FieldType::reference(PortKind::Double),
        in_b => FieldType::reference(PortKind::Double),
        gain_a => FieldType::reference(PortKind::Double),
        gain_b => FieldType::reference(PortKind::Double)
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
    fn test_weighted_sum() {
        let source = PortHandle::from(3.0);
        let mut resolver = HashMap::new();
        resolver.insert(FieldRef::new("src", "out_0"), source.clone());

        let mut module = factory()
            .unwrap()
            .construct(
                Args::new()
                    .with("in_a", Reference::to_field("src", "out_0"))
                    .with("in_b", 2.0)
                    .with("gain_a", 0.5)
                    .with("gain_b", 0.25),
            )
            .unwrap();
        module.bind(&resolver).unwrap();
        module.tick().unwrap();
        assert_eq!(module.read::<f64>("out_0").unwrap(), 2.0);

        source.typed::<f64>().unwrap().set(1.0);
        module.tick().unwrap();
        assert_eq!(module.read::<f64>("out_0").unwrap(), 1.0);
    }

    #[test]
    fn test_missing_gain() {
        let err = factory()
            .unwrap()
            .construct(Args::new().with("in_a", 1.0).with("in_b", 1.0).with("gain_a", 1.0))
            .unwrap_err();
        assert_eq!(
            err,
            PatchError::MissingField {
                owner: "mix".to_string(),
                field: "gain_b".to_string()
            }
        );
    }
}
