use crate::engine::components::factory::Factory;
use crate::engine::components::fields::FieldTable;
use crate::engine::components::module::{cached, BoundInputs, ModuleKind};
use crate::engine::components::template::Template;
use crate::engine::error::PatchError;
use crate::engine::types::{FieldType, PortKind};
use crate::engine::values::port::{DoublePort, GatePort};
use std::sync::Arc;

pub const KIND: &str = "compare";

/// Opens its gate while `in_wave >= level`
struct Compare {
    out: Arc<GatePort>,
    wave: Option<Arc<DoublePort>>,
    level: f64,
}

impl ModuleKind for Compare {
    fn bind1(&mut self, fields: &FieldTable, inputs: &BoundInputs) -> Result<(), PatchError> {
        self.level = fields.number("level")?;
        self.wave = Some(inputs.get("in_wave")?);
        Ok(())
    }

    fn reset1(&mut self) {
        self.wave = None;
    }

    fn tick(&mut self) -> Result<(), PatchError> {
        let wave = cached(&self.wave, "in_wave")?.get();
        self.out.set(wave >= self.level);
        Ok(())
    }
}

fn construct(_factory: &Factory, fields: &mut FieldTable) -> Result<Box<dyn ModuleKind>, PatchError> {
    fields.narrow("in_wave", PortKind::Double)?;
    Ok(Box::new(Compare {
        out: fields.output("out_0")?,
        wave: None,
        level: 0.0,
    }))
}

pub fn factory() -> Result<Factory, PatchError> {
    let base = Template::build(crate::fields![
        in_wave => FieldType::reference(PortKind::Double),
        level => FieldType::Number
    ])?;
    Factory::new(KIND, base, crate::outputs![PortKind::Gate; out_0], construct)
}
