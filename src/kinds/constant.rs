use crate::engine::components::factory::Factory;
use crate::engine::components::fields::FieldTable;
use crate::engine::components::module::{BoundInputs, ModuleKind};
use crate::engine::components::template::Template;
use crate::engine::error::PatchError;
use crate::engine::types::{FieldType, PortKind};
use crate::engine::values::port::DoublePort;
use std::sync::Arc;

pub const KIND: &str = "const";

/// Writes its `value` field to `out_0` every cycle
struct Constant {
    out: Arc<DoublePort>,
    value: f64,
}

impl ModuleKind for Constant {
    fn bind1(&mut self, fields: &FieldTable, _inputs: &BoundInputs) -> Result<(), PatchError> {
        self.value = fields.number("value")?;
        Ok(())
    }

    fn reset1(&mut self) {}

    fn tick(&mut self) -> Result<(), PatchError> {
        self.out.set(self.value);
        Ok(())
    }
}

fn construct(_factory: &Factory, fields: &mut FieldTable) -> Result<Box<dyn ModuleKind>, PatchError> {
    Ok(Box::new(Constant {
        out: fields.output("out_0")?,
        value: fields.number("value")?,
    }))
}

pub fn factory() -> Result<Factory, PatchError> {
    let base = Template::build(crate::fields![value => FieldType::Number])?;
    Factory::new(KIND, base, crate::outputs![PortKind::Double; out_0], construct)
}
