//! Phase-accumulating sine oscillator
//!
//! `rate` is the number of ticks per second, so each tick advances the phase
//! by `freq / rate` cycles. The phase lives in `[0, 1)` and survives a rebind.

use crate::engine::components::factory::Factory;
use crate::engine::components::fields::FieldTable;
use crate::engine::components::module::{cached, BoundInputs, ModuleKind};
use crate::engine::components::template::Template;
use crate::engine::error::PatchError;
use crate::engine::types::{FieldType, PortKind};
use crate::engine::values::port::DoublePort;
use std::f64::consts::TAU;
use std::sync::Arc;

pub const KIND: &str = "sine";

struct Sine {
    out: Arc<DoublePort>,
    freq: Option<Arc<DoublePort>>,
    amp: Option<Arc<DoublePort>>,
    rate: f64,
    phase: f64,
}

impl ModuleKind for Sine {
    fn bind1(&mut self, fields: &FieldTable, inputs: &BoundInputs) -> Result<(), PatchError> {
        let rate = fields.number("rate")?;
        if !(rate > 0.0 && rate.is_finite()) {
            return Err(PatchError::InvalidValue {
                field: "rate".to_string(),
                reason: format!("expected a positive tick rate, got {}", rate),
            });
        }
        self.rate = rate;
        self.freq = Some(inputs.get("freq")?);
        self.amp = Some(inputs.get("amp")?);
        Ok(())
    }

    fn reset1(&mut self) {
        self.freq = None;
        self.amp = None;
    }

    fn tick(&mut self) -> Result<(), PatchError> {
        let freq = cached(&self.freq, "freq")?.get();
        let amp = cached(&self.amp, "amp")?.get();

        // Output first, so the first tick after construction emits sin(0)
        self.out.set(amp * (TAU * self.phase).sin());

        let next = (self.phase + freq / self.rate).rem_euclid(1.0);
        self.phase = if next.is_finite() { next } else { 0.0 };
        Ok(())
    }
}

fn construct(_factory: &Factory, fields: &mut FieldTable) -> Result<Box<dyn ModuleKind>, PatchError> {
    fields.narrow("freq", PortKind::Double)?;
    fields.narrow("amp", PortKind::Double)?;
    Ok(Box::new(Sine {
        out: fields.output("out_0")?,
        freq: None,
        amp: None,
        rate: 1.0,
        phase: 0.0,
    }))
}

pub fn factory() -> Result<Factory, PatchError> {
    let base = Template::build(crate::fields![
        freq => FieldType::reference(PortKind::Double),
        amp => FieldType::reference(PortKind::Double),
        rate => FieldType::Number
    ])?;
    Factory::new(KIND, base, crate::outputs![PortKind::Double; out_0], construct)
}
