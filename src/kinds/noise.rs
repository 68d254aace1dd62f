use crate::engine::components::factory::Factory;
use crate::engine::components::fields::FieldTable;
use crate::engine::components::module::{cached, BoundInputs, ModuleKind};
use crate::engine::components::template::Template;
use crate::engine::error::PatchError;
use crate::engine::types::{FieldType, PortKind};
use crate::engine::values::port::DoublePort;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::sync::Arc;

pub const KIND: &str = "noise";

/// Gaussian white noise scaled by `amp`
///
/// The generator is reseeded from `seed` on every bind, so a rebound patch
/// replays the same sequence.
struct Noise {
    out: Arc<DoublePort>,
    amp: Option<Arc<DoublePort>>,
    rng: Option<StdRng>,
}

impl ModuleKind for Noise {
    fn bind1(&mut self, fields: &FieldTable, inputs: &BoundInputs) -> Result<(), PatchError> {
        let seed = seed_value(fields.number("seed")?)?;
        self.amp = Some(inputs.get("amp")?);
        self.rng = Some(StdRng::seed_from_u64(seed));
        Ok(())
    }

    fn reset1(&mut self) {
        self.amp = None;
    }

    fn tick(&mut self) -> Result<(), PatchError> {
        let amp = cached(&self.amp, "amp")?.get();
        let rng = self
            .rng
            .as_mut()
            .ok_or_else(|| PatchError::NotBound("seed".to_string()))?;
        let sample: f64 = rng.sample(StandardNormal);
        self.out.set(amp * sample);
        Ok(())
    }
}

/// Seeds must be whole numbers that fit in a `u64`
fn seed_value(seed: f64) -> Result<u64, PatchError> {
    // u64::MAX rounds up to 2^64 as a double, which is already out of range
    if !seed.is_finite() || seed < 0.0 || seed.fract() != 0.0 || seed >= u64::MAX as f64 {
        return Err(PatchError::InvalidValue {
            field: "seed".to_string(),
            reason: format!("expected a whole number in 0..2^64, got {}", seed),
        });
    }
    Ok(seed as u64)
}

fn construct(_factory: &Factory, fields: &mut FieldTable) -> Result<Box<dyn ModuleKind>, PatchError> {
    fields.narrow("amp", PortKind::Double)?;
    Ok(Box::new(Noise {
        out: fields.output("out_0")?,
        amp: None,
        rng: None,
    }))
}

pub fn factory() -> Result<Factory, PatchError> {
    let base = Template::build(crate::fields![
        seed => FieldType::Number,
        amp => FieldType::reference(PortKind::Double)
    ])?;
    Factory::new(KIND, base, crate::outputs![PortKind::Double; out_0], construct)
}
