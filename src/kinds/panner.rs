//! Stereo panner
//!
//! Splits one numeric signal across two outputs with a linear crossfade:
//! `in_pos = -1` sends everything to `out_0`, `in_pos = 1` everything to
//! `out_1`, and positions in between interpolate. Positions outside
//! `[-1, 1]` clamp to the nearest side.

use crate::engine::components::factory::Factory;
use crate::engine::components::fields::FieldTable;
use crate::engine::components::module::{cached, BoundInputs, ModuleKind};
use crate::engine::components::template::Template;
use crate::engine::error::PatchError;
use crate::engine::types::{FieldType, PortKind};
use crate::engine::values::port::DoublePort;
use std::sync::Arc;

pub const KIND: &str = "pan";

/// Split `value` into `(left, right)` for a pan position
pub fn pan(value: f64, pos: f64) -> (f64, f64) {
    if pos <= -1.0 {
        (value, 0.0)
    } else if pos >= 1.0 {
        (0.0, value)
    } else {
        let p = (pos + 1.0) / 2.0;
        let right = value * p;
        (value - right, right)
    }
}

struct Panner {
    left: Arc<DoublePort>,
    right: Arc<DoublePort>,
    wave: Option<Arc<DoublePort>>,
    pos: Option<Arc<DoublePort>>,
}

impl ModuleKind for Panner {
    fn bind1(&mut self, _fields: &FieldTable, inputs: &BoundInputs) -> Result<(), PatchError> {
        self.wave = Some(inputs.get("in_wave")?);
        self.pos = Some(inputs.get("in_pos")?);
        Ok(())
    }

    fn reset1(&mut self) {
        self.wave = None;
        self.pos = None;
    }

    fn tick(&mut self) -> Result<(), PatchError> {
        let value = cached(&self.wave, "in_wave")?.get();
        let pos = cached(&self.pos, "in_pos")?.get();
        let (left, right) = pan(value, pos);
        self.left.set(left);
        self.right.set(right);
        Ok(())
    }
}

fn construct(_factory: &Factory, fields: &mut FieldTable) -> Result<Box<dyn ModuleKind>, PatchError> {
    fields.narrow("in_wave", PortKind::Double)?;
    fields.narrow("in_pos", PortKind::Double)?;
    Ok(Box::new(Panner {
        left: fields.output("out_0")?,
        right: fields.output("out_1")?,
        wave: None,
        pos: None,
    }))
}

pub fn factory() -> Result<Factory, PatchError> {
    let base = Template::build(crate::fields![
        in_wave => FieldType::reference(PortKind::Double),
        in_pos => FieldType::reference(PortKind::Double)
    ])?;
    Factory::new(KIND, base, crate::outputs![PortKind::Double; out_0, out_1], construct)
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
    fn test_pan_positions() {
        assert_eq!(pan(10.0, 0.0), (5.0, 5.0));
        assert_eq!(pan(10.0, 1.0), (0.0, 10.0));
        assert_eq!(pan(10.0, -1.0), (10.0, 0.0));
        assert_eq!(pan(10.0, 2.0), (0.0, 10.0));
        assert_eq!(pan(4.0, 0.5), (1.0, 3.0));
    }

    #[test]
    fn test_pan_large_magnitude() {
        // the position is scaled before it multiplies the signal
        let (left, right) = pan(f64::MAX, 0.5);
        assert_eq!(right, f64::MAX * 0.75);
        assert_eq!(left, f64::MAX - f64::MAX * 0.75);
        assert!(left.is_finite() && right.is_finite());
    }

    #[test]
    fn test_pan_preserves_sum() {
        for step in 0..=20 {
            let pos = -1.0 + step as f64 * 0.1;
            let (left, right) = pan(8.0, pos);
            assert!((left + right - 8.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_template_layout() {
        let factory = factory().unwrap();
        let names: Vec<&str> = factory.full_template().names().collect();
        assert_eq!(names, vec!["in_wave", "in_pos", "out_0", "out_1"]);
        assert!(factory.full_template().is_extension_of(factory.base_template()));
    }

    #[test]
    fn test_tick_with_literal_inputs() {
        let mut module = factory()
            .unwrap()
            .construct(Args::new().with("in_wave", 4.0).with("in_pos", 0.5))
            .unwrap();
        module.bind(&HashMap::<FieldRef, PortHandle>::new()).unwrap();
        module.tick().unwrap();

        assert_eq!(module.read::<f64>("out_0").unwrap(), 1.0);
        assert_eq!(module.read::<f64>("out_1").unwrap(), 3.0);
    }

    #[test]
    fn test_construction_narrows_inputs() {
        let module = factory()
            .unwrap()
            .construct(
                Args::new()
                    .with("in_wave", Reference::to_field("osc", "out_0"))
                    .with("in_pos", 0.0),
            )
            .unwrap();
        let reference = module.field("in_wave").unwrap().as_reference().unwrap();
        assert_eq!(reference.restriction(), Some(PortKind::Double));
    }

    #[test]
    fn test_gate_reference_rejected() {
        let gate = Reference::to_field("cmp", "out_0").restricted(PortKind::Gate);
        let err = factory()
            .unwrap()
            .construct(Args::new().with("in_wave", gate).with("in_pos", 0.0))
            .unwrap_err();
        assert!(matches!(err, PatchError::TypeMismatch { ref field, .. } if field == "in_wave"));
    }
}
