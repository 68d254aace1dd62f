use rpatch::{ArgValue, ConcurrencyMode, EngineConfig, PatchDescription, Registry};

/// Ticks per second for both oscillators
const RATE: f64 = 16.0;

fn describe() -> PatchDescription {
    PatchDescription::new()
        .module(
            "osc",
            "sine",
            [
                ("freq", ArgValue::Number(2.0)),
                ("amp", ArgValue::Number(1.0)),
                ("rate", ArgValue::Number(RATE)),
            ],
        )
        .module(
            "lfo",
            "sine",
            [
                ("freq", ArgValue::Number(0.25)),
                ("amp", ArgValue::Number(1.0)),
                ("rate", ArgValue::Number(RATE)),
            ],
        )
        .module(
            "pan",
            "pan",
            [
                ("in_wave", ArgValue::reference("osc", "out_0")),
                ("in_pos", ArgValue::reference("lfo", "out_0")),
            ],
        )
        .with_config(EngineConfig::new().with_concurrency(ConcurrencyMode::Rayon))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp(None)
        .init();

    let cycles: u64 = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => 32,
    };

    let registry = Registry::with_core()?;
    let mut patch = describe().build(&registry)?;
    patch.bind_all()?;

    println!("Stages: {:?}", patch.stages());
    println!("{:>6} {:>10} {:>10}", "cycle", "left", "right");
    for _ in 0..cycles {
        patch.tick_cycle()?;
        println!(
            "{:>6} {:>10.4} {:>10.4}",
            patch.current_cycle(),
            patch.read("pan", "out_0")?,
            patch.read("pan", "out_1")?
        );
    }

    Ok(())
}
