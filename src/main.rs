use std::env;
use std::error::Error;

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use trussim::animation::AnimationController;
use trussim::interpolation::FlatRoadway;
use trussim::report::render_load_test;
use trussim::{Analysis, BridgeModel, DesignConditions, Inventory, SectionFamily, SimulationConfig};

/// Scenario used when none is given: six panels, medium deck, standard truck.
const DEFAULT_SCENARIO: &str = "1060804000";

/// Frame period of the headless animation run, 50 Hz.
const FRAME_NANOS: u64 = 20_000_000;

/// Length of the headless animation run.
const ANIMATION_SECONDS: u64 = 12;

/// Usage: `trussim [SCENARIO_CODE] [CONFIG.json]`.
fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = env::args().skip(1);
    let conditions: DesignConditions = args.next().as_deref().unwrap_or(DEFAULT_SCENARIO).parse()?;
    let config = match args.next() {
        Some(path) => SimulationConfig::from_path(path)?,
        None => SimulationConfig::default(),
    };

    // A Warren truss as deep as one panel, in hollow tubes of quenched and tempered steel.
    let inventory = Inventory::standard();
    let steel = inventory.material(2).cloned().ok_or("inventory has no third material")?;
    let chord = inventory.shape(SectionFamily::Tube, 24).ok_or("no chord tube")?;
    let web = inventory.shape(SectionFamily::Tube, 18).ok_or("no web tube")?;
    let bridge = BridgeModel::warren(conditions, 4.0, &steel, chord, web)?;

    let analysis = Analysis::run(&bridge, &config.analysis)?;
    println!("{}", render_load_test(&bridge, &analysis));

    let mut controller = AnimationController::new(bridge, config, Box::new(FlatRoadway::default()))?;
    let mut state = None;
    let mut travelled = 0.0;
    for frame in 0..=ANIMATION_SECONDS * 1_000_000_000 / FRAME_NANOS {
        let time = frame * FRAME_NANOS;
        controller.update(time);
        travelled += controller.take_distance_moved();
        if state != Some(controller.state()) {
            state = Some(controller.state());
            info!(
                seconds = time as f64 * 1.0e-9,
                state = %controller.state(),
                load_location = controller.load_location(),
                "animation"
            );
        }
    }
    let snapshot = controller.snapshot();
    info!(
        state = %controller.state(),
        failed_members = snapshot.failure_count(),
        travelled_m = travelled,
        "animation finished"
    );
    Ok(())
}
