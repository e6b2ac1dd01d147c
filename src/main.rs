use gpu_life_kernel::seed::{self, PatternSeed, Seed};
use gpu_life_kernel::{BoundaryPolicy, LifeConfig, LifeError, LifeState, Pattern, RuleTable};
use std::time::Instant;

// Constants
const GRID_WIDTH: u32 = 128;
const GRID_HEIGHT: u32 = 96;
const WORKGROUP_SIZE: u32 = 8;
const GENERATIONS: u64 = 240;
const REPORT_EVERY: u64 = 30;

async fn run() -> Result<(), LifeError> {
    let config = LifeConfig::new(GRID_WIDTH, GRID_HEIGHT)
        .with_boundary(BoundaryPolicy::Toroidal)
        .with_rules(RuleTable::conway())
        .with_tile(WORKGROUP_SIZE, WORKGROUP_SIZE)
        .with_visualization(true);

    let mut initial = seed::glider_gun().generate(config.dims())?;
    let glider = PatternSeed {
        pattern: Pattern::Glider,
        x: GRID_WIDTH / 2,
        y: GRID_HEIGHT / 2,
    }
    .generate(config.dims())?;
    for (x, y) in glider.live_cells() {
        initial.set(x, y, true);
    }

    let mut state = LifeState::new(config, &initial).await?;
    log::info!(
        "Running {} generations of {} on a {}x{} grid ({} live cells)",
        GENERATIONS,
        config.rules,
        GRID_WIDTH,
        GRID_HEIGHT,
        initial.live_count()
    );

    let start = Instant::now();
    while state.generation() < GENERATIONS {
        state.run(REPORT_EVERY.min(GENERATIONS - state.generation()));
        log::info!(
            "Generation {}: {} live cells",
            state.generation(),
            state.live_cell_count()?
        );
    }
    log::info!("Finished in {:.2}ms", start.elapsed().as_secs_f64() * 1000.0);

    let frame = state.read_frame()?;
    let lit = frame.iter().filter(|px| px[0] == 255).count();
    log::info!("Visualization shows {} lit pixels", lit);

    print!("{}", state.read_grid()?);
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(e) = pollster::block_on(run()) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
