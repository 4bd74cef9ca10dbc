use engine::{LoopConfig, Scene};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::gameplay::{self, Level, LevelError};

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
}

pub(crate) fn build_app() -> Result<AppWiring, LevelError> {
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "=== Platformer Startup ===");

    let level = Level::overworld()?;
    info!(
        level = %level.name,
        width = level.bounds.width,
        height = level.bounds.height,
        collectibles = level.collectibles.len(),
        "level_parsed"
    );

    let config = LoopConfig {
        logical_height: level.bounds.height.round() as u32,
        ..LoopConfig::default()
    };

    Ok(AppWiring {
        config,
        scene: gameplay::build_scene(level),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
