use tracing::info;
use tracing_subscriber::EnvFilter;

use super::config::{self, RunnerConfig};
use super::error::RunnerError;

pub(crate) struct AppWiring {
    pub(crate) config: RunnerConfig,
}

pub(crate) fn build_app() -> Result<AppWiring, RunnerError> {
    init_tracing();
    info!("=== Babuland Startup ===");

    let config = config::load_from_env()?;
    info!(
        seed = config.seed,
        player = %config.player_name,
        simulated_seconds = config.simulated_seconds,
        render_fps = config.render_fps,
        max_rounds = config.max_rounds,
        output_dir = %config.output_dir.display(),
        "runner_configured"
    );

    Ok(AppWiring { config })
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
