use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use babuland_sim::{ConfigError, LoopConfig, SimConfig};
use serde::Deserialize;

use super::error::RunnerError;

pub(crate) const CONFIG_ENV_VAR: &str = "BABULAND_CONFIG";
pub(crate) const SEED_ENV_VAR: &str = "BABULAND_SEED";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct RunnerConfig {
    pub(crate) seed: u64,
    pub(crate) player_name: String,
    pub(crate) simulated_seconds: f32,
    pub(crate) render_fps: u32,
    /// Inject a stall of `stall_ms` every this many simulated seconds; 0 disables.
    pub(crate) stall_every_seconds: f32,
    pub(crate) stall_ms: u64,
    pub(crate) max_rounds: u32,
    pub(crate) output_dir: PathBuf,
    pub(crate) target_tps: u32,
    pub(crate) max_ticks_per_frame: u32,
    pub(crate) max_frame_delta_ms: u64,
    pub(crate) sim: SimConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            player_name: "autopilot".to_string(),
            simulated_seconds: 120.0,
            render_fps: 75,
            stall_every_seconds: 0.0,
            stall_ms: 400,
            max_rounds: 3,
            output_dir: PathBuf::from("babuland_sessions"),
            target_tps: 60,
            max_ticks_per_frame: 8,
            max_frame_delta_ms: 250,
            sim: SimConfig::default(),
        }
    }
}

impl RunnerConfig {
    pub(crate) fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            target_tps: self.target_tps,
            max_frame_delta: Duration::from_millis(self.max_frame_delta_ms),
            max_ticks_per_frame: self.max_ticks_per_frame,
            ..LoopConfig::default()
        }
    }

    pub(crate) fn frame_dt(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.render_fps.max(1)))
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        self.sim.validate()?;
        self.loop_config().validate()?;
        for (field, value) in [
            ("render_fps", self.render_fps as f32),
            ("simulated_seconds", self.simulated_seconds),
            ("max_rounds", self.max_rounds as f32),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        Ok(())
    }
}

/// Reads the optional config file named by `BABULAND_CONFIG`, then applies the
/// `BABULAND_SEED` override.
pub(crate) fn load_from_env() -> Result<RunnerConfig, RunnerError> {
    let mut config = match read_env_var(CONFIG_ENV_VAR)? {
        Some(path) => load_file(Path::new(&path))?,
        None => RunnerConfig::default(),
    };
    if let Some(raw) = read_env_var(SEED_ENV_VAR)? {
        config.seed = parse_seed(&raw)?;
    }
    config.validate()?;
    Ok(config)
}

fn read_env_var(var: &'static str) -> Result<Option<String>, RunnerError> {
    match std::env::var(var) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(source) => Err(RunnerError::EnvVar { var, source }),
    }
}

pub(crate) fn parse_seed(raw: &str) -> Result<u64, RunnerError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|source| RunnerError::InvalidSeed {
            var: SEED_ENV_VAR,
            value: raw.to_string(),
            source,
        })
}

pub(crate) fn load_file(path: &Path) -> Result<RunnerConfig, RunnerError> {
    let raw = fs::read_to_string(path).map_err(|source| RunnerError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config_json(&raw, path)
}

pub(crate) fn parse_config_json(raw: &str, origin: &Path) -> Result<RunnerConfig, RunnerError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, RunnerConfig>(&mut deserializer).map_err(|error| {
        let field = error.path().to_string();
        RunnerError::ParseConfig {
            path: origin.to_path_buf(),
            field: if field.is_empty() { ".".to_string() } else { field },
            source: error.into_inner(),
        }
    })
}
