use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use babuland_sim::{FixedStepLoop, Scoreboard, Simulation};
use tracing::{debug, error, info};

use super::autopilot::Autopilot;
use super::bootstrap;
use super::config::RunnerConfig;
use super::error::RunnerError;
use super::session_log::{
    write_session_summary, Leaderboard, LeaderboardEntry, LEADERBOARD_FILE_NAME,
};
use super::telemetry::{SessionStats, SessionSummary};

pub(crate) fn run() -> ExitCode {
    let app = match bootstrap::build_app() {
        Ok(app) => app,
        Err(err) => {
            error!(error = %err, "startup_failed");
            return ExitCode::FAILURE;
        }
    };

    match run_session(&app.config) {
        Ok(report) => {
            info!(
                player = %report.summary.player_name,
                rank = ?report.rank,
                path = %report.summary_path.display(),
                "session_saved"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "session_failed");
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug)]
pub(crate) struct SessionReport {
    pub(crate) summary: SessionSummary,
    pub(crate) summary_path: PathBuf,
    pub(crate) rank: Option<usize>,
}

/// Drives one headless session: autopilot intents through the fixed-step
/// loop at the configured render rate, then persists the summary and
/// leaderboard.
pub(crate) fn run_session(config: &RunnerConfig) -> Result<SessionReport, RunnerError> {
    let session_length =
        Duration::try_from_secs_f32(config.simulated_seconds).map_err(|source| {
            RunnerError::SessionLength {
                value: config.simulated_seconds,
                source,
            }
        })?;
    let leaderboard_path = config.output_dir.join(LEADERBOARD_FILE_NAME);
    let mut leaderboard = Leaderboard::load(&leaderboard_path)?;

    let mut simulation = Simulation::new(
        config.sim.clone(),
        config.seed,
        Scoreboard::with_best(leaderboard.best_score()),
    )?;
    let mut fixed_step = FixedStepLoop::new(&config.loop_config());
    let fixed_dt = fixed_step.fixed_dt().as_secs_f32();
    let mut autopilot = Autopilot::new(config.max_rounds);
    let mut stats = SessionStats::default();

    let frame_dt = config.frame_dt();
    let stall = Duration::from_millis(config.stall_ms);
    let stall_every = config.stall_every_seconds;
    let mut next_stall_at = stall_every;
    let mut elapsed = Duration::ZERO;
    let mut frames: u64 = 0;

    while elapsed < session_length {
        let mut dt = frame_dt;
        if stall_every > 0.0 && elapsed.as_secs_f32() >= next_stall_at {
            dt += stall;
            next_stall_at += stall_every;
            debug!(stall_ms = config.stall_ms, "frame_stall_injected");
        }
        elapsed += dt;
        frames += 1;

        let report = fixed_step.advance(dt, &mut simulation, |sim| autopilot.decide(sim));
        let events = simulation.drain_events();
        stats.record_events(&events);
        stats.record_frame(&simulation, fixed_dt);

        if let Some(metrics) = report.metrics {
            info!(
                fps = metrics.fps,
                tps = metrics.tps,
                frame_time_ms = metrics.frame_time_ms,
                round = simulation.round(),
                score = simulation.scoreboard().score(),
                "loop_metrics"
            );
        }

        if autopilot.is_finished(&simulation) {
            info!(
                round = simulation.round(),
                status = ?simulation.status(),
                "rounds_exhausted"
            );
            break;
        }
    }

    let summary = stats.finish(&simulation, &config.player_name, config.seed);
    let summary_path = write_session_summary(&config.output_dir, &summary)?;
    let rank = leaderboard.insert(LeaderboardEntry::from_summary(&summary));
    leaderboard.save(&leaderboard_path)?;

    info!(
        frames,
        ticks = fixed_step.total_ticks(),
        rounds = summary.rounds_played,
        score = summary.score,
        best_score = summary.best_score,
        skill = summary.skill,
        accuracy = summary.accuracy,
        exploration = summary.exploration,
        leaderboard_entries = leaderboard.entries().len(),
        "session_complete"
    );

    Ok(SessionReport {
        summary,
        summary_path,
        rank,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn short_session(output_dir: PathBuf) -> RunnerConfig {
        RunnerConfig {
            seed: 11,
            simulated_seconds: 3.0,
            render_fps: 30,
            stall_every_seconds: 1.0,
            stall_ms: 400,
            output_dir,
            ..RunnerConfig::default()
        }
    }

    #[test]
    fn session_writes_summary_and_leaderboard() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = short_session(dir.path().join("out"));

        let first = run_session(&config).expect("first session");
        assert!(first.summary_path.exists());
        assert_eq!(first.rank, Some(0));
        assert!(first.summary.seconds > 0.0);

        let written: SessionSummary = serde_json::from_str(
            &fs::read_to_string(&first.summary_path).expect("read summary"),
        )
        .expect("parse summary");
        assert_eq!(written.seed, first.summary.seed);
        assert_eq!(written.score, first.summary.score);
        assert_eq!(written.skill, first.summary.skill);
        assert_eq!(written.rounds_played, first.summary.rounds_played);

        let second = run_session(&config).expect("second session");
        assert!(second.rank.is_some());
        let board = Leaderboard::load(&config.output_dir.join(LEADERBOARD_FILE_NAME))
            .expect("leaderboard");
        assert_eq!(board.entries().len(), 2);
        assert_eq!(second.summary.best_score, board.best_score());
    }

    #[test]
    fn same_config_replays_the_same_summary() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = run_session(&short_session(dir.path().join("a"))).expect("first");
        let second = run_session(&short_session(dir.path().join("b"))).expect("second");
        assert_eq!(first.summary, second.summary);
    }

    #[test]
    fn oversized_session_length_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = RunnerConfig {
            simulated_seconds: 1e20,
            ..short_session(dir.path().to_path_buf())
        };
        assert_eq!(config.validate(), Ok(()));
        assert!(matches!(
            run_session(&config),
            Err(RunnerError::SessionLength { .. })
        ));
        assert!(!dir.path().join(LEADERBOARD_FILE_NAME).exists());
    }

    #[test]
    fn invalid_sim_config_fails_before_running() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = short_session(dir.path().to_path_buf());
        config.sim.initial_hp = 0;
        assert!(matches!(
            run_session(&config),
            Err(RunnerError::InvalidConfig(_))
        ));
        assert!(!dir.path().join(LEADERBOARD_FILE_NAME).exists());
    }
}
