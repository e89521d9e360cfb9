use std::time::Duration;

use tracing::warn;

use crate::config::LoopConfig;
use crate::input::Intent;
use crate::metrics::{LoopMetricsSnapshot, MetricsAccumulator};

const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_secs(1);

/// Anything the loop can drive one fixed tick at a time.
pub trait FixedStepTarget {
    fn apply_intent(&mut self, intent: Intent);
    fn step(&mut self, dt: f32);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepPlan {
    pub ticks_to_run: u32,
    pub remaining_accumulator: Duration,
    pub dropped_backlog: Duration,
}

/// Splits the accumulated time into whole ticks, at most `max_ticks_per_frame`.
/// Whatever is still owed past the cap is reported as dropped and cleared.
pub fn plan_sim_steps(
    accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    if fixed_dt.is_zero() {
        return StepPlan {
            ticks_to_run: 0,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        };
    }

    let owed = accumulator.as_nanos() / fixed_dt.as_nanos();
    let ticks_to_run = u32::try_from(owed)
        .unwrap_or(u32::MAX)
        .min(max_ticks_per_frame);
    let leftover = accumulator.saturating_sub(fixed_dt * ticks_to_run);

    if leftover >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: leftover,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: leftover,
            dropped_backlog: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub ticks_run: u32,
    pub dropped_backlog: Duration,
    /// Fraction of a tick left in the accumulator, for render interpolation.
    pub alpha: f32,
    pub metrics: Option<LoopMetricsSnapshot>,
}

#[derive(Debug)]
pub struct FixedStepLoop {
    fixed_dt: Duration,
    fixed_dt_seconds: f32,
    max_frame_delta: Duration,
    max_ticks_per_frame: u32,
    accumulator: Duration,
    total_ticks: u64,
    metrics: MetricsAccumulator,
}

impl FixedStepLoop {
    pub fn new(config: &LoopConfig) -> Self {
        let fixed_dt = config.fixed_dt();
        let metrics_interval = if config.metrics_log_interval.is_zero() {
            DEFAULT_METRICS_INTERVAL
        } else {
            config.metrics_log_interval
        };
        Self {
            fixed_dt,
            fixed_dt_seconds: fixed_dt.as_secs_f32(),
            // A frame always pays for at least one tick, or the loop would stall.
            max_frame_delta: config.max_frame_delta.max(fixed_dt),
            max_ticks_per_frame: config.max_ticks_per_frame.max(1),
            accumulator: Duration::ZERO,
            total_ticks: 0,
            metrics: MetricsAccumulator::new(metrics_interval),
        }
    }

    pub fn fixed_dt(&self) -> Duration {
        self.fixed_dt
    }

    pub fn accumulator(&self) -> Duration {
        self.accumulator
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Feeds one render frame's elapsed time and runs the ticks it pays for.
    /// `intent_fn` is sampled once per tick, before that tick runs.
    pub fn advance<T, F>(
        &mut self,
        frame_dt: Duration,
        target: &mut T,
        mut intent_fn: F,
    ) -> FrameReport
    where
        T: FixedStepTarget,
        F: FnMut(&T) -> Intent,
    {
        self.accumulator = self
            .accumulator
            .saturating_add(frame_dt.min(self.max_frame_delta));

        let plan = plan_sim_steps(self.accumulator, self.fixed_dt, self.max_ticks_per_frame);
        for _ in 0..plan.ticks_to_run {
            let intent = intent_fn(&*target);
            target.apply_intent(intent);
            target.step(self.fixed_dt_seconds);
            self.metrics.record_tick();
            self.total_ticks = self.total_ticks.saturating_add(1);
        }
        self.accumulator = plan.remaining_accumulator;

        if plan.dropped_backlog > Duration::ZERO {
            warn!(
                dropped_backlog_ms = plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame = self.max_ticks_per_frame,
                "sim_clamp_triggered"
            );
        }

        self.metrics.record_frame(frame_dt);
        FrameReport {
            ticks_run: plan.ticks_to_run,
            dropped_backlog: plan.dropped_backlog,
            alpha: self.accumulator.as_secs_f32() / self.fixed_dt_seconds,
            metrics: self.metrics.maybe_snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingTarget {
        steps: u32,
        intents: Vec<Intent>,
        simulated_seconds: f32,
    }

    impl FixedStepTarget for CountingTarget {
        fn apply_intent(&mut self, intent: Intent) {
            self.intents.push(intent);
        }

        fn step(&mut self, dt: f32) {
            self.steps += 1;
            self.simulated_seconds += dt;
        }
    }

    #[test]
    fn plan_keeps_partial_tick_for_next_frame() {
        let fixed_dt = LoopConfig::default().fixed_dt();
        let partial = Duration::from_millis(2);
        let plan = plan_sim_steps(fixed_dt * 3 + partial, fixed_dt, 8);

        assert_eq!(plan.ticks_to_run, 3);
        assert_eq!(plan.remaining_accumulator, partial);
        assert_eq!(plan.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_past_tick_cap_drops_everything_still_owed() {
        let config = LoopConfig::default();
        let fixed_dt = config.fixed_dt();
        let plan = plan_sim_steps(fixed_dt * 20, fixed_dt, config.max_ticks_per_frame);

        assert_eq!(plan.ticks_to_run, 8);
        assert_eq!(plan.remaining_accumulator, Duration::ZERO);
        assert_eq!(plan.dropped_backlog, fixed_dt * 12);
    }

    #[test]
    fn plan_with_zero_tick_length_runs_nothing() {
        let plan = plan_sim_steps(Duration::from_millis(40), Duration::ZERO, 8);
        assert_eq!(plan.ticks_to_run, 0);
        assert_eq!(plan.remaining_accumulator, Duration::from_millis(40));
    }

    #[test]
    fn long_frame_is_clamped_to_max_delta_before_planning() {
        let config = LoopConfig::default();
        let mut fixed_loop = FixedStepLoop::new(&config);
        let mut target = CountingTarget::default();
        let fixed_dt = fixed_loop.fixed_dt();

        // 600 ms clamps to 250 ms, which owes more ticks than the cap of 8.
        let report =
            fixed_loop.advance(Duration::from_millis(600), &mut target, |_| Intent::idle());

        assert_eq!(report.ticks_run, 8);
        assert_eq!(
            report.dropped_backlog,
            config.max_frame_delta - fixed_dt * 8
        );
        assert_eq!(fixed_loop.accumulator(), Duration::ZERO);
    }

    #[test]
    fn max_delta_below_one_tick_still_advances() {
        let config = LoopConfig {
            max_frame_delta: Duration::from_millis(5),
            ..LoopConfig::default()
        };
        let mut fixed_loop = FixedStepLoop::new(&config);
        let mut target = CountingTarget::default();
        let frame = fixed_loop.fixed_dt();
        let report = fixed_loop.advance(frame, &mut target, |_| Intent::idle());
        assert_eq!(report.ticks_run, 1);
    }

    #[test]
    fn burst_frame_never_exceeds_tick_cap_and_resets_accumulator() {
        let config = LoopConfig {
            max_frame_delta: Duration::from_secs(5),
            ..LoopConfig::default()
        };
        let mut fixed_loop = FixedStepLoop::new(&config);
        let mut target = CountingTarget::default();

        let burst = fixed_loop.fixed_dt() * (config.max_ticks_per_frame * 4);
        let report = fixed_loop.advance(burst, &mut target, |_| Intent::idle());

        assert_eq!(report.ticks_run, config.max_ticks_per_frame);
        assert_eq!(target.steps, config.max_ticks_per_frame);
        assert!(report.dropped_backlog > Duration::ZERO);
        assert_eq!(fixed_loop.accumulator(), Duration::ZERO);
        assert_eq!(report.alpha, 0.0);
    }

    #[test]
    fn steady_frames_run_one_tick_each() {
        let mut fixed_loop = FixedStepLoop::new(&LoopConfig::default());
        let mut target = CountingTarget::default();
        let frame = fixed_loop.fixed_dt();
        for _ in 0..120 {
            let report = fixed_loop.advance(frame, &mut target, |_| Intent::idle());
            assert_eq!(report.ticks_run, 1);
            assert_eq!(report.dropped_backlog, Duration::ZERO);
        }
        assert_eq!(fixed_loop.total_ticks(), 120);
        assert!((target.simulated_seconds - 2.0).abs() < 1e-3);
    }

    #[test]
    fn slow_frames_accumulate_partial_ticks() {
        let mut fixed_loop = FixedStepLoop::new(&LoopConfig::default());
        let mut target = CountingTarget::default();
        let half = fixed_loop.fixed_dt() / 2;

        let first = fixed_loop.advance(half, &mut target, |_| Intent::idle());
        assert_eq!(first.ticks_run, 0);
        assert!((first.alpha - 0.5).abs() < 1e-3);

        let rest = fixed_loop.fixed_dt() - half;
        let second = fixed_loop.advance(rest, &mut target, |_| Intent::idle());
        assert_eq!(second.ticks_run, 1);
    }

    #[test]
    fn intent_is_sampled_per_tick() {
        let mut fixed_loop = FixedStepLoop::new(&LoopConfig::default());
        let mut target = CountingTarget::default();
        let frame = fixed_loop.fixed_dt() * 3;
        fixed_loop.advance(frame, &mut target, |state| Intent {
            rotate_steps: state.steps as i32,
            ..Intent::idle()
        });
        let steps: Vec<i32> = target.intents.iter().map(|intent| intent.rotate_steps).collect();
        assert_eq!(steps, vec![0, 1, 2]);
    }

    #[test]
    fn metrics_snapshot_after_one_simulated_second() {
        let mut fixed_loop = FixedStepLoop::new(&LoopConfig::default());
        let mut target = CountingTarget::default();
        let frame = Duration::from_millis(20);
        let mut snapshots = Vec::new();
        for _ in 0..50 {
            let report = fixed_loop.advance(frame, &mut target, |_| Intent::idle());
            snapshots.extend(report.metrics);
        }
        assert_eq!(snapshots.len(), 1);
        assert!((snapshots[0].fps - 50.0).abs() < 0.5);
        assert!((snapshots[0].tps - 60.0).abs() < 2.0);
    }
}
