use std::time::Duration;

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub tps: f32,
    pub frame_time_ms: f32,
}

/// Rolls frame and tick counts into a snapshot once per `interval` of recorded
/// frame time. Driven by the frame deltas it is fed, not by a wall clock, so a
/// replayed run reports the same numbers.
#[derive(Debug)]
pub struct MetricsAccumulator {
    interval: Duration,
    elapsed: Duration,
    frames: u32,
    ticks: u32,
    frame_time_sum: Duration,
}

impl MetricsAccumulator {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            elapsed: Duration::ZERO,
            frames: 0,
            ticks: 0,
            frame_time_sum: Duration::ZERO,
        }
    }

    pub fn record_frame(&mut self, frame_dt: Duration) {
        self.frames = self.frames.saturating_add(1);
        self.frame_time_sum = self.frame_time_sum.saturating_add(frame_dt);
        self.elapsed = self.elapsed.saturating_add(frame_dt);
    }

    pub fn record_tick(&mut self) {
        self.ticks = self.ticks.saturating_add(1);
    }

    pub fn maybe_snapshot(&mut self) -> Option<LoopMetricsSnapshot> {
        if self.elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = self.elapsed.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = if self.frames == 0 {
            0.0
        } else {
            (self.frame_time_sum.as_secs_f32() / self.frames as f32) * 1000.0
        };

        let snapshot = LoopMetricsSnapshot {
            fps: self.frames as f32 / elapsed_seconds,
            tps: self.ticks as f32 / elapsed_seconds,
            frame_time_ms,
        };

        self.elapsed = Duration::ZERO;
        self.frames = 0;
        self.ticks = 0;
        self.frame_time_sum = Duration::ZERO;

        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_computes_expected_values() {
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(1));
        for _ in 0..4 {
            accumulator.record_frame(Duration::from_millis(250));
            accumulator.record_tick();
            accumulator.record_tick();
        }

        let snapshot = accumulator
            .maybe_snapshot()
            .expect("snapshot should be emitted");

        assert!((snapshot.fps - 4.0).abs() < 0.05);
        assert!((snapshot.tps - 8.0).abs() < 0.05);
        assert!((snapshot.frame_time_ms - 250.0).abs() < 0.001);
    }

    #[test]
    fn snapshot_not_emitted_before_interval() {
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(1));
        accumulator.record_frame(Duration::from_millis(500));

        assert!(accumulator.maybe_snapshot().is_none());
    }

    #[test]
    fn snapshot_resets_the_window() {
        let mut accumulator = MetricsAccumulator::new(Duration::from_millis(100));
        accumulator.record_frame(Duration::from_millis(100));
        accumulator.record_tick();
        assert!(accumulator.maybe_snapshot().is_some());

        accumulator.record_frame(Duration::from_millis(50));
        assert!(accumulator.maybe_snapshot().is_none());
    }
}
