use std::time::{Duration, Instant};

/// Loop health over the last completed reporting window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub tps: f32,
    pub frame_time_ms: f32,
    pub worst_frame_ms: f32,
    /// Frames whose simulation backlog exceeded the per-frame tick budget.
    pub clamped_frames: u32,
}

#[derive(Debug, Default)]
struct Window {
    frames: u32,
    ticks: u32,
    clamped_frames: u32,
    frame_time_total: Duration,
    worst_frame: Duration,
}

impl Window {
    fn summarize(&self, elapsed: Duration) -> LoopMetricsSnapshot {
        let seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let mean_frame_ms = match self.frames {
            0 => 0.0,
            frames => self.frame_time_total.as_secs_f32() * 1000.0 / frames as f32,
        };
        LoopMetricsSnapshot {
            fps: self.frames as f32 / seconds,
            tps: self.ticks as f32 / seconds,
            frame_time_ms: mean_frame_ms,
            worst_frame_ms: self.worst_frame.as_secs_f32() * 1000.0,
            clamped_frames: self.clamped_frames,
        }
    }
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    started: Instant,
    interval: Duration,
    window: Window,
    latest: LoopMetricsSnapshot,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            started: Instant::now(),
            interval,
            window: Window::default(),
            latest: LoopMetricsSnapshot::default(),
        }
    }

    pub(crate) fn record_frame(&mut self, frame_dt: Duration) {
        let window = &mut self.window;
        window.frames = window.frames.saturating_add(1);
        window.frame_time_total = window.frame_time_total.saturating_add(frame_dt);
        window.worst_frame = window.worst_frame.max(frame_dt);
    }

    pub(crate) fn record_tick(&mut self) {
        self.window.ticks = self.window.ticks.saturating_add(1);
    }

    pub(crate) fn record_clamp(&mut self) {
        self.window.clamped_frames = self.window.clamped_frames.saturating_add(1);
    }

    /// Zeroed until the first window closes.
    pub(crate) fn latest(&self) -> LoopMetricsSnapshot {
        self.latest
    }

    /// Closes the window once `interval` has passed and returns its summary.
    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed < self.interval {
            return None;
        }
        self.latest = std::mem::take(&mut self.window).summarize(elapsed);
        self.started = now;
        Some(self.latest)
    }
}
