pub mod overlay;

pub use overlay::GpuStats;

use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub const FRAME_HISTORY_SIZE: usize = 120;
/// Vertices in a full graph: background, one bar per sample and the budget line.
pub const MAX_GRAPH_VERTICES: usize = (FRAME_HISTORY_SIZE + 2) * 6;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimingStats {
    pub average_frame_time_ms: f32,
    pub max_frame_time_ms: f32,
    pub min_frame_time_ms: f32,
    /// Frames per second measured between frame starts.
    pub fps: f32,
    /// Frames whose render time exceeded the budget.
    pub over_budget: u32,
}

/// Rolling history of per-frame render times.
pub struct FrameTimer {
    frame_times: VecDeque<Duration>,
    intervals: VecDeque<Duration>,
    current_start: Option<Instant>,
    last_start: Option<Instant>,
    frame_counter: u64,
    budget: Duration,
}

impl FrameTimer {
    pub fn new(target_fps: u32) -> Self {
        Self {
            frame_times: VecDeque::with_capacity(FRAME_HISTORY_SIZE),
            intervals: VecDeque::with_capacity(FRAME_HISTORY_SIZE),
            current_start: None,
            last_start: None,
            frame_counter: 0,
            budget: Duration::from_secs_f32(1.0 / target_fps.max(1) as f32),
        }
    }

    pub fn begin_frame(&mut self) {
        self.begin_frame_at(Instant::now());
    }

    pub fn end_frame(&mut self) {
        self.end_frame_at(Instant::now());
    }

    pub fn begin_frame_at(&mut self, now: Instant) {
        if let Some(last) = self.last_start {
            push_bounded(&mut self.intervals, now.saturating_duration_since(last));
        }
        self.last_start = Some(now);
        self.current_start = Some(now);
    }

    pub fn end_frame_at(&mut self, now: Instant) {
        if let Some(start) = self.current_start.take() {
            push_bounded(&mut self.frame_times, now.saturating_duration_since(start));
            self.frame_counter += 1;
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_counter
    }

    pub fn budget_ms(&self) -> f32 {
        self.budget.as_secs_f32() * 1000.0
    }

    /// Render times in milliseconds, oldest first.
    pub fn frame_times_ms(&self) -> Vec<f32> {
        self.frame_times.iter().map(|d| d.as_secs_f32() * 1000.0).collect()
    }

    pub fn stats(&self) -> TimingStats {
        if self.frame_times.is_empty() {
            return TimingStats::default();
        }

        let mut total = Duration::ZERO;
        let mut max = Duration::ZERO;
        let mut min = Duration::MAX;
        let mut over_budget = 0;
        for &frame_time in &self.frame_times {
            total += frame_time;
            max = max.max(frame_time);
            min = min.min(frame_time);
            if frame_time > self.budget {
                over_budget += 1;
            }
        }
        let average = total / self.frame_times.len() as u32;

        let fps = if self.intervals.is_empty() {
            0.0
        } else {
            let interval: Duration = self.intervals.iter().sum();
            let average_interval = interval.as_secs_f32() / self.intervals.len() as f32;
            if average_interval > 0.0 {
                1.0 / average_interval
            } else {
                0.0
            }
        };

        TimingStats {
            average_frame_time_ms: average.as_secs_f32() * 1000.0,
            max_frame_time_ms: max.as_secs_f32() * 1000.0,
            min_frame_time_ms: min.as_secs_f32() * 1000.0,
            fps,
            over_budget,
        }
    }
}

fn push_bounded(history: &mut VecDeque<Duration>, value: Duration) {
    if history.len() >= FRAME_HISTORY_SIZE {
        history.pop_front();
    }
    history.push_back(value);
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StatsVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

const BACKGROUND: [f32; 4] = [0.0, 0.0, 0.0, 0.6];
const BUDGET_LINE: [f32; 4] = [1.0, 0.85, 0.2, 0.9];
const WITHIN_BUDGET: [f32; 4] = [0.3, 0.9, 0.4, 1.0];
const OVER_BUDGET: [f32; 4] = [0.95, 0.3, 0.25, 1.0];

fn push_quad(vertices: &mut Vec<StatsVertex>, x0: f32, y0: f32, x1: f32, y1: f32, color: [f32; 4]) {
    let corners = [[x0, y0], [x1, y0], [x1, y1], [x0, y0], [x1, y1], [x0, y1]];
    vertices.extend(corners.iter().map(|&position| StatsVertex { position, color }));
}

/// Bar graph of frame times in the unit square, x to the right and y up.
/// The budget sits at half height; bars are clamped at twice the budget.
pub fn graph_vertices(samples_ms: &[f32], budget_ms: f32) -> Vec<StatsVertex> {
    let mut vertices = Vec::with_capacity((samples_ms.len() + 2) * 6);
    push_quad(&mut vertices, 0.0, 0.0, 1.0, 1.0, BACKGROUND);

    let bar_width = 1.0 / FRAME_HISTORY_SIZE as f32;
    let scale = if budget_ms > 0.0 { 0.5 / budget_ms } else { 0.0 };
    let first = samples_ms.len().saturating_sub(FRAME_HISTORY_SIZE);

    for (i, &ms) in samples_ms[first..].iter().enumerate() {
        let height = (ms * scale).clamp(0.0, 1.0);
        let x0 = i as f32 * bar_width;
        let color = if ms <= budget_ms { WITHIN_BUDGET } else { OVER_BUDGET };
        push_quad(&mut vertices, x0, 0.0, x0 + bar_width, height, color);
    }

    push_quad(&mut vertices, 0.0, 0.495, 1.0, 0.505, BUDGET_LINE);
    vertices
}
