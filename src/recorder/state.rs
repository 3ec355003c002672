use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::analysis::TimeSeriesPoint;
use crate::db::GazeSample;
use crate::models::{RecorderStatus, Session};

pub const DEFAULT_LIVE_BUFFER: usize = 300;

#[derive(Debug, Clone)]
pub struct RecorderState {
    pub status: RecorderStatus,
    pub session_id: String,
    pub started_at: Option<DateTime<Utc>>,
    /// Bumped on every start/stop so results from an earlier recording can be told apart.
    pub generation: u64,
    samples: Vec<GazeSample>,
    live: VecDeque<TimeSeriesPoint>,
    live_capacity: usize,
    last_timestamp_ms: Option<i64>,
}

impl RecorderState {
    pub fn new(session_id: String, live_capacity: usize) -> Self {
        Self {
            status: RecorderStatus::Idle,
            session_id,
            started_at: None,
            generation: 0,
            samples: Vec::new(),
            live: VecDeque::with_capacity(live_capacity.max(1)),
            live_capacity: live_capacity.max(1),
            last_timestamp_ms: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.status == RecorderStatus::Recording
    }

    pub fn begin(&mut self, session_id: String, now: DateTime<Utc>) {
        self.status = RecorderStatus::Recording;
        self.session_id = session_id;
        self.started_at = Some(now);
        self.generation = self.generation.wrapping_add(1);
        self.samples.clear();
        self.live.clear();
        // last_timestamp_ms carries over: store keys are shared across recordings.
    }

    pub fn pause(&mut self) {
        if self.status == RecorderStatus::Recording {
            self.status = RecorderStatus::Paused;
        }
    }

    pub fn resume(&mut self) -> bool {
        if self.status == RecorderStatus::Paused {
            self.status = RecorderStatus::Recording;
            true
        } else {
            false
        }
    }

    /// Ends the recording and hands over the accumulated samples.
    pub fn finish(&mut self, now: DateTime<Utc>) -> Session {
        self.status = RecorderStatus::Stopped;
        self.generation = self.generation.wrapping_add(1);
        Session {
            session_id: self.session_id.clone(),
            started_at: self.started_at,
            stopped_at: Some(now),
            samples: std::mem::take(&mut self.samples),
        }
    }

    /// Wall-clock timestamp, bumped past the previous sample so every sample
    /// of a recording gets its own store key.
    pub fn next_timestamp(&self, now_ms: i64) -> i64 {
        match self.last_timestamp_ms {
            Some(last) if now_ms <= last => last + 1,
            _ => now_ms,
        }
    }

    pub fn push(&mut self, sample: GazeSample) {
        if self.live.len() == self.live_capacity {
            self.live.pop_front();
        }
        self.live.push_back(sample.point());
        self.last_timestamp_ms = Some(sample.timestamp_ms);
        self.samples.push(sample);
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn live_points(&self) -> Vec<TimeSeriesPoint> {
        self.live.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ts: i64) -> GazeSample {
        GazeSample {
            session_id: "s".into(),
            timestamp_ms: ts,
            value: 0.0,
            sampling_rate: 30.0,
            device_label: "test".into(),
            calibration_params: [0.4, 0.5, 0.6],
        }
    }

    #[test]
    fn live_view_is_bounded_but_recording_is_not() {
        let mut state = RecorderState::new("s".into(), 3);
        state.begin("s".into(), Utc::now());
        for ts in 0..10 {
            state.push(sample(ts));
        }

        assert_eq!(state.sample_count(), 10);
        let live: Vec<f64> = state.live_points().iter().map(|p| p.timestamp).collect();
        assert_eq!(live, vec![7.0, 8.0, 9.0]);
    }

    #[test]
    fn timestamps_strictly_increase() {
        let mut state = RecorderState::new("s".into(), 10);
        assert_eq!(state.next_timestamp(500), 500);
        state.push(sample(500));
        assert_eq!(state.next_timestamp(500), 501);
        assert_eq!(state.next_timestamp(400), 501);
        assert_eq!(state.next_timestamp(600), 600);

        state.push(sample(501));
        assert_eq!(state.next_timestamp(400), 502);
    }

    #[test]
    fn pause_and_resume_only_from_matching_states() {
        let mut state = RecorderState::new("s".into(), 10);
        assert!(!state.resume());
        state.pause();
        assert_eq!(state.status, RecorderStatus::Idle);

        state.begin("s".into(), Utc::now());
        state.pause();
        assert_eq!(state.status, RecorderStatus::Paused);
        assert!(state.resume());
        assert!(state.is_recording());
    }

    #[test]
    fn finish_hands_over_samples_and_bumps_generation() {
        let mut state = RecorderState::new("s".into(), 10);
        state.begin("s".into(), Utc::now());
        let generation = state.generation;
        state.push(sample(1));

        let session = state.finish(Utc::now());
        assert_eq!(session.len(), 1);
        assert_eq!(state.sample_count(), 0);
        assert_eq!(state.status, RecorderStatus::Stopped);
        assert_ne!(state.generation, generation);
    }
}
