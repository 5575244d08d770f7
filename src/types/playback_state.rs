use serde::{Deserialize, Serialize};

/// Phase of the driving playback lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerPhase {
    /// No handle loaded, or the last one ended or failed
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
    /// Torn down; terminal
    Disposed,
}

/// Which transport layout the coordinator serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayerMode {
    #[default]
    Full,
    /// The editor's inline player, with shorter skips
    Compact,
}

/// Transport state read by every playback control.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportState {
    pub is_playing: bool,
    /// Seconds
    pub current_time: f64,
    /// 0 to 100
    pub volume: f64,
    pub playback_rate: f64,
    pub active_segment_id: Option<String>,
}

impl TransportState {
    pub fn new() -> Self {
        Self {
            is_playing: false,
            current_time: 0.0,
            volume: 100.0,
            playback_rate: 1.0,
            active_segment_id: None,
        }
    }

    /// Handle gain for the 0..=100 volume scale.
    pub fn gain(&self) -> f64 {
        self.volume / 100.0
    }
}

impl Default for TransportState {
    fn default() -> Self {
        Self::new()
    }
}
