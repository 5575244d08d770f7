use serde::{Deserialize, Serialize};

use crate::error::ProjectError;

/// A time-positioned reference to one audio asset on a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioClip {
    pub id: String,
    pub channel_id: String,
    /// Script segment this audio was generated for, if any
    pub segment_id: Option<String>,
    pub start_time: f64,
    pub duration: f64,
    /// Seconds into the source audio where the clip begins
    #[serde(default)]
    pub in_point: f64,
    pub audio_url: String,
    pub name: String,
}

impl AudioClip {
    pub fn new(
        channel_id: impl Into<String>,
        audio_url: impl Into<String>,
        start_time: f64,
        duration: f64,
    ) -> Result<Self, ProjectError> {
        let clip = Self {
            id: uuid::Uuid::new_v4().to_string(),
            channel_id: channel_id.into(),
            segment_id: None,
            start_time,
            duration,
            in_point: 0.0,
            audio_url: audio_url.into(),
            name: String::new(),
        };
        clip.validate()?;
        Ok(clip)
    }

    pub fn with_segment(mut self, segment_id: impl Into<String>) -> Self {
        self.segment_id = Some(segment_id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_in_point(mut self, in_point: f64) -> Self {
        self.in_point = in_point;
        self
    }

    /// Source position where the clip stops playing.
    pub fn out_point(&self) -> f64 {
        self.in_point + self.duration
    }

    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Half-open: a clip is active from its start up to, not including, its end.
    pub fn is_active_at(&self, time: f64) -> bool {
        time >= self.start_time && time < self.end_time()
    }

    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        self.end_time() > start && self.start_time < end
    }

    pub fn validate(&self) -> Result<(), ProjectError> {
        let invalid = |reason: &str| ProjectError::InvalidClip {
            id: self.id.clone(),
            reason: reason.to_string(),
        };
        if !self.start_time.is_finite() || self.start_time < 0.0 {
            return Err(invalid("start time must be >= 0"));
        }
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(invalid("duration must be > 0"));
        }
        if !self.in_point.is_finite() || self.in_point < 0.0 {
            return Err(invalid("in point must be >= 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clip_rejects_bad_times() {
        assert!(AudioClip::new("ch", "a.mp3", -1.0, 2.0).is_err());
        assert!(AudioClip::new("ch", "a.mp3", 0.0, 0.0).is_err());
        assert!(AudioClip::new("ch", "a.mp3", 0.0, f64::NAN).is_err());
        assert!(AudioClip::new("ch", "a.mp3", 0.0, 2.0).is_ok());
        let clip = AudioClip::new("ch", "a.mp3", 0.0, 2.0).unwrap();
        assert!(clip.with_in_point(-0.5).validate().is_err());
    }

    #[test]
    fn test_active_interval_is_half_open() {
        let clip = AudioClip::new("ch", "a.mp3", 2.0, 3.0).unwrap();
        assert!(!clip.is_active_at(1.99));
        assert!(clip.is_active_at(2.0));
        assert!(clip.is_active_at(4.99));
        assert!(!clip.is_active_at(5.0));
    }
}
