use crate::error::ProjectError;
use crate::ops::clip_ops::cut_clip_at;
use crate::types::media::AudioClip;
use crate::types::track::Channel;

use serde::{Deserialize, Serialize};

/// Channels and the clips placed on them.
///
/// Clips are kept in insertion order. Lookups that need time order sort a
/// copy; the stored order is what breaks ties between overlapping clips.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub channels: Vec<Channel>,
    pub clips: Vec<AudioClip>,
}

impl Timeline {
    pub fn new() -> Self {
        Timeline {
            channels: Vec::new(),
            clips: Vec::new(),
        }
    }

    pub fn add_channel(&mut self, channel: Channel) -> String {
        let id = channel.id.clone();
        self.channels.push(channel);
        id
    }

    /// Removes a channel together with every clip on it.
    pub fn remove_channel(&mut self, channel_id: &str) -> Option<Channel> {
        let idx = self.channels.iter().position(|c| c.id == channel_id)?;
        self.clips.retain(|clip| clip.channel_id != channel_id);
        Some(self.channels.remove(idx))
    }

    pub fn channel(&self, channel_id: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == channel_id)
    }

    pub fn channel_mut(&mut self, channel_id: &str) -> Option<&mut Channel> {
        self.channels.iter_mut().find(|c| c.id == channel_id)
    }

    /// The lane that drives playback: the first emcee channel, else the first.
    pub fn primary_channel(&self) -> Option<&Channel> {
        self.channels
            .iter()
            .find(|c| c.kind.is_primary())
            .or_else(|| self.channels.first())
    }

    pub fn add_clip(&mut self, clip: AudioClip) -> Result<(), ProjectError> {
        clip.validate()?;
        if self.channel(&clip.channel_id).is_none() {
            return Err(ProjectError::UnknownChannel(clip.channel_id));
        }
        self.clips.push(clip);
        Ok(())
    }

    pub fn remove_clip(&mut self, clip_id: &str) -> Option<AudioClip> {
        let idx = self.clips.iter().position(|c| c.id == clip_id)?;
        Some(self.clips.remove(idx))
    }

    /// Drops every clip generated for a segment. Returns how many were removed.
    pub fn remove_clips_for_segment(&mut self, segment_id: &str) -> usize {
        let before = self.clips.len();
        self.clips
            .retain(|clip| clip.segment_id.as_deref() != Some(segment_id));
        before - self.clips.len()
    }

    pub fn clip(&self, clip_id: &str) -> Option<&AudioClip> {
        self.clips.iter().find(|c| c.id == clip_id)
    }

    fn clip_mut(&mut self, clip_id: &str) -> Result<&mut AudioClip, ProjectError> {
        self.clips
            .iter_mut()
            .find(|c| c.id == clip_id)
            .ok_or_else(|| ProjectError::UnknownClip(clip_id.to_string()))
    }

    /// Clips on a channel ordered by start time. Clips with equal start
    /// times keep their stored order.
    pub fn clips_for_channel(&self, channel_id: &str) -> Vec<&AudioClip> {
        let mut clips: Vec<&AudioClip> = self
            .clips
            .iter()
            .filter(|clip| clip.channel_id == channel_id)
            .collect();
        clips.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        clips
    }

    /// The clip on `channel_id` playing at `time`.
    ///
    /// Overlapping clips are an authoring anomaly; the first match in stored
    /// order wins.
    pub fn clip_at(&self, channel_id: &str, time: f64) -> Option<&AudioClip> {
        self.clips
            .iter()
            .find(|clip| clip.channel_id == channel_id && clip.is_active_at(time))
    }

    /// All clips, on any channel, active at `time`.
    pub fn active_clips_at(&self, time: f64) -> Vec<&AudioClip> {
        self.clips
            .iter()
            .filter(|clip| clip.is_active_at(time))
            .collect()
    }

    /// All clips that overlap with a given time range.
    pub fn clips_in_range(&self, start: f64, end: f64) -> Vec<&AudioClip> {
        self.clips
            .iter()
            .filter(|clip| clip.overlaps(start, end))
            .collect()
    }

    /// End of the last clip.
    pub fn duration(&self) -> f64 {
        self.clips
            .iter()
            .map(AudioClip::end_time)
            .fold(0.0, f64::max)
    }

    pub fn any_solo(&self) -> bool {
        self.channels.iter().any(|c| c.solo)
    }

    /// Mix gain of a channel, taking mute and solo of every lane into account.
    pub fn channel_gain(&self, channel_id: &str) -> f32 {
        let any_solo = self.any_solo();
        self.channel(channel_id)
            .map(|c| c.effective_gain(any_solo))
            .unwrap_or(0.0)
    }

    pub fn move_clip(&mut self, clip_id: &str, new_start: f64) -> Result<(), ProjectError> {
        let clip = self.clip_mut(clip_id)?;
        clip.start_time = new_start.max(0.0);
        Ok(())
    }

    pub fn trim_clip(&mut self, clip_id: &str, new_duration: f64) -> Result<(), ProjectError> {
        let clip = self.clip_mut(clip_id)?;
        if !new_duration.is_finite() || new_duration <= 0.0 {
            return Err(ProjectError::InvalidClip {
                id: clip_id.to_string(),
                reason: "duration must be > 0".to_string(),
            });
        }
        clip.duration = new_duration;
        Ok(())
    }

    /// Splits the first clip found at the given playhead on the specified channel.
    /// Returns true if a split occurred, false otherwise.
    pub fn split_clip_at_playhead(&mut self, channel_id: &str, playhead: f64) -> bool {
        let Some(idx) = self
            .clips
            .iter()
            .position(|clip| clip.channel_id == channel_id && clip.is_active_at(playhead))
        else {
            return false;
        };
        match cut_clip_at(&self.clips[idx], playhead) {
            Some((left, right)) => {
                self.clips.remove(idx);
                self.clips.insert(idx, right);
                self.clips.insert(idx, left);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::track::TrackKind;

    fn clip(id: &str, channel_id: &str, start: f64, duration: f64) -> AudioClip {
        AudioClip {
            id: id.to_string(),
            channel_id: channel_id.to_string(),
            segment_id: None,
            start_time: start,
            duration,
            in_point: 0.0,
            audio_url: format!("https://cdn.example.com/{}.mp3", id),
            name: id.to_string(),
        }
    }

    fn timeline_with_voice() -> (Timeline, String) {
        let mut timeline = Timeline::new();
        let voice = timeline.add_channel(Channel::new("Voice", TrackKind::Emcee));
        (timeline, voice)
    }

    #[test]
    fn test_add_clip_requires_channel() {
        let (mut timeline, voice) = timeline_with_voice();
        assert!(timeline.add_clip(clip("a", &voice, 0.0, 2.0)).is_ok());
        assert!(matches!(
            timeline.add_clip(clip("b", "missing", 0.0, 2.0)),
            Err(ProjectError::UnknownChannel(_))
        ));
        assert!(matches!(
            timeline.add_clip(clip("c", &voice, 0.0, 0.0)),
            Err(ProjectError::InvalidClip { .. })
        ));
    }

    #[test]
    fn test_clips_for_channel_ordered_by_start() {
        let (mut timeline, voice) = timeline_with_voice();
        let music = timeline.add_channel(Channel::new("Music", TrackKind::Background));
        timeline.add_clip(clip("late", &voice, 6.0, 2.0)).unwrap();
        timeline.add_clip(clip("bed", &music, 0.0, 20.0)).unwrap();
        timeline.add_clip(clip("early", &voice, 1.0, 2.0)).unwrap();
        timeline.add_clip(clip("early-twin", &voice, 1.0, 1.0)).unwrap();

        let ids: Vec<&str> = timeline
            .clips_for_channel(&voice)
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["early", "early-twin", "late"]);
    }

    #[test]
    fn test_clip_at_overlap_prefers_stored_order() {
        let (mut timeline, voice) = timeline_with_voice();
        timeline.add_clip(clip("second-start", &voice, 2.0, 4.0)).unwrap();
        timeline.add_clip(clip("first-start", &voice, 0.0, 5.0)).unwrap();

        for _ in 0..3 {
            let hit = timeline.clip_at(&voice, 3.0).unwrap();
            assert_eq!(hit.id, "second-start");
        }
        assert_eq!(timeline.clip_at(&voice, 1.0).unwrap().id, "first-start");
        assert!(timeline.clip_at(&voice, 6.0).is_none());
    }

    #[test]
    fn test_clip_at_end_is_exclusive() {
        let (mut timeline, voice) = timeline_with_voice();
        timeline.add_clip(clip("a", &voice, 0.0, 2.0)).unwrap();
        timeline.add_clip(clip("b", &voice, 2.0, 2.0)).unwrap();
        assert_eq!(timeline.clip_at(&voice, 2.0).unwrap().id, "b");
    }

    #[test]
    fn test_clips_in_range_and_duration() {
        let (mut timeline, voice) = timeline_with_voice();
        timeline.add_clip(clip("a", &voice, 0.0, 10.0)).unwrap();
        timeline.add_clip(clip("b", &voice, 12.0, 3.0)).unwrap();

        assert_eq!(timeline.clips_in_range(5.0, 15.0).len(), 2);
        assert_eq!(timeline.clips_in_range(-5.0, 1.0).len(), 1);
        assert_eq!(timeline.clips_in_range(10.0, 12.0).len(), 0);
        assert_eq!(timeline.duration(), 15.0);
        assert_eq!(timeline.active_clips_at(13.0).len(), 1);
    }

    #[test]
    fn test_remove_channel_drops_its_clips() {
        let (mut timeline, voice) = timeline_with_voice();
        let music = timeline.add_channel(Channel::new("Music", TrackKind::Background));
        timeline.add_clip(clip("a", &voice, 0.0, 2.0)).unwrap();
        timeline.add_clip(clip("b", &music, 0.0, 2.0)).unwrap();

        assert!(timeline.remove_channel(&voice).is_some());
        assert_eq!(timeline.clips.len(), 1);
        assert_eq!(timeline.clips[0].id, "b");
        assert!(timeline.remove_channel(&voice).is_none());
    }

    #[test]
    fn test_remove_clips_for_segment() {
        let (mut timeline, voice) = timeline_with_voice();
        timeline
            .add_clip(clip("a", &voice, 0.0, 2.0).with_segment("seg-1"))
            .unwrap();
        timeline.add_clip(clip("b", &voice, 2.0, 2.0)).unwrap();
        assert_eq!(timeline.remove_clips_for_segment("seg-1"), 1);
        assert_eq!(timeline.clips.len(), 1);
    }

    #[test]
    fn test_move_and_trim() {
        let (mut timeline, voice) = timeline_with_voice();
        timeline.add_clip(clip("a", &voice, 3.0, 2.0)).unwrap();

        timeline.move_clip("a", -4.0).unwrap();
        assert_eq!(timeline.clip("a").unwrap().start_time, 0.0);

        timeline.trim_clip("a", 1.5).unwrap();
        assert_eq!(timeline.clip("a").unwrap().duration, 1.5);
        assert!(timeline.trim_clip("a", 0.0).is_err());
        assert!(matches!(
            timeline.move_clip("nope", 1.0),
            Err(ProjectError::UnknownClip(_))
        ));
    }

    #[test]
    fn test_split_clip_at_playhead() {
        let (mut timeline, voice) = timeline_with_voice();
        timeline.add_clip(clip("a1", &voice, 2.0, 8.0)).unwrap();

        assert!(timeline.split_clip_at_playhead(&voice, 6.0));
        assert_eq!(timeline.clips.len(), 2);
        assert_eq!(timeline.clips[0].id, "a1_left");
        assert_eq!(timeline.clips[0].duration, 4.0);
        assert_eq!(timeline.clips[1].id, "a1_right");
        assert_eq!(timeline.clips[1].start_time, 6.0);

        assert!(!timeline.split_clip_at_playhead(&voice, 2.0));
        assert!(!timeline.split_clip_at_playhead(&voice, 20.0));
    }

    #[test]
    fn test_channel_gain_respects_solo() {
        let (mut timeline, voice) = timeline_with_voice();
        let music = timeline.add_channel(Channel::new("Music", TrackKind::Background));
        timeline.channel_mut(&music).unwrap().set_volume(0.4);
        assert_eq!(timeline.channel_gain(&music), 0.4);

        timeline.channel_mut(&voice).unwrap().solo = true;
        assert_eq!(timeline.channel_gain(&music), 0.0);
        assert_eq!(timeline.channel_gain(&voice), 1.0);
        assert_eq!(timeline.channel_gain("missing"), 0.0);
    }

    #[test]
    fn test_primary_channel_prefers_emcee() {
        let mut timeline = Timeline::new();
        assert!(timeline.primary_channel().is_none());
        let music = timeline.add_channel(Channel::new("Music", TrackKind::Background));
        assert_eq!(timeline.primary_channel().map(|c| c.id.clone()), Some(music));
        let voice = timeline.add_channel(Channel::new("Voice", TrackKind::Emcee));
        assert_eq!(timeline.primary_channel().map(|c| c.id.clone()), Some(voice));
    }
}
