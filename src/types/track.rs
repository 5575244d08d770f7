use serde::{Deserialize, Serialize};

/// Role of a mixer lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    /// Synthesized emcee voice, the driving track
    Emcee,
    /// Music bed under the voice
    Background,
    Effects,
}

impl TrackKind {
    pub fn label(&self) -> &'static str {
        match self {
            TrackKind::Emcee => "Emcee",
            TrackKind::Background => "Background",
            TrackKind::Effects => "Effects",
        }
    }

    pub fn default_color(&self) -> [u8; 3] {
        match self {
            TrackKind::Emcee => [100, 180, 255],
            TrackKind::Background => [180, 255, 100],
            TrackKind::Effects => [255, 170, 80],
        }
    }

    /// Only the emcee lane drives the transport; the others are layered.
    pub fn is_primary(&self) -> bool {
        matches!(self, TrackKind::Emcee)
    }
}

/// A named mixer lane holding clips of one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub kind: TrackKind,
    /// 0.0 to 1.0
    pub volume: f32,
    /// -1.0 (left) to 1.0 (right)
    pub pan: f32,
    pub muted: bool,
    pub solo: bool,
    pub color: [u8; 3],
}

impl Channel {
    pub fn new(name: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            kind,
            volume: 1.0,
            pan: 0.0,
            muted: false,
            solo: false,
            color: kind.default_color(),
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn set_pan(&mut self, pan: f32) {
        self.pan = pan.clamp(-1.0, 1.0);
    }

    /// Gain this lane contributes to the mix. `any_solo` is whether some
    /// channel in the project is soloed.
    pub fn effective_gain(&self, any_solo: bool) -> f32 {
        if self.muted || (any_solo && !self.solo) {
            0.0
        } else {
            self.volume
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_and_pan_are_clamped() {
        let mut channel = Channel::new("Voice", TrackKind::Emcee);
        channel.set_volume(1.7);
        channel.set_pan(-3.0);
        assert_eq!(channel.volume, 1.0);
        assert_eq!(channel.pan, -1.0);
        channel.set_volume(-0.2);
        assert_eq!(channel.volume, 0.0);
    }

    #[test]
    fn test_effective_gain_with_mute_and_solo() {
        let mut voice = Channel::new("Voice", TrackKind::Emcee);
        let mut music = Channel::new("Music", TrackKind::Background);
        voice.set_volume(0.8);
        music.set_volume(0.5);

        assert_eq!(voice.effective_gain(false), 0.8);

        voice.solo = true;
        assert_eq!(voice.effective_gain(true), 0.8);
        assert_eq!(music.effective_gain(true), 0.0);

        voice.muted = true;
        assert_eq!(voice.effective_gain(true), 0.0);
    }

    #[test]
    fn test_track_kind_serializes_lowercase() {
        let json = serde_json::to_string(&TrackKind::Background).unwrap();
        assert_eq!(json, "\"background\"");
        let kind: TrackKind = serde_json::from_str("\"emcee\"").unwrap();
        assert!(kind.is_primary());
    }
}
