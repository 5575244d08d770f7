use serde::{Deserialize, Serialize};

/// Audio generation lifecycle of a script segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStatus {
    #[default]
    Draft,
    Generating,
    Generated,
    Failed,
    /// Manually edited after generation; the previous audio is stale
    Editing,
}

impl SegmentStatus {
    pub fn can_transition_to(self, next: SegmentStatus) -> bool {
        use SegmentStatus::*;
        matches!(
            (self, next),
            (Draft, Generating)
                | (Generating, Generated)
                | (Generating, Failed)
                | (Generated, Editing)
                | (Editing, Generating)
                | (Failed, Generating)
        )
    }
}

/// An ordered unit of generated script content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    pub order: u32,
    pub content: String,
    pub audio_url: Option<String>,
    /// Storage key used to re-sign `audio_url` once it expires
    pub asset_key: Option<String>,
    /// Known audio length in seconds
    pub duration: Option<f64>,
    pub status: SegmentStatus,
}

impl Segment {
    pub fn new(id: impl Into<String>, order: u32, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            order,
            content: content.into(),
            audio_url: None,
            asset_key: None,
            duration: None,
            status: SegmentStatus::Draft,
        }
    }

    /// Url to play, only once audio generation has succeeded.
    pub fn playable_url(&self) -> Option<&str> {
        match self.status {
            SegmentStatus::Generated => self.audio_url.as_deref(),
            _ => None,
        }
    }

    /// Move to `next` if the lifecycle allows it.
    pub fn transition(&mut self, next: SegmentStatus) -> bool {
        if !self.status.can_transition_to(next) {
            log::warn!(
                "Segment {}: rejected status change {:?} -> {:?}",
                self.id,
                self.status,
                next
            );
            return false;
        }
        self.status = next;
        true
    }

    pub fn mark_generated(&mut self, audio_url: String, duration: Option<f64>) -> bool {
        if !self.transition(SegmentStatus::Generated) {
            return false;
        }
        self.audio_url = Some(audio_url);
        self.duration = duration;
        true
    }

    /// A manual edit invalidates the generated audio.
    pub fn edit(&mut self, content: impl Into<String>) -> bool {
        if !self.transition(SegmentStatus::Editing) {
            return false;
        }
        self.content = content.into();
        self.audio_url = None;
        self.duration = None;
        true
    }
}
