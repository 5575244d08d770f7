use crate::error::ProjectError;
use crate::types::media::AudioClip;
use crate::types::segment::{Segment, SegmentStatus};
use crate::types::timeline::Timeline;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// An emcee presentation: the script segments and the multi-track timeline
/// built from their audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Unix seconds
    pub created_at: u64,
    pub last_modified: u64,
    pub segments: Vec<Segment>,
    pub timeline: Timeline,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        let now = unix_now();
        Project {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            created_at: now,
            last_modified: now,
            segments: Vec::new(),
            timeline: Timeline::new(),
        }
    }

    /// Save the project to a JSON file at the given path.
    pub fn save_to_file(&mut self, path: &Path) -> Result<(), ProjectError> {
        self.last_modified = unix_now();
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        log::info!("Saved project {:?} to {:?}", self.name, path);
        Ok(())
    }

    /// Load a project from a JSON file at the given path.
    ///
    /// Every clip is validated; a file with an orphaned or malformed clip is
    /// rejected rather than loaded half-broken.
    pub fn load_from_file(path: &Path) -> Result<Project, ProjectError> {
        let reader = BufReader::new(File::open(path)?);
        let project: Project = serde_json::from_reader(reader)?;
        for clip in &project.timeline.clips {
            clip.validate()?;
            if project.timeline.channel(&clip.channel_id).is_none() {
                return Err(ProjectError::UnknownChannel(clip.channel_id.clone()));
            }
        }
        log::info!(
            "Loaded project {:?}: {} segments, {} channels, {} clips",
            project.name,
            project.segments.len(),
            project.timeline.channels.len(),
            project.timeline.clips.len()
        );
        Ok(project)
    }

    pub fn segment(&self, segment_id: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == segment_id)
    }

    pub fn segment_mut(&mut self, segment_id: &str) -> Option<&mut Segment> {
        self.segments.iter_mut().find(|s| s.id == segment_id)
    }

    /// Segments in script order.
    pub fn ordered_segments(&self) -> Vec<Segment> {
        let mut segments = self.segments.clone();
        segments.sort_by_key(|s| s.order);
        segments
    }

    /// Removes a segment and every clip generated from it.
    pub fn remove_segment(&mut self, segment_id: &str) -> Option<Segment> {
        let idx = self.segments.iter().position(|s| s.id == segment_id)?;
        self.timeline.remove_clips_for_segment(segment_id);
        Some(self.segments.remove(idx))
    }

    /// Rewrites a segment's script. Its generated audio is stale afterwards,
    /// so clips placed from it are removed. Returns the number of removed clips.
    pub fn edit_segment(&mut self, segment_id: &str, content: &str) -> Result<usize, ProjectError> {
        let segment = self
            .segment_mut(segment_id)
            .ok_or_else(|| ProjectError::UnknownSegment(segment_id.to_string()))?;
        if segment.content == content {
            return Ok(0);
        }
        match segment.status {
            SegmentStatus::Generated => {
                segment.edit(content);
                Ok(self.timeline.remove_clips_for_segment(segment_id))
            }
            SegmentStatus::Generating => Err(ProjectError::InvalidSegmentState {
                id: segment_id.to_string(),
                status: segment.status,
            }),
            _ => {
                segment.content = content.to_string();
                Ok(0)
            }
        }
    }

    /// Attaches externally produced audio to a segment, running it through
    /// the generation lifecycle.
    pub fn attach_audio(
        &mut self,
        segment_id: &str,
        audio_url: String,
        duration: f64,
    ) -> Result<(), ProjectError> {
        let segment = self
            .segment_mut(segment_id)
            .ok_or_else(|| ProjectError::UnknownSegment(segment_id.to_string()))?;
        if segment.status != SegmentStatus::Generating
            && !segment.transition(SegmentStatus::Generating)
        {
            return Err(ProjectError::InvalidSegmentState {
                id: segment_id.to_string(),
                status: segment.status,
            });
        }
        segment.asset_key = None;
        segment.mark_generated(audio_url, Some(duration));
        Ok(())
    }

    /// Places a generated segment's audio on a channel as a new clip.
    pub fn place_segment(
        &mut self,
        segment_id: &str,
        channel_id: &str,
        start_time: f64,
    ) -> Result<String, ProjectError> {
        let segment = self
            .segment(segment_id)
            .ok_or_else(|| ProjectError::UnknownSegment(segment_id.to_string()))?;
        let (Some(url), Some(duration)) = (segment.playable_url(), segment.duration) else {
            return Err(ProjectError::InvalidClip {
                id: segment_id.to_string(),
                reason: "segment has no generated audio".to_string(),
            });
        };
        let clip = AudioClip::new(channel_id, url, start_time, duration)?
            .with_segment(segment_id)
            .with_name(format!("Segment {}", segment.order + 1));
        let clip_id = clip.id.clone();
        self.timeline.add_clip(clip)?;
        Ok(clip_id)
    }
}
