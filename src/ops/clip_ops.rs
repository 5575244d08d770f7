use crate::types::media::AudioClip;

/// Cuts a clip at the given playhead position, returning the two halves.
/// Returns None if the playhead is not strictly inside the clip.
pub fn cut_clip_at(clip: &AudioClip, playhead: f64) -> Option<(AudioClip, AudioClip)> {
    let clip_start = clip.start_time;
    let clip_end = clip.end_time();

    if playhead <= clip_start || playhead >= clip_end {
        return None;
    }

    let mut left = clip.clone();
    left.id = format!("{}_left", clip.id);
    left.duration = playhead - clip_start;

    let mut right = clip.clone();
    right.id = format!("{}_right", clip.id);
    right.start_time = playhead;
    right.duration = clip_end - playhead;
    right.in_point = clip.in_point + (playhead - clip_start);

    Some((left, right))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(start: f64, duration: f64) -> AudioClip {
        AudioClip {
            id: "ac1".to_string(),
            channel_id: "voice".to_string(),
            segment_id: Some("seg-1".to_string()),
            start_time: start,
            duration,
            in_point: 0.0,
            audio_url: "https://cdn.example.com/seg-1.mp3".to_string(),
            name: "Intro".to_string(),
        }
    }

    #[test]
    fn test_cut_clip_at_middle() {
        let (left, right) = cut_clip_at(&clip(2.0, 8.0), 6.0).unwrap();
        assert_eq!(left.id, "ac1_left");
        assert_eq!(right.id, "ac1_right");
        assert_eq!(left.start_time, 2.0);
        assert_eq!(left.duration, 4.0);
        assert_eq!(right.start_time, 6.0);
        assert_eq!(right.duration, 4.0);
        assert_eq!(left.in_point, 0.0);
        assert_eq!(right.in_point, 4.0);
        assert_eq!(left.channel_id, "voice");
        assert_eq!(right.segment_id.as_deref(), Some("seg-1"));
    }

    #[test]
    fn test_cut_already_offset_clip() {
        let mut source = clip(2.0, 8.0);
        source.in_point = 1.5;
        let (left, right) = cut_clip_at(&source, 5.0).unwrap();
        assert_eq!(left.in_point, 1.5);
        assert_eq!(left.out_point(), 4.5);
        assert_eq!(right.in_point, 4.5);
        assert_eq!(right.out_point(), source.out_point());
    }

    #[test]
    fn test_cut_clip_at_out_of_bounds() {
        let clip = clip(0.0, 10.0);
        assert!(cut_clip_at(&clip, -1.0).is_none());
        assert!(cut_clip_at(&clip, 0.0).is_none());
        assert!(cut_clip_at(&clip, 10.0).is_none());
        assert!(cut_clip_at(&clip, 12.0).is_none());
    }
}
