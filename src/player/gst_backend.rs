//! GStreamer `playbin` handles
//!
//! One playbin per handle. Local paths are turned into `file://` uris, http(s)
//! urls are handed to playbin unchanged. Bus messages are drained on every
//! `poll_event` call, so no GLib main loop is needed.

use gst::prelude::*;
use gstreamer as gst;
use gstreamer_pbutils as gst_pbutils;

use crate::error::{PlaybackError, PlaybackResult};
use crate::player::handle::{AudioBackend, AudioHandle, HandleEvent, PlayStart};

#[cfg(windows)]
fn path_to_file_uri(path: &str) -> String {
    let mut path = path.replace('\\', "/");
    if let Some(stripped) = path.strip_prefix("//?/") {
        path = stripped.to_string();
    }
    format!("file:///{}", path)
}

#[cfg(not(windows))]
fn path_to_file_uri(path: &str) -> String {
    format!("file://{}", path)
}

/// Uri playbin understands for `url`.
pub fn to_uri(url: &str) -> String {
    if url.contains("://") {
        url.to_string()
    } else {
        let abs = std::fs::canonicalize(url)
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|_| url.to_string());
        path_to_file_uri(&abs)
    }
}

/// Probe the length of an audio asset with the GStreamer discoverer.
pub fn probe_duration(url: &str) -> PlaybackResult<f64> {
    gst::init().map_err(|e| PlaybackError::Backend(e.to_string()))?;
    let uri = to_uri(url);
    let discoverer = gst_pbutils::Discoverer::new(gst::ClockTime::from_seconds(5))
        .map_err(|e| PlaybackError::Backend(e.to_string()))?;
    let info = discoverer
        .discover_uri(&uri)
        .map_err(|e| PlaybackError::Load {
            id: url.to_string(),
            reason: e.to_string(),
        })?;
    info.duration()
        .map(|d| d.seconds_f64())
        .ok_or_else(|| PlaybackError::Load {
            id: url.to_string(),
            reason: "unknown duration".to_string(),
        })
}

/// How long `GstHandle::new` blocks waiting for the pipeline to preroll.
const PREROLL_TIMEOUT_SECS: u64 = 5;

/// Whether a pause request has finished prerolling. `Async` means it is
/// still in progress.
fn prerolled(
    id: &str,
    result: Result<gst::StateChangeSuccess, gst::StateChangeError>,
) -> PlaybackResult<bool> {
    match result {
        Ok(gst::StateChangeSuccess::Async) => Ok(false),
        Ok(_) => Ok(true),
        Err(e) => Err(PlaybackError::Load {
            id: id.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn rate_changed(current: f64, requested: f64) -> bool {
    (current - requested).abs() > f64::EPSILON
}

/// Creates one playbin per registry id.
pub struct GstBackend;

impl GstBackend {
    pub fn new() -> PlaybackResult<Self> {
        gst::init().map_err(|e| PlaybackError::Backend(e.to_string()))?;
        Ok(Self)
    }
}

impl AudioBackend for GstBackend {
    fn create(&mut self, id: &str, url: &str) -> PlaybackResult<Box<dyn AudioHandle>> {
        Ok(Box::new(GstHandle::new(id, url)?))
    }
}

pub struct GstHandle {
    id: String,
    url: String,
    playbin: gst::Element,
    bus: gst::Bus,
    playing: bool,
    rate: f64,
    /// Seeks fail until the first preroll completes
    prerolled: bool,
    pending_seek: Option<gst::ClockTime>,
}

impl GstHandle {
    pub fn new(id: &str, url: &str) -> PlaybackResult<Self> {
        let playbin = gst::ElementFactory::make("playbin")
            .name(format!("rhyme-{}", id))
            .property("uri", to_uri(url))
            .build()
            .map_err(|e| PlaybackError::Backend(e.to_string()))?;
        let bus = playbin
            .bus()
            .ok_or_else(|| PlaybackError::Backend("playbin has no bus".to_string()))?;
        // Preroll so seeks and duration queries work before playback.
        let mut ready = prerolled(id, playbin.set_state(gst::State::Paused))?;
        if !ready {
            let (result, _, _) =
                playbin.state(Some(gst::ClockTime::from_seconds(PREROLL_TIMEOUT_SECS)));
            ready = prerolled(id, result)?;
        }
        log::debug!("GstHandle: created {} for {} (prerolled: {})", id, url, ready);
        Ok(Self {
            id: id.to_string(),
            url: url.to_string(),
            playbin,
            bus,
            playing: false,
            rate: 1.0,
            prerolled: ready,
            pending_seek: None,
        })
    }

    fn classify(&self, err: &gst::glib::Error, debug: Option<String>) -> PlaybackError {
        if err.matches(gst::ResourceError::NotAuthorized) {
            return PlaybackError::ExpiredUrl(self.id.clone());
        }
        let reason = match debug {
            Some(debug) => format!("{} ({})", err.message(), debug),
            None => err.message().to_string(),
        };
        PlaybackError::Load {
            id: self.id.clone(),
            reason,
        }
    }

    fn seek_with_rate(&mut self, position: gst::ClockTime, rate: f64) -> PlaybackResult<()> {
        if !self.prerolled {
            // Applied once the pipeline reports ASYNC_DONE.
            self.pending_seek = Some(position);
            return Ok(());
        }
        self.playbin
            .seek(
                rate,
                gst::SeekFlags::FLUSH | gst::SeekFlags::ACCURATE,
                gst::SeekType::Set,
                position,
                gst::SeekType::None,
                gst::ClockTime::NONE,
            )
            .map_err(|e| PlaybackError::Backend(e.to_string()))
    }
}

impl AudioHandle for GstHandle {
    fn source(&self) -> &str {
        &self.url
    }

    fn play(&mut self) -> PlaybackResult<PlayStart> {
        match self.playbin.set_state(gst::State::Playing) {
            Ok(gst::StateChangeSuccess::Async) => Ok(PlayStart::Pending),
            Ok(_) => {
                self.playing = true;
                Ok(PlayStart::Started)
            }
            Err(e) => Err(PlaybackError::Load {
                id: self.id.clone(),
                reason: e.to_string(),
            }),
        }
    }

    fn pause(&mut self) {
        if let Err(e) = self.playbin.set_state(gst::State::Paused) {
            log::warn!("GstHandle {}: pause failed: {}", self.id, e);
        }
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn current_time(&self) -> Option<f64> {
        self.playbin
            .query_position::<gst::ClockTime>()
            .map(|t| t.seconds_f64())
    }

    fn duration(&self) -> Option<f64> {
        self.playbin
            .query_duration::<gst::ClockTime>()
            .map(|t| t.seconds_f64())
    }

    fn seek(&mut self, time: f64) -> PlaybackResult<()> {
        let position = gst::ClockTime::from_seconds_f64(time.max(0.0));
        self.seek_with_rate(position, self.rate)
    }

    fn set_volume(&mut self, volume: f64) {
        self.playbin.set_property("volume", volume.clamp(0.0, 1.0));
    }

    fn set_rate(&mut self, rate: f64) -> PlaybackResult<()> {
        if !rate_changed(self.rate, rate) {
            return Ok(());
        }
        self.rate = rate;
        let position = self
            .playbin
            .query_position::<gst::ClockTime>()
            .unwrap_or(gst::ClockTime::ZERO);
        self.seek_with_rate(position, rate)
    }

    fn poll_event(&mut self) -> Option<HandleEvent> {
        while let Some(msg) = self.bus.pop() {
            use gst::MessageView;
            match msg.view() {
                MessageView::Eos(..) => {
                    self.playing = false;
                    return Some(HandleEvent::Ended);
                }
                MessageView::Error(err) => {
                    self.playing = false;
                    let error = self.classify(&err.error(), err.debug().map(|d| d.to_string()));
                    return Some(HandleEvent::Error(error));
                }
                MessageView::AsyncDone(..) if !self.prerolled => {
                    self.prerolled = true;
                    if let Some(position) = self.pending_seek.take() {
                        if let Err(e) = self.seek_with_rate(position, self.rate) {
                            log::warn!("GstHandle {}: deferred seek failed: {}", self.id, e);
                        }
                    }
                }
                MessageView::StateChanged(change) => {
                    let from_playbin = msg
                        .src()
                        .map(|src| src == self.playbin.upcast_ref::<gst::Object>())
                        .unwrap_or(false);
                    if from_playbin && change.current() == gst::State::Playing && !self.playing {
                        self.playing = true;
                        return Some(HandleEvent::Started);
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn dispose(&mut self) {
        self.playing = false;
        if let Err(e) = self.playbin.set_state(gst::State::Null) {
            log::warn!("GstHandle {}: failed to release pipeline: {}", self.id, e);
        }
    }
}

impl Drop for GstHandle {
    fn drop(&mut self) {
        let _ = self.playbin.set_state(gst::State::Null);
    }
}
