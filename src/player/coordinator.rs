//! Playback coordinator
//!
//! The single object the UI talks to. It owns the transport state, drives
//! the registry by id and turns media failures into notices. User actions
//! are applied synchronously; `tick` only reads handle telemetry and never
//! overrides a user action from the same poll window.
//!
//! ```text
//! Idle --play--> Loading --started--> Playing <--pause/play--> Paused
//!                                        |
//!                                      ended --> Idle --(delay)--> Loading(next)
//! any --dispose--> Disposed
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

use crate::config::PlayerConfig;
use crate::error::PlaybackError;
use crate::player::handle::{AudioBackend, HandleEvent, PlaySettings};
use crate::player::registry::AudioRegistry;
use crate::player::resolver::{SignedUrlCache, UrlResolver};
use crate::types::media::AudioClip;
use crate::types::playback_state::{PlayerMode, PlayerPhase, TransportState};
use crate::types::segment::Segment;

/// Called with the id of the segment about to auto-play.
pub type NextSegmentCallback = Box<dyn FnMut(&str)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Informational failure the user can close
    Dismissible,
    /// Playback needs a user gesture first; shown once per coordinator
    InteractionPrompt,
    /// Failure with an explicit "Refresh" affordance
    Retryable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub id: u64,
    /// Segment or clip the notice is about
    pub target: Option<String>,
    pub kind: NoticeKind,
    pub message: String,
}

/// The driving source currently loaded.
#[derive(Debug, Clone)]
struct Binding {
    id: String,
    url: String,
    asset_key: Option<String>,
    /// Length known before the handle reports one
    duration_hint: Option<f64>,
    /// Source position that maps to transport time 0
    offset: f64,
    /// Playback stops at `offset + duration_hint` instead of the end of the source
    fixed_length: bool,
    /// Channel gain applied under the master volume
    gain: f64,
}

/// An auxiliary track following the transport.
#[derive(Debug, Clone, Copy)]
struct Layer {
    gain: f64,
    /// Layer source position minus transport time
    shift: f64,
}

/// Positions this close to a clip's out point count as its end.
const END_EPSILON: f64 = 1e-3;

pub struct PlaybackCoordinator {
    config: PlayerConfig,
    mode: PlayerMode,
    registry: AudioRegistry,
    errors: Rc<RefCell<Vec<(String, PlaybackError)>>>,
    urls: Option<SignedUrlCache>,

    transport: TransportState,
    phase: PlayerPhase,
    binding: Option<Binding>,
    duration: Option<f64>,

    segments: Vec<Segment>,
    on_next_segment: Option<NextSegmentCallback>,
    /// Segment to load and when
    pending_advance: Option<(String, Instant)>,
    advanced_from: Option<String>,

    loading_since: Option<Instant>,
    last_user_action: Option<Instant>,
    refresh_attempted: bool,

    layers: HashMap<String, Layer>,

    notices: Vec<Notice>,
    next_notice_id: u64,
    autoplay_prompted: bool,
}

impl PlaybackCoordinator {
    pub fn new(backend: Box<dyn AudioBackend>, config: PlayerConfig) -> Self {
        let config = config.or_default_if_invalid();
        let errors: Rc<RefCell<Vec<(String, PlaybackError)>>> = Rc::new(RefCell::new(Vec::new()));
        let mut registry = AudioRegistry::new(backend);
        let sink = errors.clone();
        registry.set_on_error(Box::new(move |id, err| {
            sink.borrow_mut().push((id.to_string(), err.clone()));
        }));

        Self {
            config,
            mode: PlayerMode::Full,
            registry,
            errors,
            urls: None,
            transport: TransportState::new(),
            phase: PlayerPhase::Idle,
            binding: None,
            duration: None,
            segments: Vec::new(),
            on_next_segment: None,
            pending_advance: None,
            advanced_from: None,
            loading_since: None,
            last_user_action: None,
            refresh_attempted: false,
            layers: HashMap::new(),
            notices: Vec::new(),
            next_notice_id: 0,
            autoplay_prompted: false,
        }
    }

    /// Enables signed url resolution for segments with an asset key.
    pub fn with_resolver(mut self, resolver: Box<dyn UrlResolver>) -> Self {
        self.urls = Some(SignedUrlCache::new(
            resolver,
            self.config.signed_url_ttl(),
            self.config.url_cache_capacity,
        ));
        self
    }

    pub fn with_mode(mut self, mode: PlayerMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn set_on_next_segment(&mut self, callback: NextSegmentCallback) {
        self.on_next_segment = Some(callback);
    }

    pub fn transport(&self) -> &TransportState {
        &self.transport
    }

    pub fn phase(&self) -> PlayerPhase {
        self.phase
    }

    pub fn mode(&self) -> PlayerMode {
        self.mode
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn bound_id(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.id.as_str())
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn dismiss_notice(&mut self, notice_id: u64) {
        self.notices.retain(|n| n.id != notice_id);
    }

    pub fn is_disposed(&self) -> bool {
        self.phase == PlayerPhase::Disposed
    }

    pub fn is_layer_playing(&self, id: &str) -> bool {
        self.layers.contains_key(id) && self.registry.is_playing(id)
    }

    /// Whether `id` is layered on the transport, playing or held.
    pub fn has_layer(&self, id: &str) -> bool {
        self.layers.contains_key(id)
    }

    /// Replaces the segment list used for lookup and auto-advance.
    pub fn bind_segments(&mut self, mut segments: Vec<Segment>) {
        if self.is_disposed() {
            return;
        }
        segments.sort_by_key(|s| s.order);
        self.segments = segments;
    }

    fn notify(&mut self, target: Option<&str>, kind: NoticeKind, message: String) {
        // Repeated failures of the same target replace the previous notice.
        self.notices
            .retain(|n| !(n.kind == kind && n.target.as_deref() == target));
        self.next_notice_id += 1;
        self.notices.push(Notice {
            id: self.next_notice_id,
            target: target.map(str::to_string),
            kind,
            message,
        });
    }

    fn clamp_time(&self, time: f64) -> f64 {
        let time = if time.is_finite() { time.max(0.0) } else { 0.0 };
        match self.duration {
            Some(duration) if duration > 0.0 => time.min(duration),
            _ => time,
        }
    }

    fn settings(&self, start_at: Option<f64>) -> PlaySettings {
        let (gain, offset) = self
            .binding
            .as_ref()
            .map(|b| (b.gain, b.offset))
            .unwrap_or((1.0, 0.0));
        PlaySettings {
            volume: Some(gain * self.transport.gain()),
            rate: Some(self.transport.playback_rate),
            start_at: start_at.map(|t| t + offset),
        }
    }

    fn binding_offset(&self) -> f64 {
        self.binding.as_ref().map(|b| b.offset).unwrap_or(0.0)
    }

    /// Transport time of the bound handle, if it reports one.
    fn handle_time(&self, id: &str) -> Option<f64> {
        self.registry
            .current_time(id)
            .map(|t| t - self.binding_offset())
    }

    fn is_bound(&self, id: &str) -> bool {
        self.bound_id() == Some(id)
    }

    /// Loads and plays segment `id` from the start.
    ///
    /// Rejected while that segment is still loading. Returns whether a start
    /// was issued; failures become notices.
    pub fn play_segment(&mut self, id: &str) -> bool {
        if self.is_disposed() {
            return false;
        }
        if self.is_bound(id) && self.phase == PlayerPhase::Loading {
            log::debug!("PlaybackCoordinator: {} is already loading", id);
            return false;
        }
        let Some(segment) = self.segments.iter().find(|s| s.id == id).cloned() else {
            self.notify(Some(id), NoticeKind::Dismissible, format!("Unknown segment {}", id));
            return false;
        };
        let Some(direct_url) = segment.playable_url().map(str::to_string) else {
            self.notify(
                Some(id),
                NoticeKind::Dismissible,
                "This segment has no generated audio yet".to_string(),
            );
            return false;
        };

        let resolved = match (&segment.asset_key, self.urls.as_mut()) {
            (Some(key), Some(urls)) => Some(urls.resolve(key, Instant::now())),
            _ => None,
        };
        let url = match resolved {
            Some(Ok(url)) => url,
            Some(Err(err)) => {
                self.notify(Some(id), NoticeKind::Retryable, err.to_string());
                return false;
            }
            None => direct_url,
        };

        self.bind(Binding {
            id: segment.id.clone(),
            url,
            asset_key: segment.asset_key.clone(),
            duration_hint: segment.duration,
            offset: 0.0,
            fixed_length: false,
            gain: 1.0,
        });
        self.transport.active_segment_id = Some(segment.id);
        self.start(Some(0.0))
    }

    /// Loads and plays a timeline clip as the driving source.
    ///
    /// Transport time 0 is the clip's in point and playback ends at its out
    /// point. `gain` is the clip's channel gain.
    pub fn load_clip(&mut self, clip: &AudioClip, gain: f64) -> bool {
        if self.is_disposed() {
            return false;
        }
        if self.is_bound(&clip.id) && self.phase == PlayerPhase::Loading {
            return false;
        }
        self.bind(Binding {
            id: clip.id.clone(),
            url: clip.audio_url.clone(),
            asset_key: None,
            duration_hint: Some(clip.duration),
            offset: clip.in_point,
            fixed_length: true,
            gain: if gain.is_finite() { gain.clamp(0.0, 1.0) } else { 1.0 },
        });
        self.transport.active_segment_id = clip.segment_id.clone();
        self.start(Some(0.0))
    }

    fn bind(&mut self, binding: Binding) {
        if let Some(previous) = self.binding.take() {
            if previous.id != binding.id {
                self.registry.pause(&previous.id);
                // Layers were aligned to the previous source's clock.
                self.stop_layers();
            }
        }
        log::debug!("PlaybackCoordinator: binding {} to {}", binding.id, binding.url);
        self.pending_advance = None;
        self.advanced_from = None;
        self.refresh_attempted = false;
        self.duration = binding.duration_hint;
        self.transport.current_time = 0.0;
        self.binding = Some(binding);
    }

    fn start(&mut self, start_at: Option<f64>) -> bool {
        let Some(binding) = self.binding.clone() else {
            return false;
        };
        let settings = self.settings(start_at);
        let accepted = self.registry.play(&binding.id, Some(&binding.url), Some(settings));
        if accepted {
            if let Some(start_at) = start_at {
                self.transport.current_time = start_at;
            }
            if self.registry.is_loading(&binding.id) {
                self.phase = PlayerPhase::Loading;
                self.loading_since = Some(Instant::now());
                self.transport.is_playing = false;
            } else {
                self.enter_playing();
            }
            if !binding.fixed_length {
                if let Some(duration) = self.registry.duration(&binding.id) {
                    self.duration = Some(duration);
                }
            }
        }
        self.drain_errors();
        accepted && self.phase != PlayerPhase::Idle
    }

    fn enter_playing(&mut self) {
        self.phase = PlayerPhase::Playing;
        self.loading_since = None;
        self.transport.is_playing = true;
        self.resume_layers();
    }

    fn enter_idle(&mut self) {
        self.phase = PlayerPhase::Idle;
        self.loading_since = None;
        self.transport.is_playing = false;
        self.pause_layers();
    }

    fn layer_position(&self, layer: &Layer) -> f64 {
        (self.transport.current_time + layer.shift).max(0.0)
    }

    fn resume_layers(&mut self) {
        let layers: Vec<(String, Layer)> =
            self.layers.iter().map(|(id, l)| (id.clone(), *l)).collect();
        for (id, layer) in layers {
            let settings = PlaySettings {
                volume: Some(layer.gain * self.transport.gain()),
                rate: Some(self.transport.playback_rate),
                start_at: Some(self.layer_position(&layer)),
            };
            self.registry.play(&id, None, Some(settings));
        }
    }

    fn pause_layers(&mut self) {
        for id in self.layers.keys() {
            self.registry.pause(id);
        }
    }

    fn stop_layers(&mut self) {
        for (id, _) in self.layers.drain() {
            self.registry.remove(&id);
        }
    }

    /// Playing <-> Paused for the bound source. Idle with a bound source
    /// starts it again. No-op with nothing bound or while loading.
    pub fn toggle_play(&mut self) -> bool {
        if self.is_disposed() {
            return false;
        }
        let Some(id) = self.bound_id().map(str::to_string) else {
            return false;
        };
        self.last_user_action = Some(Instant::now());
        self.refresh_attempted = false;
        match self.phase {
            PlayerPhase::Playing => {
                if let Some(time) = self.handle_time(&id) {
                    self.transport.current_time = self.clamp_time(time);
                }
                self.registry.pause(&id);
                self.pause_layers();
                self.phase = PlayerPhase::Paused;
                self.transport.is_playing = false;
                true
            }
            PlayerPhase::Paused => self.start(Some(self.transport.current_time)),
            PlayerPhase::Idle => {
                let at_end = self
                    .duration
                    .is_some_and(|d| self.transport.current_time >= d);
                let from = if at_end { 0.0 } else { self.transport.current_time };
                self.start(Some(from))
            }
            PlayerPhase::Loading | PlayerPhase::Disposed => false,
        }
    }

    /// Moves the playhead. The visible time updates immediately, before the
    /// handle confirms.
    pub fn seek(&mut self, time: f64) {
        if self.is_disposed() {
            return;
        }
        let time = self.clamp_time(time);
        self.transport.current_time = time;
        self.last_user_action = Some(Instant::now());
        if let Some(id) = self.bound_id().map(str::to_string) {
            self.registry.seek(&id, time + self.binding_offset());
        }
        let layers: Vec<(String, Layer)> =
            self.layers.iter().map(|(id, l)| (id.clone(), *l)).collect();
        for (id, layer) in layers {
            let position = self.layer_position(&layer);
            self.registry.seek(&id, position);
        }
        self.drain_errors();
    }

    fn skip_offset(&self) -> f64 {
        match self.mode {
            PlayerMode::Full => self.config.skip_full_secs,
            PlayerMode::Compact => self.config.skip_compact_secs,
        }
    }

    pub fn skip_forward(&mut self) {
        self.seek(self.transport.current_time + self.skip_offset());
    }

    pub fn skip_backward(&mut self) {
        self.seek(self.transport.current_time - self.skip_offset());
    }

    /// Master volume on the 0..=100 scale.
    pub fn set_volume(&mut self, volume: f64) {
        if self.is_disposed() || !volume.is_finite() {
            return;
        }
        self.transport.volume = volume.clamp(0.0, 100.0);
        let master = self.transport.gain();
        if let Some(binding) = &self.binding {
            self.registry.set_volume(&binding.id, binding.gain * master);
        }
        for (id, layer) in &self.layers {
            self.registry.set_volume(id, layer.gain * master);
        }
    }

    /// Channel gain of the bound source or of a layer, under the master
    /// volume. Returns false for unknown ids.
    pub fn set_gain(&mut self, id: &str, gain: f64) -> bool {
        if self.is_disposed() || !gain.is_finite() {
            return false;
        }
        let gain = gain.clamp(0.0, 1.0);
        let master = self.transport.gain();
        if let Some(binding) = self.binding.as_mut().filter(|b| b.id == id) {
            binding.gain = gain;
        } else if let Some(layer) = self.layers.get_mut(id) {
            layer.gain = gain;
        } else {
            return false;
        }
        self.registry.set_volume(id, gain * master);
        true
    }

    pub fn set_playback_rate(&mut self, rate: f64) {
        if self.is_disposed() || !rate.is_finite() {
            return;
        }
        self.transport.playback_rate =
            rate.clamp(self.config.min_playback_rate, self.config.max_playback_rate);
        let rate = self.transport.playback_rate;
        let ids: Vec<String> = self
            .bound_id()
            .map(str::to_string)
            .into_iter()
            .chain(self.layers.keys().cloned())
            .collect();
        for id in ids {
            self.registry.set_rate(&id, rate);
        }
        self.drain_errors();
    }

    /// Re-signs the url of `id` and rebinds its handle, keeping position and
    /// resuming if it was playing.
    pub fn refresh_url(&mut self, id: &str) -> bool {
        if self.is_disposed() {
            return false;
        }
        let asset_key = match &self.binding {
            Some(binding) if binding.id == id => binding.asset_key.clone(),
            _ => self
                .segments
                .iter()
                .find(|s| s.id == id)
                .and_then(|s| s.asset_key.clone()),
        };
        let Some(asset_key) = asset_key else {
            self.notify(
                Some(id),
                NoticeKind::Dismissible,
                "This audio has no storage key to refresh".to_string(),
            );
            return false;
        };
        let Some(urls) = self.urls.as_mut() else {
            self.notify(
                Some(id),
                NoticeKind::Retryable,
                "No url resolver configured".to_string(),
            );
            return false;
        };
        let url = match urls.refresh(&asset_key, Instant::now()) {
            Ok(url) => url,
            Err(err) => {
                self.notify(Some(id), NoticeKind::Retryable, err.to_string());
                return false;
            }
        };

        // Only the bound source needs rebinding; others re-sign on next play.
        let Some(binding) = self.binding.as_mut().filter(|b| b.id == id) else {
            return true;
        };
        binding.url = url.clone();
        self.notices
            .retain(|n| !(n.kind == NoticeKind::Retryable && n.target.as_deref() == Some(id)));

        let position = self
            .handle_time(id)
            .filter(|t| *t > 0.0)
            .unwrap_or(self.transport.current_time);
        log::info!("PlaybackCoordinator: refreshed url of {} at {:.2}s", id, position);

        match self.phase {
            PlayerPhase::Playing | PlayerPhase::Loading => self.start(Some(position)),
            _ => {
                // A handle not created yet picks the new url up on next play.
                if self.registry.contains(id) && self.registry.get_or_create(id, &url) {
                    self.registry.seek(id, position + self.binding_offset());
                }
                self.transport.current_time = position;
                self.drain_errors();
                true
            }
        }
    }

    /// Layers an auxiliary track on top of the driving source, at source
    /// position `position` for the current transport time.
    ///
    /// The layer then follows the transport: it pauses, resumes, seeks and
    /// changes rate with it. While a bound source is not playing the layer
    /// is held until playback starts. With nothing bound it plays at once.
    pub fn play_layer(&mut self, id: &str, url: &str, gain: f64, position: f64) -> bool {
        if self.is_disposed() || self.is_bound(id) || !position.is_finite() {
            return false;
        }
        let layer = Layer {
            gain: if gain.is_finite() { gain.clamp(0.0, 1.0) } else { 1.0 },
            shift: position.max(0.0) - self.transport.current_time,
        };
        let held = self.binding.is_some() && self.phase != PlayerPhase::Playing;
        let accepted = if held {
            let created = self.registry.get_or_create(id, url);
            if created {
                self.registry.seek(id, position.max(0.0));
            }
            created
        } else {
            let settings = PlaySettings {
                volume: Some(layer.gain * self.transport.gain()),
                rate: Some(self.transport.playback_rate),
                start_at: Some(position.max(0.0)),
            };
            self.registry.play(id, Some(url), Some(settings))
        };
        if accepted {
            self.layers.insert(id.to_string(), layer);
        }
        self.drain_errors();
        accepted
    }

    pub fn stop_layer(&mut self, id: &str) {
        if self.layers.remove(id).is_some() {
            self.registry.remove(id);
        }
    }

    fn next_playable_after(&self, id: &str) -> Option<String> {
        let idx = self.segments.iter().position(|s| s.id == id)?;
        self.segments[idx + 1..]
            .iter()
            .find(|s| s.playable_url().is_some())
            .map(|s| s.id.clone())
    }

    fn handle_error(&mut self, id: &str, err: PlaybackError) {
        if !err.is_user_facing() {
            log::debug!("PlaybackCoordinator: ignoring {}", err);
            return;
        }
        if self.layers.remove(id).is_some() {
            self.registry.remove(id);
            self.notify(Some(id), NoticeKind::Dismissible, err.to_string());
            return;
        }
        if !self.is_bound(id) {
            log::debug!("PlaybackCoordinator: stale error from {}: {}", id, err);
            return;
        }
        match err {
            PlaybackError::AutoplayBlocked => {
                self.phase = PlayerPhase::Paused;
                self.loading_since = None;
                self.transport.is_playing = false;
                self.pause_layers();
                if !self.autoplay_prompted {
                    self.autoplay_prompted = true;
                    self.notify(
                        Some(id),
                        NoticeKind::InteractionPrompt,
                        "Click play to allow audio playback".to_string(),
                    );
                }
            }
            PlaybackError::ExpiredUrl(_) if !self.refresh_attempted => {
                // One automatic re-sign; further retries are the user's call.
                self.refresh_attempted = true;
                if !self.refresh_url(id) {
                    log::warn!("PlaybackCoordinator: automatic refresh of {} failed", id);
                    self.enter_idle();
                }
            }
            PlaybackError::ExpiredUrl(_) | PlaybackError::LoadTimeout(_) => {
                self.enter_idle();
                self.notify(Some(id), NoticeKind::Retryable, err.to_string());
            }
            _ => {
                self.enter_idle();
                self.notify(Some(id), NoticeKind::Dismissible, err.to_string());
            }
        }
    }

    fn drain_errors(&mut self) {
        loop {
            let errors = std::mem::take(&mut *self.errors.borrow_mut());
            if errors.is_empty() {
                break;
            }
            for (id, err) in errors {
                self.handle_error(&id, err);
            }
        }
    }

    /// Poll-driven update: handle events, load timeout, auto-advance and
    /// playhead telemetry.
    pub fn tick(&mut self, now: Instant) {
        if self.is_disposed() {
            return;
        }

        for (id, event) in self.registry.poll() {
            match event {
                HandleEvent::Started if self.is_bound(&id) => {
                    self.refresh_attempted = false;
                    if self.phase == PlayerPhase::Loading {
                        self.enter_playing();
                    }
                }
                HandleEvent::Ended if self.is_bound(&id) => self.on_ended(&id, now),
                HandleEvent::Ended if self.layers.contains_key(&id) => self.stop_layer(&id),
                // Errors reach us through the registry callback.
                _ => {}
            }
        }
        self.drain_errors();

        if let (PlayerPhase::Loading, Some(since)) = (self.phase, self.loading_since) {
            if now.saturating_duration_since(since) >= self.config.load_timeout() {
                if let Some(id) = self.bound_id().map(str::to_string) {
                    self.registry.pause(&id);
                    self.handle_error(&id, PlaybackError::LoadTimeout(id.clone()));
                }
            }
        }

        if let Some((next, due)) = self.pending_advance.clone() {
            if now >= due {
                self.pending_advance = None;
                log::info!("PlaybackCoordinator: advancing to {}", next);
                if let Some(callback) = self.on_next_segment.as_mut() {
                    callback(&next);
                }
                self.play_segment(&next);
            }
        }

        self.check_out_point(now);
        self.read_telemetry(now);
    }

    /// Ends a fixed-length source once its handle passes the out point.
    fn check_out_point(&mut self, now: Instant) {
        if self.phase != PlayerPhase::Playing {
            return;
        }
        let Some(binding) = self.binding.as_ref().filter(|b| b.fixed_length) else {
            return;
        };
        let (Some(length), id) = (binding.duration_hint, binding.id.clone()) else {
            return;
        };
        let reached = self
            .handle_time(&id)
            .is_some_and(|t| t >= length - END_EPSILON);
        if reached {
            log::debug!("PlaybackCoordinator: {} reached its out point", id);
            self.registry.pause(&id);
            self.on_ended(&id, now);
        }
    }

    fn on_ended(&mut self, id: &str, now: Instant) {
        self.enter_idle();
        if let Some(duration) = self.duration {
            self.transport.current_time = duration;
        }
        if self.on_next_segment.is_none()
            || self.pending_advance.is_some()
            || self.advanced_from.as_deref() == Some(id)
        {
            return;
        }
        if let Some(next) = self.next_playable_after(id) {
            self.advanced_from = Some(id.to_string());
            self.pending_advance = Some((next, now + self.config.auto_advance_delay()));
        }
    }

    fn read_telemetry(&mut self, now: Instant) {
        if !matches!(self.phase, PlayerPhase::Playing | PlayerPhase::Paused) {
            return;
        }
        let Some(id) = self.bound_id().map(str::to_string) else {
            return;
        };
        let fixed_length = self.binding.as_ref().is_some_and(|b| b.fixed_length);
        if !fixed_length {
            if let Some(duration) = self.registry.duration(&id) {
                self.duration = Some(duration);
            }
        }
        let recent_user_action = self
            .last_user_action
            .is_some_and(|at| now.saturating_duration_since(at) < self.config.poll_interval());
        if recent_user_action {
            return;
        }
        if let Some(time) = self.handle_time(&id) {
            self.transport.current_time = self.clamp_time(time);
        }
    }

    /// Stops and releases every handle. Terminal.
    pub fn dispose(&mut self) {
        if self.is_disposed() {
            return;
        }
        log::debug!("PlaybackCoordinator: disposing");
        self.registry.dispose();
        self.layers.clear();
        self.binding = None;
        self.pending_advance = None;
        self.loading_since = None;
        self.transport.is_playing = false;
        self.phase = PlayerPhase::Disposed;
    }
}

impl Drop for PlaybackCoordinator {
    fn drop(&mut self) {
        self.dispose();
    }
}
