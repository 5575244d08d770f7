//! In-memory backend for registry and coordinator tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::{PlaybackError, PlaybackResult};
use crate::player::handle::{AudioBackend, AudioHandle, HandleEvent, PlayStart};

#[derive(Debug, Default)]
pub struct FakeHandleState {
    pub url: String,
    pub playing: bool,
    pub pending: bool,
    pub position: f64,
    pub duration: f64,
    pub volume: f64,
    pub rate: f64,
    pub disposed: bool,
    pub play_calls: usize,
    pub events: VecDeque<HandleEvent>,
}

#[derive(Default)]
struct Settings {
    async_start: bool,
    play_error: Option<PlaybackError>,
    create_error: Option<PlaybackError>,
    duration: f64,
}

/// Shared view of everything the fake backend created.
#[derive(Clone, Default)]
pub struct FakeControl {
    settings: Rc<RefCell<Settings>>,
    created: Rc<RefCell<Vec<(String, Rc<RefCell<FakeHandleState>>)>>>,
}

impl FakeControl {
    /// Handles report `Pending` and wait for `finish_loading`.
    pub fn set_async_start(&self, async_start: bool) {
        self.settings.borrow_mut().async_start = async_start;
    }

    pub fn set_play_error(&self, err: Option<PlaybackError>) {
        self.settings.borrow_mut().play_error = err;
    }

    pub fn set_create_error(&self, err: Option<PlaybackError>) {
        self.settings.borrow_mut().create_error = err;
    }

    pub fn set_duration(&self, duration: f64) {
        self.settings.borrow_mut().duration = duration;
    }

    /// Number of handles ever created for `id`.
    pub fn created_count(&self, id: &str) -> usize {
        self.created.borrow().iter().filter(|(i, _)| i == id).count()
    }

    pub fn all(&self, id: &str) -> Vec<Rc<RefCell<FakeHandleState>>> {
        self.created
            .borrow()
            .iter()
            .filter(|(i, _)| i == id)
            .map(|(_, s)| s.clone())
            .collect()
    }

    pub fn latest(&self, id: &str) -> Rc<RefCell<FakeHandleState>> {
        self.all(id).pop().expect("no handle created for id")
    }

    pub fn finish_loading(&self, id: &str) {
        let state = self.latest(id);
        let mut state = state.borrow_mut();
        state.pending = false;
        state.playing = true;
        state.events.push_back(HandleEvent::Started);
    }

    /// Advances playback of `id`, emitting `Ended` at the end of the media.
    pub fn advance(&self, id: &str, secs: f64) {
        let state = self.latest(id);
        let mut state = state.borrow_mut();
        if !state.playing {
            return;
        }
        state.position += secs * state.rate;
        if state.position >= state.duration {
            state.position = state.duration;
            state.playing = false;
            state.events.push_back(HandleEvent::Ended);
        }
    }

    pub fn end(&self, id: &str) {
        let state = self.latest(id);
        let mut state = state.borrow_mut();
        state.position = state.duration;
        state.playing = false;
        state.events.push_back(HandleEvent::Ended);
    }

    pub fn fail(&self, id: &str, err: PlaybackError) {
        let state = self.latest(id);
        let mut state = state.borrow_mut();
        state.playing = false;
        state.pending = false;
        state.events.push_back(HandleEvent::Error(err));
    }
}

pub struct FakeBackend {
    control: FakeControl,
}

impl FakeBackend {
    pub fn new() -> (Self, FakeControl) {
        let control = FakeControl::default();
        control.set_duration(10.0);
        (
            Self {
                control: control.clone(),
            },
            control,
        )
    }
}

impl AudioBackend for FakeBackend {
    fn create(&mut self, id: &str, url: &str) -> PlaybackResult<Box<dyn AudioHandle>> {
        if let Some(err) = self.control.settings.borrow().create_error.clone() {
            return Err(err);
        }
        let state = Rc::new(RefCell::new(FakeHandleState {
            url: url.to_string(),
            duration: self.control.settings.borrow().duration,
            volume: 1.0,
            rate: 1.0,
            ..FakeHandleState::default()
        }));
        self.control
            .created
            .borrow_mut()
            .push((id.to_string(), state.clone()));
        Ok(Box::new(FakeHandle {
            state,
            settings: self.control.settings.clone(),
            url: url.to_string(),
        }))
    }
}

pub struct FakeHandle {
    state: Rc<RefCell<FakeHandleState>>,
    settings: Rc<RefCell<Settings>>,
    url: String,
}

impl AudioHandle for FakeHandle {
    fn source(&self) -> &str {
        &self.url
    }

    fn play(&mut self) -> PlaybackResult<PlayStart> {
        let settings = self.settings.borrow();
        let mut state = self.state.borrow_mut();
        state.play_calls += 1;
        if let Some(err) = settings.play_error.clone() {
            return Err(err);
        }
        if settings.async_start {
            state.pending = true;
            Ok(PlayStart::Pending)
        } else {
            state.playing = true;
            Ok(PlayStart::Started)
        }
    }

    fn pause(&mut self) {
        let mut state = self.state.borrow_mut();
        state.playing = false;
        state.pending = false;
    }

    fn is_playing(&self) -> bool {
        self.state.borrow().playing
    }

    fn current_time(&self) -> Option<f64> {
        Some(self.state.borrow().position)
    }

    fn duration(&self) -> Option<f64> {
        Some(self.state.borrow().duration)
    }

    fn seek(&mut self, time: f64) -> PlaybackResult<()> {
        self.state.borrow_mut().position = time;
        Ok(())
    }

    fn set_volume(&mut self, volume: f64) {
        self.state.borrow_mut().volume = volume;
    }

    fn set_rate(&mut self, rate: f64) -> PlaybackResult<()> {
        self.state.borrow_mut().rate = rate;
        Ok(())
    }

    fn poll_event(&mut self) -> Option<HandleEvent> {
        self.state.borrow_mut().events.pop_front()
    }

    fn dispose(&mut self) {
        let mut state = self.state.borrow_mut();
        state.playing = false;
        state.pending = false;
        state.disposed = true;
    }
}
