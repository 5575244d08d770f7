//! Audio element registry
//!
//! Owns every native audio handle, keyed by a stable id (segment or clip
//! id). Nothing outside the registry touches a handle; callers pass ids.
//! Media failures are reported through the error callback and never abort
//! the other ids.

use std::collections::HashMap;

use crate::error::PlaybackError;
use crate::player::handle::{AudioBackend, AudioHandle, HandleEvent, PlaySettings, PlayStart};

/// Receives `(id, error)` for every media failure.
pub type ErrorCallback = Box<dyn FnMut(&str, &PlaybackError)>;

struct Entry {
    handle: Box<dyn AudioHandle>,
    /// A start was requested and the handle has not confirmed it yet
    loading: bool,
}

pub struct AudioRegistry {
    backend: Box<dyn AudioBackend>,
    handles: HashMap<String, Entry>,
    on_error: Option<ErrorCallback>,
    disposed: bool,
}

impl AudioRegistry {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend,
            handles: HashMap::new(),
            on_error: None,
            disposed: false,
        }
    }

    pub fn set_on_error(&mut self, callback: ErrorCallback) {
        self.on_error = Some(callback);
    }

    fn report(&mut self, id: &str, err: &PlaybackError) {
        if err.is_user_facing() {
            log::warn!("AudioRegistry: {}: {}", id, err);
        } else {
            log::debug!("AudioRegistry: {}: {}", id, err);
        }
        if let Some(callback) = self.on_error.as_mut() {
            callback(id, err);
        }
    }

    /// Ensures `id` has a handle bound to `url`.
    ///
    /// A handle bound to another url is stopped and disposed before the new
    /// one is created, so position restarts at 0. Returns false if the
    /// handle could not be created; the error goes to the callback.
    pub fn get_or_create(&mut self, id: &str, url: &str) -> bool {
        if self.disposed {
            return false;
        }
        if let Some(entry) = self.handles.get(id) {
            if entry.handle.source() == url {
                return true;
            }
        }
        if let Some(mut old) = self.handles.remove(id) {
            log::debug!("AudioRegistry: rebinding {} to {}", id, url);
            old.handle.pause();
            old.handle.dispose();
            if old.loading {
                self.report(id, &PlaybackError::Cancelled(id.to_string()));
            }
        }
        match self.backend.create(id, url) {
            Ok(handle) => {
                self.handles.insert(
                    id.to_string(),
                    Entry {
                        handle,
                        loading: false,
                    },
                );
                true
            }
            Err(err) => {
                self.report(id, &err);
                false
            }
        }
    }

    /// Starts playback of `id`, binding `url` first when given.
    ///
    /// Returns true once the start was accepted; `is_loading` tells whether
    /// audio is still buffering. Failures go to the error callback.
    pub fn play(&mut self, id: &str, url: Option<&str>, settings: Option<PlaySettings>) -> bool {
        if self.disposed {
            return false;
        }
        if let Some(url) = url {
            if !self.get_or_create(id, url) {
                return false;
            }
        }
        let Some(entry) = self.handles.get_mut(id) else {
            let err = PlaybackError::Load {
                id: id.to_string(),
                reason: "no source bound".to_string(),
            };
            self.report(id, &err);
            return false;
        };

        let mut result = Ok(());
        if let Some(settings) = settings {
            if let Some(volume) = settings.volume {
                entry.handle.set_volume(volume);
            }
            if let Some(rate) = settings.rate {
                result = entry.handle.set_rate(rate);
            }
            if let (Ok(()), Some(start_at)) = (&result, settings.start_at) {
                result = entry.handle.seek(start_at);
            }
        }
        let result = result.and_then(|()| entry.handle.play());
        match result {
            Ok(PlayStart::Started) => {
                entry.loading = false;
                true
            }
            Ok(PlayStart::Pending) => {
                entry.loading = true;
                true
            }
            Err(err) => {
                entry.loading = false;
                self.report(id, &err);
                false
            }
        }
    }

    pub fn pause(&mut self, id: &str) {
        if let Some(entry) = self.handles.get_mut(id) {
            entry.handle.pause();
            entry.loading = false;
        }
    }

    pub fn stop_all(&mut self) {
        for entry in self.handles.values_mut() {
            entry.handle.pause();
            entry.loading = false;
        }
    }

    /// Disposes the handle of `id`.
    pub fn remove(&mut self, id: &str) {
        if let Some(mut entry) = self.handles.remove(id) {
            entry.handle.pause();
            entry.handle.dispose();
        }
    }

    pub fn seek(&mut self, id: &str, time: f64) {
        let Some(entry) = self.handles.get_mut(id) else {
            return;
        };
        if let Err(err) = entry.handle.seek(time) {
            self.report(id, &err);
        }
    }

    pub fn set_volume(&mut self, id: &str, volume: f64) {
        if let Some(entry) = self.handles.get_mut(id) {
            entry.handle.set_volume(volume);
        }
    }

    pub fn set_rate(&mut self, id: &str, rate: f64) {
        let Some(entry) = self.handles.get_mut(id) else {
            return;
        };
        if let Err(err) = entry.handle.set_rate(rate) {
            self.report(id, &err);
        }
    }

    pub fn is_playing(&self, id: &str) -> bool {
        self.handles
            .get(id)
            .map(|entry| entry.handle.is_playing())
            .unwrap_or(false)
    }

    pub fn is_loading(&self, id: &str) -> bool {
        self.handles.get(id).map(|entry| entry.loading).unwrap_or(false)
    }

    pub fn current_time(&self, id: &str) -> Option<f64> {
        self.handles.get(id)?.handle.current_time()
    }

    pub fn duration(&self, id: &str) -> Option<f64> {
        self.handles.get(id)?.handle.duration()
    }

    /// Url currently bound to `id`.
    pub fn source(&self, id: &str) -> Option<&str> {
        self.handles.get(id).map(|entry| entry.handle.source())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.handles.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Drains pending events of every handle. Errors are also passed to the
    /// error callback.
    pub fn poll(&mut self) -> Vec<(String, HandleEvent)> {
        let mut events = Vec::new();
        if self.disposed {
            return events;
        }
        for (id, entry) in self.handles.iter_mut() {
            while let Some(event) = entry.handle.poll_event() {
                // Any event settles a pending start.
                entry.loading = false;
                events.push((id.clone(), event));
            }
        }
        for (id, event) in &events {
            if let HandleEvent::Error(err) = event {
                self.report(id, err);
            }
        }
        events
    }

    /// Stops and releases every handle. The registry cannot be reused.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        for (id, mut entry) in self.handles.drain() {
            log::debug!("AudioRegistry: disposing {}", id);
            entry.handle.pause();
            entry.handle.dispose();
        }
        self.disposed = true;
    }
}

impl Drop for AudioRegistry {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::fake::FakeBackend;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Reported = Rc<RefCell<Vec<(String, PlaybackError)>>>;

    fn registry() -> (AudioRegistry, crate::player::fake::FakeControl, Reported) {
        let (backend, control) = FakeBackend::new();
        let mut registry = AudioRegistry::new(Box::new(backend));
        let reported: Reported = Rc::new(RefCell::new(Vec::new()));
        let sink = reported.clone();
        registry.set_on_error(Box::new(move |id, err| {
            sink.borrow_mut().push((id.to_string(), err.clone()));
        }));
        (registry, control, reported)
    }

    #[test]
    fn test_one_handle_per_id() {
        let (mut registry, control, _) = registry();
        assert!(registry.get_or_create("seg-1", "https://cdn/a.mp3"));
        assert!(registry.get_or_create("seg-1", "https://cdn/a.mp3"));
        assert_eq!(control.created_count("seg-1"), 1);

        assert!(registry.get_or_create("seg-1", "https://cdn/b.mp3"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.source("seg-1"), Some("https://cdn/b.mp3"));

        let handles = control.all("seg-1");
        assert_eq!(handles.len(), 2);
        assert!(handles[0].borrow().disposed);
        assert!(!handles[1].borrow().disposed);
        assert_eq!(handles[1].borrow().position, 0.0);
    }

    #[test]
    fn test_pause_and_stop_are_idempotent() {
        let (mut registry, _, reported) = registry();
        registry.pause("unknown");
        registry.stop_all();
        assert!(!registry.is_playing("unknown"));

        registry.play("seg-1", Some("a.mp3"), None);
        registry.pause("seg-1");
        registry.pause("seg-1");
        registry.stop_all();
        assert!(!registry.is_playing("seg-1"));
        assert!(reported.borrow().is_empty());
    }

    #[test]
    fn test_play_applies_settings() {
        let (mut registry, control, _) = registry();
        let settings = PlaySettings {
            volume: Some(0.5),
            rate: Some(1.5),
            start_at: Some(3.0),
        };
        assert!(registry.play("seg-1", Some("a.mp3"), Some(settings)));
        assert!(registry.is_playing("seg-1"));
        assert_eq!(registry.current_time("seg-1"), Some(3.0));

        let state = control.latest("seg-1");
        assert_eq!(state.borrow().volume, 0.5);
        assert_eq!(state.borrow().rate, 1.5);
    }

    #[test]
    fn test_play_failure_goes_to_callback() {
        let (mut registry, control, reported) = registry();
        control.set_play_error(Some(PlaybackError::AutoplayBlocked));

        assert!(!registry.play("seg-1", Some("a.mp3"), None));
        assert_eq!(
            reported.borrow().as_slice(),
            &[("seg-1".to_string(), PlaybackError::AutoplayBlocked)]
        );

        control.set_play_error(None);
        assert!(registry.play("seg-2", Some("b.mp3"), None));
        assert!(registry.is_playing("seg-2"));
    }

    #[test]
    fn test_play_without_source_is_reported() {
        let (mut registry, _, reported) = registry();
        assert!(!registry.play("seg-1", None, None));
        assert!(matches!(
            reported.borrow()[0].1,
            PlaybackError::Load { .. }
        ));
    }

    #[test]
    fn test_rebinding_pending_handle_reports_cancelled() {
        let (mut registry, control, reported) = registry();
        control.set_async_start(true);
        assert!(registry.play("seg-1", Some("a.mp3"), None));
        assert!(registry.is_loading("seg-1"));

        registry.get_or_create("seg-1", "b.mp3");
        let reported = reported.borrow();
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].1, PlaybackError::Cancelled("seg-1".to_string()));
        assert!(!reported[0].1.is_user_facing());
    }

    #[test]
    fn test_poll_drains_events() {
        let (mut registry, control, reported) = registry();
        control.set_async_start(true);
        registry.play("seg-1", Some("a.mp3"), None);
        control.finish_loading("seg-1");

        let events = registry.poll();
        assert_eq!(events, vec![("seg-1".to_string(), HandleEvent::Started)]);
        assert!(!registry.is_loading("seg-1"));

        control.fail("seg-1", PlaybackError::ExpiredUrl("seg-1".to_string()));
        let events = registry.poll();
        assert_eq!(events.len(), 1);
        assert_eq!(reported.borrow().len(), 1);
        assert!(registry.poll().is_empty());
    }

    #[test]
    fn test_dispose_is_terminal() {
        let (mut registry, control, _) = registry();
        registry.play("seg-1", Some("a.mp3"), None);
        registry.dispose();

        assert!(control.latest("seg-1").borrow().disposed);
        assert!(registry.is_empty());
        assert!(!registry.play("seg-1", Some("a.mp3"), None));
        assert!(!registry.get_or_create("seg-2", "b.mp3"));
        registry.pause("seg-1");
        registry.stop_all();
        registry.dispose();
        assert_eq!(control.created_count("seg-1"), 1);
        assert!(registry.poll().is_empty());
    }

    #[test]
    fn test_create_failure_keeps_other_ids() {
        let (mut registry, control, reported) = registry();
        registry.play("seg-1", Some("a.mp3"), None);
        control.set_create_error(Some(PlaybackError::Backend("no playbin".to_string())));
        assert!(!registry.play("seg-2", Some("b.mp3"), None));
        assert_eq!(reported.borrow().len(), 1);
        assert!(registry.is_playing("seg-1"));
    }
}
