use crate::error::{PlaybackError, PlaybackResult};

/// Outcome of asking a handle to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayStart {
    /// Audio is audible now
    Started,
    /// The source is still buffering; a `HandleEvent::Started` follows
    Pending,
}

/// Asynchronous notifications drained from a handle.
#[derive(Debug, Clone, PartialEq)]
pub enum HandleEvent {
    Started,
    Ended,
    Error(PlaybackError),
}

/// Optional overrides applied right before a handle starts.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlaySettings {
    /// Linear gain, 0.0 to 1.0
    pub volume: Option<f64>,
    pub rate: Option<f64>,
    /// Seconds
    pub start_at: Option<f64>,
}

/// A native playable resource bound to one url.
///
/// Media failures surface through `poll_event` or the returned errors, never
/// as panics. `dispose` must release the decoder; dropping alone is not
/// required to.
pub trait AudioHandle {
    fn source(&self) -> &str;
    fn play(&mut self) -> PlaybackResult<PlayStart>;
    fn pause(&mut self);
    fn is_playing(&self) -> bool;
    fn current_time(&self) -> Option<f64>;
    fn duration(&self) -> Option<f64>;
    fn seek(&mut self, time: f64) -> PlaybackResult<()>;
    /// Linear gain, 0.0 to 1.0
    fn set_volume(&mut self, volume: f64);
    fn set_rate(&mut self, rate: f64) -> PlaybackResult<()>;
    fn poll_event(&mut self) -> Option<HandleEvent>;
    fn dispose(&mut self);
}

/// Creates handles for the registry.
pub trait AudioBackend {
    fn create(&mut self, id: &str, url: &str) -> PlaybackResult<Box<dyn AudioHandle>>;
}
