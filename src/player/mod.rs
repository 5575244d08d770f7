pub mod coordinator;
pub mod gst_backend;
pub mod handle;
pub mod registry;
pub mod resolver;

#[cfg(test)]
pub(crate) mod fake;

pub use coordinator::{Notice, NoticeKind, PlaybackCoordinator};
pub use handle::{AudioBackend, AudioHandle, HandleEvent, PlaySettings, PlayStart};
pub use registry::AudioRegistry;
pub use resolver::{SignedUrlCache, UrlResolver};
