pub mod media;
pub mod playback_state;
pub mod project;
pub mod segment;
pub mod timeline;
pub mod track;
