pub mod app;
pub mod segment_panel;
pub mod timeline_widget;
pub mod track_widget;
