pub mod timeline_view;
