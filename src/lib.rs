pub mod config;
pub mod error;
pub mod ops;
pub mod player;
pub mod renderer;
pub mod types;
pub mod ui;
