pub mod clip_ops;
