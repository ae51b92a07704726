pub mod canvas;
pub mod config;
pub mod schedule;
pub mod status;
