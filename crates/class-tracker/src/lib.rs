pub mod canvas;
pub mod model;
pub mod schedule;
pub mod server;
pub mod settings;
pub mod store;
pub mod types;
