pub mod catalog;
pub mod engine;
pub mod event;
pub mod progress;
pub mod state;
