pub mod analysis;
pub mod audio;
pub mod config;

pub use analysis::{AudioFeed, SignalPath, StereoFieldEngine};
pub use config::Settings;
