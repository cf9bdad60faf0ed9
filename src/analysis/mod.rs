//! Stereo field analysis: per-band inter-channel correlation over time.

pub mod bands;
pub mod color;
pub mod correlator;
pub mod engine;
pub mod frame;
pub mod history;
pub mod ingest;
pub mod transform;

pub use bands::Band;
pub use color::ColorMap;
pub use engine::{EngineState, StereoFieldEngine};
pub use history::HistoryImage;
pub use ingest::{AudioFeed, SignalPath, StereoSample};
