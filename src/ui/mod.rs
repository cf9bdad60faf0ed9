pub mod heatmap;
pub mod settings;

pub use heatmap::*;
pub use settings::*;
