pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod level;
pub mod registry;
pub mod renderer;
pub mod rng;

pub use config::RenderConfig;
pub use engine::Engine;
pub use error::EngineError;
pub use level::{LevelLoader, LevelState};
pub use registry::Registry;

/// Output canvas size in pixels.
pub const CANVAS_WIDTH: u32 = 2000;
pub const CANVAS_HEIGHT: u32 = 1200;

/// Cells one camera sees horizontally and vertically.
pub const COLUMNS: i32 = 100;
pub const ROWS: i32 = 60;
