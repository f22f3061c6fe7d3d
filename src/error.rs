//! Error types for level loading and rendering setup.

use std::fmt;

/// Errors surfaced by the engine and its collaborators.
///
/// Rendering itself never fails: bad slots are dropped and unfit tiles are
/// skipped. These variants cover configuration and loading problems only.
#[derive(Debug)]
pub enum EngineError {
    /// A tile referenced directly by a material painter is not in the registry.
    MissingTile(String),

    /// A material name was looked up and not found.
    MissingMaterial(String),

    /// A texture a material painter needs is not in the texture library.
    MissingTexture(String),

    /// An image file could not be decoded or written.
    Image(image::ImageError),

    /// Filesystem failure while reading assets or configuration.
    Io(std::io::Error),

    /// The configuration JSON could not be parsed.
    Config(serde_json::Error),

    /// The background loader went away without reporting a result.
    LoaderDisconnected,

    /// The background loader panicked.
    LoaderPanicked,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::MissingTile(name) => write!(f, "tile '{}' not found in registry", name),
            EngineError::MissingMaterial(name) => {
                write!(f, "material '{}' not found in registry", name)
            }
            EngineError::MissingTexture(name) => {
                write!(f, "texture '{}' not found in texture library", name)
            }
            EngineError::Image(e) => write!(f, "image error: {}", e),
            EngineError::Io(e) => write!(f, "io error: {}", e),
            EngineError::Config(e) => write!(f, "invalid configuration: {}", e),
            EngineError::LoaderDisconnected => {
                write!(f, "level loader finished without reporting a result")
            }
            EngineError::LoaderPanicked => write!(f, "level loader panicked"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Image(e) => Some(e),
            EngineError::Io(e) => Some(e),
            EngineError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<image::ImageError> for EngineError {
    fn from(e: image::ImageError) -> Self {
        EngineError::Image(e)
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Io(e)
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Config(e)
    }
}
