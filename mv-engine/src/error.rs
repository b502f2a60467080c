//! Error types of the engine.
//!
//! None of these are fatal: the model importer reports them and degrades to an
//! empty model or a mesh with fewer textures.

use std::path::PathBuf;

/// A GPU backend failed to allocate, upload or submit something.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{context}: {message}")]
pub struct DeviceError {
    context: &'static str,
    message: String,
}

impl DeviceError {
    pub fn new(context: &'static str, message: impl Into<String>) -> Self {
        Self {
            context,
            message: message.into(),
        }
    }

    /// Wraps any displayable backend error, keeping only its message.
    pub fn backend<E: std::fmt::Display>(context: &'static str) -> impl FnOnce(E) -> Self {
        move |error| Self::new(context, error.to_string())
    }

    #[must_use]
    pub const fn context(&self) -> &'static str {
        self.context
    }
}

/// The model file could not be turned into a usable scene.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to parse `{path}`: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("scene `{path}` is incomplete: {reason}")]
    Incomplete { path: PathBuf, reason: String },
    #[error("mesh `{mesh}` references vertex {index} but only has {vertex_count} vertices")]
    IndexOutOfRange {
        mesh: String,
        index: u32,
        vertex_count: usize,
    },
    #[error("mesh `{mesh}` has {count} indices, more than a single draw can address")]
    TooManyIndices { mesh: String, count: usize },
    #[error("failed to upload mesh `{mesh}`")]
    Upload {
        mesh: String,
        #[source]
        source: DeviceError,
    },
}

/// A single texture could not be decoded or uploaded.
#[derive(Debug, thiserror::Error)]
pub enum TextureLoadError {
    #[error("failed to decode `{path}`")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("`{path}` has {channels} channels, expected 1 to 4")]
    UnsupportedChannels { path: PathBuf, channels: u8 },
    #[error("failed to upload `{path}`")]
    Upload {
        path: PathBuf,
        #[source]
        source: DeviceError,
    },
}

impl TextureLoadError {
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Decode { path, .. }
            | Self::UnsupportedChannels { path, .. }
            | Self::Upload { path, .. } => path,
        }
    }
}
