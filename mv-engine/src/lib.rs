#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! Camera and model import core of the model viewer.
//!
//! [`control`] turns window events into camera motion, [`scene`] turns a model
//! file into drawable meshes, and [`device`] is the seam between the two and
//! whatever GPU API ends up drawing them.

pub mod control;
pub mod device;
pub mod error;
pub mod scene;
pub mod texture;

mod buffer;

pub use error::{DeviceError, ImportError, TextureLoadError};
