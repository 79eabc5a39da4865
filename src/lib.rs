//! Face-detection annotation overlay.
//!
//! Maps detector coordinates into view coordinates and draws per-face
//! annotations (position marker, bounding box, contour points, landmarks,
//! classification labels) onto a [`canvas::Canvas`].

pub mod canvas;
pub mod config;
pub mod detection;
pub mod error;
pub mod output;
pub mod overlay;
pub mod source;
pub mod tracker;

pub use canvas::{Canvas, RasterCanvas, RecordingCanvas};
pub use detection::FaceDetection;
pub use error::{Error, Result};
pub use overlay::{FaceGraphic, Graphic, GraphicOverlay, Transform};
