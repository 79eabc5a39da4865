mod json_lines;

pub use json_lines::JsonLinesSource;

use crate::detection::FaceDetection;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything the detector reported for one camera frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionFrame {
    pub image_width: i32,
    pub image_height: i32,
    /// Front-facing capture; annotations are flipped horizontally
    #[serde(default)]
    pub mirrored: bool,
    /// Camera frame the detections belong to, if it was kept
    #[serde(default)]
    pub background: Option<PathBuf>,
    #[serde(default)]
    pub faces: Vec<FaceDetection>,
}

/// Trait for detection result producers
/// Allows swapping a live detector for recorded results
pub trait DetectionSource {
    /// Next frame of detections, or `None` once the source is exhausted
    fn next_frame(&mut self) -> Result<Option<DetectionFrame>>;
}
