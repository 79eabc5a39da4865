use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::detection::Point;

/// How image-space is fitted into the view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    /// Independent per-axis scale, image fills the whole view
    #[default]
    Stretch,
    /// Uniform scale, image centered with bars on the short axis
    Letterbox,
    /// Uniform scale filling the whole view, image centered and cropped
    /// on the long axis
    Crop,
}

/// Image-space to view-space mapping for one repaint generation.
///
/// Scale factors are always strictly positive. A `Transform` is a plain
/// value: the overlay hands each render pass its own copy, so every
/// translation within a pass agrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    scale_x: f32,
    scale_y: f32,
    mirrored: bool,
    view_width: f32,
    offset_x: f32,
    offset_y: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl Transform {
    /// Identity mapping used until both sizes are known
    pub const NEUTRAL: Transform = Transform {
        scale_x: 1.0,
        scale_y: 1.0,
        mirrored: false,
        view_width: 0.0,
        offset_x: 0.0,
        offset_y: 0.0,
    };

    /// Compute the mapping for the given view and image sizes.
    ///
    /// Returns `NEUTRAL` when any dimension is not strictly positive.
    pub fn fit(
        view_width: f32,
        view_height: f32,
        image_width: f32,
        image_height: f32,
        mirrored: bool,
        mode: FitMode,
    ) -> Self {
        let sizes = [view_width, view_height, image_width, image_height];
        if sizes.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Self::NEUTRAL;
        }

        let ratio_x = view_width / image_width;
        let ratio_y = view_height / image_height;

        let (scale_x, scale_y, offset_x, offset_y) = match mode {
            FitMode::Stretch => (ratio_x, ratio_y, 0.0, 0.0),
            FitMode::Letterbox | FitMode::Crop => {
                let scale = if mode == FitMode::Letterbox {
                    ratio_x.min(ratio_y)
                } else {
                    ratio_x.max(ratio_y)
                };
                // Negative offsets when cropping
                (
                    scale,
                    scale,
                    (view_width - image_width * scale) / 2.0,
                    (view_height - image_height * scale) / 2.0,
                )
            }
        };

        Self {
            scale_x,
            scale_y,
            mirrored,
            view_width,
            offset_x,
            offset_y,
        }
    }

    pub fn is_mirrored(&self) -> bool {
        self.mirrored
    }

    pub fn horizontal_scale(&self) -> f32 {
        self.scale_x
    }

    pub fn vertical_scale(&self) -> f32 {
        self.scale_y
    }

    pub fn offset(&self) -> (f32, f32) {
        (self.offset_x, self.offset_y)
    }

    /// Scale a horizontal length; no translation, no mirroring
    pub fn scale_x(&self, value: f32) -> f32 {
        value * self.scale_x
    }

    /// Scale a vertical length
    pub fn scale_y(&self, value: f32) -> f32 {
        value * self.scale_y
    }

    pub fn translate_x(&self, x: f32) -> f32 {
        if self.mirrored {
            self.view_width - self.offset_x - self.scale_x(x)
        } else {
            self.offset_x + self.scale_x(x)
        }
    }

    pub fn translate_y(&self, y: f32) -> f32 {
        self.offset_y + self.scale_y(y)
    }

    pub fn translate(&self, point: Point) -> Point {
        Point::new(self.translate_x(point.x), self.translate_y(point.y))
    }

    /// View-space x back to image-space
    pub fn untranslate_x(&self, x: f32) -> f32 {
        if self.mirrored {
            (self.view_width - self.offset_x - x) / self.scale_x
        } else {
            (x - self.offset_x) / self.scale_x
        }
    }

    pub fn untranslate_y(&self, y: f32) -> f32 {
        (y - self.offset_y) / self.scale_y
    }
}
