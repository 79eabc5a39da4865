use crate::detection::ContourKind;
use crate::error::{Error, Result};
use crate::overlay::style::{
    BOX_STROKE_WIDTH, FACE_POSITION_RADIUS, ID_TEXT_SIZE, ID_X_OFFSET, ID_Y_OFFSET,
};
use crate::overlay::{AnnotationSet, AnnotationStyle, ColorPair, FitMode};
use ab_glyph::FontArc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub view: ViewConfig,
    pub style: StyleConfig,
    /// TrueType font for labels; the built-in bitmap font is used when unset
    pub font_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub width: u32,
    pub height: u32,
    pub fit: FitMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub marker_radius: f32,
    pub stroke_width: f32,
    pub text_size: f32,
    pub id_offset_x: f32,
    pub id_offset_y: f32,
    pub contour: ContourKind,
    pub enabled: AnnotationSet,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            view: ViewConfig::default(),
            style: StyleConfig::default(),
            font_path: None,
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fit: FitMode::Stretch,
        }
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            marker_radius: FACE_POSITION_RADIUS,
            stroke_width: BOX_STROKE_WIDTH,
            text_size: ID_TEXT_SIZE,
            id_offset_x: ID_X_OFFSET,
            id_offset_y: ID_Y_OFFSET,
            contour: ContourKind::AllPoints,
            enabled: AnnotationSet::all(),
        }
    }
}

impl StyleConfig {
    /// Full style for a face that was assigned `colors`
    pub fn style(&self, colors: ColorPair) -> AnnotationStyle {
        AnnotationStyle {
            marker_radius: self.marker_radius,
            stroke_width: self.stroke_width,
            text_size: self.text_size,
            id_offset: (self.id_offset_x, self.id_offset_y),
            contour: self.contour,
            ..AnnotationStyle::new(colors)
        }
        .with_enabled(self.enabled)
    }
}

impl OverlayConfig {
    /// Load from `path`, or defaults when the file does not exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let config: OverlayConfig =
                serde_json::from_str(&content).map_err(|source| Error::ConfigParse {
                    path: path.to_path_buf(),
                    source,
                })?;
            tracing::info!("Loaded configuration from {}", path.display());
            config
        } else {
            tracing::info!(
                "Configuration file {} not found, using defaults",
                path.display()
            );
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, content).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.view.width == 0 || self.view.height == 0 {
            return Err(Error::InvalidConfig(format!(
                "view size must be positive, got {}x{}",
                self.view.width, self.view.height
            )));
        }
        let style = &self.style;
        for (name, value) in [
            ("marker_radius", style.marker_radius),
            ("stroke_width", style.stroke_width),
            ("text_size", style.text_size),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Read the configured label font, if any
    pub fn load_font(&self) -> Result<Option<FontArc>> {
        let Some(path) = &self.font_path else {
            return Ok(None);
        };
        let data = fs::read(path).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        let font = FontArc::try_from_vec(data).map_err(|e| Error::Font {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        tracing::info!("Loaded label font {}", path.display());
        Ok(Some(font))
    }
}
