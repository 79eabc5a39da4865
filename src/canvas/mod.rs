mod raster;

pub use raster::RasterCanvas;

use anyhow::Result;
use image::Rgb;

use crate::detection::Point;

/// Axis-aligned rectangle in view-space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl ViewRect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// Trait for 2D drawing targets
/// Allows the overlay to render to pixels, a recorder, or a GUI surface
pub trait Canvas {
    /// Draw a filled circle
    fn draw_circle(&mut self, center: Point, radius: f32, color: Rgb<u8>) -> Result<()>;

    /// Draw the outline of a rectangle with the given stroke width
    fn draw_rect(&mut self, rect: ViewRect, stroke_width: f32, color: Rgb<u8>) -> Result<()>;

    /// Draw a line of text
    ///
    /// `origin` is the left end of the text baseline.
    fn draw_text(&mut self, text: &str, origin: Point, size: f32, color: Rgb<u8>) -> Result<()>;

    /// Get the drawing surface size (width, height)
    fn size(&self) -> (u32, u32);
}

/// A primitive issued against a canvas
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Circle {
        center: Point,
        radius: f32,
        color: Rgb<u8>,
    },
    Rect {
        rect: ViewRect,
        stroke_width: f32,
        color: Rgb<u8>,
    },
    Text {
        text: String,
        origin: Point,
        size: f32,
        color: Rgb<u8>,
    },
}

/// Canvas that keeps every primitive instead of rasterizing it
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    width: u32,
    height: u32,
    commands: Vec<DrawCommand>,
}

impl RecordingCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn circles(&self) -> impl Iterator<Item = (Point, Rgb<u8>)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Circle { center, color, .. } => Some((*center, *color)),
            _ => None,
        })
    }

    pub fn rects(&self) -> impl Iterator<Item = ViewRect> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Rect { rect, .. } => Some(*rect),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = (&str, Point)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, origin, .. } => Some((text.as_str(), *origin)),
            _ => None,
        })
    }
}

impl Canvas for RecordingCanvas {
    fn draw_circle(&mut self, center: Point, radius: f32, color: Rgb<u8>) -> Result<()> {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
        Ok(())
    }

    fn draw_rect(&mut self, rect: ViewRect, stroke_width: f32, color: Rgb<u8>) -> Result<()> {
        self.commands.push(DrawCommand::Rect {
            rect,
            stroke_width,
            color,
        });
        Ok(())
    }

    fn draw_text(&mut self, text: &str, origin: Point, size: f32, color: Rgb<u8>) -> Result<()> {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            origin,
            size,
            color,
        });
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
