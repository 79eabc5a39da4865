mod face_graphic;
pub mod palette;
pub mod style;
mod transform;

pub use face_graphic::FaceGraphic;
pub use palette::{ColorAllocator, ColorPair};
pub use style::{AnnotationKind, AnnotationSet, AnnotationStyle};
pub use transform::{FitMode, Transform};

use crate::canvas::Canvas;
use anyhow::Result;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Trait for anything drawn on the overlay
pub trait Graphic: Send + Sync {
    /// Draw onto `canvas` using the transform of the current pass
    fn draw(&self, canvas: &mut dyn Canvas, transform: &Transform) -> Result<()>;
}

/// Pending-redraw flag shared between the overlay and its graphics.
///
/// Any number of requests between two passes collapse into one redraw.
#[derive(Debug, Default)]
pub struct RepaintSignal {
    pending: AtomicBool,
}

impl RepaintSignal {
    pub fn request(&self) {
        self.pending.store(true, Ordering::Release);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Clear the flag, returning whether a redraw was pending
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }
}

#[derive(Debug, Clone, Copy)]
struct Geometry {
    view_width: f32,
    view_height: f32,
    image_width: f32,
    image_height: f32,
    mirrored: bool,
    fit: FitMode,
    transform: Transform,
}

impl Geometry {
    fn recompute(&mut self) {
        self.transform = Transform::fit(
            self.view_width,
            self.view_height,
            self.image_width,
            self.image_height,
            self.mirrored,
            self.fit,
        );
    }
}

/// Drawing surface that maps detector coordinates to the view and holds
/// the graphics drawn on every pass.
///
/// Safe to share between the detection thread (sizes, graphic updates) and
/// the render thread (`render`, `render_if_needed`).
pub struct GraphicOverlay {
    geometry: RwLock<Geometry>,
    graphics: RwLock<Vec<Arc<dyn Graphic>>>,
    colors: Mutex<ColorAllocator>,
    repaint: Arc<RepaintSignal>,
    passes: AtomicU64,
}

impl GraphicOverlay {
    pub fn new(view_width: u32, view_height: u32) -> Self {
        Self::with_fit(view_width, view_height, FitMode::Stretch)
    }

    pub fn with_fit(view_width: u32, view_height: u32, fit: FitMode) -> Self {
        Self {
            geometry: RwLock::new(Geometry {
                view_width: view_width as f32,
                view_height: view_height as f32,
                image_width: 0.0,
                image_height: 0.0,
                mirrored: false,
                fit,
                transform: Transform::NEUTRAL,
            }),
            graphics: RwLock::new(Vec::new()),
            colors: Mutex::new(ColorAllocator::default()),
            repaint: Arc::new(RepaintSignal::default()),
            passes: AtomicU64::new(0),
        }
    }

    /// Set the size and facing of the frames the detector sees.
    ///
    /// Non-positive sizes mean no frame yet; the transform stays neutral.
    pub fn set_image_source_size(&self, width: i32, height: i32, is_mirrored: bool) {
        let mut geometry = self.geometry.write().unwrap_or_else(PoisonError::into_inner);
        if width <= 0 || height <= 0 {
            tracing::debug!("Ignoring image source size {}x{}", width, height);
            let previous = geometry.transform;
            geometry.image_width = 0.0;
            geometry.image_height = 0.0;
            geometry.mirrored = false;
            geometry.transform = Transform::NEUTRAL;
            drop(geometry);
            if previous != Transform::NEUTRAL {
                self.repaint.request();
            }
            return;
        }

        let changed = geometry.image_width != width as f32
            || geometry.image_height != height as f32
            || geometry.mirrored != is_mirrored;
        if !changed {
            return;
        }

        geometry.image_width = width as f32;
        geometry.image_height = height as f32;
        geometry.mirrored = is_mirrored;
        geometry.recompute();
        tracing::debug!(
            "Image source {}x{} (mirrored={}) -> {:?}",
            width,
            height,
            is_mirrored,
            geometry.transform
        );
        drop(geometry);
        self.repaint.request();
    }

    /// Resize the view, e.g. after an orientation change
    pub fn set_view_size(&self, width: u32, height: u32) {
        let mut geometry = self.geometry.write().unwrap_or_else(PoisonError::into_inner);
        geometry.view_width = width as f32;
        geometry.view_height = height as f32;
        geometry.recompute();
        drop(geometry);
        self.repaint.request();
    }

    pub fn view_size(&self) -> (u32, u32) {
        let geometry = self.geometry.read().unwrap_or_else(PoisonError::into_inner);
        (geometry.view_width as u32, geometry.view_height as u32)
    }

    /// Current mapping; neutral until both sizes are known
    pub fn transform(&self) -> Transform {
        self.geometry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .transform
    }

    pub fn add(&self, graphic: Arc<dyn Graphic>) {
        self.graphics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(graphic);
        self.repaint.request();
    }

    /// Remove a graphic previously added; unknown graphics are ignored
    pub fn remove(&self, graphic: &Arc<dyn Graphic>) {
        self.graphics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|g| !Arc::ptr_eq(g, graphic));
        self.repaint.request();
    }

    pub fn clear(&self) {
        self.graphics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.repaint.request();
    }

    pub fn len(&self) -> usize {
        self.graphics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocate the colors for a new face graphic
    pub fn next_colors(&self) -> ColorPair {
        self.colors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next()
    }

    pub fn repaint_signal(&self) -> Arc<RepaintSignal> {
        Arc::clone(&self.repaint)
    }

    pub fn invalidate(&self) {
        self.repaint.request();
    }

    /// Number of passes rendered so far
    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::Relaxed)
    }

    /// Draw every graphic, in insertion order, with one transform snapshot
    pub fn render(&self, canvas: &mut dyn Canvas) -> Result<()> {
        let _span = tracing::debug_span!("overlay_render").entered();

        self.repaint.take();
        let transform = self.transform();
        let graphics: Vec<Arc<dyn Graphic>> = self
            .graphics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for graphic in &graphics {
            graphic.draw(canvas, &transform)?;
        }

        let pass = self.passes.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!("Rendered pass {} with {} graphics", pass, graphics.len());
        Ok(())
    }

    /// Render only when something asked for a repaint since the last pass
    pub fn render_if_needed(&self, canvas: &mut dyn Canvas) -> Result<bool> {
        if !self.repaint.is_pending() {
            return Ok(false);
        }
        self.render(canvas)?;
        Ok(true)
    }
}
