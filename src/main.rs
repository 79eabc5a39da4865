use anyhow::{Context, Result};
use clap::Parser;
use face_overlay::canvas::RasterCanvas;
use face_overlay::config::OverlayConfig;
use face_overlay::output::{ImageSequenceOutput, OutputSink};
use face_overlay::overlay::{FitMode, GraphicOverlay, Transform};
use face_overlay::source::{DetectionSource, JsonLinesSource};
use face_overlay::tracker::{FaceTracker, TrackingPolicy};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Recorded detections, one JSON frame per line
    #[arg(short, long)]
    detections: PathBuf,

    /// Directory receiving the annotated frames
    #[arg(short, long, default_value = "annotated")]
    output_dir: PathBuf,

    /// Overlay configuration (JSON); defaults are used if it does not exist
    #[arg(short, long, default_value = "overlay.json")]
    config: PathBuf,

    /// View width, overrides the config
    #[arg(long)]
    view_width: Option<u32>,

    /// View height, overrides the config
    #[arg(long)]
    view_height: Option<u32>,

    /// How the camera image is fitted into the view, overrides the config
    #[arg(long, value_enum)]
    fit: Option<FitMode>,

    /// TrueType font for labels, overrides the config
    #[arg(long)]
    font: Option<PathBuf>,

    /// When face graphics are created and discarded
    #[arg(long, value_enum, default_value_t = TrackingPolicy::PerFrame)]
    tracking: TrackingPolicy,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let mut config = OverlayConfig::load(&args.config).context("Failed to load configuration")?;
    if let Some(width) = args.view_width {
        config.view.width = width;
    }
    if let Some(height) = args.view_height {
        config.view.height = height;
    }
    if let Some(fit) = args.fit {
        config.view.fit = fit;
    }
    if let Some(font) = args.font {
        config.font_path = Some(font);
    }
    config.validate().context("Invalid configuration")?;

    tracing::info!("face-overlay starting");
    tracing::info!(
        "View: {}x{} ({:?})",
        config.view.width,
        config.view.height,
        config.view.fit
    );
    tracing::info!("Tracking: {:?}", args.tracking);

    let font = config.load_font().context("Failed to load label font")?;

    let overlay = Arc::new(GraphicOverlay::with_fit(
        config.view.width,
        config.view.height,
        config.view.fit,
    ));
    let mut tracker = FaceTracker::new(Arc::clone(&overlay), config.style.clone(), args.tracking);

    let mut source = JsonLinesSource::open(&args.detections)?;
    let mut output = ImageSequenceOutput::new(&args.output_dir, config.view.width, config.view.height)
        .context("Failed to initialize frame output")?;

    run_replay(&mut source, &mut tracker, &mut output, font.as_ref())?;

    Ok(())
}

fn run_replay<S, O>(
    source: &mut S,
    tracker: &mut FaceTracker,
    output: &mut O,
    font: Option<&ab_glyph::FontArc>,
) -> Result<()>
where
    S: DetectionSource,
    O: OutputSink,
{
    let mut frame_count = 0u64;
    let mut face_count = 0u64;
    let mut total_render_time = Duration::ZERO;
    let mut total_output_time = Duration::ZERO;

    tracing::info!("Starting replay");

    while let Some(frame) = source
        .next_frame()
        .context("Failed to read detection frame")?
    {
        let backdrop = frame.background.clone();
        let source_size = (frame.image_width, frame.image_height);
        face_count += frame.faces.len() as u64;
        tracker.apply(frame);

        let mut image = background(
            backdrop.as_deref(),
            source_size,
            &tracker.overlay().transform(),
            output.resolution(),
        );

        let render_start = Instant::now();
        let mut canvas = match font {
            Some(font) => RasterCanvas::with_font(&mut image, font),
            None => RasterCanvas::new(&mut image),
        };
        tracker
            .overlay()
            .render(&mut canvas)
            .context("Failed to render overlay")?;
        total_render_time += render_start.elapsed();

        let output_start = Instant::now();
        output
            .write_frame(&image)
            .context("Failed to write frame")?;
        total_output_time += output_start.elapsed();

        frame_count += 1;

        // Log stats every 30 frames
        if frame_count % 30 == 0 {
            let avg_render_ms = total_render_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let avg_output_ms = total_output_time.as_secs_f64() * 1000.0 / frame_count as f64;
            tracing::info!(
                "Frame {}: render={:.2}ms, output={:.1}ms, faces={}",
                frame_count,
                avg_render_ms,
                avg_output_ms,
                face_count
            );
        }
    }

    tracing::info!("Replay finished: {} frames, {} faces", frame_count, face_count);
    Ok(())
}

/// Camera frame placed under the annotations with the overlay's transform,
/// or a black view when it is missing
fn background(
    path: Option<&Path>,
    (image_width, image_height): (i32, i32),
    transform: &Transform,
    (width, height): (u32, u32),
) -> RgbImage {
    let mut view = RgbImage::from_pixel(width, height, Rgb([0, 0, 0]));
    let Some(path) = path else {
        return view;
    };

    let mut frame = match image::open(path) {
        Ok(decoded) => decoded.to_rgb8(),
        Err(e) => {
            tracing::warn!("Skipping background {}: {}", path.display(), e);
            return view;
        }
    };

    // No mapping without a valid source size
    if *transform == Transform::NEUTRAL {
        return resized(frame, width, height);
    }

    // Annotations are flipped for front-camera frames, so the frame is too
    if transform.is_mirrored() {
        imageops::flip_horizontal_in_place(&mut frame);
    }

    let scaled_width = transform.scale_x(image_width as f32).round().max(1.0) as u32;
    let scaled_height = transform.scale_y(image_height as f32).round().max(1.0) as u32;
    let (offset_x, offset_y) = transform.offset();
    imageops::overlay(
        &mut view,
        &resized(frame, scaled_width, scaled_height),
        offset_x.round() as i64,
        offset_y.round() as i64,
    );
    view
}

fn resized(frame: RgbImage, width: u32, height: u32) -> RgbImage {
    if frame.dimensions() == (width, height) {
        frame
    } else {
        imageops::resize(&frame, width, height, FilterType::Lanczos3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use face_overlay::config::StyleConfig;
    use face_overlay::detection::{BoundingBox, FaceDetection};
    use face_overlay::overlay::palette;
    use face_overlay::source::DetectionFrame;
    use std::collections::VecDeque;

    const RED: Rgb<u8> = Rgb([255, 0, 0]);
    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

    struct Frames(VecDeque<DetectionFrame>);

    impl DetectionSource for Frames {
        fn next_frame(&mut self) -> Result<Option<DetectionFrame>> {
            Ok(self.0.pop_front())
        }
    }

    struct Collect {
        resolution: (u32, u32),
        frames: Vec<RgbImage>,
    }

    impl OutputSink for Collect {
        fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
            self.frames.push(frame.clone());
            Ok(())
        }

        fn resolution(&self) -> (u32, u32) {
            self.resolution
        }
    }

    /// Camera frame with the leftmost `red_width` columns painted red
    fn camera_frame(dir: &Path, width: u32, height: u32, red_width: u32) -> PathBuf {
        let image = RgbImage::from_fn(width, height, |x, _| if x < red_width { RED } else { BLACK });
        let path = dir.join("camera.png");
        image.save(&path).unwrap();
        path
    }

    #[test]
    fn mirrored_background_follows_the_annotations() {
        let dir = tempfile::tempdir().unwrap();
        let face = FaceDetection::new(BoundingBox::new(0.0, 0.0, 20.0, 50.0));
        let frame = DetectionFrame {
            image_width: 100,
            image_height: 50,
            mirrored: true,
            background: Some(camera_frame(dir.path(), 100, 50, 20)),
            faces: vec![face],
        };

        let overlay = Arc::new(GraphicOverlay::new(100, 50));
        let mut tracker = FaceTracker::new(overlay, StyleConfig::default(), TrackingPolicy::PerFrame);
        let mut source = Frames(VecDeque::from(vec![frame]));
        let mut output = Collect {
            resolution: (100, 50),
            frames: Vec::new(),
        };
        run_replay(&mut source, &mut tracker, &mut output, None).unwrap();

        let rendered = &output.frames[0];
        // The marker and the face pixels both land on the right-hand side
        assert_eq!(*rendered.get_pixel(90, 25), palette::GREEN);
        assert_eq!(*rendered.get_pixel(85, 10), RED);
        assert_eq!(*rendered.get_pixel(15, 10), BLACK);
    }

    #[test]
    fn background_is_placed_with_the_fit() {
        let dir = tempfile::tempdir().unwrap();
        let path = camera_frame(dir.path(), 50, 50, 50);
        let transform = Transform::fit(100.0, 50.0, 50.0, 50.0, false, FitMode::Letterbox);

        let view = background(Some(path.as_path()), (50, 50), &transform, (100, 50));
        assert_eq!(view.dimensions(), (100, 50));
        assert_eq!(*view.get_pixel(10, 25), BLACK);
        assert_eq!(*view.get_pixel(30, 25), RED);
        assert_eq!(*view.get_pixel(74, 25), RED);
        assert_eq!(*view.get_pixel(80, 25), BLACK);
    }

    #[test]
    fn missing_background_is_black() {
        let transform = Transform::fit(40.0, 20.0, 40.0, 20.0, true, FitMode::Stretch);
        let missing = Path::new("/nonexistent/frame.png");
        let view = background(Some(missing), (40, 20), &transform, (40, 20));
        assert!(view.pixels().all(|p| *p == BLACK));
        assert!(background(None, (40, 20), &transform, (40, 20))
            .pixels()
            .all(|p| *p == BLACK));
    }
}
