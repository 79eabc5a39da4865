use super::style::{AnnotationKind, AnnotationStyle};
use super::{Graphic, GraphicOverlay, RepaintSignal, Transform};
use crate::canvas::{Canvas, ViewRect};
use crate::detection::{is_available, FaceDetection, LandmarkKind, Point};
use anyhow::Result;
use std::sync::{Arc, PoisonError, RwLock};

/// Landmark annotations, each gated by its own toggle
const LANDMARKS: [(AnnotationKind, LandmarkKind); 4] = [
    (AnnotationKind::RightEyeLandmark, LandmarkKind::RightEye),
    (AnnotationKind::LeftEyeLandmark, LandmarkKind::LeftEye),
    (AnnotationKind::LeftCheekLandmark, LandmarkKind::LeftCheek),
    (AnnotationKind::RightCheekLandmark, LandmarkKind::RightCheek),
];

/// Renders the annotations of one face.
///
/// The detection pipeline publishes snapshots through [`FaceGraphic::update`]
/// from any thread; the render thread reads them in [`Graphic::draw`]. A
/// snapshot is swapped as a whole `Arc`, so a pass sees either the previous
/// detection or the new one.
pub struct FaceGraphic {
    face: RwLock<Option<Arc<FaceDetection>>>,
    style: RwLock<AnnotationStyle>,
    repaint: Arc<RepaintSignal>,
}

impl FaceGraphic {
    /// Graphic with the next colors of `overlay` and no optional annotations
    pub fn new(overlay: &GraphicOverlay) -> Self {
        Self::with_style(overlay, AnnotationStyle::new(overlay.next_colors()))
    }

    pub fn with_style(overlay: &GraphicOverlay, style: AnnotationStyle) -> Self {
        Self {
            face: RwLock::new(None),
            style: RwLock::new(style),
            repaint: overlay.repaint_signal(),
        }
    }

    /// Replace the face from the most recent frame and request a redraw
    pub fn update(&self, face: impl Into<Arc<FaceDetection>>) {
        let face = face.into();
        *self.face.write().unwrap_or_else(PoisonError::into_inner) = Some(face);
        self.repaint.request();
    }

    /// Drop the stored face; later passes draw nothing
    pub fn clear(&self) {
        *self.face.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.repaint.request();
    }

    pub fn snapshot(&self) -> Option<Arc<FaceDetection>> {
        self.face
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn style(&self) -> AnnotationStyle {
        *self.style.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_style(&self, style: AnnotationStyle) {
        *self.style.write().unwrap_or_else(PoisonError::into_inner) = style;
    }

    pub fn set_enabled(&self, kind: AnnotationKind, enabled: bool) {
        self.style
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .enabled
            .set(kind, enabled);
    }

    pub fn is_enabled(&self, kind: AnnotationKind) -> bool {
        self.style
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_enabled(kind)
    }

    fn draw_bounding_box(
        canvas: &mut dyn Canvas,
        face: &FaceDetection,
        anchor: Point,
        style: &AnnotationStyle,
        transform: &Transform,
    ) -> Result<()> {
        let x_offset = transform.scale_x(face.bounding_box.width() / 2.0);
        let y_offset = transform.scale_y(face.bounding_box.height() / 2.0);
        let rect = ViewRect::new(
            anchor.x - x_offset,
            anchor.y - y_offset,
            anchor.x + x_offset,
            anchor.y + y_offset,
        );
        canvas.draw_rect(rect, style.stroke_width, style.box_color)
    }

    fn draw_probabilities(
        canvas: &mut dyn Canvas,
        face: &FaceDetection,
        anchor: Point,
        style: &AnnotationStyle,
    ) -> Result<()> {
        let (dx, dy) = style.id_offset;
        let labels = [
            (
                AnnotationKind::SmilingProbability,
                "smiling",
                face.smiling_probability,
                (dx * 3.0, dy * 2.0),
            ),
            (
                AnnotationKind::RightEyeOpenProbability,
                "right eye",
                face.right_eye_open_probability,
                (-dx, 0.0),
            ),
            (
                AnnotationKind::LeftEyeOpenProbability,
                "left eye",
                face.left_eye_open_probability,
                (dx * 6.0, 0.0),
            ),
        ];

        for (kind, label, value, (ox, oy)) in labels {
            if !style.is_enabled(kind) || !is_available(value) {
                continue;
            }
            canvas.draw_text(
                &format!("{}: {:.2}", label, value),
                Point::new(anchor.x + ox, anchor.y + oy),
                style.text_size,
                style.text_color,
            )?;
        }
        Ok(())
    }
}

impl Graphic for FaceGraphic {
    fn draw(&self, canvas: &mut dyn Canvas, transform: &Transform) -> Result<()> {
        let Some(face) = self.snapshot() else {
            return Ok(());
        };
        let style = self.style();

        let anchor = transform.translate(face.bounding_box.center());
        canvas.draw_circle(anchor, style.marker_radius, style.marker_color)?;

        if style.is_enabled(AnnotationKind::TrackingId) {
            if let Some(id) = face.tracking_id() {
                let (dx, dy) = style.id_offset;
                canvas.draw_text(
                    &format!("id: {}", id),
                    Point::new(anchor.x + dx, anchor.y + dy),
                    style.text_size,
                    style.text_color,
                )?;
            }
        }

        if style.is_enabled(AnnotationKind::BoundingBox) {
            Self::draw_bounding_box(canvas, &face, anchor, &style, transform)?;
        }

        if style.is_enabled(AnnotationKind::Contour) {
            if let Some(contour) = face.contour(style.contour) {
                for point in &contour.points {
                    canvas.draw_circle(
                        transform.translate(*point),
                        style.marker_radius,
                        style.marker_color,
                    )?;
                }
            }
        }

        Self::draw_probabilities(canvas, &face, anchor, &style)?;

        for (kind, landmark) in LANDMARKS {
            if !style.is_enabled(kind) {
                continue;
            }
            if let Some(position) = face.landmark(landmark) {
                canvas.draw_circle(
                    transform.translate(position),
                    style.marker_radius,
                    style.marker_color,
                )?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DrawCommand, RecordingCanvas};
    use crate::detection::{BoundingBox, Contour, ContourKind, Landmark, UNCOMPUTED_PROBABILITY};
    use crate::overlay::palette::{CYAN, GREEN};
    use crate::overlay::AnnotationSet;

    fn overlay() -> GraphicOverlay {
        let overlay = GraphicOverlay::new(640, 360);
        overlay.set_image_source_size(1280, 720, false);
        overlay
    }

    fn face_at(x: f32, y: f32) -> FaceDetection {
        FaceDetection::new(BoundingBox::from_center(Point::new(x, y), 200.0, 100.0))
    }

    fn draw(overlay: &GraphicOverlay, graphic: &FaceGraphic) -> RecordingCanvas {
        let mut canvas = RecordingCanvas::new(640, 360);
        graphic.draw(&mut canvas, &overlay.transform()).unwrap();
        canvas
    }

    #[test]
    fn draws_nothing_before_update() {
        let overlay = overlay();
        let graphic = FaceGraphic::new(&overlay);
        graphic.set_style(graphic.style().with_enabled(AnnotationSet::all()));

        assert!(draw(&overlay, &graphic).commands().is_empty());
    }

    #[test]
    fn marker_uses_allocated_colors() {
        let overlay = overlay();
        let graphic = FaceGraphic::new(&overlay);
        assert_eq!(graphic.style().marker_color, GREEN);
        assert_eq!(graphic.style().text_color, CYAN);

        graphic.update(face_at(640.0, 360.0));
        let canvas = draw(&overlay, &graphic);
        assert_eq!(
            canvas.commands(),
            &[DrawCommand::Circle {
                center: Point::new(320.0, 180.0),
                radius: 7.0,
                color: GREEN,
            }]
        );
    }

    #[test]
    fn bounding_box_is_centered_on_anchor() {
        let overlay = overlay();
        let graphic = FaceGraphic::new(&overlay);
        graphic.set_enabled(AnnotationKind::BoundingBox, true);
        graphic.update(face_at(640.0, 360.0));

        let canvas = draw(&overlay, &graphic);
        let rects: Vec<_> = canvas.rects().collect();
        assert_eq!(rects, vec![ViewRect::new(270.0, 155.0, 370.0, 205.0)]);
    }

    #[test]
    fn tracking_id_only_when_present() {
        let overlay = overlay();
        let graphic = FaceGraphic::new(&overlay);
        graphic.set_enabled(AnnotationKind::TrackingId, true);

        graphic.update(face_at(640.0, 360.0));
        assert_eq!(draw(&overlay, &graphic).texts().count(), 0);

        let mut face = face_at(640.0, 360.0);
        face.tracking_id = Some(12);
        graphic.update(face);
        let canvas = draw(&overlay, &graphic);
        let texts: Vec<_> = canvas.texts().collect();
        assert_eq!(texts, vec![("id: 12", Point::new(250.0, 260.0))]);
    }

    #[test]
    fn probabilities_use_fixed_offsets_and_two_decimals() {
        let overlay = overlay();
        let graphic = FaceGraphic::new(&overlay);
        graphic.set_enabled(AnnotationKind::SmilingProbability, true);
        graphic.set_enabled(AnnotationKind::RightEyeOpenProbability, true);
        graphic.set_enabled(AnnotationKind::LeftEyeOpenProbability, true);

        let mut face = face_at(640.0, 360.0);
        face.smiling_probability = 0.876;
        face.right_eye_open_probability = 0.0;
        face.left_eye_open_probability = 1.0;
        graphic.update(face);

        let canvas = draw(&overlay, &graphic);
        let texts: Vec<_> = canvas.texts().collect();
        assert_eq!(
            texts,
            vec![
                ("smiling: 0.88", Point::new(110.0, 340.0)),
                ("right eye: 0.00", Point::new(390.0, 180.0)),
                ("left eye: 1.00", Point::new(-100.0, 180.0)),
            ]
        );
    }

    #[test]
    fn uncomputed_probability_is_skipped() {
        let overlay = overlay();
        let graphic = FaceGraphic::new(&overlay);
        graphic.set_enabled(AnnotationKind::SmilingProbability, true);

        let mut face = face_at(640.0, 360.0);
        face.smiling_probability = UNCOMPUTED_PROBABILITY;
        graphic.update(face);

        assert_eq!(draw(&overlay, &graphic).texts().count(), 0);
    }

    #[test]
    fn contour_points_are_translated() {
        let overlay = overlay();
        let graphic = FaceGraphic::new(&overlay);
        graphic.set_enabled(AnnotationKind::Contour, true);

        let mut face = face_at(640.0, 360.0);
        face.contours.push(Contour {
            kind: ContourKind::AllPoints,
            points: vec![Point::new(0.0, 0.0), Point::new(100.0, 200.0)],
        });
        face.contours.push(Contour {
            kind: ContourKind::NoseBridge,
            points: vec![Point::new(4.0, 4.0)],
        });
        graphic.update(face);

        let canvas = draw(&overlay, &graphic);
        let centers: Vec<_> = canvas.circles().map(|(p, _)| p).collect();
        assert_eq!(
            centers,
            vec![
                Point::new(320.0, 180.0),
                Point::new(0.0, 0.0),
                Point::new(50.0, 100.0),
            ]
        );
    }

    #[test]
    fn each_landmark_toggle_gates_its_own_landmark() {
        let overlay = overlay();
        let graphic = FaceGraphic::new(&overlay);
        graphic.set_enabled(AnnotationKind::LeftEyeLandmark, true);

        let mut face = face_at(640.0, 360.0);
        face.landmarks = vec![
            Landmark {
                kind: LandmarkKind::RightEye,
                position: Some(Point::new(600.0, 300.0)),
            },
            Landmark {
                kind: LandmarkKind::LeftEye,
                position: Some(Point::new(680.0, 300.0)),
            },
            Landmark {
                kind: LandmarkKind::LeftCheek,
                position: Some(Point::new(700.0, 400.0)),
            },
        ];
        graphic.update(face);

        let canvas = draw(&overlay, &graphic);
        let centers: Vec<_> = canvas.circles().map(|(p, _)| p).collect();
        assert_eq!(centers, vec![Point::new(320.0, 180.0), Point::new(340.0, 150.0)]);
    }

    #[test]
    fn missing_landmarks_are_skipped() {
        let overlay = overlay();
        let graphic = FaceGraphic::new(&overlay);
        graphic.set_style(graphic.style().with_enabled(AnnotationSet::all()));

        let mut face = face_at(640.0, 360.0);
        face.landmarks.push(Landmark {
            kind: LandmarkKind::RightCheek,
            position: None,
        });
        graphic.update(face);

        let canvas = draw(&overlay, &graphic);
        // Marker and box only
        assert_eq!(canvas.circles().count(), 1);
        assert_eq!(canvas.rects().count(), 1);
        assert_eq!(canvas.texts().count(), 0);
    }

    #[test]
    fn update_and_clear_request_repaint() {
        let overlay = overlay();
        let signal = overlay.repaint_signal();
        signal.take();

        let graphic = FaceGraphic::new(&overlay);
        graphic.update(face_at(1.0, 1.0));
        assert!(signal.take());

        graphic.clear();
        assert!(signal.take());
        assert!(graphic.snapshot().is_none());
        assert!(draw(&overlay, &graphic).commands().is_empty());
    }
}
