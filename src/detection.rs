use serde::{Deserialize, Serialize};

/// Value reported by the detector when a classification was not computed.
pub const UNCOMPUTED_PROBABILITY: f32 = -1.0;

/// A 2D point in image-space or view-space, depending on context
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned face bounds in image-space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl BoundingBox {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build a box from its center and full extents
    pub fn from_center(center: Point, width: f32, height: f32) -> Self {
        Self {
            left: center.x - width / 2.0,
            top: center.y - height / 2.0,
            right: center.x + width / 2.0,
            bottom: center.y + height / 2.0,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    pub fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }

    pub fn center(&self) -> Point {
        Point::new(self.center_x(), self.center_y())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkKind {
    MouthBottom,
    MouthLeft,
    MouthRight,
    LeftEar,
    RightEar,
    LeftEye,
    RightEye,
    LeftCheek,
    RightCheek,
    NoseBase,
}

/// A single named point. The detector may report the landmark without a
/// position, which is treated the same as not reporting it at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub kind: LandmarkKind,
    #[serde(default)]
    pub position: Option<Point>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContourKind {
    #[default]
    AllPoints,
    Face,
    LeftEyebrowTop,
    LeftEyebrowBottom,
    RightEyebrowTop,
    RightEyebrowBottom,
    LeftEye,
    RightEye,
    UpperLipTop,
    UpperLipBottom,
    LowerLipTop,
    LowerLipBottom,
    NoseBridge,
    NoseBottom,
}

/// An ordered outline of points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    pub kind: ContourKind,
    #[serde(default)]
    pub points: Vec<Point>,
}

fn uncomputed() -> f32 {
    UNCOMPUTED_PROBABILITY
}

/// One face as reported by the detector for a single frame.
///
/// Instances are immutable once built; the overlay only ever swaps whole
/// values, never edits one in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceDetection {
    pub bounding_box: BoundingBox,
    #[serde(default)]
    pub tracking_id: Option<i32>,
    #[serde(default = "uncomputed")]
    pub smiling_probability: f32,
    #[serde(default = "uncomputed")]
    pub left_eye_open_probability: f32,
    #[serde(default = "uncomputed")]
    pub right_eye_open_probability: f32,
    /// Rotation around the vertical axis, in degrees
    #[serde(default)]
    pub head_euler_y: f32,
    /// Rotation around the axis pointing out of the image, in degrees
    #[serde(default)]
    pub head_euler_z: f32,
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
    #[serde(default)]
    pub contours: Vec<Contour>,
}

impl FaceDetection {
    /// A detection carrying nothing but its bounds
    pub fn new(bounding_box: BoundingBox) -> Self {
        Self {
            bounding_box,
            tracking_id: None,
            smiling_probability: UNCOMPUTED_PROBABILITY,
            left_eye_open_probability: UNCOMPUTED_PROBABILITY,
            right_eye_open_probability: UNCOMPUTED_PROBABILITY,
            head_euler_y: 0.0,
            head_euler_z: 0.0,
            landmarks: Vec::new(),
            contours: Vec::new(),
        }
    }

    /// Tracking id, with negative ids treated as untracked
    pub fn tracking_id(&self) -> Option<i32> {
        self.tracking_id.filter(|id| *id >= 0)
    }

    pub fn landmark(&self, kind: LandmarkKind) -> Option<Point> {
        self.landmarks
            .iter()
            .find(|landmark| landmark.kind == kind)
            .and_then(|landmark| landmark.position)
    }

    pub fn contour(&self, kind: ContourKind) -> Option<&Contour> {
        self.contours.iter().find(|contour| contour.kind == kind)
    }
}

/// Whether a classification value was actually computed
pub fn is_available(probability: f32) -> bool {
    probability >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_center_and_extents() {
        let bounds = BoundingBox::new(100.0, 50.0, 300.0, 250.0);
        assert_eq!(bounds.width(), 200.0);
        assert_eq!(bounds.height(), 200.0);
        assert_eq!(bounds.center(), Point::new(200.0, 150.0));

        let rebuilt = BoundingBox::from_center(bounds.center(), 200.0, 200.0);
        assert_eq!(rebuilt, bounds);
    }

    #[test]
    fn negative_tracking_id_is_untracked() {
        let mut face = FaceDetection::new(BoundingBox::default());
        face.tracking_id = Some(-1);
        assert_eq!(face.tracking_id(), None);
        face.tracking_id = Some(4);
        assert_eq!(face.tracking_id(), Some(4));
    }

    #[test]
    fn landmark_without_position_is_absent() {
        let mut face = FaceDetection::new(BoundingBox::default());
        face.landmarks.push(Landmark {
            kind: LandmarkKind::LeftEye,
            position: None,
        });
        face.landmarks.push(Landmark {
            kind: LandmarkKind::RightEye,
            position: Some(Point::new(3.0, 4.0)),
        });

        assert_eq!(face.landmark(LandmarkKind::LeftEye), None);
        assert_eq!(face.landmark(LandmarkKind::RightEye), Some(Point::new(3.0, 4.0)));
        assert_eq!(face.landmark(LandmarkKind::NoseBase), None);
    }

    #[test]
    fn missing_probabilities_deserialize_as_uncomputed() {
        let json = r#"{"bounding_box":{"left":0,"top":0,"right":10,"bottom":10},"smiling_probability":0.75}"#;
        let face: FaceDetection = serde_json::from_str(json).unwrap();

        assert_eq!(face.smiling_probability, 0.75);
        assert_eq!(face.left_eye_open_probability, UNCOMPUTED_PROBABILITY);
        assert!(!is_available(face.right_eye_open_probability));
        assert!(face.landmarks.is_empty());
        assert!(face.contour(ContourKind::AllPoints).is_none());
    }
}
