use image::Rgb;
use serde::{Deserialize, Serialize};

use super::palette::ColorPair;
use crate::detection::ContourKind;

pub const FACE_POSITION_RADIUS: f32 = 7.0;
pub const ID_TEXT_SIZE: f32 = 50.0;
pub const ID_X_OFFSET: f32 = -70.0;
pub const ID_Y_OFFSET: f32 = 80.0;
pub const BOX_STROKE_WIDTH: f32 = 5.0;

/// Optional annotation classes; the position marker is always drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    BoundingBox,
    Contour,
    SmilingProbability,
    RightEyeOpenProbability,
    LeftEyeOpenProbability,
    RightEyeLandmark,
    LeftEyeLandmark,
    LeftCheekLandmark,
    RightCheekLandmark,
    TrackingId,
}

impl AnnotationKind {
    pub const ALL: [AnnotationKind; 10] = [
        AnnotationKind::BoundingBox,
        AnnotationKind::Contour,
        AnnotationKind::SmilingProbability,
        AnnotationKind::RightEyeOpenProbability,
        AnnotationKind::LeftEyeOpenProbability,
        AnnotationKind::RightEyeLandmark,
        AnnotationKind::LeftEyeLandmark,
        AnnotationKind::LeftCheekLandmark,
        AnnotationKind::RightCheekLandmark,
        AnnotationKind::TrackingId,
    ];

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// Set of enabled annotation classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<AnnotationKind>", into = "Vec<AnnotationKind>")]
pub struct AnnotationSet(u16);

impl AnnotationSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        AnnotationKind::ALL.into_iter().collect()
    }

    pub fn contains(&self, kind: AnnotationKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn insert(&mut self, kind: AnnotationKind) {
        self.0 |= kind.bit();
    }

    pub fn remove(&mut self, kind: AnnotationKind) {
        self.0 &= !kind.bit();
    }

    pub fn set(&mut self, kind: AnnotationKind, enabled: bool) {
        if enabled {
            self.insert(kind);
        } else {
            self.remove(kind);
        }
    }

    pub fn with(mut self, kind: AnnotationKind) -> Self {
        self.insert(kind);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = AnnotationKind> + '_ {
        AnnotationKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

impl FromIterator<AnnotationKind> for AnnotationSet {
    fn from_iter<I: IntoIterator<Item = AnnotationKind>>(iter: I) -> Self {
        let mut set = Self::empty();
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

impl From<Vec<AnnotationKind>> for AnnotationSet {
    fn from(kinds: Vec<AnnotationKind>) -> Self {
        kinds.into_iter().collect()
    }
}

impl From<AnnotationSet> for Vec<AnnotationKind> {
    fn from(set: AnnotationSet) -> Self {
        set.iter().collect()
    }
}

/// Drawing parameters of one face graphic
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationStyle {
    pub marker_color: Rgb<u8>,
    pub text_color: Rgb<u8>,
    pub box_color: Rgb<u8>,
    pub marker_radius: f32,
    pub stroke_width: f32,
    pub text_size: f32,
    /// Offset of the id label from the face position
    pub id_offset: (f32, f32),
    /// Contour drawn when `AnnotationKind::Contour` is enabled
    pub contour: ContourKind,
    pub enabled: AnnotationSet,
}

impl AnnotationStyle {
    /// Default geometry with the given colors and nothing optional enabled
    pub fn new(colors: ColorPair) -> Self {
        Self {
            marker_color: colors.marker,
            text_color: colors.text,
            box_color: colors.marker,
            marker_radius: FACE_POSITION_RADIUS,
            stroke_width: BOX_STROKE_WIDTH,
            text_size: ID_TEXT_SIZE,
            id_offset: (ID_X_OFFSET, ID_Y_OFFSET),
            contour: ContourKind::AllPoints,
            enabled: AnnotationSet::empty(),
        }
    }

    pub fn with_enabled(mut self, enabled: AnnotationSet) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_enabled(&self, kind: AnnotationKind) -> bool {
        self.enabled.contains(kind)
    }
}
