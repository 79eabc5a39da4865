use crate::config::StyleConfig;
use crate::overlay::{FaceGraphic, Graphic, GraphicOverlay};
use crate::source::DetectionFrame;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// When face graphics are created and discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackingPolicy {
    /// Fresh graphics for every face on every frame
    #[default]
    PerFrame,
    /// One graphic per tracking id, kept while the id keeps appearing
    ById,
}

/// Routes detection frames to face graphics on an overlay
pub struct FaceTracker {
    overlay: Arc<GraphicOverlay>,
    style: StyleConfig,
    policy: TrackingPolicy,
    tracked: HashMap<i32, Arc<FaceGraphic>>,
}

impl FaceTracker {
    pub fn new(overlay: Arc<GraphicOverlay>, style: StyleConfig, policy: TrackingPolicy) -> Self {
        Self {
            overlay,
            style,
            policy,
            tracked: HashMap::new(),
        }
    }

    pub fn overlay(&self) -> &Arc<GraphicOverlay> {
        &self.overlay
    }

    /// Number of faces currently kept across frames
    pub fn tracked_len(&self) -> usize {
        self.tracked.len()
    }

    pub fn graphic_for(&self, tracking_id: i32) -> Option<&Arc<FaceGraphic>> {
        self.tracked.get(&tracking_id)
    }

    fn new_graphic(&self) -> Arc<FaceGraphic> {
        let style = self.style.style(self.overlay.next_colors());
        Arc::new(FaceGraphic::with_style(&self.overlay, style))
    }

    /// Apply one frame of detections
    pub fn apply(&mut self, frame: DetectionFrame) {
        self.overlay
            .set_image_source_size(frame.image_width, frame.image_height, frame.mirrored);

        if frame.faces.is_empty() {
            tracing::debug!("No face found");
        }

        match self.policy {
            TrackingPolicy::PerFrame => self.apply_per_frame(frame),
            TrackingPolicy::ById => self.apply_by_id(frame),
        }
    }

    fn apply_per_frame(&mut self, frame: DetectionFrame) {
        self.overlay.clear();
        for face in frame.faces {
            let graphic = self.new_graphic();
            self.overlay.add(graphic.clone());
            graphic.update(face);
        }
    }

    fn apply_by_id(&mut self, frame: DetectionFrame) {
        let mut seen: HashMap<i32, Arc<FaceGraphic>> = HashMap::new();
        let mut graphics: Vec<Arc<FaceGraphic>> = Vec::with_capacity(frame.faces.len());

        for face in frame.faces {
            // A repeated id within one frame is drawn but not tracked
            let graphic = match face.tracking_id() {
                Some(id) if !seen.contains_key(&id) => {
                    let graphic = self.tracked.remove(&id).unwrap_or_else(|| {
                        tracing::debug!("New face {}", id);
                        self.new_graphic()
                    });
                    seen.insert(id, graphic.clone());
                    graphic
                }
                _ => self.new_graphic(),
            };
            graphic.update(face);
            graphics.push(graphic);
        }

        for id in self.tracked.keys() {
            tracing::debug!("Face {} lost", id);
        }
        self.tracked = seen;

        self.overlay.clear();
        for graphic in graphics {
            let graphic: Arc<dyn Graphic> = graphic;
            self.overlay.add(graphic);
        }
    }
}
