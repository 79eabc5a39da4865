use super::OutputSink;
use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::RgbImage;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes each frame as a numbered PNG (`frame_00000.png`, ...)
pub struct ImageSequenceOutput {
    dir: PathBuf,
    width: u32,
    height: u32,
    next_index: u64,
}

impl ImageSequenceOutput {
    pub fn new<P: AsRef<Path>>(dir: P, width: u32, height: u32) -> Result<Self> {
        let dir = dir.as_ref();
        tracing::info!(
            "Writing annotated frames to {} ({}x{})",
            dir.display(),
            width,
            height
        );

        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

        Ok(Self {
            dir: dir.to_path_buf(),
            width,
            height,
            next_index: 0,
        })
    }

    pub fn frames_written(&self) -> u64 {
        self.next_index
    }

    fn frame_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("frame_{:05}.png", index))
    }
}

impl OutputSink for ImageSequenceOutput {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        let path = self.frame_path(self.next_index);

        if frame.dimensions() != (self.width, self.height) {
            let resized = imageops::resize(frame, self.width, self.height, FilterType::Lanczos3);
            resized
                .save(&path)
                .with_context(|| format!("Failed to write frame {}", path.display()))?;
        } else {
            frame
                .save(&path)
                .with_context(|| format!("Failed to write frame {}", path.display()))?;
        }

        self.next_index += 1;
        Ok(())
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
