use super::{DetectionFrame, DetectionSource};
use crate::error::Error;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

/// Recorded detections, one JSON `DetectionFrame` per line.
///
/// Blank lines are skipped. Relative background paths are resolved against
/// the directory of the recording.
pub struct JsonLinesSource<R: BufRead> {
    lines: Lines<R>,
    line: usize,
    base_dir: Option<PathBuf>,
}

impl JsonLinesSource<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("Opening detection recording {}", path.display());

        let file = File::open(path)
            .with_context(|| format!("Failed to open detections from {}", path.display()))?;

        let mut source = Self::from_reader(BufReader::new(file));
        source.base_dir = path.parent().map(Path::to_path_buf);
        Ok(source)
    }
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
            base_dir: None,
        }
    }
}

impl<R: BufRead> DetectionSource for JsonLinesSource<R> {
    fn next_frame(&mut self) -> Result<Option<DetectionFrame>> {
        for line in self.lines.by_ref() {
            self.line += 1;
            let line = line.with_context(|| format!("Failed to read line {}", self.line))?;
            if line.trim().is_empty() {
                continue;
            }

            let mut frame: DetectionFrame =
                serde_json::from_str(&line).map_err(|source| Error::FrameParse {
                    line: self.line,
                    source,
                })?;

            if let (Some(base), Some(background)) = (&self.base_dir, frame.background.as_mut()) {
                if background.is_relative() {
                    *background = base.join(&*background);
                }
            }

            tracing::debug!(
                "Line {}: {} faces in {}x{} frame",
                self.line,
                frame.faces.len(),
                frame.image_width,
                frame.image_height
            );
            return Ok(Some(frame));
        }
        Ok(None)
    }
}
