// src/source.rs
//
// Boundary to the upstream person detector. The core consumes one frame's
// worth of detections at a time and assumes nothing about their order. The
// JSONL source replays recorded detector output (one JSON array of
// detections per line), which keeps the pipeline runnable and testable
// without a camera or an inference runtime.

use crate::types::Detection;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub trait DetectionSource {
    /// Next frame's detections, or `None` at end of stream.
    fn next_frame(&mut self) -> Result<Option<Vec<Detection>>>;
}

pub struct JsonlDetectionSource<R> {
    reader: R,
    line_number: u64,
}

impl JsonlDetectionSource<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("failed to open detections file {}", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> JsonlDetectionSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
        }
    }
}

impl<R: BufRead> DetectionSource for JsonlDetectionSource<R> {
    fn next_frame(&mut self) -> Result<Option<Vec<Detection>>> {
        let mut line = String::new();
        loop {
            line.clear();
            self.line_number += 1;
            let read = self
                .reader
                .read_line(&mut line)
                .with_context(|| format!("failed to read detections line {}", self.line_number))?;
            if read == 0 {
                return Ok(None);
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let detections: Vec<Detection> = serde_json::from_str(trimmed)
                .with_context(|| format!("malformed detections on line {}", self.line_number))?;
            return Ok(Some(detections));
        }
    }
}
