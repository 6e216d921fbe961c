//! The canvas history aggregate: one base snapshot plus an append-only delta log.
//!
//! A document is a plain in-memory value. Callers that share one between
//! threads must serialize access themselves.

use log::{debug, error, info};
use serde::Serialize;
use thiserror::Error;

use crate::compression::delta::{ChangeRecord, DeltaError};
use crate::compression::palette::{indices_to_pixels, pixels_to_indices, PaletteError};
use crate::format::header::valid_dimensions;
use crate::format::{
    decode, encode, BaseSnapshot, DecodeError, DeltaBlock, EncodeError, FileHeader, WriteOptions,
};

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Dimension mismatch: document is {expected:?}, image is {actual:?}")]
    DimensionMismatch {
        expected: (u16, u16),
        actual: (u16, u16),
    },
    #[error("Invalid canvas dimensions {width}x{height}")]
    InvalidDimensions { width: u16, height: u16 },
    #[error("Timestamp {found} is older than the latest stored timestamp {latest}")]
    TimestampRegression { latest: u32, found: u32 },

    #[error("Palette mapping failed")]
    Palette(#[from] PaletteError),
    #[error("Change record packing failed")]
    Delta(#[from] DeltaError),
    #[error("Failed to parse document")]
    Decode(#[from] DecodeError),
    #[error("Failed to serialize document")]
    Encode(#[from] EncodeError),
}

/// Summary of a document, as shown by catalogs and the `info` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub version: u16,
    pub width: u16,
    pub height: u16,
    pub origin_x: u16,
    pub origin_y: u16,
    pub base_timestamp: u32,
    pub latest_timestamp: u32,
    pub delta_count: usize,
}

/// The canvas as it looked at some cutoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub width: u16,
    pub height: u16,
    pub origin_x: u16,
    pub origin_y: u16,
    /// Timestamp of the last block that was applied.
    pub timestamp: u32,
    pub indices: Vec<u8>,
    /// RGBA, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct CanvasDocument {
    header: FileHeader,
    base: BaseSnapshot,
    deltas: Vec<DeltaBlock>,
    materialized: Vec<u8>,
    latest_timestamp: u32,
}

impl CanvasDocument {
    /// Builds a document from a full file buffer. Nothing is kept on error.
    pub fn parse(buffer: &[u8]) -> Result<Self, DocumentError> {
        let decoded = decode(buffer)?;
        Ok(Self {
            header: decoded.header,
            base: decoded.base,
            deltas: decoded.deltas,
            materialized: decoded.materialized,
            latest_timestamp: decoded.latest_timestamp,
        })
    }

    /// Starts a new history whose base snapshot is `pixels`.
    pub fn from_image(
        pixels: &[u8],
        width: u16,
        height: u16,
        origin_x: u16,
        origin_y: u16,
        timestamp: u32,
    ) -> Result<Self, DocumentError> {
        if !valid_dimensions(width, height) {
            error!("Refusing to create a {}x{} canvas", width, height);
            return Err(DocumentError::InvalidDimensions { width, height });
        }

        let indices = pixels_to_indices(pixels, width, height)?;
        info!(
            "Created {}x{} document at ({}, {}) with base timestamp {}",
            width, height, origin_x, origin_y, timestamp
        );

        Ok(Self {
            header: FileHeader::new(width, height, origin_x, origin_y),
            materialized: indices.clone(),
            base: BaseSnapshot { timestamp, indices },
            deltas: Vec::new(),
            latest_timestamp: timestamp,
        })
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn width(&self) -> u16 {
        self.header.width
    }

    pub fn height(&self) -> u16 {
        self.header.height
    }

    pub fn base_timestamp(&self) -> u32 {
        self.base.timestamp
    }

    pub fn latest_timestamp(&self) -> u32 {
        self.latest_timestamp
    }

    pub fn base_indices(&self) -> &[u8] {
        &self.base.indices
    }

    /// Current state: the base with the whole delta log applied.
    pub fn indices(&self) -> &[u8] {
        &self.materialized
    }

    pub fn deltas(&self) -> &[DeltaBlock] {
        &self.deltas
    }

    /// Base timestamp followed by every delta timestamp, in log order.
    pub fn timestamps(&self) -> Vec<u32> {
        std::iter::once(self.base.timestamp)
            .chain(self.deltas.iter().map(|delta| delta.timestamp))
            .collect()
    }

    pub fn metadata(&self) -> Metadata {
        Metadata {
            version: self.header.version,
            width: self.header.width,
            height: self.header.height,
            origin_x: self.header.origin_x,
            origin_y: self.header.origin_y,
            base_timestamp: self.base.timestamp,
            latest_timestamp: self.latest_timestamp,
            delta_count: self.deltas.len(),
        }
    }

    /// Replays the log onto a copy of the base, stopping at the first delta
    /// newer than `cutoff`. Returns the grid and the last applied timestamp.
    fn indices_at(&self, cutoff: u32) -> (Vec<u8>, u32) {
        let width = self.header.width;
        let mut indices = self.base.indices.clone();
        let mut timestamp = self.base.timestamp;

        for delta in self.deltas.iter().take_while(|delta| delta.timestamp <= cutoff) {
            for record in &delta.records {
                indices[record.cell(width)] = record.id;
            }
            timestamp = delta.timestamp;
        }

        (indices, timestamp)
    }

    /// RGBA pixels of the canvas as of `cutoff` (inclusive).
    pub fn render_at(&self, cutoff: u32) -> Result<Vec<u8>, DocumentError> {
        let (indices, _) = self.indices_at(cutoff);
        Ok(indices_to_pixels(&indices)?)
    }

    /// RGBA pixels with the full history applied.
    pub fn render_latest(&self) -> Result<Vec<u8>, DocumentError> {
        Ok(indices_to_pixels(&self.materialized)?)
    }

    pub fn snapshot_at(&self, cutoff: u32) -> Result<Snapshot, DocumentError> {
        let (indices, timestamp) = self.indices_at(cutoff);
        let pixels = indices_to_pixels(&indices)?;
        Ok(Snapshot {
            width: self.header.width,
            height: self.header.height,
            origin_x: self.header.origin_x,
            origin_y: self.header.origin_y,
            timestamp,
            indices,
            pixels,
        })
    }

    /// Records `pixels` as the state at `timestamp`.
    ///
    /// Returns `false` without touching the document when nothing changed.
    /// On any error the document is left as it was.
    pub fn append_image(
        &mut self,
        pixels: &[u8],
        width: u16,
        height: u16,
        timestamp: u32,
    ) -> Result<bool, DocumentError> {
        if (width, height) != (self.header.width, self.header.height) {
            error!(
                "Dimension mismatch: expected {}x{}, got {}x{}",
                self.header.width, self.header.height, width, height
            );
            return Err(DocumentError::DimensionMismatch {
                expected: (self.header.width, self.header.height),
                actual: (width, height),
            });
        }
        if timestamp < self.latest_timestamp {
            error!(
                "Timestamp {} is older than {}",
                timestamp, self.latest_timestamp
            );
            return Err(DocumentError::TimestampRegression {
                latest: self.latest_timestamp,
                found: timestamp,
            });
        }

        let new_indices = pixels_to_indices(pixels, width, height)?;

        let mut records = Vec::new();
        for (cell, (&new_id, &old_id)) in new_indices.iter().zip(&self.materialized).enumerate() {
            if new_id != old_id {
                let dx = (cell % width as usize) as u16;
                let dy = (cell / width as usize) as u16;
                records.push(ChangeRecord::new(dx, dy, new_id)?);
            }
        }

        if records.is_empty() {
            debug!("Image at {} matches the current state, nothing appended", timestamp);
            return Ok(false);
        }

        info!(
            "Appending delta at {} with {} changed cells",
            timestamp,
            records.len()
        );
        self.deltas.push(DeltaBlock { timestamp, records });
        self.materialized = new_indices;
        self.latest_timestamp = timestamp;
        Ok(true)
    }

    pub fn serialize(&self) -> Result<Vec<u8>, DocumentError> {
        self.serialize_with(&WriteOptions::default())
    }

    pub fn serialize_with(&self, options: &WriteOptions) -> Result<Vec<u8>, DocumentError> {
        Ok(encode(&self.header, &self.base, &self.deltas, options)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(rgb: [u8; 3], cells: usize) -> Vec<u8> {
        [rgb[0], rgb[1], rgb[2], 255].repeat(cells)
    }

    #[test]
    fn test_document_from_image_rejects_zero_width() {
        let result = CanvasDocument::from_image(&[], 0, 4, 0, 0, 1);
        assert!(matches!(
            result,
            Err(DocumentError::InvalidDimensions { width: 0, height: 4 })
        ));
    }

    #[test]
    fn test_document_from_image_rejects_oversized_canvas() {
        let pixels = solid([255, 255, 255], 1025);
        let result = CanvasDocument::from_image(&pixels, 1025, 1, 0, 0, 1);
        assert!(matches!(
            result,
            Err(DocumentError::InvalidDimensions { width: 1025, .. })
        ));
    }

    #[test]
    fn test_document_timestamps() {
        let white = solid([255, 255, 255], 4);
        let mut gray = white.clone();
        gray[0..3].copy_from_slice(&[60, 60, 60]);

        let mut doc = CanvasDocument::from_image(&white, 2, 2, 0, 0, 10).unwrap();
        assert!(doc.append_image(&gray, 2, 2, 20).unwrap());
        assert!(doc.append_image(&white, 2, 2, 20).unwrap());
        assert_eq!(doc.timestamps(), vec![10, 20, 20]);
        assert_eq!(doc.latest_timestamp(), 20);
    }

    #[test]
    fn test_document_rejects_older_timestamp() {
        let white = solid([255, 255, 255], 4);
        let gray = solid([60, 60, 60], 4);

        let mut doc = CanvasDocument::from_image(&white, 2, 2, 0, 0, 100).unwrap();
        let result = doc.append_image(&gray, 2, 2, 99);
        assert!(matches!(
            result,
            Err(DocumentError::TimestampRegression { latest: 100, found: 99 })
        ));
        assert!(doc.deltas().is_empty());
        assert_eq!(doc.indices(), &[5, 5, 5, 5]);
    }

    #[test]
    fn test_document_unknown_color_leaves_state() {
        let white = solid([255, 255, 255], 4);
        let mut bad = white.clone();
        bad[4..7].copy_from_slice(&[1, 2, 3]);

        let mut doc = CanvasDocument::from_image(&white, 2, 2, 0, 0, 1).unwrap();
        let result = doc.append_image(&bad, 2, 2, 2);
        assert!(matches!(
            result,
            Err(DocumentError::Palette(PaletteError::UnknownColor { r: 1, g: 2, b: 3 }))
        ));
        assert!(doc.deltas().is_empty());
        assert_eq!(doc.latest_timestamp(), 1);
    }

    #[test]
    fn test_document_snapshot_reports_applied_timestamp() {
        let white = solid([255, 255, 255], 4);
        let gray = solid([60, 60, 60], 4);

        let mut doc = CanvasDocument::from_image(&white, 2, 2, 3, 4, 100).unwrap();
        doc.append_image(&gray, 2, 2, 200).unwrap();

        let early = doc.snapshot_at(150).unwrap();
        assert_eq!(early.timestamp, 100);
        assert_eq!(early.indices, vec![5; 4]);
        assert_eq!((early.origin_x, early.origin_y), (3, 4));

        let late = doc.snapshot_at(u32::MAX).unwrap();
        assert_eq!(late.timestamp, 200);
        assert_eq!(late.pixels, gray);
    }

    #[test]
    fn test_document_transparent_pixels() {
        let mut pixels = solid([255, 255, 255], 2);
        pixels[4..8].copy_from_slice(&[9, 9, 9, 0]);

        let doc = CanvasDocument::from_image(&pixels, 2, 1, 0, 0, 1).unwrap();
        assert_eq!(doc.base_indices(), &[5, 0]);
        assert_eq!(
            doc.render_latest().unwrap(),
            vec![255, 255, 255, 255, 0, 0, 0, 0]
        );
    }
}
