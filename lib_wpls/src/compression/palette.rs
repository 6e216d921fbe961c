use std::collections::HashMap;

use once_cell::sync::Lazy;
use thiserror::Error;

use crate::constants::PALETTE_SIZE;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PaletteError {
    #[error("Unknown color: ({r}, {g}, {b}) is not part of the palette")]
    UnknownColor { r: u8, g: u8, b: u8 },
    #[error("Invalid palette id: {0} exceeds palette size of 64")]
    InvalidId(u8),
    #[error("Invalid pixel data length: expected {expected} bytes, got {actual}")]
    InvalidPixelDataLength { expected: usize, actual: usize },
}

/// The fixed canvas palette. Id 0 doubles as the transparent marker, which is
/// why it shares its RGB value with id 1.
#[rustfmt::skip]
pub const PALETTE: [[u8; 3]; PALETTE_SIZE] = [
    [0, 0, 0], [0, 0, 0], [60, 60, 60], [120, 120, 120],
    [210, 210, 210], [255, 255, 255], [96, 0, 24], [237, 28, 36],
    [255, 127, 39], [246, 170, 9], [249, 221, 59], [255, 250, 188],
    [14, 185, 104], [19, 230, 123], [135, 255, 94], [12, 129, 110],
    [16, 174, 166], [19, 225, 190], [40, 80, 158], [64, 147, 228],
    [96, 247, 242], [107, 80, 246], [153, 177, 251], [120, 12, 153],
    [170, 56, 185], [224, 159, 249], [203, 0, 122], [236, 31, 128],
    [243, 141, 169], [104, 70, 52], [149, 104, 42], [248, 178, 119],
    [170, 170, 170], [165, 14, 30], [250, 128, 114], [228, 92, 26],
    [214, 181, 148], [156, 132, 49], [197, 173, 49], [232, 212, 95],
    [74, 107, 58], [90, 148, 74], [132, 197, 115], [15, 121, 159],
    [187, 250, 242], [125, 199, 255], [77, 49, 184], [74, 66, 132],
    [122, 113, 196], [181, 174, 241], [219, 164, 99], [209, 128, 81],
    [255, 197, 165], [155, 82, 73], [209, 128, 120], [250, 182, 164],
    [123, 99, 82], [156, 132, 107], [51, 57, 65], [109, 117, 141],
    [179, 185, 209], [109, 100, 63], [148, 140, 107], [205, 197, 158],
];

/// The id written for fully transparent pixels.
pub const TRANSPARENT_ID: u8 = 0;

static GLOBAL_INDEX: Lazy<PaletteIndex> = Lazy::new(PaletteIndex::build);

/// Exact-match lookup between palette colors and their ids.
pub struct PaletteIndex {
    lookup: HashMap<[u8; 3], u8>,
}

impl PaletteIndex {
    /// Shared instance over [`PALETTE`], built on first use.
    pub fn global() -> &'static PaletteIndex {
        &GLOBAL_INDEX
    }

    fn build() -> Self {
        // Id 0 is only ever produced from alpha, so opaque black resolves to 1.
        let lookup = PALETTE
            .iter()
            .enumerate()
            .skip(1)
            .map(|(id, &rgb)| (rgb, id as u8))
            .collect();
        Self { lookup }
    }

    pub fn index_of(&self, rgb: [u8; 3]) -> Result<u8, PaletteError> {
        self.lookup
            .get(&rgb)
            .copied()
            .ok_or(PaletteError::UnknownColor {
                r: rgb[0],
                g: rgb[1],
                b: rgb[2],
            })
    }

    pub fn color_of(&self, id: u8) -> Result<[u8; 3], PaletteError> {
        PALETTE
            .get(id as usize)
            .copied()
            .ok_or(PaletteError::InvalidId(id))
    }
}

/// Maps a raw RGBA pixel buffer onto palette ids.
///
/// # Parameters
/// - `pixels`: row-major RGBA data, exactly `width * height * 4` bytes.
///
/// # Errors
/// - `PaletteError::InvalidPixelDataLength` if the buffer size does not match
/// - `PaletteError::UnknownColor` for the first opaque pixel outside the palette
///
/// Pixels with alpha 0 always map to id 0 regardless of their RGB value.
pub fn pixels_to_indices(pixels: &[u8], width: u16, height: u16) -> Result<Vec<u8>, PaletteError> {
    let cells = width as usize * height as usize;
    if pixels.len() != cells * 4 {
        return Err(PaletteError::InvalidPixelDataLength {
            expected: cells * 4,
            actual: pixels.len(),
        });
    }

    let index = PaletteIndex::global();
    let mut indices = Vec::with_capacity(cells);
    for pixel in pixels.chunks_exact(4) {
        let id = if pixel[3] == 0 {
            TRANSPARENT_ID
        } else {
            index.index_of([pixel[0], pixel[1], pixel[2]])?
        };
        indices.push(id);
    }

    Ok(indices)
}

/// Expands palette ids back into RGBA pixel data. Id 0 renders with alpha 0,
/// every other id is fully opaque.
///
/// # Errors
/// - `PaletteError::InvalidId` if any id is outside the palette
pub fn indices_to_pixels(indices: &[u8]) -> Result<Vec<u8>, PaletteError> {
    let index = PaletteIndex::global();
    let mut pixels = Vec::with_capacity(indices.len() * 4);

    for &id in indices {
        let [r, g, b] = index.color_of(id)?;
        let alpha = if id == TRANSPARENT_ID { 0 } else { 255 };
        pixels.extend_from_slice(&[r, g, b, alpha]);
    }

    Ok(pixels)
}
