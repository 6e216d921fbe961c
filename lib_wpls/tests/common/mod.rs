#![allow(dead_code)]

use lib_wpls::compression::deflate::deflate;
use lib_wpls::WriteOptions;

pub const WHITE: [u8; 4] = [255, 255, 255, 255];
pub const RED: [u8; 4] = [237, 28, 36, 255];
pub const BLACK: [u8; 4] = [0, 0, 0, 255];
pub const DARK_GRAY: [u8; 4] = [60, 60, 60, 255];
pub const BLUE: [u8; 4] = [64, 147, 228, 255];
pub const CLEAR: [u8; 4] = [0, 0, 0, 0];

pub const SMALL_WIDTH: u16 = 4;
pub const SMALL_HEIGHT: u16 = 4;

/// 4x4 image mixing several palette colors and a transparent corner.
pub fn small_image() -> Vec<u8> {
    [
        WHITE, WHITE, RED, RED, //
        WHITE, BLACK, BLACK, RED, //
        BLUE, BLUE, DARK_GRAY, DARK_GRAY, //
        BLUE, WHITE, WHITE, CLEAR,
    ]
    .concat()
}

pub fn solid(color: [u8; 4], width: u16, height: u16) -> Vec<u8> {
    color.repeat(width as usize * height as usize)
}

/// Cycles through every opaque palette color, long enough to cover many RLE pairs.
pub fn palette_sweep(width: u16, height: u16) -> Vec<u8> {
    let cells = width as usize * height as usize;
    (0..cells)
        .flat_map(|cell| {
            let id = 1 + (cell / 7) % 63;
            let [r, g, b] = lib_wpls::PALETTE[id];
            [r, g, b, 255]
        })
        .collect()
}

pub fn set_pixel(pixels: &mut [u8], width: u16, x: u16, y: u16, color: [u8; 4]) {
    let offset = (y as usize * width as usize + x as usize) * 4;
    pixels[offset..offset + 4].copy_from_slice(&color);
}

pub fn header_bytes(version: u16, width: u16, height: u16) -> Vec<u8> {
    let mut bytes = b"WPLS".to_vec();
    for field in [version, width, height, 0, 0] {
        bytes.extend_from_slice(&field.to_be_bytes());
    }
    bytes
}

/// Appends one raw block whose payload is deflated as-is.
pub fn push_block(buffer: &mut Vec<u8>, tag: u8, timestamp: u32, uncompressed: &[u8]) {
    let payload = deflate(uncompressed, WriteOptions::default().level).unwrap();
    buffer.push(tag);
    buffer.extend_from_slice(&timestamp.to_be_bytes());
    buffer.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buffer.extend_from_slice(&payload);
}
