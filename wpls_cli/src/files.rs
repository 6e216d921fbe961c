use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::ImageError;
use lib_wpls::{CanvasDocument, DocumentError};
use log::{debug, info, warn};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Image processing error: {0}")]
    Image(#[from] ImageError),

    #[error("Image is {width}x{height}, canvases are limited to 65535 pixels per side")]
    ImageTooLarge { width: u32, height: u32 },

    #[error("Canvas history error: {0}")]
    Document(#[from] DocumentError),

    #[error("System clock is outside the 32-bit unix timestamp range")]
    ClockOutOfRange,

    #[error("Failed to format JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> CliError + '_ {
    move |source| CliError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Decoded RGBA image ready for the codec.
pub struct RgbaImage {
    pub width: u16,
    pub height: u16,
    pub pixels: Vec<u8>,
}

pub fn load_image(path: &Path) -> Result<RgbaImage, CliError> {
    let image = image::open(path)?.to_rgba8();
    let (width, height) = image.dimensions();
    let (Ok(w), Ok(h)) = (u16::try_from(width), u16::try_from(height)) else {
        return Err(CliError::ImageTooLarge { width, height });
    };
    debug!("Loaded {} ({}x{})", path.display(), width, height);

    Ok(RgbaImage {
        width: w,
        height: h,
        pixels: image.into_raw(),
    })
}

pub fn save_image(path: &Path, width: u16, height: u16, pixels: &[u8]) -> Result<(), CliError> {
    image::save_buffer(
        path,
        pixels,
        width.into(),
        height.into(),
        image::ExtendedColorType::Rgba8,
    )?;
    info!("Image saved to {}", path.display());
    Ok(())
}

pub fn read_document(path: &Path) -> Result<CanvasDocument, CliError> {
    let buffer = fs::read(path).map_err(io_error(path))?;
    Ok(CanvasDocument::parse(&buffer)?)
}

/// Replaces `path` as a whole: the new bytes land in a sibling file first and
/// are renamed over the target, so readers never see a partial history.
pub fn write_document(path: &Path, document: &CanvasDocument) -> Result<(), CliError> {
    let bytes = document.serialize()?;
    replace_file(path, &bytes)?;

    info!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    PathBuf::from(temp)
}

fn replace_file(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    let temp = temp_path(path);

    fs::write(&temp, bytes).map_err(io_error(&temp))?;
    if let Err(source) = fs::rename(&temp, path) {
        if let Err(err) = fs::remove_file(&temp) {
            warn!("Could not remove {}: {}", temp.display(), err);
        }
        return Err(io_error(path)(source));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_file_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("tile.wpls");
        fs::write(&target, b"old").unwrap();

        replace_file(&target, b"new").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"new");
        assert!(!temp_path(&target).exists());
    }

    #[test]
    fn test_replace_file_cleans_up_on_failed_rename() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory can never be replaced by a file.
        let target = dir.path().join("tile.wpls");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), b"x").unwrap();

        let result = replace_file(&target, b"new");
        assert!(matches!(result, Err(CliError::Io { .. })));
        assert!(!temp_path(&target).exists());
        assert!(target.join("keep").exists());
    }
}
