pub mod compression;
pub mod constants;
pub mod document;
pub mod format;

use log::*;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

pub use crate::compression::delta::ChangeRecord;
pub use crate::compression::palette::{PaletteError, PaletteIndex, PALETTE};
pub use crate::document::{CanvasDocument, DocumentError, Metadata, Snapshot};
pub use crate::format::{decode, encode, DecodeError, EncodeError, FileHeader, WriteOptions};

/// Installs the process-wide logger for the library and the `wpls` tool.
///
/// Records go to `log_file` when given, otherwise to stderr. Fails with
/// `ErrorKind::AlreadyExists` if another logger is already installed.
pub fn init_logging(level: LevelFilter, log_file: Option<&Path>) -> io::Result<()> {
    let mut builder = env_logger::Builder::new();

    if let Some(path) = log_file {
        let target = Box::new(File::create(path)?);
        builder.target(env_logger::Target::Pipe(target));
    }

    builder
        .filter(Some("lib_wpls"), level)
        .filter(Some("wpls"), level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}:{}] {}",
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .try_init()
        .map_err(|err| io::Error::new(io::ErrorKind::AlreadyExists, err))
}
