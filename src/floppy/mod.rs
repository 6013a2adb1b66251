//! Client side of the emulator's floppy drive
//!
//! The emulator core owns the disk image; this crate only talks to it
//! through [`FloppyImageService`]. On top of that surface sit:
//! - `tree` - directory tree parsing and the disk status line
//! - `transfer` - dragging entries out, dropping host files in, deleting
//! - `refresh` - coalescing drive notifications into tree refreshes

use std::path::Path;

pub mod refresh;
pub mod transfer;
pub mod tree;

/// Drive activity reported by the emulator core
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FloppyNotification {
    IoStarted,
    IoStopped,
    Loaded,
    Ejected,
}

/// Errors surfaced by the image service itself
#[derive(Debug, thiserror::Error)]
pub enum FloppyError {
    /// No image is mounted
    #[error("No floppy image loaded")]
    NotLoaded,
    /// The core failed to produce a directory listing
    #[error("Failed to read disk directory: {0}")]
    Directory(String),
}

/// Operations the emulator core exposes for the mounted floppy image.
pub trait FloppyImageService {
    /// Contents of a file in the image, or `None` when it cannot be read.
    fn read_file(&self, name: &str) -> Option<Vec<u8>>;

    /// Write (create or replace) a file in the image.
    fn write_file(&self, name: &str, data: &[u8]) -> bool;

    fn delete_file(&self, name: &str) -> bool;

    /// Directory tree as JSON. An empty string means no disk.
    fn directory_tree(&self) -> Result<String, FloppyError>;

    fn eject(&self);

    /// Mount an image; returns the core's status code.
    fn load_image(&self, path: &Path) -> i32;

    fn is_active(&self) -> bool;
}
