//! Drag files out of an emulated floppy image to the host shell
//!
//! The emulator core owns the disk image and is reached through
//! [`floppy::FloppyImageService`]. This crate adds what the desktop front-end
//! needs on top of it:
//! - [`drag_out`] - a blocking OLE drag source offering files as `CF_HDROP`
//! - [`floppy`] - directory tree parsing, drag-out staging, drop-in import,
//!   delete and notification debouncing
//! - [`gesture`] - press-and-move detection that starts a drag-out
//! - [`config`] / [`logging`] - settings file and tracing setup

pub mod config;
pub mod drag_out;
pub mod floppy;
pub mod gesture;
pub mod logging;

pub use drag_out::{drag_files_out, DragError, DragOutcome, DragPayload, DragSession, NativeDragHost};
