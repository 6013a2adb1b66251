//! Error and outcome types for outgoing drag sessions

/// Everything that can go wrong while offering files to the host shell.
///
/// None of these ever escape [`super::session::DragSession::execute`]; they are
/// folded into a [`DragOutcome`] there.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DragError {
    /// Empty file list.
    #[error("No files to drag")]
    InvalidPayload,
    /// The host has no native drag-out support.
    #[error("External drag-out is not supported on this platform")]
    UnsupportedPlatform,
    /// Shared memory for the file list could not be obtained.
    #[error("Failed to allocate shared memory: {0}")]
    AllocationFailure(String),
    /// A drop target asked for a format we do not offer.
    #[error("Clipboard format {format} is not offered")]
    UnsupportedFormat { format: u16 },
    /// A protocol method the drag-source role never needs.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
    /// The platform drag entry point returned an unexpected code.
    #[error("Drag-drop failed with code {code:#010x}")]
    Platform { code: i32 },
    /// Releasing the shared memory failed.
    #[error("Failed to release shared memory: {0}")]
    Teardown(String),
}

/// Result of one drag session. Produced exactly once per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    Dropped,
    Cancelled,
    Failed(DragError),
}

impl DragOutcome {
    /// True only when a target accepted the drop.
    pub fn is_dropped(&self) -> bool {
        matches!(self, DragOutcome::Dropped)
    }

    /// True when the platform loop ran to the end, whether the user dropped or cancelled.
    pub fn ran_to_completion(&self) -> bool {
        matches!(self, DragOutcome::Dropped | DragOutcome::Cancelled)
    }
}
