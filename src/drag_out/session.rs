//! Blocking drag session orchestration
//!
//! A session allocates the CF_HDROP block in shared memory, brings up OLE if
//! needed, runs the platform's modal drag loop and then tears everything
//! down again. The platform itself sits behind [`DragHost`] so the same
//! sequence drives the real OLE host on Windows and a mock in tests.
//!
//! The shared block is freed by us once the drag loop returns, even though
//! the protocol nominally lets the target own it. That is only sound because
//! `DoDragDrop` is synchronous and targets finish reading before it returns;
//! a target that defers reading past the drop would see freed memory. The
//! Windows host narrows this by handing out a release token with every
//! medium so targets never free the block themselves.

use std::fmt;

use super::dropfiles::{build_block, DragPayload};
use super::error::{DragError, DragOutcome};
use super::policy::ContinuationPolicy;
use super::responder::FileListResponder;

/// DROPEFFECT_COPY
pub const DROPEFFECT_COPY: u32 = 1;

/// How the platform drag loop ended when it ended normally
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragStatus {
    Dropped,
    Cancelled,
}

/// Platform services a drag session needs.
///
/// Methods take `&self`: the drag loop calls back into the responder while
/// the session still holds the host for teardown.
pub trait DragHost {
    /// Shared memory handle (an HGLOBAL on Windows)
    type Handle: Copy + fmt::Debug;

    /// Whether native drag-out works here at all
    fn is_supported(&self) -> bool;

    /// Allocate movable shared memory holding a copy of `block`.
    fn alloc_shared(&self, block: &[u8]) -> Result<Self::Handle, DragError>;

    fn free_shared(&self, handle: Self::Handle) -> Result<(), DragError>;

    /// Initialize OLE for the calling thread. Returns true when this call
    /// took a reference that must be balanced by [`DragHost::uninitialize`].
    fn initialize(&self) -> bool;

    fn uninitialize(&self);

    /// Run the modal drag loop. Blocks until drop, cancel or error.
    fn run_drag(
        &self,
        responder: &FileListResponder<Self::Handle>,
        policy: &ContinuationPolicy,
        allowed_effects: u32,
    ) -> Result<DragStatus, DragError>;
}

/// Releases what a session acquired, memory first, then OLE.
struct Teardown<'a, H: DragHost> {
    host: &'a H,
    handle: H::Handle,
    initialized: bool,
}

impl<H: DragHost> Drop for Teardown<'_, H> {
    fn drop(&mut self) {
        if let Err(e) = self.host.free_shared(self.handle) {
            tracing::warn!("drag session teardown: {}", e);
        }
        if self.initialized {
            self.host.uninitialize();
        }
    }
}

/// One-shot outgoing file drag.
///
/// Not reentrant: callers run one session at a time.
pub struct DragSession<'a, H: DragHost> {
    host: &'a H,
    policy: ContinuationPolicy,
}

impl<'a, H: DragHost> DragSession<'a, H> {
    pub fn new(host: &'a H) -> Self {
        Self {
            host,
            policy: ContinuationPolicy,
        }
    }

    /// Offer `payload` to the host shell and block until the user drops or cancels.
    pub fn execute(&self, payload: &DragPayload) -> DragOutcome {
        if payload.is_empty() {
            return DragOutcome::Failed(DragError::InvalidPayload);
        }
        if !self.host.is_supported() {
            return DragOutcome::Failed(DragError::UnsupportedPlatform);
        }

        let block = build_block(payload.paths());
        let handle = match self.host.alloc_shared(&block) {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!("drag session: {}", e);
                return DragOutcome::Failed(e);
            }
        };

        let mut teardown = Teardown {
            host: self.host,
            handle,
            initialized: false,
        };
        teardown.initialized = self.host.initialize();

        tracing::info!(files = payload.len(), bytes = block.len(), "starting drag-out");

        let responder = FileListResponder::new(handle);
        let outcome = match self.host.run_drag(&responder, &self.policy, DROPEFFECT_COPY) {
            Ok(DragStatus::Dropped) => DragOutcome::Dropped,
            Ok(DragStatus::Cancelled) => DragOutcome::Cancelled,
            // A target that keeps probing formats we never offered is its own
            // problem; treat it as the user backing out.
            Err(DragError::UnsupportedFormat { format }) => {
                tracing::debug!(format, "drag ended on unsupported format fault");
                DragOutcome::Cancelled
            }
            Err(e) => DragOutcome::Failed(e),
        };

        drop(teardown);
        tracing::info!(?outcome, "drag-out finished");
        outcome
    }
}
