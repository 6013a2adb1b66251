//! Outgoing file drags to the host shell
//!
//! Offers a list of on-disk files to Explorer (or any other OLE drop target)
//! as a `CF_HDROP` data object and blocks until the user drops or cancels.
//!
//! ## Layout
//! - `dropfiles` - CF_HDROP block encoding and the [`DragPayload`] type
//! - `responder` - `IDataObject` / `IEnumFORMATETC` answers, platform neutral
//! - `policy` - `IDropSource` answers (escape cancels, button release drops)
//! - `session` - the orchestrator and the [`DragHost`] seam
//! - `windows` - the OLE host, COM wrappers and the native entry point
//!
//! Only Windows has a real host. Elsewhere [`NativeDragHost`] reports itself
//! unsupported and every session fails without side effects.

pub mod dropfiles;
mod error;
pub mod policy;
pub mod responder;
pub mod session;

#[cfg(target_os = "windows")]
mod windows;

pub use dropfiles::DragPayload;
pub use error::{DragError, DragOutcome};
pub use session::{DragHost, DragSession, DragStatus};

#[cfg(target_os = "windows")]
pub use self::windows::{floppy_drag_files_native, OleDragHost as NativeDragHost};

#[cfg(not(target_os = "windows"))]
pub use unsupported::UnsupportedHost as NativeDragHost;

#[cfg(not(target_os = "windows"))]
mod unsupported {
    use super::error::DragError;
    use super::policy::ContinuationPolicy;
    use super::responder::FileListResponder;
    use super::session::{DragHost, DragStatus};

    /// Host for platforms without native drag-out
    #[derive(Clone, Copy, Debug, Default)]
    pub struct UnsupportedHost;

    impl DragHost for UnsupportedHost {
        type Handle = ();

        fn is_supported(&self) -> bool {
            false
        }

        fn alloc_shared(&self, _block: &[u8]) -> Result<(), DragError> {
            Err(DragError::UnsupportedPlatform)
        }

        fn free_shared(&self, _handle: ()) -> Result<(), DragError> {
            Ok(())
        }

        fn initialize(&self) -> bool {
            false
        }

        fn uninitialize(&self) {}

        fn run_drag(
            &self,
            _responder: &FileListResponder<()>,
            _policy: &ContinuationPolicy,
            _allowed_effects: u32,
        ) -> Result<DragStatus, DragError> {
            Err(DragError::UnsupportedPlatform)
        }
    }
}

/// Drag the given files out using the platform's native host.
pub fn drag_files_out<I, P>(paths: I) -> DragOutcome
where
    I: IntoIterator<Item = P>,
    P: Into<std::path::PathBuf>,
{
    let payload = DragPayload::from_paths(paths);
    let host = NativeDragHost::default();
    DragSession::new(&host).execute(&payload)
}
