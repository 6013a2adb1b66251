//! Data object logic for outgoing file drags
//!
//! Platform-neutral half of the `IDataObject` / `IEnumFORMATETC` pair. The
//! Windows COM objects in `windows.rs` forward every call here and only
//! translate the answers into HRESULTs.

use super::error::DragError;

/// CF_HDROP for file drops
pub const CF_HDROP: u16 = 15;

/// DVASPECT_CONTENT
pub const DVASPECT_CONTENT: u32 = 1;

/// TYMED_HGLOBAL - the only storage medium we hand out
pub const TYMED_HGLOBAL: u32 = 1;

/// One format request from a drop target (the interesting parts of a FORMATETC).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatRequest {
    pub format: u16,
    pub tymed: u32,
}

impl FormatRequest {
    pub fn new(format: u16, tymed: u32) -> Self {
        Self { format, tymed }
    }
}

/// A format we advertise through the enumerator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatEntry {
    pub format: u16,
    pub aspect: u32,
    pub lindex: i32,
    pub tymed: u32,
}

impl FormatEntry {
    /// CF_HDROP in global memory
    pub const fn file_list() -> Self {
        Self {
            format: CF_HDROP,
            aspect: DVASPECT_CONTENT,
            lindex: -1,
            tymed: TYMED_HGLOBAL,
        }
    }
}

/// Direction argument of `EnumFormatEtc`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataDirection {
    Get,
    Set,
}

/// Answers format queries for a single CF_HDROP block.
///
/// Read-only after construction, so the platform may call it reentrantly
/// from inside the blocking drag loop.
#[derive(Clone, Debug)]
pub struct FileListResponder<H> {
    handle: H,
    format: FormatEntry,
}

impl<H: Copy> FileListResponder<H> {
    pub fn new(handle: H) -> Self {
        Self {
            handle,
            format: FormatEntry::file_list(),
        }
    }

    /// `QueryGetData`. Only the format id is checked; some shell targets
    /// probe with TYMED bits that differ from what we advertise.
    pub fn query_format_supported(&self, request: &FormatRequest) -> bool {
        request.format == self.format.format
    }

    /// `GetData`. Hands back the bound handle itself, never a copy.
    pub fn get_data(&self, request: &FormatRequest) -> Result<H, DragError> {
        if self.query_format_supported(request) {
            Ok(self.handle)
        } else {
            tracing::debug!(format = request.format, tymed = request.tymed, "drop target probed unsupported format");
            Err(DragError::UnsupportedFormat { format: request.format })
        }
    }

    /// `EnumFormatEtc`
    pub fn enumerate_formats(&self, direction: DataDirection) -> Result<FormatCursor, DragError> {
        match direction {
            DataDirection::Get => Ok(FormatCursor::new(vec![self.format])),
            DataDirection::Set => Err(DragError::NotImplemented("EnumFormatEtc(DATADIR_SET)")),
        }
    }

    /// `DAdvise`. The payload never changes, so there is nothing to notify
    /// about; the registration is accepted with connection id 0.
    pub fn advise(&self) -> u32 {
        0
    }

    /// `DUnadvise`
    pub fn unadvise(&self, _connection: u32) {}

    /// `SetData`
    pub fn set_data(&self) -> Result<(), DragError> {
        Err(DragError::NotImplemented("SetData"))
    }

    /// `GetDataHere`
    pub fn get_data_here(&self) -> Result<(), DragError> {
        Err(DragError::NotImplemented("GetDataHere"))
    }

    pub fn handle(&self) -> H {
        self.handle
    }

    pub fn format(&self) -> FormatEntry {
        self.format
    }
}

/// Forward-only cursor over the advertised formats (`IEnumFORMATETC`).
#[derive(Clone, Debug)]
pub struct FormatCursor {
    items: Vec<FormatEntry>,
    position: usize,
}

impl FormatCursor {
    pub fn new(items: Vec<FormatEntry>) -> Self {
        Self { items, position: 0 }
    }

    /// Fetch up to `count` entries. The flag is true when all `count` were fetched.
    pub fn next(&mut self, count: usize) -> (Vec<FormatEntry>, bool) {
        let end = self.position.saturating_add(count).min(self.items.len());
        let fetched = self.items[self.position..end].to_vec();
        self.position = end;
        let complete = fetched.len() == count;
        (fetched, complete)
    }

    /// Skip `count` entries. True when all of them were skipped.
    pub fn skip(&mut self, count: usize) -> bool {
        let remaining = self.items.len() - self.position;
        self.position = self.position.saturating_add(count).min(self.items.len());
        count <= remaining
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Independent cursor over the same items, starting at the beginning.
    pub fn fresh_clone(&self) -> Self {
        Self::new(self.items.clone())
    }

    pub fn position(&self) -> usize {
        self.position
    }
}
