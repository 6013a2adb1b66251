//! Windows drag-out via OLE DoDragDrop
//!
//! COM objects here are thin shells: each interface method unpacks its
//! arguments, asks the platform-neutral responder / policy / cursor, and
//! packs the answer back into HRESULTs and out-params.

#![cfg(target_os = "windows")]

use std::mem::ManuallyDrop;
use std::sync::Mutex;

use windows_core::{IUnknown, Interface, Ref, BOOL, HRESULT};
use windows::Win32::Foundation::{
    DATA_S_SAMEFORMATETC, DRAGDROP_S_CANCEL, DRAGDROP_S_DROP, DRAGDROP_S_USEDEFAULTCURSORS,
    DV_E_FORMATETC, E_INVALIDARG, E_NOTIMPL, E_UNEXPECTED, GlobalFree, HGLOBAL, OLE_E_ADVISENOTSUPPORTED, S_FALSE, S_OK,
};
use windows::Win32::System::Com::{
    IAdviseSink, IDataObject, IDataObject_Impl, IEnumFORMATETC, IEnumFORMATETC_Impl, IEnumSTATDATA,
    DATADIR_GET, FORMATETC, STGMEDIUM, STGMEDIUM_0, TYMED_HGLOBAL,
};
use windows::Win32::System::Memory::{GlobalAlloc, GlobalLock, GlobalUnlock, GMEM_MOVEABLE, GMEM_ZEROINIT};
use windows::Win32::System::Ole::{
    DoDragDrop, IDropSource, IDropSource_Impl, OleInitialize, OleUninitialize, DROPEFFECT, DROPEFFECT_NONE,
};
use windows::Win32::System::SystemServices::MODIFIERKEYS_FLAGS;
use windows_implement::implement;

use super::dropfiles::DragPayload;
use super::error::DragError;
use super::policy::{ContinuationPolicy, CursorFeedback, DragAction};
use super::responder::{DataDirection, FileListResponder, FormatCursor, FormatEntry, FormatRequest};
use super::session::{DragHost, DragSession, DragStatus};

/// The real OLE platform
#[derive(Clone, Copy, Debug, Default)]
pub struct OleDragHost;

impl DragHost for OleDragHost {
    type Handle = HGLOBAL;

    fn is_supported(&self) -> bool {
        true
    }

    fn alloc_shared(&self, block: &[u8]) -> Result<HGLOBAL, DragError> {
        // SAFETY: allocating movable global memory for the shell.
        let handle = unsafe { GlobalAlloc(GMEM_MOVEABLE | GMEM_ZEROINIT, block.len()) }
            .map_err(|e| DragError::AllocationFailure(e.to_string()))?;

        // SAFETY: handle was just allocated with at least block.len() bytes.
        unsafe {
            let ptr = GlobalLock(handle);
            if ptr.is_null() {
                let _ = GlobalFree(Some(handle));
                return Err(DragError::AllocationFailure("GlobalLock failed".into()));
            }
            std::ptr::copy_nonoverlapping(block.as_ptr(), ptr as *mut u8, block.len());
            let _ = GlobalUnlock(handle);
        }
        Ok(handle)
    }

    fn free_shared(&self, handle: HGLOBAL) -> Result<(), DragError> {
        // SAFETY: handle came from alloc_shared and targets never free it
        // (every medium carries a release token).
        let _ = unsafe { GlobalFree(Some(handle)) };
        Ok(())
    }

    fn initialize(&self) -> bool {
        // S_FALSE (already initialized on this thread) still takes a reference.
        match unsafe { OleInitialize(None) } {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("OleInitialize failed, leaving apartment as is: {}", e);
                false
            }
        }
    }

    fn uninitialize(&self) {
        unsafe { OleUninitialize() };
    }

    fn run_drag(
        &self,
        responder: &FileListResponder<HGLOBAL>,
        policy: &ContinuationPolicy,
        allowed_effects: u32,
    ) -> Result<DragStatus, DragError> {
        let drop_source: IDropSource = DropSource { policy: *policy }.into();
        // Any live COM object works as the release token; ReleaseStgMedium
        // only calls Release on it.
        let release_token: IUnknown = drop_source
            .cast()
            .map_err(|e| DragError::Platform { code: e.code().0 })?;
        let data_object: IDataObject = FileListDataObject {
            responder: responder.clone(),
            release_token,
        }
        .into();

        let mut effect = DROPEFFECT_NONE;
        // SAFETY: OLE is initialized by the session; both objects outlive the call.
        let hr = unsafe { DoDragDrop(&data_object, &drop_source, DROPEFFECT(allowed_effects), &mut effect) };
        tracing::debug!("DoDragDrop result: {:?}, effect: {:?}", hr, effect);

        map_drag_result(hr)
    }
}

fn map_drag_result(hr: HRESULT) -> Result<DragStatus, DragError> {
    if hr == DRAGDROP_S_DROP || hr == S_OK {
        Ok(DragStatus::Dropped)
    } else if hr == DRAGDROP_S_CANCEL {
        Ok(DragStatus::Cancelled)
    } else if hr == DV_E_FORMATETC {
        Err(DragError::UnsupportedFormat { format: 0 })
    } else {
        Err(DragError::Platform { code: hr.0 })
    }
}

fn to_com_error(e: DragError) -> windows_core::Error {
    let code = match e {
        DragError::UnsupportedFormat { .. } => DV_E_FORMATETC,
        DragError::NotImplemented(_) => E_NOTIMPL,
        _ => E_INVALIDARG,
    };
    windows_core::Error::from(code)
}

fn to_formatetc(entry: &FormatEntry) -> FORMATETC {
    FORMATETC {
        cfFormat: entry.format,
        ptd: std::ptr::null_mut(),
        dwAspect: entry.aspect,
        lindex: entry.lindex,
        tymed: entry.tymed,
    }
}

// ============================================================================
// IDataObject
// ============================================================================

#[implement(IDataObject)]
struct FileListDataObject {
    responder: FileListResponder<HGLOBAL>,
    release_token: IUnknown,
}

#[allow(non_snake_case)]
impl IDataObject_Impl for FileListDataObject_Impl {
    fn GetData(&self, pformatetcin: *const FORMATETC) -> windows_core::Result<STGMEDIUM> {
        if pformatetcin.is_null() {
            return Err(windows_core::Error::from(E_INVALIDARG));
        }
        // SAFETY: validated above.
        let fmt = unsafe { &*pformatetcin };
        let handle = self
            .responder
            .get_data(&FormatRequest::new(fmt.cfFormat, fmt.tymed))
            .map_err(to_com_error)?;

        Ok(STGMEDIUM {
            tymed: TYMED_HGLOBAL.0 as u32,
            u: STGMEDIUM_0 { hGlobal: handle },
            pUnkForRelease: ManuallyDrop::new(Some(self.release_token.clone())),
        })
    }

    fn GetDataHere(&self, _pformatetc: *const FORMATETC, _pmedium: *mut STGMEDIUM) -> windows_core::Result<()> {
        self.responder.get_data_here().map_err(to_com_error)
    }

    fn QueryGetData(&self, pformatetc: *const FORMATETC) -> HRESULT {
        if pformatetc.is_null() {
            return E_INVALIDARG;
        }
        // SAFETY: validated above.
        let fmt = unsafe { &*pformatetc };
        if self.responder.query_format_supported(&FormatRequest::new(fmt.cfFormat, fmt.tymed)) {
            S_OK
        } else {
            DV_E_FORMATETC
        }
    }

    fn GetCanonicalFormatEtc(&self, _pformatectin: *const FORMATETC, pformatetcout: *mut FORMATETC) -> HRESULT {
        if !pformatetcout.is_null() {
            unsafe {
                (*pformatetcout).ptd = std::ptr::null_mut();
            }
        }
        DATA_S_SAMEFORMATETC
    }

    fn SetData(&self, _pformatetc: *const FORMATETC, _pmedium: *const STGMEDIUM, _frelease: BOOL) -> windows_core::Result<()> {
        self.responder.set_data().map_err(to_com_error)
    }

    fn EnumFormatEtc(&self, dwdirection: u32) -> windows_core::Result<IEnumFORMATETC> {
        let direction = if dwdirection == DATADIR_GET.0 as u32 {
            DataDirection::Get
        } else {
            DataDirection::Set
        };
        let cursor = self.responder.enumerate_formats(direction).map_err(to_com_error)?;
        Ok(FormatEnumerator::new(cursor).into())
    }

    fn DAdvise(&self, _pformatetc: *const FORMATETC, _advf: u32, _padvsink: Ref<'_, IAdviseSink>) -> windows_core::Result<u32> {
        Ok(self.responder.advise())
    }

    fn DUnadvise(&self, dwconnection: u32) -> windows_core::Result<()> {
        self.responder.unadvise(dwconnection);
        Ok(())
    }

    fn EnumDAdvise(&self) -> windows_core::Result<IEnumSTATDATA> {
        Err(windows_core::Error::from(OLE_E_ADVISENOTSUPPORTED))
    }
}

// ============================================================================
// IEnumFORMATETC
// ============================================================================

#[implement(IEnumFORMATETC)]
struct FormatEnumerator {
    cursor: Mutex<FormatCursor>,
}

impl FormatEnumerator {
    fn new(cursor: FormatCursor) -> Self {
        Self {
            cursor: Mutex::new(cursor),
        }
    }
}

#[allow(non_snake_case)]
impl IEnumFORMATETC_Impl for FormatEnumerator_Impl {
    fn Next(&self, celt: u32, rgelt: *mut FORMATETC, pceltfetched: *mut u32) -> HRESULT {
        if celt == 0 || rgelt.is_null() {
            return E_INVALIDARG;
        }
        let Ok(mut cursor) = self.cursor.lock() else {
            return E_UNEXPECTED;
        };
        let (items, complete) = cursor.next(celt as usize);
        // SAFETY: caller provides room for celt entries.
        unsafe {
            for (i, item) in items.iter().enumerate() {
                *rgelt.add(i) = to_formatetc(item);
            }
            if !pceltfetched.is_null() {
                *pceltfetched = items.len() as u32;
            }
        }
        if complete {
            S_OK
        } else {
            S_FALSE
        }
    }

    fn Skip(&self, celt: u32) -> windows_core::Result<()> {
        let mut cursor = self.cursor.lock().map_err(|_| windows_core::Error::from(E_UNEXPECTED))?;
        if cursor.skip(celt as usize) {
            Ok(())
        } else {
            Err(windows_core::Error::from(S_FALSE))
        }
    }

    fn Reset(&self) -> windows_core::Result<()> {
        let mut cursor = self.cursor.lock().map_err(|_| windows_core::Error::from(E_UNEXPECTED))?;
        cursor.reset();
        Ok(())
    }

    fn Clone(&self) -> windows_core::Result<IEnumFORMATETC> {
        let cursor = self.cursor.lock().map_err(|_| windows_core::Error::from(E_UNEXPECTED))?;
        Ok(FormatEnumerator::new(cursor.fresh_clone()).into())
    }
}

// ============================================================================
// IDropSource
// ============================================================================

#[implement(IDropSource)]
struct DropSource {
    policy: ContinuationPolicy,
}

#[allow(non_snake_case)]
impl IDropSource_Impl for DropSource_Impl {
    fn QueryContinueDrag(&self, fescapepressed: BOOL, grfkeystate: MODIFIERKEYS_FLAGS) -> HRESULT {
        match self.policy.query_continue(fescapepressed.as_bool(), grfkeystate.0) {
            DragAction::Cancel => DRAGDROP_S_CANCEL,
            DragAction::Drop => DRAGDROP_S_DROP,
            DragAction::Continue => S_OK,
        }
    }

    fn GiveFeedback(&self, dweffect: DROPEFFECT) -> HRESULT {
        match self.policy.give_feedback(dweffect.0) {
            CursorFeedback::UseDefaultCursors => DRAGDROP_S_USEDEFAULTCURSORS,
        }
    }
}

// ============================================================================
// Native helper entry point
// ============================================================================

/// Drag a newline separated, NUL terminated UTF-16 path list out to the shell.
///
/// Returns 1 when the files were dropped, 0 on null input, empty list,
/// cancel or failure.
///
/// # Safety
///
/// `files` must be null or point to a NUL terminated UTF-16 string.
#[no_mangle]
pub unsafe extern "system" fn floppy_drag_files_native(files: *const u16) -> i32 {
    if files.is_null() {
        return 0;
    }
    let mut len = 0usize;
    while *files.add(len) != 0 {
        len += 1;
    }
    let joined = String::from_utf16_lossy(std::slice::from_raw_parts(files, len));
    let payload = DragPayload::from_joined(&joined);

    let outcome = DragSession::new(&OleDragHost).execute(&payload);
    i32::from(outcome.is_dropped())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drag_out::responder::{CF_HDROP, DVASPECT_CONTENT};
    use windows::Win32::System::Com::DATADIR_SET;

    const CF_UNICODETEXT: u16 = 13;
    const TYMED_ISTREAM: u32 = 4;

    fn fake_handle() -> HGLOBAL {
        HGLOBAL(0x1230 as *mut std::ffi::c_void)
    }

    fn data_object() -> IDataObject {
        let source: IDropSource = DropSource { policy: ContinuationPolicy }.into();
        FileListDataObject {
            responder: FileListResponder::new(fake_handle()),
            release_token: source.cast().unwrap(),
        }
        .into()
    }

    fn request(format: u16, tymed: u32) -> FORMATETC {
        FORMATETC {
            cfFormat: format,
            ptd: std::ptr::null_mut(),
            dwAspect: DVASPECT_CONTENT,
            lindex: -1,
            tymed,
        }
    }

    fn enumerator() -> IEnumFORMATETC {
        unsafe { data_object().EnumFormatEtc(DATADIR_GET.0 as u32) }.unwrap()
    }

    fn raw_next(e: &IEnumFORMATETC, celt: u32, out: *mut FORMATETC, fetched: *mut u32) -> HRESULT {
        unsafe { (Interface::vtable(e).Next)(Interface::as_raw(e), celt, out, fetched) }
    }

    fn raw_skip(e: &IEnumFORMATETC, celt: u32) -> HRESULT {
        unsafe { (Interface::vtable(e).Skip)(Interface::as_raw(e), celt) }
    }

    #[test]
    fn test_result_mapping() {
        assert_eq!(map_drag_result(DRAGDROP_S_DROP), Ok(DragStatus::Dropped));
        assert_eq!(map_drag_result(S_OK), Ok(DragStatus::Dropped));
        assert_eq!(map_drag_result(DRAGDROP_S_CANCEL), Ok(DragStatus::Cancelled));
        assert!(matches!(map_drag_result(DV_E_FORMATETC), Err(DragError::UnsupportedFormat { .. })));
        assert!(matches!(map_drag_result(E_INVALIDARG), Err(DragError::Platform { .. })));
    }

    #[test]
    fn test_result_codes_match_protocol() {
        assert_eq!(DRAGDROP_S_DROP.0, 0x0004_0100);
        assert_eq!(DRAGDROP_S_CANCEL.0, 0x0004_0101);
        assert_eq!(DRAGDROP_S_USEDEFAULTCURSORS.0, 0x0004_0102);
    }

    #[test]
    fn test_query_get_data_accepts_file_list_with_any_medium() {
        let object = data_object();
        for tymed in [TYMED_HGLOBAL.0 as u32, TYMED_ISTREAM, 0] {
            assert_eq!(unsafe { object.QueryGetData(&request(CF_HDROP, tymed)) }, S_OK);
        }
        assert_eq!(
            unsafe { object.QueryGetData(&request(CF_UNICODETEXT, TYMED_HGLOBAL.0 as u32)) },
            DV_E_FORMATETC
        );
    }

    #[test]
    fn test_get_data_hands_out_bound_block_with_release_token() {
        let object = data_object();
        let mut medium = unsafe { object.GetData(&request(CF_HDROP, TYMED_HGLOBAL.0 as u32)) }.unwrap();
        assert_eq!(medium.tymed, TYMED_HGLOBAL.0 as u32);
        assert_eq!(unsafe { medium.u.hGlobal }, fake_handle());
        assert!(medium.pUnkForRelease.is_some());
        // Drop the token reference the way ReleaseStgMedium would
        unsafe { ManuallyDrop::drop(&mut medium.pUnkForRelease) };

        let err = unsafe { object.GetData(&request(CF_UNICODETEXT, TYMED_HGLOBAL.0 as u32)) }.unwrap_err();
        assert_eq!(err.code(), DV_E_FORMATETC);
    }

    #[test]
    fn test_canonical_format_and_set_direction() {
        let object = data_object();
        let input = request(CF_HDROP, TYMED_HGLOBAL.0 as u32);
        let mut output = input;
        assert_eq!(unsafe { object.GetCanonicalFormatEtc(&input, &mut output) }, DATA_S_SAMEFORMATETC);
        assert!(output.ptd.is_null());

        let err = unsafe { object.EnumFormatEtc(DATADIR_SET.0 as u32) }.unwrap_err();
        assert_eq!(err.code(), E_NOTIMPL);
    }

    #[test]
    fn test_enumerator_rejects_empty_requests() {
        let e = enumerator();
        let mut slot = request(0, 0);
        let mut fetched = 7u32;
        assert_eq!(raw_next(&e, 0, &mut slot, &mut fetched), E_INVALIDARG);
        assert_eq!(raw_next(&e, 1, std::ptr::null_mut(), &mut fetched), E_INVALIDARG);
    }

    #[test]
    fn test_enumerator_next_skip_and_clone() {
        let e = enumerator();
        let mut slots = [request(0, 0); 2];
        let mut fetched = 0u32;
        assert_eq!(raw_next(&e, 2, slots.as_mut_ptr(), &mut fetched), S_FALSE);
        assert_eq!(fetched, 1);
        assert_eq!(slots[0].cfFormat, CF_HDROP);
        assert_eq!(slots[0].tymed, TYMED_HGLOBAL.0 as u32);

        // Exhausted: skipping further falls short
        assert_eq!(raw_skip(&e, 1), S_FALSE);

        // A clone starts from the first format regardless of our position
        let clone = unsafe { e.Clone() }.unwrap();
        let mut slot = request(0, 0);
        assert_eq!(raw_next(&clone, 1, &mut slot, &mut fetched), S_OK);
        assert_eq!(slot.cfFormat, CF_HDROP);

        unsafe { e.Reset() }.unwrap();
        assert_eq!(raw_skip(&e, 1), S_OK);
    }

    #[test]
    fn test_drop_source_answers() {
        let source: IDropSource = DropSource { policy: ContinuationPolicy }.into();
        let query = |escape: i32, keys: u32| unsafe {
            (Interface::vtable(&source).QueryContinueDrag)(Interface::as_raw(&source), BOOL(escape), MODIFIERKEYS_FLAGS(keys))
        };
        assert_eq!(query(1, 1), DRAGDROP_S_CANCEL);
        assert_eq!(query(0, 0), DRAGDROP_S_DROP);
        assert_eq!(query(0, 1), S_OK);
    }

    #[test]
    fn test_native_entry_rejects_null_and_empty_lists() {
        assert_eq!(unsafe { floppy_drag_files_native(std::ptr::null()) }, 0);

        let empty = [0u16];
        assert_eq!(unsafe { floppy_drag_files_native(empty.as_ptr()) }, 0);

        let blank: Vec<u16> = "\r\n\n".encode_utf16().chain([0]).collect();
        assert_eq!(unsafe { floppy_drag_files_native(blank.as_ptr()) }, 0);
    }

    #[test]
    fn test_poisoned_enumerator_reports_unexpected() {
        let inner = FormatEnumerator::new(FormatCursor::new(vec![FormatEntry::file_list()]));
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = inner.cursor.lock().unwrap();
            panic!("poison the cursor");
        }));
        let e: IEnumFORMATETC = inner.into();

        let mut slot = request(0, 0);
        assert_eq!(raw_next(&e, 1, &mut slot, std::ptr::null_mut()), E_UNEXPECTED);
        assert_eq!(unsafe { e.Reset() }.unwrap_err().code(), E_UNEXPECTED);
        assert_eq!(unsafe { e.Clone() }.unwrap_err().code(), E_UNEXPECTED);
    }
}
