//! Drop source behaviour (`IDropSource`)

/// Left mouse button bit in the key state mask
pub const MK_LBUTTON: u32 = 0x0001;

/// What the platform should do after a `QueryContinueDrag` poll
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragAction {
    Continue,
    Drop,
    Cancel,
}

/// Answer to `GiveFeedback`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorFeedback {
    UseDefaultCursors,
}

/// Escape cancels, releasing the primary button drops.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContinuationPolicy;

impl ContinuationPolicy {
    pub fn query_continue(&self, escape_pressed: bool, key_state: u32) -> DragAction {
        if escape_pressed {
            return DragAction::Cancel;
        }
        if key_state & MK_LBUTTON == 0 {
            return DragAction::Drop;
        }
        DragAction::Continue
    }

    pub fn give_feedback(&self, _effect: u32) -> CursorFeedback {
        CursorFeedback::UseDefaultCursors
    }
}
