use crate::{Rect, Result, WindowHandle};
use std::path::PathBuf;

/// A top-level window as the OS reports it, before any filtering.
#[derive(Debug, Clone)]
pub struct RawWindow {
    pub handle: WindowHandle,
    pub pid: u32,
    pub title: String,
    pub class_name: String,
}

/// Seam to the OS window layer. The Win32 backend implements this for real
/// windows; tests use an in-memory fake.
pub trait WindowSystem: Send + Sync {
    /// Visible top-level windows in OS enumeration order.
    fn enumerate(&self) -> Result<Vec<RawWindow>>;

    /// On-disk executable path of the owning process. `None` when the process
    /// cannot be inspected (already exited, access denied).
    fn process_exe(&self, pid: u32) -> Option<PathBuf>;

    /// Restore the window if minimized, then request foreground focus.
    fn focus(&self, handle: WindowHandle) -> Result<()>;

    fn rect(&self, handle: WindowHandle) -> Result<Rect>;

    /// Restore then move/resize. Must not change z-order or activate.
    fn set_rect(&self, handle: WindowHandle, rect: Rect) -> Result<()>;

    /// Usable screen rectangle excluding reserved system chrome.
    fn work_area(&self) -> Result<Rect>;

    /// Place text on the OS clipboard for manual paste.
    fn stage_clipboard(&self, text: &str) -> Result<()>;
}
