use crate::window_system::WindowSystem;
use crate::{Rect, Result, WindowHandle};
use std::path::Path;
use std::sync::Arc;

/// One application window found by a scan. Recomputed on every scan; `index`
/// and `label` are display conveniences, not stable identities.
#[derive(Debug, Clone)]
pub struct WindowInfo {
    pub handle: WindowHandle,
    pub pid: u32,
    pub title: String,
    pub class_name: String,
    pub index: usize,
    pub label: String,
}

/// Answers "which on-screen windows belong to this application, and in what
/// stable order?" over the [`WindowSystem`] seam.
#[derive(Clone)]
pub struct WindowDirectory {
    sys: Arc<dyn WindowSystem>,
}

impl WindowDirectory {
    pub fn new(sys: Arc<dyn WindowSystem>) -> Self {
        Self { sys }
    }

    /// Visible top-level windows owned by `exe_path`, optionally filtered by
    /// exact window-class match. Windows whose owning process cannot be
    /// inspected are dropped silently; that race is expected, not an error.
    pub fn list_windows(&self, exe_path: &Path, class_filter: &str) -> Result<Vec<WindowInfo>> {
        let exe_norm = normalize_path(exe_path);
        let mut out = Vec::new();

        for raw in self.sys.enumerate()? {
            if !class_filter.is_empty() && raw.class_name != class_filter {
                continue;
            }
            let Some(owner_exe) = self.sys.process_exe(raw.pid) else {
                continue;
            };
            if normalize_path(&owner_exe) != exe_norm {
                continue;
            }
            out.push(WindowInfo {
                handle: raw.handle,
                pid: raw.pid,
                title: raw.title,
                class_name: raw.class_name,
                index: 0,
                label: String::new(),
            });
        }

        // Titled windows first, then pid, then handle: keeps numbering stable
        // across scans even though enumeration order is not guaranteed.
        out.sort_by_key(|w| (w.title.is_empty(), w.pid, w.handle.0));
        Ok(out)
    }

    /// Same scan with a 1-based index and a human label ("App 1", "App 2", ...)
    /// assigned by sorted position. Re-scanning after windows open or close
    /// reassigns indices.
    pub fn list_numbered(&self, exe_path: &Path, class_filter: &str) -> Result<Vec<WindowInfo>> {
        let mut windows = self.list_windows(exe_path, class_filter)?;
        for (i, w) in windows.iter_mut().enumerate() {
            w.index = i + 1;
            w.label = format!("App {}", i + 1);
        }
        Ok(windows)
    }

    pub fn focus(&self, handle: WindowHandle) -> Result<()> {
        self.sys.focus(handle)
    }

    pub fn rect(&self, handle: WindowHandle) -> Result<Rect> {
        self.sys.rect(handle)
    }

    pub fn set_rect(&self, handle: WindowHandle, rect: Rect) -> Result<()> {
        self.sys.set_rect(handle, rect)
    }

    pub fn work_area(&self) -> Result<Rect> {
        self.sys.work_area()
    }

    pub fn stage_clipboard(&self, text: &str) -> Result<()> {
        self.sys.stage_clipboard(text)
    }
}

/// Absolute-path-normalized, case-insensitive comparison key.
fn normalize_path(path: &Path) -> String {
    let abs = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    abs.to_string_lossy().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window_system::testing::FakeWindowSystem;
    use std::path::PathBuf;

    const WORK: Rect = Rect {
        x: 0,
        y: 0,
        w: 1920,
        h: 1080,
    };

    fn chat_exe() -> PathBuf {
        PathBuf::from(r"C:\Apps\Chat\chat.exe")
    }

    fn directory(sys: &Arc<FakeWindowSystem>) -> WindowDirectory {
        WindowDirectory::new(sys.clone() as Arc<dyn crate::window_system::WindowSystem>)
    }

    fn populated() -> Arc<FakeWindowSystem> {
        let sys = Arc::new(FakeWindowSystem::new(WORK));
        // Deliberately out of order: untitled window with the lowest pid,
        // titled windows with mixed pids and handles.
        sys.add_window(
            50,
            10,
            "",
            "ChatMainWnd",
            &chat_exe(),
            Rect::new(0, 0, 400, 300),
        );
        sys.add_window(
            40,
            30,
            "Chat - alice",
            "ChatMainWnd",
            &chat_exe(),
            Rect::new(10, 10, 400, 300),
        );
        sys.add_window(
            20,
            20,
            "Chat - bob",
            "ChatMainWnd",
            &chat_exe(),
            Rect::new(20, 20, 400, 300),
        );
        sys.add_window(
            10,
            20,
            "Chat - carol",
            "ChatMainWnd",
            &chat_exe(),
            Rect::new(30, 30, 400, 300),
        );
        // Different executable: must be filtered out.
        sys.add_window(
            60,
            99,
            "Editor",
            "EditorWnd",
            Path::new(r"C:\Apps\Editor\editor.exe"),
            Rect::new(0, 0, 100, 100),
        );
        // Process exited mid-scan: silently dropped.
        sys.add_orphan_window(70, 1234, "Ghost", "ChatMainWnd");
        sys
    }

    #[test]
    fn filters_by_exe_and_orders_titled_pid_handle() {
        let sys = populated();
        let windows = directory(&sys).list_windows(&chat_exe(), "").unwrap();

        let handles: Vec<isize> = windows.iter().map(|w| w.handle.0).collect();
        // titled (pid 20: handles 10,20; pid 30: handle 40), then untitled (50)
        assert_eq!(handles, vec![10, 20, 40, 50]);
    }

    #[test]
    fn exe_path_comparison_is_case_insensitive() {
        let sys = populated();
        let windows = directory(&sys)
            .list_windows(Path::new(r"C:\APPS\CHAT\CHAT.EXE"), "")
            .unwrap();
        assert_eq!(windows.len(), 4);
    }

    #[test]
    fn class_filter_matches_exactly() {
        let sys = Arc::new(FakeWindowSystem::new(WORK));
        sys.add_window(1, 1, "a", "ChatMainWnd", &chat_exe(), Rect::new(0, 0, 1, 1));
        sys.add_window(2, 1, "b", "ChatPopup", &chat_exe(), Rect::new(0, 0, 1, 1));
        let dir = directory(&sys);

        assert_eq!(dir.list_windows(&chat_exe(), "ChatMainWnd").unwrap().len(), 1);
        assert_eq!(dir.list_windows(&chat_exe(), "").unwrap().len(), 2);
        assert_eq!(dir.list_windows(&chat_exe(), "Chat").unwrap().len(), 0);
    }

    #[test]
    fn uninspectable_process_is_dropped_not_an_error() {
        let sys = Arc::new(FakeWindowSystem::new(WORK));
        sys.add_orphan_window(7, 7, "Ghost", "ChatMainWnd");
        let windows = directory(&sys).list_windows(&chat_exe(), "").unwrap();
        assert!(windows.is_empty());
    }

    #[test]
    fn numbering_is_idempotent_on_a_static_window_set() {
        let sys = populated();
        let dir = directory(&sys);

        let first = dir.list_numbered(&chat_exe(), "").unwrap();
        let second = dir.list_numbered(&chat_exe(), "").unwrap();

        let labels = |ws: &[WindowInfo]| -> Vec<(isize, usize, String)> {
            ws.iter()
                .map(|w| (w.handle.0, w.index, w.label.clone()))
                .collect()
        };
        assert_eq!(labels(&first), labels(&second));
        assert_eq!(first[0].index, 1);
        assert_eq!(first[0].label, "App 1");
        assert_eq!(first[3].label, "App 4");
    }

    #[test]
    fn focus_on_stale_handle_surfaces_an_error() {
        let sys = populated();
        assert!(directory(&sys).focus(WindowHandle(9999)).is_err());
    }
}
