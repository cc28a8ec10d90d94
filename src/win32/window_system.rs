use crate::window_system::{RawWindow, WindowSystem};
use crate::{Rect, Result, WindowHandle};
use anyhow::{anyhow, Context};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use sysinfo::{Pid, ProcessesToUpdate, System};
use windows::core::{w, BOOL, PCWSTR};
use windows::Win32::Foundation::{HWND, LPARAM, RECT};
use windows::Win32::UI::Shell::ShellExecuteW;
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetClassNameW, GetWindowRect, GetWindowTextW, GetWindowThreadProcessId, IsIconic,
    IsWindow, IsWindowVisible, SetForegroundWindow, SetWindowPos, ShowWindow,
    SystemParametersInfoW, SPI_GETWORKAREA, SWP_NOACTIVATE, SWP_NOZORDER, SW_RESTORE,
    SW_SHOWNORMAL, SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS,
};

/// Win32 window layer. All calls happen on the caller's thread; the foreground
/// loop is the only caller that mutates windows.
pub struct Win32WindowSystem {
    procs: Mutex<System>,
}

impl Win32WindowSystem {
    pub fn new() -> Self {
        Self {
            procs: Mutex::new(System::new()),
        }
    }
}

impl Default for Win32WindowSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn hwnd(handle: WindowHandle) -> HWND {
    HWND(handle.0 as *mut core::ffi::c_void)
}

fn check_alive(handle: WindowHandle) -> Result<HWND> {
    let hwnd = hwnd(handle);
    if !unsafe { IsWindow(Some(hwnd)) }.as_bool() {
        return Err(anyhow!("stale window handle {:?}", handle));
    }
    Ok(hwnd)
}

unsafe extern "system" fn enum_proc(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let out = unsafe { &mut *(lparam.0 as *mut Vec<RawWindow>) };

    if !unsafe { IsWindowVisible(hwnd) }.as_bool() {
        return true.into();
    }

    let mut pid = 0u32;
    unsafe { GetWindowThreadProcessId(hwnd, Some(&mut pid)) };

    let mut title_buf = [0u16; 512];
    let len = unsafe { GetWindowTextW(hwnd, &mut title_buf) };
    let title = String::from_utf16_lossy(&title_buf[..len as usize]);

    let mut class_buf = [0u16; 256];
    let len = unsafe { GetClassNameW(hwnd, &mut class_buf) };
    let class_name = String::from_utf16_lossy(&class_buf[..len as usize]);

    out.push(RawWindow {
        handle: WindowHandle(hwnd.0 as isize),
        pid,
        title,
        class_name,
    });
    true.into()
}

impl WindowSystem for Win32WindowSystem {
    fn enumerate(&self) -> Result<Vec<RawWindow>> {
        let mut out: Vec<RawWindow> = Vec::new();
        unsafe {
            EnumWindows(Some(enum_proc), LPARAM(&mut out as *mut _ as isize))
                .context("EnumWindows failed")?;
        }
        Ok(out)
    }

    fn process_exe(&self, pid: u32) -> Option<PathBuf> {
        let mut procs = self.procs.lock().ok()?;
        let pid = Pid::from_u32(pid);
        procs.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        procs.process(pid).and_then(|p| p.exe()).map(Path::to_path_buf)
    }

    fn focus(&self, handle: WindowHandle) -> Result<()> {
        let hwnd = check_alive(handle)?;
        unsafe {
            let _ = ShowWindow(hwnd, SW_RESTORE);
            SetForegroundWindow(hwnd)
                .ok()
                .with_context(|| format!("SetForegroundWindow failed for {:?}", handle))?;
        }
        Ok(())
    }

    fn rect(&self, handle: WindowHandle) -> Result<Rect> {
        let hwnd = check_alive(handle)?;
        let mut rect = RECT::default();
        unsafe { GetWindowRect(hwnd, &mut rect) }
            .with_context(|| format!("GetWindowRect failed for {:?}", handle))?;
        Ok(Rect::new(
            rect.left,
            rect.top,
            rect.right - rect.left,
            rect.bottom - rect.top,
        ))
    }

    fn set_rect(&self, handle: WindowHandle, rect: Rect) -> Result<()> {
        let hwnd = check_alive(handle)?;
        unsafe {
            if IsIconic(hwnd).as_bool() {
                let _ = ShowWindow(hwnd, SW_RESTORE);
            }
            SetWindowPos(
                hwnd,
                None,
                rect.x,
                rect.y,
                rect.w,
                rect.h,
                SWP_NOZORDER | SWP_NOACTIVATE,
            )
            .with_context(|| format!("SetWindowPos failed for {:?}", handle))?;
        }
        Ok(())
    }

    fn work_area(&self) -> Result<Rect> {
        let mut rect = RECT::default();
        unsafe {
            SystemParametersInfoW(
                SPI_GETWORKAREA,
                0,
                Some(&mut rect as *mut RECT as *mut core::ffi::c_void),
                SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS(0),
            )
            .context("SystemParametersInfoW(SPI_GETWORKAREA) failed")?;
        }
        Ok(Rect::new(
            rect.left,
            rect.top,
            rect.right - rect.left,
            rect.bottom - rect.top,
        ))
    }

    fn stage_clipboard(&self, text: &str) -> Result<()> {
        let mut clipboard = arboard::Clipboard::new().context("clipboard unavailable")?;
        clipboard
            .set_text(text.to_string())
            .context("clipboard write failed")?;
        Ok(())
    }
}

/// Shell-open the executable, the way the OS would on double-click. Callers
/// fall back to a direct spawn when this fails.
pub fn shell_open(path: &Path) -> Result<()> {
    use std::os::windows::ffi::OsStrExt;

    let wide: Vec<u16> = path
        .as_os_str()
        .encode_wide()
        .chain(std::iter::once(0))
        .collect();

    let instance = unsafe {
        ShellExecuteW(
            None,
            w!("open"),
            PCWSTR(wide.as_ptr()),
            PCWSTR::null(),
            PCWSTR::null(),
            SW_SHOWNORMAL,
        )
    };

    // ShellExecute reports success as a value greater than 32.
    if instance.0 as isize > 32 {
        Ok(())
    } else {
        Err(anyhow!(
            "ShellExecuteW failed for {} (code {})",
            path.display(),
            instance.0 as isize
        ))
    }
}
