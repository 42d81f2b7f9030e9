//! Windows backend: EnumWindows for snapshots, DwmSetWindowAttribute for borders.

use super::process_cache::ProcessNameCache;
use super::r#trait::{BorderPainter, WindowSource};
use crate::debug_if_enabled;
use crate::error::{BorderError, Result};
use crate::model::{ColorOutcome, WindowId, WindowInfo};
use std::ffi::c_void;
use tracing::info;
use windows::core::PWSTR;
use windows::Win32::Foundation::{CloseHandle, BOOL, FALSE, HWND, LPARAM, TRUE};
use windows::Win32::Graphics::Dwm::{DwmSetWindowAttribute, DWMWA_BORDER_COLOR};
use windows::Win32::System::Threading::{
    OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_FORMAT, PROCESS_QUERY_LIMITED_INFORMATION,
};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetForegroundWindow, GetWindowLongW, GetWindowTextLengthW,
    GetWindowTextW, GetWindowThreadProcessId, IsWindowVisible, GWL_EXSTYLE, WS_EX_TOOLWINDOW,
};

pub struct DwmBackend {
    process_names: ProcessNameCache,
}

impl DwmBackend {
    pub fn new() -> Self {
        info!("Инициализация DwmBackend");
        Self {
            process_names: ProcessNameCache::new(),
        }
    }

    fn describe_window(&self, hwnd: HWND, foreground: HWND) -> Option<WindowInfo> {
        unsafe {
            if !IsWindowVisible(hwnd).as_bool() {
                return None;
            }

            let ex_style = GetWindowLongW(hwnd, GWL_EXSTYLE) as u32;
            if ex_style & WS_EX_TOOLWINDOW.0 != 0 {
                return None;
            }

            // Окна без заголовка - служебные поверхности оболочки
            let title = window_text(hwnd);
            if title.trim().is_empty() {
                return None;
            }

            let mut pid: u32 = 0;
            GetWindowThreadProcessId(hwnd, Some(&mut pid));
            let exe_name = self.process_names.get_or_resolve(pid, query_exe_name);

            Some(
                WindowInfo::new(to_window_id(hwnd), exe_name.as_ref())
                    .with_title(title)
                    .with_focus(hwnd == foreground),
            )
        }
    }
}

impl WindowSource for DwmBackend {
    fn list_visible_windows(&self) -> Result<Vec<WindowInfo>> {
        let mut handles: Vec<HWND> = Vec::new();

        unsafe {
            EnumWindows(
                Some(collect_handle),
                LPARAM(&mut handles as *mut Vec<HWND> as isize),
            )
            .map_err(|e| BorderError::Snapshot(format!("EnumWindows: {}", e)))?;
        }

        let foreground = unsafe { GetForegroundWindow() };
        let windows: Vec<WindowInfo> = handles
            .into_iter()
            .filter_map(|hwnd| self.describe_window(hwnd, foreground))
            .collect();

        let evicted = self.process_names.evict_stale();
        if evicted > 0 {
            debug_if_enabled!("Удалено {} устаревших записей кэша процессов", evicted);
        }

        Ok(windows)
    }
}

impl BorderPainter for DwmBackend {
    fn set_window_border(&self, window: WindowId, color: ColorOutcome) -> Result<()> {
        let value: u32 = color.to_colorref();

        unsafe {
            DwmSetWindowAttribute(
                to_hwnd(window),
                DWMWA_BORDER_COLOR,
                &value as *const u32 as *const c_void,
                std::mem::size_of::<u32>() as u32,
            )
        }
        .map_err(|e| BorderError::apply(window, e.to_string()))
    }
}

unsafe extern "system" fn collect_handle(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let handles = &mut *(lparam.0 as *mut Vec<HWND>);
    handles.push(hwnd);
    TRUE
}

fn to_window_id(hwnd: HWND) -> WindowId {
    WindowId(hwnd.0 as usize as u64)
}

fn to_hwnd(window: WindowId) -> HWND {
    HWND(window.0 as usize as *mut c_void)
}

unsafe fn window_text(hwnd: HWND) -> String {
    let len = GetWindowTextLengthW(hwnd);
    if len <= 0 {
        return String::new();
    }
    let mut buf = vec![0u16; len as usize + 1];
    let copied = GetWindowTextW(hwnd, &mut buf);
    String::from_utf16_lossy(&buf[..copied.max(0) as usize])
}

/// Имя исполняемого файла через QueryFullProcessImageNameW
fn query_exe_name(pid: u32) -> Option<String> {
    if pid == 0 {
        return None;
    }

    unsafe {
        let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, FALSE, pid).ok()?;

        let mut buf = [0u16; 260];
        let mut len = buf.len() as u32;
        let queried = QueryFullProcessImageNameW(
            handle,
            PROCESS_NAME_FORMAT(0),
            PWSTR(buf.as_mut_ptr()),
            &mut len,
        );
        let _ = CloseHandle(handle);

        queried.ok()?;
        let path = String::from_utf16_lossy(&buf[..len as usize]);
        path.rsplit('\\').next().map(str::to_string)
    }
}
