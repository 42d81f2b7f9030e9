use super::r#trait::{BorderPainter, WindowSource};
use crate::debug_if_enabled;
use crate::error::Result;
use crate::model::{ColorOutcome, WindowId, WindowInfo};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

/// Сколько снимков фокус остаётся на одном окне
const FOCUS_HOLD_SNAPSHOTS: usize = 40;

/// Эмуляция рабочего стола для режима сухого запуска
pub struct DryRunWindowSource {
    windows: Vec<WindowInfo>,
    snapshots: AtomicUsize,
}

impl DryRunWindowSource {
    pub fn new() -> Self {
        info!("Dry-run режим - WindowSource работает в режиме эмуляции");

        let windows = vec![
            WindowInfo::new(WindowId(0x10010), "WindowsTerminal.exe").with_title("Terminal - dry_run"),
            WindowInfo::new(WindowId(0x10020), "firefox.exe").with_title("Browser - dry_run"),
            WindowInfo::new(WindowId(0x10030), "Code.exe").with_title("Editor - dry_run"),
            WindowInfo::new(WindowId(0x10040), "Spotify.exe").with_title("Music - dry_run"),
        ];

        Self {
            windows,
            snapshots: AtomicUsize::new(0),
        }
    }
}

impl Default for DryRunWindowSource {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowSource for DryRunWindowSource {
    fn list_visible_windows(&self) -> Result<Vec<WindowInfo>> {
        let snapshot = self.snapshots.fetch_add(1, Ordering::Relaxed);
        let focused = (snapshot / FOCUS_HOLD_SNAPSHOTS) % self.windows.len();

        if snapshot % FOCUS_HOLD_SNAPSHOTS == 0 {
            info!("Dry-run: эмулируем смену фокуса на: {}", self.windows[focused]);
        }

        Ok(self
            .windows
            .iter()
            .enumerate()
            .map(|(i, window)| window.clone().with_focus(i == focused))
            .collect())
    }
}

/// Художник рамок, который только пишет в лог
pub struct LoggingPainter;

impl BorderPainter for LoggingPainter {
    fn set_window_border(&self, window: WindowId, color: ColorOutcome) -> Result<()> {
        debug_if_enabled!("[DRY RUN] Рамка {} -> {}", window, color);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_window_focused() {
        let source = DryRunWindowSource::new();
        for _ in 0..(FOCUS_HOLD_SNAPSHOTS * 5) {
            let windows = source.list_visible_windows().unwrap();
            assert_eq!(windows.iter().filter(|w| w.focused).count(), 1);
            assert!(windows.iter().all(WindowInfo::is_eligible));
        }
    }

    #[test]
    fn test_focus_rotates() {
        let source = DryRunWindowSource::new();
        let first = source.list_visible_windows().unwrap();
        for _ in 1..FOCUS_HOLD_SNAPSHOTS {
            source.list_visible_windows().unwrap();
        }
        let next = source.list_visible_windows().unwrap();

        let focused = |ws: &[WindowInfo]| ws.iter().position(|w| w.focused);
        assert_eq!(focused(&first), Some(0));
        assert_eq!(focused(&next), Some(1));
    }
}
