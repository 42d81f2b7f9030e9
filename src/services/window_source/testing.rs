//! Тестовые двойники для цикла обновления.

use super::r#trait::{BorderPainter, WindowSource};
use crate::error::{BorderError, Result};
use crate::model::{ColorOutcome, WindowId, WindowInfo};
use parking_lot::Mutex;
use std::collections::HashSet;

/// Источник, возвращающий заданный снимок (или ошибку перечисления)
#[derive(Default)]
pub struct StaticWindowSource {
    windows: Mutex<Vec<WindowInfo>>,
    failing: Mutex<bool>,
}

impl StaticWindowSource {
    pub fn new(windows: Vec<WindowInfo>) -> Self {
        Self {
            windows: Mutex::new(windows),
            failing: Mutex::new(false),
        }
    }

    pub fn set_windows(&self, windows: Vec<WindowInfo>) {
        *self.windows.lock() = windows;
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }
}

impl WindowSource for StaticWindowSource {
    fn list_visible_windows(&self) -> Result<Vec<WindowInfo>> {
        if *self.failing.lock() {
            return Err(BorderError::Snapshot("EnumWindows недоступен".to_string()));
        }
        Ok(self.windows.lock().clone())
    }
}

/// Запоминает все вызовы установки рамки
#[derive(Default)]
pub struct RecordingPainter {
    calls: Mutex<Vec<(WindowId, ColorOutcome)>>,
    failing: Mutex<HashSet<WindowId>>,
}

impl RecordingPainter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, window: WindowId) {
        self.failing.lock().insert(window);
    }

    pub fn recover(&self, window: WindowId) {
        self.failing.lock().remove(&window);
    }

    pub fn calls(&self) -> Vec<(WindowId, ColorOutcome)> {
        self.calls.lock().clone()
    }

    pub fn calls_for(&self, window: WindowId) -> Vec<ColorOutcome> {
        self.calls
            .lock()
            .iter()
            .filter(|(id, _)| *id == window)
            .map(|(_, color)| *color)
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

impl BorderPainter for RecordingPainter {
    fn set_window_border(&self, window: WindowId, color: ColorOutcome) -> Result<()> {
        self.calls.lock().push((window, color));
        if self.failing.lock().contains(&window) {
            return Err(BorderError::apply(window, "окно уничтожено"));
        }
        Ok(())
    }
}
