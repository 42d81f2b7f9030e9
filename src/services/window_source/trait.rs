use crate::error::Result;
use crate::model::{ColorOutcome, WindowId, WindowInfo};
use std::sync::Arc;

/// Источник снимков окон
pub trait WindowSource: Send + Sync {
    /// Видимые окна верхнего уровня без служебных (tool) окон,
    /// с уже определённым именем исполняемого файла
    fn list_visible_windows(&self) -> Result<Vec<WindowInfo>>;
}

/// Установка цвета рамки одного окна
pub trait BorderPainter: Send + Sync {
    fn set_window_border(&self, window: WindowId, color: ColorOutcome) -> Result<()>;
}

/// Пара внешних коллабораторов, с которыми работает цикл обновления
#[derive(Clone)]
pub struct Backend {
    pub source: Arc<dyn WindowSource>,
    pub painter: Arc<dyn BorderPainter>,
}

/// Factory function to create an appropriate backend based on the dry_run flag
pub fn create_backend(dry_run: bool) -> Result<Backend> {
    if dry_run {
        return Ok(Backend {
            source: Arc::new(super::dry_run::DryRunWindowSource::new()),
            painter: Arc::new(super::dry_run::LoggingPainter),
        });
    }

    platform_backend()
}

#[cfg(windows)]
fn platform_backend() -> Result<Backend> {
    let dwm = Arc::new(super::dwm::DwmBackend::new());
    Ok(Backend {
        source: dwm.clone(),
        painter: dwm,
    })
}

#[cfg(not(windows))]
fn platform_backend() -> Result<Backend> {
    Err(crate::border_error!(
        service_unavailable,
        "цвет рамок задаётся через DWM и доступен только в Windows; используйте --dry-run"
    ))
}
