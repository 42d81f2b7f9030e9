//! DiffDispatcher: дифференциальное применение цветов.
//!
//! Для каждого окна хранится последний успешно применённый цвет. Вызов ОС
//! выполняется только если новый цвет отличается от сохранённого. Ошибка
//! вызова касается только одного окна: его запись удаляется, цикл идёт дальше.

use super::window_source::BorderPainter;
use crate::debug_if_enabled;
use crate::model::{ColorOutcome, WindowId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Цвет отправлен в ОС
    Applied,
    /// Цвет совпал с последним применённым, вызова не было
    Unchanged,
    /// Вызов ОС завершился ошибкой, запись окна удалена
    Failed,
}

/// Счётчики для сводки цикла
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub applied: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub evicted: usize,
}

impl DispatchStats {
    pub fn record(&mut self, outcome: ApplyOutcome) {
        match outcome {
            ApplyOutcome::Applied => self.applied += 1,
            ApplyOutcome::Unchanged => self.unchanged += 1,
            ApplyOutcome::Failed => self.failed += 1,
        }
    }
}

pub struct DiffDispatcher {
    painter: Arc<dyn BorderPainter>,
    applied: HashMap<WindowId, ColorOutcome>,
}

impl DiffDispatcher {
    pub fn new(painter: Arc<dyn BorderPainter>) -> Self {
        Self {
            painter,
            applied: HashMap::new(),
        }
    }

    pub fn apply(&mut self, window: WindowId, outcome: ColorOutcome) -> ApplyOutcome {
        if self.applied.get(&window) == Some(&outcome) {
            return ApplyOutcome::Unchanged;
        }

        match self.painter.set_window_border(window, outcome) {
            Ok(()) => {
                debug_if_enabled!("Рамка окна {} -> {}", window, outcome);
                self.applied.insert(window, outcome);
                ApplyOutcome::Applied
            }
            Err(e) => {
                if e.is_transient() {
                    warn!("Не удалось применить цвет {} к окну {}: {}", outcome, window, e);
                } else {
                    error!("Ошибка применения цвета {} к окну {}: {}", outcome, window, e);
                }
                self.applied.remove(&window);
                ApplyOutcome::Failed
            }
        }
    }

    /// Удаляет записи окон, которых нет в текущем снимке
    pub fn evict_absent(&mut self, present: &HashSet<WindowId>) -> usize {
        let before = self.applied.len();
        self.applied.retain(|window, _| present.contains(window));
        let evicted = before - self.applied.len();
        if evicted > 0 {
            debug_if_enabled!("Удалено {} записей закрытых окон", evicted);
        }
        evicted
    }

    pub fn last_applied(&self, window: WindowId) -> Option<ColorOutcome> {
        self.applied.get(&window).copied()
    }

    pub fn tracked_windows(&self) -> usize {
        self.applied.len()
    }

    /// Забывает все применённые цвета; следующий цикл перекрасит все окна
    pub fn reset(&mut self) {
        self.applied.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::window_source::testing::RecordingPainter;

    const RED: ColorOutcome = ColorOutcome::rgb(255, 0, 0);
    const BLUE: ColorOutcome = ColorOutcome::rgb(0, 0, 255);

    fn dispatcher() -> (DiffDispatcher, Arc<RecordingPainter>) {
        let painter = Arc::new(RecordingPainter::new());
        (DiffDispatcher::new(painter.clone()), painter)
    }

    #[test]
    fn test_unchanged_color_is_not_reapplied() {
        let (mut dispatcher, painter) = dispatcher();
        let window = WindowId(1);

        assert_eq!(dispatcher.apply(window, RED), ApplyOutcome::Applied);
        assert_eq!(dispatcher.apply(window, RED), ApplyOutcome::Unchanged);
        assert_eq!(painter.calls_for(window), vec![RED]);

        assert_eq!(dispatcher.apply(window, BLUE), ApplyOutcome::Applied);
        assert_eq!(painter.calls_for(window), vec![RED, BLUE]);
        assert_eq!(dispatcher.last_applied(window), Some(BLUE));
    }

    #[test]
    fn test_sentinels_are_compared_like_colors() {
        let (mut dispatcher, painter) = dispatcher();
        let window = WindowId(2);

        dispatcher.apply(window, ColorOutcome::NoBorder);
        dispatcher.apply(window, ColorOutcome::NoBorder);
        dispatcher.apply(window, ColorOutcome::OsDefault);
        assert_eq!(
            painter.calls_for(window),
            vec![ColorOutcome::NoBorder, ColorOutcome::OsDefault]
        );
    }

    #[test]
    fn test_failure_drops_record_and_retries_next_time() {
        let (mut dispatcher, painter) = dispatcher();
        let window = WindowId(3);

        dispatcher.apply(window, RED);
        painter.fail_for(window);
        assert_eq!(dispatcher.apply(window, BLUE), ApplyOutcome::Failed);
        assert_eq!(dispatcher.last_applied(window), None);

        painter.recover(window);
        // После ошибки запись удалена, поэтому даже прежний цвет отправляется заново
        assert_eq!(dispatcher.apply(window, RED), ApplyOutcome::Applied);
        assert_eq!(painter.calls_for(window), vec![RED, BLUE, RED]);
    }

    #[test]
    fn test_failure_for_one_window_does_not_affect_others() {
        let (mut dispatcher, painter) = dispatcher();
        painter.fail_for(WindowId(1));

        assert_eq!(dispatcher.apply(WindowId(1), RED), ApplyOutcome::Failed);
        assert_eq!(dispatcher.apply(WindowId(2), RED), ApplyOutcome::Applied);
        assert_eq!(dispatcher.tracked_windows(), 1);
    }

    #[test]
    fn test_evict_absent_windows() {
        let (mut dispatcher, _painter) = dispatcher();
        dispatcher.apply(WindowId(1), RED);
        dispatcher.apply(WindowId(2), RED);
        dispatcher.apply(WindowId(3), RED);

        let present: HashSet<WindowId> = [WindowId(2)].into_iter().collect();
        assert_eq!(dispatcher.evict_absent(&present), 2);
        assert_eq!(dispatcher.tracked_windows(), 1);
        assert_eq!(dispatcher.last_applied(WindowId(1)), None);
        assert_eq!(dispatcher.last_applied(WindowId(2)), Some(RED));
    }

    #[test]
    fn test_reset_forces_reapply() {
        let (mut dispatcher, painter) = dispatcher();
        dispatcher.apply(WindowId(1), RED);
        dispatcher.reset();
        assert_eq!(dispatcher.apply(WindowId(1), RED), ApplyOutcome::Applied);
        assert_eq!(painter.calls().len(), 2);
    }

    #[test]
    fn test_stats_record() {
        let mut stats = DispatchStats::default();
        stats.record(ApplyOutcome::Applied);
        stats.record(ApplyOutcome::Unchanged);
        stats.record(ApplyOutcome::Unchanged);
        stats.record(ApplyOutcome::Failed);
        assert_eq!(
            stats,
            DispatchStats {
                applied: 1,
                unchanged: 2,
                failed: 1,
                evicted: 0
            }
        );
    }
}
