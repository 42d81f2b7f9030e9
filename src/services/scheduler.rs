//! UpdateCycleScheduler: таймерный цикл раскраски рамок.
//!
//! Один цикл: снимок окон -> выбор правил -> один шаг часов анимации ->
//! вычисление цветов -> дифференциальное применение. Цикл выполняется
//! синхронно внутри одной задачи tokio, поэтому два цикла никогда не
//! пересекаются, а остановка не прерывает цикл на середине.
//!
//! Состоянием анимаций и применённых цветов владеет планировщик. Оно
//! создаётся при создании планировщика, переживает disable/enable и
//! очищается только явным `reset()`.

use super::animation_clock::AnimationClock;
use super::color_resolver;
use super::diff_dispatcher::{DiffDispatcher, DispatchStats};
use super::RuleMatcher;
use super::window_source::{Backend, WindowSource};
use crate::config::ServiceConfig;
use crate::error::Result;
use crate::model::{Animation, ColorOutcome, Rule, RuleSet, SyncKey, WindowId};
use crate::trace_if_enabled;
use parking_lot::{Mutex, RwLock};
use smallvec::SmallVec;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, MissedTickBehavior};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Период тика, когда ни одно правило не анимировано
    pub tick_interval: Duration,
    /// Период тика при наличии анимаций
    pub animation_interval: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(120),
            animation_interval: Duration::from_millis(33),
        }
    }
}

impl From<&ServiceConfig> for SchedulerSettings {
    fn from(service: &ServiceConfig) -> Self {
        Self {
            tick_interval: Duration::from_millis(service.tick_interval_ms),
            animation_interval: Duration::from_millis(service.animation_interval_ms),
        }
    }
}

/// Итог одного цикла
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub windows: usize,
    pub stats: DispatchStats,
}

struct CycleState {
    matcher: RuleMatcher,
    clock: AnimationClock,
    dispatcher: DiffDispatcher,
    last_cycle: Option<Instant>,
}

pub struct UpdateCycleScheduler {
    source: Arc<dyn WindowSource>,
    // Новый набор правил подменяется целиком и подхватывается в начале цикла
    rules: RwLock<Arc<RuleSet>>,
    state: Mutex<CycleState>,
    settings: SchedulerSettings,
    running: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl UpdateCycleScheduler {
    pub fn new(backend: Backend, rules: RuleSet, settings: SchedulerSettings) -> Self {
        info!(
            "Инициализация UpdateCycleScheduler (правил: {}, тик: {:?}, анимация: {:?})",
            rules.len(),
            settings.tick_interval,
            settings.animation_interval
        );

        let rules = Arc::new(rules);
        Self {
            source: backend.source,
            rules: RwLock::new(rules.clone()),
            state: Mutex::new(CycleState {
                matcher: RuleMatcher::new(rules),
                clock: AnimationClock::new(),
                dispatcher: DiffDispatcher::new(backend.painter),
                last_cycle: None,
            }),
            settings,
            running: AtomicBool::new(false),
            task: Mutex::new(None),
        }
    }

    /// Запускает цикл; возвращает false, если он уже запущен
    pub fn enable(self: &Arc<Self>) -> bool {
        // Флаг и задача меняются под одной блокировкой, иначе disable может не найти задачу
        let mut task = self.task.lock();
        if self.running.swap(true, Ordering::AcqRel) {
            return false;
        }

        let scheduler = Arc::clone(self);
        *task = Some(tokio::spawn(async move {
            scheduler.run_loop().await;
        }));
        drop(task);

        info!("Сервис раскраски рамок запущен");
        true
    }

    /// Останавливает цикл. Текущий цикл, если он идёт, завершается полностью:
    /// отмена задачи срабатывает только в точке ожидания следующего тика.
    /// Фазы и записи сохраняются; первый цикл после enable идёт с нулевым шагом.
    pub fn disable(&self) -> bool {
        let handle = {
            let mut task = self.task.lock();
            if !self.running.swap(false, Ordering::AcqRel) {
                return false;
            }
            task.take()
        };

        if let Some(handle) = handle {
            handle.abort();
        }
        self.state.lock().last_cycle = None;

        info!("Сервис раскраски рамок остановлен");
        true
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Подменяет набор правил; вступает в силу со следующего цикла
    pub fn replace_rules(&self, rules: RuleSet) {
        info!("Новый набор правил ({}) будет применён со следующего цикла", rules.len());
        *self.rules.write() = Arc::new(rules);
    }

    pub fn rules(&self) -> Arc<RuleSet> {
        self.rules.read().clone()
    }

    /// Явный сброс фаз анимаций и записей применённых цветов
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.clock.reset();
        state.dispatcher.reset();
        state.last_cycle = None;
        info!("Состояние анимаций и применённых цветов сброшено");
    }

    /// Предпросмотр цвета правила в момент `simulated_secs`; не трогает состояние цикла
    pub fn preview_color(rule: &Rule, focused: bool, simulated_secs: f64) -> ColorOutcome {
        color_resolver::preview_color(rule, focused, simulated_secs)
    }

    #[cfg(test)]
    pub fn last_applied(&self, window: WindowId) -> Option<ColorOutcome> {
        self.state.lock().dispatcher.last_applied(window)
    }

    pub fn tracked_windows(&self) -> usize {
        self.state.lock().dispatcher.tracked_windows()
    }

    pub fn cycles(&self) -> u64 {
        self.state.lock().clock.cycles()
    }

    /// Период до следующего тика для текущего набора правил
    pub fn current_period(&self) -> Duration {
        if self.rules.read().has_animation() {
            self.settings.animation_interval
        } else {
            self.settings.tick_interval
        }
    }

    #[cfg(test)]
    fn last_cycle_at(&self) -> Option<Instant> {
        self.state.lock().last_cycle
    }

    /// Один цикл с шагом времени, измеренным от предыдущего успешного цикла
    pub fn run_cycle(&self) -> Result<CycleReport> {
        self.cycle(None)
    }

    /// Один цикл с заданным шагом времени в секундах
    pub fn run_cycle_with_delta(&self, delta_secs: f64) -> Result<CycleReport> {
        self.cycle(Some(delta_secs))
    }

    fn cycle(&self, fixed_delta: Option<f64>) -> Result<CycleReport> {
        // Блокировка удерживается весь цикл: reset и чтение состояния ждут его окончания
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let rules = self.rules.read().clone();
        if !Arc::ptr_eq(&rules, state.matcher.rules()) {
            state.matcher = RuleMatcher::new(rules.clone());
        }

        let snapshot = self.source.list_visible_windows()?;

        // Время отсчитывается только от циклов с успешным снимком
        let delta_secs = fixed_delta.unwrap_or_else(|| {
            let now = Instant::now();
            let delta = state
                .last_cycle
                .map(|last| now.saturating_duration_since(last).as_secs_f64())
                .unwrap_or(0.0);
            state.last_cycle = Some(now);
            delta
        });

        let matched: Vec<_> = snapshot
            .iter()
            .filter(|window| window.is_eligible())
            .map(|window| (window, state.matcher.match_rule(&window.exe_name)))
            .collect();

        // Ровно один шаг часов на цикл, до вычисления любого цвета
        state.clock.advance(delta_secs, animated_keys(&rules));

        let mut report = CycleReport {
            windows: matched.len(),
            stats: DispatchStats::default(),
        };

        for (window, rule) in matched {
            let phase = state.clock.phase_for(&rule.sync_key(), rule.animation.kind);
            let outcome = color_resolver::resolve(rule, phase, window.focused);
            report.stats.record(state.dispatcher.apply(window.id, outcome));
        }

        let present: HashSet<WindowId> = snapshot.iter().map(|window| window.id).collect();
        report.stats.evicted = state.dispatcher.evict_absent(&present);

        trace_if_enabled!(
            "Цикл #{} ({:.2}s, анимаций {}): окон {}, применено {}, без изменений {}, ошибок {}, удалено {}",
            state.clock.cycles(),
            state.clock.elapsed_secs(),
            state.clock.tracked_keys(),
            report.windows,
            report.stats.applied,
            report.stats.unchanged,
            report.stats.failed,
            report.stats.evicted
        );

        Ok(report)
    }

    async fn run_loop(self: Arc<Self>) {
        let mut period = self.current_period();
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if !self.is_running() {
                break;
            }

            if let Err(e) = self.run_cycle() {
                warn!("Цикл пропущен: {}", e);
            }

            let next = self.current_period();
            if next != period {
                info!("Период обновления изменён: {:?} -> {:?}", period, next);
                period = next;
                ticker = interval_at(tokio::time::Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            }
        }
    }
}

impl Drop for UpdateCycleScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}

/// Уникальные ключи синхронизации анимированных правил
fn animated_keys(rules: &RuleSet) -> SmallVec<[(SyncKey, Animation); 4]> {
    let mut keys: SmallVec<[(SyncKey, Animation); 4]> = SmallVec::new();
    for rule in rules.iter().filter(|rule| rule.animation.is_animated()) {
        let key = rule.sync_key();
        if !keys.iter().any(|(existing, _)| *existing == key) {
            keys.push((key, rule.animation));
        }
    }
    keys
}
