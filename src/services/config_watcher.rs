//! Горячая перезагрузка файла конфигурации.
//!
//! Следим за родительским каталогом: многие редакторы сохраняют файл через
//! временный файл и переименование. Новый набор правил передаётся
//! планировщику целиком и вступает в силу со следующего цикла; при ошибке
//! загрузки остаётся прежний набор.

use super::scheduler::UpdateCycleScheduler;
use crate::config::Config;
use crate::error::Result;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Пауза после первого события: редактор может записать файл в несколько приёмов
const CONFIG_DEBOUNCE_MS: u64 = 200;

pub struct ConfigWatcher {
    // Наблюдатель живёт, пока жива структура
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl ConfigWatcher {
    pub fn start(config_path: PathBuf, scheduler: Arc<UpdateCycleScheduler>) -> Result<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<notify::Result<Event>>();

        let mut watcher = notify::recommended_watcher(move |event| {
            // Получатель закрыт только при остановке наблюдателя
            let _ = tx.send(event);
        })?;

        let watch_path = match config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        watcher.watch(&watch_path, RecursiveMode::NonRecursive)?;

        let file_name = config_path.file_name().map(OsString::from).unwrap_or_default();
        info!("Отслеживание изменений {:?}", config_path);

        let task = tokio::spawn(async move {
            let debounce = Duration::from_millis(CONFIG_DEBOUNCE_MS);

            while let Some(event) = rx.recv().await {
                match event {
                    Ok(event) if affects_config(&event, &file_name) => {}
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("Ошибка отслеживания конфигурации: {}", e);
                        continue;
                    }
                }

                tokio::time::sleep(debounce).await;
                while rx.try_recv().is_ok() {}

                apply_reload(&config_path, &scheduler);
            }
        });

        Ok(Self {
            _watcher: watcher,
            task,
        })
    }
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn affects_config(event: &Event, file_name: &OsString) -> bool {
    event
        .paths
        .iter()
        .any(|path| path.file_name().is_some_and(|name| name == file_name.as_os_str()))
}

/// Перечитывает конфигурацию и передаёт её планировщику.
/// Возвращает false, если файл не прошёл проверку и остались прежние правила.
pub fn apply_reload(config_path: &Path, scheduler: &Arc<UpdateCycleScheduler>) -> bool {
    let config = match Config::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            warn!("Конфигурация не перезагружена, остаются прежние правила: {:#}", e);
            return false;
        }
    };

    let rules = match config.rule_set() {
        Ok(rules) => rules,
        Err(e) => {
            warn!("Конфигурация не перезагружена, остаются прежние правила: {}", e);
            return false;
        }
    };

    info!(
        "Конфигурация перезагружена: правил {} -> {}",
        scheduler.rules().len(),
        rules.len()
    );
    for line in rules.describe() {
        info!("  {}", line);
    }
    scheduler.replace_rules(rules);

    if config.service_enabled {
        if !scheduler.is_running() {
            // Пока сервис был выключен, окна могли смениться: рисуем всё заново
            scheduler.reset();
            scheduler.enable();
        }
    } else {
        scheduler.disable();
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnimationKind, RuleSet};
    use crate::services::scheduler::SchedulerSettings;
    use crate::services::window_source::testing::{RecordingPainter, StaticWindowSource};
    use crate::services::window_source::Backend;
    use notify::EventKind;

    fn scheduler() -> Arc<UpdateCycleScheduler> {
        let backend = Backend {
            source: Arc::new(StaticWindowSource::new(Vec::new())),
            painter: Arc::new(RecordingPainter::new()),
        };
        let rules = Config::default().rule_set().unwrap();
        Arc::new(UpdateCycleScheduler::new(backend, rules, SchedulerSettings::default()))
    }

    fn write(path: &Path, contents: &str) {
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn config_debounce_duration_is_reasonable() {
        const { assert!(CONFIG_DEBOUNCE_MS >= 100) };
        const { assert!(CONFIG_DEBOUNCE_MS <= 1000) };
    }

    #[test]
    fn test_events_are_filtered_by_file_name() {
        let name = OsString::from("config.json");
        let hit = Event::new(EventKind::Any).add_path(PathBuf::from("/tmp/cfg/config.json"));
        let miss = Event::new(EventKind::Any).add_path(PathBuf::from("/tmp/cfg/config.json.swp"));

        assert!(affects_config(&hit, &name));
        assert!(!affects_config(&miss, &name));
    }

    #[tokio::test]
    async fn test_reload_swaps_rules_and_starts_service() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        write(
            &path,
            r##"{ "window_rules": [
                { "match": "Process", "contains": "Spotify.exe",
                  "active_border_color": "#FF0000", "inactive_border_color": "#0000FF",
                  "animation": { "type": "pulse", "speed": 1.0 } } ] }"##,
        );

        let scheduler = scheduler();
        assert!(apply_reload(&path, &scheduler));

        let rules: Arc<RuleSet> = scheduler.rules();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.get(1).unwrap().animation.kind, AnimationKind::Pulse);
        assert!(scheduler.is_running());
        scheduler.disable();
    }

    #[tokio::test]
    async fn test_invalid_reload_keeps_previous_rules() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        write(&path, r#"{ "window_rules": [ { "match": "Process", "contains": "" } ] }"#);

        let scheduler = scheduler();
        let before = scheduler.rules();
        assert!(!apply_reload(&path, &scheduler));
        assert!(Arc::ptr_eq(&before, &scheduler.rules()));
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn test_reload_can_disable_service() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        write(&path, r#"{ "service_enabled": false }"#);

        let scheduler = scheduler();
        scheduler.enable();
        assert!(apply_reload(&path, &scheduler));
        assert!(!scheduler.is_running());
    }
}
