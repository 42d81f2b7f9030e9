use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Сколько живёт запись о процессе, который не встречался в снимках
pub const PROCESS_NAME_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CachedName {
    name: Arc<str>,
    last_seen: Instant,
}

/// Кэш pid -> имя исполняемого файла.
///
/// Запрос имени процесса у ОС дороже, чем перечисление окон, а набор процессов
/// между тиками почти не меняется. Записи, не запрошенные дольше TTL, удаляются.
pub struct ProcessNameCache {
    names: DashMap<u32, CachedName>,
    ttl: Duration,
}

impl Default for ProcessNameCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessNameCache {
    pub fn new() -> Self {
        Self::with_ttl(PROCESS_NAME_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            names: DashMap::new(),
            ttl,
        }
    }

    /// Имя из кэша или от `resolve`; пустое имя тоже кэшируется
    pub fn get_or_resolve<F>(&self, pid: u32, resolve: F) -> Arc<str>
    where
        F: FnOnce(u32) -> Option<String>,
    {
        let now = Instant::now();

        if let Some(mut entry) = self.names.get_mut(&pid) {
            entry.last_seen = now;
            return entry.name.clone();
        }

        let name: Arc<str> = Arc::from(resolve(pid).unwrap_or_default().trim());
        self.names.insert(
            pid,
            CachedName {
                name: name.clone(),
                last_seen: now,
            },
        );
        name
    }

    /// Удаляет устаревшие записи, возвращает число удалённых
    pub fn evict_stale(&self) -> usize {
        self.evict_older_than(Instant::now())
    }

    fn evict_older_than(&self, now: Instant) -> usize {
        let before = self.names.len();
        self.names
            .retain(|_, cached| now.saturating_duration_since(cached.last_seen) <= self.ttl);
        before - self.names.len()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
