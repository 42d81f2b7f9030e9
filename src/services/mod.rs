pub mod animation_clock;
pub mod color_resolver;
pub mod config_watcher;
pub mod diff_dispatcher;
pub mod rule_matcher;
pub mod scheduler;
pub mod window_source;

pub use config_watcher::ConfigWatcher;
pub use rule_matcher::RuleMatcher;
pub use scheduler::{SchedulerSettings, UpdateCycleScheduler};
pub use window_source::create_backend;
