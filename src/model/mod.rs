pub mod color;
pub mod rule;
pub mod window;

pub use color::{ColorOutcome, Rgb};
pub use rule::{Animation, AnimationKind, MatchType, Rule, RuleId, RuleSet, SyncKey};
pub use window::{WindowId, WindowInfo};
