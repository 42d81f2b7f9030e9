use super::color::ColorOutcome;
use crate::error::{BorderError, Result};
use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub const MIN_SPEED: f64 = 0.1;
pub const MAX_SPEED: f64 = 10.0;

/// Зарезервированный ключ синхронизации Global-правила
pub const GLOBAL_SYNC_KEY: &str = "GLOBAL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchType {
    Global,
    Process,
}

impl FromStr for MatchType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "global" => Ok(MatchType::Global),
            "process" => Ok(MatchType::Process),
            other => Err(format!("неизвестный тип совпадения '{}'", other)),
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchType::Global => f.write_str("Global"),
            MatchType::Process => f.write_str("Process"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationKind {
    None,
    Rainbow,
    Pulse,
    Fade,
    Breath,
    Tri,
    Sparkle,
    Steps,
}

impl AnimationKind {
    pub fn name(&self) -> &'static str {
        match self {
            AnimationKind::None => "none",
            AnimationKind::Rainbow => "rainbow",
            AnimationKind::Pulse => "pulse",
            AnimationKind::Fade => "fade",
            AnimationKind::Breath => "breath",
            AnimationKind::Tri => "tri",
            AnimationKind::Sparkle => "sparkle",
            AnimationKind::Steps => "steps",
        }
    }

    pub fn is_animated(&self) -> bool {
        !matches!(self, AnimationKind::None)
    }

    /// Скорость роста фазы при speed = 1.0 (единиц фазы в секунду)
    pub fn base_rate(&self) -> f64 {
        match self {
            AnimationKind::None => 0.0,
            AnimationKind::Rainbow => 0.6,
            AnimationKind::Pulse => 1.5,
            AnimationKind::Fade => 0.6,
            AnimationKind::Breath => 0.9,
            AnimationKind::Tri => 1.8,
            AnimationKind::Sparkle => 1.5,
            AnimationKind::Steps => 1.2,
        }
    }

    /// Область значений фазы: [0, period)
    pub fn period(&self) -> f64 {
        match self {
            AnimationKind::Tri => 2.0,
            _ => TAU,
        }
    }

    /// Приводит произвольное значение фазы в [0, period)
    pub fn wrap_phase(&self, phase: f64) -> f64 {
        let period = self.period();
        let wrapped = phase.rem_euclid(period);
        // rem_euclid может вернуть ровно period из-за округления
        if wrapped >= period {
            0.0
        } else {
            wrapped
        }
    }
}

impl FromStr for AnimationKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(AnimationKind::None),
            "rainbow" => Ok(AnimationKind::Rainbow),
            "pulse" => Ok(AnimationKind::Pulse),
            "fade" => Ok(AnimationKind::Fade),
            "breath" => Ok(AnimationKind::Breath),
            "tri" => Ok(AnimationKind::Tri),
            "sparkle" => Ok(AnimationKind::Sparkle),
            "steps" => Ok(AnimationKind::Steps),
            other => Err(format!("неизвестный тип анимации '{}'", other)),
        }
    }
}

impl fmt::Display for AnimationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Animation {
    pub kind: AnimationKind,
    pub speed: f64,
}

impl Animation {
    pub const NONE: Animation = Animation {
        kind: AnimationKind::None,
        speed: 1.0,
    };

    pub fn new(kind: AnimationKind, speed: f64) -> Result<Self> {
        if !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
            return Err(BorderError::Validation(format!(
                "скорость анимации {} вне диапазона [{}, {}]",
                speed, MIN_SPEED, MAX_SPEED
            )));
        }
        Ok(Self { kind, speed })
    }

    pub fn is_animated(&self) -> bool {
        self.kind.is_animated()
    }
}

impl Default for Animation {
    fn default() -> Self {
        Animation::NONE
    }
}

/// Стабильный идентификатор правила
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleId(Arc<str>);

impl RuleId {
    pub fn new(id: impl AsRef<str>) -> Self {
        RuleId(Arc::from(id.as_ref()))
    }

    /// Идентификатор Process-правила по шаблону: не зависит от порядка правил
    pub fn for_pattern(pattern: &str) -> Self {
        RuleId::new(format!("process:{}", pattern.trim().to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ключ, объединяющий окна с общей фазой анимации
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SyncKey {
    Global,
    Rule(RuleId),
}

impl fmt::Display for SyncKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncKey::Global => f.write_str(GLOBAL_SYNC_KEY),
            SyncKey::Rule(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub id: RuleId,
    pub match_type: MatchType,
    pub pattern: String,
    pub active_color: ColorOutcome,
    pub inactive_color: ColorOutcome,
    pub animation: Animation,
}

impl Rule {
    pub fn global(active: ColorOutcome, inactive: ColorOutcome, animation: Animation) -> Self {
        Self {
            id: RuleId::new(GLOBAL_SYNC_KEY),
            match_type: MatchType::Global,
            pattern: String::new(),
            active_color: active,
            inactive_color: inactive,
            animation,
        }
    }

    pub fn process(
        pattern: impl Into<String>,
        active: ColorOutcome,
        inactive: ColorOutcome,
        animation: Animation,
    ) -> Result<Self> {
        let pattern = pattern.into();
        if pattern.trim().is_empty() {
            return Err(BorderError::Validation(
                "пустой шаблон у Process-правила".to_string(),
            ));
        }

        Ok(Self {
            id: RuleId::for_pattern(&pattern),
            match_type: MatchType::Process,
            pattern,
            active_color: active,
            inactive_color: inactive,
            animation,
        })
    }

    pub fn with_id(mut self, id: RuleId) -> Self {
        // Global всегда использует зарезервированный ключ
        if self.match_type == MatchType::Process {
            self.id = id;
        }
        self
    }

    pub fn is_global(&self) -> bool {
        self.match_type == MatchType::Global
    }

    pub fn sync_key(&self) -> SyncKey {
        match self.match_type {
            MatchType::Global => SyncKey::Global,
            MatchType::Process => SyncKey::Rule(self.id.clone()),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.match_type)?;
        if self.match_type == MatchType::Process {
            write!(f, " contains='{}'", self.pattern)?;
        }
        write!(
            f,
            " | active={} | inactive={} | anim={}({:.1})",
            self.active_color, self.inactive_color, self.animation.kind, self.animation.speed
        )
    }
}

/// Упорядоченный набор правил. Global всегда ровно один и хранится отдельно.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    global: Rule,
    processes: Vec<Rule>,
}

impl RuleSet {
    pub fn new(global: Rule, processes: Vec<Rule>) -> Result<Self> {
        if !global.is_global() {
            return Err(BorderError::Validation(format!(
                "ожидалось Global-правило, получено {}",
                global.match_type
            )));
        }

        if let Some((i, _)) = processes.iter().enumerate().find(|(_, r)| r.is_global()) {
            return Err(BorderError::Validation(format!(
                "второе Global-правило на позиции #{}",
                i + 2
            )));
        }

        Ok(Self { global, processes })
    }

    /// Набор из одного Global-правила
    pub fn with_global(global: Rule) -> Result<Self> {
        Self::new(global, Vec::new())
    }

    pub fn global(&self) -> &Rule {
        &self.global
    }

    pub fn process_rules(&self) -> &[Rule] {
        &self.processes
    }

    /// Все правила в порядке хранения: Global первым
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        std::iter::once(&self.global).chain(self.processes.iter())
    }

    pub fn len(&self) -> usize {
        1 + self.processes.len()
    }

    pub fn get(&self, index: usize) -> Option<&Rule> {
        self.iter().nth(index)
    }

    pub fn has_animation(&self) -> bool {
        self.iter().any(|rule| rule.animation.is_animated())
    }

    /// Индекс Process-правила, чей шаблон совпадает с именем целиком (без учёта регистра)
    pub fn find_process_rule(&self, exe_name: &str) -> Option<usize> {
        let needle = exe_name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.processes
            .iter()
            .position(|rule| rule.pattern.trim().to_lowercase() == needle)
            .map(|i| i + 1)
    }

    /// Одна строка на правило, нумерация с единицы
    pub fn describe(&self) -> Vec<String> {
        self.iter()
            .enumerate()
            .map(|(i, rule)| format!("{}. {}", i + 1, rule))
            .collect()
    }
}
