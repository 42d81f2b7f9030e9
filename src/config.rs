use crate::border_error;
use crate::error::BorderError;
use crate::model::{Animation, AnimationKind, ColorOutcome, MatchType, Rule, RuleId, RuleSet};
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Минимальный период тика; меньшие значения только нагружают DWM
pub const MIN_INTERVAL_MS: u64 = 16;

const DEFAULT_ACTIVE: ColorOutcome = ColorOutcome::rgb(0xC6, 0xA0, 0xF6);
const DEFAULT_INACTIVE: ColorOutcome = ColorOutcome::rgb(0xFF, 0xFF, 0xFF);

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub service_enabled: bool,
    pub logging: LoggingConfig,
    pub service: ServiceConfig,
    /// Анимация для правил без собственной
    pub animation: AnimationConfig,
    pub window_rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub tick_interval_ms: u64,
    pub animation_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnimationConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub speed: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "match")]
    pub match_type: String,
    #[serde(default)]
    pub contains: String,
    #[serde(default = "default_color_token")]
    pub active_border_color: String,
    #[serde(default = "default_color_token")]
    pub inactive_border_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<AnimationConfig>,
}

fn default_color_token() -> String {
    "default".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 120,
            animation_interval_ms: 33,
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            kind: "none".to_string(),
            speed: 1.0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_enabled: true,
            logging: LoggingConfig::default(),
            service: ServiceConfig::default(),
            animation: AnimationConfig::default(),
            window_rules: vec![RuleConfig {
                id: None,
                match_type: "Global".to_string(),
                contains: String::new(),
                active_border_color: DEFAULT_ACTIVE.to_string(),
                inactive_border_color: DEFAULT_INACTIVE.to_string(),
                animation: Some(AnimationConfig::default()),
            }],
        }
    }
}

impl AnimationConfig {
    fn to_animation(&self) -> std::result::Result<Animation, String> {
        let kind: AnimationKind = self.kind.parse()?;
        Animation::new(kind, self.speed).map_err(|e| match e {
            BorderError::Validation(msg) => msg,
            other => other.to_string(),
        })
    }
}

impl RuleConfig {
    /// Правило модели; `number` нумерует правила с единицы для сообщений об ошибках
    fn to_rule(&self, number: usize, fallback: &AnimationConfig) -> crate::error::Result<Rule> {
        let invalid = |msg: String| border_error!(validation, "правило #{}: {}", number, msg);

        let match_type: MatchType = self.match_type.parse().map_err(invalid)?;
        let active: ColorOutcome = self.active_border_color.parse().map_err(invalid)?;
        let inactive: ColorOutcome = self.inactive_border_color.parse().map_err(invalid)?;
        let animation = self
            .animation
            .as_ref()
            .unwrap_or(fallback)
            .to_animation()
            .map_err(invalid)?;

        match match_type {
            MatchType::Global => Ok(Rule::global(active, inactive, animation)),
            MatchType::Process => {
                if self.contains.trim().is_empty() {
                    return Err(invalid("пустое поле contains".to_string()));
                }
                let rule = Rule::process(self.contains.trim(), active, inactive, animation)?;
                Ok(match self.id.as_deref().map(str::trim) {
                    Some(id) if !id.is_empty() => rule.with_id(RuleId::new(id)),
                    _ => rule,
                })
            }
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if config_path.exists() {
            figment = if is_json(config_path) {
                figment.merge(Json::file(config_path))
            } else {
                figment.merge(Toml::file(config_path))
            };
        } else {
            info!(
                "Файл конфигурации {:?} не найден, используются настройки по умолчанию",
                config_path
            );
        }
        figment = figment.merge(Env::prefixed("BORDER_TINT_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "compact" | "full" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация периодов обновления
        if self.service.tick_interval_ms < MIN_INTERVAL_MS {
            anyhow::bail!("tick_interval_ms должно быть минимум {}", MIN_INTERVAL_MS);
        }

        if self.service.animation_interval_ms < MIN_INTERVAL_MS {
            anyhow::bail!("animation_interval_ms должно быть минимум {}", MIN_INTERVAL_MS);
        }

        if let Err(msg) = self.animation.to_animation() {
            anyhow::bail!("Неверная анимация по умолчанию: {}", msg);
        }

        // Валидация правил; предупреждения выводит rule_set при реальной сборке
        self.build_rule_set(false)?;

        Ok(())
    }

    /// Нормализованный набор правил: ровно одно Global-правило первым,
    /// правила без анимации наследуют анимацию по умолчанию
    ///
    /// Правила с общим явным `id` делят одну фазу анимации, поэтому их
    /// анимации обязаны совпадать.
    pub fn rule_set(&self) -> crate::error::Result<RuleSet> {
        self.build_rule_set(true)
    }

    fn build_rule_set(&self, report: bool) -> crate::error::Result<RuleSet> {
        let mut global: Option<Rule> = None;
        let mut processes = Vec::with_capacity(self.window_rules.len());
        // id -> (номер правила, анимация, id задан явно)
        let mut sync_groups: HashMap<RuleId, (usize, Animation, bool)> = HashMap::new();

        for (i, raw) in self.window_rules.iter().enumerate() {
            let number = i + 1;
            let rule = raw.to_rule(number, &self.animation)?;

            if rule.is_global() {
                if global.is_none() {
                    global = Some(rule);
                } else if report {
                    warn!("Правило #{}: лишнее Global-правило пропущено", number);
                }
                continue;
            }

            let explicit = raw.id.as_deref().is_some_and(|id| !id.trim().is_empty());
            match sync_groups.get(&rule.id) {
                Some(&(first, animation, first_explicit))
                    if (explicit || first_explicit) && animation != rule.animation =>
                {
                    return Err(border_error!(
                        validation,
                        "правило #{}: id '{}' уже занят правилом #{} с другой анимацией ({}({:.1}) вместо {}({:.1}))",
                        number,
                        rule.id.as_str(),
                        first,
                        rule.animation.kind,
                        rule.animation.speed,
                        animation.kind,
                        animation.speed
                    ));
                }
                Some(_) => {}
                None => {
                    sync_groups.insert(rule.id.clone(), (number, rule.animation, explicit));
                }
            }

            processes.push(rule);
        }

        let global = global.unwrap_or_else(|| {
            if report {
                warn!("Global-правило не найдено, добавлено правило по умолчанию");
            }
            Rule::global(DEFAULT_ACTIVE, DEFAULT_INACTIVE, Animation::NONE)
        });

        RuleSet::new(global, processes)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}
