//! ColorResolver: цвет рамки по правилу, фазе анимации и фокусу окна.
//!
//! Без анимации возвращается `active_color` или `inactive_color` как есть,
//! включая "none" и "default". Анимация полностью заменяет статические цвета:
//!
//! | Тип      | Цвета              | Коэффициент смешивания                 |
//! |----------|--------------------|----------------------------------------|
//! | pulse    | active -> inactive | `(1 - cos φ) / 2`                      |
//! | fade     | active -> inactive | `(1 - cos φ) / 2`, медленнее pulse     |
//! | tri      | active -> inactive | треугольная волна `1 - |φ - 1|`        |
//! | steps    | active -> inactive | косинус, квантованный в `STEP_LEVELS`  |
//! | breath   | только active      | осветление до 35%                      |
//! | sparkle  | только active      | мерцание ±15%                          |
//! | rainbow  | игнорирует цвета   | оттенок = φ / 2π · 360°                |
//!
//! Для двухцветных анимаций "default" заменяется нейтральным серым, а "none"
//! пропускается: используется второй конец. Если оба конца "none", рамки нет.

use super::animation_clock::phase_at;
use crate::model::{AnimationKind, ColorOutcome, Rgb, Rule};
use std::f64::consts::TAU;

/// Число уровней у анимации steps
pub const STEP_LEVELS: u32 = 4;

const BREATH_AMPLITUDE: f64 = 0.35;
const SPARKLE_AMPLITUDE: f64 = 0.15;

pub fn resolve(rule: &Rule, phase: f64, focused: bool) -> ColorOutcome {
    let kind = rule.animation.kind;

    match kind {
        AnimationKind::None => {
            if focused {
                rule.active_color
            } else {
                rule.inactive_color
            }
        }
        AnimationKind::Pulse | AnimationKind::Fade | AnimationKind::Tri | AnimationKind::Steps => {
            let t = blend_factor(kind, phase);
            blend_endpoints(rule.active_color, rule.inactive_color, t)
        }
        AnimationKind::Breath => match blend_source(rule.active_color) {
            Some(base) => ColorOutcome::Rgb(breath(base, phase)),
            None => ColorOutcome::NoBorder,
        },
        AnimationKind::Sparkle => match blend_source(rule.active_color) {
            Some(base) => ColorOutcome::Rgb(sparkle(base, phase)),
            None => ColorOutcome::NoBorder,
        },
        AnimationKind::Rainbow => ColorOutcome::Rgb(rainbow(phase)),
    }
}

/// Цвет для предпросмотра правила без реального цикла
pub fn preview_color(rule: &Rule, focused: bool, elapsed_secs: f64) -> ColorOutcome {
    resolve(rule, phase_at(&rule.animation, elapsed_secs), focused)
}

/// Коэффициент смешивания двухцветных анимаций в [0, 1]; 0 соответствует active
pub fn blend_factor(kind: AnimationKind, phase: f64) -> f64 {
    match kind {
        AnimationKind::Pulse | AnimationKind::Fade => cosine_wave(phase),
        AnimationKind::Tri => {
            let x = AnimationKind::Tri.wrap_phase(phase);
            1.0 - (x - 1.0).abs()
        }
        AnimationKind::Steps => {
            let levels = f64::from(STEP_LEVELS - 1);
            (cosine_wave(phase) * levels).round() / levels
        }
        AnimationKind::None
        | AnimationKind::Breath
        | AnimationKind::Sparkle
        | AnimationKind::Rainbow => 0.0,
    }
}

fn cosine_wave(phase: f64) -> f64 {
    ((1.0 - phase.cos()) / 2.0).clamp(0.0, 1.0)
}

fn blend_source(color: ColorOutcome) -> Option<Rgb> {
    match color {
        ColorOutcome::OsDefault => Some(Rgb::NEUTRAL_GRAY),
        other => other.as_rgb(),
    }
}

fn blend_endpoints(active: ColorOutcome, inactive: ColorOutcome, t: f64) -> ColorOutcome {
    match (blend_source(active), blend_source(inactive)) {
        (Some(from), Some(to)) => ColorOutcome::Rgb(from.lerp(to, t)),
        (Some(only), None) | (None, Some(only)) => ColorOutcome::Rgb(only),
        (None, None) => ColorOutcome::NoBorder,
    }
}

fn breath(base: Rgb, phase: f64) -> Rgb {
    base.lighten(BREATH_AMPLITUDE * cosine_wave(phase))
}

fn sparkle(base: Rgb, phase: f64) -> Rgb {
    // Целые множители сохраняют непрерывность на границе периода 2π
    let w1 = 0.5 + 0.5 * (2.0 * phase).sin();
    let w2 = 0.5 + 0.5 * (3.0 * phase + 1.234).sin();
    let jitter = w1 * 0.6 + w2 * 0.4;

    let up = base.lighten(SPARKLE_AMPLITUDE * jitter);
    let down = base.darken(SPARKLE_AMPLITUDE * (1.0 - jitter));
    down.lerp(up, 0.5)
}

fn rainbow(phase: f64) -> Rgb {
    let hue = AnimationKind::Rainbow.wrap_phase(phase) / TAU * 360.0;
    Rgb::from_hsv(hue, 1.0, 1.0)
}
