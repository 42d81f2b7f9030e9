//! AnimationClock: общая логическая шкала времени анимаций.
//!
//! `advance` вызывается ровно один раз за цикл, до любого вычисления цвета.
//! Все окна с одним ключом синхронизации читают одну и ту же фазу, поэтому
//! окна под анимированным Global-правилом мигают синхронно.

use crate::model::{Animation, AnimationKind, SyncKey};
use std::collections::HashMap;

/// Верхняя граница шага времени, чтобы после сна системы фаза не прыгала
pub const MAX_CYCLE_DELTA_SECS: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq)]
struct PhaseState {
    kind: AnimationKind,
    phase: f64,
}

#[derive(Debug, Default)]
pub struct AnimationClock {
    states: HashMap<SyncKey, PhaseState>,
    elapsed_secs: f64,
    cycles: u64,
}

impl AnimationClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Сдвигает фазы всех переданных ключей на `speed * base_rate * delta`.
    ///
    /// Состояние ключа создаётся при первом использовании и сбрасывается в
    /// ноль, если у правила сменился тип анимации.
    pub fn advance<I>(&mut self, delta_secs: f64, keys: I)
    where
        I: IntoIterator<Item = (SyncKey, Animation)>,
    {
        let delta = if delta_secs.is_finite() {
            delta_secs.clamp(0.0, MAX_CYCLE_DELTA_SECS)
        } else {
            0.0
        };

        for (key, animation) in keys {
            if !animation.is_animated() {
                continue;
            }

            let state = self.states.entry(key).or_insert(PhaseState {
                kind: animation.kind,
                phase: 0.0,
            });

            if state.kind != animation.kind {
                state.kind = animation.kind;
                state.phase = 0.0;
            }

            let step = animation.speed * animation.kind.base_rate() * delta;
            state.phase = animation.kind.wrap_phase(state.phase + step);
        }

        self.elapsed_secs += delta;
        self.cycles += 1;
    }

    /// Текущая фаза ключа без изменения состояния; 0.0 для неизвестного ключа
    /// или если ключ хранит фазу другого типа анимации
    pub fn phase_for(&self, key: &SyncKey, kind: AnimationKind) -> f64 {
        match self.states.get(key) {
            Some(state) if state.kind == kind => state.phase,
            _ => 0.0,
        }
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_secs
    }

    pub fn tracked_keys(&self) -> usize {
        self.states.len()
    }

    pub fn reset(&mut self) {
        self.states.clear();
        self.elapsed_secs = 0.0;
        self.cycles = 0;
    }
}

/// Фаза для предпросмотра: та же формула, что и у часов, но без состояния
pub fn phase_at(animation: &Animation, elapsed_secs: f64) -> f64 {
    if !animation.is_animated() || !elapsed_secs.is_finite() {
        return 0.0;
    }
    let raw = animation.speed * animation.kind.base_rate() * elapsed_secs.max(0.0);
    animation.kind.wrap_phase(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RuleId;
    use std::f64::consts::TAU;

    fn pulse(speed: f64) -> Animation {
        Animation::new(AnimationKind::Pulse, speed).unwrap()
    }

    #[test]
    fn test_unknown_key_reads_zero() {
        let clock = AnimationClock::new();
        assert_eq!(clock.phase_for(&SyncKey::Global, AnimationKind::Pulse), 0.0);
    }

    #[test]
    fn test_advance_scales_with_speed_and_delta() {
        let mut clock = AnimationClock::new();
        let fast = SyncKey::Rule(RuleId::new("fast"));

        clock.advance(0.1, [(SyncKey::Global, pulse(1.0)), (fast.clone(), pulse(2.0))]);

        let slow_phase = clock.phase_for(&SyncKey::Global, AnimationKind::Pulse);
        let fast_phase = clock.phase_for(&fast, AnimationKind::Pulse);
        assert!((slow_phase - 0.15).abs() < 1e-9);
        assert!((fast_phase - 0.30).abs() < 1e-9);
        assert_eq!(clock.cycles(), 1);
    }

    #[test]
    fn test_phase_for_does_not_mutate() {
        let mut clock = AnimationClock::new();
        clock.advance(0.2, [(SyncKey::Global, pulse(1.0))]);

        let first = clock.phase_for(&SyncKey::Global, AnimationKind::Pulse);
        let second = clock.phase_for(&SyncKey::Global, AnimationKind::Pulse);
        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn test_delta_is_clamped() {
        let mut clock = AnimationClock::new();
        clock.advance(30.0, [(SyncKey::Global, pulse(1.0))]);
        let phase = clock.phase_for(&SyncKey::Global, AnimationKind::Pulse);
        assert!((phase - MAX_CYCLE_DELTA_SECS * 1.5).abs() < 1e-9);

        clock.advance(f64::NAN, [(SyncKey::Global, pulse(1.0))]);
        assert!((clock.phase_for(&SyncKey::Global, AnimationKind::Pulse) - phase).abs() < 1e-12);
    }

    #[test]
    fn test_phase_wraps_into_domain() {
        let mut clock = AnimationClock::new();
        let tri = Animation::new(AnimationKind::Tri, 10.0).unwrap();
        let rainbow = Animation::new(AnimationKind::Rainbow, 10.0).unwrap();
        let rainbow_key = SyncKey::Rule(RuleId::new("rainbow"));

        for _ in 0..500 {
            clock.advance(0.25, [(SyncKey::Global, tri), (rainbow_key.clone(), rainbow)]);
            let tri_phase = clock.phase_for(&SyncKey::Global, AnimationKind::Tri);
            let rainbow_phase = clock.phase_for(&rainbow_key, AnimationKind::Rainbow);
            assert!((0.0..2.0).contains(&tri_phase));
            assert!((0.0..TAU).contains(&rainbow_phase));
        }
    }

    #[test]
    fn test_kind_change_resets_phase() {
        let mut clock = AnimationClock::new();
        clock.advance(0.2, [(SyncKey::Global, pulse(1.0))]);
        assert!(clock.phase_for(&SyncKey::Global, AnimationKind::Pulse) > 0.0);

        let fade = Animation::new(AnimationKind::Fade, 1.0).unwrap();
        clock.advance(0.1, [(SyncKey::Global, fade)]);
        let phase = clock.phase_for(&SyncKey::Global, AnimationKind::Fade);
        assert!((phase - 0.06).abs() < 1e-9);
        assert_eq!(clock.phase_for(&SyncKey::Global, AnimationKind::Pulse), 0.0);
    }

    #[test]
    fn test_static_animations_are_not_tracked() {
        let mut clock = AnimationClock::new();
        clock.advance(0.1, [(SyncKey::Global, Animation::NONE)]);
        assert_eq!(clock.tracked_keys(), 0);
        assert_eq!(clock.cycles(), 1);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut clock = AnimationClock::new();
        clock.advance(0.1, [(SyncKey::Global, pulse(1.0))]);
        clock.reset();
        assert_eq!(clock.tracked_keys(), 0);
        assert_eq!(clock.cycles(), 0);
        assert_eq!(clock.elapsed_secs(), 0.0);
    }

    #[test]
    fn test_phase_at_matches_clock_for_small_steps() {
        let animation = pulse(2.0);
        let mut clock = AnimationClock::new();
        for _ in 0..10 {
            clock.advance(0.05, [(SyncKey::Global, animation)]);
        }
        let expected = phase_at(&animation, 0.5);
        let actual = clock.phase_for(&SyncKey::Global, AnimationKind::Pulse);
        assert!((expected - actual).abs() < 1e-9);
    }
}
