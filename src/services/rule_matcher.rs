//! RuleMatcher: выбор правила для окна по имени исполняемого файла.
//!
//! Process-правила проверяются в порядке хранения, первое совпадение
//! (подстрока без учёта регистра) побеждает. Если не совпало ни одно,
//! окном управляет Global-правило.

use crate::model::{Rule, RuleSet};
use std::sync::Arc;

pub struct RuleMatcher {
    rules: Arc<RuleSet>,
    // Предварительно нормализованные шаблоны, индексы совпадают с process_rules()
    patterns_lower: Vec<String>,
}

impl RuleMatcher {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        let patterns_lower = rules
            .process_rules()
            .iter()
            .map(|rule| rule.pattern.to_lowercase())
            .collect();

        Self {
            rules,
            patterns_lower,
        }
    }

    pub fn rules(&self) -> &Arc<RuleSet> {
        &self.rules
    }

    /// Правило, управляющее окном с данным исполняемым файлом
    pub fn match_rule(&self, exe_name: &str) -> &Rule {
        let exe_lower = exe_name.to_lowercase();

        self.patterns_lower
            .iter()
            .position(|pattern| exe_lower.contains(pattern.as_str()))
            .map(|i| &self.rules.process_rules()[i])
            .unwrap_or_else(|| self.rules.global())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Animation, ColorOutcome, RuleId};

    fn rules(patterns: &[&str]) -> Arc<RuleSet> {
        let global = Rule::global(ColorOutcome::OsDefault, ColorOutcome::OsDefault, Animation::NONE);
        let processes = patterns
            .iter()
            .enumerate()
            .map(|(i, pattern)| {
                Rule::process(*pattern, ColorOutcome::NoBorder, ColorOutcome::NoBorder, Animation::NONE)
                    .unwrap()
                    .with_id(RuleId::new(format!("rule-{}", i)))
            })
            .collect();
        Arc::new(RuleSet::new(global, processes).unwrap())
    }

    #[test]
    fn test_falls_back_to_global() {
        let matcher = RuleMatcher::new(rules(&["spotify", "code"]));
        assert!(matcher.match_rule("explorer.exe").is_global());
        assert!(matcher.match_rule("").is_global());
    }

    #[test]
    fn test_process_match_is_case_insensitive_substring() {
        let matcher = RuleMatcher::new(rules(&["Spotify.exe"]));
        let rule = matcher.match_rule("spotify.EXE");
        assert!(!rule.is_global());
        assert_eq!(rule.pattern, "Spotify.exe");

        // Шаблон длиннее имени не совпадает
        assert!(matcher.match_rule("spotify").is_global());
    }

    #[test]
    fn test_first_matching_process_rule_wins() {
        let matcher = RuleMatcher::new(rules(&["code", "Code.exe"]));
        assert_eq!(matcher.match_rule("Code.exe").id, RuleId::new("rule-0"));

        let matcher = RuleMatcher::new(rules(&["Code.exe", "code"]));
        assert_eq!(matcher.match_rule("Code.exe").id, RuleId::new("rule-0"));
        assert_eq!(matcher.match_rule("vscode-helper").id, RuleId::new("rule-1"));
    }

    #[test]
    fn test_global_iff_no_pattern_is_substring() {
        let patterns = ["fire", "TERM", "notepad++", "zz"];
        let matcher = RuleMatcher::new(rules(&patterns));
        let names = [
            "firefox.exe",
            "WindowsTerminal.exe",
            "notepad.exe",
            "Notepad++.exe",
            "explorer.exe",
            "cmd.exe",
            "jazz.exe",
            "",
        ];

        for name in names {
            let any_match = patterns
                .iter()
                .any(|p| name.to_lowercase().contains(&p.to_lowercase()));
            assert_eq!(
                matcher.match_rule(name).is_global(),
                !any_match,
                "неверный выбор правила для '{}'",
                name
            );
        }
    }
}
