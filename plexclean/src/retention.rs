//! Label-based retention policy.
//!
//! A collection is removed when it has no labels at all, when one of its
//! labels equals a configured delete label, or when one of its labels
//! matches a configured wildcard pattern. Everything else is kept.
//! All comparisons are case-insensitive.
//!
//! Patterns use shell rules: `*` matches any run of characters, `?` a
//! single character, and `[...]` a character class. A run of `*` acts as a
//! single `*`, and a `[` without a closing `]` is a literal character.

use std::fmt;

use glob::{MatchOptions, Pattern};

use crate::error::{PlexCleanError, Result};

/// Wildcard options: `*` and `?` cross `/` and leading dots freely.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Why a collection was kept or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Reason {
    /// Collection carries no labels.
    NoLabels,
    /// Label equals a delete label.
    ExactMatch(String),
    /// Label matches a delete pattern.
    PatternMatch(String),
    /// None of the labels matched a rule.
    Protected(Vec<String>),
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoLabels => f.write_str("NO LABELS"),
            Self::ExactMatch(label) => write!(f, "MATCHES DELETE LABEL: {label}"),
            Self::PatternMatch(label) => write!(f, "MATCHES DELETE PATTERN: {label}"),
            Self::Protected(labels) => write!(f, "HAS PROTECTED LABELS: [{}]", labels.join(", ")),
        }
    }
}

/// Outcome of evaluating one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Whether the collection should be deleted.
    pub remove: bool,
    /// Rule that produced the verdict.
    pub reason: Reason,
}

/// Compiled deletion rules.
#[derive(Debug, Clone, Default)]
pub struct RetentionPolicy {
    /// Exact labels as configured.
    labels: Vec<String>,
    /// Lower-cased exact labels.
    folded_labels: Vec<String>,
    /// Patterns as configured.
    patterns: Vec<String>,
    /// Lower-cased, compiled patterns.
    compiled: Vec<Pattern>,
}

impl RetentionPolicy {
    /// Build a policy from exact delete labels and wildcard patterns.
    ///
    /// # Errors
    ///
    /// Returns [`PlexCleanError::InvalidPattern`] if a pattern does not compile
    /// after normalization.
    pub fn new(labels: Vec<String>, patterns: Vec<String>) -> Result<Self> {
        let folded_labels = labels.iter().map(|l| l.to_lowercase()).collect();
        let compiled = patterns
            .iter()
            .map(|p| {
                Pattern::new(&normalize_pattern(&p.to_lowercase())).map_err(|source| {
                    PlexCleanError::InvalidPattern {
                        pattern: p.clone(),
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            labels,
            folded_labels,
            patterns,
            compiled,
        })
    }

    /// Exact delete labels as configured.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Delete patterns as configured.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// True when only the no-labels rule is active.
    pub fn has_no_label_rules(&self) -> bool {
        self.labels.is_empty() && self.patterns.is_empty()
    }

    /// Whether `label` equals any delete label, ignoring case.
    pub fn matches_label(&self, label: &str) -> bool {
        let folded = label.to_lowercase();
        self.folded_labels.iter().any(|l| *l == folded)
    }

    /// Whether `label` matches any delete pattern, ignoring case.
    pub fn matches_pattern(&self, label: &str) -> bool {
        let folded = label.to_lowercase();
        self.compiled
            .iter()
            .any(|p| p.matches_with(&folded, MATCH_OPTIONS))
    }

    /// Decide whether a collection with the given labels should be removed.
    ///
    /// The no-labels rule is checked first, then exact labels across all
    /// collection labels, then patterns.
    pub fn decide<S: AsRef<str>>(&self, collection_labels: &[S]) -> Decision {
        if collection_labels.is_empty() {
            return Decision {
                remove: true,
                reason: Reason::NoLabels,
            };
        }

        if let Some(label) = collection_labels
            .iter()
            .map(AsRef::as_ref)
            .find(|l| self.matches_label(l))
        {
            return Decision {
                remove: true,
                reason: Reason::ExactMatch(label.to_string()),
            };
        }

        if let Some(label) = collection_labels
            .iter()
            .map(AsRef::as_ref)
            .find(|l| self.matches_pattern(l))
        {
            return Decision {
                remove: true,
                reason: Reason::PatternMatch(label.to_string()),
            };
        }

        Decision {
            remove: false,
            reason: Reason::Protected(
                collection_labels
                    .iter()
                    .map(|l| l.as_ref().to_string())
                    .collect(),
            ),
        }
    }
}

/// Rewrite a shell pattern into one `glob` accepts with the same meaning.
///
/// `glob` reserves `**` for whole path components and rejects an unclosed
/// `[`. Runs of `*` are collapsed and an unclosed `[` becomes `[[]`.
fn normalize_pattern(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                out.push('*');
                while chars.get(i + 1) == Some(&'*') {
                    i += 1;
                }
            }
            '[' => match closing_bracket(&chars, i) {
                Some(end) => {
                    out.extend(&chars[i..=end]);
                    i = end;
                }
                None => out.push_str("[[]"),
            },
            c => out.push(c),
        }
        i += 1;
    }

    out
}

/// Index of the `]` closing the class opened at `start`.
///
/// A leading `!` negates, and a `]` right after the opener (or after `!`)
/// is a member rather than the terminator.
fn closing_bracket(chars: &[char], start: usize) -> Option<usize> {
    let mut first = start + 1;
    if chars.get(first) == Some(&'!') {
        first += 1;
    }
    if chars.get(first) == Some(&']') {
        first += 1;
    }
    chars
        .get(first..)?
        .iter()
        .position(|&c| c == ']')
        .map(|offset| first + offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn policy(labels: &[&str], patterns: &[&str]) -> RetentionPolicy {
        RetentionPolicy::new(
            labels.iter().map(ToString::to_string).collect(),
            patterns.iter().map(ToString::to_string).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_no_labels_always_removed() {
        let p = policy(&["kids"], &["season-*"]);
        let d = p.decide::<&str>(&[]);
        assert!(d.remove);
        assert_eq!(d.reason, Reason::NoLabels);

        let empty = RetentionPolicy::default();
        assert!(empty.decide::<String>(&[]).remove);
    }

    #[test]
    fn test_exact_label_is_case_insensitive() {
        let p = policy(&["Kids"], &[]);
        let d = p.decide(&["favorites", "KIDS"]);
        assert!(d.remove);
        assert_eq!(d.reason, Reason::ExactMatch("KIDS".into()));
    }

    #[test]
    fn test_exact_match_wins_over_pattern() {
        let p = policy(&["kids"], &["fav*"]);
        let d = p.decide(&["favorites", "kids"]);
        assert_eq!(d.reason, Reason::ExactMatch("kids".into()));
    }

    #[test]
    fn test_pattern_match() {
        let p = policy(&[], &["season-*"]);
        assert_eq!(
            p.decide(&["Season-2024"]).reason,
            Reason::PatternMatch("Season-2024".into())
        );
        assert!(!p.decide(&["Season"]).remove);
    }

    #[test]
    fn test_question_mark_matches_single_char() {
        let p = policy(&[], &["tmp-?"]);
        assert!(p.decide(&["TMP-1"]).remove);
        assert!(!p.decide(&["tmp-12"]).remove);
    }

    #[test]
    fn test_star_crosses_slashes() {
        let p = policy(&[], &["a*b"]);
        assert!(p.decide(&["a/x/b"]).remove);
    }

    #[test]
    fn test_protected_lists_all_labels() {
        let p = policy(&["kids"], &["season-*"]);
        let d = p.decide(&["favorites", "Classics"]);
        assert!(!d.remove);
        assert_eq!(
            d.reason,
            Reason::Protected(vec!["favorites".into(), "Classics".into()])
        );
        assert_eq!(
            d.reason.to_string(),
            "HAS PROTECTED LABELS: [favorites, Classics]"
        );
    }

    #[test]
    fn test_double_star_acts_as_single_star() {
        let p = policy(&[], &["season-**"]);
        assert_eq!(
            p.decide(&["Season-2024"]).reason,
            Reason::PatternMatch("Season-2024".into())
        );
        assert!(!p.decide(&["Season"]).remove);

        assert!(policy(&[], &["**kids"]).decide(&["MyKids"]).remove);
        assert!(policy(&[], &["a**b"]).decide(&["a-to-b"]).remove);
        assert!(policy(&[], &["x***"]).decide(&["xyz"]).remove);
    }

    #[test]
    fn test_unclosed_bracket_is_literal() {
        let p = policy(&[], &["[oops"]);
        assert_eq!(
            p.decide(&["[OOPS"]).reason,
            Reason::PatternMatch("[OOPS".into())
        );
        assert!(!p.decide(&["oops"]).remove);
    }

    #[test]
    fn test_bracket_class_still_works() {
        let p = policy(&[], &["season-[0-9]*"]);
        assert!(p.decide(&["Season-2"]).remove);
        assert!(!p.decide(&["Season-x"]).remove);

        let negated = policy(&[], &["tmp-[!a]"]);
        assert!(negated.decide(&["tmp-b"]).remove);
        assert!(!negated.decide(&["tmp-a"]).remove);
    }

    #[test]
    fn test_normalize_pattern() {
        assert_eq!(normalize_pattern("season-**"), "season-*");
        assert_eq!(normalize_pattern("[oops"), "[[]oops");
        assert_eq!(normalize_pattern("[]]x"), "[]]x");
        assert_eq!(normalize_pattern("[!]"), "[[]!]");
        assert_eq!(normalize_pattern("a[bc]**"), "a[bc]*");
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(Reason::NoLabels.to_string(), "NO LABELS");
        assert_eq!(
            Reason::ExactMatch("kids".into()).to_string(),
            "MATCHES DELETE LABEL: kids"
        );
        assert_eq!(
            Reason::PatternMatch("Season-1".into()).to_string(),
            "MATCHES DELETE PATTERN: Season-1"
        );
    }

    proptest! {
        #[test]
        fn prop_empty_labels_removed(
            labels in proptest::collection::vec("[a-z]{1,8}", 0..4),
            patterns in proptest::collection::vec("[a-z]{1,4}\\*", 0..4),
        ) {
            let p = RetentionPolicy::new(labels, patterns).unwrap();
            let d = p.decide::<String>(&[]);
            prop_assert!(d.remove);
            prop_assert_eq!(d.reason, Reason::NoLabels);
        }

        #[test]
        fn prop_exact_match_any_case_removes(
            target in "[a-z]{1,10}",
            others in proptest::collection::vec("[0-9]{1,5}", 0..4),
            patterns in proptest::collection::vec("[0-9]{1,3}\\*", 0..3),
        ) {
            let p = RetentionPolicy::new(vec![target.clone()], patterns).unwrap();
            let mut labels = others;
            labels.push(target.to_uppercase());
            let d = p.decide(&labels);
            prop_assert!(d.remove);
        }

        #[test]
        fn prop_pattern_match_removes(
            prefix in "[a-z]{1,6}",
            suffix in "[A-Za-z0-9]{0,6}",
        ) {
            let p = RetentionPolicy::new(vec![], vec![format!("{prefix}*")]).unwrap();
            let label = format!("{}{suffix}", prefix.to_uppercase());
            let d = p.decide(&[label]);
            prop_assert!(d.remove);
            prop_assert!(matches!(d.reason, Reason::PatternMatch(_)));
        }

        #[test]
        fn prop_any_shell_pattern_compiles(pattern in "[a-c*?!\\[\\]-]{0,12}") {
            prop_assert!(RetentionPolicy::new(vec![], vec![pattern]).is_ok());
        }

        #[test]
        fn prop_unmatched_labels_kept(
            labels in proptest::collection::vec("[a-m]{1,8}", 1..5),
            rules in proptest::collection::vec("[n-z]{1,8}", 0..4),
        ) {
            let patterns = rules.iter().map(|r| format!("{r}*")).collect();
            let p = RetentionPolicy::new(rules, patterns).unwrap();
            let d = p.decide(&labels);
            prop_assert!(!d.remove);
        }
    }
}
