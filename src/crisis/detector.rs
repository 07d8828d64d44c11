// Crisis detector
//
// Evaluation order: exception rules, then direct crisis rules, then ambiguous
// keywords gated by secondary context rules.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

use super::patterns::{CrisisRule, PatternLibrary};
use super::types::{Classification, CrisisLevel, MatchStage};

/// How far an exception match reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionScope {
    /// An exception only cancels crisis matches overlapping its own text
    #[default]
    Overlap,
    /// Any exception match makes the whole message non-crisis
    Message,
}

#[derive(Clone)]
pub struct CrisisDetector {
    library: Arc<PatternLibrary>,
    scope: ExceptionScope,
}

impl CrisisDetector {
    pub fn new(library: PatternLibrary, scope: ExceptionScope) -> Self {
        Self {
            library: Arc::new(library),
            scope,
        }
    }

    /// Detector over the built-in rule table with overlap-scoped exceptions
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(PatternLibrary::builtin()?, ExceptionScope::default()))
    }

    /// Load crisis patterns from a JSON file
    pub fn load_from_file(path: &Path, scope: ExceptionScope) -> Result<Self> {
        Ok(Self::new(PatternLibrary::load_from_file(path)?, scope))
    }

    pub fn scope(&self) -> ExceptionScope {
        self.scope
    }

    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }

    /// Lower-case, fold typographic apostrophes, collapse whitespace
    pub fn normalize(text: &str) -> String {
        let folded: String = text
            .to_lowercase()
            .chars()
            .map(|c| match c {
                '\u{2018}' | '\u{2019}' | '\u{02bc}' | '`' => '\'',
                other => other,
            })
            .collect();

        folded.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Classify a message. Total over any input and free of side effects
    /// beyond logging.
    pub fn classify(&self, text: &str) -> Classification {
        let normalized = Self::normalize(text);

        let mut exception_spans: Vec<Range<usize>> = Vec::new();
        let mut exceptions = Vec::new();
        for rule in self.library.exceptions() {
            let before = exception_spans.len();
            exception_spans.extend(rule.regex.find_iter(&normalized).map(|m| m.range()));
            if exception_spans.len() > before {
                exceptions.push(rule.id.clone());
            }
        }

        if self.scope == ExceptionScope::Message && !exceptions.is_empty() {
            tracing::debug!(exceptions = ?exceptions, "Exception rule matched, message treated as safe");
            return Classification::safe(exceptions);
        }

        let suppressed = |range: &Range<usize>| {
            exception_spans
                .iter()
                .any(|span| span.start < range.end && range.start < span.end)
        };

        // Most severe unsuppressed direct match; earlier rules win ties
        let mut best: Option<(&CrisisRule, Range<usize>)> = None;
        for rule in self.library.crisis_rules() {
            let hit = rule
                .regex
                .find_iter(&normalized)
                .map(|m| m.range())
                .find(|range| !suppressed(range));

            if let Some(range) = hit {
                let better = best.as_ref().map_or(true, |(b, _)| rule.level > b.level);
                if better {
                    best = Some((rule, range));
                }
            }
        }

        if let Some((rule, range)) = best {
            let level = self.apply_urgency(&normalized, rule.level, &range);
            tracing::warn!(
                rule = %rule.id,
                category = %rule.category,
                level = %level,
                "Crisis detected: direct pattern"
            );
            return Classification::crisis(rule.category, level, &rule.id, MatchStage::Direct, exceptions);
        }

        let keyword_present = self.library.ambiguous_keywords().map_or(false, |keywords| {
            keywords
                .find_iter(&normalized)
                .any(|m| !suppressed(&m.range()))
        });

        if keyword_present {
            for rule in self.library.context_rules() {
                let hit = rule
                    .regex
                    .find_iter(&normalized)
                    .map(|m| m.range())
                    .find(|range| !suppressed(range));

                if let Some(range) = hit {
                    let level = self.apply_urgency(&normalized, rule.level, &range);
                    tracing::warn!(
                        rule = %rule.id,
                        category = %rule.category,
                        level = %level,
                        "Crisis detected: ambiguous keyword in concerning context"
                    );
                    return Classification::crisis(
                        rule.category,
                        level,
                        &rule.id,
                        MatchStage::Contextual,
                        exceptions,
                    );
                }
            }
        }

        Classification::safe(exceptions)
    }

    /// Returns true if the message indicates a crisis
    pub fn detect_crisis(&self, text: &str) -> bool {
        self.classify(text).is_crisis
    }

    /// Raise the level one step when an urgency cue appears outside the
    /// matched phrase itself
    fn apply_urgency(&self, normalized: &str, level: CrisisLevel, matched: &Range<usize>) -> CrisisLevel {
        let Some(cues) = self.library.urgency_cues() else {
            return level;
        };

        let urgent = cues
            .find_iter(normalized)
            .any(|m| m.end() <= matched.start || m.start() >= matched.end);

        if urgent {
            level.escalated()
        } else {
            level
        }
    }
}
