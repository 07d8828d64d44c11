// Classification result types

use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of crisis a rule indicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrisisCategory {
    SuicidalIdeation,
    SelfHarm,
    HomicidalIdeation,
    DomesticViolence,
    SubstanceAbuse,
    AcutePsychiatric,
    PanicAnxiety,
    EatingDisorder,
    Trauma,
    Emergency,
}

impl CrisisCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrisisCategory::SuicidalIdeation => "suicidal_ideation",
            CrisisCategory::SelfHarm => "self_harm",
            CrisisCategory::HomicidalIdeation => "homicidal_ideation",
            CrisisCategory::DomesticViolence => "domestic_violence",
            CrisisCategory::SubstanceAbuse => "substance_abuse",
            CrisisCategory::AcutePsychiatric => "acute_psychiatric",
            CrisisCategory::PanicAnxiety => "panic_anxiety",
            CrisisCategory::EatingDisorder => "eating_disorder",
            CrisisCategory::Trauma => "trauma",
            CrisisCategory::Emergency => "emergency",
        }
    }

    /// Human-readable label for notification emails
    pub fn label(&self) -> &'static str {
        match self {
            CrisisCategory::SuicidalIdeation => "Suicidal ideation",
            CrisisCategory::SelfHarm => "Self-harm",
            CrisisCategory::HomicidalIdeation => "Homicidal ideation",
            CrisisCategory::DomesticViolence => "Domestic violence",
            CrisisCategory::SubstanceAbuse => "Substance abuse",
            CrisisCategory::AcutePsychiatric => "Acute psychiatric symptoms",
            CrisisCategory::PanicAnxiety => "Panic or anxiety crisis",
            CrisisCategory::EatingDisorder => "Eating disorder",
            CrisisCategory::Trauma => "Trauma disclosure",
            CrisisCategory::Emergency => "Crisis or emergency",
        }
    }
}

impl fmt::Display for CrisisCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Graded severity of a positive classification.
///
/// Levels are numbered 2 to 5 on the wire because clients compare them
/// numerically (`crisisLevel >= 5` means critical). `Elevated` covers
/// generic distress declarations with no stated intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrisisLevel {
    Elevated,
    Moderate,
    High,
    Critical,
}

impl CrisisLevel {
    pub fn as_number(&self) -> u8 {
        match self {
            CrisisLevel::Elevated => 2,
            CrisisLevel::Moderate => 3,
            CrisisLevel::High => 4,
            CrisisLevel::Critical => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CrisisLevel::Elevated => "elevated",
            CrisisLevel::Moderate => "moderate",
            CrisisLevel::High => "high",
            CrisisLevel::Critical => "critical",
        }
    }

    /// One step more severe, saturating at `Critical`
    pub fn escalated(self) -> Self {
        match self {
            CrisisLevel::Elevated => CrisisLevel::Moderate,
            CrisisLevel::Moderate => CrisisLevel::High,
            CrisisLevel::High | CrisisLevel::Critical => CrisisLevel::Critical,
        }
    }

    /// How soon an auto-booked appointment should start
    pub fn urgency_minutes(&self) -> i64 {
        match self {
            CrisisLevel::Critical => 15,
            CrisisLevel::High => 30,
            CrisisLevel::Moderate => 45,
            CrisisLevel::Elevated => 60,
        }
    }
}

impl fmt::Display for CrisisLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which evaluation stage produced a crisis verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    /// A direct crisis rule matched
    Direct,
    /// An ambiguous keyword appeared in a concerning context
    Contextual,
}

/// Outcome of classifying one message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub is_crisis: bool,
    pub category: Option<CrisisCategory>,
    pub level: Option<CrisisLevel>,
    /// Id of the rule that produced the verdict
    pub rule_id: Option<String>,
    pub stage: Option<MatchStage>,
    /// Ids of exception rules that matched the message
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suppressed: Vec<String>,
}

impl Classification {
    pub fn safe(suppressed: Vec<String>) -> Self {
        Self {
            is_crisis: false,
            category: None,
            level: None,
            rule_id: None,
            stage: None,
            suppressed,
        }
    }

    pub fn crisis(
        category: CrisisCategory,
        level: CrisisLevel,
        rule_id: impl Into<String>,
        stage: MatchStage,
        suppressed: Vec<String>,
    ) -> Self {
        Self {
            is_crisis: true,
            category: Some(category),
            level: Some(level),
            rule_id: Some(rule_id.into()),
            stage: Some(stage),
            suppressed,
        }
    }
}
