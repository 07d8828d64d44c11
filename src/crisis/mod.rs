// Crisis detection: pattern library, classifier, result types

mod detector;
mod patterns;
mod types;

pub use detector::{CrisisDetector, ExceptionScope};
pub use patterns::{
    CrisisRule, ExceptionRule, ExceptionSpec, PatternDefinitions, PatternLibrary, RuleSpec,
};
pub use types::{Classification, CrisisCategory, CrisisLevel, MatchStage};
