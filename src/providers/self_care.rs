// Daily self-care content for the app's home screen
//
// The model is asked for a JSON object. Replies wrapped in prose or code
// fences are tolerated by parsing the outermost `{...}` span.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ChatProvider;

/// Seconds suggested when the model omits a focus duration
pub const DEFAULT_FOCUS_SECONDS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfCareContent {
    pub quote: String,
    pub focus: Focus,
    pub article: Article,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "FocusField")]
pub struct Focus {
    pub tip: String,
    /// Recommended time in seconds
    pub duration: u64,
}

/// Models sometimes return the focus as a bare string
#[derive(Deserialize)]
#[serde(untagged)]
enum FocusField {
    Tip(String),
    Detailed {
        tip: String,
        #[serde(default)]
        duration: Option<u64>,
    },
}

impl From<FocusField> for Focus {
    fn from(field: FocusField) -> Self {
        let (tip, duration) = match field {
            FocusField::Tip(tip) => (tip, None),
            FocusField::Detailed { tip, duration } => (tip, duration),
        };

        Focus {
            tip,
            duration: duration
                .filter(|d| *d > 0)
                .unwrap_or(DEFAULT_FOCUS_SECONDS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub links: Vec<ArticleLink>,
    #[serde(default)]
    pub related: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleLink {
    pub title: String,
    pub url: String,
}

pub fn self_care_prompt(date: NaiveDate) -> String {
    format!(
        "You are a wellness and self-care assistant for a mobile app. For {}, \
generate a JSON object with these fields:

- quote: a short, original, motivational quote for the day (at most 120 characters).
- focus: an object with
    - tip: one actionable self-care tip for today (1-2 sentences)
    - duration: recommended seconds to spend on it (e.g. 300 for 5 minutes)
- article: an object with
    - title: a positive article title (at most 10 words)
    - summary: a 1-2 sentence summary
    - icon: an Ionicons or MaterialCommunityIcons name (e.g. 'leaf-outline', 'meditation')
    - body: a 3-5 paragraph article with practical advice and encouragement
    - links: up to 3 reputable external links, each with title and url
    - related: up to 3 related article titles (strings)

Return ONLY the JSON object, no extra text.",
        date.format("%A, %B %-d, %Y")
    )
}

/// Parse a model reply into self-care content
pub fn parse_self_care(text: &str) -> Result<SelfCareContent> {
    if let Ok(content) = serde_json::from_str(text.trim()) {
        return Ok(content);
    }

    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        bail!("Model did not return a JSON object");
    };
    if end < start {
        bail!("Model did not return a JSON object");
    }

    serde_json::from_str(&text[start..=end]).context("Model returned malformed self-care JSON")
}

/// Ask the provider for today's self-care content
pub async fn generate_self_care(
    provider: &dyn ChatProvider,
    date: NaiveDate,
) -> Result<SelfCareContent> {
    let reply = provider.generate(&self_care_prompt(date)).await?;
    parse_self_care(&reply)
}
