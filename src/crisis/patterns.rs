// Crisis pattern library
//
// Rules are plain data (id, regex, category, level) so the same schema serves
// the built-in table and JSON pattern files. Everything is compiled once into
// an immutable `PatternLibrary` that the detector borrows.

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::types::{CrisisCategory, CrisisLevel};

/// Uncompiled exception rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExceptionSpec {
    pub id: String,
    pub pattern: String,
}

/// Uncompiled crisis or context rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSpec {
    pub id: String,
    pub pattern: String,
    pub category: CrisisCategory,
    pub level: CrisisLevel,
}

/// Serializable form of a whole pattern library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternDefinitions {
    pub exceptions: Vec<ExceptionSpec>,
    pub crisis: Vec<RuleSpec>,
    pub ambiguous_keywords: Vec<String>,
    pub context: Vec<RuleSpec>,
    #[serde(default = "default_urgency_cues")]
    pub urgency_cues: Vec<String>,
}

fn default_urgency_cues() -> Vec<String> {
    URGENCY_CUES.iter().map(|s| s.to_string()).collect()
}

/// Compiled exception rule
#[derive(Debug, Clone)]
pub struct ExceptionRule {
    pub id: String,
    pub regex: Regex,
}

/// Compiled crisis or context rule
#[derive(Debug, Clone)]
pub struct CrisisRule {
    pub id: String,
    pub regex: Regex,
    pub category: CrisisCategory,
    pub level: CrisisLevel,
}

/// Immutable, compiled set of classification rules
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    exceptions: Vec<ExceptionRule>,
    crisis: Vec<CrisisRule>,
    ambiguous: Option<Regex>,
    context: Vec<CrisisRule>,
    urgency: Option<Regex>,
}

impl PatternLibrary {
    /// Compile the built-in rule table
    pub fn builtin() -> Result<Self> {
        Self::compile(PatternDefinitions::builtin())
    }

    /// Load and compile a JSON pattern file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read crisis pattern file: {}", path.display()))?;

        let definitions: PatternDefinitions = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse crisis pattern file: {}", path.display()))?;

        Self::compile(definitions)
    }

    /// Compile definitions, failing on the first invalid regex
    pub fn compile(definitions: PatternDefinitions) -> Result<Self> {
        if definitions.crisis.is_empty() {
            bail!("Crisis pattern library has no crisis rules");
        }

        let exceptions = definitions
            .exceptions
            .into_iter()
            .map(|spec| {
                let regex = Regex::new(&spec.pattern)
                    .with_context(|| format!("Invalid exception pattern '{}'", spec.id))?;
                Ok(ExceptionRule { id: spec.id, regex })
            })
            .collect::<Result<Vec<_>>>()?;

        let crisis = compile_rules(definitions.crisis, "crisis")?;
        let context = compile_rules(definitions.context, "context")?;
        let ambiguous = word_alternation(&definitions.ambiguous_keywords)
            .context("Invalid ambiguous keyword list")?;
        let urgency =
            word_alternation(&definitions.urgency_cues).context("Invalid urgency cue list")?;

        Ok(Self {
            exceptions,
            crisis,
            ambiguous,
            context,
            urgency,
        })
    }

    pub fn exceptions(&self) -> &[ExceptionRule] {
        &self.exceptions
    }

    pub fn crisis_rules(&self) -> &[CrisisRule] {
        &self.crisis
    }

    pub fn context_rules(&self) -> &[CrisisRule] {
        &self.context
    }

    pub fn ambiguous_keywords(&self) -> Option<&Regex> {
        self.ambiguous.as_ref()
    }

    pub fn urgency_cues(&self) -> Option<&Regex> {
        self.urgency.as_ref()
    }

    /// Total number of compiled rules (for startup logging)
    pub fn rule_count(&self) -> usize {
        self.exceptions.len() + self.crisis.len() + self.context.len()
    }
}

fn compile_rules(specs: Vec<RuleSpec>, kind: &str) -> Result<Vec<CrisisRule>> {
    specs
        .into_iter()
        .map(|spec| {
            let regex = Regex::new(&spec.pattern)
                .with_context(|| format!("Invalid {} pattern '{}'", kind, spec.id))?;
            Ok(CrisisRule {
                id: spec.id,
                regex,
                category: spec.category,
                level: spec.level,
            })
        })
        .collect()
}

/// Build `\b(?:a|b|c)\b` from literal words, or None for an empty list
fn word_alternation(words: &[String]) -> Result<Option<Regex>> {
    let escaped: Vec<String> = words
        .iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .map(|w| regex::escape(&w))
        .collect();

    if escaped.is_empty() {
        return Ok(None);
    }

    let regex = Regex::new(&format!(r"\b(?:{})\b", escaped.join("|")))?;
    Ok(Some(regex))
}

// Built-in tables. Input is already lower-cased with apostrophes folded.

const EXCEPTIONS: &[(&str, &str)] = &[
    ("died_laughing", r"\bdied (?:laughing|of laughter|when|from)\b"),
    ("dying_laughing", r"\bdying (?:laughing|of laughter|from|when)\b"),
    ("killed_me_idiom", r"\bkilled (?:me|us|it)\b"),
    ("killing_me_idiom", r"\bkilling (?:me|us|it)\b"),
    (
        "died_of_hyperbole",
        r"\b(?:died|dying|die) (?:of|from) (?:boredom|embarrassment|shame|excitement|laughter|cuteness)\b",
    ),
    (
        "gaming",
        r"\b(?:died|killed) (?:in|at|during) (?:the |a |that |this )?(?:game|level|battle|fight|match|round)\b",
    ),
    (
        "workout",
        r"\bdied (?:during|in|at) (?:the |my |a )?(?:workout|exercise|running|gym|class)\b",
    ),
    ("killing_it_at", r"\bkilling (?:it|them) (?:at|in|during)\b"),
    (
        "success",
        r"\bkilled (?:it|them|that|the (?:exam|test|interview|presentation)|my (?:budget|workout))\b",
    ),
    (
        "food_craving",
        r"\b(?:died|dying) (?:for|over) (?:some )?(?:food|pizza|chocolate|coffee|tacos)\b",
    ),
    (
        "social_media",
        r"\b(?:died|dying) (?:on|at|from) (?:social media|the internet|internet|tiktok)\b",
    ),
    ("almost_died", r"\b(?:almost|nearly) (?:died|killed)\b"),
    ("thought_i_would_die", r"\bthought i was going to die\b"),
    ("felt_like_dying", r"\bfelt like i was dying\b"),
    ("past_died", r"\bi died (?:when|after|because)\b"),
    (
        "device_died",
        r"\b(?:my|the) (?:phone|battery|car|wifi|laptop|computer|plant|plants) died\b",
    ),
    (
        "date_qualified",
        r"\b(?:died|killed) (?:yesterday|today|last week|last night|this morning)\b",
    ),
];

use super::types::CrisisCategory as C;
use super::types::CrisisLevel as L;

const CRISIS: &[(&str, &str, CrisisCategory, CrisisLevel)] = &[
    // Suicidal ideation
    (
        "suicide_plan",
        r"\bi (?:have a |made a )?plan to (?:kill myself|end my life|end it all|take my (?:own )?life)\b",
        C::SuicidalIdeation,
        L::Critical,
    ),
    (
        "suicide_means",
        r"\bi have (?:the means|a way) to (?:kill myself|end my life|do it)\b",
        C::SuicidalIdeation,
        L::Critical,
    ),
    (
        "want_to_die",
        r"\bi (?:really |just |so |very much |extremely )?(?:want|wish|need) to die\b",
        C::SuicidalIdeation,
        L::High,
    ),
    (
        "want_to_end_life",
        r"\bi (?:really |just )?(?:want|wish|need|desire) to (?:kill myself|end my life|end it all|take my (?:own )?life|commit suicide|stop existing|end my suffering)\b",
        C::SuicidalIdeation,
        L::High,
    ),
    (
        "going_to_kill_myself",
        r"\bi(?:'m| am) going to (?:kill myself|end my life|end it all|take my (?:own )?life)\b",
        C::SuicidalIdeation,
        L::High,
    ),
    ("feel_suicidal", r"\bi(?:'m| am| feel) suicidal\b", C::SuicidalIdeation, L::High),
    (
        "know_how",
        r"\bi know how i (?:would|will|could) do it\b",
        C::SuicidalIdeation,
        L::High,
    ),
    (
        "better_off_dead",
        r"\bi(?:'m| am|'d be| would be) better off dead\b",
        C::SuicidalIdeation,
        L::High,
    ),
    (
        "better_off_without_me",
        r"\b(?:everyone|everybody) would be better off without me\b",
        C::SuicidalIdeation,
        L::High,
    ),
    (
        "no_one_would_miss_me",
        r"\bno ?one would (?:miss|care about) me\b",
        C::SuicidalIdeation,
        L::High,
    ),
    ("no_reason_to_live", r"\bi have no reason to live\b", C::SuicidalIdeation, L::High),
    (
        "wish_i_was_dead",
        r"\bi wish i (?:was|were) dead\b",
        C::SuicidalIdeation,
        L::Moderate,
    ),
    (
        "thinking_about_suicide",
        r"\bi(?:'m| am|'ve been| have been| keep) thinking (?:about|of) (?:suicide|killing myself|ending my life|ending it all)\b",
        C::SuicidalIdeation,
        L::Moderate,
    ),
    ("want_to_disappear", r"\bi want to disappear\b", C::SuicidalIdeation, L::Moderate),
    (
        "life_pointless",
        r"\blife is (?:pointless|meaningless|not worth living)\b",
        C::SuicidalIdeation,
        L::Moderate,
    ),
    (
        "give_up_on_life",
        r"\bi(?:'m| am)? (?:give|giving) up on (?:life|everything|myself)\b",
        C::SuicidalIdeation,
        L::Moderate,
    ),
    // Self-harm
    (
        "self_harm_plan",
        r"\bi (?:have a )?plan to (?:hurt|cut|harm|burn) myself\b",
        C::SelfHarm,
        L::Critical,
    ),
    (
        "want_to_self_harm",
        r"\bi (?:want|need) to (?:hurt|cut|harm|punish|burn) (?:myself|my body)\b",
        C::SelfHarm,
        L::High,
    ),
    (
        "going_to_self_harm",
        r"\bi(?:'m| am) going to (?:hurt|cut|harm|burn) myself\b",
        C::SelfHarm,
        L::High,
    ),
    (
        "ongoing_self_harm",
        r"\bi(?:'ve| have) been (?:cutting|hurting|harming|burning) myself\b",
        C::SelfHarm,
        L::High,
    ),
    // Homicidal ideation
    (
        "harm_others_plan",
        r"\bi plan to (?:kill|hurt|harm|attack) (?:someone|somebody|people)\b",
        C::HomicidalIdeation,
        L::Critical,
    ),
    (
        "want_to_harm_others",
        r"\bi (?:want|need) to (?:kill|hurt|harm|attack) (?:someone|somebody|people|my (?:boss|partner|husband|wife|boyfriend|girlfriend|father|mother|dad|mom|brother|sister|roommate|teacher|neighbou?r))\b",
        C::HomicidalIdeation,
        L::High,
    ),
    (
        "going_to_harm_others",
        r"\bi(?:'m| am) going to (?:kill|hurt|harm|attack) (?:someone|somebody|people)\b",
        C::HomicidalIdeation,
        L::High,
    ),
    // Domestic violence
    (
        "partner_violence",
        r"\bmy (?:partner|boyfriend|girlfriend|husband|wife|spouse|significant other|ex) (?:hits|hurts|beats|chokes|threatens|controls|isolates|stalks|rapes|sexually assaults|abuses) me\b",
        C::DomesticViolence,
        L::High,
    ),
    (
        "being_abused",
        r"\bi(?:'m| am) (?:being abused|afraid to go home)\b",
        C::DomesticViolence,
        L::High,
    ),
    // Substance abuse
    ("overdosing", r"\bi(?:'m| am) overdosing\b", C::SubstanceAbuse, L::Critical),
    ("overdose_plan", r"\bi plan to overdose\b", C::SubstanceAbuse, L::Critical),
    (
        "going_to_overdose",
        r"\bi(?:'m| am) going to overdose\b",
        C::SubstanceAbuse,
        L::High,
    ),
    (
        "cant_stop_using",
        r"\bi can(?:'t|not) (?:stop|quit) (?:drinking|using(?: drugs)?|drugs|alcohol)\b",
        C::SubstanceAbuse,
        L::Moderate,
    ),
    (
        "need_help_substance",
        r"\bi need help with (?:drugs|alcohol|my drinking)\b",
        C::SubstanceAbuse,
        L::Moderate,
    ),
    (
        "addicted",
        r"\bi(?:'m| am) addicted to (?:drugs|alcohol|pills|opioids|heroin|meth)\b",
        C::SubstanceAbuse,
        L::Moderate,
    ),
    // Acute psychiatric symptoms
    (
        "psychiatric_symptoms",
        r"\bi(?:'m| am) (?:hearing voices|seeing things|paranoid|delusional|having a manic episode|severely depressed|catatonic|dissociating|having a psychotic episode|psychotic|having a borderline episode)\b",
        C::AcutePsychiatric,
        L::Moderate,
    ),
    (
        "split_personality",
        r"\bi have (?:multiple|split) personalit(?:y|ies)\b",
        C::AcutePsychiatric,
        L::Moderate,
    ),
    // Panic and anxiety
    (
        "panic_attack",
        r"\bi(?:'m| am) having (?:a panic attack|an anxiety attack)\b",
        C::PanicAnxiety,
        L::Moderate,
    ),
    (
        "cant_breathe",
        r"\bi can(?:'t|not) (?:breathe|calm down)\b",
        C::PanicAnxiety,
        L::Moderate,
    ),
    (
        "feel_like_dying",
        r"\bi feel like i(?:'m| am) (?:having a heart attack|dying)\b",
        C::PanicAnxiety,
        L::Moderate,
    ),
    (
        "losing_control",
        r"\bi(?:'m| am) (?:hyperventilating|going crazy|losing control)\b",
        C::PanicAnxiety,
        L::Moderate,
    ),
    // Eating disorders
    (
        "not_eating",
        r"\bi (?:haven't|have not) eaten in days\b",
        C::EatingDisorder,
        L::Moderate,
    ),
    (
        "purging",
        r"\bi (?:make|made) myself (?:throw up|vomit|sick)\b",
        C::EatingDisorder,
        L::Moderate,
    ),
    (
        "eating_disorder_disclosure",
        r"\bi(?:'m| am) (?:anorexic|bulimic|binge eating|purging|restricting food|obsessed with my weight)\b",
        C::EatingDisorder,
        L::Moderate,
    ),
    ("cant_stop_eating", r"\bi can(?:'t|not) stop eating\b", C::EatingDisorder, L::Moderate),
    ("hate_my_body", r"\bi hate my body\b", C::EatingDisorder, L::Moderate),
    // Trauma
    (
        "sexual_assault",
        r"\bi was (?:raped|sexually assaulted|molested)\b",
        C::Trauma,
        L::High,
    ),
    ("assaulted", r"\bi was (?:assaulted|abused)\b", C::Trauma, L::Moderate),
    (
        "traumatic_event",
        r"\bi was in (?:an accident|combat|a disaster)\b",
        C::Trauma,
        L::Moderate,
    ),
    (
        "trauma_symptoms",
        r"\bi(?:'m| am) having (?:flashbacks|nightmares)\b",
        C::Trauma,
        L::Moderate,
    ),
    (
        "ptsd",
        r"\bi have (?:ptsd|post traumatic stress|post-traumatic stress)\b",
        C::Trauma,
        L::Moderate,
    ),
    // Generic crisis and emergency
    (
        "need_immediate_help",
        r"\bi need (?:immediate|urgent) help\b",
        C::Emergency,
        L::High,
    ),
    ("need_help_now", r"\bi need help (?:right )?now\b", C::Emergency, L::High),
    ("in_crisis", r"\bi(?:'m| am) in (?:a )?crisis\b", C::Emergency, L::Elevated),
    (
        "having_emergency",
        r"\bi(?:'m| am) having an emergency\b",
        C::Emergency,
        L::Elevated,
    ),
    (
        "cant_cope",
        r"\bi can(?:'t|not) (?:cope|handle (?:this|it)|take (?:it|this)) ?any ?more\b",
        C::Emergency,
        L::Elevated,
    ),
    ("at_rock_bottom", r"\bi(?:'m| am) at rock bottom\b", C::Emergency, L::Elevated),
    (
        "hopeless",
        r"\bi(?:'m| am| feel| feel so) (?:helpless|hopeless|worthless)\b",
        C::Emergency,
        L::Elevated,
    ),
    ("depressed_to_death", r"\bi(?:'m| am) depressed to death\b", C::Emergency, L::Elevated),
];

const AMBIGUOUS_KEYWORDS: &[&str] = &[
    "die", "died", "dying", "kill", "killed", "killing", "suicide", "overdose",
];

const CONTEXT: &[(&str, &str, CrisisCategory, CrisisLevel)] = &[
    (
        "ctx_intent_to_die",
        r"\b(?:want|wish|plan|going|need) to (?:die|kill (?:myself|me))\b",
        C::SuicidalIdeation,
        L::High,
    ),
    (
        "ctx_reflexive",
        r"\b(?:die|kill|killing) (?:myself|my life)\b",
        C::SuicidalIdeation,
        L::High,
    ),
    (
        "ctx_commit_suicide",
        r"\b(?:commit|committing|attempted|attempting) suicide\b",
        C::SuicidalIdeation,
        L::High,
    ),
    (
        "ctx_suicide_noun",
        r"\b(?:suicide (?:attempt|plan|thoughts?|note)|(?:attempt|plan|thoughts?) of suicide|thinking about suicide)\b",
        C::SuicidalIdeation,
        L::High,
    ),
    (
        "ctx_overdose",
        r"\b(?:overdose (?:attempt|plan|thoughts?)|(?:attempt|plan|thoughts?) (?:of|to) overdose|thinking about overdosing)\b",
        C::SubstanceAbuse,
        L::High,
    ),
];

const URGENCY_CUES: &[&str] = &["right now", "tonight", "now", "today", "immediately"];

impl PatternDefinitions {
    /// The built-in rule table
    pub fn builtin() -> Self {
        let rules = |table: &[(&str, &str, CrisisCategory, CrisisLevel)]| {
            table
                .iter()
                .map(|(id, pattern, category, level)| RuleSpec {
                    id: id.to_string(),
                    pattern: pattern.to_string(),
                    category: *category,
                    level: *level,
                })
                .collect::<Vec<_>>()
        };

        Self {
            exceptions: EXCEPTIONS
                .iter()
                .map(|(id, pattern)| ExceptionSpec {
                    id: id.to_string(),
                    pattern: pattern.to_string(),
                })
                .collect(),
            crisis: rules(CRISIS),
            ambiguous_keywords: AMBIGUOUS_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            context: rules(CONTEXT),
            urgency_cues: default_urgency_cues(),
        }
    }
}
