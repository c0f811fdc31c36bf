//! Utterance classification
//!
//! Categorizes an incoming message before the engine decides on a state
//! transition. Classification is an ordered table of (predicate, category)
//! pairs evaluated in fixed priority order; which table applies depends on
//! whether the user currently has a pending proposal, and of which kind.

use crate::extract::has_schedule_token;

/// What kind of proposal, if any, is pending for the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
    None,
    Task,
    Plan,
}

/// Category assigned to one user utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utterance {
    /// Explicit consent to the pending proposal
    Confirmation,
    /// Explicit refusal of the pending proposal
    Rejection,
    /// Social opener; context must be preserved
    Greeting,
    /// "create a task" with no topic given
    BareCreate,
    /// Planning/learning/fitness request - routes to multi-task proposal
    PlanRequest,
    /// A topic with no recognizable schedule tokens
    TopicOnly,
    /// Date/time change aimed at the pending task proposal
    Adjustment,
    /// Needs the full pipeline (assist or deterministic fallback)
    Pipeline,
}

/// Normalized view of an utterance shared by all predicates
#[derive(Debug)]
pub struct Normalized {
    /// Original text, trimmed
    pub raw: String,
    /// Trimmed, lower-cased, whitespace-collapsed
    pub norm: String,
}

impl Normalized {
    pub fn new(text: &str) -> Self {
        let raw = text.trim().to_string();
        let norm = raw.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ");
        Self { raw, norm }
    }

    fn word_count(&self) -> usize {
        self.norm.split_whitespace().count()
    }

    fn has_word(&self, word: &str) -> bool {
        self.norm.split_whitespace().any(|w| w.trim_matches(PUNCTUATION) == word)
    }
}

const PUNCTUATION: &[char] = &['.', '!', '?', ',', ';'];

const CONFIRM_VOCAB: &[&str] = &[
    "yes",
    "y",
    "yep",
    "confirm",
    "ok",
    "okay",
    "looks good",
    "go ahead",
    "do it",
    "schedule it",
    "proceed",
];

const REJECT_VOCAB: &[&str] = &["no", "n", "nope", "cancel", "stop", "never mind", "not now", "reject"];

const GREETING_VOCAB: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "howdy",
    "greetings",
    "good morning",
    "good afternoon",
    "good evening",
];

const PLAN_VOCAB: &[&str] = &["plan", "routine", "program", "curriculum", "regimen", "syllabus", "weekly"];

type Predicate = fn(&Normalized) -> bool;

/// One classification rule: first predicate to match wins
struct Rule {
    kind: Utterance,
    applies: Predicate,
}

/// Priority order while a task proposal is pending
const PENDING_TASK_RULES: &[Rule] = &[
    Rule {
        kind: Utterance::Confirmation,
        applies: is_confirmation,
    },
    Rule {
        kind: Utterance::Rejection,
        applies: is_rejection,
    },
    Rule {
        kind: Utterance::Greeting,
        applies: is_greeting,
    },
    Rule {
        kind: Utterance::Adjustment,
        applies: is_adjustment,
    },
];

/// Priority order while a plan proposal is pending (no adjustment rule -
/// adjustments only apply to a single task window)
const PENDING_PLAN_RULES: &[Rule] = &[
    Rule {
        kind: Utterance::Confirmation,
        applies: is_confirmation,
    },
    Rule {
        kind: Utterance::Rejection,
        applies: is_rejection,
    },
    Rule {
        kind: Utterance::Greeting,
        applies: is_greeting,
    },
];

/// Priority order with nothing pending
const IDLE_RULES: &[Rule] = &[
    Rule {
        kind: Utterance::Greeting,
        applies: is_greeting,
    },
    Rule {
        kind: Utterance::BareCreate,
        applies: is_bare_create,
    },
    Rule {
        kind: Utterance::PlanRequest,
        applies: is_plan_request,
    },
    Rule {
        kind: Utterance::TopicOnly,
        applies: is_topic_only,
    },
];

/// Classify one utterance against the current proposal state
pub fn classify(text: &str, pending: PendingKind) -> Utterance {
    let normalized = Normalized::new(text);
    let rules = match pending {
        PendingKind::Task => PENDING_TASK_RULES,
        PendingKind::Plan => PENDING_PLAN_RULES,
        PendingKind::None => IDLE_RULES,
    };

    rules
        .iter()
        .find(|rule| (rule.applies)(&normalized))
        .map(|rule| rule.kind)
        .unwrap_or(Utterance::Pipeline)
}

/// Strip trailing punctuation and an optional trailing suffix word
fn strip_tail<'a>(norm: &'a str, suffix: &str) -> &'a str {
    let stripped = norm.trim_end_matches(PUNCTUATION).trim_end();
    stripped.strip_suffix(suffix).map(str::trim_end).unwrap_or(stripped)
}

pub fn is_confirmation(n: &Normalized) -> bool {
    if n.norm.is_empty() || n.norm.len() > 40 {
        return false;
    }
    let stripped = strip_tail(&n.norm, "please");
    CONFIRM_VOCAB.contains(&stripped)
}

pub fn is_rejection(n: &Normalized) -> bool {
    if n.norm.is_empty() || n.norm.len() > 60 {
        return false;
    }
    let stripped = strip_tail(&n.norm, "it");
    REJECT_VOCAB.contains(&stripped)
}

pub fn is_greeting(n: &Normalized) -> bool {
    GREETING_VOCAB.iter().any(|greeting| {
        n.norm == *greeting
            || n.norm
                .strip_prefix(greeting)
                .is_some_and(|rest| rest.starts_with([' ', '!', ',', '.', '?']))
    })
}

pub fn is_bare_create(n: &Normalized) -> bool {
    n.word_count() <= 4
        && (n.has_word("create") || n.has_word("add") || n.has_word("schedule"))
        && n.has_word("task")
}

pub fn is_plan_request(n: &Normalized) -> bool {
    PLAN_VOCAB.iter().any(|keyword| n.has_word(keyword))
}

pub fn is_topic_only(n: &Normalized) -> bool {
    n.norm.len() >= 6 && !has_schedule_token(&n.raw)
}

pub fn is_adjustment(n: &Normalized) -> bool {
    has_schedule_token(&n.raw)
}
