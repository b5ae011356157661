use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A question may declare that it is only asked when another question's
/// recorded answer equals a trigger value. Hidden questions are excluded
/// from required-answer validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDependency {
    /// Text of the question this one depends on.
    pub question: String,
    /// Answer value (case-insensitive) that makes this question visible.
    pub answer: String,
}

/// One assessment question, scope or follow-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    /// Offered choices; empty for free-text questions.
    #[serde(default)]
    pub options: Vec<String>,
    /// Multi-select questions collect a list of values.
    #[serde(default)]
    pub multi_select: bool,
    #[serde(default)]
    pub depends_on: Option<QuestionDependency>,
}

/// An answer recorded against a question index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Text(String),
    Multi(Vec<String>),
}

impl Answer {
    /// Empty means "not answered" for validation purposes: a blank string
    /// or an empty selection list.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::Multi(items) => items.iter().all(|s| s.trim().is_empty()),
        }
    }

    /// Lower-cased value as submitted to the scope endpoint. Multi-select
    /// answers are joined with ", ".
    pub fn normalized(&self) -> String {
        match self {
            Self::Text(s) => s.trim().to_lowercase(),
            Self::Multi(items) => items
                .iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Scope decision returned by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScopeStatus {
    #[serde(rename = "In Scope")]
    InScope,
    #[serde(rename = "Refer")]
    Refer,
}

impl ScopeStatus {
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "in scope" | "in-scope" | "inscope" => Some(Self::InScope),
            "refer" => Some(Self::Refer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InScope => "In Scope",
            Self::Refer => "Refer",
        }
    }
}

/// Completed scope stage: the typed output that the follow-up stage
/// takes as its input, so the second fetch cannot start without it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeOutcome {
    pub status: ScopeStatus,
    pub reason: String,
    /// Lower-cased answers grouped by question text.
    pub answers: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_answer_is_empty() {
        assert!(Answer::Text("   ".into()).is_empty());
        assert!(!Answer::Text("yes".into()).is_empty());
    }

    #[test]
    fn multi_answer_empty_when_all_blank() {
        assert!(Answer::Multi(vec![]).is_empty());
        assert!(Answer::Multi(vec!["".into(), " ".into()]).is_empty());
        assert!(!Answer::Multi(vec!["rash".into()]).is_empty());
    }

    #[test]
    fn answers_normalize_to_lowercase() {
        assert_eq!(Answer::Text(" Yes ".into()).normalized(), "yes");
        assert_eq!(
            Answer::Multi(vec!["Rash".into(), "Itching".into()]).normalized(),
            "rash, itching"
        );
    }

    #[test]
    fn scope_status_from_wire_variants() {
        assert_eq!(ScopeStatus::from_wire("In Scope"), Some(ScopeStatus::InScope));
        assert_eq!(ScopeStatus::from_wire("in-scope"), Some(ScopeStatus::InScope));
        assert_eq!(ScopeStatus::from_wire("REFER"), Some(ScopeStatus::Refer));
        assert_eq!(ScopeStatus::from_wire("maybe"), None);
    }
}
