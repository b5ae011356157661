//! Scope and follow-up assessment workflow.
//!
//! A three-stage machine advanced only by explicit user action:
//! Scope → FollowUp → Complete. Each stage's constructor takes the prior
//! stage's typed output, so the follow-up fetch cannot be issued before
//! the scope response exists and illegal transitions do not typecheck.
//!
//! Question visibility: a question with a declared dependency is hidden —
//! and excluded from required-answer validation — unless the parent
//! question's recorded answer equals the trigger value (case-insensitive).

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Answer, Question, ScopeOutcome, ScopeStatus};

/// Errors from assessment bookkeeping and validation.
#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    #[error("No question at index {0}")]
    InvalidQuestion(usize),
    #[error("Please answer all questions before submitting: {}", .0.join("; "))]
    Unanswered(Vec<String>),
    #[error("Patient gender is missing or invalid")]
    InvalidGender,
}

// ═══════════════════════════════════════════════════════════
// Visibility & validation
// ═══════════════════════════════════════════════════════════

/// Is this question currently visible given the recorded answers?
///
/// Independent questions are always visible. A dependent question shows
/// only while its parent's answer equals the trigger value; a missing or
/// unanswerable parent keeps it hidden.
pub fn is_visible(
    question: &Question,
    questions: &[Question],
    answers: &BTreeMap<usize, Answer>,
) -> bool {
    let Some(dep) = &question.depends_on else {
        return true;
    };
    let Some(parent_index) = questions.iter().position(|q| q.text == dep.question) else {
        return false;
    };
    answers
        .get(&parent_index)
        .is_some_and(|a| a.normalized() == dep.answer.trim().to_lowercase())
}

/// Texts of visible questions that still lack a non-empty answer.
pub fn missing_answers(
    questions: &[Question],
    answers: &BTreeMap<usize, Answer>,
) -> Vec<String> {
    questions
        .iter()
        .enumerate()
        .filter(|(_, q)| is_visible(q, questions, answers))
        .filter(|(i, _)| answers.get(i).map_or(true, Answer::is_empty))
        .map(|(_, q)| q.text.clone())
        .collect()
}

/// Lower-cased answers grouped by question text, visible questions only —
/// the shape the scope-status endpoint takes.
pub fn group_answers(
    questions: &[Question],
    answers: &BTreeMap<usize, Answer>,
) -> BTreeMap<String, String> {
    questions
        .iter()
        .enumerate()
        .filter(|(_, q)| is_visible(q, questions, answers))
        .filter_map(|(i, q)| {
            let answer = answers.get(&i)?;
            if answer.is_empty() {
                return None;
            }
            Some((q.text.clone(), answer.normalized()))
        })
        .collect()
}

fn validate(questions: &[Question], answers: &BTreeMap<usize, Answer>) -> Result<(), AssessmentError> {
    let missing = missing_answers(questions, answers);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AssessmentError::Unanswered(missing))
    }
}

// ═══════════════════════════════════════════════════════════
// Stages
// ═══════════════════════════════════════════════════════════

/// Stage 1: scope questionnaire for a visit reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeStage {
    pub reason: String,
    /// Already normalized to "Male"/"Female".
    pub gender: String,
    pub dob: Option<NaiveDate>,
    pub questions: Vec<Question>,
    pub answers: BTreeMap<usize, Answer>,
}

impl ScopeStage {
    pub fn new(
        reason: &str,
        gender: &str,
        dob: Option<NaiveDate>,
        questions: Vec<Question>,
    ) -> Self {
        Self {
            reason: reason.to_string(),
            gender: gender.to_string(),
            dob,
            questions,
            answers: BTreeMap::new(),
        }
    }

    pub fn record_answer(&mut self, index: usize, answer: Answer) -> Result<(), AssessmentError> {
        if index >= self.questions.len() {
            return Err(AssessmentError::InvalidQuestion(index));
        }
        self.answers.insert(index, answer);
        Ok(())
    }

    /// Block submission until every visible question has an answer.
    pub fn validate(&self) -> Result<(), AssessmentError> {
        validate(&self.questions, &self.answers)
    }

    pub fn grouped_answers(&self) -> BTreeMap<String, String> {
        group_answers(&self.questions, &self.answers)
    }

    /// Consume the stage with the server's scope decision.
    pub fn complete(self, status: ScopeStatus, reason: String) -> ScopeOutcome {
        let answers = self.grouped_answers();
        ScopeOutcome {
            status,
            reason,
            answers,
        }
    }
}

/// Stage 2: follow-up questionnaire. Only constructible from a completed
/// scope outcome, which is forwarded with the submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUpStage {
    pub scope: ScopeOutcome,
    pub questions: Vec<Question>,
    pub answers: BTreeMap<usize, Answer>,
}

impl FollowUpStage {
    pub fn new(scope: ScopeOutcome, questions: Vec<Question>) -> Self {
        Self {
            scope,
            questions,
            answers: BTreeMap::new(),
        }
    }

    pub fn record_answer(&mut self, index: usize, answer: Answer) -> Result<(), AssessmentError> {
        if index >= self.questions.len() {
            return Err(AssessmentError::InvalidQuestion(index));
        }
        self.answers.insert(index, answer);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), AssessmentError> {
        validate(&self.questions, &self.answers)
    }

    pub fn grouped_answers(&self) -> BTreeMap<String, String> {
        group_answers(&self.questions, &self.answers)
    }

    /// Consume the stage into the finalization record.
    pub fn complete(self) -> CompletedAssessment {
        let follow_up_answers = self.grouped_answers();
        CompletedAssessment {
            scope: self.scope,
            follow_up_answers,
            soap_note: None,
        }
    }
}

/// Stage 3: everything needed to render and save the assessment document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedAssessment {
    pub scope: ScopeOutcome,
    pub follow_up_answers: BTreeMap<String, String>,
    pub soap_note: Option<String>,
}

/// The whole workflow, one variant per stage. Lives in the assessment
/// slice; never persisted beyond the screen's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AssessmentStage {
    Scope(ScopeStage),
    FollowUp(FollowUpStage),
    Complete(CompletedAssessment),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionDependency;

    fn q(text: &str) -> Question {
        Question {
            text: text.into(),
            options: Vec::new(),
            multi_select: false,
            depends_on: None,
        }
    }

    fn dependent(text: &str, parent: &str, trigger: &str) -> Question {
        Question {
            depends_on: Some(QuestionDependency {
                question: parent.into(),
                answer: trigger.into(),
            }),
            ..q(text)
        }
    }

    fn fever_questions() -> Vec<Question> {
        vec![
            q("Any fever?"),
            dependent("What was the temperature?", "Any fever?", "Yes"),
        ]
    }

    #[test]
    fn dependent_question_hidden_until_trigger_matches() {
        let questions = fever_questions();
        let mut answers = BTreeMap::new();
        assert!(!is_visible(&questions[1], &questions, &answers));

        answers.insert(0, Answer::Text("No".into()));
        assert!(!is_visible(&questions[1], &questions, &answers));

        answers.insert(0, Answer::Text("Yes".into()));
        assert!(is_visible(&questions[1], &questions, &answers));

        // Trigger comparison is case-insensitive both ways.
        answers.insert(0, Answer::Text("YES".into()));
        assert!(is_visible(&questions[1], &questions, &answers));
    }

    #[test]
    fn hidden_dependent_excluded_from_missing_check() {
        let questions = fever_questions();
        let mut answers = BTreeMap::new();
        answers.insert(0, Answer::Text("No".into()));
        assert!(missing_answers(&questions, &answers).is_empty());

        // Once visible, it becomes required.
        answers.insert(0, Answer::Text("Yes".into()));
        assert_eq!(
            missing_answers(&questions, &answers),
            vec!["What was the temperature?"]
        );
    }

    #[test]
    fn dependency_on_unknown_parent_stays_hidden() {
        let questions = vec![dependent("Orphan?", "Does not exist", "Yes")];
        assert!(missing_answers(&questions, &BTreeMap::new()).is_empty());
    }

    #[test]
    fn grouped_answers_lowercase_by_question_text() {
        let questions = vec![q("Any fever?"), q("Symptoms?")];
        let mut answers = BTreeMap::new();
        answers.insert(0, Answer::Text("Yes".into()));
        answers.insert(1, Answer::Multi(vec!["Rash".into(), "Itching".into()]));

        let grouped = group_answers(&questions, &answers);
        assert_eq!(grouped["Any fever?"], "yes");
        assert_eq!(grouped["Symptoms?"], "rash, itching");
    }

    #[test]
    fn scope_validate_blocks_partial_submission() {
        let mut stage = ScopeStage::new("UTI", "Female", None, fever_questions());
        assert!(matches!(
            stage.validate(),
            Err(AssessmentError::Unanswered(_))
        ));

        stage.record_answer(0, Answer::Text("No".into())).unwrap();
        assert!(stage.validate().is_ok());
    }

    #[test]
    fn record_answer_rejects_bad_index() {
        let mut stage = ScopeStage::new("UTI", "Female", None, fever_questions());
        assert!(matches!(
            stage.record_answer(9, Answer::Text("x".into())),
            Err(AssessmentError::InvalidQuestion(9))
        ));
    }

    #[test]
    fn stage_flow_threads_scope_into_follow_up() {
        let mut scope = ScopeStage::new("UTI", "Female", None, vec![q("Any fever?")]);
        scope.record_answer(0, Answer::Text("No".into())).unwrap();
        scope.validate().unwrap();

        let outcome = scope.complete(ScopeStatus::InScope, "Mild presentation".into());
        assert_eq!(outcome.answers["Any fever?"], "no");

        let mut follow_up = FollowUpStage::new(outcome, vec![q("Taking any medications?")]);
        follow_up
            .record_answer(0, Answer::Text("None".into()))
            .unwrap();
        follow_up.validate().unwrap();

        let complete = follow_up.complete();
        assert_eq!(complete.scope.status, ScopeStatus::InScope);
        assert_eq!(complete.follow_up_answers["Taking any medications?"], "none");
        assert!(complete.soap_note.is_none());
    }
}
