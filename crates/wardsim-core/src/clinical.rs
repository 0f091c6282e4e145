//! Pure data-shaping helpers over the diagnosis/question feeds. These are
//! consumed by the presentation layer but are functions of engine output
//! only, so they live here rather than in any UI code.

use crate::events::{QuestionEntry, QuestionStatus};
use rand::Rng;

/// Derive a display confidence score from the number of supporting points:
/// a saturating linear scale (count x 10, capped at 95) plus a small random
/// jitter, floored at 10.
pub fn confidence_score(supporting_count: u32) -> u8 {
    let base = (supporting_count * 10).min(95);
    let jitter: f64 = rand::thread_rng().gen_range(0.0..5.0);
    (base as f64 + jitter).round().max(10.0) as u8
}

/// A checklist entry for the interview question panel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChecklistItem {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub answer: Option<String>,
}

/// Map the backend question list to checklist items: deleted questions are
/// excluded, asked questions are marked completed.
pub fn checklist_from_questions(questions: &[QuestionEntry]) -> Vec<ChecklistItem> {
    questions
        .iter()
        .filter(|q| q.status != Some(QuestionStatus::Deleted))
        .map(|q| ChecklistItem {
            id: q.id.clone(),
            text: q.content.clone(),
            completed: q.status == Some(QuestionStatus::Asked),
            answer: q.answer.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, status: Option<QuestionStatus>) -> QuestionEntry {
        QuestionEntry {
            id: id.to_string(),
            role: "nurse".to_string(),
            content: format!("question {id}"),
            score: 0.5,
            rank: 1,
            status,
            answer: None,
        }
    }

    #[test]
    fn test_confidence_score_floor() {
        for _ in 0..20 {
            assert!(confidence_score(0) >= 10);
        }
    }

    #[test]
    fn test_confidence_score_scales_with_count() {
        for _ in 0..20 {
            let score = confidence_score(5);
            assert!((50..=55).contains(&score), "got {score}");
        }
    }

    #[test]
    fn test_confidence_score_saturates() {
        for _ in 0..20 {
            let score = confidence_score(40);
            assert!((95..=100).contains(&score), "got {score}");
        }
    }

    #[test]
    fn test_checklist_excludes_deleted() {
        let qs = vec![
            question("q1", None),
            question("q2", Some(QuestionStatus::Deleted)),
            question("q3", Some(QuestionStatus::Asked)),
        ];
        let items = checklist_from_questions(&qs);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "q1");
        assert!(!items[0].completed);
        assert_eq!(items[1].id, "q3");
        assert!(items[1].completed);
    }
}
