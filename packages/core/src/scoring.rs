//! Online tests and attempt scoring.

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::error::EduError;
use crate::model::QuestionRecord;
use crate::pricing::round_currency;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineTestRecord {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub question_ids: Vec<String>,
    pub duration_minutes: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl OnlineTestRecord {
    pub fn deadline(&self, started_at: NaiveDateTime) -> NaiveDateTime {
        started_at + Duration::minutes(i64::from(self.duration_minutes))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub id: String,
    pub test_id: String,
    pub user_id: String,
    pub started_at: NaiveDateTime,
    pub submitted_at: Option<NaiveDateTime>,
    /// Question id to selected option index
    pub answers: BTreeMap<String, i32>,
    pub score: Option<AttemptScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptScore {
    pub total_marks: Decimal,
    pub score: Decimal,
    pub correct: u32,
    pub wrong: u32,
    pub unanswered: u32,
    pub percentage: Decimal,
}

pub fn ensure_within_duration(
    test: &OnlineTestRecord,
    started_at: NaiveDateTime,
    now: NaiveDateTime,
) -> Result<()> {
    if now > test.deadline(started_at) {
        return Err(EduError::validation(format!(
            "test {} allows {} minutes and the attempt has run out of time",
            test.id, test.duration_minutes
        )));
    }
    Ok(())
}

/// Scores the answers against the test's questions.
///
/// Correct answers earn the question's marks, wrong ones cost its negative
/// marks. The score never drops below zero.
pub fn score_attempt(
    questions: &[QuestionRecord],
    answers: &BTreeMap<String, i32>,
) -> Result<AttemptScore> {
    let by_id: HashMap<&str, &QuestionRecord> =
        questions.iter().map(|q| (q.id.as_str(), q)).collect();

    for (question_id, option) in answers {
        let question = by_id
            .get(question_id.as_str())
            .ok_or_else(|| EduError::validation(format!("question {question_id} is not part of this test")))?;
        if *option < 0 || *option as usize >= question.options.len() {
            return Err(EduError::validation(format!(
                "option {option} is out of range for question {question_id}"
            )));
        }
    }

    let mut total_marks = Decimal::ZERO;
    let mut earned = Decimal::ZERO;
    let (mut correct, mut wrong, mut unanswered) = (0, 0, 0);

    for question in questions {
        total_marks += question.marks;
        match answers.get(&question.id) {
            None => unanswered += 1,
            Some(option) if *option == question.correct_option => {
                correct += 1;
                earned += question.marks;
            }
            Some(_) => {
                wrong += 1;
                earned -= question.negative_marks;
            }
        }
    }

    let score = earned.max(Decimal::ZERO);
    let percentage = if total_marks.is_zero() {
        Decimal::ZERO
    } else {
        round_currency(score * Decimal::ONE_HUNDRED / total_marks)
    };

    Ok(AttemptScore {
        total_marks,
        score,
        correct,
        wrong,
        unanswered,
        percentage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;

    fn questions() -> Vec<QuestionRecord> {
        let mut q3 = question("q3", "ch", 2, 2);
        q3.negative_marks = Decimal::new(5, 1);
        vec![question("q1", "ch", 0, 4), question("q2", "ch", 1, 4), q3]
    }

    fn answers(pairs: &[(&str, i32)]) -> BTreeMap<String, i32> {
        pairs.iter().map(|(q, o)| (q.to_string(), *o)).collect()
    }

    #[test]
    fn test_scores_correct_wrong_and_unanswered() {
        let score = score_attempt(&questions(), &answers(&[("q1", 0), ("q3", 1)])).unwrap();

        assert_eq!(score.total_marks, Decimal::new(10, 0));
        assert_eq!(score.score, Decimal::new(35, 1));
        assert_eq!((score.correct, score.wrong, score.unanswered), (1, 1, 1));
        assert_eq!(score.percentage, Decimal::new(35, 0));
    }

    #[test]
    fn test_score_is_floored_at_zero() {
        let mut qs = questions();
        for q in &mut qs {
            q.negative_marks = Decimal::ONE;
        }
        let score = score_attempt(&qs, &answers(&[("q1", 3), ("q2", 3), ("q3", 3)])).unwrap();
        assert_eq!(score.score, Decimal::ZERO);
        assert_eq!(score.wrong, 3);
    }

    #[test]
    fn test_rejects_foreign_questions_and_bad_options() {
        assert!(score_attempt(&questions(), &answers(&[("elsewhere", 0)])).is_err());
        assert!(score_attempt(&questions(), &answers(&[("q1", 4)])).is_err());
        assert!(score_attempt(&questions(), &answers(&[("q1", -1)])).is_err());
    }

    #[test]
    fn test_percentage_rounds_to_two_places() {
        let qs = vec![
            question("a", "ch", 0, 1),
            question("b", "ch", 0, 1),
            question("c", "ch", 0, 1),
        ];
        let score = score_attempt(&qs, &answers(&[("a", 0)])).unwrap();
        assert_eq!(score.percentage, Decimal::new(3333, 2));

        let empty = score_attempt(&[], &BTreeMap::new()).unwrap();
        assert_eq!(empty.percentage, Decimal::ZERO);
    }

    #[test]
    fn test_duration() {
        let test = OnlineTestRecord {
            id: "t".into(),
            name: "Mock".into(),
            description: None,
            question_ids: vec![],
            duration_minutes: 30,
            is_active: true,
            created_at: ts(),
            updated_at: ts(),
        };
        assert!(ensure_within_duration(&test, ts(), ts() + Duration::minutes(30)).is_ok());
        assert!(ensure_within_duration(&test, ts(), ts() + Duration::minutes(31)).is_err());
    }
}
