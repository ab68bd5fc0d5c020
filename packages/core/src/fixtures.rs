//! Record builders shared by the unit tests.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::model::*;

pub fn ts() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn course_type(id: &str, kind: CourseTypeKind) -> CourseTypeRecord {
    CourseTypeRecord {
        id: id.to_string(),
        name: format!("{id} name"),
        kind,
        description: None,
        display_order: 0,
        is_active: true,
        created_at: ts(),
        updated_at: ts(),
    }
}

pub fn course(id: &str, course_type_id: &str, order: i32) -> CourseRecord {
    CourseRecord {
        id: id.to_string(),
        course_type_id: course_type_id.to_string(),
        name: format!("{id} name"),
        description: None,
        skills: Vec::new(),
        display_order: order,
        is_active: true,
        created_at: ts(),
        updated_at: ts(),
    }
}

pub fn class(id: &str, course_id: &str, order: i32) -> ClassRecord {
    ClassRecord {
        id: id.to_string(),
        course_id: course_id.to_string(),
        name: format!("{id} name"),
        description: None,
        display_order: order,
        is_active: true,
        created_at: ts(),
        updated_at: ts(),
    }
}

pub fn exam(id: &str, course_id: &str, order: i32) -> ExamRecord {
    ExamRecord {
        id: id.to_string(),
        course_id: course_id.to_string(),
        name: format!("{id} name"),
        description: None,
        conducting_body: None,
        display_order: order,
        is_active: true,
        created_at: ts(),
        updated_at: ts(),
    }
}

pub fn subject(id: &str, parent_kind: EntityKind, parent_id: &str, order: i32) -> SubjectRecord {
    SubjectRecord {
        id: id.to_string(),
        parent_kind,
        parent_id: parent_id.to_string(),
        name: format!("{id} name"),
        description: None,
        display_order: order,
        is_active: true,
        created_at: ts(),
        updated_at: ts(),
    }
}

pub fn topic(id: &str, subject_id: &str, order: i32) -> TopicRecord {
    TopicRecord {
        id: id.to_string(),
        subject_id: subject_id.to_string(),
        name: format!("{id} name"),
        description: None,
        display_order: order,
        is_active: true,
        created_at: ts(),
        updated_at: ts(),
    }
}

pub fn module(id: &str, topic_id: &str, order: i32, is_project: bool) -> ModuleRecord {
    ModuleRecord {
        id: id.to_string(),
        topic_id: topic_id.to_string(),
        name: format!("{id} name"),
        description: None,
        is_project,
        display_order: order,
        is_active: true,
        created_at: ts(),
        updated_at: ts(),
    }
}

pub fn chapter(id: &str, module_id: &str, order: i32) -> ChapterRecord {
    ChapterRecord {
        id: id.to_string(),
        module_id: module_id.to_string(),
        name: format!("{id} name"),
        description: None,
        display_order: order,
        is_active: true,
        created_at: ts(),
        updated_at: ts(),
    }
}

pub fn question(id: &str, chapter_id: &str, correct_option: i32, marks: i64) -> QuestionRecord {
    QuestionRecord {
        id: id.to_string(),
        chapter_id: chapter_id.to_string(),
        text: format!("{id}?"),
        options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
        correct_option,
        difficulty: Difficulty::Medium,
        marks: Decimal::new(marks, 0),
        negative_marks: Decimal::ZERO,
        explanation: None,
        exam_history: Vec::new(),
        suitable_for: Vec::new(),
        display_order: 0,
        is_active: true,
        created_at: ts(),
        updated_at: ts(),
    }
}

pub fn pricing(
    id: &str,
    course_type_id: &str,
    level: PricingLevel,
    entity_id: &str,
    tier: Tier,
    base_price: i64,
    discount_percent: i32,
) -> PricingRecord {
    PricingRecord {
        id: id.to_string(),
        course_type_id: course_type_id.to_string(),
        level,
        entity_id: entity_id.to_string(),
        tier,
        base_price: Decimal::new(base_price, 0),
        discount_percent,
        valid_from: None,
        valid_to: None,
        created_at: ts(),
        updated_at: ts(),
    }
}
