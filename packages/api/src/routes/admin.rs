use axum::{
    Router,
    routing::{get, post, put},
};
use chrono::NaiveDateTime;
use eduhub::model::{EntityKind, PricingLevel};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DeleteResult, EntityTrait, QueryFilter, QuerySelect,
};
use validator::ValidationError;

use crate::entity::{class, exam, pricing_config, subject};
use crate::error::ApiError;
use crate::state::AppState;

pub mod chapters;
pub mod classes;
pub mod course_types;
pub mod courses;
pub mod exams;
pub mod modules;
pub mod pricing;
pub mod questions;
pub mod subjects;
pub mod topics;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/course-types",
            get(course_types::list_course_types).post(course_types::create_course_type),
        )
        .route(
            "/course-types/{id}",
            get(course_types::get_course_type)
                .put(course_types::update_course_type)
                .delete(course_types::delete_course_type),
        )
        .route(
            "/courses",
            get(courses::list_courses).post(courses::create_course),
        )
        .route(
            "/courses/{id}",
            get(courses::get_course)
                .put(courses::update_course)
                .delete(courses::delete_course),
        )
        .route(
            "/classes",
            get(classes::list_classes).post(classes::create_class),
        )
        .route(
            "/classes/{id}",
            get(classes::get_class)
                .put(classes::update_class)
                .delete(classes::delete_class),
        )
        .route("/exams", get(exams::list_exams).post(exams::create_exam))
        .route(
            "/exams/{id}",
            get(exams::get_exam)
                .put(exams::update_exam)
                .delete(exams::delete_exam),
        )
        .route(
            "/subjects",
            get(subjects::list_subjects).post(subjects::create_subject),
        )
        .route(
            "/subjects/{id}",
            get(subjects::get_subject)
                .put(subjects::update_subject)
                .delete(subjects::delete_subject),
        )
        .route("/topics", get(topics::list_topics).post(topics::create_topic))
        .route(
            "/topics/{id}",
            get(topics::get_topic)
                .put(topics::update_topic)
                .delete(topics::delete_topic),
        )
        .route(
            "/modules",
            get(modules::list_modules).post(modules::create_module),
        )
        .route(
            "/modules/{id}",
            get(modules::get_module)
                .put(modules::update_module)
                .delete(modules::delete_module),
        )
        .route(
            "/chapters",
            get(chapters::list_chapters).post(chapters::create_chapter),
        )
        .route(
            "/chapters/{id}",
            get(chapters::get_chapter)
                .put(chapters::update_chapter)
                .delete(chapters::delete_chapter),
        )
        .route(
            "/questions",
            get(questions::list_questions).post(questions::create_question),
        )
        .route(
            "/questions/{id}",
            get(questions::get_question)
                .put(questions::update_question)
                .delete(questions::delete_question),
        )
        .route("/pricing", put(pricing::upsert_pricing))
        .route(
            "/pricing/dropdown/{course_type_id}/{level}",
            get(pricing::pricing_dropdown),
        )
        .route("/pricing/bulk-discount", post(pricing::bulk_discount))
        .route("/tests", get(online_tests::list_tests).post(online_tests::create_test))
        .route(
            "/tests/{id}",
            get(online_tests::get_test)
                .put(online_tests::update_test)
                .delete(online_tests::delete_test),
        )
}

pub(crate) fn now() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

pub(crate) fn default_true() -> bool {
    true
}

/// Rejects names made only of whitespace.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn ensure_deleted(
    result: DeleteResult,
    entity: &str,
    id: &str,
) -> Result<(), ApiError> {
    if result.rows_affected == 0 {
        return Err(ApiError::not_found(format!("{entity} not found: {id}")));
    }
    tracing::info!(entity, id, "Deleted");
    Ok(())
}

/// Removes the pricing rows and subjects owned by `ids`. Both point at their
/// owner through a kind and id pair, so no foreign key cascades them.
/// Topics and everything below a subject cascade from the subject.
pub(crate) async fn delete_dependents<C: ConnectionTrait>(
    db: &C,
    kind: EntityKind,
    ids: &[String],
) -> Result<(), ApiError> {
    if ids.is_empty() {
        return Ok(());
    }

    let pricing = pricing_config::Entity::delete_many()
        .filter(pricing_config::Column::Level.eq(PricingLevel::from(kind)))
        .filter(pricing_config::Column::EntityId.is_in(ids.iter().map(String::as_str)))
        .exec(db)
        .await?;
    let subjects = subject::Entity::delete_many()
        .filter(subject::Column::ParentKind.eq(kind))
        .filter(subject::Column::ParentId.is_in(ids.iter().map(String::as_str)))
        .exec(db)
        .await?;

    tracing::info!(
        entity = kind.as_str(),
        owners = ids.len(),
        pricing_rows = pricing.rows_affected,
        subjects = subjects.rows_affected,
        "Deleted dependents"
    );
    Ok(())
}

/// Dependents of the given courses and of their classes and exams. The class
/// and exam rows themselves cascade with the course.
pub(crate) async fn delete_course_dependents<C: ConnectionTrait>(
    db: &C,
    course_ids: &[String],
) -> Result<(), ApiError> {
    if course_ids.is_empty() {
        return Ok(());
    }

    let class_ids: Vec<String> = class::Entity::find()
        .select_only()
        .column(class::Column::Id)
        .filter(class::Column::CourseId.is_in(course_ids.iter().map(String::as_str)))
        .into_tuple()
        .all(db)
        .await?;
    let exam_ids: Vec<String> = exam::Entity::find()
        .select_only()
        .column(exam::Column::Id)
        .filter(exam::Column::CourseId.is_in(course_ids.iter().map(String::as_str)))
        .into_tuple()
        .all(db)
        .await?;

    delete_dependents(db, EntityKind::Class, &class_ids).await?;
    delete_dependents(db, EntityKind::Exam, &exam_ids).await?;
    delete_dependents(db, EntityKind::Course, course_ids).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::testing::{bearer, json_request, mock_db, send, state, state_log, statement_log};
    use axum::http::StatusCode;
    use sea_orm::{MockExecResult, Value};
    use std::collections::BTreeMap;

    fn deleted(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn id_row(id: &str) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("id", Value::from(id))])
    }

    #[tokio::test]
    async fn test_delete_class_removes_pricing_and_subjects_first() {
        let db = mock_db()
            .append_exec_results([deleted(3), deleted(2), deleted(1)])
            .into_connection();
        let state = state(db);

        let request = json_request(
            "DELETE",
            "/api/v1/admin/classes/class_1",
            Some(bearer("admin-1", Role::Admin)),
            "",
        );
        let response = send(&state, request).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        drop(response);
        let log = state_log(state);
        assert_eq!(log.len(), 1);
        let txn = &log[0];
        let pricing = txn.find("\\\"PricingConfig\\\"").unwrap();
        let subjects = txn.find("\\\"Subject\\\"").unwrap();
        let class = txn.find("\\\"Class\\\"").unwrap();
        assert!(pricing < subjects && subjects < class);
        assert!(txn.contains("COMMIT"));
    }

    #[tokio::test]
    async fn test_missing_class_rolls_back_dependent_deletes() {
        let db = mock_db()
            .append_exec_results([deleted(0), deleted(0), deleted(0)])
            .into_connection();
        let state = state(db);

        let response = send(
            &state,
            json_request(
                "DELETE",
                "/api/v1/admin/classes/ghost",
                Some(bearer("admin-1", Role::Admin)),
                "",
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        drop(response);
        assert!(!state_log(state).iter().any(|txn| txn.contains("COMMIT")));
    }

    #[tokio::test]
    async fn test_course_dependents_cover_classes_and_exams() {
        let db = mock_db()
            .append_query_results([vec![id_row("class_1")]])
            .append_query_results([vec![id_row("exam_1")]])
            .append_exec_results([
                deleted(3),
                deleted(1),
                deleted(3),
                deleted(2),
                deleted(0),
                deleted(0),
            ])
            .into_connection();

        delete_course_dependents(&db, &["course_1".to_string()])
            .await
            .unwrap();

        let log = statement_log(db);
        assert_eq!(log.len(), 8);
        let deletes = &log[2..];
        assert!(deletes.iter().all(|stmt| stmt.contains("DELETE")));
        let owners = ["class_1", "class_1", "exam_1", "exam_1", "course_1", "course_1"];
        for (stmt, owner) in deletes.iter().zip(owners) {
            assert!(stmt.contains(owner), "{stmt} should target {owner}");
        }
        assert!(deletes[0].contains("PricingConfig"));
        assert!(deletes[1].contains("Subject"));
    }

    #[tokio::test]
    async fn test_no_owners_issue_no_statements() {
        let db = mock_db().into_connection();
        delete_dependents(&db, EntityKind::Exam, &[]).await.unwrap();
        assert!(statement_log(db).is_empty());
    }

    #[test]
    fn test_not_blank() {
        assert!(not_blank("Physics").is_ok());
        assert!(not_blank("   ").is_err());
        assert!(not_blank("").is_err());
    }
}
