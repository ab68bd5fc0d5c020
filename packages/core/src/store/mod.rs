//! Storage seams for the pricing and catalogue logic.
//!
//! The resolver, composer and bulk updater never open their own transactions.
//! Callers pass in a handle that already represents one unit of work: a
//! database transaction in the API, or a [`memory::MemoryTransaction`] in tests
//! and local development.

pub mod memory;

pub use memory::{MemoryStore, MemoryTransaction};

use crate::Result;
use crate::model::{
    ChapterRecord, ClassRecord, CourseRecord, CourseTypeRecord, EntityKind, ExamRecord,
    ModuleRecord, PricingLevel, PricingRecord, SubjectRecord, Tier, TopicRecord,
};

/// Read access to the catalogue and its pricing rows.
///
/// Implementations return children in any order; callers sort with
/// [`crate::model::visible`] or [`crate::model::sort_by_display_order`].
#[async_trait::async_trait]
pub trait CatalogueRead: Send + Sync {
    async fn course_type(&self, id: &str) -> Result<Option<CourseTypeRecord>>;

    async fn course(&self, id: &str) -> Result<Option<CourseRecord>>;

    async fn class(&self, id: &str) -> Result<Option<ClassRecord>>;

    async fn exam(&self, id: &str) -> Result<Option<ExamRecord>>;

    async fn courses_of_type(&self, course_type_id: &str) -> Result<Vec<CourseRecord>>;

    async fn classes_of_course(&self, course_id: &str) -> Result<Vec<ClassRecord>>;

    async fn exams_of_course(&self, course_id: &str) -> Result<Vec<ExamRecord>>;

    /// Subjects linked to the given class, exam or course
    async fn subjects_of(&self, parent_kind: EntityKind, parent_id: &str)
    -> Result<Vec<SubjectRecord>>;

    async fn topics_of_subject(&self, subject_id: &str) -> Result<Vec<TopicRecord>>;

    async fn modules_of_topic(&self, topic_id: &str) -> Result<Vec<ModuleRecord>>;

    async fn chapters_of_module(&self, module_id: &str) -> Result<Vec<ChapterRecord>>;

    /// Number of active questions in a chapter
    async fn question_count(&self, chapter_id: &str) -> Result<u64>;

    async fn pricing_row(
        &self,
        level: PricingLevel,
        entity_id: &str,
        tier: Tier,
    ) -> Result<Option<PricingRecord>>;
}

/// Write access to pricing rows inside one unit of work.
#[async_trait::async_trait]
pub trait PricingWrite: Send {
    /// All pricing rows of a course type at a level, every tier
    async fn pricing_rows(
        &mut self,
        course_type_id: &str,
        level: PricingLevel,
    ) -> Result<Vec<PricingRecord>>;

    async fn save_pricing(&mut self, row: &PricingRecord) -> Result<()>;
}
