//! In-memory catalogue store
//!
//! Used by tests and local development where no database is available. A
//! [`MemoryTransaction`] works on a staged copy of the tables; nothing is
//! visible to the store until [`MemoryTransaction::commit`], and dropping the
//! transaction discards its writes.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{CatalogueRead, PricingWrite};
use crate::Result;
use crate::model::{
    ChapterRecord, ClassRecord, CourseRecord, CourseTypeRecord, EntityKind, ExamRecord,
    ModuleRecord, PricingLevel, PricingRecord, QuestionRecord, SubjectRecord, Tier, TopicRecord,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    course_types: BTreeMap<String, CourseTypeRecord>,
    courses: BTreeMap<String, CourseRecord>,
    classes: BTreeMap<String, ClassRecord>,
    exams: BTreeMap<String, ExamRecord>,
    subjects: BTreeMap<String, SubjectRecord>,
    topics: BTreeMap<String, TopicRecord>,
    modules: BTreeMap<String, ModuleRecord>,
    chapters: BTreeMap<String, ChapterRecord>,
    questions: BTreeMap<String, QuestionRecord>,
    pricing: BTreeMap<String, PricingRecord>,
}

impl Tables {
    fn courses_of_type(&self, course_type_id: &str) -> Vec<CourseRecord> {
        self.courses
            .values()
            .filter(|c| c.course_type_id == course_type_id)
            .cloned()
            .collect()
    }

    fn classes_of_course(&self, course_id: &str) -> Vec<ClassRecord> {
        self.classes
            .values()
            .filter(|c| c.course_id == course_id)
            .cloned()
            .collect()
    }

    fn exams_of_course(&self, course_id: &str) -> Vec<ExamRecord> {
        self.exams
            .values()
            .filter(|e| e.course_id == course_id)
            .cloned()
            .collect()
    }

    fn subjects_of(&self, parent_kind: EntityKind, parent_id: &str) -> Vec<SubjectRecord> {
        self.subjects
            .values()
            .filter(|s| s.parent_kind == parent_kind && s.parent_id == parent_id)
            .cloned()
            .collect()
    }

    fn topics_of_subject(&self, subject_id: &str) -> Vec<TopicRecord> {
        self.topics
            .values()
            .filter(|t| t.subject_id == subject_id)
            .cloned()
            .collect()
    }

    fn modules_of_topic(&self, topic_id: &str) -> Vec<ModuleRecord> {
        self.modules
            .values()
            .filter(|m| m.topic_id == topic_id)
            .cloned()
            .collect()
    }

    fn chapters_of_module(&self, module_id: &str) -> Vec<ChapterRecord> {
        self.chapters
            .values()
            .filter(|c| c.module_id == module_id)
            .cloned()
            .collect()
    }

    fn question_count(&self, chapter_id: &str) -> u64 {
        self.questions
            .values()
            .filter(|q| q.chapter_id == chapter_id && q.is_active)
            .count() as u64
    }

    fn pricing_row(
        &self,
        level: PricingLevel,
        entity_id: &str,
        tier: Tier,
    ) -> Option<PricingRecord> {
        self.pricing
            .values()
            .find(|p| p.level == level && p.entity_id == entity_id && p.tier == tier)
            .cloned()
    }

    fn pricing_rows(&self, course_type_id: &str, level: PricingLevel) -> Vec<PricingRecord> {
        self.pricing
            .values()
            .filter(|p| p.course_type_id == course_type_id && p.level == level)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a unit of work over a snapshot of the current tables.
    pub fn begin(&self) -> MemoryTransaction {
        MemoryTransaction {
            target: self.tables.clone(),
            staged: self.tables.read().clone(),
        }
    }

    pub fn put_course_type(&self, record: CourseTypeRecord) {
        self.tables
            .write()
            .course_types
            .insert(record.id.clone(), record);
    }

    pub fn put_course(&self, record: CourseRecord) {
        self.tables.write().courses.insert(record.id.clone(), record);
    }

    pub fn put_class(&self, record: ClassRecord) {
        self.tables.write().classes.insert(record.id.clone(), record);
    }

    pub fn put_exam(&self, record: ExamRecord) {
        self.tables.write().exams.insert(record.id.clone(), record);
    }

    pub fn put_subject(&self, record: SubjectRecord) {
        self.tables
            .write()
            .subjects
            .insert(record.id.clone(), record);
    }

    pub fn put_topic(&self, record: TopicRecord) {
        self.tables.write().topics.insert(record.id.clone(), record);
    }

    pub fn put_module(&self, record: ModuleRecord) {
        self.tables.write().modules.insert(record.id.clone(), record);
    }

    pub fn put_chapter(&self, record: ChapterRecord) {
        self.tables
            .write()
            .chapters
            .insert(record.id.clone(), record);
    }

    pub fn put_question(&self, record: QuestionRecord) {
        self.tables
            .write()
            .questions
            .insert(record.id.clone(), record);
    }

    pub fn put_pricing(&self, record: PricingRecord) {
        self.tables.write().pricing.insert(record.id.clone(), record);
    }

    pub fn pricing(&self, id: &str) -> Option<PricingRecord> {
        self.tables.read().pricing.get(id).cloned()
    }

    pub fn all_pricing(&self) -> Vec<PricingRecord> {
        self.tables.read().pricing.values().cloned().collect()
    }
}

/// Staged writes against a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryTransaction {
    target: Arc<RwLock<Tables>>,
    staged: Tables,
}

impl MemoryTransaction {
    pub fn commit(self) {
        *self.target.write() = self.staged;
    }

    pub fn rollback(self) {
        tracing::debug!("Discarding staged in-memory writes");
    }
}

macro_rules! impl_catalogue_read {
    ($ty:ty, |$this:ident| $tables:expr) => {
        #[async_trait::async_trait]
        impl CatalogueRead for $ty {
            async fn course_type(&self, id: &str) -> Result<Option<CourseTypeRecord>> {
                let $this = self;
                Ok($tables.course_types.get(id).cloned())
            }

            async fn course(&self, id: &str) -> Result<Option<CourseRecord>> {
                let $this = self;
                Ok($tables.courses.get(id).cloned())
            }

            async fn class(&self, id: &str) -> Result<Option<ClassRecord>> {
                let $this = self;
                Ok($tables.classes.get(id).cloned())
            }

            async fn exam(&self, id: &str) -> Result<Option<ExamRecord>> {
                let $this = self;
                Ok($tables.exams.get(id).cloned())
            }

            async fn courses_of_type(&self, course_type_id: &str) -> Result<Vec<CourseRecord>> {
                let $this = self;
                Ok($tables.courses_of_type(course_type_id))
            }

            async fn classes_of_course(&self, course_id: &str) -> Result<Vec<ClassRecord>> {
                let $this = self;
                Ok($tables.classes_of_course(course_id))
            }

            async fn exams_of_course(&self, course_id: &str) -> Result<Vec<ExamRecord>> {
                let $this = self;
                Ok($tables.exams_of_course(course_id))
            }

            async fn subjects_of(
                &self,
                parent_kind: EntityKind,
                parent_id: &str,
            ) -> Result<Vec<SubjectRecord>> {
                let $this = self;
                Ok($tables.subjects_of(parent_kind, parent_id))
            }

            async fn topics_of_subject(&self, subject_id: &str) -> Result<Vec<TopicRecord>> {
                let $this = self;
                Ok($tables.topics_of_subject(subject_id))
            }

            async fn modules_of_topic(&self, topic_id: &str) -> Result<Vec<ModuleRecord>> {
                let $this = self;
                Ok($tables.modules_of_topic(topic_id))
            }

            async fn chapters_of_module(&self, module_id: &str) -> Result<Vec<ChapterRecord>> {
                let $this = self;
                Ok($tables.chapters_of_module(module_id))
            }

            async fn question_count(&self, chapter_id: &str) -> Result<u64> {
                let $this = self;
                Ok($tables.question_count(chapter_id))
            }

            async fn pricing_row(
                &self,
                level: PricingLevel,
                entity_id: &str,
                tier: Tier,
            ) -> Result<Option<PricingRecord>> {
                let $this = self;
                Ok($tables.pricing_row(level, entity_id, tier))
            }
        }
    };
}

impl_catalogue_read!(MemoryStore, |this| this.tables.read());
impl_catalogue_read!(MemoryTransaction, |this| this.staged);

#[async_trait::async_trait]
impl PricingWrite for MemoryTransaction {
    async fn pricing_rows(
        &mut self,
        course_type_id: &str,
        level: PricingLevel,
    ) -> Result<Vec<PricingRecord>> {
        Ok(self.staged.pricing_rows(course_type_id, level))
    }

    async fn save_pricing(&mut self, row: &PricingRecord) -> Result<()> {
        self.staged.pricing.insert(row.id.clone(), row.clone());
        Ok(())
    }
}
