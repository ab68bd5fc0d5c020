//! Database-backed catalogue store.
//!
//! [`DbStore`] borrows any sea-orm connection. Handlers hand it a
//! `DatabaseTransaction` so every read of one request sees the same snapshot
//! and bulk writes commit or roll back together.

use async_trait::async_trait;
use eduhub::Result;
use eduhub::error::EduError;
use eduhub::model::{
    ChapterRecord, ClassRecord, CourseRecord, CourseTypeRecord, EntityKind, ExamRecord,
    ModuleRecord, PricingLevel, PricingRecord, SubjectRecord, Tier, TopicRecord,
};
use eduhub::store::{CatalogueRead, PricingWrite};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter,
};

use crate::entity::{
    chapter, class, course, course_type, exam, module, pricing_config, question, subject, topic,
};

pub struct DbStore<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> DbStore<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }
}

fn store_err(err: DbErr) -> EduError {
    tracing::error!("Database error: {:?}", err);
    EduError::store(err)
}

fn records<M, R: From<M>>(models: Vec<M>) -> Vec<R> {
    models.into_iter().map(R::from).collect()
}

#[async_trait]
impl<C: ConnectionTrait> CatalogueRead for DbStore<'_, C> {
    async fn course_type(&self, id: &str) -> Result<Option<CourseTypeRecord>> {
        let model = course_type::Entity::find_by_id(id)
            .one(self.db)
            .await
            .map_err(store_err)?;
        Ok(model.map(Into::into))
    }

    async fn course(&self, id: &str) -> Result<Option<CourseRecord>> {
        let model = course::Entity::find_by_id(id)
            .one(self.db)
            .await
            .map_err(store_err)?;
        Ok(model.map(Into::into))
    }

    async fn class(&self, id: &str) -> Result<Option<ClassRecord>> {
        let model = class::Entity::find_by_id(id)
            .one(self.db)
            .await
            .map_err(store_err)?;
        Ok(model.map(Into::into))
    }

    async fn exam(&self, id: &str) -> Result<Option<ExamRecord>> {
        let model = exam::Entity::find_by_id(id)
            .one(self.db)
            .await
            .map_err(store_err)?;
        Ok(model.map(Into::into))
    }

    async fn courses_of_type(&self, course_type_id: &str) -> Result<Vec<CourseRecord>> {
        let models = course::Entity::find()
            .filter(course::Column::CourseTypeId.eq(course_type_id))
            .all(self.db)
            .await
            .map_err(store_err)?;
        Ok(records(models))
    }

    async fn classes_of_course(&self, course_id: &str) -> Result<Vec<ClassRecord>> {
        let models = class::Entity::find()
            .filter(class::Column::CourseId.eq(course_id))
            .all(self.db)
            .await
            .map_err(store_err)?;
        Ok(records(models))
    }

    async fn exams_of_course(&self, course_id: &str) -> Result<Vec<ExamRecord>> {
        let models = exam::Entity::find()
            .filter(exam::Column::CourseId.eq(course_id))
            .all(self.db)
            .await
            .map_err(store_err)?;
        Ok(records(models))
    }

    async fn subjects_of(
        &self,
        parent_kind: EntityKind,
        parent_id: &str,
    ) -> Result<Vec<SubjectRecord>> {
        let models = subject::Entity::find()
            .filter(subject::Column::ParentKind.eq(parent_kind))
            .filter(subject::Column::ParentId.eq(parent_id))
            .all(self.db)
            .await
            .map_err(store_err)?;
        Ok(records(models))
    }

    async fn topics_of_subject(&self, subject_id: &str) -> Result<Vec<TopicRecord>> {
        let models = topic::Entity::find()
            .filter(topic::Column::SubjectId.eq(subject_id))
            .all(self.db)
            .await
            .map_err(store_err)?;
        Ok(records(models))
    }

    async fn modules_of_topic(&self, topic_id: &str) -> Result<Vec<ModuleRecord>> {
        let models = module::Entity::find()
            .filter(module::Column::TopicId.eq(topic_id))
            .all(self.db)
            .await
            .map_err(store_err)?;
        Ok(records(models))
    }

    async fn chapters_of_module(&self, module_id: &str) -> Result<Vec<ChapterRecord>> {
        let models = chapter::Entity::find()
            .filter(chapter::Column::ModuleId.eq(module_id))
            .all(self.db)
            .await
            .map_err(store_err)?;
        Ok(records(models))
    }

    async fn question_count(&self, chapter_id: &str) -> Result<u64> {
        question::Entity::find()
            .filter(question::Column::ChapterId.eq(chapter_id))
            .filter(question::Column::IsActive.eq(true))
            .count(self.db)
            .await
            .map_err(store_err)
    }

    async fn pricing_row(
        &self,
        level: PricingLevel,
        entity_id: &str,
        tier: Tier,
    ) -> Result<Option<PricingRecord>> {
        let model = pricing_config::Entity::find()
            .filter(pricing_config::Column::Level.eq(level))
            .filter(pricing_config::Column::EntityId.eq(entity_id))
            .filter(pricing_config::Column::Tier.eq(tier))
            .one(self.db)
            .await
            .map_err(store_err)?;
        Ok(model.map(Into::into))
    }
}

#[async_trait]
impl<C: ConnectionTrait> PricingWrite for DbStore<'_, C> {
    async fn pricing_rows(
        &mut self,
        course_type_id: &str,
        level: PricingLevel,
    ) -> Result<Vec<PricingRecord>> {
        let models = pricing_config::Entity::find()
            .filter(pricing_config::Column::CourseTypeId.eq(course_type_id))
            .filter(pricing_config::Column::Level.eq(level))
            .all(self.db)
            .await
            .map_err(store_err)?;
        Ok(records(models))
    }

    async fn save_pricing(&mut self, row: &PricingRecord) -> Result<()> {
        pricing_config::ActiveModel::from(row)
            .update(self.db)
            .await
            .map_err(store_err)?;
        Ok(())
    }
}
