//! Creates missing tables from the entity definitions.
//!
//! Meant for development and fresh deployments; it never alters existing
//! tables.

use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Schema};

use crate::entity::{
    chapter, class, course, course_type, exam, gateway_event, module, online_test, pricing_config,
    question, subject, subscription, test_attempt, topic,
};

async fn create_table<E: EntityTrait>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr> {
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(db.get_database_backend().build(&stmt)).await?;
    Ok(())
}

pub async fn sync_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    // Parents before children so foreign keys resolve
    create_table(db, &schema, course_type::Entity).await?;
    create_table(db, &schema, course::Entity).await?;
    create_table(db, &schema, class::Entity).await?;
    create_table(db, &schema, exam::Entity).await?;
    create_table(db, &schema, subject::Entity).await?;
    create_table(db, &schema, topic::Entity).await?;
    create_table(db, &schema, module::Entity).await?;
    create_table(db, &schema, chapter::Entity).await?;
    create_table(db, &schema, question::Entity).await?;
    create_table(db, &schema, pricing_config::Entity).await?;
    create_table(db, &schema, subscription::Entity).await?;
    create_table(db, &schema, online_test::Entity).await?;
    create_table(db, &schema, test_attempt::Entity).await?;
    create_table(db, &schema, gateway_event::Entity).await?;

    let pricing_key = Index::create()
        .if_not_exists()
        .name("PricingConfig_level_entityId_tier_key")
        .table(pricing_config::Entity)
        .col(pricing_config::Column::Level)
        .col(pricing_config::Column::EntityId)
        .col(pricing_config::Column::Tier)
        .unique()
        .to_owned();
    db.execute(db.get_database_backend().build(&pricing_key))
        .await?;

    tracing::info!("Database schema synchronised");
    Ok(())
}
