//! `SeaORM` Entity for pricing rows
//!
//! One row per (level, entity, tier). Rows at the `COURSE_TYPE` level are the
//! defaults for every sellable entity of that course type.

use eduhub::model::{PricingLevel, PricingRecord, Tier};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(schema_name = "public", table_name = "PricingConfig")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_name = "courseTypeId", column_type = "Text")]
    pub course_type_id: String,
    pub level: PricingLevel,
    #[sea_orm(column_name = "entityId", column_type = "Text")]
    pub entity_id: String,
    pub tier: Tier,
    #[sea_orm(column_name = "basePrice", column_type = "Decimal(Some((12, 2)))")]
    pub base_price: Decimal,
    /// 0 to 100
    #[sea_orm(column_name = "discountPercent")]
    pub discount_percent: i32,
    #[sea_orm(column_name = "validFrom", nullable)]
    pub valid_from: Option<DateTime>,
    #[sea_orm(column_name = "validTo", nullable)]
    pub valid_to: Option<DateTime>,
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTime,
    #[sea_orm(column_name = "updatedAt")]
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::course_type::Entity",
        from = "Column::CourseTypeId",
        to = "super::course_type::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    CourseType,
}

impl Related<super::course_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CourseType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for PricingRecord {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            course_type_id: m.course_type_id,
            level: m.level,
            entity_id: m.entity_id,
            tier: m.tier,
            base_price: m.base_price,
            discount_percent: m.discount_percent,
            valid_from: m.valid_from,
            valid_to: m.valid_to,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<&PricingRecord> for ActiveModel {
    fn from(r: &PricingRecord) -> Self {
        Self {
            id: Set(r.id.clone()),
            course_type_id: Set(r.course_type_id.clone()),
            level: Set(r.level),
            entity_id: Set(r.entity_id.clone()),
            tier: Set(r.tier),
            base_price: Set(r.base_price),
            discount_percent: Set(r.discount_percent),
            valid_from: Set(r.valid_from),
            valid_to: Set(r.valid_to),
            created_at: Set(r.created_at),
            updated_at: Set(r.updated_at),
        }
    }
}
