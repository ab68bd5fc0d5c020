//! `SeaORM` Entity for student subscriptions

use eduhub::model::{EntityKind, PaymentStatus, Tier};
use eduhub::subscription::SubscriptionRecord;
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(schema_name = "public", table_name = "Subscription")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_name = "userId", column_type = "Text")]
    pub user_id: String,
    #[sea_orm(column_name = "courseTypeId", column_type = "Text")]
    pub course_type_id: String,
    #[sea_orm(column_name = "entityType")]
    pub entity_kind: EntityKind,
    #[sea_orm(column_name = "entityId", column_type = "Text")]
    pub entity_id: String,
    pub tier: Tier,
    /// Amount charged, after discount
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,
    #[sea_orm(column_type = "Text")]
    pub currency: String,
    pub status: PaymentStatus,
    #[sea_orm(column_name = "gatewayOrderId", column_type = "Text", nullable, unique)]
    pub gateway_order_id: Option<String>,
    #[sea_orm(column_name = "gatewayPaymentId", column_type = "Text", nullable)]
    pub gateway_payment_id: Option<String>,
    #[sea_orm(column_name = "startsAt", nullable)]
    pub starts_at: Option<DateTime>,
    #[sea_orm(column_name = "endsAt", nullable)]
    pub ends_at: Option<DateTime>,
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTime,
    #[sea_orm(column_name = "updatedAt")]
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for SubscriptionRecord {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            course_type_id: m.course_type_id,
            entity_kind: m.entity_kind,
            entity_id: m.entity_id,
            tier: m.tier,
            amount: m.amount,
            currency: m.currency,
            status: m.status,
            gateway_order_id: m.gateway_order_id,
            gateway_payment_id: m.gateway_payment_id,
            starts_at: m.starts_at,
            ends_at: m.ends_at,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<&SubscriptionRecord> for ActiveModel {
    fn from(r: &SubscriptionRecord) -> Self {
        Self {
            id: Set(r.id.clone()),
            user_id: Set(r.user_id.clone()),
            course_type_id: Set(r.course_type_id.clone()),
            entity_kind: Set(r.entity_kind),
            entity_id: Set(r.entity_id.clone()),
            tier: Set(r.tier),
            amount: Set(r.amount),
            currency: Set(r.currency.clone()),
            status: Set(r.status),
            gateway_order_id: Set(r.gateway_order_id.clone()),
            gateway_payment_id: Set(r.gateway_payment_id.clone()),
            starts_at: Set(r.starts_at),
            ends_at: Set(r.ends_at),
            created_at: Set(r.created_at),
            updated_at: Set(r.updated_at),
        }
    }
}
