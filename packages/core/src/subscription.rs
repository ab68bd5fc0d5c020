//! Subscription lifecycle: checkout pricing, payment status transitions and
//! access windows.

use chrono::{Months, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::error::EduError;
use crate::model::{EntityKind, PaymentStatus, SellableRef, Tier};
use crate::pricing::resolver::{ResolvedPrice, course_type_of, resolve_in_course_type};
use crate::store::CatalogueRead;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    pub id: String,
    pub user_id: String,
    pub course_type_id: String,
    pub entity_kind: EntityKind,
    pub entity_id: String,
    pub tier: Tier,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub starts_at: Option<NaiveDateTime>,
    pub ends_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl SubscriptionRecord {
    pub fn sellable(&self) -> SellableRef {
        SellableRef::new(self.entity_kind, &self.entity_id)
    }

    /// Paid and inside its access window.
    pub fn grants_access_at(&self, now: NaiveDateTime) -> bool {
        if self.status != PaymentStatus::Paid {
            return false;
        }
        match (self.starts_at, self.ends_at) {
            (Some(start), Some(end)) => start <= now && now < end,
            _ => false,
        }
    }

    /// Marks the subscription paid and opens its access window.
    ///
    /// Returns `false` when it was already paid; the stored window is kept.
    pub fn mark_paid(&mut self, payment_id: Option<String>, now: NaiveDateTime) -> Result<bool> {
        if !transition(self.status, PaymentStatus::Paid)? {
            return Ok(false);
        }
        let (starts_at, ends_at) = access_window(self.tier, now)?;
        self.status = PaymentStatus::Paid;
        if payment_id.is_some() {
            self.gateway_payment_id = payment_id;
        }
        self.starts_at = Some(starts_at);
        self.ends_at = Some(ends_at);
        self.updated_at = now;
        Ok(true)
    }

    pub fn mark_failed(&mut self, payment_id: Option<String>, now: NaiveDateTime) -> Result<bool> {
        if !transition(self.status, PaymentStatus::Failed)? {
            return Ok(false);
        }
        self.status = PaymentStatus::Failed;
        if payment_id.is_some() {
            self.gateway_payment_id = payment_id;
        }
        self.updated_at = now;
        Ok(true)
    }
}

/// Checks a payment status change.
///
/// `Ok(true)` means the status changes, `Ok(false)` that it is a repeat of a
/// terminal `Paid` and nothing should happen.
pub fn transition(from: PaymentStatus, to: PaymentStatus) -> Result<bool> {
    use PaymentStatus::*;

    match (from, to) {
        (Pending, Paid) | (Pending, Failed) | (Failed, Paid) => Ok(true),
        (Paid, Paid) => Ok(false),
        _ => Err(EduError::InvalidTransition { from, to }),
    }
}

/// `[start, start + tier months)`
pub fn access_window(tier: Tier, start: NaiveDateTime) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let end = start
        .checked_add_months(Months::new(tier.months()))
        .ok_or_else(|| EduError::validation("access window end is out of range"))?;
    Ok((start, end))
}

/// Converts a currency amount to the gateway's minor units (paise, cents).
pub fn to_minor_units(amount: Decimal) -> Result<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .ok_or_else(|| EduError::validation(format!("amount {amount} is out of range")))
}

/// What a student is about to pay for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutQuote {
    pub sellable: SellableRef,
    pub course_type_id: String,
    pub tier: Tier,
    pub price: ResolvedPrice,
    pub amount: Decimal,
    pub amount_minor: i64,
}

impl CheckoutQuote {
    /// Free subscriptions skip the gateway.
    pub fn requires_payment(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

pub async fn checkout_quote<R: CatalogueRead + ?Sized>(
    reader: &R,
    sellable: &SellableRef,
    tier: Tier,
    now: NaiveDateTime,
) -> Result<CheckoutQuote> {
    let course_type_id = course_type_of(reader, sellable).await?;
    let price = resolve_in_course_type(reader, sellable, &course_type_id, tier, now).await?;

    let amount = price.final_price.ok_or_else(|| {
        EduError::PricingNotSet(format!(
            "{} {} has no {} price",
            sellable.kind.as_str(),
            sellable.id,
            tier.as_str()
        ))
    })?;

    Ok(CheckoutQuote {
        sellable: sellable.clone(),
        course_type_id,
        tier,
        amount,
        amount_minor: to_minor_units(amount)?,
        price,
    })
}

/// Rejects a checkout when the student already holds live access to the same
/// entity and tier.
pub fn ensure_no_active_duplicate<'a>(
    existing: impl IntoIterator<Item = &'a SubscriptionRecord>,
    sellable: &SellableRef,
    tier: Tier,
    now: NaiveDateTime,
) -> Result<()> {
    let duplicate = existing.into_iter().any(|s| {
        s.entity_kind == sellable.kind
            && s.entity_id == sellable.id
            && s.tier == tier
            && s.grants_access_at(now)
    });

    if duplicate {
        return Err(EduError::Conflict(format!(
            "already subscribed to {} {} ({})",
            sellable.kind.as_str(),
            sellable.id,
            tier.as_str()
        )));
    }
    Ok(())
}
