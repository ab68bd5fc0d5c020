use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::discount::validate_discount_percent;
use crate::Result;
use crate::error::EduError;
use crate::model::{OfferWindow, PricingLevel, Tier};
use crate::store::PricingWrite;

/// Discount change applied to every pricing row of a course type and level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDiscountRequest {
    pub course_type_id: String,
    pub level: PricingLevel,
    /// Omitted tiers keep their rows untouched
    pub monthly_discount: Option<i32>,
    pub quarterly_discount: Option<i32>,
    pub yearly_discount: Option<i32>,
    #[serde(default)]
    pub window: OfferWindow,
    pub effective_date: Option<NaiveDateTime>,
}

impl BulkDiscountRequest {
    pub fn discount_for(&self, tier: Tier) -> Option<i32> {
        match tier {
            Tier::Monthly => self.monthly_discount,
            Tier::Quarterly => self.quarterly_discount,
            Tier::Yearly => self.yearly_discount,
        }
    }

    /// The window written to each row. The effective date fills in a missing
    /// start; an explicit `validFrom` wins.
    pub fn effective_window(&self) -> OfferWindow {
        OfferWindow {
            valid_from: self.window.valid_from.or(self.effective_date),
            valid_to: self.window.valid_to,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.course_type_id.trim().is_empty() {
            return Err(EduError::validation("courseTypeId must not be blank"));
        }

        let mut any = false;
        for tier in Tier::ALL {
            if let Some(percent) = self.discount_for(tier) {
                validate_discount_percent(percent)?;
                any = true;
            }
        }
        if !any {
            return Err(EduError::validation(
                "at least one tier discount must be provided",
            ));
        }

        self.effective_window().validate()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDiscountOutcome {
    pub updated: usize,
    pub monthly: usize,
    pub quarterly: usize,
    pub yearly: usize,
}

impl BulkDiscountOutcome {
    fn record(&mut self, tier: Tier) {
        self.updated += 1;
        match tier {
            Tier::Monthly => self.monthly += 1,
            Tier::Quarterly => self.quarterly += 1,
            Tier::Yearly => self.yearly += 1,
        }
    }
}

/// Applies the discount to every matching row through `tx`.
///
/// The caller owns the transaction: commit only when this returns `Ok`. Any
/// error leaves the batch uncommitted so either every row changes or none.
pub async fn apply_bulk_discount<W: PricingWrite + ?Sized>(
    tx: &mut W,
    request: &BulkDiscountRequest,
    now: NaiveDateTime,
) -> Result<BulkDiscountOutcome> {
    request.validate()?;
    let window = request.effective_window();

    let rows = tx
        .pricing_rows(&request.course_type_id, request.level)
        .await?;

    let mut outcome = BulkDiscountOutcome::default();
    for mut row in rows {
        let Some(percent) = request.discount_for(row.tier) else {
            continue;
        };

        row.discount_percent = percent;
        row.valid_from = window.valid_from;
        row.valid_to = window.valid_to;
        row.updated_at = now;

        tx.save_pricing(&row).await.inspect_err(|e| {
            tracing::warn!(pricing_id = %row.id, error = %e, "Bulk discount row failed");
        })?;
        outcome.record(row.tier);
    }

    tracing::info!(
        course_type_id = %request.course_type_id,
        level = request.level.as_str(),
        updated = outcome.updated,
        "Bulk discount applied"
    );

    Ok(outcome)
}
