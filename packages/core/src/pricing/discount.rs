use chrono::NaiveDateTime;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::EduError;
use crate::model::OfferWindow;
use crate::Result;

/// Prices are stored and returned with two decimal places.
pub const CURRENCY_PRECISION: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountQuote {
    pub base_price: Decimal,
    pub discount_percent: i32,
    pub discount_amount: Decimal,
    pub final_price: Decimal,
    pub offer_active: bool,
}

pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CURRENCY_PRECISION, RoundingStrategy::MidpointAwayFromZero)
}

pub fn validate_base_price(base_price: Decimal) -> Result<()> {
    if base_price.is_sign_negative() && !base_price.is_zero() {
        return Err(EduError::validation(format!(
            "base price must not be negative, got {base_price}"
        )));
    }
    Ok(())
}

pub fn validate_discount_percent(discount_percent: i32) -> Result<()> {
    if !(0..=100).contains(&discount_percent) {
        return Err(EduError::validation(format!(
            "discount percent must be between 0 and 100, got {discount_percent}"
        )));
    }
    Ok(())
}

/// `base - base * percent / 100`, rounded to currency precision.
pub fn apply_discount(base_price: Decimal, discount_percent: i32) -> Decimal {
    let discount = base_price * Decimal::from(discount_percent) / Decimal::ONE_HUNDRED;
    round_currency(base_price - discount)
}

/// Computes the price a student pays right now.
///
/// Outside the offer window the discount does not apply and the final price
/// is the base price.
pub fn quote(
    base_price: Decimal,
    discount_percent: i32,
    window: &OfferWindow,
    now: NaiveDateTime,
) -> Result<DiscountQuote> {
    validate_base_price(base_price)?;
    validate_discount_percent(discount_percent)?;
    window.validate()?;

    let offer_active = window.is_active_at(now);
    let base_price = round_currency(base_price);
    let final_price = if offer_active {
        apply_discount(base_price, discount_percent)
    } else {
        base_price
    };

    Ok(DiscountQuote {
        base_price,
        discount_percent,
        discount_amount: base_price - final_price,
        final_price,
        offer_active,
    })
}
