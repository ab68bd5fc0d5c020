//! Pricing: discount calculation, tier resolution and bulk discount updates.

pub mod bulk;
pub mod discount;
pub mod resolver;

pub use bulk::{BulkDiscountOutcome, BulkDiscountRequest, apply_bulk_discount};
pub use discount::{DiscountQuote, apply_discount, quote, round_currency};
pub use resolver::{
    PricingDropdownEntry, ResolvedPrice, TierPricing, course_type_of, pricing_dropdown,
    resolve_course_type_defaults, resolve_price, resolve_tiers,
};

#[cfg(test)]
mod tests;
