use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::discount::quote;
use crate::Result;
use crate::error::EduError;
use crate::model::{
    EntityKind, PricingLevel, PricingRecord, PricingStatus, SellableRef, Tier,
};
use crate::store::CatalogueRead;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPrice {
    pub tier: Tier,
    pub status: PricingStatus,
    pub pricing_id: Option<String>,
    pub base_price: Option<Decimal>,
    pub discount_percent: Option<i32>,
    pub final_price: Option<Decimal>,
    pub offer_active: bool,
    pub valid_from: Option<NaiveDateTime>,
    pub valid_to: Option<NaiveDateTime>,
}

impl ResolvedPrice {
    pub fn not_set(tier: Tier) -> Self {
        Self {
            tier,
            status: PricingStatus::NotSet,
            pricing_id: None,
            base_price: None,
            discount_percent: None,
            final_price: None,
            offer_active: false,
            valid_from: None,
            valid_to: None,
        }
    }

    fn from_row(row: &PricingRecord, status: PricingStatus, now: NaiveDateTime) -> Result<Self> {
        let quote = quote(row.base_price, row.discount_percent, &row.window(), now)?;
        Ok(Self {
            tier: row.tier,
            status,
            pricing_id: Some(row.id.clone()),
            base_price: Some(quote.base_price),
            discount_percent: Some(row.discount_percent),
            final_price: Some(quote.final_price),
            offer_active: quote.offer_active,
            valid_from: row.valid_from,
            valid_to: row.valid_to,
        })
    }

    pub fn is_set(&self) -> bool {
        self.status != PricingStatus::NotSet
    }
}

/// Resolved prices for every tier of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierPricing {
    pub monthly: ResolvedPrice,
    pub quarterly: ResolvedPrice,
    pub yearly: ResolvedPrice,
}

impl TierPricing {
    pub fn get(&self, tier: Tier) -> &ResolvedPrice {
        match tier {
            Tier::Monthly => &self.monthly,
            Tier::Quarterly => &self.quarterly,
            Tier::Yearly => &self.yearly,
        }
    }
}

/// Looks up the course type a sellable entity belongs to.
pub async fn course_type_of<R: CatalogueRead + ?Sized>(
    reader: &R,
    sellable: &SellableRef,
) -> Result<String> {
    let course_id = match sellable.kind {
        EntityKind::Course => sellable.id.clone(),
        EntityKind::Class => {
            reader
                .class(&sellable.id)
                .await?
                .ok_or_else(|| EduError::not_found("class", &sellable.id))?
                .course_id
        }
        EntityKind::Exam => {
            reader
                .exam(&sellable.id)
                .await?
                .ok_or_else(|| EduError::not_found("exam", &sellable.id))?
                .course_id
        }
    };

    let course = reader
        .course(&course_id)
        .await?
        .ok_or_else(|| EduError::not_found("course", &course_id))?;

    Ok(course.course_type_id)
}

/// Resolution when the course type is already known.
///
/// Entity-specific row first, then the course-type default, else `NOT_SET`.
pub async fn resolve_in_course_type<R: CatalogueRead + ?Sized>(
    reader: &R,
    sellable: &SellableRef,
    course_type_id: &str,
    tier: Tier,
    now: NaiveDateTime,
) -> Result<ResolvedPrice> {
    let level = PricingLevel::from(sellable.kind);

    if let Some(row) = reader.pricing_row(level, &sellable.id, tier).await? {
        return ResolvedPrice::from_row(&row, PricingStatus::Set, now);
    }

    if let Some(row) = reader
        .pricing_row(PricingLevel::CourseType, course_type_id, tier)
        .await?
    {
        return ResolvedPrice::from_row(&row, PricingStatus::Default, now);
    }

    Ok(ResolvedPrice::not_set(tier))
}

pub async fn resolve_price<R: CatalogueRead + ?Sized>(
    reader: &R,
    sellable: &SellableRef,
    tier: Tier,
    now: NaiveDateTime,
) -> Result<ResolvedPrice> {
    let course_type_id = course_type_of(reader, sellable).await?;
    resolve_in_course_type(reader, sellable, &course_type_id, tier, now).await
}

pub async fn resolve_tiers_in_course_type<R: CatalogueRead + ?Sized>(
    reader: &R,
    sellable: &SellableRef,
    course_type_id: &str,
    now: NaiveDateTime,
) -> Result<TierPricing> {
    Ok(TierPricing {
        monthly: resolve_in_course_type(reader, sellable, course_type_id, Tier::Monthly, now)
            .await?,
        quarterly: resolve_in_course_type(reader, sellable, course_type_id, Tier::Quarterly, now)
            .await?,
        yearly: resolve_in_course_type(reader, sellable, course_type_id, Tier::Yearly, now)
            .await?,
    })
}

pub async fn resolve_tiers<R: CatalogueRead + ?Sized>(
    reader: &R,
    sellable: &SellableRef,
    now: NaiveDateTime,
) -> Result<TierPricing> {
    let course_type_id = course_type_of(reader, sellable).await?;
    resolve_tiers_in_course_type(reader, sellable, &course_type_id, now).await
}

async fn course_type_default<R: CatalogueRead + ?Sized>(
    reader: &R,
    course_type_id: &str,
    tier: Tier,
    now: NaiveDateTime,
) -> Result<ResolvedPrice> {
    match reader
        .pricing_row(PricingLevel::CourseType, course_type_id, tier)
        .await?
    {
        Some(row) => ResolvedPrice::from_row(&row, PricingStatus::Set, now),
        None => Ok(ResolvedPrice::not_set(tier)),
    }
}

/// Course-type default rows only; there is nothing to fall back to.
pub async fn resolve_course_type_defaults<R: CatalogueRead + ?Sized>(
    reader: &R,
    course_type_id: &str,
    now: NaiveDateTime,
) -> Result<TierPricing> {
    Ok(TierPricing {
        monthly: course_type_default(reader, course_type_id, Tier::Monthly, now).await?,
        quarterly: course_type_default(reader, course_type_id, Tier::Quarterly, now).await?,
        yearly: course_type_default(reader, course_type_id, Tier::Yearly, now).await?,
    })
}

/// One entry of the admin pricing dropdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingDropdownEntry {
    pub level: PricingLevel,
    pub entity_id: String,
    pub name: String,
    pub pricing: TierPricing,
}

/// Every entity of a level under a course type with the status of its
/// pricing per tier, so admins can see where an override exists.
pub async fn pricing_dropdown<R: CatalogueRead + ?Sized>(
    reader: &R,
    course_type_id: &str,
    level: PricingLevel,
    now: NaiveDateTime,
) -> Result<Vec<PricingDropdownEntry>> {
    let course_type = reader
        .course_type(course_type_id)
        .await?
        .ok_or_else(|| EduError::not_found("course type", course_type_id))?;

    if level == PricingLevel::CourseType {
        return Ok(vec![PricingDropdownEntry {
            level,
            entity_id: course_type.id.clone(),
            name: course_type.name.clone(),
            pricing: resolve_course_type_defaults(reader, &course_type.id, now).await?,
        }]);
    }

    let mut courses = reader.courses_of_type(course_type_id).await?;
    crate::model::sort_by_display_order(&mut courses);

    let mut entries = Vec::new();
    for course in courses {
        let targets: Vec<(SellableRef, String)> = match level {
            PricingLevel::Course => {
                vec![(SellableRef::new(EntityKind::Course, &course.id), course.name.clone())]
            }
            PricingLevel::Class => {
                let mut classes = reader.classes_of_course(&course.id).await?;
                crate::model::sort_by_display_order(&mut classes);
                classes
                    .into_iter()
                    .map(|c| (SellableRef::new(EntityKind::Class, c.id), c.name))
                    .collect()
            }
            PricingLevel::Exam => {
                let mut exams = reader.exams_of_course(&course.id).await?;
                crate::model::sort_by_display_order(&mut exams);
                exams
                    .into_iter()
                    .map(|e| (SellableRef::new(EntityKind::Exam, e.id), e.name))
                    .collect()
            }
            PricingLevel::CourseType => Vec::new(),
        };

        for (sellable, name) in targets {
            let pricing =
                resolve_tiers_in_course_type(reader, &sellable, course_type_id, now).await?;
            entries.push(PricingDropdownEntry {
                level,
                entity_id: sellable.id,
                name,
                pricing,
            });
        }
    }

    Ok(entries)
}
