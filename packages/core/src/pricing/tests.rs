use chrono::Duration;
use rust_decimal::Decimal;

use super::*;
use crate::error::EduError;
use crate::fixtures::*;
use crate::model::*;
use crate::store::{CatalogueRead, MemoryStore, MemoryTransaction, PricingWrite};

fn academic_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.put_course_type(course_type("ct", CourseTypeKind::Academic));
    store.put_course(course("c1", "ct", 0));
    store.put_class(class("cl1", "c1", 0));
    store.put_class(class("cl2", "c1", 1));
    store
}

#[tokio::test]
async fn test_entity_pricing_is_set() {
    let store = academic_store();
    store.put_pricing(pricing("p1", "ct", PricingLevel::Class, "cl1", Tier::Monthly, 1000, 20));

    let sellable = SellableRef::new(EntityKind::Class, "cl1");
    let price = resolve_price(&store, &sellable, Tier::Monthly, ts()).await.unwrap();

    assert_eq!(price.status, PricingStatus::Set);
    assert_eq!(price.final_price, Some(Decimal::new(800, 0)));
    assert_eq!(price.pricing_id.as_deref(), Some("p1"));
    assert!(price.offer_active);
}

#[tokio::test]
async fn test_falls_back_to_course_type_default() {
    let store = academic_store();
    store.put_pricing(pricing(
        "d1",
        "ct",
        PricingLevel::CourseType,
        "ct",
        Tier::Monthly,
        500,
        0,
    ));

    let sellable = SellableRef::new(EntityKind::Class, "cl1");
    let price = resolve_price(&store, &sellable, Tier::Monthly, ts()).await.unwrap();

    assert_eq!(price.status, PricingStatus::Default);
    assert_eq!(price.final_price, Some(Decimal::new(500, 0)));
    assert_eq!(price.base_price, Some(Decimal::new(500, 0)));
}

#[tokio::test]
async fn test_override_beats_default() {
    let store = academic_store();
    store.put_pricing(pricing("d1", "ct", PricingLevel::CourseType, "ct", Tier::Yearly, 500, 0));
    store.put_pricing(pricing("p1", "ct", PricingLevel::Class, "cl1", Tier::Yearly, 900, 0));

    let sellable = SellableRef::new(EntityKind::Class, "cl1");
    let price = resolve_price(&store, &sellable, Tier::Yearly, ts()).await.unwrap();
    assert_eq!(price.status, PricingStatus::Set);
    assert_eq!(price.final_price, Some(Decimal::new(900, 0)));

    let other = SellableRef::new(EntityKind::Class, "cl2");
    let price = resolve_price(&store, &other, Tier::Yearly, ts()).await.unwrap();
    assert_eq!(price.status, PricingStatus::Default);
}

#[tokio::test]
async fn test_missing_pricing_is_not_set_not_error() {
    let store = academic_store();
    let sellable = SellableRef::new(EntityKind::Class, "cl1");

    let price = resolve_price(&store, &sellable, Tier::Quarterly, ts()).await.unwrap();
    assert_eq!(price, ResolvedPrice::not_set(Tier::Quarterly));
    assert!(!price.is_set());
}

#[tokio::test]
async fn test_unknown_entity_is_not_found() {
    let store = academic_store();
    let sellable = SellableRef::new(EntityKind::Exam, "missing");

    let err = resolve_price(&store, &sellable, Tier::Monthly, ts()).await.unwrap_err();
    assert!(matches!(err, EduError::NotFound { entity: "exam", .. }));
}

#[tokio::test]
async fn test_resolution_is_idempotent() {
    let store = academic_store();
    store.put_pricing(pricing("p1", "ct", PricingLevel::Class, "cl1", Tier::Monthly, 750, 15));
    store.put_pricing(pricing("d1", "ct", PricingLevel::CourseType, "ct", Tier::Yearly, 5000, 5));

    let sellable = SellableRef::new(EntityKind::Class, "cl1");
    let first = resolve_tiers(&store, &sellable, ts()).await.unwrap();
    let second = resolve_tiers(&store, &sellable, ts()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.get(Tier::Monthly).status, PricingStatus::Set);
    assert_eq!(first.get(Tier::Quarterly).status, PricingStatus::NotSet);
    assert_eq!(first.get(Tier::Yearly).status, PricingStatus::Default);
}

#[tokio::test]
async fn test_expired_offer_charges_base_price() {
    let store = academic_store();
    let mut row = pricing("p1", "ct", PricingLevel::Class, "cl1", Tier::Monthly, 1000, 50);
    row.valid_from = Some(ts() - Duration::days(30));
    row.valid_to = Some(ts() - Duration::days(1));
    store.put_pricing(row);

    let sellable = SellableRef::new(EntityKind::Class, "cl1");
    let price = resolve_price(&store, &sellable, Tier::Monthly, ts()).await.unwrap();

    assert_eq!(price.status, PricingStatus::Set);
    assert!(!price.offer_active);
    assert_eq!(price.final_price, Some(Decimal::new(1000, 0)));
}

#[tokio::test]
async fn test_dropdown_reports_status_per_entity() {
    let store = academic_store();
    store.put_pricing(pricing("p1", "ct", PricingLevel::Class, "cl2", Tier::Monthly, 100, 0));
    store.put_pricing(pricing("d1", "ct", PricingLevel::CourseType, "ct", Tier::Monthly, 50, 0));

    let entries = pricing_dropdown(&store, "ct", PricingLevel::Class, ts()).await.unwrap();
    let ids: Vec<&str> = entries.iter().map(|e| e.entity_id.as_str()).collect();
    assert_eq!(ids, vec!["cl1", "cl2"]);
    assert_eq!(entries[0].pricing.monthly.status, PricingStatus::Default);
    assert_eq!(entries[1].pricing.monthly.status, PricingStatus::Set);
    assert_eq!(entries[1].pricing.yearly.status, PricingStatus::NotSet);

    let defaults = pricing_dropdown(&store, "ct", PricingLevel::CourseType, ts())
        .await
        .unwrap();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].pricing.monthly.status, PricingStatus::Set);
    assert_eq!(defaults[0].pricing.quarterly.status, PricingStatus::NotSet);
}

fn bulk_store(rows: usize) -> MemoryStore {
    let store = academic_store();
    for i in 0..rows {
        let tier = Tier::ALL[i % 3];
        store.put_pricing(pricing(
            &format!("p{i:02}"),
            "ct",
            PricingLevel::Class,
            &format!("cl{i}"),
            tier,
            1000,
            0,
        ));
    }
    // Different level, must not be touched
    store.put_pricing(pricing("other", "ct", PricingLevel::CourseType, "ct", Tier::Monthly, 10, 0));
    store
}

fn bulk_request() -> BulkDiscountRequest {
    BulkDiscountRequest {
        course_type_id: "ct".to_string(),
        level: PricingLevel::Class,
        monthly_discount: Some(10),
        quarterly_discount: Some(20),
        yearly_discount: Some(30),
        window: OfferWindow::new(Some(ts()), Some(ts() + Duration::days(7))),
        effective_date: None,
    }
}

#[tokio::test]
async fn test_bulk_updates_every_row() {
    let store = bulk_store(6);
    let mut tx = store.begin();
    let outcome = apply_bulk_discount(&mut tx, &bulk_request(), ts()).await.unwrap();
    tx.commit();

    assert_eq!(outcome.updated, 6);
    assert_eq!((outcome.monthly, outcome.quarterly, outcome.yearly), (2, 2, 2));

    for row in store.all_pricing() {
        if row.id == "other" {
            assert_eq!(row.discount_percent, 0);
            continue;
        }
        let expected = match row.tier {
            Tier::Monthly => 10,
            Tier::Quarterly => 20,
            Tier::Yearly => 30,
        };
        assert_eq!(row.discount_percent, expected);
        assert_eq!(row.valid_to, Some(ts() + Duration::days(7)));
    }

    // Reads see the new discount right away
    let sellable = SellableRef::new(EntityKind::Class, "cl0");
    store.put_class(class("cl0", "c1", 5));
    let price = resolve_price(&store, &sellable, Tier::Monthly, ts()).await.unwrap();
    assert_eq!(price.final_price, Some(Decimal::new(900, 0)));
}

/// Fails the nth save, standing in for a row the database rejects.
struct FailingTx {
    inner: MemoryTransaction,
    fail_at: usize,
    saves: usize,
}

#[async_trait::async_trait]
impl PricingWrite for FailingTx {
    async fn pricing_rows(
        &mut self,
        course_type_id: &str,
        level: PricingLevel,
    ) -> crate::Result<Vec<PricingRecord>> {
        self.inner.pricing_rows(course_type_id, level).await
    }

    async fn save_pricing(&mut self, row: &PricingRecord) -> crate::Result<()> {
        self.saves += 1;
        if self.saves == self.fail_at {
            return Err(EduError::store(format!("forced failure on {}", row.id)));
        }
        self.inner.save_pricing(row).await
    }
}

#[tokio::test]
async fn test_bulk_failure_on_last_row_updates_nothing() {
    let rows = 5;
    let store = bulk_store(rows);
    let before = store.all_pricing();

    let mut tx = FailingTx {
        inner: store.begin(),
        fail_at: rows,
        saves: 0,
    };
    let result = apply_bulk_discount(&mut tx, &bulk_request(), ts()).await;
    assert!(matches!(result, Err(EduError::Store(_))));
    assert_eq!(tx.saves, rows);

    // Staged rows before the failure are visible only inside the transaction
    let staged = tx.inner.pricing_row(PricingLevel::Class, "cl0", Tier::Monthly).await.unwrap();
    assert_eq!(staged.map(|r| r.discount_percent), Some(10));

    tx.inner.rollback();
    assert_eq!(store.all_pricing(), before);
}

#[tokio::test]
async fn test_bulk_skips_omitted_tiers() {
    let store = bulk_store(3);
    let mut request = bulk_request();
    request.quarterly_discount = None;
    request.yearly_discount = None;

    let mut tx = store.begin();
    let outcome = apply_bulk_discount(&mut tx, &request, ts()).await.unwrap();
    tx.commit();

    assert_eq!(outcome.updated, 1);
    let yearly = store.pricing("p02").unwrap();
    assert_eq!(yearly.discount_percent, 0);
    assert_eq!(yearly.valid_from, None);
}

#[tokio::test]
async fn test_bulk_rejects_invalid_requests() {
    let store = bulk_store(3);

    let mut request = bulk_request();
    request.monthly_discount = Some(120);
    let mut tx = store.begin();
    assert!(matches!(
        apply_bulk_discount(&mut tx, &request, ts()).await,
        Err(EduError::Validation(_))
    ));

    let mut request = bulk_request();
    request.window = OfferWindow::new(Some(ts()), Some(ts() - Duration::days(1)));
    assert!(apply_bulk_discount(&mut tx, &request, ts()).await.is_err());

    let mut request = bulk_request();
    request.monthly_discount = None;
    request.quarterly_discount = None;
    request.yearly_discount = None;
    assert!(apply_bulk_discount(&mut tx, &request, ts()).await.is_err());
}

#[test]
fn test_effective_date_fills_missing_start() {
    let mut request = bulk_request();
    request.window.valid_from = None;
    request.effective_date = Some(ts() + Duration::days(1));
    assert_eq!(request.effective_window().valid_from, Some(ts() + Duration::days(1)));

    let mut request = bulk_request();
    request.effective_date = Some(ts() + Duration::days(3));
    assert_eq!(request.effective_window().valid_from, Some(ts()));
}
