//! Catalogue, pricing and subscription records.
//!
//! These are the shapes the core logic works on. Storage backends convert
//! their rows into these records; the HTTP layer serialises them directly.

use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EduError;

macro_rules! string_enum {
    ($name:ident { $($variant:ident => $value:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = EduError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_uppercase().as_str() {
                    $($value => Ok(Self::$variant),)+
                    other => Err(EduError::validation(format!(
                        "invalid {}: {}",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

/// Top-level classification deciding which child hierarchy a course uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "sea-orm", derive(sea_orm::EnumIter, sea_orm::DeriveActiveEnum))]
#[cfg_attr(feature = "sea-orm", sea_orm(rs_type = "String", db_type = "Text"))]
pub enum CourseTypeKind {
    /// Course → Class → Subject
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ACADEMIC"))]
    Academic,
    /// Course → Exam → Subject
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "COMPETITIVE"))]
    Competitive,
    /// Course → Subject
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "PROFESSIONAL"))]
    Professional,
}

string_enum!(CourseTypeKind {
    Academic => "ACADEMIC",
    Competitive => "COMPETITIVE",
    Professional => "PROFESSIONAL",
});

impl CourseTypeKind {
    /// The entity kind subjects hang off for this course type.
    pub fn subject_parent(&self) -> EntityKind {
        match self {
            Self::Academic => EntityKind::Class,
            Self::Competitive => EntityKind::Exam,
            Self::Professional => EntityKind::Course,
        }
    }

    /// The entity kind a student subscribes to for this course type.
    pub fn sellable(&self) -> EntityKind {
        self.subject_parent()
    }
}

/// Subscription billing period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "sea-orm", derive(sea_orm::EnumIter, sea_orm::DeriveActiveEnum))]
#[cfg_attr(feature = "sea-orm", sea_orm(rs_type = "String", db_type = "Text"))]
pub enum Tier {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "MONTHLY"))]
    Monthly,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "QUARTERLY"))]
    Quarterly,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "YEARLY"))]
    Yearly,
}

string_enum!(Tier {
    Monthly => "MONTHLY",
    Quarterly => "QUARTERLY",
    Yearly => "YEARLY",
});

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Monthly, Tier::Quarterly, Tier::Yearly];

    pub fn months(&self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Quarterly => 3,
            Self::Yearly => 12,
        }
    }
}

/// Course, class or exam. Used for sellable references and for the
/// discriminated parent link of subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "sea-orm", derive(sea_orm::EnumIter, sea_orm::DeriveActiveEnum))]
#[cfg_attr(feature = "sea-orm", sea_orm(rs_type = "String", db_type = "Text"))]
pub enum EntityKind {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "COURSE"))]
    Course,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "CLASS"))]
    Class,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "EXAM"))]
    Exam,
}

string_enum!(EntityKind {
    Course => "COURSE",
    Class => "CLASS",
    Exam => "EXAM",
});

/// What a pricing row is attached to. Course-type rows are the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "sea-orm", derive(sea_orm::EnumIter, sea_orm::DeriveActiveEnum))]
#[cfg_attr(feature = "sea-orm", sea_orm(rs_type = "String", db_type = "Text"))]
pub enum PricingLevel {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "COURSE_TYPE"))]
    CourseType,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "COURSE"))]
    Course,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "CLASS"))]
    Class,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "EXAM"))]
    Exam,
}

string_enum!(PricingLevel {
    CourseType => "COURSE_TYPE",
    Course => "COURSE",
    Class => "CLASS",
    Exam => "EXAM",
});

impl From<EntityKind> for PricingLevel {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Course => Self::Course,
            EntityKind::Class => Self::Class,
            EntityKind::Exam => Self::Exam,
        }
    }
}

/// Whether a price came from an override, the course-type default, or nowhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PricingStatus {
    Set,
    Default,
    NotSet,
}

string_enum!(PricingStatus {
    Set => "SET",
    Default => "DEFAULT",
    NotSet => "NOT_SET",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "sea-orm", derive(sea_orm::EnumIter, sea_orm::DeriveActiveEnum))]
#[cfg_attr(feature = "sea-orm", sea_orm(rs_type = "String", db_type = "Text"))]
pub enum PaymentStatus {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "PENDING"))]
    Pending,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "PAID"))]
    Paid,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "FAILED"))]
    Failed,
}

string_enum!(PaymentStatus {
    Pending => "PENDING",
    Paid => "PAID",
    Failed => "FAILED",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "sea-orm", derive(sea_orm::EnumIter, sea_orm::DeriveActiveEnum))]
#[cfg_attr(feature = "sea-orm", sea_orm(rs_type = "String", db_type = "Text"))]
pub enum Difficulty {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "EASY"))]
    Easy,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "MEDIUM"))]
    Medium,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "HARD"))]
    Hard,
}

string_enum!(Difficulty {
    Easy => "EASY",
    Medium => "MEDIUM",
    Hard => "HARD",
});

/// A course, class or exam a student can subscribe to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellableRef {
    pub kind: EntityKind,
    pub id: String,
}

impl SellableRef {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

/// Children are listed by display order, ties broken by id.
pub trait DisplayOrdered {
    fn display_order(&self) -> i32;
    fn id(&self) -> &str;
    fn is_active(&self) -> bool;
}

pub fn sort_by_display_order<T: DisplayOrdered>(items: &mut [T]) {
    items.sort_by(|a, b| {
        a.display_order()
            .cmp(&b.display_order())
            .then_with(|| a.id().cmp(b.id()))
    });
}

/// Drops inactive entries and orders the rest for display.
pub fn visible<T: DisplayOrdered>(items: Vec<T>) -> Vec<T> {
    let mut items: Vec<T> = items.into_iter().filter(|i| i.is_active()).collect();
    sort_by_display_order(&mut items);
    items
}

macro_rules! display_ordered {
    ($($ty:ty),+ $(,)?) => {
        $(impl DisplayOrdered for $ty {
            fn display_order(&self) -> i32 {
                self.display_order
            }

            fn id(&self) -> &str {
                &self.id
            }

            fn is_active(&self) -> bool {
                self.is_active
            }
        })+
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseTypeRecord {
    pub id: String,
    pub name: String,
    pub kind: CourseTypeKind,
    pub description: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRecord {
    pub id: String,
    pub course_type_id: String,
    pub name: String,
    pub description: Option<String>,
    /// Skills taught; shown for professional courses
    pub skills: Vec<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    pub id: String,
    pub course_id: String,
    pub name: String,
    pub description: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamRecord {
    pub id: String,
    pub course_id: String,
    pub name: String,
    pub description: Option<String>,
    pub conducting_body: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRecord {
    pub id: String,
    /// Which table `parent_id` points into
    pub parent_kind: EntityKind,
    pub parent_id: String,
    pub name: String,
    pub description: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl SubjectRecord {
    pub fn parent(&self) -> SellableRef {
        SellableRef::new(self.parent_kind, self.parent_id.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRecord {
    pub id: String,
    pub subject_id: String,
    pub name: String,
    pub description: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRecord {
    pub id: String,
    pub topic_id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_project: bool,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterRecord {
    pub id: String,
    pub module_id: String,
    pub name: String,
    pub description: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub id: String,
    pub chapter_id: String,
    pub text: String,
    pub options: Vec<String>,
    /// Index into `options`
    pub correct_option: i32,
    pub difficulty: Difficulty,
    pub marks: Decimal,
    pub negative_marks: Decimal,
    pub explanation: Option<String>,
    /// Previous exams this question appeared in
    pub exam_history: Vec<String>,
    /// Exams or audiences this question suits
    pub suitable_for: Vec<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

display_ordered!(
    CourseTypeRecord,
    CourseRecord,
    ClassRecord,
    ExamRecord,
    SubjectRecord,
    TopicRecord,
    ModuleRecord,
    ChapterRecord,
    QuestionRecord,
);

/// Time range during which a discount applies. A missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferWindow {
    pub valid_from: Option<NaiveDateTime>,
    pub valid_to: Option<NaiveDateTime>,
}

impl OfferWindow {
    pub const ALWAYS: OfferWindow = OfferWindow {
        valid_from: None,
        valid_to: None,
    };

    pub fn new(valid_from: Option<NaiveDateTime>, valid_to: Option<NaiveDateTime>) -> Self {
        Self {
            valid_from,
            valid_to,
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        if let (Some(from), Some(to)) = (self.valid_from, self.valid_to)
            && from > to
        {
            return Err(EduError::validation(format!(
                "validFrom ({from}) must not be after validTo ({to})"
            )));
        }
        Ok(())
    }

    pub fn is_active_at(&self, now: NaiveDateTime) -> bool {
        self.valid_from.is_none_or(|from| from <= now) && self.valid_to.is_none_or(|to| now <= to)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingRecord {
    pub id: String,
    pub course_type_id: String,
    pub level: PricingLevel,
    /// Course type id for `CourseType` rows, otherwise the course/class/exam id
    pub entity_id: String,
    pub tier: Tier,
    pub base_price: Decimal,
    pub discount_percent: i32,
    pub valid_from: Option<NaiveDateTime>,
    pub valid_to: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl PricingRecord {
    pub fn window(&self) -> OfferWindow {
        OfferWindow::new(self.valid_from, self.valid_to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_enum_parse() {
        assert_eq!("academic".parse::<CourseTypeKind>().unwrap(), CourseTypeKind::Academic);
        assert_eq!("YEARLY".parse::<Tier>().unwrap(), Tier::Yearly);
        assert_eq!(
            "course_type".parse::<PricingLevel>().unwrap(),
            PricingLevel::CourseType
        );
        assert!("weekly".parse::<Tier>().is_err());
    }

    #[test]
    fn test_enum_serde_matches_display() {
        let json = serde_json::to_string(&PricingStatus::NotSet).unwrap();
        assert_eq!(json, "\"NOT_SET\"");
        assert_eq!(PricingStatus::NotSet.as_str(), "NOT_SET");
        let level: PricingLevel = serde_json::from_str("\"COURSE_TYPE\"").unwrap();
        assert_eq!(level, PricingLevel::CourseType);
    }

    #[test]
    fn test_subject_parent_per_course_type() {
        assert_eq!(CourseTypeKind::Academic.subject_parent(), EntityKind::Class);
        assert_eq!(CourseTypeKind::Competitive.subject_parent(), EntityKind::Exam);
        assert_eq!(
            CourseTypeKind::Professional.subject_parent(),
            EntityKind::Course
        );
    }

    #[test]
    fn test_offer_window() {
        assert!(OfferWindow::ALWAYS.is_active_at(at(1)));

        let window = OfferWindow::new(Some(at(5)), Some(at(10)));
        assert!(!window.is_active_at(at(4)));
        assert!(window.is_active_at(at(5)));
        assert!(window.is_active_at(at(10)));
        assert!(!window.is_active_at(at(11)));

        let open_end = OfferWindow::new(Some(at(5)), None);
        assert!(open_end.is_active_at(at(28)));
        assert!(!open_end.is_active_at(at(2)));

        assert!(OfferWindow::new(Some(at(10)), Some(at(5))).validate().is_err());
        assert!(window.validate().is_ok());
    }

    #[test]
    fn test_display_order_ties_break_on_id() {
        let now = at(1);
        let topic = |id: &str, order: i32, active: bool| TopicRecord {
            id: id.to_string(),
            subject_id: "s".to_string(),
            name: id.to_string(),
            description: None,
            display_order: order,
            is_active: active,
            created_at: now,
            updated_at: now,
        };

        let topics = visible(vec![
            topic("c", 2, true),
            topic("b", 1, true),
            topic("a", 2, true),
            topic("z", 0, false),
        ]);
        let ids: Vec<&str> = topics.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }
}
