//! Public catalogue composition.
//!
//! Walks course type → courses → classes/exams → subjects → topics → modules
//! → chapters and attaches resolved pricing to every sellable node. The shape
//! of the result depends on the course type kind.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::error::EduError;
use crate::model::{
    CourseRecord, CourseTypeKind, CourseTypeRecord, EntityKind, SellableRef, SubjectRecord,
    visible,
};
use crate::pricing::resolver::{TierPricing, resolve_tiers_in_course_type};
use crate::store::CatalogueRead;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Catalogue {
    Academic(AcademicCatalogue),
    Competitive(CompetitiveCatalogue),
    Professional(ProfessionalCatalogue),
}

impl Catalogue {
    pub fn course_type(&self) -> &CourseTypeSummary {
        match self {
            Self::Academic(c) => &c.course_type,
            Self::Competitive(c) => &c.course_type,
            Self::Professional(c) => &c.course_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseTypeSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

impl From<&CourseTypeRecord> for CourseTypeSummary {
    fn from(ct: &CourseTypeRecord) -> Self {
        Self {
            id: ct.id.clone(),
            name: ct.name.clone(),
            description: ct.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentCounts {
    pub topics: u64,
    pub modules: u64,
    pub chapters: u64,
    pub questions: u64,
    pub projects: u64,
}

impl ContentCounts {
    fn add(&mut self, other: &ContentCounts) {
        self.topics += other.topics;
        self.modules += other.modules;
        self.chapters += other.chapters;
        self.questions += other.questions;
        self.projects += other.projects;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSummary {
    pub id: String,
    pub name: String,
    pub counts: ContentCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicCatalogue {
    pub course_type: CourseTypeSummary,
    pub courses: Vec<AcademicCourse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicCourse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub classes: Vec<ClassNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassNode {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub pricing: TierPricing,
    pub subjects: Vec<SubjectSummary>,
    pub totals: ContentCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitiveCatalogue {
    pub course_type: CourseTypeSummary,
    pub courses: Vec<CompetitiveCourse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitiveCourse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub exams: Vec<ExamNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamNode {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub conducting_body: Option<String>,
    pub pricing: TierPricing,
    pub subjects: Vec<SubjectWithTopics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectWithTopics {
    pub id: String,
    pub name: String,
    pub topics: Vec<TopicItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicItem {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalCatalogue {
    pub course_type: CourseTypeSummary,
    pub courses: Vec<ProfessionalCourse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalCourse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub skills: Vec<String>,
    pub pricing: TierPricing,
    pub module_count: u64,
    pub chapter_count: u64,
    pub project_count: u64,
}

/// Builds the public catalogue of one course type.
///
/// All reads go through `reader`, which should be a single read-only unit of
/// work so the tree reflects one consistent snapshot.
pub async fn compose_catalogue<R: CatalogueRead + ?Sized>(
    reader: &R,
    course_type_id: &str,
    now: NaiveDateTime,
) -> Result<Catalogue> {
    let course_type = reader
        .course_type(course_type_id)
        .await?
        .filter(|ct| ct.is_active)
        .ok_or_else(|| EduError::not_found("course type", course_type_id))?;

    let courses = visible(reader.courses_of_type(&course_type.id).await?);
    let summary = CourseTypeSummary::from(&course_type);

    let catalogue = match course_type.kind {
        CourseTypeKind::Academic => {
            let mut nodes = Vec::with_capacity(courses.len());
            for course in courses {
                nodes.push(academic_course(reader, &course_type, course, now).await?);
            }
            Catalogue::Academic(AcademicCatalogue {
                course_type: summary,
                courses: nodes,
            })
        }
        CourseTypeKind::Competitive => {
            let mut nodes = Vec::with_capacity(courses.len());
            for course in courses {
                nodes.push(competitive_course(reader, &course_type, course, now).await?);
            }
            Catalogue::Competitive(CompetitiveCatalogue {
                course_type: summary,
                courses: nodes,
            })
        }
        CourseTypeKind::Professional => {
            let mut nodes = Vec::with_capacity(courses.len());
            for course in courses {
                nodes.push(professional_course(reader, &course_type, course, now).await?);
            }
            Catalogue::Professional(ProfessionalCatalogue {
                course_type: summary,
                courses: nodes,
            })
        }
    };

    tracing::debug!(course_type_id = %course_type.id, kind = course_type.kind.as_str(), "Catalogue composed");
    Ok(catalogue)
}

async fn academic_course<R: CatalogueRead + ?Sized>(
    reader: &R,
    course_type: &CourseTypeRecord,
    course: CourseRecord,
    now: NaiveDateTime,
) -> Result<AcademicCourse> {
    let classes = visible(reader.classes_of_course(&course.id).await?);

    let mut nodes = Vec::with_capacity(classes.len());
    for class in classes {
        let sellable = SellableRef::new(EntityKind::Class, &class.id);
        let pricing = resolve_tiers_in_course_type(reader, &sellable, &course_type.id, now).await?;

        let mut totals = ContentCounts::default();
        let mut subjects = Vec::new();
        for subject in visible(reader.subjects_of(EntityKind::Class, &class.id).await?) {
            let counts = subject_counts(reader, &subject).await?;
            totals.add(&counts);
            subjects.push(SubjectSummary {
                id: subject.id,
                name: subject.name,
                counts,
            });
        }

        nodes.push(ClassNode {
            id: class.id,
            name: class.name,
            description: class.description,
            pricing,
            subjects,
            totals,
        });
    }

    Ok(AcademicCourse {
        id: course.id,
        name: course.name,
        description: course.description,
        classes: nodes,
    })
}

async fn competitive_course<R: CatalogueRead + ?Sized>(
    reader: &R,
    course_type: &CourseTypeRecord,
    course: CourseRecord,
    now: NaiveDateTime,
) -> Result<CompetitiveCourse> {
    let exams = visible(reader.exams_of_course(&course.id).await?);

    let mut nodes = Vec::with_capacity(exams.len());
    for exam in exams {
        let sellable = SellableRef::new(EntityKind::Exam, &exam.id);
        let pricing = resolve_tiers_in_course_type(reader, &sellable, &course_type.id, now).await?;

        let mut subjects = Vec::new();
        for subject in visible(reader.subjects_of(EntityKind::Exam, &exam.id).await?) {
            let topics = visible(reader.topics_of_subject(&subject.id).await?)
                .into_iter()
                .map(|t| TopicItem {
                    id: t.id,
                    name: t.name,
                })
                .collect();
            subjects.push(SubjectWithTopics {
                id: subject.id,
                name: subject.name,
                topics,
            });
        }

        nodes.push(ExamNode {
            id: exam.id,
            name: exam.name,
            description: exam.description,
            conducting_body: exam.conducting_body,
            pricing,
            subjects,
        });
    }

    Ok(CompetitiveCourse {
        id: course.id,
        name: course.name,
        description: course.description,
        exams: nodes,
    })
}

async fn professional_course<R: CatalogueRead + ?Sized>(
    reader: &R,
    course_type: &CourseTypeRecord,
    course: CourseRecord,
    now: NaiveDateTime,
) -> Result<ProfessionalCourse> {
    let sellable = SellableRef::new(EntityKind::Course, &course.id);
    let pricing = resolve_tiers_in_course_type(reader, &sellable, &course_type.id, now).await?;

    let mut totals = ContentCounts::default();
    for subject in visible(reader.subjects_of(EntityKind::Course, &course.id).await?) {
        totals.add(&subject_counts(reader, &subject).await?);
    }

    Ok(ProfessionalCourse {
        id: course.id,
        name: course.name,
        description: course.description,
        skills: course.skills,
        pricing,
        module_count: totals.modules,
        chapter_count: totals.chapters,
        project_count: totals.projects,
    })
}

/// Counts active content below a subject.
async fn subject_counts<R: CatalogueRead + ?Sized>(
    reader: &R,
    subject: &SubjectRecord,
) -> Result<ContentCounts> {
    let mut counts = ContentCounts::default();

    for topic in visible(reader.topics_of_subject(&subject.id).await?) {
        counts.topics += 1;
        for module in visible(reader.modules_of_topic(&topic.id).await?) {
            counts.modules += 1;
            if module.is_project {
                counts.projects += 1;
            }
            for chapter in visible(reader.chapters_of_module(&module.id).await?) {
                counts.chapters += 1;
                counts.questions += reader.question_count(&chapter.id).await?;
            }
        }
    }

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use crate::model::{PricingLevel, PricingStatus, Tier};
    use crate::store::MemoryStore;
    use rust_decimal::Decimal;

    fn academic() -> MemoryStore {
        let store = MemoryStore::new();
        store.put_course_type(course_type("ct", CourseTypeKind::Academic));
        store.put_course(course("c1", "ct", 0));
        store.put_class(class("cl-b", "c1", 1));
        store.put_class(class("cl-a", "c1", 1));
        let mut hidden = class("cl-hidden", "c1", 0);
        hidden.is_active = false;
        store.put_class(hidden);

        store.put_subject(subject("math", EntityKind::Class, "cl-a", 0));
        store.put_subject(subject("sci", EntityKind::Class, "cl-a", 1));
        store.put_topic(topic("t1", "math", 0));
        store.put_topic(topic("t2", "math", 1));
        store.put_module(module("m1", "t1", 0, false));
        store.put_chapter(chapter("ch1", "m1", 0));
        store.put_chapter(chapter("ch2", "m1", 1));
        store.put_question(question("q1", "ch1", 0, 1));
        store.put_question(question("q2", "ch1", 1, 1));
        let mut retired = question("q3", "ch2", 1, 1);
        retired.is_active = false;
        store.put_question(retired);

        store.put_pricing(pricing("p1", "ct", PricingLevel::Class, "cl-a", Tier::Monthly, 1000, 20));
        store.put_pricing(pricing("d1", "ct", PricingLevel::CourseType, "ct", Tier::Monthly, 500, 0));
        store
    }

    #[tokio::test]
    async fn test_academic_tree() {
        let store = academic();
        let catalogue = compose_catalogue(&store, "ct", ts()).await.unwrap();

        let Catalogue::Academic(academic) = catalogue else {
            panic!("expected academic catalogue");
        };
        assert_eq!(academic.courses.len(), 1);

        let classes = &academic.courses[0].classes;
        let ids: Vec<&str> = classes.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["cl-a", "cl-b"]);

        let cl_a = &classes[0];
        assert_eq!(cl_a.pricing.monthly.status, PricingStatus::Set);
        assert_eq!(cl_a.pricing.monthly.final_price, Some(Decimal::new(800, 0)));
        assert_eq!(cl_a.pricing.yearly.status, PricingStatus::NotSet);

        let math = &cl_a.subjects[0];
        assert_eq!(math.id, "math");
        assert_eq!(
            math.counts,
            ContentCounts {
                topics: 2,
                modules: 1,
                chapters: 2,
                questions: 2,
                projects: 0,
            }
        );
        assert_eq!(cl_a.totals.topics, 2);

        let cl_b = &classes[1];
        assert_eq!(cl_b.pricing.monthly.status, PricingStatus::Default);
        assert_eq!(cl_b.pricing.monthly.final_price, Some(Decimal::new(500, 0)));
        assert!(cl_b.subjects.is_empty());
    }

    #[tokio::test]
    async fn test_competitive_tree_lists_topics() {
        let store = MemoryStore::new();
        store.put_course_type(course_type("ct", CourseTypeKind::Competitive));
        store.put_course(course("c1", "ct", 0));
        store.put_exam(exam("jee", "c1", 0));
        store.put_subject(subject("phy", EntityKind::Exam, "jee", 0));
        store.put_topic(topic("optics", "phy", 2));
        store.put_topic(topic("motion", "phy", 1));

        let catalogue = compose_catalogue(&store, "ct", ts()).await.unwrap();
        let json = serde_json::to_value(&catalogue).unwrap();
        assert_eq!(json["kind"], "COMPETITIVE");

        let Catalogue::Competitive(competitive) = catalogue else {
            panic!("expected competitive catalogue");
        };
        let exam = &competitive.courses[0].exams[0];
        let topics: Vec<&str> = exam.subjects[0].topics.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(topics, vec!["motion", "optics"]);
        assert_eq!(exam.pricing.quarterly.status, PricingStatus::NotSet);
    }

    #[tokio::test]
    async fn test_professional_counts_and_skills() {
        let store = MemoryStore::new();
        store.put_course_type(course_type("ct", CourseTypeKind::Professional));
        let mut rust = course("rust", "ct", 0);
        rust.skills = vec!["ownership".into(), "async".into()];
        store.put_course(rust);
        store.put_subject(subject("s1", EntityKind::Course, "rust", 0));
        store.put_topic(topic("t1", "s1", 0));
        store.put_module(module("m1", "t1", 0, false));
        store.put_module(module("m2", "t1", 1, true));
        store.put_chapter(chapter("ch1", "m1", 0));
        store.put_pricing(pricing("p", "ct", PricingLevel::Course, "rust", Tier::Yearly, 12000, 25));

        let Catalogue::Professional(professional) =
            compose_catalogue(&store, "ct", ts()).await.unwrap()
        else {
            panic!("expected professional catalogue");
        };
        let course = &professional.courses[0];
        assert_eq!(course.skills, vec!["ownership", "async"]);
        assert_eq!(course.module_count, 2);
        assert_eq!(course.chapter_count, 1);
        assert_eq!(course.project_count, 1);
        assert_eq!(course.pricing.yearly.final_price, Some(Decimal::new(9000, 0)));
    }

    #[tokio::test]
    async fn test_inactive_course_type_is_not_found() {
        let store = MemoryStore::new();
        let mut ct = course_type("ct", CourseTypeKind::Academic);
        ct.is_active = false;
        store.put_course_type(ct);

        let err = compose_catalogue(&store, "ct", ts()).await.unwrap_err();
        assert!(matches!(err, EduError::NotFound { .. }));
    }
}
