pub use super::chapter::Entity as Chapter;
pub use super::class::Entity as Class;
pub use super::course::Entity as Course;
pub use super::course_type::Entity as CourseType;
pub use super::exam::Entity as Exam;
pub use super::gateway_event::Entity as GatewayEvent;
pub use super::module::Entity as Module;
pub use super::online_test::Entity as OnlineTest;
pub use super::pricing_config::Entity as PricingConfig;
pub use super::question::Entity as Question;
pub use super::subject::Entity as Subject;
pub use super::subscription::Entity as Subscription;
pub use super::test_attempt::Entity as TestAttempt;
pub use super::topic::Entity as Topic;
