pub use super::counters::Entity as Counters;
pub use super::notes::Entity as Notes;
pub use super::users::Entity as Users;
