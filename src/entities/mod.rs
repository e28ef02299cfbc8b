pub mod prelude;

pub mod counters;
pub mod notes;
pub mod users;
