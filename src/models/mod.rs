pub mod note;
pub mod user;

pub use note::{Note, NoteStatus};
pub use user::{Lifecycle, Role, User};
