pub mod session;
pub use session::{Claims, SessionError, SessionKeys};

pub mod auth_service;
pub use auth_service::{AuthError, AuthService, RegisterInput};

pub mod auth_service_impl;
pub use auth_service_impl::SeaOrmAuthService;

pub mod user_service;
pub use user_service::{CreateUserInput, UpdateUserInput, UserError, UserPage, UserService};

pub mod user_service_impl;
pub use user_service_impl::SeaOrmUserService;

pub mod note_service;
pub use note_service::{CreateNoteInput, NoteError, NotePage, NoteQuery, NoteService, UpdateNoteInput};

pub mod note_service_impl;
pub use note_service_impl::SeaOrmNoteService;
