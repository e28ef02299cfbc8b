pub mod mail;

pub use mail::{HttpRelayMailer, Mailer, MemoryMailer, SentMail};
