pub mod mailer;
pub mod webhook;

pub use mailer::{Email, Mailer, SmtpMailer};
pub use webhook::{ChatWebhook, SlackWebhook};
