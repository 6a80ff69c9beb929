//! Confirmation-code delivery implementations

pub mod console;
pub mod smtp;

pub use console::ConsoleMailer;
pub use smtp::{SmtpConfig, SmtpMailer};
