//! Outgoing mail: SMTP through lettre, or a logging stand-in for
//! development.

mod log;
#[cfg(feature = "mail")]
mod smtp;

pub use self::log::LogMailer;

#[cfg(feature = "mail")]
pub use smtp::{SmtpConfig, SmtpMailer};
