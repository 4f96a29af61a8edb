//! Password-change notifier implementations.

mod log;

#[cfg(feature = "mail")]
mod mail;
#[cfg(feature = "mail")]
mod template;

pub use log::LogNotifier;

#[cfg(feature = "mail")]
pub use mail::{MailApiNotifier, MailConfig};
