//! Domain types - keys, records, windows and verifier results.

mod attempt;
mod identity;
mod notice;
mod window;

pub use attempt::{AttemptKey, AttemptOutcome, AttemptRecord, RecordId, mask_email};
pub use identity::{AuthAction, AuthUser, Session, VerifiedIdentity};
pub use notice::PasswordChangeNotice;
pub use window::{WindowPolicy, WindowState};
