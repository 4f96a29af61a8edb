//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod clock;
mod credentials;
mod ledger;
mod notifier;
mod rate_limit;
mod verifier;

pub use clock::{Clock, ManualClock, SystemClock};
pub use credentials::{CredentialError, SessionIssuer};
pub use ledger::{AttemptLedger, FailureStats, LedgerError};
pub use notifier::{NotifyError, PasswordChangeNotifier};
pub use rate_limit::{RateLimitError, RateLimiter};
pub use verifier::{CredentialVerifier, VerifierError};
