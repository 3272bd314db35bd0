//! Monthly usage accounting for the Homework Helper gateway.
//!
//! The [`UsageLedger`] decides whether a caller may ask another question,
//! lazily resets counters when a calendar month rolls over, and records
//! consumption after a successful answer.  Persistence sits behind the
//! [`UserStore`] trait so the ledger never does a read-then-write itself.

pub mod clock;
pub mod ledger;
pub mod period;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ledger::{may_consume, Admission, QuotaExceeded, UsageLedger, UsageStatus};
pub use period::AccountingPeriod;
pub use store::{JsonUserStore, ResetOutcome, UserStore};
