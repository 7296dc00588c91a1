//! Best-effort "new content" notifications to crawler ping endpoints.
//!
//! Notification is advisory: a failed ping is logged and counted, never
//! propagated.

mod ping;
mod traits;
mod types;

pub use ping::PingNotifier;
pub use traits::Notifier;
pub use types::{BroadcastReport, PingAttempt, PingResult};
