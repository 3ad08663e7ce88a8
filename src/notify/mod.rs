//! Priority-aware notification dispatch: threshold filtering, quiet
//! hours, smart timing, grouping/digest, and the fire-once delivery
//! timer.

pub mod digest;
pub mod dispatcher;
pub mod priority;
pub mod schedule;

pub use digest::{group, next_digest_time, NotificationGroup, DEFAULT_GROUP_WINDOW_MINUTES};
pub use dispatcher::{DispatchReceipt, Dispatcher};
pub use priority::{is_quiet_hours, should_send, smart_delay};
pub use schedule::ScheduledDeliveries;
