//! Email events domain - open/click/reply notifications from the email provider
//!
//! ```text
//! POST /webhooks/email/event
//!     │
//!     ├─► EmailEvent::from_payload   (400 on bad shape or unknown kind)
//!     ├─► BaseEventRunner::enqueue   (returns once handed over)
//!     └─► 202 Accepted
//!
//! event worker
//!     └─► process_email_event → handle_{open,click,reply}_event → email_log
//! ```

pub mod event;
pub mod handlers;
pub mod models;

pub use event::{EmailEvent, EmailEventKind};
pub use handlers::{handle_click_event, handle_open_event, handle_reply_event, process_email_event};
pub use models::{EmailLog, EmailLogUpdate, EmailStatus};
