//! Background work shared by the console pages

pub mod mailbox;
pub mod scheduler;

pub use mailbox::Mailbox;
pub use scheduler::{PendingTimer, Scheduler};
