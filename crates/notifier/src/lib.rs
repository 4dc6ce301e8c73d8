pub mod error;
pub mod log;
pub mod notification;
pub mod notifier;
pub mod testing;

pub use error::NotifyError;
pub use log::LogNotifier;
pub use notification::{Attachment, Notification};
pub use notifier::{Delivery, Notifier};
