// src/alert/mod.rs
mod dispatcher;
mod notifier;
mod twilio;

pub use dispatcher::{alert_message, AlertDispatcher};
pub use notifier::{LogNotifier, Notifier, NotifyError};
pub use twilio::TwilioNotifier;
