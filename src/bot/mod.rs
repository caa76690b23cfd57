mod commands;
mod notifier;
mod telegram;

pub use commands::Command;
pub use notifier::{Notifier, TelegramNotifier};
pub use telegram::TelegramBot;
