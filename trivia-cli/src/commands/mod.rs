pub mod channels;
pub mod history;
pub mod payment;
pub mod questions;

pub use channels::{handle_channel_command, ChannelCommands};
pub use history::show_history;
pub use payment::{handle_payment_command, PaymentCommands};
pub use questions::{handle_question_command, QuestionCommands};

use std::path::Path;
use std::sync::Arc;
use trivia_core::service::DATABASE_FILE;
use trivia_core::storage::Storage;

/// Settings and history only need the local database, not PayHero credentials.
pub(crate) async fn open_storage(data_dir: &Path) -> trivia_core::Result<Arc<Storage>> {
    Ok(Arc::new(Storage::new(&data_dir.join(DATABASE_FILE)).await?))
}
