use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::InlineKeyboard,
    Result,
};

/// Cross-messenger port for the chat transport.
///
/// Telegram is the first implementation; the shape is narrow on purpose.
/// The core only ever delivers HTML notices, edits previously sent copies,
/// and answers in-flight button taps.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;

    /// Replace a sent message's text. Editing drops any inline keyboard the
    /// message carried, which is how resolved notices lose their controls.
    async fn edit_html(&self, msg: MessageRef, html: &str) -> Result<()>;

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef>;

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}
