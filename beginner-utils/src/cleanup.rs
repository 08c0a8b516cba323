use std::sync::Arc;

use poise::serenity_prelude as serenity;
use tokio::time::{Duration, sleep};
use tracing::debug;

/// How long transient kudos and reminder replies stay visible.
pub const TRANSIENT_REPLY_SECS: u64 = 15;

/// Delete a message after `delay` on a background task.
///
/// Failures are only logged: the message may already be gone.
pub fn delete_after(http: Arc<serenity::Http>, message: &serenity::Message, delay: Duration) {
    let channel_id = message.channel_id;
    let message_id = message.id;

    tokio::spawn(async move {
        sleep(delay).await;
        if let Err(source) = channel_id.delete_message(&http, message_id).await {
            debug!(
                ?source,
                channel_id = channel_id.get(),
                message_id = message_id.get(),
                "failed to delete transient message"
            );
        }
    });
}

/// Send `builder` to `channel_id` and delete it after
/// [`TRANSIENT_REPLY_SECS`].
pub async fn send_transient(
    http: &Arc<serenity::Http>,
    channel_id: serenity::ChannelId,
    builder: serenity::CreateMessage,
) -> serenity::Result<()> {
    let message = channel_id.send_message(http, builder).await?;
    delete_after(
        Arc::clone(http),
        &message,
        Duration::from_secs(TRANSIENT_REPLY_SECS),
    );
    Ok(())
}
