use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use tracing::debug;

use beginner_core::kudos::{LedgerEntry, LedgerSink};
use beginner_database::KudosStore;
use beginner_utils::embed::{KUDOS_EMBED_COLOR, author_embed};

/// Posts every balance change to the guild's ledger channel, when one is set.
pub struct ChannelLedgerSink {
    http: Arc<serenity::Http>,
    store: Arc<dyn KudosStore>,
}

impl fmt::Debug for ChannelLedgerSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelLedgerSink")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl ChannelLedgerSink {
    pub fn new(http: Arc<serenity::Http>, store: Arc<dyn KudosStore>) -> Self {
        Self { http, store }
    }
}

/// Entry text for the ledger channel. Debits carry no reason of their own.
pub fn ledger_description(entry: &LedgerEntry) -> String {
    let reason = match entry.reason.as_deref() {
        Some(reason) => reason.to_owned(),
        None => format!("<@{}> spent kudos", entry.user_id),
    };
    let sign = if entry.delta < 0 { '-' } else { '+' };
    format!(
        "{reason}\n\n**{sign}{}** kudos (balance {})",
        entry.delta.unsigned_abs(),
        entry.balance
    )
}

#[async_trait]
impl LedgerSink for ChannelLedgerSink {
    async fn record(&self, entry: &LedgerEntry) -> anyhow::Result<()> {
        let Some(channel_id) = self.store.ledger_channel(entry.guild_id).await? else {
            debug!(guild_id = entry.guild_id, "no kudos ledger channel configured");
            return Ok(());
        };

        let embed = author_embed(
            "Kudos Ledger",
            None,
            ledger_description(entry),
            KUDOS_EMBED_COLOR,
        );
        serenity::ChannelId::new(channel_id)
            .send_message(&self.http, serenity::CreateMessage::new().embed(embed))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use beginner_core::kudos::LedgerEntry;

    use super::ledger_description;

    #[test]
    fn ledger_lines_show_the_credit_and_balance() {
        let entry = LedgerEntry {
            guild_id: 1,
            user_id: 2,
            delta: 32,
            balance: 40,
            reason: Some("<@2> has joined the server!!!".to_owned()),
        };
        assert_eq!(
            ledger_description(&entry),
            "<@2> has joined the server!!!\n\n**+32** kudos (balance 40)"
        );
    }

    #[test]
    fn debits_are_posted_with_a_default_reason() {
        let entry = LedgerEntry {
            guild_id: 1,
            user_id: 2,
            delta: -8,
            balance: 24,
            reason: None,
        };
        assert_eq!(
            ledger_description(&entry),
            "<@2> spent kudos\n\n**-8** kudos (balance 24)"
        );
    }
}
