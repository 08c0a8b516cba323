use std::future::Future;

use beginner_utils::parse::ImportLine;
use tracing::warn;

use super::ledger::{KudosError, KudosLedger};

/// What happened to one line of a kudos import.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported {
        user_id: u64,
        display_name: String,
        points: i64,
    },
    /// The member has left the guild; their balance was not written.
    Departed { user_id: u64, points: i64 },
    /// Looking the member up failed for another reason.
    Unresolved { user_id: u64, points: i64 },
    Malformed { line: String },
}

/// Apply parsed import lines one by one.
///
/// `resolve_member` returns the member's display name, or `None` when the
/// member is no longer in the guild. A bad line never stops the import.
pub async fn import_balances<F, Fut>(
    ledger: &KudosLedger,
    guild_id: u64,
    lines: Vec<ImportLine>,
    mut resolve_member: F,
) -> Result<Vec<ImportOutcome>, KudosError>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = anyhow::Result<Option<String>>>,
{
    let mut outcomes = Vec::with_capacity(lines.len());

    for line in lines {
        let (user_id, points) = match line {
            ImportLine::Entry { user_id, points } => (user_id, points),
            ImportLine::Malformed(line) => {
                warn!(guild_id, %line, "skipping malformed kudos import line");
                outcomes.push(ImportOutcome::Malformed { line });
                continue;
            }
        };

        let outcome = match resolve_member(user_id).await {
            Ok(Some(display_name)) => {
                ledger.set(guild_id, user_id, points).await?;
                ImportOutcome::Imported {
                    user_id,
                    display_name,
                    points,
                }
            }
            Ok(None) => ImportOutcome::Departed { user_id, points },
            Err(source) => {
                warn!(?source, guild_id, user_id, "failed to resolve member for kudos import");
                ImportOutcome::Unresolved { user_id, points }
            }
        };
        outcomes.push(outcome);
    }

    Ok(outcomes)
}
