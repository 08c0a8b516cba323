mod import;
mod ledger;
mod streak;

pub use import::{ImportOutcome, import_balances};
pub use ledger::{KudosError, KudosLedger, LedgerEntry, LedgerSink, TransferReceipt};
pub use streak::{
    DAILY_MESSAGE_BONUS, FIRST_TIME_BONUS, StreakAward, StreakAwardKind, WEEKLY_STREAK_BONUS,
    evaluate_streak,
};
