//! Point economy: the append-only ledger and everything that writes through it.

pub mod bonus;
pub mod error;
pub mod escrow;
pub mod ledger;
pub mod milestones;
pub mod tiers;
pub mod votes;

pub use error::{EscrowError, LedgerError, VoteError};
pub use escrow::{EscrowManager, Settlement, SettlementSummary};
pub use ledger::{Ledger, Reconciliation};
pub use milestones::{MilestoneAward, MilestoneAwarder};
pub use tiers::TierInfo;
pub use votes::{VoteOutcome, VoteRewards};
