/// Error kinds for the session engine.
///
/// Every variant is locally recoverable: failed operations leave all
/// balances and buffers untouched, and the caller decides what prompt
/// (if any) to surface. Nothing here terminates the process.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameError {
    /// Hint requested with zero hints in inventory.
    NoHintsAvailable,
    /// Coin-for-hint exchange attempted without enough coins.
    InsufficientCoins,
    /// Removal attempted on a hint-origin cell.
    ProtectedCell,
    /// Hint requested but no empty revealable cell remains.
    SessionComplete,
    /// Lookup by a level number the catalog does not hold.
    LevelNotFound(u32),
    /// A catalog entry name that does not parse as `<number>_<answer>`.
    MalformedCatalogName { name: String, reason: String },
    /// Saved state that disagreed with current level data; recovered, never fatal.
    CorruptedSave(String),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::NoHintsAvailable => write!(f, "no hints available"),
            GameError::InsufficientCoins => write!(f, "not enough coins"),
            GameError::ProtectedCell => write!(f, "hint letters cannot be removed"),
            GameError::SessionComplete => write!(f, "nothing left to reveal"),
            GameError::LevelNotFound(n) => write!(f, "level {n} not found in catalog"),
            GameError::MalformedCatalogName { name, reason } => {
                write!(f, "malformed level name '{name}': {reason}")
            }
            GameError::CorruptedSave(detail) => write!(f, "corrupted save: {detail}"),
        }
    }
}

impl std::error::Error for GameError {}
