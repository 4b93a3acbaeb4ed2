/// Coin and hint balances with the grant/exchange/reward rules.
///
/// All failures leave both balances untouched; the caller decides
/// whether a "not enough X" prompt is worth showing.

use chrono::NaiveDate;

use crate::domain::error::GameError;

pub const DEFAULT_COINS: u32 = 10;
pub const DEFAULT_HINTS: u32 = 2;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Economy {
    pub coins: u32,
    pub hints: u32,
    /// Calendar date of the most recent daily hint grant.
    pub last_grant: Option<NaiveDate>,
}

impl Economy {
    pub fn new(coins: u32, hints: u32) -> Self {
        Economy { coins, hints, last_grant: None }
    }

    /// Grant the daily hint at most once per local calendar date.
    /// Returns true when a hint was credited.
    pub fn apply_daily_grant(&mut self, today: NaiveDate) -> bool {
        if self.last_grant == Some(today) {
            return false;
        }
        self.hints += 1;
        self.last_grant = Some(today);
        true
    }

    /// Convert `cost` coins into one hint.
    pub fn exchange(&mut self, cost: u32) -> Result<(), GameError> {
        if self.coins < cost {
            return Err(GameError::InsufficientCoins);
        }
        self.coins -= cost;
        self.hints += 1;
        Ok(())
    }

    /// Consume one hint from inventory.
    pub fn spend_hint(&mut self) -> Result<(), GameError> {
        if self.hints == 0 {
            return Err(GameError::NoHintsAvailable);
        }
        self.hints -= 1;
        Ok(())
    }

    /// Unconditional coin credit (level reward, purchase completion).
    /// The purchase itself is verified by the external collaborator.
    pub fn add_coins(&mut self, amount: u32) {
        self.coins += amount;
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
