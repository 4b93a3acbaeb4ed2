/// The answer board: guess buffer, letter pool, hint ledger.
///
/// ## Single structured cell (C)
///
/// The guess buffer is one `Vec<Cell>` where each filled cell carries its
/// letter *and* its origin. There are no parallel letter/color lists to
/// keep in sync; hint protection and save encoding both read the same cell.
///
/// ## Hint ledger and duplicate letters
///
/// Disabling pool keys by displayed letter is ambiguous when the pool
/// holds duplicates. The ledger resolves it by counting: a hint placement
/// that finds no selectable key with its letter leaves an *outstanding*
/// count, and the next player-removal of that letter is absorbed by the
/// ledger (count decremented, no key re-enabled) instead of re-enabling a
/// key the hint now owns.
///
/// Accounting invariant, per letter X:
///   buffer cells holding X  ==  used pool keys with X  +  outstanding(X)

use std::collections::HashMap;

use rand::Rng;

use crate::domain::error::GameError;
use crate::domain::letters::{self, PoolSlot};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    Player,
    Hint,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Filled { letter: char, origin: Origin },
}

impl Cell {
    pub fn letter(&self) -> Option<char> {
        match self {
            Cell::Empty => None,
            Cell::Filled { letter, .. } => Some(*letter),
        }
    }

    pub fn is_hint(&self) -> bool {
        matches!(self, Cell::Filled { origin: Origin::Hint, .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Loading,
    Active,
    Solved,
    Abandoned,
}

/// Which cells of a previous buffer survive into a reloaded board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Carry {
    /// Hint-origin cells only: reshuffle drops the player's letters but
    /// never takes back what a hint paid for.
    Hints,
    /// Everything: save-restore brings the buffer back exactly.
    All,
}

/// Result of a completion check after a mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Buffer not yet full; nothing to report.
    Pending,
    /// Buffer full but wrong; caller drives the penalty flash.
    Incorrect,
    Solved,
}

pub struct Board {
    answer: Vec<char>,
    cells: Vec<Cell>,
    pool: Vec<PoolSlot>,
    /// Outstanding hint placements per letter, not yet matched to a
    /// disabled pool key. Never negative by construction.
    ledger: HashMap<char, u32>,
    status: Status,
}

impl Board {
    /// Placeholder board before any level is loaded.
    pub fn empty() -> Self {
        Board {
            answer: vec![],
            cells: vec![],
            pool: vec![],
            ledger: HashMap::new(),
            status: Status::Loading,
        }
    }

    /// Load a level into a fresh board with an empty buffer.
    pub fn load<R: Rng>(answer: &str, rng: &mut R) -> Self {
        Self::build(answer, &[], rng)
    }

    /// Load a level, carrying cells of a matching-length previous buffer
    /// at their positions. A length mismatch ignores `previous` entirely
    /// (level data changed under the save).
    pub fn load_carrying<R: Rng>(
        answer: &str,
        previous: &[Cell],
        carry: Carry,
        rng: &mut R,
    ) -> Self {
        let survivors: Vec<Cell> = previous
            .iter()
            .map(|cell| match (carry, cell) {
                (Carry::All, c) => *c,
                (Carry::Hints, c) if c.is_hint() => *c,
                (Carry::Hints, _) => Cell::Empty,
            })
            .collect();
        Self::build(answer, &survivors, rng)
    }

    fn build<R: Rng>(answer: &str, previous: &[Cell], rng: &mut R) -> Self {
        let answer: Vec<char> = answer.chars().collect();
        let mut cells = vec![Cell::Empty; answer.len()];
        if previous.len() == cells.len() {
            cells.copy_from_slice(previous);
        }

        let pool = letters::generate(&answer.iter().collect::<String>(), rng);
        let mut board = Board {
            answer,
            cells,
            pool,
            ledger: HashMap::new(),
            status: Status::Active,
        };

        // Spend one pool key per carried-over letter occurrence.
        // Hint cells claim first (through the ledger), then player cells.
        for pass in [Origin::Hint, Origin::Player] {
            for i in 0..board.cells.len() {
                if let Cell::Filled { letter, origin } = board.cells[i] {
                    if origin != pass {
                        continue;
                    }
                    match origin {
                        Origin::Hint => {
                            board.ledger_increment(letter);
                            board.claim_pool_key(letter);
                        }
                        Origin::Player => {
                            if let Some(slot) = board.selectable_key(letter) {
                                board.pool[slot].used = true;
                            }
                        }
                    }
                }
            }
        }

        board
    }

    // ── Accessors ──

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn pool(&self) -> &[PoolSlot] {
        &self.pool
    }

    pub fn answer(&self) -> String {
        self.answer.iter().collect()
    }

    /// First selectable pool key carrying the given letter.
    pub fn selectable_key(&self, letter: char) -> Option<usize> {
        self.pool.iter().position(|s| !s.used && s.letter == letter)
    }

    pub fn outstanding(&self, letter: char) -> u32 {
        self.ledger.get(&letter).copied().unwrap_or(0)
    }

    // ── Operations ──

    /// Spend a pool key into the first empty cell, origin Player.
    /// Silently no-ops on a used/unknown key or a full buffer.
    pub fn place_from_pool(&mut self, key: usize) -> Outcome {
        if self.status != Status::Active {
            return Outcome::Pending;
        }
        let letter = match self.pool.get(key) {
            Some(slot) if !slot.used => slot.letter,
            _ => return Outcome::Pending,
        };
        let target = match self.cells.iter().position(|c| *c == Cell::Empty) {
            Some(i) => i,
            None => return Outcome::Pending,
        };
        self.cells[target] = Cell::Filled { letter, origin: Origin::Player };
        self.pool[key].used = true;
        self.check_completion()
    }

    /// Clear a player-origin cell back to Empty.
    ///
    /// Hint-origin cells fail with `ProtectedCell` and leave everything
    /// unchanged. Clearing an already-empty cell is a no-op.
    pub fn remove_letter(&mut self, index: usize) -> Result<(), GameError> {
        if self.status != Status::Active {
            return Ok(());
        }
        let letter = match self.cells.get(index) {
            Some(Cell::Filled { origin: Origin::Hint, .. }) => {
                return Err(GameError::ProtectedCell);
            }
            Some(Cell::Filled { letter, origin: Origin::Player }) => *letter,
            _ => return Ok(()),
        };
        self.cells[index] = Cell::Empty;

        // Re-enable rule: an outstanding hint absorbs the removal and the
        // key stays disabled; otherwise one used key with this letter
        // becomes selectable again.
        if self.outstanding(letter) > 0 {
            self.ledger_decrement(letter);
        } else if let Some(slot) = self.pool.iter().position(|s| s.used && s.letter == letter) {
            self.pool[slot].used = false;
        }
        Ok(())
    }

    /// Reveal the true letter of a uniformly random empty cell, origin Hint.
    ///
    /// Fails with `SessionComplete` when no empty revealable cell remains;
    /// the caller checks hint inventory before calling, so nothing is
    /// debited on that path.
    pub fn place_hint<R: Rng>(&mut self, rng: &mut R) -> Result<Outcome, GameError> {
        if self.status != Status::Active {
            return Err(GameError::SessionComplete);
        }
        let eligible: Vec<usize> = (0..self.cells.len())
            .filter(|&i| self.cells[i] == Cell::Empty && self.answer[i] != '_')
            .collect();
        if eligible.is_empty() {
            return Err(GameError::SessionComplete);
        }
        let target = eligible[rng.random_range(0..eligible.len())];
        let letter = self.answer[target];
        self.cells[target] = Cell::Filled { letter, origin: Origin::Hint };
        self.ledger_increment(letter);
        self.claim_pool_key(letter);
        Ok(self.check_completion())
    }

    /// Compare a full buffer to the answer. Any empty cell keeps the
    /// board Active without signalling anything.
    pub fn check_completion(&mut self) -> Outcome {
        if self.cells.iter().any(|c| *c == Cell::Empty) {
            return Outcome::Pending;
        }
        let assembled: String = self.cells.iter().filter_map(|c| c.letter()).collect();
        if assembled == self.answer() {
            self.status = Status::Solved;
            Outcome::Solved
        } else {
            Outcome::Incorrect
        }
    }

    pub fn abandon(&mut self) {
        self.status = Status::Abandoned;
    }

    // ── Internal ──

    /// Claim a selectable key for an outstanding hint placement, if any.
    fn claim_pool_key(&mut self, letter: char) {
        if self.outstanding(letter) == 0 {
            return;
        }
        if let Some(slot) = self.selectable_key(letter) {
            self.pool[slot].used = true;
            self.ledger_decrement(letter);
        }
    }

    fn ledger_increment(&mut self, letter: char) {
        *self.ledger.entry(letter).or_insert(0) += 1;
    }

    fn ledger_decrement(&mut self, letter: char) {
        if let Some(n) = self.ledger.get_mut(&letter) {
            *n = n.saturating_sub(1);
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(1234)
    }

    fn key_for(board: &Board, letter: char) -> usize {
        board.selectable_key(letter).expect("letter missing from pool")
    }

    fn used_count(board: &Board, letter: char) -> usize {
        board.pool().iter().filter(|s| s.used && s.letter == letter).count()
    }

    #[test]
    fn place_fills_first_empty_cell() {
        let mut r = rng();
        let mut b = Board::load("CAT", &mut r);
        let k = key_for(&b, 'A');
        assert_eq!(b.place_from_pool(k), Outcome::Pending);
        assert_eq!(b.cells()[0], Cell::Filled { letter: 'A', origin: Origin::Player });
        assert!(b.pool()[k].used);
    }

    #[test]
    fn place_then_remove_round_trips() {
        let mut r = rng();
        let mut b = Board::load("CAT", &mut r);
        let k = key_for(&b, 'C');
        b.place_from_pool(k);
        b.remove_letter(0).unwrap();
        assert_eq!(b.cells()[0], Cell::Empty);
        assert!(!b.pool()[k].used, "key should be selectable again");
    }

    #[test]
    fn remove_hint_cell_is_protected() {
        let mut r = rng();
        let mut b = Board::load("CAT", &mut r);
        b.place_hint(&mut r).unwrap();
        let hinted = b.cells().iter().position(|c| c.is_hint()).unwrap();
        let before: Vec<Cell> = b.cells().to_vec();
        let pool_before: Vec<_> = b.pool().to_vec();
        assert_eq!(b.remove_letter(hinted), Err(GameError::ProtectedCell));
        assert_eq!(b.cells(), &before[..]);
        assert_eq!(b.pool(), &pool_before[..]);
    }

    #[test]
    fn remove_empty_cell_is_noop() {
        let mut r = rng();
        let mut b = Board::load("CAT", &mut r);
        assert_eq!(b.remove_letter(1), Ok(()));
        assert_eq!(b.remove_letter(99), Ok(()));
    }

    #[test]
    fn place_on_full_buffer_is_silent_noop() {
        let mut r = rng();
        let mut b = Board::load("AB", &mut r);
        b.place_from_pool(key_for(&b, 'B'));
        b.place_from_pool(key_for(&b, 'A'));
        // Buffer full (wrong order). A further key press changes nothing.
        let extra = b.pool().iter().position(|s| !s.used).unwrap();
        let cells_before: Vec<Cell> = b.cells().to_vec();
        b.place_from_pool(extra);
        assert_eq!(b.cells(), &cells_before[..]);
        assert!(!b.pool()[extra].used);
    }

    #[test]
    fn solved_iff_full_and_equal() {
        let mut r = rng();
        let mut b = Board::load("CAT", &mut r);
        b.place_from_pool(key_for(&b, 'C'));
        b.place_from_pool(key_for(&b, 'A'));
        assert_eq!(b.status(), Status::Active);
        let out = b.place_from_pool(key_for(&b, 'T'));
        assert_eq!(out, Outcome::Solved);
        assert_eq!(b.status(), Status::Solved);
    }

    #[test]
    fn full_but_wrong_signals_incorrect_and_stays_active() {
        let mut r = rng();
        let mut b = Board::load("CAT", &mut r);
        b.place_from_pool(key_for(&b, 'T'));
        b.place_from_pool(key_for(&b, 'A'));
        let out = b.place_from_pool(key_for(&b, 'C'));
        assert_eq!(out, Outcome::Incorrect);
        assert_eq!(b.status(), Status::Active);
    }

    #[test]
    fn hint_reveals_correct_letter_and_disables_key() {
        let mut r = rng();
        let mut b = Board::load("DOG", &mut r);
        b.place_hint(&mut r).unwrap();
        let hinted = b.cells().iter().position(|c| c.is_hint()).unwrap();
        let letter = b.cells()[hinted].letter().unwrap();
        assert_eq!(letter, b.answer().chars().nth(hinted).unwrap());
        assert_eq!(used_count(&b, letter), 1);
        assert_eq!(b.outstanding(letter), 0);
    }

    #[test]
    fn hint_with_no_empty_cell_fails_session_complete() {
        let mut r = rng();
        let mut b = Board::load("AB", &mut r);
        b.place_from_pool(key_for(&b, 'B'));
        b.place_from_pool(key_for(&b, 'A'));
        assert_eq!(b.place_hint(&mut r), Err(GameError::SessionComplete));
    }

    #[test]
    fn ledger_absorbs_removal_when_keys_exhausted() {
        // Answer BEE: player spends both E keys into wrong cells, then a
        // hint lands on an E cell with no selectable E key left.
        let mut r = rng();
        let mut b = Board::load("BEE", &mut r);
        b.place_from_pool(key_for(&b, 'E')); // cell 0 = E (player)
        b.place_from_pool(key_for(&b, 'E')); // cell 1 = E (player)
        assert_eq!(used_count(&b, 'E'), 2);

        // Only empty cell is index 2 (answer 'E'); the hint has no key to claim.
        b.place_hint(&mut r).unwrap();
        assert_eq!(b.outstanding('E'), 1);
        assert_eq!(used_count(&b, 'E'), 2);

        // Removing a player E transfers its disable to the hint: no key
        // re-enables and the outstanding count clears.
        b.remove_letter(0).unwrap();
        assert_eq!(b.outstanding('E'), 0);
        assert_eq!(used_count(&b, 'E'), 2);

        // The next removal has no outstanding hint to absorb it.
        b.remove_letter(1).unwrap();
        assert_eq!(used_count(&b, 'E'), 1);
    }

    #[test]
    fn refresh_preserves_hint_cells_only() {
        let mut r = rng();
        let mut b = Board::load("STAR", &mut r);
        b.place_hint(&mut r).unwrap();
        let hinted = b.cells().iter().position(|c| c.is_hint()).unwrap();
        let hint_letter = b.cells()[hinted].letter().unwrap();
        // A player letter that must not survive a reshuffle.
        let k = b.pool().iter().position(|s| !s.used).unwrap();
        b.place_from_pool(k);

        let prev: Vec<Cell> = b.cells().to_vec();
        let b2 = Board::load_carrying("STAR", &prev, Carry::Hints, &mut r);
        assert_eq!(
            b2.cells()[hinted],
            Cell::Filled { letter: hint_letter, origin: Origin::Hint }
        );
        let survivors = b2.cells().iter().filter(|c| **c != Cell::Empty).count();
        assert_eq!(survivors, 1, "player letters must not survive refresh");
        // The reshuffled pool has its hint key pre-disabled.
        assert_eq!(used_count(&b2, hint_letter), 1);
        assert_eq!(b2.outstanding(hint_letter), 0);
    }

    #[test]
    fn restore_carries_player_letters() {
        let mut r = rng();
        let mut b = Board::load("MOON", &mut r);
        b.place_from_pool(key_for(&b, 'M'));
        let prev: Vec<Cell> = b.cells().to_vec();

        let b2 = Board::load_carrying("MOON", &prev, Carry::All, &mut r);
        assert_eq!(b2.cells()[0], Cell::Filled { letter: 'M', origin: Origin::Player });
        assert_eq!(used_count(&b2, 'M'), 1);
    }

    #[test]
    fn mismatched_previous_buffer_is_ignored() {
        let mut r = rng();
        let prev = vec![Cell::Filled { letter: 'Z', origin: Origin::Hint }];
        let b = Board::load_carrying("CAT", &prev, Carry::Hints, &mut r);
        assert!(b.cells().iter().all(|c| *c == Cell::Empty));
    }

    #[test]
    fn restored_hints_can_complete_the_level() {
        // Save-restore path: all but one cell hint-filled, then solve.
        let mut r = rng();
        let prev = vec![
            Cell::Filled { letter: 'C', origin: Origin::Hint },
            Cell::Filled { letter: 'A', origin: Origin::Hint },
            Cell::Empty,
        ];
        let mut b = Board::load_carrying("CAT", &prev, Carry::All, &mut r);
        let out = b.place_from_pool(key_for(&b, 'T'));
        assert_eq!(out, Outcome::Solved);
    }
}
