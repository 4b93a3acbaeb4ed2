/// Session orchestration: level transitions, hint/coin flows, save points.
///
/// Every operation here is an instantaneous state transition invoked from
/// the main loop in response to a key press or lifecycle event. Errors
/// from the domain layer are converted into message-bar prompts; nothing
/// propagates as a process failure.
///
/// ## Mandated save points
///   level advance, entering pause, back-to-menu, process quit, and the
///   full reset on game completion.

use chrono::NaiveDate;

use crate::config::GameConfig;
use crate::domain::board::{Board, Carry, Outcome, Status};
use crate::domain::economy::Economy;
use crate::domain::error::GameError;
use crate::session::catalog::{LevelCatalog, LevelRecord};
use crate::session::event::SessionEvent;
use crate::session::progress::{self, PersistedState, ProgressStore};
use crate::session::state::{GameState, Phase};

const MESSAGE_TICKS: u32 = 40;

// ══════════════════════════════════════════════════════════════
// Session start / rehydration
// ══════════════════════════════════════════════════════════════

/// Load persisted progress, rehydrate the board for the saved level,
/// apply the daily hint grant, and enter Playing.
pub fn start_session(
    gs: &mut GameState,
    catalog: &LevelCatalog,
    store: &ProgressStore,
    config: &GameConfig,
    today: NaiveDate,
) -> Vec<SessionEvent> {
    let events = vec![];
    if catalog.is_empty() {
        gs.set_message("No levels found!", MESSAGE_TICKS);
        return events;
    }

    let (mut saved, warnings) = store.load();
    for w in &warnings {
        gs.set_message(&format!("Save repaired: {w}"), MESSAGE_TICKS);
    }
    // First run: configured initial balances, not the codec defaults.
    if !store.has_save() {
        saved.coins = config.economy.initial_coins;
        saved.hints = config.economy.initial_hints;
    }

    // Stale level numbers (level data changed between builds) clamp to
    // the first catalog entry instead of indexing blindly.
    let record = match catalog.get(saved.current_level) {
        Some(r) => r.clone(),
        None => {
            let err = GameError::LevelNotFound(saved.current_level);
            gs.set_message(&format!("{err}; restarting at level 1"), MESSAGE_TICKS);
            match catalog.first() {
                Some(r) => r.clone(),
                None => return events,
            }
        }
    };

    // Re-pad/truncate the saved buffer to the current answer length.
    let mut snapshot = progress::restore_cells(&saved.answer_row, &saved.hint_flags);
    if !snapshot.is_empty() && snapshot.len() != record.answer.chars().count() {
        let err = GameError::CorruptedSave(format!(
            "saved buffer length {} != answer length {}",
            snapshot.len(),
            record.answer.chars().count()
        ));
        gs.set_message(&format!("Save repaired: {err}"), MESSAGE_TICKS);
        snapshot.resize(record.answer.chars().count(), crate::domain::board::Cell::Empty);
    }

    gs.economy = Economy {
        coins: saved.coins,
        hints: saved.hints,
        last_grant: saved.last_hint_date,
    };
    if gs.economy.apply_daily_grant(today) {
        gs.set_message("Daily bonus: +1 hint", MESSAGE_TICKS);
    }

    let answer = record.answer.clone();
    enter_level(gs, catalog, record);
    gs.board = Board::load_carrying(&answer, &snapshot, Carry::All, &mut gs.rng);
    gs.phase = Phase::Playing;
    gs.paused = false;
    events
}

/// Point the state at a record and load a fresh board for it.
fn enter_level(gs: &mut GameState, catalog: &LevelCatalog, record: LevelRecord) {
    gs.current_level = record.number;
    gs.level_index = catalog.index_of(record.number).unwrap_or(0);
    gs.total_levels = catalog.len();
    gs.cursor = 0;
    gs.board = Board::load(&record.answer, &mut gs.rng);
    gs.art = record.art;
}

// ══════════════════════════════════════════════════════════════
// Playing-phase operations
// ══════════════════════════════════════════════════════════════

/// Spend the first selectable pool key carrying `letter` into the buffer.
/// Unknown or exhausted letters are ignored.
pub fn place_letter(
    gs: &mut GameState,
    catalog: &LevelCatalog,
    store: &ProgressStore,
    config: &GameConfig,
    letter: char,
) -> Vec<SessionEvent> {
    let mut events = vec![];
    // A full-but-wrong buffer stays Active; a further letter press must
    // neither place nor click.
    if gs.board.cells().iter().all(|c| c.letter().is_some()) {
        return events;
    }
    let Some(key) = gs.board.selectable_key(letter.to_ascii_uppercase()) else {
        return events;
    };
    let outcome = gs.board.place_from_pool(key);
    events.push(SessionEvent::LetterPlaced);
    after_guess(gs, catalog, store, config, outcome, &mut events);
    events
}

/// Clear the cell under the cursor. Hint cells refuse and say so.
pub fn remove_letter(gs: &mut GameState) -> Vec<SessionEvent> {
    let mut events = vec![];
    match gs.board.remove_letter(gs.cursor) {
        Ok(()) => events.push(SessionEvent::LetterRemoved),
        Err(err) => {
            gs.set_message(&format!("{err}"), MESSAGE_TICKS);
            events.push(SessionEvent::ActionDenied);
        }
    }
    events
}

/// Reveal one random letter, debiting a hint on success.
pub fn use_hint(
    gs: &mut GameState,
    catalog: &LevelCatalog,
    store: &ProgressStore,
    config: &GameConfig,
) -> Vec<SessionEvent> {
    let mut events = vec![];
    if gs.economy.hints == 0 {
        gs.set_message("No hints left! F3 exchanges coins for one", MESSAGE_TICKS);
        events.push(SessionEvent::ActionDenied);
        return events;
    }
    match gs.board.place_hint(&mut gs.rng) {
        Ok(outcome) => {
            // Inventory was checked above; this cannot fail.
            let _ = gs.economy.spend_hint();
            events.push(SessionEvent::HintUsed);
            after_guess(gs, catalog, store, config, outcome, &mut events);
        }
        Err(err) => {
            gs.set_message(&format!("{err}"), MESSAGE_TICKS);
            events.push(SessionEvent::ActionDenied);
        }
    }
    events
}

/// Regenerate the letter pool, keeping hint-placed progress.
pub fn refresh(gs: &mut GameState) -> Vec<SessionEvent> {
    if gs.board.status() != Status::Active {
        return vec![];
    }
    let previous: Vec<_> = gs.board.cells().to_vec();
    let answer = gs.board.answer();
    gs.board = Board::load_carrying(&answer, &previous, Carry::Hints, &mut gs.rng);
    gs.cursor = 0;
    gs.set_message("Letters reshuffled", MESSAGE_TICKS);
    vec![]
}

/// Convert coins into a hint at the configured rate.
pub fn exchange_coins_for_hint(gs: &mut GameState, config: &GameConfig) -> Vec<SessionEvent> {
    match gs.economy.exchange(config.economy.exchange_cost) {
        Ok(()) => {
            gs.set_message(
                &format!("-{} coins, +1 hint", config.economy.exchange_cost),
                MESSAGE_TICKS,
            );
            vec![SessionEvent::CoinsExchanged]
        }
        Err(err) => {
            gs.set_message(&format!("{err}"), MESSAGE_TICKS);
            vec![SessionEvent::ActionDenied]
        }
    }
}

/// Open the buy-coins confirmation dialog. Only offered when broke,
/// matching the store button's enable rule.
pub fn request_purchase(gs: &mut GameState) -> Vec<SessionEvent> {
    if gs.economy.coins == 0 {
        gs.confirm_purchase = true;
    }
    vec![]
}

/// External purchase confirmation: credit the configured pack. The
/// purchase itself is the collaborator's problem; no verification here.
pub fn confirm_purchase(gs: &mut GameState, config: &GameConfig) -> Vec<SessionEvent> {
    gs.confirm_purchase = false;
    gs.economy.add_coins(config.economy.coin_pack);
    gs.set_message(&format!("+{} coins", config.economy.coin_pack), MESSAGE_TICKS);
    vec![SessionEvent::CoinsPurchased]
}

pub fn cancel_purchase(gs: &mut GameState) -> Vec<SessionEvent> {
    gs.confirm_purchase = false;
    vec![]
}

/// Save and leave for the title screen.
pub fn back_to_menu(gs: &mut GameState, store: &ProgressStore) -> Vec<SessionEvent> {
    let mut events = vec![];
    if !save_now(gs, store) {
        events.push(SessionEvent::SaveFailed);
    }
    gs.board.abandon();
    gs.paused = false;
    gs.confirm_purchase = false;
    gs.clear_message();
    gs.has_save = store.has_save();
    gs.phase = Phase::Title;
    events
}

/// Pause toggle; entering pause is a mandated save point.
pub fn toggle_pause(gs: &mut GameState, store: &ProgressStore) -> Vec<SessionEvent> {
    let mut events = vec![];
    gs.paused = !gs.paused;
    if gs.paused {
        if !save_now(gs, store) {
            gs.set_message("Save failed!", MESSAGE_TICKS);
            events.push(SessionEvent::SaveFailed);
        } else {
            gs.set_message("PAUSED  [F1] Resume", 0);
        }
    } else {
        gs.clear_message();
    }
    events
}

// ══════════════════════════════════════════════════════════════
// Completion flow
// ══════════════════════════════════════════════════════════════

fn after_guess(
    gs: &mut GameState,
    catalog: &LevelCatalog,
    store: &ProgressStore,
    config: &GameConfig,
    outcome: Outcome,
    events: &mut Vec<SessionEvent>,
) {
    match outcome {
        Outcome::Pending => {}
        Outcome::Incorrect => {
            gs.flash_ticks = config.timing.flash_ticks;
            events.push(SessionEvent::GuessIncorrect);
        }
        Outcome::Solved => handle_solved(gs, catalog, store, config, events),
    }
}

/// Award the reward, advance (or finish), and hit the save point.
fn handle_solved(
    gs: &mut GameState,
    catalog: &LevelCatalog,
    store: &ProgressStore,
    config: &GameConfig,
    events: &mut Vec<SessionEvent>,
) {
    gs.economy.add_coins(config.economy.solve_reward);
    events.push(SessionEvent::LevelSolved);

    match catalog.next_after(gs.current_level) {
        Some(next) => {
            enter_level(gs, catalog, next.clone());
            if !save_now(gs, store) {
                gs.set_message("Save failed!", MESSAGE_TICKS);
                events.push(SessionEvent::SaveFailed);
            } else {
                gs.set_message(
                    &format!("Correct! +{} coins", config.economy.solve_reward),
                    config.timing.banner_ticks + MESSAGE_TICKS,
                );
            }
            gs.banner_ticks = config.timing.banner_ticks;
            gs.banner_total = config.timing.banner_ticks;
            gs.phase = Phase::LevelTransition;
        }
        None => {
            // Catalog exhausted: hard reset back to defaults.
            events.push(SessionEvent::GameCompleted);
            store.clear();
            gs.economy = Economy::new(
                config.economy.initial_coins,
                config.economy.initial_hints,
            );
            if let Some(first) = catalog.first() {
                enter_level(gs, catalog, first.clone());
                if !save_now(gs, store) {
                    events.push(SessionEvent::SaveFailed);
                }
            }
            gs.phase = Phase::GameCompleted;
        }
    }
}

/// Banner ran out: resume play on the already-loaded next level.
pub fn finish_transition(gs: &mut GameState) {
    if gs.phase == Phase::LevelTransition {
        gs.phase = Phase::Playing;
    }
}

/// Any key on the completion screen drops back into level 1.
pub fn acknowledge_completion(gs: &mut GameState) {
    if gs.phase == Phase::GameCompleted {
        gs.phase = Phase::Playing;
    }
}

// ══════════════════════════════════════════════════════════════
// Persistence
// ══════════════════════════════════════════════════════════════

/// Write the current session to the store. Returns false on I/O failure
/// so the caller can surface a message; never panics.
pub fn save_now(gs: &GameState, store: &ProgressStore) -> bool {
    let (answer_row, hint_flags) = progress::snapshot_cells(gs.board.cells());
    let state = PersistedState {
        current_level: gs.current_level,
        coins: gs.economy.coins,
        hints: gs.economy.hints,
        answer_row,
        hint_flags,
        last_hint_date: gs.economy.last_grant,
    };
    store.save(&state).is_ok()
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::catalog::LevelRecord;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rec(number: u32, answer: &str) -> LevelRecord {
        LevelRecord { number, answer: answer.into(), art: vec![] }
    }

    fn fixture() -> (GameState, LevelCatalog, tempfile::TempDir, ProgressStore, GameConfig) {
        let config = GameConfig::default_for_tests();
        let (catalog, _) = LevelCatalog::from_records(vec![rec(1, "AB"), rec(2, "GO")]);
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::at(dir.path().to_path_buf());
        let mut gs = GameState::new(&config);
        gs.rng = StdRng::seed_from_u64(77);
        (gs, catalog, dir, store, config)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn solve_current(
        gs: &mut GameState,
        catalog: &LevelCatalog,
        store: &ProgressStore,
        config: &GameConfig,
    ) -> Vec<SessionEvent> {
        let answer = gs.board.answer();
        let mut events = vec![];
        for ch in answer.chars() {
            events.extend(place_letter(gs, catalog, store, config, ch));
        }
        events
    }

    #[test]
    fn first_run_starts_with_defaults_plus_daily_grant() {
        let (mut gs, catalog, _d, store, config) = fixture();
        start_session(&mut gs, &catalog, &store, &config, today());
        assert_eq!(gs.phase, Phase::Playing);
        assert_eq!(gs.current_level, 1);
        assert_eq!(gs.economy.coins, 10);
        assert_eq!(gs.economy.hints, 3); // 2 defaults + daily grant
    }

    #[test]
    fn daily_grant_not_repeated_same_date() {
        let (mut gs, catalog, _d, store, config) = fixture();
        start_session(&mut gs, &catalog, &store, &config, today());
        save_now(&gs, &store);
        let hints_after_first = gs.economy.hints;

        let mut gs2 = GameState::new(&config);
        gs2.rng = StdRng::seed_from_u64(78);
        start_session(&mut gs2, &catalog, &store, &config, today());
        assert_eq!(gs2.economy.hints, hints_after_first);

        let later = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        let mut gs3 = GameState::new(&config);
        gs3.rng = StdRng::seed_from_u64(79);
        save_now(&gs2, &store);
        start_session(&mut gs3, &catalog, &store, &config, later);
        assert_eq!(gs3.economy.hints, hints_after_first + 1);
    }

    #[test]
    fn solving_non_final_level_awards_saves_and_advances() {
        let (mut gs, catalog, _d, store, config) = fixture();
        start_session(&mut gs, &catalog, &store, &config, today());
        let coins_before = gs.economy.coins;

        let events = solve_current(&mut gs, &catalog, &store, &config);
        assert!(events.contains(&SessionEvent::LevelSolved));
        assert_eq!(gs.economy.coins, coins_before + config.economy.solve_reward);
        assert_eq!(gs.current_level, 2);
        assert_eq!(gs.phase, Phase::LevelTransition);

        let (saved, _) = store.load();
        assert_eq!(saved.current_level, 2);
        assert_eq!(saved.coins, gs.economy.coins);

        finish_transition(&mut gs);
        assert_eq!(gs.phase, Phase::Playing);
    }

    #[test]
    fn solving_final_level_resets_everything() {
        let (mut gs, catalog, _d, store, config) = fixture();
        start_session(&mut gs, &catalog, &store, &config, today());
        solve_current(&mut gs, &catalog, &store, &config);
        finish_transition(&mut gs);

        let events = solve_current(&mut gs, &catalog, &store, &config);
        assert!(events.contains(&SessionEvent::GameCompleted));
        assert_eq!(gs.phase, Phase::GameCompleted);
        assert_eq!(gs.current_level, 1);
        assert_eq!(gs.economy.coins, config.economy.initial_coins);
        assert_eq!(gs.economy.hints, config.economy.initial_hints);

        // The store holds exactly the defaults, no stale fields.
        let (saved, _) = store.load();
        assert_eq!(saved.current_level, 1);
        assert_eq!(saved.coins, config.economy.initial_coins);
        assert_eq!(saved.hints, config.economy.initial_hints);
        assert_eq!(saved.answer_row, "__");

        acknowledge_completion(&mut gs);
        assert_eq!(gs.phase, Phase::Playing);
    }

    #[test]
    fn wrong_guess_flashes_and_stays() {
        let (mut gs, catalog, _d, store, config) = fixture();
        start_session(&mut gs, &catalog, &store, &config, today());
        let events: Vec<_> = place_letter(&mut gs, &catalog, &store, &config, 'B')
            .into_iter()
            .chain(place_letter(&mut gs, &catalog, &store, &config, 'A'))
            .collect();
        assert!(events.contains(&SessionEvent::GuessIncorrect));
        assert!(gs.flash_ticks > 0);
        assert_eq!(gs.phase, Phase::Playing);
        assert_eq!(gs.current_level, 1);
    }

    #[test]
    fn hint_without_inventory_is_denied_unchanged() {
        let (mut gs, catalog, _d, store, config) = fixture();
        start_session(&mut gs, &catalog, &store, &config, today());
        gs.economy.hints = 0;
        let coins = gs.economy.coins;
        let events = use_hint(&mut gs, &catalog, &store, &config);
        assert_eq!(events, vec![SessionEvent::ActionDenied]);
        assert_eq!((gs.economy.coins, gs.economy.hints), (coins, 0));
        assert!(gs.board.cells().iter().all(|c| c.letter().is_none()));
    }

    #[test]
    fn hint_debits_and_reveals() {
        let (mut gs, catalog, _d, store, config) = fixture();
        start_session(&mut gs, &catalog, &store, &config, today());
        let hints = gs.economy.hints;
        let events = use_hint(&mut gs, &catalog, &store, &config);
        assert!(events.contains(&SessionEvent::HintUsed));
        assert_eq!(gs.economy.hints, hints - 1);
        assert_eq!(gs.board.cells().iter().filter(|c| c.is_hint()).count(), 1);
    }

    #[test]
    fn refresh_keeps_hint_progress() {
        let (mut gs, catalog, _d, store, config) = fixture();
        start_session(&mut gs, &catalog, &store, &config, today());
        use_hint(&mut gs, &catalog, &store, &config);
        let hinted: Vec<_> = gs.board.cells().to_vec();
        refresh(&mut gs);
        assert_eq!(gs.board.cells(), &hinted[..]);
    }

    #[test]
    fn session_restores_saved_buffer_exactly() {
        let (mut gs, catalog, _d, store, config) = fixture();
        start_session(&mut gs, &catalog, &store, &config, today());
        use_hint(&mut gs, &catalog, &store, &config);
        let cells_before: Vec<_> = gs.board.cells().to_vec();
        let coins_before = gs.economy.coins;
        save_now(&gs, &store);

        let mut gs2 = GameState::new(&config);
        gs2.rng = StdRng::seed_from_u64(99);
        start_session(&mut gs2, &catalog, &store, &config, today());
        assert_eq!(gs2.board.cells(), &cells_before[..]);
        assert_eq!(gs2.economy.coins, coins_before);
        assert_eq!(gs2.current_level, gs.current_level);
    }

    #[test]
    fn stale_level_number_clamps_to_first() {
        let (mut gs, catalog, _d, store, config) = fixture();
        store
            .save(&PersistedState { current_level: 42, ..Default::default() })
            .unwrap();
        start_session(&mut gs, &catalog, &store, &config, today());
        assert_eq!(gs.current_level, 1);
        assert_eq!(gs.phase, Phase::Playing);
    }

    #[test]
    fn mismatched_saved_buffer_is_repadded() {
        let (mut gs, catalog, _d, store, config) = fixture();
        store
            .save(&PersistedState {
                current_level: 1,
                answer_row: "C_TXX".into(),
                hint_flags: "01000".into(),
                ..Default::default()
            })
            .unwrap();
        start_session(&mut gs, &catalog, &store, &config, today());
        // Answer "AB" has two cells; the oversized snapshot was truncated.
        assert_eq!(gs.board.cells().len(), 2);
        assert_eq!(gs.phase, Phase::Playing);
    }

    #[test]
    fn exchange_routes_through_economy() {
        let (mut gs, catalog, _d, store, config) = fixture();
        start_session(&mut gs, &catalog, &store, &config, today());
        gs.economy.coins = 10;
        gs.economy.hints = 0;
        assert_eq!(
            exchange_coins_for_hint(&mut gs, &config),
            vec![SessionEvent::CoinsExchanged]
        );
        assert_eq!((gs.economy.coins, gs.economy.hints), (0, 1));
        assert_eq!(
            exchange_coins_for_hint(&mut gs, &config),
            vec![SessionEvent::ActionDenied]
        );
        assert_eq!((gs.economy.coins, gs.economy.hints), (0, 1));
    }

    #[test]
    fn purchase_flow_credits_pack_only_when_broke() {
        let (mut gs, catalog, _d, store, config) = fixture();
        start_session(&mut gs, &catalog, &store, &config, today());
        request_purchase(&mut gs);
        assert!(!gs.confirm_purchase, "dialog must not open with coins in hand");

        gs.economy.coins = 0;
        request_purchase(&mut gs);
        assert!(gs.confirm_purchase);
        confirm_purchase(&mut gs, &config);
        assert_eq!(gs.economy.coins, config.economy.coin_pack);
        assert!(!gs.confirm_purchase);
    }

    #[test]
    fn back_to_menu_saves_and_abandons() {
        let (mut gs, catalog, _d, store, config) = fixture();
        start_session(&mut gs, &catalog, &store, &config, today());
        place_letter(&mut gs, &catalog, &store, &config, 'A');
        back_to_menu(&mut gs, &store);
        assert_eq!(gs.phase, Phase::Title);
        assert_eq!(gs.board.status(), Status::Abandoned);
        assert!(store.has_save());
        let (saved, _) = store.load();
        assert_eq!(saved.answer_row, "A_");
    }
}
