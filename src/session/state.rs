/// GameState: everything a running session owns.
///
/// No ambient singletons: the board, economy and RNG live here and are
/// threaded explicitly through the engine operations. The catalog,
/// config and progress store are passed by reference from the caller.
///
/// Animation is tick counters only (`banner_ticks`, `flash_ticks`); the
/// main loop decrements them and the renderer turns them into offsets.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::GameConfig;
use crate::domain::board::Board;
use crate::domain::economy::Economy;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    Playing,
    /// Gates the "Correct!" banner between levels; the next board is
    /// already loaded when this phase is entered.
    LevelTransition,
    GameCompleted,
}

pub struct GameState {
    pub phase: Phase,
    pub paused: bool,

    // ── Session core ──
    pub board: Board,
    pub economy: Economy,
    pub rng: StdRng,

    // ── Current level ──
    pub current_level: u32,
    pub level_index: usize,
    pub total_levels: usize,
    pub art: Vec<String>,

    // ── UI-facing state ──
    /// Selected answer cell for removal.
    pub cursor: usize,
    pub message: String,
    pub message_timer: u32,
    pub banner_ticks: u32,
    pub banner_total: u32,
    pub flash_ticks: u32,
    /// Buy-coins confirmation dialog is showing.
    pub confirm_purchase: bool,
    /// Pack size shown in the purchase dialog, from config.
    pub coin_pack: u32,
    pub has_save: bool,
}

impl GameState {
    pub fn new(config: &GameConfig) -> Self {
        GameState {
            phase: Phase::Title,
            paused: false,
            board: Board::empty(),
            economy: Economy::new(
                config.economy.initial_coins,
                config.economy.initial_hints,
            ),
            rng: StdRng::from_os_rng(),
            current_level: 1,
            level_index: 0,
            total_levels: 0,
            art: vec![],
            cursor: 0,
            message: String::new(),
            message_timer: 0,
            banner_ticks: 0,
            banner_total: 0,
            flash_ticks: 0,
            confirm_purchase: false,
            coin_pack: config.economy.coin_pack,
            has_save: false,
        }
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    pub fn clear_message(&mut self) {
        self.message.clear();
        self.message_timer = 0;
    }
}
