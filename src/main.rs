/// Entry point and game loop.

mod config;
mod domain;
mod session;
mod ui;

use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::event::KeyCode;

use config::GameConfig;
use session::catalog::LevelCatalog;
use session::engine;
use session::event::SessionEvent;
use session::progress::ProgressStore;
use session::state::{GameState, Phase};
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();

    // Catalog warnings go to stderr before the terminal goes raw.
    let (catalog, warnings) = LevelCatalog::load(&config.levels_dir);
    for w in &warnings {
        eprintln!("Warning: {w}");
    }
    if catalog.is_empty() {
        eprintln!("No playable levels found. Check the levels directory.");
        return;
    }

    let store = ProgressStore::new();
    let mut gs = GameState::new(&config);
    gs.total_levels = catalog.len();
    gs.has_save = store.has_save();

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut gs, &catalog, &store, &config, &mut renderer, sound.as_ref());

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing PixWord!");
    println!("Progress saved at level {}.", gs.current_level);
}

fn game_loop(
    gs: &mut GameState,
    catalog: &LevelCatalog,
    store: &ProgressStore,
    config: &GameConfig,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.timing.tick_rate_ms);

    loop {
        kb.drain_events();

        if kb.ctrl_c_pressed() {
            // Quitting mid-level is a save point.
            if gs.phase == Phase::Playing {
                engine::save_now(gs, store);
            }
            break;
        }

        let mut events = vec![];
        match gs.phase {
            Phase::Title => {
                if kb.was_pressed(KeyCode::Enter) {
                    let today = Local::now().date_naive();
                    events = engine::start_session(gs, catalog, store, config, today);
                } else if kb.any_pressed(&[KeyCode::Char('q'), KeyCode::Char('Q'), KeyCode::Esc]) {
                    break;
                }
            }
            Phase::Playing => {
                events = handle_playing_keys(gs, catalog, store, config, &kb);
            }
            Phase::LevelTransition => {
                // Any key skips the banner.
                if kb.anything_pressed() {
                    engine::finish_transition(gs);
                }
            }
            Phase::GameCompleted => {
                if kb.anything_pressed() {
                    engine::acknowledge_completion(gs);
                }
            }
        }
        process_sound_events(sound, &events);

        if last_tick.elapsed() >= tick_rate {
            if gs.message_timer > 0 {
                gs.message_timer -= 1;
                if gs.message_timer == 0 {
                    gs.message.clear();
                }
            }
            if gs.flash_ticks > 0 {
                gs.flash_ticks -= 1;
            }
            if gs.phase == Phase::LevelTransition && gs.banner_ticks > 0 {
                gs.banner_ticks -= 1;
                if gs.banner_ticks == 0 {
                    engine::finish_transition(gs);
                }
            }
            last_tick = Instant::now();
        }

        renderer.render(gs)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Playing-phase keys. The purchase dialog and the pause overlay are
/// modal: while either is up, only its own keys are live.
fn handle_playing_keys(
    gs: &mut GameState,
    catalog: &LevelCatalog,
    store: &ProgressStore,
    config: &GameConfig,
    kb: &InputState,
) -> Vec<SessionEvent> {
    if gs.confirm_purchase {
        if kb.was_pressed(KeyCode::Enter) {
            return engine::confirm_purchase(gs, config);
        }
        if kb.was_pressed(KeyCode::Esc) {
            return engine::cancel_purchase(gs);
        }
        return vec![];
    }

    if gs.paused {
        if kb.was_pressed(KeyCode::F(1)) {
            return engine::toggle_pause(gs, store);
        }
        if kb.was_pressed(KeyCode::Esc) {
            return engine::back_to_menu(gs, store);
        }
        return vec![];
    }

    if kb.was_pressed(KeyCode::F(1)) {
        return engine::toggle_pause(gs, store);
    }
    if kb.was_pressed(KeyCode::Esc) {
        return engine::back_to_menu(gs, store);
    }
    if kb.was_pressed(KeyCode::Tab) {
        return engine::use_hint(gs, catalog, store, config);
    }
    if kb.was_pressed(KeyCode::F(2)) {
        return engine::refresh(gs);
    }
    if kb.was_pressed(KeyCode::F(3)) {
        return engine::exchange_coins_for_hint(gs, config);
    }
    if kb.was_pressed(KeyCode::F(4)) {
        return engine::request_purchase(gs);
    }
    if kb.any_pressed(&[KeyCode::Backspace, KeyCode::Delete]) {
        return engine::remove_letter(gs);
    }
    if kb.was_pressed(KeyCode::Left) && gs.cursor > 0 {
        gs.cursor -= 1;
        return vec![];
    }
    if kb.was_pressed(KeyCode::Right) {
        let max = gs.board.cells().len().saturating_sub(1);
        if gs.cursor < max {
            gs.cursor += 1;
        }
        return vec![];
    }
    if let Some(letter) = kb.pressed_letter() {
        return engine::place_letter(gs, catalog, store, config, letter);
    }
    vec![]
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[SessionEvent]) {
    if let Some(sfx) = sound {
        for &event in events {
            sfx.play_event(event);
        }
    }
}
