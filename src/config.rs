/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub economy: EconomyConfig,
    pub timing: TimingConfig,
    pub levels_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct EconomyConfig {
    pub initial_coins: u32,
    pub initial_hints: u32,
    pub exchange_cost: u32,   // coins per hint in the exchange
    pub solve_reward: u32,    // coins credited on level completion
    pub coin_pack: u32,       // coins credited by a confirmed purchase
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
    pub banner_ticks: u32,    // level-transition banner slide duration
    pub flash_ticks: u32,     // wrong-answer flash duration
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    economy: TomlEconomy,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlEconomy {
    #[serde(default = "default_initial_coins")]
    initial_coins: u32,
    #[serde(default = "default_initial_hints")]
    initial_hints: u32,
    #[serde(default = "default_exchange_cost")]
    exchange_cost: u32,
    #[serde(default = "default_solve_reward")]
    solve_reward: u32,
    #[serde(default = "default_coin_pack")]
    coin_pack: u32,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_banner_ticks")]
    banner_ticks: u32,
    #[serde(default = "default_flash_ticks")]
    flash_ticks: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
}

// ── Defaults ──

fn default_initial_coins() -> u32 { 10 }
fn default_initial_hints() -> u32 { 2 }
fn default_exchange_cost() -> u32 { 10 }
fn default_solve_reward() -> u32 { 10 }
fn default_coin_pack() -> u32 { 50 }

fn default_tick_rate() -> u64 { 60 }
fn default_banner_ticks() -> u32 { 18 }
fn default_flash_ticks() -> u32 { 8 }

fn default_levels_dir() -> String { "levels".into() }

impl Default for TomlEconomy {
    fn default() -> Self {
        TomlEconomy {
            initial_coins: default_initial_coins(),
            initial_hints: default_initial_hints(),
            exchange_cost: default_exchange_cost(),
            solve_reward: default_solve_reward(),
            coin_pack: default_coin_pack(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            banner_ticks: default_banner_ticks(),
            flash_ticks: default_flash_ticks(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);

        // Resolve levels directory
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        GameConfig {
            economy: EconomyConfig {
                initial_coins: toml_cfg.economy.initial_coins,
                initial_hints: toml_cfg.economy.initial_hints,
                exchange_cost: toml_cfg.economy.exchange_cost,
                solve_reward: toml_cfg.economy.solve_reward,
                coin_pack: toml_cfg.economy.coin_pack,
            },
            timing: TimingConfig {
                tick_rate_ms: toml_cfg.timing.tick_rate_ms,
                banner_ticks: toml_cfg.timing.banner_ticks,
                flash_ticks: toml_cfg.timing.flash_ticks,
            },
            levels_dir,
        }
    }

    /// Built-in defaults without touching the filesystem (used in tests).
    #[cfg(test)]
    pub fn default_for_tests() -> Self {
        GameConfig {
            economy: EconomyConfig {
                initial_coins: default_initial_coins(),
                initial_hints: default_initial_hints(),
                exchange_cost: default_exchange_cost(),
                solve_reward: default_solve_reward(),
                coin_pack: default_coin_pack(),
            },
            timing: TimingConfig {
                tick_rate_ms: default_tick_rate(),
                banner_ticks: default_banner_ticks(),
                flash_ticks: default_flash_ticks(),
            },
            levels_dir: PathBuf::from("levels"),
        }
    }
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so /usr/bin/pixword → /usr/games/pixword
        // still finds data relative to the real binary.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/pixword)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/pixword");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory (/usr/share/pixword)
    let sys = PathBuf::from("/usr/share/pixword");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    // 5. Fallback
    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}
