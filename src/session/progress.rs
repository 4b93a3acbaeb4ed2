/// Save and load player progress.
///
/// ## File format
///   Key-value lines in `progress.dat`:
///     CurrentLevel=3
///     Coins=25
///     Hints=1
///     CurrentAnswer=C_T        (one char per cell, '_' = empty)
///     HintColors=010           (per cell: '1' = hint-origin)
///     LastHintDate=2024-06-01
///
/// Absence of the file or of the `CurrentLevel` key means "no saved
/// state" and yields defaults (level 1, 10 coins, 2 hints, empty buffer).
///
/// ## Durability
///   `save` writes the whole file through a named temp file in the same
///   directory and atomically renames it into place, so a load after a
///   normal shutdown never observes a partial set of fields.
///
/// A stored buffer whose length disagrees with the current level's answer
/// is reconciled defensively (level data can change between catalog
/// builds); the mismatch is reported as `CorruptedSave`, never fatal.

use std::io::Write;
use std::path::PathBuf;

use chrono::NaiveDate;
use tempfile::NamedTempFile;

use crate::domain::board::{Cell, Origin};
use crate::domain::economy;
use crate::domain::error::GameError;

const SAVE_FILE: &str = "progress.dat";
const DATE_FMT: &str = "%Y-%m-%d";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersistedState {
    pub current_level: u32,
    pub coins: u32,
    pub hints: u32,
    /// Guess buffer letters, '_' for an empty cell.
    pub answer_row: String,
    /// Per-cell hint flag, '1' = hint-origin.
    pub hint_flags: String,
    pub last_hint_date: Option<NaiveDate>,
}

impl Default for PersistedState {
    fn default() -> Self {
        PersistedState {
            current_level: 1,
            coins: economy::DEFAULT_COINS,
            hints: economy::DEFAULT_HINTS,
            answer_row: String::new(),
            hint_flags: String::new(),
            last_hint_date: None,
        }
    }
}

pub struct ProgressStore {
    dir: PathBuf,
}

impl ProgressStore {
    /// Store in the default save directory (exe dir if writable, else
    /// `~/.local/share/pixword`, else CWD).
    pub fn new() -> Self {
        ProgressStore { dir: save_dir() }
    }

    /// Store rooted at an explicit directory (tests, portable installs).
    pub fn at(dir: PathBuf) -> Self {
        ProgressStore { dir }
    }

    fn path(&self) -> PathBuf {
        self.dir.join(SAVE_FILE)
    }

    pub fn has_save(&self) -> bool {
        self.path().exists()
    }

    /// Serialize and atomically replace the save file.
    pub fn save(&self, state: &PersistedState) -> Result<(), String> {
        let content = serialize(state);
        let mut tmp = NamedTempFile::new_in(&self.dir)
            .map_err(|e| format!("save failed: {e}"))?;
        tmp.write_all(content.as_bytes())
            .map_err(|e| format!("save failed: {e}"))?;
        tmp.persist(self.path())
            .map_err(|e| format!("save failed: {e}"))?;
        Ok(())
    }

    /// Stored state if present, else defaults. Field-level damage is
    /// repaired and reported, never fatal.
    pub fn load(&self) -> (PersistedState, Vec<GameError>) {
        match std::fs::read_to_string(self.path()) {
            Ok(content) => parse_save(&content),
            Err(_) => (PersistedState::default(), vec![]),
        }
    }

    /// Erase all persisted progress (full game completion). Callers
    /// follow up with `save` of defaults before the next read.
    pub fn clear(&self) {
        let _ = std::fs::remove_file(self.path());
    }
}

// ══════════════════════════════════════════════════════════════
// Buffer snapshot codec (Cell ↔ CurrentAnswer/HintColors)
// ══════════════════════════════════════════════════════════════

pub fn snapshot_cells(cells: &[Cell]) -> (String, String) {
    let mut answer_row = String::with_capacity(cells.len());
    let mut hint_flags = String::with_capacity(cells.len());
    for cell in cells {
        match cell {
            Cell::Empty => {
                answer_row.push('_');
                hint_flags.push('0');
            }
            Cell::Filled { letter, origin } => {
                answer_row.push(*letter);
                hint_flags.push(if *origin == Origin::Hint { '1' } else { '0' });
            }
        }
    }
    (answer_row, hint_flags)
}

pub fn restore_cells(answer_row: &str, hint_flags: &str) -> Vec<Cell> {
    let mut flags = hint_flags.chars();
    answer_row
        .chars()
        .map(|ch| {
            let hinted = flags.next() == Some('1');
            if ch == '_' {
                Cell::Empty
            } else {
                Cell::Filled {
                    letter: ch,
                    origin: if hinted { Origin::Hint } else { Origin::Player },
                }
            }
        })
        .collect()
}

// ══════════════════════════════════════════════════════════════
// Serialization
// ══════════════════════════════════════════════════════════════

fn serialize(state: &PersistedState) -> String {
    let mut out = String::with_capacity(128);
    out.push_str(&format!("CurrentLevel={}\n", state.current_level));
    out.push_str(&format!("Coins={}\n", state.coins));
    out.push_str(&format!("Hints={}\n", state.hints));
    out.push_str(&format!("CurrentAnswer={}\n", state.answer_row));
    out.push_str(&format!("HintColors={}\n", state.hint_flags));
    if let Some(date) = state.last_hint_date {
        out.push_str(&format!("LastHintDate={}\n", date.format(DATE_FMT)));
    }
    out
}

fn parse_save(content: &str) -> (PersistedState, Vec<GameError>) {
    let mut current_level: Option<u32> = None;
    let mut coins: Option<u32> = None;
    let mut hints: Option<u32> = None;
    let mut answer_row = String::new();
    let mut hint_flags = String::new();
    let mut last_hint_date = None;
    let mut warnings = vec![];

    for line in content.lines() {
        if let Some(val) = line.strip_prefix("CurrentLevel=") {
            current_level = val.trim().parse().ok();
        } else if let Some(val) = line.strip_prefix("Coins=") {
            coins = val.trim().parse().ok();
        } else if let Some(val) = line.strip_prefix("Hints=") {
            hints = val.trim().parse().ok();
        } else if let Some(val) = line.strip_prefix("CurrentAnswer=") {
            answer_row = val.to_string();
        } else if let Some(val) = line.strip_prefix("HintColors=") {
            hint_flags = val.trim().to_string();
        } else if let Some(val) = line.strip_prefix("LastHintDate=") {
            last_hint_date = NaiveDate::parse_from_str(val.trim(), DATE_FMT).ok();
        }
    }

    // "No saved state" sentinel: CurrentLevel must be present and sane.
    let current_level = match current_level {
        Some(n) if n >= 1 => n,
        _ => return (PersistedState::default(), vec![]),
    };

    // Reconcile the per-cell flag string with the letter string.
    if hint_flags.chars().count() != answer_row.chars().count() {
        if !hint_flags.is_empty() || !answer_row.is_empty() {
            warnings.push(GameError::CorruptedSave(format!(
                "HintColors length {} != CurrentAnswer length {}",
                hint_flags.chars().count(),
                answer_row.chars().count()
            )));
        }
        let len = answer_row.chars().count();
        let mut fixed: String = hint_flags.chars().take(len).collect();
        while fixed.chars().count() < len {
            fixed.push('0');
        }
        hint_flags = fixed;
    }

    let state = PersistedState {
        current_level,
        coins: coins.unwrap_or(economy::DEFAULT_COINS),
        hints: hints.unwrap_or(economy::DEFAULT_HINTS),
        answer_row,
        hint_flags,
        last_hint_date,
    };
    (state, warnings)
}

// ══════════════════════════════════════════════════════════════
// Save directory resolution
// ══════════════════════════════════════════════════════════════

fn save_dir() -> PathBuf {
    // 1. Try exe directory (works for local/portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            // Check if writable (system installs like /usr/games/ won't be)
            let test_path = parent.join(".write_test_pixword");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home (~/.local/share/pixword) for system installs
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/pixword");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. Fallback to CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, ProgressStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::at(dir.path().to_path_buf());
        (dir, store)
    }

    #[test]
    fn missing_file_yields_defaults() {
        let (_d, s) = store();
        let (state, warnings) = s.load();
        assert_eq!(state, PersistedState::default());
        assert!(warnings.is_empty());
        assert!(!s.has_save());
    }

    #[test]
    fn save_load_round_trip() {
        let (_d, s) = store();
        let state = PersistedState {
            current_level: 3,
            coins: 25,
            hints: 1,
            answer_row: "C_T".into(),
            hint_flags: "010".into(),
            last_hint_date: NaiveDate::from_ymd_opt(2024, 6, 1),
        };
        s.save(&state).unwrap();
        let (loaded, warnings) = s.load();
        assert_eq!(loaded, state);
        assert!(warnings.is_empty());
        assert!(s.has_save());
    }

    #[test]
    fn save_overwrites_previous_state() {
        let (_d, s) = store();
        s.save(&PersistedState { coins: 5, ..Default::default() }).unwrap();
        s.save(&PersistedState { coins: 99, ..Default::default() }).unwrap();
        assert_eq!(s.load().0.coins, 99);
    }

    #[test]
    fn clear_then_save_defaults_reads_clean() {
        let (_d, s) = store();
        s.save(&PersistedState { current_level: 7, coins: 1, ..Default::default() }).unwrap();
        s.clear();
        assert!(!s.has_save());
        s.save(&PersistedState::default()).unwrap();
        assert_eq!(s.load().0, PersistedState::default());
    }

    #[test]
    fn mismatched_hint_flags_are_repaired() {
        let (_d, s) = store();
        std::fs::write(
            s.path(),
            "CurrentLevel=2\nCoins=4\nHints=0\nCurrentAnswer=AB_\nHintColors=1\n",
        )
        .unwrap();
        let (state, warnings) = s.load();
        assert_eq!(state.hint_flags, "100");
        assert_eq!(warnings.len(), 1);
        assert!(matches!(warnings[0], GameError::CorruptedSave(_)));
    }

    #[test]
    fn garbage_without_level_key_is_no_save() {
        let (_d, s) = store();
        std::fs::write(s.path(), "Coins=999\nnonsense\n").unwrap();
        let (state, _) = s.load();
        assert_eq!(state, PersistedState::default());
    }

    #[test]
    fn cell_snapshot_round_trip() {
        let cells = vec![
            Cell::Filled { letter: 'C', origin: Origin::Player },
            Cell::Filled { letter: 'A', origin: Origin::Hint },
            Cell::Empty,
        ];
        let (row, flags) = snapshot_cells(&cells);
        assert_eq!((row.as_str(), flags.as_str()), ("CA_", "010"));
        assert_eq!(restore_cells(&row, &flags), cells);
    }
}
