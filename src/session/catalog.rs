/// Level catalog loader.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.txt` files)
///   2. Built-in embedded levels
///
/// ## File naming: `<levelNumber>_<answer>.txt`
///   The file body is the level's ASCII picture. The answer is
///   case-normalized to uppercase. Malformed names (missing separator,
///   non-integer number, empty or non-alphabetic answer, duplicate
///   number) are skipped with a reported error and excluded; they reduce
///   the playable level count but never abort the build.
///
/// The catalog is immutable once built, sorted ascending by level number.
/// Lookup by number is defensive: a gap or a stale saved number yields
/// `None`, never a blind index. Progression follows catalog order, so a
/// numbering gap does not strand the player.

use std::path::Path;

use crate::domain::error::GameError;

/// One playable level: number, picture, answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelRecord {
    pub number: u32,
    pub answer: String,
    pub art: Vec<String>,
}

pub struct LevelCatalog {
    levels: Vec<LevelRecord>,
}

impl LevelCatalog {
    /// Build from the levels directory, falling back to the embedded set
    /// when the directory is absent or yields nothing usable.
    pub fn load(dir: &Path) -> (Self, Vec<GameError>) {
        let mut warnings = vec![];
        let mut records = vec![];

        if dir.is_dir() {
            if let Ok(entries) = std::fs::read_dir(dir) {
                for entry in entries.flatten() {
                    let path = entry.path();
                    if !path.extension().is_some_and(|e| e == "txt") {
                        continue;
                    }
                    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
                    match parse_entry_name(&stem) {
                        Ok((number, answer)) => {
                            let art = std::fs::read_to_string(&path)
                                .map(|body| body.lines().map(str::to_string).collect())
                                .unwrap_or_default();
                            records.push(LevelRecord { number, answer, art });
                        }
                        Err(e) => warnings.push(e),
                    }
                }
            }
        }

        if records.is_empty() {
            records = embedded_levels();
        }

        let (catalog, mut dup_warnings) = Self::from_records(records);
        warnings.append(&mut dup_warnings);
        (catalog, warnings)
    }

    /// Sort by number and drop duplicates, reporting each dropped entry.
    pub fn from_records(mut records: Vec<LevelRecord>) -> (Self, Vec<GameError>) {
        records.sort_by_key(|r| r.number);
        let mut warnings = vec![];
        let mut levels: Vec<LevelRecord> = vec![];
        for record in records {
            if levels.last().is_some_and(|prev| prev.number == record.number) {
                warnings.push(GameError::MalformedCatalogName {
                    name: format!("{}_{}", record.number, record.answer),
                    reason: "duplicate level number".into(),
                });
                continue;
            }
            levels.push(record);
        }
        (LevelCatalog { levels }, warnings)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Lookup by level number. Tolerates gaps: unknown numbers are `None`.
    pub fn get(&self, number: u32) -> Option<&LevelRecord> {
        self.levels
            .binary_search_by_key(&number, |r| r.number)
            .ok()
            .map(|i| &self.levels[i])
    }

    pub fn first(&self) -> Option<&LevelRecord> {
        self.levels.first()
    }

    /// The record after the given number in catalog order, or `None` at
    /// the end. Works even when `number` itself is not in the catalog.
    pub fn next_after(&self, number: u32) -> Option<&LevelRecord> {
        self.levels.iter().find(|r| r.number > number)
    }

    /// Zero-based position in catalog order, for "Level x/y" display.
    pub fn index_of(&self, number: u32) -> Option<usize> {
        self.levels
            .binary_search_by_key(&number, |r| r.number)
            .ok()
    }
}

/// Parse `<levelNumber>_<answer>` from a file stem.
fn parse_entry_name(stem: &str) -> Result<(u32, String), GameError> {
    let malformed = |reason: &str| GameError::MalformedCatalogName {
        name: stem.to_string(),
        reason: reason.to_string(),
    };

    let (num_part, answer_part) = stem
        .split_once('_')
        .ok_or_else(|| malformed("missing '_' separator"))?;
    let number: u32 = num_part
        .parse()
        .map_err(|_| malformed("level number is not an integer"))?;
    if number == 0 {
        return Err(malformed("level numbers start at 1"));
    }
    if answer_part.is_empty() || !answer_part.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(malformed("answer must be letters only"));
    }
    Ok((number, answer_part.to_ascii_uppercase()))
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

fn embedded_levels() -> Vec<LevelRecord> {
    vec![
        make_embedded(1, "CAT", &[
            r"  /\_/\   ",
            r" ( o.o )  ",
            r"  > ^ <   ",
            r" /     \  ",
            r"(       ) ",
            r" \_m_m_/  ",
        ]),
        make_embedded(2, "SUN", &[
            r"   \ | /   ",
            r"    .-.    ",
            r" --( * )-- ",
            r"    `-'    ",
            r"   / | \   ",
        ]),
        make_embedded(3, "KEY", &[
            r"  .--.        ",
            r" /    \ ____  ",
            r"|  ()  |____| ",
            r" \    /  |_|  ",
            r"  `--'        ",
        ]),
        make_embedded(4, "BOAT", &[
            r"      |\      ",
            r"      | \     ",
            r"      |  \    ",
            r"      |___\   ",
            r" \--------/   ",
            r"~~~~~~~~~~~~~~",
        ]),
        make_embedded(5, "HOUSE", &[
            r"      /\      ",
            r"     /  \     ",
            r"    /____\    ",
            r"    |    |    ",
            r"    | [] |    ",
            r"    |____|    ",
        ]),
    ]
}

fn make_embedded(number: u32, answer: &str, art: &[&str]) -> LevelRecord {
    LevelRecord {
        number,
        answer: answer.to_string(),
        art: art.iter().map(|s| s.to_string()).collect(),
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
