/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (a grid of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// This eliminates flicker caused by full-screen redraws. Everything the
/// game draws is single-width ASCII, so one Cell is exactly one terminal
/// column.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::anim;
use crate::domain::board::{Cell as BoardCell, Origin};
use crate::session::state::{GameState, Phase};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells.
    ///
    /// Using the SAME explicit RGB for `Clear(ClearType::All)` and for
    /// every cell's background keeps the inter-row gap pixels on VTE
    /// terminals the same color as the cells, so no horizontal lines show.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 18, b: 30 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer: different from any
    /// real cell, so every position gets diff'd on the next frame.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    /// Normalize bg: Color::Reset → BASE_BG so every cell carries an
    /// explicit background, never the terminal default.
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg: Self::norm_bg(bg) }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column; `x` may be
    /// negative mid-slide, chars left of column 0 are clipped.
    fn put_str(&mut self, x: i32, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= 0 {
                if cx as usize >= self.width {
                    break;
                }
                self.set(cx as usize, y, Cell::new(ch, fg, bg));
            }
            cx += 1;
        }
    }

    fn fill_row(&mut self, y: usize, fg: Color, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', fg, bg));
        }
    }
}

// ── Renderer ──

/// Vertical layout offsets
const HUD_ROW: usize = 0;
const ART_ROW: usize = 2;

/// Palette
const GOLD: Color = Color::Rgb { r: 255, g: 210, b: 60 };
const GREEN: Color = Color::Rgb { r: 90, g: 255, b: 90 };
const CYAN: Color = Color::Rgb { r: 100, g: 200, b: 255 };
const RED: Color = Color::Rgb { r: 255, g: 70, b: 70 };
const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const HINT_BG: Color = Color::Rgb { r: 0, g: 60, b: 70 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, gs: &GameState) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Phase change → full clear for a clean transition
        if self.last_phase != Some(gs.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(gs.phase);
        }

        self.front.clear();
        match gs.phase {
            Phase::Title => self.compose_title(gs),
            Phase::Playing => self.compose_playing(gs),
            Phase::LevelTransition => self.compose_transition(gs),
            Phase::GameCompleted => self.compose_completed(gs),
        }

        if gs.paused {
            self.compose_pause_overlay();
        }
        if gs.confirm_purchase {
            self.compose_purchase_dialog(gs);
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors at frame start. Not ResetColor: the
        // terminal default may differ from BASE_BG and leave artifacts.
        queue!(
            self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                let mut buf = [0u8; 4];
                queue!(self.writer, Print(&*cell.ch.encode_utf8(&mut buf)))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_hud(&mut self, gs: &GameState) {
        self.front.fill_row(HUD_ROW, Color::White, HUD_BG);
        let hud = format!(
            " Level {}/{}   Coins:{:<4}  Hints:{} ",
            gs.level_index + 1,
            gs.total_levels,
            gs.economy.coins,
            gs.economy.hints,
        );
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
    }

    fn compose_playing(&mut self, gs: &GameState) {
        self.compose_hud(gs);
        let art_rows = self.compose_art(gs, 0);
        let answer_row = ART_ROW + art_rows + 2;
        self.compose_answer_row(gs, answer_row);
        self.compose_pool_row(gs, answer_row + 3);
        self.compose_message_bar(gs, answer_row + 5);

        let help_row = answer_row + 7;
        if help_row < self.front.height {
            let help = " Letters:place  ←→:cursor  Bksp:remove  Tab:hint  F2:shuffle  F3:coins→hint";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
            if help_row + 1 < self.front.height {
                let help2 = " F4:buy coins  F1:pause  Esc:title";
                self.front.put_str(0, help_row + 1, help2, Color::DarkGrey, Color::Reset);
            }
        }
    }

    /// Draw the level picture starting at ART_ROW, optionally shifted
    /// horizontally (level-transition slide). Returns the row count.
    fn compose_art(&mut self, gs: &GameState, x_offset: i32) -> usize {
        let left = self.centered_x(gs.art.iter().map(|l| l.chars().count()).max().unwrap_or(0));
        for (i, line) in gs.art.iter().enumerate() {
            let row = ART_ROW + i;
            if row >= self.front.height {
                break;
            }
            self.front.put_str(left + x_offset, row, line, GOLD, Color::Reset);
        }
        gs.art.len()
    }

    /// The guess buffer: one bracketed slot per cell.
    fn compose_answer_row(&mut self, gs: &GameState, row: usize) {
        if row >= self.front.height {
            return;
        }
        let cells = gs.board.cells();
        let left = self.centered_x(cells.len() * 4);
        let flash = gs.flash_ticks > 0 && (gs.flash_ticks / 2) % 2 == 0;

        for (i, cell) in cells.iter().enumerate() {
            let x = left + (i * 4) as i32;
            let (text, fg, bg) = match cell {
                BoardCell::Empty => ("[ ]".to_string(), Color::DarkGrey, Color::Reset),
                BoardCell::Filled { letter, origin } => {
                    let fg = if flash {
                        RED
                    } else if *origin == Origin::Hint {
                        CYAN
                    } else {
                        Color::White
                    };
                    let bg = if *origin == Origin::Hint { HINT_BG } else { Color::Reset };
                    (format!("[{letter}]"), fg, bg)
                }
            };
            self.front.put_str(x, row, &text, fg, bg);
            if i == gs.cursor && row + 1 < self.front.height {
                self.front.put_str(x + 1, row + 1, "^", GREEN, Color::Reset);
            }
        }
    }

    /// The letter pool: spent keys stay visible but dimmed.
    fn compose_pool_row(&mut self, gs: &GameState, row: usize) {
        if row >= self.front.height {
            return;
        }
        let pool = gs.board.pool();
        let left = self.centered_x(pool.len() * 3);
        for (i, slot) in pool.iter().enumerate() {
            let x = left + (i * 3) as i32;
            let (fg, bg) = if slot.used {
                (Color::Rgb { r: 70, g: 70, b: 85 }, Color::Reset)
            } else {
                (Color::White, Color::Rgb { r: 45, g: 45, b: 70 })
            };
            self.front.put_str(x, row, &format!(" {} ", slot.letter), fg, bg);
        }
    }

    fn compose_message_bar(&mut self, gs: &GameState, row: usize) {
        if row >= self.front.height || gs.message.is_empty() {
            return;
        }
        self.front.fill_row(row, Color::Black, MSG_BG);
        let msg = format!(" {} ", gs.message);
        self.front.put_str(0, row, &msg, Color::Black, MSG_BG);
    }

    /// "Correct!" interstitial: the next level's art slides in from the
    /// left while the banner sits centered.
    fn compose_transition(&mut self, gs: &GameState) {
        self.compose_hud(gs);

        let elapsed = gs.banner_total.saturating_sub(gs.banner_ticks);
        let distance = self.term_w as i32;
        let offset = anim::slide_offset(elapsed, gs.banner_total.max(1), distance) - distance;
        let art_rows = self.compose_art(gs, offset);

        let banner_row = ART_ROW + art_rows + 2;
        if banner_row + 2 < self.front.height {
            let border = "+==============================+";
            let middle = "|      * CORRECT! *            |";
            let cx = self.centered_x(border.len());
            self.front.put_str(cx, banner_row, border, GOLD, Color::Reset);
            self.front.put_str(cx, banner_row + 1, middle, GOLD, Color::Reset);
            self.front.put_str(cx, banner_row + 2, border, GOLD, Color::Reset);
        }
        self.compose_message_bar(gs, banner_row + 4);
    }

    fn compose_title(&mut self, gs: &GameState) {
        let title = [
            r"  ___  _      __    __            _ ",
            r" | _ \(_)__ _ \ \  / /___  _ _  _| |",
            r" |  _/| |\ \ /  \ \/ /| . || '_|/ . |",
            r" |_|  |_|/_\_\   \__/ \___||_|  \___|",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 2 + i, line, GOLD, Color::Reset);
        }

        let subtitle = "-- guess the word behind the picture --";
        self.front.put_str(4, 7, subtitle, GREEN, Color::Reset);

        let menu_base = 10;
        if gs.has_save {
            self.front.put_str(8, menu_base, "ENTER   Continue", GREEN, Color::Reset);
        } else {
            self.front.put_str(8, menu_base, "ENTER   New Game", GREEN, Color::Reset);
        }
        self.front.put_str(8, menu_base + 1, "  Q     Quit", Color::White, Color::Reset);

        let info = format!("        {} levels", gs.total_levels);
        self.front.put_str(8, menu_base + 3, &info, Color::DarkGrey, Color::Reset);

        let help = [
            "In game",
            "  A-Z     place a letter      Bksp  remove",
            "  Tab     hint                F2    reshuffle",
            "  F3      coins -> hint       F4    buy coins",
            "  F1      pause               Esc   back here",
        ];
        for (i, line) in help.iter().enumerate() {
            let color = if i == 0 { GOLD } else { Color::White };
            self.front.put_str(8, menu_base + 5 + i, line, color, Color::Reset);
        }

        if !gs.message.is_empty() {
            let msg_row = self.front.height.saturating_sub(1);
            self.compose_message_bar(gs, msg_row);
        }
    }

    fn compose_completed(&mut self, gs: &GameState) {
        let box_art = [
            "+=========================================+",
            "|   *  ALL LEVELS SOLVED - WELL DONE!  *  |",
            "+=========================================+",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(4, 4 + i, l, GOLD, Color::Reset);
        }
        let levels = format!("You cleared all {} pictures.", gs.total_levels);
        self.front.put_str(6, 9, &levels, GREEN, Color::Reset);
        self.front.put_str(6, 11, "Progress has been reset for a fresh run.", Color::White, Color::Reset);
        self.front.put_str(6, 13, "Press any key to start over from level 1.", Color::DarkGrey, Color::Reset);
    }

    fn compose_pause_overlay(&mut self) {
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let box_w = 28_usize.min(self.term_w);
        let box_h = 7_usize.min(self.term_h);
        let box_x = self.term_w.saturating_sub(box_w) / 2;
        let box_y = self.term_h.saturating_sub(box_h) / 2;

        for y in box_y..box_y + box_h {
            for x in box_x..box_x + box_w {
                self.front.set(x, y, Cell::new(' ', Color::Reset, dim));
            }
        }
        let bx = box_x as i32;
        self.front.put_str(bx + 9, box_y + 1, "PAUSED", GOLD, dim);
        self.front.put_str(bx + 3, box_y + 3, "F1   Resume", CYAN, dim);
        self.front.put_str(bx + 3, box_y + 4, "Esc  Back to Title", CYAN, dim);
        self.front.put_str(bx + 3, box_y + 5, "Progress saved.", Color::DarkGrey, dim);
    }

    fn compose_purchase_dialog(&mut self, gs: &GameState) {
        let bg = Color::Rgb { r: 30, g: 30, b: 55 };
        let box_w = 34_usize.min(self.term_w);
        let box_h = 6_usize.min(self.term_h);
        let box_x = self.term_w.saturating_sub(box_w) / 2;
        let box_y = self.term_h.saturating_sub(box_h) / 2;

        for y in box_y..box_y + box_h {
            for x in box_x..box_x + box_w {
                self.front.set(x, y, Cell::new(' ', Color::Reset, bg));
            }
        }
        let bx = box_x as i32;
        self.front.put_str(bx + 2, box_y + 1, "Out of coins!", GOLD, bg);
        let offer = format!("Buy a pack of {} coins?", gs.coin_pack);
        self.front.put_str(bx + 2, box_y + 2, &offer, Color::White, bg);
        self.front.put_str(bx + 2, box_y + 4, "ENTER: Buy    Esc: Not now", GREEN, bg);
    }

    // ── Helpers ──

    fn centered_x(&self, content_w: usize) -> i32 {
        (self.term_w.saturating_sub(content_w) / 2) as i32
    }
}
