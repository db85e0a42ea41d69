/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// This eliminates flicker caused by full-screen redraws.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::Cell as GridCell;
use crate::sim::world::{Phase, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 8],
    ch_len: u8,
    fg: Color,
    bg: Color,
    wide: bool,    // true = this char occupies 2 terminal columns
    cont: bool,    // true = continuation of previous wide char (skip render)
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so the
    /// gap color between rows matches the cell color on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 24, b: 20 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0, 0, 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: false,
    };

    const WIDE_CONT: Cell = Cell {
        ch: [0; 8],
        ch_len: 0,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: true,
    };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0, 0, 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        let len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.ch_len = len;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn from_char_wide(c: char, bg: Color) -> Self {
        let mut cell = Self::from_char(c, Color::Reset, bg);
        cell.wide = true;
        cell
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or("?")
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
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
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

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width { break; }
            self.set(cx, y, Cell::from_char(ch, fg, bg));
            cx += 1;
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::from_char(' ', Color::White, bg));
        }
    }
}

// ── What a board cell shows ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CellKind {
    Head,
    Body,
    Food,
    Empty,
}

/// Classify board cell (x, y). Head beats body, body beats food.
pub fn cell_kind(w: &WorldState, x: i32, y: i32) -> CellKind {
    let c = GridCell::new(x, y);
    if w.head() == c {
        CellKind::Head
    } else if w.occupies(c) {
        CellKind::Body
    } else if w.food == c {
        CellKind::Food
    } else {
        CellKind::Empty
    }
}

// ── Renderer ──

/// Each game cell = 2 terminal columns.
const CELL_W: usize = 2;

/// Layout rows
const TITLE_ROW: usize = 0;
const HUD_ROW: usize = 1;
const BOARD_ROW: usize = 3;   // top border; cells start one row below
const BOARD_COL: usize = 2;   // left border; cells start one column right

const HUD_BG: Color = Color::Rgb { r: 20, g: 60, b: 30 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const TILE_BG: Color = Color::Rgb { r: 31, g: 41, b: 55 };
const GREEN: Color = Color::Rgb { r: 74, g: 222, b: 128 };
const YELLOW: Color = Color::Rgb { r: 250, g: 204, b: 21 };
const RED: Color = Color::Rgb { r: 239, g: 68, b: 68 };
const FRAME: Color = Color::Rgb { r: 75, g: 85, b: 99 };

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
        // Force full repaint on first frame: back ≠ front for every cell.
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

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
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

        // Detect phase change → clear for clean transition
        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        self.compose(world);
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    fn compose(&mut self, world: &WorldState) {
        self.front.clear();
        match world.phase {
            Phase::Title => self.compose_title(world),
            Phase::Playing => {
                self.compose_game(world);
                if world.paused {
                    self.compose_pause_overlay(world);
                }
            }
            Phase::GameOver => self.compose_game_over(world),
        }
        self.compose_message(world);
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the terminal default.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                // Skip continuation cells (right half of wide emoji)
                if cell.cont {
                    if cell != prev { need_move = true; }
                    x += 1;
                    continue;
                }

                let cont_changed = cell.wide
                    && x + 1 < self.front.width
                    && self.front.get(x + 1, y) != self.back.get(x + 1, y);

                if cell == prev && !cont_changed {
                    need_move = true;
                    x += 1;
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

                queue!(self.writer, Print(cell.as_str()))?;

                if cell.wide {
                    last_x = x + 1;
                    x += 2;
                } else {
                    last_x = x;
                    x += 1;
                }
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_title(&mut self, w: &WorldState) {
        let banner = [
            r"  ___            _          __  __             _       ",
            r" / __| _ _  __ _| |__ ___  |  \/  | __ _  _ _  (_) __ _ ",
            r" \__ \| ' \/ _` | / // -_) | |\/| |/ _` || ' \ | |/ _` |",
            r" |___/|_||_\__,_|_\_\\___| |_|  |_|\__,_||_||_||_|\__,_|",
        ];
        for (i, line) in banner.iter().enumerate() {
            self.front.put_str(2, 2 + i, line, GREEN, Color::Reset);
        }

        let welcome = "Welcome to Snake Mania";
        let wx = 2 + banner[1].len().saturating_sub(welcome.chars().count()) / 2;
        self.front.put_str(wx, 7, welcome, Color::White, Color::Reset);

        let menu_base = 10;
        self.front.put_str(8, menu_base, "ENTER   Start Game", GREEN, Color::Reset);
        self.front.put_str(8, menu_base + 1, "  Q     Quit", Color::White, Color::Reset);

        let high = format!("High score: {}", w.high_score);
        self.front.put_str(8, menu_base + 3, &high, YELLOW, Color::Reset);

        let help = [
            "Controls",
            "  Arrow keys   Steer",
            "  P / F1       Pause",
            "  ESC          Back to title",
        ];
        let help_base = menu_base + 5;
        for (i, line) in help.iter().enumerate() {
            let color = if i == 0 { YELLOW } else { Color::DarkGrey };
            self.front.put_str(8, help_base + i, line, color, Color::Reset);
        }
    }

    fn compose_game(&mut self, w: &WorldState) {
        // ── Heading + HUD ──
        self.front.put_str(1, TITLE_ROW, "Let The Hunt Begin", Color::White, Color::Reset);

        self.front.fill_row(HUD_ROW, HUD_BG);
        let score = format!(" Score: {:<6}", w.score);
        let high = format!("High: {:<6}", w.high_score);
        self.front.put_str(0, HUD_ROW, &score, GREEN, HUD_BG);
        self.front.put_str(score.len() + 2, HUD_ROW, &high, YELLOW, HUD_BG);

        // ── Board ──
        let size = w.rules.board_size.max(0) as usize;
        self.compose_frame(size);
        for gy in 0..size {
            for gx in 0..size {
                let col = BOARD_COL + 1 + gx * CELL_W;
                let row = BOARD_ROW + 1 + gy;
                self.compose_cell(cell_kind(w, gx as i32, gy as i32), col, row);
            }
        }

        // ── Help bar ──
        let help_row = BOARD_ROW + size + 3;
        self.front.put_str(1, help_row, "Use Arrow Keys to Move   P:Pause  ESC:Title", Color::DarkGrey, Color::Reset);
    }

    /// Box around the board.
    fn compose_frame(&mut self, size: usize) {
        let left = BOARD_COL;
        let right = BOARD_COL + 1 + size * CELL_W;
        let top = BOARD_ROW;
        let bottom = BOARD_ROW + size + 1;

        for x in left + 1..right {
            self.front.set(x, top, Cell::from_char('─', FRAME, Color::Reset));
            self.front.set(x, bottom, Cell::from_char('─', FRAME, Color::Reset));
        }
        for y in top + 1..bottom {
            self.front.set(left, y, Cell::from_char('│', FRAME, Color::Reset));
            self.front.set(right, y, Cell::from_char('│', FRAME, Color::Reset));
        }
        self.front.set(left, top, Cell::from_char('╭', FRAME, Color::Reset));
        self.front.set(right, top, Cell::from_char('╮', FRAME, Color::Reset));
        self.front.set(left, bottom, Cell::from_char('╰', FRAME, Color::Reset));
        self.front.set(right, bottom, Cell::from_char('╯', FRAME, Color::Reset));
    }

    fn compose_cell(&mut self, kind: CellKind, col: usize, row: usize) {
        let glyph = match kind {
            CellKind::Head => Some('🐍'),
            CellKind::Body => Some('🟩'),
            CellKind::Food => Some('🍎'),
            CellKind::Empty => None,
        };
        match glyph {
            Some(ch) => {
                self.front.set(col, row, Cell::from_char_wide(ch, TILE_BG));
                self.front.set(col + 1, row, Cell::WIDE_CONT);
            }
            None => {
                self.front.set(col, row, Cell::from_char(' ', Color::Reset, TILE_BG));
                self.front.set(col + 1, row, Cell::from_char(' ', Color::Reset, TILE_BG));
            }
        }
    }

    fn compose_game_over(&mut self, w: &WorldState) {
        let box_art = [
            "╔══════════════════════════╗",
            "║        Game Over!        ║",
            "╚══════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(6, 4 + i, l, RED, Color::Reset);
        }
        let score = format!("◈ Score: {}", w.score);
        let high = format!("◈ High:  {}", w.high_score);
        self.front.put_str(8, 9, &score, GREEN, Color::Reset);
        self.front.put_str(8, 10, &high, YELLOW, Color::Reset);
        if w.new_high_score {
            self.front.put_str(8, 11, "★ NEW HIGH SCORE ★", YELLOW, Color::Reset);
        }
        self.front.put_str(8, 13, "▸ ENTER / R: Restart", GREEN, Color::Reset);
        self.front.put_str(8, 14, "▸ ESC:       Back to Title", Color::DarkGrey, Color::Reset);
    }

    fn compose_pause_overlay(&mut self, w: &WorldState) {
        let size = w.rules.board_size.max(0) as usize;
        let label = "  PAUSED  [P] Resume  ";
        let board_cols = size * CELL_W;
        let x = BOARD_COL + 1 + board_cols.saturating_sub(label.len()) / 2;
        let y = BOARD_ROW + 1 + size / 2;
        self.front.put_str(x, y, label, Color::Black, YELLOW);
    }

    fn compose_message(&mut self, w: &WorldState) {
        if w.message.is_empty() { return; }
        let row = self.front.height.saturating_sub(1);
        let msg = format!(" ◈ {} ", w.message);
        self.front.fill_row(row, MSG_BG);
        self.front.put_str(0, row, &msg, Color::Black, MSG_BG);
    }
}
