use anyhow::{anyhow, Result};
use crossterm::{
    cursor::MoveTo,
    style::{style, Attribute, Color, PrintStyledContent},
    QueueableCommand,
};
use serde::{Deserialize, Serialize};

use std::convert::TryFrom;
use std::fmt;
use std::io::{stdout, Write};

use crate::{HEIGHT, WIDTH};

/// Number of 4-cell windows on the board across all four orientations
pub const NUM_WINDOWS: usize =
    HEIGHT * (WIDTH - 3) + WIDTH * (HEIGHT - 3) + 2 * (HEIGHT - 3) * (WIDTH - 3);

/// Every 4-cell window as `(row, col)` coordinates, in the order
/// horizontal, vertical, diagonal ↗, diagonal ↘
pub const WINDOWS: [[(usize, usize); 4]; NUM_WINDOWS] = windows();

const fn windows() -> [[(usize, usize); 4]; NUM_WINDOWS] {
    let mut windows = [[(0, 0); 4]; NUM_WINDOWS];
    let mut n = 0;

    // horizontal
    let mut row = 0;
    while row < HEIGHT {
        let mut col = 0;
        while col + 3 < WIDTH {
            windows[n] = [(row, col), (row, col + 1), (row, col + 2), (row, col + 3)];
            n += 1;
            col += 1;
        }
        row += 1;
    }

    // vertical
    let mut col = 0;
    while col < WIDTH {
        let mut row = 0;
        while row + 3 < HEIGHT {
            windows[n] = [(row, col), (row + 1, col), (row + 2, col), (row + 3, col)];
            n += 1;
            row += 1;
        }
        col += 1;
    }

    // diagonal ↗, anchored at the bottom-left cell
    let mut row = 3;
    while row < HEIGHT {
        let mut col = 0;
        while col + 3 < WIDTH {
            windows[n] = [
                (row, col),
                (row - 1, col + 1),
                (row - 2, col + 2),
                (row - 3, col + 3),
            ];
            n += 1;
            col += 1;
        }
        row += 1;
    }

    // diagonal ↘, anchored at the top-left cell
    let mut row = 0;
    while row + 3 < HEIGHT {
        let mut col = 0;
        while col + 3 < WIDTH {
            windows[n] = [
                (row, col),
                (row + 1, col + 1),
                (row + 2, col + 2),
                (row + 3, col + 3),
            ];
            n += 1;
            col += 1;
        }
        row += 1;
    }

    windows
}

/// One of the two sides of a game. Player one always moves first.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub fn other(self) -> Self {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// The cell value this player's tokens occupy
    pub fn cell(self) -> Cell {
        match self {
            Player::One => Cell::PlayerOne,
            Player::Two => Cell::PlayerTwo,
        }
    }
}

impl From<Player> for u8 {
    fn from(player: Player) -> u8 {
        match player {
            Player::One => 1,
            Player::Two => 2,
        }
    }
}

impl TryFrom<u8> for Player {
    type Error = String;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            1 => Ok(Player::One),
            2 => Ok(Player::Two),
            _ => Err(format!("invalid player tag {}", tag)),
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", u8::from(*self))
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Cell {
    Empty,
    PlayerOne,
    PlayerTwo,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn owner(self) -> Option<Player> {
        match self {
            Cell::Empty => None,
            Cell::PlayerOne => Some(Player::One),
            Cell::PlayerTwo => Some(Player::Two),
        }
    }
}

impl From<Cell> for u8 {
    fn from(cell: Cell) -> u8 {
        match cell {
            Cell::Empty => 0,
            Cell::PlayerOne => 1,
            Cell::PlayerTwo => 2,
        }
    }
}

impl TryFrom<u8> for Cell {
    type Error = String;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(Cell::Empty),
            1 => Ok(Cell::PlayerOne),
            2 => Ok(Cell::PlayerTwo),
            _ => Err(format!("invalid cell tag {}", tag)),
        }
    }
}

/// A 6x7 Connect 4 grid. Row 0 is the top row, pieces fall towards row `HEIGHT - 1`.
///
/// The board is `Copy`, so simulated moves are always made on a private copy.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: [[Cell; WIDTH]; HEIGHT],
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [[Cell::Empty; WIDTH]; HEIGHT],
        }
    }

    /// Builds a board from a sequence of 0-indexed column digits, player one moving first
    pub fn from_moves<S: AsRef<str>>(moves: S) -> Result<Self> {
        let mut board = Self::new();
        let mut player = Player::One;

        for column_char in moves.as_ref().chars() {
            match column_char.to_digit(10).map(|c| c as usize) {
                Some(column) if column < WIDTH => {
                    if board.winner().is_some() {
                        return Err(anyhow!("Invalid position, game is over"));
                    }
                    if board.drop_piece(column, player).is_none() {
                        return Err(anyhow!("Invalid move, column {} full", column));
                    }
                    player = player.other();
                }
                _ => return Err(anyhow!("could not parse '{}' as a valid move", column_char)),
            }
        }
        Ok(board)
    }

    /// Builds a board from a top-to-bottom picture, `.` for empty, `X` for
    /// player one and `O` for player two
    pub fn from_rows(rows: [&str; HEIGHT]) -> Result<Self> {
        let mut board = Self::new();
        for (row, line) in rows.iter().enumerate() {
            let chars: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
            if chars.len() != WIDTH {
                return Err(anyhow!("row {} has {} cells, expected {}", row, chars.len(), WIDTH));
            }
            for (col, c) in chars.into_iter().enumerate() {
                board.cells[row][col] = match c {
                    '.' | '_' => Cell::Empty,
                    'X' | 'x' | '1' => Cell::PlayerOne,
                    'O' | 'o' | '2' => Cell::PlayerTwo,
                    _ => return Err(anyhow!("could not parse '{}' as a cell", c)),
                };
            }
        }

        // pieces can't float above an empty cell
        for col in 0..WIDTH {
            for row in 0..HEIGHT - 1 {
                if !board.cells[row][col].is_empty() && board.cells[row + 1][col].is_empty() {
                    return Err(anyhow!("floating piece at row {}, column {}", row, col));
                }
            }
        }
        Ok(board)
    }

    pub fn from_cells(cells: [[Cell; WIDTH]; HEIGHT]) -> Self {
        Self { cells }
    }

    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row][col]
    }

    pub fn rows(&self) -> &[[Cell; WIDTH]; HEIGHT] {
        &self.cells
    }

    pub fn playable(&self, column: usize) -> bool {
        column < WIDTH && self.cells[0][column].is_empty()
    }

    /// Columns that can still accept a piece, in ascending order
    pub fn valid_moves(&self) -> impl Iterator<Item = usize> + '_ {
        (0..WIDTH).filter(move |&column| self.playable(column))
    }

    pub fn lowest_empty_row(&self, column: usize) -> Option<usize> {
        if column >= WIDTH {
            return None;
        }
        (0..HEIGHT).rev().find(|&row| self.cells[row][column].is_empty())
    }

    /// Drops a piece into `column`, returning the row it landed in
    pub fn drop_piece(&mut self, column: usize, player: Player) -> Option<usize> {
        let row = self.lowest_empty_row(column)?;
        self.cells[row][column] = player.cell();
        Some(row)
    }

    /// Returns a copy of the board with `player`'s piece dropped into `column`,
    /// along with the row it landed in
    pub fn with_drop(&self, column: usize, player: Player) -> Option<(Self, usize)> {
        let mut next = *self;
        let row = next.drop_piece(column, player)?;
        Some((next, row))
    }

    pub fn piece_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| !cell.is_empty())
            .count()
    }

    pub fn is_full(&self) -> bool {
        self.cells[0].iter().all(|cell| !cell.is_empty())
    }

    /// Checks whether the piece at `(row, col)` is part of a run of 4 or more,
    /// scanning outwards from it in each of the four directions
    pub fn is_winning_placement(&self, row: usize, col: usize) -> bool {
        let cell = self.cells[row][col];
        if cell.is_empty() {
            return false;
        }

        for (dr, dc) in [(0i32, 1i32), (1, 0), (-1, 1), (1, 1)].iter() {
            let mut run = 1;
            for sign in [-1i32, 1].iter() {
                let mut r = row as i32 + dr * sign;
                let mut c = col as i32 + dc * sign;
                while r >= 0
                    && r < HEIGHT as i32
                    && c >= 0
                    && c < WIDTH as i32
                    && self.cells[r as usize][c as usize] == cell
                {
                    run += 1;
                    r += dr * sign;
                    c += dc * sign;
                }
            }
            if run >= 4 {
                return true;
            }
        }

        false
    }

    /// Whether `player` would win immediately by dropping into `column`
    pub fn wins_by_dropping(&self, column: usize, player: Player) -> bool {
        match self.with_drop(column, player) {
            Some((next, row)) => next.is_winning_placement(row, column),
            None => false,
        }
    }

    /// Scans every window on the board for four matching pieces
    pub fn winner(&self) -> Option<Player> {
        WINDOWS.iter().find_map(|window| {
            let first = self.cells[window[0].0][window[0].1];
            if !first.is_empty() && window.iter().all(|&(r, c)| self.cells[r][c] == first) {
                first.owner()
            } else {
                None
            }
        })
    }

    pub fn is_terminal(&self) -> bool {
        self.winner().is_some() || self.is_full()
    }

    /// Renders the board to stdout, underlining the cell at `highlight`
    pub fn display(&self, highlight: Option<(usize, usize)>) -> Result<()> {
        let mut stdout = stdout();

        let cols: String = (0..WIDTH).map(|x| x.to_string()).collect();
        stdout.queue(PrintStyledContent(style(cols + "\n")))?;
        for _ in 0..HEIGHT {
            stdout.queue(PrintStyledContent(style("\n")))?;
        }
        stdout.flush()?;

        let (origin_x, origin_y) = crossterm::cursor::position()?;

        for (row, cells) in self.cells.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                let (pos_x, pos_y) = (
                    origin_x + col as u16,
                    origin_y - (HEIGHT - 1 - row) as u16,
                );
                let attribute = if highlight == Some((row, col)) {
                    Attribute::Underlined
                } else {
                    Attribute::Bold
                };

                stdout
                    .queue(MoveTo(pos_x, pos_y))?
                    .queue(PrintStyledContent(
                        style("O")
                            .attribute(attribute)
                            .on(Color::DarkBlue)
                            .with(match cell {
                                Cell::PlayerOne => Color::Red,
                                Cell::PlayerTwo => Color::Yellow,
                                Cell::Empty => Color::DarkBlue,
                            }),
                    ))?;
            }
        }
        stdout
            .queue(MoveTo(origin_x + WIDTH as u16, origin_y))?
            .queue(PrintStyledContent(style("\n")))?;
        stdout.flush()?;
        Ok(())
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
