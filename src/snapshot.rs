//! Broadcastable view of a game, with JSON and compact binary encodings

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use std::convert::TryFrom;
use std::io::{Cursor, Read};

use crate::{
    board::{Board, Cell, Player},
    error::SnapshotError,
    game::{GameMode, GameStatus, LastMove, Winner},
    metrics::{Rationale, SearchMetrics},
    HEIGHT, WIDTH,
};

const FRAME_VERSION: u8 = 1;

/// Everything an observer needs to render a game
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: String,
    pub board: Board,
    pub current_player: Player,
    pub mode: Option<GameMode>,
    pub status: GameStatus,
    pub winner: Winner,
    pub last_move: Option<LastMove>,
    pub created_at: u64,
    pub last_activity_at: u64,
    pub last_metrics: Option<SearchMetrics>,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encodes the snapshot as a big-endian binary frame
    ///
    /// The id's length is stored in 16 bits, longer ids are rejected.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        let id_len =
            u16::try_from(self.id.len()).map_err(|_| SnapshotError::IdTooLong(self.id.len()))?;
        let mut buf = Vec::with_capacity(96 + self.id.len());
        self.write_frame(id_len, &mut buf)?;
        Ok(buf)
    }

    fn write_frame(&self, id_len: u16, buf: &mut Vec<u8>) -> std::io::Result<()> {
        buf.write_u8(FRAME_VERSION)?;
        buf.write_u16::<BigEndian>(id_len)?;
        buf.extend_from_slice(self.id.as_bytes());

        for row in self.board.rows().iter() {
            for &cell in row.iter() {
                buf.write_u8(cell.into())?;
            }
        }

        buf.write_u8(self.current_player.into())?;
        buf.write_u8(match self.mode {
            None => 0,
            Some(GameMode::TwoPlayer) => 1,
            Some(GameMode::SingleVsAi) => 2,
            Some(GameMode::AiVsAi) => 3,
        })?;
        buf.write_u8(match self.status {
            GameStatus::Waiting => 0,
            GameStatus::Playing => 1,
            GameStatus::Finished => 2,
        })?;
        buf.write_u8(match self.winner {
            Winner::None => 0,
            Winner::One => 1,
            Winner::Two => 2,
            Winner::Draw => 3,
        })?;

        match self.last_move {
            Some(LastMove { row, col }) => {
                buf.write_u8(1)?;
                buf.write_u8(row as u8)?;
                buf.write_u8(col as u8)?;
            }
            None => buf.write_u8(0)?,
        }

        buf.write_u64::<BigEndian>(self.created_at)?;
        buf.write_u64::<BigEndian>(self.last_activity_at)?;

        match &self.last_metrics {
            Some(metrics) => {
                buf.write_u8(1)?;
                buf.write_u64::<BigEndian>(metrics.elapsed_ms)?;
                buf.write_u32::<BigEndian>(metrics.depth_reached)?;
                buf.write_u64::<BigEndian>(metrics.nodes)?;
                buf.write_u8(metrics.column as u8)?;
                let (tag, depth) = match metrics.rationale {
                    Rationale::ImmediateWinOrBlock => (0, 0),
                    Rationale::OpeningBook => (1, 0),
                    Rationale::SpecialDefense => (2, 0),
                    Rationale::Minimax(depth) => (3, depth),
                    Rationale::FallbackCenter => (4, 0),
                };
                buf.write_u8(tag)?;
                buf.write_u32::<BigEndian>(depth)?;
            }
            None => buf.write_u8(0)?,
        }
        Ok(())
    }

    /// Decodes a frame produced by [`Snapshot::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let mut frame = Cursor::new(bytes);

        let version = frame.read_u8()?;
        if version != FRAME_VERSION {
            return Err(SnapshotError::BadTag {
                field: "version",
                tag: version,
            });
        }

        let id_len = frame.read_u16::<BigEndian>()? as usize;
        let mut id = vec![0; id_len];
        frame.read_exact(&mut id)?;
        let id = String::from_utf8(id)?;

        let mut cells = [[Cell::Empty; WIDTH]; HEIGHT];
        for row in cells.iter_mut() {
            for cell in row.iter_mut() {
                let tag = frame.read_u8()?;
                *cell = Cell::try_from(tag).map_err(|_| SnapshotError::BadTag { field: "cell", tag })?;
            }
        }

        let tag = frame.read_u8()?;
        let current_player =
            Player::try_from(tag).map_err(|_| SnapshotError::BadTag { field: "player", tag })?;

        let mode = match frame.read_u8()? {
            0 => None,
            1 => Some(GameMode::TwoPlayer),
            2 => Some(GameMode::SingleVsAi),
            3 => Some(GameMode::AiVsAi),
            tag => return Err(SnapshotError::BadTag { field: "mode", tag }),
        };
        let status = match frame.read_u8()? {
            0 => GameStatus::Waiting,
            1 => GameStatus::Playing,
            2 => GameStatus::Finished,
            tag => return Err(SnapshotError::BadTag { field: "status", tag }),
        };
        let winner = match frame.read_u8()? {
            0 => Winner::None,
            1 => Winner::One,
            2 => Winner::Two,
            3 => Winner::Draw,
            tag => return Err(SnapshotError::BadTag { field: "winner", tag }),
        };

        let last_move = match frame.read_u8()? {
            0 => None,
            1 => Some(LastMove {
                row: frame.read_u8()? as usize,
                col: frame.read_u8()? as usize,
            }),
            tag => return Err(SnapshotError::BadTag { field: "last move", tag }),
        };

        let created_at = frame.read_u64::<BigEndian>()?;
        let last_activity_at = frame.read_u64::<BigEndian>()?;

        let last_metrics = match frame.read_u8()? {
            0 => None,
            1 => {
                let elapsed_ms = frame.read_u64::<BigEndian>()?;
                let depth_reached = frame.read_u32::<BigEndian>()?;
                let nodes = frame.read_u64::<BigEndian>()?;
                let column = frame.read_u8()? as usize;
                let tag = frame.read_u8()?;
                let depth = frame.read_u32::<BigEndian>()?;
                let rationale = match tag {
                    0 => Rationale::ImmediateWinOrBlock,
                    1 => Rationale::OpeningBook,
                    2 => Rationale::SpecialDefense,
                    3 => Rationale::Minimax(depth),
                    4 => Rationale::FallbackCenter,
                    tag => return Err(SnapshotError::BadTag { field: "rationale", tag }),
                };
                Some(SearchMetrics {
                    elapsed_ms,
                    depth_reached,
                    nodes,
                    column,
                    rationale,
                })
            }
            tag => return Err(SnapshotError::BadTag { field: "metrics", tag }),
        };

        Ok(Self {
            id,
            board: Board::from_cells(cells),
            current_player,
            mode,
            status,
            winner,
            last_move,
            created_at,
            last_activity_at,
            last_metrics,
        })
    }
}
