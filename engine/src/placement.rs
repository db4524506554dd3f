//! Conversion between the rank/file piece-placement notation used to
//! exchange boards (the first field of a FEN record) and the piece lists the
//! engine consumes.

use crate::position::{Piece, PlacedPiece, Side};
use crate::square::Square;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum PlacementError {
    #[error("num ranks: want 8 got {0}")]
    NumRanks(usize),

    #[error("rank {rank} describes {files} files, want 8")]
    RankLength { rank: u8, files: usize },

    #[error("unknown piece symbol {0:?}")]
    UnknownSymbol(char),
}

/// Parses piece placement, e.g. `rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR`.
/// A full FEN record is accepted, only its first field is read.
pub fn parse_placement(placement: &str) -> Result<Vec<PlacedPiece>, PlacementError> {
    let field = placement.split_whitespace().next().unwrap_or("");
    let ranks: Vec<&str> = field.split('/').collect();
    if ranks.len() != 8 {
        return Err(PlacementError::NumRanks(ranks.len()));
    }

    let mut pieces = Vec::with_capacity(32);
    for (row, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - row as u8;
        let mut file: usize = 0;
        for ch in rank_str.chars() {
            if let Some(empty) = ch.to_digit(10) {
                file += empty as usize;
                continue;
            }
            let piece = Piece::try_from(ch).map_err(PlacementError::UnknownSymbol)?;
            let side = if ch.is_ascii_uppercase() {
                Side::White
            } else {
                Side::Black
            };
            if file < 8 {
                pieces.push(PlacedPiece {
                    piece,
                    side,
                    file: file as u8,
                    rank,
                });
            }
            file += 1;
        }
        if file != 8 {
            return Err(PlacementError::RankLength { rank: rank + 1, files: file });
        }
    }

    Ok(pieces)
}

/// Inverse of [`parse_placement`]. Pieces off the board are ignored.
pub fn to_placement(pieces: &[PlacedPiece]) -> String {
    let mut board = [None; 64];
    for placed in pieces {
        if let Some(square) = placed.square() {
            board[square.index()] = Some((placed.piece, placed.side));
        }
    }

    let mut placement = String::with_capacity(64 + 7);
    let mut curr_empty_count = 0;
    for (idx, square) in Square::list_white_perspective().into_iter().enumerate() {
        match board[square.index()] {
            Some((piece, side)) => {
                if curr_empty_count != 0 {
                    placement += &curr_empty_count.to_string();
                    curr_empty_count = 0;
                }
                let ch = char::from(piece);
                placement.push(if side == Side::White { ch.to_ascii_uppercase() } else { ch });
            }
            None => curr_empty_count += 1,
        }
        if (idx + 1) % 8 == 0 {
            if curr_empty_count != 0 {
                placement += &curr_empty_count.to_string();
                curr_empty_count = 0;
            }
            if idx != 63 {
                placement.push('/');
            }
        }
    }
    placement
}
