//! Top-level request: pick a move for one or both sides of a board given as
//! a bare piece list. Every side gets its own position and searcher, so
//! nothing learned for one request or one side carries over to the next.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tracing::{debug_span, info};

use crate::evaluation::{Eval, POSITION_EVALUATOR};
use crate::position::{Piece, PlacedPiece, Position, PositionError, Side};
use crate::search::{NoMoveReason, SearchOutcome, SearchParams, Searcher};
use crate::square::Square;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ThinkError {
    #[error("invalid board: {0}")]
    InvalidBoard(#[from] PositionError),

    #[error("chosen move starts on {0} but no input piece stands there")]
    PieceNotFound(Square),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Deserialize, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SideSelector {
    White,
    Black,
    Both,
}

impl SideSelector {
    pub fn sides(self) -> &'static [Side] {
        match self {
            SideSelector::White => &[Side::White],
            SideSelector::Black => &[Side::Black],
            SideSelector::Both => &[Side::White, Side::Black],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChosenMove {
    pub src: Square,
    pub dest: Square,
    /// Index into the input piece list of the piece being moved.
    pub piece_index: usize,
    pub promotion: Option<Piece>,
    pub score: Eval,
    /// Deepest completed iteration, 0 for the out-of-time fallback.
    pub depth: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Move(ChosenMove),
    NoMove(NoMoveReason),
    /// The other side is already in check, so this side has no move to
    /// answer with. Happens for the side not to move on a mated board.
    OpponentInCheck,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ThinkResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub white: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub black: Option<Outcome>,
}

impl ThinkResponse {
    pub fn get(&self, side: Side) -> Option<&Outcome> {
        match side {
            Side::White => self.white.as_ref(),
            Side::Black => self.black.as_ref(),
        }
    }
}

pub fn think(pieces: &[PlacedPiece], params: &SearchParams, selector: SideSelector) -> Result<ThinkResponse, ThinkError> {
    let mut response = ThinkResponse::default();

    for &side in selector.sides() {
        let outcome = think_for_side(pieces, params, side)?;
        match side {
            Side::White => response.white = Some(outcome),
            Side::Black => response.black = Some(outcome),
        }
    }

    Ok(response)
}

fn think_for_side(pieces: &[PlacedPiece], params: &SearchParams, side: Side) -> Result<Outcome, ThinkError> {
    let _span = debug_span!("think", side = %side).entered();

    let position = match Position::from_pieces(pieces, side) {
        Ok(position) => position,
        Err(PositionError::SideNotToMoveInCheck(in_check)) => {
            info!("{} is already in check, no move for {}", in_check, side);
            return Ok(Outcome::OpponentInCheck);
        }
        Err(err) => return Err(err.into()),
    };
    let mut searcher = Searcher::new(position, params.clone(), POSITION_EVALUATOR);
    let (outcome, info) = searcher.search();

    info!(
        "nodes {} seldepth {} time {}ms timed out {}",
        info.nodes,
        info.seldepth,
        info.time_elapsed.as_millis(),
        info.timed_out
    );

    match outcome {
        SearchOutcome::BestMove { mve, eval, depth } => {
            let piece_index = pieces
                .iter()
                .position(|placed| placed.square() == Some(mve.src))
                .ok_or(ThinkError::PieceNotFound(mve.src))?;
            Ok(Outcome::Move(ChosenMove {
                src: mve.src,
                dest: mve.dest,
                piece_index,
                promotion: mve.promotion,
                score: eval,
                depth,
            }))
        }
        SearchOutcome::NoMove(reason) => Ok(Outcome::NoMove(reason)),
    }
}
