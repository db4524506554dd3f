pub mod evaluation;
pub mod move_gen;
pub mod perft;
pub mod placement;
pub mod position;
pub mod search;
pub mod square;
pub mod think;
pub mod transposition_table;

pub use evaluation::{piece_value, Eval, EvaluatePosition, PositionEvaluator, POSITION_EVALUATOR};
pub use move_gen::{gives_check, has_legal_move, is_legal, is_square_attacked, legal_moves, pseudo_moves, MoveList};
pub use perft::{perft, perft_divide, perft_full, PerftDepthResult, PerftResult};
pub use placement::{parse_placement, to_placement, PlacementError};
pub use position::{CastleSide, CastlingRights, Move, Piece, PlacedPiece, Position, PositionError, PositionKey, Side};
pub use search::{search, NoMoveReason, SearchOutcome, SearchParams, SearchResultInfo, Searcher, MAX_PLY};
pub use square::Square;
pub use think::{think, ChosenMove, Outcome, SideSelector, ThinkError, ThinkResponse};
pub use transposition_table::{EvalType, TranspositionTable, DEFAULT_TRANSPOSITION_TABLE_ENTRIES};
