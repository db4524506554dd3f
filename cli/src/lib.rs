use std::{
    fmt::{self, Write as _},
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use pox_engine::{
    parse_placement, NoMoveReason, Outcome, PlacedPiece, SearchParams, Side, SideSelector, ThinkResponse,
};

pub const LOG_PATH_ENV: &str = "POX_LOG_PATH";

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Pick a move for one or both sides of a board.
    Think {
        #[command(flatten)]
        board: BoardArgs,

        #[command(flatten)]
        search: SearchArgs,

        /// Side to move: white, black or both.
        #[arg(long, default_value = "both")]
        side: SideSelector,

        /// Print the response as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Count legal move sequences, split by root move.
    Perft {
        #[command(flatten)]
        board: BoardArgs,

        #[arg(long, default_value_t = 4)]
        depth: u8,

        #[arg(long, default_value = "white")]
        side: Side,

        /// Also print per-ply statistics.
        #[arg(long)]
        full: bool,
    },
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct BoardArgs {
    /// Piece placement, e.g. `rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR`.
    #[arg(long)]
    pub placement: Option<String>,

    /// JSON file holding a list of `{piece, side, file, rank}` objects.
    #[arg(long)]
    pub pieces: Option<PathBuf>,
}

impl BoardArgs {
    pub fn load(&self) -> Result<Vec<PlacedPiece>> {
        match (&self.placement, &self.pieces) {
            (Some(placement), _) => parse_placement(placement)
                .with_context(|| format!("Couldn't parse given placement: `{}`", placement)),
            (None, Some(path)) => load_pieces_file(path),
            (None, None) => bail!("Either --placement or --pieces is required"),
        }
    }
}

pub fn load_pieces_file(path: &Path) -> Result<Vec<PlacedPiece>> {
    let contents = fs::read_to_string(path).with_context(|| format!("Couldn't read {:?}", path))?;
    serde_json::from_str(&contents).with_context(|| format!("Couldn't parse pieces in {:?}", path))
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Deepest iterative deepening iteration.
    #[arg(long)]
    pub depth: Option<u8>,

    /// Time budget per side in milliseconds, 0 for no limit.
    #[arg(long)]
    pub move_time_ms: Option<u64>,

    /// Disable late move reduction.
    #[arg(long)]
    pub no_lmr: bool,

    /// Longest capture sequence past the horizon, 0 for no limit.
    #[arg(long)]
    pub qsearch_depth: Option<u8>,

    /// Also search quiet checks on the first quiescence ply.
    #[arg(long)]
    pub qsearch_checks: bool,

    /// Delta pruning margin in centipawns.
    #[arg(long, conflicts_with = "no_delta_pruning")]
    pub delta_margin: Option<i32>,

    #[arg(long)]
    pub no_delta_pruning: bool,

    /// Transposition table slots, rounded up to a power of two.
    #[arg(long)]
    pub tt_entries: Option<usize>,
}

impl SearchArgs {
    pub fn search_params(&self) -> SearchParams {
        let mut params = SearchParams::default();

        if let Some(depth) = self.depth {
            params.max_depth = depth;
        }
        match self.move_time_ms {
            Some(0) => params.move_time = None,
            Some(millis) => params.move_time = Some(Duration::from_millis(millis)),
            None => {}
        }
        params.late_move_reduction = !self.no_lmr;
        match self.qsearch_depth {
            Some(0) => params.quiescence_max_depth = None,
            Some(depth) => params.quiescence_max_depth = Some(depth),
            None => {}
        }
        params.quiescence_checks = self.qsearch_checks;
        if self.no_delta_pruning {
            params.delta_margin = None;
        } else if let Some(margin) = self.delta_margin {
            params.delta_margin = Some(margin);
        }
        if let Some(tt_entries) = self.tt_entries {
            params.tt_entries = tt_entries;
        }

        params
    }
}

/// One line per side: `white: e2e4 (piece 12, cp 35, depth 5)`.
pub fn format_response(response: &ThinkResponse) -> Result<String, fmt::Error> {
    let mut out = String::new();
    for side in [Side::White, Side::Black] {
        let Some(outcome) = response.get(side) else {
            continue;
        };
        let side_name = side.to_string().to_lowercase();
        match outcome {
            Outcome::Move(chosen) => {
                let promotion = chosen.promotion.map(char::from).map(String::from).unwrap_or_default();
                writeln!(
                    out,
                    "{}: {}{}{} (piece {}, {}, depth {})",
                    side_name,
                    chosen.src.to_string().to_lowercase(),
                    chosen.dest.to_string().to_lowercase(),
                    promotion,
                    chosen.piece_index,
                    chosen.score,
                    chosen.depth
                )?;
            }
            Outcome::NoMove(NoMoveReason::Checkmate) => writeln!(out, "{}: no move (checkmate)", side_name)?,
            Outcome::NoMove(NoMoveReason::Stalemate) => writeln!(out, "{}: no move (stalemate)", side_name)?,
            Outcome::OpponentInCheck => writeln!(out, "{}: no move (opponent in check)", side_name)?,
        }
    }
    Ok(out)
}

pub fn render_response(response: &ThinkResponse, json: bool) -> Result<String> {
    if json {
        serde_json::to_string_pretty(response).context("Couldn't serialize response")
    } else {
        format_response(response).context("Couldn't format response")
    }
}

pub fn default_log_path() -> Result<PathBuf> {
    let mut log_path = dirs::home_dir().context("Home directory not set")?;
    log_path.push(".local/state/poxthink");
    log_path.push("poxthink.log");
    Ok(log_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pox_engine::{think, ChosenMove, Eval, Piece};
    use pox_engine::Square::*;
    use test_case::test_case;
    use testresult::TestResult;

    #[test]
    fn test_default_search_params() {
        let cli = Cli::parse_from(["poxthink", "think", "--placement", "4k3/8/8/8/8/8/8/4K3"]);
        let Commands::Think { search, side, json, .. } = cli.command else {
            panic!("expected think");
        };

        assert_eq!(search.search_params(), SearchParams::default());
        assert_eq!(side, SideSelector::Both);
        assert!(!json);
    }

    #[test]
    fn test_search_flags() {
        let cli = Cli::parse_from([
            "poxthink",
            "think",
            "--placement",
            "4k3/8/8/8/8/8/8/4K3",
            "--depth",
            "3",
            "--move-time-ms",
            "0",
            "--no-lmr",
            "--qsearch-depth",
            "0",
            "--qsearch-checks",
            "--no-delta-pruning",
            "--tt-entries",
            "1024",
            "--side",
            "black",
        ]);
        let Commands::Think { search, side, .. } = cli.command else {
            panic!("expected think");
        };

        assert_eq!(
            search.search_params(),
            SearchParams {
                max_depth: 3,
                move_time: None,
                tt_entries: 1024,
                late_move_reduction: false,
                quiescence_max_depth: None,
                quiescence_checks: true,
                delta_margin: None,
                ..SearchParams::default()
            }
        );
        assert_eq!(side, SideSelector::Black);
    }

    #[test_case(&["poxthink", "think"] ; "no board")]
    #[test_case(&["poxthink", "think", "--placement", "8/8/8/8/8/8/8/8", "--pieces", "p.json"] ; "two boards")]
    #[test_case(&["poxthink", "think", "--placement", "8/8/8/8/8/8/8/8", "--side", "red"] ; "bad side")]
    fn test_rejected_args(args: &[&str]) {
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_load_pieces_file() -> TestResult {
        let path = std::env::temp_dir().join(format!("poxthink-pieces-{}.json", std::process::id()));
        fs::write(
            &path,
            r#"[
                {"piece": "king", "side": "white", "file": 4, "rank": 0},
                {"piece": "king", "side": "black", "file": 4, "rank": 7}
            ]"#,
        )?;

        let board = BoardArgs {
            placement: None,
            pieces: Some(path.clone()),
        };
        let pieces = board.load()?;
        fs::remove_file(&path)?;

        assert_eq!(
            pieces,
            vec![
                PlacedPiece::new(Piece::King, Side::White, E1),
                PlacedPiece::new(Piece::King, Side::Black, E8),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_format_response() -> TestResult {
        let response = ThinkResponse {
            white: Some(Outcome::Move(ChosenMove {
                src: A7,
                dest: A8,
                piece_index: 2,
                promotion: Some(Piece::Queen),
                score: Eval(870),
                depth: 4,
            })),
            black: Some(Outcome::NoMove(NoMoveReason::Stalemate)),
        };

        assert_eq!(
            format_response(&response)?,
            "white: a7a8q (piece 2, cp 870, depth 4)\nblack: no move (stalemate)\n"
        );
        Ok(())
    }

    #[test]
    fn test_format_response_mated_board() -> TestResult {
        let pieces = parse_placement("k7/1Q6/1K6/8/8/8/8/8")?;
        let params = SearchParams {
            max_depth: 2,
            move_time: None,
            ..SearchParams::default()
        };
        let response = think(&pieces, &params, SideSelector::Both)?;

        assert_eq!(
            format_response(&response)?,
            "white: no move (opponent in check)\nblack: no move (checkmate)\n"
        );
        Ok(())
    }

    #[test]
    fn test_render_json() -> TestResult {
        let pieces = parse_placement("k7/8/1Q6/8/8/8/8/7K")?;
        let params = SearchParams {
            max_depth: 2,
            move_time: None,
            ..SearchParams::default()
        };
        let response = think(&pieces, &params, SideSelector::Black)?;

        let value: serde_json::Value = serde_json::from_str(&render_response(&response, true)?)?;
        assert_eq!(value["black"]["no_move"], "stalemate");
        assert!(value.get("white").is_none());
        Ok(())
    }
}
