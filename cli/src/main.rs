use std::{
    env,
    fs::{self, File},
    io,
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use mimalloc::MiMalloc;
use pox_engine::{perft_divide, perft_full, think, Position, Side};
use tracing::{debug, info, level_filters::LevelFilter, Level};
use tracing_subscriber::{layer::SubscriberExt, prelude::*, util::SubscriberInitExt, EnvFilter, Registry};

use pox_cli::{default_log_path, render_response, BoardArgs, Cli, Commands, LOG_PATH_ENV};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    enable_logging()?;

    match cli.command {
        Commands::Think {
            board,
            search,
            side,
            json,
        } => {
            let pieces = board.load()?;
            let params = search.search_params();
            debug!("{}", params);

            let response = think(&pieces, &params, side)?;
            println!("{}", render_response(&response, json)?);
            Ok(())
        }
        Commands::Perft {
            board,
            depth,
            side,
            full,
        } => cli_perft(&board, depth, side, full),
    }
}

fn cli_perft(board: &BoardArgs, depth: u8, side: Side, full: bool) -> Result<()> {
    let pieces = board.load()?;
    let mut position = Position::from_pieces(&pieces, side).context("Invalid board")?;

    if full {
        let res = perft_full(&position, depth as usize);
        info!("perft depth {} took {:?}", depth, res.time_elapsed);
        println!("{}", res);
        return Ok(());
    }

    let move_counts = perft_divide(&mut position, depth);
    let tot_moves: u64 = move_counts.iter().map(|(_, nodes)| nodes).sum();
    for (mve, move_nodes) in move_counts {
        println!("{}:  {}", mve, move_nodes);
    }
    println!("Total: {}", tot_moves);
    Ok(())
}

fn enable_logging() -> Result<()> {
    let log_path = if let Ok(log_path_str) = env::var(LOG_PATH_ENV) {
        PathBuf::from(log_path_str)
    } else {
        default_log_path()?
    };
    if let Some(log_path_dir) = log_path.parent() {
        if !log_path_dir.as_os_str().is_empty() && !log_path_dir.exists() {
            fs::create_dir_all(log_path_dir).with_context(|| format!("Couldn't create directory {:?}", log_path_dir))?;
        }
    }

    let log_file = File::create(&log_path).with_context(|| format!("Couldn't create file {:?}", log_path))?;

    let stderr_layer = tracing_subscriber::fmt::layer()
        .without_time()
        .with_target(false)
        .with_writer(io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let log_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(log_file)
        .with_filter(LevelFilter::from_level(Level::DEBUG));

    Registry::default().with(stderr_layer).with(log_layer).init();

    Ok(())
}
