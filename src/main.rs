use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use indicatif::*;
use rayon::prelude::*;
use tracing::info;

use std::io::{stdin, stdout, Write};
use std::sync::mpsc::channel;
use std::thread;
use std::time::{Duration, Instant};

use connect4_session::*;

#[derive(Parser, Debug)]
#[command(name = "connect4")]
#[command(about = "Connect 4 against a time-bounded alpha-beta AI")]
struct Cli {
    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play in the terminal (the default)
    Play {
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Let the AI play itself and report the results
    Selfplay {
        /// Number of games to play
        #[arg(long, default_value_t = 8)]
        games: usize,

        /// Print every finished game as a JSON snapshot
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        search: SearchArgs,
    },
}

#[derive(clap::Args, Debug, Default)]
struct SearchArgs {
    /// Maximum search depth, in plies
    #[arg(long)]
    depth: Option<u32>,

    /// Time budget per AI move, in milliseconds
    #[arg(long)]
    time_ms: Option<u64>,
}

impl SearchArgs {
    fn config(&self, mode: GameMode) -> Result<SearchConfig> {
        let mut config = SearchConfig::for_mode(mode);
        if let Some(depth) = self.depth {
            config = config.with_max_depth(depth);
        }
        if let Some(time_ms) = self.time_ms {
            config = config.with_time_budget(Duration::from_millis(time_ms));
        }
        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .map_err(|err| anyhow!("failed to install tracing subscriber: {}", err))?;

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    match cli.command {
        Some(Command::Selfplay {
            games,
            json,
            search,
        }) => selfplay(games, json, &search),
        Some(Command::Play { search }) => play(&search),
        None => play(&SearchArgs::default()),
    }
}

fn ask_yes_no(question: &str) -> Result<bool> {
    let stdin = stdin();
    loop {
        let mut buffer = String::new();
        print!("{} y/n: ", question);
        stdout().flush()?;
        stdin.read_line(&mut buffer)?;
        match buffer.to_lowercase().chars().next() {
            Some('y') => return Ok(true),
            Some('n') => return Ok(false),
            _ => println!("Unknown answer given"),
        }
    }
}

fn play(search: &SearchArgs) -> Result<()> {
    println!("Welcome to Connect 4\n");

    let ai_players = (
        ask_yes_no("Is player 1 AI controlled?")?,
        ask_yes_no("Is player 2 AI controlled?")?,
    );
    let mode = match ai_players {
        (false, false) => GameMode::TwoPlayer,
        (true, true) => GameMode::AiVsAi,
        _ => GameMode::SingleVsAi,
    };

    let mut game = Game::new("terminal");
    game.set_mode_with_config(mode, search.config(mode)?)?;
    let stdin = stdin();

    // game loop
    loop {
        let highlight = game.snapshot().last_move.map(|m| (m.row, m.col));
        game.board().display(highlight)?;

        if game.status() == GameStatus::Finished {
            match game.winner() {
                Winner::One => println!("Player 1 wins!"),
                Winner::Two => println!("Player 2 wins!"),
                _ => println!("Draw!"),
            }
            break;
        }

        let ai_turn = match game.current_player() {
            Player::One => ai_players.0,
            Player::Two => ai_players.1,
        };

        let next_move = if ai_turn {
            println!("AI is thinking...");
            stdout().flush()?;

            // slow down play if both players are AI
            if ai_players == (true, true) {
                thread::sleep(Duration::from_secs(1));
            }

            let column = game
                .select_ai_move(None)
                .ok_or_else(|| anyhow!("AI found no move on a live board"))?;
            if let Some(metrics) = game.last_metrics() {
                println!(
                    "AI plays {} ({}, depth {}, {} nodes, {} ms)",
                    column, metrics.rationale, metrics.depth_reached, metrics.nodes, metrics.elapsed_ms
                );
            }
            column
        } else {
            print!("Move input (0-{}) > ", WIDTH - 1);
            stdout().flush()?;
            let mut input_str = String::new();
            stdin.read_line(&mut input_str)?;

            match input_str.trim().parse::<usize>() {
                Err(_) => {
                    println!("Invalid number: {}", input_str.trim());
                    continue;
                }
                Ok(column) => column,
            }
        };

        if let Err(err) = game.apply_move(next_move) {
            println!("{}", err);
            // try the move again
            continue;
        }
    }
    Ok(())
}

fn play_out(id: String, config: SearchConfig) -> Result<Snapshot> {
    let mut game = Game::new(id);
    game.set_mode_with_config(GameMode::AiVsAi, config)?;
    while game.status() == GameStatus::Playing {
        if game.play_ai_move()?.is_none() {
            return Err(anyhow!("AI found no move on a live board"));
        }
    }
    Ok(game.snapshot())
}

fn selfplay(games: usize, json: bool, search: &SearchArgs) -> Result<()> {
    let config = search.config(GameMode::AiVsAi)?;
    let start = Instant::now();
    info!(games, max_depth = config.max_depth, "starting self-play");

    let (tx, rx) = channel();
    thread::spawn(move || {
        (0..games)
            .into_par_iter()
            .for_each_with(tx, |tx, i| {
                let _ = tx.send(play_out(format!("selfplay-{}", i), config));
            });
    });

    let progress = ProgressBar::new(games as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("Self-play: {bar:40.cyan/blue} {msg} ~{eta} remaining")
            .progress_chars("█▓▒░  "),
    );

    let (mut one, mut two, mut draws) = (0, 0, 0);
    for result in rx {
        let snapshot = result?;
        match snapshot.winner {
            Winner::One => one += 1,
            Winner::Two => two += 1,
            _ => draws += 1,
        }
        if json {
            progress.println(snapshot.to_json()?);
        }
        progress.inc(1);
        progress.set_message(&format!("({} / {})", progress.position(), progress.length()));
    }
    progress.finish();

    println!(
        "{} games in {}: player 1 won {}, player 2 won {}, {} drawn",
        games,
        HumanDuration(start.elapsed()),
        one,
        two,
        draws
    );
    Ok(())
}
