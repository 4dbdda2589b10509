#[cfg(not(feature = "std"))]
fn main() {}

#[cfg(feature = "std")]
use stratego::{
    cli::{parse_command, render_available, render_board, render_event, Command, HELP},
    clock::TurnClock,
    init_logging, GameEvent, NetworkConfig, Phase, Session, ARMY_RANKS, DEFAULT_HOST,
    DEFAULT_PORT,
};

#[cfg(feature = "std")]
use clap::{Args, Parser, Subcommand};
#[cfg(feature = "std")]
use rand::rngs::SmallRng;
#[cfg(feature = "std")]
use rand::SeedableRng;
#[cfg(feature = "std")]
use tokio::io::{AsyncBufReadExt, BufReader};
#[cfg(feature = "std")]
use tokio::sync::mpsc;
#[cfg(feature = "std")]
use tokio::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[cfg(feature = "std")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[command(flatten)]
    opts: GameOpts,
}

#[derive(Args)]
#[cfg(feature = "std")]
struct GameOpts {
    #[arg(long, global = true, help = "Fix RNG seed for reproducible setups (e.g., --seed 12345)")]
    seed: Option<u64>,
    #[arg(long, global = true, help = "Place and send a random setup as soon as connected")]
    auto_setup: bool,
    #[arg(long, global = true, value_name = "SECS", help = "Show a countdown of this many seconds each turn")]
    turn_time: Option<u64>,
    #[arg(long, global = true, value_name = "SECS", help = "Give up on a silent opponent after this many seconds")]
    read_timeout: Option<u64>,
}

#[derive(Subcommand)]
#[cfg(feature = "std")]
enum Commands {
    /// Host a game as RED and wait for an opponent.
    Host {
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Join a hosted game as BLUE.
    Join {
        #[arg(long, default_value = DEFAULT_HOST)]
        host: String,
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
}

#[cfg(feature = "std")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let opts = cli.opts;

    let mut config = match cli.command {
        Commands::Host { port } => {
            println!("Hosting on port {}...", port);
            NetworkConfig::host(port)
        }
        Commands::Join { host, port } => {
            println!("Joining {}:{}...", host, port);
            NetworkConfig::join(&host, port)
        }
    };
    if let Some(secs) = opts.read_timeout {
        config = config.with_read_timeout(Duration::from_secs(secs));
    }

    let mut rng = if let Some(s) = opts.seed {
        println!("Using fixed seed: {} (setup will be reproducible)", s);
        SmallRng::seed_from_u64(s)
    } else {
        let mut seed_rng = rand::rng();
        SmallRng::from_rng(&mut seed_rng)
    };

    let (tx, mut events) = mpsc::unbounded_channel::<GameEvent>();
    let session = Session::connect(&config, Box::new(tx)).await?;
    let me = session.color();
    println!("Connected. You play {}.", me);

    if opts.auto_setup {
        session.random_setup(&mut rng)?;
        session.set_board().await?;
        println!("Random setup sent.");
    }
    println!("{}", render_board(&session.snapshot(), me));
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut clock: Option<TurnClock> = None;
    let turn_time = opts.turn_time.map(Duration::from_secs);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                if let Some(c) = &clock {
                    println!("[{}]", c.remaining());
                }
                match parse_command(&line) {
                    Ok(cmd) => {
                        if !run_command(&session, cmd, &mut rng).await {
                            break;
                        }
                    }
                    Err(e) => println!("{}", e),
                }
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                if let Some(text) = render_event(&event, me) {
                    println!("{}", text);
                }
                match event {
                    GameEvent::TurnChanged { my_turn } => {
                        println!("{}", render_board(&session.snapshot(), me));
                        clock = match turn_time {
                            Some(limit) if my_turn => Some(TurnClock::start(limit)),
                            _ => None,
                        };
                    }
                    GameEvent::GameOver { .. } | GameEvent::Disconnected { .. } => {
                        println!("{}", render_board(&session.snapshot(), me));
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    session.shutdown().await;
    Ok(())
}

/// Execute one command. Returns `false` when the player quits.
#[cfg(feature = "std")]
async fn run_command(session: &Session, cmd: Command, rng: &mut SmallRng) -> bool {
    let me = session.color();
    match cmd {
        Command::Place { row, col, rank } => {
            if !session.add_to_setup(row, col, rank, me) {
                println!("Cannot place {} there.", rank);
            } else {
                println!("{}", render_setup(session));
            }
        }
        Command::Clear { row, col } => match session.remove_from_setup(row, col) {
            Some(rank) => println!("Removed {}.", rank),
            None => println!("Nothing of yours to remove there."),
        },
        Command::Auto => match session.random_setup(rng) {
            Ok(()) => println!("{}", render_setup(session)),
            Err(e) => println!("{}", e),
        },
        Command::Fill => match session.fill_setup() {
            Ok(()) => println!("{}", render_setup(session)),
            Err(e) => println!("{}", e),
        },
        Command::Available => {
            let counts: Vec<_> = ARMY_RANKS
                .iter()
                .map(|&rank| (rank, session.check_available(rank, me)))
                .collect();
            println!("{}", render_available(&counts));
        }
        Command::Ready => match session.set_board().await {
            Ok(()) if session.phase() == Phase::AwaitingSetup => {
                println!("Setup sent. Waiting for the opponent's setup...")
            }
            Ok(()) => {}
            Err(e) => println!("{}", e),
        },
        Command::Move { from, to } => {
            if !session.move_piece(from.0, from.1, to.0, to.1).await {
                println!("Illegal move.");
            }
        }
        Command::Chat(text) => {
            if let Err(e) = session.write_chat_message(&text).await {
                println!("Chat unavailable: {}", e);
            }
        }
        Command::Board => println!("{}", render_board(&session.snapshot(), me)),
        Command::Help => println!("{}", HELP),
        Command::Quit => {
            if let Err(e) = session.write_game_over_msg().await {
                log::debug!("could not notify opponent: {}", e);
            }
            return false;
        }
    }
    true
}

#[cfg(feature = "std")]
fn render_setup(session: &Session) -> String {
    let me = session.color();
    let mut grid = session.snapshot();
    if let Some(band) = stratego::Board::band(me) {
        for (r, row) in grid.iter_mut().enumerate().filter(|(r, _)| band.contains(r)) {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = session
                    .setup_piece(r, c)
                    .map(|rank| stratego::Piece::new(rank, me))
                    .unwrap_or(*cell);
            }
        }
    }
    render_board(&grid, me)
}
