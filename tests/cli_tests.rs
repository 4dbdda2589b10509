use log::LevelFilter;
use stratego::cli::{
    coord_to_string, parse_command, parse_coord, render_available, render_board, render_event,
    Command,
};
use stratego::clock::{format_clock, TurnClock};
use stratego::{
    parse_level, ChatMessage, Color, GameEngine, GameEvent, GameStatus, Piece, Rank,
};
use tokio::time::Duration;

#[test]
fn coordinates() {
    assert_eq!(parse_coord("A1"), Some((0, 0)));
    assert_eq!(parse_coord("j10"), Some((9, 9)));
    assert_eq!(parse_coord("C7"), Some((6, 2)));
    assert_eq!(parse_coord("K1"), None);
    assert_eq!(parse_coord("A0"), None);
    assert_eq!(parse_coord("A11"), None);
    assert_eq!(parse_coord("1A"), None);
    assert_eq!(parse_coord("A"), None);
    assert_eq!(coord_to_string(6, 2), "C7");
    assert_eq!(parse_coord(&coord_to_string(9, 0)), Some((9, 0)));
}

#[test]
fn commands() {
    assert_eq!(
        parse_command("place a7 marshal"),
        Ok(Command::Place {
            row: 6,
            col: 0,
            rank: Rank::Marshal
        })
    );
    assert_eq!(
        parse_command("p B10 b"),
        Ok(Command::Place {
            row: 9,
            col: 1,
            rank: Rank::Bomb
        })
    );
    assert_eq!(
        parse_command("move B7 B6"),
        Ok(Command::Move {
            from: (6, 1),
            to: (5, 1)
        })
    );
    assert_eq!(parse_command("clear A7"), Ok(Command::Clear { row: 6, col: 0 }));
    assert_eq!(
        parse_command("chat  hello there "),
        Ok(Command::Chat("hello there".into()))
    );
    assert_eq!(parse_command("READY"), Ok(Command::Ready));
    assert_eq!(parse_command("q"), Ok(Command::Quit));
    assert_eq!(parse_command("avail"), Ok(Command::Available));

    assert!(parse_command("place A7").is_err());
    assert!(parse_command("place A7 dragon").is_err());
    assert!(parse_command("move B7").is_err());
    assert!(parse_command("chat").is_err());
    assert!(parse_command("dance").is_err());
    assert!(parse_command("").is_err());
}

#[test]
fn board_hides_the_opponent() {
    let mut red = GameEngine::new(Color::Red);
    red.commit_setup().unwrap();
    red.board_mut()
        .set_position(3, 0, Piece::new(Rank::Marshal, Color::Blue))
        .unwrap();
    let text = render_board(&red.board().snapshot(), Color::Red);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 11);
    assert!(lines[0].contains("A B C D E F G H I J"));
    // row 4 holds the hidden blue marshal
    assert!(lines[4].starts_with(" 4  ?"));
    // lakes on rows 5 and 6
    assert_eq!(lines[5].matches('~').count(), 4);
    // red's own front row is visible
    assert!(lines[7].starts_with(" 7  M G"));
}

#[test]
fn events_render_from_the_viewer_side() {
    let me = Color::Blue;
    assert_eq!(
        render_event(&GameEvent::TurnChanged { my_turn: true }, me).as_deref(),
        Some("Your move.")
    );
    assert_eq!(
        render_event(
            &GameEvent::GameOver {
                status: GameStatus::Won(Color::Blue)
            },
            me
        )
        .as_deref(),
        Some("You win!")
    );
    let chat = GameEvent::Chat(ChatMessage {
        text: "hi".into(),
        color: Color::Red,
    });
    assert_eq!(render_event(&chat, me).as_deref(), Some("[opponent] hi"));
    assert!(render_event(
        &GameEvent::Position(stratego::SinglePositionMessage::game_over()),
        me
    )
    .is_none());
}

#[test]
fn available_listing() {
    assert_eq!(
        render_available(&[(Rank::Scout, 2), (Rank::Flag, 0), (Rank::Bomb, 1)]),
        "scout x2, bomb x1"
    );
    assert_eq!(render_available(&[(Rank::Flag, 0)]), "all pieces placed");
}

#[test]
fn clock_format() {
    assert_eq!(format_clock(0), "00:00");
    assert_eq!(format_clock(999), "00:00");
    assert_eq!(format_clock(61_000), "01:01");
    assert_eq!(format_clock(600_000), "10:00");
}

#[tokio::test(flavor = "multi_thread")]
async fn clock_counts_down_to_zero() {
    let clock = TurnClock::start(Duration::from_millis(200));
    assert_eq!(clock.remaining(), "00:00");
    let mut updates = clock.subscribe();
    tokio::time::timeout(Duration::from_secs(5), async {
        while !clock.is_expired() {
            if updates.changed().await.is_err() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    })
    .await
    .expect("clock never expired");
    assert_eq!(clock.remaining(), "00:00");
}

#[tokio::test(flavor = "multi_thread")]
async fn stopped_clock_is_not_expired() {
    let clock = TurnClock::start(Duration::from_secs(90));
    assert_eq!(clock.remaining(), "01:30");
    clock.stop();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!clock.is_expired());
    let shown = clock.remaining();
    assert!(shown == "01:30" || shown == "01:29");
}

#[test]
fn log_levels() {
    assert_eq!(parse_level(Some("debug"), LevelFilter::Info), LevelFilter::Debug);
    assert_eq!(parse_level(Some(" WARN "), LevelFilter::Info), LevelFilter::Warn);
    assert_eq!(parse_level(Some("loud"), LevelFilter::Info), LevelFilter::Info);
    assert_eq!(parse_level(None, LevelFilter::Error), LevelFilter::Error);
}
