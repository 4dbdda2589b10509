use std::sync::{Arc, Mutex};

use stratego::{
    BoardError, Color, EventSink, GameEngine, GameEvent, GameStatus, MoveError, Phase, Piece, Rank,
    SetupError, SinglePositionMessage, TurnMessages, ARMY_SIZE, MESSAGES_PER_TURN,
};

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<GameEvent>>>);

impl EventSink for Recorder {
    fn publish(&mut self, event: GameEvent) {
        self.0.lock().unwrap().push(event);
    }
}

fn with_placements(color: Color, placements: &[(usize, usize, Rank)]) -> GameEngine {
    let mut engine = GameEngine::new(color);
    for &(row, col, rank) in placements {
        engine.add_to_setup(row, col, rank, color).unwrap();
    }
    engine
}

/// Commit and exchange both setups, then start the battle.
fn exchange(red: &mut GameEngine, blue: &mut GameEngine) {
    let red_msg = red.commit_setup().unwrap();
    red.setup_transmitted();
    let blue_msg = blue.commit_setup().unwrap();
    blue.setup_transmitted();
    red.apply_setup(&blue_msg).unwrap();
    blue.apply_setup(&red_msg).unwrap();
    assert!(red.begin_battle());
    assert!(blue.begin_battle());
}

fn play(
    mover: &mut GameEngine,
    other: &mut GameEngine,
    from: (usize, usize),
    to: (usize, usize),
) -> TurnMessages {
    let msgs = mover.move_piece(from.0, from.1, to.0, to.1).unwrap();
    other.apply_remote_turn(&msgs).unwrap();
    assert_eq!(mover.board().snapshot(), other.board().snapshot());
    msgs
}

fn assert_conserved(engine: &GameEngine) {
    for color in [Color::Red, Color::Blue] {
        assert_eq!(
            engine.board().pieces_on_board(color),
            engine.board().inventory(color).unwrap().total(),
            "{} inventory out of step with the grid",
            color
        );
    }
}

/// Red plays scouts, miner, spy and marshal on its front row; blue faces
/// them with a sergeant, bomb, marshal and flag, plus a scout on the right
/// edge for waiting moves.
fn standard_game() -> (GameEngine, GameEngine) {
    let mut red = with_placements(
        Color::Red,
        &[
            (6, 0, Rank::Scout),
            (6, 1, Rank::Miner),
            (6, 4, Rank::Spy),
            (6, 5, Rank::Scout),
            (6, 8, Rank::Sergeant),
            (6, 9, Rank::Marshal),
        ],
    );
    let mut blue = with_placements(
        Color::Blue,
        &[
            (3, 0, Rank::Sergeant),
            (3, 1, Rank::Bomb),
            (3, 4, Rank::Marshal),
            (3, 5, Rank::Flag),
            (3, 8, Rank::Bomb),
            (3, 9, Rank::Scout),
        ],
    );
    exchange(&mut red, &mut blue);
    (red, blue)
}

fn blue_waits(blue: &mut GameEngine, red: &mut GameEngine) {
    if blue.position(3, 9).unwrap().rank == Rank::Scout {
        play(blue, red, (3, 9), (4, 9));
    } else {
        play(blue, red, (4, 9), (3, 9));
    }
}

#[test]
fn setups_exchange_in_either_order() {
    let mut red = GameEngine::new(Color::Red);
    let mut blue = GameEngine::new(Color::Blue);
    assert_eq!(red.phase(), Phase::AwaitingSetup);

    let blue_msg = blue.commit_setup().unwrap();
    blue.setup_transmitted();
    red.apply_setup(&blue_msg).unwrap();
    // committed but not yet sent
    let red_msg = red.commit_setup().unwrap();
    assert_eq!(red.phase(), Phase::AwaitingSetup);
    assert!(!red.begin_battle());
    red.setup_transmitted();
    assert_eq!(red.phase(), Phase::SetupExchanged);

    blue.apply_setup(&red_msg).unwrap();
    assert!(red.begin_battle());
    assert!(blue.begin_battle());
    assert!(red.is_my_turn());
    assert!(!blue.is_my_turn());
    assert_eq!(red.board().snapshot(), blue.board().snapshot());
    assert_eq!(red.board().pieces_on_board(Color::Red), ARMY_SIZE);
    assert_eq!(red.board().pieces_on_board(Color::Blue), ARMY_SIZE);
}

#[test]
fn setup_rules() {
    let mut red = GameEngine::new(Color::Red);
    assert_eq!(
        red.add_to_setup(6, 0, Rank::Flag, Color::Blue),
        Err(SetupError::WrongColor(Color::Blue))
    );
    assert_eq!(
        red.add_to_setup(3, 0, Rank::Flag, Color::Red),
        Err(SetupError::OutsideBand { row: 3, col: 0 })
    );
    assert_eq!(red.check_available(Rank::Scout, Color::Red), 8);
    red.add_to_setup(6, 0, Rank::Scout, Color::Red).unwrap();
    assert_eq!(red.check_available(Rank::Scout, Color::Red), 7);
    assert_eq!(red.remove_from_setup(6, 0), Some(Rank::Scout));
    assert_eq!(red.check_available(Rank::Scout, Color::Red), 8);

    red.commit_setup().unwrap();
    assert_eq!(red.commit_setup(), Err(SetupError::AlreadyCommitted));
    assert_eq!(
        red.add_to_setup(6, 0, Rank::Scout, Color::Red),
        Err(SetupError::AlreadyCommitted)
    );
    // after commit, availability reads the board
    assert_eq!(red.check_available(Rank::Scout, Color::Red), 8);
}

#[test]
fn foreign_or_duplicate_setups_are_rejected() {
    let mut red = GameEngine::new(Color::Red);
    let mut other_red = GameEngine::new(Color::Red);
    let msg = other_red.commit_setup().unwrap();
    assert_eq!(red.apply_setup(&msg), Err(SetupError::WrongColor(Color::Red)));

    let mut blue = GameEngine::new(Color::Blue);
    let blue_msg = blue.commit_setup().unwrap();
    red.apply_setup(&blue_msg).unwrap();
    assert_eq!(red.apply_setup(&blue_msg), Err(SetupError::AlreadyCommitted));
}

#[test]
fn moves_before_the_battle_are_refused() {
    let red = GameEngine::new(Color::Red);
    assert_eq!(red.plan_move(6, 0, 5, 0), Err(MoveError::NotInPlay));
}

#[test]
fn red_moves_first_and_turns_alternate() {
    let (mut red, mut blue) = standard_game();
    assert_eq!(blue.plan_move(3, 9, 4, 9), Err(MoveError::NotYourTurn));

    let msgs = play(&mut red, &mut blue, (6, 8), (5, 8));
    assert_eq!(msgs.len(), MESSAGES_PER_TURN);
    assert_eq!(msgs[0], SinglePositionMessage::set(6, 8, Piece::EMPTY));
    assert_eq!(msgs[1], SinglePositionMessage::set(5, 8, Piece::new(Rank::Sergeant, Color::Red)));
    assert!(!red.is_my_turn());
    assert!(blue.is_my_turn());
    assert_eq!(red.plan_move(5, 8, 4, 8), Err(MoveError::NotYourTurn));

    play(&mut blue, &mut red, (3, 9), (4, 9));
    assert!(red.is_my_turn());
    assert_eq!(red.turns_played(), 2);
    assert_eq!(blue.turns_played(), 2);
}

#[test]
fn illegal_moves_are_refused_without_side_effects() {
    let (mut red, _blue) = standard_game();
    let before = red.board().snapshot();

    // opponent's piece
    assert_eq!(red.plan_move(3, 0, 4, 0), Err(MoveError::NotYourPiece));
    // empty source
    assert_eq!(red.plan_move(5, 0, 4, 0), Err(MoveError::NotYourPiece));
    // into a lake
    assert_eq!(red.plan_move(6, 2, 5, 2), Err(MoveError::IllegalMove));
    // diagonal
    assert_eq!(red.plan_move(6, 1, 5, 0), Err(MoveError::IllegalMove));
    // onto a friendly piece
    assert_eq!(red.plan_move(6, 0, 6, 1), Err(MoveError::InvalidAttack));
    // bombs never move
    let (br, bc) = (6..10)
        .flat_map(|r| (0..10).map(move |c| (r, c)))
        .find(|&(r, c)| red.position(r, c).unwrap() == Piece::new(Rank::Bomb, Color::Red))
        .unwrap();
    assert_eq!(red.plan_move(br, bc, br - 1, bc), Err(MoveError::IllegalMove));
    // miners step one cell at a time
    assert_eq!(red.move_piece(6, 1, 4, 1), Err(MoveError::IllegalMove));

    assert_eq!(red.board().snapshot(), before);
    assert!(red.is_my_turn());
}

#[test]
fn scout_cannot_jump_over_pieces() {
    let mut red = with_placements(Color::Red, &[(7, 0, Rank::Scout), (6, 0, Rank::Bomb)]);
    let mut blue = GameEngine::new(Color::Blue);
    exchange(&mut red, &mut blue);
    assert_eq!(red.plan_move(7, 0, 5, 0), Err(MoveError::PathBlocked));
}

#[test]
fn scout_attack_loses_to_sergeant() {
    let (mut red, mut blue) = standard_game();
    let msgs = play(&mut red, &mut blue, (6, 0), (3, 0));
    let sergeant = Piece::new(Rank::Sergeant, Color::Blue);
    let scout = Piece::new(Rank::Scout, Color::Red);
    assert_eq!(msgs[2], SinglePositionMessage::capture(3, 0, sergeant, scout));
    for engine in [&red, &blue] {
        assert_eq!(engine.position(3, 0).unwrap(), sergeant);
        assert!(engine.board().is_empty_at(6, 0));
        assert_eq!(engine.board().count(Rank::Scout, Color::Red), 7);
        assert_eq!(engine.board().count(Rank::Sergeant, Color::Blue), 4);
        assert_conserved(engine);
    }
}

#[test]
fn defenders_hold_against_weaker_attackers() {
    let (mut red, mut blue) = standard_game();
    play(&mut red, &mut blue, (6, 8), (5, 8));
    blue_waits(&mut blue, &mut red);
    play(&mut red, &mut blue, (5, 8), (4, 8));
    blue_waits(&mut blue, &mut red);

    // sergeant walks into the bomb
    let msgs = play(&mut red, &mut blue, (4, 8), (3, 8));
    let bomb = Piece::new(Rank::Bomb, Color::Blue);
    let sergeant = Piece::new(Rank::Sergeant, Color::Red);
    assert_eq!(msgs[1], SinglePositionMessage::set(3, 8, sergeant));
    assert_eq!(msgs[2], SinglePositionMessage::capture(3, 8, bomb, sergeant));
    assert_eq!(red.board().count(Rank::Sergeant, Color::Red), 3);
    assert_eq!(red.board().count(Rank::Bomb, Color::Blue), 6);
    assert_conserved(&red);

    // blue's scout runs into the marshal
    blue_waits(&mut blue, &mut red);
    play(&mut red, &mut blue, (6, 9), (5, 9));
    let msgs = play(&mut blue, &mut red, (4, 9), (5, 9));
    let marshal = Piece::new(Rank::Marshal, Color::Red);
    let scout = Piece::new(Rank::Scout, Color::Blue);
    assert_eq!(msgs[2], SinglePositionMessage::capture(5, 9, marshal, scout));
    for engine in [&red, &blue] {
        assert_eq!(engine.position(5, 9).unwrap(), marshal);
        assert_eq!(engine.board().count(Rank::Scout, Color::Blue), 7);
        assert_conserved(engine);
    }
}

#[test]
fn scouts_trade_head_on() {
    let mut red = with_placements(Color::Red, &[(6, 0, Rank::Scout)]);
    let mut blue = with_placements(Color::Blue, &[(3, 0, Rank::Scout)]);
    exchange(&mut red, &mut blue);

    let msgs = play(&mut red, &mut blue, (6, 0), (3, 0));
    let red_scout = Piece::new(Rank::Scout, Color::Red);
    let blue_scout = Piece::new(Rank::Scout, Color::Blue);
    assert_eq!(
        msgs,
        [
            SinglePositionMessage::set(6, 0, Piece::EMPTY),
            SinglePositionMessage::capture(3, 0, red_scout, red_scout),
            SinglePositionMessage::capture(3, 0, Piece::EMPTY, blue_scout),
        ]
    );
    for engine in [&red, &blue] {
        assert!(engine.board().is_empty_at(3, 0));
        assert!(engine.board().is_empty_at(6, 0));
        assert_eq!(engine.board().count(Rank::Scout, Color::Red), 7);
        assert_eq!(engine.board().count(Rank::Scout, Color::Blue), 7);
        assert_conserved(engine);
    }
}

#[test]
fn miner_defuses_bomb() {
    let (mut red, mut blue) = standard_game();
    play(&mut red, &mut blue, (6, 1), (5, 1));
    blue_waits(&mut blue, &mut red);
    play(&mut red, &mut blue, (5, 1), (4, 1));
    blue_waits(&mut blue, &mut red);
    let msgs = play(&mut red, &mut blue, (4, 1), (3, 1));

    let miner = Piece::new(Rank::Miner, Color::Red);
    let bomb = Piece::new(Rank::Bomb, Color::Blue);
    assert_eq!(msgs[2], SinglePositionMessage::capture(3, 1, miner, bomb));
    for engine in [&red, &blue] {
        assert_eq!(engine.position(3, 1).unwrap(), miner);
        assert_eq!(engine.board().count(Rank::Bomb, Color::Blue), 5);
        assert_conserved(engine);
    }
}

#[test]
fn spy_takes_the_marshal() {
    let (mut red, mut blue) = standard_game();
    play(&mut red, &mut blue, (6, 4), (5, 4));
    blue_waits(&mut blue, &mut red);
    play(&mut red, &mut blue, (5, 4), (4, 4));
    blue_waits(&mut blue, &mut red);
    play(&mut red, &mut blue, (4, 4), (3, 4));

    for engine in [&red, &blue] {
        assert_eq!(engine.position(3, 4).unwrap(), Piece::new(Rank::Spy, Color::Red));
        assert_eq!(engine.board().count(Rank::Marshal, Color::Blue), 0);
        assert_eq!(engine.status(), GameStatus::InProgress);
        assert_conserved(engine);
    }
}

#[test]
fn capturing_the_flag_wins() {
    let recorder = Recorder::default();
    let (mut red, mut blue) = standard_game();
    blue.set_sink(Box::new(recorder.clone()));

    // scout runs up column 5 straight onto the flag
    play(&mut red, &mut blue, (6, 5), (3, 5));

    for engine in [&red, &blue] {
        assert_eq!(engine.phase(), Phase::GameOver);
        assert_eq!(engine.status(), GameStatus::Won(Color::Red));
        assert_eq!(engine.winner(), Color::Red);
        assert!(!engine.is_my_turn());
    }
    assert_eq!(blue.plan_move(3, 9, 4, 9), Err(MoveError::NotInPlay));
    let events = recorder.0.lock().unwrap();
    assert_eq!(
        events.last(),
        Some(&GameEvent::GameOver {
            status: GameStatus::Won(Color::Red)
        })
    );
}

#[test]
fn a_turn_after_game_over_is_ignored() {
    let (mut red, mut blue) = standard_game();
    let msgs = red.plan_move(6, 0, 5, 0).unwrap();
    blue.end_game();
    blue.apply_remote_turn(&msgs).unwrap();
    assert!(blue.board().is_empty_at(5, 0));
    assert_eq!(blue.status(), GameStatus::Abandoned);
    assert_eq!(blue.winner(), Color::None);
}

#[test]
fn events_follow_the_battle() {
    let recorder = Recorder::default();
    let mut red = GameEngine::new(Color::Red);
    red.set_sink(Box::new(recorder.clone()));
    let mut blue = GameEngine::new(Color::Blue);
    exchange(&mut red, &mut blue);

    let events = recorder.0.lock().unwrap();
    assert!(matches!(events.first(), Some(GameEvent::Setup(msg)) if msg.color == Color::Red));
    assert!(events.contains(&GameEvent::BattleStarted { first: Color::Red }));
    assert_eq!(events.last(), Some(&GameEvent::TurnChanged { my_turn: true }));
}

#[test]
fn a_rejected_turn_leaves_the_board_untouched() {
    let (mut red, mut blue) = standard_game();
    play(&mut red, &mut blue, (6, 8), (5, 8));
    let before = red.board().snapshot();
    let turns = red.turns_played();
    let sergeant = Piece::new(Rank::Sergeant, Color::Blue);

    // the third message lands in a lake
    let into_lake = [
        SinglePositionMessage::set(3, 0, Piece::EMPTY),
        SinglePositionMessage::set(4, 0, sergeant),
        SinglePositionMessage::set(4, 2, sergeant),
    ];
    assert_eq!(
        red.apply_remote_turn(&into_lake),
        Err(BoardError::LakeCell { row: 4, col: 2 })
    );
    assert_eq!(red.board().snapshot(), before);
    assert_eq!(red.position(3, 0).unwrap(), sergeant);
    assert_eq!(red.turns_played(), turns);
    assert!(!red.is_my_turn());

    // a cycle cut short by the sentinel is rejected the same way
    let cut_short = [
        SinglePositionMessage::set(3, 0, Piece::EMPTY),
        SinglePositionMessage::set(4, 0, sergeant),
        SinglePositionMessage::game_over(),
    ];
    assert!(red.apply_remote_turn(&cut_short).is_err());
    assert_eq!(red.board().snapshot(), before);
    assert_conserved(&red);

    // the real reply still applies afterwards
    play(&mut blue, &mut red, (3, 0), (4, 0));
    assert!(red.is_my_turn());
}

/// One piece per side facing each other down column 4, plus a blue scout
/// for waiting moves. Red walks forward until it attacks on its third move.
fn column_duel(red_rank: Rank, blue_rank: Rank) -> (GameEngine, GameEngine) {
    let mut red = with_placements(Color::Red, &[(6, 4, red_rank)]);
    let mut blue = with_placements(Color::Blue, &[(3, 4, blue_rank), (3, 9, Rank::Scout)]);
    exchange(&mut red, &mut blue);
    play(&mut red, &mut blue, (6, 4), (5, 4));
    blue_waits(&mut blue, &mut red);
    play(&mut red, &mut blue, (5, 4), (4, 4));
    blue_waits(&mut blue, &mut red);
    (red, blue)
}

#[test]
fn marshal_takes_general() {
    let (mut red, mut blue) = column_duel(Rank::Marshal, Rank::General);
    assert_eq!(blue.board().count(Rank::General, Color::Blue), 1);

    play(&mut red, &mut blue, (4, 4), (3, 4));
    for engine in [&red, &blue] {
        assert_eq!(
            engine.position(3, 4).unwrap(),
            Piece::new(Rank::Marshal, Color::Red)
        );
        assert!(engine.position(4, 4).unwrap().is_empty());
        assert_eq!(engine.board().count(Rank::General, Color::Blue), 0);
        assert_eq!(engine.board().count(Rank::Marshal, Color::Red), 1);
        assert_conserved(engine);
    }
}

#[test]
fn majors_remove_each_other() {
    let (mut red, mut blue) = column_duel(Rank::Major, Rank::Major);
    assert_eq!(red.board().count(Rank::Major, Color::Red), 3);
    assert_eq!(red.board().count(Rank::Major, Color::Blue), 3);

    let msgs = play(&mut red, &mut blue, (4, 4), (3, 4));
    assert_eq!(msgs.len(), MESSAGES_PER_TURN);
    for engine in [&red, &blue] {
        assert!(engine.position(3, 4).unwrap().is_empty());
        assert!(engine.position(4, 4).unwrap().is_empty());
        assert_eq!(engine.board().count(Rank::Major, Color::Red), 2);
        assert_eq!(engine.board().count(Rank::Major, Color::Blue), 2);
        assert_conserved(engine);
    }
}

#[test]
fn scout_runs_the_length_of_a_clear_row() {
    let (mut red, _blue) = standard_game();
    let scout = Piece::new(Rank::Scout, Color::Red);
    let board = red.board_mut();
    for col in 1..=8 {
        board.remove_position(1, col).unwrap();
    }
    board.set_position(1, 1, scout).unwrap();

    assert!(red.plan_move(1, 1, 1, 8).is_ok());

    red.board_mut()
        .set_position(1, 4, Piece::new(Rank::Captain, Color::Blue))
        .unwrap();
    assert_eq!(red.plan_move(1, 1, 1, 8), Err(MoveError::PathBlocked));
    // stopping short of the blocker is still fine
    assert!(red.plan_move(1, 1, 1, 3).is_ok());
}
