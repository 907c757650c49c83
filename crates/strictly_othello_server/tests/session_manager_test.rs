//! Room lifecycle through the session manager.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use strictly_othello::{Player, search};
use strictly_othello_server::{
    AI_OPPONENT_NAME, ChannelBroadcaster, ConflictReason, DisconnectEffect, InMemoryStore,
    MatchRecord, MatchResult, NullBroadcaster, PersistentStore, RoomId, RoomState, RoomStatus,
    Seat, SessionError, SessionErrorKind, SessionManager, StoreError, User, UserId,
};

struct Fixture {
    store: Arc<InMemoryStore>,
    sessions: SessionManager,
    alice: UserId,
    bob: UserId,
    carol: UserId,
}

fn fixture() -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let alice = *store.add_user("alice").unwrap().id();
    let bob = *store.add_user("bob").unwrap().id();
    let carol = *store.add_user("carol").unwrap().id();
    let sessions = SessionManager::new(store.clone(), Arc::new(NullBroadcaster));
    Fixture {
        store,
        sessions,
        alice,
        bob,
        carol,
    }
}

impl Fixture {
    fn playing_room(&self) -> RoomId {
        let room = self.sessions.create_room(self.alice).unwrap();
        self.sessions.join_room(room.id, self.bob).unwrap();
        room.id
    }

    fn state_json(&self, room: RoomId) -> String {
        serde_json::to_string(&self.sessions.game_state(room).unwrap()).unwrap()
    }

    fn results(&self, user: UserId) -> Vec<MatchResult> {
        self.store
            .match_history(user)
            .unwrap()
            .iter()
            .map(|r| *r.result())
            .collect()
    }
}

fn conflict(err: SessionError) -> ConflictReason {
    err.conflict_reason()
        .unwrap_or_else(|| panic!("expected conflict, got {}", err))
}

#[test]
fn test_create_and_join() {
    let f = fixture();
    let room = f.sessions.create_room(f.alice).unwrap();
    assert_eq!(room.status, RoomStatus::Waiting);

    let snapshot = f.sessions.join_room(room.id, f.bob).unwrap();
    assert_eq!(snapshot.status, RoomStatus::Playing);
    assert_eq!(snapshot.guest_name.as_deref(), Some("bob"));
    assert!(snapshot.message.unwrap().contains("bob"));
}

#[test]
fn test_join_rejections() {
    let f = fixture();
    let room = f.sessions.create_room(f.alice).unwrap();

    let err = f.sessions.join_room(room.id, f.alice).unwrap_err();
    assert_eq!(conflict(err), ConflictReason::SelfJoin);

    f.sessions.join_room(room.id, f.bob).unwrap();
    let err = f.sessions.join_room(room.id, f.carol).unwrap_err();
    assert_eq!(
        conflict(err),
        ConflictReason::WrongStatus {
            expected: RoomStatus::Waiting,
            actual: RoomStatus::Playing
        }
    );
}

#[test]
fn test_not_found() {
    let f = fixture();
    let err = f.sessions.game_state(RoomId::new(404)).unwrap_err();
    assert_eq!(err.kind, SessionErrorKind::RoomNotFound(RoomId::new(404)));

    let err = f.sessions.create_room(UserId::new(404)).unwrap_err();
    assert_eq!(err.kind, SessionErrorKind::UserNotFound(UserId::new(404)));

    let room = f.sessions.create_room(f.alice).unwrap();
    let err = f.sessions.join_room(room.id, UserId::new(404)).unwrap_err();
    assert_eq!(err.kind, SessionErrorKind::UserNotFound(UserId::new(404)));
}

#[test]
fn test_join_checks_room_before_user() {
    let f = fixture();
    let room = f.playing_room();
    let stranger = UserId::new(404);

    let err = f.sessions.join_room(room, stranger).unwrap_err();
    assert_eq!(
        conflict(err),
        ConflictReason::WrongStatus {
            expected: RoomStatus::Waiting,
            actual: RoomStatus::Playing
        }
    );

    // A room whose host has no account still reports a self-join first.
    let ghost = UserId::new(405);
    let room = RoomState::new(
        f.store.next_room_id().unwrap(),
        Seat::new(ghost, "ghost".to_string()),
        chrono::Utc::now(),
    );
    f.store.save(&room).unwrap();
    let err = f.sessions.join_room(room.id, ghost).unwrap_err();
    assert_eq!(conflict(err), ConflictReason::SelfJoin);

    let snapshot = f.sessions.join_room(room.id, f.carol).unwrap();
    assert_eq!(snapshot.status, RoomStatus::Playing);
}

#[test]
fn test_match_history_through_sessions() {
    let f = fixture();
    let first = f
        .sessions
        .record_single_player_result(f.alice, MatchResult::Win, 30)
        .unwrap();
    assert_eq!(first.opponent_name(), AI_OPPONENT_NAME);
    assert_eq!(first.opponent_name(), "AI");
    assert_eq!(*first.moves(), 30);

    let room = f.playing_room();
    f.sessions.disconnect(f.bob);
    let second = f
        .sessions
        .record_single_player_result(f.alice, MatchResult::Loss, 52)
        .unwrap();

    let history = f.sessions.match_history(f.alice).unwrap();
    let summary: Vec<_> = history
        .iter()
        .map(|r| (r.opponent_name().as_str(), *r.result()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("AI", MatchResult::Loss),
            ("bob", MatchResult::Win),
            ("AI", MatchResult::Win),
        ]
    );
    assert!(history.windows(2).all(|w| w[0].played_at() >= w[1].played_at()));
    assert_eq!(history[0], second);
    assert_eq!(f.results(f.bob), vec![MatchResult::Loss]);
    assert_eq!(f.sessions.game_state(room).unwrap().status, RoomStatus::Finished);

    let err = f
        .sessions
        .record_single_player_result(UserId::new(404), MatchResult::Draw, 60)
        .unwrap_err();
    assert_eq!(err.kind, SessionErrorKind::UserNotFound(UserId::new(404)));
    let err = f.sessions.match_history(UserId::new(404)).unwrap_err();
    assert_eq!(err.kind, SessionErrorKind::UserNotFound(UserId::new(404)));
    assert!(f.sessions.match_history(f.carol).unwrap().is_empty());
}

#[test]
fn test_wrong_turn_leaves_room_unchanged() {
    let f = fixture();
    let room = f.playing_room();
    let before = f.state_json(room);

    let err = f.sessions.submit_move(room, 2, 4, f.bob).unwrap_err();
    assert_eq!(conflict(err), ConflictReason::NotYourTurn);

    let err = f.sessions.submit_move(room, 2, 3, f.carol).unwrap_err();
    assert_eq!(conflict(err), ConflictReason::NotYourTurn);

    assert_eq!(f.state_json(room), before);
}

#[test]
fn test_illegal_and_malformed_moves_leave_room_unchanged() {
    let f = fixture();
    let room = f.playing_room();
    let before = f.state_json(room);

    let err = f.sessions.submit_move(room, 0, 0, f.alice).unwrap_err();
    assert!(matches!(err.kind, SessionErrorKind::IllegalMove(_)));

    let err = f.sessions.submit_move(room, 3, 3, f.alice).unwrap_err();
    assert!(matches!(err.kind, SessionErrorKind::IllegalMove(_)));

    let err = f.sessions.submit_move(room, 8, 0, f.alice).unwrap_err();
    assert!(matches!(err.kind, SessionErrorKind::Validation(_)));

    assert_eq!(f.state_json(room), before);
}

#[test]
fn test_moves_alternate() {
    let f = fixture();
    let room = f.playing_room();

    let snapshot = f.sessions.submit_move(room, 2, 3, f.alice).unwrap();
    assert_eq!(snapshot.turn, Player::White);
    assert_eq!((snapshot.black_count, snapshot.white_count), (4, 1));

    let snapshot = f.sessions.submit_move(room, 2, 2, f.bob).unwrap();
    assert_eq!(snapshot.turn, Player::Black);
    assert_eq!(snapshot.move_count, 2);
}

#[test]
fn test_game_plays_to_finish_and_records_history() {
    let f = fixture();
    let room = f.playing_room();

    let mut last = f.sessions.game_state(room).unwrap();
    while last.status == RoomStatus::Playing {
        let user = match last.turn {
            Player::Black => f.alice,
            Player::White => f.bob,
        };
        let pos = search::choose_move(&last.board_state, last.turn, 1)
            .position()
            .expect("a playing room always has a move for the side to move");
        last = f
            .sessions
            .submit_move(room, pos.row() as i32, pos.col() as i32, user)
            .unwrap();
    }

    assert_eq!(last.status, RoomStatus::Finished);
    assert!(last.is_game_over);
    let winner = last.winner.clone().expect("finished rooms have a winner");

    let expected = match winner.as_str() {
        "B" => (MatchResult::Win, MatchResult::Loss),
        "W" => (MatchResult::Loss, MatchResult::Win),
        _ => (MatchResult::Draw, MatchResult::Draw),
    };
    assert_eq!(f.results(f.alice), vec![expected.0]);
    assert_eq!(f.results(f.bob), vec![expected.1]);

    let record = &f.store.match_history(f.alice).unwrap()[0];
    assert_eq!(record.opponent_name(), "bob");
    assert_eq!(*record.moves(), last.move_count);

    let err = f.sessions.submit_move(room, 0, 0, f.alice).unwrap_err();
    assert!(matches!(conflict(err), ConflictReason::WrongStatus { .. }));
}

#[test]
fn test_host_leaving_waiting_room_destroys_it() {
    let f = fixture();
    let room = f.sessions.create_room(f.alice).unwrap();

    let effects = f.sessions.disconnect(f.alice);
    assert_eq!(effects, vec![(room.id, DisconnectEffect::RoomDestroyed)]);
    assert!(f.sessions.game_state(room.id).is_err());

    assert!(f.sessions.disconnect(f.alice).is_empty());
}

#[test]
fn test_guest_forfeit_clears_seat() {
    let f = fixture();
    let room = f.playing_room();

    let effects = f.sessions.disconnect(f.bob);
    assert_eq!(
        effects,
        vec![(room, DisconnectEffect::Forfeited { winner: Player::Black })]
    );

    let state = f.sessions.game_state(room).unwrap();
    assert_eq!(state.status, RoomStatus::Finished);
    assert_eq!(state.winner.as_deref(), Some("B"));
    assert_eq!(state.guest_name, None);

    assert_eq!(f.results(f.alice), vec![MatchResult::Win]);
    assert_eq!(f.results(f.bob), vec![MatchResult::Loss]);

    assert!(f.sessions.disconnect(f.bob).is_empty());
}

#[test]
fn test_forfeit_ignores_board_content() {
    let f = fixture();
    let room = f.playing_room();
    // Black is ahead on discs, yet the remaining seat wins.
    f.sessions.submit_move(room, 2, 3, f.alice).unwrap();

    f.sessions.disconnect(f.alice);
    let state = f.sessions.game_state(room).unwrap();
    assert_eq!(state.winner.as_deref(), Some("W"));
    assert_eq!(state.guest_name.as_deref(), Some("bob"));
}

#[test]
fn test_finished_room_departures() {
    let f = fixture();
    let room = f.playing_room();
    f.sessions.disconnect(f.alice);

    // Host leaves again while the guest is still seated.
    assert_eq!(
        f.sessions.disconnect(f.alice),
        vec![(room, DisconnectEffect::ClosingNotice)]
    );
    assert!(f.sessions.game_state(room).is_ok());

    assert_eq!(
        f.sessions.disconnect(f.bob),
        vec![(room, DisconnectEffect::SeatCleared)]
    );
    assert!(f.sessions.disconnect(f.bob).is_empty());

    assert_eq!(
        f.sessions.disconnect(f.alice),
        vec![(room, DisconnectEffect::RoomDestroyed)]
    );
    assert!(f.sessions.disconnect(f.alice).is_empty());
}

#[test]
fn test_rematch() {
    let f = fixture();
    let room = f.playing_room();

    let err = f.sessions.reset_for_rematch(room).unwrap_err();
    assert!(matches!(conflict(err), ConflictReason::WrongStatus { .. }));

    // Host forfeits; guest stays, so the rematch starts right away.
    f.sessions.submit_move(room, 2, 3, f.alice).unwrap();
    f.sessions.disconnect(f.alice);
    let snapshot = f.sessions.reset_for_rematch(room).unwrap();
    assert_eq!(snapshot.status, RoomStatus::Playing);
    assert_eq!(snapshot.turn, Player::Black);
    assert_eq!(snapshot.winner, None);
    assert_eq!(snapshot.move_count, 0);
    assert_eq!((snapshot.black_count, snapshot.white_count), (2, 2));

    // Guest forfeits and leaves; the room waits for a new guest.
    f.sessions.disconnect(f.bob);
    let snapshot = f.sessions.reset_for_rematch(room).unwrap();
    assert_eq!(snapshot.status, RoomStatus::Waiting);
    f.sessions.join_room(room, f.carol).unwrap();
}

#[test]
fn test_delete_room_is_host_only() {
    let f = fixture();
    let room = f.sessions.create_room(f.alice).unwrap();

    let err = f.sessions.delete_room(room.id, f.bob).unwrap_err();
    assert_eq!(conflict(err), ConflictReason::NotHost);

    f.sessions.delete_room(room.id, f.alice).unwrap();
    assert_eq!(f.store.room_count().unwrap(), 0);
}

#[test]
fn test_waiting_rooms_newest_first() {
    let f = fixture();
    let first = f.sessions.create_room(f.alice).unwrap();
    let second = f.sessions.create_room(f.bob).unwrap();

    let ids: Vec<_> = f.sessions.waiting_rooms().unwrap().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);

    f.sessions.join_room(first.id, f.carol).unwrap();
    let lobby = f.sessions.waiting_rooms().unwrap();
    assert_eq!(lobby.len(), 1);
    assert_eq!(lobby[0].host_name, "bob");
}

#[test]
fn test_nudge_and_relay() {
    let f = fixture();
    let room = f.playing_room();

    let snapshot = f.sessions.nudge(room, f.alice).unwrap();
    assert!(snapshot.message.unwrap().contains("bob"));

    let snapshot = f.sessions.relay_message(room, f.bob, "  good game  ").unwrap();
    assert_eq!(snapshot.message.as_deref(), Some("good game"));

    let err = f.sessions.relay_message(room, f.bob, "   ").unwrap_err();
    assert!(matches!(err.kind, SessionErrorKind::Validation(_)));

    let err = f.sessions.nudge(room, f.carol).unwrap_err();
    assert_eq!(conflict(err), ConflictReason::NotSeated);
}

#[test]
fn test_transitions_are_broadcast() {
    let store = Arc::new(InMemoryStore::new());
    let alice = *store.add_user("alice").unwrap().id();
    let bob = *store.add_user("bob").unwrap().id();
    let broadcaster = Arc::new(ChannelBroadcaster::new(16));
    let mut updates = broadcaster.subscribe();
    let sessions = SessionManager::new(store, broadcaster);

    let room = sessions.create_room(alice).unwrap();
    sessions.join_room(room.id, bob).unwrap();
    sessions.submit_move(room.id, 2, 3, alice).unwrap();
    sessions.disconnect(bob);

    let statuses: Vec<_> = std::iter::from_fn(|| updates.try_recv().ok())
        .inspect(|u| assert_eq!(u.room_id, room.id))
        .map(|u| u.snapshot.status)
        .collect();
    assert_eq!(
        statuses,
        vec![
            RoomStatus::Waiting,
            RoomStatus::Playing,
            RoomStatus::Playing,
            RoomStatus::Finished
        ]
    );
}

#[test]
fn test_same_room_moves_are_serialized() {
    let f = fixture();
    let room = f.playing_room();

    let sessions = &f.sessions;
    let alice = f.alice;

    let outcomes: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = [(2, 3), (3, 2), (4, 5), (5, 4)]
            .into_iter()
            .map(|(row, col)| scope.spawn(move || sessions.submit_move(room, row, col, alice)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    for err in outcomes.into_iter().filter_map(Result::err) {
        assert_eq!(conflict(err), ConflictReason::NotYourTurn);
    }
    assert_eq!(f.sessions.game_state(room).unwrap().move_count, 1);
}

#[test]
fn test_distinct_rooms_proceed_in_parallel() {
    let store = Arc::new(InMemoryStore::new());
    let users: Vec<User> = (0..8)
        .map(|i| store.add_user(&format!("user{}", i)).unwrap())
        .collect();
    let sessions = SessionManager::new(store, Arc::new(NullBroadcaster));

    let rooms: Vec<(RoomId, UserId, UserId)> = users
        .chunks(2)
        .map(|pair| {
            let room = sessions.create_room(*pair[0].id()).unwrap();
            sessions.join_room(room.id, *pair[1].id()).unwrap();
            (room.id, *pair[0].id(), *pair[1].id())
        })
        .collect();

    std::thread::scope(|scope| {
        for &(room, black, white) in &rooms {
            let sessions = &sessions;
            scope.spawn(move || {
                for _ in 0..10 {
                    let state = sessions.game_state(room).unwrap();
                    if state.status != RoomStatus::Playing {
                        break;
                    }
                    let user = if state.turn == Player::Black { black } else { white };
                    let pos = search::choose_move(&state.board_state, state.turn, 2)
                        .position()
                        .unwrap();
                    sessions
                        .submit_move(room, pos.row() as i32, pos.col() as i32, user)
                        .unwrap();
                }
            });
        }
    });

    // Every room ran the same deterministic game without interference.
    let finals: Vec<_> = rooms
        .iter()
        .map(|&(room, _, _)| sessions.game_state(room).unwrap())
        .collect();
    for state in &finals {
        assert_eq!(state.board_state, finals[0].board_state);
        assert_eq!(state.move_count, finals[0].move_count);
    }
    assert!(finals[0].move_count > 0);
}

/// Store whose writes can be switched to fail.
struct FlakyStore {
    inner: InMemoryStore,
    fail_writes: AtomicBool,
}

impl PersistentStore for FlakyStore {
    fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.inner.user(id)
    }

    fn next_room_id(&self) -> Result<RoomId, StoreError> {
        self.inner.next_room_id()
    }

    fn load(&self, id: RoomId) -> Result<Option<RoomState>, StoreError> {
        self.inner.load(id)
    }

    fn save(&self, room: &RoomState) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::new("disk full"));
        }
        self.inner.save(room)
    }

    fn delete(&self, id: RoomId) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::new("disk full"));
        }
        self.inner.delete(id)
    }

    fn rooms_for_user(&self, user: UserId) -> Result<Vec<RoomId>, StoreError> {
        self.inner.rooms_for_user(user)
    }

    fn rooms_with_status(&self, status: RoomStatus) -> Result<Vec<RoomState>, StoreError> {
        self.inner.rooms_with_status(status)
    }

    fn record_match(&self, record: MatchRecord) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::new("disk full"));
        }
        self.inner.record_match(record)
    }

    fn match_history(&self, user: UserId) -> Result<Vec<MatchRecord>, StoreError> {
        self.inner.match_history(user)
    }
}

#[test]
fn test_disconnect_swallows_store_failures() {
    let store = Arc::new(FlakyStore {
        inner: InMemoryStore::new(),
        fail_writes: AtomicBool::new(false),
    });
    let alice = *store.inner.add_user("alice").unwrap().id();
    let bob = *store.inner.add_user("bob").unwrap().id();
    let sessions = SessionManager::new(store.clone(), Arc::new(NullBroadcaster));

    let room = sessions.create_room(alice).unwrap();
    sessions.join_room(room.id, bob).unwrap();

    store.fail_writes.store(true, Ordering::SeqCst);
    assert_eq!(
        sessions.disconnect(bob),
        vec![(room.id, DisconnectEffect::Forfeited { winner: Player::Black })]
    );

    let err = sessions.submit_move(room.id, 2, 3, alice).unwrap_err();
    assert!(matches!(err.kind, SessionErrorKind::Store(_)));
}
