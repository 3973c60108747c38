use futures::future::{BoxFuture, FutureExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};

use word_rush::config::Config;
use word_rush::dictionary::Dictionary;
use word_rush::error::{AuthError, PersistenceError, RoomError};
use word_rush::lobby::{Connection, GameServer};
use word_rush::models::{
    ClientEvent, Credentials, PlayerResult, RoomId, ScoreVisibility, ServerEvent, FORFEIT_PENALTY,
};
use word_rush::store::{MemoryUserStore, RatingUpdate, UserRecord, UserStore};

const PASSWORD: &str = "secret";
const WORDS: [&str; 6] = ["cat", "cats", "planet", "tree", "dogs", "word"];

struct Client {
    conn: Connection,
    inbox: UnboundedReceiver<ServerEvent>,
}

impl Client {
    fn new() -> Self {
        let (outbox, inbox) = mpsc::unbounded_channel();
        Self {
            conn: Connection::new(outbox),
            inbox,
        }
    }

    async fn login(server: &GameServer, name: &str) -> Self {
        let mut client = Self::new();
        client
            .send(server, ClientEvent::Login(credentials(name)))
            .await;
        client
            .expect(|e| matches!(e, ServerEvent::AuthSuccess(_)))
            .await;
        client
    }

    async fn send(&mut self, server: &GameServer, event: ClientEvent) {
        server.dispatch(&mut self.conn, event).await;
    }

    async fn expect(&mut self, wanted: impl Fn(&ServerEvent) -> bool) -> ServerEvent {
        let search = async {
            while let Some(event) = self.inbox.recv().await {
                if wanted(&event) {
                    return event;
                }
            }
            panic!("connection closed");
        };
        tokio::time::timeout(Duration::from_secs(600), search)
            .await
            .expect("event never arrived")
    }

    async fn room_error(&mut self) -> String {
        match self
            .expect(|e| matches!(e, ServerEvent::RoomError { .. }))
            .await
        {
            ServerEvent::RoomError { message } => message,
            _ => unreachable!(),
        }
    }

    async fn game_over(&mut self) -> Vec<PlayerResult> {
        match self
            .expect(|e| matches!(e, ServerEvent::GameOver { .. }))
            .await
        {
            ServerEvent::GameOver { results, .. } => results,
            _ => unreachable!(),
        }
    }

    async fn loading_room(&mut self) -> RoomId {
        match self
            .expect(|e| matches!(e, ServerEvent::GameLoading { .. }))
            .await
        {
            ServerEvent::GameLoading { room_id, .. } => room_id,
            _ => unreachable!(),
        }
    }

    async fn game_start(&mut self) {
        self.expect(|e| matches!(e, ServerEvent::GameStart { .. }))
            .await;
    }

    /// Everything received up to the end of the round, plus the results.
    async fn play_out(&mut self) -> (Vec<ServerEvent>, Vec<PlayerResult>) {
        let mut seen = Vec::new();
        loop {
            match self.expect(|_| true).await {
                ServerEvent::GameOver { results, .. } => return (seen, results),
                event => seen.push(event),
            }
        }
    }

    fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.inbox.try_recv() {
            events.push(event);
        }
        events
    }
}

fn credentials(name: &str) -> Credentials {
    Credentials {
        username: name.to_string(),
        password: PASSWORD.to_string(),
    }
}

fn test_config() -> Config {
    Config {
        round_seconds: 5,
        loading_seconds: 1,
        ..Config::default()
    }
}

fn setup(users: &[(&str, u32)]) -> (GameServer, Arc<MemoryUserStore>) {
    let store = Arc::new(MemoryUserStore::with_users(
        users
            .iter()
            .map(|(name, lp)| UserRecord::new(name, PASSWORD, *lp)),
    ));
    let server = GameServer::new(test_config(), Dictionary::from_words(WORDS), store.clone());
    (server, store)
}

/// One human against the bots, with a round long enough for the bots to play.
async fn practice_room(
    visibility: ScoreVisibility,
) -> (GameServer, Arc<MemoryUserStore>, Client, RoomId) {
    let store = Arc::new(MemoryUserStore::with_users([UserRecord::new(
        "alice", PASSWORD, 100,
    )]));
    let config = Config {
        round_seconds: 60,
        casual_visibility: visibility,
        ..test_config()
    };
    let dictionary = Dictionary::from_words(WORDS.iter().chain(&["elephants"]));
    let server = GameServer::new(config, dictionary, store.clone());

    let mut alice = Client::login(&server, "alice").await;
    alice.send(&server, ClientEvent::StartAiMatch {}).await;
    let room_id = alice.loading_room().await;
    alice.game_start().await;
    (server, store, alice, room_id)
}

fn bot_words(events: &[ServerEvent]) -> Vec<(String, Option<u32>)> {
    events
        .iter()
        .filter_map(|e| match e {
            ServerEvent::SpectatorUpdate {
                username, score, ..
            } => Some((username.0.clone(), *score)),
            _ => None,
        })
        .collect()
}

async fn stored(store: &dyn UserStore, name: &str) -> UserRecord {
    store.get_user(name).await.unwrap().unwrap()
}

fn result_for<'a>(results: &'a [PlayerResult], name: &str) -> &'a PlayerResult {
    results
        .iter()
        .find(|r| r.username.as_str() == name)
        .unwrap()
}

async fn quick_pair(server: &GameServer, a: &str, b: &str) -> (Client, Client, RoomId) {
    let mut first = Client::login(server, a).await;
    let mut second = Client::login(server, b).await;
    first.send(server, ClientEvent::QuickMatch {}).await;
    first
        .expect(|e| matches!(e, ServerEvent::SearchingMatch { .. }))
        .await;
    second.send(server, ClientEvent::QuickMatch {}).await;
    let room_id = first.loading_room().await;
    assert_eq!(second.loading_room().await, room_id);
    (first, second, room_id)
}

#[tokio::test(start_paused = true)]
async fn quick_match_settles_exactly_once() {
    let (server, store) = setup(&[("alice", 100), ("bob", 100)]);
    let (mut alice, mut bob, room_id) = quick_pair(&server, "alice", "bob").await;
    assert!(room_id.0.starts_with("quickmatch_"));

    alice.game_start().await;
    alice
        .send(
            &server,
            ClientEvent::SubmitWord {
                room_id: room_id.clone(),
                word: "Planet".into(),
            },
        )
        .await;
    match alice
        .expect(|e| matches!(e, ServerEvent::WordResult { .. }))
        .await
    {
        ServerEvent::WordResult {
            word,
            accepted,
            points,
            ..
        } => {
            assert_eq!(word, "planet");
            assert!(accepted);
            assert_eq!(points, 3);
        }
        _ => unreachable!(),
    }
    // casual rooms show scores live
    bob.expect(|e| matches!(e, ServerEvent::ScoreUpdate { .. }))
        .await;

    let results = alice.game_over().await;
    let winner = result_for(&results, "alice");
    assert_eq!(winner.place, Some(1));
    assert_eq!(winner.lp_delta, 20);
    assert_eq!(winner.new_lp, Some(120));
    assert_eq!(winner.words, vec!["planet".to_string()]);
    assert_eq!(result_for(&results, "bob").new_lp, Some(95));
    bob.game_over().await;

    tokio::time::sleep(Duration::from_secs(30)).await;
    for client in [&mut alice, &mut bob] {
        assert!(!client
            .drain()
            .iter()
            .any(|e| matches!(e, ServerEvent::GameOver { .. } | ServerEvent::TimeUpdate { .. })));
    }
    assert_eq!(server.stats().await.rooms, 0);

    let alice_record = stored(store.as_ref(), "alice").await;
    assert_eq!(alice_record.lp, 120);
    assert_eq!(alice_record.wins, 1);
    let bob_record = stored(store.as_ref(), "bob").await;
    assert_eq!(bob_record.lp, 95);
    assert_eq!(bob_record.losses, 1);
}

#[tokio::test(start_paused = true)]
async fn ranked_search_respects_the_band() {
    let (server, _store) = setup(&[
        ("alice", 100),
        ("carol", 301),
        ("dave", 300),
        ("erin", 250),
        ("frank", 50),
    ]);
    let mut alice = Client::login(&server, "alice").await;
    let mut carol = Client::login(&server, "carol").await;

    alice.send(&server, ClientEvent::FindMatch {}).await;
    carol.send(&server, ClientEvent::FindMatch {}).await;
    carol
        .expect(|e| matches!(e, ServerEvent::SearchingMatch { lp: 301 }))
        .await;
    let stats = server.stats().await;
    assert_eq!(stats.rooms, 0);
    assert_eq!(stats.ranked_queue, 2);

    // 200 away from alice and 1 from carol
    let mut dave = Client::login(&server, "dave").await;
    dave.send(&server, ClientEvent::FindMatch {}).await;
    match dave
        .expect(|e| matches!(e, ServerEvent::RankedLobbyUpdate { .. }))
        .await
    {
        ServerEvent::RankedLobbyUpdate {
            room_id,
            anchor_lp,
            players,
        } => {
            assert!(room_id.0.starts_with("ranked_"));
            assert_eq!(anchor_lp, 100);
            assert_eq!(players.len(), 3);
        }
        _ => unreachable!(),
    }

    let mut erin = Client::login(&server, "erin").await;
    erin.send(&server, ClientEvent::FindMatch {}).await;
    match erin
        .expect(|e| matches!(e, ServerEvent::RankedLobbyUpdate { .. }))
        .await
    {
        ServerEvent::RankedLobbyUpdate { players, .. } => assert_eq!(players.len(), 4),
        _ => unreachable!(),
    }

    // the only waiting room is full now
    let mut frank = Client::login(&server, "frank").await;
    frank.send(&server, ClientEvent::FindMatch {}).await;
    frank
        .expect(|e| matches!(e, ServerEvent::SearchingMatch { lp: 50 }))
        .await;
    let stats = server.stats().await;
    assert_eq!(stats.rooms, 1);
    assert_eq!(stats.ranked_queue, 1);
}

#[tokio::test(start_paused = true)]
async fn ranked_room_starts_when_everyone_is_ready() {
    let (server, store) = setup(&[("alice", 100), ("bob", 150)]);
    let mut alice = Client::login(&server, "alice").await;
    let mut bob = Client::login(&server, "bob").await;

    alice.send(&server, ClientEvent::FindMatch {}).await;
    bob.send(&server, ClientEvent::FindMatch {}).await;
    let room_id = match bob
        .expect(|e| matches!(e, ServerEvent::RankedLobbyUpdate { .. }))
        .await
    {
        ServerEvent::RankedLobbyUpdate { room_id, .. } => room_id,
        _ => unreachable!(),
    };

    alice
        .send(
            &server,
            ClientEvent::ReadyRanked {
                room_id: room_id.clone(),
            },
        )
        .await;
    assert!(!bob
        .drain()
        .iter()
        .any(|e| matches!(e, ServerEvent::GameLoading { .. })));

    bob.send(
        &server,
        ClientEvent::ReadyRanked {
            room_id: room_id.clone(),
        },
    )
    .await;
    match alice
        .expect(|e| matches!(e, ServerEvent::GameLoading { .. }))
        .await
    {
        ServerEvent::GameLoading { visibility, .. } => {
            assert_eq!(visibility, ScoreVisibility::Hidden)
        }
        _ => unreachable!(),
    }

    alice.game_start().await;
    alice
        .send(
            &server,
            ClientEvent::SubmitWord {
                room_id: room_id.clone(),
                word: "planet".into(),
            },
        )
        .await;
    match alice
        .expect(|e| matches!(e, ServerEvent::MyScoreUpdate { .. }))
        .await
    {
        ServerEvent::MyScoreUpdate { score, .. } => assert_eq!(score, 3),
        _ => unreachable!(),
    }

    // bob sees nothing of alice's score until the end
    let mut seen = Vec::new();
    loop {
        let event = bob.expect(|_| true).await;
        if matches!(event, ServerEvent::GameOver { .. }) {
            break;
        }
        seen.push(event);
    }
    assert!(!seen.iter().any(|e| matches!(
        e,
        ServerEvent::ScoreUpdate { .. } | ServerEvent::MyScoreUpdate { .. }
    )));

    assert_eq!(stored(store.as_ref(), "alice").await.lp, 120);
    assert_eq!(stored(store.as_ref(), "bob").await.lp, 145);
}

#[tokio::test(start_paused = true)]
async fn quit_penalty_is_charged_once() {
    let (server, store) = setup(&[("alice", 100), ("bob", 100)]);
    let (mut alice, mut bob, room_id) = quick_pair(&server, "alice", "bob").await;
    alice.game_start().await;

    alice
        .send(
            &server,
            ClientEvent::QuitMatch {
                room_id: room_id.clone(),
            },
        )
        .await;
    match alice
        .expect(|e| matches!(e, ServerEvent::QuitSuccess { .. }))
        .await
    {
        ServerEvent::QuitSuccess {
            lp_delta, new_lp, ..
        } => {
            assert_eq!(lp_delta, FORFEIT_PENALTY);
            assert_eq!(new_lp, 80);
        }
        _ => unreachable!(),
    }

    // a quitter can no longer score
    alice
        .send(
            &server,
            ClientEvent::SubmitWord {
                room_id: room_id.clone(),
                word: "tree".into(),
            },
        )
        .await;
    match alice
        .expect(|e| matches!(e, ServerEvent::WordResult { .. }))
        .await
    {
        ServerEvent::WordResult { accepted, .. } => assert!(!accepted),
        _ => unreachable!(),
    }

    let results = bob.game_over().await;
    let quitter = result_for(&results, "alice");
    assert!(quitter.forfeited);
    assert_eq!(quitter.place, None);
    assert_eq!(quitter.new_lp, Some(80));
    assert_eq!(result_for(&results, "bob").lp_delta, 20);

    assert_eq!(stored(store.as_ref(), "alice").await.lp, 80);
    assert_eq!(stored(store.as_ref(), "bob").await.lp, 120);
    // the quitter is free to queue again
    alice.send(&server, ClientEvent::QuickMatch {}).await;
    alice
        .expect(|e| matches!(e, ServerEvent::SearchingMatch { .. }))
        .await;
}

#[tokio::test(start_paused = true)]
async fn everyone_quitting_settles_early() {
    let (server, store) = setup(&[("alice", 100), ("bob", 10)]);
    let (mut alice, mut bob, room_id) = quick_pair(&server, "alice", "bob").await;
    alice.game_start().await;

    for client in [&mut alice, &mut bob] {
        client
            .send(
                &server,
                ClientEvent::QuitMatch {
                    room_id: room_id.clone(),
                },
            )
            .await;
    }
    assert_eq!(server.stats().await.rooms, 0);
    assert_eq!(stored(store.as_ref(), "alice").await.lp, 80);
    // clamped at zero
    assert_eq!(stored(store.as_ref(), "bob").await.lp, 0);
}

#[tokio::test(start_paused = true)]
async fn dropping_out_mid_game_forfeits() {
    let (server, store) = setup(&[("alice", 100), ("bob", 100)]);
    let (mut alice, mut bob, _room_id) = quick_pair(&server, "alice", "bob").await;
    alice.game_start().await;

    server.disconnect(&mut alice.conn).await;
    let results = bob.game_over().await;
    assert!(result_for(&results, "alice").forfeited);
    assert_eq!(result_for(&results, "alice").lp_delta, FORFEIT_PENALTY);
    assert_eq!(stored(store.as_ref(), "alice").await.lp, 80);
    assert_eq!(stored(store.as_ref(), "bob").await.lp, 120);
    assert_eq!(server.stats().await.online, 1);
}

#[tokio::test(start_paused = true)]
async fn reconnect_rejoins_the_running_room() {
    let (server, store) = setup(&[("alice", 100), ("bob", 100)]);
    let (mut alice, mut bob, room_id) = quick_pair(&server, "alice", "bob").await;
    alice.game_start().await;
    server.disconnect(&mut alice.conn).await;

    let mut resumed = Client::new();
    resumed
        .send(&server, ClientEvent::ReconnectUser(credentials("alice")))
        .await;
    match resumed
        .expect(|e| matches!(e, ServerEvent::RejoinRoom { .. }))
        .await
    {
        ServerEvent::RejoinRoom {
            room_id: rejoined,
            players,
            ..
        } => {
            assert_eq!(rejoined, room_id);
            assert_eq!(players.len(), 2);
        }
        _ => unreachable!(),
    }

    // nobody scored: a total tie pays nothing
    let results = resumed.game_over().await;
    assert!(!result_for(&results, "alice").forfeited);
    assert!(results.iter().all(|r| r.lp_delta == 0));
    bob.game_over().await;
    assert_eq!(stored(store.as_ref(), "alice").await.lp, 100);
}

#[tokio::test(start_paused = true)]
async fn second_login_is_refused() {
    let (server, _store) = setup(&[("alice", 100)]);
    let mut first = Client::login(&server, "alice").await;

    let mut second = Client::new();
    second
        .send(&server, ClientEvent::Login(credentials("alice")))
        .await;
    match second
        .expect(|e| matches!(e, ServerEvent::AuthError { .. }))
        .await
    {
        ServerEvent::AuthError { message } => {
            assert_eq!(message, AuthError::AlreadyOnline.to_string())
        }
        _ => unreachable!(),
    }

    // an explicit reconnect takes the account over
    second
        .send(&server, ClientEvent::ReconnectUser(credentials("alice")))
        .await;
    second
        .expect(|e| matches!(e, ServerEvent::AuthSuccess(_)))
        .await;
    first
        .expect(|e| matches!(e, ServerEvent::AuthError { .. }))
        .await;
    first.send(&server, ClientEvent::FindMatch {}).await;
    assert_eq!(first.room_error().await, RoomError::NotAuthenticated.to_string());
}

#[tokio::test(start_paused = true)]
async fn register_then_login() {
    let (server, store) = setup(&[]);
    let mut client = Client::new();
    client
        .send(&server, ClientEvent::Register(credentials("newbie")))
        .await;
    match client
        .expect(|e| matches!(e, ServerEvent::AuthSuccess(_)))
        .await
    {
        ServerEvent::AuthSuccess(profile) => {
            assert_eq!(profile.lp, 0);
            assert_eq!(profile.rank.tier, 0);
        }
        _ => unreachable!(),
    }
    let record = stored(store.as_ref(), "newbie").await;
    assert_ne!(record.password_hash, PASSWORD);

    let mut other = Client::new();
    other
        .send(&server, ClientEvent::Register(credentials("newbie")))
        .await;
    match other
        .expect(|e| matches!(e, ServerEvent::AuthError { .. }))
        .await
    {
        ServerEvent::AuthError { message } => {
            assert_eq!(message, AuthError::UsernameTaken.to_string())
        }
        _ => unreachable!(),
    }
}

#[tokio::test(start_paused = true)]
async fn custom_room_host_and_password() {
    let (server, _store) = setup(&[("alice", 100), ("bob", 100), ("carol", 100)]);
    let mut alice = Client::login(&server, "alice").await;
    let mut bob = Client::login(&server, "bob").await;
    let mut carol = Client::login(&server, "carol").await;

    alice
        .send(
            &server,
            ClientEvent::CreateRoom {
                password: Some("pw".into()),
            },
        )
        .await;
    let room_id = match alice
        .expect(|e| matches!(e, ServerEvent::RoomCreated { .. }))
        .await
    {
        ServerEvent::RoomCreated { room_id, locked } => {
            assert!(locked);
            room_id
        }
        _ => unreachable!(),
    };

    carol.send(&server, ClientEvent::GetRoomList {}).await;
    match carol
        .expect(|e| matches!(e, ServerEvent::RoomListUpdate { .. }))
        .await
    {
        ServerEvent::RoomListUpdate { rooms } => {
            assert_eq!(rooms.len(), 1);
            assert_eq!(rooms[0].room_id, room_id);
            assert!(rooms[0].locked);
        }
        _ => unreachable!(),
    }

    bob.send(
        &server,
        ClientEvent::JoinRoom {
            room_id: room_id.clone(),
            password: Some("nope".into()),
        },
    )
    .await;
    assert_eq!(bob.room_error().await, RoomError::WrongPassword.to_string());

    bob.send(
        &server,
        ClientEvent::JoinRoom {
            room_id: room_id.clone(),
            password: Some("pw".into()),
        },
    )
    .await;
    alice
        .expect(|e| matches!(e, ServerEvent::PlayerJoined { players, .. } if players.len() == 2))
        .await;

    bob.send(
        &server,
        ClientEvent::StartCustomGame {
            room_id: room_id.clone(),
        },
    )
    .await;
    assert_eq!(bob.room_error().await, RoomError::NotHost.to_string());

    alice
        .send(
            &server,
            ClientEvent::LeaveWaitingRoom {
                room_id: room_id.clone(),
            },
        )
        .await;
    alice
        .expect(|e| matches!(e, ServerEvent::LeftRoom { .. }))
        .await;
    match bob
        .expect(|e| matches!(e, ServerEvent::PlayerJoined { players, .. } if players.len() == 1))
        .await
    {
        ServerEvent::PlayerJoined { host, .. } => {
            assert_eq!(host.map(|h| h.0), Some("bob".to_string()))
        }
        _ => unreachable!(),
    }

    bob.send(
        &server,
        ClientEvent::StartCustomGame {
            room_id: room_id.clone(),
        },
    )
    .await;
    assert_eq!(bob.room_error().await, RoomError::NotEnoughPlayers.to_string());

    carol
        .send(
            &server,
            ClientEvent::JoinRoom {
                room_id: room_id.clone(),
                password: Some("pw".into()),
            },
        )
        .await;
    bob.send(
        &server,
        ClientEvent::StartCustomGame {
            room_id: room_id.clone(),
        },
    )
    .await;
    assert_eq!(carol.loading_room().await, room_id);

    // started rooms leave the public list
    alice.send(&server, ClientEvent::GetRoomList {}).await;
    alice
        .expect(|e| matches!(e, ServerEvent::RoomListUpdate { rooms } if rooms.is_empty()))
        .await;
}

#[tokio::test(start_paused = true)]
async fn practice_match_against_bots() {
    let (server, store) = setup(&[("alice", 100)]);
    let mut alice = Client::login(&server, "alice").await;
    alice.send(&server, ClientEvent::StartAiMatch {}).await;

    match alice
        .expect(|e| matches!(e, ServerEvent::GameLoading { .. }))
        .await
    {
        ServerEvent::GameLoading { room_id, players, .. } => {
            assert!(room_id.0.starts_with("ai_"));
            assert_eq!(players.len(), 4);
            assert_eq!(players.iter().filter(|p| p.is_bot).count(), 3);
        }
        _ => unreachable!(),
    }

    let results = alice.game_over().await;
    assert_eq!(results.len(), 4);
    for bot in results.iter().filter(|r| r.is_bot) {
        assert_eq!(bot.new_lp, None);
        assert_eq!(bot.rank, None);
    }
    // under ten points pays nothing
    let human = result_for(&results, "alice");
    assert_eq!(human.lp_delta, 0);
    assert_eq!(human.new_lp, Some(100));

    let record = stored(store.as_ref(), "alice").await;
    assert_eq!(record.lp, 100);
    assert_eq!((record.wins, record.losses), (0, 0));
}

#[tokio::test(start_paused = true)]
async fn bots_play_until_the_round_ends() {
    let (server, store, mut alice, room_id) = practice_room(ScoreVisibility::Live).await;
    alice
        .send(
            &server,
            ClientEvent::SubmitWord {
                room_id: room_id.clone(),
                word: "elephants".into(),
            },
        )
        .await;

    let (events, results) = alice.play_out().await;
    let words = bot_words(&events);
    assert!(!words.is_empty());
    for bot in results.iter().filter(|r| r.is_bot) {
        // the last running total a bot announced is its final score
        let announced = words
            .iter()
            .filter(|(name, _)| name == bot.username.as_str())
            .filter_map(|(_, score)| *score)
            .last()
            .unwrap_or(0);
        assert_eq!(announced, bot.score);
        assert!(bot.words.iter().all(|w| WORDS.contains(&w.as_str())));
    }

    // eleven points converts to a single LP
    let human = result_for(&results, "alice");
    assert_eq!(human.score, 11);
    assert_eq!(human.lp_delta, 1);
    assert_eq!(human.new_lp, Some(101));
    assert_eq!(stored(store.as_ref(), "alice").await.lp, 101);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(alice.drain().is_empty());
    assert_eq!(server.stats().await.rooms, 0);
}

#[tokio::test(start_paused = true)]
async fn hidden_practice_room_keeps_bot_scores_private() {
    let (_server, _store, mut alice, _room_id) = practice_room(ScoreVisibility::Hidden).await;

    let (events, results) = alice.play_out().await;
    let words = bot_words(&events);
    assert!(!words.is_empty());
    assert!(words.iter().all(|(_, score)| score.is_none()));
    assert!(!events
        .iter()
        .any(|e| matches!(e, ServerEvent::ScoreUpdate { .. })));

    // revealed once the round is over
    assert!(results.iter().any(|r| r.is_bot && r.score > 0));
}

#[tokio::test(start_paused = true)]
async fn ranked_room_left_alone_goes_back_to_the_queue() {
    let (server, _store) = setup(&[("alice", 100), ("bob", 150)]);
    let mut alice = Client::login(&server, "alice").await;
    let mut bob = Client::login(&server, "bob").await;

    alice.send(&server, ClientEvent::FindMatch {}).await;
    bob.send(&server, ClientEvent::FindMatch {}).await;
    let room_id = match bob
        .expect(|e| matches!(e, ServerEvent::RankedLobbyUpdate { .. }))
        .await
    {
        ServerEvent::RankedLobbyUpdate { room_id, .. } => room_id,
        _ => unreachable!(),
    };
    let stats = server.stats().await;
    assert_eq!((stats.rooms, stats.ranked_queue), (1, 0));

    bob.send(
        &server,
        ClientEvent::LeaveWaitingRoom {
            room_id: room_id.clone(),
        },
    )
    .await;
    bob.expect(|e| matches!(e, ServerEvent::LeftRoom { .. }))
        .await;

    match alice
        .expect(|e| matches!(e, ServerEvent::LeftRoom { .. }))
        .await
    {
        ServerEvent::LeftRoom { room_id: left } => assert_eq!(left, room_id),
        _ => unreachable!(),
    }
    assert!(matches!(
        alice.expect(|_| true).await,
        ServerEvent::SearchingMatch { lp: 100 }
    ));
    let stats = server.stats().await;
    assert_eq!((stats.rooms, stats.ranked_queue), (0, 1));
}

struct FlakyStore {
    inner: MemoryUserStore,
    down: AtomicBool,
}

impl FlakyStore {
    fn offline<'a, T: Send + 'a>(&self) -> Option<BoxFuture<'a, Result<T, PersistenceError>>> {
        self.down
            .load(Ordering::SeqCst)
            .then(|| async { Err(PersistenceError::Unavailable("offline".into())) }.boxed())
    }
}

impl UserStore for FlakyStore {
    fn get_user<'a>(
        &'a self,
        username: &'a str,
    ) -> BoxFuture<'a, Result<Option<UserRecord>, PersistenceError>> {
        self.offline().unwrap_or_else(|| self.inner.get_user(username))
    }

    fn create_user(&self, record: UserRecord) -> BoxFuture<'_, Result<(), PersistenceError>> {
        self.offline()
            .unwrap_or_else(|| self.inner.create_user(record))
    }

    fn update_rating<'a>(
        &'a self,
        username: &'a str,
        update: RatingUpdate,
    ) -> BoxFuture<'a, Result<(), PersistenceError>> {
        self.offline()
            .unwrap_or_else(|| self.inner.update_rating(username, update))
    }

    fn top_by_rating(
        &self,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<UserRecord>, PersistenceError>> {
        self.offline()
            .unwrap_or_else(|| self.inner.top_by_rating(limit))
    }
}

#[tokio::test(start_paused = true)]
async fn store_outage_does_not_block_settlement() {
    let store = Arc::new(FlakyStore {
        inner: MemoryUserStore::with_users([
            UserRecord::new("alice", PASSWORD, 100),
            UserRecord::new("bob", PASSWORD, 100),
        ]),
        down: AtomicBool::new(false),
    });
    let server = GameServer::new(test_config(), Dictionary::from_words(WORDS), store.clone());
    let (mut alice, mut bob, _room_id) = quick_pair(&server, "alice", "bob").await;
    alice.game_start().await;

    store.down.store(true, Ordering::SeqCst);
    let results = alice.game_over().await;
    assert_eq!(results.len(), 2);
    bob.game_over().await;
    assert_eq!(server.stats().await.rooms, 0);
    assert!(server.leaderboard(10).await.is_empty());

    // nothing was overwritten while the store was down
    store.down.store(false, Ordering::SeqCst);
    assert_eq!(stored(store.as_ref(), "alice").await.lp, 100);
    assert_eq!(stored(store.as_ref(), "bob").await.lp, 100);
}
