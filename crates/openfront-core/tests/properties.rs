//! Randomized operation sequences against the engine's bookkeeping
//! invariants: border sets, tile ownership, the tile update stream and the
//! one-alliance-per-pair rule.

use std::collections::BTreeSet;

use openfront_core::{GameConfig, TileStore, WorldEngine};
use openfront_protocol::{PlayerId, PlayerType, SmallId, TileRef};
use proptest::prelude::*;

const WIDTH: usize = 6;
const HEIGHT: usize = 5;
const TILES: TileRef = (WIDTH * HEIGHT) as TileRef;

fn land() -> TileStore {
    TileStore::from_ascii(&vec!["#".repeat(WIDTH); HEIGHT].join("\n")).unwrap()
}

fn with_players(mut engine: WorldEngine, count: usize) -> (WorldEngine, Vec<SmallId>) {
    let players = (0..count)
        .map(|i| {
            let id = PlayerId::new(format!("p{i}"));
            engine.add_player(id, format!("P{i}"), PlayerType::Human, None)
        })
        .collect();
    (engine, players)
}

// ---------------------------------------------------------------------------
// Territory
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
enum TileOp {
    Conquer(usize, TileRef),
    Relinquish(TileRef),
    Fallout(TileRef, bool),
}

fn tile_op() -> impl Strategy<Value = TileOp> {
    prop_oneof![
        3 => (0..3usize, 0..TILES).prop_map(|(p, t)| TileOp::Conquer(p, t)),
        1 => (0..TILES).prop_map(TileOp::Relinquish),
        1 => (0..TILES, any::<bool>()).prop_map(|(t, v)| TileOp::Fallout(t, v)),
    ]
}

fn check_territory(engine: &WorldEngine, mirror: &TileStore) -> Result<(), TestCaseError> {
    for player in engine.players() {
        for &t in player.tiles() {
            prop_assert_eq!(
                player.border_tiles().contains(&t),
                engine.calc_is_border(t),
                "border membership of {} for {}",
                t,
                player.small_id()
            );
        }
        for &t in player.border_tiles() {
            prop_assert!(player.tiles().contains(&t));
        }
    }
    for t in 0..TILES {
        let owner_id = engine.map().owner_id(t);
        prop_assert_eq!(engine.has_owner(t), owner_id != 0);
        let holders = engine
            .players()
            .filter(|p| p.tiles().contains(&t))
            .map(|p| p.small_id().0)
            .collect::<Vec<_>>();
        if owner_id == 0 {
            prop_assert!(holders.is_empty());
        } else {
            prop_assert_eq!(holders, vec![owner_id]);
        }
        prop_assert_eq!(mirror.owner_id(t), owner_id);
        prop_assert_eq!(mirror.has_fallout(t), engine.map().has_fallout(t));
    }
    prop_assert_eq!(mirror.num_fallout_tiles(), engine.map().num_fallout_tiles());
    Ok(())
}

proptest! {
    #[test]
    fn territory_bookkeeping_survives_any_sequence(
        ops in prop::collection::vec(tile_op(), 1..80),
    ) {
        let engine = WorldEngine::without_default_executions(land(), GameConfig::default());
        let (mut engine, players) = with_players(engine, 3);
        let mut mirror = land();

        for op in ops {
            match op {
                TileOp::Conquer(p, t) => engine.conquer(players[p], t),
                TileOp::Relinquish(t) => {
                    if engine.has_owner(t) {
                        engine.relinquish(t);
                    }
                }
                TileOp::Fallout(t, v) => engine.set_fallout(t, v),
            }
            let batch = engine.execute_next_tick();
            for packed in batch.tile_updates() {
                let tile = mirror.update_tile(packed);
                prop_assert_eq!(mirror.to_tile_update(tile), packed);
            }
            check_territory(&engine, &mirror)?;
        }
    }
}

// ---------------------------------------------------------------------------
// Diplomacy
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
enum DiplomacyOp {
    Request(usize, usize),
    Accept(usize),
    Reject(usize),
    Break(usize, usize),
    Expire(usize, usize),
    Tick,
}

fn diplomacy_op() -> impl Strategy<Value = DiplomacyOp> {
    prop_oneof![
        3 => (0..4usize, 0..4usize).prop_map(|(a, b)| DiplomacyOp::Request(a, b)),
        2 => any::<usize>().prop_map(DiplomacyOp::Accept),
        1 => any::<usize>().prop_map(DiplomacyOp::Reject),
        1 => (0..4usize, 0..4usize).prop_map(|(a, b)| DiplomacyOp::Break(a, b)),
        1 => (0..4usize, 0..4usize).prop_map(|(a, b)| DiplomacyOp::Expire(a, b)),
        2 => Just(DiplomacyOp::Tick),
    ]
}

fn check_alliances(engine: &WorldEngine, players: &[SmallId]) -> Result<(), TestCaseError> {
    let mut pairs = BTreeSet::new();
    for alliance in engine.active_alliances() {
        let (a, b) = (alliance.requestor(), alliance.recipient());
        prop_assert_ne!(a, b);
        let pair = if a.0 < b.0 { (a.0, b.0) } else { (b.0, a.0) };
        prop_assert!(pairs.insert(pair), "second alliance between {} and {}", a, b);
    }

    for &p in players {
        let own = engine.player(p).alliances();
        let unique = own.iter().collect::<BTreeSet<_>>();
        prop_assert_eq!(unique.len(), own.len(), "duplicate alliance on {}", p);
        for &id in own {
            let alliance = engine.alliance(id);
            prop_assert!(alliance.is_active());
            prop_assert!(alliance.other(p).is_some());
        }
        for &q in players {
            prop_assert_eq!(engine.is_allied_with(p, q), engine.is_allied_with(q, p));
        }
        prop_assert!(!engine.is_allied_with(p, p));
    }

    for request in engine.pending_alliance_requests() {
        prop_assert!(!engine.is_allied_with(request.requestor(), request.recipient()));
    }
    Ok(())
}

proptest! {
    #[test]
    fn at_most_one_alliance_per_pair(
        ops in prop::collection::vec(diplomacy_op(), 1..120),
    ) {
        let config = GameConfig {
            num_spawn_phase_turns: 0,
            alliance_duration: 8,
            alliance_extension_prompt_offset: 4,
            ..GameConfig::default()
        };
        let (mut engine, players) = with_players(WorldEngine::new(land(), config), 4);
        for (i, &p) in players.iter().enumerate() {
            engine.conquer(p, (i * 7) as TileRef);
        }

        for op in ops {
            let pending = engine
                .pending_alliance_requests()
                .map(|r| r.id())
                .collect::<Vec<_>>();
            match op {
                DiplomacyOp::Request(a, b) => {
                    engine.create_alliance_request(players[a], players[b]);
                }
                DiplomacyOp::Accept(k) if !pending.is_empty() => {
                    engine.accept_alliance_request(pending[k % pending.len()]);
                }
                DiplomacyOp::Reject(k) if !pending.is_empty() => {
                    engine.reject_alliance_request(pending[k % pending.len()]);
                }
                DiplomacyOp::Break(a, b) => {
                    if a != b && engine.is_allied_with(players[a], players[b]) {
                        engine.break_alliance(players[a], players[b]);
                    }
                }
                DiplomacyOp::Expire(a, b) => {
                    if let Some(id) = engine.alliance_between(players[a], players[b]) {
                        engine.expire_alliance(id);
                    }
                }
                DiplomacyOp::Tick => {
                    engine.execute_next_tick();
                }
                DiplomacyOp::Accept(_) | DiplomacyOp::Reject(_) => {}
            }
            check_alliances(&engine, &players)?;
        }
    }
}
