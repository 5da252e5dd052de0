// Racing submissions against one group, on a shared handle and on separate
// connections to the same database file.

mod common;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Barrier};
use std::thread;

use common::{pool, pool_on};
use madness_core::model::Actor;
use madness_core::{ActionError, Commissioner, Conflict, Database};

struct ScratchFile(PathBuf);

impl ScratchFile {
    fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!("{name}_{}.db", std::process::id()));
        let file = Self(path);
        file.cleanup();
        file
    }

    fn path(&self) -> &str {
        self.0.to_str().expect("temp path is valid UTF-8")
    }

    fn cleanup(&self) {
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", self.0.display()));
        }
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[test]
fn two_admins_racing_for_one_team_yield_one_pick() {
    let pool = Arc::new(pool(4));
    let team = pool.teams[0].id;
    let group = pool.group.id;
    let racers = [pool.admin_actor(), pool.super_actor()];
    let barrier = Arc::new(Barrier::new(racers.len()));

    let handles: Vec<_> = racers
        .into_iter()
        .map(|actor| {
            let pool = Arc::clone(&pool);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                pool.commissioner.submit_pick(&actor, group, team)
            })
        })
        .collect();
    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
    assert!(outcomes.iter().any(|o| matches!(
        o,
        Err(ActionError::Conflict(Conflict::TeamTaken { .. }))
    )));

    let log = pool.commissioner.draft_log(group).unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].user_id, pool.players[0].id);
}

#[test]
fn player_and_admin_racing_never_double_pick() {
    let pool = Arc::new(pool(4));
    let group = pool.group.id;
    let team = pool.teams[0].id;
    let racers = [pool.player(0), pool.admin_actor()];
    let barrier = Arc::new(Barrier::new(racers.len()));

    let handles: Vec<_> = racers
        .into_iter()
        .map(|actor| {
            let pool = Arc::clone(&pool);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                pool.commissioner.submit_pick(&actor, group, team)
            })
        })
        .collect();
    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // Whoever loses is told either that the team is gone or that it is no
    // longer the player's turn; either way only one pick exists.
    assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
    let log = pool.commissioner.draft_log(group).unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].user_id, pool.players[0].id);
}

#[test]
fn separate_connections_keep_the_draft_consistent() {
    let file = ScratchFile::new("madness_concurrent_draft");
    let seeded = pool_on(Database::open(file.path()).unwrap(), 4);
    let group = seeded.group.id;

    // Both admins go after the same 24 teams in opposite orders.
    let wanted: Vec<_> = seeded.teams.iter().take(24).map(|t| t.id).collect();
    let mut reversed = wanted.clone();
    reversed.reverse();
    let racers = [(seeded.admin_actor(), wanted), (seeded.super_actor(), reversed)];
    let barrier = Arc::new(Barrier::new(racers.len()));

    let handles: Vec<_> = racers
        .into_iter()
        .map(|(actor, teams): (Actor, Vec<i64>)| {
            let path = file.path().to_string();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let commissioner = Commissioner::new(Database::open(&path).unwrap());
                barrier.wait();
                teams
                    .into_iter()
                    .filter_map(|team| commissioner.submit_pick(&actor, group, team).ok())
                    .count()
            })
        })
        .collect();
    let accepted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    let log = seeded.commissioner.draft_log(group).unwrap();
    assert_eq!(log.len(), accepted);
    assert_eq!(log.len(), 24, "every contested team is drafted exactly once");

    let distinct: HashSet<_> = log.iter().map(|p| p.team_id).collect();
    assert_eq!(distinct.len(), log.len());

    let slots: HashSet<_> = log.iter().map(|p| (p.round, p.pick_number)).collect();
    assert_eq!(slots.len(), log.len(), "no slot filled twice");

    for player in &seeded.players {
        let held = log.iter().filter(|p| p.user_id == player.id).count();
        assert_eq!(held, 6, "{} after six rounds", player.name);
    }
}
