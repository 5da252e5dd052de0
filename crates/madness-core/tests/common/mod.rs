// Shared fixtures for integration tests.

#![allow(dead_code)]

use madness_core::model::{Actor, Group, MembershipRole, Region, Role, Team, Tournament, User};
use madness_core::{Commissioner, Database};

/// A tournament with a full 64-team bracket and one drafting group.
pub struct Pool {
    pub commissioner: Commissioner,
    pub tournament: Tournament,
    pub group: Group,
    /// Administers `group` but does not draft in it.
    pub admin: User,
    pub super_admin: User,
    /// Members of `group` in draft order (positions 1..=n).
    pub players: Vec<User>,
    pub teams: Vec<Team>,
}

pub const REGIONS: [Region; 4] = [Region::East, Region::West, Region::South, Region::Midwest];

impl Pool {
    pub fn db(&self) -> &Database {
        self.commissioner.database()
    }

    pub fn admin_actor(&self) -> Actor {
        Actor::new(self.admin.id, Role::GroupAdmin, true)
    }

    pub fn super_actor(&self) -> Actor {
        Actor::super_admin(self.super_admin.id)
    }

    pub fn player(&self, index: usize) -> Actor {
        Actor::player(self.players[index].id)
    }

    /// The team with `seed` in `region`.
    pub fn team(&self, region: Region, seed: u8) -> &Team {
        self.teams
            .iter()
            .find(|t| t.region == region && t.seed == seed)
            .expect("bracket has every region/seed")
    }

    pub fn score(&self, index: usize) -> i64 {
        self.score_in(self.group.id, self.players[index].id)
    }

    pub fn score_in(&self, group_id: i64, user_id: i64) -> i64 {
        self.commissioner
            .group_standings(group_id)
            .unwrap()
            .into_iter()
            .find(|s| s.user_id == user_id)
            .expect("member has a standings row")
            .score
    }

    /// Add another group drafting the same bracket, with the given users at
    /// positions 1..=n.
    pub fn add_group(&self, name: &str, members: &[&User]) -> Group {
        let group = self
            .db()
            .create_group(self.tournament.id, name, Some(self.admin.id))
            .unwrap();
        for (i, user) in members.iter().enumerate() {
            self.db()
                .add_member(group.id, user.id, MembershipRole::Member, Some(i as u32 + 1))
                .unwrap();
        }
        group
    }
}

pub fn bracket(db: &Database, tournament: &Tournament) -> Vec<Team> {
    let mut teams = Vec::with_capacity(64);
    for region in REGIONS {
        for seed in 1..=16u8 {
            teams.push(
                db.add_team(tournament.id, &format!("{region} {seed}"), seed, region)
                    .unwrap(),
            );
        }
    }
    teams
}

/// A pool with `n` players at draft positions 1..=n on a fresh in-memory
/// database.
pub fn pool(n: usize) -> Pool {
    let db = Database::open(":memory:").expect("in-memory database should open");
    pool_on(db, n)
}

pub fn pool_on(db: Database, n: usize) -> Pool {
    let tournament = db.create_tournament("Madness 2026", 2026).unwrap();
    let teams = bracket(&db, &tournament);

    let admin = db
        .create_user("Commissioner", "commish@example.com", Role::GroupAdmin)
        .unwrap();
    let super_admin = db
        .create_user("Root", "root@example.com", Role::SuperAdmin)
        .unwrap();
    let group = db
        .create_group(tournament.id, "Office Pool", Some(admin.id))
        .unwrap();

    let names = ["Ana", "Ben", "Cy", "Dee", "Eve", "Fox", "Gus", "Hal"];
    let players: Vec<User> = (0..n)
        .map(|i| {
            let name = names.get(i).map_or_else(|| format!("Player {i}"), |s| s.to_string());
            let user = db
                .create_user(&name, &format!("{}@example.com", name.to_lowercase()), Role::Player)
                .unwrap();
            db.add_member(group.id, user.id, MembershipRole::Member, Some(i as u32 + 1))
                .unwrap();
            user
        })
        .collect();

    Pool {
        commissioner: Commissioner::new(db),
        tournament,
        group,
        admin,
        super_admin,
        players,
        teams,
    }
}

/// Run the whole draft with every member taking the strongest available
/// team on their own turn. Returns the overall pick numbers per player index.
pub fn run_full_draft(pool: &Pool) -> Vec<Vec<usize>> {
    let mut picks_by_player = vec![Vec::new(); pool.players.len()];
    while let Some(turn) = pool.commissioner.current_picker(pool.group.id).unwrap() {
        let index = pool
            .players
            .iter()
            .position(|u| u.id == turn.member.user_id)
            .unwrap();
        let team = pool.commissioner.available_teams(pool.group.id).unwrap()[0].clone();
        let receipt = pool
            .commissioner
            .submit_pick(&pool.player(index), pool.group.id, team.id)
            .unwrap();
        picks_by_player[index].push(receipt.overall);
    }
    picks_by_player
}
