use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use madness_core::model::{
    Actor, GameResultId, GroupId, Region, Role, TeamId, TournamentId, TournamentStatus, UserId,
};

/// Tournament pool commissioner
///
/// Runs snake drafts and keeps score for March Madness pools stored in a
/// local SQLite database. Every command prints JSON.
#[derive(Parser, Debug)]
#[command(version, about = "Tournament pool commissioner")]
pub(crate) struct Args {
    /// Directory holding `config/madness.toml` [default: current directory]
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// SQLite database to use instead of the configured one
    #[arg(long, global = true)]
    pub db: Option<String>,

    #[command(flatten)]
    pub actor: ActorArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Who is making the request.
#[derive(ClapArgs, Debug)]
pub(crate) struct ActorArgs {
    /// User id of the caller
    #[arg(long = "as", value_name = "USER_ID", global = true, default_value_t = 0)]
    pub user_id: UserId,

    /// System-wide role of the caller
    #[arg(long, value_enum, global = true, default_value_t = RoleArg::Player)]
    pub role: RoleArg,

    /// The caller administers the group being acted on
    #[arg(long, global = true)]
    pub group_admin: bool,
}

impl ActorArgs {
    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id, self.role.into(), self.group_admin)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum RoleArg {
    Player,
    GroupAdmin,
    SuperAdmin,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Player => Role::Player,
            RoleArg::GroupAdmin => Role::GroupAdmin,
            RoleArg::SuperAdmin => Role::SuperAdmin,
        }
    }
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Register a user
    AddUser {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, value_enum, default_value_t = RoleArg::Player)]
        user_role: RoleArg,
    },

    /// Create a tournament
    AddTournament {
        #[arg(long)]
        name: String,
        #[arg(long)]
        year: i32,
    },

    /// Move a tournament to SETUP, DRAFTING, LIVE, or COMPLETED
    SetStatus {
        #[arg(long)]
        tournament: TournamentId,
        status: TournamentStatus,
    },

    /// Add a team to a tournament's bracket
    AddTeam {
        #[arg(long)]
        tournament: TournamentId,
        #[arg(long)]
        name: String,
        #[arg(long)]
        seed: u8,
        /// East, West, South, or Midwest
        #[arg(long)]
        region: Region,
    },

    /// Create a drafting group
    AddGroup {
        #[arg(long)]
        tournament: TournamentId,
        #[arg(long)]
        name: String,
        #[arg(long)]
        admin: Option<UserId>,
    },

    /// Seat a user in a group
    AddMember {
        #[arg(long)]
        group: GroupId,
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        position: Option<u32>,
        /// Seat the user as a group admin
        #[arg(long)]
        admin: bool,
    },

    /// Draft a team for whoever is on the clock
    Pick {
        #[arg(long)]
        group: GroupId,
        #[arg(long)]
        team: TeamId,
    },

    /// Remove the most recent pick in a group
    Undo {
        #[arg(long)]
        group: GroupId,
    },

    /// Delete picks everywhere, in one tournament, or in one group
    Reset {
        #[arg(long, conflicts_with = "group")]
        tournament: Option<TournamentId>,
        #[arg(long)]
        group: Option<GroupId>,
    },

    /// Assign a member's draft slot
    Position {
        #[arg(long)]
        group: GroupId,
        #[arg(long)]
        user: UserId,
        position: u32,
    },

    /// Remove a member and their picks from a group
    RemoveMember {
        #[arg(long)]
        group: GroupId,
        #[arg(long)]
        user: UserId,
    },

    /// Save tie-breaker predictions
    Tiebreaker {
        #[arg(long)]
        group: GroupId,
        /// Combined points scored in the championship game
        #[arg(long)]
        final_score: u32,
        /// Predicted NIT champion
        #[arg(long)]
        nit_winner: String,
        /// Member to save for (admins only; defaults to the caller)
        #[arg(long)]
        user: Option<UserId>,
    },

    /// Record a game result and update scores
    Record {
        #[arg(long)]
        tournament: TournamentId,
        #[arg(long)]
        winner: TeamId,
        #[arg(long)]
        loser: TeamId,
        #[arg(long)]
        round: u32,
    },

    /// Undo a recorded game result
    Revert {
        #[arg(long)]
        result: GameResultId,
    },

    /// Show who is on the clock, the teams left, and the picks so far
    Board {
        #[arg(long)]
        group: GroupId,
    },

    /// Show a member's teams and points
    Roster {
        #[arg(long)]
        group: GroupId,
        #[arg(long)]
        user: UserId,
    },

    /// Show standings for a group or a whole tournament
    Standings {
        #[arg(long, conflicts_with = "tournament", required_unless_present = "tournament")]
        group: Option<GroupId>,
        #[arg(long)]
        tournament: Option<TournamentId>,
    },
}
