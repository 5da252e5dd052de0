// Pool commissioner entry point.
//
// Startup sequence:
// 1. Parse command line
// 2. Load config (writing defaults on first run)
// 3. Initialize tracing (log to file, stdout carries JSON only)
// 4. Open database
// 5. Run one command and print its result

mod command_line;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};

use madness_core::config::{self, LoggingConfig};
use madness_core::draft::ResetScope;
use madness_core::model::{Actor, MembershipRole};
use madness_core::protocol::Outcome;
use madness_core::{ActionError, ActionResponse, Commissioner, Database};

use command_line::{Args, Command};

fn main() -> anyhow::Result<ExitCode> {
    // 1. Parse command line
    let args = Args::parse();

    // 2. Load config
    let (base_dir, config) = match &args.config_dir {
        Some(dir) => {
            config::ensure_config_files(dir).context("failed to write default configuration")?;
            let config = config::load_config_from(dir).context("failed to load configuration")?;
            (dir.clone(), config)
        }
        None => {
            let config = config::load_config().context("failed to load configuration")?;
            let cwd = std::env::current_dir().context("failed to resolve working directory")?;
            (cwd, config)
        }
    };

    // 3. Initialize tracing
    init_tracing(&base_dir, &config.logging)?;

    // 4. Open database
    let db_path = args.db.clone().unwrap_or(config.db_path);
    let db = Database::open(&db_path).context("failed to open database")?;
    info!("Database opened at {db_path}");
    let commissioner = Commissioner::new(db);

    // 5. Run the command
    let actor = args.actor.actor();
    match run(&commissioner, &actor, args.command) {
        Ok(true) => Ok(ExitCode::SUCCESS),
        Ok(false) => Ok(ExitCode::FAILURE),
        Err(e) => {
            error!("command failed: {e:#}");
            Err(e)
        }
    }
}

/// Execute one command. Returns whether it succeeded; refused operations are
/// printed as a failed response rather than returned as errors.
fn run(commissioner: &Commissioner, actor: &Actor, command: Command) -> anyhow::Result<bool> {
    let db = commissioner.database();
    match command {
        Command::AddUser {
            name,
            email,
            user_role,
        } => show(db.create_user(&name, &email, user_role.into())),
        Command::AddTournament { name, year } => show(db.create_tournament(&name, year)),
        Command::SetStatus { tournament, status } => {
            respond(db.set_tournament_status(tournament, status))
        }
        Command::AddTeam {
            tournament,
            name,
            seed,
            region,
        } => show(db.add_team(tournament, &name, seed, region)),
        Command::AddGroup {
            tournament,
            name,
            admin,
        } => show(db.create_group(tournament, &name, admin)),
        Command::AddMember {
            group,
            user,
            position,
            admin,
        } => {
            let role = if admin {
                MembershipRole::Admin
            } else {
                MembershipRole::Member
            };
            show(db.add_member(group, user, role, position))
        }

        Command::Pick { group, team } => respond(commissioner.submit_pick(actor, group, team)),
        Command::Undo { group } => respond(commissioner.undo_last_pick(actor, group)),
        Command::Reset { tournament, group } => {
            let scope = match (tournament, group) {
                (Some(id), _) => ResetScope::Tournament(id),
                (None, Some(id)) => ResetScope::Group(id),
                (None, None) => ResetScope::All,
            };
            respond(commissioner.reset_draft(actor, scope))
        }
        Command::Position {
            group,
            user,
            position,
        } => respond(commissioner.set_draft_position(actor, group, user, position)),
        Command::RemoveMember { group, user } => show(
            commissioner
                .remove_member(actor, group, user)
                .map(|removed| json!({ "removed_picks": removed })),
        ),
        Command::Tiebreaker {
            group,
            final_score,
            nit_winner,
            user,
        } => respond(commissioner.submit_tiebreaker(
            actor,
            group,
            user,
            final_score,
            &nit_winner,
        )),

        Command::Record {
            tournament,
            winner,
            loser,
            round,
        } => respond(commissioner.record_result(actor, tournament, winner, loser, round)),
        Command::Revert { result } => respond(commissioner.revert_result(actor, result)),

        Command::Board { group } => show((|| {
            Ok::<_, ActionError>(json!({
                "on_the_clock": commissioner.current_picker(group)?,
                "available": commissioner.available_teams(group)?,
                "picks": commissioner.draft_log(group)?,
            }))
        })()),
        Command::Roster { group, user } => show(commissioner.roster(group, user)),
        Command::Standings { group, tournament } => match (group, tournament) {
            (Some(id), _) => show(commissioner.group_standings(id)),
            (None, Some(id)) => show(commissioner.tournament_standings(id)),
            (None, None) => anyhow::bail!("either --group or --tournament is required"),
        },
    }
}

/// Print a mutating operation's outcome as an [`ActionResponse`].
fn respond<T: Outcome>(result: Result<T, ActionError>) -> anyhow::Result<bool> {
    let response = ActionResponse::from(result);
    print_json(&response)?;
    Ok(response.success)
}

/// Print a value, or the failed response if there is none.
fn show<T: Serialize>(result: Result<T, ActionError>) -> anyhow::Result<bool> {
    match result {
        Ok(value) => {
            print_json(&value)?;
            Ok(true)
        }
        Err(err) => {
            print_json(&ActionResponse::failed(&err))?;
            Ok(false)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{text}");
    Ok(())
}

/// Initialize tracing to append to `madness.log` in the configured directory.
/// `RUST_LOG` overrides the configured filter.
fn init_tracing(base_dir: &Path, logging: &LoggingConfig) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir: PathBuf = base_dir.join(&logging.directory);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("madness.log"))
        .context("failed to open log file")?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter)),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
