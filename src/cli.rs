//! Command-line front end. Each invocation loads one snapshot, applies a single
//! transition and saves the result back to the store.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;

use crate::engine::error::EngineError;
use crate::engine::history::{unix_now, GameRecord};
use crate::engine::identity::{seat_players, IdSource, RandomIds};
use crate::engine::models::{Faction, GameKind, GameSummary, PlayerId, PlayerSeat, Standing, Transition, Winner};
use crate::engine::notifier::{dispatch, LogNotifier};
use crate::engine::plugin::{DynGame, GamePlugin};
use crate::engine::settings::{load_default_settings, load_settings, Settings};
use crate::engine::store::{export_all, import_all, FileStore, KeyValueStore, SnapshotStore, StoreError};
use crate::games::default_registry;
use crate::games::hearts::plugin::HeartsPlugin;
use crate::games::hearts::types::RoundInput;
use crate::games::kachuful::plugin::KachufulPlugin;
use crate::games::kachuful::types::{BidEntry, PenaltyPolicy, RoundEntries};
use crate::games::traitor::plugin::TraitorPlugin;
use crate::games::traitor::roles::recommended_roles;
use crate::games::traitor::types::{NightActions, RoleConfig, TraitorConfig, TraitorState};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Config(String),

    #[error("no {0} game in progress")]
    NoGame(&'static str),

    #[error("{0}")]
    Usage(String),

    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type CliResult<T> = Result<T, CliError>;

#[derive(Parser, Debug)]
#[command(name = "scoreboard", about = "Scorekeeper for Hearts, Kachuful and Traitor")]
pub struct Cli {
    /// Directory holding game snapshots (default: from scoreboard.toml)
    #[arg(long, global = true, env = "SCOREBOARD_STORE_DIR")]
    pub store_dir: Option<PathBuf>,

    /// Path to scoreboard.toml (default: auto-discover)
    #[arg(long, global = true, env = "SCOREBOARD_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the available games
    Games,
    /// Hearts scoring
    Hearts {
        #[command(subcommand)]
        action: HeartsCommand,
    },
    /// Kachuful (Judgment) scoring
    Kachuful {
        #[command(subcommand)]
        action: KachufulCommand,
    },
    /// Traitor moderation
    Traitor {
        #[command(subcommand)]
        action: TraitorCommand,
    },
    /// Print the scoreboard of a saved game
    Show { game: String },
    /// Discard a saved game
    Reset { game: String },
    /// Print lifetime player statistics
    Stats,
    /// List finished games, newest first
    History {
        /// Only games of this kind
        #[arg(long)]
        game: Option<String>,
        /// Only games this player took part in
        #[arg(long)]
        player: Option<String>,
    },
    /// Dump every saved game, the stats and the history as JSON
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Restore games, stats and history from an export file
    Import { file: PathBuf },
}

#[derive(Subcommand, Debug)]
pub enum HeartsCommand {
    /// Start a new game, replacing any saved one
    New {
        #[arg(required = true)]
        players: Vec<String>,
        #[arg(long)]
        decks: Option<u32>,
        #[arg(long)]
        max_points: Option<u32>,
        /// Require each hand to add up to 26 points per deck
        #[arg(long)]
        strict: bool,
    },
    /// Record a hand as NAME=POINTS pairs, or a moon shot with --moon NAME
    Round {
        #[arg(conflicts_with = "moon", required_unless_present = "moon")]
        points: Vec<String>,
        #[arg(long)]
        moon: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PenaltyArg {
    Off,
    LoseBid,
}

impl From<PenaltyArg> for PenaltyPolicy {
    fn from(arg: PenaltyArg) -> Self {
        match arg {
            PenaltyArg::Off => PenaltyPolicy::Off,
            PenaltyArg::LoseBid => PenaltyPolicy::LoseBid,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum KachufulCommand {
    /// Start a new game, replacing any saved one
    New {
        #[arg(required = true)]
        players: Vec<String>,
        #[arg(long)]
        decks: Option<u32>,
        /// Points for making a zero bid
        #[arg(long)]
        zero_bonus: Option<u32>,
        #[arg(long, value_enum)]
        penalty: Option<PenaltyArg>,
    },
    /// Score the current round from NAME=BID/TRICKS entries
    Round {
        #[arg(required = true)]
        entries: Vec<String>,
    },
    /// Open a completed round for correction
    BeginEdit { round: u32 },
    /// Close the open correction without changes
    CancelEdit,
    /// Replace a completed round with NAME=BID/TRICKS entries
    Edit {
        round: u32,
        #[arg(required = true)]
        entries: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum TraitorCommand {
    /// Deal roles for a new game, replacing any saved one
    New {
        #[arg(required = true)]
        players: Vec<String>,
        #[arg(long)]
        mafia: Option<u32>,
        #[arg(long)]
        detectives: Option<u32>,
        #[arg(long)]
        doctors: Option<u32>,
        /// Seed for a reproducible deal
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        investigative_elimination: bool,
        #[arg(long)]
        detective_required: bool,
    },
    /// Print every player's secret role (moderator only)
    Roles,
    /// Resolve the night
    Night {
        #[arg(long)]
        kill: Option<String>,
        #[arg(long)]
        save: Option<String>,
        #[arg(long)]
        check: Option<String>,
    },
    /// Eliminate a player by day vote
    Vote { player: String },
    /// End the day without an elimination
    SkipDay,
}

pub fn run(cli: Cli) -> CliResult<()> {
    let settings = match &cli.config {
        Some(path) => load_settings(path).map_err(CliError::Config)?,
        None => load_default_settings(),
    };
    let dir = cli.store_dir.unwrap_or_else(|| settings.storage.dir.clone());
    tracing::debug!(dir = %dir.display(), "using snapshot store");
    let mut session = Session {
        store: FileStore::new(dir),
        settings,
    };

    match cli.command {
        Command::Games => {
            list_games();
            Ok(())
        }
        Command::Hearts { action } => session.hearts(action),
        Command::Kachuful { action } => session.kachuful(action),
        Command::Traitor { action } => session.traitor(action),
        Command::Show { game } => session.show(&game),
        Command::Reset { game } => session.reset(&game),
        Command::Stats => {
            session.print_stats();
            Ok(())
        }
        Command::History { game, player } => session.print_history(game.as_deref(), player.as_deref()),
        Command::Export { out } => session.export(out),
        Command::Import { file } => session.import(file),
    }
}

struct Session {
    store: FileStore,
    settings: Settings,
}

impl Session {
    fn load<P: GamePlugin>(&mut self, plugin: &P, kind: GameKind) -> CliResult<P::State> {
        SnapshotStore::new(&mut self.store)
            .load_game(plugin, kind.storage_key())?
            .ok_or(CliError::NoGame(kind.game_id()))
    }

    /// Save the new state, publish its events and, when this transition
    /// finished the game, fold the result into player stats and the history.
    fn commit<P: GamePlugin>(
        &mut self,
        plugin: &P,
        kind: GameKind,
        was_over: bool,
        transition: &Transition<P::State>,
    ) -> CliResult<GameSummary> {
        let mut snapshots = SnapshotStore::new(&mut self.store);
        snapshots.save_state(kind.storage_key(), &transition.state)?;
        dispatch(&transition.events, &LogNotifier);

        let summary = plugin.summary(&transition.state);
        if summary.game_over && !was_over {
            let mut stats = snapshots.load_stats();
            stats.record_finished_game(&summary);
            snapshots.save_stats(&stats)?;

            if let Some(record) = GameRecord::from_summary(&summary, RandomIds::new().new_id(), unix_now()) {
                let mut history = snapshots.load_history();
                tracing::info!(game = kind.game_id(), id = %record.id, winners = ?record.winners, "game recorded");
                history.record(record);
                snapshots.save_history(&history)?;
            }
        }
        Ok(summary)
    }

    /// Load the saved game, apply one transition and commit it.
    fn step<P: GamePlugin>(
        &mut self,
        plugin: &P,
        kind: GameKind,
        apply: impl FnOnce(&P::State, &[Standing]) -> CliResult<Transition<P::State>>,
    ) -> CliResult<(Transition<P::State>, GameSummary)> {
        let state = self.load(plugin, kind)?;
        let before = plugin.summary(&state);
        let t = apply(&state, &before.standings)?;
        let summary = self.commit(plugin, kind, before.game_over, &t)?;
        Ok((t, summary))
    }

    fn hearts(&mut self, action: HeartsCommand) -> CliResult<()> {
        let plugin = HeartsPlugin;
        let summary = match action {
            HeartsCommand::New {
                players,
                decks,
                max_points,
                strict,
            } => {
                let mut config = self.settings.hearts_config();
                if let Some(decks) = decks {
                    config.deck_count = decks;
                }
                if let Some(max_points) = max_points {
                    config.max_points = max_points;
                }
                config.strict_round_totals |= strict;
                let seats = seat_names(players)?;
                let t = plugin.create_initial_state(&seats, &config)?;
                self.commit(&plugin, GameKind::Hearts, false, &t)?
            }
            HeartsCommand::Round { points, moon } => {
                let (_, summary) = self.step(&plugin, GameKind::Hearts, |state, standings| {
                    let input = match moon {
                        Some(name) => RoundInput::MoonShot {
                            shooter: resolve_player(standings, &name)?,
                        },
                        None => {
                            let mut map = HashMap::new();
                            for entry in &points {
                                let (name, value) = split_entry(entry)?;
                                map.insert(resolve_player(standings, name)?, parse_count(entry, value)?);
                            }
                            RoundInput::Points { points: map }
                        }
                    };
                    Ok(plugin.submit_round(state, &input)?)
                })?;
                summary
            }
        };
        print_summary(&summary);
        Ok(())
    }

    fn kachuful(&mut self, action: KachufulCommand) -> CliResult<()> {
        let plugin = KachufulPlugin;
        let kind = GameKind::Kachuful;
        let (t, summary) = match action {
            KachufulCommand::New {
                players,
                decks,
                zero_bonus,
                penalty,
            } => {
                let mut config = self.settings.kachuful_config();
                if let Some(decks) = decks {
                    config.deck_count = decks;
                }
                if let Some(bonus) = zero_bonus {
                    config.zero_bid_bonus = bonus;
                }
                if let Some(penalty) = penalty {
                    config.penalty = penalty.into();
                }
                let seats = seat_names(players)?;
                let t = plugin.create_initial_state(&seats, &config)?;
                let summary = self.commit(&plugin, kind, false, &t)?;
                (t, summary)
            }
            KachufulCommand::Round { entries } => self.step(&plugin, kind, |state, standings| {
                Ok(plugin.submit_round(state, &bid_entries(standings, &entries)?)?)
            })?,
            KachufulCommand::BeginEdit { round } => {
                self.step(&plugin, kind, |state, _| Ok(plugin.begin_edit(state, round)?))?
            }
            KachufulCommand::CancelEdit => self.step(&plugin, kind, |state, _| Ok(plugin.cancel_edit(state)?))?,
            KachufulCommand::Edit { round, entries } => self.step(&plugin, kind, |state, standings| {
                Ok(plugin.edit_round(state, round, &bid_entries(standings, &entries)?)?)
            })?,
        };

        print_summary(&summary);
        if let Some(open) = t.state.editing_round {
            println!("editing round {open}");
        } else if !summary.game_over {
            let (cards, trump) = plugin.next_deal(&t.state);
            println!(
                "next: round {} of {}, {} cards, {} trump",
                t.state.current_round,
                t.state.total_rounds,
                cards,
                trump.name()
            );
        }
        Ok(())
    }

    fn traitor(&mut self, action: TraitorCommand) -> CliResult<()> {
        let plugin = TraitorPlugin;
        let kind = GameKind::Traitor;
        let summary = match action {
            TraitorCommand::New {
                players,
                mafia,
                detectives,
                doctors,
                seed,
                investigative_elimination,
                detective_required,
            } => {
                let n = players.len();
                let suggested = recommended_roles(n);
                let roles = RoleConfig::with_civilians(
                    n,
                    mafia.unwrap_or(suggested.mafia),
                    detectives.unwrap_or(suggested.detective),
                    doctors.unwrap_or(suggested.doctor),
                );
                let mut rules = self.settings.traitor;
                rules.investigative_elimination |= investigative_elimination;
                rules.detective_required |= detective_required;
                let config = TraitorConfig {
                    roles,
                    rules,
                    random_seed: seed,
                };
                let seats = seat_names(players)?;
                let t = plugin.create_initial_state(&seats, &config)?;
                self.commit(&plugin, kind, false, &t)?
            }
            TraitorCommand::Roles => {
                let state: TraitorState = self.load(&plugin, kind)?;
                for p in &state.players {
                    println!("  {:<16} {}", p.name, p.role.name());
                }
                return Ok(());
            }
            TraitorCommand::Night { kill, save, check } => {
                let (t, summary) = self.step(&plugin, kind, |state, standings| {
                    let resolve = |name: Option<String>| name.map(|n| resolve_player(standings, &n)).transpose();
                    let actions = NightActions {
                        mafia_target: resolve(kill)?,
                        doctor_save: resolve(save)?,
                        detective_check: resolve(check)?,
                    };
                    Ok(plugin.resolve_night(state, &actions)?)
                })?;
                if let Some(inv) = &t.state.last_investigation {
                    let target = t.state.player(&inv.target).map_or(inv.target.as_str(), |p| p.name.as_str());
                    println!("investigation: {} is {}", target, inv.result.name());
                }
                summary
            }
            TraitorCommand::Vote { player } => {
                self.step(&plugin, kind, |state, standings| {
                    Ok(plugin.eliminate_by_vote(state, &resolve_player(standings, &player)?)?)
                })?
                .1
            }
            TraitorCommand::SkipDay => self.step(&plugin, kind, |state, _| Ok(plugin.skip_day(state)?))?.1,
        };
        print_summary(&summary);
        Ok(())
    }

    fn show(&mut self, game: &str) -> CliResult<()> {
        let kind = parse_kind(game)?;
        let registry = default_registry();
        let plugin = registry
            .get(kind.game_id())
            .ok_or_else(|| CliError::Usage(format!("game {} is not registered", kind.game_id())))?;
        let key = kind.storage_key();
        let raw = self.store.load(key)?.ok_or(CliError::NoGame(kind.game_id()))?;
        let snapshot: serde_json::Value = serde_json::from_str(&raw).map_err(|source| StoreError::Serde {
            key: key.to_string(),
            source,
        })?;
        print_summary(&plugin.summarize(&snapshot)?);
        Ok(())
    }

    fn reset(&mut self, game: &str) -> CliResult<()> {
        let kind = parse_kind(game)?;
        SnapshotStore::new(&mut self.store).clear(kind.storage_key())?;
        tracing::info!(game = kind.game_id(), "game reset");
        println!("{} reset", kind.game_id());
        Ok(())
    }

    fn print_stats(&mut self) {
        let stats = SnapshotStore::new(&mut self.store).load_stats();
        if stats.players.is_empty() {
            println!("no finished games recorded");
        }
        for (name, games) in &stats.players {
            println!("{name}");
            for (kind, s) in games {
                println!(
                    "  {:<10} played {:>3}  won {:>3}  avg {:>7.1}  best {}",
                    kind.game_id(),
                    s.games_played,
                    s.wins,
                    s.average_score,
                    s.best_score.map_or_else(|| "-".to_string(), |b| b.to_string())
                );
            }
        }
    }

    fn print_history(&mut self, game: Option<&str>, player: Option<&str>) -> CliResult<()> {
        let kind = game.map(parse_kind).transpose()?;
        let history = SnapshotStore::new(&mut self.store).load_history();
        let mut shown = 0;
        for record in history.filtered(kind, player) {
            shown += 1;
            let scores: Vec<String> = record
                .final_standings
                .iter()
                .map(|s| format!("{} {}", s.display_name, s.score))
                .collect();
            println!(
                "{}  {:<9} {:>3} rounds  won by {}  ({})",
                record.finished_at,
                record.game.game_id(),
                record.rounds,
                record.winners.join(", "),
                scores.join(", ")
            );
        }
        if shown == 0 {
            println!("no finished games recorded");
        }
        Ok(())
    }

    fn export(&mut self, out: Option<PathBuf>) -> CliResult<()> {
        let json = export_all(&mut self.store)?;
        match out {
            Some(path) => {
                fs::write(&path, json).map_err(|source| CliError::Io { path: path.clone(), source })?;
                tracing::info!(path = %path.display(), "exported snapshots");
            }
            None => println!("{json}"),
        }
        Ok(())
    }

    fn import(&mut self, file: PathBuf) -> CliResult<()> {
        let json = fs::read_to_string(&file).map_err(|source| CliError::Io { path: file.clone(), source })?;
        let restored = import_all(&mut self.store, &default_registry(), &json)?;
        println!("restored {restored} game(s)");
        Ok(())
    }
}

fn list_games() {
    let registry = default_registry();
    for id in registry.list_game_ids() {
        if let Some(game) = registry.get(&id) {
            println!(
                "{:<10} {} ({}-{} players)\n           {}",
                id,
                game.display_name(),
                game.min_players(),
                game.max_players(),
                game.description()
            );
        }
    }
}

/// Names stand in for ids on the command line, so they must be unique.
fn seat_names(names: Vec<String>) -> CliResult<Vec<PlayerSeat>> {
    for (i, name) in names.iter().enumerate() {
        if names[..i].iter().any(|other| other.eq_ignore_ascii_case(name)) {
            return Err(CliError::Usage(format!("player name {name:?} is used twice")));
        }
    }
    Ok(seat_players(&mut RandomIds::new(), names))
}

fn parse_kind(game: &str) -> CliResult<GameKind> {
    GameKind::from_game_id(&game.to_lowercase()).ok_or_else(|| {
        CliError::Usage(format!("unknown game {game:?}, expected hearts, kachuful or traitor"))
    })
}

/// Match a player by id first, then by display name ignoring case.
fn resolve_player(standings: &[Standing], token: &str) -> CliResult<PlayerId> {
    standings
        .iter()
        .find(|s| s.player_id == token)
        .or_else(|| standings.iter().find(|s| s.display_name.eq_ignore_ascii_case(token)))
        .map(|s| s.player_id.clone())
        .ok_or_else(|| CliError::Usage(format!("no player named {token:?}")))
}

fn split_entry(entry: &str) -> CliResult<(&str, &str)> {
    entry
        .split_once('=')
        .map(|(name, value)| (name.trim(), value.trim()))
        .ok_or_else(|| CliError::Usage(format!("expected NAME=VALUE, got {entry:?}")))
}

fn parse_count(entry: &str, value: &str) -> CliResult<u32> {
    value
        .parse()
        .map_err(|_| CliError::Usage(format!("{entry:?}: {value:?} is not a whole number")))
}

fn bid_entries(standings: &[Standing], entries: &[String]) -> CliResult<RoundEntries> {
    let mut parsed = RoundEntries::new();
    for entry in entries {
        let (name, value) = split_entry(entry)?;
        let (bid, tricks) = value
            .split_once('/')
            .ok_or_else(|| CliError::Usage(format!("expected NAME=BID/TRICKS, got {entry:?}")))?;
        parsed.insert(
            resolve_player(standings, name)?,
            BidEntry {
                bid: parse_count(entry, bid.trim())?,
                tricks: parse_count(entry, tricks.trim())?,
            },
        );
    }
    Ok(parsed)
}

fn faction_name(faction: Faction) -> &'static str {
    match faction {
        Faction::Mafia => "mafia",
        Faction::Town => "town",
    }
}

fn print_summary(summary: &GameSummary) {
    let phase = summary.phase.as_deref().map(|p| format!(", {p}")).unwrap_or_default();
    println!("{} round {}{}", summary.game_id, summary.round, phase);
    for s in &summary.standings {
        let mut line = format!("  {:<16} {:>6}", s.display_name, s.score);
        if let Some(status) = &s.status {
            line.push_str("  ");
            line.push_str(status);
        }
        // Roles stay secret until the end.
        if let (true, Some(faction)) = (summary.game_over, s.faction) {
            line.push_str(&format!("  [{}]", faction_name(faction)));
        }
        println!("{line}");
    }
    if !summary.game_over {
        return;
    }
    match &summary.winner {
        Some(Winner::Players { player_ids }) => {
            let names: Vec<&str> = summary
                .standings
                .iter()
                .filter(|s| player_ids.contains(&s.player_id))
                .map(|s| s.display_name.as_str())
                .collect();
            println!("game over, won by {}", names.join(", "));
        }
        Some(Winner::Faction { faction }) => println!("game over, {} wins", faction_name(*faction)),
        None => println!("game over"),
    }
}
