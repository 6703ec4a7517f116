mod api;
mod cli;
mod config;
mod db;
mod engine;

use crate::cli::{Cli, Commands, ConfigCommands};
use crate::config::Config;
use crate::db::Database;
use crate::engine::dates::local_today;
use crate::engine::grid::{CellState, build_history_grid};
use crate::engine::stats::compute_statistics;
use anyhow::{Context, Result, bail};
use chrono::{Duration, NaiveDate};
use clap::Parser;
use dialoguer::{Confirm, theme::ColorfulTheme};
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Add { name, description } => handle_add(&name, &description),
        Commands::List { all } => handle_list(all),
        Commands::Edit {
            id,
            name,
            description,
        } => handle_edit(id, name, description),
        Commands::Archive { id } => handle_set_active(id, false),
        Commands::Restore { id } => handle_set_active(id, true),
        Commands::Delete { id, yes } => handle_delete(id, yes),
        Commands::Move { id, position } => handle_move(id, position),
        Commands::Toggle { id, date } => handle_toggle(id, date),
        Commands::Today => handle_today(),
        Commands::Stats { days, from, to } => handle_stats(days, from, to),
        Commands::History { days } => handle_history(days),
        Commands::Serve => {
            let config = load_or_default_config()?;
            run_service(config).await
        }
        Commands::Config { command } => handle_config_command(command),
        Commands::Status => handle_status(),
    }
}

fn handle_add(name: &str, description: &str) -> Result<()> {
    let config = load_or_default_config()?;
    let database = Database::open(&config.db_path)?;

    let habit = database.create_habit(name, description)?;
    println!("Habit created: [{}] {}", habit.id, habit.name);

    Ok(())
}

fn handle_list(all: bool) -> Result<()> {
    let config = load_or_default_config()?;
    let database = Database::open(&config.db_path)?;

    let habits = if all {
        database.all_habits()?
    } else {
        database.active_habits()?
    };

    if habits.is_empty() {
        println!("No habits yet. Add one with `cadence add <name>`.");
        return Ok(());
    }

    for habit in habits {
        let description = if habit.description.is_empty() {
            String::new()
        } else {
            format!(" - {}", habit.description)
        };
        let marker = if habit.is_active { "" } else { " (archived)" };

        println!("[{}] {}{}{}", habit.id, habit.name, description, marker);
    }

    Ok(())
}

fn handle_edit(id: i64, name: Option<String>, description: Option<String>) -> Result<()> {
    let config = load_or_default_config()?;
    let database = Database::open(&config.db_path)?;

    let mut habit = database
        .habit(id)?
        .with_context(|| format!("No habit with id {id}"))?;

    if let Some(value) = name {
        habit.name = value;
    }
    if let Some(value) = description {
        habit.description = value;
    }

    database.update_habit(&habit)?;
    println!("Habit updated: [{}] {}", habit.id, habit.name.trim());

    Ok(())
}

fn handle_set_active(id: i64, is_active: bool) -> Result<()> {
    let config = load_or_default_config()?;
    let database = Database::open(&config.db_path)?;

    let mut habit = database
        .habit(id)?
        .with_context(|| format!("No habit with id {id}"))?;

    habit.is_active = is_active;
    database.update_habit(&habit)?;

    if is_active {
        println!("Habit reactivated: {}", habit.name);
    } else {
        println!("Habit archived: {}", habit.name);
    }

    Ok(())
}

fn handle_delete(id: i64, yes: bool) -> Result<()> {
    let config = load_or_default_config()?;
    let mut database = Database::open(&config.db_path)?;

    let habit = database
        .habit(id)?
        .with_context(|| format!("No habit with id {id}"))?;
    let log_count = database.count_logs_for_habit(id)?;

    if !yes {
        let prompt = if log_count > 0 {
            format!(
                "This will delete \"{}\" and {} days of history. This cannot be undone. Continue?",
                habit.name, log_count
            )
        } else {
            format!(
                "This will delete \"{}\". This cannot be undone. Continue?",
                habit.name
            )
        };

        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;

        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    database.delete_habit(id)?;
    println!("Habit deleted: {}", habit.name);

    Ok(())
}

fn handle_move(id: i64, position: usize) -> Result<()> {
    let config = load_or_default_config()?;
    let mut database = Database::open(&config.db_path)?;

    let mut ids = database
        .all_habits()?
        .iter()
        .map(|habit| habit.id)
        .collect::<Vec<_>>();

    let current = ids
        .iter()
        .position(|&habit_id| habit_id == id)
        .with_context(|| format!("No habit with id {id}"))?;

    let moved = ids.remove(current);
    ids.insert(position.min(ids.len()), moved);

    database.reorder_habits(&ids)?;

    for (index, habit) in database.all_habits()?.iter().enumerate() {
        println!("{}. [{}] {}", index, habit.id, habit.name);
    }

    Ok(())
}

fn handle_toggle(id: i64, date: Option<String>) -> Result<()> {
    let config = load_or_default_config()?;
    let database = Database::open(&config.db_path)?;

    let date = parse_optional_date(date)?;
    let habit = database
        .habit(id)?
        .with_context(|| format!("No habit with id {id}"))?;

    let log = database.toggle_completion(id, date)?;

    if log.completed {
        println!("Marked \"{}\" complete for {}", habit.name, log.date);
    } else {
        println!("Cleared \"{}\" for {}", habit.name, log.date);
    }

    Ok(())
}

fn handle_today() -> Result<()> {
    let config = load_or_default_config()?;
    let database = Database::open(&config.db_path)?;

    let date = local_today();
    let habits = database.active_habits()?;

    if habits.is_empty() {
        println!("No active habits. Add one with `cadence add <name>`.");
        return Ok(());
    }

    println!("Today {date}");
    for habit in habits {
        let marker = if database.is_completed(habit.id, date)? {
            "[x]"
        } else {
            "[ ]"
        };
        println!("{marker} [{}] {}", habit.id, habit.name);
    }

    Ok(())
}

fn handle_stats(days: Option<u32>, from: Option<String>, to: Option<String>) -> Result<()> {
    let config = load_or_default_config()?;
    let database = Database::open(&config.db_path)?;

    let (start, end) = resolve_stats_range(&config, days, from, to)?;
    let habits = database.active_habits()?;
    let logs = database.logs_in_range(start, end)?;

    let statistics = compute_statistics(&habits, &logs, start, end)?;

    if statistics.habit_stats.is_empty() {
        println!("No active habits to report on.");
        return Ok(());
    }

    println!("Consistency {start} .. {end}");
    println!(
        "- overall: {:.0}% ({} of {} habit-days)",
        statistics.overall_rate, statistics.total_completed, statistics.total_possible
    );

    for entry in &statistics.habit_stats {
        println!(
            "- {:<20} {:>3.0}% ({}/{})",
            short_name(&entry.habit.name),
            entry.rate,
            entry.completed,
            entry.possible
        );
    }

    if statistics.habit_stats.len() > 1 {
        if let Some(most) = &statistics.most_consistent {
            println!("Most consistent: {} ({:.0}%)", most.habit.name, most.rate);
        }
        if let Some(least) = &statistics.least_consistent {
            if least.rate < 50.0 {
                println!("Room for growth: {} ({:.0}%)", least.habit.name, least.rate);
            }
        }
    }

    Ok(())
}

fn handle_history(days: Option<u32>) -> Result<()> {
    let config = load_or_default_config()?;
    let database = Database::open(&config.db_path)?;

    let window_days = days.unwrap_or(config.history_window_days);
    if window_days == 0 {
        bail!("days must be at least 1");
    }

    let end = local_today();
    let start = end - Duration::days(i64::from(window_days) - 1);

    let habits = database.active_habits()?;
    let logs = database.logs_in_range(start, end)?;

    let grid = build_history_grid(&habits, &logs, window_days)?;

    if grid.rows.is_empty() {
        println!("No active habits to show.");
        return Ok(());
    }

    println!("History {end} .. {start} (newest first)");
    for row in &grid.rows {
        let cells = row
            .cells
            .iter()
            .map(|cell| match cell.state {
                CellState::Completed => '#',
                CellState::Pending => 'o',
                CellState::Missed => '.',
                CellState::Inapplicable => ' ',
            })
            .collect::<String>();

        println!("{:<20} {}", short_name(&row.habit.name), cells);
    }
    println!("# done  . missed  o pending today  (blank: before habit existed)");

    Ok(())
}

async fn run_service(config: Config) -> Result<()> {
    config.ensure_bootstrap_files()?;
    let _ = Database::open(&config.db_path)?;

    let shared_config = Arc::new(config);

    info!("cadence service started");

    tokio::select! {
        api_result = api::run_server(Arc::clone(&shared_config)) => {
            api_result?;
        }
        _ = signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    Ok(())
}

fn handle_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Set { key, value } => {
            let mut config = load_or_default_config()?;
            config.set_value(&key, &value)?;
            config.ensure_bootstrap_files()?;
            config.save()?;

            println!("Config saved: {key} = {value}");
            Ok(())
        }
        ConfigCommands::Get { key } => {
            let config = load_or_default_config()?;
            let value = config
                .get_value(&key)
                .with_context(|| format!("Unsupported config key: {key}"))?;

            println!("{value}");
            Ok(())
        }
    }
}

fn handle_status() -> Result<()> {
    let config = load_or_default_config()?;
    let database = Database::open(&config.db_path)?;

    let habits = database.all_habits()?;
    let active = habits.iter().filter(|habit| habit.is_active).count();

    println!("cadence status");
    println!("- db_path: {}", config.db_path.display());
    println!("- habits: {} ({active} active)", habits.len());
    println!("- logs: {}", database.count_logs()?);
    println!(
        "- last_completed_at: {}",
        database
            .latest_completion_timestamp()?
            .map(|timestamp| timestamp.to_string())
            .unwrap_or_else(|| "none".to_string())
    );
    println!("- api_port: {}", config.api_port);

    Ok(())
}

fn resolve_stats_range(
    config: &Config,
    days: Option<u32>,
    from: Option<String>,
    to: Option<String>,
) -> Result<(NaiveDate, NaiveDate)> {
    match (from, to) {
        (Some(from), Some(to)) => Ok((parse_date(&from)?, parse_date(&to)?)),
        (None, None) => {
            let days = days.unwrap_or(config.stats_range_days);
            if days == 0 {
                bail!("days must be at least 1");
            }

            let end = local_today();
            Ok((end - Duration::days(i64::from(days) - 1), end))
        }
        _ => bail!("--from and --to must be provided together"),
    }
}

fn parse_optional_date(input: Option<String>) -> Result<NaiveDate> {
    input
        .as_deref()
        .map(parse_date)
        .transpose()?
        .map_or_else(|| Ok(local_today()), Ok)
}

fn parse_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format: {date}. Example: 2026-02-18"))
}

fn short_name(name: &str) -> String {
    if name.chars().count() > 20 {
        let head = name.chars().take(17).collect::<String>();
        format!("{head}...")
    } else {
        name.to_string()
    }
}

fn load_or_default_config() -> Result<Config> {
    Config::load().or_else(|_| {
        let config = Config::default();
        config.ensure_bootstrap_files()?;
        config.save()?;
        Ok(config)
    })
}
