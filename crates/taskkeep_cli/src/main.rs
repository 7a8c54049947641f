use clap::{CommandFactory, Parser};
use serde::Serialize;
use std::io::{self, BufRead};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use taskkeep_cli::cli::{Cli, Command, overrides_from_cli};
use taskkeep_cli::logging::init_logging;
use taskkeep_core::config::{Config, load_config_with_fallback, merge_overrides};
use taskkeep_core::error::AppError;
use taskkeep_core::model::{CompletedTask, Task};
use taskkeep_core::{TaskQuery, TaskStore};

#[derive(Tabled)]
struct TaskRow<'a> {
    #[tabled(rename = "ID")]
    id: &'a str,
    #[tabled(rename = "Title")]
    title: &'a str,
    #[tabled(rename = "Description")]
    description: &'a str,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Completed At")]
    completed_at: &'a str,
}

#[derive(Tabled)]
struct CompletedRow<'a> {
    #[tabled(rename = "ID")]
    id: &'a str,
    #[tabled(rename = "Title")]
    title: &'a str,
    #[tabled(rename = "Description")]
    description: &'a str,
    #[tabled(rename = "Completed At")]
    completed_at: &'a str,
}

fn status_label(task: &Task) -> &'static str {
    if task.completed { "done" } else { "open" }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    let rendered =
        serde_json::to_string(value).map_err(|err| AppError::invalid_data(err.to_string()))?;
    println!("{rendered}");
    Ok(())
}

fn print_tasks_plain(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks yet.");
        return;
    }

    let rows = tasks.iter().map(|task| TaskRow {
        id: &task.id,
        title: &task.title,
        description: &task.description,
        status: status_label(task),
        completed_at: task.completed_at.as_deref().unwrap_or("-"),
    });
    println!("{}", Table::new(rows).with(Style::psql()));
}

fn print_completed_plain(completed: &[CompletedTask]) {
    if completed.is_empty() {
        println!("No completed tasks.");
        return;
    }

    let rows = completed.iter().map(|entry| CompletedRow {
        id: &entry.id,
        title: &entry.title,
        description: &entry.description,
        completed_at: &entry.completed_at,
    });
    println!("{}", Table::new(rows).with(Style::psql()));
}

fn print_task_plain(task: &Task) {
    println!("ID:           {}", task.id);
    println!("Title:        {}", task.title);
    println!("Description:  {}", task.description);
    println!("Status:       {}", status_label(task));
    println!(
        "Completed At: {}",
        task.completed_at.as_deref().unwrap_or("-")
    );
}

/// Prints the outcome of a mutation that may have matched nothing.
fn print_outcome(json: bool, outcome: Option<&Task>, verb: &str, id: &str) -> Result<(), AppError> {
    if json {
        return print_json(&outcome);
    }

    match outcome {
        Some(task) => println!("{verb} task: {} ({})", task.title, task.id),
        None => println!("No change: no task with id {id}"),
    }
    Ok(())
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            quoted = true;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() || quoted {
                args.push(std::mem::take(&mut current));
                quoted = false;
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() || quoted {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn run_command(cli: Cli, base: &Config) -> Result<(), AppError> {
    let overrides = overrides_from_cli(&cli).map_err(AppError::invalid_input)?;
    let config = merge_overrides(base, &overrides);
    let store = TaskStore::open(&config)?;
    let query = TaskQuery::new(&store).with_completed_source(config.completed_source);

    match cli.command {
        Command::Add { title, description } => {
            let task = store.create(
                title.as_deref().unwrap_or_default(),
                description.as_deref().unwrap_or_default(),
            )?;
            if cli.json {
                print_json(&task)?;
            } else {
                println!("Added task: {} ({})", task.title, task.id);
            }
        }
        Command::Edit {
            id,
            title,
            description,
        } => {
            let updated = store.update(&id, &title, &description)?;
            print_outcome(cli.json, updated.as_ref(), "Updated", &id)?;
        }
        Command::Delete { id } => {
            let removed = store.delete(&id)?;
            print_outcome(cli.json, removed.as_ref(), "Deleted", &id)?;
        }
        Command::Toggle { id } => {
            let toggled = store.toggle_completion(&id)?;
            let verb = match toggled.as_ref() {
                Some(task) if task.completed => "Completed",
                _ => "Reopened",
            };
            print_outcome(cli.json, toggled.as_ref(), verb, &id)?;
        }
        Command::Show { id } => {
            let task = store
                .get(&id)
                .ok_or_else(|| AppError::not_found(format!("task {} not found", id.trim())))?;
            if cli.json {
                print_json(&task)?;
            } else {
                print_task_plain(&task);
            }
        }
        Command::List => {
            let tasks = query.active_by_recency();
            if cli.json {
                print_json(&tasks)?;
            } else {
                print_tasks_plain(&tasks);
            }
        }
        Command::Completed => {
            let completed = query.completed_by_completion_recency();
            if cli.json {
                print_json(&completed)?;
            } else {
                print_completed_plain(&completed);
            }
        }
        Command::Repair => {
            let rebuilt = store.rebuild_completed()?;
            if cli.json {
                print_json(&rebuilt)?;
            } else {
                println!("Rebuilt completed list: {} task(s)", rebuilt.len());
            }
        }
    }

    Ok(())
}

fn run_interactive(base: &Config) -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("taskkeep".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if let Err(err) = run_command(cli, base) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

/// Loads the config file and installs logging. `log_override` comes from the
/// process arguments; overrides typed at the interactive prompt cannot change
/// the level once the subscriber is installed.
fn load_base_config(log_override: Option<&str>) -> Config {
    let loaded = load_config_with_fallback();
    init_logging(log_override.unwrap_or(loaded.config.log_level()));
    if let Some(err) = loaded.error {
        tracing::warn!(error = %err, "using default configuration");
    }
    loaded.config
}

fn main() {
    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        let base = load_base_config(None);
        if let Err(err) = run_interactive(&base) {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => {
            // --help and --version
            let _ = err.print();
            return;
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    let log_override = overrides_from_cli(&cli)
        .ok()
        .and_then(|overrides| overrides.log_level);
    let base = load_base_config(log_override.as_deref());
    if let Err(err) = run_command(cli, &base) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
