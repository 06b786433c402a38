use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use std::io::Write;
use std::path::PathBuf;
use taskledger::{Priority, SortKey, TaskDraft, TaskUpdate, Tracker};

#[derive(Parser)]
#[command(name = "taskledger")]
#[command(about = "TaskLedger CLI - task tracking with an append-only mutation ledger")]
#[command(version)]
struct Cli {
    /// Path to the store directory (default: current directory)
    #[arg(short, long, default_value = ".")]
    store_path: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a task (status starts as "To-Do")
    Add {
        title: String,
        /// Due date, either YYYY-MM-DD or RFC 3339
        #[arg(long)]
        due: String,
        #[arg(long)]
        description: String,
        /// High, Medium, or Low
        #[arg(long, default_value = "Medium")]
        priority: String,
    },

    /// Replace all five mutable fields of a task
    Edit {
        id: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        due: String,
        #[arg(long)]
        priority: String,
        #[arg(long)]
        status: String,
    },

    /// Delete a task (its history remains)
    Remove { id: String },

    /// List tasks with the total count
    List {
        /// title, duedate, description, priority, or status
        #[arg(long)]
        sort_by: Option<String>,
    },

    /// Show the full mutation ledger
    History,

    /// Export all tasks as CSV
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Detect tasks whose creation never reached the ledger
    Check,
}

fn parse_due(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| eyre!("invalid due date {:?}, expected YYYY-MM-DD or RFC 3339", value))?;
    let naive = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| eyre!("invalid due date {:?}", value))?;
    Ok(naive.and_utc())
}

fn render_priority(priority: &Priority) -> String {
    match priority {
        Priority::High => priority.as_str().red().to_string(),
        Priority::Medium => priority.as_str().yellow().to_string(),
        Priority::Low => priority.as_str().green().to_string(),
        Priority::Unrecognized(_) => priority.as_str().to_string(),
    }
}

fn main() -> Result<()> {
    // Setup tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let mut tracker = Tracker::open(&cli.store_path)?;

    match cli.command {
        Commands::Add {
            title,
            due,
            description,
            priority,
        } => {
            let task = tracker.create(TaskDraft {
                title,
                duedate: parse_due(&due)?,
                description,
                priority: Priority::from(priority),
            })?;
            println!("Created task {}", task.id);
        }

        Commands::Edit {
            id,
            title,
            description,
            due,
            priority,
            status,
        } => {
            let task = tracker.edit(
                &id,
                TaskUpdate {
                    title,
                    description,
                    duedate: parse_due(&due)?,
                    priority: Priority::from(priority),
                    status,
                },
            )?;
            println!("Updated task {}", task.id);
        }

        Commands::Remove { id } => {
            tracker.remove(&id)?;
            println!("Deleted task {}", id);
        }

        Commands::List { sort_by } => {
            let sort = match sort_by.as_deref() {
                Some(key) => Some(SortKey::parse(key).ok_or_else(|| eyre!("unknown sort key {:?}", key))?),
                None => None,
            };
            let (tasks, count) = tracker.list(sort)?;
            for task in &tasks {
                println!(
                    "{}  {}  [{}]  due {}  {}",
                    task.id,
                    task.title,
                    render_priority(&task.priority),
                    task.duedate.format("%Y-%m-%d"),
                    task.status,
                );
            }
            println!("{} task(s)", count);
        }

        Commands::History => {
            for event in tracker.events()? {
                println!(
                    "{:<7} task={}  at={}",
                    event.action.kind(),
                    event.task_id,
                    event.recorded_at
                );
            }
        }

        Commands::Export { output } => {
            let bytes = tracker.export_csv()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &bytes)?;
                    println!("Exported {} bytes to {}", bytes.len(), path.display());
                }
                None => std::io::stdout().write_all(&bytes)?,
            }
        }

        Commands::Check => {
            let missing = tracker.unaudited_tasks()?;
            if missing.is_empty() {
                println!("Ledger is complete: every task has a Create event");
            } else {
                for task in &missing {
                    println!("{}  {}  (no Create event)", task.id, task.title);
                }
                println!("{} task(s) missing their creation record", missing.len());
            }
        }
    }

    Ok(())
}
