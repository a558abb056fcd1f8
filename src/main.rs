use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use sweep_rs::logging::{self, LogTarget};
use sweep_rs::startup;
use sweep_rs::targets::DEFAULT_TEMP_DAYS;
use sweep_rs::{
    all_targets, find_target, human_size, tui, CacheLocations, Disposal, SweepMode,
    SweepRequest, SweepResult, Sweeper,
};

#[derive(Parser, Debug)]
#[command(
    name = "sweep-rs",
    version,
    about = "Sweep Windows caches, temp files and the Recycle Bin"
)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write the log to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Delete files outright instead of moving them to the Recycle Bin
    #[arg(long, global = true)]
    permanent: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clear Chrome, Edge, Opera/GX and Firefox caches
    BrowserCaches {
        #[arg(long)]
        preview: bool,
    },
    /// Remove Explorer's thumbcache_*.db files
    Thumbnails {
        #[arg(long)]
        preview: bool,
    },
    /// Remove old files from the temp directories
    Temp {
        #[arg(long)]
        preview: bool,
        #[arg(long, default_value_t = DEFAULT_TEMP_DAYS, allow_negative_numbers = true)]
        older_than_days: i64,
    },
    /// Sweep arbitrary directories
    Paths {
        #[arg(required = true)]
        dirs: Vec<PathBuf>,
        #[arg(long)]
        preview: bool,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        older_than_days: i64,
    },
    /// Empty the Recycle Bin
    RecycleBin {
        #[arg(long)]
        preview: bool,
    },
    /// List, disable or re-enable programs started at logon
    Startup {
        #[command(subcommand)]
        action: StartupAction,
    },
    /// List the known cleanup targets
    List,
    /// Interactive terminal UI
    Tui,
}

#[derive(Subcommand, Debug)]
enum StartupAction {
    /// Show the entries of the Run keys
    List,
    /// Stop an entry from starting at logon
    Disable { name: String },
    /// Let a disabled entry start at logon again
    Enable { name: String },
}

fn print_result(title: &str, mode: SweepMode, result: SweepResult) {
    println!("{}", title);
    match mode {
        SweepMode::Preview => println!("  Files: {}", result.files_processed),
        // Counted at selection, failed deletions included
        SweepMode::Execute => {
            println!("  Files selected for deletion: {}", result.files_processed)
        }
    }
    println!("  Size: {}", human_size(result.total_bytes));
}

fn disposal(cli: &Cli) -> Disposal {
    if cli.permanent {
        Disposal::Permanent
    } else {
        Disposal::Trash
    }
}

fn run_target(cli: &Cli, id: &str, preview: bool, temp_days: i64) -> Result<()> {
    let locations = CacheLocations::detect();
    let target = find_target(&locations, temp_days, id)
        .with_context(|| format!("unknown target: {}", id))?
        .with_disposal(disposal(cli));
    let mode = SweepMode::from_preview_flag(preview);
    let result = target
        .run(mode)
        .with_context(|| format!("failed to sweep {}", target.name))?;
    print_result(&target.name, mode, result);
    Ok(())
}

fn run_startup(action: &StartupAction) -> Result<()> {
    let mut store = startup::system_store().context("cannot access startup entries")?;
    match action {
        StartupAction::List => {
            let entries = startup::list_entries(&*store);
            if entries.is_empty() {
                println!("No startup entries found");
            }
            for entry in entries {
                let state = if entry.enabled { "enabled" } else { "disabled" };
                println!("{:<8} {:<30} {}", state, entry.name, entry.location());
                println!("         {}", entry.command);
            }
        }
        StartupAction::Disable { name } => {
            if startup::disable_entry(&mut *store, name) {
                println!("Disabled {}", name);
            } else {
                anyhow::bail!("no enabled startup entry named {}", name);
            }
        }
        StartupAction::Enable { name } => {
            if startup::enable_entry(&mut *store, name) {
                println!("Enabled {}", name);
            } else {
                anyhow::bail!("no disabled startup entry named {}", name);
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let mut cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };

    let command = cli.command.take().unwrap_or(Command::Tui);
    let log_target = match command {
        Command::Tui => {
            let path = cli.log_file.clone().unwrap_or_else(logging::default_log_path);
            LogTarget::FileOnly(path)
        }
        _ => LogTarget::Console {
            file: cli.log_file.clone(),
        },
    };
    logging::init(log_target, level).context("failed to set up logging")?;

    match &command {
        Command::BrowserCaches { preview } => {
            run_target(&cli, "browser_caches", *preview, DEFAULT_TEMP_DAYS)
        }
        Command::Thumbnails { preview } => {
            run_target(&cli, "thumbnails", *preview, DEFAULT_TEMP_DAYS)
        }
        Command::Temp {
            preview,
            older_than_days,
        } => run_target(&cli, "temp_files", *preview, *older_than_days),
        Command::Paths {
            dirs,
            preview,
            older_than_days,
        } => {
            let mode = SweepMode::from_preview_flag(*preview);
            let request =
                SweepRequest::older_than_days(dirs.iter().cloned(), mode, *older_than_days);
            let result = Sweeper::new(disposal(&cli)).sweep(&request);
            print_result("Paths", mode, result);
            Ok(())
        }
        Command::RecycleBin { preview } => {
            run_target(&cli, "recycle_bin", *preview, DEFAULT_TEMP_DAYS)
        }
        Command::Startup { action } => run_startup(action),
        Command::List => {
            for target in all_targets(&CacheLocations::detect(), DEFAULT_TEMP_DAYS) {
                println!("{:<16} {:<18} {}", target.id, target.name, target.description);
            }
            Ok(())
        }
        Command::Tui => tui::run_tui(disposal(&cli)).context("terminal UI failed"),
    }
}
