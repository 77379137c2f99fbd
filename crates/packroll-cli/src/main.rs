use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;

use packroll_core::config::Config;
use packroll_core::docedit::DocEditor;
use packroll_core::error::{PackrollError, Result};
use packroll_core::pipeline::{directory_tree, run_extract, ExtractKind, Pipeline};

mod args;
use args::{Cli, Commands, ConfigAction, ExtractTarget, Shell};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let base_dir = resolve_base_dir(cli.base_dir);
    let quiet = cli.quiet;

    let result = match cli.command {
        Some(Commands::Rollover { source, target }) => {
            handle_rollover(&base_dir, source, target, quiet)
        }
        Some(Commands::SetDates {
            target,
            validation_date,
            production_date,
        }) => handle_set_dates(&base_dir, target, &validation_date, &production_date, quiet),
        Some(Commands::Extract {
            kind,
            target,
            out_dir,
        }) => handle_extract(&base_dir, kind, target, &out_dir, quiet),
        Some(Commands::Tree { path }) => handle_tree(&base_dir, path),
        Some(Commands::Config { action }) => handle_config(action, &base_dir),
        Some(Commands::Completions { shell }) => {
            handle_completions(shell);
            Ok(())
        }
        None => {
            Cli::command().print_help().ok();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn resolve_base_dir(cli_base: Option<PathBuf>) -> PathBuf {
    if let Some(base) = cli_base {
        return base;
    }

    if let Ok(base) = std::env::var("PACKROLL_BASE") {
        return PathBuf::from(base);
    }

    dirs::home_dir()
        .map(|h| h.join(".packroll"))
        .unwrap_or_else(|| PathBuf::from(".packroll"))
}

/// Explicit flag wins over the configured default; an empty configured
/// value means the path was never set.
fn resolve_path(flag: Option<PathBuf>, configured: &str) -> Option<PathBuf> {
    flag.or_else(|| {
        if configured.is_empty() {
            None
        } else {
            Some(PathBuf::from(configured))
        }
    })
}

fn handle_rollover(
    base_dir: &Path,
    source: Option<PathBuf>,
    target: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    let config = Config::load(base_dir)?;
    let source = resolve_path(source, &config.paths.source)
        .ok_or(PackrollError::SourceNotFound {
            path: PathBuf::from(&config.paths.source),
        })?;
    let target = resolve_path(target, &config.paths.target)
        .ok_or(PackrollError::TargetNotFound {
            path: PathBuf::from(&config.paths.target),
        })?;

    let heads = config.head_list();
    let silent = |_: &str| {};
    let log = if quiet { Some(&silent as &dyn Fn(&str)) } else { None };
    Pipeline::new(source, target, &heads, log).run()
}

fn handle_set_dates(
    base_dir: &Path,
    target: Option<PathBuf>,
    validation_date: &str,
    production_date: &str,
    quiet: bool,
) -> Result<()> {
    let config = Config::load(base_dir)?;
    let target = resolve_path(target, &config.paths.target)
        .ok_or(PackrollError::TargetNotFound {
            path: PathBuf::from(&config.paths.target),
        })?;

    let heads = config.head_list();
    let silent = |_: &str| {};
    let log = if quiet { Some(&silent as &dyn Fn(&str)) } else { None };
    let edited =
        DocEditor::new(&heads, log).apply_dates(&target, validation_date, production_date)?;
    if !quiet {
        println!("{} 已修改 {} 个文件", "完成:".green(), edited);
    }
    Ok(())
}

fn handle_extract(
    base_dir: &Path,
    kind: ExtractTarget,
    target: Option<PathBuf>,
    out_dir: &Path,
    quiet: bool,
) -> Result<()> {
    let config = Config::load(base_dir)?;
    let target = resolve_path(target, &config.paths.target)
        .ok_or(PackrollError::TargetNotFound {
            path: PathBuf::from(&config.paths.target),
        })?;

    let kind = match kind {
        ExtractTarget::A2 => ExtractKind::A2,
        ExtractTarget::A5 => ExtractKind::A5,
    };
    let silent = |_: &str| {};
    let log = if quiet { Some(&silent as &dyn Fn(&str)) } else { None };
    let written = run_extract(kind, &target, out_dir, log)?;
    if !quiet {
        for path in &written {
            println!("{} {}", "已写入:".green(), path.display());
        }
    }
    Ok(())
}

fn handle_tree(base_dir: &Path, path: Option<PathBuf>) -> Result<()> {
    let config = Config::load(base_dir)?;
    let path = resolve_path(path, &config.paths.target)
        .ok_or(PackrollError::TargetNotFound {
            path: PathBuf::from(&config.paths.target),
        })?;
    print!("{}", directory_tree(&path));
    Ok(())
}

fn handle_config(action: ConfigAction, base_dir: &Path) -> Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load(base_dir)?;
            match config.get(&key) {
                Some(value) => {
                    println!("{}", value);
                }
                None => {
                    return Err(PackrollError::ConfigKeyNotFound { key });
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load(base_dir)?;
            config.set(&key, &value)?;
            config.save(base_dir)?;
            println!("{} {} = {}", "Set:".green(), key, value);
        }
        ConfigAction::List => {
            let config = Config::load(base_dir)?;
            println!();
            for (key, value) in config.list() {
                println!("{} = {}", key.cyan(), value);
            }
            println!();
        }
        ConfigAction::Path => {
            let path = Config::path(base_dir);
            println!("{}", path.display());
        }
        ConfigAction::Init => {
            let path = Config::init(base_dir)?;
            println!("{} {}", "Initialized:".green(), path.display());
        }
    }

    Ok(())
}

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let shell = match shell {
        Shell::Bash => clap_complete::Shell::Bash,
        Shell::Zsh => clap_complete::Shell::Zsh,
        Shell::Fish => clap_complete::Shell::Fish,
        Shell::PowerShell => clap_complete::Shell::PowerShell,
        Shell::Elvish => clap_complete::Shell::Elvish,
    };
    generate(shell, &mut cmd, "packroll", &mut io::stdout());
}
