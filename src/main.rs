mod cli;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{Cli, Commands, EpisodeCode, IndexCommands};
use dialoguer::Confirm;
use humansize::{DECIMAL, format_size};
use series::{
    Config, FilesystemExtractor, Hooks, ProcessOptions, ProgressEvent, ScriptExtractor,
    SeriesIndex, process_directory, rename_episodes, scan_for_episodes,
};
use std::path::{Path, PathBuf};

/// Handles progress events and prints formatted output to stdout
fn handle_progress_event(event: ProgressEvent) {
    match event {
        ProgressEvent::Started { directory } => {
            println!("### Processing episodes in {} ...", directory.display());
        }
        ProgressEvent::EntriesFound { count } => {
            if count == 0 {
                println!("No new episodes found.");
            } else {
                println!("Found {} new episode(s)\n", count);
            }
        }
        ProgressEvent::EpisodeBuilt {
            index,
            total,
            path,
            file_name,
        } => {
            println!("[{}/{}] <<< {}", index + 1, total, display_name(&path));
            println!("      >>> {}", file_name);
        }
        ProgressEvent::EntrySkipped { path, reason } => {
            println!("!!! '{}' - {}\n", display_name(&path), reason);
        }
        ProgressEvent::NotRenamable { path } => {
            println!("!!! '{}' is currently not renameable\n", display_name(&path));
        }
        ProgressEvent::AddedToIndex {
            series, language, ..
        } => {
            println!("---> added to series index: {} [{}]\n", series, language);
        }
        ProgressEvent::IndexRejected { reason, .. } => {
            println!("!!! couldn't be added to the index: {}\n", reason);
        }
        ProgressEvent::EpisodeRenamed {
            series,
            file_name,
            size,
            ..
        } => match size {
            Some(size) => println!("> {}: {} ({})  [OK]", series, file_name, format_size(size, DECIMAL)),
            None => println!("> {}: {}  [OK]", series, file_name),
        },
        ProgressEvent::Complete { renameable } => {
            println!("{} episode(s) ready to be renamed", renameable);
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "series=debug".to_string()
        } else {
            "series=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let config = Config::load_or_create(&config_path, Config::defaults()?)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;

    match cli.command {
        Commands::Rename {
            dir,
            no_rename,
            no_index,
        } => rename(&config, dir, !no_rename, !no_index),
        Commands::Index { command } => run_index_command(&config, command),
    }
}

fn load_index(config: &Config) -> Result<SeriesIndex> {
    SeriesIndex::load(&config.index_file).with_context(|| {
        format!(
            "Failed to load series index {} (`series index init` creates a new one)",
            config.index_file.display()
        )
    })
}

fn rename(config: &Config, dir: Option<PathBuf>, do_rename: bool, add_to_index: bool) -> Result<()> {
    let directory = dir.unwrap_or_else(|| config.episode_directory.clone());
    if !directory.is_dir() {
        bail!("Episode directory does not exist: {}", directory.display());
    }

    run_rename(
        config,
        &directory,
        &Hooks::from_config(config),
        do_rename,
        add_to_index,
    )
}

/// Processes the episodes in `directory` and renames the accepted ones
///
/// Without `do_rename` this is a dry run: nothing is moved and the index file
/// is left untouched, so the same episodes are accepted again next time.
fn run_rename(
    config: &Config,
    directory: &Path,
    hooks: &Hooks,
    do_rename: bool,
    add_to_index: bool,
) -> Result<()> {
    if scan_for_episodes(directory)?.is_empty() {
        println!("No new episodes found.");
        return Ok(());
    }

    hooks.pre_processing();

    let mut index = SeriesIndex::new();
    if add_to_index {
        index = load_index(config)?;
        index.add_extractor(FilesystemExtractor);
        for script in &config.script_extractors {
            index.add_extractor(ScriptExtractor::new(script.as_str()));
        }
    }

    let episodes = process_directory(
        directory,
        &mut index,
        ProcessOptions { add_to_index },
        handle_progress_event,
    )?;

    if episodes.is_empty() || !do_rename {
        return Ok(());
    }

    // The index is written before renaming so renamed files are never missing from it
    if add_to_index {
        index
            .write_to_file(&config.index_file)
            .context("Failed to write series index")?;
    }

    println!("\n### Renaming episodes ...");
    rename_episodes(&episodes, directory, |event| {
        if let ProgressEvent::EpisodeRenamed {
            series, file_name, ..
        } = &event
        {
            let (series, file_name) = (series.clone(), file_name.clone());
            handle_progress_event(event);
            hooks.episode(&file_name, &series);
        } else {
            handle_progress_event(event);
        }
    })?;

    hooks.post_processing();

    Ok(())
}

fn run_index_command(config: &Config, command: IndexCommands) -> Result<()> {
    let index_file = &config.index_file;

    match command {
        IndexCommands::Init => {
            if index_file.exists() {
                bail!("Index file does already exist: {}", index_file.display());
            }
            if let Some(dir) = index_file.parent() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
            SeriesIndex::new().write_to_file(index_file)?;
            println!("Created empty index at {}", index_file.display());
        }

        IndexCommands::Add {
            names,
            lang,
            first_episode: EpisodeCode { season, episode },
        } => {
            let mut index = load_index(config)?;
            for name in &names {
                match index.add_series(name, &lang, season, episode - 1) {
                    Ok(()) => println!("Added '{}' [{}] starting at S{:02}E{:02}", name, lang, season, episode),
                    Err(e) => println!("!!! {}", e),
                }
            }
            index.write_to_file(index_file)?;
        }

        IndexCommands::Remove { names, yes } => {
            let mut index = load_index(config)?;
            for name in &names {
                if !yes {
                    let confirmed = Confirm::new()
                        .with_prompt(format!("Remove '{}' and all its watched episodes?", name))
                        .default(false)
                        .interact()
                        .context("prompt failed")?;
                    if !confirmed {
                        continue;
                    }
                }
                match index.remove_series(name) {
                    Ok(()) => println!("Removed '{}'", name),
                    Err(e) => println!("!!! {}", e),
                }
            }
            index.write_to_file(index_file)?;
        }

        IndexCommands::Alias { name, aliases } => {
            let mut index = load_index(config)?;
            for alias in &aliases {
                match index.alias_series(&name, alias) {
                    Ok(()) => println!("'{}' is now known as '{}'", name, alias),
                    Err(e) => println!("!!! {}", e),
                }
            }
            index.write_to_file(index_file)?;
        }

        IndexCommands::List => {
            let index = load_index(config)?;
            for series in index.series() {
                if series.aliases().is_empty() {
                    println!("{} [{}]", series.name(), series.languages().join(", "));
                } else {
                    println!(
                        "{} [{}] (aka {})",
                        series.name(),
                        series.languages().join(", "),
                        series.aliases().join(", ")
                    );
                }
            }
        }

        IndexCommands::Show { name } => {
            let index = load_index(config)?;
            let Some(canonical) = index.series_name_in_index(&name) else {
                bail!("Series does not exist in index: {}", name);
            };
            let Some(series) = index.get(canonical) else {
                bail!("Series does not exist in index: {}", name);
            };

            println!("{}", series.name());
            for set in series.episode_sets() {
                println!("  [{}] {} episode(s)", set.language(), set.len());
                if let Some((season, episode)) = set.barrier() {
                    println!("    everything before S{:02}E{:02}", season, episode);
                }
                for entry in set.entries().iter().filter(|entry| !entry.all_before) {
                    println!("    {}", entry.name);
                }
            }
        }

        IndexCommands::Mark {
            name,
            episode: EpisodeCode { season, episode },
            lang,
        } => {
            let mut index = load_index(config)?;
            let Some(canonical) = index.series_name_in_index(&name).map(str::to_string) else {
                bail!("Series does not exist in index: {}", name);
            };

            let file_name = format!("S{:02}E{:02} - Episode {}.mov", season, episode, episode);
            index.add_episode_manually(&canonical, &lang, season, episode, &file_name)?;
            index.write_to_file(index_file)?;
            println!("Marked {} of '{}' [{}] as watched", file_name, canonical, lang);
        }
    }

    Ok(())
}
