//! Command dispatch: maps parsed arguments onto application services

use std::io;
use std::path::Path;

use clap::CommandFactory;
use tracing::{debug, instrument};

use crate::application::services::{BulkRequest, RemovalSource, RollReport, RollRequest};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::region::BandSummary;
use crate::infrastructure::di::ServiceContainer;

/// Execute the parsed command line.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage("no command given, see --help".to_string()));
    };

    // Completion needs neither settings nor services
    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        clap_complete::generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let settings = Settings::load(cli.config.as_deref())?;
    debug!("settings: {:?}", settings);

    match command {
        Commands::Config { command } => cmd_config(command, &settings, cli.config.as_deref()),
        Commands::Roll {
            preload_list_path,
            pending_scan_path,
            rejected_domains_path,
            skip_removals,
            pending_removals,
            no_automated_removals,
        } => {
            let removals = match (skip_removals, pending_removals) {
                (true, _) => RemovalSource::Skip,
                (false, Some(path)) => RemovalSource::File(path.clone()),
                (false, None) => RemovalSource::Fetch {
                    automated: settings.include_automated_removals && !no_automated_removals,
                },
            };
            let request = RollRequest {
                list_path: preload_list_path.clone(),
                pending_scan_path: pending_scan_path.clone(),
                rejected_path: rejected_domains_path.clone(),
                removals,
            };
            let container = ServiceContainer::new(settings)?;
            cmd_roll(&container, &request)
        }
        Commands::Bulk { output_path, list } => {
            let request = BulkRequest {
                list_path: list.clone(),
                output_path: output_path.clone(),
            };
            let container = ServiceContainer::new(settings)?;
            cmd_bulk(&container, &request)
        }
        Commands::Check { preload_list_path } => {
            let container = ServiceContainer::new(settings)?;
            cmd_check(&container, preload_list_path)
        }
        Commands::Completion { .. } => Ok(()),
    }
}

#[instrument(skip(container))]
pub fn cmd_roll(container: &ServiceContainer, request: &RollRequest) -> CliResult<()> {
    let report = container.roll_service().roll(request)?;

    output::action("Removed", &report.removed);
    output::action("Inserted", &report.inserted);
    output::action(
        "Rejected",
        &format!(
            "{} (see {})",
            report.rejected,
            request.rejected_path.display()
        ),
    );
    print_roll_warnings(&report);
    Ok(())
}

const DEDUP_GUIDANCE: [&str; 2] = [
    "You'll need to manually deduplicate entries before committing them to Chromium.",
    "Note: if there are a lot of duplicate entries, you may have accidentally run \
     this twice. Reset your checkout and try again.",
];

/// Band sizes count accumulated lines, not decoded entries.
fn band_line(band: &BandSummary) -> String {
    format!("{}: {} lines", band.name, band.lines)
}

fn print_roll_warnings(report: &RollReport) {
    if report.is_clean() {
        output::success("SUCCESS");
        return;
    }

    output::warning("WARNING");
    if !report.unmatched_removals.is_empty() {
        output::info(&format!(
            "{} pending removals did not match any entry:",
            report.unmatched_removals.len()
        ));
        for domain in &report.unmatched_removals {
            output::diff_remove(domain);
        }
    }
    if !report.duplicates.is_empty() {
        output::info(&format!(
            "{} domains appear more than once:",
            report.duplicates.len()
        ));
        for domain in &report.duplicates {
            output::detail(domain);
        }
        for line in DEDUP_GUIDANCE {
            output::info(line);
        }
    }
}

#[instrument(skip(container))]
pub fn cmd_bulk(container: &ServiceContainer, request: &BulkRequest) -> CliResult<()> {
    let report = container.bulk_service().export(request)?;

    for band in &report.bands {
        output::detail(&band_line(band));
    }
    output::action(
        "Wrote",
        &format!(
            "{} domains to {}",
            report.domains,
            request.output_path.display()
        ),
    );
    Ok(())
}

#[instrument(skip(container))]
pub fn cmd_check(container: &ServiceContainer, list_path: &Path) -> CliResult<()> {
    let report = container.check_service().check(list_path)?;

    output::header(&list_path.display());
    output::detail(&format!(
        "{} lines ({} entry lines, {} comment lines)",
        report.lines, report.entry_lines, report.comment_lines
    ));
    output::detail(&format!(
        "{} entries, {} in bulk bands",
        report.entries, report.bulk_entries
    ));
    for band in &report.bands {
        output::detail(&band_line(band));
    }

    if report.duplicates.is_empty() {
        output::success("OK");
    } else {
        output::warning("WARNING");
        output::info(&format!(
            "{} domains appear more than once:",
            report.duplicates.len()
        ));
        for domain in &report.duplicates {
            output::detail(domain);
        }
    }
    Ok(())
}

fn cmd_config(
    command: &ConfigCommands,
    settings: &Settings,
    explicit: Option<&Path>,
) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => {
            output::info(&Settings::template());
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => {
                    let status = if path.exists() { "" } else { " (not found)" };
                    output::action("global", &format!("{}{}", path.display(), status));
                }
                None => output::action("global", "(no config directory)"),
            }
            if let Some(path) = explicit {
                output::action("explicit", &path.display());
            }
        }
    }
    Ok(())
}
