use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use fleet_core::{ApprovalAction, LedgerContext, LedgerEntry, apply_action, time};
use fleet_ingest::{ImportBatch, read_entries_file, to_entries_json};
use fleet_ledger::{
    EntityKey, ReportQuery, Summarizer, build_report, export_ledger, reconcile, reconcile_in,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod config;
mod export;
mod render;
mod state;

use config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "fleet",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("FLEET_BUILD_SHA"), ")"),
    about = "Fleet ledger reconciliation and P&L reports"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconcile a snapshot into a chronological ledger with running balance
    Ledger {
        /// Ledger snapshot (JSON array or {"data": [...]})
        #[arg(long)]
        input: PathBuf,

        /// Only entries owned by this entity id
        #[arg(long)]
        entity: Option<String>,

        /// Force a classification context instead of resolving per entry
        #[arg(long, value_enum)]
        context: Option<ContextArg>,
    },

    /// Per-entity income/expense/net over approved entries
    Summary {
        #[arg(long)]
        input: PathBuf,

        /// Defaults to report.default_group_by from config
        #[arg(long, value_enum)]
        group_by: Option<GroupArg>,

        /// Count pending and rejected entries too (projected totals)
        #[arg(long)]
        all: bool,

        /// Also print per-category income/expense under each entity
        #[arg(long)]
        by_category: bool,
    },

    /// P&L report, as text or as an exported ledger (csv/html)
    Report {
        #[arg(long)]
        input: PathBuf,

        #[arg(long, value_enum)]
        group_by: Option<GroupArg>,

        /// First day included (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day included (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,

        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Approve or reject a pending entry, then re-run the summary
    Approve {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        entry: String,

        #[arg(long, value_enum)]
        status: StatusArg,

        /// Save the updated snapshot back to --input
        #[arg(long)]
        write: bool,
    },

    /// Manage ~/.fleet/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GroupArg {
    Driver,
    Client,
    Truck,
    Misc,
}

impl From<GroupArg> for EntityKey {
    fn from(arg: GroupArg) -> Self {
        match arg {
            GroupArg::Driver => EntityKey::Driver,
            GroupArg::Client => EntityKey::Client,
            GroupArg::Truck => EntityKey::Truck,
            GroupArg::Misc => EntityKey::MiscCategory,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ContextArg {
    Driver,
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Csv,
    Html,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatusArg {
    Approved,
    Rejected,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config()?;
    init_logging(&cfg.logging.level);

    match cli.command {
        Command::Ledger {
            input,
            entity,
            context,
        } => {
            let batch = load(&input)?;
            let entries: Vec<LedgerEntry> = match &entity {
                Some(id) => batch
                    .entries
                    .into_iter()
                    .filter(|e| e.owner_entity_id.as_deref() == Some(id.as_str()))
                    .collect(),
                None => batch.entries,
            };

            let ledger = match context {
                Some(ContextArg::Driver) => reconcile_in(&entries, LedgerContext::DriverLedger),
                Some(ContextArg::Report) => reconcile_in(&entries, LedgerContext::Report),
                None => reconcile(&entries),
            };
            if let Some(id) = &entity {
                let label = batch.labels.get(id).unwrap_or(id);
                println!("# Ledger for {label}\n");
            }
            render::print_ledger(&ledger, &cfg.display);
        }

        Command::Summary {
            input,
            group_by,
            all,
            by_category,
        } => {
            let batch = load(&input)?;
            let group_by = resolve_group(group_by, &cfg)?;
            let summarizer = Summarizer::new()
                .with_labels(batch.labels)
                .include_unapproved(all);
            let summaries = summarizer.summarize(&batch.entries, group_by);
            if by_category {
                let breakdown = summarizer.breakdown(&batch.entries, group_by);
                render::print_breakdown(&summaries, &breakdown, &cfg.display);
            } else {
                render::print_summaries(&summaries, &cfg.display);
            }
        }

        Command::Report {
            input,
            group_by,
            from,
            to,
            format,
            out,
        } => {
            let batch = load(&input)?;
            let group_by = resolve_group(group_by, &cfg)?;
            if let (Some(from), Some(to)) = (from, to) {
                if from > to {
                    bail!("--from {from} is after --to {to}");
                }
            }
            let query = ReportQuery::new(group_by)
                .between(from.map(time::start_of_day), to.map(time::end_of_day))
                .with_labels(batch.labels.clone());
            let report = build_report(&batch.entries, &query);

            if format == ReportFormat::Text {
                render::print_report(&report, &cfg.display);
                return Ok(());
            }

            let rows = export_ledger(&batch.entries, &query);
            tracing::info!(rows = rows.len(), ?format, "exporting ledger");

            match (format, out) {
                (ReportFormat::Csv, Some(path)) => {
                    let file = std::fs::File::create(&path)
                        .with_context(|| format!("create {}", path.display()))?;
                    export::write_csv(&rows, &cfg.display, file)?;
                    println!("Wrote {}", path.display());
                }
                (ReportFormat::Csv, None) => {
                    export::write_csv(&rows, &cfg.display, std::io::stdout().lock())?;
                }
                (_, out) => {
                    let title = format!("P&L by {}", group_by.as_str());
                    let html = export::render_html(&title, &rows, Some(&report), &cfg.display);
                    match out {
                        Some(path) => {
                            std::fs::write(&path, html)
                                .with_context(|| format!("write {}", path.display()))?;
                            println!("Wrote {}", path.display());
                        }
                        None => print!("{html}"),
                    }
                }
            }
        }

        Command::Approve {
            input,
            entry,
            status,
            write,
        } => {
            let batch = load(&input)?;
            let action = match status {
                StatusArg::Approved => ApprovalAction::approve(&entry),
                StatusArg::Rejected => ApprovalAction::reject(&entry),
            };
            let updated = apply_action(&batch.entries, &action)
                .with_context(|| format!("cannot apply {:?} to {entry}", status))?;
            tracing::info!(entry = %entry, target = %action.target, "approval applied");

            if write {
                state::replace_file(&input, &to_entries_json(&updated)?)?;
                println!("Updated {}", input.display());
            }

            let group_by = updated
                .iter()
                .find(|e| e.id == entry)
                .map(|e| EntityKey::from(e.owner_entity_type))
                .unwrap_or(EntityKey::Driver);
            let summaries = Summarizer::new()
                .with_labels(batch.labels)
                .summarize(&updated, group_by);
            render::print_summaries(&summaries, &cfg.display);
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config(&cfg)?,
        },
    }

    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "fleet={level},fleet_core={level},fleet_ledger={level},fleet_ingest={level}"
        ))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(path: &Path) -> Result<ImportBatch> {
    if !path.exists() {
        bail!("snapshot not found: {} (pass --input <file>)", path.display());
    }
    let batch = read_entries_file(path)?;
    tracing::info!(
        entries = batch.entries.len(),
        skipped = batch.skipped,
        "loaded {}",
        path.display()
    );
    Ok(batch)
}

fn resolve_group(arg: Option<GroupArg>, cfg: &Config) -> Result<EntityKey> {
    match arg {
        Some(arg) => Ok(arg.into()),
        None => EntityKey::parse(&cfg.report.default_group_by).with_context(|| {
            format!(
                "config report.default_group_by = {:?} is not driver|client|truck|misc",
                cfg.report.default_group_by
            )
        }),
    }
}
