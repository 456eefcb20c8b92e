use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use blast_report_rs::build_report;
use blast_report_rs::config::ReportConfig;
use blast_report_rs::error::ReportError;
use blast_report_rs::join::JoinMode;
use blast_report_rs::report_stats::{FieldFilter, HistogramSpec};

#[derive(Parser)]
#[command(name = "blast-report-rs")]
#[command(about = "Join BLAST tabular results with sample metadata and render a report")]
struct Args {
    #[arg(short = 'r', long, default_value = "blast_results", help = "Directory of BLAST result files")]
    results_dir: PathBuf,

    #[arg(short = 'm', long, default_value = "metadata.tsv", help = "Tab-separated sample metadata with a header row")]
    metadata: PathBuf,

    #[arg(long, default_value = "run_accession", help = "Metadata column holding the run identifier")]
    run_column: String,

    #[arg(short = 'f', long = "filter", value_name = "FIELD=VALUE", help = "Extra histogram for rows whose metadata FIELD equals VALUE (repeatable)")]
    filters: Vec<String>,

    #[arg(short = 'b', long, default_value = "20", help = "Number of histogram bins")]
    bins: usize,

    #[arg(long, default_value = "0", help = "Lower bound of the percent identity histogram")]
    min: f64,

    #[arg(long, default_value = "100", help = "Upper bound of the percent identity histogram")]
    max: f64,

    #[arg(long, default_value = "false", help = "Keep alignment rows whose sample has no metadata")]
    full_join: bool,

    #[arg(short = 'o', long, default_value = "report.md", help = "Markdown report output")]
    output: PathBuf,

    #[arg(long, default_value = "count_table.tsv", help = "Scientific name x run count table output")]
    count_table: PathBuf,

    #[arg(long, help = "Also write the joined table as TSV")]
    joined_output: Option<PathBuf>,
}

fn spinner(color: &str, msg: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let template = format!("{{spinner:.{color}}} {{msg}}");
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template(&template)
    {
        spinner.set_style(style);
    }
    spinner.set_message(msg.to_string());
    spinner
}

fn write_output(path: &Path, contents: String) -> Result<(), ReportError> {
    fs::write(path, contents).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn run(args: Args) -> Result<(), ReportError> {
    let filters = args
        .filters
        .iter()
        .map(|f| FieldFilter::parse(f))
        .collect::<Result<Vec<_>, _>>()?;

    let config = ReportConfig {
        results_dir: args.results_dir,
        metadata_path: args.metadata,
        run_column: args.run_column,
        join_mode: if args.full_join {
            JoinMode::Full
        } else {
            JoinMode::MetadataAnchored
        },
        histogram: HistogramSpec {
            lower: args.min,
            upper: args.max,
            bins: args.bins,
        },
        filters,
        ..ReportConfig::default()
    };

    // 1. Parse, join and summarise
    let sp = spinner(
        "green",
        &format!("Reading results under '{}'...", config.results_dir.display()),
    );
    let results = match build_report(&config) {
        Ok(results) => results,
        Err(e) => {
            sp.abandon_with_message("Report failed.");
            return Err(e);
        }
    };
    sp.finish_with_message(format!(
        "Joined {} alignment row(s) from {} file(s) with {} metadata row(s).",
        results.alignment_rows,
        results.result_files.len(),
        results.metadata_rows
    ));

    // 2. Write outputs
    let sp = spinner("yellow", "Writing output files...");
    write_output(&args.output, results.get_markdown_report())?;
    write_output(&args.count_table, results.get_count_table_tsv())?;
    if let Some(path) = &args.joined_output {
        results.write_joined_tsv(path)?;
    }
    sp.finish_with_message(format!("Report written to '{}'.", args.output.display()));

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
