mod bootstrap;

use anyhow::Result;
use clap::Parser;
use usage_core::clusters::ClusterRegistry;
use usage_core::settings::{Command, ExportArgs, ReportArgs, Settings};
use usage_data::fetch::{export, FetchRequest, SacctFetcher};
use usage_data::filter::filter_period;
use usage_data::reader::{import_table, read_sources};
use usage_report::{Report, ReportOptions};

fn main() -> Result<()> {
    let settings = Settings::parse();

    bootstrap::setup_logging(settings.effective_log_level())?;

    tracing::info!("jade-usage v{} starting", env!("CARGO_PKG_VERSION"));

    match settings.command {
        Command::Export(args) => run_export(args),
        Command::Report(args) => run_report(args),
    }
}

fn run_export(args: ExportArgs) -> Result<()> {
    let period = args.period.period()?;
    bootstrap::ensure_output_dir(&args.output_dir)?;

    let registry = ClusterRegistry::load(args.cluster_config.as_deref())?;
    let fetcher = SacctFetcher::new(registry.get(args.cluster));
    let request = FetchRequest {
        user: args.user,
        period,
    };

    let path = export(&fetcher, &request, &args.output_dir)?;
    println!("{}", path.display());
    Ok(())
}

fn run_report(args: ReportArgs) -> Result<()> {
    let period = args.period.period()?;
    let registry = ClusterRegistry::load(args.cluster_config.as_deref())?;

    let sources = read_sources(&args.files)?;
    let table = import_table(&sources)?;
    let table = filter_period(&table, &period);

    let options = ReportOptions {
        elapsed_days: period.elapsed_days(),
        account_prefix: args.account_prefix,
        accounts: args.accounts,
        users: args.users,
        quota: args.quota.map(|q| q as f64),
        daily_capacity: registry.get(args.cluster).daily_capacity,
    };

    let report = Report::build(&table, &options);
    if args.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report);
    }
    Ok(())
}
