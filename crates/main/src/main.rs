use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use log::debug;
use serde::de::DeserializeOwned;

use report_forge::config::EngineConfig;
use report_forge::qr::ContactCard;
use report_forge::reports::{
    action_plan, cash_report, checklist, contract, hygiene, kpi_dashboard, monthly, proposal, status, stock_count,
    visit_note, GeneratedFile, ReportGenerator,
};

/// Renders branded reports and workbooks from JSON documents.
///
/// Each subcommand reads one JSON input (a file path, or `-` for stdin) and
/// writes the generated file into the output directory under its
/// deterministic name.
#[derive(Parser)]
#[command(author, version, about = "Branded PDF and XLSX report generator")]
struct Cli {
    /// Engine configuration (brand, palette, asset base URL) as JSON.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory receiving the generated file.
    #[arg(long, short, global = true, default_value = ".")]
    out: PathBuf,

    /// Report date as YYYY-MM-DD; defaults to today.
    #[arg(long, global = true, value_parser = parse_date)]
    date: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Input {
    /// JSON document describing the report, `-` for stdin.
    input: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Business status summary PDF.
    #[command(aliases = ["durum"])]
    Status(Input),

    /// Monthly performance PDF.
    #[command(aliases = ["aylik"])]
    Monthly(Input),

    /// Weekly revenue workbook from the monthly data.
    #[command(name = "monthly-xlsx", aliases = ["monthly_xlsx"])]
    MonthlyXlsx(Input),

    /// Service proposal PDF.
    #[command(aliases = ["teklif"])]
    Proposal(Input),

    /// Consulting service agreement PDF.
    #[command(aliases = ["sozlesme"])]
    Contract(Input),

    /// Non-disclosure agreement PDF.
    #[command(aliases = ["gizlilik"])]
    Nda(Input),

    /// Digital business card PDF with a vCard QR code.
    #[command(aliases = ["kartvizit"])]
    Card(Input),

    /// Visit note PDF.
    #[command(name = "visit-note", aliases = ["visit_note", "ziyaret"])]
    VisitNote(Input),

    /// Action plan workbook.
    #[command(name = "action-plan", aliases = ["action_plan", "aksiyon"])]
    ActionPlan(Input),

    /// Operations checklist workbook with item photos.
    #[command(aliases = ["kontrol"])]
    Checklist(Input),

    /// KPI dashboard workbook.
    #[command(aliases = ["kpi"])]
    Kpi(Input),

    /// Daily cash report workbook with a monthly summary.
    #[command(aliases = ["kasa"])]
    Cash(Input),

    /// Stock count form workbook.
    #[command(aliases = ["stok"])]
    Stock(Input),

    /// Hygiene checklist workbook.
    #[command(aliases = ["hijyen"])]
    Hygiene(Input),

    /// Printable hygiene checklist PDF.
    #[command(name = "hygiene-pdf", aliases = ["hygiene_pdf", "hijyen-pdf"])]
    HygienePdf(Input),
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(path) => println!("{}", path.display()),
        Err(err) => {
            eprintln!("Error: {}", err);
            print_error_sources(err.as_ref());
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<PathBuf, Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    }
    .with_env_overrides();
    let date = cli.date.unwrap_or_else(|| Local::now().date_naive());
    let generator = ReportGenerator::new(config);

    let file: GeneratedFile = match &cli.command {
        Commands::Status(input) => generator.status_summary(&read_input::<status::StatusReport>(input)?, date)?,
        Commands::Monthly(input) => {
            generator.monthly_performance(&read_input::<monthly::MonthlyReport>(input)?, date)?
        }
        Commands::MonthlyXlsx(input) => {
            generator.monthly_workbook(&read_input::<monthly::MonthlyReport>(input)?, date)?
        }
        Commands::Proposal(input) => generator.proposal(&read_input::<proposal::Proposal>(input)?, date)?,
        Commands::Contract(input) => {
            generator.service_contract(&read_input::<contract::Contract>(input)?, date)?
        }
        Commands::Nda(input) => generator.nda(&read_input::<contract::Contract>(input)?, date)?,
        Commands::Card(input) => generator.business_card(&read_input::<ContactCard>(input)?, date)?,
        Commands::VisitNote(input) => generator.visit_note(&read_input::<visit_note::VisitNote>(input)?, date)?,
        Commands::ActionPlan(input) => {
            generator.action_plan(&read_input::<action_plan::ActionPlan>(input)?, date)?
        }
        Commands::Checklist(input) => generator.checklist(&read_input::<checklist::Checklist>(input)?, date)?,
        Commands::Kpi(input) => {
            generator.kpi_dashboard(&read_input::<kpi_dashboard::KpiDashboard>(input)?, date)?
        }
        Commands::Cash(input) => generator.cash_report(&read_input::<cash_report::CashReport>(input)?, date)?,
        Commands::Stock(input) => generator.stock_count(&read_input::<stock_count::StockCount>(input)?, date)?,
        Commands::Hygiene(input) => {
            generator.hygiene_workbook(&read_input::<hygiene::HygieneCheck>(input)?, date)?
        }
        Commands::HygienePdf(input) => {
            generator.hygiene_checklist(&read_input::<hygiene::HygieneCheck>(input)?, date)?
        }
    };

    fs::create_dir_all(&cli.out)?;
    Ok(file.write_into(&cli.out)?)
}

fn read_input<T: DeserializeOwned>(input: &Input) -> Result<T, Box<dyn Error>> {
    let raw = if input.input == Path::new("-") {
        let mut raw = String::new();
        io::stdin().read_to_string(&mut raw)?;
        raw
    } else {
        fs::read_to_string(&input.input)?
    };
    debug!("read {} bytes of input", raw.len());
    Ok(serde_json::from_str(&raw)?)
}

fn parse_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
