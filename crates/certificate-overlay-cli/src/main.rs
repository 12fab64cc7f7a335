//! Certificate Overlay CLI - Stamp a personalized certificate onto a PDF template.

use anyhow::{Context, Result};
use certificate_overlay_core::{
    CertificateConfig, CertificateGenerator, CertificateRequest, Course, TextColor,
};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, ValueEnum)]
enum ColorOption {
    Black,
    DarkRed,
    Navy,
    DarkGreen,
}

impl From<ColorOption> for TextColor {
    fn from(opt: ColorOption) -> Self {
        match opt {
            ColorOption::Black => Self::black(),
            ColorOption::DarkRed => Self::dark_red(),
            ColorOption::Navy => Self::navy(),
            ColorOption::DarkGreen => Self::dark_green(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "certificate-overlay")]
#[command(author, version, about = "Stamp certificate text onto a PDF template", long_about = None)]
struct Args {
    /// Template PDF whose first page receives the certificate text
    #[arg(required = true)]
    template: PathBuf,

    /// Output PDF file
    #[arg(short, long, default_value = "certificados/certificado_final.pdf")]
    output: PathBuf,

    /// Recipient name
    #[arg(short, long, env = "CERTIFICATE_NAME")]
    name: String,

    /// Completed course as NAME=HOURS (repeatable, printed in order)
    #[arg(long = "course", value_name = "NAME=HOURS", value_parser = parse_course)]
    courses: Vec<Course>,

    /// Completion date (default: today, formatted with the configured date_format)
    #[arg(short, long)]
    date: Option<String>,

    /// Overlay text color (overrides the config file)
    #[arg(long, value_enum)]
    color: Option<ColorOption>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Parse `NAME=HOURS`, splitting on the last `=` so course names may contain one.
fn parse_course(value: &str) -> Result<Course, String> {
    let (name, hours) = value
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=HOURS, got '{value}'"))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("course name is empty in '{value}'"));
    }

    let hours: f64 = hours
        .trim()
        .parse()
        .map_err(|_| format!("invalid hours '{}' for course '{name}'", hours.trim()))?;
    if !hours.is_finite() || hours < 0.0 {
        return Err(format!("hours must be a non-negative number for course '{name}'"));
    }

    Ok(Course::new(name, hours))
}

fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Load or create config
    let mut config = if let Some(config_path) = &args.config {
        CertificateConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        CertificateConfig::load()
    };

    if let Some(color) = args.color {
        config.text_color = color.into();
    }

    // Validates date_format before it is used below
    let generator = CertificateGenerator::new(config).context("Invalid configuration")?;

    let completion_date = args.date.unwrap_or_else(|| {
        chrono::Local::now()
            .format(&generator.config().date_format)
            .to_string()
    });

    let request = CertificateRequest::new(args.name, args.courses, completion_date);

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .context(format!("Failed to create output directory: {}", parent.display()))?;
    }

    info!("Loading template: {}", args.template.display());
    let summary = generator
        .generate(&request, &args.template, &args.output)
        .context(format!(
            "Failed to generate certificate from {}",
            args.template.display()
        ))?;

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        println!(
            "Certificate saved to: {} ({} pages)",
            args.output.display(),
            summary.page_count
        );
    }

    Ok(())
}
