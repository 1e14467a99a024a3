//! pagefit CLI - resume pagination and PDF export tool

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pagefit::{
    export_snapshot_with_options, measure_snapshot, plan_snapshot, ExportOptions, ExportRequest,
    LayoutSnapshot, PageGeometry, PageSize, ViewMode,
};

#[derive(Parser)]
#[command(name = "pagefit")]
#[command(version)]
#[command(about = "Plan page breaks and export resume layouts to PDF", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a request to PDF against a recorded layout
    Export {
        /// Export request JSON
        #[arg(value_name = "REQUEST")]
        request: PathBuf,

        /// Recorded layout JSON
        #[arg(short, long, value_name = "LAYOUT")]
        layout: PathBuf,

        /// Output PDF (defaults to the request name with a .pdf extension)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Override the request's view mode
        #[arg(long, value_enum)]
        view_mode: Option<Mode>,

        /// Override the request's page size ("A4", "US Letter")
        #[arg(long)]
        page_size: Option<String>,

        /// Rasterization timeout in seconds
        #[arg(long, env = "PAGEFIT_TIMEOUT_SECS", default_value = "30")]
        timeout_secs: u64,
    },

    /// Print section measurements of a recorded layout
    Measure {
        /// Recorded layout JSON
        #[arg(short, long, value_name = "LAYOUT")]
        layout: PathBuf,

        /// Page size ("A4", "US Letter")
        #[arg(long, default_value = "A4")]
        page_size: String,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Print the page-break plan of a recorded layout
    Plan {
        /// Recorded layout JSON
        #[arg(short, long, value_name = "LAYOUT")]
        layout: PathBuf,

        /// Page size ("A4", "US Letter")
        #[arg(long, default_value = "A4")]
        page_size: String,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show page geometry for a page size
    Geometry {
        /// Page size ("A4", "US Letter")
        #[arg(long, default_value = "A4")]
        page_size: String,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Fixed-size pages with planned breaks
    Page,
    /// One page sized to the content
    Continuous,
}

impl From<Mode> for ViewMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Page => ViewMode::Paged,
            Mode::Continuous => ViewMode::Continuous,
        }
    }
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Export {
            request,
            layout,
            output,
            view_mode,
            page_size,
            timeout_secs,
        }) => cmd_export(
            &request,
            &layout,
            output.as_deref(),
            view_mode,
            page_size.as_deref(),
            timeout_secs,
        ),
        Some(Commands::Measure {
            layout,
            page_size,
            compact,
        }) => cmd_measure(&layout, &page_size, compact),
        Some(Commands::Plan {
            layout,
            page_size,
            compact,
        }) => cmd_plan(&layout, &page_size, compact),
        Some(Commands::Geometry { page_size }) => cmd_geometry(&page_size),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            println!(
                "{}",
                "Usage: pagefit export <REQUEST> --layout <LAYOUT>".yellow()
            );
            println!("       pagefit --help for more information");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn parse_page_size(name: &str) -> CliResult<PageSize> {
    PageSize::parse(name).ok_or_else(|| format!("Invalid page size: {}", name).into())
}

fn load_request(
    path: &Path,
    view_mode: Option<Mode>,
    page_size: Option<&str>,
) -> CliResult<ExportRequest> {
    let json = fs::read_to_string(path)?;
    let mut request = ExportRequest::from_json(&json)?;
    if let Some(mode) = view_mode {
        request = request.with_view_mode(mode.into());
    }
    if let Some(size) = page_size {
        request = request.with_page_size(parse_page_size(size)?);
    }
    Ok(request)
}

fn default_output(request: &Path) -> PathBuf {
    request.with_extension("pdf")
}

fn to_json<T: serde::Serialize>(value: &T, compact: bool) -> CliResult<String> {
    Ok(if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    })
}

fn cmd_export(
    request_path: &Path,
    layout: &Path,
    output: Option<&Path>,
    view_mode: Option<Mode>,
    page_size: Option<&str>,
    timeout_secs: u64,
) -> CliResult<()> {
    let request = load_request(request_path, view_mode, page_size)?;
    let snapshot = LayoutSnapshot::from_file(layout)?;
    let options = ExportOptions::new().with_raster_timeout(Duration::from_secs(timeout_secs));

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!(
        "Exporting ({} mode, {})...",
        request.preview_view_mode, request.preview_page_size
    ));

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(export_snapshot_with_options(snapshot, &request, options));

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            pb.finish_and_clear();
            println!("{}", to_json(&e.to_response(), false)?);
            return Err(e.into());
        }
    };
    pb.finish_with_message("Done!");

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output(request_path));
    fs::write(&output, &outcome.pdf)?;

    println!("\n{}", "Export summary:".green().bold());
    println!(
        "  {} canvas: {:.1} x {:.1} mm",
        "├─".dimmed(),
        outcome.canvas.width_mm(),
        outcome.canvas.page_height_mm()
    );
    if let Some(plan) = &outcome.plan {
        println!(
            "  {} pages: {} ({} breaks)",
            "├─".dimmed(),
            plan.page_count(),
            plan.break_count()
        );
    }
    if !outcome.fonts.is_complete() {
        println!(
            "  {} {} missing weights {:?}",
            "├─".dimmed(),
            "fonts:".yellow(),
            outcome.fonts.missing_weights
        );
    }
    println!(
        "  {} {} ({} bytes)",
        "└─".dimmed(),
        output.display(),
        outcome.pdf_len()
    );

    Ok(())
}

fn cmd_measure(layout: &Path, page_size: &str, compact: bool) -> CliResult<()> {
    let snapshot = LayoutSnapshot::from_file(layout)?;
    let options = ExportOptions::new().with_page_size(parse_page_size(page_size)?);

    let rt = tokio::runtime::Runtime::new()?;
    match rt.block_on(measure_snapshot(&snapshot, &options))? {
        Some(report) => println!("{}", to_json(&report, compact)?),
        None => println!(
            "{} no element matches {}",
            "Notice:".yellow(),
            options.selectors.container
        ),
    }
    Ok(())
}

fn cmd_plan(layout: &Path, page_size: &str, compact: bool) -> CliResult<()> {
    let snapshot = LayoutSnapshot::from_file(layout)?;
    let options = ExportOptions::new().with_page_size(parse_page_size(page_size)?);

    let rt = tokio::runtime::Runtime::new()?;
    match rt.block_on(plan_snapshot(&snapshot, &options))? {
        Some(plan) => println!("{}", to_json(&plan, compact)?),
        None => println!(
            "{} no element matches {}",
            "Notice:".yellow(),
            options.selectors.container
        ),
    }
    Ok(())
}

fn cmd_geometry(page_size: &str) -> CliResult<()> {
    let geometry = PageGeometry::new(parse_page_size(page_size)?);
    let viewport = geometry.viewport();

    println!("{}", "Page Geometry".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Page size".bold(), geometry.page_size);
    println!(
        "{}: {:.1} x {:.1} mm",
        "Page".bold(),
        geometry.page_width_mm,
        geometry.page_height_mm
    );
    println!("{}: {:.1} mm", "Margins (total)".bold(), geometry.margin_mm);
    println!(
        "{}: {:.2} px",
        "Usable height".bold(),
        geometry.usable_height_px
    );
    println!(
        "{}: {} x {} px",
        "Viewport".bold(),
        viewport.width,
        viewport.height
    );
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pagefit".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Resume pagination and PDF export tool");
    println!();
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_size() {
        assert_eq!(parse_page_size("a4").unwrap(), PageSize::A4);
        assert_eq!(parse_page_size("US Letter").unwrap(), PageSize::UsLetter);
        assert!(parse_page_size("A3").is_err());
    }

    #[test]
    fn test_load_request_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("request.json");
        fs::write(
            &path,
            r#"{"html": "<div></div>", "previewViewMode": "page", "templateId": "modern"}"#,
        )
        .unwrap();

        let request = load_request(&path, Some(Mode::Continuous), Some("letter")).unwrap();
        assert_eq!(request.preview_view_mode, ViewMode::Continuous);
        assert_eq!(request.preview_page_size, PageSize::UsLetter);
        assert_eq!(request.template_id.as_deref(), Some("modern"));
    }

    #[test]
    fn test_default_output() {
        assert_eq!(
            default_output(Path::new("out/resume.json")),
            PathBuf::from("out/resume.pdf")
        );
    }
}
