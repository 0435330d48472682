//! formsheet CLI - fill spreadsheet form templates and check them

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use formsheet::prelude::*;
use formsheet::inspect::{inspect, inspect_sheet};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "formsheet")]
#[command(author, version, about = "Fill fixed-layout spreadsheet forms past their printed capacity")]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Populate a template with header fields and line items
    Fill {
        /// Template workbook (.xlsx)
        #[arg(short, long, env = "FORMSHEET_TEMPLATE")]
        template: PathBuf,

        /// Layout description (JSON)
        #[arg(short, long, env = "FORMSHEET_LAYOUT")]
        layout: PathBuf,

        /// Input records: {"header": {...}, "items": [...]}
        #[arg(short, long)]
        data: PathBuf,

        /// Output workbook (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Report merge topology, sizes and layout fit of a template
    Inspect {
        /// Template workbook (.xlsx)
        #[arg(short, long, env = "FORMSHEET_TEMPLATE")]
        template: PathBuf,

        /// Layout description (JSON); without it only the sheet is checked
        #[arg(short, long, env = "FORMSHEET_LAYOUT")]
        layout: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Fill {
            template,
            layout,
            data,
            output,
        } => fill(&template, &layout, &data, output.as_deref()),
        Commands::Inspect { template, layout } => inspect_template(&template, layout.as_deref()),
    }
}

fn load_layout(path: &Path) -> Result<TemplateLayout> {
    TemplateLayout::from_file(path)
        .with_context(|| format!("Failed to load layout '{}'", path.display()))
}

fn fill(template: &Path, layout: &Path, data: &Path, output: Option<&Path>) -> Result<()> {
    let layout = load_layout(layout)?;
    let engine = TemplateEngine::new(&layout).context("Invalid layout")?;

    let json = std::fs::read_to_string(data)
        .with_context(|| format!("Failed to read '{}'", data.display()))?;
    let input: FormData = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse '{}'", data.display()))?;
    debug!(items = input.items.len(), header_fields = input.header.len(), "input loaded");

    let result = engine
        .generate(template, &input.header, &input.items)
        .with_context(|| format!("Failed to fill '{}'", template.display()))?;

    for error in &result.cell_errors {
        eprintln!("warning: {}", error);
    }

    if let Some(path) = output {
        std::fs::write(path, &result.bytes)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
        eprintln!(
            "Wrote {} item(s) to '{}' ({} row(s) inserted, footer at row {}, {} cell warning(s))",
            input.items.len(),
            path.display(),
            result.rows_inserted,
            result.footer_row,
            result.cell_errors.len()
        );
    } else {
        io::stdout()
            .write_all(&result.bytes)
            .context("Failed to write to stdout")?;
    }

    Ok(())
}

fn inspect_template(template: &Path, layout: Option<&Path>) -> Result<()> {
    let workbook = Workbook::open(template)
        .with_context(|| format!("Failed to open '{}'", template.display()))?;

    let report = match layout {
        Some(path) => inspect(&workbook, &load_layout(path)?),
        None => {
            let sheet = workbook
                .worksheet(0)
                .context("Template has no worksheets")?;
            inspect_sheet(sheet)
        }
    };

    println!("File: {}", template.display());
    println!("{}", report);

    if !report.is_healthy() {
        bail!(
            "template '{}' has {} problem(s)",
            template.display(),
            report.errors().count()
        );
    }
    Ok(())
}
