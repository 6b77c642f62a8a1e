//! pdfdiff command line
//!
//! Compares two PDFs page by page and optionally writes highlighted
//! renders of both sides.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pdfdiff::overlay::encode_png;
use pdfdiff::{
    CachedSource, CompareMode, ComparisonSession, DiffConfig, DiffRegion, PdfSource, RefreshOutcome, Slot,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Visual,
    Text,
}

impl From<ModeArg> for CompareMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Visual => CompareMode::Visual,
            ModeArg::Text => CompareMode::Text,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "pdfdiff", about = "Compare two PDFs page by page", version)]
struct Cli {
    /// Left-hand document (slot A)
    left: PathBuf,

    /// Right-hand document (slot B)
    right: PathBuf,

    /// Compare only this page (1-based)
    #[arg(long)]
    page: Option<usize>,

    #[arg(long, value_enum, default_value = "visual")]
    mode: ModeArg,

    /// Render scale for written images
    #[arg(long, default_value_t = 1.0)]
    scale: f32,

    /// Highlight opacity in percent, overrides PDFDIFF_OPACITY
    #[arg(long)]
    opacity: Option<u8>,

    /// Write page-NNN-a.png / page-NNN-b.png here
    #[arg(long)]
    out: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct PageReport {
    page: usize,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    regions: Vec<DiffRegion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_ratio: Option<f64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "pdfdiff=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();

    run(Cli::parse())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = DiffConfig::from_env();
    if let Some(opacity) = cli.opacity {
        config.opacity_percent = opacity;
    }
    let mut session = ComparisonSession::new(config)?;
    session.set_mode(cli.mode.into());

    load(&mut session, Slot::A, &cli.left)?;
    load(&mut session, Slot::B, &cli.right)?;

    match session.check_duplicates() {
        Ok(Some(duplicate)) => tracing::warn!("{}", duplicate.message()),
        Ok(None) => {}
        Err(e) => tracing::warn!("Duplicate check failed: {}", e),
    }

    let total = session.total_pages();
    let pages = match cli.page {
        Some(0) => bail!("pages are numbered from 1"),
        Some(page) if page > total => bail!("page {} is out of range, document has {} pages", page, total),
        Some(page) => (page - 1)..page,
        None => 0..total,
    };

    if let Some(dir) = &cli.out {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let mut reports = Vec::with_capacity(pages.len());
    for page in pages {
        let outcome = session.go_to(page)?;
        let report = report_for(page, &outcome);

        if !cli.json {
            println!("page {} / {}: {}", page + 1, total, summary(&outcome));
        }
        if let Some(dir) = &cli.out {
            write_renders(&session, dir, page, cli.scale)?;
        }
        reports.push(report);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    Ok(())
}

fn load(session: &mut ComparisonSession, slot: Slot, path: &Path) -> anyhow::Result<()> {
    let source = PdfSource::open(path).with_context(|| format!("loading slot {}", slot))?;
    session.load(slot, path, CachedSource::new(source));
    Ok(())
}

fn summary(outcome: &RefreshOutcome) -> String {
    match outcome {
        RefreshOutcome::Visual(regions) => format!("{} regions", regions.len()),
        RefreshOutcome::Text(result) => result.to_string(),
        RefreshOutcome::Degraded => "not compared (page sizes differ or a page did not render)".to_string(),
        RefreshOutcome::Skipped => "skipped".to_string(),
    }
}

fn report_for(page: usize, outcome: &RefreshOutcome) -> PageReport {
    let (name, regions, text_ratio) = match outcome {
        RefreshOutcome::Visual(regions) => ("visual", regions.iter().copied().collect(), None),
        RefreshOutcome::Text(result) => ("text", Vec::new(), Some(result.ratio)),
        RefreshOutcome::Degraded => ("degraded", Vec::new(), None),
        RefreshOutcome::Skipped => ("skipped", Vec::new(), None),
    };
    PageReport {
        page: page + 1,
        outcome: name,
        regions,
        text_ratio,
    }
}

fn write_renders(session: &ComparisonSession, dir: &Path, page: usize, scale: f32) -> anyhow::Result<()> {
    for slot in Slot::ALL {
        let Some(image) = session.render(slot, scale, true)? else {
            continue;
        };
        let suffix = match slot {
            Slot::A => "a",
            Slot::B => "b",
        };
        let path = dir.join(format!("page-{:03}-{}.png", page + 1, suffix));
        std::fs::write(&path, encode_png(&image)?).with_context(|| format!("writing {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Wrote render");
    }
    Ok(())
}
