use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use siteweave::config::TopologyConfig;
use siteweave::export;
use siteweave::ingest;
use siteweave::store::{ImportOrder, Store};
use siteweave::topology::TopologyResolver;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Folder holding the site tables, feature documents and graph
    /// descriptions to merge.
    #[arg(long, env = "SITEWEAVE_INPUT", default_value = ".")]
    input: PathBuf,

    /// Import only these file names from the input folder (comma-separated).
    /// Every supported file is imported when omitted.
    #[arg(long, value_delimiter = ',')]
    files: Option<Vec<String>>,

    /// Exports land in a dated folder underneath this one.
    #[arg(long, env = "SITEWEAVE_OUTPUT", default_value = "exports")]
    output: PathBuf,

    /// format-priority or reverse-name
    #[arg(long, default_value_t = ImportOrder::FormatPriority)]
    order: ImportOrder,

    #[arg(long, env = "SITEWEAVE_PROXIMITY_THRESHOLD_M")]
    proximity_threshold_m: Option<f64>,

    #[arg(long, env = "SITEWEAVE_CLOSE_NODE_RADIUS_M")]
    close_node_radius_m: Option<f64>,

    #[arg(long, env = "SITEWEAVE_LOG_LEVEL", default_value = "info")]
    log_level: tracing::Level,

    /// Merge and annotate, but skip writing exports.
    #[arg(long)]
    no_export: bool,
}

impl Args {
    fn topology_config(&self) -> TopologyConfig {
        let mut config = TopologyConfig::default();
        if let Some(threshold) = self.proximity_threshold_m {
            config.proximity_threshold_m = threshold;
        }
        if let Some(radius) = self.close_node_radius_m {
            config.close_node_radius_m = radius;
        }
        config
    }

    fn selected_paths(&self) -> Result<Vec<PathBuf>> {
        match &self.files {
            Some(names) => Ok(names
                .iter()
                .map(|name| name.trim())
                .filter(|name| !name.is_empty())
                .map(|name| self.input.join(name))
                .collect()),
            None => ingest::list_importable(&self.input)
                .with_context(|| format!("listing {}", self.input.display())),
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    let paths = args.selected_paths()?;
    if paths.is_empty() {
        warn!("No importable files found in {}", args.input.display());
    }

    let mut batches = Vec::with_capacity(paths.len());
    for path in &paths {
        match ingest::load_file(path) {
            Ok(batch) => batches.push(batch),
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }

    let mut store = Store::new();
    let report = store.import_all(batches, args.order);
    let resolver = TopologyResolver::new(args.topology_config());
    let adjacency = store.annotate_topology(&resolver);

    info!(
        "{} sites and {} links after merging {} records ({} rejected)",
        store.sites().len(),
        store.links().len(),
        report.loaded(),
        report.rejected()
    );

    if args.no_export {
        return Ok(());
    }

    let folder = export::write_all(&args.output, &store, &adjacency, &resolver)
        .context("writing exports")?;
    info!("Exports written to {}", folder.display());
    Ok(())
}
