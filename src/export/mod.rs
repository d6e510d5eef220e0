//! Export artifacts written after topology has been annotated.

pub mod csv;
pub mod geojson;
pub mod kml;
pub mod report;

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::ExportError;
use crate::store::Store;
use crate::topology::{AdjacencyMap, TopologyResolver};

pub const SUMMARY_FILE: &str = "summary.txt";
pub const DATA_ISSUES_FILE: &str = "data_issues.txt";
pub const DESIGN_LAYOUT_FILE: &str = "design_layout.geojson";
pub const DESIGN_LAYOUT_KML_FILE: &str = "design_layout.kml";
pub const SITE_TABLE_FILE: &str = "aggregated_site_data.csv";

fn create(path: &Path) -> Result<BufWriter<File>, ExportError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn write_text(path: &Path, text: &str) -> Result<(), ExportError> {
    fs::write(path, text).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes every artifact into `output_root/<YYYY-MM-DD>/` and returns that
/// folder. Files from an earlier run on the same day are overwritten.
pub fn write_all(
    output_root: &Path,
    store: &Store,
    adjacency: &AdjacencyMap,
    resolver: &TopologyResolver,
) -> Result<PathBuf, ExportError> {
    let folder = output_root.join(chrono::Local::now().format("%Y-%m-%d").to_string());
    write_into(&folder, store, adjacency, resolver)?;
    Ok(folder)
}

pub fn write_into(
    folder: &Path,
    store: &Store,
    adjacency: &AdjacencyMap,
    resolver: &TopologyResolver,
) -> Result<(), ExportError> {
    fs::create_dir_all(folder).map_err(|source| ExportError::Io {
        path: folder.to_path_buf(),
        source,
    })?;

    let sites = store.sites();
    let links = store.links();
    let connected = report::connected_sites(&sites, adjacency);

    write_text(
        &folder.join(SUMMARY_FILE),
        &report::summary_report(&sites, &links, adjacency),
    )?;
    write_text(
        &folder.join(DATA_ISSUES_FILE),
        &report::data_issues_report(&sites, &links, adjacency, resolver),
    )?;
    geojson::write(create(&folder.join(DESIGN_LAYOUT_FILE))?, &connected, &links)?;
    kml::write(create(&folder.join(DESIGN_LAYOUT_KML_FILE))?, &connected, &links)?;
    csv::write_sites(create(&folder.join(SITE_TABLE_FILE))?, &sites)?;

    info!(
        "Exported {} sites ({} connected) and {} links to {}",
        sites.len(),
        connected.len(),
        links.len(),
        folder.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RawRecord;

    #[test]
    fn writes_every_artifact() {
        let mut store = Store::new();
        store.add(
            &RawRecord::new()
                .with("site_id", "a")
                .with("latitude", "40.0")
                .with("longitude", "-73.0"),
        );
        store.add(
            &RawRecord::new()
                .with("site_id", "b")
                .with("latitude", "40.001")
                .with("longitude", "-73.0"),
        );
        store.add(
            &RawRecord::new()
                .with("source_id", "a")
                .with("destination_id", "b"),
        );
        let resolver = TopologyResolver::default();
        let adjacency = store.annotate_topology(&resolver);

        let folder = std::env::temp_dir().join(format!("siteweave-export-{}", std::process::id()));
        write_into(&folder, &store, &adjacency, &resolver).unwrap();

        for name in [
            SUMMARY_FILE,
            DATA_ISSUES_FILE,
            DESIGN_LAYOUT_FILE,
            DESIGN_LAYOUT_KML_FILE,
            SITE_TABLE_FILE,
        ] {
            assert!(folder.join(name).is_file(), "{name} missing");
        }
        let summary = fs::read_to_string(folder.join(SUMMARY_FILE)).unwrap();
        assert!(summary.contains("2 unique sites imported."));
        let _ = fs::remove_dir_all(&folder);
    }
}
