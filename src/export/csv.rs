use std::collections::BTreeSet;
use std::io::Write;

use crate::entity::Site;
use crate::error::ExportError;
use crate::geomath::normalize_precision;

const LEADING_COLUMNS: [&str; 3] = ["site_id", "latitude", "longitude"];

/// `site_id, latitude, longitude`, then every other field name sorted.
pub fn site_columns(sites: &[&Site]) -> Vec<String> {
    let rest: BTreeSet<&str> = sites
        .iter()
        .flat_map(|s| s.fields().names())
        .filter(|name| !LEADING_COLUMNS.contains(name))
        .collect();
    let mut columns: Vec<String> = LEADING_COLUMNS.iter().map(|c| c.to_string()).collect();
    columns.extend(rest.into_iter().map(str::to_string));
    columns
}

pub fn write_sites<W: Write>(writer: W, sites: &[&Site]) -> Result<(), ExportError> {
    let columns = site_columns(sites);
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&columns)?;

    for site in sites {
        let coords = normalize_precision(&site.coordinates());
        let row: Vec<String> = columns
            .iter()
            .map(|column| match column.as_str() {
                "site_id" => site.id().to_string(),
                "latitude" => format!("{:.6}", coords.lat),
                "longitude" => format!("{:.6}", coords.lng),
                name => site.field(name).unwrap_or_default().to_string(),
            })
            .collect();
        wtr.write_record(&row)?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}
