use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::warn;

use crate::error::IngestError;
use crate::store::{ImportBatch, RawRecord, SourceFormat};

pub fn load_path(path: &Path) -> Result<ImportBatch, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    from_reader(file, &super::source_name(path))
}

/// Every row is a site record tagged with the file it came from. Rows that
/// cannot be read are skipped; the rest of the file still loads.
pub fn from_reader<R: Read>(reader: R, source_name: &str) -> Result<ImportBatch, IngestError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut records = Vec::new();
    for (line, row) in rdr.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!("Skipping row {} of {}: {}", line + 2, source_name, e);
                continue;
            }
        };

        let mut record: RawRecord = headers.iter().zip(row.iter()).collect();
        record.insert("data_source", source_name);
        record.insert("data_type", "site");
        record.insert_default("data_weight", "0");
        records.push(record);
    }

    Ok(ImportBatch {
        source_name: source_name.to_string(),
        format: SourceFormat::SiteTable,
        records,
    })
}
