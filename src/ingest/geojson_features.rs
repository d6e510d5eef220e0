use std::path::Path;

use geojson::feature::Id;
use geojson::{Feature, GeoJson, Value};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::error::IngestError;
use crate::geomath::Coordinates;
use crate::store::{ImportBatch, RawRecord, SourceFormat};

pub fn load_path(path: &Path) -> Result<ImportBatch, IngestError> {
    let text = super::read_text(path)?;
    from_str(&text, &super::source_name(path))
}

/// Points become site records and line strings become link records; every
/// property is carried along as a raw field.
pub fn from_str(text: &str, source_name: &str) -> Result<ImportBatch, IngestError> {
    let collection = match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => collection,
        GeoJson::Feature(_) => return Err(IngestError::NotAFeatureCollection("a Feature")),
        GeoJson::Geometry(_) => return Err(IngestError::NotAFeatureCollection("a Geometry")),
    };

    let mut records = Vec::with_capacity(collection.features.len());
    for (idx, feature) in collection.features.iter().enumerate() {
        match feature_record(feature, source_name) {
            Some(record) => records.push(record),
            None => warn!(
                "Skipping feature {} of {}: no usable geometry or type",
                idx, source_name
            ),
        }
    }
    // links resolve against sites, so sites from the same document go first
    records.sort_by_key(|r| {
        r.get("data_type")
            .is_some_and(|t| t.eq_ignore_ascii_case("link"))
    });
    debug!(
        "Parsed {} of {} features from {}",
        records.len(),
        collection.features.len(),
        source_name
    );

    Ok(ImportBatch {
        source_name: source_name.to_string(),
        format: SourceFormat::FeatureDocument,
        records,
    })
}

fn property_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

fn feature_id(feature: &Feature) -> Option<String> {
    match feature.id.as_ref()? {
        Id::String(s) => Some(s.clone()),
        Id::Number(n) => Some(n.to_string()),
    }
}

fn feature_record(feature: &Feature, source_name: &str) -> Option<RawRecord> {
    let mut record = RawRecord::new();
    if let Some(properties) = &feature.properties {
        for (name, value) in properties {
            record.insert(name, property_text(value));
        }
    }
    record.insert_default("data_source", source_name);

    match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Point(position)) => {
            let coords = Coordinates::from_position(position);
            record.insert("longitude", coords.lng.to_string());
            record.insert("latitude", coords.lat.to_string());
            if let Some(alt) = coords.alt {
                record.insert("altitude", alt.to_string());
            }
            if record.get("site_id").is_none() {
                record.insert("site_id", feature_id(feature)?);
            }
            record.insert("data_type", "site");
        }
        Some(Value::LineString(_)) => {
            record.insert("data_type", "link");
        }
        _ => {
            // no geometry we understand; keep it only if it says what it is
            record.classify().ok()?;
        }
    }
    Some(record)
}
