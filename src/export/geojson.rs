use std::io::Write;

use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};

use crate::entity::{Link, Site};
use crate::error::ExportError;
use crate::geomath::normalize_precision;
use crate::merge::WeightedFields;

fn properties(fields: &WeightedFields) -> JsonObject {
    let mut properties = JsonObject::new();
    for (name, value) in fields.iter() {
        properties.insert(name.to_string(), value.into());
    }
    properties
}

fn site_feature(site: &Site) -> Feature {
    let position = normalize_precision(&site.coordinates()).to_position();
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(position))),
        id: Some(Id::String(site.id().to_string())),
        properties: Some(properties(site.fields())),
        foreign_members: None,
    }
}

fn link_feature(link: &Link) -> Feature {
    let [a, b] = link.endpoints();
    let line: geo_types::LineString<f64> = vec![
        normalize_precision(&a).to_point(),
        normalize_precision(&b).to_point(),
    ]
    .into();

    let mut properties = properties(link.fields());
    properties.insert("source_id".to_string(), link.source_label().into());
    properties.insert("destination_id".to_string(), link.destination_label().into());

    Feature {
        bbox: None,
        geometry: Some(Geometry::from(&line)),
        id: Some(Id::String(link.id().to_string())),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Sites as points and links as two-point line strings, sorted by id.
pub fn feature_collection(sites: &[&Site], links: &[&Link]) -> FeatureCollection {
    let mut keyed: Vec<(String, Feature)> = sites
        .iter()
        .map(|s| (s.id().to_string(), site_feature(s)))
        .chain(links.iter().map(|l| (l.id().to_string(), link_feature(l))))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    FeatureCollection {
        bbox: None,
        features: keyed.into_iter().map(|(_, f)| f).collect(),
        foreign_members: None,
    }
}

pub fn write<W: Write>(writer: W, sites: &[&Site], links: &[&Link]) -> Result<(), ExportError> {
    let geojson = GeoJson::FeatureCollection(feature_collection(sites, links));
    serde_json::to_writer_pretty(writer, &geojson)?;
    Ok(())
}
