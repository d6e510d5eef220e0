//! The keyed entity collection every import lands in.

use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, info, warn};

use crate::entity::{normalize_id, Entity, EntityKind, EntitySnapshot, Link, Site};
use crate::error::RejectReason;
use crate::geomath::{self, Coordinates};
use crate::merge::{apply_update, normalize_field_name, Mergeable, Weight};
use crate::topology::{AdjacencyMap, TopologyResolver};

/// Raw keys the store consumes itself instead of storing them as fields.
pub const RESERVED_KEYS: [&str; 9] = [
    "site_id",
    "id",
    "latitude",
    "longitude",
    "altitude",
    "data_weight",
    "data_type",
    "source_id",
    "destination_id",
];

/// One flat record as produced by a parser: field name to text.
///
/// Keys are normalized on insert so lookups are insensitive to case and
/// spacing in the source header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: BTreeMap<String, String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(normalize_field_name(name), value.into());
    }

    /// Inserts only if the key is not present yet.
    pub fn insert_default(&mut self, name: &str, value: impl Into<String>) {
        self.fields
            .entry(normalize_field_name(name))
            .or_insert_with(|| value.into());
    }

    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Non-blank value for a key.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `data_weight` as an integer; blank or unparsable text counts as 0.
    pub fn weight(&self) -> Weight {
        match self.get("data_weight") {
            None => 0,
            Some(raw) => raw.parse::<Weight>().unwrap_or_else(|_| {
                warn!("Unparsable data_weight '{}', using 0", raw);
                0
            }),
        }
    }

    pub fn classify(&self) -> Result<EntityKind, RejectReason> {
        if self.has("site_id") {
            return Ok(EntityKind::Site);
        }
        match self.get("data_type").map(str::to_lowercase).as_deref() {
            Some("site") => return Ok(EntityKind::Site),
            Some("link") => return Ok(EntityKind::Link),
            _ => {}
        }
        if self.has("source_id") || self.has("destination_id") {
            Ok(EntityKind::Link)
        } else {
            Err(RejectReason::Unclassified)
        }
    }

    /// Proposed position, if the record speaks about one at all. Components
    /// that are missing or unparsable fall back to `0.0`.
    pub fn position(&self) -> Option<Coordinates> {
        let lat = self.get("latitude");
        let lng = self.get("longitude");
        if lat.is_none() && lng.is_none() {
            return None;
        }
        let component = |name: &str, raw: Option<&str>| {
            let (value, defaulted) = geomath::parse_component(raw.unwrap_or(""));
            if defaulted {
                warn!("Unusable {} '{}', using 0.0", name, raw.unwrap_or(""));
            }
            value
        };
        let mut coords = Coordinates::new(component("longitude", lng), component("latitude", lat));
        if let Some(alt) = self.get("altitude") {
            match geomath::parse_component(alt) {
                (value, false) => coords.alt = Some(value),
                (_, true) => warn!("Ignoring unusable altitude '{}'", alt),
            }
        }
        Some(coords)
    }

    /// Fields offered to the merge engine.
    pub fn payload(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(k, _)| !RESERVED_KEYS.contains(k))
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut record = RawRecord::new();
        for (k, v) in iter {
            record.insert(k.as_ref(), v);
        }
        record
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceFormat {
    /// Delimited tabular site records.
    SiteTable,
    /// GeoJSON feature collections.
    FeatureDocument,
    /// GraphViz edge lists.
    GraphDescription,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(SourceFormat::SiteTable),
            "json" | "geojson" => Some(SourceFormat::FeatureDocument),
            "gv" | "dot" => Some(SourceFormat::GraphDescription),
            _ => None,
        }
    }

    /// Sites before the documents that may reference them.
    fn priority(&self) -> u8 {
        match self {
            SourceFormat::SiteTable => 0,
            SourceFormat::FeatureDocument => 1,
            SourceFormat::GraphDescription => 2,
        }
    }
}

/// Records parsed from one input file.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportBatch {
    pub source_name: String,
    pub format: SourceFormat,
    pub records: Vec<RawRecord>,
}

/// The order batches are merged in. Ties in weight are won by whichever
/// batch is applied later, so this order is part of the result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportOrder {
    /// Site tables, then feature documents, then graph descriptions; by
    /// ascending file name within a format.
    #[default]
    FormatPriority,
    /// File names split on `.` and compared component-wise, descending.
    ReverseName,
}

impl ImportOrder {
    pub fn compare(&self, a: &ImportBatch, b: &ImportBatch) -> Ordering {
        match self {
            ImportOrder::FormatPriority => a
                .format
                .priority()
                .cmp(&b.format.priority())
                .then_with(|| a.source_name.cmp(&b.source_name)),
            ImportOrder::ReverseName => {
                let a_parts: Vec<&str> = a.source_name.split('.').collect();
                let b_parts: Vec<&str> = b.source_name.split('.').collect();
                b_parts.cmp(&a_parts)
            }
        }
    }

    pub fn sort(&self, batches: &mut [ImportBatch]) {
        batches.sort_by(|a, b| self.compare(a, b));
    }
}

impl FromStr for ImportOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "format-priority" | "format" => Ok(ImportOrder::FormatPriority),
            "reverse-name" | "reverse" => Ok(ImportOrder::ReverseName),
            other => Err(format!(
                "unknown import order '{other}', expected format-priority or reverse-name"
            )),
        }
    }
}

impl fmt::Display for ImportOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportOrder::FormatPriority => f.write_str("format-priority"),
            ImportOrder::ReverseName => f.write_str("reverse-name"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub source_name: String,
    pub loaded: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub batches: Vec<BatchReport>,
}

impl ImportReport {
    pub fn loaded(&self) -> usize {
        self.batches.iter().map(|b| b.loaded).sum()
    }

    pub fn rejected(&self) -> usize {
        self.batches.iter().map(|b| b.rejected).sum()
    }
}

/// Sites and links keyed by id in one namespace. Grows only through
/// [`Store::add`]; nothing is ever removed.
#[derive(Debug, Clone, Default)]
pub struct Store {
    entities: BTreeMap<String, Entity>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Incorporates one record. Returns `false` (and logs why) when the
    /// record was rejected; never aborts the caller's batch.
    pub fn add(&mut self, record: &RawRecord) -> bool {
        match self.try_add(record) {
            Ok(id) => {
                debug!("Merged record into {}", id);
                true
            }
            Err(reason) => {
                warn!("Failed to load record: {}", reason);
                false
            }
        }
    }

    /// Like [`Store::add`], but hands back the entity id or the reason.
    pub fn try_add(&mut self, record: &RawRecord) -> Result<String, RejectReason> {
        match record.classify()? {
            EntityKind::Site => self.add_site(record),
            EntityKind::Link => self.add_link(record),
        }
    }

    fn add_site(&mut self, record: &RawRecord) -> Result<String, RejectReason> {
        let id = normalize_id(record.get("site_id").or_else(|| record.get("id")).unwrap_or(""));
        if id.is_empty() {
            return Err(RejectReason::MissingId {
                kind: EntityKind::Site,
            });
        }
        let weight = record.weight();

        let entity = match self.entities.entry(id.clone()) {
            Entry::Vacant(slot) => slot.insert(Entity::Site(Site::new(&id))),
            Entry::Occupied(slot) => slot.into_mut(),
        };
        let Entity::Site(site) = entity else {
            return Err(RejectReason::KindConflict {
                id,
                existing: EntityKind::Link,
            });
        };

        if let Some(position) = record.position() {
            site.offer_position(position, weight);
        }
        apply_update(site, record.payload(), weight);
        Ok(id)
    }

    fn add_link(&mut self, record: &RawRecord) -> Result<String, RejectReason> {
        let source_id = normalize_id(record.get("source_id").unwrap_or(""));
        if source_id.is_empty() {
            return Err(RejectReason::MissingEndpoint { field: "source_id" });
        }
        let destination_id = normalize_id(record.get("destination_id").unwrap_or(""));
        if destination_id.is_empty() {
            return Err(RejectReason::MissingEndpoint {
                field: "destination_id",
            });
        }

        let source = self
            .site(&source_id)
            .ok_or_else(|| RejectReason::UnknownSite {
                role: "source",
                id: source_id.clone(),
            })?
            .coordinates();
        let destination = self
            .site(&destination_id)
            .ok_or_else(|| RejectReason::UnknownSite {
                role: "destination",
                id: destination_id.clone(),
            })?
            .coordinates();

        let id = Link::link_id(&source_id, &destination_id);
        if source_id == destination_id {
            return Err(RejectReason::SelfLoop { id });
        }
        let weight = record.weight();

        let entity = match self.entities.entry(id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(Entity::Link(Link::new(&source_id, &destination_id)))
            }
            Entry::Occupied(slot) => slot.into_mut(),
        };
        let Entity::Link(link) = entity else {
            return Err(RejectReason::KindConflict {
                id,
                existing: EntityKind::Site,
            });
        };

        // the stored orientation is whichever record created the link
        if link.source_id() == Some(source_id.as_str()) {
            link.set_endpoints(source, destination);
        } else {
            link.set_endpoints(destination, source);
        }
        apply_update(link, record.payload(), weight);
        Ok(id)
    }

    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn site(&self, id: &str) -> Option<&Site> {
        self.entities.get(id).and_then(Entity::as_site)
    }

    pub fn link(&self, id: &str) -> Option<&Link> {
        self.entities.get(id).and_then(Entity::as_link)
    }

    pub fn sites(&self) -> Vec<&Site> {
        self.entities.values().filter_map(Entity::as_site).collect()
    }

    pub fn links(&self) -> Vec<&Link> {
        self.entities.values().filter_map(Entity::as_link).collect()
    }

    pub fn all(&self) -> Vec<&Entity> {
        self.entities.values().collect()
    }

    pub fn snapshots(&self) -> Vec<EntitySnapshot> {
        self.entities.values().map(Entity::snapshot).collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn import_batch(&mut self, batch: &ImportBatch) -> BatchReport {
        let mut loaded = 0;
        for record in &batch.records {
            if self.add(record) {
                loaded += 1;
            }
        }
        let rejected = batch.records.len() - loaded;
        info!(
            "Loaded {} of {} records from {} ({} rejected)",
            loaded,
            batch.records.len(),
            batch.source_name,
            rejected
        );
        BatchReport {
            source_name: batch.source_name.clone(),
            loaded,
            rejected,
        }
    }

    /// Orders the batches by `order`, then merges them one after another.
    pub fn import_all(&mut self, mut batches: Vec<ImportBatch>, order: ImportOrder) -> ImportReport {
        order.sort(&mut batches);
        let report = ImportReport {
            batches: batches.iter().map(|b| self.import_batch(b)).collect(),
        };
        info!(
            "Imports complete: {} records merged, {} rejected, {} entities stored",
            report.loaded(),
            report.rejected(),
            self.len()
        );
        report
    }

    /// Refreshes link endpoints from current site positions, then writes the
    /// derived `length` (links) and `connected_links` (sites) fields.
    pub fn annotate_topology(&mut self, resolver: &TopologyResolver) -> AdjacencyMap {
        let positions: BTreeMap<String, Coordinates> = self
            .sites()
            .into_iter()
            .map(|s| (s.id().to_string(), s.coordinates()))
            .collect();
        for entity in self.entities.values_mut() {
            if let Entity::Link(link) = entity {
                let source = link.source_id().and_then(|id| positions.get(id)).copied();
                let destination = link.destination_id().and_then(|id| positions.get(id)).copied();
                if let (Some(a), Some(b)) = (source, destination) {
                    link.set_endpoints(a, b);
                }
            }
        }

        let adjacency = resolver.compute_adjacency(&self.sites(), &self.links());

        for entity in self.entities.values_mut() {
            match entity {
                Entity::Site(site) => {
                    let connected = adjacency
                        .get(site.id())
                        .filter(|ids| !ids.is_empty())
                        .map(|ids| ids.iter().cloned().collect::<Vec<_>>().join(", "));
                    site.fields_mut()
                        .set_derived("connected_links", connected.as_deref());
                }
                Entity::Link(link) => {
                    let length = format!("{:.1}", link.length());
                    link.fields_mut().set_derived("length", Some(&length));
                }
            }
        }
        adjacency
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{AdjacencyStrategy, ReferenceStrategy};
    use std::collections::BTreeSet;

    fn site_record(id: &str, lat: &str, lng: &str, weight: i64) -> RawRecord {
        RawRecord::new()
            .with("site_id", id)
            .with("latitude", lat)
            .with("longitude", lng)
            .with("data_weight", weight.to_string())
    }

    fn link_record(source: &str, destination: &str) -> RawRecord {
        RawRecord::new()
            .with("source_id", source)
            .with("destination_id", destination)
            .with("data_type", "link")
    }

    #[test]
    fn higher_weight_status_wins() {
        let mut store = Store::new();
        assert!(store.add(&site_record("A", "0.0", "0.0", 0).with("status", "planned")));
        assert!(store.add(&site_record("a", "0.0", "0.0", 1).with("status", "built")));
        assert_eq!(store.sites().len(), 1);
        assert_eq!(store.site("A").and_then(|s| s.field("status")), Some("built"));

        // a later, lighter record cannot undo it
        assert!(store.add(&site_record("A", "", "", 0).with("status", "planned")));
        assert_eq!(store.site("A").and_then(|s| s.field("status")), Some("built"));
    }

    #[test]
    fn links_need_existing_sites() {
        let mut store = Store::new();
        assert!(!store.add(&link_record("A", "B")));
        assert_eq!(
            store.try_add(&link_record("A", "B")),
            Err(RejectReason::UnknownSite {
                role: "source",
                id: "A".to_string()
            })
        );
        assert!(store.is_empty());

        store.add(&site_record("A", "0.0", "0.0", 0));
        store.add(&site_record("B", "0.001", "0.0", 0));
        assert!(store.add(&link_record("A", "B")));

        let adjacency = store.annotate_topology(&TopologyResolver::default());
        let expected: BTreeSet<String> = ["A_B".to_string()].into_iter().collect();
        assert_eq!(adjacency.get("A"), Some(&expected));
        assert_eq!(adjacency.get("B"), Some(&expected));
        assert_eq!(adjacency.len(), 2);
    }

    #[test]
    fn reversed_links_merge_into_one() {
        let mut store = Store::new();
        store.add(&site_record("A", "0.0", "0.0", 0));
        store.add(&site_record("B", "0.001", "0.0", 0));
        store.add(&link_record("A", "B").with("status", "planned"));
        store.add(&link_record("\"b\"", "a").with("status", "built"));

        let links = store.links();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].id(), "A_B");
        assert_eq!(links[0].source_id(), Some("A"));
        assert_eq!(links[0].field("status"), Some("built"));
        assert_eq!(links[0].endpoints()[0], Coordinates::new(0.0, 0.0));
    }

    #[test]
    fn malformed_records_degrade_gracefully() {
        let mut store = Store::new();
        assert!(store.add(&site_record("A", "north", "0.5", 0)));
        let site = store.site("A").cloned().unwrap();
        assert_eq!(site.latitude(), 0.0);
        assert_eq!(site.longitude(), 0.5);

        assert!(store.add(&RawRecord::new().with("site_id", "B").with("data_weight", "heavy")));
        assert_eq!(store.site("B").map(|s| s.coordinates()), Some(Coordinates::default()));

        assert_eq!(
            store.try_add(&RawRecord::new().with("status", "built")),
            Err(RejectReason::Unclassified)
        );
        assert_eq!(
            store.try_add(&RawRecord::new().with("site_id", "  ")),
            Err(RejectReason::MissingId {
                kind: EntityKind::Site
            })
        );
        assert_eq!(
            store.try_add(&link_record("A", "")),
            Err(RejectReason::MissingEndpoint {
                field: "destination_id"
            })
        );
        assert!(matches!(
            store.try_add(&link_record("A", "a")),
            Err(RejectReason::SelfLoop { .. })
        ));
    }

    #[test]
    fn reserved_keys_are_not_fields() {
        let mut store = Store::new();
        store.add(&site_record("A", "1.0", "2.0", 3).with("Bill of Materials", "dn, cn"));
        let site = store.site("A").unwrap();
        assert!(!site.fields().contains("latitude"));
        assert!(!site.fields().contains("site_id"));
        assert!(!site.fields().contains("data_weight"));
        assert_eq!(site.field("data_type"), Some("site"));
        assert_eq!(site.field("bill_of_materials"), Some("dn, cn"));
    }

    #[test]
    fn kind_conflicts_are_rejected() {
        let mut store = Store::new();
        store.add(&site_record("A", "0", "0", 0));
        store.add(&site_record("B", "0", "1", 0));
        store.add(&site_record("A_B", "0", "2", 0));
        assert!(matches!(
            store.try_add(&link_record("A", "B")),
            Err(RejectReason::KindConflict { .. })
        ));
    }

    fn batch(name: &str, format: SourceFormat, records: Vec<RawRecord>) -> ImportBatch {
        ImportBatch {
            source_name: name.to_string(),
            format,
            records,
        }
    }

    #[test]
    fn format_priority_puts_sites_before_edges() {
        let mut store = Store::new();
        let report = store.import_all(
            vec![
                batch(
                    "design.gv",
                    SourceFormat::GraphDescription,
                    vec![link_record("A", "B")],
                ),
                batch(
                    "survey.csv",
                    SourceFormat::SiteTable,
                    vec![site_record("A", "0", "0", 0), site_record("B", "0", "0.001", 0)],
                ),
            ],
            ImportOrder::FormatPriority,
        );
        assert_eq!(report.loaded(), 3);
        assert_eq!(report.rejected(), 0);
        assert_eq!(report.batches[0].source_name, "survey.csv");
    }

    #[test]
    fn ties_are_decided_by_import_order() {
        let first = batch(
            "a.csv",
            SourceFormat::SiteTable,
            vec![site_record("S", "0", "0", 2).with("status", "from a")],
        );
        let second = batch(
            "b.csv",
            SourceFormat::SiteTable,
            vec![site_record("S", "0", "0", 2).with("status", "from b")],
        );

        let mut forward = Store::new();
        forward.import_all(vec![second.clone(), first.clone()], ImportOrder::FormatPriority);
        assert_eq!(forward.site("S").and_then(|s| s.field("status")), Some("from b"));

        let mut reverse = Store::new();
        reverse.import_all(vec![first, second], ImportOrder::ReverseName);
        assert_eq!(reverse.site("S").and_then(|s| s.field("status")), Some("from a"));
    }

    #[test]
    fn reverse_name_compares_dot_components() {
        let mut batches = vec![
            batch("links.gv", SourceFormat::GraphDescription, vec![]),
            batch("sites.csv", SourceFormat::SiteTable, vec![]),
            batch("sites.b.csv", SourceFormat::SiteTable, vec![]),
        ];
        ImportOrder::ReverseName.sort(&mut batches);
        let names: Vec<&str> = batches.iter().map(|b| b.source_name.as_str()).collect();
        assert_eq!(names, vec!["sites.csv", "sites.b.csv", "links.gv"]);
    }

    #[test]
    fn import_order_parses() {
        assert_eq!("reverse-name".parse::<ImportOrder>(), Ok(ImportOrder::ReverseName));
        assert_eq!("Format".parse::<ImportOrder>(), Ok(ImportOrder::FormatPriority));
        assert!("random".parse::<ImportOrder>().is_err());
    }

    #[test]
    fn annotate_topology_is_idempotent() {
        let mut store = Store::new();
        store.add(&site_record("A", "0.0", "0.0", 0));
        store.add(&site_record("B", "0.001", "0.0", 0));
        store.add(&site_record("C", "5.0", "5.0", 0));
        store.add(&link_record("A", "B"));

        let resolver = TopologyResolver::default();
        let first = store.annotate_topology(&resolver);
        let fields_after_first: Vec<_> = store.snapshots();
        let second = store.annotate_topology(&resolver);
        assert_eq!(first, second);
        assert_eq!(fields_after_first, store.snapshots());

        assert_eq!(store.link("A_B").and_then(|l| l.field("length")), Some("111.2"));
        assert_eq!(store.site("A").and_then(|s| s.field("connected_links")), Some("A_B"));
        assert_eq!(store.site("C").and_then(|s| s.field("connected_links")), None);
    }

    #[test]
    fn isolated_sites_lose_imported_connected_links() {
        let mut store = Store::new();
        store.add(&site_record("A", "0.0", "0.0", 9).with("connected_links", "A_Z"));
        store.add(&site_record("B", "1.0", "1.0", 0).with("connected_links", "B_Z"));
        store.add(&site_record("C", "1.001", "1.0", 0));
        store.add(&link_record("B", "C"));

        store.annotate_topology(&TopologyResolver::default());
        assert_eq!(store.site("A").and_then(|s| s.field("connected_links")), None);
        assert_eq!(store.site("B").and_then(|s| s.field("connected_links")), Some("B_C"));
    }

    #[test]
    fn site_named_unknown_links_and_moves_like_any_other() {
        let mut store = Store::new();
        store.add(&site_record("unknown", "0.0", "0.0", 0));
        store.add(&site_record("B", "0.0", "5.0", 0));
        assert!(store.add(&link_record("Unknown", "B")));

        let link = store.link("B_UNKNOWN").unwrap();
        assert_eq!(link.source_id(), Some("UNKNOWN"));
        assert!(link.has_endpoint_refs());

        store.add(&site_record("unknown", "1.0", "0.0", 5));
        let links = store.links();
        assert!(ReferenceStrategy.precondition(&store.sites(), &links).is_ok());
        let adjacency = store.annotate_topology(&TopologyResolver::default());
        assert_eq!(adjacency["UNKNOWN"].len(), 1);
        assert_eq!(
            store.link("B_UNKNOWN").map(|l| l.endpoints()[0]),
            Some(Coordinates::new(0.0, 1.0))
        );
    }

    #[test]
    fn moved_sites_update_link_geometry() {
        let mut store = Store::new();
        store.add(&site_record("A", "0.0", "0.0", 0));
        store.add(&site_record("B", "0.001", "0.0", 0));
        store.add(&link_record("A", "B"));
        store.add(&site_record("B", "0.002", "0.0", 1));
        store.annotate_topology(&TopologyResolver::default());
        assert_eq!(store.link("A_B").and_then(|l| l.field("length")), Some("222.4"));
    }
}
