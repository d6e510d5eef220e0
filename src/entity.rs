use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::geomath::{self, Coordinates};
use crate::merge::{self, Mergeable, Weight, Weighted, WeightedFields, DEFAULT_WEIGHT};

/// Value carried by default fields until a real import supplies one.
pub const PLACEHOLDER: &str = "Unknown";

/// How a missing link endpoint is rendered in ids and exports. Real ids are
/// uppercase after [`normalize_id`], so this never names an actual site.
pub const UNKNOWN_ENDPOINT: &str = "unknown";

/// Strips surrounding quotes and whitespace, then uppercases.
///
/// This is the only identifier transform in the crate; site ids and link
/// endpoint ids must pass through it before any lookup.
pub fn normalize_id(name: &str) -> String {
    name.trim_matches(|c: char| c == '"' || c == '\'' || c.is_whitespace())
        .to_uppercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Site,
    Link,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Site => "site",
            EntityKind::Link => "link",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One physical location.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    id: String,
    position: Weighted<Coordinates>,
    fields: WeightedFields,
}

impl Site {
    pub fn new(raw_id: &str) -> Self {
        Self {
            id: normalize_id(raw_id),
            position: Weighted::new(Coordinates::default(), DEFAULT_WEIGHT),
            fields: WeightedFields::new()
                .with_default("bill_of_materials", PLACEHOLDER)
                .with_default("status", PLACEHOLDER)
                .with_default("data_type", EntityKind::Site.as_str()),
        }
    }

    pub fn at(raw_id: &str, coordinates: Coordinates, weight: Weight) -> Self {
        let mut site = Self::new(raw_id);
        site.offer_position(coordinates, weight);
        site
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn coordinates(&self) -> Coordinates {
        self.position.value
    }

    pub fn latitude(&self) -> f64 {
        self.position.value.lat
    }

    pub fn longitude(&self) -> f64 {
        self.position.value.lng
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &WeightedFields {
        &self.fields
    }

    /// Proposes a new position; kept only if `weight` outranks the current one.
    pub fn offer_position(&mut self, coordinates: Coordinates, weight: Weight) -> bool {
        let applied = merge::outranks(weight, self.position.weight);
        let current = self.position.clone();
        self.position = merge::merge_value(Some(current), Weighted::new(coordinates, weight));
        applied
    }

    pub fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            id: self.id.clone(),
            kind: EntityKind::Site,
            geometry: SnapshotGeometry::Point(geomath::normalize_precision(&self.coordinates())),
            fields: self.fields.values(),
        }
    }
}

impl Mergeable for Site {
    fn fields_mut(&mut self) -> &mut WeightedFields {
        &mut self.fields
    }
}

/// An edge between two sites, identified independently of direction.
///
/// A link does not own its sites; the endpoints are resolved by id in the
/// store. The endpoint coordinates are a copy taken from those sites.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    id: String,
    source_id: Option<String>,
    destination_id: Option<String>,
    endpoints: [Coordinates; 2],
    fields: WeightedFields,
}

impl Link {
    pub fn new(source_id: &str, destination_id: &str) -> Self {
        let source_id = endpoint_ref(source_id);
        let destination_id = endpoint_ref(destination_id);
        Self {
            id: canonical_id(
                endpoint_label(source_id.as_deref()),
                endpoint_label(destination_id.as_deref()),
            ),
            source_id,
            destination_id,
            endpoints: [Coordinates::default(); 2],
            fields: WeightedFields::new()
                .with_default("status", PLACEHOLDER)
                .with_default("data_type", EntityKind::Link.as_str()),
        }
    }

    pub fn between(source: &Site, destination: &Site) -> Self {
        let mut link = Self::new(source.id(), destination.id());
        link.set_endpoints(source.coordinates(), destination.coordinates());
        link
    }

    /// Canonical id: both endpoint ids sorted and joined with `_`.
    pub fn link_id(a: &str, b: &str) -> String {
        canonical_id(&normalize_id(a), &normalize_id(b))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source_id(&self) -> Option<&str> {
        self.source_id.as_deref()
    }

    pub fn destination_id(&self) -> Option<&str> {
        self.destination_id.as_deref()
    }

    /// Source id for display; `unknown` when the reference is missing.
    pub fn source_label(&self) -> &str {
        endpoint_label(self.source_id())
    }

    pub fn destination_label(&self) -> &str {
        endpoint_label(self.destination_id())
    }

    /// Both endpoint references are present.
    pub fn has_endpoint_refs(&self) -> bool {
        self.source_id.is_some() && self.destination_id.is_some()
    }

    pub fn endpoints(&self) -> [Coordinates; 2] {
        self.endpoints
    }

    pub fn set_endpoints(&mut self, source: Coordinates, destination: Coordinates) {
        self.endpoints = [source, destination];
    }

    /// Great-circle length between the endpoint coordinates.
    pub fn length(&self) -> f64 {
        geomath::distance(&self.endpoints[0], &self.endpoints[1])
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &WeightedFields {
        &self.fields
    }

    pub fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            id: self.id.clone(),
            kind: EntityKind::Link,
            geometry: SnapshotGeometry::Line([
                geomath::normalize_precision(&self.endpoints[0]),
                geomath::normalize_precision(&self.endpoints[1]),
            ]),
            fields: self.fields.values(),
        }
    }
}

impl Mergeable for Link {
    fn fields_mut(&mut self) -> &mut WeightedFields {
        &mut self.fields
    }
}

fn endpoint_ref(raw: &str) -> Option<String> {
    let id = normalize_id(raw);
    (!id.is_empty()).then_some(id)
}

pub fn endpoint_label(id: Option<&str>) -> &str {
    id.unwrap_or(UNKNOWN_ENDPOINT)
}

// expects ids that are already normalized
fn canonical_id(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}_{b}")
    } else {
        format!("{b}_{a}")
    }
}

/// Anything the store owns.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Site(Site),
    Link(Link),
}

impl Entity {
    pub fn id(&self) -> &str {
        match self {
            Entity::Site(s) => s.id(),
            Entity::Link(l) => l.id(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Site(_) => EntityKind::Site,
            Entity::Link(_) => EntityKind::Link,
        }
    }

    pub fn as_site(&self) -> Option<&Site> {
        match self {
            Entity::Site(s) => Some(s),
            Entity::Link(_) => None,
        }
    }

    pub fn as_link(&self) -> Option<&Link> {
        match self {
            Entity::Link(l) => Some(l),
            Entity::Site(_) => None,
        }
    }

    pub fn fields(&self) -> &WeightedFields {
        match self {
            Entity::Site(s) => s.fields(),
            Entity::Link(l) => l.fields(),
        }
    }

    pub fn snapshot(&self) -> EntitySnapshot {
        match self {
            Entity::Site(s) => s.snapshot(),
            Entity::Link(l) => l.snapshot(),
        }
    }
}

impl Mergeable for Entity {
    fn fields_mut(&mut self) -> &mut WeightedFields {
        match self {
            Entity::Site(s) => s.fields_mut(),
            Entity::Link(l) => l.fields_mut(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum SnapshotGeometry {
    Point(Coordinates),
    Line([Coordinates; 2]),
}

/// Read-only copy of an entity at display precision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub id: String,
    pub kind: EntityKind,
    pub geometry: SnapshotGeometry,
    pub fields: BTreeMap<String, String>,
}
