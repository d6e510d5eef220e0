//! Adjacency derivation and duplicate-location detection.
//!
//! Adjacency is read from the endpoint references links carry whenever every
//! link has them. Only when a link is structurally missing a reference does
//! the resolver fall back to matching link endpoints against site positions.
//! An empty result is never a reason to fall back; a network with no links
//! is a legitimate topology.

use std::collections::{BTreeMap, BTreeSet};

use ahash::{HashMap, HashMapExt};
use tracing::{debug, warn};

use crate::config::TopologyConfig;
use crate::entity::{Link, Site, PLACEHOLDER};
use crate::error::StrategyUnavailable;
use crate::geomath::{self, SpatialCell};

/// Site id to the ids of the links touching it.
pub type AdjacencyMap = BTreeMap<String, BTreeSet<String>>;

pub trait AdjacencyStrategy {
    fn name(&self) -> &'static str;

    /// Checks that the inputs carry what [`resolve`](Self::resolve) reads.
    fn precondition(&self, sites: &[&Site], links: &[&Link]) -> Result<(), StrategyUnavailable>;

    fn resolve(&self, sites: &[&Site], links: &[&Link]) -> AdjacencyMap;
}

fn seeded(sites: &[&Site]) -> AdjacencyMap {
    sites
        .iter()
        .map(|s| (s.id().to_string(), BTreeSet::new()))
        .collect()
}

/// Reads `source_id`/`destination_id` off every link. O(links).
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceStrategy;

impl AdjacencyStrategy for ReferenceStrategy {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn precondition(&self, _sites: &[&Site], links: &[&Link]) -> Result<(), StrategyUnavailable> {
        for link in links {
            let field = if link.source_id().is_none() {
                "source_id"
            } else if link.destination_id().is_none() {
                "destination_id"
            } else {
                continue;
            };
            return Err(StrategyUnavailable::MissingReference {
                link_id: link.id().to_string(),
                field,
            });
        }
        Ok(())
    }

    fn resolve(&self, sites: &[&Site], links: &[&Link]) -> AdjacencyMap {
        let mut adjacency = seeded(sites);
        for link in links {
            for endpoint in [link.source_id(), link.destination_id()].into_iter().flatten() {
                adjacency
                    .entry(endpoint.to_string())
                    .or_default()
                    .insert(link.id().to_string());
            }
        }
        adjacency
    }
}

/// Treats a site as incident to a link when it lies within the threshold of
/// either link endpoint. O(sites x links).
#[derive(Debug, Clone, Copy)]
pub struct ProximityStrategy {
    pub threshold_m: f64,
}

impl Default for ProximityStrategy {
    fn default() -> Self {
        Self {
            threshold_m: TopologyConfig::default().proximity_threshold_m,
        }
    }
}

impl AdjacencyStrategy for ProximityStrategy {
    fn name(&self) -> &'static str {
        "proximity"
    }

    fn precondition(&self, _sites: &[&Site], _links: &[&Link]) -> Result<(), StrategyUnavailable> {
        Ok(())
    }

    fn resolve(&self, sites: &[&Site], links: &[&Link]) -> AdjacencyMap {
        let mut adjacency = seeded(sites);
        for site in sites {
            let position = site.coordinates();
            let Some(incident) = adjacency.get_mut(site.id()) else {
                continue;
            };
            for link in links {
                let [a, b] = link.endpoints();
                if geomath::distance(&position, &a) < self.threshold_m
                    || geomath::distance(&position, &b) < self.threshold_m
                {
                    incident.insert(link.id().to_string());
                }
            }
        }
        adjacency
    }
}

/// Picks a strategy per call; a pure function of the entities it is given.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopologyResolver {
    config: TopologyConfig,
}

impl TopologyResolver {
    pub fn new(config: TopologyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TopologyConfig {
        &self.config
    }

    pub fn compute_adjacency(&self, sites: &[&Site], links: &[&Link]) -> AdjacencyMap {
        let preferred = ReferenceStrategy;
        match preferred.precondition(sites, links) {
            Ok(()) => {
                debug!(
                    "Resolving adjacency for {} sites and {} links by {}",
                    sites.len(),
                    links.len(),
                    preferred.name()
                );
                preferred.resolve(sites, links)
            }
            Err(reason) => {
                let fallback = ProximityStrategy {
                    threshold_m: self.config.proximity_threshold_m,
                };
                warn!(
                    "Reference adjacency unavailable ({}); falling back to {} over {} sites x {} links",
                    reason,
                    fallback.name(),
                    sites.len(),
                    links.len()
                );
                fallback.resolve(sites, links)
            }
        }
    }

    pub fn find_close_nodes(&self, sites: &[&Site]) -> Vec<Vec<String>> {
        close_nodes_within(sites, self.config.close_node_radius_m)
    }
}

/// Adjacency with the default configuration.
pub fn compute_adjacency(sites: &[&Site], links: &[&Link]) -> AdjacencyMap {
    TopologyResolver::default().compute_adjacency(sites, links)
}

/// Duplicate-location groups with the default configuration.
pub fn find_close_nodes(sites: &[&Site]) -> Vec<Vec<String>> {
    TopologyResolver::default().find_close_nodes(sites)
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }
}

/// Groups sites sharing a spatial hash, plus sites in neighbouring cells
/// closer than `radius_m`. Advisory only; nothing is merged or dropped.
pub fn close_nodes_within(sites: &[&Site], radius_m: f64) -> Vec<Vec<String>> {
    let cells: Vec<SpatialCell> = sites
        .iter()
        .map(|s| SpatialCell::of(&s.coordinates()))
        .collect();

    let mut buckets: HashMap<SpatialCell, Vec<usize>> = HashMap::new();
    for (idx, cell) in cells.iter().enumerate() {
        buckets.entry(*cell).or_default().push(idx);
    }

    let mut sets = DisjointSet::new(sites.len());
    for (cell, members) in &buckets {
        for pair in members.windows(2) {
            sets.union(pair[0], pair[1]);
        }
        for neighbour in cell.neighbourhood() {
            if neighbour == *cell {
                continue;
            }
            let Some(others) = buckets.get(&neighbour) else {
                continue;
            };
            for &i in members {
                for &j in others {
                    if i < j
                        && geomath::distance(&sites[i].coordinates(), &sites[j].coordinates())
                            < radius_m
                    {
                        sets.union(i, j);
                    }
                }
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    for idx in 0..sites.len() {
        let root = sets.find(idx);
        groups
            .entry(root)
            .or_default()
            .push(sites[idx].id().to_string());
    }

    let mut close: Vec<Vec<String>> = groups
        .into_values()
        .filter(|ids| ids.len() >= 2)
        .map(|mut ids| {
            ids.sort();
            ids
        })
        .collect();
    close.sort();
    close
}

/// How many sites have each adjacency-set size.
pub fn edges_per_node(adjacency: &AdjacencyMap) -> BTreeMap<usize, usize> {
    let mut histogram = BTreeMap::new();
    for links in adjacency.values() {
        *histogram.entry(links.len()).or_insert(0) += 1;
    }
    histogram
}

/// Site ids with at least one incident link.
pub fn connected_site_ids(adjacency: &AdjacencyMap) -> BTreeSet<String> {
    adjacency
        .iter()
        .filter(|(_, links)| !links.is_empty())
        .map(|(id, _)| id.clone())
        .collect()
}

pub const EXPECTED_SITE_FIELDS: [&str; 2] = ["bill_of_materials", "status"];
pub const EXPECTED_LINK_FIELDS: [&str; 1] = ["length"];

fn is_missing(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(v) => v.trim().is_empty() || v == PLACEHOLDER,
    }
}

/// Expected fields each entity lacks (absent, blank or still the
/// placeholder). Entities with nothing missing are left out.
pub fn missing_fields(sites: &[&Site], links: &[&Link]) -> BTreeMap<String, Vec<String>> {
    let mut gaps = BTreeMap::new();
    for site in sites {
        let missing: Vec<String> = EXPECTED_SITE_FIELDS
            .iter()
            .filter(|name| is_missing(site.field(name)))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            gaps.insert(site.id().to_string(), missing);
        }
    }
    for link in links {
        let missing: Vec<String> = EXPECTED_LINK_FIELDS
            .iter()
            .filter(|name| is_missing(link.field(name)))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            gaps.insert(link.id().to_string(), missing);
        }
    }
    gaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geomath::Coordinates;
    use crate::merge::apply_update;

    fn site(id: &str, lat: f64, lng: f64) -> Site {
        Site::at(id, Coordinates::new(lng, lat), 0)
    }

    fn refs<T>(items: &[T]) -> Vec<&T> {
        items.iter().collect()
    }

    fn triangle() -> (Vec<Site>, Vec<Link>) {
        let sites = vec![
            site("A", 37.0, -122.0),
            site("B", 37.001, -122.0),
            site("C", 37.0, -122.001),
            site("D", 37.01, -122.01),
        ];
        let links = vec![
            Link::between(&sites[0], &sites[1]),
            Link::between(&sites[1], &sites[2]),
            Link::between(&sites[2], &sites[0]),
        ];
        (sites, links)
    }

    #[test]
    fn reference_and_proximity_agree_on_consistent_data() {
        let (sites, links) = triangle();
        let (sites, links) = (refs(&sites), refs(&links));
        let by_ref = ReferenceStrategy.resolve(&sites, &links);
        let by_prox = ProximityStrategy::default().resolve(&sites, &links);
        assert_eq!(by_ref, by_prox);
        assert_eq!(
            by_ref["A"].iter().cloned().collect::<Vec<_>>(),
            vec!["A_B".to_string(), "A_C".to_string()]
        );
        assert!(by_ref["D"].is_empty());
    }

    #[test]
    fn falls_back_only_on_missing_references() {
        let (sites, mut links) = triangle();
        let mut orphan = Link::new("", "");
        orphan.set_endpoints(sites[3].coordinates(), Coordinates::new(0.0, 0.0));
        links.push(orphan);

        let (sites_r, links_r) = (refs(&sites), refs(&links));
        assert!(ReferenceStrategy.precondition(&sites_r, &links_r).is_err());

        let adjacency = compute_adjacency(&sites_r, &links_r);
        // proximity picks up the unreferenced link at D
        assert!(adjacency["D"].contains("unknown_unknown"));
        assert_eq!(adjacency["A"].len(), 2);
    }

    #[test]
    fn empty_topology_is_not_a_failure() {
        let sites = vec![site("A", 0.0, 0.0), site("B", 0.0, 0.0)];
        let sites = refs(&sites);
        assert!(ReferenceStrategy.precondition(&sites, &[]).is_ok());
        let adjacency = compute_adjacency(&sites, &[]);
        assert_eq!(adjacency.len(), 2);
        assert!(adjacency.values().all(|links| links.is_empty()));
        assert!(connected_site_ids(&adjacency).is_empty());
    }

    #[test]
    fn reference_strategy_reports_which_field_is_missing() {
        let links = vec![Link::new("a", "")];
        let err = ReferenceStrategy
            .precondition(&[], &refs(&links))
            .unwrap_err();
        assert_eq!(
            err,
            StrategyUnavailable::MissingReference {
                link_id: "A_unknown".to_string(),
                field: "destination_id"
            }
        );
    }

    #[test]
    fn resolver_is_idempotent() {
        let (sites, links) = triangle();
        let (sites, links) = (refs(&sites), refs(&links));
        let resolver = TopologyResolver::default();
        assert_eq!(
            resolver.compute_adjacency(&sites, &links),
            resolver.compute_adjacency(&sites, &links)
        );
    }

    #[test]
    fn close_nodes_groups_near_duplicates_only() {
        let sites = vec![
            site("N1", 40.00001, -73.00001),
            site("N2", 40.00002, -73.00002),
            // ~50 m north
            site("N3", 40.00047, -73.00001),
        ];
        let groups = find_close_nodes(&refs(&sites));
        assert_eq!(groups, vec![vec!["N1".to_string(), "N2".to_string()]]);
    }

    #[test]
    fn close_nodes_always_groups_equal_hashes() {
        let sites = vec![
            site("B", 10.000011, 10.000011),
            site("A", 10.000019, 10.000019),
            site("C", 11.0, 11.0),
        ];
        let groups = close_nodes_within(&refs(&sites), 0.0);
        assert_eq!(groups, vec![vec!["A".to_string(), "B".to_string()]]);
    }

    #[test]
    fn edges_per_node_counts_set_sizes() {
        let (sites, links) = triangle();
        let adjacency = compute_adjacency(&refs(&sites), &refs(&links));
        let histogram = edges_per_node(&adjacency);
        assert_eq!(histogram.get(&2), Some(&3));
        assert_eq!(histogram.get(&0), Some(&1));
    }

    #[test]
    fn missing_fields_skip_complete_entities() {
        let (mut sites, links) = triangle();
        apply_update(
            &mut sites[0],
            [("bill_of_materials", "dn, cn"), ("status", "built")],
            0,
        );
        let gaps = missing_fields(&refs(&sites), &refs(&links));
        assert!(!gaps.contains_key("A"));
        assert_eq!(
            gaps["B"],
            vec!["bill_of_materials".to_string(), "status".to_string()]
        );
        assert_eq!(gaps["A_B"], vec!["length".to_string()]);
    }
}
