//! Human-readable summaries. Both reports only look at connected sites,
//! i.e. sites with at least one incident link.

use crate::entity::{Link, Site, PLACEHOLDER};
use crate::topology::{self, AdjacencyMap, TopologyResolver};

pub const SHORT_LINK_M: f64 = 100.0;
pub const LONG_LINK_M: f64 = 175.0;

pub fn connected_sites<'a>(sites: &[&'a Site], adjacency: &AdjacencyMap) -> Vec<&'a Site> {
    let connected = topology::connected_site_ids(adjacency);
    sites
        .iter()
        .copied()
        .filter(|s| connected.contains(s.id()))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LengthBreakdown {
    pub short: usize,
    pub medium: usize,
    pub long: usize,
    pub longest: Option<f64>,
    pub shortest: Option<f64>,
}

pub fn length_breakdown(links: &[&Link]) -> LengthBreakdown {
    let mut breakdown = LengthBreakdown::default();
    for length in links.iter().map(|l| l.length()) {
        if length > LONG_LINK_M {
            breakdown.long += 1;
        } else if length >= SHORT_LINK_M {
            breakdown.medium += 1;
        } else if length > 0.0 {
            breakdown.short += 1;
        }
        breakdown.longest = Some(breakdown.longest.map_or(length, |m| m.max(length)));
        breakdown.shortest = Some(breakdown.shortest.map_or(length, |m| m.min(length)));
    }
    breakdown
}

/// Hardware counts parsed out of free-text `bill_of_materials` fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialCounts {
    pub primary_devices: usize,
    pub secondary_devices: usize,
    pub client_devices: usize,
    pub odroid_devices: usize,
    pub sites_missing_bom: Vec<String>,
}

pub fn material_counts(sites: &[&Site]) -> MaterialCounts {
    let mut counts = MaterialCounts::default();
    for site in sites {
        let bom = match site.field("bill_of_materials") {
            Some(bom) if !bom.trim().is_empty() && bom != PLACEHOLDER => bom.to_lowercase(),
            _ => {
                counts.sites_missing_bom.push(site.id().to_string());
                continue;
            }
        };
        counts.client_devices += bom.matches("cn").count();
        counts.odroid_devices += bom.matches("odroid").count();
        // first distribution node on a site is the primary, the rest secondary
        let dn = bom.matches("dn").count();
        if dn >= 1 {
            counts.primary_devices += 1;
            counts.secondary_devices += dn - 1;
        }
    }
    counts
}

pub fn data_summary(sites: &[&Site], links: &[&Link]) -> String {
    format!(
        "\n==Data Summary==\n  {} unique sites imported.\n  {} unique links imported.\n",
        sites.len(),
        links.len()
    )
}

pub fn design_analysis(sites: &[&Site], links: &[&Link], adjacency: &AdjacencyMap) -> String {
    let avg_links_per_site = if sites.is_empty() {
        0.0
    } else {
        links.len() as f64 / sites.len() as f64 * 2.0
    };

    let connected: AdjacencyMap = adjacency
        .iter()
        .filter(|(_, ids)| !ids.is_empty())
        .map(|(id, ids)| (id.clone(), ids.clone()))
        .collect();
    let mut connectivity = String::new();
    for (link_count, site_count) in topology::edges_per_node(&connected) {
        connectivity.push_str(&format!("    {} link sites: {}\n", link_count, site_count));
    }

    let lengths = length_breakdown(links);
    let meters = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |m| format!("{:.1}", m));

    format!(
        "\n==Design Analysis==\n  Average of {:.2} links per site.\n  Breakdown of link connectivity per site:\n{}\n  {} meters is the longest link.\n  {} meters is the shortest link.\n  {} links are shorter than {} meters.\n  {} links are {} to {} meters.\n  {} links are longer than {} meters.\n",
        avg_links_per_site,
        connectivity,
        meters(lengths.longest),
        meters(lengths.shortest),
        lengths.short,
        SHORT_LINK_M,
        lengths.medium,
        SHORT_LINK_M,
        LONG_LINK_M,
        lengths.long,
        LONG_LINK_M,
    )
}

pub fn material_requirements(sites: &[&Site]) -> String {
    let counts = material_counts(sites);
    format!(
        "\n==Material Requirements==\n{} primary devices required.\n{} secondary devices required.\n{} client node devices required.\n{} odroid devices required.\n\n**This report only includes sites with a \"bill_of_materials\" field defining a hardware BOM.\n {} of {} sites are MISSING this data.\n",
        counts.primary_devices,
        counts.secondary_devices,
        counts.client_devices,
        counts.odroid_devices,
        counts.sites_missing_bom.len(),
        sites.len(),
    )
}

pub fn proximity_issues(sites: &[&Site], resolver: &TopologyResolver) -> String {
    let mut report = String::from(
        "\n==Location Proximity Data Issues==\n  The lat/long site data places sites within a meter of each other:\n",
    );
    for group in resolver.find_close_nodes(sites) {
        report.push_str(&format!("    {}\n", group.join(", ")));
    }
    report
}

pub fn missing_data_fields(sites: &[&Site], links: &[&Link]) -> String {
    let mut report =
        String::from("\n==Missing Data Field Issues==\n  These objects are missing data fields:\n");
    for (id, missing) in topology::missing_fields(sites, links) {
        report.push_str(&format!("  {} is missing => {}\n", id, missing.join(", ")));
    }
    report
}

pub fn summary_report(sites: &[&Site], links: &[&Link], adjacency: &AdjacencyMap) -> String {
    let connected = connected_sites(sites, adjacency);
    let mut report = data_summary(&connected, links);
    report.push_str(&design_analysis(&connected, links, adjacency));
    report.push_str(&material_requirements(&connected));
    report
}

pub fn data_issues_report(
    sites: &[&Site],
    links: &[&Link],
    adjacency: &AdjacencyMap,
    resolver: &TopologyResolver,
) -> String {
    let connected = connected_sites(sites, adjacency);
    let mut report = proximity_issues(&connected, resolver);
    report.push_str(&missing_data_fields(&connected, links));
    report
}
