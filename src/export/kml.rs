//! KML 2.2 layout for viewing a design in Google Earth. Sites go in one
//! folder; links are grouped into subfolders by the file they came from.

use std::collections::BTreeMap;
use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::entity::{Link, Site};
use crate::error::ExportError;
use crate::geomath::{normalize_precision, Coordinates};
use crate::merge::WeightedFields;

const KML_NS: &str = "http://www.opengis.net/kml/2.2";
// folder for links that do not say which file they came from
const NO_SOURCE: &str = "unknown";
const SITE_ICON: &str = "http://maps.google.com/mapfiles/kml/shapes/placemark_circle_highlight.png";

fn emit<W: Write>(w: &mut Writer<W>, event: Event<'_>) -> Result<(), ExportError> {
    w.write_event(event)
        .map_err(|e| ExportError::Kml(e.to_string()))
}

fn open<W: Write>(w: &mut Writer<W>, tag: &str, attrs: &[(&str, &str)]) -> Result<(), ExportError> {
    let mut start = BytesStart::new(tag);
    for attr in attrs {
        start.push_attribute(*attr);
    }
    emit(w, Event::Start(start))
}

fn close<W: Write>(w: &mut Writer<W>, tag: &str) -> Result<(), ExportError> {
    emit(w, Event::End(BytesEnd::new(tag)))
}

fn text_element<W: Write>(w: &mut Writer<W>, tag: &str, text: &str) -> Result<(), ExportError> {
    open(w, tag, &[])?;
    emit(w, Event::Text(BytesText::new(text)))?;
    close(w, tag)
}

fn coordinate_text(coords: &Coordinates) -> String {
    let c = normalize_precision(coords);
    match c.alt {
        Some(alt) => format!("{},{},{}", c.lng, c.lat, alt),
        None => format!("{},{}", c.lng, c.lat),
    }
}

fn extended_data<W: Write>(w: &mut Writer<W>, fields: &WeightedFields) -> Result<(), ExportError> {
    open(w, "ExtendedData", &[])?;
    for (name, value) in fields.iter() {
        open(w, "Data", &[("name", name)])?;
        text_element(w, "value", value)?;
        close(w, "Data")?;
    }
    close(w, "ExtendedData")
}

fn styles<W: Write>(w: &mut Writer<W>) -> Result<(), ExportError> {
    open(w, "Style", &[("id", "site")])?;
    open(w, "IconStyle", &[])?;
    text_element(w, "scale", "1.2")?;
    open(w, "Icon", &[])?;
    text_element(w, "href", SITE_ICON)?;
    close(w, "Icon")?;
    close(w, "IconStyle")?;
    close(w, "Style")?;

    open(w, "Style", &[("id", "link")])?;
    open(w, "LineStyle", &[])?;
    text_element(w, "color", "7fff0000")?;
    text_element(w, "width", "4")?;
    close(w, "LineStyle")?;
    close(w, "Style")
}

fn site_placemark<W: Write>(w: &mut Writer<W>, site: &Site) -> Result<(), ExportError> {
    open(w, "Placemark", &[])?;
    text_element(w, "name", site.id())?;
    text_element(w, "styleUrl", "#site")?;
    extended_data(w, site.fields())?;
    open(w, "Point", &[])?;
    text_element(w, "coordinates", &coordinate_text(&site.coordinates()))?;
    close(w, "Point")?;
    close(w, "Placemark")
}

fn link_placemark<W: Write>(w: &mut Writer<W>, link: &Link) -> Result<(), ExportError> {
    let [a, b] = link.endpoints();
    open(w, "Placemark", &[])?;
    text_element(w, "name", link.id())?;
    text_element(w, "styleUrl", "#link")?;
    extended_data(w, link.fields())?;
    open(w, "LineString", &[])?;
    text_element(
        w,
        "coordinates",
        &format!("{} {}", coordinate_text(&a), coordinate_text(&b)),
    )?;
    close(w, "LineString")?;
    close(w, "Placemark")
}

pub fn write<W: Write>(writer: W, sites: &[&Site], links: &[&Link]) -> Result<(), ExportError> {
    let mut sorted_sites = sites.to_vec();
    sorted_sites.sort_by(|a, b| a.id().cmp(b.id()));

    let mut by_source: BTreeMap<&str, Vec<&Link>> = BTreeMap::new();
    for link in links {
        let source = link.field("data_source").unwrap_or(NO_SOURCE);
        by_source.entry(source).or_default().push(link);
    }

    let mut w = Writer::new_with_indent(writer, b' ', 2);
    emit(&mut w, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    open(&mut w, "kml", &[("xmlns", KML_NS)])?;
    open(&mut w, "Document", &[])?;
    text_element(&mut w, "name", "design_layout.kml")?;
    text_element(&mut w, "open", "1")?;
    styles(&mut w)?;

    open(&mut w, "Folder", &[])?;
    text_element(&mut w, "name", "Sites")?;
    for site in &sorted_sites {
        site_placemark(&mut w, site)?;
    }
    close(&mut w, "Folder")?;

    open(&mut w, "Folder", &[])?;
    text_element(&mut w, "name", "Links")?;
    for (source, mut group) in by_source {
        group.sort_by(|a, b| a.id().cmp(b.id()));
        open(&mut w, "Folder", &[])?;
        text_element(&mut w, "name", source)?;
        for link in group {
            link_placemark(&mut w, link)?;
        }
        close(&mut w, "Folder")?;
    }
    close(&mut w, "Folder")?;

    close(&mut w, "Document")?;
    close(&mut w, "kml")?;
    w.into_inner()
        .flush()
        .map_err(|e| ExportError::Kml(e.to_string()))
}
