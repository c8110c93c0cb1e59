//! Edge-data XML for SUMO's route sampler.

use std::path::Path;

use anyhow::{Context, Result, ensure};
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};

use crate::io::csv::{read_csv, str_column};
use crate::network::RoadNetwork;
use crate::pipeline::{parse_time_slot, slot_vehicle_count};
use crate::types::columns;

/// Writes the edge-data file for one date and time slot: a single interval of
/// `duration` seconds holding one `<edge id entered/>` element per row.
pub fn write_edge_data(
    input: &Path,
    output: &Path,
    date: &str,
    time_slot: &str,
    duration: u32,
) -> Result<usize> {
    let (first, last) = parse_time_slot(time_slot)?;
    let df = read_csv(input)?;

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("data")))?;
    let mut interval = BytesStart::new("interval");
    interval.push_attribute(("begin", "0"));
    interval.push_attribute(("end", duration.to_string().as_str()));
    writer.write_event(Event::Start(interval))?;

    let mut written = 0;
    {
        let dates = str_column(&df, columns::DATE)?;
        let edges = str_column(&df, columns::EDGE_ID)?;
        for (row, (value, edge)) in dates.into_iter().zip(edges).enumerate() {
            if !value.is_some_and(|d| d.contains(date)) {
                continue;
            }
            let edge = edge.context("[pipeline::edge_data] Row without an edge id")?;
            let entered = slot_vehicle_count(&df, row, first, last)?;
            let mut element = BytesStart::new("edge");
            element.push_attribute(("id", edge));
            element.push_attribute(("entered", entered.to_string().as_str()));
            writer.write_event(Event::Empty(element))?;
            written += 1;
        }
    }

    writer.write_event(Event::End(BytesEnd::new("interval")))?;
    writer.write_event(Event::End(BytesEnd::new("data")))?;

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("[pipeline::edge_data] Failed to create {}", parent.display())
        })?;
    }
    std::fs::write(output, writer.into_inner())
        .with_context(|| format!("[pipeline::edge_data] Failed to write {}", output.display()))?;
    Ok(written)
}

/// Copies an edge-data file, adding a `density` attribute (vehicles per meter
/// of edge, `qPKW / length`) to every edge element.
pub fn annotate_edge_density<N: RoadNetwork + ?Sized>(
    input: &Path,
    output: &Path,
    network: &N,
) -> Result<usize> {
    let lengths = network.edge_lengths();

    let mut reader = Reader::from_file(input)
        .with_context(|| format!("[pipeline::edge_data] Failed to open {}", input.display()))?;
    reader.config_mut().trim_text(true);

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut annotated = 0;
    let mut buf = Vec::new();
    loop {
        let event = reader
            .read_event_into(&mut buf)
            .with_context(|| format!("[pipeline::edge_data] XML error in {}", input.display()))?;
        match event {
            Event::Start(e) if e.name().as_ref() == b"edge" => {
                writer.write_event(Event::Start(annotate_element(&e, &lengths)?))?;
                annotated += 1;
            }
            Event::Empty(e) if e.name().as_ref() == b"edge" => {
                writer.write_event(Event::Empty(annotate_element(&e, &lengths)?))?;
                annotated += 1;
            }
            Event::Decl(_) => {}
            Event::Eof => break,
            other => writer.write_event(other.into_owned())?,
        }
        buf.clear();
    }

    std::fs::write(output, writer.into_inner())
        .with_context(|| format!("[pipeline::edge_data] Failed to write {}", output.display()))?;
    Ok(annotated)
}

fn annotate_element(
    element: &BytesStart<'_>,
    lengths: &ahash::AHashMap<String, f64>,
) -> Result<BytesStart<'static>> {
    let mut id = None;
    let mut count = None;
    let mut out = BytesStart::new("edge");
    for attribute in element.attributes() {
        let attribute = attribute.context("[pipeline::edge_data] Malformed XML attribute")?;
        let value = attribute
            .unescape_value()
            .context("[pipeline::edge_data] Malformed XML attribute value")?
            .into_owned();
        match attribute.key.as_ref() {
            b"id" => id = Some(value.clone()),
            b"qPKW" => count = Some(value.clone()),
            _ => {}
        }
        out.push_attribute((
            String::from_utf8_lossy(attribute.key.as_ref()).into_owned().as_str(),
            value.as_str(),
        ));
    }

    let id = id.context("[pipeline::edge_data] Edge element without an id")?;
    let count = count.with_context(|| format!("[pipeline::edge_data] Edge {id} has no qPKW"))?;
    let count: f64 = count
        .parse()
        .with_context(|| format!("[pipeline::edge_data] Invalid qPKW {count:?} on edge {id}"))?;
    let length = lengths
        .get(&id)
        .with_context(|| format!("[pipeline::edge_data] Network has no edge {id}"))?;
    ensure!(*length > 0.0, "[pipeline::edge_data] Edge {id} has zero length");

    out.push_attribute(("density", (count / length).to_string().as_str()));
    Ok(out)
}
