//! Detector exports and the external detector-mapping step.

use std::path::Path;
use std::process::Command;

use ahash::AHashSet;
use anyhow::{Context, Result, ensure};
use polars::{frame::DataFrame, prelude::{NamedFrom, Series}};
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};

use crate::io::csv::{read_csv, str_column, write_csv};
use crate::types::{GeoPoint, columns};

/// Writes the detector coordinate file (`id;lat;lon`), one row per distinct
/// geopoint in row order.
pub fn write_detector_coordinates(input: &Path, output: &Path) -> Result<usize> {
    let df = read_csv(input)?;
    let ids = str_column(&df, columns::SENSOR_ID)?;
    let points = str_column(&df, columns::GEOPOINT)?;

    let mut seen: AHashSet<String> = AHashSet::new();
    let mut out_ids = Vec::new();
    let mut lats = Vec::new();
    let mut lons = Vec::new();
    for (id, raw) in ids.into_iter().zip(points) {
        let (Some(id), Some(raw)) = (id, raw) else { continue };
        if !seen.insert(raw.to_string()) {
            continue;
        }
        let point = GeoPoint::parse(raw)?;
        out_ids.push(id.to_string());
        lats.push(point.lat);
        lons.push(point.lon);
    }

    let mut out = DataFrame::new(vec![
        Series::new("id".into(), out_ids).into(),
        Series::new("lat".into(), lats).into(),
        Series::new("lon".into(), lons).into(),
    ])?;
    write_csv(&mut out, output)?;
    Ok(out.height())
}

/// Writes the induction-loop file (`id;roadname;lat;lon`), one row per
/// distinct (road name, sensor id, geopoint) triplet.
pub fn write_induction_loops(input: &Path, output: &Path) -> Result<usize> {
    let df = read_csv(input)?;
    let names = str_column(&df, columns::ROAD_NAME)?;
    let ids = str_column(&df, columns::SENSOR_ID)?;
    let points = str_column(&df, columns::GEOPOINT)?;

    let mut seen: AHashSet<(String, String, String)> = AHashSet::new();
    let mut out_ids = Vec::new();
    let mut out_names = Vec::new();
    let mut lats = Vec::new();
    let mut lons = Vec::new();
    for ((name, id), raw) in names.into_iter().zip(ids).zip(points) {
        let (Some(name), Some(id), Some(raw)) = (name, id, raw) else { continue };
        if !seen.insert((name.to_string(), id.to_string(), raw.to_string())) {
            continue;
        }
        let point = GeoPoint::parse(raw)?;
        out_ids.push(id.to_string());
        out_names.push(name.to_string());
        lats.push(point.lat);
        lons.push(point.lon);
    }

    let mut out = DataFrame::new(vec![
        Series::new("id".into(), out_ids).into(),
        Series::new("roadname".into(), out_names).into(),
        Series::new("lat".into(), lats).into(),
        Series::new("lon".into(), lons).into(),
    ])?;
    write_csv(&mut out, output)?;
    Ok(out.height())
}

/// Runs SUMO's `mapDetectors.py` over the coordinate file, then deduplicates
/// the generated detector definitions.
///
/// A failing script is not fatal by itself (its stderr is reported), but a
/// missing output artifact is: downstream steps would otherwise fail later
/// with a far less useful message.
pub fn map_detectors(
    python: &str,
    script: &Path,
    net: &Path,
    coordinates: &Path,
    det_output: &Path,
    output: &Path,
    verbose: u8,
) -> Result<()> {
    let result = Command::new(python)
        .arg(script)
        .arg("-n")
        .arg(net)
        .arg("-d")
        .arg(coordinates)
        .arg("--det-output-file")
        .arg(det_output)
        .arg("-o")
        .arg(output)
        .output()
        .with_context(|| format!("[pipeline::detectors] Failed to run {python}"))?;

    if verbose > 0 && !result.stdout.is_empty() {
        eprintln!(
            "[pipeline::detectors] mapDetectors: {}",
            String::from_utf8_lossy(&result.stdout).trim_end()
        );
    }
    if !result.status.success() {
        eprintln!(
            "[pipeline::detectors] mapDetectors failed ({}): {}",
            result.status,
            String::from_utf8_lossy(&result.stderr).trim_end()
        );
    }
    ensure!(
        output.exists(),
        "[pipeline::detectors] mapDetectors produced no output at {}",
        output.display()
    );

    dedupe_detectors(output)
}

/// Rewrites a detector file keeping one definition per (lane, pos) pair and
/// marking every detector `friendlyPos` so positions past the lane end clamp
/// instead of erroring inside SUMO.
pub(crate) fn dedupe_detectors(path: &Path) -> Result<()> {
    let mut reader = Reader::from_file(path)
        .with_context(|| format!("[pipeline::detectors] Failed to open {}", path.display()))?;
    reader.config_mut().trim_text(true);

    // The root element keeps its name and attributes (the generating script
    // writes schema attributes on it); only the children are rewritten.
    let mut root: Option<(String, Vec<(String, String)>)> = None;
    let mut elements: Vec<(String, Vec<(String, String)>)> = Vec::new();

    let mut buf = Vec::new();
    loop {
        match reader
            .read_event_into(&mut buf)
            .with_context(|| format!("[pipeline::detectors] XML error in {}", path.display()))?
        {
            Event::Start(e) if root.is_none() => {
                root = Some((
                    String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                    copy_attributes(&e)?,
                ));
            }
            Event::Start(e) | Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                elements.push((name, copy_attributes(&e)?));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    let (root, root_attributes) =
        root.context("[pipeline::detectors] Detector file has no root element")?;

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    let mut open = BytesStart::new(root.as_str());
    for (key, value) in &root_attributes {
        open.push_attribute((key.as_str(), value.as_str()));
    }
    writer.write_event(Event::Start(open))?;

    let mut seen: AHashSet<(String, String)> = AHashSet::new();
    for (name, attributes) in elements {
        let lane = attributes.iter().find(|(k, _)| k == "lane").map(|(_, v)| v.clone());
        let pos = attributes.iter().find(|(k, _)| k == "pos").map(|(_, v)| v.clone());
        if let (Some(lane), Some(pos)) = (lane, pos) {
            if !seen.insert((lane, pos)) {
                continue;
            }
        }
        let mut element = BytesStart::new(name.as_str());
        for (key, value) in &attributes {
            if key != "friendlyPos" {
                element.push_attribute((key.as_str(), value.as_str()));
            }
        }
        element.push_attribute(("friendlyPos", "true"));
        writer.write_event(Event::Empty(element))?;
    }

    writer.write_event(Event::End(BytesEnd::new(root.as_str())))?;
    std::fs::write(path, writer.into_inner())
        .with_context(|| format!("[pipeline::detectors] Failed to rewrite {}", path.display()))
}

fn copy_attributes(element: &BytesStart<'_>) -> Result<Vec<(String, String)>> {
    let mut attributes = Vec::new();
    for attribute in element.attributes() {
        let attribute = attribute.context("[pipeline::detectors] Malformed XML attribute")?;
        attributes.push((
            String::from_utf8_lossy(attribute.key.as_ref()).into_owned(),
            attribute
                .unescape_value()
                .context("[pipeline::detectors] Malformed XML attribute value")?
                .into_owned(),
        ));
    }
    Ok(attributes)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn dedupes_by_lane_and_pos_and_sets_friendly_pos() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"<?xml version="1.0" encoding="utf-8"?>
<additional>
  <inductionLoop id="det0" lane="E1_0" pos="5.2" file="out.xml"/>
  <inductionLoop id="det1" lane="E1_0" pos="5.2" file="out.xml"/>
  <inductionLoop id="det2" lane="E2_0" pos="1.0" file="out.xml"/>
</additional>"#
        )
        .unwrap();

        dedupe_detectors(file.path()).unwrap();
        let rewritten = std::fs::read_to_string(file.path()).unwrap();
        assert!(rewritten.contains("det0"));
        assert!(!rewritten.contains("det1"));
        assert!(rewritten.contains("det2"));
        assert_eq!(rewritten.matches("friendlyPos=\"true\"").count(), 2);
    }

    #[test]
    fn root_element_attributes_survive_the_rewrite() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"<additional xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:noNamespaceSchemaLocation="http://sumo.dlr.de/xsd/additional_file.xsd">
  <inductionLoop id="det0" lane="E1_0" pos="5.2" file="out.xml"/>
</additional>"#
        )
        .unwrap();

        dedupe_detectors(file.path()).unwrap();
        let rewritten = std::fs::read_to_string(file.path()).unwrap();
        assert!(rewritten.contains(
            "<additional xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" \
             xsi:noNamespaceSchemaLocation=\"http://sumo.dlr.de/xsd/additional_file.xsd\">"
        ));
        assert!(rewritten.contains("det0"));
    }
}
