//! Render lidar CSV files as KML point previews.
//!
//! Only a decimated subset of the points is written so the preview stays small
//! enough for Google Earth.

use crate::types::{SummaryError, SummaryResult};
use csv::{ReaderBuilder, StringRecord, Trim};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";
const POINT_ICON: &str = "http://maps.google.com/mapfiles/kml/shapes/placemark_circle.png";
const STYLE_ID: &str = "lidar_point";

/// Zero-based CSV columns holding a lidar point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LidarCsvFormat {
    pub lon: usize,
    pub lat: usize,
    pub height: usize,
}

impl LidarCsvFormat {
    /// LVIS: longitude, latitude and elevation in columns 4, 5 and 6
    pub const LVIS: LidarCsvFormat = LidarCsvFormat {
        lon: 3,
        lat: 4,
        height: 5,
    };

    /// ATM and converted files: latitude, longitude, height
    pub const ATM: LidarCsvFormat = LidarCsvFormat {
        lon: 1,
        lat: 0,
        height: 2,
    };

    /// Guess the column layout from the lidar file name
    pub fn for_file(path: &Path) -> Self {
        let is_lvis = path
            .file_name()
            .map_or(false, |name| name.to_string_lossy().contains("ILVIS2"));
        if is_lvis {
            Self::LVIS
        } else {
            Self::ATM
        }
    }
}

/// Single lidar return
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LidarPoint {
    pub lon: f64,
    pub lat: f64,
    pub height: f64,
}

/// KML `aabbggrr` colour string for a colour name
pub fn kml_color(name: &str) -> SummaryResult<&'static str> {
    let color = match name.to_lowercase().as_str() {
        "red" => "ff0000ff",
        "green" => "ff00ff00",
        "blue" => "ffff0000",
        "yellow" => "ff00ffff",
        "white" => "ffffffff",
        "black" => "ff000000",
        "orange" => "ff00a5ff",
        "purple" => "ff800080",
        _ => {
            return Err(SummaryError::InvalidFormat(format!(
                "Unknown KML colour: {}",
                name
            )))
        }
    };
    Ok(color)
}

/// Read every `skip`-th point of a lidar CSV file.
///
/// Comment lines and rows without numbers in the expected columns are skipped.
pub fn read_points<R: Read>(
    reader: R,
    format: LidarCsvFormat,
    skip: usize,
) -> SummaryResult<Vec<LidarPoint>> {
    let skip = skip.max(1);
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut points = Vec::new();
    let mut index = 0usize;

    for result in csv_reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                log::debug!("Skipping unreadable lidar row: {}", e);
                continue;
            }
        };
        let point = match parse_point(&record, format) {
            Some(point) => point,
            None => continue,
        };
        if index % skip == 0 {
            points.push(point);
        }
        index += 1;
    }

    Ok(points)
}

fn parse_point(record: &StringRecord, format: LidarCsvFormat) -> Option<LidarPoint> {
    let field = |i: usize| record.get(i).and_then(|v| v.parse::<f64>().ok());

    Some(LidarPoint {
        lon: field(format.lon)?,
        lat: field(format.lat)?,
        height: field(format.height)?,
    })
}

/// Write points as a KML document with one shared icon style
pub fn write_kml<W: Write>(
    inner: W,
    name: &str,
    points: &[LidarPoint],
    color: &str,
) -> SummaryResult<()> {
    let color = kml_color(color)?;
    let mut writer = Writer::new_with_indent(inner, b' ', 2);

    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    emit(
        &mut writer,
        Event::Start(BytesStart::new("kml").with_attributes([("xmlns", KML_NAMESPACE)])),
    )?;
    emit(&mut writer, Event::Start(BytesStart::new("Document")))?;
    text_element(&mut writer, "name", name)?;

    emit(
        &mut writer,
        Event::Start(BytesStart::new("Style").with_attributes([("id", STYLE_ID)])),
    )?;
    emit(&mut writer, Event::Start(BytesStart::new("IconStyle")))?;
    text_element(&mut writer, "color", color)?;
    text_element(&mut writer, "scale", "0.5")?;
    emit(&mut writer, Event::Start(BytesStart::new("Icon")))?;
    text_element(&mut writer, "href", POINT_ICON)?;
    emit(&mut writer, Event::End(BytesEnd::new("Icon")))?;
    emit(&mut writer, Event::End(BytesEnd::new("IconStyle")))?;
    emit(&mut writer, Event::End(BytesEnd::new("Style")))?;

    let style_url = format!("#{}", STYLE_ID);
    for point in points {
        emit(&mut writer, Event::Start(BytesStart::new("Placemark")))?;
        text_element(&mut writer, "styleUrl", &style_url)?;
        emit(&mut writer, Event::Start(BytesStart::new("Point")))?;
        text_element(&mut writer, "altitudeMode", "absolute")?;
        let coords = format!("{},{},{}", point.lon, point.lat, point.height);
        text_element(&mut writer, "coordinates", &coords)?;
        emit(&mut writer, Event::End(BytesEnd::new("Point")))?;
        emit(&mut writer, Event::End(BytesEnd::new("Placemark")))?;
    }

    emit(&mut writer, Event::End(BytesEnd::new("Document")))?;
    emit(&mut writer, Event::End(BytesEnd::new("kml")))?;
    writer.into_inner().flush()?;
    Ok(())
}

/// Convert a lidar CSV file into a KML preview.
///
/// The KML is written next to `output` and renamed into place once complete,
/// so a failed conversion never leaves a partial preview behind.
pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    skip: usize,
    color: &str,
) -> SummaryResult<usize> {
    let input = input.as_ref();
    let output = output.as_ref();
    log::info!("Converting lidar file {} to {}", input.display(), output.display());

    let file = File::open(input).map_err(|e| {
        SummaryError::Processing(format!("Cannot open lidar file {}: {}", input.display(), e))
    })?;
    let points = read_points(BufReader::new(file), LidarCsvFormat::for_file(input), skip)?;

    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let folder = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staging = NamedTempFile::new_in(folder)?;
    write_kml(BufWriter::new(staging.as_file_mut()), &name, &points, color)?;
    staging.persist(output).map_err(|e| e.error)?;

    log::debug!("Wrote {} lidar points to {}", points.len(), output.display());
    Ok(points.len())
}

fn emit<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> SummaryResult<()> {
    writer
        .write_event(event)
        .map_err(|e| SummaryError::Xml(e.to_string()))
}

fn text_element<W: Write>(writer: &mut Writer<W>, tag: &str, text: &str) -> SummaryResult<()> {
    emit(writer, Event::Start(BytesStart::new(tag)))?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    emit(writer, Event::End(BytesEnd::new(tag)))
}
