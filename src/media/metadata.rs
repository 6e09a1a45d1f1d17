/// EXIF metadata relevant to walks: where and when a photo was taken
use chrono::NaiveDateTime;
use exif::{Exif, In, Rational, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoMetadata {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Capture time in milliseconds since the Unix epoch (camera clock, read as UTC)
    pub timestamp_ms: Option<i64>,
    pub description: Option<String>,
}

/// Read position, capture time and caption from a photo
///
/// A file without EXIF data is not an error; it just has no metadata.
pub fn read_metadata(path: &Path) -> Result<PhotoMetadata> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let exif = match Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return Ok(PhotoMetadata::default()),
        Err(e) => return Err(e.into()),
    };

    Ok(PhotoMetadata {
        latitude: gps_coordinate(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef),
        longitude: gps_coordinate(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef),
        timestamp_ms: ascii_field(&exif, Tag::DateTimeOriginal)
            .or_else(|| ascii_field(&exif, Tag::DateTime))
            .and_then(|text| parse_exif_datetime(&text)),
        description: ascii_field(&exif, Tag::ImageDescription),
    })
}

fn gps_coordinate(exif: &Exif, tag: Tag, reference_tag: Tag) -> Option<f64> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let Value::Rational(ref values) = field.value else {
        return None;
    };
    let reference = ascii_field(exif, reference_tag).unwrap_or_default();
    dms_to_decimal(values, &reference)
}

/// Degrees/minutes/seconds to signed decimal degrees
///
/// South and West references give negative values.
pub fn dms_to_decimal(values: &[Rational], reference: &str) -> Option<f64> {
    let mut parts = values.iter().map(|r| {
        if r.denom == 0 {
            0.0
        } else {
            r.to_f64()
        }
    });
    let degrees = parts.next()?;
    let minutes = parts.next().unwrap_or(0.0);
    let seconds = parts.next().unwrap_or(0.0);
    let decimal = degrees + minutes / 60.0 + seconds / 3600.0;

    match reference.trim().to_ascii_uppercase().as_str() {
        "S" | "W" => Some(-decimal),
        _ => Some(decimal),
    }
}

/// EXIF dates look like "2024:05:01 12:30:00"
pub fn parse_exif_datetime(text: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(text.trim(), "%Y:%m:%d %H:%M:%S")
        .ok()
        .map(|date| date.and_utc().timestamp_millis())
}

fn ascii_field(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let Value::Ascii(ref lines) = field.value else {
        return None;
    };
    let text = lines
        .first()
        .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())?;
    (!text.is_empty()).then_some(text)
}
