use crate::model::Category;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use lofty::config::ParseOptions;
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::ItemKey;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::trace;

// EXIF lives near the start of the file; 64 KiB covers APP1 in practice.
const EXIF_SCAN_LIMIT: usize = 64 * 1024;

const TAG_EXIF_IFD: u16 = 0x8769;
const TAG_DATETIME_ORIGINAL: u16 = 0x9003;

/// Best-effort creation date for a file. Images get an EXIF scan for
/// DateTimeOriginal; audio and video containers go through lofty, which
/// covers ID3 TDRC and the MP4 `©day` atom. Returns `None` on any failure.
pub fn creation_date(
    path: &Path,
    category: Category,
    extension: Option<&str>,
) -> Option<DateTime<Utc>> {
    let result = match category {
        Category::Images => match extension {
            Some("jpg") | Some("jpeg") | Some("tif") | Some("tiff") => {
                exif_datetime_original(path)
            }
            _ => None,
        },
        Category::Audio | Category::Video => tagged_recording_date(path),
        _ => None,
    };
    if result.is_none() {
        trace!("No embedded creation date for {}", path.display());
    }
    result
}

fn tagged_recording_date(path: &Path) -> Option<DateTime<Utc>> {
    let tagged_file = Probe::open(path)
        .ok()?
        .options(ParseOptions::new())
        .read()
        .ok()?;
    let tag = tagged_file.primary_tag().or_else(|| tagged_file.first_tag())?;
    let raw = tag
        .get_string(&ItemKey::RecordingDate)
        .or_else(|| tag.get_string(&ItemKey::OriginalReleaseDate))
        .or_else(|| tag.get_string(&ItemKey::Year))?;
    parse_flexible_date(raw)
}

fn exif_datetime_original(path: &Path) -> Option<DateTime<Utc>> {
    let mut file = File::open(path).ok()?;
    let mut buffer = vec![0u8; EXIF_SCAN_LIMIT];
    let bytes_read = file.read(&mut buffer).ok()?;
    buffer.truncate(bytes_read);

    let tiff = locate_tiff(&buffer)?;
    let value = datetime_original_from_tiff(tiff)?;
    parse_exif_datetime(&value)
}

/// Find the TIFF block: either the file itself (TIFF images) or the payload
/// of a JPEG APP1 "Exif" segment.
fn locate_tiff(data: &[u8]) -> Option<&[u8]> {
    if data.starts_with(b"II") || data.starts_with(b"MM") {
        return Some(data);
    }
    if !data.starts_with(&[0xFF, 0xD8]) {
        return None;
    }
    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        if (0xD0..=0xD9).contains(&marker) {
            pos += 2;
            continue;
        }
        if marker == 0xDA {
            // start of scan, nothing left to find
            return None;
        }
        let length = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        if length < 2 || pos + 2 + length > data.len() {
            return None;
        }
        if marker == 0xE1 && data[pos + 4..].starts_with(b"Exif\0\0") {
            return Some(&data[pos + 10..pos + 2 + length]);
        }
        pos += 2 + length;
    }
    None
}

/// Walk IFD0 to the Exif sub-IFD and read tag 0x9003 (DateTimeOriginal).
fn datetime_original_from_tiff(tiff: &[u8]) -> Option<String> {
    let big_endian = match tiff.get(0..2)? {
        b"MM" => true,
        b"II" => false,
        _ => return None,
    };
    if read_u16(tiff, 2, big_endian)? != 42 {
        return None;
    }

    let ifd0 = read_u32(tiff, 4, big_endian)? as usize;
    let exif_ifd_entry = find_ifd_entry(tiff, ifd0, TAG_EXIF_IFD, big_endian)?;
    let exif_ifd = read_u32(tiff, exif_ifd_entry + 8, big_endian)? as usize;

    let entry = find_ifd_entry(tiff, exif_ifd, TAG_DATETIME_ORIGINAL, big_endian)?;
    let kind = read_u16(tiff, entry + 2, big_endian)?;
    if kind != 2 {
        // not ASCII
        return None;
    }
    let count = read_u32(tiff, entry + 4, big_endian)? as usize;
    let bytes = if count <= 4 {
        tiff.get(entry + 8..entry + 8 + count)?
    } else {
        let offset = read_u32(tiff, entry + 8, big_endian)? as usize;
        tiff.get(offset..offset + count)?
    };
    Some(
        String::from_utf8_lossy(bytes)
            .trim_end_matches('\0')
            .trim()
            .to_string(),
    )
}

fn find_ifd_entry(tiff: &[u8], ifd_offset: usize, tag: u16, big_endian: bool) -> Option<usize> {
    let entry_count = read_u16(tiff, ifd_offset, big_endian)? as usize;
    for i in 0..entry_count {
        let entry = ifd_offset + 2 + i * 12;
        if read_u16(tiff, entry, big_endian)? == tag {
            return Some(entry);
        }
    }
    None
}

fn read_u16(data: &[u8], offset: usize, big_endian: bool) -> Option<u16> {
    let bytes = data.get(offset..offset + 2)?;
    Some(if big_endian {
        u16::from_be_bytes([bytes[0], bytes[1]])
    } else {
        u16::from_le_bytes([bytes[0], bytes[1]])
    })
}

fn read_u32(data: &[u8], offset: usize, big_endian: bool) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(if big_endian {
        u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    } else {
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    })
}

fn parse_exif_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw, "%Y:%m:%d %H:%M:%S").ok()?;
    Some(Utc.from_utc_datetime(&naive))
}

/// Tag dates come in many shapes: full timestamps, plain dates, bare years.
fn parse_flexible_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    if raw.len() >= 4 {
        if let Ok(year) = raw[..4].parse::<i32>() {
            let date = NaiveDate::from_ymd_opt(year, 1, 1)?;
            return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use std::io::Write;

    /// Minimal JPEG with a little-endian EXIF APP1 segment carrying only
    /// DateTimeOriginal.
    fn minimal_exif_jpeg(datetime: &str) -> Vec<u8> {
        assert_eq!(datetime.len(), 19);

        let mut tiff: Vec<u8> = Vec::new();
        tiff.extend_from_slice(b"II");
        tiff.extend_from_slice(&42u16.to_le_bytes());
        tiff.extend_from_slice(&8u32.to_le_bytes()); // IFD0 offset

        // IFD0: one entry pointing at the Exif sub-IFD (offset 26)
        tiff.extend_from_slice(&1u16.to_le_bytes());
        tiff.extend_from_slice(&TAG_EXIF_IFD.to_le_bytes());
        tiff.extend_from_slice(&4u16.to_le_bytes()); // LONG
        tiff.extend_from_slice(&1u32.to_le_bytes());
        tiff.extend_from_slice(&26u32.to_le_bytes());
        tiff.extend_from_slice(&0u32.to_le_bytes()); // next IFD

        // Exif IFD at 26: one ASCII entry, value at offset 44
        tiff.extend_from_slice(&1u16.to_le_bytes());
        tiff.extend_from_slice(&TAG_DATETIME_ORIGINAL.to_le_bytes());
        tiff.extend_from_slice(&2u16.to_le_bytes()); // ASCII
        tiff.extend_from_slice(&20u32.to_le_bytes());
        tiff.extend_from_slice(&44u32.to_le_bytes());
        tiff.extend_from_slice(&0u32.to_le_bytes()); // next IFD

        assert_eq!(tiff.len(), 44);
        tiff.extend_from_slice(datetime.as_bytes());
        tiff.push(0);

        let payload_len = (b"Exif\0\0".len() + tiff.len() + 2) as u16;
        let mut jpeg: Vec<u8> = vec![0xFF, 0xD8, 0xFF, 0xE1];
        jpeg.extend_from_slice(&payload_len.to_be_bytes());
        jpeg.extend_from_slice(b"Exif\0\0");
        jpeg.extend_from_slice(&tiff);
        jpeg.extend_from_slice(&[0xFF, 0xD9]);
        jpeg
    }

    #[test]
    fn test_exif_datetime_original_extracted() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("photo.jpg");
        let mut file = File::create(&path).unwrap();
        file.write_all(&minimal_exif_jpeg("2023:05:01 10:20:30"))
            .unwrap();

        let date = exif_datetime_original(&path).unwrap();
        assert_eq!(date.year(), 2023);
        assert_eq!(date.month(), 5);
        assert_eq!(date.day(), 1);
    }

    #[test]
    fn test_exif_missing_returns_none() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("not-a-photo.jpg");
        std::fs::write(&path, "plain text pretending to be a jpeg").unwrap();
        assert!(exif_datetime_original(&path).is_none());
    }

    #[test]
    fn test_parse_flexible_date_shapes() {
        assert_eq!(
            parse_flexible_date("2021-07-15T08:30:00").unwrap().year(),
            2021
        );
        assert_eq!(parse_flexible_date("2021-07-15").unwrap().month(), 7);
        assert_eq!(parse_flexible_date("1999").unwrap().year(), 1999);
        assert!(parse_flexible_date("last tuesday").is_none());
    }

    #[test]
    fn test_creation_date_falls_back_silently() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("song.mp3");
        std::fs::write(&path, "not really audio").unwrap();
        assert!(creation_date(&path, Category::Audio, Some("mp3")).is_none());
        assert!(creation_date(&path, Category::Documents, Some("txt")).is_none());
    }
}
