//! Tag metadata extraction behind a pluggable reader seam.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::catalog::node::ItemMetadata;
use crate::media::format::MediaFormat;

/// Reads optional tag metadata for a media file.
///
/// Lookup failure is not an error; it is simply no metadata.
pub trait MetadataReader: Send + Sync {
    fn read(&self, file: &Path) -> Option<ItemMetadata>;
}

/// Default reader: the 128-byte ID3v1 trailer of MP3 files. Other audio
/// formats report no metadata.
pub struct Id3v1Reader;

impl MetadataReader for Id3v1Reader {
    fn read(&self, file: &Path) -> Option<ItemMetadata> {
        if MediaFormat::identify(file) != Some(MediaFormat::Mp3) {
            return None;
        }
        let mut f = File::open(file).ok()?;
        if f.metadata().ok()?.len() < 128 {
            return None;
        }
        f.seek(SeekFrom::End(-128)).ok()?;
        let mut trailer = [0u8; 128];
        f.read_exact(&mut trailer).ok()?;
        if &trailer[0..3] != b"TAG" {
            return None;
        }

        let artist = text_field(&trailer[33..63]);
        let album = text_field(&trailer[63..93]);
        if artist.is_none() && album.is_none() {
            return None;
        }
        Some(ItemMetadata { artist, album })
    }
}

/// ID3v1 fields are fixed-width, null- or space-padded.
fn text_field(bytes: &[u8]) -> Option<String> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let text = String::from_utf8_lossy(&bytes[..end]).trim().to_string();
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn mp3_with_trailer(dir: &Path, name: &str, artist: &str, album: &str) -> std::path::PathBuf {
        let mut trailer = [0u8; 128];
        trailer[0..3].copy_from_slice(b"TAG");
        trailer[33..33 + artist.len()].copy_from_slice(artist.as_bytes());
        trailer[63..63 + album.len()].copy_from_slice(album.as_bytes());

        let path = dir.join(name);
        let mut content = vec![0u8; 64];
        content.extend_from_slice(&trailer);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_reads_artist_and_album_from_trailer() {
        let tmp = TempDir::new().unwrap();
        let path = mp3_with_trailer(tmp.path(), "track.mp3", "Some Artist", "Some Album");

        let meta = Id3v1Reader.read(&path).unwrap();
        assert_eq!(meta.artist.as_deref(), Some("Some Artist"));
        assert_eq!(meta.album.as_deref(), Some("Some Album"));
    }

    #[test]
    fn test_file_without_trailer_has_no_metadata() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("track.mp3");
        std::fs::write(&path, vec![0u8; 256]).unwrap();

        assert!(Id3v1Reader.read(&path).is_none());
    }

    #[test]
    fn test_short_file_has_no_metadata() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("track.mp3");
        std::fs::write(&path, b"tiny").unwrap();

        assert!(Id3v1Reader.read(&path).is_none());
    }

    #[test]
    fn test_non_mp3_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let path = mp3_with_trailer(tmp.path(), "track.flac", "Artist", "Album");

        assert!(Id3v1Reader.read(&path).is_none());
    }

    #[test]
    fn test_empty_fields_mean_no_metadata() {
        let tmp = TempDir::new().unwrap();
        let path = mp3_with_trailer(tmp.path(), "track.mp3", "", "");

        assert!(Id3v1Reader.read(&path).is_none());
    }
}
