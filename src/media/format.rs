//! Media format classifier: closed extension to MIME/category table.

use std::path::Path;

use crate::media::category::ContentCategory;

/// Recognized media file formats.
///
/// Classification is by extension only; anything not in this table is not
/// media as far as the catalog is concerned. Every format maps to exactly
/// one category and one MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaFormat {
    Avi,
    Flv,
    M4v,
    Mkv,
    Mov,
    Mp4,
    Mpeg,
    Mpg,
    Ogm,
    Ogv,
    Wmv,
    Gif,
    Jpeg,
    Jpg,
    Png,
    Aac,
    Ac3,
    Flac,
    M4a,
    Mp3,
    Oga,
    Ogg,
    Wav,
    Wma,
}

impl MediaFormat {
    /// (extension, MIME type, category) for this format.
    fn table(&self) -> (&'static str, &'static str, ContentCategory) {
        use ContentCategory::*;
        match self {
            MediaFormat::Avi => ("avi", "video/avi", Video),
            MediaFormat::Flv => ("flv", "video/x-flv", Video),
            MediaFormat::M4v => ("m4v", "video/mp4", Video),
            MediaFormat::Mkv => ("mkv", "video/x-matroska", Video),
            MediaFormat::Mov => ("mov", "video/quicktime", Video),
            MediaFormat::Mp4 => ("mp4", "video/mp4", Video),
            MediaFormat::Mpeg => ("mpeg", "video/mpeg", Video),
            MediaFormat::Mpg => ("mpg", "video/mpeg", Video),
            MediaFormat::Ogm => ("ogm", "video/ogg", Video),
            MediaFormat::Ogv => ("ogv", "video/ogg", Video),
            MediaFormat::Wmv => ("wmv", "video/x-ms-wmv", Video),
            MediaFormat::Gif => ("gif", "image/gif", Image),
            MediaFormat::Jpeg => ("jpeg", "image/jpeg", Image),
            MediaFormat::Jpg => ("jpg", "image/jpeg", Image),
            MediaFormat::Png => ("png", "image/png", Image),
            MediaFormat::Aac => ("aac", "audio/aac", Audio),
            MediaFormat::Ac3 => ("ac3", "audio/ac3", Audio),
            MediaFormat::Flac => ("flac", "audio/flac", Audio),
            MediaFormat::M4a => ("m4a", "audio/mp4", Audio),
            MediaFormat::Mp3 => ("mp3", "audio/mpeg", Audio),
            MediaFormat::Oga => ("oga", "audio/ogg", Audio),
            MediaFormat::Ogg => ("ogg", "audio/ogg", Audio),
            MediaFormat::Wav => ("wav", "audio/wav", Audio),
            MediaFormat::Wma => ("wma", "audio/x-ms-wma", Audio),
        }
    }

    /// All recognized formats.
    pub const ALL: [MediaFormat; 24] = [
        MediaFormat::Avi,
        MediaFormat::Flv,
        MediaFormat::M4v,
        MediaFormat::Mkv,
        MediaFormat::Mov,
        MediaFormat::Mp4,
        MediaFormat::Mpeg,
        MediaFormat::Mpg,
        MediaFormat::Ogm,
        MediaFormat::Ogv,
        MediaFormat::Wmv,
        MediaFormat::Gif,
        MediaFormat::Jpeg,
        MediaFormat::Jpg,
        MediaFormat::Png,
        MediaFormat::Aac,
        MediaFormat::Ac3,
        MediaFormat::Flac,
        MediaFormat::M4a,
        MediaFormat::Mp3,
        MediaFormat::Oga,
        MediaFormat::Ogg,
        MediaFormat::Wav,
        MediaFormat::Wma,
    ];

    /// Classify a path by its extension.
    pub fn identify(path: &Path) -> Option<MediaFormat> {
        let ext = path.extension()?.to_str()?;
        MediaFormat::from_extension(ext)
    }

    /// Classify a bare file name by its extension.
    pub fn identify_name(name: &str) -> Option<MediaFormat> {
        let (_, ext) = name.rsplit_once('.')?;
        MediaFormat::from_extension(ext)
    }

    /// Look up a format by extension, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<MediaFormat> {
        let ext = ext.to_ascii_lowercase();
        MediaFormat::ALL
            .iter()
            .copied()
            .find(|f| f.extension() == ext)
    }

    pub fn extension(&self) -> &'static str {
        self.table().0
    }

    pub fn mime(&self) -> &'static str {
        self.table().1
    }

    pub fn category(&self) -> ContentCategory {
        self.table().2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_identify_by_extension() {
        let path = PathBuf::from("/media/films/film.mkv");
        let format = MediaFormat::identify(&path).unwrap();
        assert_eq!(format, MediaFormat::Mkv);
        assert_eq!(format.mime(), "video/x-matroska");
        assert_eq!(format.category(), ContentCategory::Video);
    }

    #[test]
    fn test_identify_is_case_insensitive() {
        let path = PathBuf::from("/media/film.MKV");
        assert_eq!(MediaFormat::identify(&path), Some(MediaFormat::Mkv));
    }

    #[test]
    fn test_unrecognized_extension_is_not_media() {
        assert_eq!(MediaFormat::identify(Path::new("/media/film.srt")), None);
        assert_eq!(MediaFormat::identify(Path::new("/media/notes.txt")), None);
        assert_eq!(MediaFormat::identify(Path::new("/media/no_extension")), None);
    }

    #[test]
    fn test_identify_name_matches_identify() {
        for format in MediaFormat::ALL {
            let name = format!("sample.{}", format.extension());
            assert_eq!(MediaFormat::identify_name(&name), Some(format));
            assert_eq!(MediaFormat::identify(Path::new(&name)), Some(format));
        }
    }

    #[test]
    fn test_every_extension_is_unique() {
        let mut exts: Vec<&str> = MediaFormat::ALL.iter().map(|f| f.extension()).collect();
        exts.sort();
        let before = exts.len();
        exts.dedup();
        assert_eq!(before, exts.len());
    }

    #[test]
    fn test_categories_cover_all_three() {
        let mut seen: Vec<ContentCategory> = MediaFormat::ALL.iter().map(|f| f.category()).collect();
        seen.sort_by_key(|c| c.container_id());
        seen.dedup();
        assert_eq!(seen.len(), 3);
    }
}
