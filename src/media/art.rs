//! Cover-art discovery for media files and directories.

use std::path::{Path, PathBuf};

/// Well-known art base names, in preference order.
const ART_BASENAMES: [&str; 5] = ["cover", "folder", "albumart", "album", "front"];

/// Extensions accepted as art candidates. Wider than the catalog's image
/// formats; the indexer re-classifies whatever is returned and warns when
/// the type is unsupported.
const ART_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Find the best cover-art candidate for a media file or a directory.
///
/// For a file, a sibling image sharing the file's base name wins; after
/// that, well-known names ("cover.jpg" and friends) in the same directory.
/// For a directory, only the well-known names apply. Ties break on the
/// lower-cased file name so the result is stable across directory listing
/// order. The media file itself is never a candidate. Best-effort: any I/O
/// failure means no art.
pub fn find_cover_art(media_path: &Path) -> Option<PathBuf> {
    let (dir, target_stem) = if media_path.is_dir() {
        (media_path, None)
    } else {
        let stem = media_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase());
        (media_path.parent()?, stem)
    };

    let mut best: Option<(usize, String, PathBuf)> = None;
    for entry in std::fs::read_dir(dir).ok()? {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        if !path.is_file() || path == media_path {
            continue;
        }
        let Some(ext) = path.extension().map(|e| e.to_string_lossy().to_lowercase()) else {
            continue;
        };
        if !ART_EXTENSIONS.contains(&ext.as_str()) {
            continue;
        }
        let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_lowercase()) else {
            continue;
        };

        let rank = if target_stem.as_deref() == Some(stem.as_str()) {
            0
        } else if let Some(pos) = ART_BASENAMES.iter().position(|n| *n == stem) {
            1 + pos
        } else {
            continue;
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let candidate = (rank, name, path);
        match &best {
            Some(current) if (current.0, current.1.as_str()) <= (candidate.0, candidate.1.as_str()) => {}
            _ => best = Some(candidate),
        }
    }
    best.map(|(_, _, path)| path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"x").unwrap();
        path
    }

    #[test]
    fn test_same_stem_sibling_wins_over_known_names() {
        let tmp = TempDir::new().unwrap();
        let film = touch(tmp.path(), "film.mkv");
        let film_art = touch(tmp.path(), "film.jpg");
        touch(tmp.path(), "cover.jpg");

        assert_eq!(find_cover_art(&film), Some(film_art));
    }

    #[test]
    fn test_known_name_found_for_directory() {
        let tmp = TempDir::new().unwrap();
        let cover = touch(tmp.path(), "cover.png");
        touch(tmp.path(), "track.mp3");

        assert_eq!(find_cover_art(tmp.path()), Some(cover));
    }

    #[test]
    fn test_known_name_priority_order() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "folder.jpg");
        let cover = touch(tmp.path(), "cover.jpg");

        assert_eq!(find_cover_art(tmp.path()), Some(cover));
    }

    #[test]
    fn test_media_file_is_not_its_own_art() {
        let tmp = TempDir::new().unwrap();
        let picture = touch(tmp.path(), "holiday.jpg");

        assert_eq!(find_cover_art(&picture), None);
    }

    #[test]
    fn test_unrelated_images_are_not_art() {
        let tmp = TempDir::new().unwrap();
        let film = touch(tmp.path(), "film.mkv");
        touch(tmp.path(), "screenshot.png");

        assert_eq!(find_cover_art(&film), None);
    }

    #[test]
    fn test_missing_directory_yields_none() {
        let tmp = TempDir::new().unwrap();
        let gone = tmp.path().join("gone").join("film.mkv");
        assert_eq!(find_cover_art(&gone), None);
    }
}
