//! Expanding command-line inputs into an ordered list of source images.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions picked up when scanning directories.
pub const SUPPORTED_EXTENSIONS: [&str; 8] =
    ["jpg", "jpeg", "png", "bmp", "gif", "tif", "tiff", "webp"];

/// Finds image files for a run.
#[derive(Debug, Clone, Default)]
pub struct FileDiscovery {
    recursive: bool,
}

impl FileDiscovery {
    pub fn new(recursive: bool) -> Self {
        Self { recursive }
    }

    /// Expand inputs in the order given.
    ///
    /// Files are kept as named, whatever their extension, so job numbering
    /// follows the caller's list. Directories contribute their supported
    /// images, sorted by path.
    pub fn discover_all(&self, inputs: &[PathBuf]) -> Vec<PathBuf> {
        inputs
            .iter()
            .flat_map(|input| {
                if input.is_dir() {
                    self.scan(input)
                } else {
                    vec![input.clone()]
                }
            })
            .collect()
    }

    /// Supported images under a directory.
    pub fn scan(&self, dir: &Path) -> Vec<PathBuf> {
        let walker = WalkDir::new(dir).follow_links(true);
        let walker = if self.recursive {
            walker
        } else {
            walker.max_depth(1)
        };

        let mut files: Vec<PathBuf> = walker
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_supported(e.path()))
            .map(|e| e.into_path())
            .collect();

        // Sort by path for deterministic ordering
        files.sort();
        files
    }
}

/// Check if a file has a supported extension.
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext_lower = ext.to_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext_lower.as_str())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported() {
        assert!(is_supported(Path::new("test.jpg")));
        assert!(is_supported(Path::new("test.JPG")));
        assert!(is_supported(Path::new("test.tif")));
        assert!(is_supported(Path::new("test.webp")));
        assert!(!is_supported(Path::new("test.txt")));
        assert!(!is_supported(Path::new("noext")));
    }

    #[test]
    fn test_scan_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.jpg", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.gif"), b"x").unwrap();

        let flat = FileDiscovery::new(false).scan(dir.path());
        let names: Vec<_> = flat.iter().map(|p| p.file_name().unwrap()).collect();
        assert_eq!(names, ["a.jpg", "b.png"]);

        let deep = FileDiscovery::new(true).scan(dir.path());
        assert_eq!(deep.len(), 3);
    }

    #[test]
    fn test_explicit_files_keep_order() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = vec![
            dir.path().join("z.png"),
            dir.path().join("missing.png"),
            dir.path().join("a.png"),
        ];
        let found = FileDiscovery::default().discover_all(&inputs);
        assert_eq!(found, inputs);
    }
}
