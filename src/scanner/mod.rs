/// Manifest scanning: collect container images from a tree of YAML files
pub mod extract;
pub mod manifest;

use anyhow::Result;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub use manifest::ImageManifest;

/// Unique image references, ordered lexicographically
pub type ImageSet = BTreeSet<String>;

/// Outcome of writing a scan result
#[derive(Debug, PartialEq, Eq)]
pub enum ScanOutput {
    /// Manifest written with this many images
    Written { count: usize, path: PathBuf },
    /// Nothing found, no file written
    NoImages,
}

/// Whether the path has a `.yaml` or `.yml` extension
fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map_or(false, |ext| ext == "yaml" || ext == "yml")
}

/// Walk `root` and collect images from every YAML file beneath it.
///
/// Unreadable files and directory entries are logged and skipped.
pub fn scan_for_images(root: &Path) -> ImageSet {
    let mut images = ImageSet::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Cannot walk {}: {}", root.display(), e);
                continue;
            }
        };
        // Symlinked files count; symlinked directories are not descended
        if !entry.path().is_file() || !is_yaml(entry.path()) {
            continue;
        }

        match extract::extract_images_from_file(entry.path()) {
            Ok(found) if found.is_empty() => {}
            Ok(found) => {
                debug!("{}: {} image(s)", entry.path().display(), found.len());
                images.extend(found);
            }
            Err(e) => warn!("Cannot parse {}: {:#}", entry.path().display(), e),
        }
    }

    images
}

/// Scan `root` and write the sorted manifest to `output`.
///
/// When no image is found nothing is written, so a stale or absent
/// manifest is never replaced by an empty one.
pub fn extract_to_manifest(root: &Path, output: &Path) -> Result<ScanOutput> {
    info!("Scanning {} for container images...", root.display());
    let images = scan_for_images(root);

    if images.is_empty() {
        info!("No images found.");
        return Ok(ScanOutput::NoImages);
    }

    let count = images.len();
    ImageManifest::from_images(images).write_to(output)?;

    Ok(ScanOutput::Written {
        count,
        path: output.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn deployment(images: &[&str]) -> String {
        let containers: String = images
            .iter()
            .enumerate()
            .map(|(i, image)| format!("        - name: c{}\n          image: {}\n", i, image))
            .collect();
        format!(
            "apiVersion: apps/v1\nkind: Deployment\nspec:\n  template:\n    spec:\n      containers:\n{}",
            containers
        )
    }

    #[test]
    fn test_union_across_tree() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("apps/pipelines/base");
        fs::create_dir_all(&nested).unwrap();

        fs::write(dir.path().join("a.yaml"), deployment(&["nginx:1.25", "redis:7"])).unwrap();
        fs::write(nested.join("b.yml"), deployment(&["redis:7", "minio/minio:2024"])).unwrap();
        fs::write(
            nested.join("c.yaml"),
            format!("{}---\n{}", deployment(&["argoproj/argoexec:v3.4"]), deployment(&["nginx:1.25"])),
        )
        .unwrap();
        // Not YAML by extension
        fs::write(nested.join("d.txt"), deployment(&["ignored:1"])).unwrap();
        fs::write(nested.join("e.YAML"), deployment(&["ignored:2"])).unwrap();

        let images: Vec<String> = scan_for_images(dir.path()).into_iter().collect();
        assert_eq!(
            images,
            vec![
                "argoproj/argoexec:v3.4".to_string(),
                "minio/minio:2024".to_string(),
                "nginx:1.25".to_string(),
                "redis:7".to_string(),
            ]
        );
    }

    #[test]
    fn test_unreadable_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("good.yaml"), deployment(&["nginx:1.25"])).unwrap();
        fs::write(dir.path().join("binary.yaml"), [0xff, 0xfe, 0x00, 0x9f]).unwrap();

        let images: Vec<String> = scan_for_images(dir.path()).into_iter().collect();
        assert_eq!(images, vec!["nginx:1.25".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_manifest_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let shared = tempfile::tempdir().unwrap();
        let target = shared.path().join("deploy.yaml");
        fs::write(&target, deployment(&["nginx:1.25"])).unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join("linked.yaml")).unwrap();

        let images: Vec<String> = scan_for_images(dir.path()).into_iter().collect();
        assert_eq!(images, vec!["nginx:1.25".to_string()]);
    }

    #[test]
    fn test_empty_directory_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("images.yaml");

        let result = extract_to_manifest(dir.path(), &output).unwrap();
        assert_eq!(result, ScanOutput::NoImages);
        assert!(!output.exists());
    }

    #[test]
    fn test_extract_writes_sorted_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let manifests = dir.path().join("manifests");
        fs::create_dir_all(&manifests).unwrap();
        fs::write(manifests.join("app.yaml"), deployment(&["zeta:1", "alpha:2"])).unwrap();
        let output = dir.path().join("images.yaml");

        let result = extract_to_manifest(&manifests, &output).unwrap();
        assert_eq!(
            result,
            ScanOutput::Written {
                count: 2,
                path: output.clone()
            }
        );

        let manifest = ImageManifest::from_file(&output).unwrap();
        assert_eq!(manifest.names().collect::<Vec<_>>(), vec!["alpha:2", "zeta:1"]);
    }
}
