//! Image discovery for the gallery updater.
//!
//! Reads the flat images directory and assigns each image file to the
//! projects whose name it starts with. Within a project, images are ordered by
//! the [`naming`](crate::naming) sort key.
//!
//! ```text
//! images/
//! ├── arss_1.png               # arss, sequenced 1
//! ├── arss_1.1_title.png       # arss, sequenced 1.1
//! ├── arss_2_semantic.png      # arss, sequenced 2
//! ├── ulysquot00001.png        # ulysquot, sequenced 1
//! ├── ulysquotC00001.png       # ulysquot, continuation 1
//! ├── notes.txt                # not an image
//! └── drafts/                  # directories are ignored
//! ```
//!
//! Matching is a plain prefix test, so a file can belong to more than one
//! project when project names share a prefix. Only regular files directly in
//! the directory are considered.

use crate::config::GalleryConfig;
use crate::naming::{self, ContinuationRule, SortKey};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Cannot read images directory {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Images found for one project, in display order.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectImages {
    pub project: String,
    pub images: Vec<ImageRef>,
}

impl ProjectImages {
    pub fn filenames(&self) -> Vec<&str> {
        self.images.iter().map(|i| i.filename.as_str()).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageRef {
    pub filename: String,
    pub key: SortKey,
}

/// Per-project image lists. Projects without images are not included.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
    pub projects: Vec<ProjectImages>,
}

impl Catalog {
    pub fn get(&self, project: &str) -> Option<&ProjectImages> {
        self.projects.iter().find(|p| p.project == project)
    }

    pub fn image_count(&self, project: &str) -> usize {
        self.get(project).map(|p| p.images.len()).unwrap_or(0)
    }
}

/// Names of regular files directly inside `dir`, sorted.
pub fn list_files(dir: &Path) -> Result<Vec<String>, ScanError> {
    let mut names = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| ScanError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        // Symlinks count when they resolve to a file.
        if !entry.path().is_file() {
            continue;
        }
        match entry.file_name().to_str() {
            Some(name) => names.push(name.to_string()),
            None => tracing::debug!(path = %entry.path().display(), "skipping non UTF-8 filename"),
        }
    }
    names.sort();
    Ok(names)
}

/// Group `filenames` by project and order each group.
///
/// Projects keep the order given in `projects`; those with no matching image
/// are left out.
pub fn group_images<S: AsRef<str>>(
    filenames: &[String],
    projects: &[S],
    extensions: &[String],
    rules: &[ContinuationRule],
) -> Catalog {
    let images: Vec<&String> = filenames
        .iter()
        .filter(|f| naming::has_image_extension(f, extensions))
        .collect();

    let projects = projects
        .iter()
        .map(|p| p.as_ref())
        .filter_map(|project: &str| {
            let mut matched: Vec<ImageRef> = images
                .iter()
                .filter(|f| f.starts_with(project))
                .map(|f| ImageRef {
                    filename: f.to_string(),
                    key: naming::sort_key(f, project, rules),
                })
                .collect();
            matched.sort_by(|a, b| a.key.cmp(&b.key));
            tracing::debug!(project, images = matched.len(), "grouped project images");
            (!matched.is_empty()).then(|| ProjectImages {
                project: project.to_string(),
                images: matched,
            })
        })
        .collect();

    Catalog { projects }
}

/// Discover and order the images of `projects` in `images_dir`.
pub fn scan<S: AsRef<str>>(
    images_dir: &Path,
    projects: &[S],
    config: &GalleryConfig,
) -> Result<Catalog, ScanError> {
    let files = list_files(images_dir)?;
    Ok(group_images(
        &files,
        projects,
        &config.extensions,
        &config.continuations,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::touch_files;
    use std::fs;
    use tempfile::TempDir;

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn arss_sequence_order() {
        let tmp = TempDir::new().unwrap();
        touch_files(
            tmp.path(),
            &[
                "arss_2_semantic.png",
                "arss_1.2_feature.png",
                "arss_1.png",
                "arss_1.1_title.png",
            ],
        );
        let catalog = scan(tmp.path(), &["arss"], &GalleryConfig::default()).unwrap();
        assert_eq!(
            catalog.get("arss").unwrap().filenames(),
            vec![
                "arss_1.png",
                "arss_1.1_title.png",
                "arss_1.2_feature.png",
                "arss_2_semantic.png",
            ]
        );
    }

    #[test]
    fn continuation_after_sequenced_with_default_rules() {
        let tmp = TempDir::new().unwrap();
        touch_files(tmp.path(), &["ulysquotC00001.png", "ulysquot00001.png"]);
        let catalog = scan(tmp.path(), &["ulysquot"], &GalleryConfig::default()).unwrap();
        assert_eq!(
            catalog.get("ulysquot").unwrap().filenames(),
            vec!["ulysquot00001.png", "ulysquotC00001.png"]
        );
    }

    #[test]
    fn non_images_and_directories_skipped() {
        let tmp = TempDir::new().unwrap();
        touch_files(tmp.path(), &["arss_1.png", "arss_notes.txt", "arss_2.JPG"]);
        fs::create_dir(tmp.path().join("arss_3.png")).unwrap();
        let catalog = scan(tmp.path(), &["arss"], &GalleryConfig::default()).unwrap();
        assert_eq!(
            catalog.get("arss").unwrap().filenames(),
            vec!["arss_1.png", "arss_2.JPG"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_images_included() {
        let tmp = TempDir::new().unwrap();
        let images = tmp.path().join("images");
        touch_files(&images, &["arss_1.png"]);
        touch_files(&tmp.path().join("store"), &["real.png"]);
        std::os::unix::fs::symlink(tmp.path().join("store/real.png"), images.join("arss_2.png"))
            .unwrap();
        std::os::unix::fs::symlink(tmp.path().join("store/gone.png"), images.join("arss_3.png"))
            .unwrap();

        let catalog = scan(&images, &["arss"], &GalleryConfig::default()).unwrap();
        assert_eq!(
            catalog.get("arss").unwrap().filenames(),
            vec!["arss_1.png", "arss_2.png"]
        );
    }

    #[test]
    fn projects_without_images_are_omitted() {
        let catalog = group_images(
            &strings(&["arss_1.png"]),
            &["empty", "arss"],
            &strings(&["png"]),
            &[],
        );
        assert!(catalog.get("empty").is_none());
        assert_eq!(catalog.image_count("empty"), 0);
        assert_eq!(catalog.projects.len(), 1);
    }

    #[test]
    fn project_order_follows_input() {
        let catalog = group_images(
            &strings(&["a_1.png", "b_1.png"]),
            &["b", "a"],
            &strings(&["png"]),
            &[],
        );
        let order: Vec<&str> = catalog.projects.iter().map(|p| p.project.as_str()).collect();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn shared_prefix_matches_both_projects() {
        let catalog = group_images(
            &strings(&["ulys_1.png", "ulysquot00001.png"]),
            &["ulys", "ulysquot"],
            &strings(&["png"]),
            &[],
        );
        assert_eq!(catalog.image_count("ulys"), 2);
        assert_eq!(catalog.image_count("ulysquot"), 1);
    }

    #[test]
    fn ordering_independent_of_input_order() {
        let names = [
            "arss-cover.png",
            "arss_10.png",
            "arss_2.png",
            "arss_1.5.png",
            "arss_a.png",
        ];
        let forward = group_images(&strings(&names), &["arss"], &strings(&["png"]), &[]);
        let mut reversed_names = strings(&names);
        reversed_names.reverse();
        let backward = group_images(&reversed_names, &["arss"], &strings(&["png"]), &[]);
        assert_eq!(
            forward.get("arss").unwrap().filenames(),
            backward.get("arss").unwrap().filenames()
        );
        assert_eq!(
            forward.get("arss").unwrap().filenames(),
            vec!["arss_1.5.png", "arss_2.png", "arss_10.png", "arss-cover.png", "arss_a.png"]
        );
    }

    #[test]
    fn missing_directory_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = scan(&tmp.path().join("nope"), &["arss"], &GalleryConfig::default());
        assert!(matches!(result, Err(ScanError::Walk { .. })));
    }
}
