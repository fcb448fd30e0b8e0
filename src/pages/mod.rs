//! Site loading: discover and parse the HTML pages under a root directory.

use scraper::Html;
use std::collections::HashSet;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::{Result, SitegraphError};

/// Discover every `.html`/`.htm` file under `root` (case-insensitive,
/// recursive) and parse it into a tag tree.
///
/// Pages are returned sorted by relative path so the downstream graph build
/// is deterministic. The page id is the file name (last path segment), which
/// is also how internal link targets are matched. A duplicate file name in a
/// different sub-directory is skipped with a warning, since page ids must be
/// unique across the site.
pub fn load_site(root: &Path) -> Result<Vec<(String, Html)>> {
    if !root.is_dir() {
        return Err(SitegraphError::Config(format!(
            "Site root is not a directory: {}",
            root.display()
        )));
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();
        if matches!(extension.as_str(), "html" | "htm") {
            paths.push(path.to_path_buf());
        }
    }
    paths.sort();

    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut pages = Vec::new();
    for path in paths {
        let page_id = match path.file_name().and_then(|s| s.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        if !seen_ids.insert(page_id.clone()) {
            log::warn!(
                "Skipping {}: duplicate page id '{}'",
                path.display(),
                page_id
            );
            continue;
        }
        let html = std::fs::read_to_string(&path)?;
        pages.push((page_id, Html::parse_document(&html)));
    }

    log::info!("Loaded {} pages from {}", pages.len(), root.display());
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_site_discovers_html_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("blog")).unwrap();
        fs::write(root.join("index.html"), "<html><body>Home</body></html>").unwrap();
        fs::write(root.join("about.htm"), "<html><body>About</body></html>").unwrap();
        fs::write(root.join("blog/post.html"), "<html><body>Post</body></html>").unwrap();
        fs::write(root.join("style.css"), "body {}").unwrap();
        fs::write(root.join("notes.txt"), "not a page").unwrap();

        let pages = load_site(root).unwrap();
        let ids: Vec<&str> = pages.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["about.htm", "post.html", "index.html"]);
    }

    #[test]
    fn test_load_site_order_is_deterministic() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for name in ["c.html", "a.html", "b.html"] {
            fs::write(root.join(name), "<html></html>").unwrap();
        }
        let first: Vec<String> = load_site(root)
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        let second: Vec<String> = load_site(root)
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(first, vec!["a.html", "b.html", "c.html"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_load_site_skips_duplicate_page_ids() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("en")).unwrap();
        fs::create_dir_all(root.join("de")).unwrap();
        fs::write(root.join("en/index.html"), "<html></html>").unwrap();
        fs::write(root.join("de/index.html"), "<html></html>").unwrap();

        let pages = load_site(root).unwrap();
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn test_load_site_missing_root_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_site(&temp_dir.path().join("nope"));
        assert!(matches!(result, Err(SitegraphError::Config(_))));
    }

    #[test]
    fn test_load_site_empty_dir() {
        let temp_dir = TempDir::new().unwrap();
        let pages = load_site(temp_dir.path()).unwrap();
        assert!(pages.is_empty());
    }
}
