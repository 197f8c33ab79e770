use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};

use crate::config::Config;

const YAML_EXTENSIONS: &[&str] = &["yml", "yaml"];

pub fn scan(root: &Path, config: &Config) -> Vec<PathBuf> {
    let walker = Walker {
        root,
        ignore: build_glob_set(&config.ignore),
        ignore_files: build_glob_set(&config.ignore_files),
        include: build_glob_set(&config.include),
    };
    let mut files = Vec::new();
    walker.walk(root, &mut files);
    files.sort();
    files
}

pub(crate) fn build_glob_set(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    patterns
        .iter()
        .filter_map(|p| GlobBuilder::new(p).case_insensitive(true).build().ok())
        .for_each(|glob| {
            builder.add(glob);
        });
    builder.build().unwrap_or_default()
}

pub(crate) fn matches_glob(path: &Path, root: &Path, set: &GlobSet) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| set.is_match(name))
        || path.strip_prefix(root).is_ok_and(|rel| set.is_match(rel))
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| YAML_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

struct Walker<'a> {
    root: &'a Path,
    ignore: GlobSet,
    ignore_files: GlobSet,
    include: GlobSet,
}

impl Walker<'_> {
    fn walk(&self, dir: &Path, files: &mut Vec<PathBuf>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            tracing::debug!("cannot read directory {}", dir.display());
            return;
        };

        for entry in entries.flatten() {
            let path = entry.path();

            if matches_glob(&path, self.root, &self.ignore) {
                continue;
            }

            if path.is_dir() {
                self.walk(&path, files);
            } else if is_yaml(&path)
                && !matches_glob(&path, self.root, &self.ignore_files)
                && matches_glob(&path, self.root, &self.include)
            {
                files.push(path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_scan_finds_yaml_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("site.yml"), "- hosts: all\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "not yaml").unwrap();
        fs::write(dir.path().join("other.yaml"), "a: 1\n").unwrap();

        let files = scan(dir.path(), &Config::default());
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| is_yaml(f)));
    }

    #[test]
    fn test_scan_descends_into_roles() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("roles/web/tasks")).unwrap();
        fs::write(dir.path().join("roles/web/tasks/main.yml"), "- ping:\n").unwrap();

        let files = scan(dir.path(), &Config::default());
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("roles/web/tasks/main.yml"));
    }

    #[test]
    fn test_scan_ignores_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("site.yml"), "- hosts: all\n").unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/config.yml"), "a: 1\n").unwrap();
        fs::create_dir(dir.path().join("node_modules")).unwrap();
        fs::write(dir.path().join("node_modules/pkg.yml"), "a: 1\n").unwrap();

        let files = scan(dir.path(), &Config::default());
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_scan_ignore_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("site.yml"), "- hosts: all\n").unwrap();
        fs::write(dir.path().join("requirements.yml"), "- src: x\n").unwrap();
        fs::create_dir(dir.path().join("ci")).unwrap();
        fs::write(dir.path().join("ci/pipeline.yml"), "a: 1\n").unwrap();

        let mut config = Config::default();
        config.ignore_files.push("requirements.yml".to_string());
        config.ignore_files.push("ci/pipeline.yml".to_string());
        let files = scan(dir.path(), &config);
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("site.yml"));
    }

    #[test]
    fn test_scan_include_filters_non_matching() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("site.yml"), "- hosts: all\n").unwrap();
        fs::create_dir(dir.path().join("playbooks")).unwrap();
        fs::write(dir.path().join("playbooks/db.yml"), "- hosts: db\n").unwrap();

        let mut config = Config::default();
        config.include = vec!["playbooks/**".to_string()];
        let files = scan(dir.path(), &config);
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("playbooks/db.yml"));
    }

    #[test]
    fn test_scan_include_empty_scans_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("site.yml"), "- hosts: all\n").unwrap();

        let mut config = Config::default();
        config.include = vec![];
        assert!(scan(dir.path(), &config).is_empty());
    }

    #[test]
    fn test_scan_results_are_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.yml"), "a: 1\n").unwrap();
        fs::write(dir.path().join("a.yml"), "a: 1\n").unwrap();

        let files = scan(dir.path(), &Config::default());
        assert!(files[0].ends_with("a.yml"));
        assert!(files[1].ends_with("b.yml"));
    }
}
