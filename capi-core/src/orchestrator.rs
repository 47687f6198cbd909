//! Directory-tree diff driver.
//!
//! Walks the old and new header trees side by side, turns every header that
//! was added, removed or changed into a job, and diffs the jobs in parallel
//! with rayon. Results are concatenated in traversal order.
//!
//! # Traversal
//!
//! - Listings are sorted; entries whose extension is neither `.h` nor empty
//!   are skipped.
//! - Subtrees present on one side only are walked with the `ignore` crate
//!   and every header in them is reported as added or removed.
//! - Byte-identical headers are skipped without parsing.
//! - Path components on the ignore list (platform target directories by
//!   default) are skipped entirely.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use ignore::WalkBuilder;
use rayon::prelude::*;
use tracing::{debug, info, warn};
use xxhash_rust::xxh3::xxh3_64;

use crate::differ::{
    diff_units, DiffRecord, DiffResult, DnfPermissionPolicy, DocDiffer, FileChange, FileStatus,
    PermissionPolicy,
};
use crate::error::{CapiError, Result};
use crate::parser::{AstProvider, CHeaderProvider, CommentParser, DoxygenParser};
use crate::types::{KitMapping, Node, SyntaxError};

/// Directory names skipped by default.
pub const DEFAULT_IGNORED_DIRS: &[&str] = &[
    "arm-linux-ohos",
    "aarch64-linux-ohos",
    "x86_64-linux-ohos",
    "i686-linux-ohos",
    "tee",
    "linux",
];

const HEADER_EXTENSION: &str = "h";

/// Options for a directory diff.
#[derive(Clone, Debug)]
pub struct DiffOptions {
    /// Path components that exclude a file or directory.
    pub ignored_dirs: Vec<String>,
    /// Worker threads; `None` uses the global rayon pool.
    pub threads: Option<usize>,
    /// Kit and subsystem assignment by path prefix.
    pub kits: Vec<KitMapping>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            ignored_dirs: DEFAULT_IGNORED_DIRS.iter().map(|d| d.to_string()).collect(),
            threads: None,
            kits: Vec::new(),
        }
    }
}

impl DiffOptions {
    fn is_ignored(&self, rel_path: &str) -> bool {
        rel_path
            .split('/')
            .any(|component| self.ignored_dirs.iter().any(|d| d == component))
    }

    /// Longest matching path prefix wins.
    fn kit_for(&self, rel_path: &str) -> Option<&KitMapping> {
        self.kits
            .iter()
            .filter(|m| rel_path.starts_with(m.path.trim_start_matches("./")))
            .max_by_key(|m| m.path.len())
    }
}

/// One header to diff. A missing side means the header was added or removed.
#[derive(Debug)]
struct Job {
    rel_path: String,
    old: Option<String>,
    new: Option<String>,
}

#[derive(Debug, Default)]
struct FileOutcome {
    records: Vec<DiffRecord>,
    syntax_errors: Vec<SyntaxError>,
}

/// Diffs header trees with pluggable parsing and permission policies.
pub struct DiffEngine {
    provider: Box<dyn AstProvider>,
    comments: Box<dyn CommentParser>,
    policy: Box<dyn PermissionPolicy>,
    options: DiffOptions,
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self::new(DiffOptions::default())
    }
}

impl DiffEngine {
    /// Engine with the bundled C provider, Doxygen parser and DNF policy.
    pub fn new(options: DiffOptions) -> Self {
        Self {
            provider: Box::new(CHeaderProvider),
            comments: Box::new(DoxygenParser),
            policy: Box::new(DnfPermissionPolicy),
            options,
        }
    }

    pub fn with_provider(mut self, provider: impl AstProvider + 'static) -> Self {
        self.provider = Box::new(provider);
        self
    }

    pub fn with_comment_parser(mut self, parser: impl CommentParser + 'static) -> Self {
        self.comments = Box::new(parser);
        self
    }

    pub fn with_permission_policy(mut self, policy: impl PermissionPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn options(&self) -> &DiffOptions {
        &self.options
    }

    /// Diff two header trees. Both roots may also be single header files.
    pub fn diff_dirs(&self, old_root: &Path, new_root: &Path) -> Result<DiffResult> {
        let start = Instant::now();
        for root in [old_root, new_root] {
            if !root.exists() {
                return Err(CapiError::InvalidPath {
                    path: root.display().to_string(),
                });
            }
        }

        let mut jobs = Vec::new();
        let mut files = Vec::new();
        if old_root.is_file() && new_root.is_file() {
            let rel_path = file_name(new_root);
            self.compare_files(old_root, new_root, rel_path, &mut jobs, &mut files)?;
        } else if old_root.is_dir() && new_root.is_dir() {
            self.collect(old_root, new_root, "", &mut jobs, &mut files)?;
        } else {
            return Err(CapiError::InvalidPath {
                path: format!("{} and {} must both be directories or files", old_root.display(), new_root.display()),
            });
        }

        let mut result = self.run(jobs)?;
        for file in files {
            result.add_file(file);
        }
        result.finalize(start.elapsed().as_secs_f64() * 1000.0);
        info!(
            records = result.change_count(),
            files = result.files.len(),
            syntax_errors = result.syntax_errors.len(),
            duration_ms = result.duration_ms,
            "diff finished"
        );
        Ok(result)
    }

    /// Diff two versions of one header given as source text.
    pub fn diff_sources(&self, old: &str, new: &str, rel_path: &str) -> Result<DiffResult> {
        let start = Instant::now();
        let job = Job {
            rel_path: rel_path.to_string(),
            old: Some(old.to_string()),
            new: Some(new.to_string()),
        };
        let mut result = self.run(vec![job])?;
        result.finalize(start.elapsed().as_secs_f64() * 1000.0);
        Ok(result)
    }

    fn collect(
        &self,
        old_dir: &Path,
        new_dir: &Path,
        rel_dir: &str,
        jobs: &mut Vec<Job>,
        files: &mut Vec<FileChange>,
    ) -> Result<()> {
        let mut names = list_dir(old_dir)?;
        names.extend(list_dir(new_dir)?);

        for name in names {
            let rel_path = join_rel(rel_dir, &name);
            if self.options.is_ignored(&rel_path) {
                debug!(path = %rel_path, "skipping ignored path");
                continue;
            }
            let extension = Path::new(&name).extension().and_then(|e| e.to_str());
            if !matches!(extension, None | Some(HEADER_EXTENSION)) {
                continue;
            }

            let old_path = old_dir.join(&name);
            let new_path = new_dir.join(&name);
            match (old_path.exists(), new_path.exists()) {
                (true, true) if old_path.is_dir() && new_path.is_dir() => {
                    self.collect(&old_path, &new_path, &rel_path, jobs, files)?;
                }
                (true, true) if old_path.is_file() && new_path.is_file() => {
                    self.compare_files(&old_path, &new_path, rel_path, jobs, files)?;
                }
                (true, true) => {
                    self.one_side(&old_path, &rel_path, FileStatus::Removed, jobs, files)?;
                    self.one_side(&new_path, &rel_path, FileStatus::Added, jobs, files)?;
                }
                (true, false) => self.one_side(&old_path, &rel_path, FileStatus::Removed, jobs, files)?,
                (false, true) => self.one_side(&new_path, &rel_path, FileStatus::Added, jobs, files)?,
                (false, false) => {}
            }
        }
        Ok(())
    }

    fn compare_files(
        &self,
        old_path: &Path,
        new_path: &Path,
        rel_path: String,
        jobs: &mut Vec<Job>,
        files: &mut Vec<FileChange>,
    ) -> Result<()> {
        let old_bytes = fs::read(old_path)?;
        let new_bytes = fs::read(new_path)?;
        if old_bytes == new_bytes {
            return Ok(());
        }
        files.push(FileChange {
            path: rel_path.clone(),
            status: FileStatus::Modified,
            old_hash: Some(hash(&old_bytes)),
            new_hash: Some(hash(&new_bytes)),
        });
        jobs.push(Job {
            rel_path,
            old: Some(String::from_utf8_lossy(&old_bytes).into_owned()),
            new: Some(String::from_utf8_lossy(&new_bytes).into_owned()),
        });
        Ok(())
    }

    /// Headers under a path that exists on one side only. A file given
    /// directly is parsed whatever its name; directories contribute `.h` files.
    fn one_side(
        &self,
        path: &Path,
        rel_path: &str,
        status: FileStatus,
        jobs: &mut Vec<Job>,
        files: &mut Vec<FileChange>,
    ) -> Result<()> {
        let headers = if path.is_dir() {
            self.walk_headers(path, rel_path)
        } else {
            vec![(rel_path.to_string(), path.to_path_buf())]
        };

        for (rel, header) in headers {
            let bytes = fs::read(&header)?;
            let source = String::from_utf8_lossy(&bytes).into_owned();
            let digest = Some(hash(&bytes));
            let (job, change) = match status {
                FileStatus::Removed => (
                    Job { rel_path: rel.clone(), old: Some(source), new: None },
                    FileChange { path: rel, status, old_hash: digest, new_hash: None },
                ),
                _ => (
                    Job { rel_path: rel.clone(), old: None, new: Some(source) },
                    FileChange { path: rel, status, old_hash: None, new_hash: digest },
                ),
            };
            jobs.push(job);
            files.push(change);
        }
        Ok(())
    }

    fn walk_headers(&self, dir: &Path, rel_dir: &str) -> Vec<(String, PathBuf)> {
        let walker = WalkBuilder::new(dir)
            .hidden(false)
            .ignore(false)
            .parents(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut headers = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "failed to walk {}", dir.display());
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) || !is_header(path) {
                continue;
            }
            let Ok(suffix) = path.strip_prefix(dir) else { continue };
            let suffix = suffix.to_string_lossy().replace('\\', "/");
            let rel_path = join_rel(rel_dir, &suffix);
            if self.options.is_ignored(&rel_path) {
                continue;
            }
            headers.push((rel_path, path.to_path_buf()));
        }
        headers
    }

    fn run(&self, jobs: Vec<Job>) -> Result<DiffResult> {
        let work = || -> Vec<Result<FileOutcome>> {
            jobs.par_iter().map(|job| self.diff_job(job)).collect()
        };
        let outcomes = match self.options.threads {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| CapiError::ThreadPool { message: e.to_string() })?
                .install(work),
            None => work(),
        };

        let mut result = DiffResult::new();
        for outcome in outcomes {
            let outcome = outcome?;
            for error in outcome.syntax_errors {
                result.add_syntax_error(error);
            }
            for record in outcome.records {
                result.add_record(record);
            }
        }
        Ok(result)
    }

    fn diff_job(&self, job: &Job) -> Result<FileOutcome> {
        debug!(path = %job.rel_path, "diffing header");
        let mut outcome = FileOutcome::default();

        let old = job.old.as_deref().map(|s| self.parse(s, &job.rel_path, &mut outcome));
        let new = job.new.as_deref().map(|s| self.parse(s, &job.rel_path, &mut outcome));
        // A side that failed to parse leaves nothing to compare against.
        if matches!(old, Some(None)) || matches!(new, Some(None)) {
            return Ok(outcome);
        }
        let old = old.flatten();
        let new = new.flatten();

        let docs = DocDiffer::new(self.comments.as_ref(), self.policy.as_ref());
        diff_units(old.as_ref(), new.as_ref(), &docs, &mut outcome.records)?;
        Ok(outcome)
    }

    fn parse(&self, source: &str, rel_path: &str, outcome: &mut FileOutcome) -> Option<Node> {
        match self.provider.parse(source, rel_path) {
            Ok(mut unit) => {
                if let Some(message) = unit.syntax_error.clone() {
                    warn!(path = %rel_path, "syntax errors in header");
                    outcome.syntax_errors.push(SyntaxError {
                        file: rel_path.to_string(),
                        message,
                    });
                }
                self.apply_kits(&mut unit, rel_path);
                Some(unit)
            }
            Err(e) => {
                warn!(path = %rel_path, error = %e, "failed to parse header");
                outcome.syntax_errors.push(SyntaxError {
                    file: rel_path.to_string(),
                    message: e.to_string(),
                });
                None
            }
        }
    }

    fn apply_kits(&self, unit: &mut Node, rel_path: &str) {
        let Some(mapping) = self.options.kit_for(rel_path) else { return };
        fill_kit(unit, mapping);
    }
}

fn fill_kit(node: &mut Node, mapping: &KitMapping) {
    if node.kit_name.is_empty() {
        node.kit_name = mapping.kit.clone();
    }
    if node.sub_system.is_empty() {
        node.sub_system = mapping.subsystem.clone();
    }
    for child in &mut node.children {
        fill_kit(child, mapping);
    }
}

fn list_dir(dir: &Path) -> Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    for entry in fs::read_dir(dir)? {
        names.insert(entry?.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

fn join_rel(rel_dir: &str, name: &str) -> String {
    if rel_dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", rel_dir, name)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn is_header(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(HEADER_EXTENSION)
}

fn hash(bytes: &[u8]) -> String {
    format!("xxh3:{:016x}", xxh3_64(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::differ::DiffKind;
    use tempfile::TempDir;

    fn make_tree(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (path, content) in files {
            let full = dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        dir
    }

    fn kinds(result: &DiffResult) -> Vec<DiffKind> {
        result.records.iter().map(|r| r.kind).collect()
    }

    #[test]
    fn test_identical_trees() {
        let files = [("include/a.h", "int OH_Foo(void);\n")];
        let old = make_tree(&files);
        let new = make_tree(&files);
        let result = DiffEngine::default().diff_dirs(old.path(), new.path()).unwrap();
        assert!(!result.has_changes());
        assert!(result.files.is_empty());
    }

    #[test]
    fn test_modified_header() {
        let old = make_tree(&[("include/a.h", "int OH_Foo(int a);\n")]);
        let new = make_tree(&[("include/a.h", "long OH_Foo(int a);\n")]);
        let result = DiffEngine::default().diff_dirs(old.path(), new.path()).unwrap();
        assert_eq!(kinds(&result), vec![DiffKind::FunctionReturnChange]);
        assert_eq!(result.records[0].path(), "include/a.h");
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].status, FileStatus::Modified);
        assert!(result.files[0].old_hash.as_deref().unwrap().starts_with("xxh3:"));
    }

    #[test]
    fn test_added_directory() {
        let old = make_tree(&[("include/a.h", "int OH_Foo(void);\n")]);
        let new = make_tree(&[
            ("include/a.h", "int OH_Foo(void);\n"),
            ("extra/sub/b.h", "int OH_Bar(void);\nint OH_Baz(void);\n"),
            ("extra/sub/notes.txt", "ignored"),
        ]);
        let result = DiffEngine::default().diff_dirs(old.path(), new.path()).unwrap();
        assert_eq!(kinds(&result), vec![DiffKind::AddApi, DiffKind::AddApi]);
        assert_eq!(result.records[0].api_name, "OH_Bar");
        assert_eq!(result.records[0].path(), "extra/sub/b.h");
        assert_eq!(result.files[0].status, FileStatus::Added);
    }

    #[test]
    fn test_removed_header() {
        let old = make_tree(&[("a.h", "int OH_Foo(void);\n"), ("b.h", "#define B 1\n")]);
        let new = make_tree(&[("a.h", "int OH_Foo(void);\n")]);
        let result = DiffEngine::default().diff_dirs(old.path(), new.path()).unwrap();
        assert_eq!(kinds(&result), vec![DiffKind::ReduceApi]);
        assert_eq!(result.records[0].old_value, "B 1");
    }

    #[test]
    fn test_extensionless_headers_are_diffed() {
        let old = make_tree(&[("include/net", "int OH_Foo(int a);\n")]);
        let new = make_tree(&[
            ("include/net", "long OH_Foo(int a);\n"),
            ("include/socket", "int OH_Bar(void);\n"),
            ("include/README.md", "int OH_Doc(void);\n"),
        ]);
        let result = DiffEngine::default().diff_dirs(old.path(), new.path()).unwrap();
        assert_eq!(
            kinds(&result),
            vec![DiffKind::FunctionReturnChange, DiffKind::AddApi]
        );
        assert_eq!(result.records[0].path(), "include/net");
        assert_eq!(result.records[1].api_name, "OH_Bar");
    }

    #[test]
    fn test_ignored_directories() {
        let old = make_tree(&[("linux/a.h", "int f(void);\n")]);
        let new = make_tree(&[("linux/a.h", "long f(void);\n"), ("tee/b.h", "int g(void);\n")]);
        let result = DiffEngine::default().diff_dirs(old.path(), new.path()).unwrap();
        assert!(!result.has_changes());
    }

    #[test]
    fn test_results_follow_traversal_order() {
        let old = make_tree(&[("a.h", "int OH_A(void);\n"), ("b.h", "int OH_B(void);\n")]);
        let new = make_tree(&[("a.h", "long OH_A(void);\n"), ("b.h", "long OH_B(void);\n")]);
        let engine = DiffEngine::new(DiffOptions { threads: Some(2), ..Default::default() });
        let result = engine.diff_dirs(old.path(), new.path()).unwrap();
        let names: Vec<&str> = result.records.iter().map(|r| r.api_name.as_str()).collect();
        assert_eq!(names, vec!["OH_A", "OH_B"]);
    }

    #[test]
    fn test_kit_mapping_by_longest_prefix() {
        let options = DiffOptions {
            kits: vec![
                KitMapping { path: "net".into(), kit: "NetKit".into(), subsystem: "net".into() },
                KitMapping { path: "net/http".into(), kit: "HttpKit".into(), subsystem: "http".into() },
            ],
            ..Default::default()
        };
        let old = make_tree(&[("net/http/a.h", "int OH_Get(void);\n")]);
        let new = make_tree(&[("net/http/a.h", "long OH_Get(void);\n")]);
        let result = DiffEngine::new(options).diff_dirs(old.path(), new.path()).unwrap();
        assert_eq!(result.records[0].kit_name, "HttpKit");
        assert_eq!(result.records[0].sub_system, "http");
    }

    #[test]
    fn test_missing_root() {
        let new = make_tree(&[]);
        let err = DiffEngine::default()
            .diff_dirs(Path::new("/nonexistent/capi-old"), new.path())
            .unwrap_err();
        assert!(matches!(err, CapiError::InvalidPath { .. }));
    }

    #[test]
    fn test_diff_single_files() {
        let old = make_tree(&[("a.h", "#define MAX 1\n")]);
        let new = make_tree(&[("a.h", "#define MAX 2\n")]);
        let result = DiffEngine::default()
            .diff_dirs(&old.path().join("a.h"), &new.path().join("a.h"))
            .unwrap();
        assert_eq!(kinds(&result), vec![DiffKind::DefineTextChange]);
    }

    #[test]
    fn test_diff_sources() {
        let result = DiffEngine::default()
            .diff_sources("enum E { X = 1 };\n", "enum E { X = 2 };\n", "e.h")
            .unwrap();
        assert_eq!(kinds(&result), vec![DiffKind::EnumMemberValueChange]);
        assert!(result.has_incompatible_changes());
    }
}
