//! Shared test fixtures and utilities for integration tests.
//!
//! # Available Fixtures
//!
//! - `fixture_doc_root`: a temporary doc root holding a copy of
//!   `tests/fixtures/implementors` (one real `core::hash::Hash` fragment)
//! - `empty_doc_root`: a temporary doc root with an empty `implementors/`
//!
//! Each fixture owns its temp directory, so cache files written by one test
//! never leak into another.

use rstest::fixture;
use rustdoc_implementors::config::Config;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Returns the project root directory (where Cargo.toml lives).
pub fn project_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// A temporary documentation root with an `implementors/` directory.
#[allow(dead_code)] // Methods used across different integration test crates
pub struct TempDocRoot {
    _temp: TempDir,
    root: PathBuf,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl TempDocRoot {
    /// Creates a doc root with an empty `implementors/` directory.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().join("doc");
        fs::create_dir_all(root.join("implementors")).expect("Failed to create implementors dir");
        Self { _temp: temp, root }
    }

    /// Returns the doc root path.
    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn implementors_dir(&self) -> PathBuf {
        self.root.join("implementors")
    }

    /// Writes a fragment relative to `implementors/`.
    ///
    /// # Panics
    /// Panics if the file cannot be written.
    pub fn write_fragment(&self, relative: &str, source: &str) {
        let path = self.implementors_dir().join(relative);
        fs::create_dir_all(path.parent().expect("fragment has a parent"))
            .expect("Failed to create fragment directory");
        fs::write(&path, source).expect("Failed to write fragment");
    }

    /// Copies every file under `tests/fixtures/implementors` into this doc root.
    pub fn copy_fixtures(&self) {
        let source = project_root().join("tests/fixtures/implementors");
        copy_dir(&source, &self.implementors_dir());
    }

    /// A config that keeps the cache inside this doc root's temp directory.
    pub fn config(&self) -> Config {
        Config {
            doc_root: Some(self.root.clone()),
            cache_dir: Some(self.root.join(".cache")),
            ..Config::default()
        }
    }

    pub fn cache_file(&self) -> PathBuf {
        rustdoc_implementors::cache::cache_file(&self.root.join(".cache"))
    }
}

fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).expect("Failed to create directory");
    for entry in fs::read_dir(from).expect("Failed to read fixture directory") {
        let entry = entry.expect("Failed to read fixture entry");
        let target = to.join(entry.file_name());
        if entry.path().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target).expect("Failed to copy fixture");
        }
    }
}

/// Doc root containing the real `core::hash::Hash` fragment.
#[fixture]
pub fn fixture_doc_root() -> TempDocRoot {
    let root = TempDocRoot::new();
    root.copy_fixtures();
    root
}

/// Doc root with nothing in it.
#[fixture]
pub fn empty_doc_root() -> TempDocRoot {
    TempDocRoot::new()
}

/// A small object-literal fragment for `core::fmt::Display`.
#[allow(dead_code)]
pub const DISPLAY_FRAGMENT: &str = r#"(function() {var implementors = {
"url":["impl <a class='trait' href='core/fmt/trait.Display.html' title='core::fmt::Display'>Display</a> for <a class='struct' href='url/struct.Url.html' title='url::Url'>Url</a>"],
"iron":["impl <a class='trait' title='core::fmt::Display'>Display</a> for <a class='enum' title='iron::method::Method'>Method</a>"]
};
if (window.register_implementors) {window.register_implementors(implementors);} else {window.pending_implementors = implementors;}
})()
"#;
