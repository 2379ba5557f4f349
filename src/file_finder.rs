//! Finds input files and locates an existing tag file for append mode.
//!
//! Adapted from the teacher's module of the same name: this crate has no
//! parser layer of its own (spec.md scopes per-language parsing out), so
//! the tag-file-content side (`parse_tag_file`) isn't carried over — only
//! the filesystem-walking half survives.

use crate::shell_to_regex;
use regex::RegexSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub struct FileFinderResult {
    pub files: Vec<String>,
    pub errors: Vec<String>,
}

impl FileFinderResult {
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn print_errors(&self) {
        for error in &self.errors {
            eprintln!("warning: {}", error);
        }
    }
}

impl Default for FileFinderResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursively explores directories and filters files based on
/// exclude patterns provided on the command line.
pub struct FileFinder {
    dir_path: PathBuf,
    exclude_patterns: RegexSet,
}

impl FileFinder {
    pub fn from_patterns(
        tag_file_path: &Path,
        exclude_patterns: Vec<String>,
    ) -> Result<Self, String> {
        let dir_path = if tag_file_path.to_str() == Some("-") {
            std::env::current_dir()
                .map_err(|e| format!("Failed to access current directory: {}", e))?
        } else {
            tag_file_path
                .parent()
                .ok_or_else(|| "Failed to access tag file's parent directory".to_string())?
                .to_path_buf()
        };

        let exclude_regexes = exclude_patterns
            .iter()
            .map(|pattern| shell_to_regex::shell_to_regex(pattern))
            .collect::<Vec<_>>();

        let exclude_patterns = RegexSet::new(exclude_regexes)
            .map_err(|e| format!("Failed to compile exclude patterns: {}", e))?;

        Ok(Self {
            dir_path,
            exclude_patterns,
        })
    }

    pub fn get_files_from_dir(&self) -> FileFinderResult {
        let dir_path = match if self.dir_path.to_str() == Some("-") {
            std::env::current_dir()
        } else {
            Ok(self.dir_path.clone())
        } {
            Ok(path) => path,
            Err(e) => {
                let mut result = FileFinderResult::new();
                result
                    .errors
                    .push(format!("Failed to access current directory: {}", e));
                return result;
            }
        };
        self.scan_directory(&dir_path)
    }

    /// Expands a list of file/directory arguments, recursing into any
    /// directories, skipping paths that don't exist rather than aborting.
    pub fn get_files_from_paths(&self, paths: &[String]) -> FileFinderResult {
        let mut result = FileFinderResult::new();

        for path_str in paths {
            let path = Path::new(path_str);

            if path.is_file() {
                result.files.push(path_str.clone());
            } else if path.is_dir() {
                let dir_result = self.scan_directory(path);
                result.files.extend(dir_result.files);
                result.errors.extend(dir_result.errors);
            } else {
                result
                    .errors
                    .push(format!("Path not found or inaccessible: {}", path_str));
            }
        }

        result
    }

    fn scan_directory(&self, dir_path: &Path) -> FileFinderResult {
        let mut result = FileFinderResult::new();
        let walker = WalkDir::new(dir_path).into_iter();

        for entry in walker {
            match entry {
                Ok(entry) => {
                    let path_str = entry.path().to_str().unwrap_or("");
                    if self.exclude_patterns.is_match(path_str) {
                        continue;
                    }

                    if entry.file_type().is_file() {
                        if let Some(path_str) = entry.path().to_str() {
                            result.files.push(path_str.to_string());
                        } else {
                            result.errors.push(format!(
                                "Failed to convert path to string: {}",
                                entry.path().display()
                            ));
                        }
                    }
                }
                Err(e) => {
                    result.errors.push(format!("Failed to access path: {}", e));
                }
            }
        }

        result
    }
}

/// Resolves the tag file path from the `--tag-file`/`--append` options:
/// in append mode, searches the current directory and its ancestors for
/// an existing tag file (so append works from a subdirectory of a
/// project root); otherwise places a fresh one in the current directory.
pub fn determine_tag_file_path(tag_file_name: &str, append: bool) -> Result<String, String> {
    if tag_file_name == "-" {
        return Ok("-".to_string());
    }

    match find_tag_file(tag_file_name) {
        Ok(tag_file) => Ok(tag_file),
        Err(_) => {
            if append {
                Err(format!("Could not find the tag file: {}", tag_file_name))
            } else {
                Ok(std::env::current_dir()
                    .map_err(|e| format!("Failed to get current directory: {}", e))?
                    .join(tag_file_name)
                    .to_string_lossy()
                    .into_owned())
            }
        }
    }
}

pub fn find_tag_file(filename: &str) -> Result<String, String> {
    let mut current_dir =
        std::env::current_dir().map_err(|e| format!("Failed to get current directory: {}", e))?;

    match File::open(current_dir.join(filename)) {
        Ok(_) => return Ok(current_dir.join(filename).to_string_lossy().into_owned()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(format!(
                "Failed to open tag file '{}' in directory '{}': {}",
                filename,
                current_dir.display(),
                e
            ));
        }
    }

    while let Some(parent) = current_dir.parent() {
        current_dir = parent.to_path_buf();
        match File::open(current_dir.join(filename)) {
            Ok(_) => return Ok(current_dir.join(filename).to_string_lossy().into_owned()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(format!(
                    "Failed to open tag file '{}' in directory '{}': {}",
                    filename,
                    current_dir.display(),
                    e
                ));
            }
        }
    }

    Err(format!(
        "Tag file '{}' not found in current directory or any parent directory",
        filename
    ))
}
