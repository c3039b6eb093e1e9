//! Loading scenarios from Gherkin-style `.feature` files.
//!
//! Only the subset the harness needs is understood: `Feature:`,
//! `Background:`, `Scenario:` and step lines. Tags, comments, and the free
//! text describing a feature are skipped.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use thiserror::Error;

const STEP_KEYWORDS: [&str; 6] = ["Given ", "When ", "Then ", "And ", "But ", "* "];
const FEATURE_EXTENSION: &str = "feature";

/// Errors raised while reading or parsing feature files.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum FeatureError {
    /// Raised when a file or directory cannot be read.
    #[error("failed to read `{path}`: {message}")]
    Read {
        /// Path that failed to read.
        path: Utf8PathBuf,
        /// Underlying error message.
        message: String,
    },
    /// Raised when a line cannot be understood.
    #[error("{path}:{line}: {message}")]
    Parse {
        /// File being parsed.
        path: Utf8PathBuf,
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },
    /// Raised when a directory holds no feature files.
    #[error("no .feature files found in `{path}`")]
    Empty {
        /// Directory that was scanned.
        path: Utf8PathBuf,
    },
}

/// A single step line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Step {
    /// Keyword that introduced the step, without trailing space.
    pub keyword: String,
    /// Step text after the keyword.
    pub text: String,
    /// 1-based line number.
    pub line: usize,
}

/// An ordered list of steps run with a fresh context.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Scenario {
    /// Scenario title.
    pub name: String,
    /// 1-based line of the `Scenario:` header.
    pub line: usize,
    /// Background steps followed by the scenario's own steps.
    pub steps: Vec<Step>,
}

/// A parsed feature file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Feature {
    /// Feature title.
    pub name: String,
    /// File the feature came from.
    pub path: Utf8PathBuf,
    /// Scenarios in file order.
    pub scenarios: Vec<Scenario>,
}

enum Section {
    Description,
    Background,
    Scenario,
}

/// Parses feature `text` read from `path`.
///
/// # Errors
///
/// Returns [`FeatureError::Parse`] for a missing `Feature:` header, steps
/// outside a scenario or background, a background after the first scenario,
/// or any other unrecognised line inside a scenario.
pub fn parse_feature(path: &Utf8Path, text: &str) -> Result<Feature, FeatureError> {
    let parse_error = |line: usize, message: &str| FeatureError::Parse {
        path: path.to_path_buf(),
        line,
        message: message.to_owned(),
    };

    let mut name: Option<String> = None;
    let mut section = Section::Description;
    let mut background: Vec<Step> = Vec::new();
    let mut scenarios: Vec<Scenario> = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('@') {
            continue;
        }

        if let Some(title) = trimmed.strip_prefix("Feature:") {
            if name.is_some() {
                return Err(parse_error(line, "only one Feature is allowed per file"));
            }
            name = Some(title.trim().to_owned());
            continue;
        }
        if name.is_none() {
            return Err(parse_error(line, "expected a Feature: header"));
        }

        if trimmed.starts_with("Background:") {
            if !scenarios.is_empty() {
                return Err(parse_error(line, "Background must precede every Scenario"));
            }
            section = Section::Background;
        } else if let Some(title) = scenario_title(trimmed) {
            scenarios.push(Scenario {
                name: title.to_owned(),
                line,
                steps: background.clone(),
            });
            section = Section::Scenario;
        } else if let Some(step) = parse_step(trimmed, line) {
            match section {
                Section::Description => {
                    return Err(parse_error(line, "step outside of a Scenario or Background"));
                }
                Section::Background => background.push(step),
                Section::Scenario => {
                    if let Some(scenario) = scenarios.last_mut() {
                        scenario.steps.push(step);
                    }
                }
            }
        } else if !matches!(section, Section::Description) {
            return Err(parse_error(line, &format!("unrecognised line: {trimmed}")));
        }
    }

    let feature_name = name.ok_or_else(|| parse_error(0, "expected a Feature: header"))?;
    Ok(Feature {
        name: feature_name,
        path: path.to_path_buf(),
        scenarios,
    })
}

fn scenario_title(line: &str) -> Option<&str> {
    line.strip_prefix("Scenario:")
        .or_else(|| line.strip_prefix("Example:"))
        .map(str::trim)
}

fn parse_step(line: &str, number: usize) -> Option<Step> {
    STEP_KEYWORDS.iter().find_map(|keyword| {
        line.strip_prefix(keyword).map(|rest| Step {
            keyword: keyword.trim_end().to_owned(),
            text: rest.trim().to_owned(),
            line: number,
        })
    })
}

/// Loads features from files or directories.
///
/// Directories are scanned (not recursively) for `*.feature` files in name
/// order.
///
/// # Errors
///
/// Returns [`FeatureError`] when a path cannot be read, a directory holds no
/// feature files, or a file fails to parse.
pub fn load_features(paths: &[Utf8PathBuf]) -> Result<Vec<Feature>, FeatureError> {
    let mut features = Vec::new();
    for path in paths {
        if path.is_dir() {
            features.extend(load_directory(path)?);
        } else {
            let text = read_file(path)?;
            features.push(parse_feature(path, &text)?);
        }
    }
    Ok(features)
}

fn load_directory(path: &Utf8Path) -> Result<Vec<Feature>, FeatureError> {
    let read_error = |err: std::io::Error| FeatureError::Read {
        path: path.to_path_buf(),
        message: err.to_string(),
    };
    let dir = Dir::open_ambient_dir(path, ambient_authority()).map_err(read_error)?;

    let mut names = Vec::new();
    for entry in dir.entries().map_err(read_error)? {
        let file_name = entry.and_then(|item| item.file_name()).map_err(read_error)?;
        if Utf8Path::new(&file_name).extension() == Some(FEATURE_EXTENSION) {
            names.push(file_name);
        }
    }
    if names.is_empty() {
        return Err(FeatureError::Empty {
            path: path.to_path_buf(),
        });
    }
    names.sort();

    names
        .into_iter()
        .map(|file_name| {
            let text = dir.read_to_string(&file_name).map_err(read_error)?;
            parse_feature(&path.join(&file_name), &text)
        })
        .collect()
}

fn read_file(path: &Utf8Path) -> Result<String, FeatureError> {
    let read_error = |message: String| FeatureError::Read {
        path: path.to_path_buf(),
        message,
    };
    let (dir_path, file_name) = match (path.parent(), path.file_name()) {
        (Some(parent), Some(file_name)) if !parent.as_str().is_empty() => (parent, file_name),
        (_, Some(file_name)) => (Utf8Path::new("."), file_name),
        (_, None) => return Err(read_error(String::from("path has no file name"))),
    };

    let dir = Dir::open_ambient_dir(dir_path, ambient_authority())
        .map_err(|err| read_error(err.to_string()))?;
    dir.read_to_string(file_name)
        .map_err(|err| read_error(err.to_string()))
}
