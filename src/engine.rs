use crate::aggregate::{AggregatedReference, DetectionEntry, ReferenceError, aggregate};
use crate::mapping::UserMapping;
use crate::scorer::{Comparison, compare};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_SUFFIX: &str = ".colors.json";

/// A place detection entries can be loaded from.
pub trait ReferenceSource {
    /// Key under which this source's score is reported.
    fn identifier(&self) -> &str;
    fn load(&self) -> Result<Vec<DetectionEntry>, ReferenceError>;
}

/// Reference entries stored in a JSON file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    identifier: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let identifier = identifier_for(&path);
        Self { path, identifier }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReferenceSource for FileSource {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn load(&self) -> Result<Vec<DetectionEntry>, ReferenceError> {
        let content = std::fs::read_to_string(&self.path)?;
        Ok(crate::aggregate::parse_reference(&content)?.entries)
    }
}

/// Reference entries held in memory.
#[derive(Debug, Clone)]
pub struct StaticSource {
    identifier: String,
    entries: Vec<DetectionEntry>,
}

impl StaticSource {
    pub fn new(identifier: impl Into<String>, entries: Vec<DetectionEntry>) -> Self {
        Self {
            identifier: identifier.into(),
            entries,
        }
    }
}

impl ReferenceSource for StaticSource {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn load(&self) -> Result<Vec<DetectionEntry>, ReferenceError> {
        Ok(self.entries.clone())
    }
}

/// File name with every `.json` removed: `001.colors.json` becomes `001.colors`.
pub fn identifier_for(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().replace(".json", ""))
        .unwrap_or_default()
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("directory '{0}' not found")]
    MissingDirectory(PathBuf),
    #[error("could not list '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceStatus {
    Scored,
    /// Unreadable, malformed or empty; scored as zero.
    Unusable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceResult {
    pub identifier: String,
    pub status: SourceStatus,
    pub reference: AggregatedReference,
    pub comparison: Comparison,
}

impl SourceResult {
    pub fn score(&self) -> f64 {
        self.comparison.score
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoreReport {
    pub results: Vec<SourceResult>,
}

impl ScoreReport {
    /// Scores keyed by source identifier.
    pub fn scores(&self) -> BTreeMap<String, f64> {
        self.results
            .iter()
            .map(|r| (r.identifier.clone(), r.score()))
            .collect()
    }

    /// Highest-scoring source; the earliest one wins a tie.
    pub fn best(&self) -> Option<&SourceResult> {
        let mut best: Option<&SourceResult> = None;
        for result in &self.results {
            match best {
                Some(current) if result.score() <= current.score() => {}
                _ => best = Some(result),
            }
        }
        best
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

pub struct ScoringEngine {
    sources: Vec<Box<dyn ReferenceSource>>,
}

impl ScoringEngine {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    pub fn register<S: ReferenceSource + 'static>(mut self, source: S) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Register every file in `dir` whose name ends with `suffix`, sorted by name.
    pub fn from_directory(dir: &Path, suffix: &str) -> Result<Self, EngineError> {
        if !dir.is_dir() {
            return Err(EngineError::MissingDirectory(dir.to_path_buf()));
        }

        let read_dir = std::fs::read_dir(dir).map_err(|source| EngineError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = read_dir
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .is_some_and(|name| name.to_string_lossy().ends_with(suffix))
            })
            .collect();
        paths.sort();

        if paths.is_empty() {
            log::warn!("no {} files found in {}", suffix, dir.display());
        } else {
            log::info!("found {} reference file(s) in {}", paths.len(), dir.display());
        }

        Ok(paths
            .into_iter()
            .fold(Self::new(), |engine, path| engine.register(FileSource::new(path))))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Score `user` against every registered source, in registration order.
    pub fn run(&self, user: &UserMapping) -> ScoreReport {
        let results = self
            .sources
            .iter()
            .map(|source| score_source(source.as_ref(), user))
            .collect();
        ScoreReport { results }
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn score_source(source: &dyn ReferenceSource, user: &UserMapping) -> SourceResult {
    let identifier = source.identifier().to_string();

    let reference = match source.load() {
        Ok(entries) => aggregate(&entries),
        Err(e) => {
            log::info!("{}: {}", identifier, e);
            return unusable(identifier, e.to_string());
        }
    };

    if reference.is_empty() {
        log::info!("{}: no detections", identifier);
        return unusable(identifier, "no detections".to_string());
    }

    let comparison = compare(user, &reference.colors);
    log::info!("{}: score {:.3}", identifier, comparison.score);

    SourceResult {
        identifier,
        status: SourceStatus::Scored,
        reference,
        comparison,
    }
}

fn unusable(identifier: String, reason: String) -> SourceResult {
    SourceResult {
        identifier,
        status: SourceStatus::Unusable(reason),
        reference: AggregatedReference::default(),
        comparison: Comparison::default(),
    }
}
