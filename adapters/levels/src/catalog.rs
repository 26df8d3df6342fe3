use std::{
    collections::HashSet,
    fs, io,
    path::{Path, PathBuf},
};

use log::{debug, warn};
use prismatic_core::Level;
use thiserror::Error;

use crate::format::{FormatError, LevelFile};

/// Level loaded into a catalog together with the document it came from.
#[derive(Clone, Debug)]
pub struct CatalogLevel {
    file: PathBuf,
    source: LevelFile,
    level: Level,
}

impl CatalogLevel {
    /// Path of the file the level was read from.
    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Document as read, with generated fixed-piece ids filled in.
    #[must_use]
    pub fn source(&self) -> &LevelFile {
        &self.source
    }

    /// Engine view of the level.
    #[must_use]
    pub fn level(&self) -> &Level {
        &self.level
    }
}

/// Errors raised while building a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A directory or file could not be read.
    #[error("could not read {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A level file is malformed.
    #[error("{path}: {source}")]
    Format {
        /// File that failed.
        path: PathBuf,
        /// Underlying format error.
        #[source]
        source: FormatError,
    },
}

/// Levels ordered by difficulty and then by id.
#[derive(Clone, Debug, Default)]
pub struct LevelCatalog {
    levels: Vec<CatalogLevel>,
}

impl LevelCatalog {
    /// Loads every `*.json` file in `dir` except `solutions.json`.
    pub fn load_dir(dir: &Path) -> Result<Self, CatalogError> {
        let entries = fs::read_dir(dir).map_err(|source| CatalogError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| CatalogError::Io {
                    path: dir.to_path_buf(),
                    source,
                })?
                .path();
            let is_level = path.extension().is_some_and(|ext| ext == "json")
                && path.file_name().is_some_and(|name| name != SOLUTIONS_FILE);
            if is_level {
                files.push(path);
            }
        }
        files.sort();

        if files.is_empty() {
            warn!("no level files found in {}", dir.display());
        }

        let documents = files
            .into_iter()
            .map(|path| {
                fs::read_to_string(&path)
                    .map(|text| (path.clone(), text))
                    .map_err(|source| CatalogError::Io { path, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_documents(documents)
    }

    /// Builds a catalog from `(path, contents)` pairs.
    ///
    /// Fixed pieces without an id are named `fixed-{level}-{index}`. When two
    /// documents share an id, the one read first is kept.
    pub fn from_documents(
        documents: impl IntoIterator<Item = (PathBuf, String)>,
    ) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        let mut levels = Vec::new();

        for (path, text) in documents {
            let mut source = LevelFile::from_json(&text).map_err(|source| CatalogError::Format {
                path: path.clone(),
                source,
            })?;
            for (index, piece) in source.fixed.iter_mut().enumerate() {
                if piece.id.as_deref().map_or(true, str::is_empty) {
                    piece.id = Some(format!("fixed-{}-{index}", source.id));
                }
                piece.fixed = Some(true);
            }
            let level = source.to_level().map_err(|source| CatalogError::Format {
                path: path.clone(),
                source,
            })?;

            if !seen.insert(level.id.clone()) {
                warn!(
                    "{} repeats level id {}, keeping the earlier file",
                    path.display(),
                    level.id
                );
                continue;
            }
            levels.push(CatalogLevel {
                file: path,
                source,
                level,
            });
        }

        levels.sort_by(|a, b| {
            (a.level.difficulty, &a.level.id).cmp(&(b.level.difficulty, &b.level.id))
        });
        debug!("catalog holds {} levels", levels.len());
        Ok(Self { levels })
    }

    /// Level with the given id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CatalogLevel> {
        self.levels.iter().find(|entry| entry.level.id == id)
    }

    /// Levels in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &CatalogLevel> {
        self.levels.iter()
    }

    /// Number of levels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Reports whether the catalog holds no levels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// File name reserved for reference solutions next to the levels.
pub const SOLUTIONS_FILE: &str = "solutions.json";
