//! Saving compositions to disk.
//! Every composition is a pretty printed JSON file in the store directory, named after the composition.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;

use super::{file_name, Composition, Summary};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("composition '{name}' not found")]
    NotFound { name: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid composition file {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub struct Store {
    dir: PathBuf,
}

impl Store {
    /// Opens a store, creating its directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;

        Ok(Self { dir })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(file_name(name))
    }

    /// Writes a composition to disk, updating its modified date first.
    pub fn save(&self, composition: &mut Composition) -> StoreResult<()> {
        let path = self.path(&composition.name);
        composition.touch();

        let json = serde_json::to_string_pretty(&*composition).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| StoreError::Io { path, source })?;
        println!("[*] Composition '{}' saved.", composition.name);
        Ok(())
    }

    /// Makes a new composition and saves it.
    pub fn create(&self, mut composition: Composition) -> StoreResult<Composition> {
        self.save(&mut composition)?;
        Ok(composition)
    }

    /// Reads a composition from disk by name.
    pub fn load(&self, name: &str) -> StoreResult<Composition> {
        let path = self.path(name);
        let composition = read(&path).map_err(|e| match e {
            StoreError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                StoreError::NotFound {
                    name: name.to_owned(),
                }
            }
            e => e,
        })?;

        println!("[*] Composition '{}' loaded.", composition.name);
        Ok(composition)
    }

    /// Summaries of every saved composition, sorted by name.
    /// Files that can't be read are skipped with a warning.
    pub fn list(&self) -> StoreResult<Vec<Summary>> {
        let entries = fs::read_dir(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut out = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(i) => i.path(),
                Err(e) => {
                    eprintln!("[W] Error reading {}: {e}", self.dir.display());
                    continue;
                }
            };

            if path.extension().and_then(|x| x.to_str()) != Some("json") {
                continue;
            }

            match read(&path) {
                Ok(i) => out.push(i.summary()),
                Err(e) => eprintln!("[W] Skipping {e}"),
            }
        }

        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    /// Removes a saved composition.
    pub fn delete(&self, name: &str) -> StoreResult<()> {
        let path = self.path(name);
        fs::remove_file(&path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound {
                name: name.to_owned(),
            },
            _ => StoreError::Io { path, source },
        })?;

        println!("[*] Composition '{name}' deleted.");
        Ok(())
    }

    /// Checks if a composition with this name has been saved.
    pub fn contains(&self, name: &str) -> bool {
        self.path(name).is_file()
    }
}

fn read(path: &Path) -> StoreResult<Composition> {
    let raw = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_owned(),
        source,
    })?;

    serde_json::from_str(&raw).map_err(|source| StoreError::Json {
        path: path.to_owned(),
        source,
    })
}
