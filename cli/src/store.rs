//! Token persistence in a small JSON key-value file.
//!
//! The file holds a JSON object. The auth token lives under `TOKEN_KEY`;
//! any other keys found in the file are preserved on write.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use carmod_core::{TokenStore, TOKEN_KEY};
use serde_json::{Map, Value};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<data dir>/carmod/storage.json`, or `./carmod-storage.json` when the
    /// platform has no data directory.
    pub fn default_path() -> PathBuf {
        match dirs::data_dir() {
            Some(mut dir) => {
                dir.push("carmod");
                dir.push("storage.json");
                dir
            }
            None => PathBuf::from("carmod-storage.json"),
        }
    }

    fn read_map(&self) -> io::Result<Map<String, Value>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e),
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} is not a JSON object", self.path.display()),
            )),
            Err(e) => Err(io::Error::new(io::ErrorKind::InvalidData, e)),
        }
    }

    /// The map to rewrite on save or clear. An unreadable file is replaced
    /// by an empty object, and the loss is logged.
    fn map_for_write(&self) -> Map<String, Value> {
        match self.read_map() {
            Ok(map) => map,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "token file is unreadable, its contents will be replaced"
                );
                Map::new()
            }
        }
    }

    fn write_map(&self, map: Map<String, Value>) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(&Value::Object(map))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, text)
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> io::Result<Option<String>> {
        let map = self.read_map()?;
        Ok(map
            .get(TOKEN_KEY)
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string))
    }

    fn save(&mut self, token: &str) -> io::Result<()> {
        let mut map = self.map_for_write();
        map.insert(TOKEN_KEY.to_string(), Value::String(token.to_string()));
        self.write_map(map)
    }

    fn clear(&mut self) -> io::Result<()> {
        let mut map = self.map_for_write();
        if map.remove(TOKEN_KEY).is_none() && !self.path.exists() {
            return Ok(());
        }
        self.write_map(map)
    }
}
