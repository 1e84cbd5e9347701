//! Server store backed by a single JSON file.

use super::models::StoredServerRow;
use crate::config::ToolRegistryConfig;
use crate::tool_registry::{
    domain::PersistedServerData,
    ports::{ServerStore, ServerStoreError, ServerStoreResult},
};
use async_trait::async_trait;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::io::ErrorKind;
use std::sync::Arc;

/// Server store persisting the configured set as a pretty-printed JSON array.
///
/// Writes go to a sibling temporary file that is then renamed over the
/// target, so readers never observe a partially written set.
#[derive(Debug, Clone)]
pub struct JsonFileServerStore {
    dir: Arc<Dir>,
    file_name: String,
}

impl JsonFileServerStore {
    /// Opens a store at `path`, creating the parent directory if needed.
    ///
    /// The file itself is created on first load or save.
    ///
    /// # Errors
    ///
    /// Returns [`ServerStoreError::Io`] when `path` has no file name or the
    /// parent directory cannot be created or opened.
    pub fn open(path: &Utf8Path) -> ServerStoreResult<Self> {
        let file_name = path.file_name().ok_or_else(|| {
            ServerStoreError::io(std::io::Error::other("store path must include a file name"))
        })?;
        let parent = path
            .parent()
            .filter(|candidate| !candidate.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."));

        Dir::create_ambient_dir_all(parent, ambient_authority())
            .map_err(ServerStoreError::io)?;
        let dir =
            Dir::open_ambient_dir(parent, ambient_authority()).map_err(ServerStoreError::io)?;

        Ok(Self {
            dir: Arc::new(dir),
            file_name: file_name.to_owned(),
        })
    }

    /// Opens the store named by the configured `store_path`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerStoreError::Io`] under the same conditions as
    /// [`Self::open`].
    pub fn from_config(config: &ToolRegistryConfig) -> ServerStoreResult<Self> {
        Self::open(&config.store_path)
    }

    async fn run_blocking<F, T>(&self, operation: F) -> ServerStoreResult<T>
    where
        F: FnOnce(&Dir, &str) -> ServerStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let dir = Arc::clone(&self.dir);
        let file_name = self.file_name.clone();
        tokio::task::spawn_blocking(move || operation(&dir, &file_name))
            .await
            .map_err(ServerStoreError::io)?
    }
}

#[async_trait]
impl ServerStore for JsonFileServerStore {
    async fn load(&self) -> ServerStoreResult<Vec<PersistedServerData>> {
        self.run_blocking(|dir, file_name| {
            let contents = match dir.read_to_string(file_name) {
                Ok(contents) => contents,
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    write_rows(dir, file_name, &[])?;
                    return Ok(Vec::new());
                }
                Err(err) => return Err(ServerStoreError::io(err)),
            };

            let rows: Vec<StoredServerRow> =
                serde_json::from_str(&contents).map_err(ServerStoreError::corrupt)?;
            rows.into_iter()
                .map(|row| row.into_persisted().map_err(ServerStoreError::corrupt))
                .collect()
        })
        .await
    }

    async fn save(&self, servers: &[PersistedServerData]) -> ServerStoreResult<()> {
        let rows: Vec<StoredServerRow> = servers.iter().map(StoredServerRow::from).collect();
        self.run_blocking(move |dir, file_name| write_rows(dir, file_name, &rows))
            .await
    }
}

fn write_rows(dir: &Dir, file_name: &str, rows: &[StoredServerRow]) -> ServerStoreResult<()> {
    let mut buffer = Vec::new();
    let mut serializer =
        Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    rows.serialize(&mut serializer)
        .map_err(ServerStoreError::io)?;

    let temp_name = format!(".{file_name}.tmp");
    dir.write(&temp_name, &buffer).map_err(ServerStoreError::io)?;
    dir.rename(&temp_name, dir, file_name)
        .map_err(ServerStoreError::io)
}
