//! Snapshot lifecycle registry
//!
//! Tracks which externally-captured fact-bundle files can be loaded, which
//! snapshots are present in the store, and which one queries should focus
//! on. Multiple snapshots coexist in the store, isolated by snapshot id;
//! loading is idempotent and deletion removes exactly one snapshot's
//! tagged entities.

use crate::graph::GraphBackend;
use crate::ingest::{IngestError, IngestionSummary, TopologyIngestionEngine};
use crate::model::NetworkSnapshot;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Errors surfaced by registry operations
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("snapshot file access failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot file decode failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid snapshot selector: {0}")]
    InvalidSelector(String),

    #[error("snapshot {0:?} is not loaded")]
    NotLoaded(String),

    #[error(transparent)]
    Ingest(#[from] IngestError),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Metadata of one loadable fact-bundle file.
#[derive(Debug, Clone)]
pub struct CapturableSnapshot {
    /// 1-based position in the newest-first listing.
    pub index: usize,
    pub filename: String,
    pub path: PathBuf,
    pub snapshot_id: String,
    /// Human-readable timestamp derived from the snapshot id, if it parses.
    pub timestamp: Option<String>,
    pub devices: usize,
    pub size_kb: f64,
}

/// How a snapshot to load is identified.
#[derive(Debug, Clone)]
pub enum SnapshotSelector {
    /// 1-based index into [`SnapshotRegistry::list_capturable`].
    Index(usize),
    /// Direct path to a fact-bundle file.
    Path(PathBuf),
}

/// Result of a load call.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub snapshot_id: String,
    /// True when the snapshot was already in the store and ingestion was
    /// skipped entirely.
    pub already_loaded: bool,
    pub summary: Option<IngestionSummary>,
}

/// One snapshot present in the store.
#[derive(Debug, Clone)]
pub struct LoadedSnapshot {
    pub snapshot_id: String,
    pub device_count: i64,
    pub is_active: bool,
}

/// Manages snapshot discovery, loading, focus, and deletion.
pub struct SnapshotRegistry {
    snapshots_dir: PathBuf,
    engine: TopologyIngestionEngine,
    active: Option<String>,
}

impl SnapshotRegistry {
    pub fn new(snapshots_dir: impl Into<PathBuf>) -> Self {
        SnapshotRegistry {
            snapshots_dir: snapshots_dir.into(),
            engine: TopologyIngestionEngine::new(),
            active: None,
        }
    }

    pub fn snapshots_dir(&self) -> &Path {
        &self.snapshots_dir
    }

    /// Enumerate loadable fact-bundle files, newest first by filename.
    pub fn list_capturable(&self) -> RegistryResult<Vec<CapturableSnapshot>> {
        let mut paths: Vec<PathBuf> = match std::fs::read_dir(&self.snapshots_dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        paths.sort();
        paths.reverse();

        let mut snapshots: Vec<CapturableSnapshot> = Vec::new();
        for path in &paths {
            let document: NetworkSnapshot = match read_snapshot_file(path) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!("skipping unreadable snapshot file {}: {}", path.display(), e);
                    continue;
                }
            };
            let size_kb = std::fs::metadata(path)?.len() as f64 / 1024.0;
            snapshots.push(CapturableSnapshot {
                index: snapshots.len() + 1,
                filename: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                path: path.clone(),
                timestamp: derive_timestamp(&document.snapshot_id),
                devices: document.devices.len(),
                snapshot_id: document.snapshot_id,
                size_kb,
            });
        }
        Ok(snapshots)
    }

    /// Load a fact-bundle file into the store.
    ///
    /// If its snapshot id is already present, ingestion is skipped entirely
    /// — but the active pointer may still move to it, so callers can switch
    /// focus without re-running correlation.
    pub fn load<B: GraphBackend>(
        &mut self,
        store: &mut B,
        selector: &SnapshotSelector,
        set_active: bool,
    ) -> RegistryResult<LoadOutcome> {
        let path = self.resolve_selector(selector)?;
        let document = read_snapshot_file(&path)?;
        let snapshot_id = document.snapshot_id.clone();

        if self.is_loaded(store, &snapshot_id) {
            info!("snapshot {} already loaded, skipping ingestion", snapshot_id);
            if set_active {
                self.active = Some(snapshot_id.clone());
            }
            return Ok(LoadOutcome {
                snapshot_id,
                already_loaded: true,
                summary: None,
            });
        }

        let summary = self
            .engine
            .ingest(store, &snapshot_id, &document.devices)?;

        if set_active {
            self.active = Some(snapshot_id.clone());
            info!("active snapshot set to {}", snapshot_id);
        }
        Ok(LoadOutcome {
            snapshot_id,
            already_loaded: false,
            summary: Some(summary),
        })
    }

    pub fn is_loaded<B: GraphBackend>(&self, store: &B, snapshot_id: &str) -> bool {
        store.get_node("Snapshot", snapshot_id).is_some()
    }

    /// Focus queries on one loaded snapshot.
    pub fn set_active<B: GraphBackend>(
        &mut self,
        store: &B,
        snapshot_id: &str,
    ) -> RegistryResult<()> {
        if !self.is_loaded(store, snapshot_id) {
            return Err(RegistryError::NotLoaded(snapshot_id.to_string()));
        }
        self.active = Some(snapshot_id.to_string());
        Ok(())
    }

    pub fn get_active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn clear_active(&mut self) {
        self.active = None;
    }

    /// Delete one snapshot from the store: its tagged relationships first,
    /// then its tagged nodes, then the snapshot node itself. Device nodes
    /// are never removed. Returns false when the snapshot was not loaded.
    pub fn delete<B: GraphBackend>(
        &mut self,
        store: &mut B,
        snapshot_id: &str,
    ) -> RegistryResult<bool> {
        if !self.is_loaded(store, snapshot_id) {
            info!("snapshot {} is not loaded, nothing to delete", snapshot_id);
            return Ok(false);
        }

        let deleted = store.delete_by_tag("snapshot_id", snapshot_id);
        store.delete_node("Snapshot", snapshot_id);
        info!(
            "snapshot {} deleted ({} relationships, {} nodes)",
            snapshot_id, deleted.relationships, deleted.nodes
        );

        if self.active.as_deref() == Some(snapshot_id) {
            self.active = None;
            info!("active snapshot cleared");
        }
        Ok(true)
    }

    /// Snapshots present in the store, newest first.
    pub fn list_loaded<B: GraphBackend>(&self, store: &B) -> Vec<LoadedSnapshot> {
        let mut loaded: Vec<LoadedSnapshot> = store
            .nodes_by_label("Snapshot")
            .into_iter()
            .map(|node| LoadedSnapshot {
                snapshot_id: node.key.clone(),
                device_count: node
                    .get_property("device_count")
                    .and_then(|v| v.as_integer())
                    .unwrap_or(0),
                is_active: self.active.as_deref() == Some(node.key.as_str()),
            })
            .collect();
        loaded.sort_by(|a, b| b.snapshot_id.cmp(&a.snapshot_id));
        loaded
    }

    fn resolve_selector(&self, selector: &SnapshotSelector) -> RegistryResult<PathBuf> {
        match selector {
            SnapshotSelector::Index(index) => {
                let snapshots = self.list_capturable()?;
                if *index < 1 || *index > snapshots.len() {
                    return Err(RegistryError::InvalidSelector(format!(
                        "index {} out of range 1-{}",
                        index,
                        snapshots.len()
                    )));
                }
                Ok(snapshots[index - 1].path.clone())
            }
            SnapshotSelector::Path(path) => {
                if !path.exists() {
                    return Err(RegistryError::InvalidSelector(format!(
                        "snapshot file not found: {}",
                        path.display()
                    )));
                }
                Ok(path.clone())
            }
        }
    }
}

fn read_snapshot_file(path: &Path) -> RegistryResult<NetworkSnapshot> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn derive_timestamp(snapshot_id: &str) -> Option<String> {
    let parsed = chrono::NaiveDateTime::parse_from_str(snapshot_id, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| chrono::NaiveDateTime::parse_from_str(snapshot_id, "%Y-%m-%dT%H:%M:%S"))
        .ok()?;
    Some(parsed.format("%Y-%m-%d %H:%M:%S").to_string())
}
