use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::resource::{KindRegistry, OwnerReference, ResourceKind, ResourceRecord, Uid};

/// One immutable snapshot of the cluster, as handed over by the resource
/// source. Rebuilt from scratch on every refresh; a kind whose fetch failed
/// upstream is simply absent from the record list.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    records: Vec<ResourceRecord>,
    index: BTreeMap<Uid, usize>,
}

impl Snapshot {
    pub fn from_records(records: Vec<ResourceRecord>) -> Self {
        let mut snapshot = Self::default();
        for record in records {
            snapshot.push(record);
        }
        snapshot
    }

    fn push(&mut self, record: ResourceRecord) {
        if self.index.contains_key(&record.uid) {
            tracing::warn!(uid = %record.uid, "duplicate uid in snapshot, keeping first");
            return;
        }
        self.index.insert(record.uid.clone(), self.records.len());
        self.records.push(record);
    }

    pub fn records(&self) -> &[ResourceRecord] {
        &self.records
    }

    pub fn get(&self, uid: &str) -> Option<&ResourceRecord> {
        self.index.get(uid).map(|idx| &self.records[*idx])
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.index.contains_key(uid)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot document is neither valid JSON nor valid YAML")]
    Undecodable,
    #[error("unsupported snapshot document shape (expected per-kind lists, an array, or a List object)")]
    UnsupportedShape,
}

/// Parse a snapshot document. Three shapes are accepted: an object mapping
/// kind names to arrays, a flat array of objects, or a Kubernetes `List`.
/// Malformed individual records are skipped, never fatal.
pub fn parse_snapshot(doc: &Value, registry: &KindRegistry) -> Result<Snapshot, SnapshotError> {
    match doc {
        Value::Array(items) => Ok(records_from_items(items, None, registry)),
        Value::Object(map) => {
            if let Some(Value::Array(items)) = map.get("items") {
                return Ok(records_from_items(items, None, registry));
            }
            let mut snapshot = Snapshot::default();
            for (key, value) in map {
                let Value::Array(items) = value else {
                    tracing::warn!(key = %key, "snapshot entry is not a list, skipping");
                    continue;
                };
                let implied = match ResourceKind::parse(key) {
                    ResourceKind::Other(_) => None,
                    kind => Some(kind),
                };
                for record in records_from_items(items, implied, registry).records {
                    snapshot.push(record);
                }
            }
            if snapshot.is_empty() && !map.is_empty() && map.values().all(|v| !v.is_array()) {
                return Err(SnapshotError::UnsupportedShape);
            }
            Ok(snapshot)
        }
        _ => Err(SnapshotError::UnsupportedShape),
    }
}

pub fn parse_snapshot_str(text: &str, registry: &KindRegistry) -> Result<Snapshot, SnapshotError> {
    let doc: Value = match serde_json::from_str(text) {
        Ok(doc) => doc,
        Err(_) => serde_yaml::from_str(text).map_err(|_| SnapshotError::Undecodable)?,
    };
    parse_snapshot(&doc, registry)
}

fn records_from_items(
    items: &[Value],
    implied_kind: Option<ResourceKind>,
    registry: &KindRegistry,
) -> Snapshot {
    let mut snapshot = Snapshot::default();
    for item in items {
        match record_from_value(item, implied_kind.clone(), registry) {
            Some(record) => snapshot.push(record),
            None => {
                tracing::warn!("skipping record with incomplete metadata");
            }
        }
    }
    snapshot
}

fn record_from_value(
    item: &Value,
    implied_kind: Option<ResourceKind>,
    registry: &KindRegistry,
) -> Option<ResourceRecord> {
    let metadata = item.get("metadata")?;
    let uid = metadata.get("uid")?.as_str()?.to_string();
    let name = metadata.get("name")?.as_str()?.to_string();

    let kind = item
        .get("kind")
        .and_then(Value::as_str)
        .map(ResourceKind::parse)
        .or(implied_kind)?;

    let api_version = item
        .get("apiVersion")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| registry.api_version_for(&kind).to_string());

    let namespace = metadata
        .get("namespace")
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut labels = BTreeMap::new();
    if let Some(Value::Object(map)) = metadata.get("labels") {
        for (key, value) in map {
            if let Some(value) = value.as_str() {
                labels.insert(key.clone(), value.to_string());
            }
        }
    }

    let mut owner_references = Vec::new();
    if let Some(Value::Array(refs)) = metadata.get("ownerReferences") {
        for owner in refs {
            let Some(owner_uid) = owner.get("uid").and_then(Value::as_str) else {
                continue;
            };
            let kind = owner
                .get("kind")
                .and_then(Value::as_str)
                .map(ResourceKind::parse)
                .unwrap_or(ResourceKind::Other(String::new()));
            let name = owner
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            owner_references.push(OwnerReference {
                uid: owner_uid.to_string(),
                kind,
                name,
            });
        }
    }

    Some(ResourceRecord {
        uid,
        kind,
        api_version,
        name,
        namespace,
        labels,
        owner_references,
        spec: item.get("spec").cloned().unwrap_or(Value::Null),
        status: item.get("status").cloned().unwrap_or(Value::Null),
    })
}
