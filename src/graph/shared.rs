use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::resource::{ResourceKind, Uid};
use crate::snapshot::Snapshot;

use super::owners::{Ownership, root_owner};

#[derive(Debug, Default)]
pub(super) struct SharedRefs {
    /// Config resources referenced by more than one distinct root owner.
    /// These must never produce a connectivity edge.
    pub shared: BTreeSet<Uid>,
    /// Config resources referenced by exactly one root owner.
    pub exclusive: BTreeMap<Uid, ExclusiveRef>,
}

#[derive(Debug)]
pub(super) struct ExclusiveRef {
    pub root: Uid,
    pub pods: Vec<Uid>,
}

pub(super) fn resolve_references(snapshot: &Snapshot, ownership: &Ownership) -> SharedRefs {
    let mut config_index: BTreeMap<(String, ResourceKind, String), Uid> = BTreeMap::new();
    for record in snapshot.records() {
        if record.kind.is_config() {
            config_index.insert(
                (
                    record.namespace_key().to_string(),
                    record.kind.clone(),
                    record.name.clone(),
                ),
                record.uid.clone(),
            );
        }
    }

    #[derive(Default)]
    struct Usage {
        roots: BTreeSet<Uid>,
        pods: BTreeSet<Uid>,
    }
    let mut usage: BTreeMap<Uid, Usage> = BTreeMap::new();

    for record in snapshot.records() {
        if record.kind != ResourceKind::Pod || ownership.static_pods.contains(&record.uid) {
            continue;
        }
        let root = root_owner(&record.uid, &ownership.parent_of);
        for (kind, name) in collect_config_refs(&record.spec) {
            let key = (record.namespace_key().to_string(), kind, name);
            let Some(config_uid) = config_index.get(&key) else {
                continue;
            };
            let entry = usage.entry(config_uid.clone()).or_default();
            entry.roots.insert(root.clone());
            entry.pods.insert(record.uid.clone());
        }
    }

    let mut refs = SharedRefs::default();
    for (config_uid, entry) in usage {
        // Connectable only when the root-owner count is exactly one.
        if entry.roots.len() == 1 {
            let root = entry.roots.into_iter().next().unwrap_or_default();
            refs.exclusive.insert(
                config_uid,
                ExclusiveRef {
                    root,
                    pods: entry.pods.into_iter().collect(),
                },
            );
        } else {
            tracing::debug!(
                uid = %config_uid,
                roots = entry.roots.len(),
                "config resource shared across workloads, suppressing edges"
            );
            refs.shared.insert(config_uid);
        }
    }
    refs
}

/// Every ConfigMap/Secret/PVC name a pod spec references: volumes, projected
/// sources, and env/envFrom of regular and init containers.
fn collect_config_refs(spec: &Value) -> Vec<(ResourceKind, String)> {
    let mut out = Vec::new();

    if let Some(volumes) = spec.get("volumes").and_then(Value::as_array) {
        for volume in volumes {
            push_ref(&mut out, ResourceKind::ConfigMap, volume, "/configMap/name");
            push_ref(&mut out, ResourceKind::Secret, volume, "/secret/secretName");
            push_ref(
                &mut out,
                ResourceKind::PersistentVolumeClaim,
                volume,
                "/persistentVolumeClaim/claimName",
            );
            if let Some(sources) = volume.pointer("/projected/sources").and_then(Value::as_array) {
                for source in sources {
                    push_ref(&mut out, ResourceKind::ConfigMap, source, "/configMap/name");
                    push_ref(&mut out, ResourceKind::Secret, source, "/secret/name");
                }
            }
        }
    }

    for list in ["containers", "initContainers"] {
        let Some(containers) = spec.get(list).and_then(Value::as_array) else {
            continue;
        };
        for container in containers {
            if let Some(env) = container.get("env").and_then(Value::as_array) {
                for entry in env {
                    push_ref(
                        &mut out,
                        ResourceKind::ConfigMap,
                        entry,
                        "/valueFrom/configMapKeyRef/name",
                    );
                    push_ref(
                        &mut out,
                        ResourceKind::Secret,
                        entry,
                        "/valueFrom/secretKeyRef/name",
                    );
                }
            }
            if let Some(env_from) = container.get("envFrom").and_then(Value::as_array) {
                for entry in env_from {
                    push_ref(&mut out, ResourceKind::ConfigMap, entry, "/configMapRef/name");
                    push_ref(&mut out, ResourceKind::Secret, entry, "/secretRef/name");
                }
            }
        }
    }

    out
}

fn push_ref(out: &mut Vec<(ResourceKind, String)>, kind: ResourceKind, value: &Value, path: &str) {
    if let Some(name) = value.pointer(path).and_then(Value::as_str) {
        out.push((kind, name.to_string()));
    }
}
