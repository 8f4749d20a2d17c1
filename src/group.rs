use std::collections::{BTreeMap, BTreeSet};

use crate::graph::RelationGraph;
use crate::resource::{NAME_LABEL_PRIORITY, ResourceKind, ResourceRecord, Uid};
use crate::snapshot::Snapshot;

/// One Application-to-be: a maximal connected component, possibly merged
/// with same-named siblings, before any geometry is assigned.
#[derive(Debug, Clone)]
pub struct AppGroup {
    pub name: String,
    pub namespace: Option<String>,
    /// All component member uids, hidden ones included, sorted.
    pub members: Vec<Uid>,
    pub anchor: Uid,
}

impl AppGroup {
    pub fn id(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}/{}", self.name),
            None => self.name.clone(),
        }
    }
}

pub fn group_components(snapshot: &Snapshot, graph: &RelationGraph) -> Vec<AppGroup> {
    let mut visited: BTreeSet<Uid> = BTreeSet::new();
    let mut merged: BTreeMap<(String, String), AppGroup> = BTreeMap::new();

    for seed in graph.adjacency.keys() {
        if visited.contains(seed) {
            continue;
        }
        if is_hidden_seed(seed, snapshot, graph) {
            visited.insert(seed.clone());
            continue;
        }

        let members = collect_component(seed, graph, &mut visited);
        let Some(anchor_record) = select_anchor(&members, snapshot) else {
            continue;
        };
        let anchor = anchor_record.uid.clone();
        let name = display_name(anchor_record);
        let namespace = anchor_record.namespace.clone();
        let key = (
            anchor_record.namespace_key().to_string(),
            name.clone(),
        );

        match merged.get_mut(&key) {
            // Same (namespace, name) pair: one Application, laid out side
            // by side under one title.
            Some(existing) => {
                existing.members.extend(members);
                existing.members.sort();
                existing.members.dedup();
                if let Some(anchor) = select_anchor(&existing.members, snapshot) {
                    existing.anchor = anchor.uid.clone();
                }
            }
            None => {
                merged.insert(
                    key,
                    AppGroup {
                        name,
                        namespace,
                        members,
                        anchor,
                    },
                );
            }
        }
    }

    merged.into_values().collect()
}

fn is_hidden_seed(uid: &str, snapshot: &Snapshot, graph: &RelationGraph) -> bool {
    let Some(record) = snapshot.get(uid) else {
        return true;
    };
    // A shared config that something owns belongs to nothing visible; an
    // unowned one degrades to a singleton Application.
    graph.shared_configs.contains(uid) && !record.owner_references.is_empty()
}

fn collect_component(
    seed: &str,
    graph: &RelationGraph,
    visited: &mut BTreeSet<Uid>,
) -> Vec<Uid> {
    let mut members = Vec::new();
    let mut stack = vec![seed.to_string()];
    while let Some(uid) = stack.pop() {
        if !visited.insert(uid.clone()) {
            continue;
        }
        for neighbor in graph.neighbors(&uid) {
            if !visited.contains(neighbor) {
                stack.push(neighbor.clone());
            }
        }
        members.push(uid);
    }
    members.sort();
    members
}

fn anchor_rank(kind: &ResourceKind) -> Option<usize> {
    match kind {
        ResourceKind::Deployment => Some(0),
        ResourceKind::StatefulSet => Some(1),
        ResourceKind::DaemonSet => Some(2),
        ResourceKind::CronJob => Some(3),
        ResourceKind::Job => Some(4),
        ResourceKind::Pod => Some(5),
        _ => None,
    }
}

fn select_anchor<'a>(members: &[Uid], snapshot: &'a Snapshot) -> Option<&'a ResourceRecord> {
    let records: Vec<&ResourceRecord> = members
        .iter()
        .filter_map(|uid| snapshot.get(uid))
        .collect();
    let ranked = records
        .iter()
        .filter_map(|record| anchor_rank(&record.kind).map(|rank| (rank, *record)))
        .min_by(|(rank_a, a), (rank_b, b)| {
            rank_a
                .cmp(rank_b)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.uid.cmp(&b.uid))
        });
    if let Some((_, record)) = ranked {
        return Some(record);
    }
    // No workload kind in the component: fall back to the lexically-first
    // member.
    records
        .into_iter()
        .min_by(|a, b| {
            a.kind
                .as_str()
                .cmp(b.kind.as_str())
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.uid.cmp(&b.uid))
        })
}

fn display_name(anchor: &ResourceRecord) -> String {
    for key in NAME_LABEL_PRIORITY {
        if let Some(value) = anchor.labels.get(key) {
            if !value.is_empty() {
                return value.clone();
            }
        }
    }
    anchor.name.clone()
}
