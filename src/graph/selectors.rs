use std::collections::BTreeMap;

use serde_json::Value;

use crate::resource::{ResourceKind, ResourceRecord, Uid};
use crate::snapshot::Snapshot;

use super::{EdgeKind, EdgeSink};

/// Exact multi-key match: every selector pair must appear in the labels.
pub(super) fn selector_matches(
    selector: &BTreeMap<String, String>,
    labels: &BTreeMap<String, String>,
) -> bool {
    selector
        .iter()
        .all(|(key, value)| labels.get(key) == Some(value))
}

/// A flat string→string selector object, `None` when absent or malformed.
pub(super) fn selector_from_value(value: Option<&Value>) -> Option<BTreeMap<String, String>> {
    let map = value?.as_object()?;
    let mut selector = BTreeMap::new();
    for (key, value) in map {
        selector.insert(key.clone(), value.as_str()?.to_string());
    }
    Some(selector)
}

pub(super) fn live_pods_by_namespace<'a>(
    snapshot: &'a Snapshot,
    static_pods: &std::collections::BTreeSet<Uid>,
) -> BTreeMap<String, Vec<&'a ResourceRecord>> {
    let mut pods: BTreeMap<String, Vec<&ResourceRecord>> = BTreeMap::new();
    for record in snapshot.records() {
        if record.kind == ResourceKind::Pod && !static_pods.contains(&record.uid) {
            pods.entry(record.namespace_key().to_string())
                .or_default()
                .push(record);
        }
    }
    pods
}

pub(super) fn emit_selector_edges(
    snapshot: &Snapshot,
    pods_by_namespace: &BTreeMap<String, Vec<&ResourceRecord>>,
    host_of: &BTreeMap<Uid, Uid>,
    sink: &mut EdgeSink,
) {
    for record in snapshot.records() {
        let (selector, edge_kind) = match &record.kind {
            ResourceKind::Service => {
                // An empty service selector selects nothing.
                let Some(selector) = selector_from_value(record.spec.get("selector")) else {
                    continue;
                };
                if selector.is_empty() {
                    continue;
                }
                (selector, EdgeKind::Service)
            }
            kind if kind.is_controller() => {
                let Some(selector) =
                    selector_from_value(record.spec.pointer("/selector/matchLabels"))
                else {
                    continue;
                };
                if selector.is_empty() {
                    continue;
                }
                (selector, EdgeKind::Selector)
            }
            _ => continue,
        };

        let Some(pods) = pods_by_namespace.get(record.namespace_key()) else {
            continue;
        };
        for pod in pods {
            if !selector_matches(&selector, &pod.labels) {
                continue;
            }
            // Owner attribution already ties the pod to this controller.
            if edge_kind == EdgeKind::Selector
                && host_of.get(&pod.uid) == Some(&record.uid)
            {
                continue;
            }
            sink.push(&record.uid, &pod.uid, edge_kind);
        }
    }
}
