use std::collections::BTreeMap;

use serde_json::Value;

use crate::resource::{ResourceKind, Uid};
use crate::snapshot::Snapshot;

use super::{EdgeKind, EdgeSink};

pub(super) fn emit_routing_edges(snapshot: &Snapshot, sink: &mut EdgeSink) {
    let services = index_by_name(snapshot, ResourceKind::Service);
    let gateways = index_by_name(snapshot, ResourceKind::Gateway);

    for record in snapshot.records() {
        match record.kind {
            ResourceKind::Ingress => {
                for service_name in ingress_backend_services(&record.spec) {
                    let key = (record.namespace_key().to_string(), service_name);
                    if let Some(service_uid) = services.get(&key) {
                        sink.push(&record.uid, service_uid, EdgeKind::Ingress);
                    }
                }
            }
            ResourceKind::HttpRoute | ResourceKind::GrpcRoute => {
                for reference in object_refs(record.spec.get("parentRefs"), "Gateway") {
                    let namespace = reference
                        .namespace
                        .unwrap_or_else(|| record.namespace_key().to_string());
                    if let Some(gateway_uid) = gateways.get(&(namespace, reference.name)) {
                        sink.push(gateway_uid, &record.uid, EdgeKind::Gateway);
                    }
                }
                let Some(rules) = record.spec.get("rules").and_then(Value::as_array) else {
                    continue;
                };
                for rule in rules {
                    for reference in object_refs(rule.get("backendRefs"), "Service") {
                        let namespace = reference
                            .namespace
                            .unwrap_or_else(|| record.namespace_key().to_string());
                        if let Some(service_uid) = services.get(&(namespace, reference.name)) {
                            sink.push(&record.uid, service_uid, EdgeKind::Service);
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

fn index_by_name(snapshot: &Snapshot, kind: ResourceKind) -> BTreeMap<(String, String), Uid> {
    let mut index = BTreeMap::new();
    for record in snapshot.records() {
        if record.kind == kind {
            index.insert(
                (record.namespace_key().to_string(), record.name.clone()),
                record.uid.clone(),
            );
        }
    }
    index
}

fn ingress_backend_services(spec: &Value) -> Vec<String> {
    let mut names = Vec::new();
    if let Some(name) = spec
        .pointer("/defaultBackend/service/name")
        .and_then(Value::as_str)
    {
        names.push(name.to_string());
    }
    if let Some(rules) = spec.get("rules").and_then(Value::as_array) {
        for rule in rules {
            let Some(paths) = rule.pointer("/http/paths").and_then(Value::as_array) else {
                continue;
            };
            for path in paths {
                if let Some(name) = path
                    .pointer("/backend/service/name")
                    .and_then(Value::as_str)
                {
                    names.push(name.to_string());
                }
            }
        }
    }
    names
}

struct ObjectRef {
    name: String,
    namespace: Option<String>,
}

/// Gateway-API object references, keeping only those whose kind (after the
/// implicit default) matches `default_kind`.
fn object_refs(list: Option<&Value>, default_kind: &str) -> Vec<ObjectRef> {
    let Some(list) = list.and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut refs = Vec::new();
    for value in list {
        let Some(name) = value.get("name").and_then(Value::as_str) else {
            continue;
        };
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .unwrap_or(default_kind);
        if kind != default_kind {
            continue;
        }
        refs.push(ObjectRef {
            name: name.to_string(),
            namespace: value
                .get("namespace")
                .and_then(Value::as_str)
                .map(str::to_string),
        });
    }
    refs
}
