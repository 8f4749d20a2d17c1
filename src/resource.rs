use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::Serialize;

/// Snapshot-unique resource identifier. All graph operations index by uid.
pub type Uid = String;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    Pod,
    Deployment,
    ReplicaSet,
    StatefulSet,
    DaemonSet,
    Job,
    CronJob,
    Service,
    Ingress,
    ConfigMap,
    Secret,
    PersistentVolumeClaim,
    NetworkPolicy,
    Gateway,
    HttpRoute,
    GrpcRoute,
    Other(String),
}

static KIND_ALIASES: Lazy<BTreeMap<&'static str, ResourceKind>> = Lazy::new(|| {
    let mut map = BTreeMap::new();
    let entries: [(&[&str], ResourceKind); 16] = [
        (&["Pod", "pod", "pods", "po"], ResourceKind::Pod),
        (
            &["Deployment", "deployment", "deployments", "deploy"],
            ResourceKind::Deployment,
        ),
        (
            &["ReplicaSet", "replicaset", "replicasets", "rs"],
            ResourceKind::ReplicaSet,
        ),
        (
            &["StatefulSet", "statefulset", "statefulsets", "sts"],
            ResourceKind::StatefulSet,
        ),
        (
            &["DaemonSet", "daemonset", "daemonsets", "ds"],
            ResourceKind::DaemonSet,
        ),
        (&["Job", "job", "jobs"], ResourceKind::Job),
        (
            &["CronJob", "cronjob", "cronjobs", "cj"],
            ResourceKind::CronJob,
        ),
        (
            &["Service", "service", "services", "svc"],
            ResourceKind::Service,
        ),
        (
            &["Ingress", "ingress", "ingresses", "ing"],
            ResourceKind::Ingress,
        ),
        (
            &["ConfigMap", "configmap", "configmaps", "cm"],
            ResourceKind::ConfigMap,
        ),
        (&["Secret", "secret", "secrets"], ResourceKind::Secret),
        (
            &[
                "PersistentVolumeClaim",
                "persistentvolumeclaim",
                "persistentvolumeclaims",
                "pvc",
            ],
            ResourceKind::PersistentVolumeClaim,
        ),
        (
            &["NetworkPolicy", "networkpolicy", "networkpolicies", "netpol"],
            ResourceKind::NetworkPolicy,
        ),
        (&["Gateway", "gateway", "gateways"], ResourceKind::Gateway),
        (
            &["HTTPRoute", "httproute", "httproutes"],
            ResourceKind::HttpRoute,
        ),
        (
            &["GRPCRoute", "grpcroute", "grpcroutes"],
            ResourceKind::GrpcRoute,
        ),
    ];
    for (aliases, kind) in entries {
        for alias in aliases {
            map.insert(*alias, kind.clone());
        }
    }
    map
});

impl ResourceKind {
    pub fn parse(token: &str) -> Self {
        KIND_ALIASES
            .get(token)
            .cloned()
            .unwrap_or_else(|| Self::Other(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pod => "Pod",
            Self::Deployment => "Deployment",
            Self::ReplicaSet => "ReplicaSet",
            Self::StatefulSet => "StatefulSet",
            Self::DaemonSet => "DaemonSet",
            Self::Job => "Job",
            Self::CronJob => "CronJob",
            Self::Service => "Service",
            Self::Ingress => "Ingress",
            Self::ConfigMap => "ConfigMap",
            Self::Secret => "Secret",
            Self::PersistentVolumeClaim => "PersistentVolumeClaim",
            Self::NetworkPolicy => "NetworkPolicy",
            Self::Gateway => "Gateway",
            Self::HttpRoute => "HTTPRoute",
            Self::GrpcRoute => "GRPCRoute",
            Self::Other(name) => name.as_str(),
        }
    }

    /// Kinds that can host pods as a visible controller node.
    pub fn is_controller(&self) -> bool {
        matches!(
            self,
            Self::Deployment
                | Self::ReplicaSet
                | Self::StatefulSet
                | Self::DaemonSet
                | Self::Job
                | Self::CronJob
        )
    }

    /// Config-style kinds subject to the shared-reference rule.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::ConfigMap | Self::Secret | Self::PersistentVolumeClaim
        )
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct OwnerReference {
    pub uid: Uid,
    pub kind: ResourceKind,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ResourceRecord {
    pub uid: Uid,
    pub kind: ResourceKind,
    pub api_version: String,
    pub name: String,
    pub namespace: Option<String>,
    pub labels: BTreeMap<String, String>,
    pub owner_references: Vec<OwnerReference>,
    pub spec: serde_json::Value,
    pub status: serde_json::Value,
}

impl ResourceRecord {
    pub fn new(uid: &str, kind: ResourceKind, name: &str) -> Self {
        let api_version = KindRegistry::builtin()
            .api_version_for(&kind)
            .to_string();
        Self {
            uid: uid.to_string(),
            kind,
            api_version,
            name: name.to_string(),
            namespace: None,
            labels: BTreeMap::new(),
            owner_references: Vec::new(),
            spec: serde_json::Value::Null,
            status: serde_json::Value::Null,
        }
    }

    pub fn namespace_key(&self) -> &str {
        self.namespace.as_deref().unwrap_or("")
    }

    pub fn identity(&self) -> ResourceIdentity {
        ResourceIdentity {
            kind: self.kind.as_str().to_string(),
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            api_version: self.api_version.clone(),
            uid: self.uid.clone(),
        }
    }
}

/// Identity tuple handed to the detail-lookup collaborator on selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceIdentity {
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub uid: Uid,
}

/// Label keys consulted for an Application's display name, highest priority
/// first.
pub const NAME_LABEL_PRIORITY: [&str; 6] = [
    "app.kubernetes.io/instance",
    "release",
    "app",
    "app.kubernetes.io/name",
    "k8s-app",
    "app.kubernetes.io/part-of",
];

/// API-resource metadata for the fixed fetched kind set. An explicit object
/// rather than process-wide state; callers that discover additional kinds
/// register them on their own instance.
#[derive(Debug, Clone)]
pub struct KindRegistry {
    api_versions: BTreeMap<ResourceKind, String>,
}

impl KindRegistry {
    pub fn builtin() -> Self {
        let mut api_versions = BTreeMap::new();
        let core = [
            ResourceKind::Pod,
            ResourceKind::Service,
            ResourceKind::ConfigMap,
            ResourceKind::Secret,
            ResourceKind::PersistentVolumeClaim,
        ];
        for kind in core {
            api_versions.insert(kind, "v1".to_string());
        }
        let apps = [
            ResourceKind::Deployment,
            ResourceKind::ReplicaSet,
            ResourceKind::StatefulSet,
            ResourceKind::DaemonSet,
        ];
        for kind in apps {
            api_versions.insert(kind, "apps/v1".to_string());
        }
        api_versions.insert(ResourceKind::Job, "batch/v1".to_string());
        api_versions.insert(ResourceKind::CronJob, "batch/v1".to_string());
        api_versions.insert(
            ResourceKind::Ingress,
            "networking.k8s.io/v1".to_string(),
        );
        api_versions.insert(
            ResourceKind::NetworkPolicy,
            "networking.k8s.io/v1".to_string(),
        );
        api_versions.insert(
            ResourceKind::Gateway,
            "gateway.networking.k8s.io/v1".to_string(),
        );
        api_versions.insert(
            ResourceKind::HttpRoute,
            "gateway.networking.k8s.io/v1".to_string(),
        );
        api_versions.insert(
            ResourceKind::GrpcRoute,
            "gateway.networking.k8s.io/v1".to_string(),
        );
        Self { api_versions }
    }

    pub fn register(&mut self, kind: ResourceKind, api_version: &str) {
        self.api_versions.insert(kind, api_version.to_string());
    }

    pub fn api_version_for(&self, kind: &ResourceKind) -> &str {
        self.api_versions
            .get(kind)
            .map(String::as_str)
            .unwrap_or("v1")
    }
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
