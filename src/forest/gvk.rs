//! Group/version/kind parsing
//!
//! Both parsers here are heuristics. Definition names are split on dots and
//! the last three segments are read as group, version and kind; a group whose
//! own name contains dots (`io.k8s.api.flowcontrol.apiserver.v1.FlowSchema`)
//! only keeps its last segment. Treat the result as a lookup hint, never as
//! the authoritative API group.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Group kept implicit when Kubernetes serializes built-in resources
const CORE_GROUP: &str = "core";

/// A (group, version, kind) triple; any part may be empty
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Gvk {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl Gvk {
    pub fn new(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Parse a definition name such as `io.k8s.api.apps.v1.Deployment`
    ///
    /// Fewer than three segments yields an empty triple. With exactly three
    /// there is no group. `core` is normalized to the empty group.
    pub fn from_definition_name(name: &str) -> Self {
        let parts: Vec<&str> = name.split('.').collect();
        if parts.len() < 3 {
            return Self::default();
        }

        let kind = parts[parts.len() - 1];
        let version = parts[parts.len() - 2];
        let group = if parts.len() > 3 {
            parts[parts.len() - 3]
        } else {
            ""
        };
        let group = if group == CORE_GROUP { "" } else { group };

        Self::new(group, version, kind)
    }

    /// Parse a manifest `apiVersion` together with its `kind`
    ///
    /// `apps/v1` -> group `apps`, version `v1`; `v1` -> empty group. A dotted
    /// group keeps its first segment only, so `events.k8s.io/v1` reads as
    /// group `events`. More than one `/` yields empty group and version.
    pub fn from_api_version(api_version: &str, kind: &str) -> Self {
        if !api_version.contains('/') {
            return Self::new("", api_version, kind);
        }

        let parts: Vec<&str> = api_version.split('/').collect();
        match parts.as_slice() {
            [group, version] => {
                let group = group.split('.').next().unwrap_or_default();
                Self::new(group, *version, kind)
            }
            _ => Self::new("", "", kind),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.group.is_empty() && self.version.is_empty() && self.kind.is_empty()
    }
}

impl fmt::Display for Gvk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{},{}]", self.group, self.version, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_group_normalized() {
        let gvk = Gvk::from_definition_name("io.k8s.api.core.v1.Namespace");
        assert_eq!(gvk, Gvk::new("", "v1", "Namespace"));
    }

    #[test]
    fn test_named_group() {
        let gvk = Gvk::from_definition_name("io.k8s.api.apps.v1.Deployment");
        assert_eq!(gvk, Gvk::new("apps", "v1", "Deployment"));

        let gvk = Gvk::from_definition_name("com.example.stable.v1.CronTab");
        assert_eq!(gvk, Gvk::new("stable", "v1", "CronTab"));
    }

    #[test]
    fn test_short_names() {
        assert!(Gvk::from_definition_name("Pod").is_empty());
        assert!(Gvk::from_definition_name("v1.Pod").is_empty());
        assert_eq!(Gvk::from_definition_name("x.v1.Pod"), Gvk::new("", "v1", "Pod"));
    }

    #[test]
    fn test_dotted_group_misparse_is_best_effort() {
        let gvk = Gvk::from_definition_name("io.k8s.api.flowcontrol.apiserver.v1.FlowSchema");
        assert_eq!(gvk.group, "apiserver");
        assert_eq!(gvk.kind, "FlowSchema");
    }

    #[test]
    fn test_api_version_parsing() {
        assert_eq!(Gvk::from_api_version("v1", "Pod"), Gvk::new("", "v1", "Pod"));
        assert_eq!(
            Gvk::from_api_version("apps/v1", "Deployment"),
            Gvk::new("apps", "v1", "Deployment")
        );
        assert_eq!(
            Gvk::from_api_version("events.k8s.io/v1", "Event"),
            Gvk::new("events", "v1", "Event")
        );
        assert_eq!(Gvk::from_api_version("a/b/c", "Thing"), Gvk::new("", "", "Thing"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Gvk::new("apps", "v1", "Deployment").to_string(), "[apps,v1,Deployment]");
    }
}
