//! The edge node map: which nodes exist and how to reach them.

use std::collections::HashMap;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

/// The set of edge nodes an orchestrator fans out to.
///
/// Loaded from a YAML file of the form:
///
/// ```yaml
/// nodes:
///   ams1: ams1.edge.packetframe.com
///   iad1: iad1.edge.packetframe.com
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeFile {
    #[serde(default)]
    pub nodes: HashMap<String, String>,
}

impl NodeFile {
    pub fn load(path: &Utf8Path) -> Result<Self, NodeFileError> {
        let text = std::fs::read_to_string(path).map_err(NodeFileError::Io)?;
        serde_yaml::from_str(&text).map_err(NodeFileError::Parse)
    }
}

#[derive(Debug)]
pub enum NodeFileError {
    Io(std::io::Error),
    Parse(serde_yaml::Error),
}

impl std::fmt::Display for NodeFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "could not read node file: {e}"),
            Self::Parse(e) => write!(f, "could not parse node file: {e}"),
        }
    }
}

impl std::error::Error for NodeFileError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_node_map() {
        let file = NodeFile {
            nodes: [("ams1".to_string(), "ams1.edge.packetframe.com".to_string())]
                .into_iter()
                .collect(),
        };
        let text = serde_yaml::to_string(&file).unwrap();
        let round_tripped: NodeFile = serde_yaml::from_str(&text).unwrap();
        assert_eq!(file, round_tripped);
    }

    #[test]
    fn rejects_missing_file() {
        let err = NodeFile::load(Utf8Path::new("/nonexistent/nodes.yaml")).unwrap_err();
        assert!(matches!(err, NodeFileError::Io(_)));
    }
}
