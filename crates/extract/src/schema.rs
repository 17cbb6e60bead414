use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw `{nodes, edges}` object as returned by the model.
///
/// Elements stay untyped on purpose: the model output is schema-loose and
/// the merge stage validates each entry individually, so a single bad node
/// must not make the whole fragment unparseable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawGraph {
    #[serde(default)]
    pub nodes: Vec<Value>,
    #[serde(default)]
    pub edges: Vec<Value>,
}

impl RawGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// One durable output-log line: a raw graph tagged with the record it
/// came from. `source_name` doubles as the resumability checkpoint key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphFragment {
    pub source_name: String,
    #[serde(default)]
    pub nodes: Vec<Value>,
    #[serde(default)]
    pub edges: Vec<Value>,
}

impl GraphFragment {
    pub fn new(source_name: impl Into<String>, graph: RawGraph) -> Self {
        Self {
            source_name: source_name.into(),
            nodes: graph.nodes,
            edges: graph.edges,
        }
    }
}
