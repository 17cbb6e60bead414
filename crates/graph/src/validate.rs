//! Turns schema-loose model output into well-formed node and edge
//! records. Total by design: bad entries are reported and dropped, never
//! propagated as errors, so one malformed node cannot sink a fragment.

use serde_json::{Map, Value};
use tracing::warn;

pub const UNKNOWN_LABEL: &str = "Unknown";

/// A node that is safe to hand to the merge engine.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanNode {
    pub id: String,
    pub label: String,
    pub attributes: Map<String, Value>,
}

/// An edge with all three fields present and non-empty. No referential
/// check happens here; the store only materializes an edge when both
/// endpoints exist.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanEdge {
    pub source: String,
    pub target: String,
    pub relation: String,
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

pub fn clean_nodes(nodes: &[Value]) -> Vec<CleanNode> {
    let mut cleaned = Vec::with_capacity(nodes.len());

    for node in nodes {
        let Some(obj) = node.as_object() else {
            warn!(node = %node, "skipping non-object node");
            continue;
        };

        let Some(id) = non_empty_str(obj.get("id")) else {
            warn!(node = %node, "skipping node without a valid id");
            continue;
        };

        let label = non_empty_str(obj.get("label")).unwrap_or(UNKNOWN_LABEL);

        let attributes = obj
            .get("attributes")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        cleaned.push(CleanNode {
            id: id.to_string(),
            label: label.to_string(),
            attributes,
        });
    }

    cleaned
}

pub fn clean_edges(edges: &[Value]) -> Vec<CleanEdge> {
    let mut cleaned = Vec::with_capacity(edges.len());

    for edge in edges {
        let Some(obj) = edge.as_object() else {
            warn!(edge = %edge, "skipping non-object edge");
            continue;
        };

        let (Some(source), Some(target), Some(relation)) = (
            non_empty_str(obj.get("source")),
            non_empty_str(obj.get("target")),
            non_empty_str(obj.get("relation")),
        ) else {
            warn!(edge = %edge, "skipping edge missing source, target or relation");
            continue;
        };

        cleaned.push(CleanEdge {
            source: source.to_string(),
            target: target.to_string(),
            relation: relation.to_string(),
        });
    }

    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn well_formed_node_passes_through() {
        let nodes = vec![json!({"id": "甘草", "label": "药物", "attributes": {"味道": "甜"}})];
        let cleaned = clean_nodes(&nodes);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].id, "甘草");
        assert_eq!(cleaned[0].label, "药物");
        assert_eq!(cleaned[0].attributes["味道"], json!("甜"));
    }

    #[test]
    fn missing_label_and_attributes_get_defaults() {
        let cleaned = clean_nodes(&[json!({"id": "胆红素"})]);
        assert_eq!(cleaned[0].label, UNKNOWN_LABEL);
        assert!(cleaned[0].attributes.is_empty());
    }

    #[test]
    fn malformed_nodes_are_dropped_without_panicking() {
        let nodes = vec![
            json!("just a string"),
            json!(42),
            json!(null),
            json!([1, 2, 3]),
            json!({"label": "药物"}),
            json!({"id": ""}),
            json!({"id": null}),
            json!({"id": 7}),
            json!({"id": "有效", "attributes": "not a map"}),
        ];
        let cleaned = clean_nodes(&nodes);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].id, "有效");
        assert!(cleaned[0].attributes.is_empty());
    }

    #[test]
    fn edges_require_all_three_fields() {
        let edges = vec![
            json!({"source": "甘草", "target": "脾经", "relation": "归属于"}),
            json!({"source": "甘草", "target": "", "relation": "含有"}),
            json!({"source": "甘草", "relation": "治疗"}),
            json!({"target": "咳嗽", "relation": "治疗"}),
            json!({"source": "甘草", "target": "咳嗽", "relation": null}),
            json!("garbage"),
        ];
        let cleaned = clean_edges(&edges);
        assert_eq!(
            cleaned,
            vec![CleanEdge {
                source: "甘草".to_string(),
                target: "脾经".to_string(),
                relation: "归属于".to_string(),
            }]
        );
    }

    #[test]
    fn licorice_scenario_from_partial_fragment() {
        // One valid node, one empty-id node, one empty-target edge: the
        // fragment survives with exactly the valid pieces.
        let nodes = vec![
            json!({"id": "甘草", "label": "药物", "attributes": {"味道": "甜"}}),
            json!({"id": "", "label": "X"}),
        ];
        let edges = vec![json!({"source": "甘草", "target": "", "relation": "含有"})];

        let clean_n = clean_nodes(&nodes);
        let clean_e = clean_edges(&edges);
        assert_eq!(clean_n.len(), 1);
        assert_eq!(clean_n[0].attributes["味道"], json!("甜"));
        assert!(clean_e.is_empty());
    }

    #[test]
    fn empty_input_is_fine() {
        assert!(clean_nodes(&[]).is_empty());
        assert!(clean_edges(&[]).is_empty());
    }
}
