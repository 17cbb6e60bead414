use anyhow::{Context, Result};
use extract::GraphFragment;
use neo4rs::{Graph, query};
use std::path::Path;
use tokio::fs;
use tracing::{error, info, warn};

use crate::bolt;
use crate::validate::{self, CleanEdge, CleanNode, UNKNOWN_LABEL};

const CONSTRAINT_QUERY: &str =
    "CREATE CONSTRAINT IF NOT EXISTS FOR (n:Entity) REQUIRE n.id IS UNIQUE";

const EDGE_QUERY: &str = "\
MATCH (from:Entity {id: $source})
MATCH (to:Entity {id: $target})
MERGE (from)-[rel:REL {type: $relation}]->(to)
RETURN count(rel) AS cnt";

const CLEANUP_QUERY: &str = "\
MATCH (n:Entity)
WHERE NOT (n)--()
DETACH DELETE n
RETURN count(n) AS deleted";

/// Totals for one replay of the fragment log.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImportSummary {
    pub fragments: usize,
    pub failed_lines: usize,
    pub nodes: usize,
    pub edges: usize,
}

/// Entity/relation counts of the persisted graph.
#[derive(Debug, Clone, Copy)]
pub struct GraphStats {
    pub entities: usize,
    pub relations: usize,
}

/// Commits validated fragments into Neo4j.
///
/// The merge is sequential and idempotent: entities merge by `id` under
/// a uniqueness constraint, relations merge by the (source, type, target)
/// triple, so replaying a fragment changes nothing.
pub struct GraphMerger {
    graph: Graph,
}

/// Prepare a type label for interpolation into a Cypher label position,
/// which cannot be parameterized. Backticks are stripped and the result
/// is backtick-quoted by the caller; the `Unknown` sentinel gets no extra
/// label.
fn sanitize_label(label: &str) -> Option<String> {
    let cleaned: String = label.chars().filter(|c| *c != '`').collect();
    let cleaned = cleaned.trim().to_string();
    if cleaned.is_empty() || cleaned == UNKNOWN_LABEL {
        None
    } else {
        Some(cleaned)
    }
}

/// Build the node-upsert query, with the extracted type as an additional
/// label so one entity can carry several types across fragments.
fn node_query(label: &str) -> String {
    let mut q = String::from(
        "MERGE (n:Entity {id: $id})\nSET n.name = $id, n.label = $label\n",
    );
    if let Some(extra) = sanitize_label(label) {
        q.push_str(&format!("SET n:`{}`\n", extra));
    }
    q.push_str("SET n += $attrs");
    q
}

impl GraphMerger {
    pub fn new(graph: Graph) -> Self {
        Self { graph }
    }

    /// Idempotently ensure the entity uniqueness constraint. An error
    /// here usually means an equivalent constraint already exists under
    /// another name, so it is reported and tolerated.
    pub async fn ensure_constraint(&self) -> Result<()> {
        if let Err(e) = self.graph.run(query(CONSTRAINT_QUERY)).await {
            warn!(error = %e, "constraint creation reported an error (may already exist)");
        }
        Ok(())
    }

    async fn merge_node(&self, node: &CleanNode) -> Result<()> {
        let q = query(&node_query(&node.label))
            .param("id", node.id.clone())
            .param("label", node.label.clone())
            .param("attrs", bolt::attribute_map(&node.attributes));

        self.graph
            .run(q)
            .await
            .with_context(|| format!("Failed to upsert entity {}", node.id))?;
        Ok(())
    }

    /// Upsert one relation; returns false when an endpoint is missing
    /// and the edge was skipped.
    async fn merge_edge(&self, edge: &CleanEdge) -> Result<bool> {
        let q = query(EDGE_QUERY)
            .param("source", edge.source.clone())
            .param("target", edge.target.clone())
            .param("relation", edge.relation.clone());

        let mut result = self
            .graph
            .execute(q)
            .await
            .with_context(|| format!("Failed to upsert relation {}", edge.relation))?;

        let merged = if let Some(row) = result.next().await? {
            row.get::<i64>("cnt").unwrap_or(0)
        } else {
            0
        };

        if merged == 0 {
            warn!(
                source = %edge.source,
                target = %edge.target,
                relation = %edge.relation,
                "edge skipped: endpoint entity does not exist"
            );
            return Ok(false);
        }
        Ok(true)
    }

    /// Two-phase commit of one fragment: all nodes first, then edges, so
    /// every edge whose endpoints this fragment mentions can attach.
    pub async fn merge_fragment(&self, fragment: &GraphFragment) -> Result<(usize, usize)> {
        let nodes = validate::clean_nodes(&fragment.nodes);
        let edges = validate::clean_edges(&fragment.edges);

        for node in &nodes {
            self.merge_node(node).await?;
        }

        let mut committed_edges = 0;
        for edge in &edges {
            if self.merge_edge(edge).await? {
                committed_edges += 1;
            }
        }

        Ok((nodes.len(), committed_edges))
    }

    /// Replay the whole fragment log into the store. One bad line is
    /// logged with its line number and skipped; the import continues.
    pub async fn import(&self, log_path: &Path) -> Result<ImportSummary> {
        let contents = fs::read_to_string(log_path)
            .await
            .with_context(|| format!("Failed to read fragment log: {:?}", log_path))?;

        let mut summary = ImportSummary::default();

        for (idx, line) in contents.lines().enumerate() {
            let line_num = idx + 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let fragment: GraphFragment = match serde_json::from_str(line) {
                Ok(fragment) => fragment,
                Err(e) => {
                    error!(line = line_num, error = %e, "fragment line does not parse, skipping");
                    summary.failed_lines += 1;
                    continue;
                }
            };

            match self.merge_fragment(&fragment).await {
                Ok((nodes, edges)) => {
                    summary.fragments += 1;
                    summary.nodes += nodes;
                    summary.edges += edges;
                    info!(
                        line = line_num,
                        source = %fragment.source_name,
                        nodes,
                        edges,
                        "fragment imported"
                    );
                }
                Err(e) => {
                    summary.failed_lines += 1;
                    error!(line = line_num, source = %fragment.source_name, error = %e, "fragment import failed, continuing");
                }
            }
        }

        Ok(summary)
    }

    /// Delete entities with zero incident relations. Must run once, after
    /// the full import; a mid-import run would delete entities whose
    /// relations simply have not arrived yet.
    pub async fn remove_disconnected(&self) -> Result<i64> {
        let mut result = self
            .graph
            .execute(query(CLEANUP_QUERY))
            .await
            .context("Failed to run disconnected-entity cleanup")?;

        let deleted = if let Some(row) = result.next().await? {
            row.get::<i64>("deleted").unwrap_or(0)
        } else {
            0
        };

        info!(deleted, "removed disconnected entities");
        Ok(deleted)
    }

    pub async fn stats(&self) -> Result<GraphStats> {
        let mut result = self
            .graph
            .execute(query("MATCH (e:Entity) RETURN count(e) AS cnt"))
            .await?;
        let entities = if let Some(row) = result.next().await? {
            row.get::<i64>("cnt").unwrap_or(0) as usize
        } else {
            0
        };

        let mut result = self
            .graph
            .execute(query("MATCH ()-[r:REL]->() RETURN count(r) AS cnt"))
            .await?;
        let relations = if let Some(row) = result.next().await? {
            row.get::<i64>("cnt").unwrap_or(0) as usize
        } else {
            0
        };

        Ok(GraphStats {
            entities,
            relations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_sanitized_for_interpolation() {
        assert_eq!(sanitize_label("药物"), Some("药物".to_string()));
        assert_eq!(sanitize_label(" 化学成分 "), Some("化学成分".to_string()));
        assert_eq!(sanitize_label("a`b"), Some("ab".to_string()));
        assert_eq!(sanitize_label("``"), None);
        assert_eq!(sanitize_label(""), None);
        assert_eq!(sanitize_label("Unknown"), None);
    }

    #[test]
    fn node_query_adds_type_label_when_known() {
        let q = node_query("药物");
        assert!(q.contains("MERGE (n:Entity {id: $id})"));
        assert!(q.contains("SET n:`药物`"));
        assert!(q.contains("SET n += $attrs"));

        let q = node_query("Unknown");
        assert!(!q.contains("SET n:`"));
        assert!(q.contains("SET n += $attrs"));
    }
}
