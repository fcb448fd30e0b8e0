//! Node-link JSON persistence for the document graph.
//!
//! The on-disk form is a directed multigraph with a `nodes` array (id plus
//! attribute mapping) and a `links` array (source, target, relation,
//! optional anchor), enough to reconstruct the graph losslessly.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::graph::{DomGraph, Edge, Node};

#[derive(Serialize, Deserialize)]
struct NodeLinkData {
    directed: bool,
    multigraph: bool,
    nodes: Vec<Node>,
    links: Vec<Edge>,
}

/// Write the graph as pretty-printed node-link JSON.
pub fn save_graph(path: &Path, graph: &DomGraph) -> Result<()> {
    let data = NodeLinkData {
        directed: true,
        multigraph: true,
        nodes: graph.nodes().cloned().collect(),
        links: graph.edges().cloned().collect(),
    };
    let json = serde_json::to_string_pretty(&data)?;
    std::fs::write(path, json)?;
    log::info!(
        "Saved graph ({} nodes, {} edges) to {}",
        graph.node_count(),
        graph.edge_count(),
        path.display()
    );
    Ok(())
}

/// Load a graph previously written by [`save_graph`].
pub fn load_graph(path: &Path) -> Result<DomGraph> {
    let json = std::fs::read_to_string(path)?;
    let data: NodeLinkData = serde_json::from_str(&json)?;
    let graph = DomGraph::from_parts(data.nodes, data.links);
    log::debug!(
        "Loaded graph ({} nodes, {} edges) from {}",
        graph.node_count(),
        graph.edge_count(),
        path.display()
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::builder::build_site_graph;
    use crate::graph::{NodeKind, Relation};
    use scraper::Html;
    use tempfile::TempDir;

    fn sample_graph() -> DomGraph {
        let pages = vec![
            (
                "a.html".to_string(),
                Html::parse_document(concat!(
                    "<html><head><title>A</title></head><body>",
                    "<h1>Welcome</h1>",
                    "<a href=\"b.html\">Go</a>",
                    "<a href=\"https://x.dev\">X</a>",
                    "<a href=\"mailto:info@x.com\">Mail</a>",
                    "</body></html>"
                )),
            ),
            (
                "b.html".to_string(),
                Html::parse_document("<html><body></body></html>"),
            ),
        ];
        build_site_graph(&pages)
    }

    #[test]
    fn test_save_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dom_graph.json");

        let graph = sample_graph();
        save_graph(&path, &graph).unwrap();
        let loaded = load_graph(&path).unwrap();

        assert_eq!(loaded.node_count(), graph.node_count());
        assert_eq!(loaded.edge_count(), graph.edge_count());
        for node in graph.nodes() {
            assert_eq!(loaded.node(&node.id), Some(node));
        }
        // Adjacency survives the round trip
        assert_eq!(
            loaded
                .out_edges("a.html_a_0")
                .filter(|e| e.relation == Relation::LinksToPage)
                .count(),
            1
        );
    }

    #[test]
    fn test_persisted_form_is_node_link_shaped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dom_graph.json");
        save_graph(&path, &sample_graph()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["directed"], true);
        assert_eq!(value["multigraph"], true);
        assert!(value["nodes"].is_array());
        assert!(value["links"].is_array());
        let first_link = &value["links"][0];
        assert!(first_link["source"].is_string());
        assert!(first_link["target"].is_string());
        assert!(first_link["relation"].is_string());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_graph(&temp_dir.path().join("missing.json"));
        assert!(matches!(
            result,
            Err(crate::error::SitegraphError::Io(_))
        ));
    }

    #[test]
    fn test_external_node_attrs_survive() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dom_graph.json");
        save_graph(&path, &sample_graph()).unwrap();
        let loaded = load_graph(&path).unwrap();
        match &loaded.node("https://x.dev").unwrap().kind {
            NodeKind::ExternalPage { hostname, .. } => assert_eq!(hostname, "x.dev"),
            other => panic!("unexpected kind: {:?}", other),
        }
    }
}
