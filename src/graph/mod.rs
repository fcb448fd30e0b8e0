//! Typed document graph: node/edge model, adjacency, and construction.
//!
//! Nodes carry a tagged `NodeKind` variant (the set of valid attributes is
//! fully determined by the node type), edges a `Relation`. The `CONTAINS`
//! edges restricted to one page form a tree rooted at that page's
//! `Page_File` node.

pub mod builder;
pub mod ids;
pub mod path;
pub mod persist;

pub use builder::{build_site_graph, GraphBuilder};
pub use ids::IdAllocator;
pub use path::resolve_path;
pub use persist::{load_graph, save_graph};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Node type refinement with its type-specific attributes.
///
/// Serialized with a `type` tag so the node-link JSON keeps the flat
/// attribute mapping the rest of the pipeline expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    /// Root node for one HTML document; one per page.
    #[serde(rename = "Page_File")]
    PageFile { title: String },

    /// Generic structural element; default for anything not otherwise classified.
    #[serde(rename = "DOM_Element")]
    DomElement,

    /// The document `<title>` element.
    #[serde(rename = "Page_Title")]
    PageTitle { title_text: String },

    /// A heading element (`h1`..`h4`).
    #[serde(rename = "Section_Heading")]
    SectionHeading { heading_text: String },

    /// A `<p>` element with non-empty text.
    #[serde(rename = "Paragraph")]
    Paragraph { full_text: String },

    /// A target outside the known page set, keyed by its full URL and
    /// deduplicated across pages.
    #[serde(rename = "External_Page")]
    ExternalPage {
        url: String,
        label: String,
        hostname: String,
    },

    /// A non-navigational target (`mailto:`, `tel:`); page-local, never
    /// deduplicated.
    #[serde(rename = "Data_Link")]
    DataLink {
        data_type: String,
        value: String,
        label: String,
    },
}

impl NodeKind {
    /// The serialized type name, as it appears in persisted graphs.
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::PageFile { .. } => "Page_File",
            NodeKind::DomElement => "DOM_Element",
            NodeKind::PageTitle { .. } => "Page_Title",
            NodeKind::SectionHeading { .. } => "Section_Heading",
            NodeKind::Paragraph { .. } => "Paragraph",
            NodeKind::ExternalPage { .. } => "External_Page",
            NodeKind::DataLink { .. } => "Data_Link",
        }
    }
}

/// A graph node: unique string id plus its attribute mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(flatten)]
    pub kind: NodeKind,
    /// Source element name, absent for page-level and external nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Owning page identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    /// Tree depth from the page's structural root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    /// Positional structural path, for traceability only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Whitespace-normalized text of the element and its descendants,
    /// truncated to 150 characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_snippet: Option<String>,
}

impl Node {
    /// A node with only an id and kind; the common attributes stay unset.
    pub fn bare(id: impl Into<String>, kind: NodeKind) -> Self {
        Node {
            id: id.into(),
            kind,
            tag: None,
            page: None,
            depth: None,
            path: None,
            text_snippet: None,
        }
    }
}

/// Edge relation classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    /// Structural parent -> child; forms a tree per page.
    #[serde(rename = "CONTAINS")]
    Contains,
    /// Anchor element -> known `Page_File` node.
    #[serde(rename = "LINKS_TO_PAGE")]
    LinksToPage,
    /// Anchor element -> `External_Page` node.
    #[serde(rename = "LINKS_TO_EXTERNAL_PAGE")]
    LinksToExternalPage,
    /// Anchor element -> page-local `Data_Link` node.
    #[serde(rename = "CONTAINS_DATA")]
    ContainsData,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Contains => "CONTAINS",
            Relation::LinksToPage => "LINKS_TO_PAGE",
            Relation::LinksToExternalPage => "LINKS_TO_EXTERNAL_PAGE",
            Relation::ContainsData => "CONTAINS_DATA",
        }
    }
}

/// A directed edge. A given ordered node pair may carry more than one edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub relation: Relation,
    /// Visible/alt text of the originating link, truncated to 50 characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
}

/// The merged multi-page document graph.
///
/// Directed multigraph: nodes keyed by unique string id, edges stored in
/// insertion order with per-node adjacency lists for O(1) neighborhood
/// lookups. Built once, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct DomGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    node_index: HashMap<String, usize>,
    outgoing: HashMap<String, Vec<usize>>,
    incoming: HashMap<String, Vec<usize>>,
}

impl DomGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, replacing any existing node with the same id.
    pub fn add_node(&mut self, node: Node) {
        match self.node_index.get(&node.id) {
            Some(&idx) => self.nodes[idx] = node,
            None => {
                self.node_index.insert(node.id.clone(), self.nodes.len());
                self.nodes.push(node);
            }
        }
    }

    /// Append a directed edge. Parallel edges are kept.
    pub fn add_edge(&mut self, edge: Edge) {
        let idx = self.edges.len();
        self.outgoing
            .entry(edge.source.clone())
            .or_default()
            .push(idx);
        self.incoming
            .entry(edge.target.clone())
            .or_default()
            .push(idx);
        self.edges.push(edge);
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).map(|&idx| &self.nodes[idx])
    }

    pub(crate) fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.node_index.get(id).map(|&idx| &mut self.nodes[idx])
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Outgoing edges of a node, in insertion order.
    pub fn out_edges<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a Edge> {
        self.outgoing
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.edges[idx])
    }

    /// Incoming edges of a node, in insertion order.
    pub fn in_edges<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a Edge> {
        self.incoming
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.edges[idx])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Rebuild a graph from persisted node and edge lists.
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let mut graph = DomGraph::new();
        for node in nodes {
            graph.add_node(node);
        }
        for edge in edges {
            graph.add_edge(edge);
        }
        graph
    }
}
