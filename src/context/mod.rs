//! Context assembly: canonical multi-hop text blocks for graph nodes.
//!
//! Each embeddable node gets one deterministic text block combining its page
//! header, heading ancestry, type-specific content, and outgoing link
//! context. These blocks are what the encoder sees.

use std::collections::HashSet;

use crate::error::{Result, SitegraphError};
use crate::graph::{DomGraph, Node, NodeKind, Relation};

const LINK_RELATIONS: [Relation; 2] = [Relation::LinksToPage, Relation::LinksToExternalPage];

/// Ids of nodes selected to receive a text representation and vector.
///
/// `Page_File` and `External_Page` nodes are always excluded (they are
/// addressed by their own identity, not free text). A generic `DOM_Element`
/// qualifies only when it participates in at least one link edge in either
/// direction, so the index is not flooded with boilerplate containers.
/// Every other node type is included unconditionally.
pub fn select_embeddable(graph: &DomGraph) -> Vec<String> {
    graph
        .nodes()
        .filter(|node| should_embed(graph, node))
        .map(|node| node.id.clone())
        .collect()
}

fn should_embed(graph: &DomGraph, node: &Node) -> bool {
    match node.kind {
        NodeKind::PageFile { .. } | NodeKind::ExternalPage { .. } => false,
        NodeKind::DomElement => has_link_edges(graph, &node.id),
        _ => true,
    }
}

fn has_link_edges(graph: &DomGraph, id: &str) -> bool {
    graph
        .out_edges(id)
        .chain(graph.in_edges(id))
        .any(|edge| LINK_RELATIONS.contains(&edge.relation))
}

/// Build the canonical context text for one node.
///
/// Layout: header block (page, node id, tag, type, heading hierarchy,
/// outgoing links), then, when the node has main content, a content
/// section separated by exactly one blank line.
pub fn build_context(graph: &DomGraph, node_id: &str) -> Result<String> {
    let node = graph
        .node(node_id)
        .ok_or_else(|| SitegraphError::NodeNotFound(node_id.to_string()))?;

    let mut lines: Vec<String> = Vec::new();

    let page_name = node
        .page
        .clone()
        .unwrap_or_else(|| page_prefix(node_id).to_string());
    match page_file_node(graph, &page_name) {
        Some(page_node) => {
            let title = match &page_node.kind {
                NodeKind::PageFile { title } => title.as_str(),
                _ => page_node.id.as_str(),
            };
            lines.push(format!("Page: {} (file: {})", title, page_node.id));
        }
        None => lines.push(format!("Page ID: {}", page_name)),
    }
    lines.push(format!("Node ID: {}", node_id));
    if let Some(tag) = &node.tag {
        lines.push(format!("DOM tag: <{}>", tag));
    }
    lines.push(format!("Node type: {}", node.kind.type_name()));

    let headings = heading_ancestors(graph, node_id);
    if !headings.is_empty() {
        lines.push("Heading hierarchy:".to_string());
        for heading in headings {
            lines.push(format!("  - {}", heading));
        }
    }

    let link_lines = outgoing_link_lines(graph, node_id);
    if !link_lines.is_empty() {
        lines.push("Outgoing links:".to_string());
        lines.extend(link_lines);
    }

    let mut text = lines.join("\n");
    if let Some(content) = main_content(graph, node) {
        text.push_str("\n\nContent:\n");
        text.push_str(&content);
    }
    Ok(text.trim().to_string())
}

/// Selected nodes with their non-empty context texts, in graph node order.
///
/// Nodes whose assembled text is empty after trimming are dropped here; that
/// is a terminal filter, not an error.
pub fn embeddable_contexts(graph: &DomGraph) -> Result<Vec<(String, String)>> {
    let mut documents = Vec::new();
    for id in select_embeddable(graph) {
        let text = build_context(graph, &id)?;
        if text.is_empty() {
            continue;
        }
        documents.push((id, text));
    }
    log::debug!("Prepared {} context documents", documents.len());
    Ok(documents)
}

/// Resolve the `Page_File` node for a page name: direct id lookup first,
/// then a title-attribute fallback search.
fn page_file_node<'a>(graph: &'a DomGraph, page_name: &str) -> Option<&'a Node> {
    if let Some(node) = graph.node(page_name) {
        if matches!(node.kind, NodeKind::PageFile { .. }) {
            return Some(node);
        }
    }
    graph
        .nodes()
        .find(|n| matches!(&n.kind, NodeKind::PageFile { title } if title == page_name))
}

/// Page prefix of a structural node id of the form `{page}_{tag}_{idx}`.
/// Fallback for nodes without a `page` attribute.
fn page_prefix(node_id: &str) -> &str {
    node_id.split('_').next().unwrap_or(node_id)
}

/// Climb `CONTAINS` edges upward collecting `Section_Heading` ancestors as
/// `"{tag}: {text}"`, outermost first.
///
/// Containment is tree-shaped, so at most one predecessor is taken per step;
/// a repeated ancestor terminates the walk (cycle guard).
fn heading_ancestors(graph: &DomGraph, node_id: &str) -> Vec<String> {
    let mut headings = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut current = node_id.to_string();

    loop {
        let parent = graph
            .in_edges(&current)
            .find(|edge| edge.relation == Relation::Contains)
            .map(|edge| edge.source.clone());
        let Some(parent) = parent else { break };
        if !visited.insert(parent.clone()) {
            break;
        }
        if let Some(parent_node) = graph.node(&parent) {
            if let NodeKind::SectionHeading { heading_text } = &parent_node.kind {
                if !heading_text.is_empty() {
                    let level = parent_node.tag.as_deref().unwrap_or("h?");
                    headings.push(format!("{}: {}", level, heading_text));
                }
            }
        }
        current = parent;
    }

    headings.reverse();
    headings
}

/// One line per outgoing link edge, naming the resolved target and the
/// edge's anchor text. Target naming preference: page title, then external
/// label / hostname / url.
fn outgoing_link_lines(graph: &DomGraph, node_id: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for edge in graph.out_edges(node_id) {
        let anchor = edge.anchor.as_deref().unwrap_or("");
        match edge.relation {
            Relation::LinksToPage => {
                let title = graph
                    .node(&edge.target)
                    .and_then(|n| match &n.kind {
                        NodeKind::PageFile { title } => Some(title.clone()),
                        _ => None,
                    })
                    .unwrap_or_else(|| edge.target.clone());
                lines.push(format!(
                    "- link to page '{}' (file: {}), anchor text: '{}'",
                    title, edge.target, anchor
                ));
            }
            Relation::LinksToExternalPage => {
                let (display, url) = match graph.node(&edge.target).map(|n| &n.kind) {
                    Some(NodeKind::ExternalPage {
                        url,
                        label,
                        hostname,
                    }) => {
                        let display = if !label.is_empty() {
                            label.clone()
                        } else if !hostname.is_empty() {
                            hostname.clone()
                        } else {
                            url.clone()
                        };
                        (display, url.clone())
                    }
                    _ => (edge.target.clone(), edge.target.clone()),
                };
                lines.push(format!(
                    "- link to external page '{}' ({}), anchor text: '{}'",
                    display, url, anchor
                ));
            }
            Relation::Contains | Relation::ContainsData => {}
        }
    }
    lines
}

/// Type-specific main content, if any.
fn main_content(graph: &DomGraph, node: &Node) -> Option<String> {
    match &node.kind {
        NodeKind::Paragraph { full_text } => non_empty(full_text),
        NodeKind::SectionHeading { heading_text } => non_empty(heading_text),
        NodeKind::PageTitle { title_text } => non_empty(title_text),
        NodeKind::DataLink { value, .. } => Some(format!("Data link: {}", value)),
        // Qualifying DOM elements carry no prose of their own; their value
        // lies in their link context
        NodeKind::DomElement if has_link_edges(graph, &node.id) => {
            Some("DOM element containing important links.".to_string())
        }
        _ => None,
    }
}

fn non_empty(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
