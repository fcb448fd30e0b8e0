//! Graph construction: walks page tag trees and emits typed nodes and edges.

use scraper::{ElementRef, Html};
use std::collections::{HashMap, HashSet};

use crate::graph::ids::IdAllocator;
use crate::graph::path::resolve_path;
use crate::graph::{DomGraph, Edge, Node, NodeKind, Relation};

/// Non-rendering elements whose subtrees produce no nodes at all.
const SKIP_TAGS: [&str; 6] = ["script", "style", "meta", "link", "br", "hr"];

/// Maximum characters kept in a node's `text_snippet`.
const SNIPPET_MAX_CHARS: usize = 150;

/// Maximum characters kept in an edge's anchor text.
const ANCHOR_MAX_CHARS: usize = 50;

/// Anchor text used when a link has neither visible text nor an image alt.
const DEFAULT_ANCHOR: &str = "Link";

/// Builds one merged graph from an ordered sequence of parsed pages.
///
/// All construction state (identity counters, the external-page dedup map,
/// per-page data-link counters) is owned by the builder instance, so
/// multiple builds can run independently.
pub struct GraphBuilder {
    known_pages: HashSet<String>,
    graph: DomGraph,
    ids: IdAllocator,
    seen_external: HashSet<String>,
    data_counters: HashMap<String, usize>,
}

impl GraphBuilder {
    /// Create a builder. `known_pages` is the full page-id set used to
    /// decide whether a link target is internal.
    pub fn new<I, S>(known_pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        GraphBuilder {
            known_pages: known_pages.into_iter().map(Into::into).collect(),
            graph: DomGraph::new(),
            ids: IdAllocator::new(),
            seen_external: HashSet::new(),
            data_counters: HashMap::new(),
        }
    }

    /// Walk one page's tag tree and add its nodes and edges to the graph.
    ///
    /// Pre-order, document-order traversal with an explicit work stack, so
    /// deeply nested documents cannot exhaust the call stack. A page with no
    /// anchors, no headings, or no content at all still yields its
    /// `Page_File` node.
    pub fn add_page(&mut self, page_id: &str, document: &Html) {
        let title = page_title(document);
        self.ensure_page_node(page_id, title.or_else(|| Some(page_id.to_string())));

        let root = structural_root(document);
        // Children are pushed in reverse so pop order matches document order
        let mut stack: Vec<(ElementRef, String, u32)> = vec![(root, page_id.to_string(), 0)];

        while let Some((element, parent_id, depth)) = stack.pop() {
            let tag = element.value().name().to_string();
            if SKIP_TAGS.contains(&tag.as_str()) {
                continue;
            }

            let node_id = self.ids.allocate(page_id, &tag);
            let text = normalize_whitespace(&element.text().collect::<String>());

            self.graph.add_node(Node {
                id: node_id.clone(),
                kind: classify(&tag, &text),
                tag: Some(tag.clone()),
                page: Some(page_id.to_string()),
                depth: Some(depth),
                path: Some(resolve_path(element)),
                text_snippet: Some(truncate_chars(&text, SNIPPET_MAX_CHARS)),
            });
            self.graph.add_edge(Edge {
                source: parent_id,
                target: node_id.clone(),
                relation: Relation::Contains,
                anchor: None,
            });

            if tag == "a" {
                if let Some(href) = element.value().attr("href") {
                    self.add_link_edges(page_id, &node_id, element, href);
                }
            }

            let children: Vec<ElementRef> =
                element.children().filter_map(ElementRef::wrap).collect();
            for child in children.into_iter().rev() {
                stack.push((child, node_id.clone(), depth + 1));
            }
        }
    }

    /// Finish construction and hand over the read-only graph.
    pub fn finish(self) -> DomGraph {
        self.graph
    }

    /// Classify an anchor target and add the matching link/data edge.
    ///
    /// Fragment suffixes are stripped first. Targets that are neither a
    /// known page, nor http(s), nor mailto/tel (fragment-only links,
    /// `javascript:`, unknown relative paths) produce no edge and are not
    /// an error.
    fn add_link_edges(&mut self, page_id: &str, node_id: &str, element: ElementRef, href: &str) {
        let target = href.split('#').next().unwrap_or("");
        if target.is_empty() {
            return;
        }
        let anchor = anchor_text(element);

        // Internal links are recognized by the last path segment
        let last_segment = target.rsplit('/').next().unwrap_or(target);
        if self.known_pages.contains(last_segment) && last_segment != page_id {
            self.ensure_page_node(last_segment, None);
            self.graph.add_edge(Edge {
                source: node_id.to_string(),
                target: last_segment.to_string(),
                relation: Relation::LinksToPage,
                anchor: Some(anchor),
            });
        } else if target.starts_with("http") {
            // Dedup key is the full target string; the node is created on
            // first sighting only, the edge always
            if self.seen_external.insert(target.to_string()) {
                self.graph.add_node(Node::bare(
                    target,
                    NodeKind::ExternalPage {
                        url: target.to_string(),
                        label: anchor.clone(),
                        hostname: hostname_of(target),
                    },
                ));
            }
            self.graph.add_edge(Edge {
                source: node_id.to_string(),
                target: target.to_string(),
                relation: Relation::LinksToExternalPage,
                anchor: Some(anchor),
            });
        } else if target.starts_with("mailto:") || target.starts_with("tel:") {
            let counter = self.data_counters.entry(page_id.to_string()).or_insert(0);
            let data_id = format!("{}_data_{}", page_id, *counter);
            *counter += 1;

            let scheme = target.split(':').next().unwrap_or("").to_string();
            let mut node = Node::bare(
                data_id.clone(),
                NodeKind::DataLink {
                    data_type: scheme,
                    value: target.to_string(),
                    label: anchor.clone(),
                },
            );
            node.page = Some(page_id.to_string());
            self.graph.add_node(node);
            self.graph.add_edge(Edge {
                source: node_id.to_string(),
                target: data_id,
                relation: Relation::ContainsData,
                anchor: Some(anchor),
            });
        }
    }

    /// Create the `Page_File` node for `page_id`, or update its title when a
    /// placeholder was already created by an earlier page's link.
    fn ensure_page_node(&mut self, page_id: &str, title: Option<String>) {
        match self.graph.node_mut(page_id) {
            Some(node) => {
                if let (Some(title), NodeKind::PageFile { title: existing }) =
                    (title, &mut node.kind)
                {
                    *existing = title;
                }
            }
            None => {
                let title = title.unwrap_or_else(|| page_id.to_string());
                self.graph
                    .add_node(Node::bare(page_id, NodeKind::PageFile { title }));
            }
        }
    }
}

/// Build the merged graph for an ordered sequence of `(page_id, document)`
/// pairs. The known page set is exactly the ids of the given pages.
pub fn build_site_graph(pages: &[(String, Html)]) -> DomGraph {
    let mut builder = GraphBuilder::new(pages.iter().map(|(id, _)| id.clone()));
    for (page_id, document) in pages {
        log::debug!("Building graph for page {}", page_id);
        builder.add_page(page_id, document);
    }
    let graph = builder.finish();
    log::info!(
        "Built graph: {} nodes, {} edges from {} pages",
        graph.node_count(),
        graph.edge_count(),
        pages.len()
    );
    graph
}

/// Refine the node type by tag rule; unknown tags fold into `DOM_Element`.
fn classify(tag: &str, text: &str) -> NodeKind {
    match tag {
        "title" => NodeKind::PageTitle {
            title_text: text.to_string(),
        },
        "h1" | "h2" | "h3" | "h4" => NodeKind::SectionHeading {
            heading_text: text.to_string(),
        },
        "p" if !text.is_empty() => NodeKind::Paragraph {
            full_text: text.to_string(),
        },
        _ => NodeKind::DomElement,
    }
}

/// Pick the structural root: prefer `<html>`, fall back to `<body>`, fall
/// back to the document root itself.
fn structural_root(document: &Html) -> ElementRef<'_> {
    let root = document.root_element();
    if root.value().name() == "html" {
        return root;
    }
    for el in root.descendants().filter_map(ElementRef::wrap) {
        if el.value().name() == "html" {
            return el;
        }
    }
    for el in root.descendants().filter_map(ElementRef::wrap) {
        if el.value().name() == "body" {
            return el;
        }
    }
    root
}

/// First non-empty `<title>` text, if the document has one.
fn page_title(document: &Html) -> Option<String> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "title")
        .map(|el| normalize_whitespace(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty())
}

/// Visible text of a link, falling back to the alt text of the first
/// descendant `<img>`, then to the `"Link"` literal.
fn anchor_text(element: ElementRef) -> String {
    let text = normalize_whitespace(&element.text().collect::<String>());
    if !text.is_empty() {
        return truncate_chars(&text, ANCHOR_MAX_CHARS);
    }
    for descendant in element.descendants().filter_map(ElementRef::wrap) {
        if descendant.value().name() == "img" {
            if let Some(alt) = descendant.value().attr("alt") {
                let alt = normalize_whitespace(alt);
                if !alt.is_empty() {
                    return truncate_chars(&alt, ANCHOR_MAX_CHARS);
                }
            }
        }
    }
    DEFAULT_ANCHOR.to_string()
}

/// Scheme stripped, up to the first path separator. Ports and query strings
/// are deliberately left as-is.
fn hostname_of(target: &str) -> String {
    let rest = target
        .strip_prefix("https://")
        .or_else(|| target.strip_prefix("http://"))
        .unwrap_or(target);
    rest.split('/').next().unwrap_or(rest).to_string()
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Char-boundary-safe truncation.
fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
