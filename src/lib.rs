//! Structural document graph engine.
//!
//! Turns a directory of HTML pages into a typed node/edge graph, builds a
//! context document for each content-bearing node (heading ancestry, link
//! neighborhood, type-specific text), embeds those documents, and answers
//! natural-language queries by vector similarity over the persisted index.
//!
//! Pipeline stages, each persisted as JSON between runs:
//!
//! 1. `pages` + `graph`: parse every page and merge them into one
//!    cross-linked [`graph::DomGraph`].
//! 2. `context` + `index`: select embeddable nodes, assemble their context
//!    texts, encode them with [`embeddings::OpenAIEmbedder`].
//! 3. `search` + `index`: rank index records against an embedded query.

pub mod cache;
pub mod config;
pub mod context;
pub mod embeddings;
pub mod error;
pub mod graph;
pub mod index;
pub mod pages;
pub mod search;

pub use config::Config;
pub use error::{Result, SitegraphError};
pub use graph::{build_site_graph, DomGraph, Edge, GraphBuilder, Node, NodeKind, Relation};
