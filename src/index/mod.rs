//! Persisted retrieval index: embedded context documents plus query-time
//! retrieval over them.
//!
//! The on-disk form is a JSON array of `{id, text, metadata, embedding}`
//! records, where `embedding` is the encoder output for `text` and
//! `metadata` is the subset of node attributes needed for display.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::context;
use crate::embeddings::OpenAIEmbedder;
use crate::error::{Result, SitegraphError};
use crate::graph::DomGraph;
use crate::search;

/// Display metadata carried alongside each embedded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_name: Option<String>,
}

/// One embedded context document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: String,
    pub text: String,
    pub metadata: RecordMetadata,
    pub embedding: Vec<f32>,
}

/// One retrieval result.
#[derive(Debug, Clone, Serialize)]
pub struct QueryMatch {
    pub node_id: String,
    /// Raw dot-product score; what the ranking is based on.
    pub score: f32,
    /// Top-k score linearly rescaled into [0, 1], for presentation only.
    pub norm_score: f32,
    pub rank: usize,
    pub text: String,
    pub metadata: RecordMetadata,
}

/// Build the retrieval index for a graph: select embeddable nodes, assemble
/// their context texts, and encode them in one batched call.
pub async fn build_index(
    graph: &DomGraph,
    embedder: &OpenAIEmbedder,
) -> Result<Vec<IndexRecord>> {
    let documents = context::embeddable_contexts(graph)?;
    if documents.is_empty() {
        log::warn!("No documents selected for embedding");
        return Ok(Vec::new());
    }

    log::info!("Embedding {} context documents", documents.len());
    let texts: Vec<String> = documents.iter().map(|(_, text)| text.clone()).collect();
    let embeddings = embedder.embed_batch(texts).await?;

    assemble_records(graph, documents, embeddings)
}

/// Zip documents with their embeddings into index records. Split out from
/// [`build_index`] so record assembly is testable without an encoder.
pub fn assemble_records(
    graph: &DomGraph,
    documents: Vec<(String, String)>,
    embeddings: Vec<Vec<f32>>,
) -> Result<Vec<IndexRecord>> {
    if embeddings.len() != documents.len() {
        return Err(SitegraphError::Embedding(format!(
            "Encoder returned {} embeddings for {} texts",
            embeddings.len(),
            documents.len()
        )));
    }

    let records = documents
        .into_iter()
        .zip(embeddings)
        .map(|((id, text), embedding)| {
            let metadata = record_metadata(graph, &id);
            IndexRecord {
                id,
                text,
                metadata,
                embedding,
            }
        })
        .collect();
    Ok(records)
}

fn record_metadata(graph: &DomGraph, node_id: &str) -> RecordMetadata {
    match graph.node(node_id) {
        Some(node) => RecordMetadata {
            node_type: node.kind.type_name().to_string(),
            tag: node.tag.clone(),
            page_name: node.page.clone(),
        },
        None => RecordMetadata {
            node_type: String::new(),
            tag: None,
            page_name: None,
        },
    }
}

/// Write the index as pretty-printed JSON.
pub fn save_index(path: &Path, records: &[IndexRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)?;
    log::info!("Saved {} index records to {}", records.len(), path.display());
    Ok(())
}

/// Load a persisted index and validate it: every record must carry a
/// non-empty embedding, and all embeddings must share one dimension. A
/// malformed index is fatal for retrieval, not degraded.
pub fn load_index(path: &Path) -> Result<Vec<IndexRecord>> {
    let json = std::fs::read_to_string(path)?;
    let records: Vec<IndexRecord> = serde_json::from_str(&json)?;

    if let Some(first) = records.first() {
        let dims = first.embedding.len();
        if dims == 0 {
            return Err(SitegraphError::Index(format!(
                "Record '{}' has an empty embedding",
                first.id
            )));
        }
        for record in &records {
            if record.embedding.len() != dims {
                return Err(SitegraphError::Index(format!(
                    "Inconsistent embedding dimensions: '{}' has {}, expected {}",
                    record.id,
                    record.embedding.len(),
                    dims
                )));
            }
        }
    }

    log::debug!("Loaded {} index records from {}", records.len(), path.display());
    Ok(records)
}

/// Rank loaded records against an already-encoded query vector.
pub fn rank_records(
    records: &[IndexRecord],
    query_vec: &[f32],
    top_k: usize,
) -> Result<Vec<QueryMatch>> {
    let corpus: Vec<(String, Vec<f32>)> = records
        .iter()
        .map(|r| (r.id.clone(), r.embedding.clone()))
        .collect();
    let ranked = search::rank(query_vec, &corpus, top_k)?;

    let raw_scores: Vec<f32> = ranked.iter().map(|(_, score)| *score).collect();
    let norm_scores = search::normalize_scores(&raw_scores);

    let matches = ranked
        .into_iter()
        .zip(norm_scores)
        .enumerate()
        .filter_map(|(idx, ((node_id, score), norm_score))| {
            let record = records.iter().find(|r| r.id == node_id)?;
            Some(QueryMatch {
                node_id,
                score,
                norm_score,
                rank: idx + 1,
                text: record.text.clone(),
                metadata: record.metadata.clone(),
            })
        })
        .collect();
    Ok(matches)
}

/// Full query path: encode the query text, load the persisted index, rank.
pub async fn query(
    index_path: &Path,
    embedder: &OpenAIEmbedder,
    text: &str,
    top_k: usize,
) -> Result<Vec<QueryMatch>> {
    let records = load_index(index_path)?;
    if records.is_empty() {
        return Ok(Vec::new());
    }
    let query_vec = embedder.embed_query(text, 3).await?;
    rank_records(&records, &query_vec, top_k)
}
