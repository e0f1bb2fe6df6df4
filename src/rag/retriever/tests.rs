use super::*;
use crate::database::VECTORS_FILE;
use async_trait::async_trait;
use std::collections::HashMap;
use tempfile::TempDir;

/// Returns a fixed vector per known text, zeros otherwise
struct TableEmbedder {
    dimension: usize,
    table: HashMap<String, Vec<f32>>,
}

#[async_trait]
impl Embedder for TableEmbedder {
    fn model_id(&self) -> &str {
        "table"
    }

    async fn embed(&self, text: &str) -> crate::Result<Vec<f32>> {
        Ok(self
            .table
            .get(text)
            .cloned()
            .unwrap_or_else(|| vec![0.0; self.dimension]))
    }

    async fn embed_many(&self, texts: &[String]) -> crate::Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    fn model_id(&self) -> &str {
        "table"
    }

    async fn embed(&self, _text: &str) -> crate::Result<Vec<f32>> {
        Err(DocsError::Embedding("connection refused".to_string()))
    }

    async fn embed_many(&self, _texts: &[String]) -> crate::Result<Vec<Vec<f32>>> {
        Err(DocsError::Embedding("connection refused".to_string()))
    }
}

fn chunk(id: &str, text: &str, source: &str) -> Chunk {
    Chunk {
        id: id.to_string(),
        text: text.to_string(),
        source_file: source.to_string(),
    }
}

async fn seeded_service(dir: &TempDir) -> Arc<IndexService> {
    let service = Arc::new(IndexService::new(dir.path(), 2, "table"));
    let writer = service.lock_writer().await;
    let mut staged = (*service.snapshot().await.expect("snapshot")).clone();
    staged
        .stage(
            vec![vec![0.0, 0.0], vec![5.0, 5.0], vec![1.0, 0.0]],
            vec![
                chunk("a.md_0", "origin text", "a.md"),
                chunk("b.txt_0", "far text", "b.txt"),
                chunk("a.md_1", "near text", "a.md"),
            ],
        )
        .expect("stage");
    service.commit(&writer, staged).await.expect("commit");
    drop(writer);
    service
}

fn embedder(query: &str, vector: Vec<f32>) -> Arc<dyn Embedder> {
    Arc::new(TableEmbedder {
        dimension: 2,
        table: HashMap::from([(query.to_string(), vector)]),
    })
}

#[tokio::test]
async fn retrieve_returns_nearest_first() {
    let dir = TempDir::new().expect("temp dir");
    let retriever = Retriever::new(seeded_service(&dir).await, embedder("q", vec![0.9, 0.0]));

    let hits = retriever.retrieve("q", 2).await.expect("retrieve");

    let slots: Vec<usize> = hits.iter().map(|h| h.slot).collect();
    assert_eq!(slots, vec![2, 0]);
    assert_eq!(hits[0].chunk.text, "near text");
    assert!(hits[0].distance <= hits[1].distance);
}

#[tokio::test]
async fn context_uses_source_prefix_and_blank_line_separator() {
    let dir = TempDir::new().expect("temp dir");
    let retriever = Retriever::new(seeded_service(&dir).await, embedder("q", vec![0.9, 0.0]));

    let context = retriever.retrieve_context("q", 2).await.expect("context");

    assert_eq!(
        context,
        "[source: a.md] near text\n\n[source: a.md] origin text"
    );
}

#[tokio::test]
async fn k_larger_than_index_returns_everything() {
    let dir = TempDir::new().expect("temp dir");
    let retriever = Retriever::new(seeded_service(&dir).await, embedder("q", vec![0.0, 0.0]));

    assert_eq!(retriever.retrieve("q", 50).await.expect("retrieve").len(), 3);
}

#[tokio::test]
async fn empty_index_gives_empty_context_without_embedding() {
    let dir = TempDir::new().expect("temp dir");
    let service = Arc::new(IndexService::new(dir.path(), 2, "table"));
    let retriever = Retriever::new(service, Arc::new(FailingEmbedder));

    assert_eq!(retriever.retrieve_context("q", 5).await.expect("context"), "");
}

#[tokio::test]
async fn unreadable_index_gives_empty_context() {
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(dir.path().join(VECTORS_FILE), "{broken").expect("write");
    let service = Arc::new(IndexService::new(dir.path(), 2, "table"));
    let retriever = Retriever::new(service, embedder("q", vec![0.0, 0.0]));

    assert_eq!(retriever.retrieve_context("q", 5).await.expect("context"), "");
}

#[tokio::test]
async fn embedding_failure_propagates() {
    let dir = TempDir::new().expect("temp dir");
    let retriever = Retriever::new(seeded_service(&dir).await, Arc::new(FailingEmbedder));

    assert!(matches!(
        retriever.retrieve("q", 5).await,
        Err(DocsError::Embedding(_))
    ));
}

#[tokio::test]
async fn wrong_query_dimension_propagates() {
    let dir = TempDir::new().expect("temp dir");
    let retriever = Retriever::new(seeded_service(&dir).await, embedder("q", vec![0.0; 3]));

    assert!(matches!(
        retriever.retrieve("q", 5).await,
        Err(DocsError::DimensionMismatch { .. })
    ));
}

#[test]
fn format_context_of_nothing_is_empty() {
    assert_eq!(format_context(&[]), "");
}

#[tokio::test]
async fn embedder_for_another_model_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let service = Arc::new(IndexService::new(dir.path(), 2, "other-model"));
    let retriever = Retriever::new(service, embedder("q", vec![0.0, 0.0]));

    let err = retriever.retrieve("q", 5).await.expect_err("model mismatch");

    assert!(matches!(
        err,
        DocsError::ModelMismatch { ref indexed, ref configured }
            if indexed == "other-model" && configured == "table"
    ));
}
