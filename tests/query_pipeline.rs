//! Query pipeline tests with in-process fakes: the empty-retrieval short
//! circuit, prompt grounding, and score pass-through.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use ragline::clients::{EmbeddingStage, Generation, VectorIndex};
use ragline::error::PipelineError;
use ragline::query::{NO_CONTEXT_ANSWER, QueryPipeline};
use ragline::types::ScoredChunk;

struct UnitEmbedder;

#[async_trait]
impl EmbeddingStage for UnitEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, PipelineError> {
        Ok(vec![1.0, 0.0])
    }
    async fn embed_and_store(
        &self,
        _doc_id: i64,
        chunks: &[String],
    ) -> Result<usize, PipelineError> {
        Ok(chunks.len())
    }
}

/// Index fake returning a canned result set.
struct CannedIndex {
    results: Vec<ScoredChunk>,
}

#[async_trait]
impl VectorIndex for CannedIndex {
    async fn store(
        &self,
        _doc_id: i64,
        chunks: &[String],
        _embeddings: &[Vec<f32>],
    ) -> Result<usize, PipelineError> {
        Ok(chunks.len())
    }
    async fn search(
        &self,
        _embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, PipelineError> {
        Ok(self.results.iter().take(top_k).cloned().collect())
    }
    async fn delete_document(&self, _doc_id: i64) -> Result<(), PipelineError> {
        Ok(())
    }
}

/// Generator fake that counts calls and records the prompt it received.
struct CapturingGenerator {
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl CapturingGenerator {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Generation for CapturingGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().await.push(prompt.to_string());
        Ok("a grounded answer".to_string())
    }
}

fn chunk(text: &str, score: f32, doc_id: i64) -> ScoredChunk {
    ScoredChunk {
        text: text.to_string(),
        score,
        doc_id,
    }
}

fn pipeline_with(
    results: Vec<ScoredChunk>,
    generator: Arc<CapturingGenerator>,
) -> QueryPipeline {
    QueryPipeline::new(
        Arc::new(UnitEmbedder),
        Arc::new(CannedIndex { results }),
        generator,
    )
}

#[tokio::test]
async fn empty_retrieval_short_circuits_without_generation() {
    let generator = CapturingGenerator::new();
    let pipeline = pipeline_with(Vec::new(), generator.clone());

    let result = pipeline.answer("anything indexed?", 5).await.unwrap();
    assert_eq!(result.answer, NO_CONTEXT_ANSWER);
    assert!(result.sources.is_empty());
    assert_eq!(
        generator.calls.load(Ordering::SeqCst),
        0,
        "generation backend must not be called on empty context"
    );
}

#[tokio::test]
async fn answer_carries_sources_in_retrieval_order() {
    let generator = CapturingGenerator::new();
    let pipeline = pipeline_with(
        vec![
            chunk("closest", 0.05, 3),
            chunk("middle", 0.20, 1),
            chunk("farthest", 0.80, 3),
        ],
        generator.clone(),
    );

    let result = pipeline.answer("what is closest?", 3).await.unwrap();
    assert_eq!(result.answer, "a grounded answer");
    assert_eq!(result.question, "what is closest?");

    let pairs: Vec<(i64, f32)> = result.sources.iter().map(|s| (s.doc_id, s.score)).collect();
    assert_eq!(pairs, vec![(3, 0.05), (1, 0.20), (3, 0.80)]);
    // Scores are passed through, never normalized or reordered.
    for pair in result.sources.windows(2) {
        assert!(pair[0].score <= pair[1].score);
    }
}

#[tokio::test]
async fn prompt_grounds_the_generator_in_retrieved_chunks() {
    let generator = CapturingGenerator::new();
    let pipeline = pipeline_with(
        vec![chunk("the sky is blue", 0.1, 1), chunk("grass is green", 0.2, 2)],
        generator.clone(),
    );

    pipeline.answer("what color is the sky?", 2).await.unwrap();

    let prompts = generator.prompts.lock().await;
    assert_eq!(prompts.len(), 1);
    let prompt = &prompts[0];
    assert!(prompt.contains("- the sky is blue"));
    assert!(prompt.contains("- grass is green"));
    assert!(prompt.contains("what color is the sky?"));
    assert!(prompt.contains("ONLY the context"));
    assert!(prompt.contains("I don't know"));
}

#[tokio::test]
async fn top_k_bounds_retrieval() {
    let generator = CapturingGenerator::new();
    let pipeline = pipeline_with(
        vec![chunk("a", 0.1, 1), chunk("b", 0.2, 2), chunk("c", 0.3, 3)],
        generator.clone(),
    );

    let result = pipeline.answer("q", 2).await.unwrap();
    assert_eq!(result.sources.len(), 2);
}

#[tokio::test]
async fn downstream_failure_surfaces_without_retry() {
    struct FailingIndex {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl VectorIndex for FailingIndex {
        async fn store(
            &self,
            _doc_id: i64,
            _chunks: &[String],
            _embeddings: &[Vec<f32>],
        ) -> Result<usize, PipelineError> {
            unreachable!("query path never stores")
        }
        async fn search(
            &self,
            _embedding: &[f32],
            _top_k: usize,
        ) -> Result<Vec<ScoredChunk>, PipelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(PipelineError::downstream("vectordb", "connection refused"))
        }
        async fn delete_document(&self, _doc_id: i64) -> Result<(), PipelineError> {
            Ok(())
        }
    }

    let index = Arc::new(FailingIndex {
        calls: AtomicUsize::new(0),
    });
    let generator = CapturingGenerator::new();
    let pipeline = QueryPipeline::new(Arc::new(UnitEmbedder), index.clone(), generator.clone());

    let err = pipeline.answer("q", 5).await.unwrap_err();
    assert!(err.is_retryable(), "error class is downstream");
    // But the query path made exactly one attempt and no generation call.
    assert_eq!(index.calls.load(Ordering::SeqCst), 1);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}
