//! Query orchestrator: embed the question, retrieve the nearest chunks,
//! and ask the generation backend for a grounded answer.
//!
//! This path is latency sensitive and carries no retry budget; any
//! downstream failure surfaces immediately to the caller.

use std::sync::Arc;

use crate::clients::{EmbeddingStage, Generation, VectorIndex};
use crate::error::PipelineError;
use crate::types::{QueryAnswer, ScoredChunk, SourceRef};

/// Answer returned without calling the generator when retrieval finds
/// nothing; avoids hallucinating on empty context.
pub const NO_CONTEXT_ANSWER: &str = "No relevant context found.";

pub struct QueryPipeline {
    embedding: Arc<dyn EmbeddingStage>,
    index: Arc<dyn VectorIndex>,
    generation: Arc<dyn Generation>,
}

impl QueryPipeline {
    pub fn new(
        embedding: Arc<dyn EmbeddingStage>,
        index: Arc<dyn VectorIndex>,
        generation: Arc<dyn Generation>,
    ) -> Self {
        Self {
            embedding,
            index,
            generation,
        }
    }

    /// Runs one question end to end and returns the answer together with
    /// the `{doc_id, score}` attribution of every retrieved chunk, in
    /// retrieval order. Scores are passed through from the index unchanged.
    pub async fn answer(
        &self,
        question: &str,
        top_k: usize,
    ) -> Result<QueryAnswer, PipelineError> {
        let embedding = self.embedding.embed(question).await?;
        let chunks = self.index.search(&embedding, top_k).await?;

        if chunks.is_empty() {
            tracing::info!("no chunks retrieved, skipping generation");
            return Ok(QueryAnswer {
                question: question.to_string(),
                answer: NO_CONTEXT_ANSWER.to_string(),
                sources: Vec::new(),
            });
        }

        let prompt = build_prompt(&chunks, question);
        let answer = self.generation.generate(&prompt).await?;

        let sources = chunks
            .iter()
            .map(|chunk| SourceRef {
                doc_id: chunk.doc_id,
                score: chunk.score,
            })
            .collect();

        Ok(QueryAnswer {
            question: question.to_string(),
            answer,
            sources,
        })
    }
}

/// Builds the grounded prompt: answer only from the bulleted context,
/// with an explicit "I don't know" escape hatch.
pub fn build_prompt(chunks: &[ScoredChunk], question: &str) -> String {
    let context = chunks
        .iter()
        .map(|chunk| format!("- {}", chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are a helpful assistant.\n\
         Answer the question using ONLY the context below.\n\
         If the answer is not in the context, say \"I don't know\".\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Question:\n\
         {question}\n\
         \n\
         Answer:"
    )
}
