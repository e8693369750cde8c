//! Ingestion - 청크 → 임베딩 → 벡터 저장소
//!
//! 코퍼스의 각 청크 본문을 임베딩하여 `VectorStore`를 만듭니다.
//! 개별 임베딩 실패는 0 벡터로 대체하고 `IngestReport`에 집계합니다.

use std::path::Path;

use crate::config::DEFAULT_BATCH_SIZE;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

use super::chunker::{read_corpus, Chunk};
use super::vector::VectorStore;

/// 리포트에 보관할 최대 에러 메시지 수
const MAX_REPORTED_FAILURES: usize = 10;

// ============================================================================
// Types
// ============================================================================

/// 임베딩 생성 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// 정상 임베딩된 청크 수
    pub embedded: usize,
    /// 임베딩 실패로 0 벡터가 들어간 청크 수
    pub failed: usize,
    /// 본문이 비어 건너뛴 청크 수
    pub skipped: usize,
    /// 실패 메시지 (앞쪽 일부만)
    pub failures: Vec<String>,
}

impl IngestReport {
    /// 저장소에 들어간 항목 수
    pub fn stored(&self) -> usize {
        self.embedded + self.failed
    }
}

// ============================================================================
// Ingestor
// ============================================================================

/// 임베딩 생성기
pub struct Ingestor<E: EmbeddingProvider> {
    embedder: E,
    batch_size: usize,
}

impl<E: EmbeddingProvider> Ingestor<E> {
    pub fn new(embedder: E) -> Self {
        Self {
            embedder,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// 배치 크기 지정 (0이면 1로 취급)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// 청크 목록을 임베딩하여 저장소 생성
    ///
    /// 항목 순서는 입력 순서를 따릅니다 (빈 본문 제외).
    pub async fn ingest(&self, chunks: &[Chunk]) -> Result<(VectorStore, IngestReport)> {
        let mut report = IngestReport::default();
        let mut store = VectorStore::new();

        let pending: Vec<&Chunk> = chunks
            .iter()
            .filter(|chunk| {
                let blank = chunk.content().trim().is_empty();
                if blank {
                    tracing::debug!("Skipping chunk {} with empty content", chunk.id());
                }
                !blank
            })
            .collect();
        report.skipped = chunks.len() - pending.len();

        let total_batches = pending.len().div_ceil(self.batch_size);
        let dimension = self.embedder.dimension();

        for (batch_index, batch) in pending.chunks(self.batch_size).enumerate() {
            tracing::info!(
                "Embedding batch {}/{} ({} chunks) with {}",
                batch_index + 1,
                total_batches,
                batch.len(),
                self.embedder.name()
            );

            let texts: Vec<String> = batch.iter().map(|c| c.content().to_string()).collect();
            let results = self.embedder.embed_batch_lenient(&texts).await;

            let mut results = results.into_iter();
            for chunk in batch {
                // 누락된 결과나 차원이 다른 벡터도 실패로 처리
                let outcome = match results.next() {
                    Some(Ok(vector)) if vector.len() == dimension => Ok(vector),
                    Some(Ok(vector)) => Err(RagError::DimensionMismatch {
                        expected: dimension,
                        actual: vector.len(),
                    }),
                    Some(Err(e)) => Err(e),
                    None => Err(RagError::embedding("provider returned no result")),
                };

                let vector = match outcome {
                    Ok(vector) => {
                        report.embedded += 1;
                        vector
                    }
                    Err(e) => {
                        tracing::warn!("Failed to embed chunk {}: {}", chunk.id(), e);
                        report.failed += 1;
                        if report.failures.len() < MAX_REPORTED_FAILURES {
                            report.failures.push(format!("{}: {}", chunk.id(), e));
                        }
                        vec![0.0; dimension]
                    }
                };

                store.add_item(chunk.content(), vector, (*chunk).clone())?;
            }
        }

        tracing::info!(
            "Ingestion finished: embedded={}, failed={}, skipped={}",
            report.embedded,
            report.failed,
            report.skipped
        );

        Ok((store, report))
    }

    /// 코퍼스 파일을 읽어 임베딩 후 Parquet로 저장
    pub async fn ingest_file(&self, corpus: &Path, output: &Path) -> Result<IngestReport> {
        let chunks = read_corpus(corpus)?;
        tracing::info!("Loaded {} chunks from {:?}", chunks.len(), corpus);

        let (store, report) = self.ingest(&chunks).await?;
        store.save(output)?;
        Ok(report)
    }
}

// ============================================================================
// Tests
// ============================================================================
