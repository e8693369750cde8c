//! Retriever - 쿼리 임베딩 + 벡터 검색 파사드
//!
//! 쿼리를 임베딩하고 저장소에서 유사한 청크 텍스트를 찾아
//! 답변 생성기에 넘길 컨텍스트를 만듭니다.

use crate::embedding::EmbeddingProvider;
use crate::error::Result;

use super::vector::{LinearScan, SearchIndex, SearchResult, VectorStore};

/// 컨텍스트 블록 구분자
const CONTEXT_SEPARATOR: &str = "\n\n";

/// 검색 파사드
///
/// 캐시나 재시도는 없습니다. 임베딩 실패는 그대로 전파됩니다.
pub struct Retriever<E: EmbeddingProvider, S: SearchIndex = LinearScan> {
    store: VectorStore<S>,
    embedder: E,
}

impl<E: EmbeddingProvider, S: SearchIndex> Retriever<E, S> {
    pub fn new(store: VectorStore<S>, embedder: E) -> Self {
        Self { store, embedder }
    }

    /// 유사도 내림차순 상위 k개 텍스트
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>> {
        let hits = self.retrieve_hits(query, k).await?;
        Ok(hits.into_iter().map(|hit| hit.text).collect())
    }

    /// 유사도 내림차순 상위 k개 검색 결과 (메타데이터 포함)
    pub async fn retrieve_hits(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedder.embed_query(query).await?;
        let hits = self.store.search(&query_embedding, k)?;

        tracing::debug!(
            "Retrieved {} hits for query ({} chars, k={})",
            hits.len(),
            query.chars().count(),
            k
        );
        Ok(hits)
    }

    pub fn store(&self) -> &VectorStore<S> {
        &self.store
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }
}

/// 검색된 텍스트를 빈 줄로 이어 하나의 컨텍스트로 결합
pub fn build_context<T: AsRef<str>>(texts: &[T]) -> String {
    texts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

// ============================================================================
// Tests
// ============================================================================
