//! Vector Store - 인메모리 정확 k-NN 검색
//!
//! (text, vector, metadata) 항목을 병렬 배열로 보관하고
//! 코사인 유사도로 정렬한 상위 k개를 반환합니다.
//!
//! 영속화는 `columnar` 모듈의 Parquet 스냅샷을 사용합니다.

use std::path::Path;

use crate::error::{RagError, Result};

use super::chunker::Chunk;
use super::columnar::{self, Snapshot};

// ============================================================================
// Types
// ============================================================================

/// 저장소의 한 항목 (빌린 뷰)
#[derive(Debug, Clone, Copy)]
pub struct VectorItem<'a> {
    pub vector: &'a [f32],
    pub text: &'a str,
    pub metadata: &'a Chunk,
}

/// 검색 결과
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// 삽입 순서 인덱스
    pub index: usize,
    /// 청크 텍스트
    pub text: String,
    /// 청크 메타데이터
    pub metadata: Chunk,
    /// 코사인 유사도 (-1.0 ~ 1.0)
    pub similarity: f32,
}

/// 저장소 통계
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorStoreStats {
    pub item_count: usize,
    pub dimension: Option<usize>,
    /// 임베딩 실패로 0 벡터가 들어간 항목 수
    pub zero_vectors: usize,
}

// ============================================================================
// SearchIndex Trait
// ============================================================================

/// 순위 계산 전략
///
/// 어떤 구현이든 `VectorStore::search` 계약(유사도 내림차순, 동점은 삽입 순서,
/// 최대 k개)을 지켜야 합니다.
pub trait SearchIndex: Send + Sync {
    /// (인덱스, 유사도) 상위 k개 반환
    fn rank(&self, query: &[f32], vectors: &[Vec<f32>], k: usize) -> Vec<(usize, f32)>;

    /// 전략 이름
    fn name(&self) -> &'static str;
}

/// 전수 비교 (O(n·d))
///
/// 수천 개 청크 규모의 정적 코퍼스에 맞춘 기본 전략입니다.
/// 더 큰 규모에서는 같은 트레이트 뒤에 ANN 인덱스를 두면 됩니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearScan;

impl SearchIndex for LinearScan {
    fn rank(&self, query: &[f32], vectors: &[Vec<f32>], k: usize) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, cosine_similarity(query, v)))
            .collect();

        // stable sort: 동점은 삽입 순서 유지
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }

    fn name(&self) -> &'static str {
        "linear-scan"
    }
}

// ============================================================================
// VectorStore
// ============================================================================

/// 인메모리 벡터 저장소
///
/// `vectors`, `texts`, `metadata`의 길이는 항상 같습니다.
/// 첫 항목이 차원을 정하고, 이후 항목은 같은 차원이어야 합니다.
#[derive(Debug, Clone, Default)]
pub struct VectorStore<S: SearchIndex = LinearScan> {
    vectors: Vec<Vec<f32>>,
    texts: Vec<String>,
    metadata: Vec<Chunk>,
    dimension: Option<usize>,
    index: S,
}

impl VectorStore<LinearScan> {
    /// 빈 저장소 생성
    pub fn new() -> Self {
        Self::with_index(LinearScan)
    }

    /// Parquet 파일에서 저장소 열기
    pub fn open(path: &Path) -> Result<Self> {
        let mut store = Self::new();
        store.load(path)?;
        Ok(store)
    }
}

impl<S: SearchIndex> VectorStore<S> {
    /// 검색 전략을 지정하여 생성
    pub fn with_index(index: S) -> Self {
        Self {
            vectors: Vec::new(),
            texts: Vec::new(),
            metadata: Vec::new(),
            dimension: None,
            index,
        }
    }

    /// 항목 추가
    ///
    /// 중복 텍스트/메타데이터도 허용합니다. 빈 벡터나 차원이 다른 벡터는 거부합니다.
    pub fn add_item(
        &mut self,
        text: impl Into<String>,
        vector: Vec<f32>,
        metadata: Chunk,
    ) -> Result<()> {
        if vector.is_empty() {
            return Err(RagError::EmptyVector);
        }

        match self.dimension {
            Some(expected) if expected != vector.len() => {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
            Some(_) => {}
            None => self.dimension = Some(vector.len()),
        }

        self.vectors.push(vector);
        self.texts.push(text.into());
        self.metadata.push(metadata);
        Ok(())
    }

    /// 코사인 유사도 상위 k개 검색
    ///
    /// 빈 저장소나 `k == 0`이면 빈 결과를 반환합니다.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 || self.is_empty() {
            return Ok(vec![]);
        }

        if let Some(expected) = self.dimension {
            if expected != query.len() {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: query.len(),
                });
            }
        }

        let k = k.min(self.len());
        let ranked = self.index.rank(query, &self.vectors, k);

        // 범위를 벗어난 인덱스는 버림
        Ok(ranked
            .into_iter()
            .filter_map(|(index, similarity)| {
                let text = self.texts.get(index)?;
                let metadata = self.metadata.get(index)?;
                Some(SearchResult {
                    index,
                    text: text.clone(),
                    metadata: metadata.clone(),
                    similarity,
                })
            })
            .take(k)
            .collect())
    }

    /// Parquet 파일로 저장 (기존 파일 덮어쓰기)
    pub fn save(&self, path: &Path) -> Result<()> {
        columnar::write_snapshot(path, &self.vectors, &self.texts, &self.metadata)?;
        tracing::info!("Vector store saved to {:?} ({} items)", path, self.len());
        Ok(())
    }

    /// Parquet 파일에서 전체 내용을 읽어 교체
    ///
    /// 실패하면 기존 내용은 그대로 유지됩니다.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        let Snapshot {
            vectors,
            texts,
            metadata,
        } = columnar::read_snapshot(path)?;

        let dimension = vectors.first().map(Vec::len);
        if dimension == Some(0) {
            return Err(RagError::malformed_store("empty vector at row 0"));
        }
        if let Some(expected) = dimension {
            if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
                return Err(RagError::malformed_store(format!(
                    "ragged vectors: expected dimension {}, found {}",
                    expected,
                    bad.len()
                )));
            }
        }

        self.vectors = vectors;
        self.texts = texts;
        self.metadata = metadata;
        self.dimension = dimension;

        tracing::info!("Vector store loaded from {:?} ({} items)", path, self.len());
        Ok(())
    }

    /// 항목 수
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// 확정된 벡터 차원 (빈 저장소면 None)
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// 검색 전략 이름
    pub fn index_name(&self) -> &'static str {
        self.index.name()
    }

    /// 삽입 순서대로 항목 순회
    pub fn items(&self) -> impl Iterator<Item = VectorItem<'_>> {
        self.vectors
            .iter()
            .zip(self.texts.iter())
            .zip(self.metadata.iter())
            .map(|((vector, text), metadata)| VectorItem {
                vector,
                text,
                metadata,
            })
    }

    /// 저장소 통계
    pub fn stats(&self) -> VectorStoreStats {
        VectorStoreStats {
            item_count: self.len(),
            dimension: self.dimension,
            zero_vectors: self.vectors.iter().filter(|v| is_zero_vector(v)).count(),
        }
    }
}

// ============================================================================
// Utility Functions
// ============================================================================

/// 코사인 유사도 계산
///
/// 결과는 -1.0 ~ 1.0 범위입니다. 길이가 다르거나, 한쪽 norm이 0이거나,
/// 결과가 유한하지 않으면 0.0을 반환합니다 (NaN 전파 없음).
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    if !similarity.is_finite() {
        return 0.0;
    }

    similarity.clamp(-1.0, 1.0) as f32
}

/// 모든 성분이 0인지 확인
pub fn is_zero_vector(v: &[f32]) -> bool {
    v.iter().all(|x| *x == 0.0)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(id: &str) -> Chunk {
        Chunk::new(id, format!("Title {}", id), format!("Content {}", id), vec![])
    }

    fn abc_store() -> VectorStore {
        let mut store = VectorStore::new();
        store.add_item("A", vec![1.0, 0.0], meta("1")).unwrap();
        store.add_item("B", vec![0.0, 1.0], meta("2")).unwrap();
        store.add_item("C", vec![1.0, 1.0], meta("3")).unwrap();
        store
    }

    /// 작은 결정적 의사난수 (테스트용 LCG)
    fn pseudo_vectors(count: usize, dim: usize, seed: u64) -> Vec<Vec<f32>> {
        let mut state = seed;
        (0..count)
            .map(|_| {
                (0..dim)
                    .map(|_| {
                        state = state
                            .wrapping_mul(6364136223846793005)
                            .wrapping_add(1442695040888963407);
                        ((state >> 33) as f32 / u32::MAX as f32) * 2.0 - 1.0
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_cosine_similarity_same() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let c = vec![0.0, 1.0, 0.0];
        assert_eq!(cosine_similarity(&a, &c), 0.0);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let a = vec![1.0, 0.0, 0.0];
        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) - -1.0).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let a = vec![1.0, 2.0, 3.0];
        let zero = vec![0.0; 3];
        assert_eq!(cosine_similarity(&a, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &a), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);

        let empty: Vec<f32> = vec![];
        assert_eq!(cosine_similarity(&empty, &empty), 0.0);
    }

    #[test]
    fn test_cosine_similarity_bounds() {
        let vectors = pseudo_vectors(40, 8, 7);
        for a in &vectors {
            for b in &vectors {
                let s = cosine_similarity(a, b);
                assert!(s.is_finite());
                assert!((-1.0..=1.0).contains(&s), "similarity out of range: {s}");
            }
        }

        let huge = vec![f32::MAX, f32::MAX];
        let s = cosine_similarity(&huge, &huge);
        assert!(s.is_finite());
        assert!((-1.0..=1.0).contains(&s));
    }

    #[test]
    fn test_search_end_to_end_example() {
        let store = abc_store();
        let results = store.search(&[1.0, 0.0], 2).unwrap();

        let texts: Vec<&str> = results.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["A", "C"]);
        assert!((results[0].similarity - 1.0).abs() < 1e-6);
        assert!((results[1].similarity - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-4);
        assert_eq!(results[1].metadata.id(), "3");
    }

    #[test]
    fn test_search_boundaries() {
        let empty = VectorStore::new();
        assert!(empty.search(&[1.0, 0.0], 5).unwrap().is_empty());

        let store = abc_store();
        assert!(store.search(&[1.0, 0.0], 0).unwrap().is_empty());
        assert_eq!(store.search(&[1.0, 0.0], 10).unwrap().len(), 3);
    }

    #[test]
    fn test_search_ties_keep_insertion_order() {
        let mut store = VectorStore::new();
        store.add_item("first", vec![1.0, 0.0], meta("1")).unwrap();
        store.add_item("second", vec![2.0, 0.0], meta("2")).unwrap();
        store.add_item("dup", vec![1.0, 0.0], meta("1")).unwrap();

        let results = store.search(&[1.0, 0.0], 3).unwrap();
        let indices: Vec<usize> = results.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_search_matches_brute_force() {
        let vectors = pseudo_vectors(50, 6, 42);
        let query = pseudo_vectors(1, 6, 99).remove(0);

        let mut store = VectorStore::new();
        for (i, v) in vectors.iter().enumerate() {
            store
                .add_item(format!("t{}", i), v.clone(), meta(&i.to_string()))
                .unwrap();
        }

        let mut reference: Vec<(usize, f32)> = vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, cosine_similarity(&query, v)))
            .collect();
        reference.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());

        let results = store.search(&query, store.len()).unwrap();
        let got: Vec<(usize, f32)> = results.iter().map(|r| (r.index, r.similarity)).collect();
        assert_eq!(got, reference);

        for pair in results.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[test]
    fn test_zero_vector_item_scores_zero() {
        let mut store = VectorStore::new();
        store.add_item("degraded", vec![0.0, 0.0], meta("1")).unwrap();
        store.add_item("good", vec![-1.0, 0.0], meta("2")).unwrap();

        let results = store.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results[0].text, "degraded");
        assert_eq!(results[0].similarity, 0.0);
        assert_eq!(results[1].similarity, -1.0);
        assert_eq!(store.stats().zero_vectors, 1);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut store = abc_store();

        let err = store.add_item("D", vec![1.0, 0.0, 0.0], meta("4"));
        assert!(matches!(
            err,
            Err(RagError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
        assert_eq!(store.len(), 3);

        assert!(matches!(
            store.search(&[1.0], 1),
            Err(RagError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_items_and_stats() {
        let store = abc_store();
        let items: Vec<VectorItem> = store.items().collect();

        assert_eq!(items.len(), 3);
        assert_eq!(items[2].text, "C");
        assert_eq!(items[2].vector, &[1.0, 1.0]);
        assert_eq!(items[2].metadata.id(), "3");

        let stats = store.stats();
        assert_eq!(stats.item_count, 3);
        assert_eq!(stats.dimension, Some(2));
        assert_eq!(store.index_name(), "linear-scan");
    }

    #[test]
    fn test_empty_vector_rejected() {
        let mut store = VectorStore::new();
        assert!(matches!(
            store.add_item("E", vec![], meta("1")),
            Err(RagError::EmptyVector)
        ));
        assert!(store.is_empty());
        assert_eq!(store.dimension(), None);

        // 거부 후에도 정상 벡터는 들어감
        store.add_item("A", vec![1.0, 0.0], meta("2")).unwrap();
        assert_eq!(store.dimension(), Some(2));

        let mut store = abc_store();
        assert!(matches!(
            store.add_item("E", vec![], meta("4")),
            Err(RagError::EmptyVector)
        ));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_custom_index() {
        /// 최소 유사도 미만 결과를 버리는 전수 비교
        struct Thresholded {
            min_similarity: f32,
        }

        impl SearchIndex for Thresholded {
            fn rank(&self, query: &[f32], vectors: &[Vec<f32>], k: usize) -> Vec<(usize, f32)> {
                LinearScan
                    .rank(query, vectors, k)
                    .into_iter()
                    .filter(|(_, similarity)| *similarity >= self.min_similarity)
                    .collect()
            }

            fn name(&self) -> &'static str {
                "thresholded"
            }
        }

        let mut store = VectorStore::with_index(Thresholded {
            min_similarity: 0.5,
        });
        store.add_item("A", vec![1.0, 0.0], meta("1")).unwrap();
        store.add_item("B", vec![0.0, 1.0], meta("2")).unwrap();
        store.add_item("C", vec![1.0, 1.0], meta("3")).unwrap();
        store.add_item("D", vec![1.0, 0.0], meta("4")).unwrap();

        let results = store.search(&[1.0, 0.0], 5).unwrap();
        let texts: Vec<&str> = results.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["A", "D", "C"]);
        assert!(results
            .windows(2)
            .all(|w| w[0].similarity >= w[1].similarity));
        assert_eq!(store.index_name(), "thresholded");
    }

    #[test]
    fn test_out_of_range_rank_is_skipped() {
        struct Overshoot;

        impl SearchIndex for Overshoot {
            fn rank(&self, _query: &[f32], vectors: &[Vec<f32>], _k: usize) -> Vec<(usize, f32)> {
                vec![(vectors.len() + 3, 1.0), (0, 0.5), (vectors.len(), 0.4)]
            }

            fn name(&self) -> &'static str {
                "overshoot"
            }
        }

        let mut store = VectorStore::with_index(Overshoot);
        store.add_item("A", vec![1.0], meta("1")).unwrap();

        let results = store.search(&[1.0], 3).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].index, 0);
        assert_eq!(results[0].text, "A");
    }
}
