//! Knowledge 모듈 - 매뉴얼 검색용 지식 저장소
//!
//! - Chunker: 번호 제목(`10`, `10.2`, `10.2.1`) 기준 계층 청킹
//! - Vector: 인메모리 코사인 k-NN 검색
//! - Columnar: Parquet 단일 파일 영속화
//! - Ingest: 청크 임베딩 후 저장소 생성
//! - Retriever: 쿼리 임베딩 + 검색 파사드

mod chunker;
mod columnar;
mod ingest;
mod retriever;
mod vector;

// Re-exports
pub use chunker::{
    default_chunker, heading_chunker, read_corpus, write_corpus, write_corpus_to, Chunk,
    ChunkLevel, ChunkReport, Chunker, ChunkerConfig, HeadingChunker, ParentRef,
};
pub use ingest::{IngestReport, Ingestor};
pub use retriever::{build_context, Retriever};
pub use vector::{
    cosine_similarity, is_zero_vector, LinearScan, SearchIndex, SearchResult, VectorItem,
    VectorStore, VectorStoreStats,
};
