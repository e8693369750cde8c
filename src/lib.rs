//! manual-rag - 기술 매뉴얼 검색 증강 생성(RAG) 코어
//!
//! 번호 제목 기반 계층 청킹, 코사인 유사도 벡터 검색,
//! Parquet 영속화를 제공합니다.

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod knowledge;

// Re-exports
pub use config::{get_data_dir, EmbeddingConfig, RagConfig};
pub use embedding::{create_embedder, EmbeddingProvider, GeminiEmbedding};
pub use error::{RagError, Result};
pub use knowledge::{
    build_context, cosine_similarity, default_chunker, read_corpus, write_corpus, Chunk,
    ChunkLevel, ChunkReport, Chunker, ChunkerConfig, HeadingChunker, IngestReport, Ingestor,
    LinearScan, ParentRef, Retriever, SearchIndex, SearchResult, VectorStore,
};
