//! 에러 타입
//!
//! 라이브러리 모듈은 `RagError`를 반환하고, CLI 계층은 `anyhow`로 감싸서 출력합니다.

use std::path::PathBuf;

use thiserror::Error;

/// 파이프라인 Result 별칭
pub type Result<T> = std::result::Result<T, RagError>;

/// 청킹/임베딩/벡터 저장소 에러
#[derive(Debug, Error)]
pub enum RagError {
    /// 코퍼스 레코드를 해석할 수 없음
    #[error("Malformed input at line {line}: {reason}")]
    MalformedInput { line: usize, reason: String },

    /// 임베딩 프로바이더 호출 실패
    #[error("Embedding generation failed: {0}")]
    EmbeddingFailure(String),

    /// 저장소 파일 없음
    #[error("Vector store file not found: {}", .0.display())]
    StoreNotFound(PathBuf),

    /// 벡터 차원 불일치
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// 길이 0인 벡터는 저장할 수 없음
    #[error("Empty vector cannot be stored")]
    EmptyVector,

    /// 저장된 파일 구조가 잘못됨
    #[error("Malformed vector store file: {0}")]
    MalformedStore(String),

    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}

impl RagError {
    /// 임베딩 에러 생성
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::EmbeddingFailure(message.into())
    }

    /// 저장소 형식 에러 생성
    pub fn malformed_store(message: impl Into<String>) -> Self {
        Self::MalformedStore(message.into())
    }
}
