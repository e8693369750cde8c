//! 설정 모듈
//!
//! 모든 설정은 명시적인 값으로 전달됩니다.
//! 환경변수는 CLI 진입점에서 `from_env()`로 한 번만 읽습니다.

use std::path::{Path, PathBuf};

use crate::error::{RagError, Result};

/// 기본 임베딩 모델 (Gemini)
/// source: https://ai.google.dev/gemini-api/docs/embeddings
pub const DEFAULT_MODEL: &str = "gemini-embedding-001";

/// 기본 임베딩 차원
pub const DEFAULT_DIMENSION: usize = 768;

/// 기본 검색 결과 수
pub const DEFAULT_TOP_K: usize = 5;

/// 임베딩 배치 크기 (진행 로그 단위)
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// 코퍼스 파일 이름
pub const CORPUS_FILE: &str = "chunks.jsonl";

/// 벡터 저장소 파일 이름
pub const STORE_FILE: &str = "embeddings.parquet";

// ============================================================================
// Data Directory
// ============================================================================

/// 데이터 디렉토리 경로 (~/.manual-rag/)
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".manual-rag")
}

// ============================================================================
// EmbeddingConfig
// ============================================================================

/// 임베딩 프로바이더 설정
#[derive(Clone)]
pub struct EmbeddingConfig {
    /// API 키
    pub api_key: String,
    /// 모델 이름
    pub model: String,
    /// 출력 차원 (768, 1536, 3072)
    pub dimension: usize,
    /// HTTP 타임아웃 (초)
    pub timeout_secs: u64,
}

impl std::fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("dimension", &self.dimension)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl EmbeddingConfig {
    /// API 키로 기본 설정 생성
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            dimension: DEFAULT_DIMENSION,
            timeout_secs: 30,
        }
    }

    /// 차원 지정
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// 환경변수에서 API 키를 읽어 생성
    ///
    /// 우선순위: GEMINI_API_KEY > GOOGLE_AI_API_KEY
    pub fn from_env() -> Result<Self> {
        let api_key = get_api_key().ok_or_else(|| {
            RagError::Config(
                "API key not found. Set GEMINI_API_KEY or GOOGLE_AI_API_KEY environment variable.\n\
                 Get your API key at: https://aistudio.google.com/app/apikey"
                    .to_string(),
            )
        })?;
        Ok(Self::new(api_key))
    }
}

/// 환경변수에서 API 키 조회
///
/// 1. `GEMINI_API_KEY`
/// 2. `GOOGLE_AI_API_KEY`
pub fn get_api_key() -> Option<String> {
    ["GEMINI_API_KEY", "GOOGLE_AI_API_KEY"]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|key| !key.is_empty())
}

/// API 키 존재 여부 확인
pub fn has_api_key() -> bool {
    get_api_key().is_some()
}

// ============================================================================
// RagConfig
// ============================================================================

/// 파이프라인 설정
#[derive(Debug, Clone)]
pub struct RagConfig {
    /// 데이터 디렉토리
    pub data_dir: PathBuf,
    /// 청킹 결과 JSONL 경로
    pub corpus_path: PathBuf,
    /// Parquet 벡터 저장소 경로
    pub store_path: PathBuf,
    /// 기본 검색 결과 수
    pub top_k: usize,
    /// 임베딩 배치 크기
    pub batch_size: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self::with_data_dir(&get_data_dir())
    }
}

impl RagConfig {
    /// 지정된 데이터 디렉토리 기준 설정
    pub fn with_data_dir(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            corpus_path: data_dir.join(CORPUS_FILE),
            store_path: data_dir.join(STORE_FILE),
            top_k: DEFAULT_TOP_K,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// 코퍼스 경로 덮어쓰기
    pub fn corpus(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.corpus_path = path;
        }
        self
    }

    /// 저장소 경로 덮어쓰기
    pub fn store(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.store_path = path;
        }
        self
    }

    /// 검색 결과 수 덮어쓰기
    pub fn top_k(mut self, top_k: Option<usize>) -> Self {
        if let Some(top_k) = top_k {
            self.top_k = top_k;
        }
        self
    }
}
