//! CLI 모듈
//!
//! manual-rag CLI 명령어 정의 및 구현

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::config::{has_api_key, RagConfig};
use crate::embedding::create_embedder;
use crate::knowledge::{
    build_context, read_corpus, ChunkerConfig, HeadingChunker, Ingestor, Retriever, VectorStore,
};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "manual-rag")]
#[command(version, about = "기술 매뉴얼 RAG 검색 도구", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 텍스트 문서를 번호 제목 기준으로 청킹
    Chunk {
        /// 입력 텍스트 파일
        input: PathBuf,

        /// 출력 JSONL 경로 (기본: 데이터 디렉토리/chunks.jsonl)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// PDF 추출 잔여물 정리 (페이지 번호, 분리된 제목 번호)
        #[arg(long)]
        clean: bool,
    },

    /// 청크 임베딩 생성 후 Parquet 저장소로 저장
    Embed {
        /// 입력 JSONL 코퍼스 경로
        #[arg(short, long)]
        corpus: Option<PathBuf>,

        /// 출력 Parquet 저장소 경로
        #[arg(short, long)]
        store: Option<PathBuf>,

        /// 기존 저장소 덮어쓰기
        #[arg(long)]
        force: bool,
    },

    /// 저장소 검색
    Query {
        /// 검색 쿼리
        query: String,

        /// 결과 개수 제한 (기본: 5)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Parquet 저장소 경로
        #[arg(short, long)]
        store: Option<PathBuf>,

        /// 결과를 하나의 컨텍스트 블록으로 출력
        #[arg(long)]
        context: bool,
    },

    /// 상태 확인
    Status,
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    let config = RagConfig::default();

    match cli.command {
        Commands::Chunk {
            input,
            output,
            clean,
        } => cmd_chunk(&config.corpus(output), &input, clean),
        Commands::Embed {
            corpus,
            store,
            force,
        } => cmd_embed(&config.corpus(corpus).store(store), force).await,
        Commands::Query {
            query,
            limit,
            store,
            context,
        } => cmd_query(&config.store(store).top_k(limit), &query, context).await,
        Commands::Status => cmd_status(&config),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 청킹 명령어 (chunk)
fn cmd_chunk(config: &RagConfig, input: &Path, clean: bool) -> Result<()> {
    println!("[*] 청킹 중: {}", input.display());

    let chunker = HeadingChunker::new(ChunkerConfig { clean_lines: clean });
    let report = chunker
        .chunk_file(input, &config.corpus_path)
        .with_context(|| format!("청킹 실패: {}", input.display()))?;

    if report.chunks.is_empty() {
        println!("[!] 번호 제목을 찾지 못했습니다. 청크가 없습니다.");
    } else {
        println!("[OK] 청크 {} 개 생성", report.chunks.len());
    }

    if report.dropped_lines > 0 {
        println!("     첫 제목 이전 본문 {} 줄 제외", report.dropped_lines);
    }
    if report.malformed_lines > 0 {
        println!("     중복 제목 {} 줄을 본문으로 처리", report.malformed_lines);
    }
    println!("     출력: {}", config.corpus_path.display());

    Ok(())
}

/// 임베딩 명령어 (embed)
///
/// 코퍼스의 각 청크를 임베딩하여 Parquet 저장소로 저장합니다.
async fn cmd_embed(config: &RagConfig, force: bool) -> Result<()> {
    require_api_key()?;
    refuse_overwrite(&config.store_path, force)?;

    let embedder = create_embedder().context("임베딩 프로바이더 생성 실패")?;

    println!("[*] 임베딩 생성 중: {}", config.corpus_path.display());

    let report = Ingestor::new(embedder)
        .with_batch_size(config.batch_size)
        .ingest_file(&config.corpus_path, &config.store_path)
        .await
        .context("임베딩 생성 실패")?;

    println!(
        "[OK] 완료: 성공 {}, 실패 {}, 건너뜀 {}",
        report.embedded, report.failed, report.skipped
    );
    println!("     저장소: {}", config.store_path.display());

    if report.failed > 0 {
        println!("[!] 실패한 청크는 0 벡터로 저장되어 검색되지 않습니다:");
        for failure in &report.failures {
            println!("    - {}", truncate_text(failure, 120));
        }
    }

    Ok(())
}

/// 검색 명령어 (query)
async fn cmd_query(config: &RagConfig, query: &str, context: bool) -> Result<()> {
    require_api_key()?;

    if !config.store_path.exists() {
        bail!(
            "저장소를 찾을 수 없습니다: {}\n먼저 `manual-rag embed`를 실행하세요.",
            config.store_path.display()
        );
    }

    let store = VectorStore::open(&config.store_path).context("벡터 저장소 열기 실패")?;
    let embedder = create_embedder().context("임베딩 프로바이더 생성 실패")?;
    let retriever = Retriever::new(store, embedder);

    if !context {
        println!("[*] 검색 중: \"{}\"", query);
    }

    let hits = retriever
        .retrieve_hits(query, config.top_k)
        .await
        .context("검색 실패")?;

    if hits.is_empty() {
        println!("\n[!] 검색 결과가 없습니다.");
        return Ok(());
    }

    if context {
        let texts: Vec<&str> = hits.iter().map(|hit| hit.text.as_str()).collect();
        println!("{}", build_context(&texts));
        return Ok(());
    }

    println!("\n[OK] 검색 결과 ({} 건):\n", hits.len());

    for (i, hit) in hits.iter().enumerate() {
        println!(
            "{}. [{}] [유사도: {:.4}] {}",
            i + 1,
            hit.metadata.id(),
            hit.similarity,
            hit.metadata.title()
        );
        println!("   위치: {}", hit.metadata.breadcrumb());
        println!("   내용: {}", truncate_text(&hit.text, 200));
        println!();
    }

    Ok(())
}

/// 상태 명령어 (status)
fn cmd_status(config: &RagConfig) -> Result<()> {
    println!("manual-rag v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("[*] 데이터 디렉토리: {}", config.data_dir.display());

    // API 키 상태
    if has_api_key() {
        println!("[OK] API 키: 설정됨");
    } else {
        println!("[!] API 키: 미설정");
        println!("    설정: export GEMINI_API_KEY=your-key");
    }

    // 코퍼스
    if config.corpus_path.exists() {
        match read_corpus(&config.corpus_path) {
            Ok(chunks) => println!("[OK] 코퍼스: {} 청크", chunks.len()),
            Err(e) => println!("[!] 코퍼스 읽기 실패: {}", e),
        }
    } else {
        println!("[!] 코퍼스 없음: {}", config.corpus_path.display());
    }

    // 벡터 저장소
    if config.store_path.exists() {
        match VectorStore::open(&config.store_path) {
            Ok(store) => {
                let stats = store.stats();
                println!("[OK] 벡터 저장소: {} 항목", stats.item_count);
                if let Some(dimension) = stats.dimension {
                    println!("     차원: {}", dimension);
                }
                if stats.zero_vectors > 0 {
                    println!("     임베딩 실패 항목: {}", stats.zero_vectors);
                }
                if let Ok(meta) = std::fs::metadata(&config.store_path) {
                    println!("     파일 크기: {}", format_bytes(meta.len() as usize));
                }
            }
            Err(e) => println!("[!] 벡터 저장소 열기 실패: {}", e),
        }
    } else {
        println!("[!] 벡터 저장소 없음: {}", config.store_path.display());
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// API 키 확인
fn require_api_key() -> Result<()> {
    if !has_api_key() {
        bail!(
            "API 키가 설정되지 않았습니다.\n\n\
             설정 방법:\n  \
             export GEMINI_API_KEY=your-api-key\n  \
             또는\n  \
             export GOOGLE_AI_API_KEY=your-api-key\n\n\
             API 키 발급: https://aistudio.google.com/app/apikey"
        );
    }
    Ok(())
}

/// 기존 저장소 덮어쓰기 방지
fn refuse_overwrite(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "저장소가 이미 존재합니다: {}\n다시 생성하려면 --force를 지정하세요.",
            path.display()
        );
    }
    Ok(())
}

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

/// 바이트 크기 포맷팅
fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

// ============================================================================
// Tests
// ============================================================================
