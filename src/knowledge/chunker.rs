//! Heading Chunking Module
//!
//! 번호가 매겨진 제목(`10`, `10.2`, `10.2.1`)을 기준으로 매뉴얼 문서를
//! 계층형 청크로 분할합니다. 각 청크는 상위 제목 체인을 메타데이터로 가집니다.
//!
//! 출력은 한 줄에 하나의 JSON 레코드(JSONL)입니다.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

// ============================================================================
// Chunk Types
// ============================================================================

/// 청크 레벨 (id의 점 개수에서 유도)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkLevel {
    /// `10`
    Main,
    /// `10.2`
    Sub,
    /// `10.2.1`
    SubSub,
    /// `10.2.1.4` 이상
    Deep,
}

impl ChunkLevel {
    /// 청크 id로부터 레벨 계산
    pub fn from_id(chunk_id: &str) -> Self {
        match chunk_id.matches('.').count() {
            0 => Self::Main,
            1 => Self::Sub,
            2 => Self::SubSub,
            _ => Self::Deep,
        }
    }

    /// 직렬화된 이름에서 파싱
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "main" => Some(Self::Main),
            "sub" => Some(Self::Sub),
            "subsub" => Some(Self::SubSub),
            "deep" => Some(Self::Deep),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Sub => "sub",
            Self::SubSub => "subsub",
            Self::Deep => "deep",
        }
    }
}

/// 상위 청크 참조
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    pub chunk_id: String,
    pub title: String,
}

/// 계층형 청크
///
/// 생성 후 변경되지 않습니다. `level`은 저장하지 않고 id에서 계산합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ChunkRecord", into = "ChunkRecord")]
pub struct Chunk {
    id: String,
    title: String,
    content: String,
    parent_chain: Vec<ParentRef>,
}

impl Chunk {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        parent_chain: Vec<ParentRef>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            parent_chain,
        }
    }

    /// 저장된 레코드에서 복원 (id 형식과 레벨 일치 검증)
    pub(crate) fn checked(
        id: &str,
        title: &str,
        level: ChunkLevel,
        content: &str,
        parent_chain: Vec<ParentRef>,
    ) -> std::result::Result<Self, String> {
        Self::try_from(ChunkRecord {
            chunk_id: id.to_string(),
            title: title.to_string(),
            level,
            content: content.to_string(),
            parent_chain,
        })
    }

    /// 점으로 구분된 청크 id (예: `10.2.1`)
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// 루트부터 자기 자신 직전까지의 상위 체인
    pub fn parent_chain(&self) -> &[ParentRef] {
        &self.parent_chain
    }

    pub fn level(&self) -> ChunkLevel {
        ChunkLevel::from_id(&self.id)
    }

    /// 상위 제목 경로 (`Overview > Editing`)
    pub fn breadcrumb(&self) -> String {
        self.parent_chain
            .iter()
            .map(|p| p.title.as_str())
            .chain(std::iter::once(self.title.as_str()))
            .collect::<Vec<_>>()
            .join(" > ")
    }
}

/// JSONL 직렬화 형식
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChunkRecord {
    chunk_id: String,
    title: String,
    level: ChunkLevel,
    content: String,
    #[serde(default)]
    parent_chain: Vec<ParentRef>,
}

impl From<Chunk> for ChunkRecord {
    fn from(chunk: Chunk) -> Self {
        let level = chunk.level();
        Self {
            chunk_id: chunk.id,
            title: chunk.title,
            level,
            content: chunk.content,
            parent_chain: chunk.parent_chain,
        }
    }
}

impl TryFrom<ChunkRecord> for Chunk {
    type Error = String;

    fn try_from(record: ChunkRecord) -> std::result::Result<Self, Self::Error> {
        if !is_dotted_id(&record.chunk_id) {
            return Err(format!("invalid chunk_id '{}'", record.chunk_id));
        }
        let expected = ChunkLevel::from_id(&record.chunk_id);
        if record.level != expected {
            return Err(format!(
                "level '{}' does not match chunk_id '{}' (expected '{}')",
                record.level.as_str(),
                record.chunk_id,
                expected.as_str()
            ));
        }
        Ok(Chunk {
            id: record.chunk_id,
            title: record.title,
            content: record.content,
            parent_chain: record.parent_chain,
        })
    }
}

fn is_dotted_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .split('.')
            .all(|seg| !seg.is_empty() && seg.bytes().all(|b| b.is_ascii_digit()))
}

// ============================================================================
// Chunk Configuration
// ============================================================================

/// 청킹 설정
#[derive(Debug, Clone, Default)]
pub struct ChunkerConfig {
    /// PDF 추출 잔여물 정리 (끝 페이지 번호, 단독 숫자 줄, `10.2. 1` 제목 복구)
    pub clean_lines: bool,
}

/// 청킹 결과
#[derive(Debug, Clone, Default)]
pub struct ChunkReport {
    /// 문서 순서의 청크 목록
    pub chunks: Vec<Chunk>,
    /// 첫 제목 이전이라 버려진 본문 줄 수
    pub dropped_lines: usize,
    /// 제목 형태지만 본문으로 처리된 줄 수 (중복 id)
    pub malformed_lines: usize,
}

// ============================================================================
// Chunker Trait
// ============================================================================

/// 문서 청킹 전략 트레이트
pub trait Chunker: Send + Sync {
    /// 줄 단위 입력을 청크로 분할
    fn chunk_lines(&self, lines: &[&str]) -> ChunkReport;

    /// 텍스트 전체를 청크로 분할
    fn chunk(&self, text: &str) -> ChunkReport {
        let lines: Vec<&str> = text.lines().collect();
        self.chunk_lines(&lines)
    }

    /// 청커 이름
    fn name(&self) -> &'static str;
}

// ============================================================================
// HeadingChunker
// ============================================================================

/// 번호 제목 인식 청커
///
/// - 하위 제목: `10.2.1 Editing Notes` (세그먼트당 1~2자리, 공백 후 제목 필수)
/// - 메인 제목: `10. Overview`, `10.` (제목 없으면 `Chapter 10`), `10 Overview`
/// - 그 외 비어있지 않은 줄은 현재 청크의 본문
///
/// 첫 제목 이전의 본문은 버립니다. 이미 나온 id의 제목 줄은 본문으로 처리합니다.
pub struct HeadingChunker {
    config: ChunkerConfig,
}

struct OpenChunk {
    id: String,
    title: String,
    parent_chain: Vec<ParentRef>,
    lines: Vec<String>,
}

impl HeadingChunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(ChunkerConfig::default())
    }

    /// 제목 줄이면 (id, 제목) 반환
    fn parse_heading(line: &str) -> Option<(String, String)> {
        let patterns = heading_patterns();

        // 하위 제목을 먼저 확인: `10.2.1 X`가 메인 `10`으로 잡히지 않도록
        if let Some(caps) = patterns.sub.captures(line) {
            return Some((caps[1].to_string(), caps[2].trim().to_string()));
        }

        if let Some(caps) = patterns.main_dot.captures(line) {
            let id = caps[1].to_string();
            let title = caps
                .get(2)
                .map(|m| m.as_str().trim())
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| placeholder_title(&id));
            return Some((id, title));
        }

        patterns
            .main_space
            .captures(line)
            .map(|caps| (caps[1].to_string(), caps[2].trim().to_string()))
    }

    fn clean<'a>(&self, raw: &'a str) -> Cow<'a, str> {
        if self.config.clean_lines {
            Cow::Owned(clean_line(raw))
        } else {
            Cow::Borrowed(raw.trim())
        }
    }

    /// 파일을 읽어 청킹 후 JSONL로 저장
    pub fn chunk_file(&self, input: &Path, output: &Path) -> Result<ChunkReport> {
        let text = std::fs::read_to_string(input)?;
        let report = self.chunk(&text);
        write_corpus(output, &report.chunks)?;

        tracing::info!(
            "Chunked {:?}: {} chunks (dropped={}, malformed={}) -> {:?}",
            input,
            report.chunks.len(),
            report.dropped_lines,
            report.malformed_lines,
            output
        );
        Ok(report)
    }
}

impl Chunker for HeadingChunker {
    fn chunk_lines(&self, lines: &[&str]) -> ChunkReport {
        let mut report = ChunkReport::default();
        // 지금까지 청크로 생성된 id -> 제목
        let mut titles: HashMap<String, String> = HashMap::new();
        let mut current: Option<OpenChunk> = None;

        for (line_no, raw) in lines.iter().enumerate() {
            let line = self.clean(raw);
            if line.is_empty() {
                continue;
            }

            if let Some((id, title)) = Self::parse_heading(&line) {
                if !titles.contains_key(&id) {
                    if let Some(open) = current.take() {
                        report.chunks.push(finish_chunk(open));
                    }
                    let parent_chain = build_parent_chain(&id, &titles);
                    titles.insert(id.clone(), title.clone());
                    current = Some(OpenChunk {
                        id,
                        title,
                        parent_chain,
                        lines: Vec::new(),
                    });
                    continue;
                }

                tracing::debug!(
                    "Line {}: duplicate heading id '{}', treating as content",
                    line_no + 1,
                    id
                );
                report.malformed_lines += 1;
            }

            match current.as_mut() {
                Some(open) => open.lines.push(line.into_owned()),
                None => report.dropped_lines += 1,
            }
        }

        if let Some(open) = current.take() {
            report.chunks.push(finish_chunk(open));
        }

        if report.dropped_lines > 0 {
            tracing::debug!(
                "Dropped {} content lines before the first heading",
                report.dropped_lines
            );
        }

        report
    }

    fn name(&self) -> &'static str {
        "HeadingChunker"
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

struct HeadingPatterns {
    sub: Regex,
    main_dot: Regex,
    main_space: Regex,
}

fn heading_patterns() -> &'static HeadingPatterns {
    static PATTERNS: OnceLock<HeadingPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| HeadingPatterns {
        sub: Regex::new(r"^(\d{1,2}(?:\.\d{1,2})+)\s+(\S.*)$").expect("valid sub heading regex"),
        main_dot: Regex::new(r"^(\d{1,2})\.(?:\s+(.*))?$").expect("valid main heading regex"),
        main_space: Regex::new(r"^(\d{1,2})\s+(\S.*)$").expect("valid main heading regex"),
    })
}

fn placeholder_title(id: &str) -> String {
    format!("Chapter {}", id)
}

/// id의 모든 엄격한 접두사에 대해 (id, 제목) 체인 생성
fn build_parent_chain(id: &str, titles: &HashMap<String, String>) -> Vec<ParentRef> {
    let parts: Vec<&str> = id.split('.').collect();

    (1..parts.len())
        .map(|depth| {
            let prefix = parts[..depth].join(".");
            let title = titles
                .get(&prefix)
                .cloned()
                .unwrap_or_else(|| placeholder_title(&prefix));
            ParentRef {
                chunk_id: prefix,
                title,
            }
        })
        .collect()
}

fn finish_chunk(open: OpenChunk) -> Chunk {
    Chunk {
        id: open.id,
        title: open.title,
        content: join_content(&open.lines),
        parent_chain: open.parent_chain,
    }
}

/// 본문 줄을 한 줄 문장으로 합침
///
/// 공백은 하나로 합치고, 하이픈으로 끝난 줄은 공백 없이 이어 붙입니다.
fn join_content(lines: &[String]) -> String {
    let mut content = String::new();

    for line in lines {
        let normalized = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.is_empty() {
            continue;
        }
        if !content.is_empty() && !content.ends_with(|c: char| c == '-' || c == '—') {
            content.push(' ');
        }
        content.push_str(&normalized);
    }

    content
}

struct CleanPatterns {
    trailing_numbers: Regex,
    lone_number: Regex,
    split_heading: Regex,
}

fn clean_patterns() -> &'static CleanPatterns {
    static PATTERNS: OnceLock<CleanPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| CleanPatterns {
        trailing_numbers: Regex::new(r"\s(?:\d+\s?){2,}$").expect("valid regex"),
        lone_number: Regex::new(r"^\d{1,3}\.?$").expect("valid regex"),
        split_heading: Regex::new(r"(\d+\.\d+)\.\s+(\d+)").expect("valid regex"),
    })
}

/// PDF 추출 잔여물 정리
fn clean_line(raw: &str) -> String {
    let patterns = clean_patterns();

    let line = patterns.trailing_numbers.replace(raw.trim(), "");
    if patterns.lone_number.is_match(line.trim()) {
        return String::new();
    }
    let line = patterns.split_heading.replace(&line, "${1}.${2}");
    line.trim().to_string()
}

// ============================================================================
// Corpus I/O
// ============================================================================

/// 청크를 JSONL로 기록 (한 줄에 한 레코드)
pub fn write_corpus_to<W: Write>(mut writer: W, chunks: &[Chunk]) -> Result<()> {
    for chunk in chunks {
        serde_json::to_writer(&mut writer, chunk)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// 청크를 JSONL 파일로 저장 (덮어쓰기)
pub fn write_corpus(path: &Path, chunks: &[Chunk]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    write_corpus_to(BufWriter::new(file), chunks)
}

/// JSONL 코퍼스 읽기
pub fn read_corpus(path: &Path) -> Result<Vec<Chunk>> {
    let file = File::open(path)?;
    let mut chunks = Vec::new();

    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let chunk = serde_json::from_str(&line).map_err(|e| RagError::MalformedInput {
            line: index + 1,
            reason: e.to_string(),
        })?;
        chunks.push(chunk);
    }

    Ok(chunks)
}

// ============================================================================
// Factory Functions
// ============================================================================

/// 기본 청커 생성
pub fn default_chunker() -> Box<dyn Chunker> {
    Box::new(HeadingChunker::with_defaults())
}

/// 설정을 지정한 제목 청커 생성
pub fn heading_chunker(config: ChunkerConfig) -> Box<dyn Chunker> {
    Box::new(HeadingChunker::new(config))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MANUAL: &str = "\
Live 12 Reference Manual

10 Overview
Clips hold musical ideas.

10.1 Editing
Editing is done in the
clip view.
10.2 Notes
10.2.1 Editing Notes
Editing notes are useful.
12.3.1 Orphan Section
Deep text.
13. Mixing
Mix it.
13.1 Sends
";

    fn chunk(text: &str) -> ChunkReport {
        HeadingChunker::with_defaults().chunk(text)
    }

    fn ids(report: &ChunkReport) -> Vec<&str> {
        report.chunks.iter().map(|c| c.id()).collect()
    }

    #[test]
    fn test_chunker_empty() {
        let report = chunk("");
        assert!(report.chunks.is_empty());
        assert_eq!(report.dropped_lines, 0);
    }

    #[test]
    fn test_heading_example() {
        let report = chunk("10 Overview\n10.2 Notes\n10.2.1 Editing Notes\nEditing notes are useful.");
        let chunk = &report.chunks[2];

        assert_eq!(chunk.id(), "10.2.1");
        assert_eq!(chunk.title(), "Editing Notes");
        assert_eq!(chunk.level(), ChunkLevel::SubSub);
        assert_eq!(chunk.content(), "Editing notes are useful.");
    }

    #[test]
    fn test_sub_heading_is_not_main_heading() {
        assert_eq!(
            HeadingChunker::parse_heading("10.2.1 Editing Notes"),
            Some(("10.2.1".to_string(), "Editing Notes".to_string()))
        );
        assert_eq!(
            HeadingChunker::parse_heading("10. Overview"),
            Some(("10".to_string(), "Overview".to_string()))
        );
        assert_eq!(
            HeadingChunker::parse_heading("10 Overview"),
            Some(("10".to_string(), "Overview".to_string()))
        );
        assert_eq!(
            HeadingChunker::parse_heading("10."),
            Some(("10".to_string(), "Chapter 10".to_string()))
        );
    }

    #[test]
    fn test_non_headings() {
        for line in [
            "Editing notes are useful.",
            "120 BPM is the default tempo.",
            "10.2",
            "10.2.1",
            "10.2.100 Too many digits",
            "2024. A year",
        ] {
            assert_eq!(HeadingChunker::parse_heading(line), None, "line: {line}");
        }
    }

    #[test]
    fn test_manual_structure() {
        let report = chunk(MANUAL);

        assert_eq!(
            ids(&report),
            vec!["10", "10.1", "10.2", "10.2.1", "12.3.1", "13", "13.1"]
        );
        // 첫 제목 이전 줄은 버림
        assert_eq!(report.dropped_lines, 1);
        assert_eq!(report.malformed_lines, 0);

        let editing = &report.chunks[1];
        assert_eq!(editing.content(), "Editing is done in the clip view.");

        // 본문 없는 청크도 유지
        assert_eq!(report.chunks[2].content(), "");
        assert_eq!(report.chunks[6].content(), "");
    }

    #[test]
    fn test_parent_chain_excludes_self() {
        let report = chunk(MANUAL);
        let notes = &report.chunks[3];

        assert_eq!(
            notes.parent_chain(),
            &[
                ParentRef {
                    chunk_id: "10".to_string(),
                    title: "Overview".to_string()
                },
                ParentRef {
                    chunk_id: "10.2".to_string(),
                    title: "Notes".to_string()
                },
            ]
        );
        assert_eq!(notes.breadcrumb(), "Overview > Notes > Editing Notes");
        assert!(report.chunks[0].parent_chain().is_empty());
    }

    #[test]
    fn test_parent_chain_fallback_and_reset() {
        let report = chunk(MANUAL);

        // 12, 12.3은 본 적 없음 -> 대체 제목
        let orphan = &report.chunks[4];
        let chain: Vec<(&str, &str)> = orphan
            .parent_chain()
            .iter()
            .map(|p| (p.chunk_id.as_str(), p.title.as_str()))
            .collect();
        assert_eq!(chain, vec![("12", "Chapter 12"), ("12.3", "Chapter 12.3")]);

        // 13으로 리셋하면 새 체인
        assert!(report.chunks[5].parent_chain().is_empty());
        assert_eq!(report.chunks[6].parent_chain()[0].title, "Mixing");
    }

    #[test]
    fn test_chain_and_level_invariants() {
        let report = chunk(MANUAL);

        for chunk in &report.chunks {
            let depth = chunk.id().matches('.').count();
            assert_eq!(chunk.level(), ChunkLevel::from_id(chunk.id()));
            assert_eq!(chunk.parent_chain().len(), depth);

            for (i, parent) in chunk.parent_chain().iter().enumerate() {
                assert_eq!(parent.chunk_id.matches('.').count(), i);
                assert!(chunk.id().starts_with(&format!("{}.", parent.chunk_id)));
                assert_ne!(parent.chunk_id, chunk.id());
            }
        }
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(ChunkLevel::from_id("10"), ChunkLevel::Main);
        assert_eq!(ChunkLevel::from_id("10.2"), ChunkLevel::Sub);
        assert_eq!(ChunkLevel::from_id("10.2.1"), ChunkLevel::SubSub);
        assert_eq!(ChunkLevel::from_id("10.2.1.4"), ChunkLevel::Deep);
        assert_eq!(ChunkLevel::from_id("1.2.3.4.5"), ChunkLevel::Deep);

        for level in [ChunkLevel::Main, ChunkLevel::Sub, ChunkLevel::SubSub, ChunkLevel::Deep] {
            assert_eq!(ChunkLevel::parse(level.as_str()), Some(level));
        }
        assert_eq!(ChunkLevel::parse("top"), None);
    }

    #[test]
    fn test_duplicate_heading_is_content() {
        let report = chunk("10 Overview\nIntro.\n10.1 Editing\nSee\n10 Overview\nfor more.");

        assert_eq!(ids(&report), vec!["10", "10.1"]);
        assert_eq!(report.malformed_lines, 1);
        assert_eq!(report.chunks[1].content(), "See 10 Overview for more.");
    }

    #[test]
    fn test_content_normalization() {
        let report = chunk("1 Intro\n  Spaced    out   text  \n\nwell-\nknown fact\nlast line");
        assert_eq!(
            report.chunks[0].content(),
            "Spaced out text well-known fact last line"
        );
        assert!(!report.chunks[0].content().contains('\n'));
    }

    #[test]
    fn test_clean_lines() {
        assert_eq!(clean_line("Browser basics 12 13"), "Browser basics");
        assert_eq!(clean_line("  154 "), "");
        assert_eq!(clean_line("12."), "");
        assert_eq!(clean_line("10.2. 1 Editing Notes"), "10.2.1 Editing Notes");
        assert_eq!(clean_line("Plain text"), "Plain text");

        let chunker = HeadingChunker::new(ChunkerConfig { clean_lines: true });
        let report = chunker.chunk("10 Overview\n154\n10.2. 1 Editing Notes\nBody 1 2");
        assert_eq!(ids(&report), vec!["10", "10.2.1"]);
        assert_eq!(report.chunks[1].content(), "Body");
    }

    #[test]
    fn test_idempotent_output() {
        let chunker = HeadingChunker::with_defaults();

        let mut first = Vec::new();
        write_corpus_to(&mut first, &chunker.chunk(MANUAL).chunks).unwrap();
        let mut second = Vec::new();
        write_corpus_to(&mut second, &chunker.chunk(MANUAL).chunks).unwrap();

        assert_eq!(first, second);
        let text = String::from_utf8(first).unwrap();
        assert_eq!(text.lines().count(), 7);
    }

    #[test]
    fn test_record_format() {
        let report = chunk("10 Överblick\n10.1 Redigering\nText.");
        let line = serde_json::to_string(&report.chunks[1]).unwrap();

        assert_eq!(
            line,
            r#"{"chunk_id":"10.1","title":"Redigering","level":"sub","content":"Text.","parent_chain":[{"chunk_id":"10","title":"Överblick"}]}"#
        );
    }

    #[test]
    fn test_record_rejects_wrong_level() {
        let line = r#"{"chunk_id":"10.1","title":"X","level":"main","content":"","parent_chain":[]}"#;
        assert!(serde_json::from_str::<Chunk>(line).is_err());

        let line = r#"{"chunk_id":"10.x","title":"X","level":"sub","content":"","parent_chain":[]}"#;
        assert!(serde_json::from_str::<Chunk>(line).is_err());
    }

    #[test]
    fn test_corpus_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("manual.txt");
        let output = temp_dir.path().join("out").join("chunks.jsonl");
        std::fs::write(&input, MANUAL).unwrap();

        let report = HeadingChunker::with_defaults()
            .chunk_file(&input, &output)
            .unwrap();
        let loaded = read_corpus(&output).unwrap();

        assert_eq!(loaded, report.chunks);
    }

    #[test]
    fn test_read_corpus_reports_line() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.jsonl");
        std::fs::write(
            &path,
            "{\"chunk_id\":\"1\",\"title\":\"A\",\"level\":\"main\",\"content\":\"\",\"parent_chain\":[]}\nnot json\n",
        )
        .unwrap();

        match read_corpus(&path) {
            Err(RagError::MalformedInput { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_factory() {
        assert_eq!(default_chunker().name(), "HeadingChunker");
        let report = heading_chunker(ChunkerConfig::default()).chunk("1 A\nB");
        assert_eq!(report.chunks.len(), 1);
    }
}
