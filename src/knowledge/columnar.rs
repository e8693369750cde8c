//! Parquet 스냅샷 - 벡터 저장소 영속화
//!
//! 세 개의 병렬 컬럼을 하나의 Parquet 파일로 저장합니다.
//!
//! | 컬럼 | Arrow 타입 |
//! |------|-----------|
//! | `vectors` | `List<Float32>` |
//! | `texts` | `Utf8` |
//! | `metadata` | `Struct{chunk_id, title, level, content, parent_chain: List<Struct{chunk_id, title}>}` |
//!
//! ref: https://arrow.apache.org/rust/parquet/arrow/index.html

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow_array::builder::{Float32Builder, ListBuilder, StringBuilder, StructBuilder};
use arrow_array::{
    Array, ArrayRef, Float32Array, ListArray, RecordBatch, StringArray, StructArray,
};
use arrow_schema::{DataType, Field, FieldRef, Fields, Schema};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::error::{RagError, Result};

use super::chunker::{Chunk, ChunkLevel, ParentRef};

/// 파일에서 읽은 병렬 컬럼
#[derive(Debug, Default)]
pub(crate) struct Snapshot {
    pub vectors: Vec<Vec<f32>>,
    pub texts: Vec<String>,
    pub metadata: Vec<Chunk>,
}

// ============================================================================
// Schema
// ============================================================================

fn vector_item_field() -> FieldRef {
    Arc::new(Field::new("item", DataType::Float32, true))
}

fn parent_fields() -> Fields {
    Fields::from(vec![
        Field::new("chunk_id", DataType::Utf8, false),
        Field::new("title", DataType::Utf8, false),
    ])
}

fn parent_item_field() -> FieldRef {
    Arc::new(Field::new("item", DataType::Struct(parent_fields()), true))
}

fn metadata_fields() -> Fields {
    Fields::from(vec![
        Field::new("chunk_id", DataType::Utf8, false),
        Field::new("title", DataType::Utf8, false),
        Field::new("level", DataType::Utf8, false),
        Field::new("content", DataType::Utf8, false),
        Field::new("parent_chain", DataType::List(parent_item_field()), false),
    ])
}

/// 스냅샷 스키마
fn create_schema() -> Schema {
    Schema::new(vec![
        Field::new("vectors", DataType::List(vector_item_field()), false),
        Field::new("texts", DataType::Utf8, false),
        Field::new("metadata", DataType::Struct(metadata_fields()), false),
    ])
}

// ============================================================================
// Write
// ============================================================================

/// 병렬 컬럼을 Arrow RecordBatch로 변환
fn to_batch(vectors: &[Vec<f32>], texts: &[String], metadata: &[Chunk]) -> Result<RecordBatch> {
    if vectors.len() != texts.len() || texts.len() != metadata.len() {
        return Err(RagError::malformed_store(format!(
            "column length mismatch: vectors={}, texts={}, metadata={}",
            vectors.len(),
            texts.len(),
            metadata.len()
        )));
    }

    let value_count: usize = vectors.iter().map(Vec::len).sum();
    let mut vector_builder =
        ListBuilder::with_capacity(Float32Builder::with_capacity(value_count), vectors.len())
            .with_field(vector_item_field());
    for vector in vectors {
        vector_builder.values().append_slice(vector);
        vector_builder.append(true);
    }

    let texts_array = StringArray::from_iter_values(texts.iter());

    Ok(RecordBatch::try_new(
        Arc::new(create_schema()),
        vec![
            Arc::new(vector_builder.finish()),
            Arc::new(texts_array),
            Arc::new(metadata_to_struct(metadata)?),
        ],
    )?)
}

fn metadata_to_struct(metadata: &[Chunk]) -> Result<StructArray> {
    let ids = StringArray::from_iter_values(metadata.iter().map(|c| c.id()));
    let titles = StringArray::from_iter_values(metadata.iter().map(|c| c.title()));
    let levels = StringArray::from_iter_values(metadata.iter().map(|c| c.level().as_str()));
    let contents = StringArray::from_iter_values(metadata.iter().map(|c| c.content()));

    let mut chain_builder =
        ListBuilder::new(StructBuilder::from_fields(parent_fields(), 0)).with_field(parent_item_field());
    for chunk in metadata {
        let parents = chain_builder.values();
        for parent in chunk.parent_chain() {
            parent_builder(parents, 0)?.append_value(&parent.chunk_id);
            parent_builder(parents, 1)?.append_value(&parent.title);
            parents.append(true);
        }
        chain_builder.append(true);
    }

    let columns: Vec<ArrayRef> = vec![
        Arc::new(ids),
        Arc::new(titles),
        Arc::new(levels),
        Arc::new(contents),
        Arc::new(chain_builder.finish()),
    ];

    Ok(StructArray::try_new(metadata_fields(), columns, None)?)
}

fn parent_builder(builder: &mut StructBuilder, index: usize) -> Result<&mut StringBuilder> {
    builder
        .field_builder::<StringBuilder>(index)
        .ok_or_else(|| RagError::malformed_store("parent_chain builder has unexpected type"))
}

/// 스냅샷을 Parquet 파일로 기록 (임시 파일에 쓴 뒤 교체)
pub(crate) fn write_snapshot(
    path: &Path,
    vectors: &[Vec<f32>],
    texts: &[String],
    metadata: &[Chunk],
) -> Result<()> {
    let batch = to_batch(vectors, texts, metadata)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp = temp_path(path);
    if let Err(e) = write_batch(&tmp, &batch) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    std::fs::rename(&tmp, path)?;

    Ok(())
}

fn write_batch(path: &Path, batch: &RecordBatch) -> Result<()> {
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

// ============================================================================
// Read
// ============================================================================

/// Parquet 파일 전체를 읽어 스냅샷으로 변환
pub(crate) fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => RagError::StoreNotFound(path.to_path_buf()),
        _ => RagError::Io(e),
    })?;

    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut snapshot = Snapshot::default();
    for batch in reader {
        append_batch(&batch?, &mut snapshot)?;
    }

    Ok(snapshot)
}

fn append_batch(batch: &RecordBatch, snapshot: &mut Snapshot) -> Result<()> {
    let vectors = column::<ListArray>(batch.column_by_name("vectors"), "vectors")?;
    let texts = column::<StringArray>(batch.column_by_name("texts"), "texts")?;
    let metadata = column::<StructArray>(batch.column_by_name("metadata"), "metadata")?;

    let ids = column::<StringArray>(metadata.column_by_name("chunk_id"), "metadata.chunk_id")?;
    let titles = column::<StringArray>(metadata.column_by_name("title"), "metadata.title")?;
    let levels = column::<StringArray>(metadata.column_by_name("level"), "metadata.level")?;
    let contents = column::<StringArray>(metadata.column_by_name("content"), "metadata.content")?;
    let chains = column::<ListArray>(
        metadata.column_by_name("parent_chain"),
        "metadata.parent_chain",
    )?;

    for row in 0..batch.num_rows() {
        if vectors.is_null(row) {
            return Err(RagError::malformed_store(format!("null vector at row {}", row)));
        }
        let values = vectors.value(row);
        let floats = column::<Float32Array>(Some(&values), "vectors.item")?;
        if floats.null_count() > 0 {
            return Err(RagError::malformed_store(format!(
                "null vector component at row {}",
                row
            )));
        }
        snapshot.vectors.push(floats.values().to_vec());

        snapshot.texts.push(texts.value(row).to_string());

        let level = ChunkLevel::parse(levels.value(row)).ok_or_else(|| {
            RagError::malformed_store(format!(
                "unknown level '{}' at row {}",
                levels.value(row),
                row
            ))
        })?;
        let chunk = Chunk::checked(
            ids.value(row),
            titles.value(row),
            level,
            contents.value(row),
            read_parent_chain(&chains.value(row))?,
        )
        .map_err(|reason| {
            RagError::malformed_store(format!("invalid metadata at row {}: {}", row, reason))
        })?;
        snapshot.metadata.push(chunk);
    }

    Ok(())
}

fn read_parent_chain(values: &ArrayRef) -> Result<Vec<ParentRef>> {
    let parents = column::<StructArray>(Some(values), "parent_chain.item")?;
    let ids = column::<StringArray>(parents.column_by_name("chunk_id"), "parent_chain.chunk_id")?;
    let titles = column::<StringArray>(parents.column_by_name("title"), "parent_chain.title")?;

    Ok((0..parents.len())
        .map(|i| ParentRef {
            chunk_id: ids.value(i).to_string(),
            title: titles.value(i).to_string(),
        })
        .collect())
}

fn column<'a, T: 'static>(array: Option<&'a ArrayRef>, name: &str) -> Result<&'a T> {
    array
        .and_then(|a| a.as_any().downcast_ref::<T>())
        .ok_or_else(|| RagError::malformed_store(format!("missing or invalid column '{}'", name)))
}

// ============================================================================
// Tests
// ============================================================================
