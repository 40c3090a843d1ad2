use crate::error::FileError;
use crate::models::BatchFile;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 加载批量搜索文件
///
/// `.toml` 文件按 [`BatchFile`] 解析；其他扩展名按纯文本处理，每行一个商品。
pub async fn load_batch_file(path: &Path) -> Result<BatchFile> {
    if !path.exists() {
        return Err(FileError::NotFound {
            path: path.display().to_string(),
        }
        .into());
    }

    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取批量文件: {}", path.display()))?;

    let mut batch = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
        toml::from_str::<BatchFile>(&content).map_err(|source| FileError::TomlParse {
            path: path.display().to_string(),
            source,
        })?
    } else {
        parse_plain_list(&content)
    };

    batch.file_path = Some(path.to_string_lossy().to_string());
    tracing::info!(
        "成功加载 {} 个商品: {}",
        batch.queries.len(),
        path.file_name().unwrap_or_default().to_string_lossy()
    );

    Ok(batch)
}

/// 每行一个商品，空行忽略
pub fn parse_plain_list(content: &str) -> BatchFile {
    BatchFile {
        queries: content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect(),
        ..Default::default()
    }
}
