//! 搜索历史存储 - 基础设施层
//!
//! 外部历史库只需要 append / entries 两种能力。
//! 默认实现是一个 JSON Lines 文件，每行一条记录。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

use crate::error::{AppError, AppResult};

/// 本次搜索用到的来源
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSources {
    pub mercado_livre: bool,
    pub google_shopping: bool,
}

/// 一条搜索历史
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryEntry {
    pub search_term: String,
    pub timestamp: DateTime<Utc>,
    pub result_count: usize,
    pub sources: SearchSources,
}

pub trait HistoryStore: Send + Sync {
    fn append(&self, entry: &SearchHistoryEntry) -> AppResult<()>;
    /// 按时间倒序返回
    fn entries(&self) -> AppResult<Vec<SearchHistoryEntry>>;
}

/// JSON Lines 文件实现
pub struct JsonlHistoryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn path_display(&self) -> String {
        self.path.display().to_string()
    }
}

impl HistoryStore for JsonlHistoryStore {
    fn append(&self, entry: &SearchHistoryEntry) -> AppResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| AppError::file_write_failed(self.path_display(), e))?;
            }
        }

        let mut line = serde_json::to_string(entry).map_err(|e| {
            AppError::file_write_failed(self.path_display(), io::Error::new(io::ErrorKind::InvalidData, e))
        })?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AppError::file_write_failed(self.path_display(), e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| AppError::file_write_failed(self.path_display(), e))
    }

    fn entries(&self) -> AppResult<Vec<SearchHistoryEntry>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::file_read_failed(self.path_display(), e)),
        };

        let mut entries: Vec<SearchHistoryEntry> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("跳过无法解析的历史记录: {}", e);
                    None
                }
            })
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }
}

/// 内存实现
#[derive(Default)]
pub struct MemoryHistoryStore {
    entries: Mutex<Vec<SearchHistoryEntry>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn append(&self, entry: &SearchHistoryEntry) -> AppResult<()> {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(entry.clone());
        Ok(())
    }

    fn entries(&self) -> AppResult<Vec<SearchHistoryEntry>> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner()).clone();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }
}
