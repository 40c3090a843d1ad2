//! 持久化键值存储 - 基础设施层
//!
//! 缓存的底层载体，只提供 get / set / delete / keys 四种能力，
//! 不关心值的格式，也不做大小限制。

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

/// 字符串键值存储
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> io::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> io::Result<()>;
    fn delete(&self, key: &str) -> io::Result<()>;
    fn keys(&self) -> io::Result<Vec<String>>;
}

/// 文件目录存储：每个键一个文件
///
/// 文件名是键的 SHA-256 十六进制摘要，长度固定，与键长无关；
/// 原始键和值一起以 JSON 写在文件里，`keys()` 从文件内容恢复键。
pub struct FileKvStore {
    dir: PathBuf,
}

const ENTRY_EXTENSION: &str = "entry";

#[derive(Serialize, Deserialize)]
struct StoredEntry {
    key: String,
    value: String,
}

impl FileKvStore {
    /// 打开（必要时创建）存储目录
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", digest_key(key), ENTRY_EXTENSION))
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        let path = self.entry_path(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let entry = read_stored(&content)?;
        if entry.key != key {
            warn!("⚠️ 缓存文件 {} 的键不匹配，按未命中处理", path.display());
            return Ok(None);
        }
        Ok(Some(entry.value))
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let content = serde_json::to_string(&StoredEntry {
            key: key.to_string(),
            value: value.to_string(),
        })
        .map_err(io::Error::from)?;

        // 先写临时文件再改名，避免读到写了一半的条目
        let path = self.entry_path(key);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &path)
    }

    fn delete(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn keys(&self) -> io::Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            match fs::read_to_string(&path).and_then(|content| read_stored(&content)) {
                Ok(stored) => keys.push(stored.key),
                Err(e) => warn!("⚠️ 跳过无法读取的缓存文件 {}: {}", path.display(), e),
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// 进程内存储，用于测试和不需要持久化的会话
#[derive(Default)]
pub struct MemoryKvStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> io::Result<()> {
        self.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> io::Result<Vec<String>> {
        Ok(self.lock().keys().cloned().collect())
    }
}

fn digest_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

fn read_stored(content: &str) -> io::Result<StoredEntry> {
    serde_json::from_str(content).map_err(io::Error::from)
}
