use thiserror::Error;

use crate::models::Provider;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// HTTP 传输错误
    #[error("HTTP错误: {0}")]
    Http(#[from] HttpError),
    /// 供应商搜索错误
    #[error("供应商错误: {0}")]
    Provider(#[from] ProviderError),
    /// 批量任务错误
    #[error("批量任务错误: {0}")]
    Batch(#[from] BatchError),
    /// 编辑操作错误
    #[error("编辑错误: {0}")]
    Edit(#[from] EditError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
}

/// HTTP 传输错误
#[derive(Debug, Error)]
pub enum HttpError {
    /// 请求未能发出或连接失败
    #[error("请求失败 ({url}): {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// 非 2xx 状态码
    #[error("非成功状态码 ({url}): {status}")]
    Status { url: String, status: u16 },
    /// 响应体不是合法 JSON
    #[error("响应解析失败 ({url}): {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// URL 构造失败
    #[error("无效的URL: {0}")]
    InvalidUrl(String),
}

/// 供应商搜索错误
///
/// `NetworkFailure` 和 `MalformedPayload` 在客户端内部被吸收为空结果，
/// 只有 `Unexpected` 会向上传到编排层。
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} 网络失败: {source}")]
    NetworkFailure {
        provider: Provider,
        #[source]
        source: HttpError,
    },
    #[error("{provider} 返回数据格式异常: {reason}")]
    MalformedPayload { provider: Provider, reason: String },
    #[error("{provider} 意外错误: {message}")]
    Unexpected { provider: Provider, message: String },
}

/// 缓存错误（只在缓存内部使用，对外一律降级为未命中）
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("存储读写失败 ({key}): {source}")]
    Store {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("缓存条目损坏 ({key}): {source}")]
    Corrupted {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("缓存序列化失败 ({key}): {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 批量任务错误
#[derive(Debug, Error)]
pub enum BatchError {
    /// 已有批量任务在运行
    #[error("已有批量搜索正在进行，请等待完成")]
    AlreadyRunning,
    /// 没有可搜索的商品
    #[error("请至少输入一个商品")]
    EmptyQueries,
    /// 没有启用任何供应商
    #[error("请至少选择一个搜索来源")]
    NoProviders,
    /// 启用的供应商没有注册客户端
    #[error("供应商 {0} 未注册")]
    ProviderUnavailable(Provider),
    /// 批量任务中途失败（已写入的记录保留）
    #[error("搜索 \"{query}\" 时中断: {source}")]
    Aborted {
        query: String,
        #[source]
        source: Box<AppError>,
    },
}

/// 编辑操作错误
#[derive(Debug, Error)]
pub enum EditError {
    #[error("记录索引 {index} 超出范围 (共 {len} 条)")]
    RecordOutOfRange { index: usize, len: usize },
    #[error("结果索引 {index} 超出范围 (共 {len} 条)")]
    ResultOutOfRange { index: usize, len: usize },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    #[error("读取文件失败 ({path}): {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("写入文件失败 ({path}): {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建供应商意外错误
    pub fn provider_unexpected(provider: Provider, message: impl Into<String>) -> Self {
        AppError::Provider(ProviderError::Unexpected {
            provider,
            message: message.into(),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::Read {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::Write {
            path: path.into(),
            source,
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
