//! 基础设施层（Infrastructure）
//!
//! 持有外部资源（磁盘、网络、时钟），只暴露能力，不包含业务逻辑。

pub mod clock;
pub mod history_store;
pub mod http;
pub mod image_proxy;
pub mod kv_store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use history_store::{
    HistoryStore, JsonlHistoryStore, MemoryHistoryStore, SearchHistoryEntry, SearchSources,
};
pub use http::{search_url, HttpTransport, ReqwestTransport};
pub use image_proxy::ImageProxy;
pub use kv_store::{FileKvStore, KvStore, MemoryKvStore};
