pub mod aggregate;
pub mod batch;
pub mod loaders;
pub mod offer;

pub use aggregate::AggregateRecord;
pub use batch::{BatchFile, SortOrder};
pub use loaders::load_batch_file;
pub use offer::{is_plausible_price, Offer, Provider};
