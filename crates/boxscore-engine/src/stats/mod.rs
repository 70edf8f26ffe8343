// Stat lines: canonical schema and normalization from raw records.

pub mod line;
pub mod normalize;

pub use line::{PlayerStatLine, TimeWindow};
pub use normalize::{is_identity_field, normalize_records, RawStatRecord};
