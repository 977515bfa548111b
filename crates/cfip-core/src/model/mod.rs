//! Data model shared by every stage of the pipeline
//!
//! - [`LineType`]: closed set of carrier lines plus a pass-through variant
//! - [`IpRecord`]: one `address#line_type` pair
//! - [`LineTypeFilter`]: which lines the extractor keeps

pub mod filter;
pub mod line_type;
pub mod record;

pub use filter::LineTypeFilter;
pub use line_type::LineType;
pub use record::IpRecord;
