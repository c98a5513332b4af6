pub mod ranges;
pub mod types;

pub use ranges::{Range, RangeTable};
pub use types::{
    columns, parse_float_prefix, parse_int_prefix, RatingCategory, TitleType, REQUIRED_COLUMNS,
};
