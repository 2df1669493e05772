//! Readers for the legacy page-list and article-list files.

pub mod dat;
pub mod page_code;
pub mod top;

pub use dat::DatFileParser;
pub use page_code::{
    separator_for_type_letter, split_classic_row, split_map_row, PageCode, Rejection,
    PAGE_CODE_LEN,
};
pub use top::{TopFileParser, TopGrammar, CLASSIC_SUFFIX, MAP_SUFFIX};
