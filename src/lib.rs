//! PDF document information
//!
//! This library reports metadata, page sizes and page boundary boxes of PDF
//! files, and writes the bounding box comments `extractbb` produces for
//! dvipdfmx.

mod config;
mod date;
mod document;
mod encoding;
mod error;
mod format;
mod report;
mod types;
mod utils;

pub use config::Config;
pub use date::{format_date, parse_pdf_date};
pub use document::{InfoDocument, OpenOptions};
pub use encoding::TextEncoding;
pub use error::InfoError;
pub use format::{format_g, write_box, write_info_date, write_info_string};
pub use report::{
    BoxLayout, PageRange, ReportOptions, VERSION, write_boxes, write_extractbb, write_page_sizes,
    write_report,
};
pub use types::{BoxKind, FormKind, PageGeometry, PaperSize, Permissions, Rect};
