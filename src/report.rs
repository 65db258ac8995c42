use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::ops::RangeInclusive;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::date::format_date;
use crate::document::InfoDocument;
use crate::encoding::TextEncoding;
use crate::error::InfoError;
use crate::format::{format_g, label, write_box, write_info_date, write_info_string};
use crate::types::{BoxKind, PaperSize};

/// Version reported in usage messages and extractbb output.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const INFO_KEYS: [&str; 6] = ["Title", "Subject", "Keywords", "Author", "Creator", "Producer"];
const DATE_KEYS: [&str; 2] = ["CreationDate", "ModDate"];
const RULE: &str = "------------------------------------------------------------------------";

/// What to report on. Page numbers are 1-based; a `last_page` of 0 means
/// "no last page given".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    pub first_page: i32,
    pub last_page: i32,
    pub print_boxes: bool,
    pub print_metadata: bool,
    pub raw_dates: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            first_page: 1,
            last_page: 0,
            print_boxes: false,
            print_metadata: false,
            raw_dates: false,
        }
    }
}

/// The pages a report covers, after clamping to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub first: i32,
    pub last: i32,
    /// Whether a last page was requested, which switches page lines to the
    /// per-page layout.
    pub multi_page: bool,
}

impl PageRange {
    pub fn normalize(first: i32, last: i32, num_pages: u32) -> PageRange {
        let num_pages = i32::try_from(num_pages).unwrap_or(i32::MAX);
        let first = first.max(1);
        let (mut last, multi_page) = if last == 0 { (1, false) } else { (last, true) };
        if last < 1 || last > num_pages {
            last = num_pages;
        }
        PageRange {
            first,
            last,
            multi_page,
        }
    }

    pub fn whole_document(num_pages: u32) -> PageRange {
        PageRange {
            first: 1,
            last: i32::try_from(num_pages).unwrap_or(i32::MAX),
            multi_page: true,
        }
    }

    pub fn pages(&self) -> RangeInclusive<i32> {
        self.first..=self.last
    }
}

/// How the box report lays out its lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxLayout {
    /// Lines prefixed with the page number, each page between rules.
    Ruled,
    /// Five lines for the first page of the range, no rules.
    Plain,
}

/// Write PostScript bounding box comments for `opts.first_page`, the way
/// `extractbb` does for dvipdfmx.
///
/// Nothing is written if the page is beyond the end of the document.
pub fn write_extractbb<W: Write>(
    out: &mut W,
    doc: &InfoDocument,
    opts: &ReportOptions,
    creation_date: &NaiveDateTime,
) -> Result<(), InfoError> {
    let num_pages = doc.num_pages();
    let range = PageRange::normalize(opts.first_page, opts.last_page, num_pages);
    if i64::from(range.first) > i64::from(num_pages) {
        return Err(InfoError::PageOutOfRange {
            page: range.first,
            num_pages,
        });
    }

    out.write_all(b"%%Title: ")?;
    out.write_all(doc.file_name().as_os_str().as_encoded_bytes())?;
    out.write_all(b"\n")?;
    writeln!(out, "%%Creator: pdfinfo version {}", VERSION)?;

    let page = doc.page(range.first);
    match page.dvipdfmx_rect() {
        Some(bb) => {
            writeln!(
                out,
                "%%BoundingBox: {} {} {} {}",
                bb.x1.round() as i64,
                bb.y1.round() as i64,
                bb.x2.round() as i64,
                bb.y2.round() as i64
            )?;
            writeln!(
                out,
                "%%HiResBoundingBox: {:8.6} {:8.6} {:8.6} {:8.6}",
                bb.x1, bb.y1, bb.x2, bb.y2
            )?;
        }
        None => debug!("page {} has no bounding box hint", range.first),
    }

    writeln!(out, "%%PDFVersion: {:.1}", doc.pdf_version())?;
    writeln!(out, "%%Pages: {}", num_pages)?;
    // asctime() output ends in a newline of its own
    writeln!(out, "%%CreationDate: {}\n", format_date(creation_date))?;
    Ok(())
}

/// Write the metadata and geometry report.
pub fn write_report<W: Write>(
    out: &mut W,
    doc: &InfoDocument,
    encoding: &TextEncoding,
    opts: &ReportOptions,
) -> Result<(), InfoError> {
    for key in INFO_KEYS {
        write_info_string(out, doc, key, encoding)?;
    }
    for key in DATE_KEYS {
        if opts.raw_dates {
            write_info_string(out, doc, key, encoding)?;
        } else {
            write_info_date(out, doc, key, encoding)?;
        }
    }

    writeln!(out, "{}{}", label("Tagged"), yes_no(doc.is_tagged()))?;
    writeln!(out, "{}{}", label("Form"), doc.form_kind())?;
    writeln!(out, "{}{}", label("Pages"), doc.num_pages())?;

    if doc.is_encrypted() {
        writeln!(out, "{}yes ({})", label("Encrypted"), doc.permissions())?;
    } else {
        writeln!(out, "{}no", label("Encrypted"))?;
    }

    let range = PageRange::normalize(opts.first_page, opts.last_page, doc.num_pages());
    write_page_sizes(out, doc, &range)?;

    // -box does not gate the box report; it is always printed, and an
    // implicit single-page range is widened to the whole document.
    if !opts.print_boxes {
        debug!("printing page boxes without -box");
    }
    let box_range = if range.multi_page {
        range
    } else {
        PageRange::whole_document(doc.num_pages())
    };
    write_boxes(out, doc, &box_range, BoxLayout::Ruled)?;

    match File::open(doc.file_name()).and_then(|mut f| f.seek(SeekFrom::End(0))) {
        Ok(size) => writeln!(out, "{}{} bytes", label("File size"), size)?,
        Err(e) => debug!("can't measure {}: {}", doc.file_name().display(), e),
    }

    writeln!(out, "{}{}", label("Optimized"), yes_no(doc.is_linearized()))?;
    writeln!(out, "{}{:.1}", label("PDF version"), doc.pdf_version())?;

    if opts.print_metadata {
        if let Some(metadata) = doc.read_metadata() {
            out.write_all(b"Metadata:\n")?;
            out.write_all(&metadata)?;
            out.write_all(b"\n")?;
        }
    }
    Ok(())
}

/// One line per page: crop box size, matching paper size and rotation.
pub fn write_page_sizes<W: Write>(
    out: &mut W,
    doc: &InfoDocument,
    range: &PageRange,
) -> Result<(), InfoError> {
    for pg in range.pages() {
        let page = doc.page(pg);
        let (w, h) = (page.crop_width(), page.crop_height());
        if range.multi_page {
            write!(out, "Page {:4} size: ", pg)?;
        } else {
            write!(out, "{}", label("Page size"))?;
        }
        write!(out, "{} x {} pts", format_g(w), format_g(h))?;
        if let Some(paper) = PaperSize::classify(w, h) {
            write!(out, " ({})", paper)?;
        }
        writeln!(out, " (rotated {} degrees)", page.rotate)?;
    }
    Ok(())
}

/// The five boundary boxes of each page in `range`.
pub fn write_boxes<W: Write>(
    out: &mut W,
    doc: &InfoDocument,
    range: &PageRange,
    layout: BoxLayout,
) -> Result<(), InfoError> {
    match layout {
        BoxLayout::Ruled => {
            writeln!(out, "{}", RULE)?;
            for pg in range.pages() {
                let page = doc.page(pg);
                for kind in BoxKind::ALL {
                    let text = format!("Page {:4} {:<10}", pg, format!("{}:", kind.name()));
                    write_box(
                        out,
                        &text,
                        page.rect(kind),
                        page.is_explicit(kind),
                        page.dvipdfmx_bb == Some(kind),
                    )?;
                }
                writeln!(out, "{}", RULE)?;
            }
        }
        BoxLayout::Plain => {
            let page = doc.page(range.first);
            for kind in BoxKind::ALL {
                write_box(
                    out,
                    &label(kind.name()),
                    page.rect(kind),
                    page.is_explicit(kind),
                    page.dvipdfmx_bb == Some(kind),
                )?;
            }
        }
    }
    Ok(())
}

fn yes_no(b: bool) -> &'static str {
    if b { "yes" } else { "no" }
}
