use std::io::{self, Write};

use crate::date::{format_date, parse_pdf_date};
use crate::document::InfoDocument;
use crate::encoding::TextEncoding;
use crate::types::Rect;

/// Width of the label column of the report.
pub const LABEL_WIDTH: usize = 16;

/// `"Title:"` padded to the label column.
pub fn label(name: &str) -> String {
    format!("{:<width$}", format!("{}:", name), width = LABEL_WIDTH)
}

/// Format a number like C's `%g`: six significant digits, trailing zeros
/// removed, exponent notation for very large or very small magnitudes.
pub fn format_g(v: f64) -> String {
    const PRECISION: i32 = 6;

    if v == 0. || !v.is_finite() {
        return v.to_string();
    }

    let sci = format!("{:.*e}", (PRECISION - 1) as usize, v);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((mantissa, exp)) => (mantissa, exp.parse::<i32>().unwrap_or(0)),
        None => return sci,
    };

    if exp < -4 || exp >= PRECISION {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exp.abs())
    } else {
        let decimals = (PRECISION - 1 - exp) as usize;
        trim_fraction(&format!("{:.*}", decimals, v)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Print a text entry of the document information dictionary.
/// Prints nothing if the entry is missing or not a string.
pub fn write_info_string<W: Write>(
    out: &mut W,
    doc: &InfoDocument,
    key: &str,
    encoding: &TextEncoding,
) -> io::Result<()> {
    let Some(text) = doc.info_text(key) else {
        return Ok(());
    };
    out.write_all(label(key).as_bytes())?;
    out.write_all(&encoding.encode(&text))?;
    out.write_all(b"\n")
}

/// Print a date entry of the document information dictionary in calendar
/// form, or as it is stored when it does not parse as a date.
pub fn write_info_date<W: Write>(
    out: &mut W,
    doc: &InfoDocument,
    key: &str,
    encoding: &TextEncoding,
) -> io::Result<()> {
    let Some(text) = doc.info_text(key) else {
        return Ok(());
    };
    out.write_all(label(key).as_bytes())?;
    match parse_pdf_date(&text) {
        Some(date) => out.write_all(format_date(&date).as_bytes())?,
        None => out.write_all(&encoding.encode(&text))?,
    }
    out.write_all(b"\n")
}

/// Print one boundary box line.
pub fn write_box<W: Write>(
    out: &mut W,
    label: &str,
    rect: &Rect,
    explicit: bool,
    dvipdfmx_bb: bool,
) -> io::Result<()> {
    write!(
        out,
        "{}{:8.2} {:8.2} {:8.2} {:8.2}",
        label, rect.x1, rect.y1, rect.x2, rect.y2
    )?;
    if !explicit {
        write!(out, "   [Implicit]")?;
    }
    if dvipdfmx_bb {
        write!(out, "   [dvipdfmx BB]")?;
    }
    writeln!(out)
}
