use std::ffi::OsString;
use std::path::PathBuf;

use clap::{CommandFactory, Parser};

/// Options spelled with a single dash on the command line.
const LONG_FLAGS: [&str; 5] = ["box", "extractbb", "meta", "rawdates", "help"];
const LONG_OPTIONS: [&str; 4] = ["enc", "opw", "upw", "cfg"];
const SHORT_OPTIONS: [&str; 2] = ["-f", "-l"];

#[derive(Debug, Parser)]
#[command(name = "pdfinfo")]
#[command(about = "Print information about a PDF file", long_about = None)]
#[command(disable_help_flag = true, disable_version_flag = true)]
#[command(allow_negative_numbers = true)]
pub struct Args {
    /// first page to convert
    #[arg(short = 'f', value_name = "N", default_value_t = 1)]
    pub first_page: i32,

    /// last page to convert
    #[arg(short = 'l', value_name = "N", default_value_t = 0)]
    pub last_page: i32,

    /// print the page bounding boxes
    #[arg(long = "box")]
    pub print_boxes: bool,

    /// act as extractbb
    #[arg(long = "extractbb")]
    pub extractbb: bool,

    /// print the document metadata (XML)
    #[arg(long = "meta")]
    pub print_metadata: bool,

    /// print the undecoded date strings directly from the PDF file
    #[arg(long = "rawdates")]
    pub raw_dates: bool,

    /// output text encoding name
    #[arg(long = "enc", value_name = "NAME", allow_hyphen_values = true)]
    pub text_encoding: Option<String>,

    /// owner password (for encrypted files)
    #[arg(long = "opw", value_name = "PASSWORD", allow_hyphen_values = true)]
    pub owner_password: Option<String>,

    /// user password (for encrypted files)
    #[arg(long = "upw", value_name = "PASSWORD", allow_hyphen_values = true)]
    pub user_password: Option<String>,

    /// configuration file to use in place of .xpdfrc
    #[arg(long = "cfg", value_name = "FILE", allow_hyphen_values = true)]
    pub config_file: Option<PathBuf>,

    /// print copyright and version info
    #[arg(short = 'v')]
    pub print_version: bool,

    /// print usage information
    #[arg(short = 'h', long = "help")]
    pub print_help: bool,

    #[arg(value_name = "PDF-file")]
    pub files: Vec<PathBuf>,
}

impl Args {
    /// Parse xpdf-style arguments, where long options take a single dash.
    pub fn try_parse_args<I>(args: I) -> Result<Args, clap::Error>
    where
        I: IntoIterator<Item = OsString>,
    {
        Args::try_parse_from(normalize_args(args))
    }

    /// The single input file, if exactly one was given.
    pub fn file(&self) -> Option<&PathBuf> {
        match self.files.as_slice() {
            [file] => Some(file),
            _ => None,
        }
    }

    /// Help text showing options the way they are typed.
    pub fn usage() -> String {
        Args::command().render_help().to_string().replace("--", "-")
    }
}

/// Rewrite `-box` style options into the `--box` form clap expects. Option
/// values are passed through untouched, as is everything after `--`.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut out = Vec::new();
    let mut args = args.into_iter();
    out.extend(args.next());

    let mut takes_value = false;
    while let Some(arg) = args.next() {
        if takes_value {
            takes_value = false;
            out.push(arg);
            continue;
        }

        let Some(s) = arg.to_str() else {
            out.push(arg);
            continue;
        };
        if s == "--" {
            out.push(arg);
            out.extend(args.by_ref());
            break;
        }
        if s == "-?" {
            out.push("--help".into());
            continue;
        }
        if SHORT_OPTIONS.contains(&s) {
            takes_value = true;
            out.push(arg);
            continue;
        }

        match s.strip_prefix('-').filter(|name| !name.starts_with('-')) {
            Some(name) if LONG_FLAGS.contains(&name) => out.push(format!("--{}", name).into()),
            Some(name) if LONG_OPTIONS.contains(&name) => {
                takes_value = true;
                out.push(format!("--{}", name).into());
            }
            _ => {
                if let Some(name) = s.strip_prefix("--") {
                    takes_value = LONG_OPTIONS.contains(&name);
                }
                out.push(arg);
            }
        }
    }
    out
}
