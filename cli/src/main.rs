mod args;

use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use chrono::Local;
use pdf_info::{Config, InfoDocument, InfoError, ReportOptions, VERSION};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::args::Args;

const COPYRIGHT: &str = concat!("Copyright 2024 ", env!("CARGO_PKG_AUTHORS"));

/// Ways a run can end other than success.
#[derive(Debug)]
enum Failure {
    /// Bad arguments, or help or version requested.
    Usage { show_usage: bool },
    /// The output text encoding could not be resolved.
    Encoding(String),
    /// The document could not be opened or decrypted.
    Open(InfoError),
    /// The report could not be produced.
    Report(InfoError),
}

impl Failure {
    fn exit_code(&self) -> ExitCode {
        match self {
            Failure::Usage { .. } => ExitCode::from(99),
            Failure::Encoding(_) => ExitCode::from(2),
            Failure::Open(_) | Failure::Report(_) => ExitCode::from(1),
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            match &failure {
                Failure::Usage { show_usage } => {
                    eprintln!("pdfinfo version {}", VERSION);
                    eprintln!("{}", COPYRIGHT);
                    if *show_usage {
                        eprint!("{}", Args::usage());
                    }
                }
                Failure::Encoding(name) => {
                    eprintln!("Config Error: Couldn't get text encoding '{}'", name);
                }
                Failure::Open(e) => eprintln!("Error: {}", e),
                Failure::Report(InfoError::PageOutOfRange { page, num_pages }) => {
                    debug!("page {} requested, document has {}", page, num_pages);
                }
                Failure::Report(e) => eprintln!("Error: {}", e),
            }
            failure.exit_code()
        }
    }
}

fn run() -> Result<(), Failure> {
    let args = Args::try_parse_args(std::env::args_os()).map_err(|e| {
        debug!("argument error: {}", e);
        Failure::Usage { show_usage: true }
    })?;

    let file = match args.file() {
        Some(file) if !args.print_version && !args.print_help => file.clone(),
        _ => {
            return Err(Failure::Usage {
                show_usage: !args.print_version,
            });
        }
    };

    let mut config = Config::load(args.config_file.as_deref());
    if let Some(name) = &args.text_encoding {
        config.text_encoding = name.clone();
    }
    let encoding = config
        .text_encoding()
        .ok_or_else(|| Failure::Encoding(config.text_encoding.clone()))?;

    let mut options = InfoDocument::options();
    if let Some(password) = &args.owner_password {
        options = options.owner_password(password);
    }
    if let Some(password) = &args.user_password {
        options = options.user_password(password);
    }
    let doc = options.open(&file).map_err(Failure::Open)?;

    let opts = ReportOptions {
        first_page: args.first_page,
        last_page: args.last_page,
        print_boxes: args.print_boxes,
        print_metadata: args.print_metadata,
        raw_dates: args.raw_dates,
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if args.extractbb {
        let now = Local::now().naive_local();
        pdf_info::write_extractbb(&mut out, &doc, &opts, &now).map_err(Failure::Report)?;
    } else {
        pdf_info::write_report(&mut out, &doc, &encoding, &opts).map_err(Failure::Report)?;
    }
    out.flush()
        .map_err(|e| Failure::Report(InfoError::IoError(e)))
}
