use std::fmt::Formatter;

#[derive(Debug)]
pub enum InfoError {
    IoError(std::io::Error),
    PdfError(lopdf::Error),
    DecryptError(lopdf::Error),
    /// Only the owner password authenticated, and the security handler
    /// revision derives its file key from the user password.
    OwnerPasswordUnsupported { revision: i64 },
    PageOutOfRange { page: i32, num_pages: u32 },
}

impl std::fmt::Display for InfoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            InfoError::IoError(e) => write!(f, "IO error: {}", e),
            InfoError::PdfError(e) => write!(f, "PDF error: {}", e),
            InfoError::DecryptError(e) => write!(f, "Couldn't decrypt document: {}", e),
            InfoError::OwnerPasswordUnsupported { revision } => write!(
                f,
                "Couldn't decrypt document: owner password is not usable with security handler revision {}, try the user password",
                revision
            ),
            InfoError::PageOutOfRange { page, num_pages } => {
                write!(f, "Page {} is beyond the last page ({})", page, num_pages)
            }
        }
    }
}

impl std::error::Error for InfoError {}

impl From<std::io::Error> for InfoError {
    fn from(e: std::io::Error) -> Self {
        InfoError::IoError(e)
    }
}

impl From<lopdf::Error> for InfoError {
    fn from(e: lopdf::Error) -> Self {
        InfoError::PdfError(e)
    }
}
