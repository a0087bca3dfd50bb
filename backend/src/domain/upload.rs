//! PDF upload validation.
//!
//! Checks run in a fixed order (size, MIME type, filename, then content) and
//! stop at the first failure. Failures carry a machine-readable
//! [`UploadErrorCode`] and convert into [`AppError`] at adapter boundaries.

use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};

use sha2::{Digest, Sha256};

use super::error::{AppError, ErrorKind};

/// Largest accepted upload (100 MiB).
pub const MAX_FILE_SIZE_BYTES: u64 = 104_857_600;
/// The only accepted MIME type.
pub const ALLOWED_MIME_TYPE: &str = "application/pdf";
/// Longest accepted filename, in characters.
pub const MAX_FILENAME_LENGTH: usize = 255;
/// Signature every PDF starts with.
pub const PDF_MAGIC_BYTES: &[u8] = b"%PDF-";
/// Bytes inspected when checking the signature.
pub const PDF_HEADER_SCAN_BYTES: usize = 1024;

const BYTES_PER_MIB: u64 = 1_048_576;

/// Machine-readable validation failure code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadErrorCode {
    /// Size is zero or negative.
    InvalidFileSize,
    /// Size exceeds the configured limit.
    FileTooLarge,
    /// No MIME type was supplied.
    MissingMimeType,
    /// MIME type is not `application/pdf`.
    InvalidMimeType,
    /// Filename is empty, too long, unsafe, or lacks a `.pdf` extension.
    InvalidFilename,
    /// Content is empty or lacks the PDF signature.
    InvalidPdf,
}

impl UploadErrorCode {
    /// Wire representation of the code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidFileSize => "INVALID_FILE_SIZE",
            Self::FileTooLarge => "FILE_TOO_LARGE",
            Self::MissingMimeType => "MISSING_MIME_TYPE",
            Self::InvalidMimeType => "INVALID_MIME_TYPE",
            Self::InvalidFilename => "INVALID_FILENAME",
            Self::InvalidPdf => "INVALID_PDF",
        }
    }

    const fn error_kind(self) -> ErrorKind {
        match self {
            Self::FileTooLarge => ErrorKind::FileTooLarge,
            Self::InvalidPdf => ErrorKind::InvalidPdf,
            Self::MissingMimeType | Self::InvalidMimeType => ErrorKind::UnsupportedFileType,
            Self::InvalidFileSize | Self::InvalidFilename => ErrorKind::ValidationError,
        }
    }
}

impl fmt::Display for UploadErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upload rejected by validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct UploadValidationError {
    code: UploadErrorCode,
    message: String,
}

impl UploadValidationError {
    fn new(code: UploadErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn filename(message: &str) -> Self {
        Self::new(UploadErrorCode::InvalidFilename, message)
    }

    /// Machine-readable failure code.
    pub const fn code(&self) -> UploadErrorCode {
        self.code
    }

    /// Human-readable explanation.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

impl From<UploadValidationError> for AppError {
    fn from(value: UploadValidationError) -> Self {
        Self::new(value.code.error_kind(), value.message)
            .with_detail("validation_code", value.code.as_str())
    }
}

/// Metadata and optional content of an incoming upload.
#[derive(Debug, Clone, Copy)]
pub struct UploadCandidate<'a> {
    /// Client-supplied filename.
    pub filename: &'a str,
    /// Declared size in bytes.
    pub size_bytes: i64,
    /// Declared MIME type.
    pub mime_type: &'a str,
    /// Leading bytes of the upload, when available.
    pub content: Option<&'a [u8]>,
}

/// Validates uploads against a size limit.
///
/// # Examples
/// ```
/// use ebook_summary::domain::upload::{UploadCandidate, UploadValidator};
///
/// let validator = UploadValidator::default();
/// let name = validator
///     .validate_pdf_upload(&UploadCandidate {
///         filename: "  My   Report.pdf ",
///         size_bytes: 2_048,
///         mime_type: "application/pdf",
///         content: Some(b"%PDF-1.7\n"),
///     })
///     .expect("valid upload");
/// assert_eq!(name, "My Report.pdf");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadValidator {
    max_file_size_bytes: u64,
}

impl Default for UploadValidator {
    fn default() -> Self {
        Self::new(MAX_FILE_SIZE_BYTES)
    }
}

impl UploadValidator {
    /// Validator with a custom size limit.
    pub const fn new(max_file_size_bytes: u64) -> Self {
        Self {
            max_file_size_bytes,
        }
    }

    /// Configured size limit in bytes.
    pub const fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_bytes
    }

    /// Reject non-positive sizes and sizes above the limit.
    ///
    /// # Errors
    ///
    /// [`UploadErrorCode::InvalidFileSize`] or [`UploadErrorCode::FileTooLarge`].
    pub fn validate_file_size(&self, size_bytes: i64) -> Result<(), UploadValidationError> {
        let Some(size) = u64::try_from(size_bytes).ok().filter(|size| *size > 0) else {
            return Err(UploadValidationError::new(
                UploadErrorCode::InvalidFileSize,
                "File size must be greater than 0 bytes",
            ));
        };
        if size > self.max_file_size_bytes {
            let limit_mib = self
                .max_file_size_bytes
                .saturating_add(BYTES_PER_MIB / 2)
                / BYTES_PER_MIB;
            return Err(UploadValidationError::new(
                UploadErrorCode::FileTooLarge,
                format!("File size exceeds maximum allowed size of {limit_mib}MB"),
            ));
        }
        Ok(())
    }

    /// Accept only `application/pdf`.
    ///
    /// # Errors
    ///
    /// [`UploadErrorCode::MissingMimeType`] or [`UploadErrorCode::InvalidMimeType`].
    pub fn validate_mime_type(&self, mime_type: &str) -> Result<(), UploadValidationError> {
        if mime_type.is_empty() {
            return Err(UploadValidationError::new(
                UploadErrorCode::MissingMimeType,
                "MIME type is required",
            ));
        }
        if mime_type != ALLOWED_MIME_TYPE {
            return Err(UploadValidationError::new(
                UploadErrorCode::InvalidMimeType,
                format!("Only PDF files are allowed. Got: {mime_type}"),
            ));
        }
        Ok(())
    }

    /// Reject unsafe filenames and return the sanitised form.
    ///
    /// Sanitising trims the name, collapses whitespace runs to a single space,
    /// and strips leading and trailing dots.
    ///
    /// # Errors
    ///
    /// [`UploadErrorCode::InvalidFilename`].
    pub fn validate_filename(&self, filename: &str) -> Result<String, UploadValidationError> {
        if filename.is_empty() {
            return Err(UploadValidationError::filename("Filename cannot be empty"));
        }
        if filename.chars().count() > MAX_FILENAME_LENGTH {
            return Err(UploadValidationError::new(
                UploadErrorCode::InvalidFilename,
                format!("Filename exceeds maximum length of {MAX_FILENAME_LENGTH} characters"),
            ));
        }
        if filename.contains("../")
            || filename.contains("..\\")
            || filename.starts_with('/')
            || filename.starts_with('\\')
        {
            return Err(UploadValidationError::filename(
                "Filename contains invalid path traversal sequences",
            ));
        }
        if filename.contains('\0') {
            return Err(UploadValidationError::filename(
                "Filename contains null bytes",
            ));
        }

        let collapsed = filename.split_whitespace().collect::<Vec<_>>().join(" ");
        let sanitised = collapsed.trim_matches('.');
        if sanitised.is_empty() {
            return Err(UploadValidationError::filename(
                "Filename is empty after sanitization",
            ));
        }
        if !sanitised.to_lowercase().ends_with(".pdf") {
            return Err(UploadValidationError::filename(
                "Filename must have .pdf extension",
            ));
        }
        Ok(sanitised.to_owned())
    }

    /// Require the PDF signature within the first
    /// [`PDF_HEADER_SCAN_BYTES`] bytes of `content`.
    ///
    /// # Errors
    ///
    /// [`UploadErrorCode::InvalidPdf`].
    pub fn validate_pdf_format(&self, content: &[u8]) -> Result<(), UploadValidationError> {
        let header = content.get(..PDF_HEADER_SCAN_BYTES).unwrap_or(content);
        check_pdf_header(header)
    }

    /// Like [`UploadValidator::validate_pdf_format`] for a seekable stream.
    ///
    /// The stream position is restored before returning.
    ///
    /// # Errors
    ///
    /// [`UploadErrorCode::InvalidPdf`], including when the stream cannot be
    /// read.
    pub fn validate_pdf_reader<R: Read + Seek>(
        &self,
        reader: &mut R,
    ) -> Result<(), UploadValidationError> {
        let header = read_header(reader).map_err(|_| unreadable())?;
        check_pdf_header(&header)
    }

    /// Run every check in order and return the sanitised filename.
    ///
    /// The content check is skipped when no content is supplied.
    ///
    /// # Errors
    ///
    /// The first failing check's [`UploadValidationError`].
    pub fn validate_pdf_upload(
        &self,
        candidate: &UploadCandidate<'_>,
    ) -> Result<String, UploadValidationError> {
        self.validate_file_size(candidate.size_bytes)?;
        self.validate_mime_type(candidate.mime_type)?;
        let filename = self.validate_filename(candidate.filename)?;
        if let Some(content) = candidate.content {
            self.validate_pdf_format(content)?;
        }
        Ok(filename)
    }
}

fn unreadable() -> UploadValidationError {
    UploadValidationError::new(UploadErrorCode::InvalidPdf, "File is empty or cannot be read")
}

fn check_pdf_header(header: &[u8]) -> Result<(), UploadValidationError> {
    if header.is_empty() {
        return Err(unreadable());
    }
    if !header.starts_with(PDF_MAGIC_BYTES) {
        return Err(UploadValidationError::new(
            UploadErrorCode::InvalidPdf,
            "File is not a valid PDF (missing PDF signature)",
        ));
    }
    Ok(())
}

fn read_header<R: Read + Seek>(reader: &mut R) -> io::Result<Vec<u8>> {
    let position = reader.stream_position()?;
    let mut header = Vec::with_capacity(PDF_HEADER_SCAN_BYTES);
    let read = reader
        .by_ref()
        .take(PDF_HEADER_SCAN_BYTES as u64)
        .read_to_end(&mut header);
    reader.seek(SeekFrom::Start(position))?;
    read.map(|_| header)
}

/// Lowercase hex SHA-256 of `content`, as stored in `documents.file_hash`.
pub fn content_fingerprint(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}
