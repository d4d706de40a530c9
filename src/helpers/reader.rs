use crate::error::TravelSheetError;
use std::fs::File;
use std::io::BufReader;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum UnifiedReaderError {
    #[error("Unsupported template location scheme '{0}', only local paths and file:// URLs are served")]
    UnsupportedSchemeError(String),

    #[error("Invalid file URL '{0}'")]
    FileUrlError(String),
}

/// A unified reader over template bytes, either from a local file or an embedded resource
pub enum UnifiedReader {
    /// Local file reader
    Local(BufReader<File>),
    /// Embedded or caller-supplied bytes (in-memory buffer)
    Memory(Cursor<Vec<u8>>),
}

impl UnifiedReader {
    /// Opens a local template file
    ///
    /// # Arguments
    /// * `path` - Path to the template file
    ///
    /// # Returns
    /// * `Result<UnifiedReader, std::io::Error>` - Reader for the file content
    pub fn open(path: &std::path::Path) -> Result<UnifiedReader, std::io::Error> {
        let file = File::open(path)?;
        Ok(UnifiedReader::Local(BufReader::new(file)))
    }

    /// Wraps in-memory bytes
    pub fn memory(bytes: Vec<u8>) -> UnifiedReader {
        UnifiedReader::Memory(Cursor::new(bytes))
    }

    /// Reads the remaining content into a byte vector
    pub fn read_all(&mut self) -> Result<Vec<u8>, TravelSheetError> {
        let mut bytes = Vec::new();
        self.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    /// Checks if a template identifier is a URL rather than a plain path
    pub(crate) fn is_url(identifier: &str) -> bool {
        // Windows drive letters parse as one-letter schemes
        matches!(Url::parse(identifier), Ok(url) if url.scheme().len() > 1)
    }

    /// Converts a `file://` URL into a local path
    ///
    /// # Arguments
    /// * `identifier` - URL string
    ///
    /// # Returns
    /// * `Result<PathBuf, UnifiedReaderError>` - Local path or error for any other scheme
    pub(crate) fn url_to_path(identifier: &str) -> Result<PathBuf, UnifiedReaderError> {
        let url = Url::parse(identifier)
            .map_err(|_| UnifiedReaderError::FileUrlError(identifier.to_owned()))?;
        if url.scheme() != "file" {
            Err(UnifiedReaderError::UnsupportedSchemeError(url.scheme().to_owned()))?
        }
        url.to_file_path()
            .map_err(|_| UnifiedReaderError::FileUrlError(identifier.to_owned()))
    }
}

impl Read for UnifiedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            UnifiedReader::Local(reader) => reader.read(buf),
            UnifiedReader::Memory(reader) => reader.read(buf),
        }
    }
}

impl Seek for UnifiedReader {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        match self {
            UnifiedReader::Local(reader) => reader.seek(pos),
            UnifiedReader::Memory(reader) => reader.seek(pos),
        }
    }
}
