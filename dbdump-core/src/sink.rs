//! Output sinks for the dump text.
//!
//! The pipeline writes strictly in program order through the [`Sink`]
//! trait. Writes are raw bytes: table data may hold binary column values
//! that are not valid UTF-8. [`FileSink`] writes to a file or stdout and compresses the byte
//! stream on the fly; [`MemorySink`] keeps everything in a shared buffer.

use crate::{
    Result,
    error::DumpError,
    models::Destination,
    settings::CompressMethod,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::{Arc, Mutex};

/// Destination the dump text is written to.
pub trait Sink: Send {
    /// Opens the destination, creating or truncating a file.
    ///
    /// # Errors
    /// Returns [`DumpError::Io`] if the destination cannot be opened.
    fn open(&mut self, destination: &Destination) -> Result<()>;

    /// Writes bytes and returns the number of uncompressed bytes written.
    ///
    /// # Errors
    /// Returns [`DumpError::Io`] if the sink is not open or the write fails.
    fn write(&mut self, bytes: &[u8]) -> Result<usize>;

    /// Flushes and finalizes the output.
    ///
    /// # Errors
    /// Returns [`DumpError::Io`] if finishing the stream fails.
    fn close(&mut self) -> Result<()>;
}

type BaseWriter = Box<dyn Write + Send>;

enum Encoder {
    Plain(BaseWriter),
    Gzip(flate2::write::GzEncoder<BaseWriter>),
    Bzip2(bzip2::write::BzEncoder<BaseWriter>),
    Zstd(zstd::stream::write::Encoder<'static, BaseWriter>),
    Lz4(lz4_flex::frame::FrameEncoder<BaseWriter>),
}

impl Encoder {
    fn new(method: CompressMethod, level: u32, base: BaseWriter) -> std::io::Result<Self> {
        Ok(match method {
            CompressMethod::None => Self::Plain(base),
            CompressMethod::Gzip => Self::Gzip(flate2::write::GzEncoder::new(
                base,
                flate2::Compression::new(level),
            )),
            CompressMethod::Bzip2 => Self::Bzip2(bzip2::write::BzEncoder::new(
                base,
                bzip2::Compression::new(level.clamp(1, 9)),
            )),
            CompressMethod::Zstandard => {
                let level = i32::try_from(level).unwrap_or(zstd::DEFAULT_COMPRESSION_LEVEL);
                Self::Zstd(zstd::stream::write::Encoder::new(base, level)?)
            }
            // The lz4 frame format has no level knob
            CompressMethod::Lz4 => Self::Lz4(lz4_flex::frame::FrameEncoder::new(base)),
        })
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Plain(w) => w,
            Self::Gzip(w) => w,
            Self::Bzip2(w) => w,
            Self::Zstd(w) => w,
            Self::Lz4(w) => w,
        }
    }

    fn finish(self) -> std::io::Result<()> {
        let mut base = match self {
            Self::Plain(w) => w,
            Self::Gzip(w) => w.finish()?,
            Self::Bzip2(w) => w.finish()?,
            Self::Zstd(w) => w.finish()?,
            Self::Lz4(w) => w.finish().map_err(std::io::Error::other)?,
        };
        base.flush()
    }
}

/// Sink writing to a file or stdout, optionally compressed.
///
/// # Example
/// ```rust,no_run
/// use dbdump_core::{CompressMethod, Destination, FileSink, Sink};
///
/// let mut sink = FileSink::new(CompressMethod::Gzip, 6);
/// sink.open(&Destination::from_arg("dump.sql.gz")).unwrap();
/// sink.write(b"-- empty dump\n").unwrap();
/// sink.close().unwrap();
/// ```
pub struct FileSink {
    method: CompressMethod,
    level: u32,
    encoder: Option<Encoder>,
    destination: Option<Destination>,
}

impl std::fmt::Debug for FileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSink")
            .field("method", &self.method)
            .field("level", &self.level)
            .field("destination", &self.destination)
            .field("open", &self.encoder.is_some())
            .finish()
    }
}

impl FileSink {
    /// Creates a closed sink with the given compression.
    pub fn new(method: CompressMethod, level: u32) -> Self {
        Self {
            method,
            level,
            encoder: None,
            destination: None,
        }
    }

    fn target(&self) -> String {
        self.destination
            .as_ref()
            .map_or_else(|| "<unopened>".to_string(), ToString::to_string)
    }
}

impl Sink for FileSink {
    fn open(&mut self, destination: &Destination) -> Result<()> {
        let base: BaseWriter = match destination {
            Destination::Stdout => Box::new(BufWriter::new(std::io::stdout())),
            Destination::Path(path) => {
                let file = File::create(path).map_err(|e| {
                    DumpError::io(format!("Failed to create {}", path.display()), e)
                })?;
                Box::new(BufWriter::new(file))
            }
        };
        let encoder = Encoder::new(self.method, self.level, base).map_err(|e| {
            DumpError::io(format!("Failed to start {} stream", self.method.as_str()), e)
        })?;

        tracing::debug!(
            "Opened {} output ({} compression)",
            destination,
            self.method.as_str()
        );
        self.encoder = Some(encoder);
        self.destination = Some(destination.clone());
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        let target = self.target();
        let encoder = self.encoder.as_mut().ok_or_else(|| {
            DumpError::io(
                format!("Write to {} before open", target),
                std::io::Error::from(std::io::ErrorKind::NotConnected),
            )
        })?;
        encoder
            .writer()
            .write_all(bytes)
            .map_err(|e| DumpError::io(format!("Failed to write to {}", target), e))?;
        Ok(bytes.len())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(encoder) = self.encoder.take() {
            let target = self.target();
            encoder
                .finish()
                .map_err(|e| DumpError::io(format!("Failed to finish {}", target), e))?;
            tracing::debug!("Closed {}", target);
        }
        Ok(())
    }
}

/// Sink collecting the dump in memory.
///
/// Clones share the same buffer, so a test can keep a handle while the
/// pipeline owns the boxed sink.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
    state: Arc<Mutex<(bool, bool)>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, decoded as UTF-8.
    ///
    /// Invalid sequences are replaced; use [`MemorySink::bytes`] to compare
    /// binary output exactly.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes()).into_owned()
    }

    /// Everything written so far, byte for byte.
    pub fn bytes(&self) -> Vec<u8> {
        self.buffer
            .lock()
            .map(|bytes| bytes.clone())
            .unwrap_or_default()
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().is_ok_and(|state| state.1)
    }

    fn poisoned() -> DumpError {
        DumpError::io(
            "Memory sink lock poisoned",
            std::io::Error::other("poisoned lock"),
        )
    }
}

impl Sink for MemorySink {
    fn open(&mut self, _destination: &Destination) -> Result<()> {
        self.buffer.lock().map_err(|_| Self::poisoned())?.clear();
        *self.state.lock().map_err(|_| Self::poisoned())? = (true, false);
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        let opened = self.state.lock().map_err(|_| Self::poisoned())?.0;
        if !opened {
            return Err(DumpError::io(
                "Write to memory sink before open",
                std::io::Error::from(std::io::ErrorKind::NotConnected),
            ));
        }
        self.buffer
            .lock()
            .map_err(|_| Self::poisoned())?
            .extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn close(&mut self) -> Result<()> {
        self.state.lock().map_err(|_| Self::poisoned())?.1 = true;
        Ok(())
    }
}
