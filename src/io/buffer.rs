//! Buffered Writer
//!
//! Accumulates output in a fixed-size buffer and writes it out in full.
//! Used only by the builder.

use std::io::{self, ErrorKind, Write};

/// Fixed-capacity write buffer over a sink
///
/// Unlike `std::io::BufWriter`, a failed flush leaves nothing queued for a
/// retry on drop: the builder flushes only at well-defined points and
/// aborts on the first error.
pub struct BufferedWriter<W: Write> {
    inner: W,
    buf: Vec<u8>,
    capacity: usize,
}

impl<W: Write> BufferedWriter<W> {
    pub fn with_capacity(capacity: usize, inner: W) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append bytes, flushing first if they do not fit.
    ///
    /// Inputs at least as large as the buffer go straight to the sink.
    pub fn put(&mut self, bytes: &[u8]) -> io::Result<()> {
        if bytes.len() > self.capacity - self.buf.len() {
            self.flush()?;
        }
        if bytes.len() >= self.capacity {
            return write_fully(&mut self.inner, bytes);
        }
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Write out everything buffered so far
    pub fn flush(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let result = write_fully(&mut self.inner, &self.buf);
        self.buf.clear();
        result
    }

    /// Flush the buffer, then write `bytes` directly to the sink
    pub fn put_flush(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.flush()?;
        write_fully(&mut self.inner, bytes)
    }

    /// Number of bytes waiting to be flushed
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Access the sink directly (e.g. to seek). Flush first.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Unwrap the sink, discarding anything not yet flushed
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Write all of `buf`, retrying partial writes and interrupted calls
fn write_fully<W: Write>(w: &mut W, mut buf: &[u8]) -> io::Result<()> {
    while !buf.is_empty() {
        match w.write(buf) {
            Ok(0) => {
                return Err(io::Error::new(
                    ErrorKind::WriteZero,
                    "sink accepted zero bytes",
                ));
            }
            Ok(n) => buf = &buf[n..],
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
