use std::io::{self, Write};

/// Destination for a single response
///
/// `write_status` is called exactly once per response, before any body.
pub trait ResponseSink {
    /// Write the status line
    fn write_status(&mut self, status: u8, meta: &str) -> io::Result<()>;
    /// Write (part of) the body
    fn write_body(&mut self, body: &[u8]) -> io::Result<()>;
}

impl<S: ResponseSink + ?Sized> ResponseSink for &mut S {
    fn write_status(&mut self, status: u8, meta: &str) -> io::Result<()> {
        (**self).write_status(status, meta)
    }

    fn write_body(&mut self, body: &[u8]) -> io::Result<()> {
        (**self).write_body(body)
    }
}

/// Sink writing the line protocol onto a byte stream
#[derive(Debug)]
pub struct WireSink<W> {
    inner: W,
}

impl<W: Write> WireSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Borrow the underlying writer
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Flush and return the underlying writer
    pub fn into_inner(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> ResponseSink for WireSink<W> {
    fn write_status(&mut self, status: u8, meta: &str) -> io::Result<()> {
        write!(self.inner, "{status} {meta}\r\n")
    }

    fn write_body(&mut self, body: &[u8]) -> io::Result<()> {
        self.inner.write_all(body)
    }
}
