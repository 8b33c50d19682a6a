//! Trait abstraction for serial port reads to enable testing

use async_trait::async_trait;
use std::io;

/// Trait for the read side of a serial port
#[async_trait]
pub trait FramePort: Send {
    /// Read up to `buf.len()` bytes, returning how many arrived.
    ///
    /// A return of 0 means no data was available, not end-of-stream.
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Wrapper around tokio_serial::SerialStream that implements FramePort
pub struct TokioSerialPort {
    port: tokio_serial::SerialStream,
}

impl TokioSerialPort {
    pub fn new(port: tokio_serial::SerialStream) -> Self {
        Self { port }
    }
}

#[async_trait]
impl FramePort for TokioSerialPort {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        use tokio::io::AsyncReadExt;
        self.port.read(buf).await
    }
}
