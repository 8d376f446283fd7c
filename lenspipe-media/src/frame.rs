//! Captured frame buffers

use crate::buffer_source::BufferLease;
use bytes::Bytes;
use lenspipe_core::{PixelFormat, Size};
use std::fmt;

/// An image buffer delivered by a [`BufferSource`](crate::BufferSource).
///
/// The buffer occupies one slot of its source until it is released.
/// Dropping a `FrameBuffer` counts as releasing it, exactly like calling
/// [`FrameBuffer::release`]. A sink that keeps buffers alive holds their
/// slots, and once every slot is held new captures are dropped.
pub struct FrameBuffer {
    format: PixelFormat,
    size: Size,
    /// Capture timestamp in nanoseconds
    timestamp: u64,
    data: Bytes,
    lease: Option<BufferLease>,
}

impl FrameBuffer {
    /// A buffer not backed by any source slot
    pub fn detached(format: PixelFormat, size: Size, timestamp: u64, data: Bytes) -> Self {
        Self {
            format,
            size,
            timestamp,
            data,
            lease: None,
        }
    }

    pub(crate) fn leased(
        format: PixelFormat,
        size: Size,
        timestamp: u64,
        data: Bytes,
        lease: BufferLease,
    ) -> Self {
        Self {
            format,
            size,
            timestamp,
            data,
            lease: Some(lease),
        }
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Return the buffer's slot to its source
    pub fn release(mut self) {
        if let Some(lease) = self.lease.take() {
            lease.release();
        }
    }
}

impl Drop for FrameBuffer {
    fn drop(&mut self) {
        if let Some(lease) = self.lease.take() {
            lease.release();
        }
    }
}

impl fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("format", &self.format)
            .field("size", &self.size)
            .field("timestamp", &self.timestamp)
            .field("len", &self.data.len())
            .field("leased", &self.lease.is_some())
            .finish()
    }
}
