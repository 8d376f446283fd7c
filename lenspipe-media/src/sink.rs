//! Delivery ports for captured buffers
//!
//! Photo and video each get their own contract so a source only ever knows
//! about the one capability it feeds.

use crate::frame::FrameBuffer;

/// Receives still captures from the photo stream
pub trait PhotoSink: Send + Sync {
    /// Called on the photo delivery thread with the most recent capture
    fn on_photo_captured(&self, frame: FrameBuffer);
}

/// Receives frames from the video stream, in capture order
pub trait VideoSink: Send + Sync {
    /// Called on the video delivery thread for every delivered frame
    fn on_video_frame_captured(&self, frame: FrameBuffer);
}

impl<F> PhotoSink for F
where
    F: Fn(FrameBuffer) + Send + Sync,
{
    fn on_photo_captured(&self, frame: FrameBuffer) {
        self(frame)
    }
}

impl<F> VideoSink for F
where
    F: Fn(FrameBuffer) + Send + Sync,
{
    fn on_video_frame_captured(&self, frame: FrameBuffer) {
        self(frame)
    }
}
