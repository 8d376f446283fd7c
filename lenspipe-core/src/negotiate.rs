//! Stream negotiation
//!
//! Picks the size each requested output will be streamed at. Photo and video
//! use the "closest-or-max" rule against the caller's target size; preview
//! uses a fixed policy bounded by [`MAX_PREVIEW_SIZE`].
//!
//! Everything in here is pure: the caller queries the capability descriptor
//! once and hands the resulting [`StreamConfiguration`] in.

use crate::capability::StreamConfiguration;
use crate::error::ConfigurationError;
use crate::format::{PixelFormat, Size};
use crate::request::{OutputKind, OutputRequest};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest size the preview stream is configured at
pub const MAX_PREVIEW_SIZE: Size = Size::FULL_HD;

/// Format of the preview stream
pub const PREVIEW_FORMAT: PixelFormat = PixelFormat::Private;

/// Size and format chosen for one output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedOutput {
    pub kind: OutputKind,
    pub size: Size,
    pub format: PixelFormat,
}

impl fmt::Display for ResolvedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({})",
            self.kind.as_str().to_uppercase(),
            self.size,
            self.format
        )
    }
}

/// Resolve one request against a camera's stream configuration
pub fn negotiate(
    config: &StreamConfiguration,
    request: &OutputRequest,
) -> Result<ResolvedOutput, ConfigurationError> {
    let (size, format) = match request {
        OutputRequest::Preview(_) => (preview_size(config)?, PREVIEW_FORMAT),
        OutputRequest::Photo(photo) => (
            negotiate_size(config, photo.format, photo.target_size)?,
            photo.format,
        ),
        OutputRequest::Video(video) => (
            negotiate_size(config, video.format, video.target_size)?,
            video.format,
        ),
    };

    Ok(ResolvedOutput {
        kind: request.kind(),
        size,
        format,
    })
}

/// Closest-or-max selection for `format`
pub fn negotiate_size(
    config: &StreamConfiguration,
    format: PixelFormat,
    target: Option<Size>,
) -> Result<Size, ConfigurationError> {
    let sizes = sizes_for(config, format)?;
    closest_to_or_max(sizes, target).ok_or_else(|| ConfigurationError::NoSizesAvailable {
        format: format.to_string(),
    })
}

/// Preview size policy: the largest size fitting [`MAX_PREVIEW_SIZE`], or
/// the smallest listed size if none fits.
pub fn preview_size(config: &StreamConfiguration) -> Result<Size, ConfigurationError> {
    let sizes = sizes_for(config, PREVIEW_FORMAT)?;

    let fitting = first_extreme(
        sizes.iter().filter(|s| s.fits_within(MAX_PREVIEW_SIZE)),
        |candidate, best| candidate.area() > best.area(),
    );

    fitting
        .or_else(|| first_extreme(sizes.iter(), |candidate, best| candidate.area() < best.area()))
        .ok_or_else(|| ConfigurationError::NoSizesAvailable {
            format: PREVIEW_FORMAT.to_string(),
        })
}

/// Without a target, the max-area size; with one, the size whose area is
/// closest to the target's. Ties go to the first listed size.
pub fn closest_to_or_max(sizes: &[Size], target: Option<Size>) -> Option<Size> {
    match target {
        None => first_extreme(sizes.iter(), |candidate, best| candidate.area() > best.area()),
        Some(target) => {
            let wanted = target.area();
            first_extreme(sizes.iter(), |candidate, best| {
                candidate.area().abs_diff(wanted) < best.area().abs_diff(wanted)
            })
        }
    }
}

fn sizes_for(
    config: &StreamConfiguration,
    format: PixelFormat,
) -> Result<&[Size], ConfigurationError> {
    config
        .sizes_for(format)
        .ok_or_else(|| ConfigurationError::UnsupportedFormat {
            format: format.to_string(),
        })
}

// Replaces the running best only on a strict improvement, so the earliest
// candidate wins ties.
fn first_extreme<'a>(
    sizes: impl Iterator<Item = &'a Size>,
    better: impl Fn(&Size, &Size) -> bool,
) -> Option<Size> {
    sizes.fold(None, |best: Option<Size>, candidate| match best {
        Some(best) if !better(candidate, &best) => Some(best),
        _ => Some(*candidate),
    })
}
