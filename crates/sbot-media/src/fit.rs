//! Geometric fitting of a still image into the output frame.
//!
//! The source image is scaled uniformly so its height matches the frame,
//! then either center-cropped (wider than the frame) or letterboxed on a
//! black canvas (narrower). The plan is computed in Rust and realized as
//! the head of the encoder's video filter chain; no intermediate image
//! file is written.

use std::path::Path;

use sbot_models::TargetFrame;

use crate::error::{MediaError, MediaResult};

/// How the height-scaled image lands in the output frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Already exactly frame-sized after scaling
    Exact,
    /// Wider than the frame; crop a centered window starting at `left`
    Crop { left: u32 },
    /// Narrower than the frame; pad onto black with the image at `left`
    Letterbox { left: u32 },
}

/// Target geometry for one source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitPlan {
    /// Source width in pixels
    pub source_width: u32,
    /// Source height in pixels
    pub source_height: u32,
    /// Width after uniform scaling to frame height
    pub scaled_width: u32,
    /// Height after scaling (always the frame height)
    pub scaled_height: u32,
    /// Output frame width
    pub frame_width: u32,
    /// Output frame height
    pub frame_height: u32,
    /// Crop/letterbox/exact disposition
    pub placement: Placement,
}

impl FitPlan {
    /// Render the plan as an FFmpeg filter fragment.
    ///
    /// Returns `None` when the source is already exactly frame-sized and
    /// passes through untouched.
    pub fn to_filter(&self) -> Option<String> {
        let scale = format!("scale={}:{}", self.scaled_width, self.scaled_height);
        match self.placement {
            Placement::Exact => {
                if self.source_width == self.frame_width
                    && self.source_height == self.frame_height
                {
                    None
                } else {
                    Some(scale)
                }
            }
            Placement::Crop { left } => Some(format!(
                "{},crop={}:{}:{}:0",
                scale, self.frame_width, self.frame_height, left
            )),
            Placement::Letterbox { left } => Some(format!(
                "{},pad={}:{}:{}:0:color=black",
                scale, self.frame_width, self.frame_height, left
            )),
        }
    }

    /// Equal-margin check used by tests: left and right letterbox bars
    /// differ by at most one pixel of rounding.
    pub fn letterbox_margins(&self) -> Option<(u32, u32)> {
        match self.placement {
            Placement::Letterbox { left } => {
                Some((left, self.frame_width - self.scaled_width - left))
            }
            _ => None,
        }
    }
}

/// Compute the fit plan for a source of `width`x`height` pixels.
///
/// Degenerate sources are a precondition violation, never silently
/// rendered as a 1x1 output.
pub fn fit_dimensions(width: u32, height: u32, frame: &TargetFrame) -> MediaResult<FitPlan> {
    if width == 0 || height == 0 {
        return Err(MediaError::invalid_media(format!(
            "Degenerate image dimensions {}x{}",
            width, height
        )));
    }

    // Uniform scale so the image height equals the frame height.
    let scaled_width =
        ((u64::from(width) * u64::from(frame.height) + u64::from(height) / 2) / u64::from(height))
            .max(1) as u32;

    let placement = if scaled_width > frame.width {
        Placement::Crop {
            left: (scaled_width - frame.width) / 2,
        }
    } else if scaled_width < frame.width {
        Placement::Letterbox {
            left: (frame.width - scaled_width) / 2,
        }
    } else {
        Placement::Exact
    };

    Ok(FitPlan {
        source_width: width,
        source_height: height,
        scaled_width,
        scaled_height: frame.height,
        frame_width: frame.width,
        frame_height: frame.height,
        placement,
    })
}

/// Compute the fit plan for an image file.
///
/// Reads only the header for dimensions; the pixels stay on disk until
/// the encoder consumes them.
pub fn fit_image(path: impl AsRef<Path>, frame: &TargetFrame) -> MediaResult<FitPlan> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    let (width, height) = image::image_dimensions(path)
        .map_err(|e| MediaError::invalid_media(format!("{}: {}", path.display(), e)))?;

    fit_dimensions(width, height, frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> TargetFrame {
        TargetFrame::shorts()
    }

    #[test]
    fn test_wide_source_center_crops() {
        // 4000x3000 -> scaled 2560x1920, crop window centered
        let plan = fit_dimensions(4000, 3000, &frame()).unwrap();
        assert_eq!(plan.scaled_width, 2560);
        assert_eq!(plan.scaled_height, 1920);
        assert_eq!(plan.placement, Placement::Crop { left: 740 });

        let filter = plan.to_filter().unwrap();
        assert_eq!(filter, "scale=2560:1920,crop=1080:1920:740:0");
    }

    #[test]
    fn test_crop_window_is_centered() {
        let plan = fit_dimensions(1920, 1080, &frame()).unwrap();
        let Placement::Crop { left } = plan.placement else {
            panic!("expected crop");
        };
        let right = plan.scaled_width - 1080 - left;
        assert!(left.abs_diff(right) <= 1);
    }

    #[test]
    fn test_narrow_source_letterboxes_with_equal_margins() {
        // 540x1920 source stays 540 wide, centered on black
        let plan = fit_dimensions(540, 1920, &frame()).unwrap();
        assert_eq!(plan.scaled_width, 540);
        assert_eq!(plan.placement, Placement::Letterbox { left: 270 });

        let (left, right) = plan.letterbox_margins().unwrap();
        assert!(left.abs_diff(right) <= 1);

        let filter = plan.to_filter().unwrap();
        assert!(filter.contains("pad=1080:1920:270:0:color=black"));
    }

    #[test]
    fn test_odd_letterbox_margins_within_one_pixel() {
        // Scaled width 1079 leaves an odd gap; margins may differ by 1px
        let plan = fit_dimensions(1079, 1920, &frame()).unwrap();
        let (left, right) = plan.letterbox_margins().unwrap();
        assert_eq!(left + right + plan.scaled_width, 1080);
        assert!(left.abs_diff(right) <= 1);
    }

    #[test]
    fn test_exact_source_passes_through() {
        // A locally synthesized card is already 1080x1920
        let plan = fit_dimensions(1080, 1920, &frame()).unwrap();
        assert_eq!(plan.placement, Placement::Exact);
        assert!(plan.to_filter().is_none());
    }

    #[test]
    fn test_aspect_match_still_scales() {
        // Same 9:16 aspect but smaller; scales up, no crop or pad
        let plan = fit_dimensions(540, 960, &frame()).unwrap();
        assert_eq!(plan.placement, Placement::Exact);
        assert_eq!(plan.to_filter().unwrap(), "scale=1080:1920");
    }

    #[test]
    fn test_degenerate_source_rejected() {
        let err = fit_dimensions(0, 1080, &frame()).unwrap_err();
        assert!(matches!(err, MediaError::InvalidMedia(_)));
        let err = fit_dimensions(1080, 0, &frame()).unwrap_err();
        assert!(matches!(err, MediaError::InvalidMedia(_)));
    }

    #[test]
    fn test_extreme_panorama_never_zero_width() {
        let plan = fit_dimensions(10000, 10, &frame()).unwrap();
        assert!(plan.scaled_width >= 1);
        assert!(matches!(plan.placement, Placement::Crop { .. }));
    }
}
