//! Template patch cut around the selected point.

use crate::brief::{FeatureExtractor, FeatureSet};
use crate::error::ExtractError;
use glam::Vec2;
use steadyview_core::{GrayFrame, PixelRect, Point, Result, SteadyError};

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    patch: GrayFrame,
    rect: PixelRect,
    anchor: Point,
    features: Option<FeatureSet>,
}

impl Template {
    /// Cut a `size x size` patch centred on `point`, shifted to fit inside
    /// the frame. The anchor keeps the selected point relative to the patch
    /// so a shifted patch still reports the point the user chose.
    pub fn capture(frame: &GrayFrame, point: Point, size: u32) -> Result<Self> {
        let frame_size = frame.size();
        let rect = PixelRect::centered(point, size, size)
            .shifted_inside(frame_size)
            .ok_or_else(|| {
                SteadyError::InvalidParameter(format!(
                    "{size}x{size} template does not fit a {frame_size} frame"
                ))
            })?;
        let point = Point::new(
            point.x.clamp(rect.left(), rect.right() - 1),
            point.y.clamp(rect.top(), rect.bottom() - 1),
        );
        Ok(Self {
            patch: frame.crop(rect)?,
            rect,
            anchor: point - rect.origin(),
            features: None,
        })
    }

    /// Detect and describe the patch features. Failure leaves the template
    /// without features.
    pub fn extract_features(&mut self, extractor: &FeatureExtractor) -> std::result::Result<usize, ExtractError> {
        match extractor.extract(&self.patch) {
            Ok(features) => {
                let count = features.len();
                self.features = Some(features);
                Ok(count)
            }
            Err(e) => {
                self.features = None;
                Err(e)
            }
        }
    }

    pub fn patch(&self) -> &GrayFrame {
        &self.patch
    }

    /// Frame rectangle the patch was cut from.
    pub fn rect(&self) -> PixelRect {
        self.rect
    }

    /// Selected point in patch coordinates.
    pub fn anchor(&self) -> Point {
        self.anchor
    }

    /// Selected point in frame coordinates.
    pub fn anchor_in_frame(&self) -> Point {
        self.rect.origin() + self.anchor
    }

    pub fn features(&self) -> Option<&FeatureSet> {
        self.features.as_ref()
    }

    /// Offset from the mean of the given template keypoints to the anchor.
    pub fn anchor_offset(&self, keypoint_indices: impl IntoIterator<Item = usize>) -> Option<Vec2> {
        let features = self.features.as_ref()?;
        let (sum, count) = keypoint_indices
            .into_iter()
            .filter_map(|i| features.keypoints.get(i))
            .fold((Vec2::ZERO, 0u32), |(sum, n), kp| {
                (sum + Vec2::new(kp.x as f32, kp.y as f32), n + 1)
            });
        (count > 0).then(|| self.anchor.as_vec2() - sum / count as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureConfig;

    #[test]
    fn test_centered_capture() {
        let frame = GrayFrame::noise_pattern(640, 480, 2);
        let t = Template::capture(&frame, Point::new(320, 240), 100).unwrap();
        assert_eq!(t.rect(), PixelRect::new(270, 190, 100, 100));
        assert_eq!(t.anchor(), Point::new(50, 50));
        assert_eq!(t.anchor_in_frame(), Point::new(320, 240));
        assert_eq!(t.patch().get(0, 0), frame.get(270, 190));
    }

    #[test]
    fn test_capture_near_corner_keeps_anchor() {
        let frame = GrayFrame::noise_pattern(200, 150, 2);
        let t = Template::capture(&frame, Point::new(10, 140), 100).unwrap();
        assert_eq!(t.rect(), PixelRect::new(0, 50, 100, 100));
        assert_eq!(t.anchor_in_frame(), Point::new(10, 140));
    }

    #[test]
    fn test_capture_rejects_small_frame() {
        let frame = GrayFrame::new(80, 200);
        assert!(matches!(
            Template::capture(&frame, Point::new(40, 100), 100),
            Err(SteadyError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_features_and_anchor_offset() {
        let frame = GrayFrame::noise_pattern(300, 300, 12);
        let mut t = Template::capture(&frame, Point::new(150, 150), 100).unwrap();
        assert!(t.anchor_offset([0]).is_none());
        let extractor = FeatureExtractor::new(&FeatureConfig::default());
        let count = t.extract_features(&extractor).unwrap();
        assert!(count > 0);
        let kp = t.features().unwrap().keypoints[0];
        let offset = t.anchor_offset([0]).unwrap();
        assert_eq!(offset, Vec2::new(50.0 - kp.x as f32, 50.0 - kp.y as f32));

        let mut blank = Template::capture(&GrayFrame::filled(300, 300, 5), Point::new(150, 150), 100).unwrap();
        assert_eq!(blank.extract_features(&extractor), Err(ExtractError::NoFeatures));
        assert!(blank.features().is_none());
    }
}
