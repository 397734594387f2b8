//! Box annotation types and geometry.

use super::palette::ClassColor;

/// Unique identifier for a box within a session.
pub type BoxId = u64;

/// A rectangle annotation in image pixel coordinates.
///
/// `width` and `height` may be negative while the box is being sized;
/// [`AnnotationBox::normalized`] makes them positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationBox {
    /// Unique identifier.
    pub id: BoxId,
    /// Origin X coordinate
    pub x: f32,
    /// Origin Y coordinate
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Class this box is tagged with.
    pub color: ClassColor,
}

/// Integer pixel rectangle used for cropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl AnnotationBox {
    pub fn new(id: BoxId, x: f32, y: f32, width: f32, height: f32, color: ClassColor) -> Self {
        Self {
            id,
            x,
            y,
            width,
            height,
            color,
        }
    }

    /// Create a box of the given size centered on `(cx, cy)`.
    pub fn centered_at(
        id: BoxId,
        cx: f32,
        cy: f32,
        width: f32,
        height: f32,
        color: ClassColor,
    ) -> Self {
        Self::new(id, cx - width / 2.0, cy - height / 2.0, width, height, color)
    }

    /// Left, top, right, bottom edges regardless of sign of the extent.
    pub fn edges(&self) -> (f32, f32, f32, f32) {
        let (x0, x1) = ordered(self.x, self.x + self.width);
        let (y0, y1) = ordered(self.y, self.y + self.height);
        (x0, y0, x1, y1)
    }

    /// Half-open containment test: `x_min <= x < x_max`, `y_min <= y < y_max`.
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        let (x0, y0, x1, y1) = self.edges();
        x0 <= x && x < x1 && y0 <= y && y < y1
    }

    /// Canonical form with positive extent and the origin at the top-left.
    pub fn normalized(&self) -> Self {
        let (x0, y0, x1, y1) = self.edges();
        Self {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
            ..*self
        }
    }

    /// Translate the box so it lies inside `[0, image_width) x [0, image_height)`.
    ///
    /// Never changes the extent. A box larger than the image ends up with
    /// its origin at 0 on that axis.
    pub fn clamped_to_bounds(&self, image_width: u32, image_height: u32) -> Self {
        let b = self.normalized();
        Self {
            x: clamp_origin(b.x, b.width, image_width as f32),
            y: clamp_origin(b.y, b.height, image_height as f32),
            ..b
        }
    }

    /// Normalize, scale down to fit the image keeping the width/height
    /// ratio, then clamp.
    ///
    /// A box that fits is only translated. A box that doesn't is shrunk
    /// about its center until its binding extent equals the image extent.
    pub fn fitted_to_bounds(&self, image_width: u32, image_height: u32) -> Self {
        let mut b = self.normalized();
        let (iw, ih) = (image_width as f32, image_height as f32);
        let (w, h) = (b.width, b.height);
        if w > iw || h > ih {
            let (cx, cy) = (b.x + w / 2.0, b.y + h / 2.0);
            if w * ih >= h * iw {
                b.width = iw;
                b.height = h * iw / w;
            } else {
                b.width = w * ih / h;
                b.height = ih;
            }
            b.x = cx - b.width / 2.0;
            b.y = cy - b.height / 2.0;
        }
        b.clamped_to_bounds(image_width, image_height)
    }

    /// Whether both extents reach `min_size`.
    pub fn has_min_size(&self, min_size: f32) -> bool {
        self.width.abs() >= min_size && self.height.abs() >= min_size
    }

    /// Integer crop rectangle, intersected with the image.
    ///
    /// Returns `None` if nothing of the box lies on the image.
    pub fn pixel_rect(&self, image_width: u32, image_height: u32) -> Option<PixelRect> {
        let (x0, y0, x1, y1) = self.edges();
        let left = x0.round().clamp(0.0, image_width as f32) as u32;
        let top = y0.round().clamp(0.0, image_height as f32) as u32;
        let right = x1.round().clamp(0.0, image_width as f32) as u32;
        let bottom = y1.round().clamp(0.0, image_height as f32) as u32;
        if right <= left || bottom <= top {
            return None;
        }
        Some(PixelRect {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        })
    }
}

/// First box, in insertion order, containing the point.
pub fn hit_test(boxes: &[AnnotationBox], x: f32, y: f32) -> Option<&AnnotationBox> {
    boxes.iter().find(|b| b.contains_point(x, y))
}

fn ordered(a: f32, b: f32) -> (f32, f32) {
    if a <= b { (a, b) } else { (b, a) }
}

fn clamp_origin(origin: f32, extent: f32, limit: f32) -> f32 {
    if origin + extent > limit {
        (limit - extent).max(0.0)
    } else {
        origin.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x: f32, y: f32, w: f32, h: f32) -> AnnotationBox {
        AnnotationBox::new(1, x, y, w, h, ClassColor::Blue)
    }

    #[test]
    fn test_contains_point_is_half_open() {
        let b = bbox(10.0, 10.0, 20.0, 20.0);
        assert!(b.contains_point(10.0, 10.0));
        assert!(b.contains_point(29.9, 29.9));
        assert!(!b.contains_point(30.0, 15.0));
        assert!(!b.contains_point(15.0, 30.0));
        assert!(!b.contains_point(9.9, 15.0));
    }

    #[test]
    fn test_hit_test_prefers_earliest() {
        let first = AnnotationBox::new(1, 0.0, 0.0, 50.0, 50.0, ClassColor::Blue);
        let second = AnnotationBox::new(2, 25.0, 25.0, 50.0, 50.0, ClassColor::Red);
        let boxes = [first, second];
        assert_eq!(hit_test(&boxes, 30.0, 30.0).map(|b| b.id), Some(1));
        assert_eq!(hit_test(&boxes, 60.0, 60.0).map(|b| b.id), Some(2));
        assert!(hit_test(&boxes, 90.0, 90.0).is_none());

        let reversed = [second, first];
        assert_eq!(hit_test(&reversed, 30.0, 30.0).map(|b| b.id), Some(2));
    }

    #[test]
    fn test_normalize_negative_extent() {
        let b = bbox(100.0, 100.0, -40.0, -60.0).normalized();
        assert_eq!((b.x, b.y, b.width, b.height), (60.0, 40.0, 40.0, 60.0));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for b in [
            bbox(5.0, 7.0, 10.0, 20.0),
            bbox(5.0, 7.0, -10.0, 20.0),
            bbox(5.0, 7.0, 10.0, -20.0),
            bbox(-3.5, 2.25, -1.5, -8.0),
        ] {
            let once = b.normalized();
            assert_eq!(once.normalized(), once);
            assert!(once.width >= 0.0 && once.height >= 0.0);
        }
    }

    #[test]
    fn test_clamp_only_translates() {
        let (w, h) = (640, 480);
        for b in [
            bbox(-20.0, -30.0, 64.0, 128.0),
            bbox(600.0, 400.0, 64.0, 128.0),
            bbox(100.0, 100.0, 64.0, 128.0),
            bbox(0.0, 352.0, 640.0, 128.0),
        ] {
            let c = b.clamped_to_bounds(w, h);
            assert_eq!((c.width, c.height), (b.width, b.height));
            assert!(c.x >= 0.0 && c.y >= 0.0);
            assert!(c.x + c.width <= w as f32);
            assert!(c.y + c.height <= h as f32);
        }
    }

    #[test]
    fn test_fitted_to_bounds_keeps_shape() {
        let b = bbox(10.0, -50.0, 30.0, 900.0).fitted_to_bounds(640, 480);
        assert_eq!((b.x, b.y, b.width, b.height), (17.0, 0.0, 16.0, 480.0));

        let wide = bbox(-100.0, 10.0, 1280.0, 320.0).fitted_to_bounds(640, 480);
        assert_eq!((wide.x, wide.y, wide.width, wide.height), (0.0, 90.0, 640.0, 160.0));

        let small = bbox(630.0, 5.0, 20.0, 40.0).fitted_to_bounds(640, 480);
        assert_eq!((small.x, small.y, small.width, small.height), (620.0, 5.0, 20.0, 40.0));
    }

    #[test]
    fn test_fitted_to_bounds_on_image_smaller_than_box() {
        let b = AnnotationBox::centered_at(1, 16.0, 16.0, 64.0, 128.0, ClassColor::Blue)
            .fitted_to_bounds(32, 32);
        assert_eq!((b.width, b.height), (16.0, 32.0));
        let (x0, y0, x1, y1) = b.edges();
        assert!(x0 >= 0.0 && y0 >= 0.0 && x1 <= 32.0 && y1 <= 32.0);
    }

    #[test]
    fn test_pixel_rect_rounds_and_intersects() {
        let r = bbox(67.6, 36.2, 64.0, 128.0).pixel_rect(640, 480).unwrap();
        assert_eq!(r, PixelRect { x: 68, y: 36, width: 64, height: 128 });

        let partial = bbox(600.0, 0.0, 100.0, 10.0).pixel_rect(640, 480).unwrap();
        assert_eq!(partial.width, 40);

        assert!(bbox(700.0, 0.0, 10.0, 10.0).pixel_rect(640, 480).is_none());
    }
}
