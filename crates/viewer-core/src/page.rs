//! One document page: placeholder/content geometry, zoom ratios and transforms

use doc_model::{ElementId, PageSource, Size};

use crate::affine::{AffineTransform, Point, TransformError};
use crate::host::StyleSink;

/// Ratios closer than this are treated as equal to avoid redundant scale writes
pub const RATIO_EPSILON: f64 = 1e-6;

fn is_usable_ratio(ratio: f64) -> bool {
    ratio > 0.0 && ratio.is_finite()
}

/// Forward declared matrix and its inverse
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageTransforms {
    pub forward: AffineTransform,
    pub inverse: AffineTransform,
}

impl PageTransforms {
    pub fn new(forward: AffineTransform) -> Result<Self, TransformError> {
        Ok(Self { forward, inverse: forward.invert()? })
    }
}

#[derive(Debug, Clone)]
pub struct Page {
    index: u32,
    placeholder: ElementId,
    content: ElementId,
    placeholder_size: Size,
    content_size: Size,
    default_ratio: f64,
    requested_ratio: f64,
    applied_ratio: f64,
    content_visible: bool,
    transforms: Result<PageTransforms, TransformError>,
}

impl Page {
    /// Build a page from its declared sizes and matrix
    ///
    /// A singular matrix leaves the page usable for virtualization and zoom;
    /// only navigation into or out of it fails.
    pub fn new(source: &PageSource) -> Self {
        let ratio = source.placeholder_size.height / source.content_size.height;
        let default_ratio = if is_usable_ratio(ratio) {
            ratio
        } else {
            tracing::warn!(
                page = source.index,
                placeholder_height = source.placeholder_size.height,
                content_height = source.content_size.height,
                "page sizes give no usable scale ratio, defaulting to 1"
            );
            1.0
        };

        let transforms = PageTransforms::new(AffineTransform::from_array(source.matrix));
        if let Err(error) = &transforms {
            tracing::warn!(page = source.index, %error, "page transform unusable, links into this page are disabled");
        }

        Self {
            index: source.index,
            placeholder: source.placeholder,
            content: source.content,
            placeholder_size: source.placeholder_size,
            content_size: source.content_size,
            default_ratio,
            requested_ratio: default_ratio,
            applied_ratio: default_ratio,
            content_visible: false,
            transforms,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn placeholder(&self) -> ElementId {
        self.placeholder
    }

    pub fn content(&self) -> ElementId {
        self.content
    }

    pub fn placeholder_size(&self) -> Size {
        self.placeholder_size
    }

    pub fn content_size(&self) -> Size {
        self.content_size
    }

    pub fn default_ratio(&self) -> f64 {
        self.default_ratio
    }

    pub fn requested_ratio(&self) -> f64 {
        self.requested_ratio
    }

    pub fn applied_ratio(&self) -> f64 {
        self.applied_ratio
    }

    pub fn is_content_visible(&self) -> bool {
        self.content_visible
    }

    pub fn transforms(&self) -> Result<&PageTransforms, TransformError> {
        self.transforms.as_ref().map_err(|error| *error)
    }

    /// Hide the content box. Returns `true` if a style write happened.
    pub fn hide<S: StyleSink + ?Sized>(&mut self, styles: &mut S) -> bool {
        if !self.content_visible {
            return false;
        }

        self.content_visible = false;
        styles.set_visible(self.content, false);
        true
    }

    /// Apply any pending ratio, then reveal the content box
    ///
    /// The scale is written before the box becomes visible so a resize never
    /// shows up as layout thrash. Returns `true` if any style write happened.
    pub fn show<S: StyleSink + ?Sized>(&mut self, styles: &mut S) -> bool {
        let mut wrote = false;

        if (self.requested_ratio - self.applied_ratio).abs() > RATIO_EPSILON {
            self.applied_ratio = self.requested_ratio;
            styles.set_scale_transform(self.content, self.applied_ratio);
            wrote = true;
        }

        if !self.content_visible {
            self.content_visible = true;
            styles.set_visible(self.content, true);
            wrote = true;
        }

        wrote
    }

    /// Request a new zoom ratio
    ///
    /// `ratio == 0` resets to the default ratio, `is_relative` multiplies the
    /// current request. The content box is hidden until the next `show`, but the
    /// placeholder is resized right away so scroll geometry stays correct.
    ///
    /// A ratio that would leave the page without a positive finite scale is
    /// ignored and `false` is returned; nothing is written in that case.
    pub fn rescale<S: StyleSink + ?Sized>(
        &mut self,
        ratio: f64,
        is_relative: bool,
        styles: &mut S,
    ) -> bool {
        let requested = if ratio == 0.0 {
            self.default_ratio
        } else if is_relative {
            self.requested_ratio * ratio
        } else {
            ratio
        };

        if !is_usable_ratio(requested) {
            tracing::warn!(page = self.index, ratio, is_relative, "ignoring unusable scale ratio");
            return false;
        }

        self.requested_ratio = requested;
        self.hide(styles);

        self.placeholder_size = self.content_size.scaled(self.requested_ratio);
        styles.set_size(self.placeholder, self.placeholder_size.width, self.placeholder_size.height);
        true
    }

    /// `top` is the placeholder's top edge relative to the viewport top.
    /// Both bounds are inclusive.
    pub fn is_visible(&self, top: f64, visible_height: f64) -> bool {
        let bottom = top + self.placeholder_size.height;
        !(bottom < 0.0 || top > visible_height)
    }

    /// Map a point in the placeholder box (top-down) to the page's document coordinates
    pub fn placeholder_to_document(&self, local: Point) -> Result<Point, TransformError> {
        let transforms = self.transforms()?;
        let content = Point::new(
            local.x / self.requested_ratio,
            self.content_size.height - local.y / self.requested_ratio,
        );
        Ok(transforms.inverse.apply(content))
    }

    /// Map a document point to the placeholder box (top-down)
    ///
    /// `flip` inverts the y axis against the content height; destinations
    /// given as rectangles are already top-down and skip it.
    pub fn document_to_placeholder(&self, point: Point, flip: bool) -> Result<Point, TransformError> {
        let transforms = self.transforms()?;
        let mut content = transforms.forward.apply(point);
        if flip {
            content.y = self.content_size.height - content.y;
        }
        Ok(Point::new(content.x * self.requested_ratio, content.y * self.requested_ratio))
    }
}
