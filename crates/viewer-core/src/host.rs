//! Capabilities the viewer needs from its host
//!
//! The host owns the real scroll container and element styles. The viewer
//! only reads scroll geometry through [`Viewport`] and mutates elements
//! through [`StyleSink`]. [`MemoryViewport`] and [`RecordingStyleSink`] are
//! headless implementations used by the CLI and tests.

use doc_model::ElementId;

use crate::affine::Point;

/// Scrollable container the pages live in
pub trait Viewport {
    /// Current scroll offset (left, top)
    fn scroll_offset(&self) -> Point;

    /// Height of the visible area
    fn visible_height(&self) -> f64;

    fn scroll_to(&mut self, x: f64, y: f64);
}

/// The only element mutations the viewer performs
pub trait StyleSink {
    fn set_visible(&mut self, element: ElementId, visible: bool);

    fn set_size(&mut self, element: ElementId, width: f64, height: f64);

    fn set_scale_transform(&mut self, element: ElementId, ratio: f64);
}

impl<T: Viewport + ?Sized> Viewport for &mut T {
    fn scroll_offset(&self) -> Point {
        (**self).scroll_offset()
    }

    fn visible_height(&self) -> f64 {
        (**self).visible_height()
    }

    fn scroll_to(&mut self, x: f64, y: f64) {
        (**self).scroll_to(x, y);
    }
}

impl<T: StyleSink + ?Sized> StyleSink for &mut T {
    fn set_visible(&mut self, element: ElementId, visible: bool) {
        (**self).set_visible(element, visible);
    }

    fn set_size(&mut self, element: ElementId, width: f64, height: f64) {
        (**self).set_size(element, width, height);
    }

    fn set_scale_transform(&mut self, element: ElementId, ratio: f64) {
        (**self).set_scale_transform(element, ratio);
    }
}

/// In-memory scroll container
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryViewport {
    offset: Point,
    visible_height: f64,
    scroll_calls: Vec<Point>,
}

impl MemoryViewport {
    pub fn new(visible_height: f64) -> Self {
        Self { offset: Point::ORIGIN, visible_height, scroll_calls: Vec::new() }
    }

    /// Move the scroll position as a user scroll would, without recording a `scroll_to`
    pub fn set_offset(&mut self, x: f64, y: f64) {
        self.offset = Point::new(x, y);
    }

    pub fn set_visible_height(&mut self, height: f64) {
        self.visible_height = height;
    }

    /// Every position passed to `scroll_to`, oldest first
    pub fn scroll_calls(&self) -> &[Point] {
        &self.scroll_calls
    }
}

impl Viewport for MemoryViewport {
    fn scroll_offset(&self) -> Point {
        self.offset
    }

    fn visible_height(&self) -> f64 {
        self.visible_height
    }

    fn scroll_to(&mut self, x: f64, y: f64) {
        self.offset = Point::new(x, y);
        self.scroll_calls.push(self.offset);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StyleOp {
    Visible { element: ElementId, visible: bool },
    Size { element: ElementId, width: f64, height: f64 },
    Scale { element: ElementId, ratio: f64 },
}

impl StyleOp {
    pub fn element(&self) -> ElementId {
        match *self {
            Self::Visible { element, .. } | Self::Size { element, .. } | Self::Scale { element, .. } => {
                element
            }
        }
    }
}

/// Style sink that records every write in order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingStyleSink {
    ops: Vec<StyleOp>,
}

impl RecordingStyleSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[StyleOp] {
        &self.ops
    }

    pub fn ops_for(&self, element: ElementId) -> impl Iterator<Item = &StyleOp> {
        self.ops.iter().filter(move |op| op.element() == element)
    }

    pub fn scale_writes(&self, element: ElementId) -> usize {
        self.ops_for(element).filter(|op| matches!(op, StyleOp::Scale { .. })).count()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl StyleSink for RecordingStyleSink {
    fn set_visible(&mut self, element: ElementId, visible: bool) {
        self.ops.push(StyleOp::Visible { element, visible });
    }

    fn set_size(&mut self, element: ElementId, width: f64, height: f64) {
        self.ops.push(StyleOp::Size { element, width, height });
    }

    fn set_scale_transform(&mut self, element: ElementId, ratio: f64) {
        self.ops.push(StyleOp::Scale { element, ratio });
    }
}
