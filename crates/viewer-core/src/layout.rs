//! Document-flow positions of the placeholder boxes
//!
//! Placeholders are stacked top to bottom in page order with a fixed gap
//! before every page. Offsets are in scroll-content coordinates.

use crate::affine::Point;
use crate::page::Page;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    origins: Vec<Point>,
    total_height: f64,
}

impl PageLayout {
    pub fn stack(pages: &[Page], gap: f64) -> Self {
        let mut origins = Vec::with_capacity(pages.len());
        let mut cursor = gap;

        for page in pages {
            origins.push(Point::new(0.0, cursor));
            cursor += page.placeholder_size().height + gap;
        }

        Self { origins, total_height: cursor }
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    /// Top-left corner of the page's placeholder in content coordinates
    pub fn origin(&self, index: usize) -> Option<Point> {
        self.origins.get(index).copied()
    }

    /// Placeholder top relative to the viewport top
    pub fn viewport_top(&self, index: usize, scroll_top: f64) -> Option<f64> {
        self.origin(index).map(|origin| origin.y - scroll_top)
    }

    /// Where the viewport's top-left corner sits inside the page's placeholder
    pub fn viewport_in_page(&self, index: usize, scroll: Point) -> Option<Point> {
        self.origin(index).map(|origin| Point::new(scroll.x - origin.x, scroll.y - origin.y))
    }

    /// Height of the whole scrollable flow, trailing gap included
    pub fn total_height(&self) -> f64 {
        self.total_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{ElementId, PageSource, Size};

    fn pages(heights: &[f64]) -> Vec<Page> {
        heights
            .iter()
            .enumerate()
            .map(|(index, height)| {
                Page::new(&PageSource {
                    index: index as u32,
                    placeholder: ElementId(index as u32 * 2),
                    content: ElementId(index as u32 * 2 + 1),
                    matrix: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
                    placeholder_size: Size::new(500.0, *height),
                    content_size: Size::new(500.0, *height),
                })
            })
            .collect()
    }

    #[test]
    fn stacks_pages_with_gap() {
        let layout = PageLayout::stack(&pages(&[1000.0, 500.0, 800.0]), 10.0);

        assert_eq!(layout.len(), 3);
        assert_eq!(layout.origin(0), Some(Point::new(0.0, 10.0)));
        assert_eq!(layout.origin(1), Some(Point::new(0.0, 1020.0)));
        assert_eq!(layout.origin(2), Some(Point::new(0.0, 1530.0)));
        assert_eq!(layout.total_height(), 2340.0);
        assert_eq!(layout.origin(3), None);
    }

    #[test]
    fn viewport_relative_positions() {
        let layout = PageLayout::stack(&pages(&[1000.0, 1000.0]), 0.0);

        assert_eq!(layout.viewport_top(1, 1200.0), Some(-200.0));
        assert_eq!(layout.viewport_in_page(1, Point::new(5.0, 1200.0)), Some(Point::new(5.0, 200.0)));
    }

    #[test]
    fn empty_layout() {
        let layout = PageLayout::stack(&[], 16.0);
        assert!(layout.is_empty());
        assert_eq!(layout.total_height(), 16.0);
    }
}
