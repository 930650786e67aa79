//! Resolve destinations (links, outline entries) into scroll offsets
//!
//! A destination names a target page, a fit mode and optional document
//! coordinates. Missing coordinates inherit the reader's current position,
//! expressed in the current page's document coordinates.

use doc_model::{DestinationMode, DestinationSpec};
use serde::Serialize;

use crate::affine::{Point, TransformError};
use crate::layout::PageLayout;
use crate::page::Page;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum NavigationSkip {
    TargetOutOfRange { page: u32, page_count: usize },
    UnrecognizedMode { mode: String },
    SingularTransform { page: u32 },
    NonFiniteTarget { page: u32 },
    MalformedDestination { message: String },
    TornDown,
}

/// Result of activating a destination
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationOutcome {
    Scrolled { x: f64, y: f64 },
    NotPerformed(NavigationSkip),
}

impl NavigationOutcome {
    /// The triggering event's default action is suppressed only when we scrolled
    pub fn suppresses_default(&self) -> bool {
        matches!(self, Self::Scrolled { .. })
    }

    pub fn scroll_position(&self) -> Option<Point> {
        match *self {
            Self::Scrolled { x, y } => Some(Point::new(x, y)),
            Self::NotPerformed(_) => None,
        }
    }
}

/// Point in the target page's document coordinates, plus whether it needs the y flip
pub fn resolve_local_point(
    destination: &DestinationSpec,
    current: Point,
) -> Result<(Point, bool), NavigationSkip> {
    let coord = |position: usize, inherited: f64| destination.coord(position).unwrap_or(inherited);

    let resolved = match &destination.mode {
        DestinationMode::ExactPosition => (Point::new(coord(0, current.x), coord(1, current.y)), true),
        DestinationMode::FitPage | DestinationMode::FitPageBounded => (Point::ORIGIN, true),
        DestinationMode::FitWidth | DestinationMode::FitWidthBounded => {
            (Point::new(0.0, coord(0, current.y)), true)
        }
        DestinationMode::FitHeight | DestinationMode::FitHeightBounded => {
            (Point::new(coord(0, current.x), 0.0), true)
        }
        // Top-left corner of the rectangle, already top-down; missing corners are 0
        DestinationMode::FitRect => (Point::new(coord(0, 0.0), coord(3, 0.0)), false),
        DestinationMode::Unrecognized(name) => {
            return Err(NavigationSkip::UnrecognizedMode { mode: name.clone() })
        }
    };

    Ok(resolved)
}

fn singular(page: &Page) -> impl FnOnce(TransformError) -> NavigationSkip {
    let index = page.index();
    move |_| NavigationSkip::SingularTransform { page: index }
}

/// Compute the scroll offset that brings the destination to the viewport origin
///
/// `source` is the page the activation came from; `None` (or an unknown
/// index) means outside any page, and the current position is `(0, 0)`.
pub fn resolve_scroll_target(
    pages: &[Page],
    layout: &PageLayout,
    scroll: Point,
    source: Option<u32>,
    destination: &DestinationSpec,
) -> Result<Point, NavigationSkip> {
    let current = match source.and_then(|index| pages.get(index as usize).map(|page| (index, page))) {
        Some((index, page)) => {
            let local = layout.viewport_in_page(index as usize, scroll).unwrap_or(Point::ORIGIN);
            page.placeholder_to_document(local).map_err(singular(page))?
        }
        None => Point::ORIGIN,
    };

    let target_index = destination.page as usize;
    let (Some(target), Some(target_position)) =
        (pages.get(target_index), layout.viewport_in_page(target_index, scroll))
    else {
        return Err(NavigationSkip::TargetOutOfRange {
            page: destination.page,
            page_count: pages.len(),
        });
    };

    let (local, flip) = resolve_local_point(destination, current)?;
    let point = target.document_to_placeholder(local, flip).map_err(singular(target))?;

    let scroll_target =
        Point::new(scroll.x - target_position.x + point.x, scroll.y - target_position.y + point.y);
    if !(scroll_target.x.is_finite() && scroll_target.y.is_finite()) {
        return Err(NavigationSkip::NonFiniteTarget { page: destination.page });
    }

    Ok(scroll_target)
}
