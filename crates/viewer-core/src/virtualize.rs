//! Visibility passes: decide which pages keep their heavy content materialized
//!
//! Two policies are available:
//!
//! - [`VisibilityPolicy::Positional`] tests every page on every pass. O(N),
//!   correct for any scroll distance.
//! - [`VisibilityPolicy::Windowed`] scans forward to the first visible page,
//!   extends to the last one, and keeps one extra page on each side shown.
//!   Pages are only hidden if they belonged to the previously shown window,
//!   so it relies on everything outside that window already being hidden.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::host::StyleSink;
use crate::layout::PageLayout;
use crate::page::Page;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisibilityPolicy {
    #[default]
    Positional,
    Windowed,
}

impl VisibilityPolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "positional" => Some(Self::Positional),
            "windowed" => Some(Self::Windowed),
            _ => None,
        }
    }
}

/// Outcome of one pass, counting only pages whose state changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub shown: usize,
    pub hidden: usize,
    /// Pages kept materialized by a windowed pass, buffer included
    pub window: Option<RangeInclusive<usize>>,
}

impl RenderSummary {
    pub fn changed(&self) -> bool {
        self.shown > 0 || self.hidden > 0
    }
}

/// Current scroll geometry, read once per pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportBounds {
    pub scroll_top: f64,
    pub visible_height: f64,
}

fn is_page_visible(pages: &[Page], layout: &PageLayout, index: usize, bounds: ViewportBounds) -> bool {
    match layout.viewport_top(index, bounds.scroll_top) {
        Some(top) => pages[index].is_visible(top, bounds.visible_height),
        None => false,
    }
}

pub fn positional_pass<S: StyleSink + ?Sized>(
    pages: &mut [Page],
    layout: &PageLayout,
    bounds: ViewportBounds,
    styles: &mut S,
) -> RenderSummary {
    let mut summary = RenderSummary::default();

    for index in 0..pages.len() {
        if is_page_visible(pages, layout, index, bounds) {
            if pages[index].show(styles) {
                summary.shown += 1;
            }
        } else if pages[index].hide(styles) {
            summary.hidden += 1;
        }
    }

    summary
}

/// First and last visible page, if any page intersects the viewport
pub fn visible_window(
    pages: &[Page],
    layout: &PageLayout,
    bounds: ViewportBounds,
) -> Option<RangeInclusive<usize>> {
    let count = pages.len();

    let mut first = 0;
    while first < count {
        let top = layout.viewport_top(first, bounds.scroll_top)?;
        if top + pages[first].placeholder_size().height >= 0.0 {
            break;
        }
        first += 1;
    }

    if first == count || !is_page_visible(pages, layout, first, bounds) {
        return None;
    }

    let mut last = first;
    while last + 1 < count && is_page_visible(pages, layout, last + 1, bounds) {
        last += 1;
    }

    Some(first..=last)
}

pub fn windowed_pass<S: StyleSink + ?Sized>(
    pages: &mut [Page],
    layout: &PageLayout,
    bounds: ViewportBounds,
    previous: Option<RangeInclusive<usize>>,
    styles: &mut S,
) -> RenderSummary {
    let mut summary = RenderSummary::default();

    let window = visible_window(pages, layout, bounds).map(|visible| {
        let start = visible.start().saturating_sub(1);
        let end = (*visible.end() + 1).min(pages.len() - 1);
        start..=end
    });

    if let Some(previous) = previous {
        for index in previous {
            let kept = window.as_ref().is_some_and(|window| window.contains(&index));
            if !kept && index < pages.len() && pages[index].hide(styles) {
                summary.hidden += 1;
            }
        }
    }

    if let Some(window) = &window {
        for index in window.clone() {
            if pages[index].show(styles) {
                summary.shown += 1;
            }
        }
    }

    summary.window = window;
    summary
}
