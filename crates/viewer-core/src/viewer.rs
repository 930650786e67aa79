//! The viewer context: owns the pages, the host capabilities and the render timer
//!
//! One `Viewer` per document view. The host forwards scroll, resize, zoom and
//! link activations, and calls [`Viewer::tick`] from its event loop so the
//! debounced visibility pass can run.

use std::ops::RangeInclusive;
use std::time::Instant;

use doc_model::{decode_destination, DestinationSpec, PageFeed, PageSource};
use viewer_scheduler::{DebounceTimer, TimerHandle};

use crate::config::ViewerConfig;
use crate::error::{ViewerError, ViewerResult};
use crate::host::{StyleSink, Viewport};
use crate::layout::PageLayout;
use crate::link::{resolve_scroll_target, NavigationOutcome, NavigationSkip};
use crate::page::Page;
use crate::virtualize::{positional_pass, windowed_pass, RenderSummary, ViewportBounds, VisibilityPolicy};
use crate::zoom::ZoomCommand;

/// Why a visibility pass was requested; the latest trigger wins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTrigger {
    Scroll,
    Resize,
    Rescale,
    Navigation,
}

pub struct Viewer<V, S> {
    config: ViewerConfig,
    pages: Vec<Page>,
    layout: PageLayout,
    timer: DebounceTimer<RenderTrigger>,
    armed: Option<TimerHandle>,
    window: Option<RangeInclusive<usize>>,
    viewport: V,
    styles: S,
    live: bool,
}

/// Order sources by index and require exactly `0..N`
fn dense_pages(mut sources: Vec<PageSource>) -> ViewerResult<Vec<Page>> {
    sources.sort_by_key(|source| source.index);

    for (position, source) in sources.iter().enumerate() {
        if position > 0 && sources[position - 1].index == source.index {
            return Err(ViewerError::DuplicatePage(source.index));
        }
        if source.index as usize != position {
            return Err(ViewerError::MissingPage { missing: position as u32, page_count: sources.len() });
        }
    }

    Ok(sources.iter().map(Page::new).collect())
}

impl<V: Viewport, S: StyleSink> Viewer<V, S> {
    /// Index the pages and run the first visibility pass
    ///
    /// Content boxes are expected to start hidden.
    pub fn new(
        config: ViewerConfig,
        sources: Vec<PageSource>,
        viewport: V,
        styles: S,
    ) -> ViewerResult<Self> {
        config.validate()?;

        let pages = dense_pages(sources)?;
        let layout = PageLayout::stack(&pages, config.page_gap);
        let timer = DebounceTimer::new(config.render_timeout());

        tracing::debug!(pages = pages.len(), policy = ?config.policy, "viewer initialized");

        let mut viewer = Self {
            config,
            pages,
            layout,
            timer,
            armed: None,
            window: None,
            viewport,
            styles,
            live: true,
        };
        viewer.render();
        Ok(viewer)
    }

    /// Decode a collaborator feed using the configured page-number radix
    pub fn from_feed(config: ViewerConfig, feed: PageFeed, viewport: V, styles: S) -> ViewerResult<Self> {
        let sources = feed.into_sources(config.page_number_radix)?;
        Self::new(config, sources, viewport, styles)
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, index: u32) -> Option<&Page> {
        self.pages.get(index as usize)
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    pub fn styles(&self) -> &S {
        &self.styles
    }

    pub fn styles_mut(&mut self) -> &mut S {
        &mut self.styles
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Indices of pages whose heavy content is currently shown
    pub fn visible_pages(&self) -> Vec<u32> {
        self.pages.iter().filter(|page| page.is_content_visible()).map(Page::index).collect()
    }

    pub fn pending_render(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    pub fn on_scroll(&mut self, now: Instant) {
        self.schedule_render(now, RenderTrigger::Scroll);
    }

    pub fn on_resize(&mut self, now: Instant) {
        self.schedule_render(now, RenderTrigger::Resize);
    }

    fn schedule_render(&mut self, now: Instant, trigger: RenderTrigger) {
        self.armed = Some(self.timer.schedule(now, trigger));
    }

    /// Run the deferred pass if its quiet interval has elapsed
    pub fn tick(&mut self, now: Instant) -> Option<RenderSummary> {
        let trigger = self.timer.poll(now)?;
        self.armed = None;

        if !self.live {
            tracing::debug!(?trigger, "render timer fired after teardown, ignoring");
            return None;
        }

        tracing::trace!(?trigger, "deferred render");
        Some(self.render())
    }

    /// Show pages in or near the viewport and hide the rest
    pub fn render(&mut self) -> RenderSummary {
        if !self.live {
            return RenderSummary::default();
        }

        let bounds = ViewportBounds {
            scroll_top: self.viewport.scroll_offset().y,
            visible_height: self.viewport.visible_height(),
        };

        let summary = match self.config.policy {
            VisibilityPolicy::Positional => {
                positional_pass(&mut self.pages, &self.layout, bounds, &mut self.styles)
            }
            VisibilityPolicy::Windowed => windowed_pass(
                &mut self.pages,
                &self.layout,
                bounds,
                self.window.take(),
                &mut self.styles,
            ),
        };

        self.window = summary.window.clone();

        tracing::debug!(
            shown = summary.shown,
            hidden = summary.hidden,
            scroll_top = bounds.scroll_top,
            "visibility pass"
        );

        summary
    }

    /// Hide every page's heavy content. Returns how many were visible.
    pub fn hide_pages(&mut self) -> usize {
        self.window = None;
        let mut hidden = 0;
        for page in &mut self.pages {
            if page.hide(&mut self.styles) {
                hidden += 1;
            }
        }
        hidden
    }

    /// Apply a zoom ratio to every page
    ///
    /// Placeholders are resized before this returns; heavy content catches up
    /// on the next deferred pass.
    pub fn rescale(&mut self, ratio: f64, is_relative: bool, now: Instant) {
        if !self.live {
            return;
        }
        if ratio < 0.0 || !ratio.is_finite() {
            tracing::warn!(ratio, is_relative, "ignoring unusable zoom ratio");
            return;
        }

        for page in &mut self.pages {
            if !page.rescale(ratio, is_relative, &mut self.styles) {
                page.hide(&mut self.styles);
            }
        }

        // Every page is hidden now
        self.window = None;
        self.layout = PageLayout::stack(&self.pages, self.config.page_gap);

        tracing::debug!(ratio, is_relative, "rescaled pages");
        self.schedule_render(now, RenderTrigger::Rescale);
    }

    pub fn zoom(&mut self, command: ZoomCommand, now: Instant) {
        let (ratio, is_relative) = command.rescale_args(self.config.scale_step);
        self.rescale(ratio, is_relative, now);
    }

    /// Scroll to a destination, issuing exactly one `scroll_to` on success
    pub fn navigate(
        &mut self,
        source: Option<u32>,
        destination: &DestinationSpec,
        now: Instant,
    ) -> NavigationOutcome {
        if !self.live {
            return NavigationOutcome::NotPerformed(NavigationSkip::TornDown);
        }

        let scroll = self.viewport.scroll_offset();
        match resolve_scroll_target(&self.pages, &self.layout, scroll, source, destination) {
            Ok(target) => {
                self.viewport.scroll_to(target.x, target.y);
                self.schedule_render(now, RenderTrigger::Navigation);
                NavigationOutcome::Scrolled { x: target.x, y: target.y }
            }
            Err(skip) => {
                tracing::debug!(?skip, page = destination.page, "navigation not performed");
                NavigationOutcome::NotPerformed(skip)
            }
        }
    }

    /// Decode a raw destination payload and navigate to it
    pub fn activate(&mut self, source: Option<u32>, raw: &str, now: Instant) -> NavigationOutcome {
        match decode_destination(raw) {
            Ok(destination) => self.navigate(source, &destination, now),
            Err(error) => {
                tracing::debug!(%error, "malformed destination payload");
                NavigationOutcome::NotPerformed(NavigationSkip::MalformedDestination {
                    message: error.to_string(),
                })
            }
        }
    }

    /// Drop the page collection and cancel any pending render
    pub fn teardown(&mut self) {
        if let Some(handle) = self.armed.take() {
            if self.timer.cancel_handle(&handle) {
                tracing::trace!(timer = handle.id(), "pending render cancelled");
            }
        }
        self.live = false;
        self.pages.clear();
        self.layout = PageLayout::default();
        self.window = None;
        tracing::debug!("viewer torn down");
    }

    pub fn into_parts(self) -> (V, S) {
        (self.viewport, self.styles)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::host::{MemoryViewport, RecordingStyleSink, StyleOp};
    use doc_model::{DestinationMode, ElementId, Size};

    const PAGE_HEIGHT: f64 = 1000.0;

    fn source(index: u32) -> PageSource {
        PageSource {
            index,
            placeholder: ElementId(index * 2),
            content: ElementId(index * 2 + 1),
            matrix: [1.0, 0.0, 0.0, -1.0, 0.0, PAGE_HEIGHT],
            placeholder_size: Size::new(800.0, PAGE_HEIGHT),
            content_size: Size::new(800.0, PAGE_HEIGHT),
        }
    }

    fn viewer_with(
        config: ViewerConfig,
        count: u32,
    ) -> Viewer<MemoryViewport, RecordingStyleSink> {
        let sources = (0..count).map(source).collect();
        Viewer::new(config, sources, MemoryViewport::new(800.0), RecordingStyleSink::new())
            .expect("viewer should build")
    }

    fn viewer(count: u32) -> Viewer<MemoryViewport, RecordingStyleSink> {
        viewer_with(ViewerConfig::default(), count)
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn initial_pass_shows_first_visible_pages() {
        let viewer = viewer(10);
        assert_eq!(viewer.visible_pages(), vec![0]);
        assert!(viewer.pending_render().is_none());
    }

    #[test]
    fn feed_must_be_dense_and_unique() {
        let duplicate = vec![source(0), source(1), source(1)];
        let result = Viewer::new(
            ViewerConfig::default(),
            duplicate,
            MemoryViewport::new(800.0),
            RecordingStyleSink::new(),
        );
        assert!(matches!(result, Err(ViewerError::DuplicatePage(1))));

        let gap = vec![source(0), source(2)];
        let result =
            Viewer::new(ViewerConfig::default(), gap, MemoryViewport::new(800.0), RecordingStyleSink::new());
        assert!(matches!(result, Err(ViewerError::MissingPage { missing: 1, page_count: 2 })));
    }

    #[test]
    fn sources_in_any_order_are_indexed() {
        let sources = vec![source(2), source(0), source(1)];
        let viewer =
            Viewer::new(ViewerConfig::default(), sources, MemoryViewport::new(800.0), RecordingStyleSink::new())
                .unwrap();
        let indices: Vec<u32> = viewer.pages().iter().map(Page::index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn scroll_burst_renders_once_after_quiet_interval() {
        let mut viewer = viewer(10);
        let start = Instant::now();
        let mut passes = 0;

        for step in 0..20u64 {
            let now = start + ms(step * 20);
            viewer.viewport_mut().set_offset(0.0, step as f64 * 200.0);
            viewer.on_scroll(now);
            if viewer.tick(now).is_some() {
                passes += 1;
            }
        }
        assert_eq!(passes, 0);

        let last = start + ms(19 * 20);
        assert!(viewer.tick(last + ms(129)).is_none());
        assert!(viewer.tick(last + ms(130)).is_some());
        assert!(viewer.tick(last + ms(500)).is_none());

        // 3800px down: pages 3 and 4 intersect the viewport
        assert_eq!(viewer.visible_pages(), vec![3, 4]);
    }

    #[test]
    fn second_render_is_a_noop() {
        let mut viewer = viewer(10);
        viewer.viewport_mut().set_offset(0.0, 2500.0);
        viewer.render();
        let writes = viewer.styles().len();

        let summary = viewer.render();
        assert!(!summary.changed());
        assert_eq!(viewer.styles().len(), writes);
    }

    #[test]
    fn rescale_updates_placeholders_synchronously() {
        let mut viewer = viewer(3);
        viewer.styles_mut().clear();
        let now = Instant::now();

        viewer.rescale(2.0, false, now);

        for page in viewer.pages() {
            assert_eq!(page.placeholder_size(), Size::new(1600.0, 2000.0));
            assert!(!page.is_content_visible());
            assert_eq!(page.applied_ratio(), 1.0);
        }
        assert_eq!(viewer.layout().origin(2).map(|origin| origin.y), Some(4000.0));
        assert!(viewer.styles().ops().iter().all(|op| !matches!(op, StyleOp::Scale { .. })));
        assert_eq!(viewer.pending_render(), Some(now + ms(130)));

        viewer.tick(now + ms(130));
        assert_eq!(viewer.visible_pages(), vec![0]);
        assert_eq!(viewer.styles().scale_writes(ElementId(1)), 1);
        assert_eq!(viewer.page(0).map(Page::applied_ratio), Some(2.0));
    }

    #[test]
    fn zoom_commands_use_scale_step() {
        let mut viewer = viewer(2);
        let now = Instant::now();

        viewer.zoom(ZoomCommand::Out, now);
        viewer.zoom(ZoomCommand::Out, now);
        let ratio = viewer.page(0).map(Page::requested_ratio).unwrap();
        assert!((ratio - 0.81).abs() < 1e-9);

        viewer.zoom(ZoomCommand::Reset, now);
        assert_eq!(viewer.page(0).map(Page::requested_ratio), Some(1.0));
    }

    #[test]
    fn fit_page_navigation_scrolls_once_and_suppresses_default() {
        let mut viewer = viewer(10);
        let now = Instant::now();

        let outcome = viewer.navigate(None, &DestinationSpec::new(3, DestinationMode::FitPage), now);

        assert_eq!(outcome, NavigationOutcome::Scrolled { x: 0.0, y: 3000.0 });
        assert!(outcome.suppresses_default());
        assert_eq!(viewer.viewport().scroll_calls().len(), 1);
        assert!(viewer.pending_render().is_some());

        viewer.tick(now + ms(130));
        // Page 2's bottom edge touches the viewport top, which still counts
        assert_eq!(viewer.visible_pages(), vec![2, 3]);
    }

    #[test]
    fn out_of_range_navigation_does_not_scroll() {
        let mut viewer = viewer(10);

        let outcome = viewer.activate(Some(0), r#"[9999, "Fit"]"#, Instant::now());

        assert_eq!(
            outcome,
            NavigationOutcome::NotPerformed(NavigationSkip::TargetOutOfRange { page: 9999, page_count: 10 })
        );
        assert!(!outcome.suppresses_default());
        assert!(viewer.viewport().scroll_calls().is_empty());
        assert!(viewer.pending_render().is_none());
    }

    #[test]
    fn malformed_and_unknown_destinations_do_not_scroll() {
        let mut viewer = viewer(4);
        let now = Instant::now();

        assert!(matches!(
            viewer.activate(None, "{", now),
            NavigationOutcome::NotPerformed(NavigationSkip::MalformedDestination { .. })
        ));
        assert!(matches!(
            viewer.activate(None, r#"[1, "Zoom"]"#, now),
            NavigationOutcome::NotPerformed(NavigationSkip::UnrecognizedMode { .. })
        ));
        assert!(viewer.viewport().scroll_calls().is_empty());
    }

    #[test]
    fn navigation_accounts_for_zoom() {
        let mut viewer = viewer(5);
        let now = Instant::now();
        viewer.rescale(2.0, false, now);

        let outcome = viewer.activate(None, r#"[2, "XYZ", 100, 250, null]"#, now);

        // Page 2 starts at 4000 after zoom; point (100, 250) lands at 2x
        assert_eq!(outcome, NavigationOutcome::Scrolled { x: 200.0, y: 4500.0 });
    }

    #[test]
    fn timer_after_teardown_is_ignored() {
        let mut viewer = viewer(10);
        let now = Instant::now();

        viewer.on_scroll(now);
        assert!(viewer.pending_render().is_some());
        viewer.teardown();

        assert!(!viewer.is_live());
        assert!(viewer.pending_render().is_none());
        assert!(viewer.tick(now + ms(1000)).is_none());
        assert!(viewer.pages().is_empty());
        assert_eq!(
            viewer.navigate(None, &DestinationSpec::new(0, DestinationMode::FitPage), now),
            NavigationOutcome::NotPerformed(NavigationSkip::TornDown)
        );
        assert!(!viewer.render().changed());
    }

    #[test]
    fn degenerate_page_does_not_poison_navigation() {
        let mut flat = source(1);
        flat.placeholder_size = Size::new(0.0, 0.0);
        let sources = vec![source(0), flat, source(2)];
        let mut viewer =
            Viewer::new(ViewerConfig::default(), sources, MemoryViewport::new(800.0), RecordingStyleSink::new())
                .unwrap();
        let now = Instant::now();

        assert_eq!(viewer.page(1).map(Page::default_ratio), Some(1.0));

        let from_flat = viewer.activate(Some(1), r#"[2, "XYZ", null, null, null]"#, now);
        let into_flat = viewer.activate(Some(0), r#"[1, "FitH", 10]"#, now);
        let healthy = viewer.activate(Some(0), r#"[2, "Fit"]"#, now);

        for outcome in [from_flat, into_flat, healthy] {
            let position = outcome.scroll_position().expect("navigation should happen");
            assert!(position.x.is_finite() && position.y.is_finite(), "{outcome:?}");
        }
        assert!(viewer
            .viewport()
            .scroll_calls()
            .iter()
            .all(|call| call.x.is_finite() && call.y.is_finite()));
        assert_eq!(viewer.viewport().scroll_calls().last().map(|call| call.y), Some(1000.0));
    }

    #[test]
    fn unusable_zoom_ratios_leave_viewer_untouched() {
        let mut viewer = viewer(3);
        viewer.styles_mut().clear();
        let now = Instant::now();

        for ratio in [-2.0, f64::NAN, f64::INFINITY] {
            viewer.rescale(ratio, false, now);
            viewer.rescale(ratio, true, now);
        }

        assert!(viewer.styles().is_empty());
        assert!(viewer.pending_render().is_none());
        assert_eq!(viewer.visible_pages(), vec![0]);
        assert_eq!(viewer.layout().origin(2).map(|origin| origin.y), Some(2000.0));
        assert_eq!(
            viewer.navigate(None, &DestinationSpec::new(2, DestinationMode::FitPage), now),
            NavigationOutcome::Scrolled { x: 0.0, y: 2000.0 }
        );
    }

    #[test]
    fn windowed_policy_keeps_buffer_pages() {
        let mut viewer = viewer_with(ViewerConfig::default().with_policy(VisibilityPolicy::Windowed), 10);
        assert_eq!(viewer.visible_pages(), vec![0, 1]);

        viewer.viewport_mut().set_offset(0.0, 4100.0);
        let summary = viewer.render();

        assert_eq!(summary.window, Some(3..=5));
        assert_eq!(viewer.visible_pages(), vec![3, 4, 5]);
    }

    #[test]
    fn hide_pages_hides_everything() {
        let mut viewer = viewer(10);
        viewer.viewport_mut().set_offset(0.0, 500.0);
        viewer.render();

        assert_eq!(viewer.hide_pages(), 2);
        assert!(viewer.visible_pages().is_empty());
    }

    #[test]
    fn borrowed_hosts_are_accepted() {
        let mut viewport = MemoryViewport::new(800.0);
        let mut styles = RecordingStyleSink::new();

        {
            let mut viewer =
                Viewer::new(ViewerConfig::default(), vec![source(0), source(1)], &mut viewport, &mut styles)
                    .unwrap();
            viewer.navigate(None, &DestinationSpec::new(1, DestinationMode::FitPage), Instant::now());
        }

        assert_eq!(viewport.scroll_calls().len(), 1);
        assert!(!styles.is_empty());
    }

    #[test]
    fn from_feed_decodes_hex_page_numbers() {
        let entries = (0..12u32)
            .map(|index| doc_model::PageFeedEntry {
                page_no: format!("{index:x}"),
                placeholder: ElementId(index * 2),
                content: ElementId(index * 2 + 1),
                ctm: [1.0, 0.0, 0.0, -1.0, 0.0, PAGE_HEIGHT],
                placeholder_size: Size::new(800.0, PAGE_HEIGHT),
                content_size: Size::new(800.0, PAGE_HEIGHT),
            })
            .collect();

        let viewer = Viewer::from_feed(
            ViewerConfig::default(),
            PageFeed { pages: entries },
            MemoryViewport::new(800.0),
            RecordingStyleSink::new(),
        )
        .unwrap();

        assert_eq!(viewer.pages().len(), 12);
        assert_eq!(viewer.page(11).map(Page::index), Some(11));
    }
}
