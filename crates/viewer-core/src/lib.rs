//! Viewport virtualization and coordinate mapping for converted-document viewers
//!
//! A converted document is a vertical stack of page placeholders, each holding a
//! heavy content box. [`Viewer`] keeps only the content boxes near the viewport
//! materialized, applies zoom to placeholders immediately and to content lazily,
//! and turns link destinations expressed in page coordinates into scroll offsets.
//!
//! The host supplies the scroll container ([`Viewport`]), element mutation
//! ([`StyleSink`]) and the clock: it forwards events with the current
//! [`std::time::Instant`] and calls [`Viewer::tick`] from its loop.
//!
//! ```
//! use std::time::{Duration, Instant};
//! use doc_model::{ElementId, PageSource, Size};
//! use viewer_core::{MemoryViewport, RecordingStyleSink, Viewer, ViewerConfig};
//!
//! let sources = (0..4)
//!     .map(|index| PageSource {
//!         index,
//!         placeholder: ElementId(index * 2),
//!         content: ElementId(index * 2 + 1),
//!         matrix: [1.0, 0.0, 0.0, -1.0, 0.0, 1000.0],
//!         placeholder_size: Size::new(800.0, 1000.0),
//!         content_size: Size::new(800.0, 1000.0),
//!     })
//!     .collect();
//!
//! let mut viewer = Viewer::new(
//!     ViewerConfig::default(),
//!     sources,
//!     MemoryViewport::new(800.0),
//!     RecordingStyleSink::new(),
//! )?;
//!
//! let now = Instant::now();
//! viewer.viewport_mut().set_offset(0.0, 2100.0);
//! viewer.on_scroll(now);
//! viewer.tick(now + Duration::from_millis(130));
//!
//! assert_eq!(viewer.visible_pages(), vec![2]);
//! # Ok::<(), viewer_core::ViewerError>(())
//! ```

pub mod affine;
pub mod config;
pub mod error;
pub mod host;
pub mod layout;
pub mod link;
pub mod page;
pub mod viewer;
pub mod virtualize;
pub mod zoom;

pub use affine::{AffineTransform, Point, TransformError};
pub use config::{ConfigError, ViewerConfig};
pub use error::{ViewerError, ViewerResult};
pub use host::{MemoryViewport, RecordingStyleSink, StyleOp, StyleSink, Viewport};
pub use layout::PageLayout;
pub use link::{resolve_local_point, resolve_scroll_target, NavigationOutcome, NavigationSkip};
pub use page::{Page, PageTransforms, RATIO_EPSILON};
pub use viewer::{RenderTrigger, Viewer};
pub use virtualize::{RenderSummary, ViewportBounds, VisibilityPolicy};
pub use zoom::{ZoomCommand, DEFAULT_SCALE_STEP};
