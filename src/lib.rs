//! Pageflow: measurement-driven pagination for paged rich-text editors
//!
//! This crate keeps a document split into fixed-height pages while it is
//! edited:
//! - Overflow is cut at the largest prefix that fits, snapped back to a line
//!   or word boundary, and cascaded into the following pages
//! - Blank pages merge away on backspace
//! - Resize and font changes relayout every page front to back
//! - Heights come from a host-supplied [`MeasurementOracle`]
//!
//! [`Paginator`] ties the pieces together for a host that forwards
//! [`SurfaceEvent`]s; the lower-level [`ReflowController`] can be driven
//! directly.

pub mod caret;
pub mod content;
pub mod error;
pub mod layout;
pub mod pages;
pub mod reflow;
pub mod split;
pub mod wasm;

// Re-export WASM types for direct use
pub use wasm::WasmPaginator;

// Re-export primary types
pub use caret::{CaretAnchor, CaretPlacement, CaretPosition, EditingSurface, NullSurface};
pub use content::{DocumentStats, Fragment, Token};
pub use error::{MeasureError, ReflowError};
pub use layout::{
    LayoutContext, LayoutProvider, Margins, MeasurementOracle, MetricsOracle, PageDimensions,
    StyleContext,
};
pub use pages::{Page, PageId, PageSequence, PageSnapshot};
pub use reflow::{
    Clock, ManualClock, ReflowConfig, ReflowController, ReflowOutcome, ReflowState, SystemClock,
};
pub use split::{ContentSplitter, SplitResult};

use serde::{Deserialize, Serialize};

/// Notifications from the host's editing surface and container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SurfaceEvent {
    #[serde(rename_all = "camelCase")]
    ContentChanged { page_id: PageId, content: String },
    /// Backspace pressed at offset 0 of a page
    #[serde(rename_all = "camelCase")]
    BackspaceAtStart { page_id: PageId },
    #[serde(rename_all = "camelCase")]
    FocusAcquired { page_id: PageId },
    /// Geometry is re-read from the layout provider
    ContainerResized,
    #[serde(rename_all = "camelCase")]
    FontSizeChanged { font_size: f32 },
}

/// A paginated document bound to its oracle and editing surface
pub struct Paginator<O: MeasurementOracle, S: EditingSurface> {
    pages: PageSequence,
    controller: ReflowController,
    oracle: O,
    surface: S,
    provider: Box<dyn LayoutProvider>,
    /// Font size from the last accepted font change; the provider only
    /// supplies geometry after that
    font_size: Option<f32>,
}

impl<O: MeasurementOracle, S: EditingSurface> Paginator<O, S> {
    /// Paginate `initial` with a default controller
    pub fn new(
        initial: &str,
        oracle: O,
        surface: S,
        provider: impl LayoutProvider + 'static,
    ) -> Self {
        let controller = ReflowController::new(provider.layout_context());
        Self::with_controller(initial, oracle, surface, provider, controller)
    }

    /// Paginate `initial` with a preconfigured controller
    pub fn with_controller(
        initial: &str,
        oracle: O,
        surface: S,
        provider: impl LayoutProvider + 'static,
        controller: ReflowController,
    ) -> Self {
        let mut paginator = Self {
            pages: PageSequence::new(initial),
            controller,
            oracle,
            surface,
            provider: Box::new(provider),
            font_size: None,
        };
        let first = paginator.pages.first().id();
        paginator
            .surface
            .set_content(first, &paginator.pages.first().markup());
        paginator.relayout();
        paginator
    }

    /// Dispatch one surface event and replay the result onto the surface.
    ///
    /// Never fails: rejected or failed operations are logged and returned
    /// as warnings with the pages untouched.
    pub fn handle(&mut self, event: SurfaceEvent) -> ReflowOutcome {
        log::debug!("surface event {:?}", event);
        let pages = &mut self.pages;
        let oracle = &self.oracle;
        let (result, echo) = match event {
            SurfaceEvent::ContentChanged { page_id, content } => (
                self.controller
                    .on_content_changed(pages, oracle, page_id, &content),
                Some(page_id),
            ),
            SurfaceEvent::BackspaceAtStart { page_id } => (
                self.controller.on_backspace_at_page_start(pages, page_id),
                None,
            ),
            SurfaceEvent::FocusAcquired { page_id } => {
                (self.controller.on_focus_acquired(pages, page_id), None)
            }
            SurfaceEvent::ContainerResized => {
                let mut layout = self.provider.layout_context();
                if let Some(font_size) = self.font_size {
                    layout = layout.with_font_size(font_size);
                }
                (
                    self.controller.on_container_resize(pages, oracle, layout),
                    None,
                )
            }
            SurfaceEvent::FontSizeChanged { font_size } => {
                let result = self
                    .controller
                    .on_font_size_change(pages, oracle, font_size);
                if font_size.is_finite() && font_size > 0.0 {
                    self.font_size = Some(font_size);
                }
                (result, None)
            }
        };

        let mut outcome = self.publish(result, echo);
        // a queued relayout runs as soon as the controller is idle again
        outcome.absorb(self.poll());
        outcome
    }

    /// Run a queued relayout once the settle delay has passed, or drop
    /// blank pages in the middle of the document
    pub fn poll(&mut self) -> ReflowOutcome {
        let result = self.controller.poll(&mut self.pages, &self.oracle);
        self.publish(result, None)
    }

    /// Relayout every page against the provider's current geometry
    pub fn relayout(&mut self) -> ReflowOutcome {
        self.handle(SurfaceEvent::ContainerResized)
    }

    pub fn cleanup_empty_pages(&mut self) -> ReflowOutcome {
        let result = self.controller.cleanup_empty_pages(&mut self.pages);
        self.publish(result, None)
    }

    pub fn insert_page_after(&mut self, after: PageId, content: &str) -> ReflowOutcome {
        let result =
            self.controller
                .insert_page_after(&mut self.pages, &self.oracle, after, content);
        self.publish(result, None)
    }

    pub fn remove_page(&mut self, page_id: PageId) -> ReflowOutcome {
        let result = self.controller.remove_page(&mut self.pages, page_id);
        self.publish(result, None)
    }

    pub fn pages(&self) -> &PageSequence {
        &self.pages
    }

    pub fn snapshot(&self) -> Vec<PageSnapshot> {
        self.pages.snapshot()
    }

    pub fn active_page_id(&self) -> PageId {
        self.pages.active_page_id()
    }

    /// All pages joined back into one document
    pub fn document_content(&self) -> String {
        self.pages.document_content()
    }

    pub fn stats(&self) -> DocumentStats {
        self.pages.stats()
    }

    pub fn layout(&self) -> &LayoutContext {
        self.controller.layout()
    }

    /// Line-number gutter length for the current layout
    pub fn max_lines(&self) -> usize {
        self.controller.layout().max_lines()
    }

    pub fn state(&self) -> ReflowState {
        self.controller.state()
    }

    pub fn controller(&self) -> &ReflowController {
        &self.controller
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Turn an operation result into an outcome and push it to the surface.
    /// `echo` is the page whose surface already shows the new content.
    fn publish(
        &mut self,
        result: Result<ReflowOutcome, ReflowError>,
        echo: Option<PageId>,
    ) -> ReflowOutcome {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                log::warn!("{}", err);
                return ReflowOutcome {
                    warnings: vec![err],
                    ..ReflowOutcome::default()
                };
            }
        };

        for &id in &outcome.removed {
            self.surface.page_removed(id);
        }
        let skip = echo.filter(|_| !outcome.is_structural());
        for &id in outcome.created.iter().chain(outcome.changed.iter()) {
            if Some(id) == skip {
                continue;
            }
            if let Some(page) = self.pages.get(id) {
                self.surface.set_content(id, &page.markup());
            }
        }
        if outcome.caret.is_some() {
            self.controller.caret().apply(&mut self.surface);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct RecordingSurface {
        contents: Vec<(PageId, String)>,
        focus: Vec<(PageId, CaretPosition)>,
        removed: Vec<PageId>,
    }

    impl EditingSurface for RecordingSurface {
        fn set_content(&mut self, page_id: PageId, content: &str) {
            self.contents.push((page_id, content.to_string()));
        }

        fn set_focus(&mut self, page_id: PageId, position: CaretPosition) {
            self.focus.push((page_id, position));
        }

        fn page_removed(&mut self, page_id: PageId) {
            self.removed.push(page_id);
        }
    }

    fn lines(count: usize) -> String {
        (1..=count)
            .map(|i| format!("Line {}", i))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn paginator(initial: &str) -> Paginator<MetricsOracle, RecordingSurface> {
        let controller = ReflowController::new(LayoutContext::a4())
            .with_config(ReflowConfig { settle_delay_ms: 0 });
        Paginator::with_controller(
            initial,
            MetricsOracle::new(),
            RecordingSurface::default(),
            LayoutContext::a4(),
            controller,
        )
    }

    #[test]
    fn test_initial_document_is_paginated() {
        let paginator = paginator(&lines(100));
        assert_eq!(paginator.pages().len(), 3);
        assert_eq!(paginator.document_content(), lines(100));
        assert_eq!(paginator.max_lines(), 46);
        // first page pushed on creation, then again after the split
        assert_eq!(paginator.surface().contents.len(), 4);
    }

    #[test]
    fn test_typing_overflow_moves_focus() {
        let mut paginator = paginator("");
        let first = paginator.active_page_id();

        let outcome = paginator.handle(SurfaceEvent::ContentChanged {
            page_id: first,
            content: lines(47),
        });
        let second = paginator.pages().last().id();
        assert_eq!(outcome.created.as_slice(), &[second]);
        assert_eq!(
            paginator.surface().focus.last(),
            Some(&(second, CaretPosition::Offset(0)))
        );
        assert!(paginator
            .surface()
            .contents
            .contains(&(second, "Line 47".to_string())));
    }

    #[test]
    fn test_in_place_edit_is_not_echoed() {
        let mut paginator = paginator("a");
        let first = paginator.active_page_id();
        let pushed = paginator.surface().contents.len();

        paginator.handle(SurfaceEvent::ContentChanged {
            page_id: first,
            content: "ab".to_string(),
        });
        assert_eq!(paginator.surface().contents.len(), pushed);
        assert_eq!(paginator.document_content(), "ab");
    }

    #[test]
    fn test_errors_become_warnings() {
        let mut paginator = paginator("a");
        let outcome = paginator.handle(SurfaceEvent::BackspaceAtStart {
            page_id: PageId(404),
        });
        assert!(matches!(
            outcome.warnings.as_slice(),
            [ReflowError::InvalidOperation { .. }]
        ));
    }

    #[test]
    fn test_backspace_merges_and_notifies_surface() {
        let mut paginator = paginator("Hello");
        let first = paginator.active_page_id();
        paginator.insert_page_after(first, "");
        let second = paginator.active_page_id();

        paginator.handle(SurfaceEvent::BackspaceAtStart { page_id: second });
        assert_eq!(paginator.surface().removed, vec![second]);
        assert_eq!(
            paginator.surface().focus.last(),
            Some(&(first, CaretPosition::Offset(5)))
        );
    }

    #[test]
    fn test_font_size_event() {
        let mut paginator = paginator(&lines(40));
        paginator.handle(SurfaceEvent::FontSizeChanged { font_size: 20.0 });
        assert_eq!(paginator.pages().len(), 2);
        assert_eq!(paginator.max_lines(), 38);
    }

    #[test]
    fn test_resize_keeps_font_size() {
        let mut paginator = paginator(&lines(40));
        paginator.handle(SurfaceEvent::FontSizeChanged { font_size: 20.0 });
        paginator.handle(SurfaceEvent::ContainerResized);
        assert_eq!(paginator.layout().font_size, 20.0);
        assert_eq!(paginator.pages().len(), 2);

        // rejected sizes do not stick
        paginator.handle(SurfaceEvent::FontSizeChanged { font_size: -3.0 });
        paginator.relayout();
        assert_eq!(paginator.layout().font_size, 20.0);
    }

    #[test]
    fn test_blank_interior_page_is_dropped_after_event() {
        let mut paginator = paginator(&lines(100));
        let ids = paginator.pages().ids();

        let outcome = paginator.handle(SurfaceEvent::ContentChanged {
            page_id: ids[1],
            content: String::new(),
        });
        assert_eq!(outcome.removed.as_slice(), &[ids[1]]);
        assert_eq!(paginator.pages().ids(), vec![ids[0], ids[2]]);
        assert_eq!(paginator.surface().removed, vec![ids[1]]);
    }

    #[test]
    fn test_event_json() {
        let event: SurfaceEvent =
            serde_json::from_str(r#"{"type":"contentChanged","pageId":2,"content":"x"}"#).unwrap();
        assert_eq!(
            event,
            SurfaceEvent::ContentChanged {
                page_id: PageId(2),
                content: "x".to_string()
            }
        );
        let event: SurfaceEvent = serde_json::from_str(r#"{"type":"containerResized"}"#).unwrap();
        assert_eq!(event, SurfaceEvent::ContainerResized);
    }
}
