//! The reflow state machine
//!
//! [`ReflowController`] is the only writer of a [`PageSequence`]. Every
//! operation runs against a draft copy of the sequence and commits it in one
//! step, so readers never see a half-split page list and a failed operation
//! leaves the sequence exactly as it was.
//!
//! ```text
//! Idle -> Checking -> Splitting -> Settling { until } -> Idle
//!            \____________________________________/
//!                      (content fits: back to Idle)
//! ```
//!
//! After a structural change the controller settles for a short delay and
//! rejects content events in the meantime, so the echo of its own writes to
//! the editing surface cannot trigger another cycle.

mod clock;
mod outcome;

pub use clock::{Clock, ManualClock, SystemClock};
pub use outcome::ReflowOutcome;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::caret::{CaretAnchor, CaretPosition};
use crate::content::Fragment;
use crate::error::ReflowError;
use crate::layout::{LayoutContext, MeasurementOracle};
use crate::pages::{Page, PageId, PageSequence};
use crate::split::ContentSplitter;

/// Default debounce after a structural change, in milliseconds
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 50;

/// Where the controller is in a reflow cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ReflowState {
    Idle,
    /// Measuring a page against the capacity
    Checking,
    /// Cutting an overflowing page
    Splitting,
    /// Ignoring content events until the deadline passes
    Settling {
        #[serde(rename = "untilMs")]
        until_ms: u64,
    },
}

/// Controller tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReflowConfig {
    /// Zero disables settling entirely
    pub settle_delay_ms: u64,
}

impl Default for ReflowConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
        }
    }
}

impl ReflowConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Keeps a page sequence partitioned so every page but the last fits
#[derive(Debug)]
pub struct ReflowController {
    layout: LayoutContext,
    config: ReflowConfig,
    state: ReflowState,
    /// Latest layout received while busy
    pending_relayout: Option<LayoutContext>,
    caret: CaretAnchor,
    clock: Box<dyn Clock>,
    /// States entered by the last operation, in order
    transitions: SmallVec<[ReflowState; 8]>,
}

impl ReflowController {
    pub fn new(layout: LayoutContext) -> Self {
        Self {
            layout,
            config: ReflowConfig::default(),
            state: ReflowState::Idle,
            pending_relayout: None,
            caret: CaretAnchor::new(),
            clock: Box::new(SystemClock),
            transitions: SmallVec::new(),
        }
    }

    pub fn with_config(mut self, config: ReflowConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Layout the current partition was computed against
    pub fn layout(&self) -> &LayoutContext {
        &self.layout
    }

    pub fn config(&self) -> &ReflowConfig {
        &self.config
    }

    pub fn state(&self) -> ReflowState {
        self.state
    }

    pub fn caret(&self) -> &CaretAnchor {
        &self.caret
    }

    pub fn pending_relayout(&self) -> Option<&LayoutContext> {
        self.pending_relayout.as_ref()
    }

    pub fn transitions(&self) -> &[ReflowState] {
        &self.transitions
    }

    /// Leave Settling once its deadline has passed, then run a queued
    /// relayout or else drop blank pages left in the middle of the
    /// document. Hosts call this from a timer.
    pub fn poll<O>(
        &mut self,
        pages: &mut PageSequence,
        oracle: &O,
    ) -> Result<ReflowOutcome, ReflowError>
    where
        O: MeasurementOracle + ?Sized,
    {
        self.transitions.clear();
        self.settle();
        if self.state != ReflowState::Idle {
            return Ok(ReflowOutcome::default());
        }
        match self.pending_relayout.take() {
            Some(layout) => self.run_relayout(pages, oracle, layout),
            None if has_interior_blank(pages) => self.cycle(pages, |this, draft, outcome| {
                this.remove_empty_pages(draft, outcome)
            }),
            None => Ok(ReflowOutcome::default()),
        }
    }

    /// The editing surface reports new content for a page.
    ///
    /// Content that fits is stored in place. Overflow is cut off and pushed
    /// to the front of the following page (created if missing), cascading
    /// until every page fits; the caret then moves to the start of the page
    /// that received the overflow.
    pub fn on_content_changed<O>(
        &mut self,
        pages: &mut PageSequence,
        oracle: &O,
        page_id: PageId,
        content: &str,
    ) -> Result<ReflowOutcome, ReflowError>
    where
        O: MeasurementOracle + ?Sized,
    {
        self.begin()?;
        let content = Fragment::parse(content);
        self.cycle(pages, |this, draft, outcome| {
            if draft.set_content(page_id, content)? {
                outcome.mark_changed(page_id);
            }
            if let Some(target) = this.cascade(draft, oracle, page_id, outcome)? {
                draft.set_active(target)?;
                outcome.caret = Some(this.caret.relocate(draft, target, CaretPosition::Start));
            }
            Ok(())
        })
    }

    /// Backspace at offset 0 of a page.
    ///
    /// A blank page other than the first is removed and the caret moves to
    /// the end of the page before it. Anything else is a no-op.
    pub fn on_backspace_at_page_start(
        &mut self,
        pages: &mut PageSequence,
        page_id: PageId,
    ) -> Result<ReflowOutcome, ReflowError> {
        self.begin()?;
        self.cycle(pages, |this, draft, outcome| {
            let page = draft
                .get(page_id)
                .ok_or_else(|| ReflowError::invalid(page_id, "backspace on a missing page"))?;
            if !page.is_blank() {
                log::debug!("backspace on non-blank page {}, ignored", page_id);
                return Ok(());
            }
            let prev = match draft.prev(page_id) {
                Some(prev) => prev,
                None => {
                    log::debug!("backspace at document start, ignored");
                    return Ok(());
                }
            };

            draft.remove(page_id)?;
            outcome.mark_removed(page_id);
            draft.set_active(prev)?;
            outcome.caret = Some(this.caret.relocate(draft, prev, CaretPosition::End));
            Ok(())
        })
    }

    /// The container was resized; `layout` is the freshly read context.
    ///
    /// While settling the request is queued instead, replacing any earlier
    /// queued one.
    pub fn on_container_resize<O>(
        &mut self,
        pages: &mut PageSequence,
        oracle: &O,
        layout: LayoutContext,
    ) -> Result<ReflowOutcome, ReflowError>
    where
        O: MeasurementOracle + ?Sized,
    {
        self.transitions.clear();
        self.settle();
        if self.state != ReflowState::Idle {
            log::debug!("relayout deferred while {:?}", self.state);
            self.pending_relayout = Some(layout);
            return Ok(ReflowOutcome {
                relayout_deferred: true,
                ..ReflowOutcome::default()
            });
        }
        self.pending_relayout = None;
        self.run_relayout(pages, oracle, layout)
    }

    pub fn on_font_size_change<O>(
        &mut self,
        pages: &mut PageSequence,
        oracle: &O,
        font_size: f32,
    ) -> Result<ReflowOutcome, ReflowError>
    where
        O: MeasurementOracle + ?Sized,
    {
        if !(font_size.is_finite() && font_size > 0.0) {
            return Err(ReflowError::invalid(
                pages.active_page_id(),
                "font size must be positive",
            ));
        }
        let base = self.pending_relayout.unwrap_or(self.layout);
        self.on_container_resize(pages, oracle, base.with_font_size(font_size))
    }

    /// Remove every blank page except the last
    pub fn cleanup_empty_pages(
        &mut self,
        pages: &mut PageSequence,
    ) -> Result<ReflowOutcome, ReflowError> {
        self.begin()?;
        self.cycle(pages, |this, draft, outcome| {
            this.remove_empty_pages(draft, outcome)
        })
    }

    /// Insert a page holding `content` after `after` and focus it
    pub fn insert_page_after<O>(
        &mut self,
        pages: &mut PageSequence,
        oracle: &O,
        after: PageId,
        content: &str,
    ) -> Result<ReflowOutcome, ReflowError>
    where
        O: MeasurementOracle + ?Sized,
    {
        self.begin()?;
        let content = Fragment::parse(content);
        self.cycle(pages, |this, draft, outcome| {
            let id = draft.insert_after(after, content)?;
            outcome.mark_created(id);
            draft.set_active(id)?;
            outcome.caret = Some(this.caret.relocate(draft, id, CaretPosition::Start));
            this.cascade(draft, oracle, id, outcome)?;
            Ok(())
        })
    }

    /// Remove a page outright. The only page cannot be removed.
    pub fn remove_page(
        &mut self,
        pages: &mut PageSequence,
        page_id: PageId,
    ) -> Result<ReflowOutcome, ReflowError> {
        self.begin()?;
        self.cycle(pages, |this, draft, outcome| {
            draft.remove(page_id)?;
            outcome.mark_removed(page_id);
            this.repair_caret(draft, outcome);
            Ok(())
        })
    }

    /// The host focused a page. Accepted in every state.
    pub fn on_focus_acquired(
        &mut self,
        pages: &mut PageSequence,
        page_id: PageId,
    ) -> Result<ReflowOutcome, ReflowError> {
        pages.set_active(page_id)?;
        self.caret.focus_acquired(page_id);
        Ok(ReflowOutcome::default())
    }

    fn set_state(&mut self, next: ReflowState) {
        if self.state != next {
            log::debug!("reflow {:?} -> {:?}", self.state, next);
            self.state = next;
            self.transitions.push(next);
        }
    }

    fn settle(&mut self) {
        if let ReflowState::Settling { until_ms } = self.state {
            if self.clock.now_ms() >= until_ms {
                self.set_state(ReflowState::Idle);
            }
        }
    }

    /// Start a mutating operation; only allowed from Idle
    fn begin(&mut self) -> Result<(), ReflowError> {
        self.transitions.clear();
        self.settle();
        match self.state {
            ReflowState::Idle => Ok(()),
            busy => {
                log::warn!("operation rejected, reflow in progress ({:?})", busy);
                Err(ReflowError::ReentrantReflow(busy))
            }
        }
    }

    /// Run `op` on a draft and commit it, or roll back on error
    fn cycle<F>(&mut self, pages: &mut PageSequence, op: F) -> Result<ReflowOutcome, ReflowError>
    where
        F: FnOnce(&mut Self, &mut PageSequence, &mut ReflowOutcome) -> Result<(), ReflowError>,
    {
        let mut draft = pages.clone();
        let mut outcome = ReflowOutcome::default();
        let saved_caret = self.caret.clone();

        if let Err(err) = op(self, &mut draft, &mut outcome) {
            self.caret = saved_caret;
            self.set_state(ReflowState::Idle);
            log::warn!("reflow abandoned, pages unchanged: {}", err);
            return Err(err);
        }

        *pages = draft;
        if outcome.is_structural() && self.config.settle_delay_ms > 0 {
            let until_ms = self.clock.now_ms() + self.config.settle_delay_ms;
            self.set_state(ReflowState::Settling { until_ms });
        } else {
            self.set_state(ReflowState::Idle);
        }
        Ok(outcome)
    }

    fn run_relayout<O>(
        &mut self,
        pages: &mut PageSequence,
        oracle: &O,
        layout: LayoutContext,
    ) -> Result<ReflowOutcome, ReflowError>
    where
        O: MeasurementOracle + ?Sized,
    {
        let previous = self.layout;
        self.layout = layout;
        let result = self.cycle(pages, |this, draft, outcome| {
            this.relayout(draft, oracle, outcome)
        });
        if result.is_err() {
            // keep the new geometry queued so the next poll retries it
            self.layout = previous;
            self.pending_relayout.get_or_insert(layout);
        }
        result
    }

    /// Every page once, front to back: refill it from the following pages,
    /// push what still overflows, then cleanup
    fn relayout<O>(
        &mut self,
        draft: &mut PageSequence,
        oracle: &O,
        outcome: &mut ReflowOutcome,
    ) -> Result<(), ReflowError>
    where
        O: MeasurementOracle + ?Sized,
    {
        log::debug!(
            "relayout of {} pages, capacity {} at line height {}",
            draft.len(),
            self.layout.max_content_height(),
            self.layout.line_height()
        );
        // pages created by an overflow land right after the current index
        let mut index = 0;
        while index < draft.len() {
            let id = draft.pages()[index].id();
            self.pull_back(draft, oracle, id, outcome)?;
            self.reflow_page(draft, oracle, id, outcome)?;
            index += 1;
        }
        self.remove_empty_pages(draft, outcome)?;
        self.repair_caret(draft, outcome);
        Ok(())
    }

    /// Move leading content of the following pages onto `page_id` while it
    /// fits. A following page that ends up empty is removed.
    fn pull_back<O>(
        &mut self,
        draft: &mut PageSequence,
        oracle: &O,
        page_id: PageId,
        outcome: &mut ReflowOutcome,
    ) -> Result<(), ReflowError>
    where
        O: MeasurementOracle + ?Sized,
    {
        let max_height = self.layout.max_content_height();
        let splitter = ContentSplitter::new(oracle, self.layout.style());

        while let Some(next) = draft.next(page_id) {
            let current = page_content(draft, page_id)?;
            let following = page_content(draft, next)?;
            if following.is_blank() {
                if draft.is_last(next) {
                    return Ok(());
                }
                draft.remove(next)?;
                outcome.mark_removed(next);
                continue;
            }

            self.set_state(ReflowState::Splitting);
            let split = splitter.split(&current.join(&following), max_height)?;
            if split.degraded {
                // the oversized piece stays put; reflow_page reports it
                return Ok(());
            }

            if split.remainder.is_blank() {
                if draft.set_content(page_id, split.fitting)? {
                    outcome.mark_changed(page_id);
                }
                draft.remove(next)?;
                outcome.mark_removed(next);
                log::debug!("page {} absorbed page {}", page_id, next);
                continue;
            }

            if split.fitting != current {
                if draft.set_content(page_id, split.fitting)? {
                    outcome.mark_changed(page_id);
                }
                if draft.set_content(next, split.remainder)? {
                    outcome.mark_changed(next);
                }
                log::debug!("page {} rebalanced with page {}", page_id, next);
            }
            return Ok(());
        }
        Ok(())
    }

    /// Reflow `page_id` and follow its overflow until a page fits.
    /// Returns the page that received the first overflow.
    fn cascade<O>(
        &mut self,
        draft: &mut PageSequence,
        oracle: &O,
        page_id: PageId,
        outcome: &mut ReflowOutcome,
    ) -> Result<Option<PageId>, ReflowError>
    where
        O: MeasurementOracle + ?Sized,
    {
        let first = self.reflow_page(draft, oracle, page_id, outcome)?;
        let mut next = first;
        while let Some(id) = next {
            next = self.reflow_page(draft, oracle, id, outcome)?;
        }
        Ok(first)
    }

    /// Fit one page, pushing its overflow to the front of the next page.
    /// Returns the page that received the overflow.
    fn reflow_page<O>(
        &mut self,
        draft: &mut PageSequence,
        oracle: &O,
        page_id: PageId,
        outcome: &mut ReflowOutcome,
    ) -> Result<Option<PageId>, ReflowError>
    where
        O: MeasurementOracle + ?Sized,
    {
        self.set_state(ReflowState::Checking);
        let max_height = self.layout.max_content_height();
        let style = self.layout.style();
        let content = page_content(draft, page_id)?;

        let height = oracle.height(&content.to_markup(), &style)?;
        if height <= max_height {
            return Ok(None);
        }

        self.set_state(ReflowState::Splitting);
        let split = ContentSplitter::new(oracle, style).split(&content, max_height)?;
        if split.degraded {
            let height = oracle.height(&split.fitting.to_markup(), &style)?;
            log::warn!(
                "page {} keeps oversized content ({} > {})",
                page_id,
                height,
                max_height
            );
            outcome.mark_degraded(
                page_id,
                ReflowError::NoFitPossible {
                    page_id,
                    height,
                    max_height,
                },
            );
        }

        if draft.set_content(page_id, split.fitting)? {
            outcome.mark_changed(page_id);
        }
        if split.remainder.is_blank() {
            return Ok(None);
        }

        let target = match draft.next(page_id) {
            Some(next) => {
                let existing = draft
                    .get(next)
                    .map(|page| page.content().clone())
                    .unwrap_or_default();
                draft.set_content(next, split.remainder.join(&existing))?;
                outcome.mark_changed(next);
                next
            }
            None => {
                let id = draft.insert_after(page_id, split.remainder)?;
                outcome.mark_created(id);
                id
            }
        };
        log::debug!("page {} overflowed into page {}", page_id, target);
        Ok(Some(target))
    }

    fn remove_empty_pages(
        &mut self,
        draft: &mut PageSequence,
        outcome: &mut ReflowOutcome,
    ) -> Result<(), ReflowError> {
        let empty: SmallVec<[PageId; 4]> = interior_blanks(draft).collect();
        if empty.is_empty() {
            return Ok(());
        }

        for &id in &empty {
            draft.remove(id)?;
            outcome.mark_removed(id);
        }
        log::debug!("removed {} empty pages", empty.len());
        self.repair_caret(draft, outcome);
        Ok(())
    }

    /// Move the caret off a page that no longer exists
    fn repair_caret(&mut self, draft: &PageSequence, outcome: &mut ReflowOutcome) {
        if let Some(placement) = self.caret.placement() {
            if !draft.contains(placement.page_id) {
                let active = draft.active_page_id();
                outcome.caret = Some(self.caret.relocate(draft, active, CaretPosition::End));
            }
        }
    }
}

fn page_content(pages: &PageSequence, page_id: PageId) -> Result<Fragment, ReflowError> {
    pages
        .get(page_id)
        .map(|page| page.content().clone())
        .ok_or_else(|| ReflowError::invalid(page_id, "no such page"))
}

/// Blank pages other than the last
fn interior_blanks(pages: &PageSequence) -> impl Iterator<Item = PageId> + '_ {
    let last = pages.last().id();
    pages
        .iter()
        .filter(move |page| page.id() != last && page.is_blank())
        .map(Page::id)
}

fn has_interior_blank(pages: &PageSequence) -> bool {
    interior_blanks(pages).next().is_some()
}
