//! Caret preservation across splits, merges and focus changes

use serde::{Deserialize, Serialize};

use crate::pages::{PageId, PageSequence};

/// Where the caret should land inside a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CaretPosition {
    Start,
    End,
    /// Character offset into the page's rendered text
    Offset(usize),
}

/// A caret location resolved against the current page sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaretPlacement {
    pub page_id: PageId,
    pub offset: usize,
}

/// The per-page editing surface owned by the host
pub trait EditingSurface {
    /// Replace the content rendered for a page (creating it if new)
    fn set_content(&mut self, page_id: PageId, content: &str);

    /// Move focus and the selection caret into a page
    fn set_focus(&mut self, page_id: PageId, position: CaretPosition);

    /// A page left the sequence
    fn page_removed(&mut self, _page_id: PageId) {}
}

/// Surface for headless use: every request is dropped
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSurface;

impl EditingSurface for NullSurface {
    fn set_content(&mut self, _page_id: PageId, _content: &str) {}

    fn set_focus(&mut self, _page_id: PageId, _position: CaretPosition) {}
}

/// Tracks the logical caret and translates it across structural changes
#[derive(Debug, Clone, Default)]
pub struct CaretAnchor {
    placement: Option<CaretPlacement>,
}

impl CaretAnchor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last placement, if the caret has been placed
    pub fn placement(&self) -> Option<CaretPlacement> {
        self.placement
    }

    /// Place the caret in `target`.
    ///
    /// If `target` has already left the sequence the caret falls back to
    /// the active page, at the same requested position.
    pub fn relocate(
        &mut self,
        pages: &PageSequence,
        target: PageId,
        position: CaretPosition,
    ) -> CaretPlacement {
        let page = match pages.get(target) {
            Some(page) => page,
            None => {
                log::debug!("caret target {} is gone, using active page", target);
                pages.active_page()
            }
        };

        let len = page.content().char_len();
        let offset = match position {
            CaretPosition::Start => 0,
            CaretPosition::End => len,
            CaretPosition::Offset(offset) => offset.min(len),
        };

        let placement = CaretPlacement {
            page_id: page.id(),
            offset,
        };
        self.placement = Some(placement);
        placement
    }

    /// The host focused a page; the exact offset is owned by the surface
    pub fn focus_acquired(&mut self, page_id: PageId) {
        let offset = match self.placement {
            Some(placement) if placement.page_id == page_id => placement.offset,
            _ => 0,
        };
        self.placement = Some(CaretPlacement { page_id, offset });
    }

    /// Issue the focus change for the current placement
    pub fn apply<S: EditingSurface + ?Sized>(&self, surface: &mut S) {
        if let Some(placement) = self.placement {
            surface.set_focus(placement.page_id, CaretPosition::Offset(placement.offset));
        }
    }
}
