//! What a reflow cycle did to the page sequence

use smallvec::SmallVec;

use crate::caret::CaretPlacement;
use crate::error::ReflowError;
use crate::pages::PageId;

/// Record of one completed controller operation.
///
/// The facade replays it against the editing surface: pushes content for
/// changed and created pages, drops removed ones, moves focus to `caret`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReflowOutcome {
    /// Existing pages whose content was rewritten
    pub changed: SmallVec<[PageId; 4]>,
    /// Pages inserted, in sequence order of creation
    pub created: SmallVec<[PageId; 2]>,
    pub removed: SmallVec<[PageId; 2]>,
    /// Pages left overflowing because nothing smaller could be cut off
    pub degraded: SmallVec<[PageId; 2]>,
    /// Non-fatal conditions met along the way
    pub warnings: Vec<ReflowError>,
    /// Caret relocation requested by the operation
    pub caret: Option<CaretPlacement>,
    /// A resize arrived while settling and was queued for `poll`
    pub relayout_deferred: bool,
}

impl ReflowOutcome {
    pub fn mark_changed(&mut self, id: PageId) {
        if !self.changed.contains(&id) && !self.created.contains(&id) {
            self.changed.push(id);
        }
    }

    pub fn mark_created(&mut self, id: PageId) {
        self.created.push(id);
    }

    /// A page that was created within the same cycle simply never existed
    pub fn mark_removed(&mut self, id: PageId) {
        self.changed.retain(|changed| *changed != id);
        self.degraded.retain(|degraded| *degraded != id);
        if let Some(pos) = self.created.iter().position(|created| *created == id) {
            self.created.remove(pos);
        } else {
            self.removed.push(id);
        }
    }

    pub fn mark_degraded(&mut self, id: PageId, warning: ReflowError) {
        if !self.degraded.contains(&id) {
            self.degraded.push(id);
        }
        self.warnings.push(warning);
    }

    /// Pages were split, merged, created or removed
    pub fn is_structural(&self) -> bool {
        !self.created.is_empty() || !self.removed.is_empty() || self.changed.len() > 1
    }

    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty() || !self.created.is_empty() || !self.removed.is_empty()
    }

    /// Fold a later outcome into this one
    pub fn absorb(&mut self, later: ReflowOutcome) {
        for id in later.created {
            self.mark_created(id);
        }
        for id in later.changed {
            self.mark_changed(id);
        }
        for id in later.removed {
            self.mark_removed(id);
        }
        for id in later.degraded {
            if !self.degraded.contains(&id) {
                self.degraded.push(id);
            }
        }
        self.warnings.extend(later.warnings);
        if later.caret.is_some() {
            self.caret = later.caret;
        }
        self.relayout_deferred |= later.relayout_deferred;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_is_deduplicated() {
        let mut outcome = ReflowOutcome::default();
        outcome.mark_changed(PageId(1));
        outcome.mark_changed(PageId(1));
        assert_eq!(outcome.changed.as_slice(), &[PageId(1)]);
        assert!(!outcome.is_structural());
        assert!(outcome.has_changes());
    }

    #[test]
    fn test_created_then_removed_cancels() {
        let mut outcome = ReflowOutcome::default();
        outcome.mark_created(PageId(2));
        outcome.mark_changed(PageId(2));
        assert!(outcome.changed.is_empty());

        outcome.mark_removed(PageId(2));
        assert!(outcome.created.is_empty());
        assert!(outcome.removed.is_empty());
        assert!(!outcome.has_changes());
    }

    #[test]
    fn test_two_changed_pages_is_structural() {
        let mut outcome = ReflowOutcome::default();
        outcome.mark_changed(PageId(1));
        outcome.mark_changed(PageId(2));
        assert!(outcome.is_structural());
    }

    #[test]
    fn test_absorb_keeps_latest_caret() {
        let mut first = ReflowOutcome::default();
        first.mark_changed(PageId(1));
        let mut later = ReflowOutcome::default();
        later.mark_removed(PageId(3));
        later.caret = Some(CaretPlacement {
            page_id: PageId(1),
            offset: 4,
        });

        first.absorb(later);
        assert_eq!(first.removed.as_slice(), &[PageId(3)]);
        assert_eq!(first.caret.map(|c| c.offset), Some(4));
    }
}
