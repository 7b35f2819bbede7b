//! The ordered page sequence and its active-page cursor

mod page;

pub use page::{Page, PageId, PageSnapshot};

use rustc_hash::FxHashMap;

use crate::content::{DocumentStats, Fragment};
use crate::error::ReflowError;

/// Separator placed between page contents when the document is reassembled
pub const PAGE_JOINER: &str = "\n";

/// Ordered, mutable collection of pages plus the active page.
///
/// Readers get shared access; every mutation goes through
/// [`ReflowController`](crate::reflow::ReflowController).
#[derive(Debug, Clone)]
pub struct PageSequence {
    pages: Vec<Page>,
    /// Maps page ID to its index in `pages`
    positions: FxHashMap<PageId, usize>,
    active: PageId,
    next_id: u64,
}

impl Default for PageSequence {
    fn default() -> Self {
        Self::from_fragment(Fragment::default())
    }
}

impl PageSequence {
    /// A single page holding the whole initial document
    pub fn new(initial: &str) -> Self {
        Self::from_fragment(Fragment::parse(initial))
    }

    pub fn from_fragment(content: Fragment) -> Self {
        let first = PageId(1);
        let mut sequence = Self {
            pages: vec![Page::new(first, content)],
            positions: FxHashMap::default(),
            active: first,
            next_id: 2,
        };
        sequence.reindex();
        sequence
    }

    /// Get page count
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// A sequence always holds at least one page
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn iter(&self) -> impl Iterator<Item = &Page> + '_ {
        self.pages.iter()
    }

    pub fn ids(&self) -> Vec<PageId> {
        self.pages.iter().map(Page::id).collect()
    }

    pub fn get(&self, id: PageId) -> Option<&Page> {
        self.position(id).map(|pos| &self.pages[pos])
    }

    /// Index of a page in sequence order
    pub fn position(&self, id: PageId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub fn contains(&self, id: PageId) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn first(&self) -> &Page {
        &self.pages[0]
    }

    pub fn last(&self) -> &Page {
        &self.pages[self.pages.len() - 1]
    }

    pub fn is_first(&self, id: PageId) -> bool {
        self.position(id) == Some(0)
    }

    pub fn is_last(&self, id: PageId) -> bool {
        self.position(id) == Some(self.pages.len() - 1)
    }

    /// Get next page after given one
    pub fn next(&self, id: PageId) -> Option<PageId> {
        let pos = self.position(id)?;
        self.pages.get(pos + 1).map(Page::id)
    }

    /// Get previous page before given one
    pub fn prev(&self, id: PageId) -> Option<PageId> {
        let pos = self.position(id)?;
        pos.checked_sub(1).map(|p| self.pages[p].id)
    }

    pub fn active_page_id(&self) -> PageId {
        self.active
    }

    pub fn active_page(&self) -> &Page {
        // `active` is kept pointing at a live page by every mutation
        self.get(self.active).unwrap_or_else(|| self.first())
    }

    pub fn snapshot(&self) -> Vec<PageSnapshot> {
        self.pages.iter().map(PageSnapshot::from).collect()
    }

    /// Reassemble the document markup
    pub fn document_content(&self) -> String {
        self.pages
            .iter()
            .map(Page::markup)
            .collect::<Vec<_>>()
            .join(PAGE_JOINER)
    }

    /// Reassemble the document text with markup stripped
    pub fn plain_text(&self) -> String {
        self.pages
            .iter()
            .map(|page| page.content.plain_text())
            .collect::<Vec<_>>()
            .join(PAGE_JOINER)
    }

    pub fn stats(&self) -> DocumentStats {
        DocumentStats::from_text(&self.plain_text())
    }

    /// Replace a page's content. Returns whether anything changed.
    pub(crate) fn set_content(
        &mut self,
        id: PageId,
        content: Fragment,
    ) -> Result<bool, ReflowError> {
        let pos = self
            .position(id)
            .ok_or_else(|| ReflowError::invalid(id, "no such page"))?;
        let page = &mut self.pages[pos];
        if page.content == content {
            return Ok(false);
        }
        page.content = content;
        Ok(true)
    }

    /// Insert a new page directly after `after`
    pub(crate) fn insert_after(
        &mut self,
        after: PageId,
        content: Fragment,
    ) -> Result<PageId, ReflowError> {
        let pos = self
            .position(after)
            .ok_or_else(|| ReflowError::invalid(after, "cannot insert after a missing page"))?;
        let id = PageId(self.next_id);
        self.next_id += 1;
        self.pages.insert(pos + 1, Page::new(id, content));
        self.reindex();
        Ok(id)
    }

    /// Remove a page. The active page moves to the nearest survivor,
    /// preferring the one before.
    pub(crate) fn remove(&mut self, id: PageId) -> Result<Page, ReflowError> {
        let pos = self
            .position(id)
            .ok_or_else(|| ReflowError::invalid(id, "no such page"))?;
        if self.pages.len() <= 1 {
            return Err(ReflowError::invalid(id, "cannot remove the only page"));
        }

        let removed = self.pages.remove(pos);
        if self.active == id {
            let survivor = pos.saturating_sub(1).min(self.pages.len() - 1);
            self.active = self.pages[survivor].id;
        }
        self.reindex();
        Ok(removed)
    }

    pub(crate) fn set_active(&mut self, id: PageId) -> Result<(), ReflowError> {
        if !self.contains(id) {
            return Err(ReflowError::invalid(id, "cannot activate a missing page"));
        }
        self.active = id;
        Ok(())
    }

    fn reindex(&mut self) {
        self.positions.clear();
        for (pos, page) in self.pages.iter().enumerate() {
            self.positions.insert(page.id, pos);
        }
        debug_assert_eq!(self.positions.len(), self.pages.len(), "duplicate page id");
        debug_assert!(self.positions.contains_key(&self.active), "dangling active page");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_pages() -> (PageSequence, PageId, PageId, PageId) {
        let mut pages = PageSequence::new("one");
        let a = pages.first().id();
        let b = pages.insert_after(a, Fragment::parse("two")).unwrap();
        let c = pages.insert_after(b, Fragment::parse("three")).unwrap();
        (pages, a, b, c)
    }

    #[test]
    fn test_new_sequence() {
        let pages = PageSequence::new("Hello");
        assert_eq!(pages.len(), 1);
        assert_eq!(pages.active_page_id(), pages.first().id());
        assert_eq!(pages.document_content(), "Hello");
    }

    #[test]
    fn test_insert_keeps_order() {
        let (mut pages, a, b, c) = three_pages();
        let d = pages.insert_after(a, Fragment::parse("between")).unwrap();
        assert_eq!(pages.ids(), vec![a, d, b, c]);
        assert_eq!(pages.document_content(), "one\nbetween\ntwo\nthree");
    }

    #[test]
    fn test_next_prev() {
        let (pages, a, b, c) = three_pages();
        assert_eq!(pages.next(a), Some(b));
        assert_eq!(pages.next(c), None);
        assert_eq!(pages.prev(a), None);
        assert_eq!(pages.prev(c), Some(b));
        assert!(pages.is_first(a));
        assert!(pages.is_last(c));
    }

    #[test]
    fn test_remove_moves_active_to_previous() {
        let (mut pages, a, b, c) = three_pages();
        pages.set_active(b).unwrap();
        pages.remove(b).unwrap();
        assert_eq!(pages.active_page_id(), a);
        assert_eq!(pages.ids(), vec![a, c]);

        pages.set_active(a).unwrap();
        pages.remove(a).unwrap();
        assert_eq!(pages.active_page_id(), c);
    }

    #[test]
    fn test_cannot_remove_only_page() {
        let mut pages = PageSequence::new("x");
        let id = pages.first().id();
        assert!(matches!(
            pages.remove(id),
            Err(ReflowError::InvalidOperation { .. })
        ));
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn test_set_content_reports_change() {
        let (mut pages, a, _, _) = three_pages();
        assert!(!pages.set_content(a, Fragment::parse("one")).unwrap());
        assert!(pages.set_content(a, Fragment::parse("uno")).unwrap());
        assert!(pages.set_content(PageId(99), Fragment::default()).is_err());
    }

    #[test]
    fn test_stats_span_pages() {
        let (pages, _, _, _) = three_pages();
        let stats = pages.stats();
        assert_eq!(stats.word_count, 3);
        assert_eq!(pages.plain_text(), "one\ntwo\nthree");
    }
}
