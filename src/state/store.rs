/// Concern Store
///
/// Owns the view window, the last loaded result set and the query mode,
/// and tags every dispatched query with a generation.
use super::data::{Concern, ConcernId, Page};
use super::resolver::QueryMode;

/// Tag attached to every query the store dispatches.
///
/// Bumped on each mode switch; a response is only applied while its tag is
/// still the current one, so a slow filter request can never overwrite a
/// newer view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Generation(u64);

impl Generation {
    fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

/// The currently displayed slice of concerns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewWindow {
    displayed: Vec<Concern>,
    total_count: usize,
    current_page: usize,
    page_size: usize,
}

impl ViewWindow {
    pub fn displayed(&self) -> &[Concern] {
        &self.displayed
    }

    /// Server total in paged mode, result size otherwise
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages the server reported for the paged listing
    pub fn page_count(&self) -> usize {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(self.page_size)
    }
}

/// The ConcernStore owns the view window and the last loaded result set.
/// It is the only writer of either; everything else goes through its methods.
#[derive(Debug)]
pub struct ConcernStore {
    window: ViewWindow,
    all_loaded: Vec<Concern>,
    mode: QueryMode,
    /// Mode of the result the window currently holds; `None` when empty
    shown: Option<QueryMode>,
    generation: Generation,
}

impl ConcernStore {
    pub fn new(page_size: usize) -> Self {
        Self {
            window: ViewWindow {
                page_size,
                ..ViewWindow::default()
            },
            all_loaded: Vec::new(),
            mode: QueryMode::AllPaged,
            shown: None,
            generation: Generation::default(),
        }
    }

    pub fn window(&self) -> &ViewWindow {
        &self.window
    }

    pub fn all_loaded(&self) -> &[Concern] {
        &self.all_loaded
    }

    pub fn mode(&self) -> QueryMode {
        self.mode
    }

    /// Which mode produced the window's contents. Lags `mode` while a query is in flight.
    pub fn shown_mode(&self) -> Option<QueryMode> {
        self.shown
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.generation == generation
    }

    pub fn contains(&self, id: ConcernId) -> bool {
        self.all_loaded.iter().any(|concern| concern.id == id)
            || self.window.displayed.iter().any(|concern| concern.id == id)
    }

    pub fn get(&self, id: ConcernId) -> Option<&Concern> {
        self.all_loaded
            .iter()
            .chain(self.window.displayed.iter())
            .find(|concern| concern.id == id)
    }

    /// Switch to `mode` and return the tag the matching response must carry
    pub fn begin(&mut self, mode: QueryMode) -> Generation {
        self.mode = mode;
        self.generation = self.generation.next();
        self.generation
    }

    /// Apply a page of the paged listing.
    ///
    /// Returns `false` (and changes nothing) when the response is stale.
    pub fn apply_page(&mut self, generation: Generation, page_index: usize, size: usize, page: Page) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        let mut content = page.content;
        content.truncate(size);

        self.all_loaded = content.clone();
        self.window = ViewWindow {
            displayed: content,
            total_count: page.total_elements,
            current_page: page_index,
            page_size: size,
        };
        self.shown = Some(QueryMode::AllPaged);
        true
    }

    /// Apply a filter or search result. Returns `false` when stale.
    pub fn apply_full_set(&mut self, generation: Generation, items: Vec<Concern>) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.replace_with_full_set(items);
        true
    }

    /// Show every item at once; filter and search modes do not paginate
    pub fn replace_with_full_set(&mut self, items: Vec<Concern>) {
        self.window.total_count = items.len();
        self.window.current_page = 0;
        self.window.displayed = items.clone();
        self.all_loaded = items;
        self.shown = Some(self.mode);
    }

    /// Apply `mutation` to the concern with `id` wherever it is loaded.
    ///
    /// Returns whether any copy was found. Never inserts.
    pub fn patch_item<F>(&mut self, id: ConcernId, mut mutation: F) -> bool
    where
        F: FnMut(&mut Concern),
    {
        let mut found = false;
        for concern in self
            .all_loaded
            .iter_mut()
            .chain(self.window.displayed.iter_mut())
            .filter(|concern| concern.id == id)
        {
            mutation(concern);
            found = true;
        }
        found
    }

    pub fn clear(&mut self) {
        self.all_loaded.clear();
        self.window.displayed.clear();
        self.window.total_count = 0;
        self.window.current_page = 0;
        self.shown = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::{Comment, ConcernStatus, Role};

    fn concern(id: ConcernId, status: ConcernStatus) -> Concern {
        Concern::new(id, &format!("Concern {id}"), "Details", "Harbor", status)
    }

    fn page(ids: &[ConcernId], total: usize) -> Page {
        Page {
            content: ids.iter().map(|id| concern(*id, ConcernStatus::Pending)).collect(),
            total_elements: total,
        }
    }

    #[test]
    fn test_apply_page_respects_page_size_and_server_total() {
        let mut store = ConcernStore::new(3);
        let generation = store.begin(QueryMode::AllPaged);

        assert!(store.apply_page(generation, 4, 3, page(&[1, 2, 3, 4], 42)));

        let window = store.window();
        assert_eq!(window.displayed().len(), 3);
        assert_eq!(window.total_count(), 42);
        assert_eq!(window.current_page(), 4);
        assert_eq!(window.page_count(), 14);
    }

    #[test]
    fn test_stale_page_is_discarded() {
        let mut store = ConcernStore::new(10);
        let old = store.begin(QueryMode::AllPaged);
        let current = store.begin(QueryMode::StatusFiltered);

        assert!(store.apply_full_set(current, vec![concern(9, ConcernStatus::Resolved)]));
        assert!(!store.apply_page(old, 0, 10, page(&[1, 2], 2)));

        let ids: Vec<_> = store.window().displayed().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![9]);
        assert_eq!(store.mode(), QueryMode::StatusFiltered);
    }

    #[test]
    fn test_full_set_replaces_window_wholesale() {
        let mut store = ConcernStore::new(2);
        let generation = store.begin(QueryMode::AllPaged);
        store.apply_page(generation, 3, 2, page(&[1, 2], 20));

        let generation = store.begin(QueryMode::Search);
        store.apply_full_set(
            generation,
            vec![
                concern(2, ConcernStatus::Pending),
                concern(5, ConcernStatus::Pending),
                concern(6, ConcernStatus::Pending),
            ],
        );

        let window = store.window();
        let ids: Vec<_> = window.displayed().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 5, 6]);
        assert_eq!(window.total_count(), 3);
        assert_eq!(window.current_page(), 0);
        assert_eq!(store.all_loaded().len(), 3);
    }

    #[test]
    fn test_patch_item_updates_both_copies() {
        let mut store = ConcernStore::new(5);
        store.replace_with_full_set(vec![concern(1, ConcernStatus::Pending)]);

        let patched = store.patch_item(1, |concern| {
            concern.push_comment(Comment {
                id: 77,
                text: "Crew dispatched".into(),
                author_role: Role::Moderator,
            })
        });

        assert!(patched);
        assert_eq!(store.all_loaded()[0].comments_count(), 1);
        assert_eq!(store.window().displayed()[0].comments_count(), 1);
    }

    #[test]
    fn test_patch_missing_item_is_noop() {
        let mut store = ConcernStore::new(5);
        store.replace_with_full_set(vec![concern(1, ConcernStatus::Pending)]);

        assert!(!store.patch_item(99, |concern| concern.status = ConcernStatus::Resolved));
        assert_eq!(store.all_loaded().len(), 1);
        assert_eq!(store.all_loaded()[0].status, ConcernStatus::Pending);
    }

    #[test]
    fn test_shown_mode_lags_until_result_arrives() {
        let mut store = ConcernStore::new(5);
        assert_eq!(store.shown_mode(), None);

        let search = store.begin(QueryMode::Search);
        assert!(store.apply_full_set(search, vec![concern(1, ConcernStatus::Pending)]));
        assert_eq!(store.shown_mode(), Some(QueryMode::Search));

        let paged = store.begin(QueryMode::AllPaged);
        assert_eq!(store.mode(), QueryMode::AllPaged);
        assert_eq!(store.shown_mode(), Some(QueryMode::Search));

        assert!(store.apply_page(paged, 0, 5, page(&[2], 1)));
        assert_eq!(store.shown_mode(), Some(QueryMode::AllPaged));
    }

    #[test]
    fn test_clear_empties_window() {
        let mut store = ConcernStore::new(5);
        store.replace_with_full_set(vec![concern(1, ConcernStatus::Pending)]);
        store.clear();

        assert!(store.window().displayed().is_empty());
        assert!(store.all_loaded().is_empty());
        assert_eq!(store.window().total_count(), 0);
        assert_eq!(store.shown_mode(), None);
    }
}
