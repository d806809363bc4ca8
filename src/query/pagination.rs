/// Page sizes offered by the table.
pub const PAGE_SIZE_OPTIONS: [usize; 5] = [10, 20, 30, 50, 100];

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Returns `items[page_index * page_size .. page_index * page_size + page_size]`, clipped to the
/// available length. An out of range page, or a zero page size, yields an empty slice.
pub fn paginate<T>(items: &[T], page_size: usize, page_index: usize) -> &[T] {
    let Some(start) = page_index.checked_mul(page_size) else {
        return &[];
    };
    if page_size == 0 || start >= items.len() {
        return &[];
    }
    let end = usize::min(start.saturating_add(page_size), items.len());
    &items[start..end]
}

/// Number of pages needed for `len` items. Zero items means zero pages.
pub fn page_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        0
    } else {
        len.div_ceil(page_size)
    }
}

/// Current position of the table. [paginate] itself is pure, so keeping the index valid when
/// the page size or the data changes is this type's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    index: usize,
    size: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            index: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageState {
    pub fn new(size: usize) -> Self {
        Self {
            index: 0,
            size: size.max(1),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Changing the size always returns to the first page.
    pub fn set_page_size(&mut self, size: usize) {
        self.size = size.max(1);
        self.index = 0;
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Moves to `index`, clamped to the last page for `len` items.
    pub fn goto(&mut self, index: usize, len: usize) {
        self.index = index.min(self.last_index(len));
    }

    pub fn next(&mut self, len: usize) {
        self.goto(self.index.saturating_add(1), len);
    }

    pub fn previous(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    pub fn first(&mut self) {
        self.index = 0;
    }

    pub fn last(&mut self, len: usize) {
        self.index = self.last_index(len);
    }

    pub fn can_previous(&self) -> bool {
        self.index > 0
    }

    pub fn can_next(&self, len: usize) -> bool {
        self.index < self.last_index(len)
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        paginate(items, self.size, self.index)
    }

    fn last_index(&self, len: usize) -> usize {
        page_count(len, self.size).saturating_sub(1)
    }
}
