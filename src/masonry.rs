//! Greedy masonry bucketing for ad preview cards.
//!
//! Cards are sized from their declared ad size plus the chrome the gallery
//! draws around each preview, then dealt into columns left to right. When
//! the running row width would overflow the container the column cursor
//! restarts at zero, so later "rows" stack under earlier columns by index
//! rather than opening new ones. Hosts depend on that assignment, so it is
//! kept as is.

use crate::size::AdSize;

/// Horizontal chrome around a preview (16px each side)
pub const CARD_PADDING_WIDTH: u32 = 32;
/// Vertical chrome around a preview (header and footer)
pub const CARD_PADDING_HEIGHT: u32 = 80;
/// Gutter used by the gallery when the host does not pick one
pub const DEFAULT_GUTTER: u32 = 10;

/// An item to place, identified by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutItem {
    pub id: String,
    /// `"<width>x<height>"`; malformed values fall back to 300x250
    pub declared_size: String,
}

impl LayoutItem {
    pub fn new(id: impl Into<String>, declared_size: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            declared_size: declared_size.into(),
        }
    }

    /// Card dimensions including the gallery chrome.
    ///
    /// A malformed size yields a bare 300x250 card with no chrome added.
    pub fn card_size(&self) -> (u32, u32) {
        match self.declared_size.parse::<AdSize>() {
            Ok(size) => (
                size.width.saturating_add(CARD_PADDING_WIDTH),
                size.height.saturating_add(CARD_PADDING_HEIGHT),
            ),
            Err(_) => {
                log::debug!(
                    "unparseable ad size {:?} for {}, using a {} card",
                    self.declared_size,
                    self.id,
                    AdSize::FALLBACK
                );
                (AdSize::FALLBACK.width, AdSize::FALLBACK.height)
            }
        }
    }
}

/// One column of the layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Column<'a> {
    /// Stable key for the host (the column index)
    pub key: usize,
    /// Accumulated card heights plus one gutter per card
    pub height: u64,
    pub items: Vec<&'a LayoutItem>,
}

/// Columns in display order, borrowing the input items.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutResult<'a> {
    pub columns: Vec<Column<'a>>,
}

impl<'a> LayoutResult<'a> {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Items in column order
    pub fn items(&self) -> impl Iterator<Item = &'a LayoutItem> + '_ {
        self.columns.iter().flat_map(|c| c.items.iter().copied())
    }

    /// Column ids as nested vectors, handy for logging and tests
    pub fn ids(&self) -> Vec<Vec<&'a str>> {
        self.columns
            .iter()
            .map(|c| c.items.iter().map(|i| i.id.as_str()).collect())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct ColumnPlan {
    height: u64,
    members: Vec<usize>,
}

fn plan(items: &[LayoutItem], container_width: i64, gutter: u32) -> Vec<ColumnPlan> {
    if items.is_empty() {
        return Vec::new();
    }

    let gutter = i64::from(gutter);

    // No usable measurement: everything goes in one column.
    if container_width <= 0 {
        let height = items
            .iter()
            .map(|item| i64::from(item.card_size().1) + gutter)
            .sum::<i64>();
        return vec![ColumnPlan {
            height: height as u64,
            members: (0..items.len()).collect(),
        }];
    }

    let mut columns: Vec<ColumnPlan> = Vec::new();
    let mut total_width: i64 = 0;
    let mut current_col = 0usize;

    for (index, item) in items.iter().enumerate() {
        let (width, height) = item.card_size();
        let (width, height) = (i64::from(width), i64::from(height));

        if total_width + width + gutter > container_width {
            total_width = 0;
            current_col = 0;
        }

        if current_col == columns.len() {
            columns.push(ColumnPlan::default());
        }
        let column = &mut columns[current_col];
        column.members.push(index);
        column.height += (height + gutter) as u64;

        total_width += width + gutter;
        current_col += 1;
    }

    columns
}

fn materialize<'a>(items: &'a [LayoutItem], plan: &[ColumnPlan]) -> LayoutResult<'a> {
    LayoutResult {
        columns: plan
            .iter()
            .enumerate()
            .map(|(key, col)| Column {
                key,
                height: col.height,
                items: col.members.iter().map(|&i| &items[i]).collect(),
            })
            .collect(),
    }
}

/// Distribute `items` into columns for a container `container_width` pixels
/// wide. Never fails: bad sizes fall back and a non-positive width yields a
/// single column.
pub fn pack(items: &[LayoutItem], container_width: i64, gutter: u32) -> LayoutResult<'_> {
    let plan = plan(items, container_width, gutter);
    materialize(items, &plan)
}

/// Holds the packer inputs for a resizing host and recomputes the whole
/// layout whenever one of them changes.
#[derive(Debug, Clone)]
pub struct MasonryPacker {
    items: Vec<LayoutItem>,
    container_width: i64,
    gutter: u32,
    plan: Vec<ColumnPlan>,
}

impl Default for MasonryPacker {
    fn default() -> Self {
        Self::new(DEFAULT_GUTTER)
    }
}

impl MasonryPacker {
    pub fn new(gutter: u32) -> Self {
        Self {
            items: Vec::new(),
            container_width: 0,
            gutter,
            plan: Vec::new(),
        }
    }

    /// Replace the items. Returns whether a relayout happened.
    pub fn set_items(&mut self, items: Vec<LayoutItem>) -> bool {
        if items == self.items {
            return false;
        }
        self.items = items;
        self.relayout();
        true
    }

    /// Record a new container measurement (e.g. from a resize observer).
    pub fn set_container_width(&mut self, width: i64) -> bool {
        if width == self.container_width {
            return false;
        }
        self.container_width = width;
        self.relayout();
        true
    }

    pub fn set_gutter(&mut self, gutter: u32) -> bool {
        if gutter == self.gutter {
            return false;
        }
        self.gutter = gutter;
        self.relayout();
        true
    }

    pub fn items(&self) -> &[LayoutItem] {
        &self.items
    }

    pub fn container_width(&self) -> i64 {
        self.container_width
    }

    pub fn gutter(&self) -> u32 {
        self.gutter
    }

    /// The layout for the current inputs
    pub fn layout(&self) -> LayoutResult<'_> {
        materialize(&self.items, &self.plan)
    }

    fn relayout(&mut self) {
        self.plan = plan(&self.items, self.container_width, self.gutter);
        log::debug!(
            "masonry relayout: {} items into {} columns at width {}",
            self.items.len(),
            self.plan.len(),
            self.container_width
        );
    }
}
