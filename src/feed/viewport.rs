//! Row geometry of the feed pane: card placement, scrolling, and the
//! per-card visible ratios fed to the intersection observers.

use crate::api::{ItemId, MediaType};
use crate::feed::window::RenderedRecord;

pub const IMAGE_CARD_ROWS: usize = 4;
pub const VIDEO_CARD_ROWS: usize = 5;

pub fn card_rows(media_type: MediaType) -> usize {
    match media_type {
        MediaType::Image => IMAGE_CARD_ROWS,
        MediaType::Video => VIDEO_CARD_ROWS,
    }
}

/// Where a record sits in the scrollable content.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub id: ItemId,
    pub ordinal: u64,
    pub top: usize,
    pub rows: usize,
    pub is_video: bool,
}

impl Placement {
    pub fn bottom(&self) -> usize {
        self.top + self.rows
    }
}

/// Stack records top to bottom in the order given (ordinal order).
pub fn layout<'a>(records: impl IntoIterator<Item = &'a RenderedRecord>) -> Vec<Placement> {
    let mut top = 0;
    records
        .into_iter()
        .map(|record| {
            let rows = card_rows(record.item.media_type);
            let placement = Placement {
                id: record.item.id.clone(),
                ordinal: record.admitted_at,
                top,
                rows,
                is_video: record.item.is_video(),
            };
            top += rows;
            placement
        })
        .collect()
}

pub fn content_rows(layout: &[Placement]) -> usize {
    layout.last().map(Placement::bottom).unwrap_or(0)
}

/// A scroll position expressed relative to a record, so it survives
/// records above it being removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    ordinal: u64,
    rows_into: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Viewport {
    offset: usize,
    rows: usize,
}

impl Viewport {
    pub fn new(rows: usize) -> Self {
        Self { offset: 0, rows }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn set_rows(&mut self, rows: usize, content: usize) {
        self.rows = rows;
        self.clamp(content);
    }

    fn max_offset(&self, content: usize) -> usize {
        content.saturating_sub(self.rows)
    }

    fn clamp(&mut self, content: usize) {
        self.offset = self.offset.min(self.max_offset(content));
    }

    pub fn scroll_by(&mut self, delta: isize, content: usize) {
        self.offset = self.offset.saturating_add_signed(delta);
        self.clamp(content);
    }

    pub fn scroll_to_top(&mut self) {
        self.offset = 0;
    }

    pub fn scroll_to_bottom(&mut self, content: usize) {
        self.offset = self.max_offset(content);
    }

    pub fn visible_rows(&self, placement: &Placement) -> usize {
        let start = placement.top.max(self.offset);
        let end = placement.bottom().min(self.offset + self.rows);
        end.saturating_sub(start)
    }

    /// Fraction of the card's rows inside the viewport.
    pub fn ratio(&self, placement: &Placement) -> f32 {
        if placement.rows == 0 {
            return 0.0;
        }
        self.visible_rows(placement) as f32 / placement.rows as f32
    }

    pub fn ratios(&self, layout: &[Placement]) -> Vec<(ItemId, f32)> {
        layout
            .iter()
            .map(|p| (p.id.clone(), self.ratio(p)))
            .collect()
    }

    /// The most visible card; the earliest one wins ties.
    pub fn focused<'a>(&self, layout: &'a [Placement]) -> Option<&'a Placement> {
        let mut best: Option<(&Placement, usize)> = None;
        for placement in layout {
            let rows = self.visible_rows(placement);
            if rows == 0 {
                continue;
            }
            let ratio_beats = |(current, current_rows): (&Placement, usize)| {
                rows * current.rows > current_rows * placement.rows
            };
            if best.is_none_or(ratio_beats) {
                best = Some((placement, rows));
            }
        }
        best.map(|(p, _)| p)
    }

    pub fn anchor(&self, layout: &[Placement]) -> Option<Anchor> {
        layout
            .iter()
            .find(|p| p.bottom() > self.offset)
            .map(|p| Anchor {
                ordinal: p.ordinal,
                rows_into: self.offset.saturating_sub(p.top),
            })
    }

    /// Re-derive the offset after the layout changed. If the anchor record
    /// is gone, the next surviving record takes its place.
    pub fn restore(&mut self, anchor: Anchor, layout: &[Placement]) {
        self.offset = match layout.iter().find(|p| p.ordinal >= anchor.ordinal) {
            Some(p) if p.ordinal == anchor.ordinal => p.top + anchor.rows_into,
            Some(p) => p.top,
            None => self.max_offset(content_rows(layout)),
        };
        self.clamp(content_rows(layout));
    }
}
