//! The node-level rendering contract the feed window drives.

use std::collections::HashSet;

use tracing::trace;

use crate::api::FeedItem;
use crate::feed::viewport::VIDEO_CARD_ROWS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

/// Element creation and removal for admitted items.
///
/// `after_batch` runs once after every admission batch that attached at least
/// one node, for post-render work such as icon replacement.
pub trait RenderSurface {
    fn container_present(&self) -> bool;
    fn attach(&mut self, item: &FeedItem) -> NodeId;
    fn detach(&mut self, node: NodeId);
    fn after_batch(&mut self);
}

/// The feed pane of the terminal UI. Cards are drawn from the window's
/// records each frame, so the surface only tracks node lifetimes.
pub struct TerminalSurface {
    pane_rows: u16,
    next_node: u64,
    attached: HashSet<NodeId>,
    batches: u64,
}

impl TerminalSurface {
    pub fn new(pane_rows: u16) -> Self {
        Self {
            pane_rows,
            next_node: 0,
            attached: HashSet::new(),
            batches: 0,
        }
    }

    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }

    pub fn batches(&self) -> u64 {
        self.batches
    }
}

impl RenderSurface for TerminalSurface {
    /// The pane must fit at least one full video card.
    fn container_present(&self) -> bool {
        usize::from(self.pane_rows) >= VIDEO_CARD_ROWS
    }

    fn attach(&mut self, item: &FeedItem) -> NodeId {
        let node = NodeId(self.next_node);
        self.next_node += 1;
        self.attached.insert(node);
        trace!(id = %item.id, node = node.0, "attached");
        node
    }

    fn detach(&mut self, node: NodeId) {
        self.attached.remove(&node);
    }

    fn after_batch(&mut self) {
        self.batches += 1;
    }
}
