// ── Slot/layout model ──
//
// Owns the logical list of tile assignments and the active grid preset.
// The slot list is unbounded and never shrinks; presets only change how
// many slots are visible per page.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::model::{DeviceId, PersistedConfig, Slot};

// ── LayoutPreset ────────────────────────────────────────────────────

/// Grid shape preset. Capacity and column count are pure functions of
/// the tag.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
pub enum LayoutPreset {
    #[default]
    #[serde(rename = "2x2")]
    #[strum(serialize = "2x2")]
    Grid2x2,
    #[serde(rename = "3x2")]
    #[strum(serialize = "3x2")]
    Grid3x2,
    #[serde(rename = "3x3")]
    #[strum(serialize = "3x3")]
    Grid3x3,
    #[serde(rename = "4x3")]
    #[strum(serialize = "4x3")]
    Grid4x3,
}

impl LayoutPreset {
    /// Tiles visible per page.
    pub fn capacity(self) -> usize {
        self.columns() * self.rows()
    }

    pub fn columns(self) -> usize {
        match self {
            Self::Grid2x2 => 2,
            Self::Grid3x2 | Self::Grid3x3 => 3,
            Self::Grid4x3 => 4,
        }
    }

    pub fn rows(self) -> usize {
        match self {
            Self::Grid2x2 | Self::Grid3x2 => 2,
            Self::Grid3x3 | Self::Grid4x3 => 3,
        }
    }

    /// Next preset in the closed cycle, for the preset hotkey.
    pub fn next(self) -> Self {
        match self {
            Self::Grid2x2 => Self::Grid3x2,
            Self::Grid3x2 => Self::Grid3x3,
            Self::Grid3x3 => Self::Grid4x3,
            Self::Grid4x3 => Self::Grid2x2,
        }
    }
}

// ── SlotGrid ────────────────────────────────────────────────────────

/// The logical tile grid: an ordered, nullable slot list plus the active
/// preset and the currently viewed page.
///
/// Invariant: `slots.len() >= layout.capacity()` after every mutation,
/// and `page < page_count()` at all times. The page index is view state
/// and is not persisted.
#[derive(Debug, Clone)]
pub struct SlotGrid {
    layout: LayoutPreset,
    slots: Vec<Option<Slot>>,
    page: usize,
}

impl SlotGrid {
    pub fn new(layout: LayoutPreset) -> Self {
        Self {
            layout,
            slots: vec![None; layout.capacity()],
            page: 0,
        }
    }

    /// Rebuild from a persisted config, re-establishing the capacity
    /// invariant (a saved list may be shorter than the saved preset's
    /// capacity if it was written by an older build).
    pub fn from_config(config: PersistedConfig) -> Self {
        let mut grid = Self {
            layout: config.layout,
            slots: config.slots,
            page: 0,
        };
        grid.ensure_capacity(grid.layout);
        grid
    }

    pub fn to_config(&self) -> PersistedConfig {
        PersistedConfig {
            layout: self.layout,
            slots: self.slots.clone(),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn layout(&self) -> LayoutPreset {
        self.layout
    }

    pub fn slots(&self) -> &[Option<Slot>] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Number of pages the configured slot list spans under the active
    /// preset. Always at least 1 because the list never shrinks below
    /// one page's capacity.
    pub fn page_count(&self) -> usize {
        self.slots.len().div_ceil(self.layout.capacity())
    }

    /// The active page's cells, zero-padded to exactly `capacity` when
    /// the trailing slice is short.
    pub fn page_slots(&self) -> Vec<Option<&Slot>> {
        let capacity = self.layout.capacity();
        let start = self.page * capacity;
        (start..start + capacity)
            .map(|i| self.slots.get(i).and_then(Option::as_ref))
            .collect()
    }

    /// Translate a cell position on the active page to its global slot
    /// index. Drag and edit operations always work on global indices.
    pub fn global_index(&self, cell: usize) -> usize {
        self.page * self.layout.capacity() + cell
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Grow the slot list (never shrink) to at least `preset.capacity()`.
    pub fn ensure_capacity(&mut self, preset: LayoutPreset) {
        let capacity = preset.capacity();
        if self.slots.len() < capacity {
            self.slots.resize(capacity, None);
        }
    }

    /// Switch the active preset. Never truncates the slot list; resets
    /// the view to page 0 (which also satisfies the page clamp).
    pub fn set_layout(&mut self, preset: LayoutPreset) {
        self.layout = preset;
        self.ensure_capacity(preset);
        self.page = 0;
    }

    /// Bind a slot, growing the list if the index is out of bounds.
    pub fn set_slot(&mut self, index: usize, slot: Slot) {
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        self.slots[index] = Some(slot);
    }

    /// Clear a slot to empty. Out-of-range indices are a no-op.
    pub fn clear_slot(&mut self, index: usize) {
        if let Some(entry) = self.slots.get_mut(index) {
            *entry = None;
        }
    }

    /// Exchange two entries in place, growing the list to cover both
    /// indices first. Null-for-occupied swaps are valid.
    pub fn swap(&mut self, i: usize, j: usize) {
        let needed = i.max(j) + 1;
        if needed > self.slots.len() {
            self.slots.resize(needed, None);
        }
        self.slots.swap(i, j);
    }

    // ── Paging ───────────────────────────────────────────────────────

    pub fn set_page(&mut self, page: usize) {
        self.page = page.min(self.page_count() - 1);
    }

    pub fn next_page(&mut self) {
        self.set_page(self.page + 1);
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1);
    }

    // ── Registry reconciliation ──────────────────────────────────────

    /// Null out slots whose device no longer exists in the registry.
    ///
    /// Called only on an explicit registry refresh that confirms removal
    /// — a device that merely fails to resolve mid-session renders as
    /// present-but-missing so user configuration is not silently lost.
    /// Returns the number of slots cleared.
    pub fn prune_missing(&mut self, live: &HashSet<DeviceId>) -> usize {
        let mut cleared = 0;
        for entry in &mut self.slots {
            if let Some(slot) = entry {
                if !live.contains(&slot.device) {
                    *entry = None;
                    cleared += 1;
                }
            }
        }
        cleared
    }
}

impl Default for SlotGrid {
    fn default() -> Self {
        Self::new(LayoutPreset::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    fn slot(device: &str, interface: &str) -> Slot {
        Slot::new(DeviceId::new(device), interface)
    }

    #[test]
    fn preset_capacity_is_constant() {
        for preset in LayoutPreset::iter() {
            assert_eq!(preset.capacity(), preset.columns() * preset.rows());
            // Twice for good measure: pure function of the tag.
            assert_eq!(preset.capacity(), preset.capacity());
        }
        assert_eq!(LayoutPreset::Grid2x2.capacity(), 4);
        assert_eq!(LayoutPreset::Grid3x2.capacity(), 6);
        assert_eq!(LayoutPreset::Grid3x3.capacity(), 9);
        assert_eq!(LayoutPreset::Grid4x3.capacity(), 12);
    }

    #[test]
    fn preset_token_round_trip() {
        for preset in LayoutPreset::iter() {
            let token = preset.to_string();
            assert_eq!(token.parse::<LayoutPreset>().unwrap(), preset);
        }
    }

    #[test]
    fn ensure_capacity_grows_never_shrinks() {
        let mut grid = SlotGrid::new(LayoutPreset::Grid4x3);
        assert_eq!(grid.slots().len(), 12);

        grid.ensure_capacity(LayoutPreset::Grid2x2);
        assert_eq!(grid.slots().len(), 12);

        let mut small = SlotGrid::new(LayoutPreset::Grid2x2);
        small.ensure_capacity(LayoutPreset::Grid3x3);
        assert_eq!(small.slots().len(), 9);
    }

    #[test]
    fn set_slot_grows_out_of_bounds() {
        let mut grid = SlotGrid::new(LayoutPreset::Grid2x2);
        grid.set_slot(10, slot("rb-4011", "ether1"));

        assert_eq!(grid.slots().len(), 11);
        assert_eq!(grid.slot(10).unwrap().interface, "ether1");
        assert!(grid.slot(4).is_none());
    }

    #[test]
    fn preset_change_keeps_slots_and_resets_page() {
        let mut grid = SlotGrid::new(LayoutPreset::Grid2x2);
        for i in 0..11 {
            grid.set_slot(i, slot("rb-4011", &format!("ether{i}")));
        }
        grid.set_page(2);
        assert_eq!(grid.page(), 2);

        grid.set_layout(LayoutPreset::Grid3x3);
        assert_eq!(grid.page(), 0);
        assert_eq!(grid.slots().len(), 11);
    }

    #[test]
    fn pagination_example_eleven_slots_on_3x3() {
        // Preset 3×3 (capacity 9) with 11 configured slots → two pages;
        // page 1 shows slots 9–10 padded with 7 empty cells.
        let mut grid = SlotGrid::new(LayoutPreset::Grid3x3);
        for i in 0..11 {
            grid.set_slot(i, slot("rb-4011", &format!("ether{i}")));
        }

        assert_eq!(grid.page_count(), 2);

        let page0 = grid.page_slots();
        assert_eq!(page0.len(), 9);
        assert!(page0.iter().all(Option::is_some));
        assert_eq!(page0[0].unwrap().interface, "ether0");
        assert_eq!(page0[8].unwrap().interface, "ether8");

        grid.next_page();
        let page1 = grid.page_slots();
        assert_eq!(page1.len(), 9);
        assert_eq!(page1[0].unwrap().interface, "ether9");
        assert_eq!(page1[1].unwrap().interface, "ether10");
        assert!(page1[2..].iter().all(Option::is_none));
    }

    #[test]
    fn page_clamps_after_capacity_change() {
        let mut grid = SlotGrid::new(LayoutPreset::Grid2x2);
        for i in 0..8 {
            grid.set_slot(i, slot("hex-s", &format!("ether{i}")));
        }
        grid.set_page(1);

        // 8 slots at capacity 12 → single page; stale page index clamps.
        grid.set_layout(LayoutPreset::Grid4x3);
        assert_eq!(grid.page_count(), 1);
        grid.set_page(5);
        assert_eq!(grid.page(), 0);
    }

    #[test]
    fn swap_exchanges_exactly_two_entries() {
        let mut grid = SlotGrid::new(LayoutPreset::Grid3x3);
        for i in 0..9 {
            grid.set_slot(i, slot("rb-4011", &format!("ether{i}")));
        }
        grid.clear_slot(7);
        let before: Vec<_> = grid.slots().to_vec();

        grid.swap(2, 7);

        // Occupied-for-null swap: 2 is now empty, 7 holds ether2.
        assert!(grid.slot(2).is_none());
        assert_eq!(grid.slot(7).unwrap().interface, "ether2");
        for (i, entry) in grid.slots().iter().enumerate() {
            if i != 2 && i != 7 {
                assert_eq!(entry, &before[i]);
            }
        }
    }

    #[test]
    fn prune_missing_clears_only_dead_devices() {
        let mut grid = SlotGrid::new(LayoutPreset::Grid2x2);
        grid.set_slot(0, slot("rb-4011", "ether1"));
        grid.set_slot(1, slot("retired", "ether1"));
        grid.set_slot(3, slot("retired", "wlan1"));

        let live: HashSet<DeviceId> = [DeviceId::new("rb-4011")].into_iter().collect();
        let cleared = grid.prune_missing(&live);

        assert_eq!(cleared, 2);
        assert!(grid.slot(0).is_some());
        assert!(grid.slot(1).is_none());
        assert!(grid.slot(3).is_none());
    }

    #[test]
    fn global_index_spans_pages() {
        let mut grid = SlotGrid::new(LayoutPreset::Grid2x2);
        for i in 0..8 {
            grid.set_slot(i, slot("rb-4011", &format!("ether{i}")));
        }
        grid.next_page();
        assert_eq!(grid.global_index(1), 5);
    }
}
