//! Pixel claim table and the write view handed to routines.
//!
//! Every pixel carries the tier of its current claim and the last color
//! written to it. A writer may replace a claim only when its requested tier
//! ranks at least as high, and while a transition is fencing the table the
//! phasing and active ladders may not cross.

use crate::color::Rgb;
use crate::list::{IndexList, ListId};
use crate::tier::{Rung, Tier};

/// The claim recorded against one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelClaim {
    pub tier: Tier,
    pub color: Rgb,
}

/// One record per output pixel, allocated once.
#[derive(Debug, Clone)]
pub struct ClaimTable {
    width: usize,
    height: usize,
    pixels: Vec<PixelClaim>,
    fence: bool,
    written: usize,
    remembered: IndexList,
}

impl ClaimTable {
    /// Create a `width` x `height` table with every pixel unclaimed and black.
    /// `slots` bounds how many remembered-pixel lists exist.
    pub fn new(width: usize, height: usize, slots: usize) -> Self {
        let len = width * height;
        Self {
            width,
            height,
            pixels: vec![PixelClaim::default(); len],
            fence: false,
            written: 0,
            remembered: IndexList::new(len, slots),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Row-major index with the origin at the top-left corner.
    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        let (x, y) = self.in_bounds(x, y)?;
        Some(self.width * y + x)
    }

    /// Row-major index with the origin at the bottom-left corner.
    pub fn index_bottom_left(&self, x: i32, y: i32) -> Option<usize> {
        let (x, y) = self.in_bounds(x, y)?;
        Some(self.width * (self.height - 1 - y) + x)
    }

    fn in_bounds(&self, x: i32, y: i32) -> Option<(usize, usize)> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        (x < self.width && y < self.height).then_some((x, y))
    }

    pub fn claim(&self, index: usize) -> Option<PixelClaim> {
        self.pixels.get(index).copied()
    }

    pub fn pixels(&self) -> &[PixelClaim] {
        &self.pixels
    }

    /// True while a transition keeps the phasing and active ladders apart.
    pub fn is_fenced(&self) -> bool {
        self.fence
    }

    pub fn set_fence(&mut self, on: bool) {
        self.fence = on;
    }

    /// Writes committed since the last [`ClaimTable::reset_written`].
    /// A pixel written twice counts twice.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn reset_written(&mut self) {
        self.written = 0;
    }

    /// Whether a write at `requested` may land on pixel `index`.
    /// Out-of-range indices are never writable.
    pub fn can_write(&self, requested: Tier, index: usize) -> bool {
        let Some(pixel) = self.pixels.get(index) else {
            return false;
        };
        if requested < pixel.tier && pixel.tier != Tier::Blend {
            return false;
        }
        if !self.fence || Self::crosses_fence(requested) {
            return true;
        }
        requested.is_phasing() == pixel.tier.is_phasing()
    }

    fn crosses_fence(requested: Tier) -> bool {
        matches!(requested, Tier::Transition | Tier::Active(Rung::HighPersistent))
    }

    /// Record `color` and the claim at `requested`.
    ///
    /// Callers check [`ClaimTable::can_write`] first. Writing the clear color
    /// at a persistent or transition tier hands the pixel back immediately.
    pub fn commit_write(&mut self, requested: Tier, index: usize, color: Rgb) {
        let Some(pixel) = self.pixels.get_mut(index) else {
            return;
        };
        pixel.color = color;
        pixel.tier = match requested {
            Tier::Phasing(Rung::HighPersistent) if color.is_clear() => Tier::PHASING_LOW,
            Tier::Active(Rung::HighPersistent) | Tier::Transition if color.is_clear() => Tier::LOW,
            other => other,
        };
        self.written += 1;
    }

    /// `can_write` followed by `commit_write`. Returns whether the write landed.
    pub fn write(&mut self, requested: Tier, index: usize, color: Rgb) -> bool {
        if !self.can_write(requested, index) {
            return false;
        }
        self.commit_write(requested, index, color);
        true
    }

    /// Open pixel `index` to every writer until the next decay.
    pub fn mark_blend(&mut self, index: usize) {
        if let Some(pixel) = self.pixels.get_mut(index) {
            pixel.tier = Tier::Blend;
        }
    }

    /// End-of-frame decay over the whole table.
    pub fn end_of_frame_decay(&mut self) {
        for pixel in &mut self.pixels {
            pixel.tier = pixel.tier.decayed();
        }
    }

    /// Push every claim onto the phasing ladder at its lowest rung and raise the
    /// fence. Colors stay so retiring content keeps showing until overwritten.
    pub fn demote_all_to_phasing(&mut self) {
        for pixel in &mut self.pixels {
            pixel.tier = Tier::PHASING_LOW;
        }
        self.fence = true;
    }

    /// Drop the fence and free whatever retiring content still holds.
    pub fn finish_transition(&mut self) {
        for pixel in &mut self.pixels {
            if pixel.tier.is_phasing() {
                pixel.tier = Tier::LOW;
            }
        }
        self.fence = false;
    }

    /// Hard cut: every pixel unclaimed and painted `background`.
    pub fn clear(&mut self, background: Rgb) {
        for pixel in &mut self.pixels {
            *pixel = PixelClaim {
                tier: Tier::LOW,
                color: background,
            };
        }
        self.fence = false;
    }

    /// Copy every pixel color into `out`, row-major. Extra entries on either
    /// side are left alone.
    pub fn commit_into(&self, out: &mut [Rgb]) {
        for (dst, src) in out.iter_mut().zip(&self.pixels) {
            *dst = src.color;
        }
    }

    /// Add pixel `index` to `slot`'s remembered list. A pixel belongs to at
    /// most one slot; remembering a pixel the slot already holds is a no-op.
    pub fn remember(&mut self, slot: usize, index: usize) -> bool {
        match self.remembered.owner(index) {
            Some(ListId(owner)) => owner == slot,
            None => self.remembered.push_back(ListId(slot), index).is_ok(),
        }
    }

    pub fn forget(&mut self, slot: usize, index: usize) -> bool {
        self.remembered.remove(ListId(slot), index).is_ok()
    }

    pub fn remembered_by(&self, index: usize) -> Option<usize> {
        self.remembered.owner(index).map(|l| l.0)
    }

    pub fn remembered_count(&self, slot: usize) -> usize {
        self.remembered.len(ListId(slot))
    }

    pub fn first_remembered(&self, slot: usize) -> Option<usize> {
        self.remembered.first(ListId(slot))
    }

    pub fn next_remembered(&self, index: usize) -> Option<usize> {
        self.remembered.next(index)
    }

    /// Drop `slot`'s remembered list, returning each pixel to the unclaimed
    /// tier of its ladder. Returns how many pixels were released.
    pub fn release_remembered(&mut self, slot: usize) -> usize {
        let list = ListId(slot);
        let mut released = 0;
        while let Some(index) = self.remembered.first(list) {
            if self.remembered.remove(list, index).is_err() {
                break;
            }
            let pixel = &mut self.pixels[index];
            pixel.tier = pixel.tier.released();
            released += 1;
        }
        released
    }

    /// A write view for `slot` drawing at `tier`.
    pub fn canvas(&mut self, slot: usize, tier: Tier, now_ms: u64, elapsed_ms: u64) -> Canvas<'_> {
        Canvas {
            table: self,
            slot,
            tier,
            now_ms,
            elapsed_ms,
        }
    }
}

/// What a routine sees of the claim table while it draws.
///
/// Every write goes through the claim protocol at the slot's current tier;
/// out-of-range indices and coordinates are ignored.
#[derive(Debug)]
pub struct Canvas<'a> {
    table: &'a mut ClaimTable,
    slot: usize,
    tier: Tier,
    now_ms: u64,
    elapsed_ms: u64,
}

impl Canvas<'_> {
    pub fn write(&mut self, index: usize, color: Rgb) -> bool {
        self.table.write(self.tier, index, color)
    }

    pub fn write_xy(&mut self, x: i32, y: i32, color: Rgb) -> bool {
        match self.table.index(x, y) {
            Some(i) => self.write(i, color),
            None => false,
        }
    }

    /// Write, then leave the pixel open to every writer for the rest of the frame.
    pub fn write_blended(&mut self, index: usize, color: Rgb) -> bool {
        let landed = self.write(index, color);
        if landed {
            self.table.mark_blend(index);
        }
        landed
    }

    pub fn can_write(&self, index: usize) -> bool {
        self.table.can_write(self.tier, index)
    }

    pub fn color(&self, index: usize) -> Option<Rgb> {
        self.table.claim(index).map(|c| c.color)
    }

    pub fn claim(&self, index: usize) -> Option<PixelClaim> {
        self.table.claim(index)
    }

    pub fn width(&self) -> usize {
        self.table.width()
    }

    pub fn height(&self) -> usize {
        self.table.height()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        self.table.index(x, y)
    }

    pub fn index_bottom_left(&self, x: i32, y: i32) -> Option<usize> {
        self.table.index_bottom_left(x, y)
    }

    pub fn remember(&mut self, index: usize) -> bool {
        self.table.remember(self.slot, index)
    }

    pub fn forget(&mut self, index: usize) -> bool {
        self.table.forget(self.slot, index)
    }

    pub fn first_remembered(&self) -> Option<usize> {
        self.table.first_remembered(self.slot)
    }

    pub fn next_remembered(&self, index: usize) -> Option<usize> {
        self.table.next_remembered(index)
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// The caller's clock at the start of this frame.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Time since this slot was activated.
    ///
    /// The clock starts on the slot's first drawn frame after the swap that
    /// activated it, since `swap` has no clock of its own. The pacer makes
    /// that frame due at once, but if the caller draws late the whole
    /// transition shifts by the delay.
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Writes landed by every slot so far this frame.
    pub fn written(&self) -> usize {
        self.table.written()
    }
}
