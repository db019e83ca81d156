//! Buffer diffing for incremental presents.

use crate::buffer::ScreenBuffer;

/// A horizontal run of changed cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirtyRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
}

/// Result of diffing two buffers.
#[derive(Clone, Debug, Default)]
pub struct BufferDiff {
    /// Changed runs, in row-major order.
    pub dirty_regions: Vec<DirtyRegion>,
    /// Total number of changed cells.
    pub change_count: usize,
}

impl BufferDiff {
    /// Compare two buffers and find differences.
    ///
    /// Buffers of different sizes diff as "everything changed".
    #[must_use]
    pub fn compute(old: &ScreenBuffer, new: &ScreenBuffer) -> Self {
        let (width, height) = new.size();
        if old.size() != new.size() {
            let dirty_regions = (0..height)
                .filter(|_| width > 0)
                .map(|y| DirtyRegion { x: 0, y, width })
                .collect();
            return Self {
                dirty_regions,
                change_count: (width as usize).saturating_mul(height as usize),
            };
        }

        let old_cells = old.cells();
        let new_cells = new.cells();
        let mut dirty_regions = Vec::new();
        let mut change_count = 0;

        for y in 0..height {
            let row_offset = (y as usize) * (width as usize);
            let mut run: Option<DirtyRegion> = None;
            for x in 0..width {
                let idx = row_offset + x as usize;
                if old_cells[idx] == new_cells[idx] {
                    if let Some(region) = run.take() {
                        dirty_regions.push(region);
                    }
                    continue;
                }
                change_count += 1;
                match run.as_mut() {
                    Some(region) => region.width += 1,
                    None => run = Some(DirtyRegion { x, y, width: 1 }),
                }
            }
            if let Some(region) = run {
                dirty_regions.push(region);
            }
        }

        Self {
            dirty_regions,
            change_count,
        }
    }

    /// Check if there are any changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.change_count == 0
    }

    /// Calculate if a full redraw is more efficient.
    #[must_use]
    pub fn should_full_redraw(&self, total_cells: usize) -> bool {
        // If more than 50% changed, full redraw is likely faster
        self.change_count > total_cells / 2
    }
}
