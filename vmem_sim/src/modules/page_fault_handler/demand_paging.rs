/*
 *  Copyright (C) 2025  Markus Elias Gerber
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use log::{info, warn};

use crate::{
    page_table_entry::PageTableEntry,
    virtual_memory::{Access, PageFaultReason, PageTable},
    MemoryResult,
};

use super::PageFaultHandlerModule;

/// Allocates a fresh frame the first time a page is touched.
///
/// Frames are handed out in ascending order, starting at frame 1.
/// Frame 0 is reserved. Frames are never freed, and protection faults are
/// never repaired.
pub struct DemandPagingModule {
    next_free_frame: u32,
}

impl DemandPagingModule {
    pub const FIRST_FRAME: u32 = 1;

    pub fn new() -> Self {
        Self {
            next_free_frame: Self::FIRST_FRAME,
        }
    }

    /// Frame that is handed out on the next successful allocation
    #[inline]
    pub fn next_free_frame(&self) -> u32 {
        self.next_free_frame
    }

    #[inline]
    pub fn allocated_frames(&self) -> u32 {
        self.next_free_frame - Self::FIRST_FRAME
    }
}

impl Default for DemandPagingModule {
    fn default() -> Self {
        Self::new()
    }
}

impl PageFaultHandlerModule for DemandPagingModule {
    fn on_page_fault(
        &mut self,
        page_table: &mut PageTable<'_>,
        virtual_page_number: u32,
        access: Access,
        reason: PageFaultReason,
    ) -> MemoryResult<bool> {
        if reason != PageFaultReason::NotPresent {
            warn!(
                "Cannot fix page fault ({}) on {} of virtual page {}",
                reason, access, virtual_page_number
            );
            return Ok(false);
        }

        // the counter only advances once the mapping is installed
        let frame = self.next_free_frame;
        let frame_address = (frame as u64) << PageTableEntry::FRAME_SHIFT;
        if frame_address >= page_table.physical_memory().get_size() as u64 {
            warn!(
                "Out of physical memory: cannot map virtual page {} to frame {}",
                virtual_page_number, frame
            );
            return Ok(false);
        }

        let mut pte = PageTableEntry::default();
        pte.set_present(true);
        pte.set_writable(true);
        pte.set_user(true);
        pte.set_frame(frame);
        page_table.write_entry(virtual_page_number, pte)?;

        self.next_free_frame = frame + 1;

        info!(
            "Allocated physical frame {} for virtual page {}",
            frame, virtual_page_number
        );
        Ok(true)
    }
}
