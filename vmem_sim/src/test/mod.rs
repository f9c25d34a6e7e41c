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

use crate::{
    modules::page_fault_handler::{DemandPagingModule, PageFaultHandlerModule},
    Access, MemoryResult, PageFaultReason, PageTable, PageTableEntry, PhysicalMemory,
    PhysicalMemoryConfig,
};

mod accessed_dirty;
mod demand_paging;

pub(crate) const TEST_FRAME_COUNT: u32 = 256;

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn get_test_memory() -> PhysicalMemory {
    init_logger();

    PhysicalMemory::new(PhysicalMemoryConfig {
        frame_count: TEST_FRAME_COUNT,
        ..Default::default()
    })
    .unwrap()
}

/// Installs a present mapping `vpn -> pfn` in the page table at `base`
pub(crate) fn create_page(
    memory: &mut PhysicalMemory,
    base: u32,
    vpn: u32,
    pfn: u32,
    writable: bool,
    user: bool,
) -> PageTableEntry {
    let mut pte = PageTableEntry::default();
    pte.set_present(true);
    pte.set_writable(writable);
    pte.set_user(user);
    pte.set_frame(pfn);

    PageTable::new(memory, base).write_entry(vpn, pte).unwrap();
    pte
}

pub(crate) fn read_pte(memory: &mut PhysicalMemory, base: u32, vpn: u32) -> PageTableEntry {
    PageTable::new(memory, base).read_entry(vpn).unwrap()
}

/// Demand pager that remembers every fault it was asked to handle
#[derive(Default)]
pub(crate) struct RecordingModule {
    pub(crate) inner: DemandPagingModule,
    pub(crate) faults: Vec<(u32, Access, PageFaultReason)>,
}

impl PageFaultHandlerModule for RecordingModule {
    fn on_page_fault(
        &mut self,
        page_table: &mut PageTable<'_>,
        virtual_page_number: u32,
        access: Access,
        reason: PageFaultReason,
    ) -> MemoryResult<bool> {
        self.faults.push((virtual_page_number, access, reason));
        self.inner
            .on_page_fault(page_table, virtual_page_number, access, reason)
    }
}
