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

use super::{get_test_memory, init_logger, read_pte, RecordingModule};
use crate::{
    modules::page_fault_handler::DemandPagingModule, Access, MemoryError, PageFaultReason,
    PhysicalMemory, PhysicalMemoryConfig, Privilege, VirtualMemory,
};

#[test]
fn test_simulation_scenario() {
    const ADDRESS: u32 = 0x1234_5678;
    const VALUE: u32 = 0xDEAD_BEEF;

    let mut memory = get_test_memory();
    let mut handler = RecordingModule::default();
    let mut vm = VirtualMemory::new(&mut memory, &mut handler);
    vm.set_page_table_address(0).unwrap();

    vm.write32(ADDRESS, VALUE, Privilege::User).unwrap();
    assert_eq!(vm.read32(ADDRESS, Privilege::User, false), Ok(VALUE));

    // frame 1 was allocated, data lies at the page offset
    assert_eq!(vm.physical_memory().read32(0x1678), Ok(VALUE));

    let pte = read_pte(&mut memory, 0, ADDRESS >> 12);
    assert!(pte.is_present());
    assert!(pte.is_accessed());
    assert!(pte.is_dirty());
    assert_eq!(pte.get_frame(), 1);

    assert_eq!(
        handler.faults,
        vec![(0x12345, Access::Write, PageFaultReason::NotPresent)]
    );
    assert_eq!(handler.inner.next_free_frame(), 2);
}

#[test]
fn test_first_write_faults_exactly_once() {
    const ADDRESS: u32 = 0x1000;

    let mut memory = get_test_memory();
    let mut handler = RecordingModule::default();
    let mut vm = VirtualMemory::new(&mut memory, &mut handler);

    vm.write32(ADDRESS, 1, Privilege::User).unwrap();
    vm.write32(ADDRESS + 4, 2, Privilege::User).unwrap();
    vm.write16(ADDRESS + 0xFFE, 3, Privilege::Supervisor).unwrap();
    assert_eq!(vm.read32(ADDRESS, Privilege::User, false), Ok(1));
    assert_eq!(vm.read32(ADDRESS + 4, Privilege::User, false), Ok(2));
    assert_eq!(vm.read16(ADDRESS + 0xFFE, Privilege::User, false), Ok(3));

    let pte = read_pte(&mut memory, 0, 1);
    assert!(pte.is_present());
    assert!(pte.is_writable());
    assert!(pte.is_user());
    assert!(pte.is_accessed());
    assert!(pte.is_dirty());

    assert_eq!(handler.faults.len(), 1);
    assert_eq!(handler.faults[0], (1, Access::Write, PageFaultReason::NotPresent));
}

#[test]
fn test_first_read_maps_zeroed_page() {
    let mut memory = get_test_memory();
    let mut handler = RecordingModule::default();
    let mut vm = VirtualMemory::new(&mut memory, &mut handler);
    vm.set_page_table_address(0x8_0000).unwrap();

    assert_eq!(vm.read64(0x0040_0008, Privilege::User, false), Ok(0));

    let pte = read_pte(&mut memory, 0x8_0000, 0x400);
    assert!(pte.is_present());
    assert!(pte.is_accessed());
    assert!(!pte.is_dirty());
    assert_eq!(
        handler.faults,
        vec![(0x400, Access::Read, PageFaultReason::NotPresent)]
    );
}

#[test]
fn test_distinct_pages_get_distinct_frames() {
    let mut memory = get_test_memory();
    let mut handler = DemandPagingModule::new();
    let mut vm = VirtualMemory::new(&mut memory, &mut handler);
    vm.set_page_table_address(0x8_0000).unwrap();

    for page in 0..8u32 {
        vm.write64(page << 12, page as u64 * 11, Privilege::User).unwrap();
    }
    for page in 0..8u32 {
        assert_eq!(vm.read64(page << 12, Privilege::User, false), Ok(page as u64 * 11));
    }

    for page in 0..8u32 {
        assert_eq!(read_pte(&mut memory, 0x8_0000, page).get_frame(), page + 1);
    }
    assert_eq!(handler.allocated_frames(), 8);
}

#[test]
fn test_physical_memory_exhaustion() {
    init_logger();

    // frame 0 holds the page table, frames 1 to 3 are free
    let mut memory = PhysicalMemory::new(PhysicalMemoryConfig {
        frame_count: 4,
        frame_size: 4096,
    })
    .unwrap();
    let mut handler = DemandPagingModule::new();
    let mut vm = VirtualMemory::new(&mut memory, &mut handler);

    for page in 10..13u32 {
        vm.write32(page << 12, page, Privilege::User).unwrap();
    }
    assert_eq!(vm.handler().next_free_frame(), 4);

    assert_eq!(
        vm.write32(13 << 12, 13, Privilege::User),
        Err(MemoryError::UnhandledPageFault {
            address: 13 << 12,
            access: Access::Write,
            reason: PageFaultReason::NotPresent
        })
    );
    assert_eq!(vm.handler().next_free_frame(), 4);

    let err = vm.read32(14 << 12, Privilege::User, false).unwrap_err();
    assert_eq!(err.fault_reason(), Some(PageFaultReason::NotPresent));
    assert_eq!(vm.handler().next_free_frame(), 4);

    // mapped pages keep working
    for page in 10..13u32 {
        assert_eq!(vm.read32(page << 12, Privilege::User, false), Ok(page));
    }
}
