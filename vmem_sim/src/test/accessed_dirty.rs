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

use proptest::prelude::*;

use super::{create_page, get_test_memory, read_pte};
use crate::{
    modules::page_fault_handler::DemandPagingModule, AccessStats, PageTable, Privilege,
    VirtualMemory,
};

#[test]
fn test_read_sets_accessed_bit() {
    const VPN: u32 = 50;
    const ADDRESS: u32 = VPN << 12;

    let mut memory = get_test_memory();
    create_page(&mut memory, 0, VPN, 7, true, true);

    let mut handler = DemandPagingModule::new();
    let mut vm = VirtualMemory::new(&mut memory, &mut handler);
    vm.read32(ADDRESS, Privilege::User, false).unwrap();

    let pte = read_pte(&mut memory, 0, VPN);
    assert!(pte.is_accessed());
    assert!(!pte.is_dirty());
}

#[test]
fn test_read_keeps_dirty_bit() {
    const VPN: u32 = 51;

    let mut memory = get_test_memory();
    let mut pte = create_page(&mut memory, 0, VPN, 7, true, true);
    pte.set_dirty(true);
    PageTable::new(&mut memory, 0).write_entry(VPN, pte).unwrap();

    let mut handler = DemandPagingModule::new();
    let mut vm = VirtualMemory::new(&mut memory, &mut handler);
    vm.read8(VPN << 12, Privilege::User, false).unwrap();

    let pte = read_pte(&mut memory, 0, VPN);
    assert!(pte.is_accessed());
    assert!(pte.is_dirty());
}

#[test]
fn test_write_sets_accessed_and_dirty_bits() {
    const VPN: u32 = 60;
    const ADDRESS: u32 = VPN << 12;

    let mut memory = get_test_memory();
    create_page(&mut memory, 0, VPN, 8, true, true);

    let mut handler = DemandPagingModule::new();
    let mut vm = VirtualMemory::new(&mut memory, &mut handler);
    vm.write32(ADDRESS, 123, Privilege::User).unwrap();

    let pte = read_pte(&mut memory, 0, VPN);
    assert!(pte.is_accessed());
    assert!(pte.is_dirty());
    assert_eq!(pte.get_frame(), 8);
}

#[test]
fn test_entry_is_written_back_only_on_change() {
    const VPN: u32 = 70;
    const ADDRESS: u32 = VPN << 12;

    let mut memory = get_test_memory();
    create_page(&mut memory, 0, VPN, 9, true, true);
    memory.reset_access_stats();

    let mut handler = DemandPagingModule::new();
    let mut vm = VirtualMemory::new(&mut memory, &mut handler);

    // entry read, entry written back, data read
    vm.read32(ADDRESS, Privilege::User, false).unwrap();
    assert_eq!(vm.physical_memory().access_stats(), AccessStats { reads: 2, writes: 1 });

    // accessed bit already set: no write back
    vm.read32(ADDRESS, Privilege::User, false).unwrap();
    assert_eq!(vm.physical_memory().access_stats(), AccessStats { reads: 4, writes: 1 });

    // dirty bit is new: entry and data are written
    vm.write32(ADDRESS, 5, Privilege::User).unwrap();
    assert_eq!(vm.physical_memory().access_stats(), AccessStats { reads: 5, writes: 3 });

    // both bits already set: only the data is written
    vm.write32(ADDRESS, 6, Privilege::User).unwrap();
    assert_eq!(vm.physical_memory().access_stats(), AccessStats { reads: 6, writes: 4 });

    vm.read32(ADDRESS, Privilege::User, false).unwrap();
    assert_eq!(vm.physical_memory().access_stats(), AccessStats { reads: 8, writes: 4 });
}

#[test]
fn test_widths_round_trip() {
    let mut memory = get_test_memory();
    let mut handler = DemandPagingModule::new();
    let mut vm = VirtualMemory::new(&mut memory, &mut handler);

    vm.write8(0x5001, 0xAB, Privilege::User).unwrap();
    vm.write16(0x5002, 0xCDEF, Privilege::User).unwrap();
    vm.write32(0x5004, 0x0123_4567, Privilege::User).unwrap();
    vm.write64(0x5008, 0x89AB_CDEF_0123_4567, Privilege::User).unwrap();

    assert_eq!(vm.read8(0x5000, Privilege::User, false), Ok(0));
    assert_eq!(vm.read8(0x5001, Privilege::User, false), Ok(0xAB));
    assert_eq!(vm.read16(0x5002, Privilege::User, false), Ok(0xCDEF));
    assert_eq!(vm.read32(0x5004, Privilege::User, false), Ok(0x0123_4567));
    assert_eq!(vm.read64(0x5008, Privilege::User, false), Ok(0x89AB_CDEF_0123_4567));
}

proptest! {
    #[test]
    fn prop_write_read_round_trip(page in 0u32..0x4000, slot in 0u32..512, value: u64) {
        // page table above all frames the pager hands out here
        const BASE: u32 = 0xC_0000;
        let address = (page << 12) | (slot << 3);

        let mut memory = get_test_memory();
        let mut handler = DemandPagingModule::new();
        let mut vm = VirtualMemory::new(&mut memory, &mut handler);
        vm.set_page_table_address(BASE).unwrap();

        vm.write64(address, value, Privilege::User).unwrap();
        prop_assert_eq!(vm.read64(address, Privilege::User, false), Ok(value));
        let mut low = [0u8; 4];
        low.copy_from_slice(&value.to_ne_bytes()[..4]);
        prop_assert_eq!(vm.read32(address, Privilege::Supervisor, false), Ok(u32::from_ne_bytes(low)));

        let pte = read_pte(&mut memory, BASE, page);
        prop_assert!(pte.is_present() && pte.is_accessed() && pte.is_dirty());
    }
}
