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

use core::fmt;

use log::{debug, error, trace};

use crate::{
    modules::page_fault_handler::PageFaultHandlerModule,
    page_table_entry::PageTableEntry,
    physical_memory::{MemoryValue, PhysicalMemory},
    MemoryError, MemoryResult,
};

/// Size of a virtual page and of a physical frame in bytes
pub const PAGE_SIZE: u32 = 1 << PageTableEntry::FRAME_SHIFT;

const PAGE_OFFSET_MASK: u32 = PAGE_SIZE - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Read => f.write_str("read"),
            Access::Write => f.write_str("write"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    User,
    Supervisor,
}

/// Why a translation failed.
///
/// The variants are listed in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFaultReason {
    NotPresent,
    UserAccessToSupervisor,
    WriteToReadOnly,
    ExecOnNX,
}

impl PageFaultReason {
    /// Only a missing mapping can be repaired by installing a new one.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PageFaultReason::NotPresent)
    }
}

impl fmt::Display for PageFaultReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageFaultReason::NotPresent => f.write_str("page not present"),
            PageFaultReason::UserAccessToSupervisor => {
                f.write_str("user access to supervisor page")
            }
            PageFaultReason::WriteToReadOnly => f.write_str("write to read-only page"),
            PageFaultReason::ExecOnNX => f.write_str("execute on no-execute page"),
        }
    }
}

/// Outcome of one translation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslationResult {
    /// entry as it was read from the page table
    pub pte: PageTableEntry,

    /// physical address the entry was read from
    pub pte_address: u32,

    /// physical address on success, otherwise the first failing check
    pub outcome: Result<u32, PageFaultReason>,
}

impl TranslationResult {
    #[inline]
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    #[inline]
    pub fn physical_address(&self) -> Option<u32> {
        self.outcome.ok()
    }

    #[inline]
    pub fn fault_reason(&self) -> Option<PageFaultReason> {
        self.outcome.err()
    }
}

fn entry_address(base_address: u32, virtual_page_number: u32, memory: &PhysicalMemory) -> MemoryResult<u32> {
    let address = base_address as u64 + virtual_page_number as u64 * PageTableEntry::SIZE as u64;
    u32::try_from(address).map_err(|_| MemoryError::OutOfRange {
        address: base_address,
        width: PageTableEntry::SIZE,
        size: memory.get_size(),
    })
}

/// Flat page table inside of the physical memory, handed to page fault handlers.
pub struct PageTable<'a> {
    memory: &'a mut PhysicalMemory,
    base_address: u32,
}

impl<'a> PageTable<'a> {
    pub fn new(memory: &'a mut PhysicalMemory, base_address: u32) -> Self {
        Self {
            memory,
            base_address,
        }
    }

    #[inline]
    pub fn base_address(&self) -> u32 {
        self.base_address
    }

    /// Physical address of the entry that maps `virtual_page_number`
    pub fn entry_address(&self, virtual_page_number: u32) -> MemoryResult<u32> {
        entry_address(self.base_address, virtual_page_number, &*self.memory)
    }

    pub fn read_entry(&self, virtual_page_number: u32) -> MemoryResult<PageTableEntry> {
        let address = self.entry_address(virtual_page_number)?;
        Ok(PageTableEntry::from_raw(self.memory.read32(address)?))
    }

    pub fn write_entry(&mut self, virtual_page_number: u32, pte: PageTableEntry) -> MemoryResult<()> {
        let address = self.entry_address(virtual_page_number)?;
        trace!(
            "Write page table entry {:#010x} for virtual page {} to {:#x}",
            pte.raw,
            virtual_page_number,
            address
        );
        self.memory.write32(address, pte.raw)
    }

    #[inline]
    pub fn physical_memory(&self) -> &PhysicalMemory {
        &*self.memory
    }

    #[inline]
    pub fn physical_memory_mut(&mut self) -> &mut PhysicalMemory {
        &mut *self.memory
    }
}

/// Translates virtual addresses through a flat page table and performs the access.
///
/// A failing translation is handed to the page fault handler once. If the
/// handler repaired the mapping the translation is retried exactly one time,
/// any further fault is fatal.
///
/// Successful reads set the accessed bit, successful writes set the accessed
/// and dirty bits. The entry is only written back if one of these bits was
/// not set already.
pub struct VirtualMemory<'a, H: PageFaultHandlerModule + ?Sized> {
    memory: &'a mut PhysicalMemory,
    handler: &'a mut H,

    /// physical address of the active page table, always page aligned
    page_table_address: u32,
}

impl<'a, H: PageFaultHandlerModule + ?Sized> VirtualMemory<'a, H> {
    /// The page table starts at physical address `0` until
    /// [`VirtualMemory::set_page_table_address`] is called.
    pub fn new(memory: &'a mut PhysicalMemory, handler: &'a mut H) -> Self {
        Self {
            memory,
            handler,
            page_table_address: 0,
        }
    }

    pub fn set_page_table_address(&mut self, physical_address: u32) -> MemoryResult<()> {
        if physical_address & PAGE_OFFSET_MASK != 0 {
            return Err(MemoryError::InvalidArgument {
                address: physical_address,
            });
        }

        debug!("Switch page table to {:#x}", physical_address);
        self.page_table_address = physical_address;
        Ok(())
    }

    #[inline]
    pub fn get_page_table_address(&self) -> u32 {
        self.page_table_address
    }

    #[inline]
    pub fn physical_memory(&self) -> &PhysicalMemory {
        &*self.memory
    }

    #[inline]
    pub fn physical_memory_mut(&mut self) -> &mut PhysicalMemory {
        &mut *self.memory
    }

    /// View of the active page table, e.g. to install mappings up front.
    pub fn page_table(&mut self) -> PageTable<'_> {
        PageTable::new(&mut *self.memory, self.page_table_address)
    }

    #[inline]
    pub fn handler(&self) -> &H {
        &*self.handler
    }

    /// Translates `virtual_address` without invoking the page fault handler
    /// and without touching the accessed or dirty bits.
    ///
    /// Only errors if the page table entry itself cannot be read.
    pub fn translate(
        &self,
        virtual_address: u32,
        access: Access,
        privilege: Privilege,
        execute: bool,
    ) -> MemoryResult<TranslationResult> {
        let virtual_page_number = virtual_address >> PageTableEntry::FRAME_SHIFT;
        let offset = virtual_address & PAGE_OFFSET_MASK;

        let pte_address = entry_address(self.page_table_address, virtual_page_number, &*self.memory)?;
        let pte = PageTableEntry::from_raw(self.memory.read32(pte_address)?);

        let outcome = Self::check_access(&pte, access, privilege, execute)
            .map(|_| (pte.get_frame() << PageTableEntry::FRAME_SHIFT) | offset);

        trace!(
            "Translate {} at {:#x} (page {}, pte {:#010x}): {:?}",
            access,
            virtual_address,
            virtual_page_number,
            pte.raw,
            outcome
        );

        Ok(TranslationResult {
            pte,
            pte_address,
            outcome,
        })
    }

    /// First failing check wins.
    fn check_access(
        pte: &PageTableEntry,
        access: Access,
        privilege: Privilege,
        execute: bool,
    ) -> Result<(), PageFaultReason> {
        if !pte.is_present() {
            return Err(PageFaultReason::NotPresent);
        }

        if privilege == Privilege::User && !pte.is_user() {
            return Err(PageFaultReason::UserAccessToSupervisor);
        }

        if access == Access::Write && !pte.is_writable() {
            return Err(PageFaultReason::WriteToReadOnly);
        }

        if execute && pte.is_no_execute() {
            return Err(PageFaultReason::ExecOnNX);
        }

        Ok(())
    }

    /// Translates and, on failure, lets the handler repair the mapping once.
    ///
    /// Returns the successful translation together with the physical address.
    fn translate_with_fault(
        &mut self,
        virtual_address: u32,
        access: Access,
        privilege: Privilege,
        execute: bool,
    ) -> MemoryResult<(TranslationResult, u32)> {
        let result = self.translate(virtual_address, access, privilege, execute)?;
        let reason = match result.outcome {
            Ok(physical_address) => return Ok((result, physical_address)),
            Err(reason) => reason,
        };

        let virtual_page_number = virtual_address >> PageTableEntry::FRAME_SHIFT;
        debug!(
            "Page fault ({}) on {} at {:#x} (page {})",
            reason, access, virtual_address, virtual_page_number
        );

        let mut page_table = PageTable::new(&mut *self.memory, self.page_table_address);
        let fixed = self
            .handler
            .on_page_fault(&mut page_table, virtual_page_number, access, reason)?;

        if !fixed {
            error!(
                "Unhandled page fault ({}) on {} at {:#x}",
                reason, access, virtual_address
            );
            return Err(MemoryError::UnhandledPageFault {
                address: virtual_address,
                access,
                reason,
            });
        }

        debug!("Retry {} at {:#x}", access, virtual_address);
        let result = self.translate(virtual_address, access, privilege, execute)?;
        match result.outcome {
            Ok(physical_address) => Ok((result, physical_address)),
            Err(reason) => {
                error!(
                    "Page fault ({}) on {} retry at {:#x}",
                    reason, access, virtual_address
                );
                Err(MemoryError::PageFaultOnRetry {
                    address: virtual_address,
                    access,
                    reason,
                })
            }
        }
    }

    fn write_back(&mut self, result: &TranslationResult, updated: PageTableEntry) -> MemoryResult<()> {
        if updated == result.pte {
            return Ok(());
        }

        trace!(
            "Write back page table entry {:#010x} -> {:#010x}",
            result.pte.raw,
            updated.raw
        );
        self.memory.write32(result.pte_address, updated.raw)
    }

    pub fn read<T: MemoryValue>(
        &mut self,
        virtual_address: u32,
        privilege: Privilege,
        execute: bool,
    ) -> MemoryResult<T> {
        let (result, physical_address) =
            self.translate_with_fault(virtual_address, Access::Read, privilege, execute)?;

        let mut updated = result.pte;
        updated.set_accessed(true);
        self.write_back(&result, updated)?;

        self.memory.read(physical_address)
    }

    pub fn write<T: MemoryValue>(
        &mut self,
        virtual_address: u32,
        value: T,
        privilege: Privilege,
    ) -> MemoryResult<()> {
        let (result, physical_address) =
            self.translate_with_fault(virtual_address, Access::Write, privilege, false)?;

        let mut updated = result.pte;
        updated.set_accessed(true);
        updated.set_dirty(true);
        self.write_back(&result, updated)?;

        self.memory.write(physical_address, value)
    }

    #[inline]
    pub fn read8(&mut self, virtual_address: u32, privilege: Privilege, execute: bool) -> MemoryResult<u8> {
        self.read(virtual_address, privilege, execute)
    }

    #[inline]
    pub fn read16(&mut self, virtual_address: u32, privilege: Privilege, execute: bool) -> MemoryResult<u16> {
        self.read(virtual_address, privilege, execute)
    }

    #[inline]
    pub fn read32(&mut self, virtual_address: u32, privilege: Privilege, execute: bool) -> MemoryResult<u32> {
        self.read(virtual_address, privilege, execute)
    }

    #[inline]
    pub fn read64(&mut self, virtual_address: u32, privilege: Privilege, execute: bool) -> MemoryResult<u64> {
        self.read(virtual_address, privilege, execute)
    }

    #[inline]
    pub fn write8(&mut self, virtual_address: u32, value: u8, privilege: Privilege) -> MemoryResult<()> {
        self.write(virtual_address, value, privilege)
    }

    #[inline]
    pub fn write16(&mut self, virtual_address: u32, value: u16, privilege: Privilege) -> MemoryResult<()> {
        self.write(virtual_address, value, privilege)
    }

    #[inline]
    pub fn write32(&mut self, virtual_address: u32, value: u32, privilege: Privilege) -> MemoryResult<()> {
        self.write(virtual_address, value, privilege)
    }

    #[inline]
    pub fn write64(&mut self, virtual_address: u32, value: u64, privilege: Privilege) -> MemoryResult<()> {
        self.write(virtual_address, value, privilege)
    }
}
