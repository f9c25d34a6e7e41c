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
    virtual_memory::{Access, PageFaultReason, PageTable},
    MemoryResult,
};

mod demand_paging;
pub use demand_paging::*;

/// Decides what happens if an address cannot be translated.
///
/// The handler is called synchronously from inside the faulting access and
/// may change entries of the active page table through `page_table`.
/// Return `Ok(true)` if the mapping was repaired and the access should be
/// retried, `Ok(false)` if the access has to be aborted.
///
/// Returning `Ok(true)` without leaving a valid mapping is a contract
/// violation and fails the access with `PageFaultOnRetry`.
///
/// **Handlers must not access virtual memory themselves.** A fault raised
/// from inside a handler is not supported, which is why a handler only ever
/// sees the page table and never the translating `VirtualMemory`.
pub trait PageFaultHandlerModule {
    fn on_page_fault(
        &mut self,
        page_table: &mut PageTable<'_>,
        virtual_page_number: u32,
        access: Access,
        reason: PageFaultReason,
    ) -> MemoryResult<bool>;
}

impl<F> PageFaultHandlerModule for F
where
    F: FnMut(&mut PageTable<'_>, u32, Access, PageFaultReason) -> MemoryResult<bool>,
{
    #[inline]
    fn on_page_fault(
        &mut self,
        page_table: &mut PageTable<'_>,
        virtual_page_number: u32,
        access: Access,
        reason: PageFaultReason,
    ) -> MemoryResult<bool> {
        self(page_table, virtual_page_number, access, reason)
    }
}

/// Handler that never repairs anything. Every fault is fatal.
pub struct DenyAllModule;

impl PageFaultHandlerModule for DenyAllModule {
    fn on_page_fault(
        &mut self,
        _page_table: &mut PageTable<'_>,
        virtual_page_number: u32,
        _access: Access,
        reason: PageFaultReason,
    ) -> MemoryResult<bool> {
        log::warn!(
            "Deny page fault ({}) on virtual page {}",
            reason,
            virtual_page_number
        );
        Ok(false)
    }
}
