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

mod error;
mod page_table_entry;
mod physical_memory;
mod virtual_memory;
mod vmem_config;

#[cfg(test)]
mod test;

#[cfg(feature = "benchmarks")]
pub mod benchmarks;

pub mod modules;

pub use error::{MemoryError, MemoryResult};
pub use page_table_entry::PageTableEntry;
pub use physical_memory::{AccessStats, MemoryValue, PhysicalMemory};
pub use virtual_memory::{
    Access, PageFaultReason, PageTable, Privilege, TranslationResult, VirtualMemory, PAGE_SIZE,
};
pub use vmem_config::{PhysicalMemoryConfig, MAX_PHYSICAL_SIZE};
