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

use core::hint::black_box;

use serde::Serialize;

use crate::{
    modules::page_fault_handler::{DemandPagingModule, DenyAllModule},
    MemoryResult, PageTable, PageTableEntry, PhysicalMemory, PhysicalMemoryConfig, Privilege,
    VirtualMemory,
};

use super::{Benchmark, Timer, BENCH_ADDRESS};

#[derive(Serialize)]
pub struct PageFaultBenchmarkOptions {
    physical_memory: PhysicalMemoryConfig,
    page_table_address: u32,
}

/// First write to an unmapped page: fault, frame allocation, retry and write.
///
/// The mapping is removed again after every run.
pub struct PageFaultBenchmark {
    config: PhysicalMemoryConfig,
    memory: PhysicalMemory,
    page_table_address: u32,
}

impl PageFaultBenchmark {
    pub fn new(config: PhysicalMemoryConfig, page_table_address: u32) -> MemoryResult<Self> {
        let mut memory = PhysicalMemory::new(config)?;

        // validate the page table address once
        VirtualMemory::new(&mut memory, &mut DenyAllModule)
            .set_page_table_address(page_table_address)?;

        Ok(Self {
            config,
            memory,
            page_table_address,
        })
    }

    pub fn is_mapped(&mut self) -> MemoryResult<bool> {
        PageTable::new(&mut self.memory, self.page_table_address)
            .read_entry(BENCH_ADDRESS >> PageTableEntry::FRAME_SHIFT)
            .map(|pte| pte.is_present())
    }
}

impl Benchmark<PageFaultBenchmarkOptions> for PageFaultBenchmark {
    fn get_name(&self) -> &'static str {
        "page_fault"
    }

    fn get_bench_options(&self) -> PageFaultBenchmarkOptions {
        PageFaultBenchmarkOptions {
            physical_memory: self.config,
            page_table_address: self.page_table_address,
        }
    }

    fn execute<T: Timer>(&mut self) -> u32 {
        let mut handler = DemandPagingModule::new();
        let mut vm = VirtualMemory::new(&mut self.memory, &mut handler);
        vm.set_page_table_address(self.page_table_address).unwrap();

        let timer = T::start();

        black_box(vm.write32(black_box(BENCH_ADDRESS), 1, Privilege::User)).unwrap();

        let ticks = timer.stop();

        vm.page_table()
            .write_entry(BENCH_ADDRESS >> PageTableEntry::FRAME_SHIFT, PageTableEntry::default())
            .unwrap();

        ticks
    }
}
