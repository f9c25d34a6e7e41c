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

use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::Serialize;

use crate::{
    modules::page_fault_handler::DemandPagingModule, MemoryResult, PhysicalMemory,
    PhysicalMemoryConfig, Privilege, VirtualMemory, PAGE_SIZE,
};

use super::{prepare_memory, Benchmark, Timer, BENCH_ADDRESS};

#[derive(Serialize)]
pub struct RandomReadBenchmarkOptions {
    physical_memory: PhysicalMemoryConfig,
    mapped_pages: u32,
    reads_per_run: usize,
}

/// `READS` aligned 8 byte reads spread over `PAGES` mapped pages
pub struct RandomReadBenchmark<const PAGES: u32, const READS: usize> {
    config: PhysicalMemoryConfig,
    memory: PhysicalMemory,
    handler: DemandPagingModule,
    page_table_address: u32,
    rng: SmallRng,
}

impl<const PAGES: u32, const READS: usize> RandomReadBenchmark<PAGES, READS> {
    pub fn new(config: PhysicalMemoryConfig, page_table_address: u32) -> MemoryResult<Self> {
        let pages = (0..PAGES).map(|page| BENCH_ADDRESS + page * PAGE_SIZE);
        let (memory, handler) = prepare_memory(config, page_table_address, pages)?;

        Ok(Self {
            config,
            memory,
            handler,
            page_table_address,
            rng: SmallRng::seed_from_u64(0x5EED),
        })
    }
}

impl<const PAGES: u32, const READS: usize> Benchmark<RandomReadBenchmarkOptions>
    for RandomReadBenchmark<PAGES, READS>
{
    fn get_name(&self) -> &'static str {
        "random_read"
    }

    fn get_bench_options(&self) -> RandomReadBenchmarkOptions {
        RandomReadBenchmarkOptions {
            physical_memory: self.config,
            mapped_pages: PAGES,
            reads_per_run: READS,
        }
    }

    fn execute<T: Timer>(&mut self) -> u32 {
        let mut addresses = [0u32; READS];
        for address in addresses.iter_mut() {
            let page = self.rng.gen_range(0..PAGES);
            let slot = self.rng.gen_range(0..PAGE_SIZE / 8);
            *address = BENCH_ADDRESS + page * PAGE_SIZE + slot * 8;
        }

        let mut vm = VirtualMemory::new(&mut self.memory, &mut self.handler);
        vm.set_page_table_address(self.page_table_address).unwrap();

        let timer = T::start();

        for address in addresses {
            black_box(vm.read64(black_box(address), Privilege::User, false)).unwrap();
        }

        timer.stop()
    }
}
