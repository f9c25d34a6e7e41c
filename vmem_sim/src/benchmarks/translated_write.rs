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

use core::{hint::black_box, marker::PhantomData};

use crate::{
    modules::page_fault_handler::DemandPagingModule, MemoryResult, MemoryValue, PhysicalMemory,
    PhysicalMemoryConfig, Privilege, VirtualMemory,
};

use super::{prepare_memory, AccessOptions, Benchmark, Timer, BENCH_ADDRESS};

/// Write to an already mapped and dirty page
pub struct TranslatedWriteBenchmark<V: MemoryValue> {
    config: PhysicalMemoryConfig,
    memory: PhysicalMemory,
    handler: DemandPagingModule,
    page_table_address: u32,
    _phantom_data: PhantomData<V>,
}

impl<V: MemoryValue> TranslatedWriteBenchmark<V> {
    pub fn new(config: PhysicalMemoryConfig, page_table_address: u32) -> MemoryResult<Self> {
        let (memory, handler) = prepare_memory(config, page_table_address, [BENCH_ADDRESS])?;

        Ok(Self {
            config,
            memory,
            handler,
            page_table_address,
            _phantom_data: PhantomData,
        })
    }
}

impl<V: MemoryValue> Benchmark<AccessOptions> for TranslatedWriteBenchmark<V> {
    fn get_name(&self) -> &'static str {
        "translated_write"
    }

    fn get_bench_options(&self) -> AccessOptions {
        AccessOptions::new::<V>(self.config)
    }

    fn execute<T: Timer>(&mut self) -> u32 {
        let mut vm = VirtualMemory::new(&mut self.memory, &mut self.handler);
        vm.set_page_table_address(self.page_table_address).unwrap();

        let timer = T::start();

        black_box(vm.write::<V>(black_box(BENCH_ADDRESS), V::default(), Privilege::User)).unwrap();

        timer.stop()
    }
}
