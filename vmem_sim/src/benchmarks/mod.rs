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

use core::any::type_name;

#[cfg(not(test))]
use std::io::stdout;

use serde::Serialize;

mod page_fault;
mod physical_read;
mod random_read;
mod translated_read;
mod translated_write;

pub use page_fault::*;
pub use physical_read::*;
pub use random_read::*;
pub use translated_read::*;
pub use translated_write::*;

use crate::{
    modules::page_fault_handler::DemandPagingModule, MemoryResult, MemoryValue, PhysicalMemory,
    PhysicalMemoryConfig, Privilege, VirtualMemory,
};

/// Virtual address of the first page every benchmark touches
pub const BENCH_ADDRESS: u32 = 0x0040_0000;

/// Creates a physical memory in which the pages of `addresses` are already mapped.
pub(crate) fn prepare_memory(
    config: PhysicalMemoryConfig,
    page_table_address: u32,
    addresses: impl IntoIterator<Item = u32>,
) -> MemoryResult<(PhysicalMemory, DemandPagingModule)> {
    let mut memory = PhysicalMemory::new(config)?;
    let mut handler = DemandPagingModule::new();

    {
        let mut vm = VirtualMemory::new(&mut memory, &mut handler);
        vm.set_page_table_address(page_table_address)?;
        for address in addresses {
            vm.write8(address, 0, Privilege::Supervisor)?;
        }
    }

    memory.reset_access_stats();
    Ok((memory, handler))
}

pub struct RunAllBenchmarkOptions {
    pub run_physical_benchmarks: bool,
    pub run_translation_benchmarks: bool,
    pub run_page_fault_benchmarks: bool,
    pub run_random_access_benchmarks: bool,
}

impl Default for RunAllBenchmarkOptions {
    fn default() -> Self {
        Self {
            run_physical_benchmarks: false,
            run_translation_benchmarks: false,
            run_page_fault_benchmarks: false,
            run_random_access_benchmarks: false,
        }
    }
}

impl RunAllBenchmarkOptions {
    pub fn all() -> Self {
        Self {
            run_physical_benchmarks: true,
            run_translation_benchmarks: true,
            run_page_fault_benchmarks: true,
            run_random_access_benchmarks: true,
        }
    }
}

pub fn run_all_benchmarks<TIMER: Timer>(
    config: PhysicalMemoryConfig,
    mut run_options: BenchmarkRunOptions,
    options: RunAllBenchmarkOptions,
) -> MemoryResult<()> {
    // page table lives in the last quarter of the memory, so no handed out frame overlaps it
    let page_table_address = (config.size()? / 4 * 3) & !(crate::PAGE_SIZE - 1);

    let mut iteration_count = 0;
    if options.run_physical_benchmarks {
        iteration_count += 4;
    }
    if options.run_translation_benchmarks {
        iteration_count += 8;
    }
    if options.run_page_fault_benchmarks {
        iteration_count += 1;
    }
    if options.run_random_access_benchmarks {
        iteration_count += 1;
    }
    let mut curr_iteration = 0usize;

    fn handle_curr_iteration(curr_iteration: &mut usize, iteration_count: usize) {
        let percentage = (100 * *curr_iteration) / (iteration_count.max(1));
        print!("[{}%] ", percentage);

        *curr_iteration += 1;
    }

    macro_rules! for_each_width {
        ($t: ident, $inner: expr) => {
            {
                type $t = u8;
                $inner
            }
            {
                type $t = u16;
                $inner
            }
            {
                type $t = u32;
                $inner
            }
            {
                type $t = u64;
                $inner
            }
        };
    }

    if options.run_physical_benchmarks {
        for_each_width!(T, {
            handle_curr_iteration(&mut curr_iteration, iteration_count);
            let bench = PhysicalReadBenchmark::<T>::new(config)?;
            bench.run_benchmark::<TIMER>(&mut run_options);
        });
    }

    if options.run_translation_benchmarks {
        for_each_width!(T, {
            handle_curr_iteration(&mut curr_iteration, iteration_count);
            let bench = TranslatedReadBenchmark::<T>::new(config, page_table_address)?;
            bench.run_benchmark::<TIMER>(&mut run_options);
        });
        for_each_width!(T, {
            handle_curr_iteration(&mut curr_iteration, iteration_count);
            let bench = TranslatedWriteBenchmark::<T>::new(config, page_table_address)?;
            bench.run_benchmark::<TIMER>(&mut run_options);
        });
    }

    if options.run_page_fault_benchmarks {
        handle_curr_iteration(&mut curr_iteration, iteration_count);
        let bench = PageFaultBenchmark::new(config, page_table_address)?;
        bench.run_benchmark::<TIMER>(&mut run_options);
    }

    if options.run_random_access_benchmarks {
        handle_curr_iteration(&mut curr_iteration, iteration_count);
        let bench = RandomReadBenchmark::<64, 32>::new(config, page_table_address)?;
        bench.run_benchmark::<TIMER>(&mut run_options);
    }

    Ok(())
}

pub trait Benchmark<O: Serialize> {
    fn get_name(&self) -> &'static str;

    fn get_bench_options(&self) -> O;

    fn execute<T: Timer>(&mut self) -> u32;

    #[inline(never)]
    fn run_benchmark<T: Timer>(mut self, options: &mut BenchmarkRunOptions) -> BenchmarkRunResult
    where
        Self: Sized,
    {
        assert_eq!(options.repetitions as usize, options.result_buffer.len());

        print!("Running Benchmark \"{}\" with options ", self.get_name());

        #[cfg(not(test))]
        if let Err(err) = serde_json::to_writer(stdout(), &self.get_bench_options()) {
            log::warn!("Could not serialize benchmark options: {}", err);
        }
        println!();

        for _ in 0..options.cold_start {
            self.execute::<T>();
        }

        for i in 0..options.result_buffer.len() {
            options.result_buffer[i] = self.execute::<T>();
        }

        print!("[BENCH-INFO] ");

        #[cfg(not(test))]
        {
            let run_info = BenchmarkRunInfo {
                bench_name: self.get_name(),
                bench_options: &self.get_bench_options(),
                machine_name: options.machine_name,
                cold_start: options.cold_start,
                repetitions: options.repetitions,
                ticks_per_ms: T::get_ticks_per_ms(),
                data: &options.result_buffer,
            };
            if let Err(err) = serde_json::to_writer(stdout(), &run_info) {
                log::warn!("Could not serialize benchmark results: {}", err);
            }
        }
        println!();

        let res = BenchmarkRunResult::from_buffer(&options.result_buffer);
        println!(
            "-> Finished {}: mean={}, min={}, max={}",
            self.get_name(),
            res.mean_latency,
            res.min_latency,
            res.max_latency
        );
        println!();

        res
    }
}

pub struct BenchmarkRunOptions<'a> {
    pub repetitions: u32,
    pub result_buffer: &'a mut [u32],

    pub cold_start: u32,

    pub machine_name: &'static str,
}

/// Options every benchmark reports
#[derive(Serialize)]
pub struct AccessOptions {
    access_width: u32,
    value_type: &'static str,
    physical_memory: PhysicalMemoryConfig,
}

impl AccessOptions {
    pub fn new<T: MemoryValue>(physical_memory: PhysicalMemoryConfig) -> Self {
        Self {
            access_width: T::WIDTH,
            value_type: type_name::<T>(),
            physical_memory,
        }
    }
}

#[derive(Serialize)]
pub struct BenchmarkRunInfo<'a, O: Serialize> {
    bench_name: &'static str,
    bench_options: &'a O,
    machine_name: &'static str,
    cold_start: u32,
    repetitions: u32,
    ticks_per_ms: u32,
    data: &'a [u32],
}

#[derive(Debug, PartialEq, Eq)]
pub struct BenchmarkRunResult {
    pub mean_latency: u32,
    pub min_latency: u32,
    pub max_latency: u32,
}

impl BenchmarkRunResult {
    fn from_buffer(buffer: &[u32]) -> Self {
        if buffer.is_empty() {
            return Self {
                mean_latency: 0,
                min_latency: 0,
                max_latency: 0,
            };
        }

        let sum: u64 = buffer.iter().map(|x| *x as u64).sum();
        Self {
            mean_latency: (sum / buffer.len() as u64) as u32,
            min_latency: buffer.iter().copied().min().unwrap_or_default(),
            max_latency: buffer.iter().copied().max().unwrap_or_default(),
        }
    }
}

pub trait Timer {
    fn get_ticks_per_ms() -> u32;

    fn start() -> Self;

    fn stop(self) -> u32;
}
