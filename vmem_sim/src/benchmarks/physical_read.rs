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

use crate::{MemoryResult, MemoryValue, PhysicalMemory, PhysicalMemoryConfig};

use super::{AccessOptions, Benchmark, Timer};

/// Baseline: the same access without any translation
pub struct PhysicalReadBenchmark<V: MemoryValue> {
    config: PhysicalMemoryConfig,
    memory: PhysicalMemory,
    _phantom_data: PhantomData<V>,
}

impl<V: MemoryValue> PhysicalReadBenchmark<V> {
    pub fn new(config: PhysicalMemoryConfig) -> MemoryResult<Self> {
        Ok(Self {
            config,
            memory: PhysicalMemory::new(config)?,
            _phantom_data: PhantomData,
        })
    }
}

impl<V: MemoryValue> Benchmark<AccessOptions> for PhysicalReadBenchmark<V> {
    fn get_name(&self) -> &'static str {
        "physical_read"
    }

    fn get_bench_options(&self) -> AccessOptions {
        AccessOptions::new::<V>(self.config)
    }

    fn execute<T: Timer>(&mut self) -> u32 {
        let timer = T::start();

        black_box(self.memory.read::<V>(black_box(0))).unwrap();

        timer.stop()
    }
}
