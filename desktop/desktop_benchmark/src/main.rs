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

use std::time::Instant;

use env_logger::{Builder, Env};
use vmem_sim::{
    benchmarks::{run_all_benchmarks, BenchmarkRunOptions, RunAllBenchmarkOptions, Timer},
    PhysicalMemoryConfig,
};

struct DesktopTimer {
    start_time: Instant,
}

impl Timer for DesktopTimer {
    fn get_ticks_per_ms() -> u32 {
        1_000_000
    }

    #[inline]
    fn start() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    #[inline]
    fn stop(self) -> u32 {
        (Instant::now() - self.start_time).subsec_nanos()
    }
}

fn main() {
    Builder::from_env(Env::default())
        .filter_level(log::LevelFilter::Warn)
        .format_module_path(false)
        .init();

    let res = run_all_benchmarks::<DesktopTimer>(
        PhysicalMemoryConfig::default(),
        BenchmarkRunOptions {
            cold_start: 100,
            machine_name: "desktop",
            repetitions: 1000,
            result_buffer: &mut [0; 1000],
        },
        RunAllBenchmarkOptions::all(),
    );

    if let Err(err) = res {
        log::error!("Benchmarks failed: {}", err);
        std::process::exit(1);
    }
}
