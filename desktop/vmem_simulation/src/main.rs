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

use std::{env, process::ExitCode};

use env_logger::{Builder, Env};
use log::{error, info};
use vmem_sim::{
    modules::page_fault_handler::DemandPagingModule, MemoryError, MemoryResult, PageTable,
    PhysicalMemory, PhysicalMemoryConfig, Privilege, VirtualMemory,
};

const PAGE_TABLE_ADDRESS: u32 = 0;
const ADDRESS: u32 = 0x1234_5678;
const VALUE: u32 = 0xDEAD_BEEF;

fn run_simulation(frame_count: u32) -> MemoryResult<bool> {
    info!("--- Starting Simulation ---");

    let mut memory = PhysicalMemory::new(PhysicalMemoryConfig {
        frame_count,
        ..Default::default()
    })?;
    let mut handler = DemandPagingModule::new();

    {
        let mut vm = VirtualMemory::new(&mut memory, &mut handler);
        vm.set_page_table_address(PAGE_TABLE_ADDRESS)?;

        info!("Write {:#x} to virtual address {:#x}", VALUE, ADDRESS);
        vm.write32(ADDRESS, VALUE, Privilege::User)?;

        info!("Read from virtual address {:#x}", ADDRESS);
        let value = vm.read32(ADDRESS, Privilege::User, false)?;
        info!("Read value: {:#x}", value);

        if value != VALUE {
            error!("Expected {:#x} but read {:#x}", VALUE, value);
            return Ok(false);
        }
    }

    info!("--- Ending Simulation ---");

    let pte = PageTable::new(&mut memory, PAGE_TABLE_ADDRESS).read_entry(ADDRESS >> 12)?;
    info!("Final page table entry: {:?}", pte);

    if !(pte.is_present() && pte.is_accessed() && pte.is_dirty()) {
        error!("Page table entry flags (P, A, D) are not set");
        return Ok(false);
    }
    info!(
        "Page table entry flags (P, A, D) are set, {} frame(s) allocated",
        handler.allocated_frames()
    );

    Ok(true)
}

fn main() -> ExitCode {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_module_path(false)
        .init();

    let frame_count = match env::args().nth(1).map(|arg| arg.parse::<u32>()) {
        None => 256,
        Some(Ok(frame_count)) => frame_count,
        Some(Err(err)) => {
            error!("Invalid frame count: {}", err);
            return ExitCode::FAILURE;
        }
    };

    match run_simulation(frame_count) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err @ MemoryError::InvalidConfig { .. }) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
        Err(err) => {
            error!("An unhandled error occurred: {}", err);
            ExitCode::FAILURE
        }
    }
}
