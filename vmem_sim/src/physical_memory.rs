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

use core::{cell::Cell, fmt::Debug, mem::size_of};

use log::trace;

use crate::{vmem_config::PhysicalMemoryConfig, MemoryError, MemoryResult};

mod private {
    pub trait Sealed {}
}

/// An unsigned integer that can be moved between the simulated memory and the caller.
///
/// Values are stored in the native byte order of the host.
pub trait MemoryValue: private::Sealed + Copy + Default + Debug + PartialEq {
    /// Access width in bytes
    const WIDTH: u32;

    fn from_bytes(bytes: &[u8]) -> Self;

    fn write_bytes(self, dest: &mut [u8]);
}

macro_rules! impl_memory_value {
    ($($t:ty),*) => {
        $(
            impl private::Sealed for $t {}

            impl MemoryValue for $t {
                const WIDTH: u32 = size_of::<$t>() as u32;

                #[inline]
                fn from_bytes(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; size_of::<$t>()];
                    buf.copy_from_slice(bytes);
                    <$t>::from_ne_bytes(buf)
                }

                #[inline]
                fn write_bytes(self, dest: &mut [u8]) {
                    dest.copy_from_slice(&self.to_ne_bytes());
                }
            }
        )*
    };
}

impl_memory_value!(u8, u16, u32, u64);

/// Number of successful accesses since creation or the last reset.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AccessStats {
    pub reads: u64,
    pub writes: u64,
}

/// Zero initialized, byte addressable physical memory.
///
/// Every access of width `W` at `address` has to be aligned to `W` and must
/// lie completely inside of the memory.
pub struct PhysicalMemory {
    memory: Vec<u8>,

    /// `Cell` so reads can be counted through `&self`
    reads: Cell<u64>,
    writes: u64,
}

impl PhysicalMemory {
    pub fn new(config: PhysicalMemoryConfig) -> MemoryResult<Self> {
        let size = config.size()?;

        trace!(
            "Create physical memory with {} frames of {} bytes",
            config.frame_count,
            config.frame_size
        );

        Ok(Self {
            memory: vec![0u8; size as usize],
            reads: Cell::new(0),
            writes: 0,
        })
    }

    /// Returns the total capacity in bytes
    #[inline]
    pub fn get_size(&self) -> u32 {
        self.memory.len() as u32
    }

    pub fn read<T: MemoryValue>(&self, address: u32) -> MemoryResult<T> {
        let range = self.check_access(address, T::WIDTH)?;
        let value = T::from_bytes(&self.memory[range]);

        self.reads.set(self.reads.get() + 1);
        Ok(value)
    }

    pub fn write<T: MemoryValue>(&mut self, address: u32, value: T) -> MemoryResult<()> {
        let range = self.check_access(address, T::WIDTH)?;
        value.write_bytes(&mut self.memory[range]);

        self.writes += 1;
        Ok(())
    }

    #[inline]
    pub fn read8(&self, address: u32) -> MemoryResult<u8> {
        self.read(address)
    }

    #[inline]
    pub fn read16(&self, address: u32) -> MemoryResult<u16> {
        self.read(address)
    }

    #[inline]
    pub fn read32(&self, address: u32) -> MemoryResult<u32> {
        self.read(address)
    }

    #[inline]
    pub fn read64(&self, address: u32) -> MemoryResult<u64> {
        self.read(address)
    }

    #[inline]
    pub fn write8(&mut self, address: u32, value: u8) -> MemoryResult<()> {
        self.write(address, value)
    }

    #[inline]
    pub fn write16(&mut self, address: u32, value: u16) -> MemoryResult<()> {
        self.write(address, value)
    }

    #[inline]
    pub fn write32(&mut self, address: u32, value: u32) -> MemoryResult<()> {
        self.write(address, value)
    }

    #[inline]
    pub fn write64(&mut self, address: u32, value: u64) -> MemoryResult<()> {
        self.write(address, value)
    }

    /// Raw view of the whole memory. Not counted as an access.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.memory
    }

    pub fn access_stats(&self) -> AccessStats {
        AccessStats {
            reads: self.reads.get(),
            writes: self.writes,
        }
    }

    pub fn reset_access_stats(&mut self) {
        self.reads.set(0);
        self.writes = 0;
    }

    /// Checks alignment first, then bounds. Returns the byte range of the access.
    fn check_access(&self, address: u32, width: u32) -> MemoryResult<core::ops::Range<usize>> {
        if address % width != 0 {
            return Err(MemoryError::MisalignedAccess { address, width });
        }

        let end = address as u64 + width as u64;
        if end > self.memory.len() as u64 {
            return Err(MemoryError::OutOfRange {
                address,
                width,
                size: self.get_size(),
            });
        }

        Ok(address as usize..end as usize)
    }
}
