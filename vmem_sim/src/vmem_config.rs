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

use crate::{MemoryError, MemoryResult};

/// Upper bound of the simulated physical memory.
///
/// Frame numbers are stored in 19 bits of a page table entry, so nothing above
/// `2^19` frames of 4096 bytes could ever be mapped.
pub const MAX_PHYSICAL_SIZE: u64 = 1 << 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "benchmarks", derive(serde::Serialize))]
pub struct PhysicalMemoryConfig {
    /// number of frames the physical memory consists of
    pub frame_count: u32,

    /// size of one frame in bytes
    pub frame_size: u32,
}

impl Default for PhysicalMemoryConfig {
    fn default() -> Self {
        Self {
            frame_count: 1024,
            frame_size: 4096,
        }
    }
}

impl PhysicalMemoryConfig {
    /// Total capacity in bytes.
    ///
    /// Fails if the capacity is zero or larger than [`MAX_PHYSICAL_SIZE`].
    pub fn size(&self) -> MemoryResult<u32> {
        let size = self.frame_count as u64 * self.frame_size as u64;
        if size == 0 || size > MAX_PHYSICAL_SIZE {
            return Err(MemoryError::InvalidConfig {
                frame_count: self.frame_count,
                frame_size: self.frame_size,
            });
        }

        Ok(size as u32)
    }
}
