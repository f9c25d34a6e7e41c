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

use core::fmt;

use static_assertions::const_assert_eq;

/// A single 32 bit page table entry.
///
/// | bit   | meaning                       |
/// |-------|-------------------------------|
/// | 0     | present                       |
/// | 1     | writable                      |
/// | 2     | accessible from user mode     |
/// | 5     | accessed                      |
/// | 6     | dirty                         |
/// | 12-30 | frame number                  |
/// | 31    | no execute                    |
///
/// The frame field stops at bit 30 so that it never aliases the no execute bit.
/// A zeroed entry is not present.
#[derive(Default, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct PageTableEntry {
    pub raw: u32,
}

const_assert_eq!(core::mem::size_of::<PageTableEntry>(), 4);

impl PageTableEntry {
    pub const PRESENT: u32 = 1 << 0;
    pub const WRITABLE: u32 = 1 << 1;
    pub const USER: u32 = 1 << 2;
    pub const ACCESSED: u32 = 1 << 5;
    pub const DIRTY: u32 = 1 << 6;
    pub const NO_EXECUTE: u32 = 1 << 31;

    pub const FRAME_SHIFT: u32 = 12;
    pub const FRAME_MASK: u32 = 0x7FFF_F000;

    /// Size of an entry inside of the page table in bytes
    pub const SIZE: u32 = 4;

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn get_frame(&self) -> u32 {
        (self.raw & Self::FRAME_MASK) >> Self::FRAME_SHIFT
    }

    /// Frame numbers wider than the frame field are truncated.
    #[inline]
    pub fn set_frame(&mut self, frame: u32) {
        self.raw = (self.raw & !Self::FRAME_MASK) | ((frame << Self::FRAME_SHIFT) & Self::FRAME_MASK);
    }

    #[inline]
    fn set_bit(&mut self, bit: u32, value: bool) {
        if value {
            self.raw |= bit;
        } else {
            self.raw &= !bit;
        }
    }

    #[inline]
    pub const fn is_present(&self) -> bool {
        self.raw & Self::PRESENT != 0
    }

    #[inline]
    pub fn set_present(&mut self, value: bool) {
        self.set_bit(Self::PRESENT, value);
    }

    #[inline]
    pub const fn is_writable(&self) -> bool {
        self.raw & Self::WRITABLE != 0
    }

    #[inline]
    pub fn set_writable(&mut self, value: bool) {
        self.set_bit(Self::WRITABLE, value);
    }

    #[inline]
    pub const fn is_user(&self) -> bool {
        self.raw & Self::USER != 0
    }

    #[inline]
    pub fn set_user(&mut self, value: bool) {
        self.set_bit(Self::USER, value);
    }

    #[inline]
    pub const fn is_accessed(&self) -> bool {
        self.raw & Self::ACCESSED != 0
    }

    #[inline]
    pub fn set_accessed(&mut self, value: bool) {
        self.set_bit(Self::ACCESSED, value);
    }

    #[inline]
    pub const fn is_dirty(&self) -> bool {
        self.raw & Self::DIRTY != 0
    }

    #[inline]
    pub fn set_dirty(&mut self, value: bool) {
        self.set_bit(Self::DIRTY, value);
    }

    #[inline]
    pub const fn is_no_execute(&self) -> bool {
        self.raw & Self::NO_EXECUTE != 0
    }

    #[inline]
    pub fn set_no_execute(&mut self, value: bool) {
        self.set_bit(Self::NO_EXECUTE, value);
    }
}

impl fmt::Debug for PageTableEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageTableEntry")
            .field("raw", &format_args!("{:#010x}", self.raw))
            .field("frame", &self.get_frame())
            .field("present", &self.is_present())
            .field("writable", &self.is_writable())
            .field("user", &self.is_user())
            .field("accessed", &self.is_accessed())
            .field("dirty", &self.is_dirty())
            .field("no_execute", &self.is_no_execute())
            .finish()
    }
}
