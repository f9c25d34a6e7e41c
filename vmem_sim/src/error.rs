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

use thiserror::Error;

use crate::virtual_memory::{Access, PageFaultReason};

pub type MemoryResult<T> = Result<T, MemoryError>;

/// Every way an access to the simulated memory can fail.
///
/// Physical errors are never retried. Translation faults only surface wrapped
/// in [`MemoryError::UnhandledPageFault`] or [`MemoryError::PageFaultOnRetry`],
/// after the page fault handler had its chance to repair the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("misaligned {width} byte access at physical address {address:#x}")]
    MisalignedAccess { address: u32, width: u32 },

    #[error("{width} byte access at physical address {address:#x} exceeds memory of {size} bytes")]
    OutOfRange { address: u32, width: u32, size: u32 },

    #[error("page table address {address:#x} must be aligned to 4096 bytes")]
    InvalidArgument { address: u32 },

    #[error("invalid physical memory configuration: {frame_count} frames of {frame_size} bytes")]
    InvalidConfig { frame_count: u32, frame_size: u32 },

    #[error("unhandled page fault ({reason}) on {access} at virtual address {address:#x}")]
    UnhandledPageFault {
        address: u32,
        access: Access,
        reason: PageFaultReason,
    },

    #[error("page fault ({reason}) on {access} retry at virtual address {address:#x}")]
    PageFaultOnRetry {
        address: u32,
        access: Access,
        reason: PageFaultReason,
    },
}

impl MemoryError {
    /// Returns the translation fault behind a fatal page fault, if any.
    pub fn fault_reason(&self) -> Option<PageFaultReason> {
        match self {
            MemoryError::UnhandledPageFault { reason, .. }
            | MemoryError::PageFaultOnRetry { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// `true` for errors raised by the physical memory itself.
    pub fn is_physical(&self) -> bool {
        matches!(
            self,
            MemoryError::MisalignedAccess { .. } | MemoryError::OutOfRange { .. }
        )
    }
}

#[cfg(test)]
mod test {
    use super::MemoryError;
    use crate::virtual_memory::{Access, PageFaultReason};

    #[test]
    fn test_fault_reason() {
        let err = MemoryError::UnhandledPageFault {
            address: 0x1000,
            access: Access::Write,
            reason: PageFaultReason::WriteToReadOnly,
        };
        assert_eq!(err.fault_reason(), Some(PageFaultReason::WriteToReadOnly));
        assert!(!err.is_physical());

        let err = MemoryError::OutOfRange {
            address: 0x1000,
            width: 4,
            size: 0x1000,
        };
        assert_eq!(err.fault_reason(), None);
        assert!(err.is_physical());
    }

    #[test]
    fn test_error_messages() {
        let err = MemoryError::PageFaultOnRetry {
            address: 0x1234,
            access: Access::Read,
            reason: PageFaultReason::NotPresent,
        };
        assert_eq!(
            err.to_string(),
            "page fault (page not present) on read retry at virtual address 0x1234"
        );

        let err = MemoryError::InvalidArgument { address: 1 };
        assert_eq!(
            err.to_string(),
            "page table address 0x1 must be aligned to 4096 bytes"
        );
    }
}
