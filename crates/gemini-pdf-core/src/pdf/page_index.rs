//! Page index newtype for safe conversion between usize and the PDF
//! libraries' index types.
//!
//! mupdf loads pages by 0-based i32, lopdf addresses them by 1-based u32;
//! this wrapper centralizes both conversions behind range validation.

use std::fmt;

use crate::error::Error;

/// A validated page index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageIndex(i32);

impl PageIndex {
    /// Try to create a PageIndex from a usize page number.
    ///
    /// Returns an error if the page number is out of range for the document
    /// or too large to fit in an i32.
    pub fn try_from_page_num(page_num: usize, total_pages: usize) -> Result<Self, Error> {
        if page_num >= total_pages {
            return Err(Error::PdfInvalidPage {
                page: page_num,
                total: total_pages,
            });
        }

        let index = i32::try_from(page_num).map_err(|_| Error::PdfInvalidPage {
            page: page_num,
            total: total_pages,
        })?;

        Ok(Self(index))
    }

    /// Get the 1-indexed page number for lopdf (which uses 1-based indexing).
    #[must_use]
    pub const fn as_lopdf_page_number(self) -> u32 {
        // Non-negative by construction; adding 1 won't overflow for any
        // realistic page count.
        (self.0 + 1).cast_unsigned()
    }
}

impl From<PageIndex> for i32 {
    fn from(index: PageIndex) -> Self {
        index.0
    }
}

impl fmt::Display for PageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
