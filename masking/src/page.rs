//! Paginated query results.

use crate::{
    error::DiscoveryError,
    graph::{Maskable, Shape, Walker},
};

/// One page of records plus paging metadata.
///
/// Redacting a page redacts each of its records as if they had been passed
/// one by one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "slog", derive(serde::Serialize))]
pub struct Page<T> {
    pub records: Vec<T>,
    pub total: u64,
    pub size: u64,
    pub current: u64,
}

impl<T> Page<T> {
    pub fn new(records: Vec<T>, total: u64, size: u64, current: u64) -> Self {
        Self {
            records,
            total,
            size,
            current,
        }
    }

    /// Number of pages needed for `total` records, `0` when `size` is `0`.
    pub fn pages(&self) -> u64 {
        if self.size == 0 {
            0
        } else {
            self.total.div_ceil(self.size)
        }
    }
}

impl<T: Maskable> Maskable for Page<T> {
    fn shape(&self) -> Shape {
        Shape::Record
    }

    fn page_records(&mut self) -> Option<&mut dyn Maskable> {
        Some(&mut self.records)
    }

    fn visit_fields<'a>(&'a mut self, walker: &mut Walker<'a>) -> Result<(), DiscoveryError> {
        walker.visit_nested(&mut self.records);
        Ok(())
    }
}
