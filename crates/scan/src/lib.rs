//! Antivirus scanning of unpacked trees.
//!
//! [`Clamdscan`] drives ClamAV's `clamdscan` (or anything with the same
//! exit-status convention); [`scan_all`] runs a [`Scanner`] over a list of
//! paths and collects what it finds.

pub mod error;
mod orchestrate;
mod scanner;

pub use crate::orchestrate::{Finding, ScanReport, scan_all};
pub use crate::scanner::{Clamdscan, Scanner, Verdict};
