//! Business operations against the EMR.
//!
//! Each operation wires the primitives (frame location, polling, menus,
//! forms) into one complete task and returns the uniform
//! [`emrpilot_protocol::OperationResult`]. Expected failures land in the
//! result's message; engine failures are caught at the operation boundary
//! and converted, never raised past it.

pub mod address_book;
pub mod visits;

pub use address_book::{AddressBook, ImportDetail, ImportOutcome};
pub use visits::{SoapNotes, VisitData, VisitRecord, VisitSummary, Visits};
