//! Automation library for the OpenEMR demo application.
//!
//! Everything here is written against the [`PageDriver`] trait - the typed
//! browser-control contract - so the business operations can be exercised
//! with a scripted test double. The only concrete driver is [`WirePage`],
//! which speaks to a running engine over an `emrpilot-runtime` connection.
//!
//! Layering, leaf first: frame location ([`frames`]), bounded polling
//! ([`poll`]), form filling ([`form`]), menu traversal ([`menu`]), login
//! ([`login`]), and the business operations ([`ops`]) that wire them into
//! complete tasks.

pub mod driver;
pub mod error;
pub mod form;
pub mod frames;
pub mod login;
pub mod menu;
pub mod ops;
pub mod page;
pub mod poll;
pub mod profile;
pub mod testing;

pub use driver::{PageDriver, TOP_FRAME};
pub use error::{Error, Result};
pub use page::WirePage;
pub use poll::{Found, Poller, Scope, Target};
