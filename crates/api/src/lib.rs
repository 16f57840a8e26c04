//! Service layer: the `EventDesk` facade a front end drives, plus reports.
//!
//! Front ends (a CLI, a TUI) own prompting and rendering; everything here
//! returns typed values or a [`ServiceError`].

pub mod errors;
pub mod reports;
pub mod service;

pub use errors::{ServiceError, ServiceResult};
pub use reports::{AttendanceRow, EventAllocation, InventoryRow};
pub use service::{DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME, EventDesk};
