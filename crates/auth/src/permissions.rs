use serde::{Deserialize, Serialize};

/// Capability checked at the operation boundary.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// Create and delete user accounts, list all users.
    ManageUsers,
    /// Create, edit and delete events.
    ManageEvents,
    /// Add items, change totals, allocate and release stock.
    ManageInventory,
    /// Register third parties, check attendees in, cancel anyone's registration.
    ManageAttendees,
    /// Attendance, inventory and export reports.
    ViewReports,
    /// Browse and search events and inventory.
    ViewEvents,
    /// Register or cancel the caller's own attendance.
    SelfRegister,
    /// Edit the caller's own account and attendee contact details.
    ManageOwnProfile,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::ManageUsers => "users.manage",
            Permission::ManageEvents => "events.manage",
            Permission::ManageInventory => "inventory.manage",
            Permission::ManageAttendees => "attendees.manage",
            Permission::ViewReports => "reports.read",
            Permission::ViewEvents => "events.read",
            Permission::SelfRegister => "attendance.self",
            Permission::ManageOwnProfile => "profile.manage",
        }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
