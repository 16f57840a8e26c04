//! `eventdesk-check`: load a data directory, report its health, print reports as JSON.

use eventdesk_api::{DEFAULT_ADMIN_USERNAME, EventDesk};
use eventdesk_auth::{Principal, Role};
use eventdesk_core::{Entity, UserId};
use eventdesk_infra::StoreConfig;

fn main() -> anyhow::Result<()> {
    eventdesk_observability::init();

    let config = StoreConfig::from_env();
    let (desk, report) = EventDesk::open(&config)?;

    tracing::info!(
        data_dir = %config.data_dir.display(),
        users = report.users,
        events = report.events,
        attendees = report.attendees,
        items = report.items,
        skipped = report.skipped.len(),
        "data directory checked"
    );

    let violations = desk.conservation_violations();
    for v in &violations {
        tracing::error!(
            item = %v.item_id,
            allocated = v.allocated,
            allocated_by_events = v.allocated_by_events,
            total = v.total,
            "allocation counters disagree"
        );
    }

    // Reports are admin-only; act as the first admin on record.
    let snapshot = desk.snapshot();
    let admin = snapshot
        .users()
        .iter()
        .find(|u| u.role().is_admin())
        .map(Principal::from_user)
        .unwrap_or_else(|| {
            tracing::warn!("no admin account on record; reporting as {DEFAULT_ADMIN_USERNAME}");
            Principal::new(UserId::new(0), DEFAULT_ADMIN_USERNAME, Role::Admin)
        });
    tracing::debug!(user = %admin.user_id, "reporting identity");

    let output = serde_json::json!({
        "skipped_lines": report
            .skipped
            .iter()
            .map(|s| serde_json::json!({
                "kind": s.kind.as_str(),
                "line": s.line_no,
                "reason": s.reason,
            }))
            .collect::<Vec<_>>(),
        "conservation_violations": violations.len(),
        "events": snapshot.events().iter().map(|e| e.id()).collect::<Vec<_>>(),
        "attendance": desk.attendance_report(&admin)?,
        "inventory": desk.inventory_report(&admin)?,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    if !violations.is_empty() {
        anyhow::bail!("{} inventory item(s) violate allocation conservation", violations.len());
    }
    Ok(())
}
