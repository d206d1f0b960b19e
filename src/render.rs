use serde_json::json;

use crate::models::ReportRecord;

/// Built-in fallback page. A real deployment ships the full report page via
/// `REPORT_TEMPLATE_PATH`; this one renders the same data unstyled.
pub const REPORT_TEMPLATE: &str = include_str!("../templates/report.html");

const EAT_DATA_SLOT: &str = "__EAT_DATA__";
const ACH_STATE_SLOT: &str = "__ACH_STATE__";
const BARCODE_ID_SLOT: &str = "__BARCODE_ID__";
const PROFILE_SLOT: &str = "__PROFILE__";

/// Fills the template's four injection points, each with the JSON-serialized
/// value. First occurrence only, the slots are single-use by contract.
pub fn render_report(template: &str, record: &ReportRecord, id: &str) -> String {
    template
        .replacen(EAT_DATA_SLOT, &record.daily_stats.to_string(), 1)
        .replacen(ACH_STATE_SLOT, &record.ach_state.to_string(), 1)
        .replacen(BARCODE_ID_SLOT, &json!(id).to_string(), 1)
        .replacen(PROFILE_SLOT, &json!(&record.profile).to_string(), 1)
}
