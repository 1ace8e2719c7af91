// ── IAM account settings ──
//
// Account-wide singleton. Nothing is validated until `enable` is set.

use super::IAM_ACCOUNT_SETTINGS;
use super::definition::EntityDefinition;
use super::spec::EntitySpec;
use crate::model::{FormContext, Record, RecordExt};
use crate::schema::{FieldSpec, patterns};

const RESTRICTIONS: &[&str] = &["RESTRICTED", "NOT_RESTRICTED", "NOT_SET"];

fn disabled(record: &Record, _: &FormContext<'_>) -> bool {
    !record.bool_field("enable")
}

fn out_of_range(record: &Record, field: &str, min: i64, max: i64) -> bool {
    !record.is_blank(field)
        && record
            .int_field(field)
            .is_none_or(|n| !(min..=max).contains(&n))
}

fn invalid_allowed_ips(record: &Record, _: &FormContext<'_>) -> bool {
    record
        .str_field("allowed_ip_addresses")
        .is_some_and(|ips| !ips.is_empty() && !patterns::is_ip_list(ips))
}

fn invalid_max_sessions(record: &Record, _: &FormContext<'_>) -> bool {
    out_of_range(record, "max_sessions_per_identity", 1, 10)
}

fn invalid_session_expiration(record: &Record, _: &FormContext<'_>) -> bool {
    out_of_range(record, "session_expiration_in_seconds", 900, 86_400)
}

fn invalid_session_invalidation(record: &Record, _: &FormContext<'_>) -> bool {
    out_of_range(record, "session_invalidation_in_seconds", 900, 7_200)
}

pub static IAM_SETTINGS: EntitySpec = EntitySpec::singleton(
    IAM_ACCOUNT_SETTINGS,
    &[
        FieldSpec::toggle("enable", false),
        FieldSpec::select("mfa")
            .default_text("NONE")
            .options(&["NONE", "TOTP", "TOTP4ALL", "LEVEL1", "LEVEL2", "LEVEL3"])
            .hide_when(disabled),
        FieldSpec::text("allowed_ip_addresses")
            .invalid(
                invalid_allowed_ips,
                "Allowed IPs must be a comma separated list of addresses or CIDR blocks",
            )
            .hide_when(disabled),
        FieldSpec::toggle("include_history", false),
        FieldSpec::number("max_sessions_per_identity")
            .invalid(invalid_max_sessions, "Max sessions must be between 1 and 10")
            .hide_when(disabled),
        FieldSpec::select("restrict_create_service_id")
            .default_text("NOT_SET")
            .options(RESTRICTIONS)
            .hide_when(disabled),
        FieldSpec::select("restrict_create_platform_apikey")
            .default_text("NOT_SET")
            .options(RESTRICTIONS)
            .hide_when(disabled),
        FieldSpec::number("session_expiration_in_seconds")
            .invalid(
                invalid_session_expiration,
                "Session expiration must be between 900 and 86400 seconds",
            )
            .hide_when(disabled),
        FieldSpec::number("session_invalidation_in_seconds")
            .invalid(
                invalid_session_invalidation,
                "Session invalidation must be between 900 and 7200 seconds",
            )
            .hide_when(disabled),
    ],
);

pub struct IamAccountSettings;

impl EntityDefinition for IamAccountSettings {
    fn spec(&self) -> &'static EntitySpec {
        &IAM_SETTINGS
    }
}
