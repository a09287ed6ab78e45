use chrono::NaiveDate;
use keycheck_license::{
    AllowedDomains, CheckResult, ConstraintViolation, EnvironmentContext, ErrorScope,
    LicenseData, LicenseError, LicenseStatus, CHECKSUM_FAILED_MESSAGE, UNREACHABLE_MESSAGE,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn env() -> EnvironmentContext {
    EnvironmentContext::new("shop.example", "203.0.113.7", "/srv/shop")
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
}

fn matching_json() -> Value {
    json!({
        "allowedDomains": "shop.example, www.shop.example",
        "allowedIPAddress": "203.0.113.7",
        "allowedDirectory": "/srv/shop",
    })
}

fn matching_data() -> LicenseData {
    LicenseData::new(matching_json())
}

fn trial(expiry: Value) -> LicenseData {
    let mut data = matching_json();
    data["isTrial"] = json!(true);
    data["trialExpiry"] = expiry;
    LicenseData::new(data)
}

// ── LicenseStatus ────────────────────────────────────────────────

#[test]
fn status_wire_forms() {
    let statuses: Vec<LicenseStatus> =
        serde_json::from_value(json!(["active", "invalid", "Invalid", "error", "suspended"]))
            .unwrap();
    assert_eq!(
        statuses,
        vec![
            LicenseStatus::Active,
            LicenseStatus::Invalid,
            LicenseStatus::Invalid,
            LicenseStatus::Error,
            LicenseStatus::Other("suspended".into()),
        ]
    );

    assert_eq!(
        serde_json::to_value(&statuses).unwrap(),
        json!(["active", "Invalid", "Invalid", "error", "suspended"])
    );
}

#[test]
fn status_is_case_sensitive_for_active() {
    let status: LicenseStatus = serde_json::from_value(json!("Active")).unwrap();
    assert_eq!(status, LicenseStatus::Other("Active".into()));
    assert!(!status.is_active());
}

// ── AllowedDomains ───────────────────────────────────────────────

#[test]
fn joined_domains_are_trimmed() {
    let domains = AllowedDomains::Joined(" a.example ,b.example,, ".into());
    assert!(domains.contains("a.example"));
    assert!(domains.contains("b.example"));
    assert!(!domains.contains(""));
    assert!(!domains.contains("c.example"));
}

#[test]
fn domains_accept_list_form() {
    let data = LicenseData::new(json!({"allowedDomains": ["a.example", 7, "b.example"]}));
    assert_eq!(
        data.allowed_domains(),
        AllowedDomains::List(vec!["a.example".into(), "b.example".into()])
    );
    assert!(data.allowed_domains().contains("b.example"));
}

#[test]
fn null_fields_read_as_empty() {
    let data = LicenseData::new(json!({
        "allowedDomains": null,
        "allowedIPAddress": null,
        "allowedDirectory": 42,
        "trialExpiry": null,
        "hash": null,
    }));
    assert!(!data.allowed_domains().contains("shop.example"));
    assert_eq!(data.allowed_ip_address(), "");
    assert_eq!(data.allowed_directory(), "");
    assert_eq!(data.trial_expiry(), None);
    assert_eq!(data.hash(), None);
    assert_eq!(
        data.violation(&env(), today()),
        Some(ConstraintViolation::DomainNotAllowed)
    );
}

#[test]
fn non_object_license_data_is_missing() {
    for value in [json!([]), json!("active"), json!(1)] {
        assert_eq!(
            LicenseData::new(value).violation(&env(), today()),
            Some(ConstraintViolation::MissingLicenseData)
        );
    }
}

#[test]
fn numeric_hash_compared_as_text() {
    let data = LicenseData::new(json!({"hash": 12345}));
    assert_eq!(data.hash().as_deref(), Some("12345"));
}

#[test]
fn domain_match_is_exact() {
    let domains = AllowedDomains::Joined("example.com".into());
    assert!(!domains.contains("sub.example.com"));
    assert!(!domains.contains("EXAMPLE.COM"));
}

// ── LicenseData constraints ──────────────────────────────────────

#[test]
fn matching_host_has_no_violation() {
    assert_eq!(matching_data().violation(&env(), today()), None);
}

#[test]
fn each_constraint_fails_independently() {
    let cases = [
        (
            EnvironmentContext::new("other.example", "203.0.113.7", "/srv/shop"),
            ConstraintViolation::DomainNotAllowed,
        ),
        (
            EnvironmentContext::new("shop.example", "203.0.113.8", "/srv/shop"),
            ConstraintViolation::IpAddressMismatch,
        ),
        (
            EnvironmentContext::new("shop.example", "203.0.113.7", "/srv/shop2"),
            ConstraintViolation::DirectoryMismatch,
        ),
    ];

    for (host, expected) in cases {
        assert_eq!(matching_data().violation(&host, today()), Some(expected));
    }
}

#[test]
fn trial_checked_first() {
    let data = trial(json!("30-01-2025"));
    let elsewhere = EnvironmentContext::new("other.example", "0.0.0.0", "/");
    assert_eq!(
        data.violation(&elsewhere, today()),
        Some(ConstraintViolation::TrialExpired)
    );
}

#[test]
fn trial_expiry_boundary() {
    assert_eq!(trial(json!("31-01-2025")).violation(&env(), today()), None);
    assert_eq!(trial(json!("2025-01-31")).violation(&env(), today()), None);
    assert_eq!(
        trial(json!("30-01-2025")).violation(&env(), today()),
        Some(ConstraintViolation::TrialExpired)
    );
}

#[test]
fn unreadable_trial_expiry_is_a_violation() {
    for expiry in [json!(null), json!("soon"), json!("31/01/2025"), json!(20250131)] {
        assert_eq!(
            trial(expiry).violation(&env(), today()),
            Some(ConstraintViolation::TrialExpiryUnreadable)
        );
    }
}

#[test]
fn expiry_ignored_for_non_trial() {
    let mut data = matching_json();
    data["trialExpiry"] = json!("01-01-2000");
    assert_eq!(LicenseData::new(data).violation(&env(), today()), None);
}

#[test]
fn trial_flag_accepts_loose_forms() {
    for (value, expected) in [
        (json!(true), true),
        (json!(1), true),
        (json!("1"), true),
        (json!("true"), true),
        (json!(0), false),
        (json!("0"), false),
        (json!(""), false),
        (json!(null), false),
    ] {
        let data = LicenseData::new(json!({"isTrial": value}));
        assert_eq!(data.is_trial(), expected, "isTrial = {value}");
    }
}

#[test]
fn license_data_round_trips_as_sent() {
    let input = json!({
        "status": "Active",
        "allowedDomains": "shop.example",
        "allowedIPAddress": "203.0.113.7",
        "allowedDirectory": "/srv/shop",
        "isTrial": "0",
        "hash": "abc",
        "productName": "Reports Pro",
        "seats": 5,
    });
    let data: LicenseData = serde_json::from_value(input.clone()).unwrap();
    assert_eq!(data.hash().as_deref(), Some("abc"));
    assert_eq!(data.status(), Some(LicenseStatus::Other("Active".into())));
    assert!(!data.is_trial());
    assert_eq!(data.get("seats"), Some(&json!(5)));
    assert_eq!(serde_json::to_value(&data).unwrap(), input);
}

// ── CheckResult ──────────────────────────────────────────────────

#[test]
fn remote_result_round_trips_passthrough_fields() {
    let input = json!({
        "status": "active",
        "licenseData": {
            "allowedDomains": "shop.example",
            "allowedIPAddress": "203.0.113.7",
            "allowedDirectory": "/srv/shop",
            "isTrial": false,
        },
        "registeredName": "Jane Doe",
        "nextDueDate": "2025-12-01",
        "checkDate": "20250131",
    });

    let result: CheckResult = serde_json::from_value(input.clone()).unwrap();
    assert!(result.is_active());
    assert_eq!(result.parsed_check_date(), Some(today()));
    assert_eq!(result.extra["registeredName"], "Jane Doe");
    assert_eq!(serde_json::to_value(&result).unwrap(), input);
}

#[test]
fn result_without_string_status_does_not_parse() {
    for body in [
        json!({"licenseData": {}}),
        json!({"status": 1}),
        json!({"status": null}),
        json!(["active"]),
    ] {
        assert!(serde_json::from_value::<CheckResult>(body).is_err());
    }
}

#[test]
fn mistyped_fields_kept_verbatim() {
    let input = json!({
        "status": "Invalid",
        "message": {"en": "Suspended"},
        "errors": "one error",
        "scope": "galaxy",
        "licenseData": [],
    });

    let result: CheckResult = serde_json::from_value(input.clone()).unwrap();
    assert_eq!(result.status, LicenseStatus::Invalid);
    assert_eq!(result.message, None);
    assert!(result.errors.is_empty());
    assert_eq!(result.scope, None);
    assert_eq!(result.license_data, Some(LicenseData::new(json!([]))));
    assert_eq!(serde_json::to_value(&result).unwrap(), input);
}

#[test]
fn numeric_check_date_accepted() {
    let result: CheckResult =
        serde_json::from_value(json!({"status": "Suspended", "checkDate": 20250131})).unwrap();
    assert_eq!(result.check_date.as_deref(), Some("20250131"));
    assert_eq!(result.parsed_check_date(), Some(today()));
}

#[test]
fn server_cannot_set_client_fields() {
    let result: CheckResult = serde_json::from_value(json!({
        "status": "active",
        "remoteCheck": "yes",
        "offlineKey": 5,
    }))
    .unwrap();
    assert!(!result.remote_check);
    assert_eq!(result.offline_key, None);
    assert!(result.extra.is_empty());
}

#[test]
fn remote_check_flag_serialized_only_when_set() {
    let mut result = CheckResult::with_status(LicenseStatus::Active);
    assert_eq!(serde_json::to_value(&result).unwrap(), json!({"status": "active"}));

    result.remote_check = true;
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"status": "active", "remoteCheck": true})
    );
}

#[test]
fn local_errors_map_to_error_results() {
    let result = CheckResult::from(LicenseError::MissingLicenseKey);
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"status": "error", "scope": "local", "errors": ["No license key passed"]})
    );
}

#[test]
fn protocol_error_maps_to_remote_scope() {
    let result = CheckResult::from(LicenseError::RemoteProtocol);
    assert_eq!(result.status, LicenseStatus::Error);
    assert_eq!(result.scope, Some(ErrorScope::Remote));
    assert_eq!(result.errors, vec!["Invalid license server response"]);
}

#[test]
fn unreachable_and_integrity_map_to_invalid() {
    assert_eq!(
        serde_json::to_value(CheckResult::from(LicenseError::RemoteUnreachable {
            response_code: 0
        }))
        .unwrap(),
        json!({"status": "Invalid", "message": UNREACHABLE_MESSAGE})
    );
    assert_eq!(
        CheckResult::from(LicenseError::Integrity),
        CheckResult::invalid(CHECKSUM_FAILED_MESSAGE)
    );
}
