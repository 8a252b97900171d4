//! Integration tests for dlp-redact.
//!
//! These tests verify:
//! - The end-to-end scenarios of the DLP job (email/phone, card, null, missing column)
//! - Canary PII never survives a redacted column
//! - Failures abort the run instead of emitting partial output

use dlp_redact::{
    BatchOrchestrator, ColumnCategoryMap, DataType, Field, FieldValue, PatternRegistry, Record,
    RedactionError, Schema,
};
use std::sync::Arc;

/// Sensitive values that must never appear in a redacted column.
const CANARY_PII: &[(&str, &str)] = &[
    ("email", "jane.doe@example.com"),
    ("email", "ops-team@corp.internal"),
    ("phone_number", "555-123-4567"),
    ("phone_number", "(555) 987-6543"),
    ("phone_number", "555.222.3333"),
    ("credit_card", "4111 1111 1111 1111"),
    ("credit_card", "5500-0000-0000-0004"),
    ("credit_card", "340000000000009"),
];

fn orchestrator() -> BatchOrchestrator {
    BatchOrchestrator::new(Arc::new(PatternRegistry::with_defaults().unwrap()))
}

// ============================================================================
// Job Scenarios
// ============================================================================

#[test]
fn test_email_and_phone_scenario() {
    let records = vec![Record::from_text_pairs([
        ("email", Some("a@b.com")),
        ("phone_number", Some("555-123-4567")),
        ("name", Some("Jo")),
    ])
    .unwrap()];
    let columns =
        ColumnCategoryMap::from_pairs([("email", "email"), ("phone_number", "phone_number")])
            .unwrap();

    let output = orchestrator().run(&records, &columns, 1).unwrap();

    let record = &output.records[0];
    assert_eq!(record.text("email"), Some("[EMAIL_REDACTED]"));
    assert_eq!(record.text("phone_number"), Some("[PHONE_REDACTED]"));
    assert_eq!(record.text("name"), Some("Jo"));
    assert_eq!(output.statistics.by_category["email"], 1);
    assert_eq!(output.statistics.by_category["phone_number"], 1);
}

#[test]
fn test_credit_card_scenario() {
    let records =
        vec![Record::from_text_pairs([("credit_card", Some("4111 1111 1111 1111"))]).unwrap()];
    let columns = ColumnCategoryMap::from_pairs([("credit_card", "credit_card")]).unwrap();

    let output = orchestrator().run(&records, &columns, 2).unwrap();

    assert_eq!(output.records[0].text("credit_card"), Some("[CC_REDACTED]"));
    assert_eq!(output.statistics.by_category["credit_card"], 1);
}

#[test]
fn test_null_scenario() {
    let records = vec![Record::from_text_pairs([("email", None::<&str>)]).unwrap()];
    let columns = ColumnCategoryMap::from_pairs([("email", "email")]).unwrap();

    let output = orchestrator().run(&records, &columns, 1).unwrap();

    assert_eq!(output.records[0].get("email"), Some(&FieldValue::Null));
    assert_eq!(output.statistics.by_category["email"], 0);
    assert!(output.statistics.by_column["email"].found);
}

#[test]
fn test_missing_column_scenario() {
    let mut registry = PatternRegistry::with_defaults().unwrap();
    registry
        .register_regex("ssn", r"\b\d{3}-\d{2}-\d{4}\b", "[SSN_REDACTED]")
        .unwrap();
    let orchestrator = BatchOrchestrator::new(Arc::new(registry));

    let records: Vec<_> = (0..6)
        .map(|i| {
            let email = format!("u{i}@example.com");
            Record::from_text_pairs([("email", Some(email.as_str())), ("name", Some("Jo"))])
                .unwrap()
        })
        .collect();
    let columns = ColumnCategoryMap::from_pairs([("email", "email"), ("ssn", "ssn")]).unwrap();

    let output = orchestrator.run(&records, &columns, 3).unwrap();

    let stats = &output.statistics;
    assert_eq!(stats.missing_columns().collect::<Vec<_>>(), vec!["ssn"]);
    assert_eq!(stats.skipped_columns, 1);
    assert_eq!(stats.by_category["ssn"], 0);
    assert_eq!(stats.by_category["email"], 6);
    for (before, after) in records.iter().zip(&output.records) {
        assert_eq!(after.text("name"), before.text("name"));
        assert_eq!(after.text("email"), Some("[EMAIL_REDACTED]"));
    }
}

#[test]
fn test_original_job_binding_by_category_name() {
    let registry = Arc::new(PatternRegistry::with_defaults().unwrap());
    let columns = ColumnCategoryMap::by_category_name(&registry);
    let records = vec![Record::from_text_pairs([
        ("email", Some("reach me at a@b.com")),
        ("credit_card", Some("4111-1111-1111-1111")),
    ])
    .unwrap()];

    let output = BatchOrchestrator::new(registry).run(&records, &columns, 1).unwrap();

    assert_eq!(output.records[0].text("email"), Some("reach me at [EMAIL_REDACTED]"));
    assert_eq!(output.records[0].text("credit_card"), Some("[CC_REDACTED]"));
    assert_eq!(
        output.statistics.missing_columns().collect::<Vec<_>>(),
        vec!["phone_number"]
    );
}

// ============================================================================
// Canary Leak Tests
// ============================================================================

#[test]
fn test_canary_pii_never_leaks() {
    for (category, canary) in CANARY_PII {
        let embedded = format!("prefix {} suffix", canary);
        let records = vec![
            Record::from_text_pairs([("value", Some(*canary))]).unwrap(),
            Record::from_text_pairs([("value", Some(embedded.as_str()))]).unwrap(),
        ];
        let columns = ColumnCategoryMap::from_pairs([("value", *category)]).unwrap();

        let output = orchestrator().run(&records, &columns, 2).unwrap();

        for record in &output.records {
            let text = record.text("value").unwrap();
            assert!(
                !text.contains(canary),
                "Canary '{}' leaked for category {}: {}",
                canary,
                category,
                text
            );
        }
        assert_eq!(output.statistics.by_category[*category], 2);
    }
}

#[test]
fn test_binary_columns_redacted() {
    let schema = Arc::new(Schema::new(vec![Field::new("blob", DataType::Binary, true)]).unwrap());
    let records = vec![Record::new(
        schema,
        vec![FieldValue::from(b"contact: jane.doe@example.com".to_vec())],
    )
    .unwrap()];
    let columns = ColumnCategoryMap::from_pairs([("blob", "email")]).unwrap();

    let output = orchestrator().run(&records, &columns, 1).unwrap();

    assert_eq!(
        output.records[0].get("blob"),
        Some(&FieldValue::from(b"contact: [EMAIL_REDACTED]".to_vec()))
    );
}

// ============================================================================
// Fail-Fast Tests
// ============================================================================

#[test]
fn test_unsupported_column_type_aborts() {
    let schema = Arc::new(Schema::new(vec![Field::new("phone", DataType::Int64, true)]).unwrap());
    let mut records: Vec<_> = (0..8)
        .map(|_| Record::from_text_pairs([("phone", Some("555-123-4567"))]).unwrap())
        .collect();
    records.push(Record::new(schema, vec![FieldValue::Int64(5551234567)]).unwrap());
    let columns = ColumnCategoryMap::from_pairs([("phone", "phone_number")]).unwrap();

    let err = orchestrator().run(&records, &columns, 3).unwrap_err();

    assert_eq!(
        err,
        RedactionError::UnsupportedColumnType {
            column: "phone".into(),
            record: 8,
            data_type: "int64".into(),
        }
    );
}

#[test]
fn test_error_messages_never_contain_field_content() {
    let schema = Arc::new(Schema::new(vec![Field::new("email", DataType::Binary, true)]).unwrap());
    let mut bytes = b"secret.person@example.com ".to_vec();
    bytes.push(0xff);
    let records = vec![Record::new(schema, vec![FieldValue::from(bytes)]).unwrap()];
    let columns = ColumnCategoryMap::from_pairs([("email", "email")]).unwrap();

    let err = orchestrator().run(&records, &columns, 1).unwrap_err();

    assert!(!err.to_string().contains("secret.person"));
}
