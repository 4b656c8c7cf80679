//! End-to-end conversion of copybook fixtures.

use open_mainframe_copybook::{
    convert, convert_to_json, from_json, CopybookConfig, CopybookError, FieldType, LayoutNode,
    UnresolvedRedefines,
};
use pretty_assertions::assert_eq;

/// Helper to read a fixture.
fn fixture(name: &str) -> String {
    let mut path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    std::fs::read_to_string(path).unwrap()
}

/// (copybook name, type, start, length), depth first.
fn flatten(nodes: &[LayoutNode], out: &mut Vec<(String, FieldType, u32, u32)>) {
    for node in nodes {
        out.push((
            node.copybook_name.clone(),
            node.field_type,
            node.start,
            node.length,
        ));
        let children: Vec<LayoutNode> = node.children().cloned().collect();
        flatten(&children, out);
    }
}

fn row(name: &str, field_type: FieldType, start: u32, length: u32) -> (String, FieldType, u32, u32) {
    (name.to_string(), field_type, start, length)
}

#[test]
fn test_customer_record_layout() {
    let nodes = convert(&fixture("customer.cpy"), &CopybookConfig::default()).unwrap();
    let mut rows = Vec::new();
    flatten(&nodes, &mut rows);

    use FieldType::{Binary, Group, List, Number};
    assert_eq!(
        rows,
        vec![
            row("CUSTOMER-RECORD", Group, 0, 119),
            row("CUST-ID", Number, 0, 8),
            row("CUST-NAME", Group, 8, 35),
            row("CUST-FIRST-NAME", FieldType::String, 8, 15),
            row("CUST-LAST-NAME", FieldType::String, 23, 20),
            row("CUST-STATUS", FieldType::String, 43, 1),
            row("CUST-BALANCE", Binary, 44, 5),
            row("CUST-LIMIT", Binary, 49, 2),
            row("CUST-PHONES", List, 51, 28),
            row("PHONE-TYPE", FieldType::String, 51, 4),
            row("PHONE-NUMBER", Number, 55, 10),
            row("PHONE-TYPE", FieldType::String, 65, 4),
            row("PHONE-NUMBER", Number, 69, 10),
            row("CUST-OPEN-DATE", Number, 79, 8),
            row("CUST-OPEN-DATE-R", Group, 79, 8),
            row("OPEN-YEAR", Number, 79, 4),
            row("OPEN-MONTH", Number, 83, 2),
            row("OPEN-DAY", Number, 85, 2),
            row("CUST-NOTE", FieldType::String, 87, 30),
            row("CUST-REGION", FieldType::String, 117, 2),
            row("CUST-REGION-CODE", Number, 117, 2),
        ]
    );
}

#[test]
fn test_customer_record_names_and_redefines() {
    let nodes = convert(&fixture("customer.cpy"), &CopybookConfig::default()).unwrap();
    let record = &nodes[0];
    assert_eq!(record.name, "customer_record");

    let fields = record.fields();
    let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "cust_id",
            "cust_name",
            "cust_status",
            "cust_balance",
            "cust_limit",
            "cust_phones",
            "cust_open_date",
            "cust_open_date_r",
            "cust_note",
            "cust_region",
            "cust_region_code",
        ]
    );

    let phones = &fields[5];
    assert_eq!(phones.occurs, Some(2));
    assert_eq!(phones.occurrences().len(), 2);

    assert_eq!(fields[7].redefines.as_deref(), Some("cust_open_date"));
    assert_eq!(fields[10].redefines.as_deref(), Some("cust_region"));
}

#[test]
fn test_two_field_record() {
    let source = "000100 01  REC.\n000200     05  A PIC X(3).\n000300     05  B PIC 9(2).\n";
    let nodes = convert(source, &CopybookConfig::default()).unwrap();
    let mut rows = Vec::new();
    flatten(&nodes, &mut rows);

    // Fields pack back to back, so B starts at 3 (the byte after A), not 4.
    assert_eq!(
        rows,
        vec![
            row("REC", FieldType::Group, 0, 5),
            row("A", FieldType::String, 0, 3),
            row("B", FieldType::Number, 3, 2),
        ]
    );
    assert_eq!(nodes[0].fields()[0].name, "a");
}

#[test]
fn test_json_output_round_trips() {
    let config = CopybookConfig::default();
    let json = convert_to_json(&fixture("customer.cpy"), &config).unwrap();
    assert!(json.starts_with("[\n    {\n        \"name\": \"customer_record\""));
    assert!(!json.contains("null"));

    let nodes = from_json(&json).unwrap();
    assert_eq!(nodes, convert(&fixture("customer.cpy"), &config).unwrap());
}

#[test]
fn test_crlf_and_lowercase_source() {
    let source = "000100 01  rec.\r\n000200     05  a pic x(3).\r\n000300     05  b pic 9(2) comp-3.\r\n";
    let nodes = convert(source, &CopybookConfig::default()).unwrap();
    let fields = nodes[0].fields();
    assert_eq!(fields[0].name, "a");
    assert_eq!(fields[1].field_type, FieldType::Binary);
    assert_eq!((fields[1].start, fields[1].length), (3, 2));
    assert_eq!(nodes[0].length, 5);
}

#[test]
fn test_continued_literal() {
    let source = [
        "000100 01  REC.",
        "000200     05  MSG PIC X(20) VALUE 'HELLO",
        "000300-    ' WORLD'.",
        "000400     05  NEXT-FIELD PIC X.",
    ]
    .join("\n");
    let nodes = convert(&source, &CopybookConfig::default()).unwrap();
    let fields = nodes[0].fields();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[1].start, 20);
}

#[test]
fn test_unresolved_redefines_policy_from_config() {
    let source = "000100 01  REC.\n000200     05  A PIC X(4).\n000300     05  B REDEFINES MISSING PIC X(2).\n";

    let err = convert(source, &CopybookConfig::default()).unwrap_err();
    assert!(matches!(err, CopybookError::UnresolvedRedefines { line: 3, .. }));

    let config = CopybookConfig::from_toml("[layout]\nunresolved_redefines = \"record-start\"\n")
        .unwrap();
    assert_eq!(config.layout.unresolved_redefines, UnresolvedRedefines::RecordStart);
    let nodes = convert(source, &config).unwrap();
    assert_eq!(nodes[0].fields()[1].start, 0);
}
