// Schema module: the two supported record kinds, their field lists, and
// the pre-flight validator every write path goes through. Everything in
// here is pure; no remote calls happen at this layer.

use serde_json::Value;

use crate::error::ValidationError;

/// A record is a flat field mapping, exactly as the backend stores it.
/// Field values are free-form JSON; prompts produce strings, but rows
/// read back from the store may carry numbers (the `id` column does).
pub type Record = serde_json::Map<String, Value>;

/// The two supported record kinds. Every remote operation takes a
/// `Kind`, so an unknown kind string can never reach the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Link,
    Paper,
}

/// Field layout for one kind: which fields must be present, which may
/// be, and which are shown when listing records.
pub struct KindSchema {
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    pub display: &'static [&'static str],
}

static LINK_SCHEMA: KindSchema = KindSchema {
    required: &["title", "url", "date"],
    optional: &["note", "desc"],
    display: &["title", "url", "date", "note"],
};

static PAPER_SCHEMA: KindSchema = KindSchema {
    required: &["title", "authors", "url", "year", "date"],
    optional: &["desc"],
    display: &["title", "authors", "year", "url"],
};

impl Kind {
    pub const ALL: [Kind; 2] = [Kind::Link, Kind::Paper];

    /// Backend table name for this kind.
    pub fn table(&self) -> &'static str {
        match self {
            Kind::Link => "links",
            Kind::Paper => "papers",
        }
    }

    pub fn schema(&self) -> &'static KindSchema {
        match self {
            Kind::Link => &LINK_SCHEMA,
            Kind::Paper => &PAPER_SCHEMA,
        }
    }

    /// All schema fields in prompt order, required first.
    pub fn fields(&self) -> Vec<&'static str> {
        let schema = self.schema();
        schema
            .required
            .iter()
            .chain(schema.optional.iter())
            .copied()
            .collect()
    }

    /// Parse a user-entered kind name. Case-insensitive; both the
    /// singular kind name and the table name are accepted.
    pub fn parse(input: &str) -> Result<Kind, ValidationError> {
        match input.trim().to_lowercase().as_str() {
            "link" | "links" => Ok(Kind::Link),
            "paper" | "papers" => Ok(Kind::Paper),
            _ => Err(ValidationError::UnknownKind(input.trim().to_string())),
        }
    }
}

/// Check that every required field of `kind` is present and non-empty.
/// Absent, `null`, and `""` all count as missing; the error names every
/// offending field at once.
pub fn validate_record(kind: Kind, record: &Record) -> Result<(), ValidationError> {
    let missing: Vec<String> = kind
        .schema()
        .required
        .iter()
        .filter(|field| !record.get(**field).is_some_and(is_present))
        .map(|field| field.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingFields(missing))
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Extract the system-assigned identifier of a stored row as text.
/// The backend serial column comes back as a JSON number.
pub fn record_id(record: &Record) -> Option<String> {
    match record.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(fields: &[(&str, Value)]) -> Record {
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn parse_accepts_table_and_kind_names() {
        assert_eq!(Kind::parse("links").unwrap(), Kind::Link);
        assert_eq!(Kind::parse("link").unwrap(), Kind::Link);
        assert_eq!(Kind::parse(" PAPERS ").unwrap(), Kind::Paper);
        assert_eq!(Kind::parse("Paper").unwrap(), Kind::Paper);
    }

    #[test]
    fn parse_rejects_unknown_kind() {
        let err = Kind::parse("notes").unwrap_err();
        assert_eq!(err, ValidationError::UnknownKind("notes".to_string()));
        assert!(err.to_string().contains("links, papers"));
    }

    #[test]
    fn complete_link_passes_validation() {
        let rec = record(&[
            ("title", json!("Rust book")),
            ("url", json!("https://doc.rust-lang.org/book")),
            ("date", json!("2024-01-15")),
        ]);
        assert!(validate_record(Kind::Link, &rec).is_ok());
    }

    #[test]
    fn optional_fields_may_be_absent() {
        let rec = record(&[
            ("title", json!("Attention Is All You Need")),
            ("authors", json!("Vaswani et al.")),
            ("url", json!("https://arxiv.org/abs/1706.03762")),
            ("year", json!("2017")),
            ("date", json!("2024-03-02")),
        ]);
        assert!(validate_record(Kind::Paper, &rec).is_ok());
    }

    #[test]
    fn missing_fields_are_all_named() {
        let rec = record(&[("title", json!("dangling"))]);
        match validate_record(Kind::Link, &rec) {
            Err(ValidationError::MissingFields(fields)) => {
                assert_eq!(fields, vec!["url", "date"]);
            }
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }

    #[test]
    fn empty_and_null_values_count_as_missing() {
        let rec = record(&[
            ("title", json!("")),
            ("url", json!(null)),
            ("date", json!("2024-01-15")),
        ]);
        match validate_record(Kind::Link, &rec) {
            Err(ValidationError::MissingFields(fields)) => {
                assert_eq!(fields, vec!["title", "url"]);
            }
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }

    #[test]
    fn paper_validation_names_its_own_required_fields() {
        let rec = record(&[("url", json!("https://example.org/p.pdf"))]);
        match validate_record(Kind::Paper, &rec) {
            Err(ValidationError::MissingFields(fields)) => {
                assert_eq!(fields, vec!["title", "authors", "year", "date"]);
            }
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }

    #[test]
    fn record_id_handles_numeric_and_text_ids() {
        assert_eq!(record_id(&record(&[("id", json!(42))])), Some("42".into()));
        assert_eq!(
            record_id(&record(&[("id", json!("a1b2"))])),
            Some("a1b2".into())
        );
        assert_eq!(record_id(&record(&[("title", json!("no id"))])), None);
    }
}
