use std::fmt;

use serde::Serialize;

/// Subject type. Picks the extraction strategy and the output columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Schema {
    Legislator,
    Committee,
}

pub const LEGISLATOR_COLUMNS: &[&str] = &[
    "first_name",
    "last_name",
    "position",
    "district",
    "party",
    "city",
    "madison_office",
    "telephones",
    "fax",
    "district_phone",
    "email",
    "district_address",
    "voting_address",
    "staff",
    "positioned_committees",
    "committees",
    "biography",
];

pub const COMMITTEE_COLUMNS: &[&str] = &[
    "header",
    "chair",
    "co_chair",
    "vice_chair",
    "committee_clerk",
    "council_staff",
    "members",
    "other_members",
    "hearings",
];

impl Schema {
    pub fn name(self) -> &'static str {
        match self {
            Schema::Legislator => "legislator",
            Schema::Committee => "committee",
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Schema::Legislator => LEGISLATOR_COLUMNS,
            Schema::Committee => COMMITTEE_COLUMNS,
        }
    }

    pub fn arity(self) -> usize {
        self.columns().len()
    }

    /// Whether `column` carries a `Field::List` when present.
    pub fn is_list_column(self, column: &str) -> bool {
        match self {
            Schema::Legislator => {
                matches!(column, "staff" | "positioned_committees" | "committees")
            }
            Schema::Committee => column != "header" && self.columns().contains(&column),
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One output cell. `Null` is the explicit "absent" marker and serializes
/// as JSON `null`, which keeps it apart from a present-but-empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Field {
    Null,
    Text(String),
    List(Vec<String>),
}

impl Field {
    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Field::List(l) => Some(l),
            _ => None,
        }
    }
}

impl From<Option<String>> for Field {
    fn from(value: Option<String>) -> Self {
        value.map_or(Field::Null, Field::Text)
    }
}

impl From<Vec<String>> for Field {
    fn from(value: Vec<String>) -> Self {
        if value.is_empty() {
            Field::Null
        } else {
            Field::List(value)
        }
    }
}

/// Flat, schema-ordered output row. Built only through `new`, which pins
/// the field count to the schema's arity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedRecord {
    schema: Schema,
    fields: Vec<Field>,
}

impl NormalizedRecord {
    pub(crate) fn new(schema: Schema, fields: Vec<Field>) -> Self {
        assert_eq!(
            fields.len(),
            schema.arity(),
            "{} record built with wrong field count",
            schema
        );
        NormalizedRecord { schema, fields }
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<&Field> {
        let idx = self.schema.columns().iter().position(|c| *c == column)?;
        self.fields.get(idx)
    }

    /// (column, field) pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Field)> {
        self.schema.columns().iter().copied().zip(self.fields.iter())
    }

    /// JSON object keyed by column name.
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .iter()
            .map(|(col, field)| {
                (
                    col.to_string(),
                    serde_json::to_value(field).unwrap_or(serde_json::Value::Null),
                )
            })
            .collect();
        serde_json::Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arities() {
        assert_eq!(Schema::Legislator.arity(), 17);
        assert_eq!(Schema::Committee.arity(), 9);
    }

    #[test]
    fn list_columns() {
        assert!(Schema::Legislator.is_list_column("staff"));
        assert!(!Schema::Legislator.is_list_column("email"));
        assert!(Schema::Committee.is_list_column("hearings"));
        assert!(!Schema::Committee.is_list_column("header"));
        assert!(!Schema::Committee.is_list_column("staff"));
    }

    #[test]
    fn empty_list_is_null() {
        assert_eq!(Field::from(Vec::<String>::new()), Field::Null);
        assert_eq!(Field::from(None::<String>), Field::Null);
    }

    #[test]
    fn null_serializes_as_json_null() {
        let v = serde_json::to_value(Field::Null).unwrap();
        assert!(v.is_null());
        let v = serde_json::to_value(Field::Text(String::new())).unwrap();
        assert_eq!(v, serde_json::json!(""));
    }

    #[test]
    fn lookup_by_column() {
        let mut fields = vec![Field::Null; 9];
        fields[1] = Field::List(vec!["Sen. Smith".into()]);
        let rec = NormalizedRecord::new(Schema::Committee, fields);
        assert_eq!(rec.get("chair").and_then(Field::as_list), Some(&["Sen. Smith".to_string()][..]));
        assert!(rec.get("nope").is_none());
        assert_eq!(rec.to_json()["header"], serde_json::Value::Null);
    }

    #[test]
    #[should_panic]
    fn wrong_arity_panics() {
        NormalizedRecord::new(Schema::Legislator, vec![Field::Null; 3]);
    }
}
