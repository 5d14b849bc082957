// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DEFAULT_ID_FIELD: &str = "id";

/// A scalar cell value. Objects and arrays are not representable.
///
/// `Integer` precedes `Number` so whole JSON numbers that fit an `i64` keep
/// every digit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Field name to value, in declaration order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub key: String,
    pub label: String,
    #[serde(default = "enabled")]
    pub sortable: bool,
    #[serde(default = "enabled")]
    pub searchable: bool,
}

const fn enabled() -> bool {
    true
}

impl FieldDescriptor {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            sortable: true,
            searchable: true,
        }
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    MissingRecordId { index: usize, id_field: String },
    DuplicateRecordId(RecordId),
    DuplicateField(String),
}

impl std::fmt::Display for CollectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRecordId { index, id_field } => {
                write!(f, "record {index} has no value for id field {id_field:?}")
            }
            Self::DuplicateRecordId(id) => write!(f, "duplicate record id {id:?}"),
            Self::DuplicateField(key) => write!(f, "field {key:?} is declared more than once"),
        }
    }
}

impl std::error::Error for CollectionError {}

pub type CollectionResult<T> = std::result::Result<T, CollectionError>;

/// A declared field that no record carries. The engine reads it as empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMismatch {
    pub field: String,
}

impl std::fmt::Display for SchemaMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "field {:?} is not present in any record", self.field)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "CollectionRepr")]
pub struct Collection {
    id_field: String,
    fields: Vec<FieldDescriptor>,
    records: Vec<Record>,
    ids: Vec<RecordId>,
    schema_mismatches: Vec<SchemaMismatch>,
}

#[derive(Debug, Deserialize)]
struct CollectionRepr {
    #[serde(default = "default_id_field")]
    id_field: String,
    fields: Vec<FieldDescriptor>,
    #[serde(default)]
    records: Vec<Record>,
}

fn default_id_field() -> String {
    DEFAULT_ID_FIELD.to_owned()
}

impl TryFrom<CollectionRepr> for Collection {
    type Error = CollectionError;

    fn try_from(repr: CollectionRepr) -> CollectionResult<Self> {
        Self::define(repr.id_field, repr.fields, repr.records)
    }
}

impl Collection {
    pub fn new(fields: Vec<FieldDescriptor>, records: Vec<Record>) -> CollectionResult<Self> {
        Self::define(DEFAULT_ID_FIELD, fields, records)
    }

    pub fn empty(fields: Vec<FieldDescriptor>) -> CollectionResult<Self> {
        Self::new(fields, Vec::new())
    }

    /// Validates ids and field declarations. Schema mismatches are logged here
    /// and kept on the collection; they never fail the definition.
    pub fn define(
        id_field: impl Into<String>,
        fields: Vec<FieldDescriptor>,
        records: Vec<Record>,
    ) -> CollectionResult<Self> {
        let id_field = id_field.into();

        let mut seen_fields = HashSet::new();
        for field in &fields {
            if !seen_fields.insert(field.key.as_str()) {
                return Err(CollectionError::DuplicateField(field.key.clone()));
            }
        }

        let mut ids = Vec::with_capacity(records.len());
        let mut seen_ids = HashSet::new();
        for (index, record) in records.iter().enumerate() {
            let id = record_id(record, &id_field, index)?;
            if !seen_ids.insert(id.clone()) {
                return Err(CollectionError::DuplicateRecordId(id));
            }
            ids.push(id);
        }

        let schema_mismatches = find_schema_mismatches(&fields, &records);
        for mismatch in &schema_mismatches {
            tracing::warn!(field = %mismatch.field, "{mismatch}");
        }

        Ok(Self {
            id_field,
            fields,
            records,
            ids,
            schema_mismatches,
        })
    }

    /// Returns a new collection with `record` appended; `self` is unchanged.
    pub fn with_record(&self, record: Record) -> CollectionResult<Self> {
        let id = record_id(&record, &self.id_field, self.records.len())?;
        if self.ids.contains(&id) {
            return Err(CollectionError::DuplicateRecordId(id));
        }

        let mut next = self.clone();
        next.records.push(record);
        next.ids.push(id);
        next.schema_mismatches = find_schema_mismatches(&next.fields, &next.records);
        Ok(next)
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.key == key)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn ids(&self) -> &[RecordId] {
        &self.ids
    }

    pub fn record(&self, id: &str) -> Option<&Record> {
        self.ids
            .iter()
            .position(|candidate| candidate.as_str() == id)
            .and_then(|index| self.records.get(index))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn schema_mismatches(&self) -> &[SchemaMismatch] {
        &self.schema_mismatches
    }
}

fn record_id(record: &Record, id_field: &str, index: usize) -> CollectionResult<RecordId> {
    let text = record.get(id_field).map(FieldValue::display).unwrap_or_default();
    if text.is_empty() {
        return Err(CollectionError::MissingRecordId {
            index,
            id_field: id_field.to_owned(),
        });
    }
    Ok(RecordId::new(text))
}

fn find_schema_mismatches(fields: &[FieldDescriptor], records: &[Record]) -> Vec<SchemaMismatch> {
    if records.is_empty() {
        return Vec::new();
    }
    fields
        .iter()
        .filter(|field| !records.iter().any(|record| record.contains_key(&field.key)))
        .map(|field| SchemaMismatch {
            field: field.key.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{Collection, CollectionError, FieldDescriptor, FieldValue, Record, RecordId};

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("id", "ID"),
            FieldDescriptor::new("name", "Name"),
        ]
    }

    #[test]
    fn duplicate_record_ids_are_rejected() {
        let records = vec![
            Record::new().with("id", 1).with("name", "a"),
            Record::new().with("id", 1).with("name", "b"),
        ];
        let error = Collection::new(fields(), records).expect_err("duplicate id should fail");
        assert_eq!(error, CollectionError::DuplicateRecordId(RecordId::new("1")));
    }

    #[test]
    fn large_integer_ids_stay_distinct() {
        let collection: Collection = serde_json::from_str(
            r#"{"fields": [], "records": [{"id": 9007199254740993}, {"id": 9007199254740992}]}"#,
        )
        .expect("ids differ past f64 precision");
        assert_eq!(
            collection.ids(),
            [
                RecordId::new("9007199254740993"),
                RecordId::new("9007199254740992"),
            ]
        );
        assert_eq!(
            collection.records()[0].get("id"),
            Some(&FieldValue::Integer(9_007_199_254_740_993))
        );
    }

    #[test]
    fn fractional_json_numbers_stay_floats() {
        let record: Record =
            serde_json::from_str(r#"{"id": 1, "temp": 37.5}"#).expect("record parses");
        assert_eq!(record.get("temp"), Some(&FieldValue::Number(37.5)));
        assert_eq!(record.get("id"), Some(&FieldValue::Integer(1)));
    }

    #[test]
    fn missing_record_id_is_rejected() {
        let records = vec![Record::new().with("name", "a")];
        let error = Collection::new(fields(), records).expect_err("missing id should fail");
        assert!(matches!(
            error,
            CollectionError::MissingRecordId { index: 0, .. }
        ));
    }

    #[test]
    fn null_id_counts_as_missing() {
        let records = vec![Record::new().with("id", FieldValue::Null)];
        assert!(Collection::new(fields(), records).is_err());
    }

    #[test]
    fn duplicate_field_keys_are_rejected() {
        let mut declared = fields();
        declared.push(FieldDescriptor::new("name", "Name again"));
        let error = Collection::empty(declared).expect_err("duplicate field should fail");
        assert_eq!(error, CollectionError::DuplicateField("name".to_owned()));
    }

    #[test]
    fn absent_field_is_reported_once_as_schema_mismatch() {
        let mut declared = fields();
        declared.push(FieldDescriptor::new("ward", "Ward"));
        let records = vec![
            Record::new().with("id", 1).with("name", "a"),
            Record::new().with("id", 2),
        ];
        let collection = Collection::new(declared, records).expect("collection defines");
        let missing = collection
            .schema_mismatches()
            .iter()
            .map(|mismatch| mismatch.field.as_str())
            .collect::<Vec<_>>();
        assert_eq!(missing, vec!["ward"]);
    }

    #[test]
    fn empty_collection_has_no_schema_mismatches() {
        let collection = Collection::empty(fields()).expect("collection defines");
        assert!(collection.schema_mismatches().is_empty());
    }

    #[test]
    fn with_record_leaves_original_untouched() {
        let original = Collection::new(fields(), vec![Record::new().with("id", 1)])
            .expect("collection defines");
        let next = original
            .with_record(Record::new().with("id", 2).with("name", "b"))
            .expect("append succeeds");
        assert_eq!(original.len(), 1);
        assert_eq!(next.len(), 2);
        assert!(next.record("2").is_some());
        assert!(original.schema_mismatches().iter().any(|m| m.field == "name"));
        assert!(next.schema_mismatches().is_empty());

        let error = next
            .with_record(Record::new().with("id", 2))
            .expect_err("duplicate append should fail");
        assert_eq!(error, CollectionError::DuplicateRecordId(RecordId::new("2")));
    }

    #[test]
    fn record_preserves_field_order() {
        let record = Record::new().with("z", 1).with("a", 2).with("m", 3);
        let keys = record.iter().map(|(key, _)| key).collect::<Vec<_>>();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }
}
