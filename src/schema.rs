//! Record Schemas
//!
//! A database type is described by the record it decodes into. Each record
//! type carries a static table binding output field keys to setters; at load
//! time the table is matched against the file's field list once, producing a
//! [`ColumnMap`] that decoding then walks by position.
//!
//! ```rust
//! use ipdb::schema::{FieldBinding, Record};
//!
//! #[derive(Debug, Default)]
//! struct Country {
//!     name: String,
//!     code: String,
//! }
//!
//! impl Record for Country {
//!     fn bindings() -> &'static [FieldBinding<Self>] {
//!         const BINDINGS: &[FieldBinding<Country>] = &[
//!             FieldBinding::new("country_name", |r, v| r.name = v.to_owned()),
//!             FieldBinding::new("country_code", |r, v| r.code = v.to_owned()),
//!         ];
//!         BINDINGS
//!     }
//! }
//! ```

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Binds one output field key to a slot in a record
pub struct FieldBinding<R> {
    /// Field name as it appears in the database metadata
    pub key: &'static str,
    /// Stores a decoded value into the record
    pub assign: fn(&mut R, &str),
}

impl<R> FieldBinding<R> {
    /// Create a binding
    pub const fn new(key: &'static str, assign: fn(&mut R, &str)) -> Self {
        Self { key, assign }
    }
}

impl<R> std::fmt::Debug for FieldBinding<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldBinding").field("key", &self.key).finish()
    }
}

/// A record type a database can decode into
pub trait Record: Default + Send + Sync + 'static {
    /// Static field bindings; fields without a binding are ignored
    fn bindings() -> &'static [FieldBinding<Self>];

    /// Build a record from one language's decoded values
    fn from_row(row: &Row<'_, Self>) -> Self {
        let mut record = Self::default();
        for (binding, value) in row.bound_values() {
            (binding.assign)(&mut record, value);
        }
        record
    }
}

/// Per-load mapping from field position to binding
pub struct ColumnMap<R: 'static> {
    slots: Vec<Option<&'static FieldBinding<R>>>,
}

impl<R: Record> ColumnMap<R> {
    /// Match the record's bindings against a file's field list
    pub fn new(fields: &[String]) -> Self {
        let bindings = R::bindings();
        let slots = fields
            .iter()
            .map(|field| bindings.iter().find(|b| b.key == field.as_str()))
            .collect();
        Self { slots }
    }

    /// Binding for the field at `index`, if the record has one
    pub fn binding(&self, index: usize) -> Option<&'static FieldBinding<R>> {
        self.slots.get(index).copied().flatten()
    }

    /// Number of fields with a binding
    pub fn bound_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

impl<R> std::fmt::Debug for ColumnMap<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<Option<&str>> = self.slots.iter().map(|s| s.map(|b| b.key)).collect();
        f.debug_struct("ColumnMap").field("slots", &keys).finish()
    }
}

/// One decoded language block, paired with its field names
pub struct Row<'a, R: 'static> {
    /// Field names in schema order
    pub names: &'a [String],
    /// Values in schema order
    pub values: &'a [String],
    columns: &'a ColumnMap<R>,
}

impl<'a, R: Record> Row<'a, R> {
    pub(crate) fn new(names: &'a [String], values: &'a [String], columns: &'a ColumnMap<R>) -> Self {
        Self {
            names,
            values,
            columns,
        }
    }

    /// Values that have a binding in `R`, with their bindings
    pub fn bound_values(&self) -> impl Iterator<Item = (&'static FieldBinding<R>, &'a str)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| self.columns.binding(i).map(|b| (b, v.as_str())))
    }
}

/// Field name -> value map preserving schema order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    entries: Vec<(String, String)>,
}

impl FieldMap {
    /// Pair names with values (shorter side wins)
    pub fn from_pairs(names: &[String], values: &[String]) -> Self {
        Self {
            entries: names
                .iter()
                .cloned()
                .zip(values.iter().cloned())
                .collect(),
        }
    }

    /// Value for a field
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no fields
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(name, value)` in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Field names in schema order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl IntoIterator for FieldMap {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl Record for FieldMap {
    fn bindings() -> &'static [FieldBinding<Self>] {
        &[]
    }

    fn from_row(row: &Row<'_, Self>) -> Self {
        FieldMap::from_pairs(row.names, row.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Place {
        country: String,
        city: String,
    }

    impl Record for Place {
        fn bindings() -> &'static [FieldBinding<Self>] {
            const BINDINGS: &[FieldBinding<Place>] = &[
                FieldBinding::new("country_name", |r, v| r.country = v.to_owned()),
                FieldBinding::new("city_name", |r, v| r.city = v.to_owned()),
            ];
            BINDINGS
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_column_map_matches_by_name() {
        let fields = names(&["city_name", "isp_domain", "country_name"]);
        let columns = ColumnMap::<Place>::new(&fields);

        assert_eq!(columns.binding(0).map(|b| b.key), Some("city_name"));
        assert!(columns.binding(1).is_none());
        assert_eq!(columns.binding(2).map(|b| b.key), Some("country_name"));
        assert!(columns.binding(3).is_none());
        assert_eq!(columns.bound_count(), 2);
    }

    #[test]
    fn test_record_from_row() {
        let fields = names(&["city_name", "isp_domain", "country_name"]);
        let values = names(&["Hangzhou", "example.net", "China"]);
        let columns = ColumnMap::<Place>::new(&fields);

        let place = Place::from_row(&Row::new(&fields, &values, &columns));
        assert_eq!(
            place,
            Place {
                country: "China".into(),
                city: "Hangzhou".into()
            }
        );
    }

    #[test]
    fn test_field_map_keeps_order() {
        let fields = names(&["z", "a", "m"]);
        let values = names(&["1", "2", "3"]);
        let columns = ColumnMap::<FieldMap>::new(&fields);
        let map = FieldMap::from_row(&Row::new(&fields, &values, &columns));

        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
        assert_eq!(map.get("a"), Some("2"));
        assert_eq!(map.get("q"), None);
        assert_eq!(
            serde_json::to_string(&map).unwrap(),
            r#"{"z":"1","a":"2","m":"3"}"#
        );
    }
}
