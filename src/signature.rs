//! Trait Signatures
//!
//! Order-independent keys over a record's attribute multiset, used to detect
//! duplicate trait combinations. Equality is the only meaningful operation.

use std::fmt;

use crate::metadata::{AttributeEntry, Attributes, MetadataRecord};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TraitSignature {
    /// Normalized `(trait_type, value)` pairs, sorted.
    Traits(Vec<(String, String)>),
    /// Only equal to another record whose `attributes` was not an array.
    MalformedAttributes,
}

impl TraitSignature {
    pub fn of(record: &MetadataRecord) -> Self {
        let entries = match &record.attributes {
            Attributes::Absent => return TraitSignature::Traits(vec![]),
            Attributes::Malformed => return TraitSignature::MalformedAttributes,
            Attributes::List(entries) => entries,
        };

        let mut pairs: Vec<(String, String)> = entries
            .iter()
            .filter_map(|entry| match entry {
                AttributeEntry::Trait { trait_type, value } => {
                    Some((normalize(trait_type), normalize(value)))
                }
                AttributeEntry::Skipped => None,
            })
            .collect();
        pairs.sort();

        TraitSignature::Traits(pairs)
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

impl fmt::Display for TraitSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraitSignature::MalformedAttributes => f.write_str("attributes:INVALID"),
            TraitSignature::Traits(pairs) => {
                for (i, (t, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    write!(f, "{t}={v}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sig(value: serde_json::Value) -> TraitSignature {
        TraitSignature::of(&MetadataRecord::from_value(&value).unwrap())
    }

    #[test]
    fn test_order_independent() {
        let a = sig(json!({"attributes": [
            {"trait_type": "Background", "value": "Red"},
            {"trait_type": "Eyes", "value": "Blue"},
            {"trait_type": "Hat", "value": "None"}
        ]}));
        let b = sig(json!({"attributes": [
            {"trait_type": "Hat", "value": "None"},
            {"trait_type": "Background", "value": "Red"},
            {"trait_type": "Eyes", "value": "Blue"}
        ]}));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "background=red|eyes=blue|hat=none");
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        let a = sig(json!({"attributes": [{"trait_type": " Eyes ", "value": "Blue"}]}));
        let b = sig(json!({"attributes": [{"trait_type": "eyes", "value": " blue "}]}));
        assert_eq!(a, b);
    }

    #[test]
    fn test_extra_fields_and_non_objects_ignored() {
        let a = sig(json!({"attributes": [
            {"trait_type": "Eyes", "value": "Blue", "display_type": "string", "rarity": 0.2},
            42,
            "loose"
        ]}));
        let b = sig(json!({"attributes": [{"trait_type": "Eyes", "value": "Blue"}]}));
        assert_eq!(a, b);
    }

    #[test]
    fn test_multiset_not_set() {
        let once = sig(json!({"attributes": [{"trait_type": "Eyes", "value": "Blue"}]}));
        let twice = sig(json!({"attributes": [
            {"trait_type": "Eyes", "value": "Blue"},
            {"trait_type": "Eyes", "value": "Blue"}
        ]}));
        assert_ne!(once, twice);
    }

    #[test]
    fn test_malformed_sentinel() {
        let a = sig(json!({"attributes": {"trait_type": "Eyes"}}));
        let b = sig(json!({"attributes": "Eyes=Blue"}));
        assert_eq!(a, TraitSignature::MalformedAttributes);
        assert_eq!(a, b);

        let empty = sig(json!({"attributes": []}));
        let absent = sig(json!({}));
        assert_ne!(a, empty);
        assert_eq!(empty, absent);
    }

    #[test]
    fn test_null_attributes_is_malformed() {
        let null = sig(json!({"attributes": null}));
        assert_eq!(null, TraitSignature::MalformedAttributes);
        assert_ne!(null, sig(json!({"attributes": []})));
        assert_ne!(null, sig(json!({})));
        assert_eq!(null, sig(json!({"attributes": 7})));
    }

    #[test]
    fn test_null_field_differs_from_missing_field() {
        let null = sig(json!({"attributes": [{"trait_type": "Hat", "value": null}]}));
        let missing = sig(json!({"attributes": [{"trait_type": "Hat"}]}));
        let none_text = sig(json!({"attributes": [{"trait_type": "Hat", "value": "None"}]}));

        assert_ne!(null, missing);
        assert_eq!(null, none_text);
        assert_eq!(null.to_string(), "hat=none");
        assert_eq!(missing.to_string(), "hat=");
    }

    #[test]
    fn test_delimiters_in_values_do_not_collide() {
        let a = sig(json!({"attributes": [{"trait_type": "a", "value": "b|c=d"}]}));
        let b = sig(json!({"attributes": [
            {"trait_type": "a", "value": "b"},
            {"trait_type": "c", "value": "d"}
        ]}));
        assert_eq!(a.to_string(), b.to_string());
        assert_ne!(a, b);
    }
}
