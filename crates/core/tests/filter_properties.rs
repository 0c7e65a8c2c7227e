//! Property-based tests for typed filters.
//!
//! Uses proptest to validate:
//! - A value's wire string parses back to the same value for its column kind
//! - A filter set never holds two filters on one field

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use chrono::NaiveDate;
use gridwire_core::{FieldKind, Filter, FilterSet, FilterValue};
use proptest::prelude::*;

fn enum_kind() -> FieldKind {
    FieldKind::Enum {
        options: vec!["active".to_string(), "closed".to_string(), "on hold".to_string()],
    }
}

fn typed_value() -> impl Strategy<Value = (FieldKind, FilterValue)> {
    prop_oneof![
        ".{0,24}".prop_map(|s| (FieldKind::Text, FilterValue::Text(s))),
        (-1.0e12f64..1.0e12f64).prop_map(|n| (FieldKind::Number, FilterValue::Number(n))),
        (1900i32..2200, 1u32..=365)
            .prop_filter_map("valid date", |(y, d)| NaiveDate::from_yo_opt(y, d))
            .prop_map(|d| (FieldKind::Date, FilterValue::Date(d))),
        prop::sample::select(vec!["active", "closed", "on hold"])
            .prop_map(|s| (enum_kind(), FilterValue::Enum(s.to_string()))),
        "[a-f0-9]{1,12}".prop_map(|s| {
            (
                FieldKind::Relation {
                    target: "users".to_string(),
                },
                FilterValue::Relation(s),
            )
        }),
    ]
}

proptest! {
    /// Property: parse(kind, to_wire(value)) == value
    #[test]
    fn prop_wire_string_parses_back((kind, value) in typed_value()) {
        let parsed = FilterValue::parse(&kind, "field", &value.to_wire());
        prop_assert_eq!(parsed, Ok(value));
    }

    /// Property: any insertion sequence leaves one filter per field, holding
    /// the last value inserted for it
    #[test]
    fn prop_filter_set_keeps_one_filter_per_field(
        entries in prop::collection::vec(
            (prop::sample::select(vec!["name", "status", "owner"]), "[a-z]{0,6}"),
            0..12,
        )
    ) {
        let set: FilterSet = entries
            .iter()
            .map(|(field, value)| Filter::text(*field, value.clone()))
            .collect();

        let mut ids: Vec<_> = set.iter().map(|f| f.field_id.as_str()).collect();
        let count = ids.len();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), count);

        for (field, _) in &entries {
            let last = entries
                .iter()
                .rev()
                .find(|(f, _)| f == field)
                .map(|(_, v)| v.clone());
            prop_assert_eq!(set.get(field).map(|f| f.value.to_wire()), last);
        }
    }
}
