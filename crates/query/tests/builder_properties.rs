//! Property-based tests for canonical request building.
//!
//! Uses proptest to validate:
//! - Building is deterministic for structurally equal states
//! - Parsing a built URL reconstructs filters, sorting, search and page
//! - Governed page-size changes keep the offset page-aligned

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use chrono::NaiveDate;
use gridwire_core::{
    FieldDescriptor, Filter, FilterSet, FilterValue, Pagination, SortDirection, SortField, ViewId,
};
use gridwire_query::{BuilderConfig, Endpoint, ListQuery, QueryBuilder, TableView, ViewDescriptor, ViewPatch};
use proptest::prelude::*;
use url::Url;

fn columns() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::text("Name", "name"),
        FieldDescriptor::number("Amount", "amount"),
        FieldDescriptor::date("Due", "due"),
        FieldDescriptor::enumeration("Status", "status", ["active", "closed", "on hold"]),
        FieldDescriptor::relation("Owner", "owner", "users"),
    ]
}

fn filter_strategy() -> impl Strategy<Value = Filter> {
    prop_oneof![
        "[a-zA-Z0-9 &=?%+,]{0,16}".prop_map(|s| Filter::new("name", FilterValue::Text(s))),
        (-1.0e9f64..1.0e9f64).prop_map(|n| Filter::new("amount", FilterValue::Number(n))),
        (1970i32..2100, 1u32..=365)
            .prop_filter_map("valid date", |(y, d)| NaiveDate::from_yo_opt(y, d))
            .prop_map(|d| Filter::new("due", FilterValue::Date(d))),
        prop::sample::select(vec!["active", "closed", "on hold"])
            .prop_map(|s| Filter::new("status", FilterValue::Enum(s.to_string()))),
        "[a-f0-9]{1,12}".prop_map(|s| Filter::new("owner", FilterValue::Relation(s))),
    ]
}

fn sort_strategy() -> impl Strategy<Value = Vec<SortField>> {
    prop::collection::vec(
        (
            prop::sample::select(vec!["name", "amount", "due", "status"]),
            any::<bool>(),
        )
            .prop_map(|(id, desc)| SortField {
                field_id: id.to_string(),
                direction: if desc {
                    SortDirection::Desc
                } else {
                    SortDirection::Asc
                },
            }),
        0..4,
    )
}

fn state_strategy() -> impl Strategy<Value = TableView> {
    (
        prop::collection::vec(filter_strategy(), 0..6),
        "[a-zA-Z0-9 &=#]{0,20}",
        sort_strategy(),
        0u64..1000,
        1u64..200,
    )
        .prop_filter_map("valid pagination", |(filters, search, sort, index, size)| {
            let pagination = Pagination::new(index, size).ok()?;
            let mut view = TableView::new(
                ViewDescriptor::new(Endpoint::new("/api/invoices"), columns()).pagination(pagination),
            );
            view.filters = filters.into_iter().collect::<FilterSet>();
            view.search_text = search;
            view.sort = sort;
            Some(view)
        })
}

fn fail(e: impl std::fmt::Display) -> TestCaseError {
    TestCaseError::fail(e.to_string())
}

proptest! {
    /// Property: structurally equal states produce equal requests
    #[test]
    fn prop_build_is_deterministic(state in state_strategy()) {
        let builder = QueryBuilder::new(&BuilderConfig::default()).map_err(fail)?;
        let copy = state.clone();

        let a = builder.build(&ViewId::new("left"), &state).map_err(fail)?;
        let b = builder.build(&ViewId::new("right"), &copy).map_err(fail)?;

        prop_assert_eq!(&a.key, &b.key);
        prop_assert_eq!(a.target, b.target);
    }

    /// Property: state -> URL -> parsed query reconstructs the state
    #[test]
    fn prop_round_trip(state in state_strategy()) {
        let builder = QueryBuilder::new(&BuilderConfig::default()).map_err(fail)?;
        let request = builder.build(&ViewId::new("v"), &state).map_err(fail)?;
        let url = Url::parse("https://api.example.com")
            .and_then(|base| base.join(&request.target))
            .map_err(fail)?;

        let parsed = ListQuery::parse(&url, &state.columns).map_err(fail)?;

        prop_assert_eq!(parsed.filters, state.filters);
        prop_assert_eq!(parsed.sort, state.sort);
        prop_assert_eq!(parsed.global_filter, state.search_text);
        prop_assert_eq!(parsed.pagination, state.pagination);
    }

    /// Property: offset % size == 0 after every governed page-size change
    #[test]
    fn prop_page_size_change_keeps_alignment(
        index in 0u64..10_000,
        size in 1u64..500,
        new_size in 1u64..500,
    ) {
        let current = Pagination::new(index, size).map_err(fail)?;
        let patch = ViewPatch::page_size(current, new_size).map_err(fail)?;
        let pagination = patch.pagination.ok_or_else(|| fail("page patch without pagination"))?;

        prop_assert_eq!(pagination.offset().checked_rem(pagination.size()), Some(0));
        prop_assert_eq!(pagination.size(), new_size);
    }
}
