//! Equality rules used to decide whether a write actually changed a value.
//!
//! Absent values are `None`. Two absent values are equal, one absent value is
//! never equal to a present one, and arrays compare length first and then
//! element-wise in index order.

use crate::model::{AttributeType, AttributeValue, EntityReference};

/// Compares two references by id, entity type and name only.
pub fn lookups_equal(a: Option<&EntityReference>, b: Option<&EntityReference>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.id == b.id && a.entity_type == b.entity_type && a.name == b.name,
        _ => false,
    }
}

pub fn lookup_arrays_equal(a: Option<&[EntityReference]>, b: Option<&[EntityReference]>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| lookups_equal(Some(x), Some(y)))
        }
        _ => false,
    }
}

/// Ordered comparison, useful for multi-select values.
pub fn arrays_equal<T: PartialEq>(a: Option<&[T]>, b: Option<&[T]>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y),
        _ => false,
    }
}

/// The references a lookup holds, with `Null` read as none. `None` when the
/// value is not a reference at all.
fn lookup_refs(value: &AttributeValue) -> Option<&[EntityReference]> {
    match value {
        AttributeValue::Null => Some(&[]),
        other => other.as_references(),
    }
}

/// Whether writing `new` over `previous` is a change for an attribute of the
/// given type.
pub fn value_changed(
    attribute_type: AttributeType,
    previous: &AttributeValue,
    new: &AttributeValue,
) -> bool {
    match attribute_type {
        AttributeType::Lookup => match (lookup_refs(previous), lookup_refs(new)) {
            (Some(a), Some(b)) => !lookup_arrays_equal(Some(a), Some(b)),
            _ => previous != new,
        },
        AttributeType::MultiSelectOptionSet => {
            !arrays_equal(previous.as_multi_select(), new.as_multi_select())
        }
        _ => previous != new,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: &str) -> EntityReference {
        EntityReference::new(id, "account").with_name("Acme")
    }

    #[test]
    fn absent_lookups_are_equal() {
        assert!(lookups_equal(None, None));
        assert!(!lookups_equal(Some(&account("1")), None));
    }

    #[test]
    fn lookups_compare_all_three_fields() {
        let a = account("1");
        let mut b = account("1");
        assert!(lookups_equal(Some(&a), Some(&b)));
        b.name = Some("Other".into());
        assert!(!lookups_equal(Some(&a), Some(&b)));
    }

    #[test]
    fn lookup_arrays_require_same_length_and_order() {
        let one = vec![account("1")];
        let two = vec![account("1"), account("2")];
        let swapped = vec![account("2"), account("1")];
        assert!(lookup_arrays_equal(Some(&one), Some(&one.clone())));
        assert!(!lookup_arrays_equal(Some(&one), Some(&two)));
        assert!(!lookup_arrays_equal(Some(&two), Some(&swapped)));
        assert!(!lookup_arrays_equal(Some(&one), None));
    }

    #[test]
    fn arrays_compare_in_order() {
        assert!(arrays_equal(Some(&[1, 2][..]), Some(&[1, 2][..])));
        assert!(!arrays_equal(Some(&[1, 2][..]), Some(&[2, 1][..])));
        assert!(arrays_equal::<i32>(None, None));
    }

    #[test]
    fn value_changed_dispatches_on_type() {
        let a = AttributeValue::Lookup(vec![account("1")]);
        let b = AttributeValue::Lookup(vec![account("1")]);
        assert!(!value_changed(AttributeType::Lookup, &a, &b));
        assert!(value_changed(AttributeType::Lookup, &AttributeValue::Null, &b));
        assert!(!value_changed(
            AttributeType::Lookup,
            &AttributeValue::Null,
            &AttributeValue::Lookup(vec![])
        ));
        assert!(value_changed(
            AttributeType::Lookup,
            &AttributeValue::Lookup(vec![]),
            &AttributeValue::from("not-a-ref")
        ));

        let m1 = AttributeValue::MultiSelect(vec![1, 2]);
        let m2 = AttributeValue::MultiSelect(vec![2, 1]);
        assert!(value_changed(AttributeType::MultiSelectOptionSet, &m1, &m2));

        let t = AttributeValue::from("123");
        assert!(!value_changed(AttributeType::String, &t, &t.clone()));
        assert!(value_changed(
            AttributeType::String,
            &t,
            &AttributeValue::from("abc")
        ));
    }
}
