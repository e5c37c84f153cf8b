use fnv::FnvHashMap;

/// Compact id a column value is encoded to. `0..=VALUE_ID_MAX` is the usable
/// range; the top two ids are reserved sentinels (see below) and can never
/// be assigned by [`Dictionary::intern`].
pub type ValueId = u16;

/// A row had no value for this column.
pub const VALUE_ID_UNKNOWN: ValueId = u16::MAX;
/// A filter referenced a value that does not exist in a column's dictionary.
/// Never equal to any id a row can actually carry.
pub const VALUE_ID_FILTER_UNSPECIFIED: ValueId = u16::MAX - 1;
/// Largest id `intern` may ever hand out.
pub const VALUE_ID_MAX: ValueId = u16::MAX - 2;

/// Bidirectional map between a column's distinct string values and the
/// compact ids used everywhere else in a [`super::partition::Partition`].
///
/// `reverse` is O(1): alongside the `value -> id` map we keep an `id ->
/// value` vector indexed by id, so grouped counts don't pay for a linear
/// scan on every row (the original implementation's reverse lookup does).
#[derive(Debug, Default)]
pub struct Dictionary {
    value_to_id: FnvHashMap<String, ValueId>,
    id_to_value: Vec<String>,
}

impl Dictionary {
    pub fn new() -> Dictionary {
        Dictionary::default()
    }

    pub fn len(&self) -> usize {
        self.id_to_value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_value.is_empty()
    }

    pub fn lookup(&self, value: &str) -> Option<ValueId> {
        self.value_to_id.get(value).copied()
    }

    pub fn reverse(&self, id: ValueId) -> Option<&str> {
        self.id_to_value.get(id as usize).map(String::as_str)
    }

    /// True if `value` already has an id, or there is room for one more.
    pub fn can_intern(&self, value: &str) -> bool {
        self.value_to_id.contains_key(value) || self.len() <= VALUE_ID_MAX as usize
    }

    /// Assigns `value` an id if it doesn't have one yet. Returns `None` only
    /// when the dictionary is full and `value` is new; callers must check
    /// [`Dictionary::can_intern`] before committing to a mutation that
    /// depends on this succeeding, since a partition insert must not
    /// partially apply.
    pub fn intern(&mut self, value: &str) -> Option<ValueId> {
        if let Some(&id) = self.value_to_id.get(value) {
            return Some(id);
        }
        if !self.can_intern(value) {
            return None;
        }
        let id = self.id_to_value.len() as ValueId;
        self.id_to_value.push(value.to_string());
        self.value_to_id.insert(value.to_string(), id);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_assigns_ids_in_first_insert_order() {
        let mut dict = Dictionary::new();
        assert_eq!(dict.intern("a"), Some(0));
        assert_eq!(dict.intern("b"), Some(1));
        assert_eq!(dict.intern("a"), Some(0));
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn reverse_is_inverse_of_lookup() {
        let mut dict = Dictionary::new();
        let id = dict.intern("hello").unwrap();
        assert_eq!(dict.lookup("hello"), Some(id));
        assert_eq!(dict.reverse(id), Some("hello"));
        assert_eq!(dict.reverse(VALUE_ID_UNKNOWN), None);
    }

    #[test]
    fn cap_rejects_the_value_past_the_usable_range() {
        let mut dict = Dictionary::new();
        for i in 0..=VALUE_ID_MAX {
            assert!(dict.can_intern(&i.to_string()), "failed at {i}");
            assert_eq!(dict.intern(&i.to_string()), Some(i));
        }
        assert_eq!(dict.len(), VALUE_ID_MAX as usize + 1);
        assert!(!dict.can_intern("one too many"));
        assert_eq!(dict.intern("one too many"), None);
        // existing values remain internable even once full
        assert_eq!(dict.intern("0"), Some(0));
    }
}
