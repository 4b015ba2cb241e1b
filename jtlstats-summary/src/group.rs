use std::collections::HashMap;

use jtlstats_common::{Dimension, KeyValue, Record};

/// A named partition of the ingested records, borrowing from them.
#[derive(Debug, Clone, PartialEq)]
pub struct Group<'a> {
    /// `None` for the aggregate group.
    pub dimension: Option<Dimension>,
    pub key: Option<KeyValue>,
    pub records: Vec<&'a Record>,
}

/// The single group holding every record, in input order.
pub fn aggregate(records: &[Record]) -> Group<'_> {
    Group {
        dimension: None,
        key: None,
        records: records.iter().collect(),
    }
}

/// Partition `records` by `key_fn` in one pass.
///
/// Groups come out in first-occurrence order of their key, and each group
/// keeps the relative input order of its members. The hash index only maps
/// a key to its slot; it is never iterated.
pub fn group_by<'a, F>(records: &'a [Record], dimension: Dimension, key_fn: F) -> Vec<Group<'a>>
where
    F: Fn(&Record) -> KeyValue,
{
    let mut slots: HashMap<KeyValue, usize> = HashMap::new();
    let mut groups: Vec<Group<'a>> = Vec::new();

    for record in records {
        let key = key_fn(record);
        let idx = *slots.entry(key.clone()).or_insert_with(|| {
            groups.push(Group {
                dimension: Some(dimension),
                key: Some(key),
                records: Vec::new(),
            });
            groups.len() - 1
        });
        groups[idx].records.push(record);
    }
    groups
}

/// [`group_by`] using the dimension's own key extractor.
pub fn group_by_dimension(records: &[Record], dimension: Dimension) -> Vec<Group<'_>> {
    group_by(records, dimension, |r| dimension.key_of(r))
}
