use std::collections::HashMap;

use crate::changes::schema::{Changeset, FieldChange, TrackedField};
use crate::snapshot::Snapshot;

/// Compares two snapshot sets field by field.
///
/// Products that only appear in `current` have no baseline and are skipped.
/// An empty side produces an all-empty changeset.
pub fn diff_snapshots(previous: &[Snapshot], current: &[Snapshot]) -> Changeset {
    let mut changeset = Changeset::empty();
    if previous.is_empty() || current.is_empty() {
        return changeset;
    }

    let previous_by_code = index_by_code(previous);
    let (current_order, current_by_code) = ordered_index(current);

    for code in current_order {
        let Some(before) = previous_by_code.get(code) else {
            continue;
        };
        let after = current_by_code[code];
        for field in TrackedField::ALL {
            let previous_value = field.value_of(before);
            let current_value = field.value_of(after);
            if previous_value != current_value {
                changeset.push(
                    field,
                    FieldChange {
                        product: after.label().to_string(),
                        previous_value,
                        current_value,
                    },
                );
            }
        }
    }

    changeset
}

fn index_by_code(rows: &[Snapshot]) -> HashMap<&str, &Snapshot> {
    rows.iter().map(|row| (row.api_code.as_str(), row)).collect()
}

// Last duplicate wins on value, first occurrence fixes position.
fn ordered_index(rows: &[Snapshot]) -> (Vec<&str>, HashMap<&str, &Snapshot>) {
    let mut order = Vec::new();
    let mut index = HashMap::new();
    for row in rows {
        if index.insert(row.api_code.as_str(), row).is_none() {
            order.push(row.api_code.as_str());
        }
    }
    (order, index)
}
