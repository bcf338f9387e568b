use crate::model::{Amount, FinancialRecord};
use serde::Serialize;
use std::collections::BTreeSet;

/// The set of record ids a user has ticked in a table, e.g. before a bulk delete or a print.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    ids: BTreeSet<String>,
}

impl Selection {
    pub fn new<S, I>(ids: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Adds `id` if it is absent, removes it if it is present.
    pub fn toggle(&mut self, id: impl Into<String>) {
        let id = id.into();
        if !self.ids.remove(&id) {
            self.ids.insert(id);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

/// The "select all" checkbox: if every id in `all` is already selected the result is empty,
/// otherwise it is exactly `all`.
pub fn select_all<'a>(current: &Selection, all: impl IntoIterator<Item = &'a str>) -> Selection {
    let all: BTreeSet<String> = all.into_iter().map(str::to_string).collect();
    if !all.is_empty() && all.iter().all(|id| current.contains(id)) {
        Selection::default()
    } else {
        Selection { ids: all }
    }
}

/// The records whose ids are in `selection`, in input order.
pub fn selected_records<'a>(
    records: &'a [FinancialRecord],
    selection: &Selection,
) -> Vec<&'a FinancialRecord> {
    records
        .iter()
        .filter(|r| selection.contains(r.id()))
        .collect()
}

/// Sums `selector` over the selected records.
pub fn selected_total<F>(records: &[FinancialRecord], selection: &Selection, selector: F) -> Amount
where
    F: Fn(&FinancialRecord) -> Amount,
{
    selected_records(records, selection)
        .into_iter()
        .map(selector)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_toggle() {
        let mut selection = Selection::default();
        selection.toggle("a");
        selection.toggle("b");
        selection.toggle("a");
        assert_eq!(selection.ids().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_select_all_selects_everything_when_partial() {
        let current = Selection::new(["a"]);
        let next = select_all(&current, ["a", "b", "c"]);
        assert_eq!(next, Selection::new(["a", "b", "c"]));
        // The input is not modified.
        assert_eq!(current.len(), 1);
    }

    #[test]
    fn test_select_all_clears_when_complete() {
        let current = Selection::new(["a", "b", "c", "stale"]);
        let next = select_all(&current, ["a", "b", "c"]);
        assert!(next.is_empty());
    }

    #[test]
    fn test_select_all_on_empty_table() {
        let next = select_all(&Selection::new(["a"]), std::iter::empty());
        assert!(next.is_empty());
    }

    #[test]
    fn test_selected_total() {
        let records = vec![
            FinancialRecord::receipt("r1", "2024-03-01", "A", Amount::from_str("100").unwrap())
                .unwrap(),
            FinancialRecord::receipt("r2", "2024-03-01", "B", Amount::from_str("50").unwrap())
                .unwrap(),
            FinancialRecord::receipt("r3", "2024-03-02", "C", Amount::from_str("200").unwrap())
                .unwrap(),
        ];
        let selection = Selection::new(["r1", "r3", "missing"]);
        let total = selected_total(&records, &selection, FinancialRecord::amount);
        assert_eq!(total, Amount::from_str("300").unwrap());
    }
}
