use std::collections::BTreeSet;

use crate::error::ReconError;
use crate::keys::{build_keys, KeyEncoding};
use crate::model::{Dataset, MatchKey, Reconciliation};

/// Column names present in both datasets, in base column order.
pub fn common_columns(base: &Dataset, candidate: &Dataset) -> Vec<String> {
    base.columns()
        .iter()
        .filter(|c| candidate.has_column(c))
        .cloned()
        .collect()
}

/// Pick the columns to match on.
///
/// Without a (non-empty) request every common column is used. A request is
/// narrowed to the columns common to both files, keeping the requested order.
pub fn resolve_match_columns(
    base: &Dataset,
    candidate: &Dataset,
    requested: Option<&[String]>,
) -> Result<Vec<String>, ReconError> {
    let common = common_columns(base, candidate);
    if common.is_empty() {
        return Err(ReconError::NoCommonColumns);
    }

    match requested {
        Some(req) if !req.is_empty() => {
            let cols: Vec<String> = req.iter().filter(|c| common.contains(c)).cloned().collect();
            if cols.is_empty() {
                return Err(ReconError::NoMatchColumns {
                    requested: req.to_vec(),
                });
            }
            Ok(cols)
        }
        _ => Ok(common),
    }
}

/// Partition distinct keys into matched / missing / extra and pull out the
/// rows behind each part. Duplicate keys bring along every row that has them.
pub fn reconcile(
    base: &Dataset,
    candidate: &Dataset,
    match_columns: &[String],
    encoding: KeyEncoding,
) -> Result<Reconciliation, ReconError> {
    let base_keys = build_keys(base, match_columns, encoding)?;
    let comp_keys = build_keys(candidate, match_columns, encoding)?;

    let base_set: BTreeSet<&MatchKey> = base_keys.iter().flatten().collect();
    let comp_set: BTreeSet<&MatchKey> = comp_keys.iter().flatten().collect();

    let matched: BTreeSet<MatchKey> = base_set.intersection(&comp_set).map(|k| (*k).clone()).collect();
    let missing: BTreeSet<MatchKey> = base_set.difference(&comp_set).map(|k| (*k).clone()).collect();
    let extra: BTreeSet<MatchKey> = comp_set.difference(&base_set).map(|k| (*k).clone()).collect();

    log::debug!(
        "reconcile on {:?}: {} base keys, {} candidate keys",
        match_columns,
        base_set.len(),
        comp_set.len()
    );

    let in_set = |keys: &[Option<MatchKey>], set: &BTreeSet<MatchKey>, i: usize| {
        keys[i].as_ref().is_some_and(|k| set.contains(k))
    };

    Ok(Reconciliation {
        matched_base: base.filter_rows(|i| in_set(&base_keys, &matched, i)),
        matched_comp: candidate.filter_rows(|i| in_set(&comp_keys, &matched, i)),
        missing_records: base.filter_rows(|i| in_set(&base_keys, &missing, i)),
        extra_records: candidate.filter_rows(|i| in_set(&comp_keys, &extra, i)),
        matched,
        missing,
        extra,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;
    use crate::normalize::normalize;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn text(keys: &BTreeSet<MatchKey>) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn alice_bob_carl() {
        let base = Dataset::from_rows(
            &["ID", "Name"],
            vec![vec!["1".into(), "alice ".into()], vec!["2".into(), "Bob".into()]],
        );
        let comp = Dataset::from_rows(
            &["ID", "Name"],
            vec![vec!["1".into(), "ALICE".into()], vec!["3".into(), "Carl".into()]],
        );
        let out = reconcile(&normalize(&base), &normalize(&comp), &cols(&["ID"]), KeyEncoding::Pipe)
            .unwrap();
        assert_eq!(text(&out.matched), vec!["1"]);
        assert_eq!(text(&out.missing), vec!["2"]);
        assert_eq!(text(&out.extra), vec!["3"]);
        assert_eq!(out.matched_base.cell(0, "Name"), Some(&CellValue::from("ALICE")));
        assert_eq!(out.extra_records.cell(0, "Name"), Some(&CellValue::from("CARL")));
    }

    #[test]
    fn duplicate_base_keys_keep_every_row() {
        let base = Dataset::from_rows(
            &["ID"],
            vec![vec![1i64.into()], vec![1i64.into()], vec![2i64.into()]],
        );
        let comp = Dataset::from_rows(&["ID"], vec![vec![1i64.into()]]);
        let out = reconcile(&base, &comp, &cols(&["ID"]), KeyEncoding::Pipe).unwrap();
        assert_eq!(out.matched.len(), 1);
        assert_eq!(out.matched_base.len(), 2);
        assert_eq!(out.matched_comp.len(), 1);
        assert_eq!(out.missing_records.len(), 1);
    }

    #[test]
    fn empty_keys_are_unmatchable() {
        let base = Dataset::from_rows(&["ID"], vec![vec![CellValue::Empty], vec![5i64.into()]]);
        let comp = Dataset::from_rows(&["ID"], vec![vec![CellValue::Empty]]);
        let out = reconcile(&base, &comp, &cols(&["ID"]), KeyEncoding::Pipe).unwrap();
        assert!(out.matched.is_empty());
        assert_eq!(out.missing.len(), 1);
        assert!(out.extra.is_empty());
        // The empty-key row shows up nowhere.
        assert_eq!(out.missing_records.len(), 1);
        assert!(out.extra_records.is_empty());
    }

    #[test]
    fn integer_and_float_ids_match() {
        let base = Dataset::from_rows(&["ID"], vec![vec![1i64.into()], vec![2i64.into()], vec![3i64.into()]]);
        let comp = Dataset::from_rows(&["ID"], vec![vec![1.0f64.into()], vec![3.0f64.into()]]);
        let out = reconcile(&normalize(&base), &normalize(&comp), &cols(&["ID"]), KeyEncoding::Pipe)
            .unwrap();
        assert_eq!(text(&out.matched), vec!["1", "3"]);
        assert_eq!(text(&out.missing), vec!["2"]);
    }

    #[test]
    fn common_columns_follow_base_order() {
        let base = Dataset::new(cols(&["C", "A", "B"]));
        let comp = Dataset::new(cols(&["A", "B", "C", "D"]));
        assert_eq!(common_columns(&base, &comp), cols(&["C", "A", "B"]));
    }

    #[test]
    fn no_common_columns() {
        let base = Dataset::new(cols(&["A"]));
        let comp = Dataset::new(cols(&["B"]));
        let err = resolve_match_columns(&base, &comp, None).unwrap_err();
        assert!(matches!(err, ReconError::NoCommonColumns));
    }

    #[test]
    fn requested_columns_filtered_to_common() {
        let base = Dataset::new(cols(&["ID", "Name", "Dept"]));
        let comp = Dataset::new(cols(&["Name", "ID"]));
        let req = cols(&["Dept", "Name", "ID"]);
        assert_eq!(resolve_match_columns(&base, &comp, Some(&req)).unwrap(), cols(&["Name", "ID"]));
    }

    #[test]
    fn requested_columns_none_common() {
        let base = Dataset::new(cols(&["ID", "Dept"]));
        let comp = Dataset::new(cols(&["ID"]));
        let req = cols(&["Dept"]);
        let err = resolve_match_columns(&base, &comp, Some(&req)).unwrap_err();
        assert!(matches!(err, ReconError::NoMatchColumns { .. }));
    }

    #[test]
    fn empty_request_means_auto_detect() {
        let base = Dataset::new(cols(&["ID", "Name"]));
        let comp = Dataset::new(cols(&["Name", "ID"]));
        assert_eq!(resolve_match_columns(&base, &comp, Some(&[])).unwrap(), cols(&["ID", "Name"]));
    }
}
