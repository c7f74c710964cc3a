use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

/// Reduce a raw expiry list to one "monthly" expiry per calendar month:
/// the last date observed in that month. Output is ascending, so
/// positions 0/1/2 are the current/next/far monthly tenors.
///
/// Unparseable entries are skipped with a warning; an empty input (or an
/// input with no parseable dates) yields an empty output.
pub fn monthly_expiries(raw: &[String]) -> Vec<NaiveDate> {
    let mut by_month: BTreeMap<(i32, u32), NaiveDate> = BTreeMap::new();

    for s in raw {
        let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") else {
            eprintln!("  WARN  skipping unparseable expiry `{s}`");
            continue;
        };
        by_month
            .entry((date.year(), date.month()))
            .and_modify(|d| {
                if date > *d {
                    *d = date;
                }
            })
            .or_insert(date);
    }

    by_month.into_values().collect()
}
