//! The three-way case-insensitive country-code join.

use crate::PlotCountries;
use ahash::RandomState;
use gm_table::{CodeTable, GdpTable};
use hashbrown::{HashMap, HashSet};
use tracing::debug;

/// Result of reconciling plot codes against the GDP dataset.
///
/// `matched` maps each resolvable plot code to the GDP key exactly as it is
/// stored in the table (original casing, not the folded form). Every plot
/// code from the input set appears in exactly one of the two fields.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// Plot code → GDP table key, as stored.
    pub matched: HashMap<String, String, RandomState>,

    /// Plot codes with no resolvable GDP record.
    pub unmatched: HashSet<String, RandomState>,
}

/// Resolves each plot code to a GDP table key via the translation table.
///
/// Comparison is case-insensitive on both hops. When several translation
/// entries or several GDP keys collide under case folding, the first in
/// source order wins; the indexes below are built with exactly that
/// semantics (one scan, keeping only the first occurrence per folded key).
///
/// Runs in O(P + C + G) for P plot codes, C translation pairs, G GDP
/// records.
pub fn reconcile(
    codes: &CodeTable,
    plot_countries: &PlotCountries,
    gdp: &GdpTable,
) -> Reconciliation {
    // Folded plot code -> data code, first pair wins.
    let mut to_data: HashMap<String, &str, RandomState> =
        HashMap::with_capacity_and_hasher(codes.len(), RandomState::new());
    for (plot_code, data_code) in codes.pairs() {
        to_data.entry(fold(plot_code)).or_insert(data_code);
    }

    // Folded GDP key -> stored GDP key, first entry wins.
    let mut to_gdp_key: HashMap<String, &str, RandomState> =
        HashMap::with_capacity_and_hasher(gdp.len(), RandomState::new());
    for (key, _) in gdp.iter() {
        to_gdp_key.entry(fold(key)).or_insert(key);
    }

    let mut matched: HashMap<String, String, RandomState> =
        HashMap::with_hasher(RandomState::new());
    let mut unmatched: HashSet<String, RandomState> = HashSet::with_hasher(RandomState::new());

    for plot_code in plot_countries.keys() {
        let hit = to_data
            .get(&fold(plot_code))
            .and_then(|data_code| to_gdp_key.get(&fold(data_code)));
        match hit {
            Some(key) => {
                matched.insert(plot_code.clone(), (*key).to_string());
            }
            None => {
                unmatched.insert(plot_code.clone());
            }
        }
    }

    debug!(
        plot_codes = plot_countries.len(),
        matched = matched.len(),
        unmatched = unmatched.len(),
        "Reconciled country codes"
    );

    Reconciliation { matched, unmatched }
}

/// Case-folds a code for comparison. Trimming is the loaders' job; only the
/// casing is normalized here.
fn fold(code: &str) -> String {
    code.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gm_table::TableRow;
    use std::sync::Arc;

    fn plot_set(codes: &[&str]) -> PlotCountries {
        codes
            .iter()
            .map(|c| (c.to_string(), format!("Country {c}")))
            .collect()
    }

    fn gdp_with_keys(keys: &[&str]) -> GdpTable {
        let header = Arc::new(vec!["Country Code".to_string()]);
        let mut table = GdpTable::new();
        for key in keys {
            table.insert(*key, TableRow::new(vec![key.to_string()], Arc::clone(&header)));
        }
        table
    }

    struct Case {
        name: &'static str,
        mapping: &'static [(&'static str, &'static str)],
        plot: &'static [&'static str],
        gdp_keys: &'static [&'static str],
        want_matched: &'static [(&'static str, &'static str)],
        want_unmatched: &'static [&'static str],
    }

    #[test]
    fn test_reconcile_cases() {
        let cases = [
            Case {
                name: "partial gdp coverage",
                mapping: &[("no", "NOR"), ("pr", "PRI"), ("us", "USA")],
                plot: &["no", "pr", "us"],
                gdp_keys: &["USA", "NOR"],
                want_matched: &[("no", "NOR"), ("us", "USA")],
                want_unmatched: &["pr"],
            },
            Case {
                name: "full gdp coverage",
                mapping: &[("no", "NOR"), ("pr", "PRI"), ("us", "USA")],
                plot: &["pr", "no", "us"],
                gdp_keys: &["USA", "PRI", "NOR"],
                want_matched: &[("pr", "PRI"), ("no", "NOR"), ("us", "USA")],
                want_unmatched: &[],
            },
            Case {
                name: "upper plot codes, lower mapping",
                mapping: &[("c1", "abc"), ("c2", "def"), ("c3", "ghi"), ("c4", "jkl")],
                plot: &["C1", "C2", "C3", "C4", "C5"],
                gdp_keys: &["ABC", "GHI"],
                want_matched: &[("C1", "ABC"), ("C3", "GHI")],
                want_unmatched: &["C2", "C4", "C5"],
            },
            Case {
                name: "empty gdp table",
                mapping: &[("jp", "JPN"), ("cn", "CHN"), ("ru", "RUS")],
                plot: &["jp", "cn", "ru"],
                gdp_keys: &[],
                want_matched: &[],
                want_unmatched: &["jp", "cn", "ru"],
            },
            Case {
                name: "mixed-case gdp keys are returned as stored",
                mapping: &[("c1", "Wx"), ("c2", "qr"), ("c3", "kL"), ("c4", "EF")],
                plot: &["C1", "C2", "C3", "C4", "C5"],
                gdp_keys: &["qR", "Kl", "WX", "ef"],
                want_matched: &[("C1", "WX"), ("C2", "qR"), ("C3", "Kl"), ("C4", "ef")],
                want_unmatched: &["C5"],
            },
            Case {
                name: "duplicate normalized plot code, first pair wins",
                mapping: &[("no", "NOR"), ("NO", "SWE")],
                plot: &["no"],
                gdp_keys: &["NOR", "SWE"],
                want_matched: &[("no", "NOR")],
                want_unmatched: &[],
            },
        ];

        for case in &cases {
            let codes = CodeTable::from_pairs(case.mapping.iter().copied());
            let plot = plot_set(case.plot);
            let gdp = gdp_with_keys(case.gdp_keys);

            let result = reconcile(&codes, &plot, &gdp);

            assert_eq!(
                result.matched.len(),
                case.want_matched.len(),
                "{}: matched size",
                case.name
            );
            for (plot_code, gdp_key) in case.want_matched {
                assert_eq!(
                    result.matched.get(*plot_code).map(String::as_str),
                    Some(*gdp_key),
                    "{}: matched[{}]",
                    case.name,
                    plot_code
                );
            }
            for plot_code in case.want_unmatched {
                assert!(
                    result.unmatched.contains(*plot_code),
                    "{}: unmatched missing {}",
                    case.name,
                    plot_code
                );
            }

            // Partition property: matched and unmatched cover the input set
            // exactly, with no overlap.
            assert_eq!(
                result.matched.len() + result.unmatched.len(),
                plot.len(),
                "{}: partition size",
                case.name
            );
            for plot_code in plot.keys() {
                let in_matched = result.matched.contains_key(plot_code);
                let in_unmatched = result.unmatched.contains(plot_code);
                assert!(
                    in_matched ^ in_unmatched,
                    "{}: {} must be in exactly one output",
                    case.name,
                    plot_code
                );
            }
        }
    }

    #[test]
    fn test_first_gdp_key_in_table_order_wins() {
        let codes = CodeTable::from_pairs([("x", "AAA")]);
        let plot = plot_set(&["x"]);
        let gdp = gdp_with_keys(&["aAa", "AAA"]);

        let result = reconcile(&codes, &plot, &gdp);
        assert_eq!(result.matched.get("x").map(String::as_str), Some("aAa"));
    }

    #[test]
    fn test_uniform_recasing_does_not_change_outcome() {
        let mapping = [("no", "NOR"), ("pr", "PRI"), ("us", "USA")];
        let plot = plot_set(&["no", "pr", "us"]);
        let gdp = gdp_with_keys(&["USA", "NOR"]);

        let lower = reconcile(&CodeTable::from_pairs(mapping), &plot, &gdp);
        let upper_mapping: Vec<(String, String)> = mapping
            .iter()
            .map(|(p, d)| (p.to_uppercase(), d.to_lowercase()))
            .collect();
        let upper = reconcile(&CodeTable::from_pairs(upper_mapping), &plot, &gdp);

        assert_eq!(lower.matched.len(), upper.matched.len());
        assert_eq!(lower.unmatched.len(), upper.unmatched.len());
        // The stored GDP casing still comes through unchanged.
        assert_eq!(upper.matched.get("no").map(String::as_str), Some("NOR"));
    }

    #[test]
    fn test_plot_code_missing_from_mapping() {
        let codes = CodeTable::from_pairs([("no", "NOR")]);
        let plot = plot_set(&["no", "zz"]);
        let gdp = gdp_with_keys(&["NOR"]);

        let result = reconcile(&codes, &plot, &gdp);
        assert!(result.unmatched.contains("zz"));
        assert_eq!(result.matched.len(), 1);
    }
}
