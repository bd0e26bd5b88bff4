// ==============================================================================
// diplotype.rs - Star Allele to Diplotype Conversion
// ==============================================================================
// Description: Builds a canonical diplotype string from collected star alleles
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Algorithm:
//   Given the star alleles observed for one gene, in first-seen order:
//   - fewer than 2 alleles           -> None (incomplete diplotype)
//   - otherwise take the FIRST TWO   -> sort by numeric allele number
//   - render                         -> "<lower>/<higher>" (e.g., "*1/*4")
//   Alleles seen after the first two are kept for the audit trail only and
//   never change the diplotype.
// ==============================================================================

use std::cmp::Ordering;

/// Allele number used for alleles without leading digits ("*XN", "*DEL")
pub const NON_NUMERIC_ALLELE_KEY: &str = "9999";

/// Allele number of any length, compared by numeric value
///
/// Leading zeros are ignored; longer digit runs are larger, equal lengths
/// compare digit by digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlleleNumber<'a>(&'a str);

impl<'a> AlleleNumber<'a> {
    pub fn new(digits: &'a str) -> Self {
        Self(digits.trim_start_matches('0'))
    }
}

impl Ord for AlleleNumber<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(other.0))
    }
}

impl PartialOrd for AlleleNumber<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordering key for a star allele token
///
/// "*4" -> (4, ""), "*2A" -> (2, "A"), "*10X2" -> (10, "X2"),
/// "*DEL" -> (9999, "*DEL").
pub fn star_sort_key(star: &str) -> (AlleleNumber<'_>, &str) {
    let non_numeric = (AlleleNumber::new(NON_NUMERIC_ALLELE_KEY), star);
    let Some(rest) = star.strip_prefix('*') else {
        return non_numeric;
    };

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return non_numeric;
    }

    (AlleleNumber::new(&rest[..digits_end]), &rest[digits_end..])
}

/// Build a diplotype from the first two observed star alleles
///
/// # Returns
/// * `Some(diplotype)` - "<lower>/<higher>" by allele number
/// * `None` - fewer than two alleles observed
///
/// # Examples
/// ```
/// use pgx_engine::diplotype::build_diplotype;
///
/// let stars = vec!["*4".to_string(), "*1".to_string()];
/// assert_eq!(build_diplotype(&stars).as_deref(), Some("*1/*4"));
///
/// // Only one allele observed
/// assert_eq!(build_diplotype(&["*1".to_string()]), None);
/// ```
pub fn build_diplotype(stars: &[String]) -> Option<String> {
    let [first, second, ..] = stars else {
        return None;
    };

    let mut pair = [first.as_str(), second.as_str()];
    pair.sort_by_key(|star| star_sort_key(*star));

    Some(format!("{}/{}", pair[0], pair[1]))
}
