// ── Product reference codes ──
//
// `{categoryCode}{YY}-{NNNN}`: the category code, the two-digit creation
// year, and a zero-padded random number below 10000. References are
// assigned once and never regenerated.

use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

const SUFFIX_RANGE: u128 = 10_000;

/// Generate a reference for a product created at `now` in the category
/// with the given code.
pub fn generate(category_code: &str, now: DateTime<Utc>) -> String {
    let suffix = u16::try_from(Uuid::new_v4().as_u128() % SUFFIX_RANGE).unwrap_or(0);
    format(category_code, now, suffix)
}

fn format(category_code: &str, now: DateTime<Utc>, suffix: u16) -> String {
    let yy = now.year().rem_euclid(100);
    format!("{category_code}{yy:02}-{suffix:04}")
}

/// Check that `reference` has the `{CODE}{YY}-{NNNN}` shape.
pub fn is_well_formed(reference: &str) -> bool {
    let Some((head, digits)) = reference.rsplit_once('-') else {
        return false;
    };
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if !head.is_ascii() {
        return false;
    }
    let Some(split) = head.len().checked_sub(2) else {
        return false;
    };
    let (code, year) = head.split_at(split);
    (2..=4).contains(&code.len())
        && code.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        && year.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn format_pads_year_and_suffix() {
        let at = Utc.with_ymd_and_hms(2007, 5, 1, 0, 0, 0).unwrap();
        assert_eq!(format("DRS", at, 42), "DRS07-0042");
    }

    #[test]
    fn generated_references_are_well_formed() {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        for _ in 0..50 {
            let reference = generate("ACC", at);
            assert!(reference.starts_with("ACC26-"), "{reference}");
            assert!(is_well_formed(&reference), "{reference}");
        }
    }

    #[test]
    fn malformed_references_are_rejected() {
        assert!(!is_well_formed("DRS26-42"));
        assert!(!is_well_formed("DRS26_0042"));
        assert!(!is_well_formed("D26-0042"));
        assert!(!is_well_formed("drs26-0042"));
        assert!(!is_well_formed("-0042"));
    }
}
