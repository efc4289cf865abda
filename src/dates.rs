//! Date normalization for heterogeneous cataloguing prose.
//!
//! Manuscript catalogues write dates every way imaginable: "1300-1400",
//! "ca. 1420", "15th century", "s. XV 1/4", "XVex", "before 1250". This
//! module reduces all of them to an integer year range used for sorting
//! and filtering.
//!
//! Century convention: century N spans `[(N-1)*100, N*100 - 1]`, so the
//! 15th century is 1400-1499.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Per-source date parsing knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatePolicy {
    /// Years added on each side of a bare circa-year ("ca. 1420").
    pub circa_tolerance: i32,
}

impl Default for DatePolicy {
    fn default() -> Self {
        Self {
            circa_tolerance: 25,
        }
    }
}

/// A parsed `(start_year, end_year)` pair. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<i32>,
    pub end: Option<i32>,
}

impl DateRange {
    pub const EMPTY: DateRange = DateRange {
        start: None,
        end: None,
    };

    /// Closed range. Catalogues occasionally write ranges backwards
    /// ("1400-1300"); bounds are reordered so start <= end always holds.
    pub fn years(start: i32, end: i32) -> Self {
        let (start, end) = if start <= end {
            (start, end)
        } else {
            (end, start)
        };
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

const ROMAN_CENTURIES: [(&str, i32); 20] = [
    ("I", 1),
    ("II", 2),
    ("III", 3),
    ("IV", 4),
    ("V", 5),
    ("VI", 6),
    ("VII", 7),
    ("VIII", 8),
    ("IX", 9),
    ("X", 10),
    ("XI", 11),
    ("XII", 12),
    ("XIII", 13),
    ("XIV", 14),
    ("XV", 15),
    ("XVI", 16),
    ("XVII", 17),
    ("XVIII", 18),
    ("XIX", 19),
    ("XX", 20),
];

/// Parse a Roman numeral century, e.g. "XV" -> 15.
fn roman_century(s: &str) -> Option<i32> {
    let s = s.trim().to_uppercase();
    ROMAN_CENTURIES
        .iter()
        .find(|(numeral, _)| *numeral == s)
        .map(|(_, n)| *n)
}

/// Inclusive year span of century N.
fn century_span(n: i32) -> (i32, i32) {
    ((n - 1) * 100, n * 100 - 1)
}

const ROMAN: &str = r"X{0,3}(?:IX|IV|V?I{0,3})";

struct Patterns {
    parenthetical: Regex,
    saeculum: Regex,
    circa: Regex,
    year_range: Regex,
    short_range: Regex,
    single_year: Regex,
    before: Regex,
    after: Regex,
    between: Regex,
    roman_range: Regex,
    roman_fraction: Regex,
    roman_qualifier: Regex,
    roman_half: Regex,
    roman_bare: Regex,
    ordinal_century: Regex,
}

static PATTERNS: LazyLock<Patterns> = LazyLock::new(|| Patterns {
    parenthetical: Regex::new(r"\([^)]*\)").unwrap(),
    saeculum: Regex::new(r"(?i)^s\.?\s*").unwrap(),
    circa: Regex::new(r"(?i)\bcirca\s+|\b(?:ca|c)\.\s*|\bca\s+").unwrap(),
    year_range: Regex::new(r"^(\d{4})\s*[-\u{2013}/]\s*(\d{4})").unwrap(),
    short_range: Regex::new(r"^(\d{4})\s*[-\u{2013}]\s*(\d{1,2})(?:\s|$)").unwrap(),
    single_year: Regex::new(r"^(\d{4})\b").unwrap(),
    before: Regex::new(r"(?i)^before\s+(\d{4})").unwrap(),
    after: Regex::new(r"(?i)^after\s+(\d{4})").unwrap(),
    between: Regex::new(r"(?i)^between\s+(\d{4})\s*(?:[-\u{2013}]|and)\s*(\d{4})").unwrap(),
    roman_range: Regex::new(&format!(
        r"(?i)^({ROMAN})\s*[-\u{{2013}}]\s*({ROMAN})(?:\s|$)"
    ))
    .unwrap(),
    roman_fraction: Regex::new(&format!(r"(?i)^({ROMAN})\s*(\d)/(\d)")).unwrap(),
    roman_qualifier: Regex::new(&format!(r"(?i)^({ROMAN})\s*(in|med|ex)\b")).unwrap(),
    roman_half: Regex::new(&format!(r"(?i)^({ROMAN})\s+([12])(?:\s|$)")).unwrap(),
    roman_bare: Regex::new(&format!(r"(?i)^({ROMAN})(?:\s|$)")).unwrap(),
    ordinal_century: Regex::new(
        r"(?i)(\d{1,2})\s*(?:st|nd|rd|th)?\s*(?:[-\u{2013}]\s*(\d{1,2})\s*(?:st|nd|rd|th)?\s*)?century",
    )
    .unwrap(),
});

/// Parse free-text cataloguing prose into a year range.
///
/// Rules apply in order, first match wins; unparseable input yields
/// `DateRange::EMPTY`, never an error.
pub fn parse_date(text: &str, policy: &DatePolicy) -> DateRange {
    let p = &*PATTERNS;

    let mut s = p.parenthetical.replace_all(text, " ").trim().to_string();
    // Bracket notes lose the brackets but keep their content, since the
    // brackets often enclose the whole date ("[ca. 1300]").
    s.retain(|c| c != '[' && c != ']');
    s = p.saeculum.replace(&s, "").to_string();
    let is_circa = p.circa.is_match(&s);
    s = p.circa.replace_all(&s, "").trim().to_string();
    // Normalize Unicode fractions and superscripts used by some catalogues.
    s = s
        .replace('\u{00bc}', "1/4")
        .replace('\u{00bd}', "1/2")
        .replace('\u{00be}', "3/4")
        .replace('\u{00b9}', "1")
        .replace('\u{00b2}', "2")
        .replace('\u{00b3}', "3");
    let s = s.trim();

    if s.is_empty() {
        return DateRange::EMPTY;
    }

    // Explicit year range: "1300-1400", "1300/1310".
    if let Some(c) = p.year_range.captures(s) {
        return DateRange::years(num(&c[1]), num(&c[2]));
    }

    // Abbreviated range: "1370-80" means 1370-1380.
    if let Some(c) = p.short_range.captures(s) {
        let start = num(&c[1]);
        let end = start / 100 * 100 + num::<i32>(&c[2]);
        return DateRange::years(start, end);
    }

    // "between 1150 and 1175" / "between 1150-1175".
    if let Some(c) = p.between.captures(s) {
        return DateRange::years(num(&c[1]), num(&c[2]));
    }

    // Single year, possibly followed by month/day noise.
    if let Some(c) = p.single_year.captures(s) {
        let year = num(&c[1]);
        if is_circa {
            return DateRange::years(year - policy.circa_tolerance, year + policy.circa_tolerance);
        }
        return DateRange::years(year, year);
    }

    if let Some(c) = p.before.captures(s) {
        return DateRange {
            start: None,
            end: Some(num(&c[1])),
        };
    }

    if let Some(c) = p.after.captures(s) {
        return DateRange {
            start: Some(num(&c[1])),
            end: None,
        };
    }

    // Roman century range: "XIII-XVII".
    if let Some(c) = p.roman_range.captures(s) {
        if let (Some(c1), Some(c2)) = (roman_century(&c[1]), roman_century(&c[2])) {
            return DateRange::years(century_span(c1).0, century_span(c2).1);
        }
    }

    // Roman century with fraction: "XV 1/4", "XV2/2", "XIII 3/4".
    if let Some(c) = p.roman_fraction.captures(s) {
        if let Some(century) = roman_century(&c[1]) {
            let base = century_span(century).0;
            let numerator: i32 = num(&c[2]);
            let denominator: i32 = num(&c[3]);
            let band = match denominator {
                2 => Some(50),
                3 => Some(33),
                4 => Some(25),
                _ => None,
            };
            if let Some(band) = band {
                // "XV 5/4" is garbage, not a fifth quarter; let it fall
                // through to the bare-century rule.
                if (1..=denominator).contains(&numerator) {
                    let start = base + (numerator - 1) * band;
                    let end = (base + numerator * band - 1).min(base + 99);
                    return DateRange::years(start, end);
                }
            }
        }
    }

    // Roman century with saeculum qualifier: "XV in", "XV med", "XVex".
    if let Some(c) = p.roman_qualifier.captures(s) {
        if let Some(century) = roman_century(&c[1]) {
            let base = century_span(century).0;
            return match c[2].to_lowercase().as_str() {
                "in" => DateRange::years(base, base + 25),
                "med" => DateRange::years(base + 25, base + 74),
                _ => DateRange::years(base + 75, base + 99),
            };
        }
    }

    // Roman century with bare half digit: "XIV 2" is the second half.
    if let Some(c) = p.roman_half.captures(s) {
        if let Some(century) = roman_century(&c[1]) {
            let base = century_span(century).0;
            return if num::<i32>(&c[2]) == 1 {
                DateRange::years(base, base + 49)
            } else {
                DateRange::years(base + 50, base + 99)
            };
        }
    }

    // Bare Roman century: "XIII".
    if let Some(c) = p.roman_bare.captures(s) {
        if let Some(century) = roman_century(&c[1]) {
            let (start, end) = century_span(century);
            return DateRange::years(start, end);
        }
    }

    // Ordinal centuries: "15th century", "14th-15th century".
    if let Some(c) = p.ordinal_century.captures(s) {
        let first: i32 = num(&c[1]);
        let last = c.get(2).map(|m| num(m.as_str())).unwrap_or(first);
        if (1..=20).contains(&first) && (1..=20).contains(&last) {
            return DateRange::years(century_span(first).0, century_span(last).1);
        }
    }

    DateRange::EMPTY
}

fn num<T: std::str::FromStr>(s: &str) -> T
where
    T::Err: std::fmt::Debug,
{
    // Callers only pass digit captures.
    s.parse().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> DateRange {
        parse_date(s, &DatePolicy::default())
    }

    #[test]
    fn test_single_year() {
        assert_eq!(parse("1350"), DateRange::years(1350, 1350));
        assert_eq!(parse("1476, June 4"), DateRange::years(1476, 1476));
    }

    #[test]
    fn test_year_ranges() {
        assert_eq!(parse("1300-1400"), DateRange::years(1300, 1400));
        assert_eq!(parse("1421\u{2013}1462"), DateRange::years(1421, 1462));
        assert_eq!(parse("1370-80"), DateRange::years(1370, 1380));
        assert_eq!(
            parse("between 1150 and 1175"),
            DateRange::years(1150, 1175)
        );
    }

    #[test]
    fn test_circa_widening() {
        assert_eq!(parse("ca. 1420"), DateRange::years(1395, 1445));
        assert_eq!(parse("ca 1420"), DateRange::years(1395, 1445));
        assert_eq!(parse("c. 1420"), DateRange::years(1395, 1445));
        assert_eq!(parse("circa 1420"), DateRange::years(1395, 1445));
        let tight = DatePolicy { circa_tolerance: 10 };
        assert_eq!(
            parse_date("ca. 1520", &tight),
            DateRange::years(1510, 1530)
        );
    }

    #[test]
    fn test_open_bounds() {
        assert_eq!(
            parse("before 1250"),
            DateRange {
                start: None,
                end: Some(1250)
            }
        );
        assert_eq!(
            parse("after 1400"),
            DateRange {
                start: Some(1400),
                end: None
            }
        );
    }

    #[test]
    fn test_ordinal_centuries() {
        assert_eq!(parse("15th century"), DateRange::years(1400, 1499));
        assert_eq!(parse("14th-15th century"), DateRange::years(1300, 1499));
        assert_eq!(parse("17th Century"), DateRange::years(1600, 1699));
    }

    #[test]
    fn test_roman_centuries() {
        assert_eq!(parse("XV"), DateRange::years(1400, 1499));
        assert_eq!(parse("s. XIII"), DateRange::years(1200, 1299));
        assert_eq!(parse("XIII-XVII"), DateRange::years(1200, 1699));
    }

    #[test]
    fn test_roman_fractions() {
        assert_eq!(parse("XV2/2"), DateRange::years(1450, 1499));
        assert_eq!(parse("s. XV 1/4"), DateRange::years(1400, 1424));
        assert_eq!(parse("XIII 3/4"), DateRange::years(1250, 1274));
        assert_eq!(parse("XV \u{00bd}"), DateRange::years(1400, 1449));
    }

    #[test]
    fn test_roman_qualifiers() {
        assert_eq!(parse("XV in"), DateRange::years(1400, 1425));
        assert_eq!(parse("XV med"), DateRange::years(1425, 1474));
        assert_eq!(parse("XVex"), DateRange::years(1475, 1499));
        assert_eq!(parse("XIV 2"), DateRange::years(1350, 1399));
    }

    #[test]
    fn test_noise_stripping() {
        assert_eq!(parse("1420 (binder)"), DateRange::years(1420, 1420));
        assert_eq!(parse("[ca. 1300]"), DateRange::years(1275, 1325));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(parse(""), DateRange::EMPTY);
        assert_eq!(parse("undated"), DateRange::EMPTY);
        assert_eq!(parse("medieval"), DateRange::EMPTY);
    }

    #[test]
    fn test_reversed_range_is_reordered() {
        assert_eq!(parse("1400-1300"), DateRange::years(1300, 1400));
        assert_eq!(parse("between 1475 and 1450"), DateRange::years(1450, 1475));
    }

    #[test]
    fn test_overfull_fraction_falls_back_to_century() {
        assert_eq!(parse("XV 5/4"), DateRange::years(1400, 1499));
        assert_eq!(parse("XIII 4/3"), DateRange::years(1200, 1299));
    }

    #[test]
    fn test_start_never_exceeds_end() {
        for s in [
            "1350",
            "1300-1400",
            "1400-1300",
            "15th century",
            "XV med",
            "ca. 1420",
            "XIII-XVII",
            "XV2/2",
            "XV 5/4",
        ] {
            let r = parse(s);
            if let (Some(start), Some(end)) = (r.start, r.end) {
                assert!(start <= end, "{s}: {start} > {end}");
            }
        }
    }
}
