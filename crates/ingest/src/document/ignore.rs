//! Parsing of the user's "pages to ignore" directive.
//!
//! Accepts `none`, `all`, or a comma-separated list of one-based page numbers
//! and inclusive ranges (`2,4-6`). Unparseable tokens and out-of-range pages
//! are dropped; parsing never fails.

use std::collections::BTreeSet;

/// Zero-based page indices excluded from embedding.
pub type IgnoreSet = BTreeSet<usize>;

pub fn parse_ignore_pages(directive: &str, total_pages: usize) -> IgnoreSet {
    let directive = directive.trim().to_lowercase();
    match directive.as_str() {
        "" | "none" => return IgnoreSet::new(),
        "all" => return (0..total_pages).collect(),
        _ => {}
    }

    let mut ignored = IgnoreSet::new();
    for token in directive.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if let Some((start, end)) = token.split_once('-') {
            let (Ok(start), Ok(end)) = (start.trim().parse::<usize>(), end.trim().parse::<usize>())
            else {
                continue;
            };
            if start == 0 || end == 0 {
                continue;
            }
            for page in start..=end.min(total_pages) {
                ignored.insert(page - 1);
            }
        } else if let Ok(page) = token.parse::<usize>() {
            if (1..=total_pages).contains(&page) {
                ignored.insert(page - 1);
            }
        }
    }
    ignored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_and_empty_ignore_nothing() {
        assert!(parse_ignore_pages("none", 10).is_empty());
        assert!(parse_ignore_pages("", 10).is_empty());
        assert!(parse_ignore_pages("  NONE ", 10).is_empty());
    }

    #[test]
    fn all_ignores_every_page() {
        assert_eq!(parse_ignore_pages("all", 4), IgnoreSet::from([0, 1, 2, 3]));
        assert!(parse_ignore_pages("all", 0).is_empty());
    }

    #[test]
    fn mixes_pages_and_ranges_and_drops_out_of_range() {
        assert_eq!(
            parse_ignore_pages("2,4-6,99", 10),
            IgnoreSet::from([1, 3, 4, 5])
        );
    }

    #[test]
    fn ranges_are_clamped_to_document() {
        assert_eq!(parse_ignore_pages("8-20", 10), IgnoreSet::from([7, 8, 9]));
    }

    #[test]
    fn malformed_tokens_are_skipped() {
        assert_eq!(
            parse_ignore_pages("abc, 3, 0, -2, 5-x, 7-, 0-3, 6-4, 1", 10),
            IgnoreSet::from([0, 2])
        );
    }

    #[test]
    fn whitespace_inside_tokens_is_tolerated() {
        assert_eq!(parse_ignore_pages(" 1 , 3 - 4 ", 5), IgnoreSet::from([0, 2, 3]));
    }
}
