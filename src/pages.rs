//! Page selection.
//!
//! Users type 1-indexed page specs (`"1-3,5"`); everything inside the
//! library works with 0-indexed page numbers. The conversion happens here
//! and nowhere else.

use crate::error::PageSpecError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A sorted, de-duplicated set of 0-indexed page numbers.
///
/// `None` in an `Option<PageSet>` means "no restriction"; an empty set is a
/// valid (if useless) restriction that selects nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSet(BTreeSet<usize>);

impl PageSet {
    /// Parse a non-empty 1-indexed spec like `"1-3,5"`.
    ///
    /// Use [`parse_page_spec`] when the spec may be empty or `"all"`.
    pub fn parse(spec: &str) -> Result<Self, PageSpecError> {
        let mut pages = BTreeSet::new();

        for token in spec.split(',') {
            let token = token.trim();
            if let Some((start, end)) = token.split_once('-') {
                let start = parse_page_number(start)?;
                let end = parse_page_number(end)?;
                if end < start {
                    return Err(PageSpecError::ReversedRange { start, end });
                }
                pages.extend((start - 1)..end);
            } else {
                pages.insert(parse_page_number(token)? - 1);
            }
        }

        Ok(Self(pages))
    }

    pub fn contains(&self, page: usize) -> bool {
        self.0.contains(&page)
    }

    /// Pages in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<usize> {
        self.0.first().copied()
    }

    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// The selected pages that exist in a document of `total` pages.
    pub fn within(&self, total: usize) -> Vec<usize> {
        self.0.range(..total).copied().collect()
    }
}

impl FromIterator<usize> for PageSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Parse a user-supplied page spec.
///
/// Returns `Ok(None)` ("all pages") for an empty spec or the keyword `all`.
pub fn parse_page_spec(spec: &str) -> Result<Option<PageSet>, PageSpecError> {
    let spec = spec.trim();
    if spec.is_empty() || spec.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    PageSet::parse(spec).map(Some)
}

fn parse_page_number(token: &str) -> Result<usize, PageSpecError> {
    let token = token.trim();
    let page: usize = token
        .parse()
        .map_err(|source| PageSpecError::InvalidNumber {
            token: token.to_string(),
            source,
        })?;
    if page == 0 {
        return Err(PageSpecError::ZeroPage);
    }
    Ok(page)
}
