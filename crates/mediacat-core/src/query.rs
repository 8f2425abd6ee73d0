//! Search query language.
//!
//! Free-text terms and metadata values share a one-character prefix grammar:
//!
//! | Form      | Meaning                         |
//! |-----------|---------------------------------|
//! | `word`    | include (rank by similarity)    |
//! | `+word`   | include, same as unprefixed     |
//! | `-word`   | exclude                         |
//! | `-`       | ignored                         |
//!
//! Free-text terms shorter than [`MIN_TERM_LEN`](crate::defaults::MIN_TERM_LEN)
//! characters once the prefix is removed are ignored. Metadata values have no
//! minimum length (a rating of `R` is meaningful), only empty values are
//! dropped.

use crate::defaults::MIN_TERM_LEN;

const EXCLUDE_PREFIX: char = '-';
const INCLUDE_PREFIX: char = '+';

/// Free-text terms split into ranking words and excluded titles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedTerms {
    /// Words passed to the similarity ranking.
    pub include_words: Vec<String>,
    /// Titles (compared lower-cased) a movie must not have.
    pub exclude_titles: Vec<String>,
}

impl ClassifiedTerms {
    pub fn is_empty(&self) -> bool {
        self.include_words.is_empty() && self.exclude_titles.is_empty()
    }
}

enum Prefixed<'a> {
    Include(&'a str),
    Exclude(&'a str),
}

fn strip_prefix(raw: &str) -> Prefixed<'_> {
    if let Some(rest) = raw.strip_prefix(EXCLUDE_PREFIX) {
        Prefixed::Exclude(rest)
    } else {
        Prefixed::Include(raw.strip_prefix(INCLUDE_PREFIX).unwrap_or(raw))
    }
}

/// Partition free-text terms into ranking words and title exclusions.
///
/// Order is preserved within each bucket. Never fails.
pub fn classify_terms<S: AsRef<str>>(terms: &[S]) -> ClassifiedTerms {
    let mut classified = ClassifiedTerms::default();

    for term in terms {
        let (bucket, word) = match strip_prefix(term.as_ref()) {
            Prefixed::Exclude(word) => (&mut classified.exclude_titles, word),
            Prefixed::Include(word) => (&mut classified.include_words, word),
        };
        if word.chars().count() < MIN_TERM_LEN {
            continue;
        }
        bucket.push(word.to_string());
    }

    classified
}

/// Values of one metadata key split into the include and exclude sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataValues {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl MetadataValues {
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Number of bound values this key contributes.
    pub fn len(&self) -> usize {
        self.include.len() + self.exclude.len()
    }
}

/// Split metadata values on their `-`/`+` prefix.
///
/// A bare `-` (or `+`, or an empty string) is dropped; it never means
/// "exclude the empty value".
pub fn split_metadata_values<S: AsRef<str>>(values: &[S]) -> MetadataValues {
    let mut split = MetadataValues::default();

    for value in values {
        let (bucket, value) = match strip_prefix(value.as_ref()) {
            Prefixed::Exclude(value) => (&mut split.exclude, value),
            Prefixed::Include(value) => (&mut split.include, value),
        };
        if value.is_empty() {
            continue;
        }
        bucket.push(value.to_string());
    }

    split
}

/// A metadata key with its optional negation prefix removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataKey<'a> {
    /// Catalog name of the metadata type.
    pub name: &'a str,
    /// `-genre` negates the whole constraint for `genre`.
    pub negated: bool,
}

/// Parse a metadata key. A bare `-` carries no type name and is skipped.
pub fn parse_metadata_key(raw: &str) -> Option<MetadataKey<'_>> {
    match raw.strip_prefix(EXCLUDE_PREFIX) {
        Some("") => None,
        Some(name) => Some(MetadataKey {
            name,
            negated: true,
        }),
        None => Some(MetadataKey {
            name: raw,
            negated: false,
        }),
    }
}
