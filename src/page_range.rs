use crate::error::{BuildError, Result};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Sentinel spec selecting every page in natural order.
pub const ALL: &str = "All";

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(?:-(\d+))?$").expect("static regex"));

/// One comma-separated token: a single 1-based page or an inclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: Option<u32>,
}

/// A parsed range spec, not yet checked against a page count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeSpec {
    All,
    Ranges(Vec<PageRange>),
}

impl PageRange {
    /// Parse a single token like "7" or "3-5" (whitespace already stripped).
    fn parse(token: &str, spec: &str) -> Result<Self> {
        if token.is_empty() {
            return Err(BuildError::invalid_range(spec, "empty page token"));
        }

        let caps = TOKEN
            .captures(token)
            .ok_or_else(|| BuildError::invalid_range(spec, format!("malformed token '{}'", token)))?;

        let start = parse_page_number(&caps[1], spec)?;
        let end = caps
            .get(2)
            .map(|m| parse_page_number(m.as_str(), spec))
            .transpose()?;

        if let Some(end) = end {
            if start > end {
                return Err(BuildError::invalid_range(
                    spec,
                    format!("reversed range {}-{}", start, end),
                ));
            }
        }

        Ok(PageRange { start, end })
    }

    /// Expand into 0-based page indices, checking against the page count.
    fn expand(&self, total_pages: usize, spec: &str) -> Result<Vec<usize>> {
        let end = self.end.unwrap_or(self.start);

        // start <= end was checked at parse time
        if end as usize > total_pages {
            return Err(BuildError::invalid_range(
                spec,
                format!("page {} exceeds total pages {}", end, total_pages),
            ));
        }

        Ok((self.start as usize - 1..end as usize).collect())
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}-{}", self.start, end),
            None => write!(f, "{}", self.start),
        }
    }
}

fn parse_page_number(s: &str, spec: &str) -> Result<u32> {
    let n = s
        .parse::<u32>()
        .map_err(|_| BuildError::invalid_range(spec, format!("invalid page number '{}'", s)))?;
    if n == 0 {
        return Err(BuildError::invalid_range(spec, "page numbers start at 1"));
    }
    Ok(n)
}

impl RangeSpec {
    /// Parse a spec like "All", "3" or "1,3-5". Whitespace is ignored and an
    /// empty spec means every page.
    pub fn parse(s: &str) -> Result<Self> {
        let compact = normalize(s);
        if compact.eq_ignore_ascii_case(ALL) {
            return Ok(RangeSpec::All);
        }

        compact
            .split(',')
            .map(|token| PageRange::parse(token, s))
            .collect::<Result<Vec<_>>>()
            .map(RangeSpec::Ranges)
    }

    /// Resolve into 0-based indices for a document of `total_pages` pages.
    /// Duplicates and overlaps are kept in the order written.
    pub fn resolve(&self, total_pages: usize) -> Result<Vec<usize>> {
        match self {
            RangeSpec::All => Ok((0..total_pages).collect()),
            RangeSpec::Ranges(ranges) => {
                let spec = self.to_string();
                let mut pages = Vec::new();
                for range in ranges {
                    pages.extend(range.expand(total_pages, &spec)?);
                }
                Ok(pages)
            }
        }
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeSpec::All => f.write_str(ALL),
            RangeSpec::Ranges(ranges) => {
                for (i, range) in ranges.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", range)?;
                }
                Ok(())
            }
        }
    }
}

/// Strip all whitespace; an empty result becomes the `All` sentinel.
pub fn normalize(s: &str) -> String {
    let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        ALL.to_string()
    } else {
        compact
    }
}

/// Parse and resolve a range string in one step.
pub fn resolve_page_ranges(s: &str, total_pages: usize) -> Result<Vec<usize>> {
    RangeSpec::parse(s)?.resolve(total_pages)
}
