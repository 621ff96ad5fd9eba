use std::{fmt, str::FromStr};

use crate::error::RegionError;

/// A region query: all records on `chrom` with a position in `[start, end]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Region {
    pub chrom: String,
    pub start: u32,
    pub end: u32,
}
impl Region {
    pub fn new<S: Into<String>>(chrom: S, start: u32, end: u32) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
        }
    }
}

fn parse_coordinate(s: &str) -> Option<u32> {
    s.trim().replace(',', "").parse().ok()
}

/// Parses `CHROM:START-END` or `CHROM:POS`
///
/// Thousands separators are accepted (`chr1:1,000-2,000`). The chromosome is split at the
/// last colon so names containing colons still parse.
impl FromStr for Region {
    type Err = RegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RegionError::InvalidRegion(s.to_string());
        let (chrom, range) = s.rsplit_once(':').ok_or_else(invalid)?;
        if chrom.is_empty() {
            return Err(invalid());
        }
        let (start, end) = match range.split_once('-') {
            Some((start, end)) => (
                parse_coordinate(start).ok_or_else(invalid)?,
                parse_coordinate(end).ok_or_else(invalid)?,
            ),
            None => {
                let pos = parse_coordinate(range).ok_or_else(invalid)?;
                (pos, pos)
            }
        };
        Ok(Self::new(chrom, start, end))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
    }
}
