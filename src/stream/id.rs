//! Stream entry identifiers.
//!
//! A [`StreamId`] is a `(ms, seq)` pair ordered by `ms` then `seq`. The 16-byte
//! big-endian encoding sorts byte-wise in the same order, which is what lets
//! the radix tree serve as the stream's time index.

use std::fmt;

use crate::error::{Error, Result};

/// Textual IDs longer than this are rejected.
pub const MAX_ID_LEN: usize = 127;

/// Size of an encoded ID.
pub const ENCODED_LEN: usize = 16;

/// A `(milliseconds, sequence)` stream entry identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StreamId {
    ms: u64,
    seq: u64,
}

/// Result of parsing a textual ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedId {
    /// The parsed identifier. When `seq_given` is false its sequence is a
    /// placeholder.
    pub id: StreamId,
    /// Whether the text fixed the sequence part.
    pub seq_given: bool,
}

/// A range endpoint as written by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeBound {
    /// The endpoint ID.
    pub id: StreamId,
    /// Written as `(id`, excluding the endpoint itself.
    pub exclusive: bool,
}

impl StreamId {
    /// The smallest ID, `0-0`.
    pub const MIN: StreamId = StreamId { ms: 0, seq: 0 };

    /// The largest ID. A stream whose last entry has this ID is exhausted.
    pub const MAX: StreamId = StreamId {
        ms: u64::MAX,
        seq: u64::MAX,
    };

    /// Create an ID from its parts.
    pub const fn new(ms: u64, seq: u64) -> Self {
        Self { ms, seq }
    }

    /// Millisecond part.
    #[inline]
    pub const fn ms(&self) -> u64 {
        self.ms
    }

    /// Sequence part.
    #[inline]
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    /// Whether this is `0-0`.
    pub const fn is_zero(&self) -> bool {
        self.ms == 0 && self.seq == 0
    }

    /// Step to the successor. At [`StreamId::MAX`] this wraps to `0-0` and
    /// reports [`Error::Overflow`].
    pub fn incr(&mut self) -> Result<()> {
        if self.seq < u64::MAX {
            self.seq += 1;
        } else if self.ms < u64::MAX {
            self.ms += 1;
            self.seq = 0;
        } else {
            *self = StreamId::MIN;
            return Err(Error::Overflow);
        }
        Ok(())
    }

    /// Step to the predecessor. At `0-0` this reports [`Error::Underflow`]
    /// and leaves the ID unchanged.
    pub fn decr(&mut self) -> Result<()> {
        if self.seq > 0 {
            self.seq -= 1;
        } else if self.ms > 0 {
            self.ms -= 1;
            self.seq = u64::MAX;
        } else {
            return Err(Error::Underflow);
        }
        Ok(())
    }

    /// Order-preserving 16-byte encoding.
    pub fn encode(&self) -> [u8; ENCODED_LEN] {
        let mut out = [0u8; ENCODED_LEN];
        out[..8].copy_from_slice(&self.ms.to_be_bytes());
        out[8..].copy_from_slice(&self.seq.to_be_bytes());
        out
    }

    /// Decode an encoded ID. Returns `None` unless `bytes` is exactly
    /// [`ENCODED_LEN`] long.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let bytes: &[u8; ENCODED_LEN] = bytes.try_into().ok()?;
        let (ms, seq) = bytes.split_at(8);
        Some(Self {
            ms: u64::from_be_bytes(ms.try_into().ok()?),
            seq: u64::from_be_bytes(seq.try_into().ok()?),
        })
    }

    /// Parse a textual ID.
    ///
    /// Accepted forms are `-` (the minimum), `+` (the maximum), `<ms>`,
    /// `<ms>-<seq>` and `<ms>-*`. In `strict` mode the bare `-` and `+` are
    /// rejected. `<ms>` alone takes `missing_seq` as its sequence.
    pub fn parse(s: &str, strict: bool, missing_seq: u64) -> Result<ParsedId> {
        if s.len() > MAX_ID_LEN {
            return Err(Error::MalformedId);
        }
        match s {
            "-" if !strict => {
                return Ok(ParsedId {
                    id: StreamId::MIN,
                    seq_given: false,
                })
            }
            "+" if !strict => {
                return Ok(ParsedId {
                    id: StreamId::MAX,
                    seq_given: true,
                })
            }
            _ => {}
        }

        let Some((ms, seq)) = s.split_once('-') else {
            return Ok(ParsedId {
                id: StreamId::new(parse_part(s)?, missing_seq),
                seq_given: true,
            });
        };
        let ms = parse_part(ms)?;
        if seq == "*" {
            return Ok(ParsedId {
                id: StreamId::new(ms, 0),
                seq_given: false,
            });
        }
        Ok(ParsedId {
            id: StreamId::new(ms, parse_part(seq)?),
            seq_given: true,
        })
    }

    /// Parse a range endpoint: anything [`StreamId::parse`] accepts, or
    /// `(id` for an exclusive bound. The exclusive form is parsed strictly.
    pub fn parse_range_bound(s: &str, missing_seq: u64) -> Result<RangeBound> {
        match s.strip_prefix('(') {
            Some(rest) if !rest.is_empty() => Ok(RangeBound {
                id: Self::parse(rest, true, missing_seq)?.id,
                exclusive: true,
            }),
            _ => Ok(RangeBound {
                id: Self::parse(s, false, missing_seq)?.id,
                exclusive: false,
            }),
        }
    }
}

/// Unsigned decimal with no sign, whitespace or other decoration.
fn parse_part(s: &str) -> Result<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::MalformedId);
    }
    s.parse().map_err(|_| Error::MalformedId)
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

impl From<(u64, u64)> for StreamId {
    fn from((ms, seq): (u64, u64)) -> Self {
        Self::new(ms, seq)
    }
}
