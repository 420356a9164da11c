//! `XADD key [NOMKSTREAM] [MAXLEN|MINID [=|~] threshold [LIMIT n]] <*|id> field value [field value ...]`

use tracing::debug;

use super::is_keyword;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::stream::{Fields, ParsedId, StreamId};

/// How a stream should be capped after an append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrimStrategy {
    /// No capping requested.
    #[default]
    None,
    /// Keep at most `threshold` entries.
    MaxLen {
        /// Entry count to keep.
        threshold: u64,
        /// `~` was given: trimming may stop early.
        approx: bool,
        /// `LIMIT n`: at most this many entries removed per call.
        limit: Option<u64>,
    },
    /// Drop entries with IDs below `threshold`.
    MinId {
        /// Smallest ID to keep.
        threshold: StreamId,
        /// `~` was given: trimming may stop early.
        approx: bool,
        /// `LIMIT n`: at most this many entries removed per call.
        limit: Option<u64>,
    },
}

/// Parsed XADD options.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XaddOptions {
    /// Explicit ID, or `None` for `*`.
    pub id: Option<ParsedId>,
    /// Fail instead of creating a missing stream.
    pub no_mkstream: bool,
    /// Requested capping. Recorded only; entries are never evicted.
    pub trim: TrimStrategy,
    /// Index of the first field argument.
    pub field_pos: usize,
}

impl XaddOptions {
    /// Parse everything after the key. `field_pos` is relative to the full
    /// argument list, key included.
    pub fn parse(args: &[&str]) -> Result<Self> {
        let mut opts = XaddOptions::default();
        let mut i = 1;
        while i < args.len() {
            let opt = args[i];
            let have_more = i + 1 < args.len();
            if opt == "*" {
                opts.field_pos = i + 1;
                return Ok(opts);
            } else if (is_keyword(opt, "MAXLEN") || is_keyword(opt, "MINID")) && have_more {
                if opts.trim != TrimStrategy::None {
                    return Err(Error::Syntax(
                        "syntax error, MAXLEN and MINID options at the same time are not compatible"
                            .to_owned(),
                    ));
                }
                i += 1;
                let approx = match args[i] {
                    "~" => true,
                    "=" => false,
                    _ => {
                        i -= 1;
                        false
                    }
                };
                i += 1;
                let threshold = args.get(i).copied().ok_or_else(Error::syntax)?;
                let limit = match args.get(i + 1) {
                    Some(word) if is_keyword(word, "LIMIT") => {
                        let count = args.get(i + 2).ok_or_else(Error::syntax)?;
                        i += 2;
                        Some(count.parse::<u64>().map_err(|_| {
                            Error::Syntax("The LIMIT argument must be >= 0.".to_owned())
                        })?)
                    }
                    _ => None,
                };
                opts.trim = if is_keyword(opt, "MAXLEN") {
                    TrimStrategy::MaxLen {
                        threshold: threshold.parse().map_err(|_| Error::InvalidMaxLen)?,
                        approx,
                        limit,
                    }
                } else {
                    TrimStrategy::MinId {
                        threshold: StreamId::parse(threshold, true, 0)?.id,
                        approx,
                        limit,
                    }
                };
            } else if is_keyword(opt, "NOMKSTREAM") {
                opts.no_mkstream = true;
            } else {
                opts.id = Some(StreamId::parse(opt, true, 0)?);
                opts.field_pos = i + 1;
                return Ok(opts);
            }
            i += 1;
        }
        // Ran out of arguments before the ID.
        opts.field_pos = args.len();
        Ok(opts)
    }
}

/// Append an entry, returning its ID.
pub fn xadd(store: &Store, args: &[&str]) -> Result<StreamId> {
    if args.len() < 4 {
        return Err(Error::ArgumentCount("XADD"));
    }
    let key = args[0];
    let opts = XaddOptions::parse(args)?;

    let pairs = &args[opts.field_pos.min(args.len())..];
    if pairs.len() < 2 || pairs.len() % 2 == 1 {
        return Err(Error::ArgumentCount("XADD"));
    }

    // Checked before the store is touched so no stream gets created.
    if let Some(ParsedId { id, seq_given: true }) = opts.id {
        if id.is_zero() {
            return Err(Error::ZeroId);
        }
    }

    let fields: Fields = pairs
        .chunks_exact(2)
        .map(|pair| (pair[0].to_owned(), pair[1].to_owned()))
        .collect();

    let id = store.write_stream(key, !opts.no_mkstream, |stream| {
        if stream.is_exhausted() {
            return Err(Error::Exhausted);
        }
        match opts.id {
            Some(parsed) => stream.append_with_id(parsed.id, parsed.seq_given, fields),
            None => stream.append(fields),
        }
    })?;

    if opts.trim != TrimStrategy::None {
        debug!(key, trim = ?opts.trim, "trim requested but not applied");
    }
    Ok(id)
}
