//! `XRANGE key start end [COUNT n]`

use super::is_keyword;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::stream::{Fields, StreamId};

/// One entry of a range reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    /// Entry ID.
    pub id: StreamId,
    /// Field/value pairs in insertion order.
    pub fields: Fields,
}

/// Entries with IDs in `[start, end]`, ascending.
///
/// `start` and `end` accept `-`, `+`, `<ms>`, `<ms>-<seq>` and the exclusive
/// form `(<id>`. A bare `<ms>` covers the whole millisecond on either side.
pub fn xrange(store: &Store, args: &[&str]) -> Result<Vec<StreamEntry>> {
    if args.len() < 3 {
        return Err(Error::ArgumentCount("XRANGE"));
    }
    let key = args[0];

    let start = StreamId::parse_range_bound(args[1], 0)?;
    let mut start_id = start.id;
    if start.exclusive {
        start_id.incr().map_err(|_| Error::InvalidInterval("start"))?;
    }
    let end = StreamId::parse_range_bound(args[2], u64::MAX)?;
    let mut end_id = end.id;
    if end.exclusive {
        end_id.decr().map_err(|_| Error::InvalidInterval("end"))?;
    }

    let mut count = None;
    let mut j = 3;
    while j < args.len() {
        if is_keyword(args[j], "COUNT") && j + 1 < args.len() {
            let n: i64 = args[j + 1].parse().map_err(|_| Error::syntax())?;
            count = Some(usize::try_from(n).unwrap_or(0));
            j += 2;
        } else {
            return Err(Error::syntax());
        }
    }
    let limit = count.unwrap_or(usize::MAX);
    if limit == 0 || start_id > end_id {
        return Ok(Vec::new());
    }

    let entries = store.read_stream(key, |stream| {
        Ok(stream
            .range(start_id, end_id, false)
            .take_while(|(id, _)| *id <= end_id)
            .take(limit)
            .map(|(id, fields)| StreamEntry {
                id,
                fields: fields.clone(),
            })
            .collect::<Vec<_>>())
    })?;
    Ok(entries.unwrap_or_default())
}
