use crate::error::{PregelError, Result};
use crate::VertexId;

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Reads a source list: a count followed by that many vertex ids, all
/// whitespace separated. At most `max_sources` ids are taken, and a file
/// listing fewer ids than announced yields the ones present.
pub fn read_sources(path: &Path, max_sources: usize) -> Result<HashSet<VertexId>> {
    let text = fs::read_to_string(path).map_err(|err| PregelError::io(path, err))?;

    let mut tokens = text
        .lines()
        .enumerate()
        .flat_map(|(index, line)| line.split_whitespace().map(move |token| (index + 1, token)));

    let announced: usize = match tokens.next() {
        Some((line, token)) => token.parse().map_err(|_| PregelError::Parse {
            path: path.to_path_buf(),
            line,
            reason: format!("invalid source count {:?}", token),
        })?,
        None => return Ok(HashSet::new()),
    };

    let wanted = announced.min(max_sources);
    if wanted < announced {
        warn!(announced, max_sources, "truncating source list");
    }

    let mut sources = HashSet::with_capacity(wanted);
    for (line, token) in tokens.take(wanted) {
        let vid: VertexId = token.parse().map_err(|_| PregelError::Parse {
            path: path.to_path_buf(),
            line,
            reason: format!("invalid vertex id {:?}", token),
        })?;
        sources.insert(vid);
    }

    Ok(sources)
}
