// src/protocol/parser.rs

use serde::Serialize;
use tracing::{debug, info};

use crate::errors::ProtocolError;
use crate::logging::emit_child_log;
use crate::protocol::record::{ProtocolRecord, ProtocolResponse};

/// Parse a child's stdout into a [`ProtocolResponse`].
///
/// Only lines starting with `{` take part in the protocol; everything else is
/// free-form output and ignored. Fails if not a single protocol line exists.
pub fn parse_response(stdout: &str) -> Result<ProtocolResponse, ProtocolError> {
    let json_lines: Vec<&str> = stdout
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| line.starts_with('{'))
        .collect();

    if json_lines.is_empty() {
        return Err(ProtocolError::NoProtocolLines {
            stdout: stdout.to_string(),
        });
    }

    info!(
        lines = json_lines.len(),
        "test run complete; protocol lines of the child stdout follow at debug level"
    );

    let mut response = ProtocolResponse::default();
    for line in json_lines {
        debug!("{}", line);

        let value = serde_json::from_str(line).map_err(|source| ProtocolError::InvalidJson {
            line: line.to_string(),
            source,
        })?;

        match ProtocolRecord::classify(line, value)? {
            Some(ProtocolRecord::Result(record)) => response.merge(record),
            Some(ProtocolRecord::Log(entry)) => {
                emit_child_log(&entry.level, &entry.message);
                response.push_log(entry);
            }
            None => debug!(line, "dropping protocol line without file or message field"),
        }
    }

    Ok(response)
}

#[derive(Serialize)]
struct ResultLine<'a> {
    file: &'a str,
    successful: bool,
}

/// Build a result record suitable for `echo "..."` in a shell.
///
/// Every `"` is escaped, so the returned string can be placed inside a
/// double-quoted shell argument and will print a valid protocol line.
pub fn build_result_string(success: bool, file: &str) -> String {
    let line = serde_json::to_string(&ResultLine {
        file,
        successful: success,
    })
    .unwrap_or_default();

    line.replace('"', "\\\"")
}
