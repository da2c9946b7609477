// src/protocol/mod.rs

//! The JSON-over-stdout protocol spoken by test commands.
//!
//! A test command may print anything it likes; lines starting with `{` are
//! protocol records:
//!
//! ```text
//! {"message": "3 tests passed", "level": "info"}
//! {"file": "/tmp/results.xml", "status": 200, "successful": true}
//! ```
//!
//! - [`record`] defines the typed records and the accumulated response.
//! - [`parser`] turns raw stdout into a response and provides the encoder
//!   for result lines.

pub mod parser;
pub mod record;

pub use parser::{build_result_string, parse_response};
pub use record::{ProtocolRecord, ProtocolResponse, ResultRecord, ResultStatus, SUCCESS_STATUS};
