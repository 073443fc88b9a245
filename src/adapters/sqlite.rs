use crate::utils::error::{EtlError, Result};
use rusqlite::Connection;

/// Opens the store at `location`, hands the connection to `work` and closes it on every exit path.
///
/// Connection failures are reported through `map_err` so each caller keeps its own error kind.
pub fn with_connection<T, M, F>(location: &str, map_err: M, work: F) -> Result<T>
where
    M: Fn(rusqlite::Error) -> EtlError,
    F: FnOnce(&mut Connection) -> Result<T>,
{
    let mut conn = Connection::open(location).map_err(&map_err)?;
    tracing::debug!("Opened SQLite store at {}", location);

    match work(&mut conn) {
        Ok(value) => {
            conn.close().map_err(|(_, e)| map_err(e))?;
            tracing::debug!("Closed SQLite store at {}", location);
            Ok(value)
        }
        Err(e) => {
            // Dropping closes the handle; the work error is the one worth reporting.
            drop(conn);
            tracing::debug!("Closed SQLite store at {} after failure", location);
            Err(e)
        }
    }
}

/// Double-quotes an identifier for interpolation into SQL text.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
