// Tabular export of the current task collection

use crate::error::{Error, Result};
use crate::models::{Task, format_duedate};

/// Column labels, in output order. These exact uppercase strings form the
/// header row.
pub const CSV_HEADER: [&str; 5] = ["TITLE", "DUEDATE", "DESCRIPTION", "PRIORITY", "STATUS"];

/// Encode tasks as CSV: one header row, then one data row per task in the
/// order given (callers pass store-native order; no sort applies here).
///
/// The buffer lives only for the duration of the export request; nothing
/// touches the filesystem.
pub fn to_csv(tasks: &[Task]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for task in tasks {
        writer.write_record([
            task.title.as_str(),
            &format_duedate(&task.duedate),
            task.description.as_str(),
            task.priority.as_str(),
            task.status.as_str(),
        ])?;
    }

    writer.into_inner().map_err(|e| Error::Io(e.into_error()))
}
