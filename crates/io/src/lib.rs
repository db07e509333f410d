// File I/O - dataset readers (Excel, CSV) and the comparison report writer

pub mod csv;
pub mod report;
pub mod source;
pub mod xlsx;

pub use report::{export_report, export_report_to_path, ExportError, ReportOutput};
pub use source::{is_supported, FileSource};
