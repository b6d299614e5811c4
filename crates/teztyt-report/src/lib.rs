//! teztyt-report: Gradebook rendering for evaluation reports.

pub mod html;

pub use html::{generate_html, write_html_report};
