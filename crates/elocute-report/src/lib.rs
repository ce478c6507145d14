//! elocute-report: reader-facing feedback pages.

pub mod html;

pub use html::{generate_html, write_html_report};
