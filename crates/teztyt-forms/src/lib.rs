//! teztyt-forms: Form field extraction and field registry sidecars.
//!
//! Completed answer forms arrive as JSON field dumps: one object mapping
//! field names to values, as produced by common PDF form tools. Rendered
//! documents carry their field registry in a `<prefix><id>.form.json`
//! sidecar, which the merge step reads back.

pub mod extract;
pub mod sidecar;

pub use extract::JsonFieldExtractor;
pub use sidecar::{collect_form_documents, read_sidecar, sidecar_path, write_merged, write_sidecar};
