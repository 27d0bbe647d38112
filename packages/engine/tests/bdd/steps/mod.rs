//! Step definitions
//!
//! `given` builds the template and context, `when` assembles, `then`
//! inspects the document and the report.

pub mod given;
pub mod then;
pub mod when;
