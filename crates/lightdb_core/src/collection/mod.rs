//! Record collections.
//!
//! A collection is a named list of flat records stored in its own file
//! under the configured collections folder. Records are filtered with
//! plain closures rather than a query language.

mod defaults;
mod records;

pub use defaults::{Defaults, Record, AUTO_INCREMENT_PREFIX};
pub use records::Collection;
