pub mod catalog;
pub mod composition;
pub mod glycan_id;
pub mod range;

pub use catalog::*;
pub use composition::{Composition, CompositionParseError, CompositionRecord, Monosaccharide};
pub use glycan_id::{generate_unique_id, GlycanId, GlycanIdError, IdRegistry};
pub use range::{GuRange, MassRange, RangeBucket, RangeParseError};
