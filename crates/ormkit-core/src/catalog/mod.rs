//! Type descriptor catalog and schema definitions.
//!
//! Descriptors are dialect-neutral and immutable; tables own their columns,
//! columns share their descriptors read-only.

mod column;
mod index;
mod notation;
mod options;
mod table;
mod types;

pub use column::{ColumnDef, DefaultFunction, DefaultValue, Reference, ReferentialAction};
pub use index::{
    derive_index_name, IndexColumn, IndexDef, IndexKind, IndexMethod, IndexTarget, OrderDirection,
};
pub use options::{OptionKey, TypeOptions};
pub use table::{TableDef, TableOptions};
pub use types::{
    GeometryShape, Modifier, Modifiers, RangeSubtype, SizeClass, TypeDescriptor, TypeKind,
    TypeName, MAX_TIME_PRECISION,
};
