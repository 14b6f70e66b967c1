//! Schema management module

mod builder;
mod catalog;
pub mod declaration;
mod hash;
pub mod migration;

pub use builder::SchemaBuilder;
pub use catalog::{Catalog, ColumnDef, TableDef, ViewColumn, ViewDef, ID_COLUMN};
pub use declaration::{
    ColumnDeclaration, DeclarationHeader, TableDeclaration, ViewDeclaration, DECLARATION_VERSION,
};
pub use hash::view_identity_hash;
