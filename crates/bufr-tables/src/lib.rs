#![deny(unsafe_code)]

pub mod collection;
pub mod entry;
pub mod error;
pub mod loaders;
pub mod paths;
pub mod table;

pub use crate::collection::{
    SchemaTableCollection, SchemaTableCollectionBuilder, TableSources, load_collection,
};
pub use crate::entry::{Encoding, TableBEntry, TableDEntry, ValueClass, ValueType};
pub use crate::error::{Result, TablesError};
pub use crate::loaders::{
    DEFAULT_TABLE_VERSION, LocalTables, builtin_table, load_table_b_csv, load_table_d_csv,
    load_tables_dir,
};
pub use crate::paths::{TABLES_ENV_VAR, resolve_tables_dir};
pub use crate::table::{SchemaTable, TableOrigin};
