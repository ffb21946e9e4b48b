//! Query compiler and record mapper for SOQL-style relational APIs.
//!
//! Compiles storage-agnostic find requests (equality, presence, range and
//! prefix filters, sorting, field selection and relationship inclusion) into
//! injection-safe query text, and maps records between their canonical,
//! declared-type shape and the loosely typed shape of the remote API.
//!
//! # Quick Start
//!
//! ## Declare Record Types
//!
//! ```rust
//! use soql_orm::{FieldDefinition, Registry, ScalarKind, TypeDescriptor};
//!
//! let account = TypeDescriptor::new("Account")
//!     .field("Name", FieldDefinition::scalar(ScalarKind::String))
//!     .field("NumberOfEmployees", FieldDefinition::scalar(ScalarKind::Number))
//!     .field("Parent", FieldDefinition::to_one("Account"))
//!     .field("ChildAccounts", FieldDefinition::to_many("Account").inverse("Parent"));
//!
//! let registry = Registry::new().with(account);
//! ```
//!
//! ## Build a Query
//!
//! ```rust
//! # use soql_orm::{FieldDefinition, Registry, ScalarKind, TypeDescriptor};
//! use soql_orm::{FindOptions, Schema, SelectBuilder};
//!
//! # let account = TypeDescriptor::new("Account")
//! #     .field("Name", FieldDefinition::scalar(ScalarKind::String))
//! #     .field("NumberOfEmployees", FieldDefinition::scalar(ScalarKind::Number));
//! let schema = Schema {
//!     registry: Registry::new().with(account),
//!     ..Schema::default()
//! };
//!
//! let options = FindOptions::new()
//!     .range("NumberOfEmployees", 36, 38)
//!     .fuzzy_match("Name", "AC")
//!     .sort("Name", true)
//!     .limit(10);
//!
//! let query = SelectBuilder::new(&schema, "Account").options(&options).build()?;
//! assert_eq!(
//!     query.soql,
//!     "SELECT Id, Name, NumberOfEmployees FROM Account \
//!      WHERE NumberOfEmployees >= 36 AND NumberOfEmployees <= 38 AND Name LIKE 'AC%' \
//!      ORDER BY Name ASC"
//! );
//! assert_eq!(query.max_fetch, 10);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Relationships
//!
//! Option keys reach into relationships with the dialect's delimiter
//! (`:` by default). To-one paths become dotted paths (`Parent.Name`);
//! to-many relationships are fetched as sub-selects when included through
//! [`RequestMeta`]. An included sub-select re-compiles the predicates for the
//! linked type, so keys reaching into the relationship and plain keys both
//! apply inside it.
//!
//! ```ignore
//! let options = FindOptions::new()
//!     .r#match("Name", "Jane")
//!     .exists("Accounts:Parent", true)
//!     .meta(RequestMeta::new().include("Accounts"));
//! // SELECT Id, Name, (SELECT Id FROM Accounts WHERE Name = 'Jane' AND Parent != null)
//! //   FROM User WHERE Name = 'Jane'
//! ```
//!
//! ## Mapping Records
//!
//! ```ignore
//! let mapper = RecordMapper::new(&schema, "Account")?;
//!
//! // canonical -> external, before create and update
//! let external = mapper.inbound(&Record::new().set("Parent", Id::from("001A")))?;
//!
//! // external -> canonical, after reads
//! let record = mapper.outbound(&row);
//! ```

mod filter;
mod keys;
mod options;
mod query;
mod record;
mod schema;
mod select;
mod value;

pub use filter::{Filter, Predicates, Target, check_path};
pub use keys::{ChildRelationship, Describe, DescribeField, ForeignKeyMap};
pub use options::{FindOptions, Match, QueryHook, Range, RequestMeta};
pub use query::{Dialect, PATH_SEPARATOR, PRIMARY_KEY, Query, Schema};
pub use record::{ExternalRecord, Record, RecordMapper};
pub use schema::{FieldDefinition, Registry, Relation, ScalarKind, TypeDescriptor};
pub use select::SelectBuilder;
pub use value::{
    Id, Value, escape, escape_like, format_date, format_instant, parse_date, parse_instant,
};
