#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

mod batch;
mod connect;
mod create;
mod delete;
mod error;
mod find;
mod options;
mod transport;
mod update;

#[doc(hidden)]
pub use soql_orm;
pub use soql_orm::{
    Describe, ExternalRecord, FindOptions, Id, Record, Registry, RequestMeta, Value,
};

pub use crate::connect::{Adapter, AdapterBuilder};
pub use crate::error::*;
pub use crate::find::FindResult;
pub use crate::options::ConnectOptions;
pub use crate::transport::{
    BatchOptions, FutureResult, QueryResponse, SaveError, SaveResult, Transport,
};
pub use crate::update::Update;
