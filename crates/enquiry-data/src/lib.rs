/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Data collaborators of the enquiry templater.
//!
//! - [`Catalog`] describes enquiries, their templates and the queries that
//!   fill them.
//! - [`QueryExecutor`] runs those queries through a [`Connector`], keeping
//!   one session per database.
//! - [`FieldValueStore`] remembers the values users typed into form fields.

pub mod cache;
pub mod catalog;
pub mod connector;
pub mod error;
pub mod executor;
pub mod fields;
pub mod fixture;

pub use cache::SessionFactoryCache;
pub use catalog::{
    Catalog, DatabaseDescriptor, DatabaseId, EnquiryDefinition, EnquiryId, InputFieldDefinition,
    QueryDefinition, TemplateBlock, TemplateDefinition,
};
pub use connector::{ColumnFilter, Connector, ViewSession};
pub use error::{CatalogError, FetchError, FieldStoreError};
pub use executor::{DEFAULT_VIEW_SCHEMA, FilterParams, QueryExecutor};
pub use fields::{FieldValue, FieldValueId, FieldValueStore, InMemoryFieldValues, JsonFieldValues};
pub use fixture::{FixtureConnector, FixtureSession};
