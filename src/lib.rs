//! Claim Machinery
//!
//! Catalogs claim templates (a renderable KCL artifact plus its parameter
//! schema) and renders them into configuration documents.
//!
//! Pipeline: [`claim_template::loader`] + [`profile`] → [`catalog`] →
//! [`params`] → [`render`].

pub mod catalog;
pub mod claim_template;
pub mod config;
pub mod display;
pub mod params;
pub mod profile;
pub mod render;

#[cfg(feature = "server")]
pub mod api;

pub use catalog::{Catalog, CatalogBuild, CatalogError};
pub use claim_template::{ClaimTemplate, ParamType, Parameter, TemplateError};
pub use params::{resolve_parameters, ParamMap};
pub use render::{render_template, ClaimRenderer, KclRenderer, RenderError};
