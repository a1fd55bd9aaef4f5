//! Trust resolution for Decentralized Identifiers and W3C Verifiable
//! Credentials against configured Verifiable Public Registries.
//!
//! The public surface is three entry points on [`engine`]:
//! [`engine::resolve_did`], [`engine::resolve_credential`], and
//! [`engine::verify_permissions`]. Everything else in this crate exists to
//! support those three calls: DID resolution ([`resolver`]), JSON-LD context
//! loading ([`loader`]), Data Integrity proof verification ([`proof`]),
//! schema classification ([`schema`]), registry/permission lookups
//! ([`registry`], [`permission`]), and credential processing
//! ([`credential`]).

pub mod core;
pub mod credential;
pub mod engine;
pub mod error;
pub mod hash;
pub mod loader;
pub mod model;
pub mod permission;
pub mod proof;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod sri;

pub use engine::{resolve_credential, resolve_did, verify_permissions, ResolverConfig};
pub use error::{Result, TrustError};
pub use model::{
    CredentialSchema, DidDocument, IssuerObject, Proof, Service, VerifiableCredential,
    VerifiablePresentation, VerificationMethod,
};
