//! External system integrations.
//!
//! - [`auth`] - bearer tokens from Azure AD (or a fixed development token)
//! - [`dataverse`] - Dataverse Web API `accounts` source
//! - [`storage`] - durable storage for export artifacts (Azure Blob, local)
//!
//! # Design Pattern
//!
//! Every adapter sits behind a trait ([`auth::TokenSource`],
//! [`dataverse::AccountSource`], [`storage::ArtifactStore`]) so the sweep
//! engine can be exercised with in-memory implementations.
//!
//! ```rust,no_run
//! use account_sweep::adapters::auth::token_source_from_config;
//! use account_sweep::adapters::dataverse::DataverseClient;
//! use account_sweep::adapters::storage::create_artifact_store;
//! use account_sweep::config::load_config;
//! use std::sync::Arc;
//!
//! # fn example() -> account_sweep::domain::Result<()> {
//! let config = load_config(None)?;
//! let tokens = token_source_from_config(&config.identity)?;
//! let source = Arc::new(DataverseClient::new(&config.dataverse, tokens.clone())?);
//! let store = create_artifact_store(&config.storage, tokens)?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod dataverse;
pub mod storage;
