// crates/erosita-xref-providers/src/lib.rs
// ============================================================================
// Module: eROSITA XREF Providers
// Description: Remote catalog clients for cone-search services.
// Purpose: Implement RemoteCatalogClient over IVOA TAP endpoints.
// Dependencies: erosita-xref-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! NED and SIMBAD both expose synchronous TAP endpoints. [`TapCatalogClient`]
//! issues an ADQL cone search against one of them and classifies the outcome
//! into the engine's [`erosita_xref_core::RemoteError`] taxonomy.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod tap;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use tap::TapCatalogClient;
pub use tap::TapClientConfig;
pub use tap::TapClientError;
pub use tap::cone_search_adql;
pub use tap::parse_tap_json;
