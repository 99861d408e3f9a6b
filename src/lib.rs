pub mod anchoring;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod ledger;
pub mod reconcile;
pub mod report;
pub mod sources;
