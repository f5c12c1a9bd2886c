//! lsa-recovery: turn an uploaded container into a viewable media file
//!
//! # Overview
//! - `sniff`: ordered magic-signature table and the single routine that walks it
//! - `validate`: structural checks applied to recovered bytes before delivery
//! - `pipeline`: the orchestrator (`Received → … → Delivered`, or `Rejected`)

pub mod pipeline;
pub mod sniff;
pub mod validate;

pub use pipeline::Recoverer;
pub use sniff::{Matcher, SignatureRule, Sniffer, SIGNATURES};
pub use validate::ValidationPolicy;
