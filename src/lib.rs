//! The normalized storage, percent-encoding, and validation-error
//! primitives that sit underneath a WHATWG URL parser: a compact
//! offset/length representation of a URL's components, a pluggable
//! percent-encoding engine, code-point classification tables, and the
//! `ValidationError` vocabulary a parser reports through.
//!
//! This crate does not parse URLs. There is no `Url` type, no state
//! machine, and no host/IPv4/IPv6 parsing here — see the crate-level
//! design notes in the repository for what layers above this one own.
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Compatibility layer for std/no_std.
mod compat;

mod character_sets;
mod error;
mod percent_encode;
mod scheme;
mod storage;
mod types;

pub use character_sets::{
    has_non_url_code_points, is_ascii_tab_or_newline, is_forbidden_host_code_point, is_url_code_point,
};
pub use error::{
    CollectAll, HostParserError, HostParserErrorKind, Ignore, LastOnly, Result, StorageError, ValidationError,
    ValidationErrorCode, ValidationErrorHandler,
};
pub use percent_encode::{
    decode_to_vec, decode_utf8, encode_to_string, write_buffered, write_buffered_from_back, Dec, Enc, EncGroup,
    EncodeSet, Utf8Error, COMPONENT, C0_CONTROL, FORM_ENCODED, FRAGMENT, PASSTHROUGH, PATH, QUERY_NOT_SPECIAL,
    QUERY_SPECIAL, USER_INFO,
};
pub use scheme::classify_scheme;
pub use storage::{
    AuthorityLengths, HeaderVariant, ReplaceCommand, Sigil, URLStructure, UrlComponent, UrlStorage,
};
pub use types::SchemeKind;
