//! The `ValidationError` vocabulary and the parser-to-core callback contract.
//!
//! `ValidationError` is data describing a defect the surrounding parser
//! observed while walking its input; it is never returned from a `Result`
//! and never implements `std::error::Error`. The only `Result`-returning
//! error this crate surfaces is [`StorageError`], for the one storage-layer
//! operation that can legitimately fail at a public API boundary rather than
//! trap.
use crate::compat::Vec;

/// The kind of nested host parser a [`ValidationErrorCode::HostParserError`]
/// payload originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostParserErrorKind {
    Ipv4,
    Ipv6,
}

/// An opaque error reported by the (external, out of scope here) IPv4 or
/// IPv6 address parser, lifted into the validation-error vocabulary.
///
/// The concrete error codes belong to whichever IPv4/IPv6 parser this crate
/// is paired with; this crate only needs to carry the code far enough to
/// support equality and the `CollectAll` callback contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostParserError {
    pub kind: HostParserErrorKind,
    pub code: u16,
}

/// A validation error code, covering every defect the WHATWG URL parser can
/// observe while constructing a [`crate::storage::URLStructure`].
///
/// `HostParserError` is the wrapping code: it always carries a payload via
/// [`ValidationError::host_parser_error`], never constructed bare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorCode {
    UnexpectedC0ControlOrSpace,
    UnexpectedAsciiTabOrNewline,
    InvalidSchemeStart,
    FileSchemeMissingSolidus,
    InvalidScheme,
    MissingSchemeNonRelativeUrl,
    RelativeUrlMissingLeadingSolidus,
    UnexpectedReverseSolidus,
    MissingSolidusBeforeAuthority,
    UnexpectedAtSign,
    CredentialsWithoutHost,
    PortWithoutHost,
    EmptyHostSpecialScheme,
    InvalidHost,
    PortOutOfRange,
    InvalidPort,
    UnexpectedWindowsDriveLetter,
    UnexpectedWindowsDriveLetterHost,
    UnexpectedHostFileScheme,
    EmptyPathSegmentFileScheme,
    InvalidUrlCodePoint,
    UnescapedPercentSign,
    Ipv6Unclosed,
    DomainToAsciiFailure,
    DomainToAsciiEmptyDomain,
    ForbiddenHostCodePoint,
    /// Private: a relative reference was given with no base URL to resolve against.
    BaseUrlRequired,
    /// Private: the input bytes were not valid UTF-8.
    InvalidUtf8,
    /// Wraps a nested [`HostParserError`].
    HostParserError,
}

/// A single validation error: a code plus, for [`ValidationErrorCode::HostParserError`],
/// the wrapped payload.
///
/// Equality is componentwise: the code is compared first, and the wrapped
/// payload only when both sides carry one (which is exactly when both codes
/// are `HostParserError`, since every other code always carries `None`).
/// The fields are private so [`Self::new`] and [`Self::host_parser_error`]
/// are the only ways to build one; that is what makes "every other code
/// always carries `None`" a real invariant rather than a convention a caller
/// could violate with a struct literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValidationError {
    code: ValidationErrorCode,
    host_parser_error: Option<HostParserError>,
}

impl ValidationError {
    /// Construct a validation error with no wrapped payload.
    #[must_use]
    pub fn new(code: ValidationErrorCode) -> Self {
        assert!(
            !matches!(code, ValidationErrorCode::HostParserError),
            "HostParserError must be constructed via ValidationError::host_parser_error"
        );
        Self {
            code,
            host_parser_error: None,
        }
    }

    /// Construct a `HostParserError`-wrapping validation error.
    #[must_use]
    pub fn host_parser_error(kind: HostParserErrorKind, code: u16) -> Self {
        Self {
            code: ValidationErrorCode::HostParserError,
            host_parser_error: Some(HostParserError { kind, code }),
        }
    }

    /// This error's code.
    #[must_use]
    pub fn code(&self) -> ValidationErrorCode {
        self.code
    }

    /// The wrapped host-parser payload, present only when [`Self::code`] is
    /// [`ValidationErrorCode::HostParserError`].
    #[must_use]
    pub fn host_parser_error_payload(&self) -> Option<HostParserError> {
        self.host_parser_error
    }
}

impl From<ValidationErrorCode> for ValidationError {
    fn from(code: ValidationErrorCode) -> Self {
        Self::new(code)
    }
}

/// The parser-to-core callback contract: the parser reports every defect it
/// observes through this trait rather than failing outright.
pub trait ValidationErrorHandler {
    fn validation_error(&mut self, error: ValidationError);
}

/// Discards every error. The cheapest possible handler; useful when a caller
/// only wants the parse result and never inspects diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ignore;

impl ValidationErrorHandler for Ignore {
    fn validation_error(&mut self, _error: ValidationError) {}
}

/// Retains only the most recently reported error.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastOnly {
    pub last: Option<ValidationError>,
}

impl ValidationErrorHandler for LastOnly {
    fn validation_error(&mut self, error: ValidationError) {
        self.last = Some(error);
    }
}

/// Appends every reported error to an ordered list, pre-reserving capacity
/// for 8 entries (the common case observed for a single malformed URL).
#[derive(Debug, Clone, Default)]
pub struct CollectAll {
    pub errors: Vec<ValidationError>,
}

impl CollectAll {
    #[must_use]
    pub fn new() -> Self {
        Self {
            errors: Vec::with_capacity(8),
        }
    }
}

impl ValidationErrorHandler for CollectAll {
    fn validation_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }
}

/// Errors the storage layer returns to a caller at a true API boundary,
/// rather than trapping. Distinct from [`ValidationError`]: these are
/// programmer-facing `Result`s, not parser diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// The requested structure's total serialized length does not fit in
    /// the storage's size field (see the capacity non-goal in the crate's
    /// top-level documentation).
    CapacityExceeded,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            Self::CapacityExceeded => "URL exceeds the storage's maximum addressable capacity",
        };
        f.write_str(msg)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StorageError {}

pub type Result<T> = core::result::Result<T, StorageError>;
