/// The special schemes named by the WHATWG URL Standard, plus a catch-all
/// for every other scheme. Drives default-port lookup, authority
/// requirements, and path canonicalization in the surrounding parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum SchemeKind {
    #[default]
    Http,
    Https,
    Ws,
    Wss,
    Ftp,
    File,
    Other,
}

impl SchemeKind {
    /// Is this one of the six special schemes?
    #[must_use]
    pub fn is_special(self) -> bool {
        self != Self::Other
    }

    /// The scheme's default port, or `None` for `file` and every non-special
    /// scheme.
    #[must_use]
    pub fn default_port(self) -> Option<u16> {
        match self {
            Self::Http | Self::Ws => Some(80),
            Self::Https | Self::Wss => Some(443),
            Self::Ftp => Some(21),
            Self::File | Self::Other => None,
        }
    }
}
