//! Percent-encoding as a lazy transform over byte sequences, parameterised
//! by an [`EncodeSet`] policy value rather than a trait object, so the
//! per-byte branch on `should_escape` stays fully inlined.

use crate::compat::{String, Vec};

const HEX_UPPER: [u8; 16] = *b"0123456789ABCDEF";

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// An encode-set policy: a membership predicate over the ASCII bytes plus an
/// optional substitution and its inverse. A plain value, not a trait object —
/// see the catalogue below for the WHATWG-aligned instances.
#[derive(Clone, Copy)]
pub struct EncodeSet {
    escape: [u64; 2],
    substitute: Option<fn(u8) -> Option<u8>>,
    unsubstitute: Option<fn(u8) -> Option<u8>>,
}

impl EncodeSet {
    const fn empty() -> Self {
        Self {
            escape: [0, 0],
            substitute: None,
            unsubstitute: None,
        }
    }

    const fn full() -> Self {
        Self {
            escape: [u64::MAX, u64::MAX],
            substitute: None,
            unsubstitute: None,
        }
    }

    const fn with(mut self, b: u8) -> Self {
        debug_assert!(b < 128);
        self.escape[(b >> 6) as usize] |= 1 << (b & 63);
        self
    }

    const fn without(mut self, b: u8) -> Self {
        debug_assert!(b < 128);
        self.escape[(b >> 6) as usize] &= !(1 << (b & 63));
        self
    }

    const fn with_substitution(
        mut self,
        substitute: fn(u8) -> Option<u8>,
        unsubstitute: fn(u8) -> Option<u8>,
    ) -> Self {
        self.substitute = Some(substitute);
        self.unsubstitute = Some(unsubstitute);
        self
    }

    /// Does this set escape the ASCII byte `b`? Callers must route non-ASCII
    /// bytes to `PercentEncodedByte` themselves; `should_escape` only
    /// classifies the 0..128 range (see §4.2's definition of `Enc`).
    #[must_use]
    pub fn should_escape(&self, b: u8) -> bool {
        debug_assert!(b < 128);
        (self.escape[(b >> 6) as usize] >> (b & 63)) & 1 != 0
    }

    #[must_use]
    fn substitute(&self, b: u8) -> Option<u8> {
        self.substitute.and_then(|f| f(b))
    }

    #[must_use]
    fn unsubstitute(&self, b: u8) -> Option<u8> {
        self.unsubstitute.and_then(|f| f(b))
    }
}

fn form_substitute(b: u8) -> Option<u8> {
    (b == b' ').then_some(b'+')
}

fn form_unsubstitute(b: u8) -> Option<u8> {
    (b == b'+').then_some(b' ')
}

// The catalogue, built bottom-up exactly as §4.3 defines inheritance: each
// set starts from the one it extends and adds its own bytes.

/// Escapes nothing, substitutes nothing. Used for decoding when the
/// surrounding context has no encode-set of its own to reverse-substitute
/// against (e.g. decoding raw percent-escapes outside any component).
pub const PASSTHROUGH: EncodeSet = EncodeSet::empty();

/// C0 controls (`0x00..=0x1F`) plus DEL (`0x7F`).
pub const C0_CONTROL: EncodeSet = {
    let mut set = EncodeSet::empty();
    let mut i = 0u8;
    while i <= 0x1F {
        set = set.with(i);
        i += 1;
    }
    set.with(0x7F)
};

/// `C0Control` + space, `"`, `<`, `>`, `` ` ``.
pub const FRAGMENT: EncodeSet = C0_CONTROL
    .with(b' ')
    .with(b'"')
    .with(b'<')
    .with(b'>')
    .with(b'`');

/// `C0Control` + space, `"`, `#`, `<`, `>`.
pub const QUERY_NOT_SPECIAL: EncodeSet = C0_CONTROL
    .with(b' ')
    .with(b'"')
    .with(b'#')
    .with(b'<')
    .with(b'>');

/// `Query_NotSpecial` + `'`.
pub const QUERY_SPECIAL: EncodeSet = QUERY_NOT_SPECIAL.with(b'\'');

/// `Fragment` + `?`, `` ` ``, `{`, `}`.
pub const PATH: EncodeSet = FRAGMENT.with(b'?').with(b'`').with(b'{').with(b'}');

/// `Path` + `/`, `:`, `;`, `=`, `@`, `[`, `\`, `]`, `^`, `|`.
pub const USER_INFO: EncodeSet = PATH
    .with(b'/')
    .with(b':')
    .with(b';')
    .with(b'=')
    .with(b'@')
    .with(b'[')
    .with(b'\\')
    .with(b']')
    .with(b'^')
    .with(b'|');

/// `UserInfo` + `$`, `%`, `&`, `+`, `,`.
pub const COMPONENT: EncodeSet = USER_INFO
    .with(b'$')
    .with(b'%')
    .with(b'&')
    .with(b'+')
    .with(b',');

/// Escapes everything except `[A-Z a-z 0-9 * - . _]`; substitutes space with
/// `+` going forward and reverses it on decode. The only encode-set in the
/// catalogue that performs substitution.
pub const FORM_ENCODED: EncodeSet = {
    let mut set = EncodeSet::full();
    let mut i = b'a';
    while i <= b'z' {
        set = set.without(i);
        i += 1;
    }
    let mut i = b'A';
    while i <= b'Z' {
        set = set.without(i);
        i += 1;
    }
    let mut i = b'0';
    while i <= b'9' {
        set = set.without(i);
        i += 1;
    }
    set.without(b'*')
        .without(b'-')
        .without(b'.')
        .without(b'_')
        .with_substitution(form_substitute, form_unsubstitute)
};

/// One group of the lazy encoding sequence `Enc(S, E)` (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncGroup {
    /// Passed through unchanged.
    Source(u8),
    /// Passed through after forward substitution.
    Substituted(u8),
    /// Expands to `%`, then the two uppercase hex nibbles of the byte.
    PercentEncoded(u8),
}

impl EncGroup {
    /// The number of bytes this group expands to: 1, or 3 for `PercentEncoded`.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::PercentEncoded(_) => 3,
            Self::Source(_) | Self::Substituted(_) => 1,
        }
    }

    fn write_into(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), self.len());
        match *self {
            Self::Source(b) | Self::Substituted(b) => out[0] = b,
            Self::PercentEncoded(b) => {
                out[0] = b'%';
                out[1] = HEX_UPPER[(b >> 4) as usize];
                out[2] = HEX_UPPER[(b & 0x0F) as usize];
            }
        }
    }
}

fn classify(b: u8, set: &EncodeSet) -> EncGroup {
    if b >= 0x80 {
        return EncGroup::PercentEncoded(b);
    }
    if let Some(substituted) = set.substitute(b) {
        EncGroup::Substituted(substituted)
    } else if set.should_escape(b) {
        EncGroup::PercentEncoded(b)
    } else {
        EncGroup::Source(b)
    }
}

/// The lazy bidirectional encoding sequence over a byte slice. One source
/// byte always yields exactly one [`EncGroup`], in either iteration
/// direction.
#[derive(Clone)]
pub struct Enc<'a> {
    bytes: core::slice::Iter<'a, u8>,
    set: EncodeSet,
}

impl<'a> Enc<'a> {
    #[must_use]
    pub fn new(bytes: &'a [u8], set: EncodeSet) -> Self {
        Self {
            bytes: bytes.iter(),
            set,
        }
    }
}

impl Iterator for Enc<'_> {
    type Item = EncGroup;

    fn next(&mut self) -> Option<EncGroup> {
        self.bytes.next().map(|&b| classify(b, &self.set))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.bytes.size_hint()
    }
}

impl DoubleEndedIterator for Enc<'_> {
    fn next_back(&mut self) -> Option<EncGroup> {
        self.bytes.next_back().map(|&b| classify(b, &self.set))
    }
}

/// Stack buffer size for the buffered drainers: at least 15 bytes (matching
/// typical small-string inline capacity), rounded up to 16.
const DRAIN_BUFFER_SIZE: usize = 16;

/// Forward buffered drain: flushes `buf` to `sink` whenever the next group
/// would overflow it, so `sink`'s concatenated calls equal `Enc(S, E)`.
/// Returns whether encoding changed anything (any non-`Source` group).
pub fn write_buffered(bytes: &[u8], set: EncodeSet, mut sink: impl FnMut(&[u8])) -> bool {
    let mut buf = [0u8; DRAIN_BUFFER_SIZE];
    let mut len = 0;
    let mut mutated = false;
    for group in Enc::new(bytes, set) {
        let group_len = group.len();
        if len + group_len > buf.len() {
            sink(&buf[..len]);
            len = 0;
        }
        group.write_into(&mut buf[len..len + group_len]);
        len += group_len;
        mutated |= !matches!(group, EncGroup::Source(_));
    }
    if len > 0 {
        sink(&buf[..len]);
    }
    mutated
}

/// Reverse buffered drain: each flushed chunk is internally in forward
/// order, but chunks are produced back-to-front, so the reverse-order
/// concatenation of `sink`'s calls equals `Enc(S, E)`. Returns whether
/// encoding changed anything.
pub fn write_buffered_from_back(bytes: &[u8], set: EncodeSet, mut sink: impl FnMut(&[u8])) -> bool {
    let mut buf = [0u8; DRAIN_BUFFER_SIZE];
    let mut start = buf.len();
    let mut mutated = false;
    for group in Enc::new(bytes, set).rev() {
        let group_len = group.len();
        if start < group_len {
            sink(&buf[start..]);
            start = buf.len();
        }
        start -= group_len;
        group.write_into(&mut buf[start..start + group_len]);
        mutated |= !matches!(group, EncGroup::Source(_));
    }
    if start < buf.len() {
        sink(&buf[start..]);
    }
    mutated
}

/// Encode `input` against `set`, collecting the result into an owned
/// `String`. Convenience wrapper over [`write_buffered`] for callers that
/// don't need to stream.
#[must_use]
pub fn encode_to_string(input: &[u8], set: EncodeSet) -> String {
    let mut out = String::with_capacity(input.len());
    write_buffered(input, set, |chunk| {
        // SAFETY-free: every emitted chunk is ASCII (source bytes are ASCII
        // when not percent-encoded, and percent-encoded/hex bytes are
        // always ASCII), so this is always valid UTF-8.
        out.push_str(core::str::from_utf8(chunk).unwrap_or_default());
    });
    out
}

/// The lazy decoding sequence `Dec(D, E)` (§4.2). Infallible: every byte
/// sequence has a well-defined decoding.
#[derive(Clone)]
pub struct Dec<'a> {
    bytes: &'a [u8],
    pos: usize,
    set: EncodeSet,
}

impl<'a> Dec<'a> {
    #[must_use]
    pub fn new(bytes: &'a [u8], set: EncodeSet) -> Self {
        Self { bytes, pos: 0, set }
    }
}

impl Iterator for Dec<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let b = *self.bytes.get(self.pos)?;
        if b == b'%' {
            if let (Some(&h1), Some(&h2)) = (self.bytes.get(self.pos + 1), self.bytes.get(self.pos + 2)) {
                if let (Some(hi), Some(lo)) = (hex_value(h1), hex_value(h2)) {
                    self.pos += 3;
                    return Some((hi << 4) | lo);
                }
            }
            self.pos += 1;
            return Some(self.set.unsubstitute(b'%').unwrap_or(b'%'));
        }
        self.pos += 1;
        if b < 0x80 {
            Some(self.set.unsubstitute(b).unwrap_or(b))
        } else {
            Some(b)
        }
    }
}

/// Decode `input` against `set` into owned bytes. Infallible at the byte
/// level; see [`decode_utf8`] for the fallible UTF-8-validating wrapper.
#[must_use]
pub fn decode_to_vec(input: &[u8], set: EncodeSet) -> Vec<u8> {
    Dec::new(input, set).collect()
}

#[cfg(feature = "std")]
pub type Utf8Error = std::string::FromUtf8Error;
#[cfg(not(feature = "std"))]
pub type Utf8Error = alloc::string::FromUtf8Error;

/// Decode `input` against `set` and validate the result as UTF-8.
///
/// # Errors
///
/// Returns the underlying UTF-8 validation error if the decoded bytes are
/// not well-formed UTF-8. Percent-decoding itself never fails.
pub fn decode_utf8(input: &[u8], set: EncodeSet) -> Result<String, Utf8Error> {
    String::from_utf8(decode_to_vec(input, set))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_sweep_against_each_catalogue_entry() {
        for b in 0u8..=0x7F {
            let c0 = matches!(b, 0x00..=0x1F | 0x7F);
            assert_eq!(C0_CONTROL.should_escape(b), c0, "C0Control {b:#04x}");

            let fragment = c0 || matches!(b, b' ' | b'"' | b'<' | b'>' | b'`');
            assert_eq!(FRAGMENT.should_escape(b), fragment, "Fragment {b:#04x}");

            let path = fragment || matches!(b, b'?' | b'`' | b'{' | b'}');
            assert_eq!(PATH.should_escape(b), path, "Path {b:#04x}");

            let userinfo = path
                || matches!(
                    b,
                    b'/' | b':' | b';' | b'=' | b'@' | b'[' | b'\\' | b']' | b'^' | b'|'
                );
            assert_eq!(USER_INFO.should_escape(b), userinfo, "UserInfo {b:#04x}");

            let component = userinfo || matches!(b, b'$' | b'%' | b'&' | b'+' | b',');
            assert_eq!(COMPONENT.should_escape(b), component, "Component {b:#04x}");

            let query_not_special = c0 || matches!(b, b' ' | b'"' | b'#' | b'<' | b'>');
            assert_eq!(
                QUERY_NOT_SPECIAL.should_escape(b),
                query_not_special,
                "Query_NotSpecial {b:#04x}"
            );
            assert_eq!(
                QUERY_SPECIAL.should_escape(b),
                query_not_special || b == b'\'',
                "Query_Special {b:#04x}"
            );

            let safe_form = b.is_ascii_alphanumeric() || matches!(b, b'*' | b'-' | b'.' | b'_');
            assert_eq!(FORM_ENCODED.should_escape(b), !safe_form, "FormEncoded {b:#04x}");
        }
    }

    #[test]
    fn scenario_component_comma_space() {
        assert_eq!(encode_to_string(b"hello, world", COMPONENT), "hello%2C%20world");
    }

    #[test]
    fn scenario_form_encoded_plus_and_escape() {
        assert_eq!(
            encode_to_string(b"Swift is better than C++", FORM_ENCODED),
            "Swift+is+better+than+C%2B%2B"
        );
    }

    #[test]
    fn scenario_non_ascii_always_percent_encoded() {
        let input = "✌️".as_bytes();
        assert_eq!(encode_to_string(input, COMPONENT), "%E2%9C%8C%EF%B8%8F");
    }

    #[test]
    fn round_trip_through_component_which_escapes_percent() {
        let input = b"%40 Polyester";
        let encoded = encode_to_string(input, COMPONENT);
        let decoded = decode_to_vec(encoded.as_bytes(), COMPONENT);
        assert_eq!(decoded, input);
    }

    #[test]
    fn decode_falls_back_to_literal_percent() {
        assert_eq!(decode_to_vec(b"100%", PASSTHROUGH), b"100%");
        assert_eq!(decode_to_vec(b"100%X", PASSTHROUGH), b"100%X");
        assert_eq!(decode_to_vec(b"100%2", PASSTHROUGH), b"100%2");
    }

    #[test]
    fn form_encoded_substitution_round_trips() {
        let encoded = encode_to_string(b"a b+c", FORM_ENCODED);
        assert_eq!(encoded, "a+b%2Bc");
        let decoded = decode_to_vec(encoded.as_bytes(), FORM_ENCODED);
        assert_eq!(decoded, b"a b+c");
    }

    #[test]
    fn forward_and_reverse_drains_agree_with_the_lazy_sequence() {
        let input = b"hello, world! \xE2\x9C\x8C";
        let flattened: Vec<u8> = Enc::new(input, COMPONENT)
            .flat_map(|g| {
                let len = g.len();
                let mut tmp = [0u8; 3];
                g.write_into(&mut tmp[..len]);
                tmp.into_iter().take(len).collect::<Vec<_>>()
            })
            .collect();

        let mut forward = Vec::new();
        let forward_mutated = write_buffered(input, COMPONENT, |chunk| forward.extend_from_slice(chunk));

        let mut reverse_chunks = Vec::new();
        let reverse_mutated =
            write_buffered_from_back(input, COMPONENT, |chunk| reverse_chunks.push(chunk.to_vec()));
        let mut reverse = Vec::new();
        for chunk in reverse_chunks.into_iter().rev() {
            reverse.extend_from_slice(&chunk);
        }

        assert_eq!(forward, flattened);
        assert_eq!(reverse, flattened);
        assert_eq!(forward_mutated, reverse_mutated);
        assert!(forward_mutated);
    }

    #[test]
    fn unsubstitute_inverts_substitute_where_defined() {
        assert_eq!(form_substitute(b' '), Some(b'+'));
        assert_eq!(form_unsubstitute(form_substitute(b' ').unwrap()), Some(b' '));
    }
}
