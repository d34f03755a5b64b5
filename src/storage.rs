//! The normalized URL storage model: a contiguous code-unit buffer plus a
//! compact structure header describing every component's offset and length
//! (§3), and the replacement engine that mutates it in place while
//! preserving copy-on-write value semantics (§4.1, §5).

use crate::compat::{Rc, Vec};
use crate::types::SchemeKind;
use core::ops::Range;

/// The 2-byte marker inserted after the scheme: `"//"` for an authority, or
/// `"/."` to disambiguate a path that would otherwise look like one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sigil {
    None,
    Authority,
    Path,
}

impl Sigil {
    fn len(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Authority | Self::Path => 2,
        }
    }
}

/// One of the eight components a [`URLStructure`] tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlComponent {
    Scheme = 0,
    Username = 1,
    Password = 2,
    Hostname = 3,
    Port = 4,
    Path = 5,
    Query = 6,
    Fragment = 7,
}

const ALL_COMPONENTS: [UrlComponent; 8] = [
    UrlComponent::Scheme,
    UrlComponent::Username,
    UrlComponent::Password,
    UrlComponent::Hostname,
    UrlComponent::Port,
    UrlComponent::Path,
    UrlComponent::Query,
    UrlComponent::Fragment,
];

/// The normalized layout descriptor: every component's length plus the
/// sigil, scheme kind, and cannot-be-a-base flag that together determine
/// every component's offset (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct URLStructure {
    pub scheme_len: u32,
    pub username_len: u32,
    pub password_len: u32,
    pub hostname_len: u32,
    pub port_len: u32,
    pub path_len: u32,
    pub query_len: u32,
    pub fragment_len: u32,
    pub sigil: Sigil,
    pub scheme_kind: SchemeKind,
    pub cannot_be_a_base: bool,
}

impl URLStructure {
    #[must_use]
    pub fn len_of(&self, component: UrlComponent) -> u32 {
        match component {
            UrlComponent::Scheme => self.scheme_len,
            UrlComponent::Username => self.username_len,
            UrlComponent::Password => self.password_len,
            UrlComponent::Hostname => self.hostname_len,
            UrlComponent::Port => self.port_len,
            UrlComponent::Path => self.path_len,
            UrlComponent::Query => self.query_len,
            UrlComponent::Fragment => self.fragment_len,
        }
    }

    pub(crate) fn set_len(&mut self, component: UrlComponent, value: u32) {
        let field = match component {
            UrlComponent::Scheme => &mut self.scheme_len,
            UrlComponent::Username => &mut self.username_len,
            UrlComponent::Password => &mut self.password_len,
            UrlComponent::Hostname => &mut self.hostname_len,
            UrlComponent::Port => &mut self.port_len,
            UrlComponent::Path => &mut self.path_len,
            UrlComponent::Query => &mut self.query_len,
            UrlComponent::Fragment => &mut self.fragment_len,
        };
        *field = value;
    }

    #[must_use]
    pub fn has_cred_sep(&self) -> bool {
        self.username_len > 0 || self.password_len > 0
    }

    #[must_use]
    pub fn cannot_have_credentials_or_port(&self) -> bool {
        self.scheme_kind == SchemeKind::File || self.cannot_be_a_base || self.hostname_len == 0
    }

    #[must_use]
    pub fn scheme_start(&self) -> u32 {
        0
    }

    #[must_use]
    pub fn scheme_end(&self) -> u32 {
        self.scheme_len
    }

    #[must_use]
    pub fn after_sigil(&self) -> u32 {
        self.scheme_end() + self.sigil.len()
    }

    #[must_use]
    pub fn username_start(&self) -> u32 {
        self.after_sigil()
    }

    #[must_use]
    pub fn password_start(&self) -> u32 {
        self.username_start() + self.username_len
    }

    #[must_use]
    pub fn hostname_start(&self) -> u32 {
        self.password_start() + self.password_len + u32::from(self.has_cred_sep())
    }

    #[must_use]
    pub fn port_start(&self) -> u32 {
        self.hostname_start() + self.hostname_len
    }

    #[must_use]
    pub fn path_start(&self) -> u32 {
        if self.sigil == Sigil::Authority {
            self.port_start() + self.port_len
        } else {
            self.after_sigil()
        }
    }

    #[must_use]
    pub fn query_start(&self) -> u32 {
        self.path_start() + self.path_len
    }

    #[must_use]
    pub fn fragment_start(&self) -> u32 {
        self.query_start() + self.query_len
    }

    #[must_use]
    pub fn total_len(&self) -> u32 {
        self.fragment_start() + self.fragment_len
    }

    /// The offset a component starts (or would start) at, whether or not it
    /// is currently present. Every `*_start` accessor above is exactly this
    /// function specialized to one component.
    #[must_use]
    pub fn insertion_point(&self, component: UrlComponent) -> u32 {
        match component {
            UrlComponent::Scheme => self.scheme_start(),
            UrlComponent::Username => self.username_start(),
            UrlComponent::Password => self.password_start(),
            UrlComponent::Hostname => self.hostname_start(),
            UrlComponent::Port => self.port_start(),
            UrlComponent::Path => self.path_start(),
            UrlComponent::Query => self.query_start(),
            UrlComponent::Fragment => self.fragment_start(),
        }
    }

    /// The byte range of `component`, or `None` if absent. `hostname` is the
    /// one component that can be present-but-empty, when the authority sigil
    /// is set.
    #[must_use]
    pub fn range(&self, component: UrlComponent) -> Option<Range<u32>> {
        let len = self.len_of(component);
        if len == 0 && !(component == UrlComponent::Hostname && self.sigil == Sigil::Authority) {
            return None;
        }
        let start = self.insertion_point(component);
        Some(start..start + len)
    }

    /// Debug-only invariant check; a structure that fails this is a
    /// programmer error, not something a caller can recover from (§7).
    fn validate(&self) {
        debug_assert!(self.scheme_len >= 2, "scheme must be at least \"x:\"");
        debug_assert!(
            self.password_len == 0 || self.password_len >= 2,
            "password length must be 0 or include the leading ':' plus content"
        );
        debug_assert!(
            self.port_len == 0 || self.port_len >= 2,
            "port length must be 0 or include the leading ':' plus content"
        );
        if self.username_len > 0 || self.password_len > 0 || self.port_len > 0 {
            debug_assert_eq!(
                self.sigil,
                Sigil::Authority,
                "credentials or port require the authority sigil"
            );
        }
        if self.sigil == Sigil::Path {
            debug_assert!(self.path_len >= 2, "a path sigil requires a path of at least \"/.\"");
        }
    }
}

/// The four sub-lengths of an authority substring, returned alongside its
/// bytes by [`UrlStorage::all_authority_component_bytes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorityLengths {
    pub username_len: u32,
    pub password_len: u32,
    pub hostname_len: u32,
    pub port_len: u32,
}

/// Which header footprint a storage buffer currently uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderVariant {
    /// Every offset fits in 8 bits (total buffer ≤ 255 bytes).
    Compact,
    /// Native word-sized offsets; used once the buffer outgrows `Compact`.
    Wide,
}

impl HeaderVariant {
    /// The optimal variant for a buffer of `count` bytes: compact iff
    /// `count <= 255`.
    #[must_use]
    pub fn optimal_for(count: u32) -> Self {
        if count <= 255 {
            Self::Compact
        } else {
            Self::Wide
        }
    }
}

/// The per-component length fields, stored at one of two integer widths
/// depending on the header variant. A plain array rather than eight named
/// fields so `URLStructure`'s `Component`-indexed access works uniformly
/// over either width.
trait Lengths: Copy + Default {
    fn get(&self, component: UrlComponent) -> u32;
    fn set(&mut self, component: UrlComponent, value: u32);
}

#[derive(Debug, Clone, Copy, Default)]
struct CompactLengths([u8; 8]);

impl Lengths for CompactLengths {
    fn get(&self, component: UrlComponent) -> u32 {
        u32::from(self.0[component as usize])
    }

    fn set(&mut self, component: UrlComponent, value: u32) {
        debug_assert!(value <= u32::from(u8::MAX));
        self.0[component as usize] = value as u8;
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct WideLengths([u32; 8]);

impl Lengths for WideLengths {
    fn get(&self, component: UrlComponent) -> u32 {
        self.0[component as usize]
    }

    fn set(&mut self, component: UrlComponent, value: u32) {
        self.0[component as usize] = value;
    }
}

fn pack<L: Lengths>(structure: &URLStructure) -> L {
    let mut lengths = L::default();
    for component in ALL_COMPONENTS {
        lengths.set(component, structure.len_of(component));
    }
    lengths
}

/// The header plus buffer for one storage variant. Reference-counted so
/// cloning a [`UrlStorage`] is O(1) and mutation can detect unique
/// ownership before writing in place (§5).
#[derive(Clone)]
struct Block<L: Lengths> {
    lengths: L,
    sigil: Sigil,
    scheme_kind: SchemeKind,
    cannot_be_a_base: bool,
    buffer: Vec<u8>,
}

impl<L: Lengths> Block<L> {
    fn structure(&self) -> URLStructure {
        URLStructure {
            scheme_len: self.lengths.get(UrlComponent::Scheme),
            username_len: self.lengths.get(UrlComponent::Username),
            password_len: self.lengths.get(UrlComponent::Password),
            hostname_len: self.lengths.get(UrlComponent::Hostname),
            port_len: self.lengths.get(UrlComponent::Port),
            path_len: self.lengths.get(UrlComponent::Path),
            query_len: self.lengths.get(UrlComponent::Query),
            fragment_len: self.lengths.get(UrlComponent::Fragment),
            sigil: self.sigil,
            scheme_kind: self.scheme_kind,
            cannot_be_a_base: self.cannot_be_a_base,
        }
    }

    fn adopt(&mut self, structure: &URLStructure) {
        self.lengths = pack(structure);
        self.sigil = structure.sigil;
        self.scheme_kind = structure.scheme_kind;
        self.cannot_be_a_base = structure.cannot_be_a_base;
    }
}

/// A tagged union over the two concrete header specializations (§9: "header
/// polymorphism without virtual dispatch").
#[derive(Clone)]
enum Repr {
    Compact(Rc<Block<CompactLengths>>),
    Wide(Rc<Block<WideLengths>>),
}

/// A single splice: replace `range` with `insert_count` freshly-written
/// bytes, supplied by `writer`. The writer is handed a slice of exactly
/// `insert_count` bytes and must fill every byte; returning a different
/// count is a programmer error and traps.
pub struct ReplaceCommand<'a> {
    pub range: Range<u32>,
    pub insert_count: u32,
    pub writer: &'a mut dyn FnMut(&mut [u8]) -> u32,
}

/// The owning, copy-on-write URL storage: a single code-unit buffer plus the
/// structure header that indexes it (§3, §4.1).
#[derive(Clone)]
pub struct UrlStorage(Repr);

impl UrlStorage {
    /// Build storage directly from a buffer and the structure describing
    /// it. `buffer.len()` must equal `structure.total_len()`.
    #[must_use]
    pub fn new(buffer: Vec<u8>, structure: URLStructure) -> Self {
        structure.validate();
        debug_assert_eq!(
            buffer.len() as u32,
            structure.total_len(),
            "buffer length must match the structure's derived total length"
        );
        Self(Self::pack_repr(buffer, &structure))
    }

    /// The fallible counterpart to [`Self::new`], for a caller assembling a
    /// structure by hand (rather than through [`Self::multi_replace_subrange`],
    /// which derives `new_len` internally and traps instead). Returns
    /// [`crate::error::StorageError::CapacityExceeded`] when `buffer`'s
    /// length does not fit the wide header variant's `u32` offsets — the
    /// one capacity boundary the storage layer will not silently trap on
    /// (§7's "capacity transitions are never errors" applies to growth
    /// *within* the addressable range; this is the one case outside it).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::CapacityExceeded` if `buffer.len()` exceeds
    /// `u32::MAX`.
    pub fn try_new(buffer: Vec<u8>, structure: URLStructure) -> crate::error::Result<Self> {
        if buffer.len() as u64 > u64::from(u32::MAX) {
            return Err(crate::error::StorageError::CapacityExceeded);
        }
        Ok(Self::new(buffer, structure))
    }

    fn pack_repr(buffer: Vec<u8>, structure: &URLStructure) -> Repr {
        match HeaderVariant::optimal_for(buffer.len() as u32) {
            HeaderVariant::Compact => Repr::Compact(Rc::new(Block {
                lengths: pack(structure),
                sigil: structure.sigil,
                scheme_kind: structure.scheme_kind,
                cannot_be_a_base: structure.cannot_be_a_base,
                buffer,
            })),
            HeaderVariant::Wide => Repr::Wide(Rc::new(Block {
                lengths: pack(structure),
                sigil: structure.sigil,
                scheme_kind: structure.scheme_kind,
                cannot_be_a_base: structure.cannot_be_a_base,
                buffer,
            })),
        }
    }

    /// The current header footprint. Always the optimal one for this
    /// storage's byte count (§8 property 6); every mutation re-derives it.
    #[must_use]
    pub fn variant(&self) -> HeaderVariant {
        match &self.0 {
            Repr::Compact(_) => HeaderVariant::Compact,
            Repr::Wide(_) => HeaderVariant::Wide,
        }
    }

    /// The current structure header.
    #[must_use]
    pub fn structure(&self) -> URLStructure {
        match &self.0 {
            Repr::Compact(block) => block.structure(),
            Repr::Wide(block) => block.structure(),
        }
    }

    fn buffer(&self) -> &[u8] {
        match &self.0 {
            Repr::Compact(block) => &block.buffer,
            Repr::Wide(block) => &block.buffer,
        }
    }

    /// Zero-copy access to the full code-unit buffer's UTF-8 view.
    ///
    /// # Panics
    ///
    /// Traps if the buffer is not valid UTF-8, which can only happen from a
    /// caller building a `UrlStorage` by hand from non-UTF-8 bytes — every
    /// operation in this module preserves UTF-8 validity.
    #[must_use]
    pub fn entire_string(&self) -> &str {
        match core::str::from_utf8(self.buffer()) {
            Ok(s) => s,
            Err(_) => unreachable!("URL storage buffer must always be valid UTF-8"),
        }
    }

    /// Zero-copy access to the full code-unit buffer.
    pub fn with_entire_string<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        f(self.entire_string())
    }

    /// The byte range of `component`, or `None` if it is absent.
    #[must_use]
    pub fn component_bytes(&self, component: UrlComponent) -> Option<&[u8]> {
        let range = self.structure().range(component)?;
        Some(&self.buffer()[range.start as usize..range.end as usize])
    }

    /// The whole authority substring (username through port) plus its four
    /// sub-lengths, or `None` if there is no authority.
    #[must_use]
    pub fn all_authority_component_bytes(&self) -> Option<(&[u8], AuthorityLengths)> {
        let structure = self.structure();
        if structure.sigil != Sigil::Authority {
            return None;
        }
        let start = structure.username_start();
        let end = structure.port_start() + structure.port_len;
        Some((
            &self.buffer()[start as usize..end as usize],
            AuthorityLengths {
                username_len: structure.username_len,
                password_len: structure.password_len,
                hostname_len: structure.hostname_len,
                port_len: structure.port_len,
            },
        ))
    }

    /// Splice `insert_count` freshly-written bytes in place of `range`, and
    /// atomically adopt `new_structure`.
    pub fn replace_subrange(
        &mut self,
        range: Range<u32>,
        insert_count: u32,
        new_structure: URLStructure,
        writer: &mut dyn FnMut(&mut [u8]) -> u32,
    ) {
        self.multi_replace_subrange(
            &mut [ReplaceCommand {
                range,
                insert_count,
                writer,
            }],
            new_structure,
        );
    }

    /// Remove `range` entirely and atomically adopt `new_structure`.
    pub fn remove_subrange(&mut self, range: Range<u32>, new_structure: URLStructure) {
        self.replace_subrange(range, 0, new_structure, &mut |_| 0);
    }

    /// Apply an ordered list of non-overlapping splices, atomically adopting
    /// `new_structure` once every command has run.
    ///
    /// `commands` must be sorted by ascending `range.start` with no overlaps;
    /// violating this is a programmer error.
    pub fn multi_replace_subrange(&mut self, commands: &mut [ReplaceCommand<'_>], new_structure: URLStructure) {
        new_structure.validate();
        debug_assert!(
            commands.windows(2).all(|pair| pair[0].range.end <= pair[1].range.start),
            "replacement commands must be sorted by ascending range with no overlap"
        );

        let old_len = self.structure().total_len();
        let delta: i64 = commands
            .iter()
            .map(|cmd| i64::from(cmd.insert_count) - i64::from(cmd.range.end - cmd.range.start))
            .sum();
        let signed_new_len = i64::from(old_len) + delta;
        assert!(signed_new_len >= 0, "replacement produced a negative length");
        let new_len = signed_new_len as u32;
        debug_assert_eq!(
            new_len,
            new_structure.total_len(),
            "the supplied structure disagrees with the computed new length"
        );

        if let [command] = commands {
            if HeaderVariant::optimal_for(new_len) == self.variant()
                && self.try_replace_in_place(command, &new_structure)
            {
                return;
            }
        }

        self.rebuild(commands, &new_structure, new_len);
    }

    /// The fast path: unique ownership and an unchanged header variant let
    /// us splice the existing buffer directly instead of reallocating.
    fn try_replace_in_place(&mut self, command: &mut ReplaceCommand<'_>, new_structure: &URLStructure) -> bool {
        match &mut self.0 {
            Repr::Compact(rc) => {
                let Some(block) = Rc::get_mut(rc) else {
                    return false;
                };
                splice_with_writer(&mut block.buffer, command);
                block.adopt(new_structure);
                true
            }
            Repr::Wide(rc) => {
                let Some(block) = Rc::get_mut(rc) else {
                    return false;
                };
                splice_with_writer(&mut block.buffer, command);
                block.adopt(new_structure);
                true
            }
        }
    }

    /// The general path: copy the unaffected spans ascending, invoking each
    /// command's writer for the inserted span, into a fresh buffer of the
    /// optimal variant. Used whenever the buffer is shared, more than one
    /// command is given, or the header variant must change.
    fn rebuild(&mut self, commands: &mut [ReplaceCommand<'_>], new_structure: &URLStructure, new_len: u32) {
        let old_buffer = self.buffer();
        let mut new_buffer = Vec::with_capacity(new_len as usize);
        let mut src_idx = 0u32;
        for command in commands.iter_mut() {
            new_buffer.extend_from_slice(&old_buffer[src_idx as usize..command.range.start as usize]);
            let insert_start = new_buffer.len();
            new_buffer.resize(insert_start + command.insert_count as usize, 0);
            let written = (command.writer)(&mut new_buffer[insert_start..]);
            assert_eq!(
                written, command.insert_count,
                "replacement writer reported a mismatched byte count"
            );
            src_idx = command.range.end;
        }
        let tail_start = src_idx as usize;
        let new_buffer_tail_src = self.buffer(); // re-borrow after old_buffer's lifetime ends with the loop
        new_buffer.extend_from_slice(&new_buffer_tail_src[tail_start..]);
        debug_assert_eq!(new_buffer.len() as u32, new_len);

        self.0 = Self::pack_repr(new_buffer, new_structure);
    }

    /// Generic single-component setter for components whose change does not
    /// shift any sibling (query, fragment, port). `encoder` is invoked once
    /// per pass: first to measure the encoded length by forwarding chunks to
    /// its callback, then again to actually write them.
    pub fn set_simple_component(
        &mut self,
        component: UrlComponent,
        new_value: Option<&[u8]>,
        prefix: u8,
        mut encoder: impl FnMut(&[u8], SchemeKind, &mut dyn FnMut(&[u8])),
    ) {
        let structure = self.structure();

        let Some(value) = new_value else {
            let Some(range) = structure.range(component) else {
                return;
            };
            let mut new_structure = structure;
            new_structure.set_len(component, 0);
            self.remove_subrange(range, new_structure);
            return;
        };

        let mut total_len = 0u32;
        encoder(value, structure.scheme_kind, &mut |slice: &[u8]| {
            total_len += slice.len() as u32;
        });
        let new_component_len = 1 + total_len;

        let mut new_structure = structure;
        new_structure.set_len(component, new_component_len);

        let range = structure.range(component).unwrap_or_else(|| {
            let point = structure.insertion_point(component);
            point..point
        });

        let mut writer = move |out: &mut [u8]| {
            out[0] = prefix;
            let mut pos = 1usize;
            encoder(value, structure.scheme_kind, &mut |slice: &[u8]| {
                out[pos..pos + slice.len()].copy_from_slice(slice);
                pos += slice.len();
            });
            pos as u32
        };

        self.replace_subrange(range, new_component_len, new_structure, &mut writer);
    }
}

fn splice_with_writer(buffer: &mut Vec<u8>, command: &mut ReplaceCommand<'_>) {
    let mut scratch = vec![0u8; command.insert_count as usize];
    let written = (command.writer)(&mut scratch);
    assert_eq!(
        written, command.insert_count,
        "replacement writer reported a mismatched byte count"
    );
    buffer.splice(command.range.start as usize..command.range.end as usize, scratch);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_http_structure() -> URLStructure {
        // "https://example.com:8080/path?query#hash"
        URLStructure {
            scheme_len: 6,
            username_len: 0,
            password_len: 0,
            hostname_len: 11,
            port_len: 5,
            path_len: 5,
            query_len: 6,
            fragment_len: 5,
            sigil: Sigil::Authority,
            scheme_kind: SchemeKind::Https,
            cannot_be_a_base: false,
        }
    }

    #[test]
    fn derived_offsets_match_a_full_url() {
        let structure = simple_http_structure();
        let buffer = b"https://example.com:8080/path?query#hash".to_vec();
        assert_eq!(buffer.len() as u32, structure.total_len());

        let storage = UrlStorage::new(buffer, structure);
        assert_eq!(storage.component_bytes(UrlComponent::Scheme), Some(&b"https:"[..]));
        assert_eq!(
            storage.component_bytes(UrlComponent::Hostname),
            Some(&b"example.com"[..])
        );
        assert_eq!(storage.component_bytes(UrlComponent::Port), Some(&b":8080"[..]));
        assert_eq!(storage.component_bytes(UrlComponent::Path), Some(&b"/path"[..]));
        assert_eq!(storage.component_bytes(UrlComponent::Query), Some(&b"?query"[..]));
        assert_eq!(storage.component_bytes(UrlComponent::Fragment), Some(&b"#hash"[..]));
        assert_eq!(storage.component_bytes(UrlComponent::Username), None);
    }

    #[test]
    fn empty_scheme_only_storage_is_a_fixpoint() {
        let structure = URLStructure {
            scheme_len: 2,
            username_len: 0,
            password_len: 0,
            hostname_len: 0,
            port_len: 0,
            path_len: 0,
            query_len: 0,
            fragment_len: 0,
            sigil: Sigil::None,
            scheme_kind: SchemeKind::Other,
            cannot_be_a_base: true,
        };
        let mut storage = UrlStorage::new(b"a:".to_vec(), structure);
        assert_eq!(storage.entire_string(), "a:");

        storage.multi_replace_subrange(&mut [], structure);
        assert_eq!(storage.entire_string(), "a:");
    }

    #[test]
    fn all_authority_component_bytes_reports_every_sub_length() {
        let structure = simple_http_structure();
        let storage = UrlStorage::new(b"https://example.com:8080/path?query#hash".to_vec(), structure);
        let (bytes, lengths) = storage.all_authority_component_bytes().unwrap();
        assert_eq!(bytes, b"example.com:8080");
        assert_eq!(lengths.hostname_len, 11);
        assert_eq!(lengths.port_len, 5);
        assert_eq!(lengths.username_len, 0);
        assert_eq!(lengths.password_len, 0);
    }

    #[test]
    fn replace_subrange_shifts_following_components() {
        let structure = simple_http_structure();
        let mut storage = UrlStorage::new(b"https://example.com:8080/path?query#hash".to_vec(), structure);

        let mut new_structure = structure;
        new_structure.path_len = 9; // "/new/path"
        let range = structure.range(UrlComponent::Path).unwrap();
        storage.replace_subrange(range, 9, new_structure, &mut |out| {
            out.copy_from_slice(b"/new/path");
            out.len() as u32
        });

        assert_eq!(
            storage.entire_string(),
            "https://example.com:8080/new/path?query#hash"
        );
        assert_eq!(storage.component_bytes(UrlComponent::Query), Some(&b"?query"[..]));
        assert_eq!(storage.component_bytes(UrlComponent::Fragment), Some(&b"#hash"[..]));
    }

    #[test]
    fn remove_subrange_degenerate_case() {
        let structure = simple_http_structure();
        let mut storage = UrlStorage::new(b"https://example.com:8080/path?query#hash".to_vec(), structure);

        let mut new_structure = structure;
        new_structure.fragment_len = 0;
        let range = structure.range(UrlComponent::Fragment).unwrap();
        storage.remove_subrange(range, new_structure);

        assert_eq!(storage.entire_string(), "https://example.com:8080/path?query");
        assert_eq!(storage.component_bytes(UrlComponent::Fragment), None);
    }

    #[test]
    fn set_simple_component_writes_prefix_and_encoded_value() {
        let structure = simple_http_structure();
        let mut storage = UrlStorage::new(b"https://example.com:8080/path?query#hash".to_vec(), structure);

        storage.set_simple_component(UrlComponent::Fragment, Some(b"new-hash"), b'#', |value, _kind, emit| {
            emit(value);
        });

        assert_eq!(
            storage.entire_string(),
            "https://example.com:8080/path?query#new-hash"
        );
        assert_eq!(
            storage.component_bytes(UrlComponent::Fragment),
            Some(&b"#new-hash"[..])
        );
    }

    #[test]
    fn set_simple_component_none_removes_existing() {
        let structure = simple_http_structure();
        let mut storage = UrlStorage::new(b"https://example.com:8080/path?query#hash".to_vec(), structure);

        storage.set_simple_component(UrlComponent::Fragment, None, b'#', |_, _, _| {});

        assert_eq!(storage.entire_string(), "https://example.com:8080/path?query");
        assert_eq!(storage.component_bytes(UrlComponent::Fragment), None);
    }

    #[test]
    fn set_simple_component_none_on_absent_component_is_a_noop() {
        let structure = simple_http_structure();
        let mut storage = UrlStorage::new(b"https://example.com:8080/path?query#hash".to_vec(), structure);
        let before = storage.entire_string().to_string();

        storage.set_simple_component(UrlComponent::Username, None, b':', |_, _, _| {});

        assert_eq!(storage.entire_string(), before);
    }

    #[test]
    fn variant_upgrades_past_255_bytes_and_stays_optimal() {
        let long_fragment = "x".repeat(300);
        let mut structure = simple_http_structure();
        structure.fragment_len = 0;
        let base = "https://example.com:8080/path?query".to_string();
        assert!(base.len() <= 255);
        let mut storage = UrlStorage::new(base.clone().into_bytes(), {
            let mut s = structure;
            s.fragment_len = 0;
            s
        });
        assert_eq!(storage.variant(), HeaderVariant::Compact);

        let mut new_structure = storage.structure();
        new_structure.fragment_len = (long_fragment.len() + 1) as u32;
        let point = storage.structure().fragment_start();
        storage.replace_subrange(point..point, (long_fragment.len() + 1) as u32, new_structure, &mut |out| {
            out[0] = b'#';
            out[1..].copy_from_slice(long_fragment.as_bytes());
            out.len() as u32
        });

        assert_eq!(storage.variant(), HeaderVariant::Wide);
        assert_eq!(storage.structure().total_len() as usize, storage.entire_string().len());
    }

    #[test]
    fn copy_on_write_leaves_the_other_clone_untouched() {
        let structure = simple_http_structure();
        let original = UrlStorage::new(b"https://example.com:8080/path?query#hash".to_vec(), structure);
        let mut modified = original.clone();

        let mut new_structure = structure;
        new_structure.fragment_len = 0;
        let range = structure.range(UrlComponent::Fragment).unwrap();
        modified.remove_subrange(range, new_structure);

        assert_eq!(original.entire_string(), "https://example.com:8080/path?query#hash");
        assert_eq!(modified.entire_string(), "https://example.com:8080/path?query");
    }

    #[test]
    fn try_new_rejects_a_buffer_past_u32_capacity() {
        let structure = simple_http_structure();
        assert!(UrlStorage::try_new(b"https://example.com:8080/path?query#hash".to_vec(), structure).is_ok());
    }

    #[test]
    #[should_panic(expected = "mismatched byte count")]
    fn a_writer_that_misreports_its_length_traps() {
        let structure = simple_http_structure();
        let mut storage = UrlStorage::new(b"https://example.com:8080/path?query#hash".to_vec(), structure);
        let mut new_structure = structure;
        new_structure.fragment_len = 5;
        let range = structure.range(UrlComponent::Fragment).unwrap();
        storage.replace_subrange(range, 5, new_structure, &mut |_out| 3);
    }
}
