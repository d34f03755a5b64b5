use crate::types::SchemeKind;

/// Classify a scheme string into a [`SchemeKind`].
///
/// Uses a perfect hash based on length + first byte to minimize comparisons
/// before falling back to a full byte-slice comparison.
#[must_use]
pub fn classify_scheme(scheme: &str) -> SchemeKind {
    let bytes = scheme.as_bytes();

    match (bytes.len(), bytes.first()) {
        (2, Some(b'w')) if bytes == b"ws" => SchemeKind::Ws,
        (3, Some(b'w')) if bytes == b"wss" => SchemeKind::Wss,
        (3, Some(b'f')) if bytes == b"ftp" => SchemeKind::Ftp,
        (4, Some(b'h')) if bytes == b"http" => SchemeKind::Http,
        (4, Some(b'f')) if bytes == b"file" => SchemeKind::File,
        (5, Some(b'h')) if bytes == b"https" => SchemeKind::Https,
        _ => SchemeKind::Other,
    }
}
