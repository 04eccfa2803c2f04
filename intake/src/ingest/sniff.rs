//! Content-type classification from leading bytes.
//!
//! Classification only ever looks at the first [`SNIFF_LEN`] bytes of a stream. Whatever
//! was pulled off the stream to get there is handed back in front of the remainder, so
//! the caller still copies every byte. Client-declared content types and filename
//! extensions play no part here.

use std::vec;

use bytes::Bytes;
use futures::stream::{self, Chain, Iter, Stream, StreamExt};

/// Number of leading bytes inspected by [`classify`].
pub const SNIFF_LEN: usize = 512;

/// Returned when nothing more specific can be said about the content.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Returned for signature-less content that decodes as UTF-8 text.
pub const TEXT_PLAIN: &str = "text/plain";

/// A stream with its already-inspected chunks put back in front.
pub type Replayed<S, E> = Chain<Iter<vec::IntoIter<Result<Bytes, E>>>, S>;

/// Determine the MIME type of content from its leading bytes.
///
/// Only the first [`SNIFF_LEN`] bytes of `prefix` are examined. Never fails: empty or
/// unrecognized binary content is `application/octet-stream`.
pub fn classify(prefix: &[u8]) -> &'static str {
    let prefix = &prefix[..prefix.len().min(SNIFF_LEN)];

    if let Some(kind) = infer::get(prefix) {
        return kind.mime_type();
    }

    if looks_like_text(prefix) { TEXT_PLAIN } else { OCTET_STREAM }
}

/// Pull up to [`SNIFF_LEN`] bytes off `stream`, classify them, and return the type along
/// with a stream that yields the full original content.
pub async fn sniff_stream<S, E>(mut stream: S) -> Result<(&'static str, Replayed<S, E>), E>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    let mut consumed: Vec<Bytes> = Vec::new();
    let mut seen = 0usize;

    while seen < SNIFF_LEN {
        match stream.next().await {
            Some(chunk) => {
                let chunk = chunk?;
                seen += chunk.len();
                consumed.push(chunk);
            }
            None => break,
        }
    }

    let mut prefix = Vec::with_capacity(seen.min(SNIFF_LEN));
    for chunk in &consumed {
        let take = (SNIFF_LEN - prefix.len()).min(chunk.len());
        prefix.extend_from_slice(&chunk[..take]);
        if prefix.len() == SNIFF_LEN {
            break;
        }
    }

    let mime = classify(&prefix);
    let replayed = stream::iter(consumed.into_iter().map(Ok).collect::<Vec<_>>()).chain(stream);

    Ok((mime, replayed))
}

fn looks_like_text(prefix: &[u8]) -> bool {
    if prefix.is_empty() {
        return false;
    }

    // The prefix may end partway through a multi-byte character
    let text = match std::str::from_utf8(prefix) {
        Ok(text) => text,
        Err(e) if e.error_len().is_none() => match std::str::from_utf8(&prefix[..e.valid_up_to()]) {
            Ok(text) => text,
            Err(_) => return false,
        },
        Err(_) => return false,
    };

    !text
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\t' | '\n' | '\r' | '\x0c' | '\x1b'))
}
