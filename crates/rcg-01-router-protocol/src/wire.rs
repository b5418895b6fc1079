//! # Sentence Codec
//!
//! RouterOS API framing. Every word is preceded by a variable-length size
//! prefix and a sentence ends with a zero-length word.
//!
//! | length            | prefix bytes | marker        |
//! |-------------------|--------------|---------------|
//! | `< 0x80`          | 1            | none          |
//! | `< 0x4000`        | 2            | `0x8000`      |
//! | `< 0x20_0000`     | 3            | `0xC0_0000`   |
//! | `< 0x1000_0000`   | 4            | `0xE000_0000` |
//! | otherwise         | 5            | `0xF0` + u32  |

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{RouterError, RouterResult};

/// Largest word accepted from the router.
pub const MAX_WORD_LEN: usize = 16 * 1024 * 1024;

/// Append the length prefix for a word of `len` bytes.
pub fn encode_length(len: usize, buf: &mut BytesMut) {
    let len = len as u32;
    if len < 0x80 {
        buf.put_u8(len as u8);
    } else if len < 0x4000 {
        buf.put_u16((len | 0x8000) as u16);
    } else if len < 0x20_0000 {
        let v = len | 0xC0_0000;
        buf.put_u8((v >> 16) as u8);
        buf.put_u16(v as u16);
    } else if len < 0x1000_0000 {
        buf.put_u32(len | 0xE000_0000);
    } else {
        buf.put_u8(0xF0);
        buf.put_u32(len);
    }
}

/// Number of prefix bytes that follow the control byte `first`.
fn extra_length_bytes(first: u8) -> RouterResult<usize> {
    match first {
        b if b & 0x80 == 0x00 => Ok(0),
        b if b & 0xC0 == 0x80 => Ok(1),
        b if b & 0xE0 == 0xC0 => Ok(2),
        b if b & 0xF0 == 0xE0 => Ok(3),
        0xF0 => Ok(4),
        b => Err(RouterError::Protocol(format!(
            "reserved control byte {b:#04x}"
        ))),
    }
}

fn assemble_length(first: u8, rest: &[u8]) -> usize {
    let masked = match rest.len() {
        0 => u32::from(first),
        1 => u32::from(first & 0x3F),
        2 => u32::from(first & 0x1F),
        3 => u32::from(first & 0x0F),
        _ => 0,
    };
    rest.iter()
        .fold(masked, |acc, b| (acc << 8) | u32::from(*b)) as usize
}

/// Decode a length prefix from the head of `buf`.
///
/// Returns the word length and the number of prefix bytes consumed, or
/// `None` when `buf` is too short.
pub fn decode_length(buf: &[u8]) -> RouterResult<Option<(usize, usize)>> {
    let Some(&first) = buf.first() else {
        return Ok(None);
    };
    let extra = extra_length_bytes(first)?;
    if buf.len() < 1 + extra {
        return Ok(None);
    }
    Ok(Some((assemble_length(first, &buf[1..1 + extra]), 1 + extra)))
}

/// Encode a full sentence including its terminator.
pub fn encode_sentence<S: AsRef<str>>(words: &[S]) -> BytesMut {
    let size: usize = words.iter().map(|w| w.as_ref().len() + 5).sum::<usize>() + 1;
    let mut buf = BytesMut::with_capacity(size);
    for word in words {
        let bytes = word.as_ref().as_bytes();
        encode_length(bytes.len(), &mut buf);
        buf.put_slice(bytes);
    }
    buf.put_u8(0);
    buf
}

/// Write one sentence and flush.
pub async fn write_sentence<W, S>(writer: &mut W, words: &[S]) -> RouterResult<()>
where
    W: AsyncWrite + Unpin,
    S: AsRef<str>,
{
    writer.write_all(&encode_sentence(words)).await?;
    writer.flush().await?;
    Ok(())
}

async fn read_length<R: AsyncRead + Unpin>(reader: &mut R) -> RouterResult<usize> {
    let first = reader.read_u8().await?;
    let extra = extra_length_bytes(first)?;
    let mut rest = [0u8; 4];
    reader.read_exact(&mut rest[..extra]).await?;
    Ok(assemble_length(first, &rest[..extra]))
}

/// Read one word; an empty string marks the end of a sentence.
pub async fn read_word<R: AsyncRead + Unpin>(reader: &mut R) -> RouterResult<String> {
    let len = read_length(reader).await?;
    if len > MAX_WORD_LEN {
        return Err(RouterError::Protocol(format!(
            "word of {len} bytes exceeds {MAX_WORD_LEN}"
        )));
    }
    let mut word = vec![0u8; len];
    reader.read_exact(&mut word).await?;
    // RouterOS is not strict about UTF-8 in comments
    Ok(String::from_utf8_lossy(&word).into_owned())
}

/// Read words up to and excluding the zero-length terminator.
pub async fn read_sentence<R: AsyncRead + Unpin>(reader: &mut R) -> RouterResult<Vec<String>> {
    let mut words = Vec::new();
    loop {
        let word = read_word(reader).await?;
        if word.is_empty() {
            return Ok(words);
        }
        words.push(word);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn prefix(len: usize) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_length(len, &mut buf);
        buf.to_vec()
    }

    #[test]
    fn test_length_boundaries() {
        assert_eq!(prefix(0), vec![0x00]);
        assert_eq!(prefix(0x7F), vec![0x7F]);
        assert_eq!(prefix(0x80), vec![0x80, 0x80]);
        assert_eq!(prefix(0x3FFF), vec![0xBF, 0xFF]);
        assert_eq!(prefix(0x4000), vec![0xC0, 0x40, 0x00]);
        assert_eq!(prefix(0x1F_FFFF), vec![0xDF, 0xFF, 0xFF]);
        assert_eq!(prefix(0x20_0000), vec![0xE0, 0x20, 0x00, 0x00]);
        assert_eq!(prefix(0x1000_0000), vec![0xF0, 0x10, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_decode_short_and_reserved() {
        assert_eq!(decode_length(&[]).unwrap(), None);
        assert_eq!(decode_length(&[0x80]).unwrap(), None);
        assert!(matches!(
            decode_length(&[0xF8]),
            Err(RouterError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_sentence_over_duplex() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        let long = "x".repeat(300);
        write_sentence(&mut client, &["/login", "=name=admin", long.as_str()])
            .await
            .unwrap();
        write_sentence::<_, &str>(&mut client, &[]).await.unwrap();

        let words = read_sentence(&mut server).await.unwrap();
        assert_eq!(words, vec!["/login".to_string(), "=name=admin".into(), long]);
        assert!(read_sentence(&mut server).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_word_rejected() {
        let mut buf = BytesMut::new();
        encode_length(MAX_WORD_LEN + 1, &mut buf);
        let mut reader = &buf[..];
        assert!(matches!(
            read_word(&mut reader).await,
            Err(RouterError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_truncated_stream_is_io_error() {
        let mut reader: &[u8] = &[0x05, b'a', b'b'];
        assert!(matches!(read_word(&mut reader).await, Err(RouterError::Io(_))));
    }

    #[tokio::test]
    async fn test_write_sentence_exact_bytes() {
        let mut expected = vec![0x06];
        expected.extend_from_slice(b"/login");
        expected.push(0x0B);
        expected.extend_from_slice(b"=name=admin");
        expected.push(0x00);

        let mut mock = tokio_test::io::Builder::new().write(&expected).build();
        write_sentence(&mut mock, &["/login", "=name=admin"])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_read_sentence_across_chunks() {
        let mut mock = tokio_test::io::Builder::new()
            .read(&[0x03, b'!', b'r'])
            .read(&[b'e', 0x04, b'=', b'a', b'=', b'1'])
            .read(&[0x00])
            .build();
        assert_eq!(
            read_sentence(&mut mock).await.unwrap(),
            vec!["!re".to_string(), "=a=1".to_string()]
        );
    }

    proptest! {
        #[test]
        fn prop_length_prefix_roundtrip(len in 0usize..0x2000_0000) {
            let encoded = prefix(len);
            let (decoded, consumed) = decode_length(&encoded).unwrap().unwrap();
            prop_assert_eq!(decoded, len);
            prop_assert_eq!(consumed, encoded.len());
        }
    }
}
