
use std::io::{ErrorKind, Read, Write};

use anyhow::{bail, Context};
use serde::Serialize;

use crate::{config, protocol::Request};

/// Read one length-prefixed JSON request. `Ok(None)` on a clean EOF before a new frame.
pub fn read_message(stdin: &mut dyn Read) -> anyhow::Result<Option<Request>> {
    let mut len_buf = [0u8; 4];
    let mut filled = 0;
    while filled < len_buf.len() {
        match stdin.read(&mut len_buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => bail!("incomplete length prefix (expected 4 bytes, got {filled})"),
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("failed reading native message length"),
        }
    }

    // Native messaging uses 32-bit little-endian length.
    let msg_len = u32::from_le_bytes(len_buf);
    if msg_len > config::native_messaging::MAX_MESSAGE_SIZE_BYTES {
        bail!("message too large: {msg_len} bytes");
    }

    let mut payload = vec![0u8; msg_len as usize];
    stdin
        .read_exact(&mut payload)
        .with_context(|| format!("failed reading native message payload ({msg_len} bytes)"))?;

    let req: Request = serde_json::from_slice(&payload).context("invalid JSON request")?;
    Ok(Some(req))
}

pub fn write_message<T: Serialize>(stdout: &mut dyn Write, v: &T) -> anyhow::Result<()> {
    let bytes = serde_json::to_vec(v).context("failed serializing JSON response")?;
    let len: u32 = bytes
        .len()
        .try_into()
        .context("response too large for u32 length")?;
    stdout.write_all(&len.to_le_bytes())?;
    stdout.write_all(&bytes)?;
    stdout.flush().context("failed flushing stdout")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn frame(json: &str) -> Vec<u8> {
        let mut out = (json.len() as u32).to_le_bytes().to_vec();
        out.extend_from_slice(json.as_bytes());
        out
    }

    #[test]
    fn test_read_two_frames_then_eof() {
        let mut bytes = frame(r#"{"id":"1","method":"hello"}"#);
        bytes.extend(frame(r#"{"id":"2","method":"match","params":{"q":"Kopfweh"}}"#));
        let mut input = Cursor::new(bytes);

        let first = read_message(&mut input).unwrap().unwrap();
        assert_eq!(first.method, "hello");
        let second = read_message(&mut input).unwrap().unwrap();
        assert_eq!(second.params["q"], "Kopfweh");
        assert!(read_message(&mut input).unwrap().is_none());
    }

    #[test]
    fn test_truncated_prefix_is_error() {
        let mut input = Cursor::new(vec![5u8, 0]);
        assert!(read_message(&mut input).is_err());
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let mut input = Cursor::new(u32::MAX.to_le_bytes().to_vec());
        let err = read_message(&mut input).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_write_message_prefixes_length() {
        let mut out = Vec::new();
        write_message(&mut out, &serde_json::json!({ "id": "1" })).unwrap();
        let payload = br#"{"id":"1"}"#;
        assert_eq!(&out[..4], &(payload.len() as u32).to_le_bytes());
        assert_eq!(&out[4..], payload);
    }
}
