//! Source RCON packet framing.
//!
//! Every packet is `size | id | kind | body | 0x00 0x00`, where the three
//! header fields are little-endian `i32` and `size` counts everything after
//! itself. Bodies are kept as raw bytes: the game server does not always send
//! valid UTF-8.

use std::io;

pub const SERVERDATA_AUTH: i32 = 3;
pub const SERVERDATA_AUTH_RESPONSE: i32 = 2;
pub const SERVERDATA_EXECCOMMAND: i32 = 2;

/// Bytes in front of the body: size, id and kind.
const HEADER_LEN: usize = 12;

/// Smallest legal `size`: id, kind and the two terminators.
const MIN_SIZE: usize = 10;

/// Largest `size` accepted from the server.
pub const MAX_SIZE: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub id: i32,
    pub kind: i32,
    pub body: Vec<u8>,
}

pub fn encode(id: i32, kind: i32, body: &[u8]) -> Vec<u8> {
    let size = (body.len() + MIN_SIZE) as i32;
    let mut buf = Vec::with_capacity(body.len() + MIN_SIZE + 4);
    buf.extend_from_slice(&size.to_le_bytes());
    buf.extend_from_slice(&id.to_le_bytes());
    buf.extend_from_slice(&kind.to_le_bytes());
    buf.extend_from_slice(body);
    buf.extend_from_slice(&[0, 0]);
    buf
}

/// Decode the first packet in `buf`.
///
/// Returns `Ok(None)` until the whole packet has arrived, otherwise the packet
/// and the number of bytes it used. A `size` outside the legal range is
/// `InvalidData`.
pub fn decode(buf: &[u8]) -> io::Result<Option<(Packet, usize)>> {
    let Some(size) = read_i32(buf, 0) else {
        return Ok(None);
    };
    let size = usize::try_from(size)
        .ok()
        .filter(|size| (MIN_SIZE..=MAX_SIZE).contains(size))
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, format!("bad packet size {size}")))?;

    let total = size + 4;
    if buf.len() < total {
        return Ok(None);
    }

    let (Some(id), Some(kind)) = (read_i32(buf, 4), read_i32(buf, 8)) else {
        return Ok(None);
    };
    let body = buf[HEADER_LEN..total - 2].to_vec();
    Ok(Some((Packet { id, kind, body }, total)))
}

/// Body bytes of a packet that never finished arriving.
pub fn partial_body(buf: &[u8]) -> &[u8] {
    buf.get(HEADER_LEN..).unwrap_or_default()
}

fn read_i32(buf: &[u8], at: usize) -> Option<i32> {
    let bytes = buf.get(at..at + 4)?;
    Some(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let buf = encode(7, SERVERDATA_EXECCOMMAND, b"ShowPlayers");
        assert_eq!(&buf[..4], &21i32.to_le_bytes());
        assert_eq!(&buf[4..8], &7i32.to_le_bytes());
        assert_eq!(&buf[8..12], &2i32.to_le_bytes());
        assert_eq!(&buf[12..23], b"ShowPlayers");
        assert_eq!(&buf[23..], &[0u8, 0]);
    }

    #[test]
    fn test_decode_waits_for_whole_packet() {
        let buf = encode(1, 0, b"hello");
        assert_eq!(decode(&buf[..3]).unwrap(), None);
        assert_eq!(decode(&buf[..buf.len() - 1]).unwrap(), None);

        let (packet, used) = decode(&buf).unwrap().unwrap();
        assert_eq!(used, buf.len());
        assert_eq!(packet.body, b"hello");
    }

    #[test]
    fn test_decode_keeps_invalid_utf8() {
        let body = b"name,playeruid,steamid\n\xE3\x81,123456789,1\n";
        let (packet, _) = decode(&encode(1, 0, body)).unwrap().unwrap();
        assert_eq!(packet.body, body);
    }

    #[test]
    fn test_decode_leaves_following_packets() {
        let mut buf = encode(1, 0, b"");
        buf.extend(encode(2, SERVERDATA_AUTH_RESPONSE, b""));

        let (first, used) = decode(&buf).unwrap().unwrap();
        assert_eq!(first.id, 1);
        let (second, _) = decode(&buf[used..]).unwrap().unwrap();
        assert_eq!(second.kind, SERVERDATA_AUTH_RESPONSE);
    }

    #[test]
    fn test_decode_rejects_bad_size() {
        assert!(decode(&3i32.to_le_bytes()).is_err());
        assert!(decode(&(-1i32).to_le_bytes()).is_err());
        assert!(decode(&((MAX_SIZE + 1) as i32).to_le_bytes()).is_err());
    }

    #[test]
    fn test_partial_body() {
        let buf = encode(1, 0, b"name,playeruid");
        assert_eq!(partial_body(&buf[..20]), b"name,pla");
        assert!(partial_body(&buf[..8]).is_empty());
    }
}
