use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Frames are self-describing: a 4-byte big-endian length prefix followed
/// by a bincode-encoded payload. TCP gives us a byte stream, not message
/// boundaries, so unlike a framing-aware codec (e.g. Go's gob streaming
/// decoder) we have to draw them ourselves (§6).
const MAX_FRAME_LEN: u32 = 1 << 20;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed frame: {0}")]
    Encoding(#[from] bincode::Error),
    #[error("frame of {0} bytes exceeds the {MAX_FRAME_LEN} byte limit")]
    TooLarge(u32),
}

pub async fn write_frame<W, T>(writer: &mut W, value: &T) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let bytes = bincode::serialize(value)?;
    let len: u32 = bytes
        .len()
        .try_into()
        .map_err(|_| WireError::TooLarge(u32::MAX))?;
    if len > MAX_FRAME_LEN {
        return Err(WireError::TooLarge(len));
    }
    writer.write_u32(len).await?;
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn read_frame<R, T>(reader: &mut R) -> Result<T, WireError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let len = reader.read_u32().await?;
    if len > MAX_FRAME_LEN {
        return Err(WireError::TooLarge(len));
    }
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).await?;
    Ok(bincode::deserialize(&buf)?)
}

/// What actually crosses the wire for a request: the sender identifies
/// itself by its full (id, listen address) pair (§4.3/§6's `SenderId`/
/// `SenderAddr` fields), not just an id — the TCP socket's peer address is
/// an ephemeral outbound port, never the address the recipient could dial
/// back to reach the sender's listener.
#[derive(Debug, Serialize, serde::Deserialize)]
pub struct Envelope {
    pub sender: kdfs_logic::Peer,
    pub request: kdfs_logic::protocol::Request,
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdfs_logic::protocol::Request;
    use tokio::io::duplex;

    #[tokio::test]
    async fn frame_roundtrips_through_a_duplex_stream() {
        let (mut a, mut b) = duplex(4096);
        let envelope = Envelope {
            sender: kdfs_logic::Peer::new(kdfs_logic::Id::ZERO, "127.0.0.1:1".parse().unwrap()),
            request: Request::Ping,
        };
        write_frame(&mut a, &envelope).await.unwrap();
        let decoded: Envelope = read_frame(&mut b).await.unwrap();
        assert_eq!(decoded.sender, envelope.sender);
        assert_eq!(decoded.request, envelope.request);
    }
}
