//! Directional stream copy

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

/// Relay chunk size
const COPY_BUF_SIZE: usize = 4096;

/// Copy bytes from `reader` to `writer` until the reader reaches EOF, an I/O
/// error occurs, or the idle timeout elapses (0 = disabled).
///
/// Whatever the termination reason, the writer's write side is shut down
/// before returning; the resulting EOF at the remote peer is what cascades
/// closure to the session's other copier. I/O failures never propagate out
/// of this function, they only show up in the logs.
///
/// Returns the number of bytes forwarded.
pub async fn copy_until_close<R, W>(
    mut reader: R,
    mut writer: W,
    direction: &'static str,
    idle_timeout: Duration,
) -> u64
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; COPY_BUF_SIZE];
    let mut total_bytes = 0u64;

    loop {
        let read = if idle_timeout.is_zero() {
            reader.read(&mut buf).await
        } else {
            match timeout(idle_timeout, reader.read(&mut buf)).await {
                Ok(result) => result,
                Err(_) => {
                    debug!(
                        "{}: idle timeout ({:?}) after {} bytes",
                        direction, idle_timeout, total_bytes
                    );
                    break;
                }
            }
        };

        let n = match read {
            Ok(0) => {
                debug!("{}: EOF after {} bytes", direction, total_bytes);
                break;
            }
            Ok(n) => n,
            Err(e) => {
                log_io_error(direction, "read", &e, total_bytes);
                break;
            }
        };

        trace!("{}: {} bytes", direction, n);
        if let Err(e) = writer.write_all(&buf[..n]).await {
            log_io_error(direction, "write", &e, total_bytes);
            break;
        }
        if let Err(e) = writer.flush().await {
            log_io_error(direction, "flush", &e, total_bytes);
            break;
        }
        total_bytes += n as u64;
    }

    // Half-close the destination; the peer copier sees EOF on its read side.
    let _ = writer.shutdown().await;

    total_bytes
}

/// Peer-initiated closes are routine teardown; anything else gets a warning.
/// Both end the copy the same way.
fn log_io_error(direction: &'static str, op: &'static str, err: &std::io::Error, total_bytes: u64) {
    use std::io::ErrorKind;

    match err.kind() {
        ErrorKind::BrokenPipe
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::NotConnected => {
            debug!(
                "{}: {} side closed by peer after {} bytes: {}",
                direction, op, total_bytes, err
            );
        }
        _ => {
            warn!(
                "{}: {} error after {} bytes: {}",
                direction, op, total_bytes, err
            );
        }
    }
}
