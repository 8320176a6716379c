use crate::error::Result;
use crate::logs::logger::Logger;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};

const CHUNK_SIZE: usize = 8 * 1024;

/// Copy everything readable from `reader` into `logger` until end of stream.
///
/// Chunks are written as they arrive, without line buffering, so the log
/// holds the exact bytes the program produced. Write failures are logged
/// and do not stop the capture; a read failure ends it.
///
/// # Returns
/// * `Ok(u64)` - Total number of bytes read from the stream
/// * `Err(ProcLogError)` - Reading from the stream failed
pub async fn capture<R>(mut reader: R, logger: Arc<dyn Logger>) -> Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        total += n as u64;

        let chunk = buf[..n].to_vec();
        let logger = Arc::clone(&logger);
        match tokio::task::spawn_blocking(move || logger.write(&chunk)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::warn!("Failed to write captured output: {}", e),
            Err(e) => tracing::error!("Log write task failed: {}", e),
        }
    }

    tracing::debug!("Output stream closed after {} bytes", total);
    Ok(total)
}
