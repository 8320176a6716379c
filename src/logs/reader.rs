use crate::error::{ProcLogError, Result};
use crate::logs::logger::TailChunk;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Resolve a read-range request against a file of `file_len` bytes.
///
/// Returns the `(start, len)` window to read; `len` may be zero. The window
/// never extends past the end of the file.
pub fn resolve_range(file_len: u64, offset: i64, length: i64) -> Result<(u64, u64)> {
    if offset < 0 && length != 0 {
        return Err(ProcLogError::InvalidArguments(
            "a negative offset requires a length of 0".to_string(),
        ));
    }
    if offset >= 0 && length < 0 {
        return Err(ProcLogError::InvalidArguments(
            "length must not be negative".to_string(),
        ));
    }

    if offset < 0 {
        // Last |offset| bytes, clamped to the start of the file
        let back = offset.unsigned_abs().min(file_len);
        return Ok((file_len - back, back));
    }

    let start = offset as u64;
    if start >= file_len {
        return Ok((start, 0));
    }

    let available = file_len - start;
    let len = if length == 0 {
        available
    } else {
        (length as u64).min(available)
    };
    Ok((start, len))
}

/// Read a byte range of the file at `path`
///
/// # Arguments
/// * `offset` - Start offset, or a negative count of trailing bytes
/// * `length` - Number of bytes to read, 0 meaning up to end of file
pub fn read_range(path: &Path, offset: i64, length: i64) -> Result<Vec<u8>> {
    // Reject malformed requests before touching the filesystem
    resolve_range(0, offset, length)?;

    let mut file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let (start, len) = resolve_range(file_len, offset, length)?;

    read_window(&mut file, start, len)
}

/// Read the next chunk of the file at `path` for a tail-follower
///
/// When `offset` is at or past the end of file the chunk is empty, carries
/// the current file length as its offset, and has `eof` set.
pub fn read_tail(path: &Path, offset: i64, length: i64) -> Result<TailChunk> {
    if offset < 0 {
        return Err(ProcLogError::InvalidArguments(
            "offset must not be negative".to_string(),
        ));
    }
    if length < 0 {
        return Err(ProcLogError::InvalidArguments(
            "length must not be negative".to_string(),
        ));
    }

    let mut file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let start = offset as u64;

    if start >= file_len {
        return Ok(TailChunk {
            data: Vec::new(),
            offset: file_len as i64,
            eof: true,
        });
    }

    let len = (length as u64).min(file_len - start);
    let data = read_window(&mut file, start, len)?;
    let next = offset + data.len() as i64;

    Ok(TailChunk {
        data,
        offset: next,
        eof: false,
    })
}

fn read_window(file: &mut File, start: u64, len: u64) -> Result<Vec<u8>> {
    if len == 0 {
        return Ok(Vec::new());
    }

    file.seek(SeekFrom::Start(start))?;
    let mut data = Vec::with_capacity(len as usize);
    file.take(len).read_to_end(&mut data)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    fn fifty_byte_file(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("app.log");
        let content: Vec<u8> = (0..50u8).map(|i| b'a' + (i % 26)).collect();
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_resolve_range_rejects_bad_signs() {
        assert_eq!(
            resolve_range(10, -1, 5).unwrap_err().kind(),
            ErrorKind::InvalidArguments
        );
        assert_eq!(
            resolve_range(10, 0, -1).unwrap_err().kind(),
            ErrorKind::InvalidArguments
        );
    }

    #[test]
    fn test_resolve_range_windows() {
        // Trailing bytes, clamped to the start
        assert_eq!(resolve_range(50, -10, 0).unwrap(), (40, 10));
        assert_eq!(resolve_range(50, -100, 0).unwrap(), (0, 50));
        // To end of file
        assert_eq!(resolve_range(50, 20, 0).unwrap(), (20, 30));
        assert_eq!(resolve_range(50, 80, 0).unwrap(), (80, 0));
        // Bounded length
        assert_eq!(resolve_range(50, 45, 10).unwrap(), (45, 5));
        assert_eq!(resolve_range(50, 50, 10).unwrap(), (50, 0));
        assert_eq!(resolve_range(50, 10, 5).unwrap(), (10, 5));
    }

    #[test]
    fn test_read_range_never_passes_end_of_file() {
        let dir = TempDir::new().unwrap();
        let path = fifty_byte_file(&dir);
        let content = std::fs::read(&path).unwrap();

        for offset in [-60i64, -50, -1, 0, 1, 49, 50, 51, 200] {
            for length in [0i64, 1, 10, 50, 100] {
                if offset < 0 && length != 0 {
                    continue;
                }
                let data = read_range(&path, offset, length).unwrap();
                let (start, len) = resolve_range(50, offset, length).unwrap();
                let start = start.min(50) as usize;
                assert_eq!(data, content[start..start + len as usize].to_vec());
            }
        }
    }

    #[test]
    fn test_read_range_negative_offset_reads_tail_bytes() {
        let dir = TempDir::new().unwrap();
        let path = fifty_byte_file(&dir);
        let content = std::fs::read(&path).unwrap();

        let data = read_range(&path, -10, 0).unwrap();
        assert_eq!(data, content[40..].to_vec());
    }

    #[test]
    fn test_read_range_bad_arguments_before_io() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.log");

        let err = read_range(&missing, -5, 3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArguments);

        let err = read_range(&missing, 0, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
    }

    #[test]
    fn test_read_tail_at_end_reports_eof() {
        let dir = TempDir::new().unwrap();
        let path = fifty_byte_file(&dir);

        let chunk = read_tail(&path, 50, 5).unwrap();
        assert_eq!(
            chunk,
            TailChunk {
                data: Vec::new(),
                offset: 50,
                eof: true
            }
        );

        // Polling again with the returned offset stays at end of file
        let again = read_tail(&path, chunk.offset, 5).unwrap();
        assert!(again.data.is_empty());
        assert!(again.eof);
        assert_eq!(again.offset, 50);
    }

    #[test]
    fn test_read_tail_past_end_returns_file_length() {
        let dir = TempDir::new().unwrap();
        let path = fifty_byte_file(&dir);

        let chunk = read_tail(&path, 500, 5).unwrap();
        assert_eq!(chunk.offset, 50);
        assert!(chunk.eof);
    }

    #[test]
    fn test_read_tail_advances_offset() {
        let dir = TempDir::new().unwrap();
        let path = fifty_byte_file(&dir);
        let content = std::fs::read(&path).unwrap();

        let chunk = read_tail(&path, 45, 10).unwrap();
        assert_eq!(chunk.data, content[45..].to_vec());
        assert_eq!(chunk.offset, 50);
        assert!(!chunk.eof);
    }

    #[test]
    fn test_read_tail_rejects_negative_inputs() {
        let dir = TempDir::new().unwrap();
        let path = fifty_byte_file(&dir);

        assert_eq!(
            read_tail(&path, -1, 5).unwrap_err().kind(),
            ErrorKind::InvalidArguments
        );
        assert_eq!(
            read_tail(&path, 0, -5).unwrap_err().kind(),
            ErrorKind::InvalidArguments
        );
    }
}
