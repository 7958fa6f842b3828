use super::{Address, Function};
use crate::error;
use crate::lang::Error;
use crc::crc32;
use std::convert::TryFrom;
use std::path::Path;

type Result<T> = std::result::Result<T, Error>;

const MAGIC: &[u8; 4] = b"TERN";
const VERSION: u8 = 1;

/// ## Compiled program
///
/// Constant pools, function table and the instruction byte stream handed
/// to a [`Machine`](super::Machine).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bytecode {
    pub ids: Vec<String>,
    pub ints: Vec<i32>,
    pub functions: Vec<Function>,
    pub operations: Vec<u8>,
}

impl Bytecode {
    pub fn new() -> Bytecode {
        Bytecode::default()
    }

    /// Serialize with a trailing CRC-32 over everything before it.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.operations.len() + 64);
        out.extend_from_slice(MAGIC);
        out.push(VERSION);
        put_len(&mut out, self.ids.len());
        for id in &self.ids {
            put_len(&mut out, id.len());
            out.extend_from_slice(id.as_bytes());
        }
        put_len(&mut out, self.ints.len());
        for n in &self.ints {
            out.extend_from_slice(&n.to_be_bytes());
        }
        put_len(&mut out, self.functions.len());
        for function in &self.functions {
            out.extend_from_slice(&(function.start as u64).to_be_bytes());
            out.push(function.arg_count);
            out.push(function.local_count);
        }
        put_len(&mut out, self.operations.len());
        out.extend_from_slice(&self.operations);
        let checksum = crc32::checksum_ieee(&out);
        out.extend_from_slice(&checksum.to_be_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Bytecode> {
        if bytes.len() < MAGIC.len() + 1 + 4 {
            return Err(error!(BadArtifact; "FILE TOO SHORT"));
        }
        let (body, trailer) = bytes.split_at(bytes.len() - 4);
        let expected = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        if crc32::checksum_ieee(body) != expected {
            return Err(error!(BadArtifact; "CHECKSUM MISMATCH"));
        }
        let mut reader = Reader { bytes: body, pos: 0 };
        if reader.take(4)? != MAGIC {
            return Err(error!(BadArtifact; "NOT A TERN FILE"));
        }
        let version = reader.u8()?;
        if version != VERSION {
            return Err(error!(BadArtifact; "UNSUPPORTED VERSION {}", version));
        }
        let mut code = Bytecode::new();
        for _ in 0..reader.u32()? {
            let len = reader.u32()? as usize;
            match std::str::from_utf8(reader.take(len)?) {
                Ok(s) => code.ids.push(s.to_string()),
                Err(_) => return Err(error!(BadArtifact; "IDENTIFIER IS NOT UTF-8")),
            }
        }
        for _ in 0..reader.u32()? {
            code.ints.push(reader.u32()? as i32);
        }
        for _ in 0..reader.u32()? {
            let start = reader.u64()?;
            let start = match Address::try_from(start) {
                Ok(start) => start,
                Err(_) => return Err(error!(BadArtifact; "FUNCTION START {} TOO LARGE", start)),
            };
            let arg_count = reader.u8()?;
            let local_count = reader.u8()?;
            code.functions
                .push(Function::new(start, arg_count, local_count));
        }
        let len = reader.u32()? as usize;
        code.operations = reader.take(len)?.to_vec();
        if reader.pos != body.len() {
            return Err(error!(BadArtifact; "TRAILING BYTES"));
        }
        Ok(code)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_bytes())
            .map_err(|e| error!(BadArtifact; "{}: {}", path.display(), e))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Bytecode> {
        let path = path.as_ref();
        let bytes =
            std::fs::read(path).map_err(|e| error!(BadArtifact; "{}: {}", path.display(), e))?;
        Bytecode::from_bytes(&bytes)
    }
}

fn put_len(out: &mut Vec<u8>, len: usize) {
    out.extend_from_slice(&(len as u32).to_be_bytes());
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos.saturating_add(len);
        if end > self.bytes.len() {
            return Err(error!(BadArtifact; "UNEXPECTED END OF FILE"));
        }
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }
    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }
    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
    fn u64(&mut self) -> Result<u64> {
        let b = self.take(8)?;
        let mut n = 0u64;
        for byte in b {
            n = (n << 8) | u64::from(*byte);
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::ErrorCode;

    fn sample() -> Bytecode {
        Bytecode {
            ids: vec!["print".to_string(), "héllo".to_string()],
            ints: vec![-7, 42],
            functions: vec![Function::new(12, 2, 3)],
            operations: vec![21, 0, 21, 1, 2],
        }
    }

    #[test]
    fn test_file_round_trip() {
        let code = sample();
        assert_eq!(Bytecode::from_bytes(&code.to_bytes()), Ok(code));
    }

    #[test]
    fn test_corruption_detected() {
        let mut bytes = sample().to_bytes();
        bytes[10] ^= 0xFF;
        let err = Bytecode::from_bytes(&bytes).unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadArtifact);
        assert_eq!(err.text(), "CHECKSUM MISMATCH");
    }

    #[test]
    fn test_bad_magic() {
        let mut body = b"BASI".to_vec();
        body.push(VERSION);
        let checksum = crc32::checksum_ieee(&body);
        body.extend_from_slice(&checksum.to_be_bytes());
        let err = Bytecode::from_bytes(&body).unwrap_err();
        assert_eq!(err.text(), "NOT A TERN FILE");
    }

    #[test]
    fn test_truncated() {
        let err = Bytecode::from_bytes(b"TE").unwrap_err();
        assert_eq!(err.text(), "FILE TOO SHORT");
    }
}
