//! Record Iterator
//!
//! Sequential walk over the record area, in the order records were added.

use crate::error::{Result, ScdbError};
use crate::format::{unpack_pair, RECORD_HEADER_SIZE};
use crate::io::ByteSource;

use super::database::DatabaseReader;

/// Iterator over `(key, data)` records
pub struct Records<'a, S: ByteSource> {
    reader: &'a DatabaseReader<S>,
    /// Position of the next record header
    pos: u64,
    /// Stop reading here (start of the hash tables)
    end: u64,
}

impl<'a, S: ByteSource> Records<'a, S> {
    pub(super) fn new(reader: &'a DatabaseReader<S>, start: u32, end: u32) -> Self {
        Self {
            reader,
            pos: u64::from(start),
            end: u64::from(end),
        }
    }

    fn read_record(&mut self) -> Result<(Vec<u8>, Vec<u8>)> {
        let (key_len, data_len) = unpack_pair(&self.reader.read_pair(self.pos)?);

        let key_pos = self.pos + u64::from(RECORD_HEADER_SIZE);
        let data_pos = key_pos + u64::from(key_len);
        let next = data_pos + u64::from(data_len);
        if next > self.end {
            return Err(ScdbError::Truncated(format!(
                "record at {} runs into the hash tables at {}",
                self.pos, self.end
            )));
        }

        let mut key = Vec::new();
        key.try_reserve_exact(key_len as usize)?;
        key.resize(key_len as usize, 0);
        self.reader.read_into(&mut key, key_pos)?;

        let mut data = Vec::new();
        data.try_reserve_exact(data_len as usize)?;
        data.resize(data_len as usize, 0);
        self.reader.read_into(&mut data, data_pos)?;

        self.pos = next;
        Ok((key, data))
    }
}

impl<'a, S: ByteSource> Iterator for Records<'a, S> {
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.end {
            return None;
        }

        match self.read_record() {
            Ok(record) => Some(Ok(record)),
            Err(e) => {
                // Nothing after a bad record can be located
                self.pos = self.end;
                Some(Err(e))
            }
        }
    }
}
