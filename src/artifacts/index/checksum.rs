//! Hashing pass-through for index reads and writes
//!
//! Wraps a reader or writer and feeds every byte through a running SHA-1 so
//! the trailer can be verified (read) or emitted (write) at the end.

use crate::artifacts::index::CHECKSUM_SIZE;
use crate::error::VesError;
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::io::{Read, Write};

#[derive(Debug)]
pub struct Checksum<T> {
    inner: T,
    digest: Sha1,
}

impl<T> Checksum<T> {
    pub fn new(inner: T) -> Self {
        Checksum {
            inner,
            digest: Sha1::new(),
        }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read> Checksum<T> {
    /// Read exactly `size` bytes, updating the running digest
    pub fn read(&mut self, size: usize) -> anyhow::Result<Bytes> {
        let mut buffer = vec![0; size];
        self.inner.read_exact(&mut buffer).map_err(|_| {
            VesError::MalformedIndex("unexpected end-of-file while reading index".to_string())
        })?;

        self.digest.update(&buffer);
        Ok(Bytes::from(buffer))
    }

    /// Read the 20-byte trailer and compare it against the running digest
    pub fn verify(&mut self) -> anyhow::Result<()> {
        let mut expected = [0u8; CHECKSUM_SIZE];
        self.inner.read_exact(&mut expected).map_err(|_| {
            VesError::MalformedIndex("index trailer is truncated".to_string())
        })?;

        let actual = self.digest.clone().finalize();
        if expected != actual.as_slice() {
            anyhow::bail!(VesError::MalformedIndex(
                "trailer hash does not match index contents".to_string()
            ));
        }

        Ok(())
    }
}

impl<T: Write> Checksum<T> {
    /// Write bytes, updating the running digest
    pub fn write(&mut self, data: &[u8]) -> anyhow::Result<()> {
        self.inner.write_all(data)?;
        self.digest.update(data);
        Ok(())
    }

    /// Append the 20-byte trailer over everything written so far
    pub fn write_checksum(&mut self) -> anyhow::Result<()> {
        let checksum = self.digest.clone().finalize();
        self.inner.write_all(checksum.as_slice())?;
        Ok(())
    }
}
