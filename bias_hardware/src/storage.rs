//! Erase-before-write storage media.
//!
//! Both media follow flash semantics: erase sets bytes to `0xFF`, program can
//! only clear bits. Programming over an unerased block therefore produces a
//! mix of old and new data, which the config store's read-back catches.

use crate::error::{HwError, Result};
use bias_traits::{BoxError, NvStorage};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const ERASED: u8 = 0xFF;

fn check_bounds(offset: usize, len: usize, size: usize) -> Result<()> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(HwError::OutOfBounds { offset, len, size }),
    }
}

fn read_image(image: &[u8], offset: usize, buf: &mut [u8]) -> Result<()> {
    check_bounds(offset, buf.len(), image.len())?;
    buf.copy_from_slice(&image[offset..offset + buf.len()]);
    Ok(())
}

fn erase_image(image: &mut [u8], offset: usize, len: usize) -> Result<()> {
    check_bounds(offset, len, image.len())?;
    image[offset..offset + len].fill(ERASED);
    Ok(())
}

fn program_image(image: &mut [u8], offset: usize, data: &[u8]) -> Result<()> {
    check_bounds(offset, data.len(), image.len())?;
    for (cell, byte) in image[offset..offset + data.len()].iter_mut().zip(data) {
        *cell &= *byte;
    }
    Ok(())
}

/// RAM-backed block, starts fully erased.
#[derive(Debug, Clone)]
pub struct MemStorage {
    image: Vec<u8>,
    fail_program: bool,
    fail_next_program: bool,
}

impl MemStorage {
    pub fn new(size: usize) -> Self {
        Self {
            image: vec![ERASED; size],
            fail_program: false,
            fail_next_program: false,
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            image: bytes,
            fail_program: false,
            fail_next_program: false,
        }
    }

    /// Make every subsequent `program` call fail.
    pub fn fail_program(&mut self, fail: bool) {
        self.fail_program = fail;
    }

    /// Make only the next `program` call fail.
    pub fn fail_next_program(&mut self) {
        self.fail_next_program = true;
    }

    pub fn bytes(&self) -> &[u8] {
        &self.image
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.image
    }
}

impl NvStorage for MemStorage {
    fn read(&mut self, offset: usize, buf: &mut [u8]) -> std::result::Result<(), BoxError> {
        Ok(read_image(&self.image, offset, buf)?)
    }

    fn erase(&mut self, offset: usize, len: usize) -> std::result::Result<(), BoxError> {
        Ok(erase_image(&mut self.image, offset, len)?)
    }

    fn program(&mut self, offset: usize, data: &[u8]) -> std::result::Result<(), BoxError> {
        if self.fail_program || std::mem::take(&mut self.fail_next_program) {
            return Err(Box::new(HwError::Io(std::io::Error::other(
                "program failed",
            ))));
        }
        Ok(program_image(&mut self.image, offset, data)?)
    }
}

/// Replace `path` with `bytes` via a synced temp file and rename, so readers
/// see either the old image or the new one.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(tmp, path)
}

/// File-backed block. Erase touches only the in-memory image; program
/// commits the whole image to disk atomically. A failed commit drops every
/// uncommitted change, so the image always converges back to the file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    image: Vec<u8>,
    committed: Vec<u8>,
}

impl FileStorage {
    /// Open `path` as a block of `size` bytes. A missing file reads as
    /// erased; a short one is padded with erased bytes.
    pub fn open(path: impl Into<PathBuf>, size: usize) -> Result<Self> {
        let path = path.into();
        let mut image = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        image.resize(size, ERASED);
        tracing::debug!(path = %path.display(), size, "opened storage file");
        Ok(Self {
            path,
            committed: image.clone(),
            image,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NvStorage for FileStorage {
    fn read(&mut self, offset: usize, buf: &mut [u8]) -> std::result::Result<(), BoxError> {
        Ok(read_image(&self.image, offset, buf)?)
    }

    fn erase(&mut self, offset: usize, len: usize) -> std::result::Result<(), BoxError> {
        Ok(erase_image(&mut self.image, offset, len)?)
    }

    fn program(&mut self, offset: usize, data: &[u8]) -> std::result::Result<(), BoxError> {
        let mut next = self.image.clone();
        program_image(&mut next, offset, data)?;
        if let Err(e) = write_atomic(&self.path, &next) {
            self.image.clone_from(&self.committed);
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "storage commit failed; pending changes dropped"
            );
            return Err(Box::new(HwError::from(e)));
        }
        self.committed.clone_from(&next);
        self.image = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_only_clears_bits() {
        let mut s = MemStorage::new(4);
        s.program(0, &[0x0F, 0xF0]).unwrap();
        s.program(0, &[0xF0, 0xFF]).unwrap();
        assert_eq!(&s.bytes()[..2], &[0x00, 0xF0]);
        s.erase(0, 2).unwrap();
        assert_eq!(s.bytes(), &[ERASED; 4]);
    }

    #[test]
    fn next_program_failure_is_one_shot() {
        let mut s = MemStorage::new(4);
        s.fail_next_program();
        assert!(s.program(0, &[0x00]).is_err());
        assert_eq!(s.bytes(), &[ERASED; 4]);
        s.program(0, &[0x00]).unwrap();
        assert_eq!(s.bytes()[0], 0x00);
    }

    #[test]
    fn out_of_bounds_is_rejected() {
        let mut s = MemStorage::new(8);
        let mut buf = [0u8; 4];
        assert!(s.read(6, &mut buf).is_err());
        assert!(s.erase(usize::MAX, 2).is_err());
        assert!(s.program(8, &[0]).is_err());
    }
}
