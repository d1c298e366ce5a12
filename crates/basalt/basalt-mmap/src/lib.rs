//! File-backed memory mapping primitives for the basalt shared region.
//!
//! A region is an ordinary fixed-size file mapped into the address space of
//! every participant: the writer maps it read-write, readers map it
//! read-only. The `File` handle is kept alive next to each map for two
//! reasons: the mapping must outlive the handle that created it, and the
//! read-only side probes that handle's inode to learn when the region file
//! has been unlinked (an existing mapping stays readable after unlink, so
//! the path alone cannot tell).

use memmap2::{Mmap, MmapMut};
use std::{
    fs::{File, OpenOptions},
    io,
    path::Path,
};

#[derive(Debug)]
pub struct MmapFileMut {
    /// File handle kept alive to maintain the memory map validity
    _file: File,
    /// Memory-mapped region providing mutable access to file contents
    mmap: MmapMut,
}

#[derive(Debug)]
pub struct MmapFile {
    /// Kept for the mapping lifetime and for `is_linked` probes
    file: File,
    /// Memory-mapped region providing read-only access to file contents
    mmap: Mmap,
}

impl MmapFileMut {
    /// Create (or truncate) the file at `path` to exactly `size_bytes` and
    /// map it read-write. Prior contents are destroyed.
    pub fn create_rw<P: AsRef<Path>>(path: P, size_bytes: u64) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        file.set_len(size_bytes)?;

        let mmap = unsafe { MmapMut::map_mut(&file)? };
        Ok(Self { _file: file, mmap })
    }

    /// Map an existing file read-write without disturbing its contents.
    pub fn open_rw<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        Ok(Self { _file: file, mmap })
    }

    /// Raw pointer to the start of the mapped bytes
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.mmap.as_mut_ptr()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }
}

impl MmapFile {
    /// Map an existing file read-only.
    pub fn open_ro<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self { file, mmap })
    }

    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.mmap.as_ptr()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// True while the mapped inode still has a directory entry.
    ///
    /// Once the region file is unlinked the mapping itself keeps working,
    /// so a reader that wants to notice teardown has to ask the inode.
    #[cfg(unix)]
    pub fn is_linked(&self) -> bool {
        use std::os::unix::fs::MetadataExt;
        self.file.metadata().map(|m| m.nlink() > 0).unwrap_or(false)
    }

    #[cfg(not(unix))]
    pub fn is_linked(&self) -> bool {
        true
    }
}
