//! Minimal TON bag-of-cells reader.
//!
//! Only what the deposit flow needs: parse a serialized BOC, rebuild the cell
//! graph and compute representation hashes of ordinary cells.

use base64::Engine;
use sha2::{Digest, Sha256};
use thiserror::Error;

const MAGIC_GENERIC: u32 = 0xb5ee_9c72;
const MAGIC_INDEXED: u32 = 0x68ff_65f3;
const MAGIC_INDEXED_CRC32C: u32 = 0xacc3_a728;

const MAX_DATA_BITS: usize = 1023;
const MAX_REFS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BocError {
    #[error("invalid base64: {0}")]
    Base64(String),
    #[error("unknown bag-of-cells magic {0:#010x}")]
    BadMagic(u32),
    #[error("bag of cells is truncated")]
    Truncated,
    #[error("crc32c mismatch")]
    Checksum,
    #[error("bag of cells has no root")]
    NoRoot,
    #[error("cell {0} is malformed")]
    BadCell(usize),
    #[error("cell {cell} references {target}, which is not a later cell")]
    BadReference { cell: usize, target: usize },
    #[error("exotic cell {0} is not supported")]
    Exotic(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<usize>,
    hash: [u8; 32],
    depth: u16,
}

impl Cell {
    /// Data bytes, completion tag included when `bit_len` is not a multiple of 8.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn refs(&self) -> &[usize] {
        &self.refs
    }

    /// Representation hash.
    pub fn hash(&self) -> [u8; 32] {
        self.hash
    }

    pub fn depth(&self) -> u16 {
        self.depth
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BagOfCells {
    cells: Vec<Cell>,
    roots: Vec<usize>,
}

impl BagOfCells {
    pub fn from_base64(encoded: &str) -> Result<Self, BocError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| BocError::Base64(e.to_string()))?;
        Self::parse(&bytes)
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, BocError> {
        let header = Header::read(bytes)?;
        let mut reader = Reader::new(&bytes[..header.end], header.data_start);

        let mut raw = Vec::new();
        for index in 0..header.cell_count {
            raw.push(RawCell::read(&mut reader, header.ref_size, index)?);
        }

        // References always point forward, so hashing from the back sees
        // every child before its parent.
        let mut cells: Vec<Option<Cell>> = vec![None; raw.len()];
        for (index, cell) in raw.into_iter().enumerate().rev() {
            let mut children = Vec::with_capacity(cell.refs.len());
            for &target in &cell.refs {
                let child = cells
                    .get(target)
                    .and_then(Option::as_ref)
                    .filter(|_| target > index)
                    .ok_or(BocError::BadReference { cell: index, target })?;
                children.push(child);
            }
            let depth = children
                .iter()
                .map(|child| child.depth + 1)
                .max()
                .unwrap_or(0);
            let hash = representation_hash(&cell, &children);
            cells[index] = Some(Cell {
                data: cell.data,
                bit_len: cell.bit_len,
                refs: cell.refs,
                hash,
                depth,
            });
        }

        let cells = cells
            .into_iter()
            .enumerate()
            .map(|(index, cell)| cell.ok_or(BocError::BadCell(index)))
            .collect::<Result<Vec<_>, _>>()?;

        if header.roots.is_empty() {
            return Err(BocError::NoRoot);
        }
        if let Some(&bad) = header.roots.iter().find(|&&root| root >= cells.len()) {
            return Err(BocError::BadReference { cell: 0, target: bad });
        }

        Ok(Self {
            cells,
            roots: header.roots,
        })
    }

    pub fn root(&self) -> Result<&Cell, BocError> {
        self.roots
            .first()
            .and_then(|&index| self.cells.get(index))
            .ok_or(BocError::NoRoot)
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Hex hash of the first root cell of a base64 bag of cells.
pub fn root_hash_hex(encoded: &str) -> Result<String, BocError> {
    let boc = BagOfCells::from_base64(encoded)?;
    Ok(hex::encode(boc.root()?.hash()))
}

struct Header {
    ref_size: usize,
    cell_count: usize,
    roots: Vec<usize>,
    data_start: usize,
    end: usize,
}

impl Header {
    fn read(bytes: &[u8]) -> Result<Self, BocError> {
        let mut reader = Reader::new(bytes, 0);
        let magic = reader.uint(4)? as u32;

        let (ref_size, has_index, has_crc) = match magic {
            MAGIC_GENERIC => {
                let flags = reader.byte()?;
                let has_index = flags & 0x80 != 0;
                let has_crc = flags & 0x40 != 0;
                (usize::from(flags & 0x07), has_index, has_crc)
            }
            MAGIC_INDEXED | MAGIC_INDEXED_CRC32C => {
                let size = reader.byte()?;
                (usize::from(size), true, magic == MAGIC_INDEXED_CRC32C)
            }
            other => return Err(BocError::BadMagic(other)),
        };
        if ref_size == 0 || ref_size > 4 {
            return Err(BocError::BadCell(0));
        }

        let offset_size = usize::from(reader.byte()?);
        if offset_size == 0 || offset_size > 8 {
            return Err(BocError::BadCell(0));
        }
        let cell_count = reader.uint(ref_size)? as usize;
        let root_count = reader.uint(ref_size)? as usize;
        let _absent = reader.uint(ref_size)?;
        let data_size = reader.uint(offset_size)? as usize;

        // Every cell takes at least its two descriptor bytes.
        let min_data = cell_count.checked_mul(2).ok_or(BocError::Truncated)?;
        if min_data > data_size || root_count > cell_count {
            return Err(BocError::Truncated);
        }

        let roots = if magic == MAGIC_GENERIC {
            (0..root_count)
                .map(|_| reader.uint(ref_size).map(|root| root as usize))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            vec![0]
        };

        if has_index {
            reader.skip(cell_count.checked_mul(offset_size).ok_or(BocError::Truncated)?)?;
        }
        let data_start = reader.position();
        reader.skip(data_size)?;
        let end = reader.position();

        if has_crc {
            let stored = reader.take(4)?;
            let stored = u32::from_le_bytes([stored[0], stored[1], stored[2], stored[3]]);
            if crc32c::crc32c(&bytes[..end]) != stored {
                return Err(BocError::Checksum);
            }
        }

        Ok(Self {
            ref_size,
            cell_count,
            roots,
            data_start,
            end,
        })
    }
}

struct RawCell {
    d1: u8,
    d2: u8,
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<usize>,
}

impl RawCell {
    fn read(reader: &mut Reader<'_>, ref_size: usize, index: usize) -> Result<Self, BocError> {
        let d1 = reader.byte()?;
        let d2 = reader.byte()?;

        let ref_count = usize::from(d1 & 0x07);
        let exotic = d1 & 0x08 != 0;
        let with_hashes = d1 & 0x10 != 0;
        let level_mask = d1 >> 5;

        if exotic {
            return Err(BocError::Exotic(index));
        }
        if ref_count > MAX_REFS || level_mask != 0 {
            return Err(BocError::BadCell(index));
        }
        if with_hashes {
            // One 32-byte hash and one 2-byte depth for a level-0 cell.
            reader.skip(32 + 2)?;
        }

        let byte_len = usize::from(d2).div_ceil(2);
        let padded = d2 % 2 != 0;
        let data = reader.take(byte_len)?.to_vec();

        let bit_len = if padded {
            let last = *data.last().ok_or(BocError::BadCell(index))?;
            if last == 0 {
                return Err(BocError::BadCell(index));
            }
            byte_len * 8 - last.trailing_zeros() as usize - 1
        } else {
            byte_len * 8
        };
        if bit_len > MAX_DATA_BITS {
            return Err(BocError::BadCell(index));
        }

        let refs = (0..ref_count)
            .map(|_| reader.uint(ref_size).map(|target| target as usize))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            d1: d1 & 0x07,
            d2,
            data,
            bit_len,
            refs,
        })
    }
}

fn representation_hash(cell: &RawCell, children: &[&Cell]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([cell.d1, cell.d2]);
    // Serialized data already carries the completion tag for partial bytes.
    hasher.update(&cell.data);
    for child in children {
        hasher.update(child.depth.to_be_bytes());
    }
    for child in children {
        hasher.update(child.hash);
    }
    hasher.finalize().into()
}

struct Reader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8], position: usize) -> Self {
        Self { bytes, position }
    }

    fn position(&self) -> usize {
        self.position
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], BocError> {
        let end = self.position.checked_add(len).ok_or(BocError::Truncated)?;
        let slice = self.bytes.get(self.position..end).ok_or(BocError::Truncated)?;
        self.position = end;
        Ok(slice)
    }

    fn skip(&mut self, len: usize) -> Result<(), BocError> {
        self.take(len).map(|_| ())
    }

    fn byte(&mut self) -> Result<u8, BocError> {
        Ok(self.take(1)?[0])
    }

    fn uint(&mut self, len: usize) -> Result<u64, BocError> {
        Ok(self
            .take(len)?
            .iter()
            .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte)))
    }
}
