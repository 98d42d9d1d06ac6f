//! forge::image
//!
//! Byte-level shim images.
//!
//! # Layout
//!
//! All integers little-endian.
//!
//! ```text
//! magic        4 bytes   b"RWSH"
//! version      u8        1
//! flags        u8        bit 0 = public
//! name         u16 len + UTF-8
//! supertype    u16 len + UTF-8
//! ctor count   u16       always 1
//! per ctor:
//!   access     u8        bit 0 = public
//!   op count   u16
//!   ops        u8 each   LOAD_SELF, INVOKE_SUPER_INIT, RETURN
//! ```
//!
//! The single constructor takes no arguments, calls the supertype's
//! no-argument constructor and returns. A shim adds no behavior of its own.

use thiserror::Error;

use super::traits::ShimSynthesizer;
use crate::core::types::SymbolName;
use crate::world::Artifact;

const MAGIC: &[u8; 4] = b"RWSH";
const VERSION: u8 = 1;
const ACC_PUBLIC: u8 = 0x01;

/// Constructor instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Op {
    LoadSelf = 0x01,
    InvokeSuperInit = 0x02,
    Return = 0x03,
}

impl Op {
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Op::LoadSelf),
            0x02 => Some(Op::InvokeSuperInit),
            0x03 => Some(Op::Return),
            _ => None,
        }
    }
}

const TRIVIAL_CTOR: [Op; 3] = [Op::LoadSelf, Op::InvokeSuperInit, Op::Return];

/// Errors building or parsing shim images.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("name too long for shim image ({0} bytes)")]
    NameTooLong(usize),

    #[error("truncated shim image")]
    Truncated,

    #[error("bad magic")]
    BadMagic,

    #[error("unsupported shim image version {0}")]
    UnsupportedVersion(u8),

    #[error("invalid UTF-8 in shim image")]
    InvalidUtf8,

    #[error("unknown op 0x{0:02x}")]
    UnknownOp(u8),

    #[error("trailing bytes after shim image")]
    TrailingBytes,
}

/// An encoded shim plus the fields it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShimImage {
    bytes: Vec<u8>,
    name: String,
    supertype: String,
    public: bool,
    constructors: Vec<Vec<Op>>,
}

impl ShimImage {
    /// Build the trivial public shim `name` extending `supertype`.
    pub fn stub(name: &str, supertype: &str) -> Result<Self, ImageError> {
        let mut bytes = Vec::with_capacity(16 + name.len() + supertype.len());
        bytes.extend_from_slice(MAGIC);
        bytes.push(VERSION);
        bytes.push(ACC_PUBLIC);
        put_str(&mut bytes, name)?;
        put_str(&mut bytes, supertype)?;
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.push(ACC_PUBLIC);
        bytes.extend_from_slice(&(TRIVIAL_CTOR.len() as u16).to_le_bytes());
        bytes.extend(TRIVIAL_CTOR.iter().map(|op| *op as u8));

        Ok(Self {
            bytes,
            name: name.to_string(),
            supertype: supertype.to_string(),
            public: true,
            constructors: vec![TRIVIAL_CTOR.to_vec()],
        })
    }

    /// Decode and validate an image.
    pub fn parse(bytes: &[u8]) -> Result<Self, ImageError> {
        let mut reader = Reader { bytes, pos: 0 };
        if reader.take(4)? != MAGIC {
            return Err(ImageError::BadMagic);
        }
        let version = reader.u8()?;
        if version != VERSION {
            return Err(ImageError::UnsupportedVersion(version));
        }
        let public = reader.u8()? & ACC_PUBLIC != 0;
        let name = reader.string()?;
        let supertype = reader.string()?;

        let ctor_count = reader.u16()?;
        let mut constructors = Vec::with_capacity(usize::from(ctor_count));
        for _ in 0..ctor_count {
            let _access = reader.u8()?;
            let op_count = reader.u16()?;
            let ops = reader
                .take(usize::from(op_count))?
                .iter()
                .map(|&b| Op::from_byte(b).ok_or(ImageError::UnknownOp(b)))
                .collect::<Result<Vec<_>, _>>()?;
            constructors.push(ops);
        }
        if reader.pos != bytes.len() {
            return Err(ImageError::TrailingBytes);
        }

        Ok(Self {
            bytes: bytes.to_vec(),
            name,
            supertype,
            public,
            constructors,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn supertype(&self) -> &str {
        &self.supertype
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    pub fn constructors(&self) -> &[Vec<Op>] {
        &self.constructors
    }

    /// True if the image has exactly the trivial forwarding constructor.
    pub fn is_trivial(&self) -> bool {
        self.constructors.len() == 1 && self.constructors[0] == TRIVIAL_CTOR
    }
}

fn put_str(out: &mut Vec<u8>, s: &str) -> Result<(), ImageError> {
    let len = u16::try_from(s.len()).map_err(|_| ImageError::NameTooLong(s.len()))?;
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(s.as_bytes());
    Ok(())
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], ImageError> {
        let end = self.pos.checked_add(n).ok_or(ImageError::Truncated)?;
        let slice = self.bytes.get(self.pos..end).ok_or(ImageError::Truncated)?;
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, ImageError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, ImageError> {
        let raw = self.take(2)?;
        Ok(u16::from_le_bytes([raw[0], raw[1]]))
    }

    fn string(&mut self) -> Result<String, ImageError> {
        let len = self.u16()?;
        let raw = self.take(usize::from(len))?;
        String::from_utf8(raw.to_vec()).map_err(|_| ImageError::InvalidUtf8)
    }
}

/// Default synthesizer: emits [`ShimImage::stub`] images.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubSynthesizer;

impl ShimSynthesizer for StubSynthesizer {
    fn synthesize(&self, shim: &SymbolName, original: &Artifact) -> Result<ShimImage, ImageError> {
        ShimImage::stub(shim.as_str(), original.name().as_str())
    }
}
