//! byte encodings at the transport boundary
//!
//! layout:
//!   - field element / scalar: 32 bytes little-endian, canonical
//!   - point: X || Y || Z (96 bytes)
//!   - ciphertext: c0 || c1 (192 bytes)
//!
//! decoding rejects non-canonical field elements and points off the curve.

use crate::curve::{CurveParams, EcPoint};
use crate::error::{Result, ShuffleError};
use crate::field::{self, Fq, Fr, FIELD_BYTES};

pub const POINT_BYTES: usize = 3 * FIELD_BYTES;
pub const SCALAR_BYTES: usize = FIELD_BYTES;

pub fn point_to_bytes(p: &EcPoint) -> [u8; POINT_BYTES] {
    let mut out = [0u8; POINT_BYTES];
    out[..32].copy_from_slice(&field::to_le_bytes(&p.x));
    out[32..64].copy_from_slice(&field::to_le_bytes(&p.y));
    out[64..].copy_from_slice(&field::to_le_bytes(&p.z));
    out
}

pub fn point_from_bytes(params: &CurveParams, bytes: &[u8; POINT_BYTES]) -> Result<EcPoint> {
    let mut reader = ByteReader::new(bytes);
    let p = reader.read_point(params)?;
    reader.finish()?;
    Ok(p)
}

pub fn scalar_to_bytes(s: &Fr) -> [u8; SCALAR_BYTES] {
    field::to_le_bytes(s)
}

pub fn scalar_from_bytes(bytes: &[u8; SCALAR_BYTES]) -> Result<Fr> {
    field::from_le_bytes(bytes)
        .ok_or_else(|| ShuffleError::InvalidEncoding("non-canonical scalar".into()))
}

/// hex of the 96-byte point encoding
pub fn point_to_hex(p: &EcPoint) -> String {
    hex::encode(point_to_bytes(p))
}

pub fn point_from_hex(params: &CurveParams, s: &str) -> Result<EcPoint> {
    let raw = hex::decode(s).map_err(|e| ShuffleError::InvalidEncoding(e.to_string()))?;
    let bytes: [u8; POINT_BYTES] = raw.as_slice().try_into().map_err(|_| {
        ShuffleError::InvalidEncoding(format!("point: expected {} bytes, got {}", POINT_BYTES, raw.len()))
    })?;
    point_from_bytes(params, &bytes)
}

/// cursor over an untrusted byte slice
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| ShuffleError::InvalidEncoding("unexpected end of input".into()))?;
        let out = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(out)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_fq(&mut self) -> Result<Fq> {
        field::from_le_bytes(&self.read_array()?)
            .ok_or_else(|| ShuffleError::InvalidEncoding("non-canonical field element".into()))
    }

    pub fn read_scalar(&mut self) -> Result<Fr> {
        scalar_from_bytes(&self.read_array()?)
    }

    pub fn read_point(&mut self, params: &CurveParams) -> Result<EcPoint> {
        let p = EcPoint::new(self.read_fq()?, self.read_fq()?, self.read_fq()?);
        params
            .check_on_curve(&p)
            .map_err(|_| ShuffleError::InvalidPoint("decoded point not on curve"))?;
        Ok(p)
    }

    pub fn read_points(&mut self, params: &CurveParams, n: usize) -> Result<Vec<EcPoint>> {
        (0..n).map(|_| self.read_point(params)).collect()
    }

    /// length-prefixed count, bounded by what the remaining input could hold
    pub fn read_len(&mut self, item_bytes: usize) -> Result<usize> {
        let n = self.read_u32()? as usize;
        let remaining = self.bytes.len() - self.offset;
        if n.saturating_mul(item_bytes) > remaining {
            return Err(ShuffleError::InvalidEncoding(format!(
                "length {} exceeds remaining input",
                n
            )));
        }
        Ok(n)
    }

    /// error on trailing bytes
    pub fn finish(self) -> Result<()> {
        if self.offset != self.bytes.len() {
            return Err(ShuffleError::InvalidEncoding(format!(
                "{} trailing bytes",
                self.bytes.len() - self.offset
            )));
        }
        Ok(())
    }
}
