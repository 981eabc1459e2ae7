//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use bytes::{Buf, BufMut, Bytes, BytesMut};
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::key::{KeyId, Ski};
use crate::packet::consts::{
    AttrFlags, AttrType, MAX_SIGNATURE_BLOCKS, SKI_LENGTH, SegmentFlags,
};
use crate::packet::error::{AttrError, DecodeError};

//
// BGPsec_PATH attribute.
//
// Encoding format (attribute value):
//
// +-----------------------------------------------+
// | Secure_Path                                   |
// +-----------------------------------------------+
// | Sequence of one or two Signature_Blocks       |
// +-----------------------------------------------+
//
// Secure_Path:
//
// +-----------------------------------------------+
// | Secure_Path Length                (2 octets)  |
// +-----------------------------------------------+
// | One or More Secure_Path Segments  (variable)  |
// +-----------------------------------------------+
//
// Secure_Path Segment:
//
// +-----------------------------------------------+
// | Flags                             (1 octet)   |
// +-----------------------------------------------+
// | pCount                            (1 octet)   |
// +-----------------------------------------------+
// | AS Number                         (4 octets)  |
// +-----------------------------------------------+
//
// Signature_Block:
//
// +---------------------------------------------+
// | Algorithm Suite Identifier    (1 octet)     |
// +---------------------------------------------+
// | Signature_Block Length        (2 octets)    |
// +---------------------------------------------+
// | Sequence of Signature Segments (variable)   |
// +---------------------------------------------+
//
// Signature Segment:
//
// +---------------------------------------------+
// | Subject Key Identifier (SKI)  (20 octets)   |
// +---------------------------------------------+
// | Signature Length              (2 octets)    |
// +---------------------------------------------+
// | Signature                     (variable)    |
// +---------------------------------------------+
//
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct BgpsecPath {
    pub flags: AttrFlags,
    pub secure_path: Vec<SecurePathSegment>,
    pub sig_blocks: SmallVec<[SignatureBlock; MAX_SIGNATURE_BLOCKS]>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct SecurePathSegment {
    pub flags: SegmentFlags,
    pub pcount: u8,
    pub asn: u32,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct SignatureBlock {
    pub algo_id: u8,
    pub segments: Vec<SignatureSegment>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct SignatureSegment {
    pub ski: Ski,
    pub signature: Bytes,
}

// ===== impl BgpsecPath =====

impl BgpsecPath {
    const SECURE_PATH_HDR_LEN: u16 = 2;

    pub fn new(
        secure_path: Vec<SecurePathSegment>,
        sig_blocks: impl IntoIterator<Item = SignatureBlock>,
    ) -> BgpsecPath {
        BgpsecPath {
            flags: AttrFlags::OPTIONAL,
            secure_path,
            sig_blocks: sig_blocks.into_iter().collect(),
        }
    }

    // Encodes the full path attribute, header included. The extended length
    // flag is always set.
    pub fn encode(&self, buf: &mut BytesMut) {
        let mut attr_flags = self.flags;
        attr_flags.insert(AttrFlags::EXTENDED);
        buf.put_u8(attr_flags.bits());
        buf.put_u8(AttrType::BgpsecPath as u8);

        // The length field will be initialized later.
        let start_pos = buf.len();
        buf.put_u16(0);

        // Encode Secure_Path.
        buf.put_u16(self.secure_path_length());
        for segment in &self.secure_path {
            segment.encode(buf);
        }

        // Encode Signature_Blocks.
        for block in &self.sig_blocks {
            block.encode(buf);
        }

        // Rewrite attribute length.
        let attr_len = (buf.len() - start_pos - 2) as u16;
        buf[start_pos..start_pos + 2].copy_from_slice(&attr_len.to_be_bytes());
    }

    // Decodes a full path attribute, header included.
    //
    // Bytes following the end of the attribute, as given by its length
    // field, are left in the buffer.
    pub fn decode(buf: &mut Bytes) -> Result<BgpsecPath, DecodeError> {
        // Parse attribute flags and type.
        let attr_flags = AttrFlags::from_bits_truncate(buf.try_get_u8()?);
        let attr_type = buf.try_get_u8()?;
        if AttrType::from_u8(attr_type) != Some(AttrType::BgpsecPath) {
            return Err(DecodeError::NotBgpsecAttribute(attr_type));
        }

        // Parse attribute length.
        let attr_len = if attr_flags.contains(AttrFlags::EXTENDED) {
            buf.try_get_u16()?
        } else {
            buf.try_get_u8()? as u16
        };
        if attr_len as usize > buf.remaining() {
            return Err(AttrError::AttrLength(attr_len).into());
        }
        let mut buf = buf.split_to(attr_len as usize);

        let path = BgpsecPath::decode_value(&mut buf, attr_flags)?;
        Ok(path)
    }

    fn decode_value(
        buf: &mut Bytes,
        flags: AttrFlags,
    ) -> Result<BgpsecPath, AttrError> {
        // Parse Secure_Path length. RFC 8205 requires at least one
        // Secure_Path segment.
        let sp_len = buf.try_get_u16()?;
        if sp_len < Self::SECURE_PATH_HDR_LEN + SecurePathSegment::LENGTH
            || (sp_len - Self::SECURE_PATH_HDR_LEN) % SecurePathSegment::LENGTH
                != 0
            || (sp_len - Self::SECURE_PATH_HDR_LEN) as usize > buf.remaining()
        {
            return Err(AttrError::SecurePathLength(sp_len));
        }

        // Parse Secure_Path segments.
        let num_segments = ((sp_len - Self::SECURE_PATH_HDR_LEN)
            / SecurePathSegment::LENGTH) as usize;
        let secure_path = (0..num_segments)
            .map(|_| SecurePathSegment::decode(buf))
            .collect::<Result<Vec<_>, _>>()?;

        // Parse Signature_Blocks.
        let mut sig_blocks = SmallVec::new();
        while buf.remaining() > 0 && sig_blocks.len() < MAX_SIGNATURE_BLOCKS {
            let block = SignatureBlock::decode(buf, num_segments)?;
            sig_blocks.push(block);
        }

        // Anything past the last Signature_Block is an error.
        if buf.remaining() > 0 {
            return Err(AttrError::TrailingData(buf.remaining()));
        }

        Ok(BgpsecPath {
            flags,
            secure_path,
            sig_blocks,
        })
    }

    // Returns the length of the Secure_Path, including its length field.
    pub fn secure_path_length(&self) -> u16 {
        Self::SECURE_PATH_HDR_LEN
            + self.secure_path.len() as u16 * SecurePathSegment::LENGTH
    }

    // Returns the ASNs of the Secure_Path, in path order.
    pub fn asns(&self) -> impl Iterator<Item = u32> + '_ {
        self.secure_path.iter().map(|segment| segment.asn)
    }

    // Checks the structural constraints the decoder enforces on the wire:
    // a non-empty Secure_Path, at most two Signature_Blocks, and exactly one
    // Signature Segment per Secure_Path segment in every block.
    pub fn validate(&self) -> Result<(), AttrError> {
        if self.secure_path.is_empty() {
            return Err(AttrError::SecurePathLength(self.secure_path_length()));
        }
        if self.sig_blocks.len() > MAX_SIGNATURE_BLOCKS {
            return Err(AttrError::SignatureBlockCount(self.sig_blocks.len()));
        }
        if let Some(block) = self
            .sig_blocks
            .iter()
            .find(|block| block.segments.len() != self.secure_path.len())
        {
            return Err(AttrError::SignatureSegmentCount(block.segments.len()));
        }

        Ok(())
    }

    // Returns the key triples required to validate each Signature_Block,
    // together with the index of the block they belong to.
    pub fn key_ids(&self) -> impl Iterator<Item = (usize, KeyId)> + '_ {
        self.sig_blocks
            .iter()
            .enumerate()
            .flat_map(move |(idx, block)| {
                self.secure_path.iter().zip(block.segments.iter()).map(
                    move |(segment, sig)| {
                        (idx, KeyId::new(segment.asn, block.algo_id, sig.ski))
                    },
                )
            })
    }
}

// ===== impl SecurePathSegment =====

impl SecurePathSegment {
    pub const LENGTH: u16 = 6;

    pub fn new(asn: u32) -> SecurePathSegment {
        SecurePathSegment {
            flags: SegmentFlags::empty(),
            pcount: 1,
            asn,
        }
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.flags.bits());
        buf.put_u8(self.pcount);
        buf.put_u32(self.asn);
    }

    fn decode(buf: &mut Bytes) -> Result<SecurePathSegment, AttrError> {
        let flags = SegmentFlags::from_bits_truncate(buf.try_get_u8()?);
        let pcount = buf.try_get_u8()?;
        let asn = buf.try_get_u32()?;

        Ok(SecurePathSegment { flags, pcount, asn })
    }
}

// ===== impl SignatureBlock =====

impl SignatureBlock {
    const HDR_LEN: u16 = 3;

    pub fn new(algo_id: u8, segments: Vec<SignatureSegment>) -> SignatureBlock {
        SignatureBlock { algo_id, segments }
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.algo_id);

        // The length field will be initialized later.
        let start_pos = buf.len();
        buf.put_u16(0);

        for segment in &self.segments {
            segment.encode(buf);
        }

        // Rewrite block length. It accounts for the algorithm identifier and
        // for the length field itself.
        let block_len = (buf.len() - start_pos + 1) as u16;
        buf[start_pos..start_pos + 2]
            .copy_from_slice(&block_len.to_be_bytes());
    }

    fn decode(
        buf: &mut Bytes,
        num_segments: usize,
    ) -> Result<SignatureBlock, AttrError> {
        let algo_id = buf.try_get_u8()?;
        let block_len = buf.try_get_u16()?;
        if block_len < Self::HDR_LEN
            || (block_len - Self::HDR_LEN) as usize > buf.remaining()
        {
            return Err(AttrError::SignatureBlockLength(block_len));
        }
        let mut buf = buf.split_to((block_len - Self::HDR_LEN) as usize);

        // There must be exactly one Signature Segment per Secure_Path
        // segment, filling the whole block.
        let segments = (0..num_segments)
            .map(|_| SignatureSegment::decode(&mut buf))
            .collect::<Result<Vec<_>, _>>()?;
        if buf.remaining() > 0 {
            return Err(AttrError::SignatureBlockLength(block_len));
        }

        Ok(SignatureBlock { algo_id, segments })
    }
}

// ===== impl SignatureSegment =====

impl SignatureSegment {
    pub fn new(ski: Ski, signature: impl Into<Bytes>) -> SignatureSegment {
        SignatureSegment {
            ski,
            signature: signature.into(),
        }
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_slice(&self.ski.0);
        buf.put_u16(self.signature.len() as u16);
        buf.put_slice(&self.signature);
    }

    fn decode(buf: &mut Bytes) -> Result<SignatureSegment, AttrError> {
        let mut ski = [0; SKI_LENGTH];
        buf.try_copy_to_slice(&mut ski)?;

        let sig_len = buf.try_get_u16()?;
        if sig_len as usize > buf.remaining() {
            return Err(AttrError::SignatureLength(sig_len));
        }
        let signature = buf.split_to(sig_len as usize);

        Ok(SignatureSegment {
            ski: Ski(ski),
            signature,
        })
    }
}
