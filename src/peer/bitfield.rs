use bytes::Bytes;

/// A set of piece indices, stored one bit per piece.
///
/// Bit `i` of byte `j` (counting from the most significant bit) is piece
/// `8j + i`, as on the wire. The session's claimed-pieces mirror grows on
/// demand, since the number of pieces is not known at the transport layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bitfield {
    bits: Vec<u8>,
    num_bits: usize,
}

impl Bitfield {
    /// Creates an empty bitfield addressing `piece_count` pieces.
    pub fn new(piece_count: usize) -> Self {
        Self {
            bits: vec![0; piece_count.div_ceil(8)],
            num_bits: piece_count,
        }
    }

    /// Creates a bitfield from wire bytes for a known piece count.
    ///
    /// Spare trailing bits within the last byte are cleared.
    pub fn from_bytes(bytes: &[u8], piece_count: usize) -> Self {
        let mut bits = bytes.to_vec();
        bits.resize(piece_count.div_ceil(8), 0);

        let mut bitfield = Self {
            bits,
            num_bits: piece_count,
        };
        bitfield.clear_spare_bits();
        bitfield
    }

    /// Returns `true` if the piece at `index` is in the set.
    pub fn has(&self, index: usize) -> bool {
        if index >= self.num_bits {
            return false;
        }
        (self.bits[index / 8] >> (7 - index % 8)) & 1 == 1
    }

    /// Adds the piece at `index`, growing the bitfield if needed.
    pub fn set(&mut self, index: usize) {
        if index >= self.num_bits {
            self.num_bits = index + 1;
            self.bits.resize(self.num_bits.div_ceil(8), 0);
        }
        self.bits[index / 8] |= 1 << (7 - index % 8);
    }

    /// Removes the piece at `index`.
    pub fn clear(&mut self, index: usize) {
        if index < self.num_bits {
            self.bits[index / 8] &= !(1 << (7 - index % 8));
        }
    }

    /// ORs raw wire bytes into this bitfield, growing it if needed.
    pub fn union_with(&mut self, bytes: &[u8]) {
        if bytes.len() > self.bits.len() {
            self.bits.resize(bytes.len(), 0);
        }
        if bytes.len() * 8 > self.num_bits {
            self.num_bits = bytes.len() * 8;
        }
        for (ours, theirs) in self.bits.iter_mut().zip(bytes) {
            *ours |= theirs;
        }
    }

    /// Returns the number of pieces in the set.
    pub fn count_ones(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Returns the number of addressable pieces.
    pub fn len(&self) -> usize {
        self.num_bits
    }

    /// Returns `true` if no piece is in the set.
    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&b| b == 0)
    }

    /// Returns the raw wire bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    /// Copies the bitfield into owned wire bytes.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.bits)
    }

    fn clear_spare_bits(&mut self) {
        let spare = self.bits.len() * 8 - self.num_bits;
        if spare > 0 {
            if let Some(last) = self.bits.last_mut() {
                *last &= 0xFFu8 << spare;
            }
        }
    }
}
