//! `BitStreamReader` and `BitStreamWriter` API
//!
//! This module provides an interface to read and write bits (and bytes)
//! for the huffman and stored block paths.
//!
//! Deflate is little endian bit order: bit zero of a byte is the first
//! bit of the stream, a multi-bit field is read least significant bit
//! first across byte boundaries. The reader therefore shifts new bytes
//! in at the top of the accumulator and hands values out from the
//! bottom; the writer is the mirror image.

pub struct BitStreamReader<'src>
{
    /// compressed bytes this reader drains
    src:      &'src [u8],
    /// next byte of `src` to pull in; everything before it has either
    /// been consumed or is parked in `buffer`
    position: usize,

    pub bits_left: u8,
    pub buffer:    u64,
}

impl<'src> BitStreamReader<'src>
{
    /// Start a reader at the beginning of `in_buffer`.
    pub fn new(in_buffer: &'src [u8]) -> BitStreamReader<'src>
    {
        BitStreamReader {
            bits_left: 0,
            buffer:    0,
            src:       in_buffer,
            position:  0,
        }
    }

    /// Create a reader that continues where a previous one suspended,
    /// re-seeding the accumulator that was saved off.
    ///
    /// Bytes already inside `buffer` count as consumed from the caller's
    /// point of view, so `in_buffer` must start at the first byte not
    /// yet pulled in.
    pub fn new_with_state(in_buffer: &'src [u8], buffer: u64, bits_left: u8) -> BitStreamReader<'src>
    {
        debug_assert!(bits_left <= 63);

        BitStreamReader {
            bits_left,
            buffer,
            src: in_buffer,
            position: 0,
        }
    }

    /// Pull input bytes into the accumulator until it holds at least
    /// 56 bits, or the source runs dry, whichever comes first.
    ///
    /// 56 is the point where one more whole byte may no longer fit, so
    /// after a refill the count sits somewhere in 56..=63 and any
    /// deflate codeword plus its extra bits can be taken without
    /// another check.
    #[inline(always)]
    pub fn refill(&mut self)
    {
        match self.src.get(self.position..self.position + 8)
        {
            Some(next8) =>
            {
                let mut raw = [0_u8; 8];

                raw.copy_from_slice(next8);

                // splice a whole little endian word on top of the held
                // bits; only the bytes with room to spare count as
                // taken, the rest will be loaded again next time
                let fitting = (63 - self.bits_left) >> 3;

                self.buffer |= u64::from_le_bytes(raw) << self.bits_left;
                self.bits_left += fitting * 8;
                self.position += usize::from(fitting);
            }
            None => self.refill_tail(),
        }
    }
    /// The last few bytes of the source cannot be loaded as one word,
    /// feed them in individually.
    #[inline(never)]
    fn refill_tail(&mut self)
    {
        while self.bits_left < 56
        {
            match self.src.get(self.position)
            {
                Some(byte) =>
                {
                    self.buffer |= u64::from(*byte) << self.bits_left;
                    self.bits_left += 8;
                    self.position += 1;
                }
                None => return,
            }
        }
    }

    #[inline(always)]
    pub fn peek_var_bits(&self, lookahead: usize) -> usize
    {
        (self.buffer & ((1 << lookahead) - 1)) as usize
    }
    /// Peek `lookahead` bits that sit `offset` bits into the buffer,
    /// without consuming anything. Used for sub-table lookups.
    #[inline(always)]
    pub fn peek_bits_offset(&self, offset: u8, lookahead: usize) -> usize
    {
        ((self.buffer >> offset) & ((1 << lookahead) - 1)) as usize
    }

    #[inline(always)]
    pub fn get_bits(&mut self, num_bits: u8) -> u64
    {
        debug_assert!(self.bits_left >= num_bits);

        let mask = (1_u64 << num_bits) - 1;

        let value = self.buffer & mask;

        self.buffer >>= num_bits;

        self.bits_left -= num_bits;

        value
    }

    /// Get position the stream is in this buffer, i.e the number of
    /// bytes pulled out of it, including bytes still sitting in the
    /// accumulator.
    pub const fn get_position(&self) -> usize
    {
        self.position
    }

    /// Discard bits up to the next byte boundary.
    pub fn align_to_byte(&mut self)
    {
        let partial = self.bits_left & 7;

        self.buffer >>= partial;
        self.bits_left -= partial;
    }

    /// Take a whole byte out of the accumulator.
    ///
    /// Only valid on a byte aligned reader with at least 8 bits held.
    pub fn get_aligned_byte(&mut self) -> u8
    {
        debug_assert!(self.bits_left & 7 == 0);

        self.get_bits(8) as u8
    }

    /// Return true if the bit buffer can satisfy
    /// `bits` read without refilling,
    pub const fn has(&self, bits: u8) -> bool
    {
        self.bits_left >= bits
    }

    #[inline(always)]
    pub fn drop_bits(&mut self, bits: u8)
    {
        debug_assert!(self.bits_left >= bits);
        self.bits_left -= bits;
        self.buffer >>= bits;
    }

    /// Return the remaining bytes in this stream.
    ///
    /// This does not consider bits in the bit-buffer hence
    /// may not be accurate
    pub const fn remaining_bytes(&self) -> usize
    {
        self.src.len().saturating_sub(self.position)
    }

    /// Bytes left counting whole bytes parked in the accumulator too.
    pub const fn remaining_bytes_with_buffer(&self) -> usize
    {
        self.remaining_bytes() + (self.bits_left >> 3) as usize
    }

    /// Copy up to `dest.len()` already-aligned bytes, draining the
    /// accumulator before touching the source slice. Returns how many
    /// bytes were written.
    ///
    /// Used for stored blocks, where the payload is raw bytes.
    pub fn read_aligned_bytes(&mut self, dest: &mut [u8]) -> usize
    {
        debug_assert!(self.bits_left & 7 == 0);

        let mut written = 0;

        while written < dest.len() && self.bits_left >= 8
        {
            dest[written] = self.get_aligned_byte();
            written += 1;
        }

        let from_src = (dest.len() - written).min(self.remaining_bytes());

        dest[written..written + from_src]
            .copy_from_slice(&self.src[self.position..self.position + from_src]);

        self.position += from_src;
        written += from_src;

        written
    }
}

/// The mirror image of the reader: values shift in above the bits
/// already held, whole bytes spill out the bottom into `pending`.
pub struct BitStreamWriter
{
    buffer:    u64,
    bits_left: u8,
}

impl BitStreamWriter
{
    pub const fn new() -> BitStreamWriter
    {
        BitStreamWriter {
            buffer:    0,
            bits_left: 0,
        }
    }

    /// Append the low `num_bits` bits of `value` to the stream.
    #[inline(always)]
    pub fn put_bits(&mut self, pending: &mut Vec<u8>, value: u64, num_bits: u8)
    {
        debug_assert!(num_bits <= 48);

        let mask = (1_u64 << num_bits) - 1;

        self.buffer |= (value & mask) << self.bits_left;
        self.bits_left += num_bits;

        while self.bits_left >= 8
        {
            pending.push(self.buffer as u8);
            self.buffer >>= 8;
            self.bits_left -= 8;
        }
    }

    /// Pad with zero bits up to the next byte boundary and spill
    /// everything held.
    pub fn align_to_byte(&mut self, pending: &mut Vec<u8>)
    {
        if self.bits_left > 0
        {
            pending.push(self.buffer as u8);
            self.buffer = 0;
            self.bits_left = 0;
        }
    }

    /// Number of bits buffered and not yet spilled, 0..=7.
    pub const fn pending_bits(&self) -> u8
    {
        self.bits_left
    }

    pub fn reset(&mut self)
    {
        self.buffer = 0;
        self.bits_left = 0;
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn reader_reads_lsb_first()
    {
        // 0b0101_1101, 0b1111_0000
        let data = [0x5D, 0xF0];
        let mut reader = BitStreamReader::new(&data);

        reader.refill();
        assert_eq!(reader.get_bits(3), 0b101);
        assert_eq!(reader.get_bits(5), 0b01011);
        assert_eq!(reader.get_bits(8), 0xF0);
    }

    #[test]
    fn reader_resumes_bit_exact()
    {
        let data = [0xA7, 0x34, 0x91];
        let mut reader = BitStreamReader::new(&data[..1]);

        reader.refill();
        assert_eq!(reader.get_bits(5), 0xA7 & 0x1F);

        // suspend with 3 bits held, resume with the rest of the input
        let (hold, bits) = (reader.buffer, reader.bits_left);
        let mut reader = BitStreamReader::new_with_state(&data[1..], hold, bits);

        reader.refill();
        // 3 leftover bits of 0xA7 then 0x34
        assert_eq!(reader.get_bits(11), (0xA7_u64 >> 5) | (0x34 << 3));
        assert_eq!(reader.get_bits(8), 0x91);
    }

    #[test]
    fn aligned_byte_reads_drain_accumulator_first()
    {
        let data = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
        let mut reader = BitStreamReader::new(&data);

        reader.refill();
        reader.get_bits(4);
        reader.align_to_byte();

        let mut out = [0_u8; 9];
        assert_eq!(reader.read_aligned_bytes(&mut out), 9);
        assert_eq!(out, [2, 3, 4, 5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn writer_round_trips_reader()
    {
        let mut pending = vec![];
        let mut writer = BitStreamWriter::new();

        writer.put_bits(&mut pending, 0b101, 3);
        writer.put_bits(&mut pending, 0x1234, 16);
        writer.put_bits(&mut pending, 0b1, 1);
        writer.align_to_byte(&mut pending);

        let mut reader = BitStreamReader::new(&pending);

        reader.refill();
        assert_eq!(reader.get_bits(3), 0b101);
        assert_eq!(reader.get_bits(16), 0x1234);
        assert_eq!(reader.get_bits(1), 0b1);
    }
}
