/// Number of symbols in each Huffman code.  Note: for the literal/length
/// and offset codes, these are actually the maximum values; a given block
/// might use fewer symbols.
pub const DEFLATE_NUM_PRECODE_SYMS: usize = 19;
pub const DEFLATE_NUM_LITLEN_SYMS: usize = 288;
pub const DEFLATE_NUM_OFFSET_SYMS: usize = 32;

pub const DEFLATE_MAX_NUM_SYMS: usize = 288;

/// Order which precode lengths are stored
pub static DEFLATE_PRECODE_LENS_PERMUTATION: [u8; DEFLATE_NUM_PRECODE_SYMS] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// Maximum codeword length across all codes.
pub const DEFLATE_MAX_CODEWORD_LENGTH: usize = 15;
/// Maximum codeword length of the precode itself.
pub const DEFLATE_MAX_PRE_CODEWORD_LEN: u8 = 7;
pub const DEFLATE_MAX_LITLEN_CODEWORD_LENGTH: usize = 15;
pub const DEFLATE_MAX_OFFSET_CODEWORD_LENGTH: usize = 15;

pub const DEFLATE_BLOCKTYPE_UNCOMPRESSED: u64 = 0;
pub const DEFLATE_BLOCKTYPE_STATIC: u64 = 1;
pub const DEFLATE_BLOCKTYPE_DYNAMIC_HUFFMAN: u64 = 2;

/// Shortest representable match.
pub const DEFLATE_MIN_MATCH: usize = 3;
/// Longest representable match.
pub const DEFLATE_MAX_MATCH: usize = 258;
/// Largest supported back-reference distance / window size.
pub const DEFLATE_MAX_WINDOW_SIZE: usize = 1 << 15;

/// Root table bits for each of the three codes.
///
/// The sizes below them are the worst case number of entries the root
/// table plus all sub-tables can occupy for a valid code, the canonical
/// analysis for 288/32/19 symbols and a 15 (7 for the precode) bit
/// length cap.
pub const LITLEN_TABLE_BITS: usize = 9;
pub const LITLEN_ENOUGH: usize = 852;

pub const OFFSET_TABLEBITS: usize = 6;
pub const OFFSET_ENOUGH: usize = 592;

pub const PRECODE_TABLE_BITS: usize = 7;
pub const PRECODE_ENOUGH: usize = 128;

/*
 * Decode table entry layout, shared by the three codes:
 *
 *   bit  31      literal entry
 *   bits 16..30  payload: literal value, length/offset base or sub-table start
 *   bit  15      exceptional entry (needs the slow path)
 *   bit  14      sub-table pointer (only ever set together with bit 15)
 *   bit  13      end of block     (only ever set together with bit 15)
 *   bits 8..12   codeword length not counting extra bits, or sub-table bits
 *   bits 0..7    total bits to consume: codeword length plus extra bits
 *
 * `make_decode_table_entry` adds the codeword length into the two low
 * bytes, the static parts below carry everything else.
 */
pub const HUFFDEC_LITERAL: u32 = 0x8000_0000;
pub const HUFFDEC_EXCEPTIONAL: u32 = 0x0000_8000;
pub const HUFFDEC_SUITABLE_POINTER: u32 = 0x0000_4000;
pub const HUFFDEC_END_OF_BLOCK: u32 = 0x0000_2000;

/// (base, number of extra bits) for length symbols 257..=285.
pub static LENGTH_ENTRIES: [(u16, u8); 29] = [
    (3, 0),
    (4, 0),
    (5, 0),
    (6, 0),
    (7, 0),
    (8, 0),
    (9, 0),
    (10, 0),
    (11, 1),
    (13, 1),
    (15, 1),
    (17, 1),
    (19, 2),
    (23, 2),
    (27, 2),
    (31, 2),
    (35, 3),
    (43, 3),
    (51, 3),
    (59, 3),
    (67, 4),
    (83, 4),
    (99, 4),
    (115, 4),
    (131, 5),
    (163, 5),
    (195, 5),
    (227, 5),
    (258, 0),
];

/// (base, number of extra bits) for offset symbols 0..=29.
pub static OFFSET_ENTRIES: [(u16, u8); 30] = [
    (1, 0),
    (2, 0),
    (3, 0),
    (4, 0),
    (5, 1),
    (7, 1),
    (9, 2),
    (13, 2),
    (17, 3),
    (25, 3),
    (33, 4),
    (49, 4),
    (65, 5),
    (97, 5),
    (129, 6),
    (193, 6),
    (257, 7),
    (385, 7),
    (513, 8),
    (769, 8),
    (1025, 9),
    (1537, 9),
    (2049, 10),
    (3073, 10),
    (4097, 11),
    (6145, 11),
    (8193, 12),
    (12289, 12),
    (16385, 13),
    (24577, 13),
];

const fn make_precode_decode_results() -> [u32; DEFLATE_NUM_PRECODE_SYMS]
{
    let mut table = [0_u32; DEFLATE_NUM_PRECODE_SYMS];
    let mut sym = 0;

    while sym < DEFLATE_NUM_PRECODE_SYMS
    {
        table[sym] = (sym as u32) << 16;
        sym += 1;
    }
    table
}

const fn make_litlen_decode_results() -> [u32; DEFLATE_NUM_LITLEN_SYMS]
{
    let mut table = [0_u32; DEFLATE_NUM_LITLEN_SYMS];
    let mut sym = 0;

    while sym < 256
    {
        table[sym] = HUFFDEC_LITERAL | ((sym as u32) << 16);
        sym += 1;
    }
    table[256] = HUFFDEC_EXCEPTIONAL | HUFFDEC_END_OF_BLOCK;

    sym = 257;
    while sym < 286
    {
        let (base, extra) = LENGTH_ENTRIES[sym - 257];

        table[sym] = ((base as u32) << 16) | (extra as u32);
        sym += 1;
    }
    // symbols 286 and 287 never occur in valid data
    table[286] = HUFFDEC_EXCEPTIONAL;
    table[287] = HUFFDEC_EXCEPTIONAL;

    table
}

const fn make_offset_decode_results() -> [u32; DEFLATE_NUM_OFFSET_SYMS]
{
    let mut table = [0_u32; DEFLATE_NUM_OFFSET_SYMS];
    let mut sym = 0;

    while sym < 30
    {
        let (base, extra) = OFFSET_ENTRIES[sym];

        table[sym] = ((base as u32) << 16) | (extra as u32);
        sym += 1;
    }
    // symbols 30 and 31 never occur in valid data
    table[30] = HUFFDEC_EXCEPTIONAL;
    table[31] = HUFFDEC_EXCEPTIONAL;

    table
}

pub static PRECODE_DECODE_RESULTS: [u32; DEFLATE_NUM_PRECODE_SYMS] = make_precode_decode_results();
pub static LITLEN_DECODE_RESULTS: [u32; DEFLATE_NUM_LITLEN_SYMS] = make_litlen_decode_results();
pub static OFFSET_DECODE_RESULTS: [u32; DEFLATE_NUM_OFFSET_SYMS] = make_offset_decode_results();

/*
 * Encoder side tables.
 *
 * All of these are compile time constants so that no lazy one-time
 * initialization is needed anywhere.
 */

/// Number of literal/length symbols the encoder can emit, end of block
/// inclusive.
pub const L_CODES: usize = 286;
/// Number of distance symbols.
pub const D_CODES: usize = 30;
/// Number of symbols in the code-length code.
pub const BL_CODES: usize = 19;
/// End of block symbol.
pub const END_BLOCK: usize = 256;
/// Codeword length cap for the two main codes.
pub const MAX_BITS: usize = 15;
/// Codeword length cap for the code-length code.
pub const MAX_BL_BITS: usize = 7;

/// repeat previous length 3-6 times, 2 extra bits
pub const REP_3_6: usize = 16;
/// repeat zero length 3-10 times, 3 extra bits
pub const REPZ_3_10: usize = 17;
/// repeat zero length 11-138 times, 7 extra bits
pub const REPZ_11_138: usize = 18;

/// Extra bits carried by each code-length-code symbol.
pub static EXTRA_BL_BITS: [u8; BL_CODES] =
    [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 3, 7];

const fn make_extra_lbits() -> [u8; 29]
{
    let mut extra = [0_u8; 29];
    let mut i = 0;

    while i < 29
    {
        extra[i] = LENGTH_ENTRIES[i].1;
        i += 1;
    }
    extra
}

const fn make_extra_dbits() -> [u8; 30]
{
    let mut extra = [0_u8; 30];
    let mut i = 0;

    while i < 30
    {
        extra[i] = OFFSET_ENTRIES[i].1;
        i += 1;
    }
    extra
}

/// Extra bits carried by each length symbol, 257 based.
pub static EXTRA_LBITS: [u8; 29] = make_extra_lbits();
/// Extra bits carried by each distance symbol.
pub static EXTRA_DBITS: [u8; 30] = make_extra_dbits();

const fn make_length_code() -> [u8; 256]
{
    let mut table = [0_u8; 256];
    let mut length = 0_usize;
    let mut code = 0;

    while code < 28
    {
        let (_, extra) = LENGTH_ENTRIES[code];
        let mut n = 0;

        while n < (1 << extra)
        {
            table[length] = code as u8;
            length += 1;
            n += 1;
        }
        code += 1;
    }
    // length 258 owns its own code
    table[255] = 28;

    table
}

const fn make_dist_code() -> [u8; 512]
{
    let mut table = [0_u8; 512];
    let mut dist = 0_usize;
    let mut code = 0;

    // distances 1..=256, indexed by distance minus one
    while code < 16
    {
        let (_, extra) = OFFSET_ENTRIES[code];
        let mut n = 0;

        while n < (1 << extra)
        {
            table[dist] = code as u8;
            dist += 1;
            n += 1;
        }
        code += 1;
    }
    // distances 257..=32768, indexed by (distance - 1) >> 7
    dist >>= 7;
    while code < 30
    {
        let (_, extra) = OFFSET_ENTRIES[code];
        let mut n = 0;

        while n < (1 << (extra - 7))
        {
            table[256 + dist] = code as u8;
            dist += 1;
            n += 1;
        }
        code += 1;
    }

    table
}

/// Map a match length (3..=258) to a literal/length symbol minus 257.
pub static LENGTH_CODE: [u8; 256] = make_length_code();

/// Map a match distance to a distance symbol, see [`d_code`].
pub static DIST_CODE: [u8; 512] = make_dist_code();

/// Distance symbol for `dist`, where `dist` is the match distance minus one
#[inline(always)]
pub fn d_code(dist: usize) -> usize
{
    if dist < 256
    {
        usize::from(DIST_CODE[dist])
    }
    else
    {
        usize::from(DIST_CODE[256 + (dist >> 7)])
    }
}

/// Reverse the low `len` bits of `code`.
pub const fn bi_reverse(code: u16, len: u8) -> u16
{
    (code.reverse_bits()) >> (16 - len)
}

const fn make_static_litlen_lens() -> [u8; DEFLATE_NUM_LITLEN_SYMS]
{
    let mut lens = [0_u8; DEFLATE_NUM_LITLEN_SYMS];
    let mut i = 0;

    while i < 144
    {
        lens[i] = 8;
        i += 1;
    }
    while i < 256
    {
        lens[i] = 9;
        i += 1;
    }
    while i < 280
    {
        lens[i] = 7;
        i += 1;
    }
    while i < 288
    {
        lens[i] = 8;
        i += 1;
    }
    lens
}

const fn make_static_litlen_codes() -> [u16; DEFLATE_NUM_LITLEN_SYMS]
{
    let lens = make_static_litlen_lens();

    let mut bl_count = [0_u16; MAX_BITS + 1];
    let mut i = 0;

    while i < DEFLATE_NUM_LITLEN_SYMS
    {
        bl_count[lens[i] as usize] += 1;
        i += 1;
    }

    let mut next_code = [0_u16; MAX_BITS + 1];
    let mut code = 0_u16;
    let mut bits = 1;

    while bits <= MAX_BITS
    {
        code = (code + bl_count[bits - 1]) << 1;
        next_code[bits] = code;
        bits += 1;
    }

    let mut codes = [0_u16; DEFLATE_NUM_LITLEN_SYMS];

    i = 0;
    while i < DEFLATE_NUM_LITLEN_SYMS
    {
        let len = lens[i];

        codes[i] = bi_reverse(next_code[len as usize], len);
        next_code[len as usize] += 1;
        i += 1;
    }
    codes
}

const fn make_static_dist_codes() -> [u16; DEFLATE_NUM_OFFSET_SYMS]
{
    let mut codes = [0_u16; DEFLATE_NUM_OFFSET_SYMS];
    let mut i = 0;

    while i < DEFLATE_NUM_OFFSET_SYMS
    {
        codes[i] = bi_reverse(i as u16, 5);
        i += 1;
    }
    codes
}

/// Code length of every literal/length symbol in the static code.
pub static STATIC_LITLEN_LENS: [u8; DEFLATE_NUM_LITLEN_SYMS] = make_static_litlen_lens();

/// Bit-reversed codewords of the static literal/length code, ready
/// to be written least significant bit first.
pub static STATIC_LITLEN_CODES: [u16; DEFLATE_NUM_LITLEN_SYMS] = make_static_litlen_codes();

/// Bit-reversed codewords of the static distance code, all 5 bits.
pub static STATIC_DIST_CODES: [u16; DEFLATE_NUM_OFFSET_SYMS] = make_static_dist_codes();
