//! Canonical Huffman decode table construction.
//!
//! Tables are arrays of packed u32 entries (layout documented in
//! `constants.rs`): a root table directly indexed by `root_bits` of
//! lookahead, with longer codewords spilling into sub-tables linked from
//! the root through pointer entries. Sub-table links are indices into
//! the same array, never addresses.

use crate::constants::{
    DEFLATE_MAX_CODEWORD_LENGTH, DEFLATE_MAX_NUM_SYMS, HUFFDEC_EXCEPTIONAL,
    HUFFDEC_SUITABLE_POINTER,
};
use crate::errors::DecodeErrorStatus;
use crate::utils::make_decode_table_entry;

/// Step a bit-reversed codeword to its canonical successor of the same
/// length.
///
/// Deflate sends the high bit of a codeword first, so table indices
/// hold codewords reversed and "add one" has to carry from the top
/// end instead of the bottom: clear set bits downwards from position
/// `len - 1`, then set the first clear one found. When the codeword
/// was all ones there is no successor and zero comes back; that only
/// happens after the final codeword of a complete code, where the
/// value is never used again. Moving on to a longer length afterwards
/// appends zeros to the codeword, which in reversed form changes
/// nothing.
fn next_codeword(mut codeword: usize, len: usize) -> usize
{
    let mut bit = 1 << (len - 1);

    while bit != 0 && codeword & bit != 0
    {
        codeword ^= bit;
        bit >>= 1;
    }
    codeword | bit
}

/// Store `entry` at `first` and then every `stride` slots up to `end`.
///
/// A codeword shorter than the index width of its (sub-)table owns
/// every slot whose low bits spell it, and those slots sit exactly one
/// stride of `2^len` apart.
fn spread_entry(table: &mut [u32], first: usize, end: usize, stride: usize, entry: u32)
{
    let mut slot = first;

    while slot < end
    {
        table[slot] = entry;
        slot += stride;
    }
}

/// Build the decode table for one code.
///
/// `lens` holds one codeword length per symbol, zero meaning unused.
/// `decode_results` is the per-symbol static entry part, `table_bits`
/// the wanted root table size in bits.
///
/// Returns the effective root bits, which may be smaller than
/// `table_bits` when every codeword is short; the caller must mask its
/// lookahead with the returned value. Exactly `1 << effective` root
/// entries plus any sub-tables are written.
///
/// Over-subscribed length sets, and under-subscribed sets other than
/// the empty code and the single length-one symbol (both of which real
/// streams produce), are rejected.
pub(crate) fn build_decode_table(
    lens: &[u8], decode_results: &[u32], decode_table: &mut [u32], table_bits: usize,
    num_syms: usize, max_codeword_len: usize,
) -> Result<usize, DecodeErrorStatus>
{
    // histogram of codeword lengths
    let mut len_counts = [0_u32; DEFLATE_MAX_CODEWORD_LENGTH + 1];

    for &len in &lens[..num_syms]
    {
        len_counts[usize::from(len)] += 1;
    }

    // the table only has to resolve lengths that actually occur, and
    // shrinking the root to the longest one keeps short codes cheap
    let mut max_len = max_codeword_len;

    while max_len > 1 && len_counts[max_len] == 0
    {
        max_len -= 1;
    }
    let root_bits = table_bits.min(max_len);

    // Kraft sum scaled to 2^max_len: a codeword of length l claims a
    // 2^(max_len - l) share of the codespace
    let mut used = 0_u64;

    for len in 1..=max_len
    {
        used += u64::from(len_counts[len]) << (max_len - len);
    }
    if used > 1 << max_len
    {
        return Err(DecodeErrorStatus::Generic("over-subscribed code lengths"));
    }

    // counting sort the used symbols by length, ties in symbol order,
    // which is exactly the order their canonical codewords increase in
    let mut sorted = [0_u16; DEFLATE_MAX_NUM_SYMS];
    let mut next_slot = [0_usize; DEFLATE_MAX_CODEWORD_LENGTH + 1];
    let mut start = 0_usize;

    for len in 1..=max_len
    {
        next_slot[len] = start;
        start += len_counts[len] as usize;
    }
    let used_syms = start;

    for (sym, &len) in lens[..num_syms].iter().enumerate()
    {
        if len != 0
        {
            sorted[next_slot[usize::from(len)]] = sym as u16;
            next_slot[usize::from(len)] += 1;
        }
    }

    if used < 1 << max_len
    {
        /*
         * Short code sets. A code with no symbols at all is legal, a
         * deflate block need not contain a single match and then its
         * distance code is empty; the table contents are arbitrary
         * because no lookup will ever be made. A lone symbol with a
         * one bit codeword is tolerated too since widespread encoders
         * emit it; it gets both the 0 and the 1 codeword so that a
         * lookup cannot land anywhere undefined. Any other shortfall
         * leaves real holes in the codespace and is rejected.
         */
        let entry = if used == 0
        {
            make_decode_table_entry(decode_results, 0, 1)
        }
        else if len_counts[1] == 1 && used == 1 << (max_len - 1)
        {
            make_decode_table_entry(decode_results, usize::from(sorted[0]), 1)
        }
        else
        {
            return Err(DecodeErrorStatus::Generic("incomplete code lengths"));
        };

        decode_table[..1 << root_bits].fill(entry);
        return Ok(root_bits);
    }

    /*
     * The lengths fill the codespace exactly. Walk the symbols in
     * canonical order while stepping the (bit-reversed) codeword along
     * with them; `rest` counts down what is still to be placed per
     * length, which is what sizing a sub-table needs to know.
     */
    let mut rest = len_counts;
    let mut codeword = 0_usize;
    let mut i = 0_usize;

    // codewords short enough to live in the root table directly
    while i < used_syms
    {
        let sym = usize::from(sorted[i]);
        let len = usize::from(lens[sym]);

        if len > root_bits
        {
            break;
        }
        let entry = make_decode_table_entry(decode_results, sym, len as u32);

        spread_entry(decode_table, codeword, 1 << root_bits, 1 << len, entry);

        rest[len] -= 1;
        codeword = next_codeword(codeword, len);
        i += 1;
    }

    /*
     * Everything longer shares its first root_bits with other long
     * codewords; each distinct prefix gets one sub-table and a pointer
     * entry in its root slot, and the codeword's remaining bits index
     * inside it.
     */
    let root_mask = (1 << root_bits) - 1;
    let mut table_end = 1 << root_bits;
    let mut sub_prefix = usize::MAX;
    let mut sub_start = 0_usize;
    let mut sub_bits = 0_usize;

    while i < used_syms
    {
        let sym = usize::from(sorted[i]);
        let len = usize::from(lens[sym]);

        if codeword & root_mask != sub_prefix
        {
            sub_prefix = codeword & root_mask;
            sub_start = table_end;

            /*
             * Size the new sub-table: wide enough for this codeword's
             * bits past the root, then wider still while the codewords
             * left to place cannot close its codespace on their own.
             * Every slot must resolve to something, and a complete
             * code guarantees the widening terminates.
             */
            sub_bits = len - root_bits;

            let mut fillable = rest[len] as usize;

            while fillable < 1 << sub_bits
            {
                sub_bits += 1;

                if root_bits + sub_bits > DEFLATE_MAX_CODEWORD_LENGTH
                {
                    return Err(DecodeErrorStatus::CorruptData);
                }
                fillable = (fillable << 1) + rest[root_bits + sub_bits] as usize;
            }

            decode_table[sub_prefix] = (sub_start as u32) << 16
                | HUFFDEC_EXCEPTIONAL
                | HUFFDEC_SUITABLE_POINTER
                | (sub_bits as u32) << 8
                | root_bits as u32;

            table_end = sub_start + (1 << sub_bits);
        }

        let entry = make_decode_table_entry(decode_results, sym, (len - root_bits) as u32);

        spread_entry(
            decode_table,
            sub_start + (codeword >> root_bits),
            table_end,
            1 << (len - root_bits),
            entry,
        );

        rest[len] -= 1;
        codeword = next_codeword(codeword, len);
        i += 1;
    }

    Ok(root_bits)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::constants::{
        HUFFDEC_END_OF_BLOCK, LITLEN_DECODE_RESULTS, LITLEN_ENOUGH, LITLEN_TABLE_BITS,
        PRECODE_DECODE_RESULTS, PRECODE_ENOUGH, PRECODE_TABLE_BITS, STATIC_LITLEN_LENS,
    };

    #[test]
    fn single_symbol_code()
    {
        // one symbol of length one, both codewords map to it
        let mut lens = [0_u8; 19];
        lens[4] = 1;

        let mut table = [0_u32; PRECODE_ENOUGH];
        let bits =
            build_decode_table(&lens, &PRECODE_DECODE_RESULTS, &mut table, PRECODE_TABLE_BITS, 19, 7)
                .unwrap();

        assert_eq!(bits, 1);
        assert_eq!(table[0] >> 16, 4);
        assert_eq!(table[1] >> 16, 4);
    }

    #[test]
    fn over_subscribed_rejected()
    {
        // three symbols of length one cannot coexist
        let mut lens = [0_u8; 19];
        lens[0] = 1;
        lens[1] = 1;
        lens[2] = 1;

        let mut table = [0_u32; PRECODE_ENOUGH];
        assert!(build_decode_table(
            &lens,
            &PRECODE_DECODE_RESULTS,
            &mut table,
            PRECODE_TABLE_BITS,
            19,
            7
        )
        .is_err());
    }

    #[test]
    fn incomplete_rejected()
    {
        // 1 + 2 codewords of lengths {1,2} leave a quarter of the
        // codespace unused
        let mut lens = [0_u8; 19];
        lens[0] = 1;
        lens[1] = 2;

        let mut table = [0_u32; PRECODE_ENOUGH];
        assert!(build_decode_table(
            &lens,
            &PRECODE_DECODE_RESULTS,
            &mut table,
            PRECODE_TABLE_BITS,
            19,
            7
        )
        .is_err());
    }

    #[test]
    fn static_litlen_code_builds()
    {
        let mut table = vec![0_u32; LITLEN_ENOUGH];
        let bits = build_decode_table(
            &STATIC_LITLEN_LENS,
            &LITLEN_DECODE_RESULTS,
            &mut table,
            LITLEN_TABLE_BITS,
            288,
            15,
        )
        .unwrap();

        assert_eq!(bits, LITLEN_TABLE_BITS);

        // symbol 256 (end of block) is the 7 bit codeword 0000000;
        // any lookahead with low 7 bits zero resolves to it
        let entry = table[0];
        assert_ne!(entry & HUFFDEC_END_OF_BLOCK, 0);
        assert_eq!(entry & 0xFF, 7);
    }
}
