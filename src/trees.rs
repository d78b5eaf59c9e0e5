/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Huffman code construction and block emission for the compressor.
//!
//! Frequencies are gathered while the match finder runs; when a block
//! is flushed the optimal length limited codes are built here, the
//! cheapest of the three block encodings (stored, static, dynamic) is
//! picked and the block is written through the bit writer.

use log::trace;

use crate::bitstream::BitStreamWriter;
use crate::constants::{
    bi_reverse, d_code, DEFLATE_BLOCKTYPE_DYNAMIC_HUFFMAN, DEFLATE_BLOCKTYPE_STATIC,
    DEFLATE_BLOCKTYPE_UNCOMPRESSED, DEFLATE_PRECODE_LENS_PERMUTATION, BL_CODES, D_CODES, END_BLOCK,
    EXTRA_BL_BITS, EXTRA_DBITS, EXTRA_LBITS, LENGTH_CODE, LENGTH_ENTRIES, L_CODES, MAX_BITS,
    MAX_BL_BITS, OFFSET_ENTRIES, REPZ_11_138, REPZ_3_10, REP_3_6, STATIC_DIST_CODES,
    STATIC_LITLEN_CODES, STATIC_LITLEN_LENS,
};
use crate::enums::DataType;

/// Nodes in the tree building heap: all symbols plus the internal nodes
/// built above them.
const HEAP_SIZE: usize = 2 * L_CODES + 1;

/// One Huffman code under construction: symbol frequencies in, codeword
/// lengths and bit-reversed codewords out. The arrays are sized for the
/// internal nodes the construction appends past `elems`.
pub(crate) struct CodeTree
{
    pub freq: [u32; HEAP_SIZE],
    pub len:  [u8; HEAP_SIZE],
    pub code: [u16; HEAP_SIZE],
    dad:      [u16; HEAP_SIZE],
}

impl CodeTree
{
    fn new() -> CodeTree
    {
        CodeTree {
            freq: [0; HEAP_SIZE],
            len:  [0; HEAP_SIZE],
            code: [0; HEAP_SIZE],
            dad:  [0; HEAP_SIZE],
        }
    }
}

/// Static parameters of one of the three codes.
struct TreeParams
{
    extra:       &'static [u8],
    extra_base:  usize,
    static_lens: Option<&'static [u8]>,
    elems:       usize,
    max_length:  usize,
}

static LITLEN_PARAMS: TreeParams = TreeParams {
    extra:       &EXTRA_LBITS,
    extra_base:  257,
    static_lens: Some(&STATIC_LITLEN_LENS),
    elems:       L_CODES,
    max_length:  MAX_BITS,
};

static STATIC_DIST_LENS: [u8; D_CODES] = [5; D_CODES];

static DIST_PARAMS: TreeParams = TreeParams {
    extra:       &EXTRA_DBITS,
    extra_base:  0,
    static_lens: Some(&STATIC_DIST_LENS),
    elems:       D_CODES,
    max_length:  MAX_BITS,
};

static BL_PARAMS: TreeParams = TreeParams {
    extra:       &EXTRA_BL_BITS,
    extra_base:  0,
    static_lens: None,
    elems:       BL_CODES,
    max_length:  MAX_BL_BITS,
};

/// Which of the three codes an operation applies to.
#[derive(Copy, Clone, Eq, PartialEq)]
enum Which
{
    Litlen,
    Dist,
    Bl,
}

/// Tree building state for one deflate stream.
pub(crate) struct TreeState
{
    pub dyn_ltree: CodeTree,
    pub dyn_dtree: CodeTree,
    bl_tree:       CodeTree,

    // scratch shared by the three constructions
    heap:     [usize; HEAP_SIZE],
    heap_len: usize,
    heap_max: usize,
    depth:    [u8; HEAP_SIZE],
    bl_count: [u16; MAX_BITS + 1],

    /// cost of the current block in bits under the dynamic code
    opt_len:    usize,
    /// same under the static code
    static_len: usize,
}

impl TreeState
{
    pub fn new() -> TreeState
    {
        let mut state = TreeState {
            dyn_ltree: CodeTree::new(),
            dyn_dtree: CodeTree::new(),
            bl_tree:   CodeTree::new(),
            heap:      [0; HEAP_SIZE],
            heap_len:  0,
            heap_max:  0,
            depth:     [0; HEAP_SIZE],
            bl_count:  [0; MAX_BITS + 1],

            opt_len:    0,
            static_len: 0,
        };
        state.init_block();
        state
    }

    /// Forget the current block's statistics.
    pub fn init_block(&mut self)
    {
        self.dyn_ltree.freq[..L_CODES].fill(0);
        self.dyn_dtree.freq[..D_CODES].fill(0);
        self.bl_tree.freq[..BL_CODES].fill(0);

        // the end of block symbol is always sent
        self.dyn_ltree.freq[END_BLOCK] = 1;
        self.opt_len = 0;
        self.static_len = 0;
    }

    /// Record a literal byte.
    #[inline(always)]
    pub fn tally_lit(&mut self, lit: u8)
    {
        self.dyn_ltree.freq[usize::from(lit)] += 1;
    }
    /// Record a match; `len3` is the match length minus three.
    #[inline(always)]
    pub fn tally_dist(&mut self, dist: usize, len3: u8)
    {
        self.dyn_ltree.freq[257 + usize::from(LENGTH_CODE[usize::from(len3)])] += 1;
        self.dyn_dtree.freq[d_code(dist - 1)] += 1;
    }

    /// Classify the block from the literal histogram.
    ///
    /// A block is binary as soon as a black-listed control byte
    /// (0..=6, 14..=25, 28..=31) was seen; it is text when any
    /// allowed control (TAB/LF/CR and friends) or printable byte was;
    /// otherwise nothing was seen at all and the answer is a guess.
    pub fn data_type(&self) -> DataType
    {
        // bit n set: byte value n disqualifies text
        let black_mask: u32 = 0xF3FF_C07F;

        for n in 0..32
        {
            if (black_mask >> n) & 1 == 1 && self.dyn_ltree.freq[n] != 0
            {
                return DataType::Binary;
            }
        }
        if self.dyn_ltree.freq[9] != 0
            || self.dyn_ltree.freq[10] != 0
            || self.dyn_ltree.freq[13] != 0
        {
            return DataType::Text;
        }
        for n in 32..256
        {
            if self.dyn_ltree.freq[n] != 0
            {
                return DataType::Text;
            }
        }
        DataType::Binary
    }

    fn smaller(tree: &CodeTree, depth: &[u8], n: usize, m: usize) -> bool
    {
        tree.freq[n] < tree.freq[m]
            || (tree.freq[n] == tree.freq[m] && depth[n] <= depth[m])
    }

    /// Restore the heap property below node `k`.
    fn pqdownheap(&mut self, tree: &CodeTree, mut k: usize)
    {
        let v = self.heap[k];
        let mut j = k << 1;

        while j <= self.heap_len
        {
            if j < self.heap_len
                && Self::smaller(tree, &self.depth, self.heap[j + 1], self.heap[j])
            {
                j += 1;
            }
            if Self::smaller(tree, &self.depth, v, self.heap[j])
            {
                break;
            }
            self.heap[k] = self.heap[j];
            k = j;
            j <<= 1;
        }
        self.heap[k] = v;
    }

    /// Compute codeword lengths with the `max_length` cap, repairing any
    /// overflow so the Kraft sum stays exact, and accumulate the block
    /// cost under both the dynamic and the static code.
    fn gen_bitlen(&mut self, which: Which, params: &TreeParams, max_code: usize)
    {
        let max_length = params.max_length;
        let mut overflow = 0_i32;

        self.bl_count = [0; MAX_BITS + 1];

        let root = self.heap[self.heap_max];

        self.tree_mut(which).len[root] = 0;

        let mut h = self.heap_max + 1;

        while h < HEAP_SIZE
        {
            let n = self.heap[h];
            let tree = self.tree_mut(which);
            let mut bits = usize::from(tree.len[usize::from(tree.dad[n])]) + 1;

            if bits > max_length
            {
                bits = max_length;
                overflow += 1;
            }
            tree.len[n] = bits as u8;

            if n <= max_code
            {
                // a real symbol, count it and its cost
                self.bl_count[bits] += 1;

                let xbits = if n >= params.extra_base
                {
                    usize::from(params.extra[n - params.extra_base])
                }
                else
                {
                    0
                };
                let f = self.tree_mut(which).freq[n] as usize;

                self.opt_len += f * (bits + xbits);

                if let Some(stree) = params.static_lens
                {
                    self.static_len += f * (usize::from(stree[n]) + xbits);
                }
            }
            h += 1;
        }
        if overflow == 0
        {
            return;
        }

        // the code requires lengths above the cap: shorten deeper
        // codewords pairwise until everything fits
        while overflow > 0
        {
            let mut bits = max_length - 1;

            while self.bl_count[bits] == 0
            {
                bits -= 1;
            }
            self.bl_count[bits] -= 1;
            self.bl_count[bits + 1] += 2;
            self.bl_count[max_length] -= 1;
            overflow -= 2;
        }

        let mut h = HEAP_SIZE;

        for bits in (1..=max_length).rev()
        {
            let mut n = self.bl_count[bits];

            while n != 0
            {
                h -= 1;
                let m = self.heap[h];

                if m > max_code
                {
                    continue;
                }
                let (cur_len, freq) = {
                    let tree = self.tree_mut(which);

                    (usize::from(tree.len[m]), tree.freq[m] as usize)
                };

                if cur_len != bits
                {
                    // the adjustment can be negative for the codewords
                    // being shortened, the net sum is what matters
                    let delta = (bits as isize - cur_len as isize) * freq as isize;

                    self.opt_len = (self.opt_len as isize + delta) as usize;
                    self.tree_mut(which).len[m] = bits as u8;
                }
                n -= 1;
            }
        }
    }

    /// Assign canonical, bit reversed codewords from the lengths.
    fn gen_codes(&mut self, which: Which, max_code: usize)
    {
        let mut next_code = [0_u16; MAX_BITS + 1];
        let mut code = 0_u16;

        for bits in 1..=MAX_BITS
        {
            code = (code + self.bl_count[bits - 1]) << 1;
            next_code[bits] = code;
        }

        let tree = self.tree_mut(which);

        for n in 0..=max_code
        {
            let len = tree.len[n];

            if len == 0
            {
                continue;
            }
            tree.code[n] = bi_reverse(next_code[usize::from(len)], len);
            next_code[usize::from(len)] += 1;
        }
    }

    fn tree_mut(&mut self, which: Which) -> &mut CodeTree
    {
        match which
        {
            Which::Litlen => &mut self.dyn_ltree,
            Which::Dist => &mut self.dyn_dtree,
            Which::Bl => &mut self.bl_tree,
        }
    }

    /// Build one optimal length limited code. Returns the largest symbol
    /// with a non zero frequency (after the two-symbol fix up).
    fn build_tree(&mut self, which: Which, params: &TreeParams) -> usize
    {
        let elems = params.elems;
        let mut max_code: isize = -1;

        self.heap_len = 0;
        self.heap_max = HEAP_SIZE;

        for n in 0..elems
        {
            let tree = self.tree_mut(which);

            if tree.freq[n] != 0
            {
                self.heap_len += 1;
                self.heap[self.heap_len] = n;
                max_code = n as isize;
                self.depth[n] = 0;
            }
            else
            {
                tree.len[n] = 0;
            }
        }

        /*
         * The pkzip format requires that at least one distance code
         * exists, and that at least one bit should be sent even if
         * there is only one possible code, so force at least two
         * codes of non zero frequency.
         */
        while self.heap_len < 2
        {
            let node = if max_code < 2
            {
                max_code += 1;
                max_code as usize
            }
            else
            {
                0
            };

            self.tree_mut(which).freq[node] = 1;
            self.depth[node] = 0;
            self.heap_len += 1;
            self.heap[self.heap_len] = node;
            self.opt_len = self.opt_len.saturating_sub(1);

            if let Some(stree) = params.static_lens
            {
                self.static_len = self.static_len.saturating_sub(usize::from(stree[node]));
            }
        }
        let max_code = max_code as usize;

        {
            // heapify on frequency, ties by depth
            let tree = std::mem::replace(self.tree_mut(which), CodeTree::new());

            for n in (1..=self.heap_len / 2).rev()
            {
                self.pqdownheap(&tree, n);
            }

            // construct the tree by repeatedly joining the two least
            // frequent nodes
            let mut tree = tree;
            let mut node = elems;

            loop
            {
                let n = self.heap[1];

                self.heap[1] = self.heap[self.heap_len];
                self.heap_len -= 1;
                self.pqdownheap(&tree, 1);

                let m = self.heap[1];

                self.heap_max -= 1;
                self.heap[self.heap_max] = n;
                self.heap_max -= 1;
                self.heap[self.heap_max] = m;

                tree.freq[node] = tree.freq[n] + tree.freq[m];
                self.depth[node] = self.depth[n].max(self.depth[m]) + 1;
                tree.dad[n] = node as u16;
                tree.dad[m] = node as u16;

                self.heap[1] = node;
                node += 1;
                self.pqdownheap(&tree, 1);

                if self.heap_len < 2
                {
                    break;
                }
            }
            self.heap_max -= 1;
            self.heap[self.heap_max] = self.heap[1];

            *self.tree_mut(which) = tree;
        }

        self.gen_bitlen(which, params, max_code);
        self.gen_codes(which, max_code);

        max_code
    }

    /// Gather code length run statistics for one built tree.
    fn scan_tree(&mut self, which: Which, max_code: usize)
    {
        let lens: Vec<u8> = {
            let tree = self.tree_mut(which);

            tree.len[..=max_code].to_vec()
        };

        let len_at = |n: usize| if n <= max_code { lens[n] } else { 0xFF };

        let mut prevlen: i32 = -1;
        let mut nextlen = len_at(0);
        let mut count = 0_usize;

        let (mut max_count, mut min_count) = if nextlen == 0 { (138, 3) } else { (7, 4) };

        for n in 0..=max_code
        {
            let curlen = nextlen;

            nextlen = len_at(n + 1);
            count += 1;

            if count < max_count && curlen == nextlen
            {
                continue;
            }
            if count < min_count
            {
                self.bl_tree.freq[usize::from(curlen)] += count as u32;
            }
            else if curlen != 0
            {
                if i32::from(curlen) != prevlen
                {
                    self.bl_tree.freq[usize::from(curlen)] += 1;
                }
                self.bl_tree.freq[REP_3_6] += 1;
            }
            else if count <= 10
            {
                self.bl_tree.freq[REPZ_3_10] += 1;
            }
            else
            {
                self.bl_tree.freq[REPZ_11_138] += 1;
            }

            count = 0;
            prevlen = i32::from(curlen);

            if nextlen == 0
            {
                max_count = 138;
                min_count = 3;
            }
            else if curlen == nextlen
            {
                max_count = 6;
                min_count = 3;
            }
            else
            {
                max_count = 7;
                min_count = 4;
            }
        }
    }

    /// Emit one built tree's lengths with the code length code.
    fn send_tree(
        &mut self, writer: &mut BitStreamWriter, pending: &mut Vec<u8>, which: Which,
        max_code: usize,
    )
    {
        let lens: Vec<u8> = {
            let tree = self.tree_mut(which);

            tree.len[..=max_code].to_vec()
        };
        let len_at = |n: usize| if n <= max_code { lens[n] } else { 0xFF };

        let mut prevlen: i32 = -1;
        let mut nextlen = len_at(0);
        let mut count = 0_usize;

        let (mut max_count, mut min_count) = if nextlen == 0 { (138, 3) } else { (7, 4) };

        for n in 0..=max_code
        {
            let curlen = nextlen;

            nextlen = len_at(n + 1);
            count += 1;

            if count < max_count && curlen == nextlen
            {
                continue;
            }
            if count < min_count
            {
                for _ in 0..count
                {
                    self.send_bl_code(writer, pending, usize::from(curlen));
                }
            }
            else if curlen != 0
            {
                let mut run = count;

                if i32::from(curlen) != prevlen
                {
                    self.send_bl_code(writer, pending, usize::from(curlen));
                    run -= 1;
                }
                self.send_bl_code(writer, pending, REP_3_6);
                writer.put_bits(pending, (run - 3) as u64, 2);
            }
            else if count <= 10
            {
                self.send_bl_code(writer, pending, REPZ_3_10);
                writer.put_bits(pending, (count - 3) as u64, 3);
            }
            else
            {
                self.send_bl_code(writer, pending, REPZ_11_138);
                writer.put_bits(pending, (count - 11) as u64, 7);
            }

            count = 0;
            prevlen = i32::from(curlen);

            if nextlen == 0
            {
                max_count = 138;
                min_count = 3;
            }
            else if curlen == nextlen
            {
                max_count = 6;
                min_count = 3;
            }
            else
            {
                max_count = 7;
                min_count = 4;
            }
        }
    }

    fn send_bl_code(&self, writer: &mut BitStreamWriter, pending: &mut Vec<u8>, sym: usize)
    {
        writer.put_bits(
            pending,
            u64::from(self.bl_tree.code[sym]),
            self.bl_tree.len[sym],
        );
    }

    /// Build the code length code over both main trees; returns the
    /// index of the last code length to transmit.
    fn build_bl_tree(&mut self, max_lcode: usize, max_dcode: usize) -> usize
    {
        self.scan_tree(Which::Litlen, max_lcode);
        self.scan_tree(Which::Dist, max_dcode);

        self.build_tree(Which::Bl, &BL_PARAMS);

        let mut max_blindex = BL_CODES - 1;

        while max_blindex >= 3
        {
            let sym = usize::from(DEFLATE_PRECODE_LENS_PERMUTATION[max_blindex]);

            if self.bl_tree.len[sym] != 0
            {
                break;
            }
            max_blindex -= 1;
        }
        // the tree lengths plus the three size fields
        self.opt_len += 3 * (max_blindex + 1) + 5 + 5 + 4;

        max_blindex
    }

    fn send_all_trees(
        &mut self, writer: &mut BitStreamWriter, pending: &mut Vec<u8>, lcodes: usize,
        dcodes: usize, blcodes: usize,
    )
    {
        writer.put_bits(pending, (lcodes - 257) as u64, 5);
        writer.put_bits(pending, (dcodes - 1) as u64, 5);
        writer.put_bits(pending, (blcodes - 4) as u64, 4);

        for i in 0..blcodes
        {
            let sym = usize::from(DEFLATE_PRECODE_LENS_PERMUTATION[i]);

            writer.put_bits(pending, u64::from(self.bl_tree.len[sym]), 3);
        }
        self.send_tree(writer, pending, Which::Litlen, lcodes - 1);
        self.send_tree(writer, pending, Which::Dist, dcodes - 1);
    }

    /// Emit the buffered tokens with the given codes, then end of block.
    fn compress_block(
        writer: &mut BitStreamWriter, pending: &mut Vec<u8>, lit_codes: &[u16], lit_lens: &[u8],
        dist_codes: &[u16], dist_lens: &[u8], lit_buf: &[u8], dist_buf: &[u16],
    )
    {
        for (lit, dist) in lit_buf.iter().zip(dist_buf.iter())
        {
            let dist = usize::from(*dist);

            if dist == 0
            {
                // literal byte
                let sym = usize::from(*lit);

                writer.put_bits(pending, u64::from(lit_codes[sym]), lit_lens[sym]);
                continue;
            }
            // length first
            let lcode = usize::from(LENGTH_CODE[usize::from(*lit)]);
            let sym = 257 + lcode;

            writer.put_bits(pending, u64::from(lit_codes[sym]), lit_lens[sym]);

            let (lbase, lextra) = LENGTH_ENTRIES[lcode];

            if lextra > 0
            {
                let sent = usize::from(*lit) - (usize::from(lbase) - 3);

                writer.put_bits(pending, sent as u64, lextra);
            }

            // then the distance
            let dcode = d_code(dist - 1);

            writer.put_bits(pending, u64::from(dist_codes[dcode]), dist_lens[dcode]);

            let (dbase, dextra) = OFFSET_ENTRIES[dcode];

            if dextra > 0
            {
                writer.put_bits(pending, (dist - usize::from(dbase)) as u64, dextra);
            }
        }
        // end of block
        writer.put_bits(
            pending,
            u64::from(lit_codes[END_BLOCK]),
            lit_lens[END_BLOCK],
        );
    }

    /// End the current block, choosing the cheapest encoding.
    ///
    /// `stored` must be the exact bytes the tokens were produced from
    /// whenever they are still contiguously available, enabling the
    /// stored fallback for incompressible data.
    #[allow(clippy::too_many_arguments)]
    pub fn flush_block(
        &mut self, writer: &mut BitStreamWriter, pending: &mut Vec<u8>, stored: Option<&[u8]>,
        lit_buf: &[u8], dist_buf: &[u16], last: bool, force_static: bool,
    )
    {
        let max_lcode = self.build_tree(Which::Litlen, &LITLEN_PARAMS);
        let max_dcode = self.build_tree(Which::Dist, &DIST_PARAMS);
        let max_blindex = self.build_bl_tree(max_lcode, max_dcode);

        let mut opt_lenb = (self.opt_len + 3 + 7) >> 3;
        let static_lenb = (self.static_len + 3 + 7) >> 3;

        if static_lenb <= opt_lenb || force_static
        {
            opt_lenb = static_lenb;
        }

        trace!(
            "block: stored {:?}, static {}, dynamic {} bytes",
            stored.map(<[u8]>::len),
            static_lenb,
            opt_lenb
        );

        if let Some(buf) = stored
        {
            if buf.len() + 4 <= opt_lenb
            {
                self.stored_block(writer, pending, buf, last);
                return;
            }
        }

        if force_static || static_lenb == opt_lenb
        {
            writer.put_bits(
                pending,
                (DEFLATE_BLOCKTYPE_STATIC << 1) | u64::from(last),
                3,
            );
            Self::compress_block(
                writer,
                pending,
                &STATIC_LITLEN_CODES,
                &STATIC_LITLEN_LENS,
                &STATIC_DIST_CODES,
                &STATIC_DIST_LENS,
                lit_buf,
                dist_buf,
            );
        }
        else
        {
            writer.put_bits(
                pending,
                (DEFLATE_BLOCKTYPE_DYNAMIC_HUFFMAN << 1) | u64::from(last),
                3,
            );
            self.send_all_trees(writer, pending, max_lcode + 1, max_dcode + 1, max_blindex + 1);

            let lit_codes: Vec<u16> = self.dyn_ltree.code[..L_CODES].to_vec();
            let lit_lens: Vec<u8> = self.dyn_ltree.len[..L_CODES].to_vec();
            let dist_codes: Vec<u16> = self.dyn_dtree.code[..D_CODES].to_vec();
            let dist_lens: Vec<u8> = self.dyn_dtree.len[..D_CODES].to_vec();

            Self::compress_block(
                writer,
                pending,
                &lit_codes,
                &lit_lens,
                &dist_codes,
                &dist_lens,
                lit_buf,
                dist_buf,
            );
        }

        self.init_block();

        if last
        {
            writer.align_to_byte(pending);
        }
    }

    /// Emit one stored block.
    pub fn stored_block(
        &mut self, writer: &mut BitStreamWriter, pending: &mut Vec<u8>, data: &[u8], last: bool,
    )
    {
        debug_assert!(data.len() <= 0xFFFF);

        writer.put_bits(
            pending,
            (DEFLATE_BLOCKTYPE_UNCOMPRESSED << 1) | u64::from(last),
            3,
        );
        writer.align_to_byte(pending);

        let len = data.len() as u16;

        pending.extend_from_slice(&len.to_le_bytes());
        pending.extend_from_slice(&(!len).to_le_bytes());
        pending.extend_from_slice(data);

        self.init_block();
    }

    /// Emit an empty static block, the cheap marker a partial flush
    /// uses to push out pending bits.
    pub fn align(&mut self, writer: &mut BitStreamWriter, pending: &mut Vec<u8>)
    {
        writer.put_bits(pending, DEFLATE_BLOCKTYPE_STATIC << 1, 3);
        writer.put_bits(
            pending,
            u64::from(STATIC_LITLEN_CODES[END_BLOCK]),
            STATIC_LITLEN_LENS[END_BLOCK],
        );
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn builds_sane_lengths()
    {
        let mut state = TreeState::new();

        // skewed frequencies: 'a' dominates
        for _ in 0..1000
        {
            state.tally_lit(b'a');
        }
        for _ in 0..10
        {
            state.tally_lit(b'b');
        }
        state.tally_lit(b'c');

        let max_code = state.build_tree(Which::Litlen, &LITLEN_PARAMS);

        assert!(max_code >= 256);
        // most frequent symbol gets the shortest codeword
        assert!(state.dyn_ltree.len[usize::from(b'a')] <= state.dyn_ltree.len[usize::from(b'b')]);
        assert!(state.dyn_ltree.len[usize::from(b'b')] <= state.dyn_ltree.len[usize::from(b'c')]);
        // end of block is always codable
        assert_ne!(state.dyn_ltree.len[END_BLOCK], 0);

        // Kraft equality: the lengths form a complete code
        let kraft: u64 = (0..=max_code)
            .filter(|n| state.dyn_ltree.len[*n] != 0)
            .map(|n| 1_u64 << (MAX_BITS - usize::from(state.dyn_ltree.len[n])))
            .sum();

        assert_eq!(kraft, 1 << MAX_BITS);
    }

    #[test]
    fn length_cap_is_respected()
    {
        let mut state = TreeState::new();

        // fibonacci-ish frequencies force a skewed tree that must be
        // repaired to the 15 bit cap
        let mut a = 1_u32;
        let mut b = 1_u32;

        for sym in 0..40_usize
        {
            state.dyn_ltree.freq[sym] = a;

            let next = a.saturating_add(b);

            a = b;
            b = next;
        }

        let max_code = state.build_tree(Which::Litlen, &LITLEN_PARAMS);

        for n in 0..=max_code
        {
            assert!(usize::from(state.dyn_ltree.len[n]) <= MAX_BITS);
        }

        let kraft: u64 = (0..=max_code)
            .filter(|n| state.dyn_ltree.len[*n] != 0)
            .map(|n| 1_u64 << (MAX_BITS - usize::from(state.dyn_ltree.len[n])))
            .sum();

        assert_eq!(kraft, 1 << MAX_BITS);
    }

    #[test]
    fn stored_block_layout()
    {
        let mut state = TreeState::new();
        let mut writer = BitStreamWriter::new();
        let mut pending = vec![];

        state.stored_block(&mut writer, &mut pending, b"abc", true);

        // BFINAL=1 BTYPE=00, padded, then LEN/NLEN and the payload
        assert_eq!(pending[0], 0b0000_0001);
        assert_eq!(&pending[1..5], &[3, 0, 0xFC, 0xFF]);
        assert_eq!(&pending[5..8], b"abc");
    }
}
