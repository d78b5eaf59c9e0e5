/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! The deflate compressor.
//!
//! [`DeflateStream`] is the streaming engine: a sliding window twice the
//! advertised size, a hash chained match finder with lazy evaluation,
//! token buffering and block election in `trees.rs`, and the zlib/gzip
//! wrappers around it all. [`DeflateEncoder`] is the one-shot
//! convenience layer over it.

use std::cmp::min;

use log::trace;

use crate::adler::{adler32, ADLER_INIT};
use crate::bitstream::BitStreamWriter;
use crate::constants::{DEFLATE_MAX_MATCH, DEFLATE_MIN_MATCH};
use crate::crc32::{crc32, CRC_INIT};
use crate::decoder::Wrap;
use crate::enums::{DataType, DeflateFlush, DeflateStrategy, StreamResult, StreamStatus};
use crate::errors::EncodeErrors;
use crate::gzip::GzipHeader;
use crate::trees::TreeState;

/// Matches shorter than this are never emitted.
const MIN_MATCH: usize = DEFLATE_MIN_MATCH;
/// Longest emittable match.
const MAX_MATCH: usize = DEFLATE_MAX_MATCH;

/// Keep this much lookahead so a maximal match starting at the current
/// byte never reads past the filled part of the window.
const MIN_LOOKAHEAD: usize = MAX_MATCH + MIN_MATCH + 1;

/// Matches of minimum length this far back cost more bits than the
/// three literals they replace, for the filtered heuristic.
const TOO_FAR: usize = 4096;

/// Outcome of one strategy run, the compressor's internal status.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum BlockState
{
    /// All input absorbed, more wanted before a block is worth ending.
    NeedMore,
    /// A block was finished and queued.
    BlockDone,
    /// The final block was finished and queued.
    FinishDone,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Stage
{
    /// Wrapper header not yet queued
    Init,
    /// Compressing
    Busy,
    /// Final block and trailer queued, pending may still hold bytes
    Done,
}

#[derive(Copy, Clone)]
enum MatchMode
{
    Stored,
    Fast,
    Slow,
}

#[derive(Copy, Clone)]
struct Config
{
    good:  usize,
    lazy:  usize,
    nice:  usize,
    chain: usize,
    mode:  MatchMode,
}

/// Per level match finder tuning.
static CONFIGURATION_TABLE: [Config; 10] = [
    // store only
    Config { good: 0, lazy: 0, nice: 0, chain: 0, mode: MatchMode::Stored },
    Config { good: 4, lazy: 4, nice: 8, chain: 4, mode: MatchMode::Fast },
    Config { good: 4, lazy: 5, nice: 16, chain: 8, mode: MatchMode::Fast },
    Config { good: 4, lazy: 6, nice: 32, chain: 32, mode: MatchMode::Fast },
    // lazy matching from here on
    Config { good: 4, lazy: 4, nice: 16, chain: 16, mode: MatchMode::Slow },
    Config { good: 8, lazy: 16, nice: 32, chain: 32, mode: MatchMode::Slow },
    Config { good: 8, lazy: 16, nice: 128, chain: 128, mode: MatchMode::Slow },
    Config { good: 8, lazy: 32, nice: 128, chain: 256, mode: MatchMode::Slow },
    Config { good: 32, lazy: 128, nice: 258, chain: 1024, mode: MatchMode::Slow },
    Config { good: 32, lazy: 258, nice: 258, chain: 4096, mode: MatchMode::Slow },
];

/// Compression options.
///
/// To remove the annoyance of getters and setters
/// all exposed options are declared public.
#[derive(Debug, Clone)]
pub struct DeflateEncodingOptions
{
    /// Effort level, 0 (store only) to 9 (best, slowest).
    ///
    /// - Default value: 6
    pub level:       u8,
    /// Window size as a power of two, 8..=15. A value of 8 is quietly
    /// raised to 9, its window cannot hold the required lookahead.
    ///
    /// - Default value: 15
    pub window_bits: usize,
    /// Memory/quality trade for the hash table and token buffer, 1..=9.
    ///
    /// - Default value: 8
    pub mem_level:   usize,
    /// Match finding strategy.
    ///
    /// - Default value: [`DeflateStrategy::Default`]
    pub strategy:    DeflateStrategy,
    /// Metadata for the gzip header, when encoding gzip.
    ///
    /// - Default value: None, a bare header
    pub gzip_header: Option<GzipHeader>,
}

impl Default for DeflateEncodingOptions
{
    fn default() -> DeflateEncodingOptions
    {
        DeflateEncodingOptions {
            level:       6,
            window_bits: 15,
            mem_level:   8,
            strategy:    DeflateStrategy::Default,
            gzip_header: None,
        }
    }
}

impl DeflateEncodingOptions
{
    #[must_use]
    pub fn set_level(mut self, level: u8) -> Self
    {
        self.level = level;
        self
    }
    #[must_use]
    pub fn set_window_bits(mut self, bits: usize) -> Self
    {
        self.window_bits = bits;
        self
    }
    #[must_use]
    pub fn set_mem_level(mut self, mem_level: usize) -> Self
    {
        self.mem_level = mem_level;
        self
    }
    #[must_use]
    pub fn set_strategy(mut self, strategy: DeflateStrategy) -> Self
    {
        self.strategy = strategy;
        self
    }
    #[must_use]
    pub fn set_gzip_header(mut self, header: GzipHeader) -> Self
    {
        self.gzip_header = Some(header);
        self
    }
}

/// The streaming compressor.
///
/// Driven by [`compress`](Self::compress) calls over caller supplied
/// buffers; output that does not fit is queued internally and handed
/// out on later calls.
pub struct DeflateStream
{
    wrap:  Wrap,
    stage: Stage,

    level:    u8,
    strategy: DeflateStrategy,

    // queued output
    pending:     Vec<u8>,
    pending_out: usize,
    writer:      BitStreamWriter,

    // the window holds twice the advertised size so matches can reach
    // a full window back from fresh input
    w_bits: usize,
    w_size: usize,
    w_mask: usize,
    window: Vec<u8>,

    // match finder: most recent position for a 3 byte fingerprint, and
    // per position chain to older candidates
    head:       Vec<u16>,
    prev:       Vec<u16>,
    hash_mask:  usize,
    hash_shift: usize,
    ins_h:      usize,

    strstart:    usize,
    block_start: isize,
    lookahead:   usize,
    /// hash insertions owed for bytes already in the window
    insert:      usize,

    match_start:     usize,
    match_length:    usize,
    prev_match:      usize,
    prev_length:     usize,
    match_available: bool,

    // active tuning, from the level table unless tuned directly
    good_match: usize,
    max_lazy:   usize,
    nice_match: usize,
    max_chain:  usize,

    // token buffers; dist 0 marks a literal
    lit_buf:     Vec<u8>,
    dist_buf:    Vec<u16>,
    lit_bufsize: usize,

    trees: TreeState,

    total_in:    u64,
    total_out:   u64,
    check:       u32,
    gzip_header: Option<GzipHeader>,
    dict_id:     Option<u32>,
    data_type:   DataType,
    last_flush:  DeflateFlush,
}

fn flush_rank(flush: DeflateFlush) -> u8
{
    match flush
    {
        DeflateFlush::None => 0,
        DeflateFlush::Finish => 2,
        _ => 1,
    }
}

impl DeflateStream
{
    fn with_wrap(wrap: Wrap, options: DeflateEncodingOptions)
        -> Result<DeflateStream, EncodeErrors>
    {
        if options.level > 9
        {
            return Err(EncodeErrors::InvalidParameters("level must be 0..=9"));
        }
        if !(8..=15).contains(&options.window_bits)
        {
            return Err(EncodeErrors::InvalidParameters("window bits must be 8..=15"));
        }
        if !(1..=9).contains(&options.mem_level)
        {
            return Err(EncodeErrors::InvalidParameters("mem level must be 1..=9"));
        }

        // an 8 bit window cannot hold MIN_LOOKAHEAD bytes of slack
        let w_bits = if options.window_bits == 8
        {
            9
        }
        else
        {
            options.window_bits
        };
        let w_size = 1 << w_bits;

        let hash_bits = options.mem_level + 7;
        let hash_size = 1 << hash_bits;
        let lit_bufsize = 1 << (options.mem_level + 6);

        let config = CONFIGURATION_TABLE[usize::from(options.level)];

        let check = match wrap
        {
            Wrap::Gzip => CRC_INIT,
            _ => ADLER_INIT,
        };

        Ok(DeflateStream {
            wrap,
            stage: Stage::Init,
            level: options.level,
            strategy: options.strategy,
            pending: Vec::with_capacity(lit_bufsize),
            pending_out: 0,
            writer: BitStreamWriter::new(),
            w_bits,
            w_size,
            w_mask: w_size - 1,
            window: vec![0; 2 * w_size],
            head: vec![0; hash_size],
            prev: vec![0; w_size],
            hash_mask: hash_size - 1,
            hash_shift: (hash_bits + MIN_MATCH - 1) / MIN_MATCH,
            ins_h: 0,
            strstart: 0,
            block_start: 0,
            lookahead: 0,
            insert: 0,
            match_start: 0,
            match_length: MIN_MATCH - 1,
            prev_match: 0,
            prev_length: MIN_MATCH - 1,
            match_available: false,
            good_match: config.good,
            max_lazy: config.lazy,
            nice_match: config.nice,
            max_chain: config.chain,
            lit_buf: Vec::with_capacity(lit_bufsize),
            dist_buf: Vec::with_capacity(lit_bufsize),
            lit_bufsize,
            trees: TreeState::new(),
            total_in: 0,
            total_out: 0,
            check,
            gzip_header: options.gzip_header.clone(),
            dict_id: None,
            data_type: DataType::Unknown,
            last_flush: DeflateFlush::None,
        })
    }

    /// A zlib wrapped compressor.
    #[cfg(feature = "zlib")]
    pub fn new(options: DeflateEncodingOptions) -> Result<DeflateStream, EncodeErrors>
    {
        DeflateStream::with_wrap(Wrap::Zlib, options)
    }
    /// A bare deflate compressor.
    pub fn new_raw(options: DeflateEncodingOptions) -> Result<DeflateStream, EncodeErrors>
    {
        DeflateStream::with_wrap(Wrap::Raw, options)
    }
    /// A gzip wrapped compressor.
    #[cfg(feature = "gzip")]
    pub fn new_gzip(options: DeflateEncodingOptions) -> Result<DeflateStream, EncodeErrors>
    {
        DeflateStream::with_wrap(Wrap::Gzip, options)
    }

    pub const fn total_in(&self) -> u64
    {
        self.total_in
    }
    pub const fn total_out(&self) -> u64
    {
        self.total_out
    }
    /// Running checksum of all input, Adler-32 for zlib, CRC-32 for gzip.
    pub const fn checksum(&self) -> u32
    {
        self.check
    }
    /// Best effort classification of the data seen so far.
    pub const fn data_type(&self) -> DataType
    {
        self.data_type
    }
    /// Output queued internally: whole bytes and bits not yet forming one.
    pub fn pending(&self) -> (usize, u8)
    {
        (
            self.pending.len() - self.pending_out,
            self.writer.pending_bits(),
        )
    }

    /// An upper bound on compressed size for `source_len` input bytes
    /// under the current parameters.
    pub fn bound(&self, source_len: usize) -> usize
    {
        let wrap_len = match self.wrap
        {
            Wrap::Raw => 0,
            Wrap::Zlib => 6 + if self.dict_id.is_some() { 4 } else { 0 },
            _ =>
            {
                let mut len = 18;

                if let Some(header) = &self.gzip_header
                {
                    if let Some(extra) = &header.extra
                    {
                        len += 2 + extra.len();
                    }
                    if let Some(name) = &header.name
                    {
                        len += name.len() + 1;
                    }
                    if let Some(comment) = &header.comment
                    {
                        len += comment.len() + 1;
                    }
                    if header.hcrc
                    {
                        len += 2;
                    }
                }
                len
            }
        };

        // conservative bound covering fixed and stored block framing
        let complen = source_len + ((source_len + 7) >> 3) + ((source_len + 63) >> 6) + 5;

        if self.w_bits != 15 || self.hash_mask != (1 << 15) - 1
        {
            return complen + wrap_len;
        }

        // default settings admit the much tighter bound
        source_len + (source_len >> 12) + (source_len >> 14) + (source_len >> 25) + 13 - 6
            + wrap_len
    }

    /// Change level and strategy mid-stream. Any buffered tokens are
    /// flushed as a block under the old parameters first.
    pub fn params(&mut self, level: u8, strategy: DeflateStrategy) -> Result<(), EncodeErrors>
    {
        if level > 9
        {
            return Err(EncodeErrors::InvalidParameters("level must be 0..=9"));
        }
        if self.stage == Stage::Done
        {
            return Err(EncodeErrors::StreamFinished);
        }

        if (level != self.level || strategy != self.strategy) && !self.lit_buf.is_empty()
        {
            self.flush_block_only(false);
        }

        let config = CONFIGURATION_TABLE[usize::from(level)];

        self.level = level;
        self.strategy = strategy;
        self.good_match = config.good;
        self.max_lazy = config.lazy;
        self.nice_match = config.nice;
        self.max_chain = config.chain;
        Ok(())
    }

    /// Override the four match finder knobs directly.
    pub fn tune(&mut self, good: usize, lazy: usize, nice: usize, chain: usize)
    {
        self.good_match = good;
        self.max_lazy = lazy;
        self.nice_match = nice;
        self.max_chain = chain;
    }

    /// Prime the match finder with history, before any data is
    /// compressed. For zlib streams the header will announce the
    /// dictionary's Adler-32.
    pub fn set_dictionary(&mut self, dict: &[u8]) -> Result<(), EncodeErrors>
    {
        if self.stage != Stage::Init || self.total_in != 0
        {
            return Err(EncodeErrors::WrongState(
                "dictionary must be set before any data",
            ));
        }
        if self.wrap == Wrap::Gzip
        {
            return Err(EncodeErrors::WrongState(
                "gzip streams cannot carry a preset dictionary",
            ));
        }
        if self.wrap == Wrap::Zlib
        {
            self.dict_id = Some(adler32(ADLER_INIT, dict));
        }

        let avail = min(dict.len(), self.w_size);
        let dict = &dict[dict.len() - avail..];

        self.window[..avail].copy_from_slice(dict);
        self.strstart = avail;
        self.block_start = avail as isize;

        if avail >= MIN_MATCH
        {
            self.reset_hash(0);

            for pos in 0..=avail - MIN_MATCH
            {
                self.insert_string(pos);
            }
        }
        // the last two positions cannot be hashed yet, the next
        // fill_window owes them
        self.insert = avail.min(MIN_MATCH - 1);
        Ok(())
    }

    /// Copy out up to `dest.len()` bytes of current history, oldest
    /// first; returns the number written.
    pub fn dictionary(&self, dest: &mut [u8]) -> usize
    {
        let have = min(self.strstart + self.lookahead, self.w_size);
        let n = min(have, dest.len());
        let end = self.strstart + self.lookahead;

        dest[..n].copy_from_slice(&self.window[end - n..end]);
        n
    }

    /// Return the stream to its freshly initialized state, keeping
    /// allocations.
    pub fn reset(&mut self)
    {
        self.stage = Stage::Init;
        self.pending.clear();
        self.pending_out = 0;
        self.writer.reset();
        self.head.fill(0);
        self.ins_h = 0;
        self.strstart = 0;
        self.block_start = 0;
        self.lookahead = 0;
        self.insert = 0;
        self.match_length = MIN_MATCH - 1;
        self.prev_length = MIN_MATCH - 1;
        self.match_available = false;
        self.lit_buf.clear();
        self.dist_buf.clear();
        self.trees.init_block();
        self.total_in = 0;
        self.total_out = 0;
        self.check = match self.wrap
        {
            Wrap::Gzip => CRC_INIT,
            _ => ADLER_INIT,
        };
        self.dict_id = None;
        self.data_type = DataType::Unknown;
        self.last_flush = DeflateFlush::None;
    }

    /// One step call: compress from `input`, writing to `output`, with
    /// the given flush behaviour.
    pub fn compress(
        &mut self, input: &[u8], output: &mut [u8], flush: DeflateFlush,
    ) -> Result<StreamResult, EncodeErrors>
    {
        let mut in_pos = 0_usize;
        let mut out_pos = 0_usize;

        if self.stage == Stage::Done
        {
            if !input.is_empty()
            {
                return Err(EncodeErrors::StreamFinished);
            }
            // drain whatever is left
            self.flush_pending(output, &mut out_pos);
            return Ok(self.step_result(in_pos, out_pos));
        }

        if self.stage == Stage::Init
        {
            self.write_header();
            self.stage = Stage::Busy;
        }

        self.flush_pending(output, &mut out_pos);

        if self.pending_len() > 0
        {
            // no room to make more progress
            self.last_flush = flush;
            return Ok(self.step_result(in_pos, out_pos));
        }

        // repeated no-op calls are a caller bug, not an infinite loop
        if input.is_empty()
            && flush_rank(flush) <= flush_rank(self.last_flush)
            && flush != DeflateFlush::Finish
            && out_pos == 0
        {
            return Ok(StreamResult::new(StreamStatus::BufError, 0, 0));
        }
        self.last_flush = flush;

        if !input.is_empty() || self.lookahead != 0 || flush != DeflateFlush::None
        {
            let bstate = self.run_strategy(input, &mut in_pos, flush);

            match bstate
            {
                BlockState::FinishDone =>
                {
                    self.write_trailer();
                    self.stage = Stage::Done;
                }
                BlockState::BlockDone => match flush
                {
                    DeflateFlush::Partial =>
                    {
                        self.trees.align(&mut self.writer, &mut self.pending);
                    }
                    DeflateFlush::Sync | DeflateFlush::Full =>
                    {
                        // the byte aligned empty stored block marker
                        self.trees
                            .stored_block(&mut self.writer, &mut self.pending, &[], false);

                        if flush == DeflateFlush::Full
                        {
                            self.head.fill(0);

                            if self.lookahead == 0
                            {
                                self.strstart = 0;
                                self.block_start = 0;
                                self.insert = 0;
                            }
                        }
                    }
                    _ =>
                    {}
                },
                BlockState::NeedMore =>
                {}
            }
        }

        self.flush_pending(output, &mut out_pos);

        Ok(self.step_result(in_pos, out_pos))
    }

    fn step_result(&self, read: usize, written: usize) -> StreamResult
    {
        let status = if self.stage == Stage::Done && self.pending_len() == 0
        {
            StreamStatus::StreamEnd
        }
        else if read == 0 && written == 0
        {
            StreamStatus::BufError
        }
        else
        {
            StreamStatus::Ok
        };

        StreamResult::new(status, read, written)
    }

    fn pending_len(&self) -> usize
    {
        self.pending.len() - self.pending_out
    }

    fn flush_pending(&mut self, output: &mut [u8], out_pos: &mut usize)
    {
        let n = min(self.pending_len(), output.len() - *out_pos);

        output[*out_pos..*out_pos + n]
            .copy_from_slice(&self.pending[self.pending_out..self.pending_out + n]);
        self.pending_out += n;
        *out_pos += n;
        self.total_out += n as u64;

        if self.pending_out == self.pending.len()
        {
            self.pending.clear();
            self.pending_out = 0;
        }
    }

    fn write_header(&mut self)
    {
        match self.wrap
        {
            Wrap::Raw =>
            {}
            Wrap::Gzip =>
            {
                let xfl = if self.level == 9
                {
                    2
                }
                else if self.level < 2 || !matches!(self.strategy, DeflateStrategy::Default)
                {
                    4
                }
                else
                {
                    0
                };
                let header = self.gzip_header.clone().unwrap_or_default();

                header.write(&mut self.pending, xfl);
            }
            _ =>
            {
                let simple_codes = matches!(
                    self.strategy,
                    DeflateStrategy::HuffmanOnly | DeflateStrategy::Rle | DeflateStrategy::Fixed
                );
                let level_flags: u16 = if simple_codes || self.level < 2
                {
                    0
                }
                else if self.level < 6
                {
                    1
                }
                else if self.level == 6
                {
                    2
                }
                else
                {
                    3
                };

                let cmf = 8 | ((self.w_bits as u16 - 8) << 4);
                let mut header = (cmf << 8) | (level_flags << 6);

                if self.dict_id.is_some()
                {
                    header |= 0x20;
                }
                header += 31 - (header % 31);

                self.pending.extend_from_slice(&header.to_be_bytes());

                if let Some(id) = self.dict_id
                {
                    self.pending.extend_from_slice(&id.to_be_bytes());
                }
            }
        }
        trace!("wrapper header queued, {} bytes", self.pending.len());
    }

    fn write_trailer(&mut self)
    {
        match self.wrap
        {
            Wrap::Raw =>
            {}
            Wrap::Gzip =>
            {
                self.pending.extend_from_slice(&self.check.to_le_bytes());
                self.pending
                    .extend_from_slice(&(self.total_in as u32).to_le_bytes());
            }
            _ =>
            {
                self.pending.extend_from_slice(&self.check.to_be_bytes());
            }
        }
    }

    fn max_dist(&self) -> usize
    {
        self.w_size - MIN_LOOKAHEAD
    }

    /// Hash the byte at `pos + 2` into the rolling fingerprint and
    /// record `pos` as the most recent holder of it. Returns the
    /// previous holder, the head of the candidate chain.
    #[inline(always)]
    fn insert_string(&mut self, pos: usize) -> usize
    {
        self.ins_h = ((self.ins_h << self.hash_shift)
            ^ usize::from(self.window[pos + MIN_MATCH - 1]))
            & self.hash_mask;

        let head = usize::from(self.head[self.ins_h]);

        self.prev[pos & self.w_mask] = head as u16;
        self.head[self.ins_h] = pos as u16;

        head
    }

    /// Re-seed the rolling hash with the two bytes at `pos`.
    fn reset_hash(&mut self, pos: usize)
    {
        self.ins_h = usize::from(self.window[pos]);
        self.ins_h = ((self.ins_h << self.hash_shift) ^ usize::from(self.window[pos + 1]))
            & self.hash_mask;
    }

    /// Move fresh input into the window, sliding it down when the write
    /// position gets past the point matches can reach.
    fn fill_window(&mut self, input: &[u8], in_pos: &mut usize)
    {
        loop
        {
            let mut more = 2 * self.w_size - self.lookahead - self.strstart;

            if self.strstart >= self.w_size + self.max_dist()
            {
                // slide the upper half down
                self.window.copy_within(self.w_size..2 * self.w_size, 0);
                self.match_start = self.match_start.saturating_sub(self.w_size);
                self.strstart -= self.w_size;
                self.block_start -= self.w_size as isize;

                if self.insert > self.strstart
                {
                    self.insert = self.strstart;
                }

                let w_size = self.w_size as u16;

                for head in self.head.iter_mut()
                {
                    *head = head.saturating_sub(w_size);
                }
                for prev in self.prev.iter_mut()
                {
                    *prev = prev.saturating_sub(w_size);
                }
                more += self.w_size;
            }

            if *in_pos == input.len()
            {
                break;
            }

            let n = min(more, input.len() - *in_pos);
            let dst = self.strstart + self.lookahead;

            self.window[dst..dst + n].copy_from_slice(&input[*in_pos..*in_pos + n]);

            self.check = match self.wrap
            {
                Wrap::Gzip => crc32(self.check, &input[*in_pos..*in_pos + n]),
                Wrap::Raw => self.check,
                _ => adler32(self.check, &input[*in_pos..*in_pos + n]),
            };
            self.total_in += n as u64;
            *in_pos += n;
            self.lookahead += n;

            // catch up on hash insertions for bytes that arrived while
            // the lookahead was too short
            if self.lookahead + self.insert >= MIN_MATCH
            {
                let mut pos = self.strstart - self.insert;

                self.reset_hash(pos);

                while self.insert > 0
                {
                    self.insert_string(pos);
                    pos += 1;
                    self.insert -= 1;

                    if self.lookahead + self.insert < MIN_MATCH
                    {
                        break;
                    }
                }
            }

            if self.lookahead >= MIN_LOOKAHEAD
            {
                break;
            }
        }
    }

    /// Walk the hash chain from `cur_match` looking for the longest
    /// match at `strstart`, favouring the nearest on equal length.
    /// Updates `match_start`, returns the best length found.
    fn longest_match(&mut self, cur_match: usize) -> usize
    {
        let mut chain_length = self.max_chain;
        let scan = self.strstart;
        let mut best_len = self.prev_length;

        let max_len = min(MAX_MATCH, self.lookahead);

        if best_len >= max_len
        {
            return best_len;
        }

        let nice_match = min(self.nice_match, self.lookahead);

        let limit = if self.strstart > self.max_dist()
        {
            self.strstart - self.max_dist()
        }
        else
        {
            0
        };

        if self.prev_length >= self.good_match
        {
            chain_length >>= 2;
        }

        let window = &self.window;
        let mut cur = cur_match;

        loop
        {
            // cheap rejects first: the byte that would extend the best
            // match, then the first two
            if window[cur + best_len] == window[scan + best_len]
                && window[cur + best_len - 1] == window[scan + best_len - 1]
                && window[cur] == window[scan]
                && window[cur + 1] == window[scan + 1]
            {
                let mut len = 2;

                while len < max_len && window[cur + len] == window[scan + len]
                {
                    len += 1;
                }

                if len > best_len
                {
                    self.match_start = cur;
                    best_len = len;

                    if len >= nice_match
                    {
                        break;
                    }
                }
            }

            cur = usize::from(self.prev[cur & self.w_mask]);

            if cur <= limit
            {
                break;
            }
            chain_length -= 1;

            if chain_length == 0
            {
                break;
            }
        }

        min(best_len, max_len)
    }

    fn tally_lit(&mut self, lit: u8) -> bool
    {
        self.lit_buf.push(lit);
        self.dist_buf.push(0);
        self.trees.tally_lit(lit);
        self.lit_buf.len() == self.lit_bufsize
    }

    fn tally_dist(&mut self, dist: usize, len3: usize) -> bool
    {
        self.lit_buf.push(len3 as u8);
        self.dist_buf.push(dist as u16);
        self.trees.tally_dist(dist, len3 as u8);
        self.lit_buf.len() == self.lit_bufsize
    }

    /// Emit the buffered tokens as one block.
    fn flush_block_only(&mut self, last: bool)
    {
        if self.data_type == DataType::Unknown && self.level > 0
        {
            self.data_type = self.trees.data_type();
        }

        let stored = if self.block_start >= 0
        {
            Some(&self.window[self.block_start as usize..self.strstart])
        }
        else
        {
            None
        };

        self.trees.flush_block(
            &mut self.writer,
            &mut self.pending,
            stored,
            &self.lit_buf,
            &self.dist_buf,
            last,
            self.strategy == DeflateStrategy::Fixed,
        );

        self.lit_buf.clear();
        self.dist_buf.clear();
        self.block_start = self.strstart as isize;
    }

    fn run_strategy(&mut self, input: &[u8], in_pos: &mut usize, flush: DeflateFlush)
        -> BlockState
    {
        if self.level == 0
        {
            return self.deflate_stored(input, in_pos, flush);
        }
        match self.strategy
        {
            DeflateStrategy::HuffmanOnly => self.deflate_huff(input, in_pos, flush),
            DeflateStrategy::Rle => self.deflate_rle(input, in_pos, flush),
            _ => match CONFIGURATION_TABLE[usize::from(self.level)].mode
            {
                MatchMode::Stored => self.deflate_stored(input, in_pos, flush),
                MatchMode::Fast => self.deflate_fast(input, in_pos, flush),
                MatchMode::Slow => self.deflate_slow(input, in_pos, flush),
            },
        }
    }

    /// Shared epilogue once the input of this call is exhausted.
    fn finish_or_block(&mut self, flush: DeflateFlush) -> BlockState
    {
        if flush == DeflateFlush::Finish
        {
            self.flush_block_only(true);
            return BlockState::FinishDone;
        }
        if !self.lit_buf.is_empty()
        {
            self.flush_block_only(false);
        }
        BlockState::BlockDone
    }

    /// Level 0: plain stored blocks straight from the window.
    fn deflate_stored(&mut self, input: &[u8], in_pos: &mut usize, flush: DeflateFlush)
        -> BlockState
    {
        let max_block = 0xFFFF_usize;

        loop
        {
            if self.lookahead <= 1
            {
                self.fill_window(input, in_pos);

                if self.lookahead == 0
                {
                    if flush == DeflateFlush::None
                    {
                        return BlockState::NeedMore;
                    }
                    break;
                }
            }
            self.strstart += self.lookahead;
            self.lookahead = 0;

            let max_start = self.block_start as usize + max_block;

            if self.strstart >= max_start
            {
                self.lookahead = self.strstart - max_start;
                self.strstart = max_start;
                self.stored_flush(false);
            }
            if self.strstart.saturating_sub(self.block_start as usize) >= self.max_dist()
            {
                self.stored_flush(false);
            }
        }
        self.insert = 0;

        if flush == DeflateFlush::Finish
        {
            self.stored_flush(true);
            return BlockState::FinishDone;
        }
        if self.strstart as isize > self.block_start
        {
            self.stored_flush(false);
        }
        BlockState::BlockDone
    }

    fn stored_flush(&mut self, last: bool)
    {
        let start = self.block_start as usize;

        self.trees.stored_block(
            &mut self.writer,
            &mut self.pending,
            &self.window[start..self.strstart],
            last,
        );
        self.block_start = self.strstart as isize;
    }

    /// Levels 1..=3: take any match of acceptable length, no lazy probe.
    fn deflate_fast(&mut self, input: &[u8], in_pos: &mut usize, flush: DeflateFlush)
        -> BlockState
    {
        loop
        {
            if self.lookahead < MIN_LOOKAHEAD
            {
                self.fill_window(input, in_pos);

                if self.lookahead < MIN_LOOKAHEAD && flush == DeflateFlush::None
                {
                    return BlockState::NeedMore;
                }
                if self.lookahead == 0
                {
                    break;
                }
            }

            let mut hash_head = 0;

            if self.lookahead >= MIN_MATCH
            {
                hash_head = self.insert_string(self.strstart);
            }

            self.match_length = 0;

            if hash_head != 0 && self.strstart - hash_head <= self.max_dist()
            {
                self.match_length = self.longest_match(hash_head);
            }

            let full = if self.match_length >= MIN_MATCH
            {
                let dist = self.strstart - self.match_start;
                let len = self.match_length;
                let full = self.tally_dist(dist, len - MIN_MATCH);

                self.lookahead -= len;

                if len <= self.max_lazy && self.lookahead >= MIN_MATCH
                {
                    // keep the hash chains aware of every matched byte
                    for _ in 0..len - 1
                    {
                        self.strstart += 1;
                        self.insert_string(self.strstart);
                    }
                    self.strstart += 1;
                }
                else
                {
                    self.strstart += len;
                    self.reset_hash(self.strstart);
                }
                self.match_length = 0;
                full
            }
            else
            {
                let lit = self.window[self.strstart];
                let full = self.tally_lit(lit);

                self.lookahead -= 1;
                self.strstart += 1;
                full
            };

            if full
            {
                self.flush_block_only(false);
            }
        }
        self.insert = min(self.strstart, MIN_MATCH - 1);

        self.finish_or_block(flush)
    }

    /// Levels 4..=9: before emitting a match, probe one byte further for
    /// a strictly longer one; if found, the current byte goes out as a
    /// literal instead.
    fn deflate_slow(&mut self, input: &[u8], in_pos: &mut usize, flush: DeflateFlush)
        -> BlockState
    {
        loop
        {
            if self.lookahead < MIN_LOOKAHEAD
            {
                self.fill_window(input, in_pos);

                if self.lookahead < MIN_LOOKAHEAD && flush == DeflateFlush::None
                {
                    return BlockState::NeedMore;
                }
                if self.lookahead == 0
                {
                    break;
                }
            }

            let mut hash_head = 0;

            if self.lookahead >= MIN_MATCH
            {
                hash_head = self.insert_string(self.strstart);
            }

            self.prev_length = self.match_length;
            self.prev_match = self.match_start;
            self.match_length = MIN_MATCH - 1;

            if hash_head != 0
                && self.prev_length < self.max_lazy
                && self.strstart - hash_head <= self.max_dist()
            {
                self.match_length = self.longest_match(hash_head);

                // drop matches that cost more than the literals they
                // replace
                if self.match_length <= 5
                    && (self.strategy == DeflateStrategy::Filtered
                        || (self.match_length == MIN_MATCH
                            && self.strstart - self.match_start > TOO_FAR))
                {
                    self.match_length = MIN_MATCH - 1;
                }
            }

            if self.prev_length >= MIN_MATCH && self.match_length <= self.prev_length
            {
                // the previous position's match wins
                let max_insert = self.strstart + self.lookahead - MIN_MATCH;
                let dist = self.strstart - 1 - self.prev_match;
                let len = self.prev_length;

                let full = self.tally_dist(dist, len - MIN_MATCH);

                self.lookahead -= len - 1;

                for _ in 0..len - 2
                {
                    self.strstart += 1;

                    if self.strstart <= max_insert
                    {
                        self.insert_string(self.strstart);
                    }
                }
                self.match_available = false;
                self.match_length = MIN_MATCH - 1;
                self.strstart += 1;

                if full
                {
                    self.flush_block_only(false);
                }
            }
            else if self.match_available
            {
                // the new match is better, the previous byte becomes a
                // literal
                let lit = self.window[self.strstart - 1];
                let full = self.tally_lit(lit);

                if full
                {
                    self.flush_block_only(false);
                }
                self.strstart += 1;
                self.lookahead -= 1;
            }
            else
            {
                self.match_available = true;
                self.strstart += 1;
                self.lookahead -= 1;
            }
        }

        if self.match_available
        {
            let lit = self.window[self.strstart - 1];

            self.tally_lit(lit);
            self.match_available = false;
        }
        self.insert = min(self.strstart, MIN_MATCH - 1);

        self.finish_or_block(flush)
    }

    /// Run length only matching, distance fixed at one.
    fn deflate_rle(&mut self, input: &[u8], in_pos: &mut usize, flush: DeflateFlush)
        -> BlockState
    {
        loop
        {
            if self.lookahead <= MAX_MATCH
            {
                self.fill_window(input, in_pos);

                if self.lookahead <= MAX_MATCH && flush == DeflateFlush::None
                {
                    return BlockState::NeedMore;
                }
                if self.lookahead == 0
                {
                    break;
                }
            }

            self.match_length = 0;

            if self.lookahead >= MIN_MATCH && self.strstart > 0
            {
                let prev_byte = self.window[self.strstart - 1];

                if prev_byte == self.window[self.strstart]
                    && prev_byte == self.window[self.strstart + 1]
                    && prev_byte == self.window[self.strstart + 2]
                {
                    let max_len = min(MAX_MATCH, self.lookahead);
                    let mut len = 3;

                    while len < max_len && self.window[self.strstart + len] == prev_byte
                    {
                        len += 1;
                    }
                    self.match_length = len;
                }
            }

            let full = if self.match_length >= MIN_MATCH
            {
                let len = self.match_length;
                let full = self.tally_dist(1, len - MIN_MATCH);

                self.lookahead -= len;
                self.strstart += len;
                self.match_length = 0;
                full
            }
            else
            {
                let lit = self.window[self.strstart];
                let full = self.tally_lit(lit);

                self.lookahead -= 1;
                self.strstart += 1;
                full
            };

            if full
            {
                self.flush_block_only(false);
            }
        }
        self.insert = 0;

        self.finish_or_block(flush)
    }

    /// No match search at all, pure Huffman coding of literals.
    fn deflate_huff(&mut self, input: &[u8], in_pos: &mut usize, flush: DeflateFlush)
        -> BlockState
    {
        loop
        {
            if self.lookahead == 0
            {
                self.fill_window(input, in_pos);

                if self.lookahead == 0
                {
                    if flush == DeflateFlush::None
                    {
                        return BlockState::NeedMore;
                    }
                    break;
                }
            }

            self.match_length = 0;

            let lit = self.window[self.strstart];
            let full = self.tally_lit(lit);

            self.lookahead -= 1;
            self.strstart += 1;

            if full
            {
                self.flush_block_only(false);
            }
        }
        self.insert = 0;

        self.finish_or_block(flush)
    }
}

/// A one-shot compressor over a complete in-memory buffer.
pub struct DeflateEncoder<'a>
{
    data:    &'a [u8],
    options: DeflateEncodingOptions,
}

impl<'a> DeflateEncoder<'a>
{
    /// Create a new deflate encoder with default options.
    pub fn new(data: &'a [u8]) -> DeflateEncoder<'a>
    {
        DeflateEncoder::new_with_options(data, DeflateEncodingOptions::default())
    }
    pub fn new_with_options(data: &'a [u8], options: DeflateEncodingOptions)
        -> DeflateEncoder<'a>
    {
        DeflateEncoder { data, options }
    }

    /// Compress to a zlib wrapped stream.
    #[cfg(feature = "zlib")]
    pub fn encode_zlib(&mut self) -> Result<Vec<u8>, EncodeErrors>
    {
        self.encode(DeflateStream::new(self.options.clone())?)
    }

    /// Compress to a single gzip member.
    #[cfg(feature = "gzip")]
    pub fn encode_gzip(&mut self) -> Result<Vec<u8>, EncodeErrors>
    {
        self.encode(DeflateStream::new_gzip(self.options.clone())?)
    }

    /// Compress to a bare deflate stream.
    pub fn encode_deflate(&mut self) -> Result<Vec<u8>, EncodeErrors>
    {
        self.encode(DeflateStream::new_raw(self.options.clone())?)
    }

    fn encode(&mut self, mut stream: DeflateStream) -> Result<Vec<u8>, EncodeErrors>
    {
        let mut out = vec![0_u8; stream.bound(self.data.len())];

        let result = stream.compress(self.data, &mut out, DeflateFlush::Finish)?;

        debug_assert_eq!(result.status, StreamStatus::StreamEnd);
        debug_assert_eq!(result.read, self.data.len());

        out.truncate(result.written);
        Ok(out)
    }
}
