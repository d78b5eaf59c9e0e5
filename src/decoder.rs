use std::cmp::min;

use log::trace;

use crate::adler::{adler32, ADLER_INIT};
use crate::bitstream::BitStreamReader;
use crate::constants::{
    DEFLATE_BLOCKTYPE_DYNAMIC_HUFFMAN, DEFLATE_BLOCKTYPE_STATIC, DEFLATE_BLOCKTYPE_UNCOMPRESSED,
    DEFLATE_MAX_LITLEN_CODEWORD_LENGTH, DEFLATE_MAX_OFFSET_CODEWORD_LENGTH,
    DEFLATE_MAX_PRE_CODEWORD_LEN, DEFLATE_NUM_LITLEN_SYMS, DEFLATE_NUM_OFFSET_SYMS,
    DEFLATE_NUM_PRECODE_SYMS, DEFLATE_PRECODE_LENS_PERMUTATION, HUFFDEC_END_OF_BLOCK,
    HUFFDEC_EXCEPTIONAL, HUFFDEC_LITERAL, HUFFDEC_SUITABLE_POINTER, LITLEN_DECODE_RESULTS,
    LITLEN_ENOUGH, LITLEN_TABLE_BITS, OFFSET_DECODE_RESULTS, OFFSET_ENOUGH, OFFSET_TABLEBITS,
    PRECODE_DECODE_RESULTS, PRECODE_ENOUGH, PRECODE_TABLE_BITS, STATIC_LITLEN_LENS,
};
use crate::crc32::{crc32, CRC_INIT};
use crate::enums::{InflateFlush, InflateMode, StreamResult, StreamStatus};
use crate::errors::{DecodeErrorStatus, InflateDecodeErrors};
use crate::gzip::{GzipFlags, GzipHeader};
use crate::huffman::build_decode_table;
use crate::utils::copy_match;
use crate::window::InflateWindow;

/// Which framing surrounds the raw deflate stream.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum Wrap
{
    Raw,
    Zlib,
    Gzip,
    /// Sniff zlib vs gzip from the first bytes.
    Auto,
}

/// Options shared by the one-shot decoder and the streaming decoder.
///
/// To remove the annoyance of getters and setters
/// all exposed options are declared public.
#[derive(Debug, Copy, Clone)]
pub struct DeflateOptions
{
    /// Maximum number of bytes the one-shot decoder may produce.
    ///
    /// The streaming decoder does not use this, the caller bounds output
    /// by the buffers it hands in.
    ///
    /// - Default value: `usize::MAX`
    pub limit:            usize,
    /// Whether to verify the wrapper checksum (and, for gzip, the
    /// length field) after decoding.
    ///
    /// - Default value: true
    pub confirm_checksum: bool,
    /// Initial output allocation for the one-shot decoder.
    ///
    /// - Default value: 37000
    pub size_hint:        usize,
    /// Window size as a power of two, 8..=15.
    ///
    /// Only consulted for raw streams; the zlib header carries its own
    /// window size and gzip always uses 15 bits.
    ///
    /// - Default value: 15
    pub window_bits:      usize,
    /// When false, back-references pointing before the start of the
    /// stream produce zero bytes instead of an error, which some
    /// historical archivers depend on.
    ///
    /// - Default value: true
    pub sane:             bool,
}

impl Default for DeflateOptions
{
    fn default() -> DeflateOptions
    {
        DeflateOptions {
            limit:            usize::MAX,
            confirm_checksum: true,
            size_hint:        37000,
            window_bits:      15,
            sane:             true,
        }
    }
}

impl DeflateOptions
{
    #[must_use]
    pub fn set_limit(mut self, limit: usize) -> Self
    {
        self.limit = limit;
        self
    }
    #[must_use]
    pub fn set_confirm_checksum(mut self, yes: bool) -> Self
    {
        self.confirm_checksum = yes;
        self
    }
    #[must_use]
    pub fn set_size_hint(mut self, hint: usize) -> Self
    {
        self.size_hint = hint;
        self
    }
    #[must_use]
    pub fn set_window_bits(mut self, bits: usize) -> Self
    {
        self.window_bits = bits;
        self
    }
    #[must_use]
    pub fn set_sane(mut self, yes: bool) -> Self
    {
        self.sane = yes;
        self
    }
}

/// ensure `n` bits are present in the accumulator or suspend,
/// leaving the stream state untouched for the next call
macro_rules! need_bits {
    ($stream:ident, $n:expr, $label:lifetime) => {
        if !$stream.has($n)
        {
            $stream.refill();

            if !$stream.has($n)
            {
                break $label;
            }
        }
    };
}

/// fail with a sticky data error
macro_rules! bad {
    ($self:ident, $err:ident, $label:lifetime, $status:expr) => {{
        $self.mode = InflateMode::Bad;
        $err = Some($status);
        break $label;
    }};
}

/// The streaming half of the decompressor.
///
/// A stream is driven by [`decompress`](Self::decompress) calls over
/// caller supplied buffers. Each call consumes and produces as much as
/// the buffers allow, then suspends; the next call resumes bit-exactly
/// where the previous one left off. Input handed to one call is never
/// looked at again, the relevant history lives in the stream's own
/// sliding window.
pub struct InflateStream
{
    mode:    InflateMode,
    wrap:    Wrap,
    /// what the stream actually turned out to be, for `wrap == Auto`
    format:  Wrap,
    options: DeflateOptions,

    last:     bool,
    havedict: bool,
    dictid:   u32,

    head:      GzipHeader,
    head_done: bool,
    gzip_flg:  GzipFlags,

    window: InflateWindow,

    // saved bit accumulator
    hold: u64,
    bits: u8,

    total_in:   u64,
    total_out:  u64,
    /// bytes produced for the current wrapper member
    member_out: u64,
    check:      u32,

    // current symbol being expanded
    length: usize,
    offset: usize,
    extra:  u8,

    // dynamic block header
    nlen:  usize,
    ndist: usize,
    ncode: usize,
    have:  usize,

    lens:         [u8; DEFLATE_NUM_LITLEN_SYMS + DEFLATE_NUM_OFFSET_SYMS],
    precode_lens: [u8; DEFLATE_NUM_PRECODE_SYMS],

    precode_table: [u32; PRECODE_ENOUGH],
    litlen_table:  Vec<u32>,
    offset_table:  Vec<u32>,

    precode_bits: usize,
    litlen_bits:  usize,
    offset_bits:  usize,

    static_codes_loaded: bool,
    sync_got:            usize,
}

impl InflateStream
{
    fn with_wrap(wrap: Wrap, options: DeflateOptions) -> Result<InflateStream, DecodeErrorStatus>
    {
        if !(8..=15).contains(&options.window_bits)
        {
            return Err(DecodeErrorStatus::Generic("invalid window bits"));
        }

        let window_bits = match wrap
        {
            Wrap::Raw => options.window_bits,
            // zlib streams advertise at most 15 bits and gzip always
            // uses 15, accept anything
            _ => 15,
        };

        Ok(InflateStream {
            mode: InflateMode::Head,
            wrap,
            format: if wrap == Wrap::Auto { Wrap::Auto } else { wrap },
            options,
            last: false,
            havedict: false,
            dictid: 0,
            head: GzipHeader::default(),
            head_done: false,
            gzip_flg: GzipFlags::empty(),
            window: InflateWindow::new(window_bits),
            hold: 0,
            bits: 0,
            total_in: 0,
            total_out: 0,
            member_out: 0,
            check: ADLER_INIT,
            length: 0,
            offset: 0,
            extra: 0,
            nlen: 0,
            ndist: 0,
            ncode: 0,
            have: 0,
            lens: [0; DEFLATE_NUM_LITLEN_SYMS + DEFLATE_NUM_OFFSET_SYMS],
            precode_lens: [0; DEFLATE_NUM_PRECODE_SYMS],
            precode_table: [0; PRECODE_ENOUGH],
            litlen_table: vec![0; LITLEN_ENOUGH],
            offset_table: vec![0; OFFSET_ENOUGH],
            precode_bits: 0,
            litlen_bits: 0,
            offset_bits: 0,
            static_codes_loaded: false,
            sync_got: 0,
        })
    }

    /// A decoder for a zlib wrapped stream.
    #[cfg(feature = "zlib")]
    pub fn new() -> InflateStream
    {
        // default options are always valid
        InflateStream::with_wrap(Wrap::Zlib, DeflateOptions::default()).unwrap()
    }
    /// A decoder for a bare deflate stream with the given window size.
    pub fn new_raw(window_bits: usize) -> Result<InflateStream, DecodeErrorStatus>
    {
        InflateStream::with_wrap(
            Wrap::Raw,
            DeflateOptions::default().set_window_bits(window_bits),
        )
    }
    /// A decoder for a gzip wrapped stream.
    #[cfg(feature = "gzip")]
    pub fn new_gzip() -> InflateStream
    {
        InflateStream::with_wrap(Wrap::Gzip, DeflateOptions::default()).unwrap()
    }
    /// A decoder that sniffs zlib vs gzip from the stream itself and,
    /// for gzip, decodes across member boundaries.
    pub fn new_auto() -> InflateStream
    {
        InflateStream::with_wrap(Wrap::Auto, DeflateOptions::default()).unwrap()
    }
    /// A zlib decoder with explicit options.
    #[cfg(feature = "zlib")]
    pub fn new_with_options(options: DeflateOptions) -> Result<InflateStream, DecodeErrorStatus>
    {
        InflateStream::with_wrap(Wrap::Zlib, options)
    }

    pub(crate) fn new_internal(
        wrap: Wrap, options: DeflateOptions,
    ) -> Result<InflateStream, DecodeErrorStatus>
    {
        InflateStream::with_wrap(wrap, options)
    }

    /// Total bytes consumed over the stream's lifetime.
    pub const fn total_in(&self) -> u64
    {
        self.total_in
    }
    /// Total bytes produced over the stream's lifetime.
    pub const fn total_out(&self) -> u64
    {
        self.total_out
    }
    /// The running checksum over produced output, Adler-32 for zlib and
    /// CRC-32 for gzip.
    pub const fn checksum(&self) -> u32
    {
        self.check
    }
    /// Whether the stream decoded to its end and the trailer checked out.
    pub fn is_finished(&self) -> bool
    {
        self.mode == InflateMode::Done
    }
    /// The gzip member header, once it has been fully parsed.
    pub fn gzip_header(&self) -> Option<&GzipHeader>
    {
        self.head_done.then_some(&self.head)
    }

    /// Return the stream to its freshly initialized state, keeping
    /// allocations.
    pub fn reset(&mut self)
    {
        self.mode = InflateMode::Head;
        self.format = if self.wrap == Wrap::Auto
        {
            Wrap::Auto
        }
        else
        {
            self.wrap
        };
        self.last = false;
        self.havedict = false;
        self.dictid = 0;
        self.head = GzipHeader::default();
        self.head_done = false;
        self.gzip_flg = GzipFlags::empty();
        self.window.reset();
        self.hold = 0;
        self.bits = 0;
        self.total_in = 0;
        self.total_out = 0;
        self.member_out = 0;
        self.check = ADLER_INIT;
        self.static_codes_loaded = false;
        self.sync_got = 0;
    }

    /// Supply the preset dictionary a zlib stream asked for via
    /// [`StreamStatus::NeedDict`], or pre-load history for a raw stream.
    pub fn set_dictionary(&mut self, dict: &[u8]) -> Result<(), DecodeErrorStatus>
    {
        match self.mode
        {
            InflateMode::Dict =>
            {
                let id = adler32(ADLER_INIT, dict);

                if id != self.dictid
                {
                    return Err(DecodeErrorStatus::Generic("incorrect dictionary checksum"));
                }
                self.window.set_dictionary(dict);
                self.havedict = true;
                Ok(())
            }
            InflateMode::Head | InflateMode::BlockHead if self.wrap == Wrap::Raw =>
            {
                self.window.set_dictionary(dict);
                self.havedict = true;
                Ok(())
            }
            _ => Err(DecodeErrorStatus::Generic(
                "stream is not at a dictionary point",
            )),
        }
    }

    /// Copy out up to `dest.len()` bytes of current history, oldest
    /// first; returns the number written.
    pub fn dictionary(&self, dest: &mut [u8]) -> usize
    {
        self.window.dictionary(dest)
    }

    /// Scan `input` for the byte aligned marker an encoder's sync flush
    /// leaves behind (`00 00 FF FF`).
    ///
    /// Returns the position just past the marker once found, having
    /// reset the stream to continue at a block boundary there; `None`
    /// means the marker has not been seen yet and more input is needed.
    /// Partial marker prefixes are remembered across calls.
    pub fn sync(&mut self, input: &[u8]) -> Option<usize>
    {
        let mut got = self.sync_got;

        for (pos, byte) in input.iter().enumerate()
        {
            if *byte == if got < 2 { 0 } else { 0xFF }
            {
                got += 1;
            }
            else if *byte != 0
            {
                got = 0;
            }
            else
            {
                got = 4 - got;
            }

            if got == 4
            {
                self.sync_got = 0;
                self.hold = 0;
                self.bits = 0;
                self.last = false;
                self.mode = InflateMode::BlockHead;
                return Some(pos + 1);
            }
        }
        self.sync_got = got;
        None
    }

    fn update_check(&self, check: u32, data: &[u8]) -> u32
    {
        match self.format
        {
            Wrap::Zlib => adler32(check, data),
            Wrap::Gzip => crc32(check, data),
            _ => check,
        }
    }

    /// crc header bytes while inside a gzip header, where `check` doubles
    /// as the header crc accumulator
    fn hcrc(&mut self, bytes: &[u8])
    {
        self.check = crc32(self.check, bytes);
    }

    /// One step call: decode from `input` into `output` until one of
    /// them runs out, the flush request is satisfied, or the stream
    /// ends.
    ///
    /// The returned [`StreamResult`] carries the bytes consumed and
    /// produced by this call; unconsumed input must be passed in again
    /// next time.
    ///
    /// Data errors are sticky: once one is returned every further call
    /// fails until [`reset`](Self::reset).
    pub fn decompress(
        &mut self, input: &[u8], output: &mut [u8], flush: InflateFlush,
    ) -> Result<StreamResult, DecodeErrorStatus>
    {
        let mut stream = BitStreamReader::new_with_state(input, self.hold, self.bits);
        let mut out_pos = 0_usize;
        // bytes of `output` already folded into check/member counters
        let mut accounted = 0_usize;
        let mut status = StreamStatus::Ok;
        let mut err: Option<DecodeErrorStatus> = None;

        let entry_mode = self.mode;
        let entry_bits = self.bits;

        let block_boundary_flush =
            matches!(flush, InflateFlush::Block | InflateFlush::Trees);

        'state: loop
        {
            match self.mode
            {
                InflateMode::Head =>
                {
                    if self.wrap == Wrap::Raw
                    {
                        self.format = Wrap::Raw;
                        self.mode = InflateMode::BlockHead;
                        continue;
                    }
                    need_bits!(stream, 16, 'state);

                    let b0 = stream.peek_var_bits(8) as u8;
                    let b1 = stream.peek_bits_offset(8, 8) as u8;

                    if self.wrap == Wrap::Gzip
                        || (self.wrap == Wrap::Auto && b0 == 0x1F && b1 == 0x8B)
                    {
                        if b0 != 0x1F || b1 != 0x8B
                        {
                            bad!(
                                self,
                                err,
                                'state,
                                DecodeErrorStatus::Generic("incorrect header check")
                            );
                        }
                        stream.drop_bits(16);
                        self.format = Wrap::Gzip;
                        self.head = GzipHeader::default();
                        self.head_done = false;
                        self.check = CRC_INIT;
                        self.hcrc(&[0x1F, 0x8B]);
                        self.mode = InflateMode::GzipFlags;
                        continue;
                    }

                    // zlib header, RFC 1950
                    let cmf = b0;
                    let flg = b1;

                    let cm = cmf & 0xF;
                    let cinfo = cmf >> 4;

                    if cm != 8
                    {
                        if cm == 15
                        {
                            bad!(self, err, 'state, DecodeErrorStatus::Generic(
                                "CM of 15 is preserved by the standard,currently don't know how to handle it"
                            ));
                        }
                        bad!(self, err, 'state, DecodeErrorStatus::GenericStr(format!(
                            "Unknown zlib compression method {cm}"
                        )));
                    }
                    if cinfo > 7
                    {
                        bad!(self, err, 'state, DecodeErrorStatus::GenericStr(format!(
                            "Unknown cinfo `{cinfo}` greater than 7, not allowed"
                        )));
                    }
                    let flag_checks = (u16::from(cmf) * 256) + u16::from(flg);

                    if flag_checks % 31 != 0
                    {
                        bad!(
                            self,
                            err,
                            'state,
                            DecodeErrorStatus::Generic("FCHECK integrity not preserved")
                        );
                    }

                    stream.drop_bits(16);
                    self.format = Wrap::Zlib;
                    self.check = ADLER_INIT;

                    if (flg >> 5) & 1 == 1
                    {
                        self.mode = InflateMode::DictId;
                    }
                    else
                    {
                        self.mode = InflateMode::BlockHead;
                    }
                }
                InflateMode::GzipFlags =>
                {
                    need_bits!(stream, 16, 'state);

                    let v = stream.get_bits(16);
                    let method = (v & 0xFF) as u8;
                    let flg = (v >> 8) as u8;

                    if method != 8
                    {
                        bad!(
                            self,
                            err,
                            'state,
                            DecodeErrorStatus::Generic("unknown compression method")
                        );
                    }
                    if flg & 0xE0 != 0
                    {
                        bad!(
                            self,
                            err,
                            'state,
                            DecodeErrorStatus::Generic("unknown gzip header flags set")
                        );
                    }
                    self.gzip_flg = GzipFlags::from_bits_truncate(flg);
                    self.head.text = self.gzip_flg.contains(GzipFlags::TEXT);
                    self.hcrc(&[method, flg]);
                    self.mode = InflateMode::GzipTime;
                }
                InflateMode::GzipTime =>
                {
                    need_bits!(stream, 32, 'state);

                    let mtime = stream.get_bits(32) as u32;

                    self.head.mtime = mtime;
                    self.hcrc(&mtime.to_le_bytes());
                    self.mode = InflateMode::GzipOs;
                }
                InflateMode::GzipOs =>
                {
                    need_bits!(stream, 16, 'state);

                    let v = stream.get_bits(16);

                    self.head.os = (v >> 8) as u8;
                    self.hcrc(&[(v & 0xFF) as u8, (v >> 8) as u8]);

                    self.mode = if self.gzip_flg.contains(GzipFlags::EXTRA)
                    {
                        InflateMode::GzipExtraLen
                    }
                    else
                    {
                        InflateMode::GzipName
                    };
                }
                InflateMode::GzipExtraLen =>
                {
                    need_bits!(stream, 16, 'state);

                    let len = stream.get_bits(16);

                    self.length = len as usize;
                    self.head.extra = Some(Vec::with_capacity(self.length));
                    self.hcrc(&[(len & 0xFF) as u8, (len >> 8) as u8]);
                    self.mode = InflateMode::GzipExtra;
                }
                InflateMode::GzipExtra =>
                {
                    while self.length > 0
                    {
                        need_bits!(stream, 8, 'state);

                        let byte = stream.get_bits(8) as u8;

                        self.hcrc(&[byte]);

                        if let Some(extra) = &mut self.head.extra
                        {
                            extra.push(byte);
                        }
                        self.length -= 1;
                    }
                    self.mode = InflateMode::GzipName;
                }
                InflateMode::GzipName =>
                {
                    if self.gzip_flg.contains(GzipFlags::NAME)
                    {
                        if self.head.name.is_none()
                        {
                            self.head.name = Some(Vec::new());
                        }
                        loop
                        {
                            need_bits!(stream, 8, 'state);

                            let byte = stream.get_bits(8) as u8;

                            self.hcrc(&[byte]);

                            if byte == 0
                            {
                                break;
                            }
                            if let Some(name) = &mut self.head.name
                            {
                                name.push(byte);
                            }
                        }
                    }
                    self.mode = InflateMode::GzipComment;
                }
                InflateMode::GzipComment =>
                {
                    if self.gzip_flg.contains(GzipFlags::COMMENT)
                    {
                        if self.head.comment.is_none()
                        {
                            self.head.comment = Some(Vec::new());
                        }
                        loop
                        {
                            need_bits!(stream, 8, 'state);

                            let byte = stream.get_bits(8) as u8;

                            self.hcrc(&[byte]);

                            if byte == 0
                            {
                                break;
                            }
                            if let Some(comment) = &mut self.head.comment
                            {
                                comment.push(byte);
                            }
                        }
                    }
                    self.mode = InflateMode::GzipHcrc;
                }
                InflateMode::GzipHcrc =>
                {
                    if self.gzip_flg.contains(GzipFlags::HCRC)
                    {
                        need_bits!(stream, 16, 'state);

                        let stored = stream.get_bits(16) as u32;

                        self.head.hcrc = true;

                        if self.options.confirm_checksum && stored != self.check & 0xFFFF
                        {
                            bad!(
                                self,
                                err,
                                'state,
                                DecodeErrorStatus::Generic("header crc mismatch")
                            );
                        }
                    }
                    trace!("gzip header parsed");
                    self.head_done = true;
                    self.check = CRC_INIT;
                    self.member_out = 0;
                    self.mode = InflateMode::BlockHead;
                }
                InflateMode::DictId =>
                {
                    need_bits!(stream, 32, 'state);

                    // the id is the dictionary's Adler-32, stored big endian
                    self.dictid = (stream.get_bits(32) as u32).swap_bytes();
                    self.mode = InflateMode::Dict;
                }
                InflateMode::Dict =>
                {
                    if !self.havedict
                    {
                        status = StreamStatus::NeedDict(self.dictid);
                        break 'state;
                    }
                    self.check = ADLER_INIT;
                    self.mode = InflateMode::BlockHead;
                }
                InflateMode::BlockHead =>
                {
                    if self.last
                    {
                        stream.align_to_byte();
                        self.mode = if self.format == Wrap::Raw
                        {
                            InflateMode::Done
                        }
                        else
                        {
                            InflateMode::Check
                        };
                        continue;
                    }
                    need_bits!(stream, 3, 'state);

                    self.last = stream.get_bits(1) == 1;

                    let block_type = stream.get_bits(2);

                    match block_type
                    {
                        DEFLATE_BLOCKTYPE_UNCOMPRESSED =>
                        {
                            self.mode = InflateMode::StoredLen;
                        }
                        DEFLATE_BLOCKTYPE_STATIC =>
                        {
                            trace!("static block, last:{}", self.last);

                            if !self.static_codes_loaded
                            {
                                self.load_static_tables();
                            }
                            self.mode = InflateMode::Len;

                            if flush == InflateFlush::Trees
                            {
                                break 'state;
                            }
                        }
                        DEFLATE_BLOCKTYPE_DYNAMIC_HUFFMAN =>
                        {
                            trace!("dynamic block, last:{}", self.last);
                            self.mode = InflateMode::TableSizes;
                        }
                        _ =>
                        {
                            bad!(
                                self,
                                err,
                                'state,
                                DecodeErrorStatus::Generic("invalid block type")
                            );
                        }
                    }
                }
                InflateMode::StoredLen =>
                {
                    stream.align_to_byte();
                    need_bits!(stream, 32, 'state);

                    let v = stream.get_bits(32);
                    let len = (v & 0xFFFF) as usize;
                    let nlen = (v >> 16) as usize;

                    if len != !nlen & 0xFFFF
                    {
                        bad!(
                            self,
                            err,
                            'state,
                            DecodeErrorStatus::Generic("invalid stored block lengths")
                        );
                    }
                    trace!("stored block of {} bytes, last:{}", len, self.last);
                    self.length = len;
                    self.mode = InflateMode::StoredCopy;

                    if flush == InflateFlush::Trees
                    {
                        break 'state;
                    }
                }
                InflateMode::StoredCopy =>
                {
                    while self.length > 0
                    {
                        if out_pos == output.len()
                        {
                            break 'state;
                        }
                        let want = min(self.length, output.len() - out_pos);
                        let got = stream.read_aligned_bytes(&mut output[out_pos..out_pos + want]);

                        if got == 0
                        {
                            break 'state;
                        }
                        out_pos += got;
                        self.length -= got;
                    }
                    self.mode = InflateMode::BlockHead;

                    if block_boundary_flush
                    {
                        break 'state;
                    }
                }
                InflateMode::TableSizes =>
                {
                    need_bits!(stream, 14, 'state);

                    self.nlen = 257 + stream.get_bits(5) as usize;
                    self.ndist = 1 + stream.get_bits(5) as usize;
                    self.ncode = 4 + stream.get_bits(4) as usize;

                    if self.nlen > 286 || self.ndist > 30
                    {
                        bad!(self, err, 'state, DecodeErrorStatus::Generic(
                            "too many length or distance symbols"
                        ));
                    }
                    self.have = 0;
                    self.precode_lens = [0; DEFLATE_NUM_PRECODE_SYMS];
                    self.mode = InflateMode::PreCodeLens;
                }
                InflateMode::PreCodeLens =>
                {
                    while self.have < self.ncode
                    {
                        need_bits!(stream, 3, 'state);

                        let len = stream.get_bits(3) as u8;

                        self.precode_lens
                            [usize::from(DEFLATE_PRECODE_LENS_PERMUTATION[self.have])] = len;
                        self.have += 1;
                    }

                    match build_decode_table(
                        &self.precode_lens,
                        &PRECODE_DECODE_RESULTS,
                        &mut self.precode_table,
                        PRECODE_TABLE_BITS,
                        DEFLATE_NUM_PRECODE_SYMS,
                        usize::from(DEFLATE_MAX_PRE_CODEWORD_LEN),
                    )
                    {
                        Ok(bits) => self.precode_bits = bits,
                        Err(_) =>
                        {
                            bad!(
                                self,
                                err,
                                'state,
                                DecodeErrorStatus::Generic("invalid code lengths set")
                            );
                        }
                    }
                    self.have = 0;
                    self.mode = InflateMode::CodeLens;
                }
                InflateMode::CodeLens =>
                {
                    while self.have < self.nlen + self.ndist
                    {
                        stream.refill();

                        let entry = self.precode_table[stream.peek_var_bits(self.precode_bits)];
                        let cbits = (entry & 0xFF) as u8;

                        if !stream.has(cbits)
                        {
                            break 'state;
                        }
                        let presym = (entry >> 16) as usize;

                        if presym < 16
                        {
                            // explicit codeword length
                            stream.drop_bits(cbits);
                            self.lens[self.have] = presym as u8;
                            self.have += 1;
                            continue;
                        }

                        /* Run-length encoded codeword lengths */
                        let (extra_bits, base) = match presym
                        {
                            16 => (2_u8, 3_usize),
                            17 => (3, 3),
                            _ => (7, 11),
                        };

                        if !stream.has(cbits + extra_bits)
                        {
                            break 'state;
                        }
                        stream.drop_bits(cbits);

                        let count = base + stream.get_bits(extra_bits) as usize;

                        let rep_val = if presym == 16
                        {
                            // repeat of the previous length, which must exist
                            if self.have == 0
                            {
                                bad!(
                                    self,
                                    err,
                                    'state,
                                    DecodeErrorStatus::Generic("invalid bit length repeat")
                                );
                            }
                            self.lens[self.have - 1]
                        }
                        else
                        {
                            0
                        };

                        if self.have + count > self.nlen + self.ndist
                        {
                            bad!(
                                self,
                                err,
                                'state,
                                DecodeErrorStatus::Generic("invalid bit length repeat")
                            );
                        }
                        self.lens[self.have..self.have + count].fill(rep_val);
                        self.have += count;
                    }

                    // end of block has to be codable
                    if self.lens[256] == 0
                    {
                        bad!(self, err, 'state, DecodeErrorStatus::Generic(
                            "invalid code -- missing end-of-block"
                        ));
                    }

                    match build_decode_table(
                        &self.lens[..self.nlen],
                        &LITLEN_DECODE_RESULTS,
                        &mut self.litlen_table,
                        LITLEN_TABLE_BITS,
                        self.nlen,
                        DEFLATE_MAX_LITLEN_CODEWORD_LENGTH,
                    )
                    {
                        Ok(bits) => self.litlen_bits = bits,
                        Err(_) =>
                        {
                            bad!(
                                self,
                                err,
                                'state,
                                DecodeErrorStatus::Generic("invalid literal/lengths set")
                            );
                        }
                    }
                    match build_decode_table(
                        &self.lens[self.nlen..self.nlen + self.ndist],
                        &OFFSET_DECODE_RESULTS,
                        &mut self.offset_table,
                        OFFSET_TABLEBITS,
                        self.ndist,
                        DEFLATE_MAX_OFFSET_CODEWORD_LENGTH,
                    )
                    {
                        Ok(bits) => self.offset_bits = bits,
                        Err(_) =>
                        {
                            bad!(
                                self,
                                err,
                                'state,
                                DecodeErrorStatus::Generic("invalid distances set")
                            );
                        }
                    }
                    self.static_codes_loaded = false;
                    self.mode = InflateMode::Len;

                    if flush == InflateFlush::Trees
                    {
                        break 'state;
                    }
                }
                InflateMode::Len =>
                {
                    loop
                    {
                        stream.refill();

                        let mut entry = self.litlen_table[stream.peek_var_bits(self.litlen_bits)];
                        let mut cw = ((entry >> 8) & 0x1F) as u8;

                        if entry & HUFFDEC_SUITABLE_POINTER != 0
                        {
                            let root = (entry & 0xFF) as u8;
                            let sub_bits = ((entry >> 8) & 0x3F) as usize;
                            let idx = (entry >> 16) as usize
                                + stream.peek_bits_offset(root, sub_bits);

                            entry = self.litlen_table[idx];
                            cw = root + ((entry >> 8) & 0x1F) as u8;
                        }
                        if !stream.has(cw)
                        {
                            break 'state;
                        }

                        if entry & HUFFDEC_LITERAL != 0
                        {
                            if out_pos == output.len()
                            {
                                break 'state;
                            }
                            stream.drop_bits(cw);
                            output[out_pos] = (entry >> 16) as u8;
                            out_pos += 1;
                            continue;
                        }
                        if entry & HUFFDEC_EXCEPTIONAL != 0
                        {
                            if entry & HUFFDEC_END_OF_BLOCK != 0
                            {
                                stream.drop_bits(cw);
                                self.mode = InflateMode::BlockHead;

                                if block_boundary_flush
                                {
                                    break 'state;
                                }
                                continue 'state;
                            }
                            bad!(
                                self,
                                err,
                                'state,
                                DecodeErrorStatus::Generic("invalid literal/length code")
                            );
                        }

                        // a length code
                        stream.drop_bits(cw);
                        self.length = (entry >> 16) as usize;
                        self.extra = (entry & 0xFF) as u8 - ((entry >> 8) & 0x1F) as u8;
                        self.mode = InflateMode::LenExt;
                        continue 'state;
                    }
                }
                InflateMode::LenExt =>
                {
                    if self.extra > 0
                    {
                        need_bits!(stream, self.extra, 'state);
                        self.length += stream.get_bits(self.extra) as usize;
                    }
                    self.mode = InflateMode::Dist;
                }
                InflateMode::Dist =>
                {
                    stream.refill();

                    let mut entry = self.offset_table[stream.peek_var_bits(self.offset_bits)];
                    let mut cw = ((entry >> 8) & 0x1F) as u8;

                    if entry & HUFFDEC_SUITABLE_POINTER != 0
                    {
                        let root = (entry & 0xFF) as u8;
                        let sub_bits = ((entry >> 8) & 0x3F) as usize;
                        let idx =
                            (entry >> 16) as usize + stream.peek_bits_offset(root, sub_bits);

                        entry = self.offset_table[idx];
                        cw = root + ((entry >> 8) & 0x1F) as u8;
                    }
                    if !stream.has(cw)
                    {
                        break 'state;
                    }
                    if entry & HUFFDEC_EXCEPTIONAL != 0
                    {
                        bad!(
                            self,
                            err,
                            'state,
                            DecodeErrorStatus::Generic("invalid distance code")
                        );
                    }
                    stream.drop_bits(cw);
                    self.offset = (entry >> 16) as usize;
                    self.extra = (entry & 0xFF) as u8 - ((entry >> 8) & 0x1F) as u8;
                    self.mode = InflateMode::DistExt;
                }
                InflateMode::DistExt =>
                {
                    if self.extra > 0
                    {
                        need_bits!(stream, self.extra, 'state);
                        self.offset += stream.get_bits(self.extra) as usize;
                    }

                    if self.options.sane && self.offset > out_pos + self.window.have()
                    {
                        bad!(
                            self,
                            err,
                            'state,
                            DecodeErrorStatus::Generic("invalid distance too far back")
                        );
                    }
                    self.mode = InflateMode::Match;
                }
                InflateMode::Match =>
                {
                    while self.length > 0
                    {
                        if out_pos == output.len()
                        {
                            break 'state;
                        }
                        if self.offset <= out_pos
                        {
                            // entirely within this call's output
                            let n = min(self.length, output.len() - out_pos);

                            copy_match(output, out_pos, self.offset, n);
                            out_pos += n;
                            self.length -= n;
                        }
                        else
                        {
                            // reaches into the window, pull one byte at a
                            // time until the copy is self contained
                            let back = self.offset - out_pos;

                            let byte = if back <= self.window.have()
                            {
                                self.window.byte_at_back(back)
                            }
                            else
                            {
                                // only reachable with sane unset
                                0
                            };
                            output[out_pos] = byte;
                            out_pos += 1;
                            self.length -= 1;
                        }
                    }
                    self.mode = InflateMode::Len;
                }
                InflateMode::Check =>
                {
                    // fold output produced so far into the running
                    // checksum before comparing against the trailer
                    if accounted < out_pos
                    {
                        self.check = self.update_check(self.check, &output[accounted..out_pos]);
                        self.member_out += (out_pos - accounted) as u64;
                        accounted = out_pos;
                    }
                    need_bits!(stream, 32, 'state);

                    let raw = stream.get_bits(32) as u32;

                    // zlib stores the Adler-32 big endian, gzip the
                    // CRC-32 little endian
                    let stored = if self.format == Wrap::Zlib
                    {
                        raw.swap_bytes()
                    }
                    else
                    {
                        raw
                    };

                    if self.options.confirm_checksum && stored != self.check
                    {
                        if self.format == Wrap::Zlib
                        {
                            bad!(
                                self,
                                err,
                                'state,
                                DecodeErrorStatus::MismatchedAdler(stored, self.check)
                            );
                        }
                        bad!(
                            self,
                            err,
                            'state,
                            DecodeErrorStatus::MismatchedCRC(stored, self.check)
                        );
                    }
                    trace!("stream checksum verified");

                    self.mode = if self.format == Wrap::Gzip
                    {
                        InflateMode::Length
                    }
                    else
                    {
                        InflateMode::Done
                    };
                }
                InflateMode::Length =>
                {
                    need_bits!(stream, 32, 'state);

                    let stored = stream.get_bits(32) as u32;

                    if self.options.confirm_checksum
                        && u64::from(stored) != self.member_out & 0xFFFF_FFFF
                    {
                        bad!(
                            self,
                            err,
                            'state,
                            DecodeErrorStatus::MismatchedLength(
                                u64::from(stored),
                                self.member_out & 0xFFFF_FFFF
                            )
                        );
                    }

                    if self.wrap == Wrap::Auto && stream.remaining_bytes_with_buffer() > 0
                    {
                        // another member follows, keep going
                        trace!("gzip member complete, spanning into the next");
                        self.last = false;
                        self.head_done = false;
                        self.check = CRC_INIT;
                        self.member_out = 0;
                        self.mode = InflateMode::Head;
                        continue;
                    }
                    self.mode = InflateMode::Done;
                }
                InflateMode::Done =>
                {
                    status = StreamStatus::StreamEnd;
                    break 'state;
                }
                InflateMode::Bad =>
                {
                    err = Some(DecodeErrorStatus::StickyError);
                    break 'state;
                }
            }
        }

        // fold whatever this call produced into the running counters,
        // mirror it into the window and save the accumulator
        if accounted < out_pos && self.format != Wrap::Raw
        {
            self.check = self.update_check(self.check, &output[accounted..out_pos]);
            self.member_out += (out_pos - accounted) as u64;
        }
        self.window.update(&output[..out_pos]);

        let read = stream.get_position();

        self.total_in += read as u64;
        self.total_out += out_pos as u64;
        self.hold = stream.buffer;
        self.bits = stream.bits_left;

        if let Some(e) = err
        {
            return Err(e);
        }

        if status == StreamStatus::Ok
        {
            let progress = read > 0
                || out_pos > 0
                || self.mode != entry_mode
                || self.bits != entry_bits;

            if !progress
            {
                status = StreamStatus::BufError;
            }
        }

        Ok(StreamResult::new(status, read, out_pos))
    }

    fn load_static_tables(&mut self)
    {
        // infallible, the static code is complete
        if let Ok(bits) = build_decode_table(
            &STATIC_LITLEN_LENS,
            &LITLEN_DECODE_RESULTS,
            &mut self.litlen_table,
            LITLEN_TABLE_BITS,
            DEFLATE_NUM_LITLEN_SYMS,
            DEFLATE_MAX_LITLEN_CODEWORD_LENGTH,
        )
        {
            self.litlen_bits = bits;
        }

        let dist_lens = [5_u8; DEFLATE_NUM_OFFSET_SYMS];

        if let Ok(bits) = build_decode_table(
            &dist_lens,
            &OFFSET_DECODE_RESULTS,
            &mut self.offset_table,
            OFFSET_TABLEBITS,
            DEFLATE_NUM_OFFSET_SYMS,
            DEFLATE_MAX_OFFSET_CODEWORD_LENGTH,
        )
        {
            self.offset_bits = bits;
        }
        self.static_codes_loaded = true;
    }
}

/// A one-shot decompressor over a complete in-memory buffer.
///
/// This is a convenience layer over [`InflateStream`] that grows an
/// output vector until the stream ends.
pub struct DeflateDecoder<'a>
{
    data:    &'a [u8],
    options: DeflateOptions,
}

impl<'a> DeflateDecoder<'a>
{
    pub fn new(data: &'a [u8]) -> DeflateDecoder<'a>
    {
        DeflateDecoder::new_with_options(data, DeflateOptions::default())
    }
    pub fn new_with_options(data: &'a [u8], options: DeflateOptions) -> DeflateDecoder<'a>
    {
        DeflateDecoder { data, options }
    }

    /// Decode a zlib wrapped stream, verifying the Adler-32 trailer.
    #[cfg(feature = "zlib")]
    pub fn decode_zlib(&mut self) -> Result<Vec<u8>, InflateDecodeErrors>
    {
        if self.data.len()
            < 2 /* zlib header */
            + 4
        /* Adler32 */
        {
            return Err(InflateDecodeErrors::new_with_error(
                DecodeErrorStatus::InsufficientData,
            ));
        }
        self.decode(Wrap::Zlib, self.options.size_hint)
    }

    /// Decode one or more gzip members, verifying each trailer.
    #[cfg(feature = "gzip")]
    pub fn decode_gzip(&mut self) -> Result<Vec<u8>, InflateDecodeErrors>
    {
        if self.data.len() < 18
        {
            return Err(InflateDecodeErrors::new_with_error(
                DecodeErrorStatus::InsufficientData,
            ));
        }
        // ISIZE of the last member is a good first guess for the whole
        // output, but a corrupt field must not drive the allocation:
        // deflate cannot expand beyond 1032x
        let isize_hint = u32::from_le_bytes(
            self.data[self.data.len() - 4..].try_into().unwrap_or([0; 4]),
        ) as usize;
        let isize_hint = isize_hint.min(self.data.len().saturating_mul(1032));

        self.decode(Wrap::Auto, self.options.size_hint.max(isize_hint))
    }

    /// Decode a bare deflate stream.
    pub fn decode_deflate(&mut self) -> Result<Vec<u8>, InflateDecodeErrors>
    {
        self.decode(Wrap::Raw, self.options.size_hint)
    }

    fn decode(&mut self, wrap: Wrap, size_hint: usize) -> Result<Vec<u8>, InflateDecodeErrors>
    {
        let mut stream = InflateStream::new_internal(wrap, self.options)
            .map_err(InflateDecodeErrors::new_with_error)?;

        let mut out = vec![0_u8; size_hint.clamp(64, self.options.limit.max(64))];
        let mut in_pos = 0_usize;
        let mut out_pos = 0_usize;

        loop
        {
            let result =
                match stream.decompress(&self.data[in_pos..], &mut out[out_pos..], InflateFlush::Finish)
                {
                    Ok(r) => r,
                    Err(e) =>
                    {
                        out.truncate(stream.total_out() as usize);
                        return Err(InflateDecodeErrors::new(e, out));
                    }
                };

            in_pos += result.read;
            out_pos += result.written;

            match result.status
            {
                StreamStatus::StreamEnd =>
                {
                    out.truncate(out_pos);
                    return Ok(out);
                }
                StreamStatus::NeedDict(adler) =>
                {
                    out.truncate(out_pos);
                    return Err(InflateDecodeErrors::new(
                        DecodeErrorStatus::NeedsDictionary(adler),
                        out,
                    ));
                }
                StreamStatus::Ok | StreamStatus::BufError =>
                {
                    if out_pos == out.len()
                    {
                        if out.len() >= self.options.limit
                        {
                            out.truncate(out_pos);
                            return Err(InflateDecodeErrors::new(
                                DecodeErrorStatus::OutputLimitExceeded(
                                    self.options.limit,
                                    out.len(),
                                ),
                                out,
                            ));
                        }
                        let new_len = (out.len() * 2).clamp(64, self.options.limit);

                        out.resize(new_len, 0);
                    }
                    else if in_pos >= self.data.len() || result.status == StreamStatus::BufError
                    {
                        // output space remains but the input is gone
                        out.truncate(out_pos);
                        return Err(InflateDecodeErrors::new(
                            DecodeErrorStatus::InsufficientData,
                            out,
                        ));
                    }
                }
            }
        }
    }
}
