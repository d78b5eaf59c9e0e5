/// States the streaming inflate engine can suspend in.
///
/// A step call resumes in the state it suspended in, with the bit
/// accumulator it suspended with, so every variant corresponds to a point
/// where the engine may run out of input or output mid way.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum InflateMode
{
    /// Waiting for the zlib/gzip magic, or dispatching for raw streams
    Head,
    /// gzip FLG/MTIME/XFL/OS fields
    GzipFlags,
    GzipTime,
    GzipOs,
    /// gzip extra field, length then payload
    GzipExtraLen,
    GzipExtra,
    /// gzip original file name, NUL terminated
    GzipName,
    /// gzip comment, NUL terminated
    GzipComment,
    /// gzip CRC16 over the header bytes
    GzipHcrc,
    /// zlib preset dictionary id
    DictId,
    /// Waiting for the caller to supply the preset dictionary
    Dict,
    /// At a block boundary
    BlockHead,
    /// Stored block length and its complement
    StoredLen,
    /// Copying stored bytes
    StoredCopy,
    /// Dynamic block nlen/ndist/ncode
    TableSizes,
    /// Reading the 3 bit precode lengths
    PreCodeLens,
    /// Decoding the run-length coded main code lengths
    CodeLens,
    /// Decoding a literal/length symbol
    Len,
    /// Reading extra length bits
    LenExt,
    /// Decoding a distance symbol
    Dist,
    /// Reading extra distance bits
    DistExt,
    /// Copying a match
    Match,
    /// Wrapper checksum
    Check,
    /// gzip uncompressed length
    Length,
    /// Stream fully decoded and verified
    Done,
    /// Sticky data error
    Bad,
}

/// How far a single inflate step call should run.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum InflateFlush
{
    /// Decode as much as input and output space allow.
    None,
    /// Same as [`None`](Self::None), all remaining input is expected to
    /// be present.
    Finish,
    /// Stop when a block boundary is reached.
    Block,
    /// Stop when a block boundary is reached, and additionally right
    /// after a block header has been decoded.
    Trees,
}

/// Flush behaviour for one deflate step call.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DeflateFlush
{
    /// Let the compressor decide how much data to accumulate before
    /// producing output.
    None,
    /// End the current block with an empty static block, not byte aligned.
    Partial,
    /// End the current block and emit an empty stored block so that the
    /// decompressor can resynchronize at a byte boundary.
    Sync,
    /// Like [`Sync`](Self::Sync) but also forget the match history, so
    /// decompression can restart from this point.
    Full,
    /// End the current block without any marker.
    Block,
    /// Compress everything, emit the final block and the wrapper trailer.
    Finish,
}

/// Match finding strategies.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DeflateStrategy
{
    /// Full lazy match search.
    Default,
    /// Favour literals over short distant matches, for data with a
    /// filter-style predictor already applied.
    Filtered,
    /// Huffman coding only, no match search.
    HuffmanOnly,
    /// Matches restricted to distance one, run length encoding.
    Rle,
    /// Always use the static codes.
    Fixed,
}

/// Non-error outcomes of a step call, for either direction.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StreamStatus
{
    /// Progress was made, call again.
    Ok,
    /// The stream is complete and the trailer was emitted/verified.
    StreamEnd,
    /// No forward progress is possible without more input or more output
    /// space. Transient, the call may be retried.
    BufError,
    /// The stream needs the preset dictionary with this Adler-32 id.
    NeedDict(u32),
}

/// Counters for one step call.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct StreamResult
{
    pub status:  StreamStatus,
    /// Bytes consumed from the caller's input
    pub read:    usize,
    /// Bytes produced into the caller's output
    pub written: usize,
}

impl StreamResult
{
    pub(crate) const fn new(status: StreamStatus, read: usize, written: usize) -> StreamResult
    {
        StreamResult {
            status,
            read,
            written,
        }
    }
}

/// Best effort classification of the data seen by the compressor.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DataType
{
    Binary,
    Text,
    Unknown,
}
