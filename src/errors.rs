use std::fmt::{Debug, Display, Formatter};

/// A struct returned when decompression fails
pub struct InflateDecodeErrors
{
    /// reason why decompression fails
    pub error: DecodeErrorStatus,
    /// Decoded data up until that decompression error
    pub data:  Vec<u8>,
}

impl InflateDecodeErrors
{
    /// Create a new decode wrapper with data being
    /// how many bytes we actually decoded before hitting an error
    pub fn new(error: DecodeErrorStatus, data: Vec<u8>) -> InflateDecodeErrors
    {
        InflateDecodeErrors { error, data }
    }
    /// Create a new decode wrapper with an empty vector
    pub fn new_with_error(error: DecodeErrorStatus) -> InflateDecodeErrors
    {
        InflateDecodeErrors::new(error, vec![])
    }
}

impl Debug for InflateDecodeErrors
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        writeln!(f, "{:?}", self.error)
    }
}

impl From<DecodeErrorStatus> for InflateDecodeErrors
{
    fn from(error: DecodeErrorStatus) -> Self
    {
        InflateDecodeErrors::new_with_error(error)
    }
}

pub enum DecodeErrorStatus
{
    /// Input data is not enough to construct
    /// a full output
    InsufficientData,
    /// Anything that isn't significant
    Generic(&'static str),
    GenericStr(String),
    ///Input data was malformed.
    CorruptData,
    /// Limit set by the user was exceeded by
    /// decompressed output
    OutputLimitExceeded(usize, usize),
    /// Output CRC does not match stored CRC.
    ///
    /// Only present for gzip
    MismatchedCRC(u32, u32),
    /// Output Adler does not match stored adler
    ///
    /// Only present for zlib
    MismatchedAdler(u32, u32),
    /// The ISIZE field of a gzip trailer does not match the number of
    /// bytes produced
    MismatchedLength(u64, u64),
    /// The stream needs a preset dictionary with this Adler-32 checksum
    /// before it can continue
    NeedsDictionary(u32),
    /// A step call was made on a stream that already reported a data
    /// error
    StickyError,
}

impl Debug for DecodeErrorStatus
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        match self
        {
            Self::InsufficientData => writeln!(f, "Insufficient data"),
            Self::Generic(reason) => writeln!(f, "{reason}"),
            Self::GenericStr(reason) => writeln!(f, "{reason}"),
            Self::CorruptData => writeln!(f, "Corrupt data"),
            Self::OutputLimitExceeded(limit, current) => writeln!(
                f,
                "Output limit exceeded, set limit was {limit} and output size is {current}"
            ),
            Self::MismatchedCRC(expected, found) =>
            {
                writeln!(f, "incorrect data check, expected {expected}, found {found}")
            }
            Self::MismatchedAdler(expected, found) =>
            {
                writeln!(f, "incorrect data check, expected {expected}, found {found}")
            }
            Self::MismatchedLength(expected, found) =>
            {
                writeln!(
                    f,
                    "incorrect length check, expected {expected}, found {found}"
                )
            }
            Self::NeedsDictionary(adler) =>
            {
                writeln!(f, "stream needs a preset dictionary, adler {adler:#010x}")
            }
            Self::StickyError => writeln!(f, "stream already errored, reset it first"),
        }
    }
}

/// Errors possible when setting up or driving the compressor.
#[derive(Eq, PartialEq, Copy, Clone)]
pub enum EncodeErrors
{
    /// A parameter given at initialization is outside its valid range
    InvalidParameters(&'static str),
    /// The stream was driven again after it finished
    StreamFinished,
    /// An operation is not valid in the stream's current state
    WrongState(&'static str),
}

impl Debug for EncodeErrors
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        match self
        {
            Self::InvalidParameters(which) => writeln!(f, "invalid parameter: {which}"),
            Self::StreamFinished => writeln!(f, "stream already finished"),
            Self::WrongState(what) => writeln!(f, "{what}"),
        }
    }
}

impl Display for EncodeErrors
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        Debug::fmt(self, f)
    }
}
