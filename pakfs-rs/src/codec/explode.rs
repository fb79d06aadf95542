//! PKWARE Data Compression Library "explode" decompression.
//!
//! Decodes the implode format produced by the 1980s-era PKWARE DCL: a
//! one-byte literal-mode flag, a one-byte dictionary-size exponent, then a
//! bit stream of Huffman-coded literals and length/distance pairs over a
//! sliding window of up to 4 KiB. Bits are consumed least-significant first
//! and Huffman code bits are stored inverted.

use std::fmt;

/// Longest Huffman code length used by the format.
const MAXBITS: usize = 13;

/// Maximum dictionary (sliding window) size.
const MAXWIN: usize = 4096;

/// Length code that marks the end of the compressed stream.
const END_OF_STREAM: usize = 519;

/// Base values for the 16 length codes.
const LENGTH_BASE: [u16; 16] = [3, 2, 4, 5, 6, 7, 8, 9, 10, 12, 16, 24, 40, 72, 136, 264];

/// Extra bits carried by each length code.
const LENGTH_EXTRA: [u32; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8];

/// Compact code-length tables, run-length encoded as (count - 1) in the high
/// nibble and the bit length in the low nibble.
const LITERAL_LENGTHS: [u8; 98] = [
    11, 124, 8, 7, 28, 7, 188, 13, 76, 4, 10, 8, 12, 10, 12, 10, 8, 23, 8, 9, 7, 6, 7, 8, 7, 6,
    55, 8, 23, 24, 12, 11, 7, 9, 11, 12, 6, 7, 22, 5, 7, 24, 6, 11, 9, 6, 7, 22, 7, 11, 38, 7, 9,
    8, 25, 11, 8, 11, 9, 12, 8, 12, 5, 38, 5, 38, 5, 11, 7, 5, 6, 21, 6, 10, 53, 8, 7, 24, 10,
    27, 44, 253, 253, 253, 252, 252, 252, 13, 12, 45, 12, 45, 12, 61, 12, 45, 44, 173,
];
const LENGTH_LENGTHS: [u8; 6] = [2, 35, 36, 53, 38, 23];
const DISTANCE_LENGTHS: [u8; 7] = [2, 20, 53, 230, 247, 151, 248];

/// Supplies compressed bytes to the decoder.
///
/// Each call returns the next chunk of input; an empty slice signals that the
/// input is exhausted.
pub trait InputSource {
    fn pull(&mut self) -> &[u8];
}

/// Receives decompressed bytes from the decoder.
///
/// Returns `false` to refuse a write, which aborts decompression with
/// [`ExplodeError::OutputOverflow`]. A sink backed by a pre-sized buffer
/// refuses any write that would grow past its capacity.
pub trait OutputSink {
    fn push(&mut self, data: &[u8]) -> bool;
}

/// An [`InputSource`] over a single byte slice, handed out in one chunk.
pub struct SliceSource<'a> {
    data: &'a [u8],
    consumed: bool,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            consumed: false,
        }
    }
}

impl InputSource for SliceSource<'_> {
    fn pull(&mut self) -> &[u8] {
        if self.consumed {
            &[]
        } else {
            self.consumed = true;
            self.data
        }
    }
}

/// An [`OutputSink`] with a hard byte capacity.
pub struct BoundedSink {
    buffer: Vec<u8>,
    capacity: usize,
}

impl BoundedSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}

impl OutputSink for BoundedSink {
    fn push(&mut self, data: &[u8]) -> bool {
        if self.buffer.len() + data.len() > self.capacity {
            return false;
        }
        self.buffer.extend_from_slice(data);
        true
    }
}

/// Distinct failure conditions reported by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplodeError {
    /// The compressed stream ended before the end-of-stream code.
    OutOfInput,
    /// The output sink refused a write.
    OutputOverflow,
    /// The literal-mode flag byte was neither 0 nor 1.
    InvalidLiteralFlag,
    /// The dictionary-size byte was outside 4..=6.
    InvalidDictSize,
    /// A match distance reached back past the start of the output.
    DistanceTooFar,
    /// The bit stream formed no valid Huffman code.
    InvalidCode,
}

impl fmt::Display for ExplodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExplodeError::OutOfInput => write!(f, "compressed stream ended prematurely"),
            ExplodeError::OutputOverflow => write!(f, "output exceeded the expected size"),
            ExplodeError::InvalidLiteralFlag => write!(f, "invalid literal-mode flag"),
            ExplodeError::InvalidDictSize => write!(f, "invalid dictionary size"),
            ExplodeError::DistanceTooFar => write!(f, "distance reaches before output start"),
            ExplodeError::InvalidCode => write!(f, "invalid Huffman code"),
        }
    }
}

impl std::error::Error for ExplodeError {}

/// A canonical Huffman table: code counts per bit length plus the symbols
/// sorted by code.
struct Huffman {
    count: [u16; MAXBITS + 1],
    symbol: Vec<u16>,
}

impl Huffman {
    /// Expands a compact run-length representation into a decode table.
    fn construct(rep: &[u8]) -> Self {
        let mut lengths = Vec::new();
        for &packed in rep {
            let repeat = (packed >> 4) + 1;
            let len = (packed & 15) as usize;
            for _ in 0..repeat {
                lengths.push(len);
            }
        }

        let mut count = [0u16; MAXBITS + 1];
        for &len in &lengths {
            count[len] += 1;
        }

        let mut offs = [0u16; MAXBITS + 1];
        for len in 1..MAXBITS {
            offs[len + 1] = offs[len] + count[len];
        }

        let mut symbol = vec![0u16; lengths.len()];
        for (sym, &len) in lengths.iter().enumerate() {
            symbol[offs[len] as usize] = sym as u16;
            offs[len] += 1;
        }

        Huffman { count, symbol }
    }
}

struct Decoder<'a> {
    source: &'a mut dyn InputSource,
    sink: &'a mut dyn OutputSink,
    /// Current input chunk and the read position within it.
    chunk: Vec<u8>,
    chunk_pos: usize,
    /// Bit buffer, filled least-significant first.
    bitbuf: u32,
    bitcnt: u32,
    /// Sliding output window and the write position within it.
    window: [u8; MAXWIN],
    next: usize,
    /// True until the window has been flushed once; distances are then
    /// bounded by the bytes written so far.
    first: bool,
}

impl<'a> Decoder<'a> {
    fn new(source: &'a mut dyn InputSource, sink: &'a mut dyn OutputSink) -> Self {
        Decoder {
            source,
            sink,
            chunk: Vec::new(),
            chunk_pos: 0,
            bitbuf: 0,
            bitcnt: 0,
            window: [0u8; MAXWIN],
            next: 0,
            first: true,
        }
    }

    fn next_byte(&mut self) -> Result<u8, ExplodeError> {
        if self.chunk_pos == self.chunk.len() {
            let fresh = self.source.pull();
            if fresh.is_empty() {
                return Err(ExplodeError::OutOfInput);
            }
            self.chunk.clear();
            self.chunk.extend_from_slice(fresh);
            self.chunk_pos = 0;
        }
        let byte = self.chunk[self.chunk_pos];
        self.chunk_pos += 1;
        Ok(byte)
    }

    /// Returns `need` bits, least-significant bit of the stream first.
    fn bits(&mut self, need: u32) -> Result<u32, ExplodeError> {
        let mut val = self.bitbuf;
        while self.bitcnt < need {
            val |= u32::from(self.next_byte()?) << self.bitcnt;
            self.bitcnt += 8;
        }
        self.bitbuf = val >> need;
        self.bitcnt -= need;
        Ok(val & ((1 << need) - 1))
    }

    /// Decodes one symbol. Code bits are stored inverted in the stream.
    fn decode(&mut self, table: &Huffman) -> Result<u16, ExplodeError> {
        let mut code: i32 = 0;
        let mut first: i32 = 0;
        let mut index: i32 = 0;
        for len in 1..=MAXBITS {
            code |= (self.bits(1)? as i32) ^ 1;
            let count = i32::from(table.count[len]);
            if code - count < first {
                return Ok(table.symbol[(index + (code - first)) as usize]);
            }
            index += count;
            first = (first + count) << 1;
            code <<= 1;
        }
        Err(ExplodeError::InvalidCode)
    }

    fn flush(&mut self) -> Result<(), ExplodeError> {
        if !self.sink.push(&self.window[..self.next]) {
            return Err(ExplodeError::OutputOverflow);
        }
        self.next = 0;
        self.first = false;
        Ok(())
    }

    fn run(&mut self) -> Result<(), ExplodeError> {
        let literal = Huffman::construct(&LITERAL_LENGTHS);
        let length = Huffman::construct(&LENGTH_LENGTHS);
        let distance = Huffman::construct(&DISTANCE_LENGTHS);

        let coded_literals = match self.bits(8)? {
            0 => false,
            1 => true,
            _ => return Err(ExplodeError::InvalidLiteralFlag),
        };
        let dict = self.bits(8)?;
        if !(4..=6).contains(&dict) {
            return Err(ExplodeError::InvalidDictSize);
        }

        loop {
            if self.bits(1)? == 1 {
                let symbol = self.decode(&length)? as usize;
                let mut len =
                    LENGTH_BASE[symbol] as usize + self.bits(LENGTH_EXTRA[symbol])? as usize;
                if len == END_OF_STREAM {
                    break;
                }

                // Length-2 matches carry only two distance extra bits.
                let extra = if len == 2 { 2 } else { dict };
                let mut dist = (self.decode(&distance)? as usize) << extra;
                dist += self.bits(extra)? as usize;
                dist += 1;
                if self.first && dist > self.next {
                    return Err(ExplodeError::DistanceTooFar);
                }

                while len != 0 {
                    let (mut from, available) = if self.next < dist {
                        (MAXWIN - (dist - self.next), dist - self.next)
                    } else {
                        (self.next - dist, MAXWIN - self.next)
                    };
                    let copy = available.min(len);
                    len -= copy;
                    // Byte-wise so overlapping matches replicate runs.
                    for _ in 0..copy {
                        self.window[self.next] = self.window[from];
                        self.next += 1;
                        from += 1;
                    }
                    if self.next == MAXWIN {
                        self.flush()?;
                    }
                }
            } else {
                let byte = if coded_literals {
                    self.decode(&literal)? as u8
                } else {
                    self.bits(8)? as u8
                };
                self.window[self.next] = byte;
                self.next += 1;
                if self.next == MAXWIN {
                    self.flush()?;
                }
            }
        }

        if self.next > 0 {
            self.flush()?;
        }
        Ok(())
    }
}

/// Decompresses an implode stream from `source` into `sink`.
pub fn explode_stream(
    source: &mut dyn InputSource,
    sink: &mut dyn OutputSink,
) -> Result<(), ExplodeError> {
    Decoder::new(source, sink).run()
}

/// Decompresses an in-memory implode stream, refusing output beyond
/// `expected_len` bytes.
pub fn explode(data: &[u8], expected_len: usize) -> Result<Vec<u8>, ExplodeError> {
    let mut source = SliceSource::new(data);
    let mut sink = BoundedSink::new(expected_len);
    explode_stream(&mut source, &mut sink)?;
    Ok(sink.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The canonical example stream from the format's reference decoder.
    const AIAIAIAIAIAIA: [u8; 8] = [0x00, 0x04, 0x82, 0x24, 0x25, 0x8f, 0x80, 0x7f];

    #[test]
    fn explodes_reference_stream() {
        let out = explode(&AIAIAIAIAIAIA, 13).unwrap();
        assert_eq!(out, b"AIAIAIAIAIAIA");
    }

    #[test]
    fn rejects_invalid_literal_flag() {
        let data = [0x02, 0x04, 0x00];
        assert_eq!(explode(&data, 16), Err(ExplodeError::InvalidLiteralFlag));
    }

    #[test]
    fn rejects_invalid_dictionary_size() {
        let data = [0x00, 0x07, 0x00];
        assert_eq!(explode(&data, 16), Err(ExplodeError::InvalidDictSize));
    }

    #[test]
    fn rejects_premature_end_of_input() {
        let truncated = &AIAIAIAIAIAIA[..5];
        assert_eq!(explode(truncated, 13), Err(ExplodeError::OutOfInput));
    }

    #[test]
    fn refuses_output_past_expected_size() {
        assert_eq!(
            explode(&AIAIAIAIAIAIA, 4),
            Err(ExplodeError::OutputOverflow)
        );
    }

    #[test]
    fn rejects_distance_before_output_start() {
        // lit = 0, dict = 4, then a pair whose distance reaches back past the
        // single literal written so far. Bits after the header, LSB first:
        // 0 (literal flag), 10000010 (literal 'A'), 1 (pair flag),
        // 11 (length symbol 0, len 3), 11 (distance symbol 0),
        // 1111 (4 extra bits) -> dist = 16 with one byte written.
        let data = [0x00, 0x04, 0x82, 0xFE, 0x03];
        assert_eq!(explode(&data, 16), Err(ExplodeError::DistanceTooFar));
    }
}
