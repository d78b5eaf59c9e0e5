/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Adler-32, the checksum the zlib wrapper carries.
//!
//! The checksum is two running 16 bit sums modulo 65521, the largest
//! prime below 2^16, packed as `(s2 << 16) | s1`. Updates are chunkable,
//! the running value of one call seeds the next.

/// Largest prime smaller than 65536.
const BASE: u32 = 65521;

/// Largest n such that 255*n*(n+1)/2 + (n+1)*(BASE-1) fits in 32 bits,
/// so the two sums only need one reduction per block.
const NMAX: usize = 5552;

/// The initial value for a running Adler-32, the checksum of the empty
/// sequence.
pub const ADLER_INIT: u32 = 1;

/// Update the running Adler-32 checksum `adler` with the bytes in `data`.
///
/// `adler32(adler32(ADLER_INIT, a), b)` equals
/// `adler32(ADLER_INIT, a ++ b)`, so input may be fed in any chunking.
pub fn adler32(adler: u32, data: &[u8]) -> u32
{
    let mut s1 = adler & 0xFFFF;
    let mut s2 = adler >> 16;

    for chunk in data.chunks(NMAX)
    {
        for byte in chunk
        {
            s1 += u32::from(*byte);
            s2 += s1;
        }
        s1 %= BASE;
        s2 %= BASE;
    }

    (s2 << 16) | s1
}

/// Compute the Adler-32 of a concatenation `A ++ B` given the checksums
/// of the two halves and the length of the second one.
///
/// Follows from the sum definitions: `s1(AB) = s1(A) + s1(B) - 1` and
/// `s2(AB) = s2(A) + len2 * s1(A) + s2(B) - len2`, everything modulo
/// [`BASE`].
pub fn adler32_combine(adler1: u32, adler2: u32, len2: u64) -> u32
{
    let rem = (len2 % u64::from(BASE)) as u32;

    let mut sum1 = adler1 & 0xFFFF;
    let mut sum2 = (rem * sum1) % BASE;

    sum1 += (adler2 & 0xFFFF) + BASE - 1;
    sum2 += (adler1 >> 16) + (adler2 >> 16) + BASE - rem;

    if sum1 >= BASE
    {
        sum1 -= BASE;
    }
    if sum1 >= BASE
    {
        sum1 -= BASE;
    }
    if sum2 >= BASE << 1
    {
        sum2 -= BASE << 1;
    }
    if sum2 >= BASE
    {
        sum2 -= BASE;
    }

    (sum2 << 16) | sum1
}

#[cfg(test)]
mod tests
{
    use nanorand::Rng;

    use super::*;

    #[test]
    fn known_values()
    {
        assert_eq!(adler32(ADLER_INIT, b""), 1);
        assert_eq!(adler32(ADLER_INIT, b"a"), 0x0062_0062);
        assert_eq!(adler32(ADLER_INIT, b"abc"), 0x024d_0127);
        assert_eq!(adler32(ADLER_INIT, b"Wikipedia"), 0x11E6_0398);
    }

    #[test]
    fn chunking_is_invariant()
    {
        let mut rng = nanorand::WyRand::new_seed(37);
        let data: Vec<u8> = (0..70000).map(|_| rng.generate::<u8>()).collect();

        let whole = adler32(ADLER_INIT, &data);

        for chunk_size in [1, 7, 1024, NMAX, NMAX + 1]
        {
            let mut running = ADLER_INIT;

            for chunk in data.chunks(chunk_size)
            {
                running = adler32(running, chunk);
            }
            assert_eq!(running, whole, "chunk size {chunk_size}");
        }
    }

    #[test]
    fn combine_law()
    {
        let mut rng = nanorand::WyRand::new_seed(99);
        let a: Vec<u8> = (0..10000).map(|_| rng.generate::<u8>()).collect();
        let b: Vec<u8> = (0..60000).map(|_| rng.generate::<u8>()).collect();

        let whole = adler32(adler32(ADLER_INIT, &a), &b);
        let combined = adler32_combine(
            adler32(ADLER_INIT, &a),
            adler32(ADLER_INIT, &b),
            b.len() as u64,
        );

        assert_eq!(whole, combined);
    }

    #[test]
    fn combine_empty_right()
    {
        let a = adler32(ADLER_INIT, b"hello");

        assert_eq!(adler32_combine(a, ADLER_INIT, 0), a);
    }
}
