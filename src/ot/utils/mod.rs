//! Bit helpers shared by the OT protocols.

pub mod aes_hash;
pub mod aes_rng;
pub mod block;

/// Pack bits LSB first.
#[inline]
pub fn boolvec_to_u8vec(bv: &[bool]) -> Vec<u8> {
    let mut v = vec![0u8; bv.len().div_ceil(8)];
    for (i, b) in bv.iter().enumerate() {
        v[i / 8] |= (*b as u8) << (i % 8);
    }
    v
}

#[inline]
pub fn u8vec_to_boolvec(v: &[u8]) -> Vec<bool> {
    v.iter()
        .flat_map(|byte| (0..8).map(move |i| (byte >> i) & 1 == 1))
        .collect()
}

#[inline]
pub fn xor_inplace(a: &mut [u8], b: &[u8]) {
    for (a, b) in a.iter_mut().zip(b.iter()) {
        *a ^= *b;
    }
}

/// Transpose a `nrows x ncols` bit matrix stored row major, bits LSB first.
pub fn transpose(input: &[u8], nrows: usize, ncols: usize) -> Vec<u8> {
    assert_eq!(nrows % 8, 0);
    assert_eq!(ncols % 8, 0);
    let mut output = vec![0u8; nrows * ncols / 8];
    for r in 0..nrows {
        let row = &input[r * ncols / 8..(r + 1) * ncols / 8];
        for c in 0..ncols {
            let bit = (row[c / 8] >> (c % 8)) & 1;
            output[c * nrows / 8 + r / 8] |= bit << (r % 8);
        }
    }
    output
}
