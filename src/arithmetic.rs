use crate::{
    channel::Channel,
    error::{Error, Result},
    triple_provider::{Triple, TripleProvider},
    types::{shares_to_x, x_to_shares, Id, Share},
};
use itertools::izip;
use log::debug;

/// Number of AND triples needed per element for a A2B conversion.
pub const A2B_AND_TRIPLES: usize = 13;
/// Number of AND triples needed per element for a comparison.
pub const CMP_AND_TRIPLES: usize = A2B_AND_TRIPLES;
/// Number of multiplication triples needed per element for a comparison followed by a selection.
pub const CMP_MUL_TRIPLES: usize = 2;

/// [`SecureArithmetic`] evaluates operations on vectors of secret shares.
///
/// Arithmetic shares live in `Z_2^64`, binary shares are XOR shares of 64-bit words.
/// Every interactive operation works on whole vectors so that its round count does
/// not depend on the input length.
#[derive(Debug)]
pub struct SecureArithmetic<C: Channel, T: TripleProvider> {
    id: Id,
    ch: C,
    triple_provider: T,
}

impl<C: Channel, T: TripleProvider> SecureArithmetic<C, T> {
    pub fn new(id: Id, ch: C, triple_provider: T) -> SecureArithmetic<C, T> {
        SecureArithmetic {
            id,
            ch,
            triple_provider,
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn channel(&mut self) -> &mut C {
        &mut self.ch
    }

    /// Make sure the [`TripleProvider`] can serve `n_mul` multiplication and `n_and` AND triples.
    pub fn preprocess(&mut self, n_mul: usize, n_and: usize) -> Result<()> {
        self.triple_provider.preprocess(&mut self.ch, n_mul, n_and)
    }

    /// Secret share the local `input` and receive the shares of the peer's input.
    ///
    /// Returns the shares of both inputs indexed by party id.
    pub fn share_input(&mut self, input: &[u64]) -> Result<[Vec<u64>; 2]> {
        let (own, peer): (Vec<u64>, Vec<u64>) = input
            .iter()
            .map(|x| {
                let (share0, share1) = x_to_shares(Share::Arithmetic(*x));
                (u64::from(share0), u64::from(share1))
            })
            .unzip();
        self.ch.send_shares(&peer)?;
        let received = self.ch.recv_shares()?;
        if received.len() != input.len() {
            return Err(Error::ShapeMismatch {
                local: input.len(),
                remote: received.len(),
            });
        }
        debug!("{} shared {} values", self.id, input.len());
        Ok(match self.id {
            Id::Party0 => [own, received],
            Id::Party1 => [received, own],
        })
    }

    fn exchange(&mut self, shares: &[u64]) -> Result<Vec<u64>> {
        self.ch.send_shares(shares)?;
        let others = self.ch.recv_shares()?;
        if others.len() != shares.len() {
            return Err(Error::UnexpectedMessage);
        }
        Ok(others)
    }

    /// Reveal arithmetic shares to both parties.
    pub fn reveal(&mut self, shares: &[u64]) -> Result<Vec<u64>> {
        let others = self.exchange(shares)?;
        shares
            .iter()
            .zip(others)
            .map(|(x, y)| shares_to_x((Share::Arithmetic(*x), Share::Arithmetic(y))))
            .collect()
    }

    /// Reveal binary shares to both parties.
    pub fn reveal_binary(&mut self, shares: &[u64]) -> Result<Vec<u64>> {
        let others = self.exchange(shares)?;
        shares
            .iter()
            .zip(others)
            .map(|(x, y)| shares_to_x((Share::Binary(*x), Share::Binary(y))))
            .collect()
    }

    pub fn add(&self, x: &[u64], y: &[u64]) -> Vec<u64> {
        x.iter().zip(y).map(|(x, y)| x.wrapping_add(*y)).collect()
    }

    pub fn sub(&self, x: &[u64], y: &[u64]) -> Vec<u64> {
        x.iter().zip(y).map(|(x, y)| x.wrapping_sub(*y)).collect()
    }

    /// Add a public constant, only party 0 changes its share.
    pub fn add_public(&self, x: &[u64], c: u64) -> Vec<u64> {
        match self.id {
            Id::Party0 => x.iter().map(|x| x.wrapping_add(c)).collect(),
            Id::Party1 => x.to_vec(),
        }
    }

    fn triples(&mut self, n: usize, binary: bool) -> Result<Vec<Triple>> {
        (0..n)
            .map(|_| {
                let triple = if binary {
                    self.triple_provider.and_triple()
                } else {
                    self.triple_provider.mul_triple()
                };
                triple.ok_or(Error::BeaverTriple)
            })
            .collect()
    }

    /// Element-wise product of arithmetic shares using Beaver triples.
    pub fn vmul(&mut self, x: &[u64], y: &[u64]) -> Result<Vec<u64>> {
        debug!("vmul n = {}", x.len());
        let triples = self.triples(x.len(), false)?;
        let mut des = Vec::with_capacity(2 * x.len());
        for (x, y, (a, b, _)) in izip!(x, y, &triples) {
            des.push(x.wrapping_sub(*a));
            des.push(y.wrapping_sub(*b));
        }
        let des = self.reveal(&des)?;

        Ok(izip!(x, y, des.chunks_exact(2), triples)
            .map(|(x, y, de, (_, _, c))| {
                let (d, e) = (de[0], de[1]);
                let z = c
                    .wrapping_add(d.wrapping_mul(*y))
                    .wrapping_add(e.wrapping_mul(*x));
                if self.id == Id::Party0 {
                    z.wrapping_sub(d.wrapping_mul(e))
                } else {
                    z
                }
            })
            .collect())
    }

    /// Element-wise AND of binary shares using Beaver triples.
    pub fn vand(&mut self, x: &[u64], y: &[u64]) -> Result<Vec<u64>> {
        debug!("vand n = {}", x.len());
        let triples = self.triples(x.len(), true)?;
        let mut des = Vec::with_capacity(2 * x.len());
        for (x, y, (a, b, _)) in izip!(x, y, &triples) {
            des.push(x ^ a);
            des.push(y ^ b);
        }
        let des = self.reveal_binary(&des)?;

        Ok(izip!(x, y, des.chunks_exact(2), triples)
            .map(|(x, y, de, (_, _, c))| {
                let (d, e) = (de[0], de[1]);
                let z = (d & y) ^ (e & x) ^ c;
                if self.id == Id::Party0 {
                    z ^ (e & d)
                } else {
                    z
                }
            })
            .collect())
    }

    /// Kogge-Stone adder on binary shares, `p = x ^ y` and `g = x & y`.
    fn kogge_stone(&mut self, p: Vec<u64>, g: Vec<u64>) -> Result<Vec<u64>> {
        let bitlen = 64;
        let d = 6; // log2 64
        let s_ = p.clone();
        let mut p = p;
        let mut g = g;
        let n = p.len();
        for i in 0..d {
            let shift = 1 << i;
            let mask = (1u64 << (bitlen - shift)) - 1;
            let p_shift = p.iter().map(|p| p >> shift).collect::<Vec<u64>>();
            // one round for both products
            let lhs = [p_shift.as_slice(), p_shift.as_slice()].concat();
            let rhs = g
                .iter()
                .chain(p.iter())
                .map(|x| x & mask)
                .collect::<Vec<u64>>();
            let res = self.vand(&lhs, &rhs)?;
            let (r1, r2) = res.split_at(n);
            for (g, r1) in g.iter_mut().zip(r1) {
                *g ^= r1 << shift;
            }
            for (p, r2) in p.iter_mut().zip(r2) {
                *p = r2 << shift;
            }
        }
        Ok(g.into_iter()
            .zip(s_)
            .map(|(g, s)| (g << 1) ^ s)
            .collect())
    }

    /// Convert arithmetic shares to binary shares.
    ///
    /// Each party's arithmetic share is one binary input of a secure adder
    /// (cf. <https://eprint.iacr.org/2018/403.pdf> page 16).
    pub fn a2b(&mut self, x: &[u64]) -> Result<Vec<u64>> {
        debug!("a2b n = {}", x.len());
        let zeros = vec![0u64; x.len()];
        let (a, b) = match self.id {
            Id::Party0 => (x.to_vec(), zeros),
            Id::Party1 => (zeros, x.to_vec()),
        };
        let p = a.iter().zip(&b).map(|(a, b)| a ^ b).collect::<Vec<u64>>();
        let g = self.vand(&a, &b)?;
        self.kogge_stone(p, g)
    }

    /// Binary shares of the sign bit of arithmetic shares.
    pub fn msb(&mut self, x: &[u64]) -> Result<Vec<u64>> {
        Ok(self.a2b(x)?.into_iter().map(|x| x >> 63).collect())
    }

    /// Convert binary shares of single bits to arithmetic shares,
    /// using `b0 ^ b1 = b0 + b1 - 2 * b0 * b1`.
    pub fn b2a_bit(&mut self, bits: &[u64]) -> Result<Vec<u64>> {
        debug!("b2a_bit n = {}", bits.len());
        let zeros = vec![0u64; bits.len()];
        let (x, y) = match self.id {
            Id::Party0 => (bits.to_vec(), zeros),
            Id::Party1 => (zeros, bits.to_vec()),
        };
        let prod = self.vmul(&x, &y)?;
        Ok(bits
            .iter()
            .zip(prod)
            .map(|(b, p)| b.wrapping_sub(p.wrapping_mul(2)))
            .collect())
    }

    /// Arithmetic shares of `x < y` (as 0 or 1) for signed values.
    pub fn lt(&mut self, x: &[u64], y: &[u64]) -> Result<Vec<u64>> {
        let z = self.sub(x, y);
        let bits = self.msb(&z)?;
        self.b2a_bit(&bits)
    }

    /// `bit ? x : y` for arithmetic shares of bits.
    pub fn select(&mut self, bit: &[u64], x: &[u64], y: &[u64]) -> Result<Vec<u64>> {
        let diff = self.sub(x, y);
        let tmp = self.vmul(bit, &diff)?;
        Ok(self.add(&tmp, y))
    }

    pub fn max(&mut self, x: &[u64], y: &[u64]) -> Result<Vec<u64>> {
        debug!("max n = {}", x.len());
        let lt = self.lt(x, y)?;
        self.select(&lt, y, x)
    }

    pub fn min(&mut self, x: &[u64], y: &[u64]) -> Result<Vec<u64>> {
        debug!("min n = {}", x.len());
        let lt = self.lt(x, y)?;
        self.select(&lt, x, y)
    }
}
