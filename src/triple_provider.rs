use crate::{
    channel::Channel,
    error::Result,
    ot::{
        alsz::{OTExtReceiver, OTExtSender},
        utils::block::Block,
    },
    types::Id,
};
use bit::BitIndex;
use itertools::izip;
use log::{debug, info};
use rand::Rng;
use std::time::Instant;

/// Triples generated per OT extension run, bounds the size of a single frame.
pub const TRIPLE_BATCH_SIZE: usize = 1024;

/// Beaver triple `(a, b, c)` with `c = a * b` (arithmetic) or `c = a & b` (binary).
pub type Triple = (u64, u64, u64);

/// Source of Beaver triples.
///
/// Both parties must call [`preprocess`] with the same counts at the same point of
/// the protocol, since generating triples is itself interactive.
///
/// [`preprocess`]: TripleProvider::preprocess
pub trait TripleProvider {
    /// Make sure at least `n_mul` multiplication and `n_and` AND triples are available.
    fn preprocess<C: Channel>(&mut self, ch: &mut C, n_mul: usize, n_and: usize) -> Result<()>;
    fn mul_triple(&mut self) -> Option<Triple>;
    fn and_triple(&mut self) -> Option<Triple>;
}

/// [`TripleProvider`] generating triples with OT extension.
#[derive(Debug)]
pub struct OtTripleProvider {
    id: Id,
    sender: OTExtSender,
    receiver: OTExtReceiver,
    mul_triple_pool: Vec<Triple>,
    and_triple_pool: Vec<Triple>,
    batch_size: usize,
}

impl OtTripleProvider {
    /// Run the base OTs for both directions.
    pub fn new<C: Channel>(id: Id, ch: &mut C) -> Result<OtTripleProvider> {
        let start = Instant::now();
        let (sender, receiver) = if id == Id::Party0 {
            let sender = OTExtSender::new(ch)?;
            let receiver = OTExtReceiver::new(ch)?;
            (sender, receiver)
        } else {
            let receiver = OTExtReceiver::new(ch)?;
            let sender = OTExtSender::new(ch)?;
            (sender, receiver)
        };
        info!("base ot setup done, took {}ms", start.elapsed().as_millis());
        Ok(OtTripleProvider {
            id,
            sender,
            receiver,
            mul_triple_pool: Vec::new(),
            and_triple_pool: Vec::new(),
            batch_size: TRIPLE_BATCH_SIZE,
        })
    }

    /// Generate at most `batch_size` triples per OT extension run.
    /// Both parties must use the same value.
    pub fn with_batch_size(mut self, batch_size: usize) -> OtTripleProvider {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Number of unused (multiplication, AND) triples.
    pub fn available(&self) -> (usize, usize) {
        (self.mul_triple_pool.len(), self.and_triple_pool.len())
    }

    // https://link.springer.com/content/pdf/10.1007/3-540-48405-1_8.pdf
    /// Shares of `a * b` where `sender` holds `a_shares` and the other party `b_shares`.
    fn ot_mul<C: Channel>(
        &mut self,
        ch: &mut C,
        a_shares: &[u64],
        b_shares: &[u64],
        sender: Id,
    ) -> Result<Vec<u64>> {
        let mut rng = rand::thread_rng();
        if self.id == sender {
            let mut c0s = Vec::with_capacity(a_shares.len());
            let mut inputs = Vec::with_capacity(64 * a_shares.len());
            for a in a_shares {
                let mut c0 = 0u64;
                for i in 0..64 {
                    let s: u64 = rng.gen();
                    c0 = c0.wrapping_sub(s);
                    inputs.push((Block::from(s), Block::from(s.wrapping_add(a << i))));
                }
                c0s.push(c0);
            }
            self.sender.send(ch, &inputs)?;
            Ok(c0s)
        } else {
            let choices = b_shares
                .iter()
                .flat_map(|b| (0..64).map(move |i| b.bit(i)))
                .collect::<Vec<bool>>();
            let res = self.receiver.receive(ch, &choices)?;
            Ok(res
                .chunks_exact(64)
                .map(|es| es.iter().fold(0u64, |c1, e| c1.wrapping_add(*e as u64)))
                .collect())
        }
    }

    // https://encrypto.de/papers/DSZ15.pdf
    fn gen_mul_triples<C: Channel>(&mut self, ch: &mut C, n: usize) -> Result<Vec<Triple>> {
        let mut rng = rand::thread_rng();
        let a_shares = (0..n).map(|_| rng.gen()).collect::<Vec<u64>>();
        let b_shares = (0..n).map(|_| rng.gen()).collect::<Vec<u64>>();
        let u_shares = self.ot_mul(ch, &a_shares, &b_shares, Id::Party0)?;
        let v_shares = self.ot_mul(ch, &a_shares, &b_shares, Id::Party1)?;
        Ok(izip!(a_shares, b_shares, u_shares, v_shares)
            .map(|(a, b, u, v)| (a, b, a.wrapping_mul(b).wrapping_add(u).wrapping_add(v)))
            .collect())
    }

    /// Random OT of `n` 64-bit words. The sender gets `(b, v)`, the receiver `(a, u)`
    /// with `u = v ^ (a & b)`.
    fn ot_rand_and<C: Channel>(&mut self, ch: &mut C, sender: Id, n: usize) -> Result<Vec<(u64, u64)>> {
        let mut rng = rand::thread_rng();
        if self.id == sender {
            let mut bvs = Vec::with_capacity(n);
            let mut inputs = Vec::with_capacity(64 * n);
            for _ in 0..n {
                let mut b = 0u64;
                let mut v = 0u64;
                for i in 0..64 {
                    let x0: bool = rng.gen();
                    let x1: bool = rng.gen();
                    b.set_bit(i, x0 ^ x1);
                    v.set_bit(i, x0);
                    inputs.push((Block::from(x0), Block::from(x1)));
                }
                bvs.push((b, v));
            }
            self.sender.send(ch, &inputs)?;
            Ok(bvs)
        } else {
            let as_ = (0..n).map(|_| rng.gen()).collect::<Vec<u64>>();
            let choices = as_
                .iter()
                .flat_map(|a| (0..64).map(move |i| a.bit(i)))
                .collect::<Vec<bool>>();
            let xs = self.receiver.receive(ch, &choices)?;
            Ok(as_
                .into_iter()
                .zip(xs.chunks_exact(64))
                .map(|(a, xa)| {
                    let mut u = 0u64;
                    for (i, x) in xa.iter().enumerate() {
                        u.set_bit(i, *x != 0);
                    }
                    (a, u)
                })
                .collect())
        }
    }

    fn gen_and_triples<C: Channel>(&mut self, ch: &mut C, n: usize) -> Result<Vec<Triple>> {
        let first = self.ot_rand_and(ch, Id::Party1, n)?;
        let second = self.ot_rand_and(ch, Id::Party0, n)?;
        // a comes from the receiver role, b from the sender role
        let (aus, bvs) = if self.id == Id::Party0 {
            (first, second)
        } else {
            (second, first)
        };
        Ok(aus
            .into_iter()
            .zip(bvs)
            .map(|((a, u), (b, v))| (a, b, (a & b) ^ u ^ v))
            .collect())
    }
}

impl TripleProvider for OtTripleProvider {
    fn preprocess<C: Channel>(&mut self, ch: &mut C, n_mul: usize, n_and: usize) -> Result<()> {
        let n_mul = n_mul.saturating_sub(self.mul_triple_pool.len());
        let n_and = n_and.saturating_sub(self.and_triple_pool.len());
        if n_mul == 0 && n_and == 0 {
            return Ok(());
        }
        let start = Instant::now();

        debug!("generating {n_mul} mul-triples");
        for n in batches(n_mul, self.batch_size) {
            let triples = self.gen_mul_triples(ch, n)?;
            self.mul_triple_pool.extend(triples);
        }

        debug!("generating {n_and} and-triples");
        for n in batches(n_and, self.batch_size) {
            let triples = self.gen_and_triples(ch, n)?;
            self.and_triple_pool.extend(triples);
        }

        info!("preprocessing done, took {}ms", start.elapsed().as_millis());
        Ok(())
    }

    fn mul_triple(&mut self) -> Option<Triple> {
        self.mul_triple_pool.pop()
    }

    fn and_triple(&mut self) -> Option<Triple> {
        self.and_triple_pool.pop()
    }
}

/// Sizes of the batches `total` is split into.
fn batches(total: usize, batch_size: usize) -> impl Iterator<Item = usize> {
    (0..total)
        .step_by(batch_size)
        .map(move |i| batch_size.min(total - i))
}

/// All-zero triples, correct but without any privacy.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ZeroTripleProvider;

#[cfg(test)]
impl TripleProvider for ZeroTripleProvider {
    fn preprocess<C: Channel>(&mut self, _: &mut C, _: usize, _: usize) -> Result<()> {
        Ok(())
    }

    fn mul_triple(&mut self) -> Option<Triple> {
        Some(Triple::default())
    }

    fn and_triple(&mut self) -> Option<Triple> {
        Some(Triple::default())
    }
}
