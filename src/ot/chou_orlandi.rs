//! Chou-Orlandi base oblivious transfer (cf. <https://eprint.iacr.org/2015/267>)
//! over the Ristretto group. The OT index is hashed into every key so that the
//! random OTs of one batch are independent.

use super::utils::block::{hash_pt, Block};
use crate::{
    channel::Channel,
    error::{Error, Result},
};
use curve25519_dalek::{
    constants::RISTRETTO_BASEPOINT_TABLE,
    ristretto::{RistrettoBasepointTable, RistrettoPoint},
    scalar::Scalar,
};
use log::debug;
use std::fmt;

/// Oblivious transfer sender.
#[derive(Debug)]
pub struct OTSender {
    y: Scalar,
    s: RistrettoPoint,
    counter: u128,
}

impl OTSender {
    pub fn new<C: Channel>(ch: &mut C) -> Result<Self> {
        let mut rng = rand::thread_rng();
        let y = Scalar::random(&mut rng);
        let s = &y * RISTRETTO_BASEPOINT_TABLE;
        ch.send_point(&s)?;
        Ok(Self { y, s, counter: 0 })
    }

    /// Send `inputs` to [`OTReceiver`] using oblivious transfer.
    pub fn send<C: Channel>(&mut self, ch: &mut C, inputs: &[(Block, Block)]) -> Result<()> {
        debug!("base ot: sending {} pairs", inputs.len());
        let rs = ch.recv_points()?;
        if rs.len() != inputs.len() {
            return Err(Error::UnexpectedMessage);
        }
        let ys = self.y * self.s;
        let mut cs = Vec::with_capacity(2 * inputs.len());
        for (i, (r, input)) in rs.iter().zip(inputs).enumerate() {
            let yr = self.y * r;
            let k0 = hash_pt(self.counter + i as u128, &yr);
            let k1 = hash_pt(self.counter + i as u128, &(yr - ys));
            cs.push(k0 ^ input.0);
            cs.push(k1 ^ input.1);
        }
        self.counter += inputs.len() as u128;
        ch.send_blocks(&cs)
    }
}

/// Oblivious transfer receiver.
pub struct OTReceiver {
    s: RistrettoBasepointTable,
    counter: u128,
}

impl OTReceiver {
    pub fn new<C: Channel>(ch: &mut C) -> Result<Self> {
        let s = ch.recv_point()?;
        Ok(Self {
            s: RistrettoBasepointTable::create(&s),
            counter: 0,
        })
    }

    /// Receive from [`OTSender`] with the given `choices` as choice bits.
    pub fn receive<C: Channel>(&mut self, ch: &mut C, choices: &[bool]) -> Result<Vec<Block>> {
        let mut rng = rand::thread_rng();
        let one = &Scalar::ONE * &self.s;
        let mut rs = Vec::with_capacity(choices.len());
        let mut ks = Vec::with_capacity(choices.len());
        for (i, b) in choices.iter().enumerate() {
            let x = Scalar::random(&mut rng);
            let r = &x * RISTRETTO_BASEPOINT_TABLE;
            rs.push(if *b { one + r } else { r });
            ks.push(hash_pt(self.counter + i as u128, &(&x * &self.s)));
        }
        self.counter += choices.len() as u128;
        ch.send_points(&rs)?;

        let cs = ch.recv_blocks()?;
        if cs.len() != 2 * choices.len() {
            return Err(Error::UnexpectedMessage);
        }
        Ok(choices
            .iter()
            .zip(ks)
            .zip(cs.chunks_exact(2))
            .map(|((b, k), c)| k ^ if *b { c[1] } else { c[0] })
            .collect())
    }
}

impl fmt::Debug for OTReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OTReceiver")
            .field("counter", &self.counter)
            .finish()
    }
}
