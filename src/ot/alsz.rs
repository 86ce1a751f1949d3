//! Asharov-Lindell-Schneider-Zohner oblivious transfer extension
//! (cf. <https://eprint.iacr.org/2016/602>, Protocol 4).
//!
//! 128 Chou-Orlandi base OTs, run with swapped roles, seed one [`AesRng`] per
//! column of the extension matrix. Every later batch of OTs only costs one
//! matrix transpose and symmetric crypto.

use super::{
    chou_orlandi::{OTReceiver, OTSender},
    utils::{
        aes_hash::AesHash, aes_rng::AesRng, block::Block, boolvec_to_u8vec, transpose,
        u8vec_to_boolvec, xor_inplace,
    },
};
use crate::{
    channel::Channel,
    error::{Error, Result},
};
use bytes::Bytes;
use log::debug;
use rand::Rng;
use rand_core::{RngCore, SeedableRng};

const NUM_BASE_OT: usize = 128;

/// Round `m` up to a whole number of bytes.
fn padded(m: usize) -> usize {
    m.div_ceil(8) * 8
}

fn row_block(matrix: &[u8], j: usize) -> Block {
    let mut row = [0u8; 16];
    row.copy_from_slice(&matrix[j * 16..(j + 1) * 16]);
    Block::from_le_bytes(row)
}

/// Oblivious transfer extension sender.
#[derive(Debug)]
pub struct OTExtSender {
    s: Vec<bool>,
    s_: Block,
    rngs: Vec<AesRng>,
    hash: AesHash,
}

impl OTExtSender {
    pub fn new<C: Channel>(ch: &mut C) -> Result<Self> {
        let mut s_ = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut s_);
        let mut base_receiver = OTReceiver::new(ch)?;
        let s = u8vec_to_boolvec(&s_);
        let ks = base_receiver.receive(ch, &s)?;
        let rngs = ks
            .into_iter()
            .map(|k| AesRng::from_seed(k.to_le_bytes()))
            .collect();
        Ok(Self {
            s,
            s_: Block::from_le_bytes(s_),
            rngs,
            hash: AesHash::default(),
        })
    }

    fn send_setup<C: Channel>(&mut self, ch: &mut C, m: usize) -> Result<Vec<u8>> {
        let ncols = padded(m);
        let us = ch.recv_bytes()?;
        if us.len() != NUM_BASE_OT * ncols / 8 {
            return Err(Error::UnexpectedMessage);
        }
        let mut qs = vec![0u8; NUM_BASE_OT * ncols / 8];
        for (j, (b, rng)) in self.s.iter().zip(self.rngs.iter_mut()).enumerate() {
            let range = j * ncols / 8..(j + 1) * ncols / 8;
            let q = &mut qs[range.clone()];
            rng.fill_bytes(q);
            if *b {
                xor_inplace(q, &us[range]);
            }
        }
        Ok(transpose(&qs, NUM_BASE_OT, ncols))
    }

    /// Send `inputs` to [`OTExtReceiver`] using oblivious transfer.
    pub fn send<C: Channel>(&mut self, ch: &mut C, inputs: &[(Block, Block)]) -> Result<()> {
        debug!("ot extension: sending {} pairs", inputs.len());
        let qs = self.send_setup(ch, inputs.len())?;
        let mut ys = Vec::with_capacity(2 * inputs.len());
        for (j, input) in inputs.iter().enumerate() {
            let q = row_block(&qs, j);
            ys.push(self.hash.cr_hash(q) ^ input.0);
            ys.push(self.hash.cr_hash(q ^ self.s_) ^ input.1);
        }
        ch.send_blocks(&ys)
    }
}

/// Oblivious transfer extension receiver.
#[derive(Debug)]
pub struct OTExtReceiver {
    rngs: Vec<(AesRng, AesRng)>,
    hash: AesHash,
}

impl OTExtReceiver {
    pub fn new<C: Channel>(ch: &mut C) -> Result<Self> {
        let mut base_sender = OTSender::new(ch)?;
        let mut rng = rand::thread_rng();
        let ks = (0..NUM_BASE_OT)
            .map(|_| (rng.gen(), rng.gen()))
            .collect::<Vec<(Block, Block)>>();
        base_sender.send(ch, &ks)?;
        let rngs = ks
            .into_iter()
            .map(|(k0, k1)| {
                (
                    AesRng::from_seed(k0.to_le_bytes()),
                    AesRng::from_seed(k1.to_le_bytes()),
                )
            })
            .collect();
        Ok(Self {
            rngs,
            hash: AesHash::default(),
        })
    }

    fn receive_setup<C: Channel>(&mut self, ch: &mut C, r: &[u8], m: usize) -> Result<Vec<u8>> {
        let ncols = padded(m);
        let mut ts = vec![0u8; NUM_BASE_OT * ncols / 8];
        let mut us = vec![0u8; NUM_BASE_OT * ncols / 8];
        for (j, (rng0, rng1)) in self.rngs.iter_mut().enumerate() {
            let range = j * ncols / 8..(j + 1) * ncols / 8;
            let t = &mut ts[range.clone()];
            let u = &mut us[range];
            rng0.fill_bytes(t);
            rng1.fill_bytes(u);
            xor_inplace(u, t);
            xor_inplace(u, r);
        }
        ch.send_bytes(Bytes::from(us))?;
        Ok(transpose(&ts, NUM_BASE_OT, ncols))
    }

    /// Receive from [`OTExtSender`] with the given `choices` as choice bits.
    pub fn receive<C: Channel>(&mut self, ch: &mut C, choices: &[bool]) -> Result<Vec<Block>> {
        let r = boolvec_to_u8vec(choices);
        let ts = self.receive_setup(ch, &r, choices.len())?;
        let ys = ch.recv_blocks()?;
        if ys.len() != 2 * choices.len() {
            return Err(Error::UnexpectedMessage);
        }
        Ok(choices
            .iter()
            .zip(ys.chunks_exact(2))
            .enumerate()
            .map(|(j, (b, y))| {
                let y = if *b { y[1] } else { y[0] };
                y ^ self.hash.cr_hash(row_block(&ts, j))
            })
            .collect())
    }
}
