//! AES-128 in counter mode as a seedable PRG.

use super::block::Block;
use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes128;
use rand_core::{impls, CryptoRng, RngCore, SeedableRng};
use std::fmt;

/// PRG expanding a 128-bit seed with `AES_seed(counter)`.
#[derive(Clone)]
pub struct AesRng {
    aes: Aes128,
    counter: Block,
    buffer: [u8; 16],
    index: usize,
}

impl AesRng {
    fn refill(&mut self) {
        let mut block = self.counter.to_le_bytes().into();
        self.aes.encrypt_block(&mut block);
        self.buffer = block.into();
        self.counter = self.counter.wrapping_add(1);
        self.index = 0;
    }
}

impl SeedableRng for AesRng {
    type Seed = [u8; 16];

    fn from_seed(seed: Self::Seed) -> Self {
        AesRng {
            aes: Aes128::new(&seed.into()),
            counter: 0,
            buffer: [0; 16],
            index: 16,
        }
    }
}

impl RngCore for AesRng {
    fn next_u32(&mut self) -> u32 {
        impls::next_u32_via_fill(self)
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_fill(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut written = 0;
        while written < dest.len() {
            if self.index == self.buffer.len() {
                self.refill();
            }
            let n = (self.buffer.len() - self.index).min(dest.len() - written);
            dest[written..written + n].copy_from_slice(&self.buffer[self.index..self.index + n]);
            self.index += n;
            written += n;
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for AesRng {}

impl fmt::Debug for AesRng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AesRng")
            .field("counter", &self.counter)
            .finish()
    }
}
