//! Correlation robust AES hash (cf. <https://eprint.iacr.org/2019/074>).

use super::block::Block;
use aes::cipher::{BlockEncrypt, Key, KeyInit};
use aes::Aes128;

/// Public key shared by both parties.
pub const FIXED_KEY: u128 = 193502124791825095790518994062991136444;

#[derive(Debug, Clone)]
pub struct AesHash {
    aes: Aes128,
}

impl AesHash {
    pub fn new(key: &Key<Aes128>) -> Self {
        Self {
            aes: Aes128::new(key),
        }
    }

    /// `H(x) = AES_k(x) ^ x`, only secure in the semi-honest setting.
    pub fn cr_hash(&self, x: Block) -> Block {
        let mut x_enc = x.to_le_bytes().into();
        self.aes.encrypt_block(&mut x_enc);
        x ^ Block::from_le_bytes(x_enc.into())
    }
}

impl Default for AesHash {
    fn default() -> Self {
        AesHash::new(&FIXED_KEY.to_le_bytes().into())
    }
}
