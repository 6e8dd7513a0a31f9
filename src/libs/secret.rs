//! Sealing of stored credentials.
//!
//! API tokens and OAuth secrets are kept in `config.json` encrypted with
//! AES-256-CBC and base64-encoded. Key and IV are embedded at build time.

use aes::Aes256;
use anyhow::Result;
use base64::prelude::*;
use block_modes::block_padding::Pkcs7;
use block_modes::{BlockMode, Cbc};
use dialoguer::{theme::ColorfulTheme, Password};
use std::fmt;

// Include generated metadata with encryption keys
include!(concat!(env!("OUT_DIR"), "/app_metadata.rs"));

type Aes256Cbc = Cbc<Aes256, Pkcs7>;

#[derive(Clone)]
pub struct Secret {
    prompt: String,
    key: Vec<u8>,
    iv: Vec<u8>,
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret").field("prompt", &self.prompt).finish_non_exhaustive()
    }
}

impl Secret {
    pub fn new(prompt: &str) -> Self {
        Self {
            prompt: prompt.to_owned(),
            key: APP_METADATA_ENCRYPTION_KEY.to_vec(),
            iv: APP_METADATA_ENCRYPTION_IV.to_vec(),
        }
    }

    /// Asks for a secret without echo and returns it sealed.
    pub fn prompt(&self) -> Result<String> {
        let plain = Password::with_theme(&ColorfulTheme::default()).with_prompt(&self.prompt).interact()?;
        self.seal(&plain)
    }

    pub fn seal(&self, plain: &str) -> Result<String> {
        let cipher = Aes256Cbc::new_from_slices(&self.key, &self.iv)?;
        let ciphertext = cipher.encrypt_vec(plain.as_bytes());
        Ok(BASE64_STANDARD.encode(ciphertext))
    }

    pub fn open(&self, sealed: &str) -> Result<String> {
        let ciphertext = BASE64_STANDARD.decode(sealed.trim())?;
        let cipher = Aes256Cbc::new_from_slices(&self.key, &self.iv)?;
        let plain = cipher.decrypt_vec(&ciphertext)?;
        Ok(String::from_utf8(plain)?)
    }
}
