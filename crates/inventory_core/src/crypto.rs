//! Criptografia simétrica do payload.
//!
//! AES (128/192/256 conforme o tamanho da chave) em modo CFB de bloco
//! inteiro, IV aleatório de 16 bytes por chamada. Formato do envelope:
//!
//! ```text
//! ┌─────────┬──────────────────────┐
//! │ IV (16) │ Ciphertext (N)       │   → base64 URL-safe (com padding)
//! └─────────┴──────────────────────┘
//! ```
//!
//! - O ciphertext tem exatamente o tamanho do plaintext (sem padding)
//! - O receptor decodifica, separa no byte 16 e decifra
//! - Não há tag de autenticação: confidencialidade apenas

use aes::{Aes128, Aes192, Aes256};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE;
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use tracing::debug;
use zeroize::Zeroizing;

/// Tamanho do IV (bloco AES).
pub const IV_LEN: usize = 16;

/// Erros de criptografia.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Chave não é hexadecimal válido: {0}")]
    KeyFormat(#[from] hex::FromHexError),

    #[error("Tamanho de chave inválido: {0} bytes (deve ser 16, 24 ou 32)")]
    KeyLength(usize),

    #[error("Falha ao gerar IV: {0}")]
    RandomSource(String),

    #[error("Envelope não é base64 URL-safe: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("Envelope muito curto ({0} bytes, mínimo {IV_LEN})")]
    EnvelopeTooShort(usize),
}

/// Força da cifra, derivada do tamanho da chave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStrength {
    Aes128,
    Aes192,
    Aes256,
}

/// Chave AES validada. Os bytes são zerados no drop.
#[derive(Clone)]
pub struct EncryptionKey {
    bytes: Zeroizing<Vec<u8>>,
    strength: KeyStrength,
}

impl EncryptionKey {
    /// Decodifica e valida uma chave hexadecimal.
    ///
    /// Nada de padding ou truncamento: tamanho fora de {16, 24, 32} é erro.
    pub fn from_hex(key_hex: &str) -> Result<Self, CryptoError> {
        let bytes = Zeroizing::new(hex::decode(key_hex)?);
        let strength = match bytes.len() {
            16 => KeyStrength::Aes128,
            24 => KeyStrength::Aes192,
            32 => KeyStrength::Aes256,
            n => return Err(CryptoError::KeyLength(n)),
        };
        Ok(Self { bytes, strength })
    }

    pub fn strength(&self) -> KeyStrength {
        self.strength
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("strength", &self.strength)
            .finish_non_exhaustive()
    }
}

/// Criptografa `plaintext` com a chave hexadecimal e retorna o envelope codificado.
pub fn encrypt(plaintext: &[u8], key_hex: &str) -> Result<String, CryptoError> {
    debug!("Tamanho da chave hexadecimal: {} caracteres", key_hex.len());
    let key = EncryptionKey::from_hex(key_hex)?;
    encrypt_with_key(plaintext, &key)
}

/// Igual a [`encrypt`], com a chave já validada.
///
/// Cada chamada lê um IV novo do CSPRNG do sistema operacional; nenhum estado
/// é compartilhado entre chamadas.
pub fn encrypt_with_key(plaintext: &[u8], key: &EncryptionKey) -> Result<String, CryptoError> {
    debug!(
        "Plaintext: {} bytes | chave: {} bytes ({:?})",
        plaintext.len(),
        key.byte_len(),
        key.strength()
    );

    let mut iv = [0u8; IV_LEN];
    getrandom::fill(&mut iv).map_err(|e| CryptoError::RandomSource(e.to_string()))?;

    let envelope = seal_with_iv(key, &iv, plaintext)?;
    let encoded = URL_SAFE.encode(&envelope);
    debug!("Envelope codificado: {} caracteres", encoded.len());

    Ok(encoded)
}

/// Monta `IV || AES-CFB(plaintext)`.
fn seal_with_iv(
    key: &EncryptionKey,
    iv: &[u8; IV_LEN],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let mut envelope = Vec::with_capacity(IV_LEN + plaintext.len());
    envelope.extend_from_slice(iv);
    envelope.extend_from_slice(plaintext);

    let body = &mut envelope[IV_LEN..];
    let k = key.bytes.as_slice();
    match key.strength {
        KeyStrength::Aes128 => cfb_mode::Encryptor::<Aes128>::new_from_slices(k, iv)
            .map(|c| c.encrypt(body)),
        KeyStrength::Aes192 => cfb_mode::Encryptor::<Aes192>::new_from_slices(k, iv)
            .map(|c| c.encrypt(body)),
        KeyStrength::Aes256 => cfb_mode::Encryptor::<Aes256>::new_from_slices(k, iv)
            .map(|c| c.encrypt(body)),
    }
    .map_err(|_| CryptoError::KeyLength(k.len()))?;

    Ok(envelope)
}

/// Operação inversa de [`encrypt_with_key`] (lado receptor / testes).
#[cfg(any(test, feature = "decrypt"))]
pub fn decrypt(encoded: &str, key: &EncryptionKey) -> Result<Vec<u8>, CryptoError> {
    use cfb_mode::Decryptor;

    let envelope = URL_SAFE.decode(encoded)?;
    if envelope.len() < IV_LEN {
        return Err(CryptoError::EnvelopeTooShort(envelope.len()));
    }

    let (iv, body) = envelope.split_at(IV_LEN);
    let mut plaintext = body.to_vec();
    let k = key.bytes.as_slice();
    match key.strength {
        KeyStrength::Aes128 => {
            Decryptor::<Aes128>::new_from_slices(k, iv).map(|c| c.decrypt(&mut plaintext))
        }
        KeyStrength::Aes192 => {
            Decryptor::<Aes192>::new_from_slices(k, iv).map(|c| c.decrypt(&mut plaintext))
        }
        KeyStrength::Aes256 => {
            Decryptor::<Aes256>::new_from_slices(k, iv).map(|c| c.decrypt(&mut plaintext))
        }
    }
    .map_err(|_| CryptoError::KeyLength(k.len()))?;

    Ok(plaintext)
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
