use axum::extract::{FromRequest, Request};
use axum::Json;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ring::aead::{
    Aad, BoundKey, Nonce, NonceSequence, OpeningKey, SealingKey, UnboundKey, AES_256_GCM,
};
use ring::error::Unspecified;
use ring::rand::{SecureRandom, SystemRandom};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::error::AppError;
use crate::AppState;

/// AES-256 key length in bytes
pub const KEY_LENGTH: usize = 32;

/// AES-GCM nonce length in bytes
pub const NONCE_LENGTH: usize = 12;

/// AES-GCM authentication tag length in bytes
pub const TAG_LENGTH: usize = 16;

/// Why a payload envelope was rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("payload is not valid base64")]
    Encoding,
    #[error("payload is too short")]
    Truncated,
    #[error("payload failed authenticated decryption")]
    Decryption,
    #[error("decrypted payload is not valid JSON")]
    Body,
}

impl From<PayloadError> for AppError {
    fn from(err: PayloadError) -> Self {
        AppError::InvalidPayload(err.to_string())
    }
}

/// Derive the payload key from the configured secret
pub fn derive_payload_key(secret: &str) -> [u8; KEY_LENGTH] {
    let digest = Sha256::digest(secret.as_bytes());
    let mut key = [0u8; KEY_LENGTH];
    key.copy_from_slice(&digest);
    key
}

/// Nonce sequence that hands out exactly one nonce
struct SingleNonce {
    nonce: Option<[u8; NONCE_LENGTH]>,
}

impl SingleNonce {
    fn new(nonce: [u8; NONCE_LENGTH]) -> Self {
        SingleNonce { nonce: Some(nonce) }
    }
}

impl NonceSequence for SingleNonce {
    fn advance(&mut self) -> Result<Nonce, Unspecified> {
        self.nonce
            .take()
            .map(Nonce::assume_unique_for_key)
            .ok_or(Unspecified)
    }
}

/// Seal `plaintext` into a transportable payload string
///
/// Layout: nonce || ciphertext || tag, standard base64. The inverse of
/// [`decrypt_payload`]; clients and tests use it to build request bodies.
pub fn encrypt_payload(plaintext: &[u8], key: &[u8; KEY_LENGTH]) -> Result<String, Unspecified> {
    let mut nonce = [0u8; NONCE_LENGTH];
    SystemRandom::new().fill(&mut nonce)?;

    let unbound = UnboundKey::new(&AES_256_GCM, key)?;
    let mut sealing_key = SealingKey::new(unbound, SingleNonce::new(nonce));

    let mut in_out = plaintext.to_vec();
    sealing_key.seal_in_place_append_tag(Aad::empty(), &mut in_out)?;

    let mut blob = Vec::with_capacity(NONCE_LENGTH + in_out.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&in_out);

    Ok(BASE64.encode(blob))
}

/// Open a payload string produced by [`encrypt_payload`]
pub fn decrypt_payload(payload: &str, key: &[u8; KEY_LENGTH]) -> Result<Vec<u8>, PayloadError> {
    let blob = BASE64.decode(payload).map_err(|_| PayloadError::Encoding)?;
    if blob.len() < NONCE_LENGTH + TAG_LENGTH {
        return Err(PayloadError::Truncated);
    }

    let mut nonce = [0u8; NONCE_LENGTH];
    nonce.copy_from_slice(&blob[..NONCE_LENGTH]);

    let unbound = UnboundKey::new(&AES_256_GCM, key).map_err(|_| PayloadError::Decryption)?;
    let mut opening_key = OpeningKey::new(unbound, SingleNonce::new(nonce));

    let mut in_out = blob[NONCE_LENGTH..].to_vec();
    let plaintext = opening_key
        .open_in_place(Aad::empty(), &mut in_out)
        .map_err(|_| PayloadError::Decryption)?;

    Ok(plaintext.to_vec())
}

/// Wire shape registration and login bodies arrive in
#[derive(Debug, Deserialize)]
struct PayloadEnvelope {
    payload: String,
}

/// Extractor for codec-wrapped request bodies
///
/// Reads `{ "payload": "<blob>" }`, opens the blob with the state's payload
/// key and parses the plaintext as `T`. Only registration and login bodies
/// travel this way; every failure answers 400, never a pass-through of the
/// raw body.
pub struct Encrypted<T>(pub T);

#[axum::async_trait]
impl<T> FromRequest<AppState> for Encrypted<T>
where
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(
        req: Request,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let Json(envelope) = Json::<PayloadEnvelope>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::InvalidPayload(rejection.body_text()))?;

        let plaintext = decrypt_payload(&envelope.payload, &state.payload_key)?;
        let body = serde_json::from_slice(&plaintext).map_err(|_| PayloadError::Body)?;

        Ok(Encrypted(body))
    }
}
