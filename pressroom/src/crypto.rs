use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine as _, engine::general_purpose};
use rand::{Rng, rng};
use std::env;

/// Generates a cryptographically secure single-use token with 256 bits of entropy.
///
/// Used for invitation links and WordPress OAuth state values. Encoded as
/// base64url without padding.
pub fn generate_token() -> String {
    let mut token_bytes = [0u8; 32];
    rng().fill(&mut token_bytes);

    general_purpose::URL_SAFE_NO_PAD.encode(token_bytes)
}

/// Decode and validate a base64 encryption key (must be 32 bytes)
fn decode_key(key_b64: &str) -> Result<Vec<u8>, anyhow::Error> {
    let key_bytes = general_purpose::STANDARD
        .decode(key_b64)
        .map_err(|e| anyhow::anyhow!("Failed to decode ENCRYPTION_KEY: {}", e))?;

    if key_bytes.len() != 32 {
        return Err(anyhow::anyhow!(
            "ENCRYPTION_KEY must be 32 bytes (256 bits), got {} bytes",
            key_bytes.len()
        ));
    }

    Ok(key_bytes)
}

fn load_encryption_key() -> Result<Vec<u8>, anyhow::Error> {
    let key_b64 = env::var("ENCRYPTION_KEY").map_err(|_| anyhow::anyhow!("ENCRYPTION_KEY environment variable not set"))?;
    decode_key(&key_b64)
}

/// Encrypts data using AES-256-GCM with a key from the ENCRYPTION_KEY environment variable.
///
/// Provider secrets and WordPress credentials are stored encrypted at rest with
/// this function. The key must be 32 bytes (256 bits) when decoded from base64.
///
/// # Returns
///
/// The encrypted data as a base64-encoded string (nonce + ciphertext).
///
/// # Errors
///
/// Returns an error if:
/// - ENCRYPTION_KEY environment variable is not set
/// - The encryption key is not valid base64 or not 32 bytes
/// - Encryption fails
pub fn encrypt_with_env_key(plaintext: &[u8]) -> Result<String, anyhow::Error> {
    let key_bytes = load_encryption_key()?;

    let cipher = Aes256Gcm::new_from_slice(&key_bytes).map_err(|e| anyhow::anyhow!("Failed to create cipher: {}", e))?;

    // Generate a random 96-bit nonce
    let mut nonce_bytes = [0u8; 12];
    rng().fill(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| anyhow::anyhow!("Encryption failed: {}", e))?;

    // Combine nonce + ciphertext and encode as base64
    let mut result = nonce_bytes.to_vec();
    result.extend_from_slice(&ciphertext);

    Ok(general_purpose::STANDARD.encode(result))
}

/// Decrypts data that was encrypted with [`encrypt_with_env_key`].
///
/// # Errors
///
/// Returns an error if:
/// - ENCRYPTION_KEY environment variable is not set
/// - The encryption key is not valid base64 or not 32 bytes
/// - The encrypted data is not valid base64 or too short
/// - Decryption fails
pub fn decrypt_with_env_key(encrypted_b64: &str) -> Result<Vec<u8>, anyhow::Error> {
    let key_bytes = load_encryption_key()?;

    let cipher = Aes256Gcm::new_from_slice(&key_bytes).map_err(|e| anyhow::anyhow!("Failed to create cipher: {}", e))?;

    let encrypted_data = general_purpose::STANDARD
        .decode(encrypted_b64)
        .map_err(|e| anyhow::anyhow!("Failed to decode encrypted data: {}", e))?;

    if encrypted_data.len() < 12 {
        return Err(anyhow::anyhow!("Encrypted data too short"));
    }

    // Split into nonce and ciphertext
    let (nonce_bytes, ciphertext) = encrypted_data.split_at(12);
    let nonce = Nonce::from_slice(nonce_bytes);

    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| anyhow::anyhow!("Decryption failed: {}", e))?;

    Ok(plaintext)
}

/// Decrypts an encrypted secret straight to a UTF-8 string.
pub fn decrypt_string_with_env_key(encrypted_b64: &str) -> Result<String, anyhow::Error> {
    let bytes = decrypt_with_env_key(encrypted_b64)?;
    String::from_utf8(bytes).map_err(|e| anyhow::anyhow!("Decrypted data is not valid UTF-8: {}", e))
}
