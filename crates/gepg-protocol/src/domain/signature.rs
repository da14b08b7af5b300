//! # Digital Signature Engine (RSASSA-PKCS1-v1_5)
//!
//! Signs and verifies canonical payload bytes. The algorithm is chosen at
//! runtime from its configured name, so switching digests is a configuration
//! change.
//!
//! ## Security Notes
//!
//! - Only canonical payload bytes are signed, never the envelope around them
//! - `verify` collapses every failure (bad Base64, wrong length, wrong key)
//!   into `false`

use super::errors::SignatureError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};
use std::fmt;
use std::str::FromStr;

/// Supported signature algorithms, named the way the gateway configures them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SignatureAlgorithm {
    /// Protocol default
    #[default]
    Sha1WithRsa,
    Sha256WithRsa,
    Sha384WithRsa,
    Sha512WithRsa,
}

impl SignatureAlgorithm {
    pub const ALL: [SignatureAlgorithm; 4] = [
        SignatureAlgorithm::Sha1WithRsa,
        SignatureAlgorithm::Sha256WithRsa,
        SignatureAlgorithm::Sha384WithRsa,
        SignatureAlgorithm::Sha512WithRsa,
    ];

    /// Canonical name, e.g. `SHA1withRSA`.
    pub fn name(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Sha1WithRsa => "SHA1withRSA",
            SignatureAlgorithm::Sha256WithRsa => "SHA256withRSA",
            SignatureAlgorithm::Sha384WithRsa => "SHA384withRSA",
            SignatureAlgorithm::Sha512WithRsa => "SHA512withRSA",
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = SignatureError;

    /// Names compare case-insensitively (`sha256withrsa` is accepted).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|alg| alg.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SignatureError::UnknownAlgorithm(s.to_string()))
    }
}

impl TryFrom<String> for SignatureAlgorithm {
    type Error = SignatureError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SignatureAlgorithm> for String {
    fn from(alg: SignatureAlgorithm) -> Self {
        alg.name().to_string()
    }
}

/// Sign canonical bytes and return the Base64 signature.
pub fn sign(
    canonical: &[u8],
    private_key: &RsaPrivateKey,
    algorithm: SignatureAlgorithm,
) -> Result<String, SignatureError> {
    let key = private_key.clone();
    let signature = match algorithm {
        SignatureAlgorithm::Sha1WithRsa => SigningKey::<Sha1>::new(key)
            .try_sign(canonical)
            .map(|s| s.to_vec()),
        SignatureAlgorithm::Sha256WithRsa => SigningKey::<Sha256>::new(key)
            .try_sign(canonical)
            .map(|s| s.to_vec()),
        SignatureAlgorithm::Sha384WithRsa => SigningKey::<Sha384>::new(key)
            .try_sign(canonical)
            .map(|s| s.to_vec()),
        SignatureAlgorithm::Sha512WithRsa => SigningKey::<Sha512>::new(key)
            .try_sign(canonical)
            .map(|s| s.to_vec()),
    }
    .map_err(|e| SignatureError::SigningFailed(e.to_string()))?;

    Ok(STANDARD.encode(signature))
}

/// Verify a Base64 signature over canonical bytes.
///
/// Whitespace inside the Base64 text (MIME line breaks) is ignored.
pub fn verify(
    canonical: &[u8],
    signature_b64: &str,
    public_key: &RsaPublicKey,
    algorithm: SignatureAlgorithm,
) -> bool {
    let compact: String = signature_b64
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if compact.is_empty() {
        return false;
    }

    let Ok(raw) = STANDARD.decode(compact.as_bytes()) else {
        return false;
    };
    let Ok(signature) = Signature::try_from(raw.as_slice()) else {
        return false;
    };

    let key = public_key.clone();
    let result = match algorithm {
        SignatureAlgorithm::Sha1WithRsa => VerifyingKey::<Sha1>::new(key).verify(canonical, &signature),
        SignatureAlgorithm::Sha256WithRsa => {
            VerifyingKey::<Sha256>::new(key).verify(canonical, &signature)
        }
        SignatureAlgorithm::Sha384WithRsa => {
            VerifyingKey::<Sha384>::new(key).verify(canonical, &signature)
        }
        SignatureAlgorithm::Sha512WithRsa => {
            VerifyingKey::<Sha512>::new(key).verify(canonical, &signature)
        }
    };
    result.is_ok()
}
