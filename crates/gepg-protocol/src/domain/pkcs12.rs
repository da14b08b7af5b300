//! # PKCS#12 Container
//!
//! Decrypted view of a password-protected PKCS#12 file.
//!
//! `p12` parses the ASN.1 structure. Integrity checking and bag decryption run
//! here so that both container profiles in circulation open the same way:
//!
//! | Profile | MAC | Bag encryption |
//! |---------|-----|----------------|
//! | Legacy (`openssl -legacy`, older keytool) | HMAC-SHA1 | pbeWithSHAAnd3-KeyTripleDES-CBC, pbeWithSHAAnd40BitRC2-CBC |
//! | Current (OpenSSL 3, keytool since JDK 17) | HMAC-SHA256 | PBES2 / PBKDF2 / AES-256-CBC |
//!
//! MACs over SHA-1 and the SHA-2 family are checked with the RFC 7292 key
//! derivation. PBES2 accepts PBKDF2 with any HMAC-SHA1/SHA-2 PRF and AES-CBC or
//! DES-EDE3-CBC. Anything else (PBMAC1 included) is reported, never assumed.

use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockCipher, BlockDecryptMut, KeyInit, KeyIvInit};
use hmac::{Mac, SimpleHmac};
use p12::{AlgorithmIdentifier, CertBag, ContentInfo, MacData, SafeBag, SafeBagKind, PFX};
use sha1::Sha1;
use sha2::digest::crypto_common::BlockSizeUser;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use yasna::models::ObjectIdentifier;
use zeroize::{Zeroize, Zeroizing};

const OID_SHA224: &[u64] = &[2, 16, 840, 1, 101, 3, 4, 2, 4];
const OID_SHA256: &[u64] = &[2, 16, 840, 1, 101, 3, 4, 2, 1];
const OID_SHA384: &[u64] = &[2, 16, 840, 1, 101, 3, 4, 2, 2];
const OID_SHA512: &[u64] = &[2, 16, 840, 1, 101, 3, 4, 2, 3];

const OID_PBES2: &[u64] = &[1, 2, 840, 113_549, 1, 5, 13];
const OID_PBKDF2: &[u64] = &[1, 2, 840, 113_549, 1, 5, 12];

const OID_HMAC_SHA1: &[u64] = &[1, 2, 840, 113_549, 2, 7];
const OID_HMAC_SHA224: &[u64] = &[1, 2, 840, 113_549, 2, 8];
const OID_HMAC_SHA256: &[u64] = &[1, 2, 840, 113_549, 2, 9];
const OID_HMAC_SHA384: &[u64] = &[1, 2, 840, 113_549, 2, 10];
const OID_HMAC_SHA512: &[u64] = &[1, 2, 840, 113_549, 2, 11];

const OID_AES128_CBC: &[u64] = &[2, 16, 840, 1, 101, 3, 4, 1, 2];
const OID_AES192_CBC: &[u64] = &[2, 16, 840, 1, 101, 3, 4, 1, 22];
const OID_AES256_CBC: &[u64] = &[2, 16, 840, 1, 101, 3, 4, 1, 42];
const OID_DES_EDE3_CBC: &[u64] = &[1, 2, 840, 113_549, 3, 7];

/// Unencrypted PKCS#8 key bag (`-keypbe NONE`).
const OID_KEY_BAG: &[u64] = &[1, 2, 840, 113_549, 1, 12, 10, 1, 1];

/// Key derivation purpose byte for the integrity key (RFC 7292 B.3).
const MAC_KEY_ID: u8 = 3;

/// One bag of interest, with the attributes used for alias lookup.
struct Entry {
    /// `friendlyName` attribute
    alias: Option<String>,
    /// `localKeyId` attribute, binding a key to its certificate
    local_key_id: Option<Vec<u8>>,
    /// PKCS#8 `PrivateKeyInfo` or X.509 certificate, DER
    der: Vec<u8>,
}

/// Decrypted key and certificate entries of one container.
pub(crate) struct Pkcs12Store {
    keys: Vec<Entry>,
    certs: Vec<Entry>,
}

impl Pkcs12Store {
    /// Check the container MAC with `password`, then decrypt every bag.
    pub fn from_der(bytes: &[u8], password: &str) -> Result<Self, String> {
        let pfx =
            PFX::parse(bytes).map_err(|e| format!("not a PKCS#12 container: {e:?}"))?;
        let secret = Password::new(password);

        let auth_safe = match &pfx.auth_safe {
            ContentInfo::Data(data) => data,
            _ => return Err("public-key integrity mode is not supported".to_string()),
        };

        match &pfx.mac_data {
            Some(mac) => {
                if !mac_matches(mac, auth_safe, &secret.bmp)? {
                    return Err("integrity check failed (wrong password?)".to_string());
                }
            }
            None => tracing::debug!("PKCS#12 container carries no MAC"),
        }

        let contents = yasna::parse_ber(auth_safe, |r| r.collect_sequence_of(ContentInfo::parse))
            .map_err(|e| format!("malformed authenticated safe: {e}"))?;

        let mut store = Self {
            keys: Vec::new(),
            certs: Vec::new(),
        };

        for content in &contents {
            let safe_contents = match content {
                ContentInfo::Data(data) => Zeroizing::new(data.clone()),
                ContentInfo::EncryptedData(encrypted) => {
                    let info = &encrypted.encrypted_content_info;
                    Zeroizing::new(decrypt(
                        &info.content_encryption_algorithm,
                        &info.encrypted_content,
                        &secret,
                    )?)
                }
                ContentInfo::OtherContext(other) => {
                    tracing::debug!(content_type = %other.content_type, "Skipping PKCS#12 content");
                    continue;
                }
            };

            let bags = yasna::parse_ber(&safe_contents, |r| r.collect_sequence_of(SafeBag::parse))
                .map_err(|e| format!("malformed safe contents: {e}"))?;
            for bag in bags {
                store.add(bag, &secret)?;
            }
        }

        Ok(store)
    }

    fn add(&mut self, bag: SafeBag, secret: &Password) -> Result<(), String> {
        let alias = bag.friendly_name();
        let local_key_id = bag.local_key_id();

        match bag.bag {
            SafeBagKind::Pkcs8ShroudedKeyBag(info) => {
                let der = decrypt(&info.encryption_algorithm, &info.encrypted_data, secret)?;
                self.keys.push(Entry { alias, local_key_id, der });
            }
            SafeBagKind::CertBag(CertBag::X509(der)) => {
                self.certs.push(Entry { alias, local_key_id, der });
            }
            SafeBagKind::OtherBagKind(other) if is(&other.bag_id, OID_KEY_BAG) => {
                self.keys.push(Entry {
                    alias,
                    local_key_id,
                    der: other.bag_value,
                });
            }
            _ => {}
        }
        Ok(())
    }

    /// PKCS#8 DER of the key entry named `alias`, compared case-insensitively.
    pub fn private_key_der(&self, alias: &str) -> Option<&[u8]> {
        self.key_entry(alias).map(|entry| entry.der.as_slice())
    }

    pub fn has_key_entry(&self, alias: &str) -> bool {
        self.key_entry(alias).is_some()
    }

    /// Certificate named `alias`, else the one sharing the key entry's `localKeyId`.
    pub fn certificate_der(&self, alias: &str) -> Option<&[u8]> {
        if let Some(entry) = self.certs.iter().find(|c| c.is_named(alias)) {
            return Some(entry.der.as_slice());
        }

        let key_id = self.key_entry(alias)?.local_key_id.as_ref()?;
        self.certs
            .iter()
            .find(|c| c.local_key_id.as_ref() == Some(key_id))
            .map(|entry| entry.der.as_slice())
    }

    fn key_entry(&self, alias: &str) -> Option<&Entry> {
        self.keys.iter().find(|k| k.is_named(alias))
    }
}

impl Entry {
    fn is_named(&self, alias: &str) -> bool {
        self.alias
            .as_deref()
            .is_some_and(|name| name.eq_ignore_ascii_case(alias))
    }
}

impl Drop for Pkcs12Store {
    fn drop(&mut self) {
        for key in &mut self.keys {
            key.der.zeroize();
        }
    }
}

/// Password in both encodings PKCS#12 uses.
struct Password {
    /// BMPString with trailing NUL, for the RFC 7292 schemes
    bmp: Zeroizing<Vec<u8>>,
    /// Raw UTF-8, for PBES2
    utf8: Zeroizing<Vec<u8>>,
}

impl Password {
    fn new(password: &str) -> Self {
        let bmp: Vec<u8> = password
            .encode_utf16()
            .chain(std::iter::once(0))
            .flat_map(u16::to_be_bytes)
            .collect();
        Self {
            bmp: Zeroizing::new(bmp),
            utf8: Zeroizing::new(password.as_bytes().to_vec()),
        }
    }
}

fn is(oid: &ObjectIdentifier, expected: &[u64]) -> bool {
    oid.components().as_slice() == expected
}

// =============================================================================
// INTEGRITY
// =============================================================================

fn mac_matches(mac: &MacData, data: &[u8], bmp: &[u8]) -> Result<bool, String> {
    let oid = match &mac.mac.digest_algorithm {
        AlgorithmIdentifier::Sha1 => return Ok(hmac_matches::<Sha1>(mac, data, bmp)),
        AlgorithmIdentifier::OtherAlg(other) => &other.algorithm_type,
        other => return Err(format!("unsupported MAC algorithm {other:?}")),
    };

    match oid.components().as_slice() {
        OID_SHA224 => Ok(hmac_matches::<Sha224>(mac, data, bmp)),
        OID_SHA256 => Ok(hmac_matches::<Sha256>(mac, data, bmp)),
        OID_SHA384 => Ok(hmac_matches::<Sha384>(mac, data, bmp)),
        OID_SHA512 => Ok(hmac_matches::<Sha512>(mac, data, bmp)),
        _ => Err(format!("unsupported MAC algorithm {oid}")),
    }
}

fn hmac_matches<D>(mac: &MacData, data: &[u8], bmp: &[u8]) -> bool
where
    D: Digest + BlockSizeUser,
{
    let key = Zeroizing::new(derive_key::<D>(
        bmp,
        &mac.salt,
        MAC_KEY_ID,
        mac.iterations,
        <D as Digest>::output_size(),
    ));
    let Ok(mut hmac) = <SimpleHmac<D> as Mac>::new_from_slice(&key) else {
        return false;
    };
    hmac.update(data);
    hmac.verify_slice(&mac.mac.digest).is_ok()
}

/// RFC 7292 appendix B key derivation over any block digest.
fn derive_key<D>(password: &[u8], salt: &[u8], id: u8, iterations: u32, len: usize) -> Vec<u8>
where
    D: Digest + BlockSizeUser,
{
    let v = D::block_size();
    let stretch = |s: &[u8]| -> Vec<u8> {
        let target = v * s.len().div_ceil(v);
        s.iter().copied().cycle().take(target).collect()
    };

    let mut i = Zeroizing::new(stretch(salt));
    i.extend(stretch(password));
    let diversifier = vec![id; v];
    let mut out = Vec::with_capacity(len);

    loop {
        let mut a = D::new()
            .chain_update(&diversifier)
            .chain_update(i.as_slice())
            .finalize();
        for _ in 1..iterations {
            a = D::digest(&a);
        }
        out.extend_from_slice(&a);
        if out.len() >= len {
            out.truncate(len);
            return out;
        }

        // I_j = (I_j + B + 1) mod 2^v for every v-byte block of I
        let b: Vec<u8> = a.iter().copied().cycle().take(v).collect();
        for block in i.chunks_mut(v) {
            let mut carry = 1u16;
            for (x, y) in block.iter_mut().rev().zip(b.iter().rev()) {
                let sum = u16::from(*x) + u16::from(*y) + carry;
                *x = sum as u8;
                carry = sum >> 8;
            }
        }
    }
}

// =============================================================================
// DECRYPTION
// =============================================================================

fn decrypt(algorithm: &AlgorithmIdentifier, ciphertext: &[u8], secret: &Password) -> Result<Vec<u8>, String> {
    match algorithm {
        AlgorithmIdentifier::OtherAlg(other) if is(&other.algorithm_type, OID_PBES2) => {
            let params = other
                .params
                .as_deref()
                .ok_or_else(|| "PBES2 without parameters".to_string())?;
            Pbes2::parse(params)?.decrypt(ciphertext, &secret.utf8)
        }
        AlgorithmIdentifier::OtherAlg(other) => Err(format!(
            "unsupported encryption scheme {}",
            other.algorithm_type
        )),
        legacy => legacy
            .decrypt_pbe(ciphertext, &secret.bmp)
            .ok_or_else(|| "cannot decrypt entry (wrong password?)".to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prf {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cipher {
    Aes128,
    Aes192,
    Aes256,
    DesEde3,
}

impl Cipher {
    fn key_len(self) -> usize {
        match self {
            Cipher::Aes128 => 16,
            Cipher::Aes192 | Cipher::DesEde3 => 24,
            Cipher::Aes256 => 32,
        }
    }
}

/// PBES2 parameters (RFC 8018 A.4) restricted to PBKDF2.
#[derive(Debug)]
struct Pbes2 {
    salt: Vec<u8>,
    iterations: u32,
    prf: Prf,
    cipher: Cipher,
    iv: Vec<u8>,
}

impl Pbes2 {
    fn parse(der: &[u8]) -> Result<Self, String> {
        let (kdf, salt, iterations, key_len, prf, cipher, iv) = yasna::parse_ber(der, |r| {
            r.read_sequence(|r| {
                let (kdf, salt, iterations, key_len, prf) = r.next().read_sequence(|r| {
                    let kdf = r.next().read_oid()?;
                    let (salt, iterations, key_len, prf) = r.next().read_sequence(|r| {
                        let salt = r.next().read_bytes()?;
                        let iterations = r.next().read_u32()?;
                        let key_len = r.read_optional(|r| r.read_u32())?;
                        let prf = r.read_optional(|r| {
                            r.read_sequence(|r| {
                                let oid = r.next().read_oid()?;
                                r.read_optional(|r| r.read_null())?;
                                Ok(oid)
                            })
                        })?;
                        Ok((salt, iterations, key_len, prf))
                    })?;
                    Ok((kdf, salt, iterations, key_len, prf))
                })?;
                let (cipher, iv) = r.next().read_sequence(|r| {
                    let oid = r.next().read_oid()?;
                    let iv = r.next().read_bytes()?;
                    Ok((oid, iv))
                })?;
                Ok((kdf, salt, iterations, key_len, prf, cipher, iv))
            })
        })
        .map_err(|e| format!("malformed PBES2 parameters: {e}"))?;

        if !is(&kdf, OID_PBKDF2) {
            return Err(format!("unsupported PBES2 key derivation {kdf}"));
        }

        // PRF defaults to hmacWithSHA1 when absent
        let prf = match prf {
            None => Prf::Sha1,
            Some(oid) => match oid.components().as_slice() {
                OID_HMAC_SHA1 => Prf::Sha1,
                OID_HMAC_SHA224 => Prf::Sha224,
                OID_HMAC_SHA256 => Prf::Sha256,
                OID_HMAC_SHA384 => Prf::Sha384,
                OID_HMAC_SHA512 => Prf::Sha512,
                _ => return Err(format!("unsupported PBKDF2 PRF {oid}")),
            },
        };

        let cipher = match cipher.components().as_slice() {
            OID_AES128_CBC => Cipher::Aes128,
            OID_AES192_CBC => Cipher::Aes192,
            OID_AES256_CBC => Cipher::Aes256,
            OID_DES_EDE3_CBC => Cipher::DesEde3,
            _ => return Err(format!("unsupported PBES2 cipher {cipher}")),
        };

        if let Some(len) = key_len {
            if len as usize != cipher.key_len() {
                return Err(format!("PBKDF2 key length {len} does not fit {cipher:?}"));
            }
        }

        Ok(Self {
            salt,
            iterations,
            prf,
            cipher,
            iv,
        })
    }

    fn decrypt(&self, ciphertext: &[u8], password: &[u8]) -> Result<Vec<u8>, String> {
        let mut key = Zeroizing::new(vec![0u8; self.cipher.key_len()]);
        match self.prf {
            Prf::Sha1 => pbkdf2::pbkdf2_hmac::<Sha1>(password, &self.salt, self.iterations, &mut key),
            Prf::Sha224 => pbkdf2::pbkdf2_hmac::<Sha224>(password, &self.salt, self.iterations, &mut key),
            Prf::Sha256 => pbkdf2::pbkdf2_hmac::<Sha256>(password, &self.salt, self.iterations, &mut key),
            Prf::Sha384 => pbkdf2::pbkdf2_hmac::<Sha384>(password, &self.salt, self.iterations, &mut key),
            Prf::Sha512 => pbkdf2::pbkdf2_hmac::<Sha512>(password, &self.salt, self.iterations, &mut key),
        }

        match self.cipher {
            Cipher::Aes128 => cbc_decrypt::<aes::Aes128>(&key, &self.iv, ciphertext),
            Cipher::Aes192 => cbc_decrypt::<aes::Aes192>(&key, &self.iv, ciphertext),
            Cipher::Aes256 => cbc_decrypt::<aes::Aes256>(&key, &self.iv, ciphertext),
            Cipher::DesEde3 => cbc_decrypt::<des::TdesEde3>(&key, &self.iv, ciphertext),
        }
    }
}

fn cbc_decrypt<C>(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, String>
where
    C: BlockCipher + BlockDecryptMut + KeyInit,
{
    cbc::Decryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| "PBES2 IV does not match the cipher block size".to_string())?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| "cannot decrypt entry (wrong password?)".to_string())
}
