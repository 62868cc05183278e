//! Private key and certificate chain loading.
//!
//! [`Credentials::load`] reads the two PEM files named in the configuration
//! and produces the [`SigningKey`] used for assertions together with the
//! [`CertificateChain`] that goes into the `x5c` header.
//!
//! PEM scanning follows RFC 7468: explanatory text before each `-----BEGIN`
//! line is skipped (openssl writes `Bag Attributes` and `subject=` lines
//! there). Non-whitespace data after the last block is rejected.

use std::fmt;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use jsonwebtoken::{DecodingKey, EncodingKey};
use pem::Pem;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::MaskinportenResult;
use crate::error::MaskinportenError;

/// Keys smaller than this are accepted but logged at `warn`.
pub const RECOMMENDED_RSA_KEY_BITS: usize = 2048;

const PKCS1_LABEL: &str = "RSA PRIVATE KEY";
const PKCS8_LABEL: &str = "PRIVATE KEY";
const ENCRYPTED_PKCS8_LABEL: &str = "ENCRYPTED PRIVATE KEY";
const CERTIFICATE_LABEL: &str = "CERTIFICATE";

const BEGIN_MARKER: &str = "-----BEGIN ";
const END_MARKER: &str = "-----END ";
const DASHES: &str = "-----";

/// Decodes every PEM block in `input`, in order.
///
/// `pem::parse_many` stops quietly at an unterminated block and ignores
/// whatever follows the last one, so both are checked here.
fn parse_pem(input: &[u8]) -> Result<Vec<Pem>, String> {
    let text = std::str::from_utf8(input).map_err(|_| "input is not PEM text".to_string())?;
    let blocks = pem::parse_many(text).map_err(|e| format!("invalid PEM: {e}"))?;

    if blocks.is_empty() {
        return Err("no PEM block found".to_string());
    }
    if text.matches(BEGIN_MARKER).count() != blocks.len() {
        return Err(format!(
            "malformed or unterminated PEM block after block {}",
            blocks.len()
        ));
    }
    if let Some(index) = blocks.iter().position(|block| block.contents().is_empty()) {
        return Err(format!("PEM block {} is empty", index + 1));
    }
    if has_trailing_data(text) {
        return Err(format!("unexpected data after PEM block {}", blocks.len()));
    }

    Ok(blocks)
}

/// Returns `true` if anything but whitespace follows the last END line.
fn has_trailing_data(text: &str) -> bool {
    let Some(last_end) = text.rfind(END_MARKER) else {
        return true;
    };
    let after = &text[last_end + END_MARKER.len()..];
    match after.find(DASHES) {
        Some(close) => !after[close + DASHES.len()..].trim().is_empty(),
        None => true,
    }
}

// ============================================================================
// Signing Key
// ============================================================================

/// An RSA private key ready for RS256 signing.
///
/// The private half never leaves this type; `Debug` prints only the key size.
pub struct SigningKey {
    encoding_key: EncodingKey,
    public_key: RsaPublicKey,
}

impl SigningKey {
    /// Parses a PEM-encoded RSA private key (PKCS#1 or unencrypted PKCS#8).
    ///
    /// # Errors
    ///
    /// Returns `KeyParse` if the input is not PEM, is not an RSA private key,
    /// or is encrypted.
    pub fn from_pem(input: &[u8]) -> MaskinportenResult<Self> {
        let blocks = parse_pem(input).map_err(MaskinportenError::key_parse)?;
        let block = blocks
            .first()
            .ok_or_else(|| MaskinportenError::key_parse("no PEM block found"))?;

        let private_key = match block.tag() {
            PKCS1_LABEL => RsaPrivateKey::from_pkcs1_der(block.contents())
                .map_err(|e| MaskinportenError::key_parse(format!("invalid PKCS#1 key: {e}")))?,
            PKCS8_LABEL => RsaPrivateKey::from_pkcs8_der(block.contents())
                .map_err(|e| MaskinportenError::key_parse(format!("invalid PKCS#8 RSA key: {e}")))?,
            ENCRYPTED_PKCS8_LABEL => {
                return Err(MaskinportenError::key_parse(
                    "encrypted private keys are not supported",
                ));
            }
            other => {
                return Err(MaskinportenError::key_parse(format!(
                    "expected an '{PKCS1_LABEL}' or '{PKCS8_LABEL}' block, found '{other}'"
                )));
            }
        };

        Self::from_rsa(private_key)
    }

    /// Wraps an already parsed RSA private key.
    ///
    /// # Errors
    ///
    /// Returns `KeyParse` if the key cannot be re-encoded for signing.
    pub fn from_rsa(private_key: RsaPrivateKey) -> MaskinportenResult<Self> {
        let bits = private_key.size() * 8;
        if bits < RECOMMENDED_RSA_KEY_BITS {
            tracing::warn!(
                bits,
                recommended = RECOMMENDED_RSA_KEY_BITS,
                "RSA signing key is smaller than recommended"
            );
        }

        let der = private_key
            .to_pkcs1_der()
            .map_err(|e| MaskinportenError::key_parse(e.to_string()))?;
        let encoding_key = EncodingKey::from_rsa_der(der.as_bytes());

        Ok(Self {
            encoding_key,
            public_key: private_key.to_public_key(),
        })
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    /// Returns the public half of the key.
    #[must_use]
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// Returns the modulus size in bits.
    #[must_use]
    pub fn bits(&self) -> usize {
        self.public_key.size() * 8
    }

    /// Builds a `jsonwebtoken` verification key from the public half.
    ///
    /// # Errors
    ///
    /// Returns `KeyParse` if the components cannot be converted.
    pub fn decoding_key(&self) -> MaskinportenResult<DecodingKey> {
        let n = URL_SAFE_NO_PAD.encode(self.public_key.n().to_bytes_be());
        let e = URL_SAFE_NO_PAD.encode(self.public_key.e().to_bytes_be());
        DecodingKey::from_rsa_components(&n, &e)
            .map_err(|e| MaskinportenError::key_parse(e.to_string()))
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Certificate Chain
// ============================================================================

/// The `x5c` representation of a PEM certificate chain.
///
/// Each entry is the standard (padded) base64 encoding of one block's DER
/// bytes, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateChain {
    certificates: Vec<Vec<u8>>,
    entries: Vec<String>,
}

impl CertificateChain {
    /// Converts PEM input with one or more blocks into a chain.
    ///
    /// # Errors
    ///
    /// Returns `CertParse` if the input has no block, a block is malformed,
    /// or non-whitespace data follows the last block.
    pub fn from_pem(input: &[u8]) -> MaskinportenResult<Self> {
        let blocks = parse_pem(input).map_err(MaskinportenError::cert_parse)?;
        Ok(Self::from_blocks(blocks))
    }

    fn from_blocks(blocks: Vec<Pem>) -> Self {
        let certificates: Vec<Vec<u8>> = blocks
            .into_iter()
            .enumerate()
            .map(|(index, block)| {
                if block.tag() != CERTIFICATE_LABEL {
                    tracing::warn!(
                        index,
                        label = %block.tag(),
                        "x5c entry is not a CERTIFICATE block"
                    );
                }
                block.into_contents()
            })
            .collect();
        let entries = certificates.iter().map(|der| STANDARD.encode(der)).collect();

        Self {
            certificates,
            entries,
        }
    }

    /// Returns the base64 entries, leaf first.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Returns the number of certificates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the chain has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the DER bytes of the first (leaf) certificate.
    #[must_use]
    pub fn leaf_der(&self) -> Option<&[u8]> {
        self.certificates.first().map(Vec::as_slice)
    }

    /// Returns the value of the `x5c` header parameter.
    #[must_use]
    pub fn to_x5c(&self) -> Vec<String> {
        self.entries.clone()
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// A signing key and the certificate chain that vouches for it.
#[derive(Debug)]
pub struct Credentials {
    /// The assertion signing key.
    pub signing_key: SigningKey,
    /// The chain sent in the `x5c` header.
    pub chain: CertificateChain,
}

impl Credentials {
    /// Reads and parses the private key and certificate files.
    ///
    /// # Errors
    ///
    /// Returns `KeyRead`/`CertRead` when a file cannot be read and
    /// `KeyParse`/`CertParse` when its content is unusable.
    pub fn load(private_key: &Path, certificate: &Path) -> MaskinportenResult<Self> {
        let key_bytes = std::fs::read(private_key).map_err(|source| MaskinportenError::KeyRead {
            path: private_key.to_path_buf(),
            source,
        })?;
        let signing_key = SigningKey::from_pem(&key_bytes)?;
        tracing::debug!(
            path = %private_key.display(),
            bits = signing_key.bits(),
            "Loaded private key"
        );

        let cert_bytes = std::fs::read(certificate).map_err(|source| MaskinportenError::CertRead {
            path: certificate.to_path_buf(),
            source,
        })?;
        let chain = CertificateChain::from_pem(&cert_bytes)?;
        tracing::debug!(
            path = %certificate.display(),
            certificates = chain.len(),
            "Loaded certificate chain"
        );

        Ok(Self { signing_key, chain })
    }
}
