//! L1 (Ethereum) signer built from the configured private key.
//!
//! Only what activation needs: the checksummed address and EIP-191
//! `personal_sign` signatures. The key never leaves this type.

use crate::wallet::WalletError;
use alloy_primitives::{hex, B256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use std::fmt;

#[derive(Clone)]
pub struct EthSigner {
    secret: PrivateKeySigner,
    address: String,
}

impl fmt::Debug for EthSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EthSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl EthSigner {
    /// Parse a 32-byte hex private key, with or without `0x`.
    pub fn from_hex(private_key: &str) -> Result<Self, WalletError> {
        let bytes = hex::decode(private_key.trim())
            .map_err(|e| WalletError::InvalidKey(format!("not hex: {}", e)))?;
        if bytes.len() != 32 {
            return Err(WalletError::InvalidKey(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }

        let secret = PrivateKeySigner::from_bytes(&B256::from_slice(&bytes))
            .map_err(|e| WalletError::InvalidKey(e.to_string()))?;
        let address = secret.address().to_checksum(None);

        Ok(Self { secret, address })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// `personal_sign` over `message`, returned as `0x` + r || s || v with v in {27, 28}.
    pub fn personal_sign(&self, message: &[u8]) -> Result<String, WalletError> {
        let signature = self
            .secret
            .sign_message_sync(message)
            .map_err(|e| WalletError::Signing(e.to_string()))?;
        Ok(hex::encode_prefixed(signature.as_bytes()))
    }
}

/// Address that produced a `personal_sign` signature over `message`.
#[cfg(test)]
pub(crate) fn recover_address(message: &[u8], signature: &str) -> Result<String, WalletError> {
    use alloy_primitives::PrimitiveSignature;

    let bytes = hex::decode(signature).map_err(|e| WalletError::Signing(e.to_string()))?;
    let signature =
        PrimitiveSignature::from_raw(&bytes).map_err(|e| WalletError::Signing(e.to_string()))?;
    let address = signature
        .recover_address_from_msg(message)
        .map_err(|e| WalletError::Signing(e.to_string()))?;
    Ok(address.to_checksum(None))
}
