//! Field elements of the proving system and their boundary encoding.
//!
//! Every public input crosses the boundary as a big-endian word exactly as
//! wide as the BN254 scalar modulus (32 bytes). Words that are the wrong
//! width or not canonically reduced are rejected, never reduced silently.

use ark_ff::{BigInteger, PrimeField};

use crate::error::VerifyError;

/// Scalar field of BN254, shared by the Groth16 and UltraHonk backends.
pub type FieldElement = ark_bn254::Fr;

/// Width in bytes of one encoded field element.
pub const FIELD_ELEMENT_BYTES: usize =
    ((<FieldElement as PrimeField>::MODULUS_BIT_SIZE + 7) / 8) as usize;

/// Encode a field element as a fixed-width big-endian word.
pub fn encode(element: &FieldElement) -> Vec<u8> {
    let bytes = element.into_bigint().to_bytes_be();
    let mut word = vec![0u8; FIELD_ELEMENT_BYTES - bytes.len()];
    word.extend_from_slice(&bytes);
    word
}

/// Decode one fixed-width big-endian word into a field element.
pub fn decode(word: &[u8]) -> Result<FieldElement, VerifyError> {
    if word.len() != FIELD_ELEMENT_BYTES {
        return Err(VerifyError::MalformedPublicInput(format!(
            "expected {} bytes, got {}",
            FIELD_ELEMENT_BYTES,
            word.len()
        )));
    }
    let element = FieldElement::from_be_bytes_mod_order(word);
    if encode(&element) != word {
        return Err(VerifyError::MalformedPublicInput(
            "value is not below the field modulus".to_string(),
        ));
    }
    Ok(element)
}

/// Encode a sequence of field elements as concatenated words.
pub fn encode_all(elements: &[FieldElement]) -> Vec<u8> {
    elements.iter().flat_map(encode).collect()
}

/// Decode concatenated words. The input length must be a multiple of the word width.
pub fn decode_all(bytes: &[u8]) -> Result<Vec<FieldElement>, VerifyError> {
    if bytes.len() % FIELD_ELEMENT_BYTES != 0 {
        return Err(VerifyError::MalformedPublicInput(format!(
            "{} bytes is not a whole number of {}-byte words",
            bytes.len(),
            FIELD_ELEMENT_BYTES
        )));
    }
    bytes.chunks(FIELD_ELEMENT_BYTES).map(decode).collect()
}

pub fn to_hex(element: &FieldElement) -> String {
    format!("0x{}", hex::encode(encode(element)))
}

/// Parse one hex word into its boundary encoding without interpreting it.
pub fn word_from_hex(s: &str) -> Result<Vec<u8>, VerifyError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let word = hex::decode(digits)
        .map_err(|e| VerifyError::MalformedPublicInput(format!("invalid hex: {}", e)))?;
    if word.len() != FIELD_ELEMENT_BYTES {
        return Err(VerifyError::MalformedPublicInput(format!(
            "expected {} bytes, got {}",
            FIELD_ELEMENT_BYTES,
            word.len()
        )));
    }
    Ok(word)
}

pub fn from_hex(s: &str) -> Result<FieldElement, VerifyError> {
    decode(&word_from_hex(s)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_width_matches_bn254() {
        assert_eq!(FIELD_ELEMENT_BYTES, 32);
    }

    #[test]
    fn test_encode_small_value_is_left_padded() {
        let word = encode(&FieldElement::from(24u64));
        assert_eq!(word.len(), 32);
        assert!(word[..31].iter().all(|b| *b == 0));
        assert_eq!(word[31], 24);
    }

    #[test]
    fn test_decode_accepts_canonical_word() {
        let mut word = vec![0u8; 32];
        word[30] = 0x01;
        word[31] = 0x02;
        assert_eq!(decode(&word).unwrap(), FieldElement::from(258u64));
    }

    #[test]
    fn test_decode_rejects_wrong_width() {
        let result = decode(&[0u8; 31]);
        assert!(matches!(result, Err(VerifyError::MalformedPublicInput(_))));
        let result = decode(&[0u8; 33]);
        assert!(matches!(result, Err(VerifyError::MalformedPublicInput(_))));
    }

    #[test]
    fn test_decode_rejects_non_canonical_word() {
        let word = vec![0xffu8; 32];
        let result = decode(&word);
        assert!(result.unwrap_err().to_string().contains("field modulus"));
    }

    #[test]
    fn test_decode_rejects_modulus_itself() {
        let modulus = <FieldElement as PrimeField>::MODULUS.to_bytes_be();
        assert!(decode(&modulus).is_err());
    }

    #[test]
    fn test_decode_all_rejects_partial_word() {
        let result = decode_all(&[0u8; 40]);
        assert!(result.unwrap_err().to_string().contains("whole number"));
    }

    #[test]
    fn test_decode_all_splits_words_in_order() {
        let elements = vec![FieldElement::from(1u64), FieldElement::from(7u64)];
        let bytes = encode_all(&elements);
        assert_eq!(bytes.len(), 64);
        assert_eq!(decode_all(&bytes).unwrap(), elements);
    }

    #[test]
    fn test_hex_accepts_optional_prefix() {
        let hex = to_hex(&FieldElement::from(1u64));
        assert!(hex.starts_with("0x"));
        assert_eq!(from_hex(&hex).unwrap(), FieldElement::from(1u64));
        assert_eq!(from_hex(&hex[2..]).unwrap(), FieldElement::from(1u64));
    }

    #[test]
    fn test_hex_rejects_garbage() {
        assert!(from_hex("0xnothex").is_err());
    }

    #[test]
    fn test_word_from_hex_checks_width_per_word() {
        // Two half words must not pass as one whole word once concatenated.
        let half = format!("0x{}", "00".repeat(FIELD_ELEMENT_BYTES / 2));
        assert!(matches!(
            word_from_hex(&half),
            Err(VerifyError::MalformedPublicInput(_))
        ));
        let word = word_from_hex(&to_hex(&FieldElement::from(9u64))).unwrap();
        assert_eq!(word, encode(&FieldElement::from(9u64)));
    }
}
