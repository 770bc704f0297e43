use std::borrow::Cow;

/// Invoice codes contain slashes, so clients percent-encode them in paths,
/// sometimes twice. Decode once more when possible and keep the raw text otherwise.
pub fn decode_code(raw: &str) -> String {
    let trimmed = raw.trim();
    match urlencoding::decode(trimmed) {
        Ok(Cow::Borrowed(s)) => s.to_string(),
        Ok(Cow::Owned(s)) => s,
        Err(_) => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_encoded_slashes() {
        assert_eq!(decode_code("FOLKS%2FINV%2F08%2F001"), "FOLKS/INV/08/001");
    }

    #[test]
    fn plain_codes_pass_through() {
        assert_eq!(decode_code(" FOLKS/INV/08/001 "), "FOLKS/INV/08/001");
    }

    #[test]
    fn invalid_utf8_keeps_raw_text() {
        assert_eq!(decode_code("FOLKS%FF"), "FOLKS%FF");
    }
}
