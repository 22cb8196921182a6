pub mod ip;
pub mod password;
pub mod time_parser;
pub mod url_validator;

/// 短码允许的最大长度（与 short_links.short_code 列宽一致）
pub const MAX_SHORT_CODE_LEN: usize = 128;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

pub fn generate_random_code(length: usize) -> String {
    random_from_alphabet(CODE_ALPHABET, length)
}

/// API Key 明文：`lp_` 前缀 + 40 位字母数字
pub fn generate_api_key() -> String {
    format!("lp_{}", random_from_alphabet(CODE_ALPHABET, 40))
}

fn random_from_alphabet(alphabet: &[u8], length: usize) -> String {
    std::iter::repeat_with(|| alphabet[rand::random_range(0..alphabet.len())] as char)
        .take(length)
        .collect()
}

/// 校验短码格式：非空、不超过 128 字符、仅包含 URL 安全字符
///
/// 允许 `[A-Za-z0-9_.-]`，以及非首尾、不连续的 `/`（多级路径形式的短码）。
pub fn is_valid_short_code(code: &str) -> bool {
    if code.is_empty() || code.len() > MAX_SHORT_CODE_LEN {
        return false;
    }
    if code.starts_with('/') || code.ends_with('/') || code.contains("//") {
        return false;
    }
    code.bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_random_code_length_and_alphabet() {
        let code = generate_random_code(12);
        assert_eq!(code.len(), 12);
        assert!(code.bytes().all(|b| b.is_ascii_alphanumeric()));
        assert!(is_valid_short_code(&code));
    }

    #[test]
    fn test_generate_api_key_format() {
        let key = generate_api_key();
        assert!(key.starts_with("lp_"));
        assert_eq!(key.len(), 43);
        assert_ne!(key, generate_api_key());
    }

    #[test]
    fn test_is_valid_short_code() {
        assert!(is_valid_short_code("abc123"));
        assert!(is_valid_short_code("AbC-1_2.x"));
        assert!(is_valid_short_code("team/launch"));
        assert!(is_valid_short_code(&"a".repeat(MAX_SHORT_CODE_LEN)));

        assert!(!is_valid_short_code(""));
        assert!(!is_valid_short_code(&"a".repeat(MAX_SHORT_CODE_LEN + 1)));
        assert!(!is_valid_short_code("'; DROP TABLE--"));
        assert!(!is_valid_short_code("with space"));
        assert!(!is_valid_short_code("/leading"));
        assert!(!is_valid_short_code("trailing/"));
        assert!(!is_valid_short_code("a//b"));
        assert!(!is_valid_short_code("ünïcode"));
    }
}
