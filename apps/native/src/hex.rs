use anyhow::{bail, Context, Result};

/// Bytes as space separated upper-case hex, e.g. `F0 00 F1`.
pub fn format(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse hex bytes given as separate tokens (`F0 0x01`) or run together
/// (`F00101F1`).
pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    for token in tokens {
        let token = token.as_ref();
        let digits = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        if digits.is_empty() || digits.len() % 2 != 0 {
            bail!("'{}' is not a whole number of hex bytes", token);
        }
        for start in (0..digits.len()).step_by(2) {
            let pair = digits
                .get(start..start + 2)
                .with_context(|| format!("'{}' is not valid hex", token))?;
            let byte = u8::from_str_radix(pair, 16)
                .with_context(|| format!("'{}' is not valid hex", token))?;
            bytes.push(byte);
        }
    }
    Ok(bytes)
}
