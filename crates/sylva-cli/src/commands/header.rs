//! `sylva header`: decode a raw GC header word.

use anyhow::Context;
use sylva_engine::HeaderWord;

/// Parse a decimal or `0x`-prefixed hexadecimal word.
pub fn parse_word(text: &str) -> anyhow::Result<u64> {
    let text = text.trim().replace('_', "");
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.with_context(|| format!("invalid header word {text:?}"))
}

pub fn execute(value: &str) -> anyhow::Result<i32> {
    let header = HeaderWord::from_raw(parse_word(value)?);
    println!("raw:       {:#018x}", header.raw());
    if header.is_forwarded() {
        println!("forwarded: yes");
        return Ok(0);
    }
    println!("rc:        {}", header.reference_count());
    println!("marked:    {}", header.is_marked());
    println!("young:     {}", header.is_young());
    println!("type id:   {}", header.type_id().as_u32());
    println!("reachable: {}", header.is_reachable());
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_word() {
        assert_eq!(parse_word("0x1F").unwrap(), 31);
        assert_eq!(parse_word("1_000").unwrap(), 1000);
        assert_eq!(parse_word(" 42 ").unwrap(), 42);
        assert!(parse_word("0xZZ").is_err());
        assert!(parse_word("-1").is_err());
    }
}
