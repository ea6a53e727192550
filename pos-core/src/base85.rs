//! # Base85 (alfabeto RFC 1924)
//!
//! Codifica bytes arbitrários como texto seguro para JSON. Cada grupo de 4 bytes
//! (big-endian) vira 5 dígitos na base 85; o último grupo é completado com zeros
//! e os dígitos excedentes são descartados, como no `b85encode` do Python.

const ALPHABET: &[u8; 85] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz!#$%&()*+-;<=>?@^_`{|}~";

/// Valor de cada byte ASCII no alfabeto (`u8::MAX` se inválido).
const DECODE: [u8; 128] = {
    let mut table = [u8::MAX; 128];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
};

pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().div_ceil(4) * 5);
    for chunk in bytes.chunks(4) {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        let mut value = u32::from_be_bytes(word);
        let mut digits = [0u8; 5];
        for digit in digits.iter_mut().rev() {
            *digit = ALPHABET[(value % 85) as usize];
            value /= 85;
        }
        for &digit in &digits[..chunk.len() + 1] {
            out.push(digit as char);
        }
    }
    out
}

pub fn decode(text: &str) -> Result<Vec<u8>, String> {
    let text = text.as_bytes();
    let mut out = Vec::with_capacity(text.len() / 5 * 4 + 4);
    for chunk in text.chunks(5) {
        if chunk.len() == 1 {
            return Err("dangling base85 digit".to_string());
        }
        let mut value: u32 = 0;
        for i in 0..5 {
            // grupo final incompleto: completa com o maior dígito
            let digit = match chunk.get(i) {
                Some(&c) => DECODE
                    .get(c as usize)
                    .copied()
                    .filter(|&d| d != u8::MAX)
                    .ok_or_else(|| format!("invalid base85 character {:?}", c as char))?,
                None => 84,
            };
            value = value
                .checked_mul(85)
                .and_then(|v| v.checked_add(u32::from(digit)))
                .ok_or_else(|| "base85 group overflows 32 bits".to_string())?;
        }
        out.extend_from_slice(&value.to_be_bytes()[..chunk.len() - 1]);
    }
    Ok(out)
}
