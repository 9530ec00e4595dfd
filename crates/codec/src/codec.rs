use druid_settings::{Error, PropertyMap, Result};
use std::str::FromStr;

/// Property bag codec for handing settings to the pool initializer
pub trait PropertyCodec {
    fn encode(&self, props: &PropertyMap) -> Result<Vec<u8>>;
    fn decode(&self, data: &[u8]) -> Result<PropertyMap>;
}

/// Java `.properties` text, one `key=value` per line
pub struct PropertiesCodec;

impl PropertyCodec for PropertiesCodec {
    fn encode(&self, props: &PropertyMap) -> Result<Vec<u8>> {
        let mut out = String::new();
        for (key, value) in props.iter() {
            escape_into(&mut out, key, true);
            out.push('=');
            escape_into(&mut out, value, false);
            out.push('\n');
        }
        Ok(out.into_bytes())
    }

    fn decode(&self, data: &[u8]) -> Result<PropertyMap> {
        let text = std::str::from_utf8(data)
            .map_err(|e| Error::Codec(format!("invalid UTF-8: {}", e)))?;

        let mut props = PropertyMap::new();
        for line in text.lines() {
            let line = line.trim_start();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let (key, value) = split_entry(line);
            props.insert(unescape(key)?, unescape(value)?);
        }
        Ok(props)
    }
}

/// Flat JSON object
pub struct JsonCodec;

impl PropertyCodec for JsonCodec {
    fn encode(&self, props: &PropertyMap) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(props)?)
    }

    fn decode(&self, data: &[u8]) -> Result<PropertyMap> {
        Ok(serde_json::from_slice(data)?)
    }
}

fn escape_into(out: &mut String, text: &str, is_key: bool) {
    for (i, c) in text.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            _ => out.push(c),
        }
    }
}

/// Split a logical line the way `java.util.Properties` does: the key ends at
/// the first unescaped `=`, `:` or whitespace, and the separator may be
/// surrounded by whitespace.
fn split_entry(line: &str) -> (&str, &str) {
    let is_blank = |c: char| c == ' ' || c == '\t' || c == '\x0c';

    let mut escaped = false;
    let mut key_end = line.len();
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || is_blank(c) {
            key_end = i;
            break;
        }
    }

    let key = &line[..key_end];
    let mut rest = line[key_end..].trim_start_matches(is_blank);
    if let Some(stripped) = rest.strip_prefix(&['=', ':'][..]) {
        rest = stripped.trim_start_matches(is_blank);
    }
    (key, rest)
}

fn unescape(text: &str) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let unit = read_code_unit(&mut chars, text)?;
                let code = if (0xD800..0xDC00).contains(&unit) {
                    // Characters outside the BMP arrive as a surrogate pair
                    let low = match (chars.next(), chars.next()) {
                        (Some('\\'), Some('u')) => read_code_unit(&mut chars, text)?,
                        _ => return Err(Error::Codec(format!("unpaired surrogate in {:?}", text))),
                    };
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err(Error::Codec(format!("unpaired surrogate in {:?}", text)));
                    }
                    0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00)
                } else {
                    unit
                };
                let decoded = char::from_u32(code)
                    .ok_or_else(|| Error::Codec(format!("invalid \\u escape in {:?}", text)))?;
                out.push(decoded);
            }
            Some(other) => out.push(other),
            None => return Err(Error::Codec(format!("dangling escape in {:?}", text))),
        }
    }
    Ok(out)
}

/// Four hex digits following `\u`
fn read_code_unit(chars: &mut std::str::Chars<'_>, text: &str) -> Result<u32> {
    let digits: String = chars.take(4).collect();
    if digits.len() != 4 {
        return Err(Error::Codec(format!("truncated \\u escape in {:?}", text)));
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::Codec(format!("malformed \\u escape in {:?}", text)));
    }
    u32::from_str_radix(&digits, 16)
        .map_err(|_| Error::Codec(format!("malformed \\u escape in {:?}", text)))
}

/// Codec factory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecType {
    Properties,
    Json,
}

impl CodecType {
    pub fn create(&self) -> Box<dyn PropertyCodec> {
        match self {
            CodecType::Properties => Box::new(PropertiesCodec),
            CodecType::Json => Box::new(JsonCodec),
        }
    }
}

impl FromStr for CodecType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "properties" => Ok(CodecType::Properties),
            "json" => Ok(CodecType::Json),
            other => Err(Error::Codec(format!("unknown output format: {}", other))),
        }
    }
}
