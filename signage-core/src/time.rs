use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};

const JST_OFFSET_SECS: i32 = 9 * 3600;

/// `yyyyMMddHHmm` in the clock's own timezone, as the rainfall provider wants it.
pub fn format_rainfall_date<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    now.format("%Y%m%d%H%M").to_string()
}

/// Re-expresses sun times in the display's local offset.
///
/// The instant is never shifted. The sun-times provider is queried with
/// `tzid=Asia/Tokyo`, so with the default `+09:00` this is an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalTimeConversion {
    offset: FixedOffset,
}

impl LocalTimeConversion {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Parses offsets written as `+09:00`, `-05:30` or `Z`.
    pub fn parse(text: &str) -> Result<Self> {
        let offset = parse_offset(text)
            .with_context(|| format!("Invalid UTC offset '{text}', expected e.g. \"+09:00\""))?;
        Ok(Self::new(offset))
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn apply(&self, t: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        t.with_timezone(&self.offset)
    }
}

impl Default for LocalTimeConversion {
    fn default() -> Self {
        Self::new(jst())
    }
}

pub fn jst() -> FixedOffset {
    FixedOffset::east_opt(JST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

fn parse_offset(text: &str) -> Option<FixedOffset> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("z") {
        return Some(Utc.fix());
    }

    let (sign, rest) = match text.as_bytes().first()? {
        b'+' => (1, &text[1..]),
        b'-' => (-1, &text[1..]),
        _ => return None,
    };
    let (h, m) = rest.split_once(':').unwrap_or((rest, "0"));
    let hours: i32 = h.parse().ok()?;
    let minutes: i32 = m.parse().ok()?;
    if !(0..60).contains(&minutes) {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
