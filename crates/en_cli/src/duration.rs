use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Duration written as `1h30m`, `45s` or a bare number of seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanDuration(pub Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("Duration must include a number".to_string());
        }

        let mut total = 0u64;
        let mut digits = String::new();
        for c in s.chars() {
            if c.is_ascii_digit() {
                digits.push(c);
                continue;
            }
            if c.is_whitespace() {
                continue;
            }
            let unit = match c {
                's' => 1,
                'm' => 60,
                'h' => 3_600,
                'd' => 86_400,
                _ => return Err(format!("Invalid duration unit: {}", c)),
            };
            let value: u64 = digits
                .parse()
                .map_err(|_| format!("Missing number before '{}'", c))?;
            total = value
                .checked_mul(unit)
                .and_then(|v| total.checked_add(v))
                .ok_or_else(|| "Duration is too large".to_string())?;
            digits.clear();
        }

        // trailing number without a unit counts as seconds
        if !digits.is_empty() {
            let value: u64 = digits
                .parse()
                .map_err(|_| "Invalid number in duration".to_string())?;
            total = total
                .checked_add(value)
                .ok_or_else(|| "Duration is too large".to_string())?;
        }

        Ok(HumanDuration(Duration::from_secs(total)))
    }
}

/// Like [`HumanDuration::from_str`] but refuses a zero duration.
pub fn parse_nonzero(s: &str) -> Result<HumanDuration, String> {
    let duration: HumanDuration = s.parse()?;
    if duration.0.is_zero() {
        return Err("Duration must be greater than zero".to_string());
    }
    Ok(duration)
}

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut secs = self.0.as_secs();
        if secs == 0 {
            return write!(f, "0s");
        }
        for (unit, size) in [("d", 86_400), ("h", 3_600), ("m", 60), ("s", 1)] {
            if secs >= size {
                write!(f, "{}{}", secs / size, unit)?;
                secs %= size;
            }
        }
        Ok(())
    }
}
