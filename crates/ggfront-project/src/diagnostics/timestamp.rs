//! Simulation stop time reported by GHDL.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static FINISHED_2008: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"simulation (?:finished|stopped) @(\d+)([munpf])s").expect("valid stop pattern")
});

static ASSERTION_STOP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@(\d+)([munpf])s:\(assertion failure\)").expect("valid stop pattern")
});

/// Simulation time in femtoseconds, the VCD time unit GHDL writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SimTime(u64);

impl SimTime {
    /// Time from a femtosecond count.
    #[must_use]
    pub const fn from_fs(fs: u64) -> Self {
        Self(fs)
    }

    /// Time from milliseconds, saturating on overflow.
    #[must_use]
    pub const fn from_ms(ms: u64) -> Self {
        Self(ms.saturating_mul(1_000_000_000_000))
    }

    /// Time from a value and a GHDL unit prefix (`f`, `p`, `n`, `u`, `m`).
    #[must_use]
    pub fn from_unit(value: u64, unit: char) -> Option<Self> {
        let scale: u64 = match unit {
            'f' => 1,
            'p' => 1_000,
            'n' => 1_000_000,
            'u' => 1_000_000_000,
            'm' => 1_000_000_000_000,
            _ => return None,
        };
        Some(Self(value.saturating_mul(scale)))
    }

    /// Femtosecond count.
    #[must_use]
    pub const fn as_fs(self) -> u64 {
        self.0
    }

    /// Extract the stop time from a simulator output line.
    ///
    /// With VHDL-2008 GHDL reports `simulation finished @<t>` or
    /// `simulation stopped @<t>`; earlier standards stop through a failing
    /// assertion, reported as `@<t>:(assertion failure)`.
    #[must_use]
    pub fn from_stop_line(line: &str, vhdl2008: bool) -> Option<Self> {
        let pattern = if vhdl2008 {
            &FINISHED_2008
        } else {
            &ASSERTION_STOP
        };
        let caps = pattern.captures(line)?;
        let value = caps[1].parse::<u64>().ok()?;
        let unit = caps[2].chars().next()?;
        Self::from_unit(value, unit)
    }
}

/// Nanoseconds with thousands separators and up to three decimals.
impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ps = self.0 / 1_000 + u64::from(self.0 % 1_000 >= 500);
        let whole = (ps / 1_000).to_string();
        let fraction = ps % 1_000;

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, digit) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }
        f.write_str(&grouped)?;
        if fraction != 0 {
            let digits = format!("{fraction:03}");
            write!(f, ".{}", digits.trim_end_matches('0'))?;
        }
        Ok(())
    }
}
