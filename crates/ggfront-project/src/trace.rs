//! VCD postprocessing.
//!
//! Enumeration signals cannot be dumped by GHDL in a form GTKWave shows
//! symbolically, so the sources carry integer shadows (`gf_src<N>_enum<K>`).
//! Here each shadow's `$var integer 32` declaration becomes a string
//! variable named after the user's signal, and each binary value change
//! becomes the corresponding enumeration literal.

use std::path::{Path, PathBuf};

use ggfront_syntax::text::{read_latin1, write_latin1};
use ggfront_syntax::EnumSignal;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::diagnostics::SimTime;
use crate::error::TraceError;

/// 1: identifier code, 2: reference name.
static INTEGER_VAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\$var integer 32 ([^ ]+) ([a-z0-9_]+)").expect("valid var pattern")
});

/// 1: binary value, 2: identifier code.
static VECTOR_CHANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^b([01]+) ([^ ]+)").expect("valid change pattern"));

/// Rewrite trace text. `end` is appended as the final timestamp.
#[must_use]
pub fn rewrite_trace(
    text: &str,
    end: SimTime,
    enum_signals: &IndexMap<SmolStr, EnumSignal>,
) -> String {
    let mut bound: FxHashMap<String, &EnumSignal> = FxHashMap::default();
    let mut out = String::with_capacity(text.len() + 32);

    for line in text.lines() {
        let declared = INTEGER_VAR.captures(line).and_then(|caps| {
            let binding = enum_signals.get(&caps[2])?;
            bound.insert(caps[1].to_string(), binding);
            Some(format!("$var string 1 {} {} $end", &caps[1], binding.signal))
        });
        let line = declared.unwrap_or_else(|| line.to_string());
        let changed = VECTOR_CHANGE.captures(&line).and_then(|caps| {
            let binding = bound.get(&caps[2])?;
            Some(format!("s{} {}", literal(binding, &caps[1]), &caps[2]))
        });
        out.push_str(changed.as_deref().unwrap_or(&line));
        out.push('\n');
    }
    out.push('#');
    out.push_str(&end.as_fs().to_string());
    out.push('\n');
    debug!("rewrote {} enumeration signals in trace", bound.len());
    out
}

/// Read the simulator's trace at `source`, rewrite it and store it at
/// `dest`. The result is written next to `dest` first and renamed into
/// place, so a failed write leaves any previous trace intact.
pub fn postprocess(
    source: &Path,
    dest: &Path,
    end: SimTime,
    enum_signals: &IndexMap<SmolStr, EnumSignal>,
) -> Result<(), TraceError> {
    let text = read_latin1(source).map_err(|source_err| TraceError::Read {
        path: source.to_path_buf(),
        source: source_err,
    })?;
    let content = rewrite_trace(&text, end, enum_signals);

    let mut staging = dest.as_os_str().to_os_string();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);
    let write_err = |source: std::io::Error| TraceError::Write {
        path: dest.to_path_buf(),
        source,
    };
    write_latin1(&staging, &content).map_err(write_err)?;
    if let Err(err) = std::fs::rename(&staging, dest) {
        let _ = std::fs::remove_file(&staging);
        return Err(write_err(err));
    }
    debug!("trace written to {}", dest.display());
    Ok(())
}

fn literal(binding: &EnumSignal, bits: &str) -> String {
    let index = u64::from_str_radix(bits, 2)
        .ok()
        .and_then(|value| usize::try_from(value).ok());
    match index.and_then(|index| binding.values.get(index)) {
        Some(value) => value.to_string(),
        None => {
            warn!(
                "value b{bits} of {} is outside enumeration {}",
                binding.signal, binding.type_name
            );
            index.map_or_else(|| bits.to_string(), |index| index.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings() -> IndexMap<SmolStr, EnumSignal> {
        let mut map = IndexMap::new();
        map.insert(
            SmolStr::new("gf_src1_enum0"),
            EnumSignal {
                module: "fsm".into(),
                type_name: "state_t".into(),
                signal: "cur".into(),
                values: vec!["IDLE".into(), "RUN".into(), "DONE".into()],
            },
        );
        map
    }

    #[test]
    fn enumeration_values_become_strings() {
        let vcd = "$var integer 32 ! gf_src1_enum0 $end\n$var reg 1 \" clk $end\n#0\nb0 !\n0\"\n#10\nb10 !\nb1 \"\n";
        let out = rewrite_trace(vcd, SimTime::from_fs(20), &bindings());
        assert_eq!(
            out,
            "$var string 1 ! cur $end\n$var reg 1 \" clk $end\n#0\nsIDLE !\n0\"\n#10\nsDONE !\nb1 \"\n#20\n"
        );
    }

    #[test]
    fn unknown_integers_are_untouched() {
        let vcd = "$var integer 32 # count $end\nb11 #\n";
        let out = rewrite_trace(vcd, SimTime::default(), &bindings());
        assert_eq!(out, "$var integer 32 # count $end\nb11 #\n#0\n");
    }

    #[test]
    fn out_of_range_value_keeps_index() {
        let vcd = "$var integer 32 ! gf_src1_enum0 $end\nb111 !\n";
        let out = rewrite_trace(vcd, SimTime::default(), &bindings());
        assert!(out.contains("s7 !\n"));
    }
}
