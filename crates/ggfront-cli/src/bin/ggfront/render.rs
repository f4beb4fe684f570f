//! Plain-text rendering of reports for the terminal.

use std::fmt::Write as _;

use ggfront_project::diagnostics::NO_DETAIL;
use ggfront_project::{DiagnosticReport, Hierarchy};
use ggfront_syntax::{LineOrigin, SourceAnalysis};

const INDENT: &str = "  ";

/// One line per message; excerpts and known-error explanations are
/// indented below it.
pub fn render_report(report: &DiagnosticReport) -> String {
    let mut out = String::new();
    for line in &report.lines {
        out.push_str(&line.text);
        out.push('\n');
        if let Some(excerpt) = &line.excerpt {
            for text in excerpt.lines() {
                let _ = writeln!(out, "{INDENT}{INDENT}{text}");
            }
        }
        if line.detail != NO_DETAIL {
            for text in line.detail.lines() {
                let _ = writeln!(out, "{INDENT}| {text}");
            }
        }
    }
    out
}

/// Indented entity tree. The selected top module is marked.
pub fn render_hierarchy(hierarchy: &Hierarchy) -> String {
    let mut out = String::new();
    for item in hierarchy.items() {
        out.push_str(&INDENT.repeat(item.depth));
        out.push_str(&item.name);
        if let Some(short) = &item.short_path {
            let _ = write!(out, " ({short})");
        }
        if item.is_top {
            out.push_str(" [top]");
        }
        out.push('\n');
    }
    out
}

/// Rewritten source with the original line of each line, followed by the
/// redirected data files and the tracked enumeration signals.
pub fn render_conversion(analysis: &SourceAnalysis) -> String {
    let file = &analysis.file;
    let mut out = String::new();
    let _ = writeln!(out, "-- {} ({})", file.internal, file.original.display());
    for (text, origin) in file.content.lines().zip(file.line_map.iter()) {
        let label = match origin {
            LineOrigin::Source(line) => line.to_string(),
            LineOrigin::Synthetic => "+".to_string(),
            LineOrigin::EndOfFile => "$".to_string(),
        };
        let _ = writeln!(out, "{label:>5} | {text}");
    }

    for data in analysis.data_files() {
        let _ = writeln!(
            out,
            "-- {} {} {} ({})",
            data.internal,
            data.direction.tag(),
            data.original.display(),
            data.module
        );
    }
    for (shadow, binding) in &analysis.enum_signals {
        let _ = writeln!(
            out,
            "-- {shadow} = {}.{} : {} ({})",
            binding.module,
            binding.signal,
            binding.type_name,
            binding.values.join(", ")
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use expect_test::expect;
    use ggfront_project::{PatternTable, Reformatter, TopSelection};
    use ggfront_syntax::analyze;

    use super::*;

    const FSM: &str = "\
entity fsm is
end fsm;
architecture rtl of fsm is
  type state_t is (IDLE, RUN);
  signal cur : state_t;
  file log_f : text open write_mode is \"log.txt\";
begin
end rtl;
";

    const TB: &str = "\
entity tb is
end tb;
architecture sim of tb is
  component fsm
  end component;
begin
  u0 : fsm;
end sim;
";

    #[test]
    fn conversion_lists_origins() {
        let analysis = analyze(Path::new("fsm.vhd"), 1, FSM);
        expect![[r#"
            -- src1.vhd (fsm.vhd)
                1 | entity fsm is
                2 | end fsm;
                3 | architecture rtl of fsm is
                4 |   type state_t is (IDLE, RUN);
                + | signal gf_src1_enum0 : integer;
                5 |   signal cur : state_t;
                6 |   file log_f : text open write_mode is "src1_out0";
                7 | begin
                + | gf_src1_enum0 <= state_t'pos(cur);
                8 | end rtl;
            -- src1_out0 out log.txt (fsm)
            -- gf_src1_enum0 = fsm.cur : state_t (IDLE, RUN)
        "#]]
        .assert_eq(&render_conversion(&analysis));
    }

    #[test]
    fn hierarchy_marks_top() {
        let sources = [
            analyze(Path::new("fsm.vhd"), 1, FSM),
            analyze(Path::new("tb.vhd"), 2, TB),
        ];
        let hierarchy = Hierarchy::resolve(&sources, &TopSelection::default());
        expect![[r#"
            tb (tb.vhd) [top]
              fsm (fsm.vhd)
        "#]]
        .assert_eq(&render_hierarchy(&hierarchy));
    }

    #[test]
    fn report_shows_explanations() {
        let sources = [analyze(Path::new("fsm.vhd"), 1, FSM)];
        let patterns = PatternTable::parse("no declaration for\n未宣言\n宣言がない\n宣言する\n");
        let report = Reformatter::new(sources.iter().map(|s| &s.file), &patterns, false)
            .reformat("src1.vhd:6:3: no declaration for \"x\"\nplain\n");
        expect![[r#"
            [fsm.vhd 5行 3文字] no declaration for "x"
              | 未宣言
              | 　説明: 宣言がない
              | 　対処: 宣言する
            plain
        "#]]
        .assert_eq(&render_report(&report));
    }
}
