use std::fs;
use std::path::Path;

use ggfront_project::{
    FailureScope, PatternTable, Project, ProjectConfig, Settings, SimTime, Simulation,
    SimulationEnd, SimulationError, SimulationOutcome, ToolError, ToolOutput, ToolRequest,
    ToolStep, Toolchain, Workdir,
};
use tempfile::TempDir;

const FSM: &str = "\
library ieee;
use ieee.std_logic_1164.all;

entity fsm is
  port (clk : in std_logic);
end fsm;

architecture rtl of fsm is
  type state_t is (IDLE, RUN, DONE);
  signal cur, nxt : state_t;
begin
  cur <= nxt when rising_edge(clk);
end rtl;
";

const TESTBENCH: &str = r#"library ieee;
use ieee.std_logic_1164.all;
use std.textio.all;

entity tb is
end tb;

architecture sim of tb is
  component fsm
    port (clk : in std_logic);
  end component;
  signal clk : std_logic := '0';
  file stim : text open read_mode is "stim.txt";
  file result : text open write_mode is "result.txt";
begin
  u0 : fsm port map (clk => clk);
  process
  begin
    wait for 150 ns;
    assert false report "done" severity failure;
  end process;
end sim;
"#;

const TRACE: &str = "$timescale 1 fs $end\n\
$var integer 32 ! gf_src1_enum0 $end\n\
$enddefinitions $end\n\
#0\n\
b0 !\n\
#100000000\n\
b1 !\n";

type Respond = Box<dyn FnMut(&ToolRequest, &Path) -> Result<ToolOutput, ToolError>>;

struct Scripted {
    respond: Respond,
    requests: Vec<ToolRequest>,
}

impl Scripted {
    fn new(
        respond: impl FnMut(&ToolRequest, &Path) -> Result<ToolOutput, ToolError> + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            requests: Vec::new(),
        }
    }

    fn steps(&self) -> Vec<ToolStep> {
        self.requests.iter().map(|request| request.step).collect()
    }
}

impl Toolchain for Scripted {
    fn run(&mut self, request: &ToolRequest, workdir: &Path) -> Result<ToolOutput, ToolError> {
        self.requests.push(request.clone());
        (self.respond)(request, workdir)
    }
}

fn output(exit_code: i32, stdout: &str) -> Result<ToolOutput, ToolError> {
    Ok(ToolOutput {
        exit_code,
        stdout: stdout.to_string(),
        stderr: String::new(),
    })
}

struct Fixture {
    dir: TempDir,
    project: Project,
    workdir: Workdir,
    settings: Settings,
    patterns: PatternTable,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let root = dir.path();
        fs::create_dir(root.join("rtl")).expect("rtl dir");
        fs::write(root.join("rtl/fsm.vhd"), FSM).expect("write fsm");
        fs::write(root.join("tb.vhd"), TESTBENCH).expect("write tb");
        fs::write(root.join("stim.txt"), "0101\n").expect("write stim");
        fs::write(
            root.join("project.toml"),
            "sources = [\"rtl/*.vhd\", \"tb.vhd\"]\n",
        )
        .expect("write project");

        let config = ProjectConfig::load(root.join("project.toml")).expect("project");
        let mut project = Project::new(config);
        assert!(project.refresh().is_empty());

        Self {
            workdir: Workdir::new(root.join("work")),
            dir,
            project,
            settings: Settings::default(),
            patterns: PatternTable::builtin(),
        }
    }

    fn simulate(
        &self,
        toolchain: &mut Scripted,
        proceed: bool,
    ) -> Result<SimulationOutcome, SimulationError> {
        Simulation::new(&self.settings, &self.patterns, &self.workdir, toolchain)
            .run(&self.project, |_| proceed)
    }
}

#[test]
fn project_globs_expand_in_compile_order() {
    let fixture = Fixture::new();
    let root = fixture.dir.path();
    assert_eq!(
        fixture.project.sources(),
        &[root.join("rtl/fsm.vhd"), root.join("tb.vhd")]
    );
    assert_eq!(fixture.project.hierarchy().top(), Some("tb"));
    assert_eq!(fixture.project.wave_path(), Some(root.join("tb.vcd").as_path()));
}

#[test]
fn completed_run_rewrites_trace_and_collects_outputs() {
    let fixture = Fixture::new();
    let mut toolchain = Scripted::new(|request, workdir| {
        match request.step {
            ToolStep::Analyze => {
                assert!(workdir.join(request.target.as_str()).is_file());
                output(0, "")
            }
            ToolStep::Elaborate => output(0, ""),
            ToolStep::Run => {
                assert_eq!(
                    fs::read_to_string(workdir.join("src2_in0")).expect("staged input"),
                    "0101\n"
                );
                fs::write(workdir.join("wave.vcd"), TRACE).expect("write trace");
                fs::write(workdir.join("src2_out0"), "ok\n").expect("write result");
                output(1, "src2.vhd:20:5:@150ns:(assertion failure): done\n")
            }
        }
    });

    let outcome = fixture.simulate(&mut toolchain, true).expect("simulate");
    assert_eq!(
        toolchain.steps(),
        vec![ToolStep::Analyze, ToolStep::Analyze, ToolStep::Elaborate, ToolStep::Run]
    );
    assert_eq!(toolchain.requests[0].target, "src1.vhd");
    assert_eq!(toolchain.requests[3].target, "tb");

    let SimulationOutcome::Completed(completion) = &outcome else {
        panic!("unexpected outcome {outcome:?}");
    };
    assert_eq!(completion.end, SimulationEnd::Finished(SimTime::from_fs(150_000_000)));
    assert!(completion.issues.is_empty());
    assert_eq!(
        completion.report.lines[0].text,
        "[tb.vhd 20行 5文字] @150ns:(assertion failure): done"
    );
    assert_eq!(outcome.message(), "シミュレーションは 150 ns 後に停止しました．");

    let root = fixture.dir.path();
    let wave = fs::read_to_string(root.join("tb.vcd")).expect("wave");
    assert!(wave.contains("$var string 1 ! cur $end\n"));
    assert!(wave.contains("sIDLE !\n#100000000\nsRUN !\n"));
    assert!(wave.ends_with("#150000000\n"));
    assert_eq!(fs::read_to_string(root.join("result.txt")).expect("result"), "ok\n");
}

#[test]
fn analysis_failures_are_counted_and_stop_the_run() {
    let fixture = Fixture::new();
    let mut toolchain = Scripted::new(|request, _| match request.target.as_str() {
        "src1.vhd" => output(1, "src1.vhd:12:3: no declaration for \"foo\"\n"),
        _ => output(0, ""),
    });

    let outcome = fixture.simulate(&mut toolchain, true).expect("simulate");
    assert_eq!(toolchain.steps(), vec![ToolStep::Analyze, ToolStep::Analyze]);
    let SimulationOutcome::CompileFailed { scope, report } = &outcome else {
        panic!("unexpected outcome {outcome:?}");
    };
    assert_eq!(*scope, FailureScope::Files(1));
    assert_eq!(report.lines[0].text, "[fsm.vhd 10行 3文字] no declaration for \"foo\"");
    assert!(!outcome.is_success());
}

#[test]
fn elaboration_failure_blames_the_design() {
    let fixture = Fixture::new();
    let mut toolchain = Scripted::new(|request, _| match request.step {
        ToolStep::Elaborate => output(1, "ghdl: compilation error\n"),
        _ => output(0, ""),
    });

    let outcome = fixture.simulate(&mut toolchain, true).expect("simulate");
    assert!(matches!(
        outcome,
        SimulationOutcome::CompileFailed { scope: FailureScope::Design, .. }
    ));
    assert_eq!(
        outcome.message(),
        "ファイル全体の解析中にエラーが発生しました．詳しくはログを参照してください．"
    );
}

#[test]
fn warnings_ask_before_running() {
    let fixture = Fixture::new();
    let respond = |request: &ToolRequest, _: &Path| match request.step {
        ToolStep::Analyze => output(0, "src2.vhd:9:3:warning: component instance is not bound\n"),
        _ => output(0, ""),
    };

    let mut toolchain = Scripted::new(respond);
    let outcome = fixture.simulate(&mut toolchain, false).expect("simulate");
    assert!(matches!(outcome, SimulationOutcome::Stopped { .. }));
    assert!(!toolchain.steps().contains(&ToolStep::Run));

    let mut toolchain = Scripted::new(respond);
    let outcome = fixture.simulate(&mut toolchain, true).expect("simulate");
    assert_eq!(toolchain.steps().last(), Some(&ToolStep::Run));
    // neither the trace nor the result file was produced
    let SimulationOutcome::Completed(completion) = outcome else {
        panic!("expected completion");
    };
    assert!(matches!(
        completion.issues.as_slice(),
        [SimulationError::Trace(_), SimulationError::Stage(_)]
    ));
}

#[test]
fn silent_run_reaches_the_limit() {
    let fixture = Fixture::new();
    let mut toolchain = Scripted::new(|request, workdir| {
        if request.step == ToolStep::Run {
            assert!(request.arguments().contains(&"--stop-time=1ms".to_string()));
            fs::write(workdir.join("wave.vcd"), TRACE).expect("write trace");
        }
        output(0, "")
    });

    let outcome = fixture.simulate(&mut toolchain, true).expect("simulate");
    let SimulationOutcome::Completed(completion) = &outcome else {
        panic!("unexpected outcome {outcome:?}");
    };
    assert_eq!(completion.end, SimulationEnd::LimitReached { limit_ms: 1 });
    assert_eq!(outcome.message(), "シミュレーションは 1 ms 以内に終了しませんでした．");
    let wave = fs::read_to_string(&completion.wave_path).expect("wave");
    assert!(wave.ends_with("#1000000000000\n"));
}

#[test]
fn failing_run_without_stop_is_an_error() {
    let fixture = Fixture::new();
    let mut toolchain = Scripted::new(|request, _| match request.step {
        ToolStep::Run => output(1, "src2.vhd:17:5:@0ms:(report failure): bound check failure\n"),
        _ => output(0, ""),
    });

    let outcome = fixture.simulate(&mut toolchain, true).expect("simulate");
    assert!(matches!(outcome, SimulationOutcome::RunFailed { .. }));
    assert!(!fixture.dir.path().join("tb.vcd").exists());
}

#[test]
fn timeout_aborts_the_request() {
    let fixture = Fixture::new();
    let mut toolchain = Scripted::new(|request, _| match request.step {
        ToolStep::Run => Err(ToolError::TimedOut),
        _ => output(0, ""),
    });

    let err = fixture.simulate(&mut toolchain, true).expect_err("timeout");
    assert!(matches!(err, SimulationError::Tool(ToolError::TimedOut)));
}

#[test]
fn unresolved_hierarchy_is_rejected() {
    let fixture = Fixture::new();
    let root = fixture.dir.path();
    fs::write(root.join("rtl/copy.vhd"), FSM).expect("write duplicate");
    let config = ProjectConfig::load(root.join("project.toml")).expect("project");
    let mut project = Project::new(config);
    project.refresh();

    let mut toolchain = Scripted::new(|_, _| output(0, ""));
    let mut simulation =
        Simulation::new(&fixture.settings, &fixture.patterns, &fixture.workdir, &mut toolchain);
    let err = simulation.run(&project, |_| true).expect_err("duplicates");
    assert!(matches!(err, SimulationError::NoTop));
    assert!(toolchain.requests.is_empty());
}
