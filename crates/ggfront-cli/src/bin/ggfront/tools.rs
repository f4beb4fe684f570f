//! External processes: GHDL behind the `Toolchain` trait, and GTKWave.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use ggfront_project::{Settings, ToolError, ToolOutput, ToolRequest, Toolchain};
use ggfront_syntax::text::decode_latin1;
use tracing::{debug, warn};

const GHDL_BUNDLED: &str = "GHDL/bin/ghdl";
const GTKWAVE_BUNDLED: &str = "gtkwave/bin/gtkwave";
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Directory bundled tools are looked up in: the one holding this binary.
pub fn base_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_default()
}

/// GHDL run as a child process with captured output and a wall-clock limit.
pub struct GhdlProcess {
    program: PathBuf,
    limit: Duration,
}

impl GhdlProcess {
    pub fn new(settings: &Settings, base_dir: &Path) -> Result<Self, ToolError> {
        let program = settings.ghdl.resolve(base_dir, GHDL_BUNDLED, "ghdl");
        ensure_exists(&program)?;
        Ok(Self {
            program,
            limit: Duration::from_millis(settings.proc_limit_ms),
        })
    }
}

impl Toolchain for GhdlProcess {
    fn run(&mut self, request: &ToolRequest, workdir: &Path) -> Result<ToolOutput, ToolError> {
        let args = request.arguments();
        debug!("{} {}", self.program.display(), args.join(" "));
        let mut child = Command::new(&self.program)
            .args(&args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| launch_error(&self.program, source))?;
        let stdout = child.stdout.take().map(capture);
        let stderr = child.stderr.take().map(capture);

        let exit_code = wait_with_limit(&mut child, self.limit)
            .map_err(|source| launch_error(&self.program, source))?
            .ok_or(ToolError::TimedOut)?;
        Ok(ToolOutput {
            exit_code,
            stdout: collect(stdout),
            stderr: collect(stderr),
        })
    }
}

/// Exit code, or `None` when the limit expired and the child was killed.
fn wait_with_limit(child: &mut Child, limit: Duration) -> std::io::Result<Option<i32>> {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status.code().unwrap_or(-1)));
        }
        if started.elapsed() >= limit {
            warn!("killing process {} after {:?}", child.id(), limit);
            child.kill()?;
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn capture(mut pipe: impl Read + Send + 'static) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut bytes = Vec::new();
        if let Err(err) = pipe.read_to_end(&mut bytes) {
            warn!("reading tool output failed: {err}");
        }
        decode_latin1(&bytes)
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

/// Start GTKWave on `wave` without waiting for it.
pub fn launch_viewer(settings: &Settings, base_dir: &Path, wave: &Path) -> Result<(), ToolError> {
    let program = settings.gtkwave.resolve(base_dir, GTKWAVE_BUNDLED, "gtkwave");
    ensure_exists(&program)?;
    let mut command = Command::new(&program);
    command
        .arg(wave)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    if cfg!(target_os = "macos") {
        // pixbuf loader lookup fails in app bundles
        command.env("GDK_PIXBUF_MODULE_FILE", "/dev/null");
    }
    let child = command
        .spawn()
        .map_err(|source| launch_error(&program, source))?;
    debug!("started {} as process {}", program.display(), child.id());
    Ok(())
}

/// Bare program names are left to the search path.
fn ensure_exists(program: &Path) -> Result<(), ToolError> {
    if program.components().count() <= 1 || program.is_file() {
        return Ok(());
    }
    Err(ToolError::NotFound {
        name: program_name(program),
        dir: program.parent().map(Path::to_path_buf).unwrap_or_default(),
    })
}

fn launch_error(program: &Path, source: std::io::Error) -> ToolError {
    ToolError::Launch {
        name: program_name(program),
        source,
    }
}

fn program_name(program: &Path) -> String {
    program.file_name().map_or_else(
        || program.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}
