use std::ffi::OsStr;
use std::process::{Command, Output};

/// Run the `probe-runner` binary and capture output.
///
/// # Errors
///
/// Returns an error if the binary cannot be executed.
pub fn run_probe_runner<I, S>(args: I) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = probe_runner_bin()?;
    Command::new(bin)
        .args(args)
        .env("RUST_LOG", "error")
        .env_remove("PROBE_RUNNER_LOG")
        .output()
        .map_err(|err| format!("run probe-runner failed: {}", err))
}

fn probe_runner_bin() -> Result<String, String> {
    option_env!("CARGO_BIN_EXE_probe-runner").map_or_else(
        || Err("CARGO_BIN_EXE_probe-runner missing at compile time.".to_owned()),
        |path| Ok(path.to_owned()),
    )
}

/// Fails with both streams attached when the process did not succeed.
///
/// # Errors
///
/// Returns an error describing the output when the exit status is non-zero.
pub fn expect_success(output: &Output) -> Result<String, String> {
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if !output.status.success() {
        return Err(format!(
            "stdout: {}\nstderr: {}",
            stdout,
            String::from_utf8_lossy(&output.stderr)
        ));
    }
    Ok(stdout)
}
