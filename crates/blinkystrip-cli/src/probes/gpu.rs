//! GPU temperature from `nvidia-smi` output.

use super::TemperatureProbe;
use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::debug;

/// Reads the GPU temperature by running `nvidia-smi` (or a compatible
/// command) and scanning its report.
pub struct NvidiaSmiProbe {
    command: String,
}

impl NvidiaSmiProbe {
    /// Creates a probe that runs `command` through the shell.
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
        }
    }
}

impl TemperatureProbe for NvidiaSmiProbe {
    fn name(&self) -> &str {
        &self.command
    }

    async fn read_celsius(&mut self) -> Result<u32> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.command))?;

        if !output.status.success() {
            anyhow::bail!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let celsius = parse_temperature(&stdout)
            .with_context(|| format!("No temperature in {} output", self.command))?;
        debug!("GPU temperature: {}C", celsius);
        Ok(celsius)
    }
}

/// Finds the first temperature token (`<digits>C`) in a report.
///
/// Tokens must start at a non-digit boundary, so `100C` reads as 100.
pub fn parse_temperature(report: &str) -> Option<u32> {
    let bytes = report.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if bytes.get(i) == Some(&b'C') && (2..=3).contains(&(i - start)) {
            return report[start..i].parse().ok();
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const NVIDIA_SMI: &str = "\
+-----------------------------------------------------------------------------+
| NVIDIA-SMI 535.104.05   Driver Version: 535.104.05   CUDA Version: 12.2     |
|-------------------------------+----------------------+----------------------+
| GPU  Name        Persistence-M| Bus-Id        Disp.A | Volatile Uncorr. ECC |
| Fan  Temp  Perf  Pwr:Usage/Cap|         Memory-Usage | GPU-Util  Compute M. |
|===============================+======================+======================|
|   0  GeForce GTX 1080    Off  | 00000000:01:00.0  On |                  N/A |
| 27%   47C    P8    11W / 180W |    512MiB /  8192MiB |      2%      Default |
+-------------------------------+----------------------+----------------------+
";

    #[test]
    fn test_parse_nvidia_smi_report() {
        assert_eq!(parse_temperature(NVIDIA_SMI), Some(47));
    }

    #[test]
    fn test_parse_three_digit_temperature() {
        assert_eq!(parse_temperature("| 90%  100C  P0 |"), Some(100));
    }

    #[test]
    fn test_parse_no_temperature() {
        assert_eq!(parse_temperature("No devices were found"), None);
        assert_eq!(parse_temperature("5C 12345C"), None);
        assert_eq!(parse_temperature(""), None);
    }

    #[tokio::test]
    async fn test_probe_runs_command() {
        let mut probe = NvidiaSmiProbe::new("echo '| 30%   61C    P2 |'");
        assert_eq!(probe.read_celsius().await.unwrap(), 61);
        assert_eq!(probe.name(), "echo '| 30%   61C    P2 |'");
    }

    #[tokio::test]
    async fn test_probe_failing_command() {
        let mut probe = NvidiaSmiProbe::new("exit 3");
        assert!(probe.read_celsius().await.is_err());

        let mut probe = NvidiaSmiProbe::new("echo no temperature here");
        assert!(probe.read_celsius().await.is_err());
    }
}
