//! Installed-software probes and host OS detection.

use std::collections::BTreeMap;
use std::io::Read;
use std::process::{Command, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Tools the console can provision and report on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tool {
    Caddy,
    Php,
    Composer,
    Mysql,
    Node,
    Redis,
    Supervisor,
    Ufw,
}

impl Tool {
    pub fn all() -> &'static [Tool] {
        &[
            Tool::Caddy,
            Tool::Php,
            Tool::Composer,
            Tool::Mysql,
            Tool::Node,
            Tool::Redis,
            Tool::Supervisor,
            Tool::Ufw,
        ]
    }

    /// Binary checked by the installed probe.
    pub fn binary(&self) -> &'static str {
        match self {
            Tool::Caddy => "caddy",
            Tool::Php => "php-fpm",
            Tool::Composer => "composer",
            Tool::Mysql => "mysql",
            Tool::Node => "node",
            Tool::Redis => "redis-server",
            Tool::Supervisor => "supervisord",
            Tool::Ufw => "ufw",
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            Tool::Caddy => "Caddy",
            Tool::Php => "PHP-FPM",
            Tool::Composer => "Composer",
            Tool::Mysql => "MySQL",
            Tool::Node => "Node.js",
            Tool::Redis => "Redis",
            Tool::Supervisor => "Supervisor",
            Tool::Ufw => "UFW firewall",
        }
    }
}

/// "Appears usable on this host" check. An absent tool is `false`, never an
/// error.
pub fn probe(tool: Tool) -> bool {
    Command::new("sh")
        .args([
            "-lc",
            &format!("command -v {} >/dev/null 2>&1", tool.binary()),
        ])
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn probe_all() -> BTreeMap<Tool, bool> {
    Tool::all().iter().map(|tool| (*tool, probe(*tool))).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOs {
    Debian,
    Ubuntu,
    Fedora,
    Other(String),
}

pub fn host_os() -> HostOs {
    std::fs::read_to_string("/etc/os-release")
        .map(|content| parse_os_release(&content))
        .unwrap_or_else(|_| HostOs::Other("unknown".to_string()))
}

pub fn parse_os_release(content: &str) -> HostOs {
    let id = content
        .lines()
        .find_map(|line| line.strip_prefix("ID="))
        .map(|value| value.trim_matches('"').to_lowercase())
        .unwrap_or_else(|| "unknown".to_string());
    match id.as_str() {
        "debian" => HostOs::Debian,
        "ubuntu" => HostOs::Ubuntu,
        "fedora" => HostOs::Fedora,
        other => HostOs::Other(other.to_string()),
    }
}

/// One-line status for the GitHub SSH connectivity check. Hard time bound so
/// a hung ssh never stalls the console.
pub fn github_connectivity(timeout: Duration) -> String {
    let mut cmd = Command::new("ssh");
    cmd.args([
        "-T",
        "-o",
        "BatchMode=yes",
        "-o",
        "StrictHostKeyChecking=accept-new",
        "-o",
        "ConnectTimeout=5",
        "git@github.com",
    ]);
    match output_with_timeout(&mut cmd, timeout) {
        Ok((code, output)) => {
            if output.contains("successfully authenticated") {
                "✅ GitHub SSH access verified".to_string()
            } else if code == 255 {
                "❌ GitHub unreachable over SSH".to_string()
            } else {
                "⚠️ GitHub responded, but this host's key is not authorized".to_string()
            }
        }
        Err(err) => format!("❌ GitHub check failed: {}", err),
    }
}

/// Spawn, wait with a deadline, kill on overrun. Returns exit code plus
/// combined output.
fn output_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<(i32, String), String> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = cmd.spawn().map_err(|err| format!("spawn failed: {}", err))?;

    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();
    let stdout_handle = std::thread::spawn(move || {
        let mut buf = String::new();
        if let Some(ref mut out) = stdout {
            let _ = out.read_to_string(&mut buf);
        }
        buf
    });
    let stderr_handle = std::thread::spawn(move || {
        let mut buf = String::new();
        if let Some(ref mut err) = stderr {
            let _ = err.read_to_string(&mut buf);
        }
        buf
    });

    let status = match child.wait_timeout(timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            let _ = stdout_handle.join();
            let _ = stderr_handle.join();
            return Err(format!("timed out after {}s", timeout.as_secs()));
        }
        Err(err) => return Err(format!("wait failed: {}", err)),
    };

    let mut output = stdout_handle.join().unwrap_or_default();
    output.push_str(&stderr_handle.join().unwrap_or_default());
    Ok((status.code().unwrap_or(-1), output))
}
