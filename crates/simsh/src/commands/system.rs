//! System information commands (uname, whoami, hostname, date, top, ps,
//! df, free)
//!
//! Identity values are fixed and the metrics come from
//! [`ResourceSnapshot`], so nothing about the host leaks into a session.

use async_trait::async_trait;
use chrono::Utc;
use chrono::format::{Item, StrftimeItems};

use super::{Context, DEFAULT_USERNAME, Handler, split_flags};
use crate::error::Result;
use crate::interpreter::CommandResult;
use crate::resources::ResourceSnapshot;

/// Kernel release reported by uname.
pub const KERNEL_RELEASE: &str = "6.5.0-simsh";

/// The uname command - print system information.
///
/// Usage: uname [-asnrvmo]
pub struct Uname;

#[async_trait]
impl Handler for Uname {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        let mut show_all = false;
        let mut show_kernel = false;
        let mut show_nodename = false;
        let mut show_release = false;
        let mut show_version = false;
        let mut show_machine = false;
        let mut show_os = false;

        for arg in ctx.args {
            match arg.as_str() {
                "-a" | "--all" => show_all = true,
                "-s" | "--kernel-name" => show_kernel = true,
                "-n" | "--nodename" => show_nodename = true,
                "-r" | "--kernel-release" => show_release = true,
                "-v" | "--kernel-version" => show_version = true,
                "-m" | "--machine" => show_machine = true,
                "-o" | "--operating-system" => show_os = true,
                other => {
                    return Ok(CommandResult::err(format!(
                        "uname: invalid option -- '{}'",
                        other.trim_start_matches('-')
                    )));
                }
            }
        }

        if !(show_all
            || show_nodename
            || show_release
            || show_version
            || show_machine
            || show_os)
        {
            show_kernel = true;
        }

        let mut parts = Vec::new();
        if show_all || show_kernel {
            parts.push("Linux");
        }
        if show_all || show_nodename {
            parts.push(ctx.hostname);
        }
        if show_all || show_release {
            parts.push(KERNEL_RELEASE);
        }
        if show_all || show_version {
            parts.push("#1 SMP PREEMPT_DYNAMIC");
        }
        if show_all || show_machine {
            parts.push("x86_64");
        }
        if show_all || show_os {
            parts.push("GNU/Linux");
        }

        Ok(CommandResult::ok(parts.join(" ")))
    }
}

/// The whoami command - print the session user.
pub struct Whoami;

#[async_trait]
impl Handler for Whoami {
    async fn execute(&self, _ctx: Context<'_>) -> Result<CommandResult> {
        Ok(CommandResult::ok(DEFAULT_USERNAME))
    }
}

/// The hostname command - print the simulated hostname.
///
/// Setting the hostname is refused.
pub struct Hostname;

#[async_trait]
impl Handler for Hostname {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        if !ctx.args.is_empty() {
            return Ok(CommandResult::err(
                "hostname: you must be root to change the host name",
            ));
        }
        Ok(CommandResult::ok(ctx.hostname))
    }
}

/// The date command - print the current UTC time.
///
/// Usage: date [+FORMAT]
pub struct Date;

#[async_trait]
impl Handler for Date {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        let now = Utc::now();
        let format = match ctx.args.first() {
            None => "%a %b %e %H:%M:%S UTC %Y",
            Some(arg) => match arg.trim_matches(['"', '\'']).strip_prefix('+') {
                Some(format) => format,
                None => {
                    return Ok(CommandResult::err(format!(
                        "date: invalid date '{}'",
                        arg
                    )));
                }
            },
        };

        if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            return Ok(CommandResult::err(format!(
                "date: invalid format '{}'",
                format
            )));
        }
        Ok(CommandResult::ok(now.format(format).to_string()))
    }
}

/// Fixed process table shared by top and ps: (pid, user, command).
const PROCESSES: &[(u32, &str, &str)] = &[
    (1, "root", "systemd"),
    (412, "root", "sshd"),
    (733, "root", "cron"),
    (1021, "user", "bash"),
    (1187, "user", "node"),
    (1290, "user", "python3"),
];

/// The top command - one snapshot of system activity.
///
/// Registered as `top` and `htop`. There is no interactive refresh.
pub struct Top;

#[async_trait]
impl Handler for Top {
    async fn execute(&self, _ctx: Context<'_>) -> Result<CommandResult> {
        let snap = ResourceSnapshot::generate();
        let user_cpu = (snap.cpu_percent * 0.8 * 10.0).round() / 10.0;
        let sys_cpu = (snap.cpu_percent * 10.0).round() / 10.0 - user_cpu;
        let cache_mb = snap.memory_free_mb() / 4;

        let mut lines = vec![
            format!(
                "top - {} up {},  1 user,  load average: {:.2}, {:.2}, {:.2}",
                Utc::now().format("%H:%M:%S"),
                snap.uptime_display(),
                snap.load_average[0],
                snap.load_average[1],
                snap.load_average[2]
            ),
            format!(
                "Tasks: {} total,   1 running, {} sleeping,   0 stopped,   0 zombie",
                snap.process_count,
                snap.process_count - 1
            ),
            format!(
                "%Cpu(s): {:4.1} us, {:4.1} sy,  0.0 ni, {:4.1} id,  0.0 wa,  0.0 hi,  0.0 si,  0.0 st",
                user_cpu,
                sys_cpu,
                100.0 - snap.cpu_percent
            ),
            format!(
                "MiB Mem : {:8.1} total, {:8.1} free, {:8.1} used, {:8.1} buff/cache",
                snap.memory_total_mb as f64,
                (snap.memory_free_mb() - cache_mb) as f64,
                snap.memory_used_mb as f64,
                cache_mb as f64
            ),
            format!(
                "MiB Swap: {:8.1} total, {:8.1} free, {:8.1} used. {:8.1} avail Mem",
                crate::resources::SWAP_TOTAL_MB as f64,
                (crate::resources::SWAP_TOTAL_MB - snap.swap_used_mb) as f64,
                snap.swap_used_mb as f64,
                snap.memory_free_mb() as f64
            ),
            String::new(),
            "    PID USER      PR  NI    VIRT    RES    SHR S  %CPU  %MEM     TIME+ COMMAND"
                .to_string(),
        ];

        let share = snap.cpu_percent / PROCESSES.len() as f64;
        for (i, (pid, user, command)) in PROCESSES.iter().enumerate() {
            let cpu = if i >= 3 { share * 1.5 } else { share * 0.5 };
            lines.push(format!(
                "{:>7} {:<9} 20   0 {:>7} {:>6} {:>6} S {:>5.1} {:>5.1} {:>9} {}",
                pid,
                user,
                168_000 + pid * 64,
                12_000 + pid * 8,
                8_000 + pid * 2,
                cpu,
                (pid % 50) as f64 / 10.0,
                format!("{}:{:02}.{:02}", pid / 600, (pid / 10) % 60, pid % 100),
                command
            ));
        }

        Ok(CommandResult::ok(lines.join("\n")))
    }
}

/// The ps command - list processes.
///
/// Usage: ps [aux]
pub struct Ps;

#[async_trait]
impl Handler for Ps {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        let full = ctx
            .args
            .iter()
            .any(|a| a.trim_start_matches('-').contains(['a', 'u', 'x', 'e', 'f']));

        if !full {
            return Ok(CommandResult::ok(
                "    PID TTY          TIME CMD\n   1021 pts/0    00:00:00 bash\n   \
                 1402 pts/0    00:00:00 ps",
            ));
        }

        let snap = ResourceSnapshot::generate();
        let mut lines =
            vec!["USER         PID %CPU %MEM    VSZ   RSS TTY      STAT START   TIME COMMAND".to_string()];
        for (pid, user, command) in PROCESSES {
            let tty = if *user == "root" { "?" } else { "pts/0" };
            lines.push(format!(
                "{:<8} {:>7} {:>4.1} {:>4.1} {:>6} {:>5} {:<8} Ss   09:00   0:{:02} {}",
                user,
                pid,
                snap.cpu_percent / 20.0,
                (pid % 50) as f64 / 10.0,
                168_000 + pid * 64,
                12_000 + pid * 8,
                tty,
                pid % 60,
                command
            ));
        }
        lines.push(format!(
            "{:<8} {:>7}  0.0  0.0   7060  1600 pts/0    R+   09:00   0:00 ps {}",
            DEFAULT_USERNAME,
            1402,
            ctx.args.join(" ")
        ));
        Ok(CommandResult::ok(lines.join("\n")))
    }
}

/// The df command - report filesystem usage.
///
/// Usage: df [-h]
pub struct Df;

#[async_trait]
impl Handler for Df {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        let (flags, _) = match split_flags(ctx.args, "hHkT") {
            Ok(parsed) => parsed,
            Err(c) => {
                return Ok(CommandResult::err(format!("df: invalid option -- '{}'", c)));
            }
        };
        let snap = ResourceSnapshot::generate();
        let tmpfs_gb = snap.memory_total_mb / 2 / 1024;

        let rows: [(&str, u64, u64, &str); 3] = [
            ("/dev/sda1", snap.disk_total_gb, snap.disk_used_gb, "/"),
            ("tmpfs", tmpfs_gb, 0, "/dev/shm"),
            ("/dev/sda15", 1, 0, "/boot/efi"),
        ];

        let human = flags.contains(&'h') || flags.contains(&'H');
        let mut lines = vec![if human {
            "Filesystem      Size  Used Avail Use% Mounted on".to_string()
        } else {
            "Filesystem     1K-blocks      Used Available Use% Mounted on".to_string()
        }];
        for (fs, total, used, mount) in rows {
            let free = total - used;
            let pct = if total == 0 { 0 } else { used * 100 / total };
            lines.push(if human {
                format!(
                    "{:<14} {:>5} {:>5} {:>5} {:>3}% {}",
                    fs,
                    format!("{}G", total),
                    format!("{}G", used),
                    format!("{}G", free),
                    pct,
                    mount
                )
            } else {
                let kib = 1024 * 1024;
                format!(
                    "{:<14} {:>10} {:>9} {:>9} {:>3}% {}",
                    fs,
                    total * kib,
                    used * kib,
                    free * kib,
                    pct,
                    mount
                )
            });
        }
        Ok(CommandResult::ok(lines.join("\n")))
    }
}

/// The free command - report memory usage.
///
/// Usage: free [-h | -m | -g]
///
/// Defaults to KiB.
pub struct Free;

#[derive(Clone, Copy)]
enum Unit {
    Kibi,
    Mebi,
    Gibi,
    Human,
}

impl Unit {
    fn render(self, mb: u64) -> String {
        match self {
            Unit::Kibi => (mb * 1024).to_string(),
            Unit::Mebi => mb.to_string(),
            Unit::Gibi => (mb / 1024).to_string(),
            Unit::Human if mb >= 1024 => format!("{:.1}Gi", mb as f64 / 1024.0),
            Unit::Human => format!("{}Mi", mb),
        }
    }
}

#[async_trait]
impl Handler for Free {
    async fn execute(&self, ctx: Context<'_>) -> Result<CommandResult> {
        let (flags, _) = match split_flags(ctx.args, "hmgk") {
            Ok(parsed) => parsed,
            Err(c) => {
                return Ok(CommandResult::err(format!("free: invalid option -- '{}'", c)));
            }
        };
        let unit = match flags.last() {
            Some('h') => Unit::Human,
            Some('m') => Unit::Mebi,
            Some('g') => Unit::Gibi,
            _ => Unit::Kibi,
        };

        let snap = ResourceSnapshot::generate();
        let cache = snap.memory_free_mb() / 4;
        let free = snap.memory_free_mb() - cache;
        let shared = snap.memory_total_mb / 64;
        let swap_total = crate::resources::SWAP_TOTAL_MB;

        Ok(CommandResult::ok(format!(
            "{:>15} {:>11} {:>11} {:>11} {:>11} {:>11}\n\
             Mem:   {:>11} {:>11} {:>11} {:>11} {:>11} {:>11}\n\
             Swap:  {:>11} {:>11} {:>11}",
            "total",
            "used",
            "free",
            "shared",
            "buff/cache",
            "available",
            unit.render(snap.memory_total_mb),
            unit.render(snap.memory_used_mb),
            unit.render(free),
            unit.render(shared),
            unit.render(cache),
            unit.render(snap.memory_free_mb()),
            unit.render(swap_total),
            unit.render(snap.swap_used_mb),
            unit.render(swap_total - snap.swap_used_mb),
        )))
    }
}
