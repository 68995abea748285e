//! Built-in check catalog and host OS detection.

use crate::domain::{Check, OsChecks, OsFamily};

/// Detect the OS family this binary is running on.
pub fn detect_os() -> OsFamily {
    OsFamily::from_target_os(std::env::consts::OS)
}

/// The catalog shipped with the binary.
pub fn builtin_catalog() -> OsChecks {
    OsChecks {
        macos: macos_checks(),
        windows: windows_checks(),
        linux: linux_checks(),
    }
}

fn macos_checks() -> Vec<Check> {
    vec![
        Check::new(
            r#"system_profiler SPUSBDataType -json | jq '.SPUSBDataType[] | select(."_name" | test("keyboard|mouse|storage|hub"; "i"))'"#,
            "Look for any suspicious USB devices, filtering for specific device types.",
        ),
        Check::new(
            "ps -Ao user,pid,%cpu,%mem,comm -r | head -n 20",
            "Analyze top processes for unusual CPU or memory usage.",
        ),
        Check::new(
            "netstat -an | grep -E 'ESTABLISHED|LISTEN' | awk '{print $4,$5,$6}' | uniq -c | sort -nr | head -n 20",
            "Identify top suspicious or unusual network connections.",
        ),
        Check::new(
            "last | head -n 20",
            "Review the most recent login history for any unusual user activity.",
        ),
        Check::new(
            "dscl . list /Users | grep -vE '^_.*|daemon|nobody|root'",
            "Check for unexpected or unauthorized user accounts, excluding system defaults.",
        ),
        Check::new(
            "pmset -g log | grep -i failure | tail -n 10",
            "Check the last 10 power management failures or unexpected events.",
        ),
        Check::new(
            "dmesg | tail -n 20",
            "Analyze the last 20 kernel messages for potential issues.",
        ),
        Check::new(
            "ls -lh /Users/Shared | grep -v '^d' | sort -k5,5nr | head -n 10",
            "Check the largest or most recently modified suspicious files in the shared user directory.",
        ),
        Check::new(
            "launchctl list | grep -vE 'com.apple|system' | head -n 20",
            "Check non-system running services/daemons for suspicious entries.",
        ),
        Check::new(
            "crontab -l | grep -E 'wget|curl|bash|sh' | tail -n 10",
            "Check for potentially suspicious cron jobs.",
        ),
        Check::new(
            "fdesetup status",
            "Check if FileVault disk encryption is enabled or disabled.",
        ),
        Check::new(
            "kextstat | grep -v com.apple",
            "Examine loaded kernel extensions for anything unusual, excluding Apple-signed extensions.",
        ),
        Check::new(
            "launchctl list | grep -vE 'com.apple|system'",
            "Check for non-Apple launch services that might be malicious.",
        ),
        Check::new(
            "defaults read /Library/Preferences/com.apple.loginwindow | grep -vE 'default values|empty'",
            "Inspect login window preferences for suspicious settings, filtering irrelevant defaults.",
        ),
        Check::new(
            "mdutil -s / | grep -iE 'enabled|disabled'",
            "Check Spotlight indexing status; unexpected changes could indicate tampering.",
        ),
        Check::new(
            "lsof -i | grep -E 'LISTEN|ESTABLISHED'",
            "Review open files and network connections for suspicious activity, focusing on active connections.",
        ),
        Check::new(
            "ls -la /etc/sudoers.d | grep -v '^total'",
            "Check for unauthorized sudoers modifications, ignoring summary lines.",
        ),
    ]
}

fn linux_checks() -> Vec<Check> {
    vec![
        Check::new(
            "ps -eo user,pid,%cpu,%mem,comm --sort=-%cpu | head -n 20",
            "Analyze top processes for unusual CPU or memory usage.",
        ),
        Check::new(
            "ss -tunap 2>/dev/null | grep -E 'ESTAB|LISTEN' | head -n 30",
            "Identify suspicious or unusual listening sockets and established connections.",
        ),
        Check::new(
            "last -n 20",
            "Review the most recent login history for any unusual user activity.",
        ),
        Check::new(
            "awk -F: '$3 >= 1000 || $3 == 0 {print $1\":\"$3\":\"$7}' /etc/passwd",
            "Check for unexpected or unauthorized user accounts, including extra UID 0 users.",
        ),
        Check::new(
            "dmesg 2>/dev/null | tail -n 20",
            "Analyze the last 20 kernel messages for potential issues.",
        ),
        Check::new(
            "systemctl list-units --type=service --state=running --no-pager --no-legend | head -n 40",
            "Check running services for suspicious or unfamiliar entries.",
        ),
        Check::new(
            "cat /etc/crontab /etc/cron.d/* 2>/dev/null | grep -vE '^#|^$' | tail -n 20",
            "Check system cron jobs for potentially suspicious commands.",
        ),
        Check::new(
            "ls -la /etc/sudoers.d | grep -v '^total'",
            "Check for unauthorized sudoers modifications, ignoring summary lines.",
        ),
        Check::new(
            "lsmod | head -n 40",
            "Examine loaded kernel modules for anything unusual.",
        ),
        Check::new(
            "find /tmp /var/tmp /dev/shm -maxdepth 2 -type f -perm -u+x 2>/dev/null | head -n 20",
            "Look for executable files in world-writable temporary directories.",
        ),
        Check::new(
            "cat ~/.ssh/authorized_keys 2>/dev/null | awk '{print $1, $3}'",
            "Review authorized SSH keys for entries that look unexpected.",
        ),
    ]
}

fn windows_checks() -> Vec<Check> {
    vec![
        Check::new(
            "tasklist /v /fo csv | more +1",
            "Analyze running processes for unusual names, owners or memory usage.",
        ),
        Check::new(
            "netstat -ano | findstr /R \"ESTABLISHED LISTENING\"",
            "Identify suspicious or unusual network connections and listeners.",
        ),
        Check::new(
            "net user",
            "Check for unexpected or unauthorized user accounts.",
        ),
        Check::new(
            "net localgroup administrators",
            "Check for unexpected members of the local Administrators group.",
        ),
        Check::new(
            "schtasks /query /fo LIST | findstr /B \"TaskName\"",
            "Check scheduled tasks for potentially malicious persistence.",
        ),
        Check::new(
            "wmic startup get caption,command",
            "Check startup programs for suspicious entries.",
        ),
        Check::new(
            "manage-bde -status C:",
            "Check if BitLocker disk encryption is enabled on the system drive.",
        ),
    ]
}
